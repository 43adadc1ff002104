//! `tracker`：当前高亮候选的下标。

/// 维护 `[0, count)` 内的高亮下标；`count == 0` 时所有移动都是 no-op。
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SelectionTracker {
    index: usize,
    count: usize,
}

impl SelectionTracker {
    pub fn index(&self) -> usize {
        self.index
    }

    pub fn count(&self) -> usize {
        self.count
    }

    /// 候选列表变化（包括变空）时调用：下标回到 0。
    pub fn reset(&mut self, count: usize) {
        self.index = 0;
        self.count = count;
    }

    pub fn advance(&mut self) {
        if self.count == 0 {
            return;
        }
        self.index = (self.index + 1) % self.count;
    }

    pub fn retreat(&mut self) {
        if self.count == 0 {
            return;
        }
        self.index = (self.index + self.count - 1) % self.count;
    }

    /// 指针悬停：越界时忽略。
    pub fn hover(&mut self, index: usize) -> bool {
        if index >= self.count {
            return false;
        }
        self.index = index;
        true
    }
}
