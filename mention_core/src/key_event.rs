use crate::model::Candidate;

/// 输入事件（逻辑键盘/指针事件）。
///
/// 说明：
/// - `Session`/processor 只关心“语义事件”，不关心具体平台键值
/// - 前端负责把系统按键转换成这些事件
/// - 未被 `Session` 消费的事件交给宿主编辑器处理
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InputEvent {
    /// 输入一个字符
    Char(char),
    /// 删除光标前的内容
    Backspace,
    Left,
    Right,
    Up,
    Down,
    /// 回车（overlay 打开时等同于提交高亮候选）
    Enter,
    Tab,
    /// 关闭 overlay
    Escape,
    /// 指针悬停在第 n 个候选上
    Hover(usize),
    /// 点击第 n 个候选
    Click(usize),
    /// 退出（上层用；core 可忽略）
    Exit,
}

/// 引擎输出动作（对宿主的“副作用”请求）。
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    /// 用该候选替换触发区间
    Commit(Candidate),
    /// overlay 被关闭，未提交
    Dismiss,
}
