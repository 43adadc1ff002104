use crate::model::Candidate;

/// 候选来源抽象：core 不关心候选来自文件/内存/网络。
///
/// 约定：
/// - `list_all` 是同步调用，返回顺序即展示顺序
/// - 返回的列表在进程内视为只读
pub trait Directory: Send + Sync {
    fn list_all(&self) -> Vec<Candidate>;
}

impl Directory for Vec<Candidate> {
    fn list_all(&self) -> Vec<Candidate> {
        self.clone()
    }
}
