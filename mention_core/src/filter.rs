//! `filter`：候选后处理（过滤/裁剪）。

use crate::model::Candidate;

/// Filter：对候选列表做后处理。
pub trait Filter: Send + Sync {
    fn apply(&self, candidates: Vec<Candidate>) -> Vec<Candidate>;
}

/// 默认 filter：展示名不区分大小写地包含 query 的候选，保持原顺序，截断到 limit。
///
/// query 为空时全部通过（仍然截断）。
pub struct NameContains {
    /// 已转成小写的查询
    needle: String,
    pub limit: u8,
}

impl NameContains {
    pub fn new(query: &str, limit: u8) -> Self {
        Self {
            needle: query.to_lowercase(),
            limit,
        }
    }
}

impl Filter for NameContains {
    fn apply(&self, candidates: Vec<Candidate>) -> Vec<Candidate> {
        let limit = usize::from(self.limit.max(1));
        candidates
            .into_iter()
            .filter(|c| c.display_name.to_lowercase().contains(&self.needle))
            .take(limit)
            .collect()
    }
}
