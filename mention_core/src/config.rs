//! 可配置项（trigger / 候选数量 / overlay 间距）。
//!
//! 字段都带默认值，前端可以只写需要覆盖的部分。
use serde::{Deserialize, Serialize};

pub const DEFAULT_TRIGGER: char = '@';
pub const DEFAULT_CANDIDATE_LIMIT: u8 = 5;
/// overlay 与光标底边之间的垂直间距（像素）
pub const DEFAULT_OVERLAY_GAP: f32 = 8.0;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SuggestConfig {
    /// 触发字符
    pub trigger: char,
    /// 候选数量上限（1..=9）；超出范围时回退到默认值
    pub candidate_limit: u8,
    pub overlay_gap: f32,
}

impl Default for SuggestConfig {
    fn default() -> Self {
        Self {
            trigger: DEFAULT_TRIGGER,
            candidate_limit: DEFAULT_CANDIDATE_LIMIT,
            overlay_gap: DEFAULT_OVERLAY_GAP,
        }
    }
}
