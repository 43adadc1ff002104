//! core 的错误类型。
//!
//! 注意：插入 mention 时选区不合法属于“策略性 no-op”，不走这里的错误。
use thiserror::Error;

use crate::host::NodePath;

/// 节点记录（导出/导入格式）相关错误。
#[derive(Error, Debug)]
pub enum RecordError {
    #[error("JSON 解析失败: {0}")]
    Json(#[from] serde_json::Error),

    #[error("节点记录不是 JSON 对象")]
    NotAnObject,

    #[error("节点记录缺少 type 字段")]
    MissingType,

    /// registry 中没有注册该 type tag。
    #[error("未注册的节点类型: {0}")]
    UnknownType(String),

    #[error("节点类型不符: 期望 {expected}, 实际 {got}")]
    TypeMismatch { expected: &'static str, got: String },

    #[error("{kind} 节点不支持版本 {version:?}")]
    UnsupportedVersion { kind: &'static str, version: Option<u64> },

    #[error("节点记录缺少字段: {0}")]
    MissingField(&'static str),

    #[error("不是 mention 元素")]
    NotMentionElement,
}

/// 宿主文档在 update 事务内拒绝的结构性修改。
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum HostError {
    #[error("节点不存在: {0:?}")]
    NodeNotFound(NodePath),

    #[error("节点不是纯文本: {0:?}")]
    NotText(NodePath),

    #[error("区间 {start}..{end} 超出文本长度 {len}")]
    SpanOutOfBounds { start: usize, end: usize, len: usize },

    #[error("偏移 {0} 不在字符边界上")]
    NotCharBoundary(usize),
}
