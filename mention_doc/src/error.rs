use mention_core::error::RecordError;
use thiserror::Error;

/// 整篇文档导入/导出错误。单个节点导入失败不在这里，见 `ImportReport`。
#[derive(Error, Debug)]
pub enum DocError {
    #[error("文档 JSON 读写失败: {0}")]
    Json(#[from] serde_json::Error),

    #[error("节点导出失败: {0}")]
    Record(#[from] RecordError),

    #[error("根节点类型不符: {0}")]
    UnexpectedRoot(String),
}
