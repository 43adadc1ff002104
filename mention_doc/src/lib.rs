//! `mention_doc`：内存中的富文本文档，实现 `mention_core::host::DocumentHost`。
//!
//! - `document`：段落/行内节点树、选区、read/update 事务、编辑操作（token 模式）
//! - `layout`：等宽布局，给出光标矩形
//! - `export`：整篇文档的 JSON 导出/导入
//! - `html`：整篇文档的 HTML 导出/导入（mention 为 `data-lexical-mention` span）
//! - `editor`：组合根，先交给 `Session` 再交给文档处理按键
pub mod document;
pub mod editor;
pub mod error;
pub mod export;
pub mod html;
pub mod layout;

pub use document::{Document, EditorState, ListenerId, Paragraph};
pub use editor::Editor;
pub use error::DocError;
pub use export::ImportReport;
pub use layout::LayoutMetrics;
