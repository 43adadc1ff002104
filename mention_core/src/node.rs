//! 行内节点：纯文本与 mention token。
//!
//! 没有继承链：`InlineNode` 是带标签的变体，`InlineContent` 给出每种节点的能力集合
//! （render / export_record / export_html / is_atomic），导入走 `record::NodeRegistry`。
use bitflags::bitflags;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

use crate::error::RecordError;
use crate::model::Candidate;
use crate::record;

bitflags! {
    /// 文本格式位，取值与常见富文本导出格式保持一致。
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct TextFormat: u32 {
        const BOLD = 1 << 0;
        const ITALIC = 1 << 1;
        const STRIKETHROUGH = 1 << 2;
        const UNDERLINE = 1 << 3;
        const CODE = 1 << 4;
        const SUBSCRIPT = 1 << 5;
        const SUPERSCRIPT = 1 << 6;
    }
}

impl Default for TextFormat {
    fn default() -> Self {
        Self::empty()
    }
}

/// 文本节点的编辑模式。
///
/// - `Normal`：逐字符编辑
/// - `Token`：整体移动、整体删除
/// - `Segmented`：可按词删除，但不能逐字符编辑
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, Display, EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum TextMode {
    #[default]
    Normal,
    Token,
    Segmented,
}

/// 渲染结果：一段带格式的文本。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Span {
    pub text: String,
    pub format: TextFormat,
    /// mention 的引用 id；纯文本为 `None`
    pub reference: Option<String>,
}

/// 行内节点的能力集合。
pub trait InlineContent {
    /// registry 中的类型标签（导出记录的 `type` 字段）
    fn type_tag(&self) -> &'static str;
    /// 节点承载的文本
    fn text(&self) -> &str;
    fn render(&self) -> Span;
    fn export_record(&self) -> Result<serde_json::Value, RecordError>;
    /// HTML 片段（不含格式标签，格式由外层包裹）
    fn export_html(&self) -> String;
    /// 是否只能整体编辑/删除
    fn is_atomic(&self) -> bool;
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct TextNode {
    pub text: String,
    pub format: TextFormat,
    pub style: String,
    pub detail: u32,
    pub mode: TextMode,
}

impl TextNode {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            ..Self::default()
        }
    }

    pub fn with_format(mut self, format: TextFormat) -> Self {
        self.format = format;
        self
    }

    /// 两个文本节点是否可以合并（除文本外的属性都相同）。
    pub fn same_attributes(&self, other: &TextNode) -> bool {
        self.format == other.format
            && self.style == other.style
            && self.detail == other.detail
            && self.mode == other.mode
    }
}

impl InlineContent for TextNode {
    fn type_tag(&self) -> &'static str {
        record::TEXT_TYPE
    }

    fn text(&self) -> &str {
        &self.text
    }

    fn render(&self) -> Span {
        Span {
            text: self.text.clone(),
            format: self.format,
            reference: None,
        }
    }

    fn export_record(&self) -> Result<serde_json::Value, RecordError> {
        record::export_text(self)
    }

    fn export_html(&self) -> String {
        htmlize::escape_text(self.text.as_str()).into_owned()
    }

    fn is_atomic(&self) -> bool {
        self.mode == TextMode::Token
    }
}

/// mention token：不可拆分的行内节点。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MentionNode {
    /// 展示文本（候选人展示名）
    pub display_text: String,
    /// 引用 id（候选人 id）
    pub reference_id: String,
    pub format: TextFormat,
    pub style: String,
    pub detail: u32,
    pub mode: TextMode,
}

impl MentionNode {
    pub fn new(display_text: impl Into<String>, reference_id: impl Into<String>) -> Self {
        Self {
            display_text: display_text.into(),
            reference_id: reference_id.into(),
            format: TextFormat::empty(),
            style: String::new(),
            detail: 0,
            mode: TextMode::Token,
        }
    }

    pub fn from_candidate(candidate: &Candidate) -> Self {
        Self::new(candidate.display_name.clone(), candidate.id.clone())
    }
}

impl InlineContent for MentionNode {
    fn type_tag(&self) -> &'static str {
        record::MENTION_TYPE
    }

    fn text(&self) -> &str {
        &self.display_text
    }

    fn render(&self) -> Span {
        Span {
            text: self.display_text.clone(),
            format: self.format,
            reference: Some(self.reference_id.clone()),
        }
    }

    fn export_record(&self) -> Result<serde_json::Value, RecordError> {
        record::export_mention(self)
    }

    fn export_html(&self) -> String {
        record::export_mention_html(self)
    }

    fn is_atomic(&self) -> bool {
        true
    }
}

/// 行内节点（带标签的变体）。
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InlineNode {
    Text(TextNode),
    Mention(MentionNode),
}

impl InlineNode {
    pub fn as_text(&self) -> Option<&TextNode> {
        match self {
            InlineNode::Text(t) => Some(t),
            InlineNode::Mention(_) => None,
        }
    }

    pub fn as_text_mut(&mut self) -> Option<&mut TextNode> {
        match self {
            InlineNode::Text(t) => Some(t),
            InlineNode::Mention(_) => None,
        }
    }

    pub fn as_mention(&self) -> Option<&MentionNode> {
        match self {
            InlineNode::Mention(m) => Some(m),
            InlineNode::Text(_) => None,
        }
    }

    fn content(&self) -> &dyn InlineContent {
        match self {
            InlineNode::Text(t) => t,
            InlineNode::Mention(m) => m,
        }
    }
}

impl InlineContent for InlineNode {
    fn type_tag(&self) -> &'static str {
        self.content().type_tag()
    }

    fn text(&self) -> &str {
        self.content().text()
    }

    fn render(&self) -> Span {
        self.content().render()
    }

    fn export_record(&self) -> Result<serde_json::Value, RecordError> {
        self.content().export_record()
    }

    fn export_html(&self) -> String {
        self.content().export_html()
    }

    fn is_atomic(&self) -> bool {
        self.content().is_atomic()
    }
}

impl From<TextNode> for InlineNode {
    fn from(node: TextNode) -> Self {
        InlineNode::Text(node)
    }
}

impl From<MentionNode> for InlineNode {
    fn from(node: MentionNode) -> Self {
        InlineNode::Mention(node)
    }
}
