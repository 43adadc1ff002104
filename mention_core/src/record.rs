//! 节点的持久化记录（导出/导入）以及类型标签 registry。
//!
//! mention 记录：
//! `{ "type": "mention", "version": 1, "mention": <reference_id>, "mentionName": <display_text>,
//!    "text", "format", "detail", "style", "mode" }`
//!
//! mention 的 HTML 形式：`<span data-lexical-mention="true" data-mention-id="...">展示名</span>`
use std::collections::HashMap;
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::RecordError;
use crate::node::{InlineNode, MentionNode, TextFormat, TextMode, TextNode};

pub const TEXT_TYPE: &str = "text";
pub const MENTION_TYPE: &str = "mention";
/// 目前唯一支持的记录版本
pub const RECORD_VERSION: u64 = 1;

#[derive(Debug, Serialize, Deserialize)]
struct TextRecord {
    #[serde(rename = "type")]
    kind: String,
    version: u64,
    #[serde(default)]
    text: String,
    #[serde(default)]
    format: u32,
    #[serde(default)]
    detail: u32,
    #[serde(default)]
    style: String,
    #[serde(default)]
    mode: TextMode,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct MentionRecord {
    #[serde(rename = "type")]
    kind: String,
    version: u64,
    #[serde(default)]
    mention: Option<String>,
    #[serde(default)]
    mention_name: Option<String>,
    #[serde(default)]
    text: String,
    #[serde(default)]
    format: u32,
    #[serde(default)]
    detail: u32,
    #[serde(default)]
    style: String,
    /// 缺省时按 token 处理
    #[serde(default)]
    mode: Option<TextMode>,
}

pub(crate) fn export_text(node: &TextNode) -> Result<Value, RecordError> {
    let record = TextRecord {
        kind: TEXT_TYPE.to_owned(),
        version: RECORD_VERSION,
        text: node.text.clone(),
        format: node.format.bits(),
        detail: node.detail,
        style: node.style.clone(),
        mode: node.mode,
    };
    Ok(serde_json::to_value(&record)?)
}

pub(crate) fn export_mention(node: &MentionNode) -> Result<Value, RecordError> {
    let record = MentionRecord {
        kind: MENTION_TYPE.to_owned(),
        version: RECORD_VERSION,
        mention: Some(node.reference_id.clone()),
        mention_name: Some(node.display_text.clone()),
        text: node.display_text.clone(),
        format: node.format.bits(),
        detail: node.detail,
        style: node.style.clone(),
        mode: Some(node.mode),
    };
    Ok(serde_json::to_value(&record)?)
}

/// 校验 `type` 与 `version`，两者不符都视为导入失败。
fn check_header(value: &Value, expected: &'static str) -> Result<(), RecordError> {
    let obj = value.as_object().ok_or(RecordError::NotAnObject)?;
    let kind = obj
        .get("type")
        .and_then(Value::as_str)
        .ok_or(RecordError::MissingType)?;
    if kind != expected {
        return Err(RecordError::TypeMismatch {
            expected,
            got: kind.to_owned(),
        });
    }
    let version = obj.get("version").and_then(Value::as_u64);
    if version != Some(RECORD_VERSION) {
        return Err(RecordError::UnsupportedVersion {
            kind: expected,
            version,
        });
    }
    Ok(())
}

pub fn import_text(value: &Value) -> Result<InlineNode, RecordError> {
    check_header(value, TEXT_TYPE)?;
    let record: TextRecord = serde_json::from_value(value.clone())?;
    Ok(InlineNode::Text(TextNode {
        text: record.text,
        format: TextFormat::from_bits_truncate(record.format),
        style: record.style,
        detail: record.detail,
        mode: record.mode,
    }))
}

pub fn import_mention(value: &Value) -> Result<InlineNode, RecordError> {
    check_header(value, MENTION_TYPE)?;
    let record: MentionRecord = serde_json::from_value(value.clone())?;
    // mention 不允许为空（零宽 token 无法被选中或删除）
    let display_text = record
        .mention_name
        .filter(|name| !name.is_empty())
        .ok_or(RecordError::MissingField("mentionName"))?;
    let reference_id = record.mention.ok_or(RecordError::MissingField("mention"))?;
    Ok(InlineNode::Mention(MentionNode {
        display_text,
        reference_id,
        format: TextFormat::from_bits_truncate(record.format),
        style: record.style,
        detail: record.detail,
        mode: record.mode.unwrap_or(TextMode::Token),
    }))
}

/// 标记 mention 元素的属性
pub const MENTION_HTML_ATTR: &str = "data-lexical-mention";
/// mention 引用 id；缺省时用展示名
pub const MENTION_ID_HTML_ATTR: &str = "data-mention-id";

/// 格式位与 HTML 标签的对应关系（导出时按此顺序由外向内包裹）。
pub const FORMAT_TAGS: [(TextFormat, &str); 7] = [
    (TextFormat::BOLD, "strong"),
    (TextFormat::ITALIC, "em"),
    (TextFormat::STRIKETHROUGH, "s"),
    (TextFormat::UNDERLINE, "u"),
    (TextFormat::CODE, "code"),
    (TextFormat::SUBSCRIPT, "sub"),
    (TextFormat::SUPERSCRIPT, "sup"),
];

static SPAN_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?s)^\s*<span\b([^>]*)>(.*)</span>\s*$").expect("span 模式必须合法")
});

static ATTR_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"([A-Za-z_:][-A-Za-z0-9_:.]*)(?:\s*=\s*(?:"([^"]*)"|'([^']*)'))?"#)
        .expect("属性模式必须合法")
});

static TAG_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"<[^>]*>").expect("标签模式必须合法"));

/// 标签名 -> 格式位（也接受 `b` / `i` / `strike` 等常见写法）。
pub fn format_for_tag(tag: &str) -> Option<TextFormat> {
    let tag = tag.to_ascii_lowercase();
    let tag = match tag.as_str() {
        "b" => "strong",
        "i" => "em",
        "strike" | "del" => "s",
        other => other,
    };
    FORMAT_TAGS
        .iter()
        .find(|(_, name)| *name == tag)
        .map(|(flag, _)| *flag)
}

/// 用格式标签包裹 HTML 片段。
pub fn wrap_format(html: String, format: TextFormat) -> String {
    let mut out = html;
    for (flag, tag) in FORMAT_TAGS.iter().rev() {
        if format.contains(*flag) {
            out = format!("<{tag}>{out}</{tag}>");
        }
    }
    out
}

/// 解析标签内的属性（值已反转义；无值属性的值为空串）。
pub fn html_attributes(raw: &str) -> Vec<(String, String)> {
    ATTR_PATTERN
        .captures_iter(raw)
        .map(|caps| {
            let value = caps.get(2).or_else(|| caps.get(3)).map_or("", |m| m.as_str());
            (
                caps[1].to_ascii_lowercase(),
                htmlize::unescape_attribute(value).into_owned(),
            )
        })
        .collect()
}

pub fn is_mention_element(attrs: &[(String, String)]) -> bool {
    attrs.iter().any(|(name, _)| name == MENTION_HTML_ATTR)
}

pub fn export_mention_html(node: &MentionNode) -> String {
    format!(
        r#"<span {MENTION_HTML_ATTR}="true" {MENTION_ID_HTML_ATTR}="{}">{}</span>"#,
        htmlize::escape_attribute(node.reference_id.as_str()),
        htmlize::escape_text(node.display_text.as_str()),
    )
}

/// 由 mention 元素的属性与文本内容构建节点；文本为空时拒绝。
pub fn mention_from_html(attrs: &[(String, String)], text: &str) -> Result<InlineNode, RecordError> {
    if text.is_empty() {
        return Err(RecordError::MissingField("mentionName"));
    }
    let reference_id = attrs
        .iter()
        .find(|(name, value)| name == MENTION_ID_HTML_ATTR && !value.is_empty())
        .map_or(text, |(_, value)| value.as_str());
    Ok(InlineNode::Mention(MentionNode::new(text, reference_id)))
}

/// 导入单个 mention 元素；内部标签只取文本内容。
pub fn import_mention_html(html: &str) -> Result<InlineNode, RecordError> {
    let caps = SPAN_PATTERN
        .captures(html)
        .ok_or(RecordError::NotMentionElement)?;
    let attrs = html_attributes(&caps[1]);
    if !is_mention_element(&attrs) {
        return Err(RecordError::NotMentionElement);
    }
    let inner = TAG_PATTERN.replace_all(&caps[2], "");
    let text = htmlize::unescape(inner.as_ref());
    mention_from_html(&attrs, &text)
}

pub type ImportFn = fn(&Value) -> Result<InlineNode, RecordError>;

/// 类型标签 -> 导入函数。
///
/// 默认注册 `text` 与 `mention`；宿主可以追加自己的节点类型。
#[derive(Clone)]
pub struct NodeRegistry {
    importers: HashMap<String, ImportFn>,
}

impl Default for NodeRegistry {
    fn default() -> Self {
        let mut registry = Self::empty();
        registry.register(TEXT_TYPE, import_text);
        registry.register(MENTION_TYPE, import_mention);
        registry
    }
}

impl NodeRegistry {
    pub fn empty() -> Self {
        Self {
            importers: HashMap::new(),
        }
    }

    /// 注册（或替换）一个类型标签，返回被替换的旧函数。
    pub fn register(&mut self, tag: impl Into<String>, import: ImportFn) -> Option<ImportFn> {
        self.importers.insert(tag.into(), import)
    }

    pub fn contains(&self, tag: &str) -> bool {
        self.importers.contains_key(tag)
    }

    pub fn import(&self, value: &Value) -> Result<InlineNode, RecordError> {
        let tag = value
            .as_object()
            .ok_or(RecordError::NotAnObject)?
            .get("type")
            .and_then(Value::as_str)
            .ok_or(RecordError::MissingType)?;
        let import = self
            .importers
            .get(tag)
            .ok_or_else(|| RecordError::UnknownType(tag.to_owned()))?;
        import(value)
    }

    pub fn import_str(&self, json: &str) -> Result<InlineNode, RecordError> {
        let value: Value = serde_json::from_str(json)?;
        self.import(&value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node::InlineContent;
    use serde_json::json;

    #[test]
    fn test_mention_export_shape() {
        let node = MentionNode::new("Alice", "u-1");
        let value = node.export_record().unwrap();
        assert_eq!(value["type"], "mention");
        assert_eq!(value["version"], 1);
        assert_eq!(value["mention"], "u-1");
        assert_eq!(value["mentionName"], "Alice");
        assert_eq!(value["text"], "Alice");
        assert_eq!(value["mode"], "token");
        assert_eq!(value["format"], 0);
    }

    #[test]
    fn test_mention_round_trip_keeps_text_and_reference() {
        let mut node = MentionNode::new("Albert", "2");
        node.format = TextFormat::BOLD | TextFormat::UNDERLINE;
        let registry = NodeRegistry::default();
        let back = registry.import(&node.export_record().unwrap()).unwrap();
        let back = back.as_mention().unwrap();
        assert_eq!(back.display_text, "Albert");
        assert_eq!(back.reference_id, "2");
        assert_eq!(back.format, TextFormat::BOLD | TextFormat::UNDERLINE);
        assert_eq!(back.mode, TextMode::Token);
    }

    #[test]
    fn test_text_round_trip() {
        let node = TextNode::new("Hello ").with_format(TextFormat::ITALIC);
        let back = NodeRegistry::default()
            .import(&node.export_record().unwrap())
            .unwrap();
        assert_eq!(back, InlineNode::Text(node));
    }

    #[test]
    fn test_unknown_version_is_rejected() {
        let value = json!({"type": "mention", "version": 2, "mention": "1", "mentionName": "A"});
        let err = import_mention(&value).unwrap_err();
        assert!(matches!(
            err,
            RecordError::UnsupportedVersion { kind: "mention", version: Some(2) }
        ));
    }

    #[test]
    fn test_missing_version_is_rejected() {
        let value = json!({"type": "mention", "mention": "1", "mentionName": "A"});
        assert!(matches!(
            import_mention(&value),
            Err(RecordError::UnsupportedVersion { version: None, .. })
        ));
    }

    #[test]
    fn test_missing_mention_fields_are_rejected() {
        let no_name = json!({"type": "mention", "version": 1, "mention": "1"});
        assert!(matches!(
            import_mention(&no_name),
            Err(RecordError::MissingField("mentionName"))
        ));
        let empty_name = json!({"type": "mention", "version": 1, "mention": "1", "mentionName": ""});
        assert!(matches!(
            import_mention(&empty_name),
            Err(RecordError::MissingField("mentionName"))
        ));
        let no_ref = json!({"type": "mention", "version": 1, "mentionName": "A"});
        assert!(matches!(
            import_mention(&no_ref),
            Err(RecordError::MissingField("mention"))
        ));
    }

    #[test]
    fn test_inherited_fields_default_when_absent() {
        let value = json!({"type": "mention", "version": 1, "mention": "7", "mentionName": "Grace"});
        let node = import_mention(&value).unwrap();
        let node = node.as_mention().unwrap();
        assert_eq!(node.format, TextFormat::empty());
        assert_eq!(node.mode, TextMode::Token);
        assert!(node.style.is_empty());
    }

    #[test]
    fn test_registry_rejects_unknown_tag() {
        let registry = NodeRegistry::default();
        let err = registry
            .import_str(r#"{"type": "image", "version": 1}"#)
            .unwrap_err();
        assert!(matches!(err, RecordError::UnknownType(tag) if tag == "image"));
    }

    #[test]
    fn test_registry_rejects_type_confusion() {
        let value = json!({"type": "text", "version": 1, "text": "x"});
        assert!(matches!(
            import_mention(&value),
            Err(RecordError::TypeMismatch { expected: "mention", .. })
        ));
    }

    #[test]
    fn test_mention_html_round_trip() {
        let node = MentionNode::new("Tom & \"Jerry\"", "u<1>");
        let html = export_mention_html(&node);
        assert!(html.starts_with(r#"<span data-lexical-mention="true""#));
        assert!(html.contains("Tom &amp; "));
        let back = import_mention_html(&html).unwrap();
        assert_eq!(back, InlineNode::Mention(node));
    }

    #[test]
    fn test_mention_html_without_id_uses_text() {
        let back = import_mention_html(r#"<span data-lexical-mention="true">Grace Lee</span>"#).unwrap();
        let back = back.as_mention().unwrap();
        assert_eq!(back.display_text, "Grace Lee");
        assert_eq!(back.reference_id, "Grace Lee");
        assert_eq!(back.mode, TextMode::Token);
    }

    #[test]
    fn test_mention_html_rejects_plain_or_empty_span() {
        assert!(matches!(
            import_mention_html("<span>Grace</span>"),
            Err(RecordError::NotMentionElement)
        ));
        assert!(matches!(
            import_mention_html("<b>Grace</b>"),
            Err(RecordError::NotMentionElement)
        ));
        assert!(matches!(
            import_mention_html(r#"<span data-lexical-mention="true"></span>"#),
            Err(RecordError::MissingField("mentionName"))
        ));
    }

    #[test]
    fn test_format_tags() {
        assert_eq!(format_for_tag("B"), Some(TextFormat::BOLD));
        assert_eq!(format_for_tag("u"), Some(TextFormat::UNDERLINE));
        assert_eq!(format_for_tag("span"), None);
        assert_eq!(
            wrap_format("x".to_owned(), TextFormat::ITALIC | TextFormat::BOLD),
            "<strong><em>x</em></strong>"
        );
    }

    #[test]
    fn test_empty_registry_knows_nothing() {
        let mut registry = NodeRegistry::empty();
        assert!(!registry.contains("text"));
        assert!(registry.register("text", import_text).is_none());
        assert!(registry.contains("text"));
    }
}
