//! 整篇文档的 JSON 导出/导入。
//!
//! 格式：
//! `{ "root": { "type": "root", "version": 1, "children": [
//!     { "type": "paragraph", "version": 1, "children": [ <节点记录> ] } ] } }`
//!
//! 单个节点导入失败时跳过该节点并记入 `ImportReport`，不影响其余内容。
use mention_core::error::RecordError;
use mention_core::node::InlineContent;
use mention_core::record::NodeRegistry;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::warn;

use crate::document::{Document, Paragraph};
use crate::error::DocError;

const ROOT_TYPE: &str = "root";
const PARAGRAPH_TYPE: &str = "paragraph";
const BLOCK_VERSION: u64 = 1;

#[derive(Debug, Serialize, Deserialize)]
struct Envelope {
    root: BlockRecord,
}

#[derive(Debug, Serialize, Deserialize)]
struct BlockRecord {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default = "default_version")]
    version: u64,
    #[serde(default)]
    children: Vec<Value>,
}

fn default_version() -> u64 {
    BLOCK_VERSION
}

/// 被跳过的节点。
#[derive(Debug)]
pub struct SkippedNode {
    pub block: usize,
    pub index: usize,
    pub error: RecordError,
}

/// 导入过程中被跳过的内容。
#[derive(Debug, Default)]
pub struct ImportReport {
    pub skipped: Vec<SkippedNode>,
    /// 不是 paragraph 的顶层块
    pub skipped_blocks: Vec<usize>,
}

impl ImportReport {
    pub fn is_clean(&self) -> bool {
        self.skipped.is_empty() && self.skipped_blocks.is_empty()
    }
}

impl Document {
    pub fn export_value(&self) -> Result<Value, DocError> {
        Ok(serde_json::to_value(self.envelope()?)?)
    }

    pub fn to_json_string(&self) -> Result<String, DocError> {
        Ok(serde_json::to_string(&self.envelope()?)?)
    }

    fn envelope(&self) -> Result<Envelope, DocError> {
        let mut children = Vec::with_capacity(self.blocks().len());
        for para in self.blocks() {
            let records = para
                .children
                .iter()
                .map(InlineContent::export_record)
                .collect::<Result<Vec<_>, _>>()?;
            children.push(serde_json::to_value(BlockRecord {
                kind: PARAGRAPH_TYPE.to_owned(),
                version: BLOCK_VERSION,
                children: records,
            })?);
        }
        Ok(Envelope {
            root: BlockRecord {
                kind: ROOT_TYPE.to_owned(),
                version: BLOCK_VERSION,
                children,
            },
        })
    }

    /// 从 JSON 重建文档；光标放在文档末尾。
    pub fn from_json(json: &str, registry: &NodeRegistry) -> Result<(Document, ImportReport), DocError> {
        let envelope: Envelope = serde_json::from_str(json)?;
        if envelope.root.kind != ROOT_TYPE {
            return Err(DocError::UnexpectedRoot(envelope.root.kind));
        }

        let mut report = ImportReport::default();
        let mut blocks = Vec::with_capacity(envelope.root.children.len());
        for (b, value) in envelope.root.children.into_iter().enumerate() {
            let block = match serde_json::from_value::<BlockRecord>(value) {
                Ok(block) if block.kind == PARAGRAPH_TYPE => block,
                Ok(block) => {
                    warn!(block = b, kind = %block.kind, "skipping unsupported block");
                    report.skipped_blocks.push(b);
                    continue;
                }
                Err(err) => {
                    warn!(block = b, %err, "skipping malformed block");
                    report.skipped_blocks.push(b);
                    continue;
                }
            };
            let mut children = Vec::with_capacity(block.children.len());
            for (index, record) in block.children.iter().enumerate() {
                match registry.import(record) {
                    Ok(node) => children.push(node),
                    Err(error) => {
                        warn!(block = b, index, %error, "skipping node record");
                        report.skipped.push(SkippedNode {
                            block: b,
                            index,
                            error,
                        });
                    }
                }
            }
            blocks.push(Paragraph::new(children));
        }
        Ok((Document::from_paragraphs(blocks), report))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mention_core::node::{InlineNode, MentionNode, TextFormat, TextNode};

    #[test]
    fn test_export_shape() {
        let doc = Document::from_paragraphs(vec![Paragraph::new(vec![
            InlineNode::Text(TextNode::new("Hello ")),
            InlineNode::Mention(MentionNode::new("Albert Chen", "2")),
        ])]);
        let value = doc.export_value().unwrap();
        assert_eq!(value["root"]["type"], "root");
        let para = &value["root"]["children"][0];
        assert_eq!(para["type"], "paragraph");
        assert_eq!(para["children"][0]["text"], "Hello ");
        assert_eq!(para["children"][1]["type"], "mention");
        assert_eq!(para["children"][1]["mentionName"], "Albert Chen");
        // 末尾补齐的空文本节点
        assert_eq!(para["children"][2]["text"], "");
    }

    #[test]
    fn test_round_trip_preserves_tokens_and_format() {
        let mut bold = MentionNode::new("Bob", "3");
        bold.format = TextFormat::BOLD;
        let doc = Document::from_paragraphs(vec![
            Paragraph::new(vec![
                InlineNode::Text(TextNode::new("hi ").with_format(TextFormat::ITALIC)),
                InlineNode::Mention(bold),
            ]),
            Paragraph::new(vec![InlineNode::Text(TextNode::new("second"))]),
        ]);
        let json = doc.to_json_string().unwrap();
        let (back, report) = Document::from_json(&json, &NodeRegistry::default()).unwrap();
        assert!(report.is_clean());
        assert_eq!(back.blocks(), doc.blocks());
        assert_eq!(back.plain_text(), "hi Bob\nsecond");
    }

    #[test]
    fn test_bad_node_is_skipped_and_reported() {
        let json = r#"{"root":{"type":"root","version":1,"children":[
            {"type":"paragraph","version":1,"children":[
                {"type":"text","version":1,"text":"a "},
                {"type":"mention","version":2,"mention":"1","mentionName":"Alice"},
                {"type":"mention","version":1,"mention":"3"},
                {"type":"image","version":1},
                {"type":"text","version":1,"text":"b"}
            ]}
        ]}}"#;
        let (doc, report) = Document::from_json(json, &NodeRegistry::default()).unwrap();
        assert_eq!(doc.plain_text(), "a b");
        let skipped: Vec<usize> = report.skipped.iter().map(|s| s.index).collect();
        assert_eq!(skipped, vec![1, 2, 3]);
        assert!(matches!(
            report.skipped[1].error,
            RecordError::MissingField("mentionName")
        ));
        assert!(matches!(report.skipped[2].error, RecordError::UnknownType(_)));
    }

    #[test]
    fn test_wrong_root_or_malformed_json_fails() {
        let registry = NodeRegistry::default();
        let err = Document::from_json(r#"{"root":{"type":"paragraph","children":[]}}"#, &registry)
            .err()
            .unwrap();
        assert!(matches!(err, DocError::UnexpectedRoot(kind) if kind == "paragraph"));
        assert!(matches!(
            Document::from_json("{not json", &registry),
            Err(DocError::Json(_))
        ));
    }

    #[test]
    fn test_empty_root_gives_single_empty_paragraph() {
        let json = r#"{"root":{"type":"root","version":1,"children":[]}}"#;
        let (doc, _) = Document::from_json(json, &NodeRegistry::default()).unwrap();
        assert_eq!(doc.blocks().len(), 1);
        assert_eq!(doc.plain_text(), "");
    }
}
