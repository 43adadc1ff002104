//! 整篇文档的 HTML 导出/导入。
//!
//! - 每个段落是一个 `<p>`；格式位对应 `<strong>` / `<em>` / `<u>` 等标签
//! - mention 为 `<span data-lexical-mention="true" data-mention-id="...">展示名</span>`
//! - 导入只识别上述结构，其余标签忽略、只保留文本；空的 mention 元素跳过并记入 `ImportReport`
use std::sync::LazyLock;

use mention_core::node::{InlineContent, InlineNode, TextFormat, TextNode};
use mention_core::record::{format_for_tag, html_attributes, is_mention_element, mention_from_html, wrap_format};
use regex::Regex;
use tracing::warn;

use crate::document::{Document, Paragraph};
use crate::export::{ImportReport, SkippedNode};

static TOKEN_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"<(/?)([A-Za-z][A-Za-z0-9]*)\b([^>]*)>|([^<]+)|(<)").expect("HTML 词法模式必须合法")
});

impl Document {
    pub fn to_html(&self) -> String {
        self.blocks()
            .iter()
            .map(|para| {
                let inner: String = para
                    .children
                    .iter()
                    .map(|node| {
                        let html = node.export_html();
                        if html.is_empty() {
                            html
                        } else {
                            wrap_format(html, node.render().format)
                        }
                    })
                    .collect();
                format!("<p>{inner}</p>")
            })
            .collect()
    }

    /// 从 HTML 重建文档；光标放在文档末尾。
    pub fn from_html(html: &str) -> (Document, ImportReport) {
        let mut parser = HtmlParser::default();
        for caps in TOKEN_PATTERN.captures_iter(html) {
            if let Some(text) = caps.get(4) {
                parser.text(&htmlize::unescape(text.as_str()));
            } else if caps.get(5).is_some() {
                parser.text("<");
            } else {
                let tag = caps[2].to_ascii_lowercase();
                if caps[1].is_empty() {
                    parser.open(&tag, &caps[3]);
                } else {
                    parser.close(&tag);
                }
            }
        }
        parser.finish()
    }
}

/// 正在读取的 mention 元素。
struct PendingMention {
    attrs: Vec<(String, String)>,
    text: String,
    format: TextFormat,
    /// 元素内部嵌套的 span 层数
    depth: usize,
}

#[derive(Default)]
struct HtmlParser {
    blocks: Vec<Paragraph>,
    current: Option<Vec<InlineNode>>,
    /// 打开中的行内标签及其格式位
    stack: Vec<(String, TextFormat)>,
    mention: Option<PendingMention>,
    report: ImportReport,
}

impl HtmlParser {
    fn format(&self) -> TextFormat {
        self.stack
            .iter()
            .fold(TextFormat::empty(), |acc, (_, flag)| acc | *flag)
    }

    fn text(&mut self, s: &str) {
        if let Some(m) = &mut self.mention {
            m.text.push_str(s);
            return;
        }
        // 段落之间的空白
        if self.current.is_none() && s.trim().is_empty() {
            return;
        }
        let node = TextNode::new(s).with_format(self.format());
        self.current
            .get_or_insert_with(Vec::new)
            .push(InlineNode::Text(node));
    }

    fn open(&mut self, tag: &str, raw_attrs: &str) {
        if let Some(m) = &mut self.mention {
            if tag == "span" {
                m.depth += 1;
            }
            return;
        }
        match tag {
            "p" | "div" | "br" => {
                self.flush();
                self.current = Some(Vec::new());
            }
            "span" => {
                let attrs = html_attributes(raw_attrs);
                if is_mention_element(&attrs) {
                    self.mention = Some(PendingMention {
                        attrs,
                        text: String::new(),
                        format: self.format(),
                        depth: 0,
                    });
                } else {
                    self.stack.push((tag.to_owned(), TextFormat::empty()));
                }
            }
            _ => {
                if let Some(flag) = format_for_tag(tag) {
                    self.stack.push((tag.to_owned(), flag));
                }
            }
        }
    }

    fn close(&mut self, tag: &str) {
        if let Some(m) = &mut self.mention {
            if tag != "span" {
                return;
            }
            if m.depth > 0 {
                m.depth -= 1;
                return;
            }
            self.finish_mention();
            return;
        }
        match tag {
            "p" | "div" => self.flush(),
            _ => {
                if let Some(i) = self.stack.iter().rposition(|(t, _)| t == tag) {
                    self.stack.truncate(i);
                }
            }
        }
    }

    fn finish_mention(&mut self) {
        let Some(pending) = self.mention.take() else {
            return;
        };
        let block = self.blocks.len();
        let children = self.current.get_or_insert_with(Vec::new);
        match mention_from_html(&pending.attrs, &pending.text) {
            Ok(InlineNode::Mention(mut node)) => {
                node.format = pending.format;
                children.push(InlineNode::Mention(node));
            }
            Ok(other) => children.push(other),
            Err(error) => {
                let index = children.len();
                warn!(block, index, %error, "skipping mention element");
                self.report.skipped.push(SkippedNode { block, index, error });
            }
        }
    }

    fn flush(&mut self) {
        if let Some(children) = self.current.take() {
            self.blocks.push(Paragraph::new(children));
        }
    }

    fn finish(mut self) -> (Document, ImportReport) {
        self.finish_mention();
        self.flush();
        (Document::from_paragraphs(self.blocks), self.report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mention_core::node::MentionNode;

    #[test]
    fn test_html_shape() {
        let doc = Document::from_paragraphs(vec![Paragraph::new(vec![
            InlineNode::Text(TextNode::new("a < b ")),
            InlineNode::Mention(MentionNode::new("Albert Chen", "2")),
        ])]);
        assert_eq!(
            doc.to_html(),
            r#"<p>a &lt; b <span data-lexical-mention="true" data-mention-id="2">Albert Chen</span></p>"#
        );
    }

    #[test]
    fn test_html_round_trip_keeps_mentions_and_format() {
        let mut bold = MentionNode::new("Bob", "3");
        bold.format = TextFormat::BOLD;
        let doc = Document::from_paragraphs(vec![
            Paragraph::new(vec![
                InlineNode::Text(TextNode::new("hi ").with_format(TextFormat::ITALIC)),
                InlineNode::Mention(bold),
            ]),
            Paragraph::new(vec![InlineNode::Text(TextNode::new("second & last"))]),
        ]);
        let (back, report) = Document::from_html(&doc.to_html());
        assert!(report.is_clean());
        assert_eq!(back.blocks(), doc.blocks());
    }

    #[test]
    fn test_foreign_html_keeps_text() {
        let html = r#"
            <p>Hello <b>there</b> <span class="x">friend</span></p>
            <p><span data-lexical-mention="true">Grace Lee</span><img src="a.png"/></p>
        "#;
        let (doc, report) = Document::from_html(html);
        assert!(report.is_clean());
        assert_eq!(doc.plain_text(), "Hello there friend\nGrace Lee");
        let bold = doc.blocks()[0].children[1].as_text().unwrap();
        assert_eq!(bold.text, "there");
        assert_eq!(bold.format, TextFormat::BOLD);
        let mention = doc.blocks()[1].children[1].as_mention().unwrap();
        assert_eq!(mention.reference_id, "Grace Lee");
    }

    #[test]
    fn test_empty_mention_element_is_skipped() {
        let (doc, report) =
            Document::from_html(r#"<p>x<span data-lexical-mention="true"></span>y</p>"#);
        assert_eq!(doc.plain_text(), "xy");
        assert_eq!(report.skipped.len(), 1);
        assert_eq!(report.skipped[0].index, 1);
    }
}
