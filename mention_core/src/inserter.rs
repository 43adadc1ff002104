//! `inserter`：把触发区间替换成 mention token。
//!
//! 区间为“离光标最近的触发字符（含）”到“光标（不含）”，必须位于同一个纯文本节点内。
//! 选区不是简单光标/区间、或找不到触发字符时静默放弃（不做部分插入）。
use tracing::debug;

use crate::error::HostError;
use crate::host::{DocumentHost, NodePath, Selection, caret_text};
use crate::model::Candidate;
use crate::node::{InlineNode, MentionNode};

/// 在宿主的 update 事务内插入 mention。
///
/// 返回新 token 的位置；`Ok(None)` 表示前置条件不满足，文档未被修改。
/// 插入后光标落在 token 之后。
pub fn insert_mention<H: DocumentHost>(
    host: &mut H,
    trigger: char,
    candidate: &Candidate,
) -> Result<Option<NodePath>, HostError> {
    host.update(|txn| {
        let Some((node, span, format)) = caret_text(&*txn).and_then(|caret| {
            let start = caret.before().rfind(trigger)?;
            let format = txn.node(caret.node)?.as_text()?.format;
            Some((caret.node, start..caret.offset, format))
        }) else {
            debug!(candidate = %candidate.id, "mention insert skipped: no trigger span at caret");
            return Ok(None);
        };

        let mut mention = MentionNode::from_candidate(candidate);
        mention.format = format;
        let path = txn.replace_text_span(node, span, InlineNode::Mention(mention))?;
        let after = txn.position_after(path);
        txn.set_selection(after.map(Selection::caret));
        Ok(Some(path))
    })
}
