//! `Document`：段落 + 行内节点树，外加选区。
//!
//! 结构约定（每次 update 之后由 `normalize` 保证）：
//! - 每个段落至少有一个节点，首尾都是文本节点
//! - mention 两侧都是文本节点（可以为空），所以光标总是落在文本节点里
//! - 相邻且属性相同的文本节点会被合并
//!
//! mention 采用 token 模式：光标移动与删除都把它当作一个整体。
//!
//! 每次改变了内容的 update 记入撤销历史；只移动选区的 update 不记录。
use std::ops::Range;

use mention_core::error::HostError;
use mention_core::host::{DocumentHost, NodePath, Position, ReadTxn, Selection, UpdateTxn};
use mention_core::key_event::InputEvent;
use mention_core::model::{Point, Rect};
use mention_core::node::{InlineContent, InlineNode, Span, TextFormat, TextNode};
use tracing::trace;

use crate::layout::LayoutMetrics;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Paragraph {
    pub children: Vec<InlineNode>,
}

impl Default for Paragraph {
    fn default() -> Self {
        Self {
            children: vec![InlineNode::Text(TextNode::default())],
        }
    }
}

impl Paragraph {
    pub fn new(children: Vec<InlineNode>) -> Self {
        Self { children }
    }

    pub fn plain_text(&self) -> String {
        self.children.iter().map(|n| n.text()).collect()
    }

    fn flat_len(&self) -> usize {
        self.children.iter().map(node_len).sum()
    }
}

/// 每次 update 之后推送给监听者的快照。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EditorState {
    pub version: u64,
    /// 纯文本（段落之间用 `\n` 连接）
    pub text: String,
    pub selection: Option<Selection>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

type UpdateListener = Box<dyn FnMut(&EditorState)>;

/// 扁平坐标：段落下标 + 段内字节偏移（mention 按其文本长度计）。
type Flat = (usize, usize);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Affinity {
    /// 边界上优先取左侧节点
    Left,
    /// 边界上优先取右侧节点
    Right,
}

/// 光标前/后的一个编辑单位。
#[derive(Debug, Clone, PartialEq, Eq)]
enum Unit {
    Char { node: NodePath, range: Range<usize> },
    Mention(NodePath),
    /// 段落边界
    Boundary,
}

/// 撤销历史的最大深度
const HISTORY_LIMIT: usize = 100;

/// 一次 update 之前的内容与选区。
#[derive(Debug, Clone)]
struct Snapshot {
    blocks: Vec<Paragraph>,
    selection: Option<Selection>,
}

pub struct Document {
    blocks: Vec<Paragraph>,
    selection: Option<Selection>,
    /// 光标处折叠状态下切换的格式，下一次输入时生效
    pending_format: Option<TextFormat>,
    layout: LayoutMetrics,
    version: u64,
    listeners: Vec<(ListenerId, UpdateListener)>,
    next_listener: u64,
    undo_stack: Vec<Snapshot>,
    redo_stack: Vec<Snapshot>,
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

fn node_len(node: &InlineNode) -> usize {
    node.text().len()
}

fn text_piece(from: &TextNode, text: &str, format: TextFormat) -> InlineNode {
    InlineNode::Text(TextNode {
        text: text.to_owned(),
        format,
        ..from.clone()
    })
}

/// 截取段内扁平区间 `[from, to)` 的节点；mention 只有完全落在区间内才保留。
fn slice_children(children: &[InlineNode], from: usize, to: usize) -> Vec<InlineNode> {
    let mut out = Vec::new();
    let mut start = 0;
    for child in children {
        let end = start + node_len(child);
        match child {
            InlineNode::Text(t) => {
                let (s, e) = (from.max(start), to.min(end));
                if s < e {
                    out.push(text_piece(t, &t.text[s - start..e - start], t.format));
                }
            }
            InlineNode::Mention(_) => {
                if from <= start && end <= to && from < to {
                    out.push(child.clone());
                }
            }
        }
        start = end;
    }
    out
}

/// 在 `[from, to)` 内设置/清除格式位，必要时拆分文本节点。
fn reformat_children(
    children: Vec<InlineNode>,
    from: usize,
    to: usize,
    flag: TextFormat,
    enable: bool,
) -> Vec<InlineNode> {
    let mut out = Vec::with_capacity(children.len() + 2);
    let mut start = 0;
    for child in children {
        let end = start + node_len(&child);
        match child {
            InlineNode::Text(t) => {
                let (s, e) = (from.clamp(start, end), to.clamp(start, end));
                if s >= e {
                    out.push(InlineNode::Text(t));
                } else {
                    let (a, b) = (s - start, e - start);
                    let mut format = t.format;
                    format.set(flag, enable);
                    if a > 0 {
                        out.push(text_piece(&t, &t.text[..a], t.format));
                    }
                    out.push(text_piece(&t, &t.text[a..b], format));
                    if b < t.text.len() {
                        out.push(text_piece(&t, &t.text[b..], t.format));
                    }
                }
            }
            InlineNode::Mention(mut m) => {
                if from <= start && end <= to && from < to {
                    m.format.set(flag, enable);
                }
                out.push(InlineNode::Mention(m));
            }
        }
        start = end;
    }
    out
}

fn remap(points: &mut [Position], block: usize, map: &[(usize, usize)]) {
    for p in points.iter_mut().filter(|p| p.node.block == block) {
        if let Some(&(index, shift)) = map.get(p.node.index) {
            p.node.index = index;
            p.offset += shift;
        }
    }
}

/// 补齐 mention 两侧与段落首尾的文本节点。
fn flank(children: Vec<InlineNode>, block: usize, points: &mut [Position]) -> Vec<InlineNode> {
    let mut out = Vec::with_capacity(children.len() + 2);
    let mut map = Vec::with_capacity(children.len());
    for child in children {
        if matches!(child, InlineNode::Mention(_)) && !matches!(out.last(), Some(InlineNode::Text(_)))
        {
            out.push(InlineNode::Text(TextNode::default()));
        }
        map.push((out.len(), 0));
        out.push(child);
    }
    if !matches!(out.last(), Some(InlineNode::Text(_))) {
        out.push(InlineNode::Text(TextNode::default()));
    }
    remap(points, block, &map);
    out
}

/// 合并相邻的同属性文本节点，去掉多余的空文本节点（被选区引用的除外）。
fn merge_text(children: Vec<InlineNode>, block: usize, points: &mut [Position]) -> Vec<InlineNode> {
    let mut merged: Vec<InlineNode> = Vec::with_capacity(children.len());
    // merged 中每个节点是否被选区引用
    let mut pinned: Vec<bool> = Vec::with_capacity(children.len());
    let mut map = Vec::with_capacity(children.len());
    for (old, child) in children.into_iter().enumerate() {
        let referenced = points.iter().any(|p| p.node == NodePath::new(block, old));
        if let (Some(InlineNode::Text(prev)), InlineNode::Text(cur)) = (merged.last_mut(), &child) {
            let last = pinned.len() - 1;
            if prev.same_attributes(cur) {
                map.push((last, prev.text.len()));
                prev.text.push_str(&cur.text);
                pinned[last] |= referenced;
                continue;
            }
            if cur.text.is_empty() && !referenced {
                map.push((last, prev.text.len()));
                continue;
            }
            if prev.text.is_empty() && !pinned[last] {
                *prev = cur.clone();
                map.push((last, 0));
                pinned[last] = referenced;
                continue;
            }
        }
        map.push((merged.len(), 0));
        merged.push(child);
        pinned.push(referenced);
    }
    remap(points, block, &map);
    merged
}

impl Document {
    pub fn new() -> Self {
        Self::from_paragraphs(vec![Paragraph::default()])
    }

    /// 由段落构建文档；光标放在文档末尾。
    pub fn from_paragraphs(blocks: Vec<Paragraph>) -> Self {
        let mut doc = Self {
            blocks,
            selection: None,
            pending_format: None,
            layout: LayoutMetrics::default(),
            version: 0,
            listeners: Vec::new(),
            next_listener: 0,
            undo_stack: Vec::new(),
            redo_stack: Vec::new(),
        };
        doc.normalize();
        doc
    }

    pub fn with_layout(mut self, layout: LayoutMetrics) -> Self {
        self.layout = layout;
        self
    }

    pub fn blocks(&self) -> &[Paragraph] {
        &self.blocks
    }

    pub fn selection(&self) -> Option<Selection> {
        self.selection
    }

    pub fn version(&self) -> u64 {
        self.version
    }

    pub fn layout(&self) -> &LayoutMetrics {
        &self.layout
    }

    pub fn set_scroll(&mut self, scroll: Point) {
        self.layout.scroll = scroll;
    }

    pub fn plain_text(&self) -> String {
        self.blocks
            .iter()
            .map(Paragraph::plain_text)
            .collect::<Vec<_>>()
            .join("\n")
    }

    pub fn render(&self) -> Vec<Vec<Span>> {
        self.blocks
            .iter()
            .map(|p| p.children.iter().map(InlineContent::render).collect())
            .collect()
    }

    /// 下一次输入使用的格式。
    pub fn typing_format(&self) -> TextFormat {
        self.pending_format
            .or_else(|| self.caret_format())
            .unwrap_or_default()
    }

    pub fn state(&self) -> EditorState {
        EditorState {
            version: self.version,
            text: self.plain_text(),
            selection: self.selection,
        }
    }

    pub fn register_update_listener(&mut self, f: impl FnMut(&EditorState) + 'static) -> ListenerId {
        let id = ListenerId(self.next_listener);
        self.next_listener += 1;
        self.listeners.push((id, Box::new(f)));
        id
    }

    pub fn unregister_update_listener(&mut self, id: ListenerId) -> bool {
        let before = self.listeners.len();
        self.listeners.retain(|(l, _)| *l != id);
        self.listeners.len() != before
    }

    // ------------------------------------------------------------------
    // 编辑操作（每个都是一次 update）
    // ------------------------------------------------------------------

    /// 在光标处输入文本；`\n` 拆分段落。有选中内容时先删除。
    pub fn insert_text(&mut self, s: &str) {
        self.edit(|doc| {
            for (i, line) in s.split('\n').enumerate() {
                if i > 0 {
                    doc.split_paragraph();
                }
                if !line.is_empty() {
                    doc.insert_plain(line);
                }
            }
        })
    }

    /// Enter：在光标处拆分段落。
    pub fn insert_paragraph(&mut self) {
        self.edit(|doc| doc.split_paragraph())
    }

    /// Backspace；mention 作为整体删除。
    pub fn backspace(&mut self) {
        self.edit(|doc| {
            doc.pending_format = None;
            match doc.selection {
                Some(sel) if !sel.is_collapsed() => {
                    doc.delete_selection();
                }
                Some(Selection::Range { focus, .. }) => doc.delete_backward(focus),
                _ => {}
            }
        })
    }

    pub fn move_left(&mut self) {
        self.edit(|doc| {
            doc.pending_format = None;
            let Some(at) = doc.collapse_toward(Affinity::Left) else {
                return;
            };
            let target = match doc.prev_unit(at) {
                Some(Unit::Char { node, range }) => Some(Position::new(node, range.start)),
                Some(Unit::Mention(path)) => doc.end_of(NodePath::new(path.block, path.index - 1)),
                Some(Unit::Boundary) => doc.block_end(at.node.block - 1),
                None => None,
            };
            if let Some(pos) = target {
                doc.selection = Some(Selection::caret(pos));
            }
        })
    }

    pub fn move_right(&mut self) {
        self.edit(|doc| {
            doc.pending_format = None;
            let Some(at) = doc.collapse_toward(Affinity::Right) else {
                return;
            };
            let target = match doc.next_unit(at) {
                Some(Unit::Char { node, range }) => Some(Position::new(node, range.end)),
                Some(Unit::Mention(path)) => {
                    Some(Position::new(NodePath::new(path.block, path.index + 1), 0))
                }
                Some(Unit::Boundary) => Some(Position::new(NodePath::new(at.node.block + 1, 0), 0)),
                None => None,
            };
            if let Some(pos) = target {
                doc.selection = Some(Selection::caret(pos));
            }
        })
    }

    /// 切换格式：区间内统一设置/清除（以区间起点的格式为准），
    /// 折叠光标时只影响下一次输入。
    pub fn format_text(&mut self, flag: TextFormat) {
        self.edit(|doc| match doc.selection {
            None => {}
            Some(Selection::Node(path)) => {
                if let Some(InlineNode::Mention(m)) = doc.node_mut(path) {
                    m.format.toggle(flag);
                }
            }
            Some(sel) if sel.is_collapsed() => {
                let base = doc.typing_format();
                doc.pending_format = Some(base ^ flag);
            }
            Some(_) => doc.format_range(flag),
        })
    }

    /// 设置选区（例如鼠标点击）。
    pub fn set_selection(&mut self, selection: Option<Selection>) {
        self.edit(|doc| {
            doc.pending_format = None;
            doc.selection = selection;
        })
    }

    /// 整体选中一个 mention；`path` 不是 mention 时不做任何事。
    pub fn select_node(&mut self, path: NodePath) -> bool {
        if self.node_ref(path).and_then(InlineNode::as_mention).is_none() {
            return false;
        }
        self.set_selection(Some(Selection::Node(path)));
        true
    }

    /// 宿主自己的按键处理（排在 `Session` 之后）；返回是否处理了该事件。
    pub fn apply_key(&mut self, ev: &InputEvent) -> bool {
        match *ev {
            InputEvent::Char(ch) => {
                let mut buf = [0u8; 4];
                self.insert_text(ch.encode_utf8(&mut buf));
            }
            InputEvent::Backspace => self.backspace(),
            InputEvent::Left => self.move_left(),
            InputEvent::Right => self.move_right(),
            InputEvent::Enter => self.insert_paragraph(),
            InputEvent::Tab => self.insert_text("\t"),
            _ => return false,
        }
        true
    }

    pub fn can_undo(&self) -> bool {
        !self.undo_stack.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.redo_stack.is_empty()
    }

    /// 撤销上一次改变内容的 update；没有历史时返回 `false`。
    pub fn undo(&mut self) -> bool {
        let Some(snapshot) = self.undo_stack.pop() else {
            return false;
        };
        let current = self.restore(snapshot);
        self.redo_stack.push(current);
        true
    }

    pub fn redo(&mut self) -> bool {
        let Some(snapshot) = self.redo_stack.pop() else {
            return false;
        };
        let current = self.restore(snapshot);
        self.undo_stack.push(current);
        true
    }

    // ------------------------------------------------------------------
    // 事务
    // ------------------------------------------------------------------

    fn edit<R>(&mut self, f: impl FnOnce(&mut Self) -> R) -> R {
        let before = self.snapshot();
        let out = f(self);
        self.normalize();
        if self.blocks != before.blocks {
            if self.undo_stack.len() == HISTORY_LIMIT {
                self.undo_stack.remove(0);
            }
            self.undo_stack.push(before);
            self.redo_stack.clear();
        }
        self.version += 1;
        self.notify();
        out
    }

    fn snapshot(&self) -> Snapshot {
        Snapshot {
            blocks: self.blocks.clone(),
            selection: self.selection,
        }
    }

    /// 换入快照（不记录历史），返回换出的当前状态。
    fn restore(&mut self, snapshot: Snapshot) -> Snapshot {
        let current = self.snapshot();
        trace!(version = self.version, "restoring snapshot");
        self.blocks = snapshot.blocks;
        self.selection = snapshot.selection;
        self.pending_format = None;
        self.version += 1;
        self.notify();
        current
    }

    fn notify(&mut self) {
        if self.listeners.is_empty() {
            return;
        }
        let state = self.state();
        let mut listeners = std::mem::take(&mut self.listeners);
        for (_, listener) in &mut listeners {
            listener(&state);
        }
        self.listeners = listeners;
    }

    fn normalize(&mut self) {
        if self.blocks.is_empty() {
            self.blocks.push(Paragraph::default());
        }
        let mut points: Vec<Position> = match self.selection {
            Some(Selection::Range { anchor, focus }) => vec![anchor, focus],
            Some(Selection::Node(path)) => vec![Position::new(path, 0)],
            None => Vec::new(),
        };
        for (b, para) in self.blocks.iter_mut().enumerate() {
            let children = std::mem::take(&mut para.children);
            let children = flank(children, b, &mut points);
            para.children = merge_text(children, b, &mut points);
        }
        self.selection = match (self.selection, points.as_slice()) {
            (Some(Selection::Range { .. }), [anchor, focus]) => Some(Selection::Range {
                anchor: *anchor,
                focus: *focus,
            }),
            (Some(Selection::Node(_)), [p]) => Some(Selection::Node(p.node)),
            _ => None,
        };
        if !self.selection_is_valid() {
            trace!(selection = ?self.selection, "selection reset to document end");
            self.selection = self.document_end().map(Selection::caret);
        }
    }

    fn selection_is_valid(&self) -> bool {
        match self.selection {
            None => false,
            Some(Selection::Range { anchor, focus }) => {
                self.is_text_position(anchor) && self.is_text_position(focus)
            }
            Some(Selection::Node(path)) => self.node_ref(path).and_then(InlineNode::as_mention).is_some(),
        }
    }

    fn is_text_position(&self, pos: Position) -> bool {
        self.text_ref(pos.node)
            .is_some_and(|t| t.text.is_char_boundary(pos.offset))
    }

    // ------------------------------------------------------------------
    // 节点访问
    // ------------------------------------------------------------------

    fn node_ref(&self, path: NodePath) -> Option<&InlineNode> {
        self.blocks.get(path.block)?.children.get(path.index)
    }

    fn node_mut(&mut self, path: NodePath) -> Option<&mut InlineNode> {
        self.blocks.get_mut(path.block)?.children.get_mut(path.index)
    }

    fn text_ref(&self, path: NodePath) -> Option<&TextNode> {
        self.node_ref(path)?.as_text()
    }

    fn end_of(&self, path: NodePath) -> Option<Position> {
        let len = self.text_ref(path)?.text.len();
        Some(Position::new(path, len))
    }

    fn block_end(&self, block: usize) -> Option<Position> {
        let last = self.blocks.get(block)?.children.len().checked_sub(1)?;
        self.end_of(NodePath::new(block, last))
    }

    fn document_end(&self) -> Option<Position> {
        self.block_end(self.blocks.len().checked_sub(1)?)
    }

    fn caret_format(&self) -> Option<TextFormat> {
        match self.selection? {
            Selection::Range { focus, .. } => self.text_ref(focus.node).map(|t| t.format),
            Selection::Node(path) => self.node_ref(path)?.as_mention().map(|m| m.format),
        }
    }

    // ------------------------------------------------------------------
    // 扁平坐标
    // ------------------------------------------------------------------

    fn flat_of(&self, pos: Position) -> Option<Flat> {
        let para = self.blocks.get(pos.node.block)?;
        let before = para.children.get(..pos.node.index)?;
        let offset: usize = before.iter().map(node_len).sum();
        Some((pos.node.block, offset + pos.offset))
    }

    fn position_at(&self, (block, flat): Flat, affinity: Affinity) -> Option<Position> {
        let para = self.blocks.get(block)?;
        let mut start = 0;
        let mut found = None;
        for (i, child) in para.children.iter().enumerate() {
            if start > flat {
                break;
            }
            let len = node_len(child);
            if child.as_text().is_some() && flat <= start + len {
                let pos = Position::new(NodePath::new(block, i), flat - start);
                match affinity {
                    Affinity::Left => return Some(pos),
                    Affinity::Right => found = Some(pos),
                }
            }
            start += len;
        }
        found
    }

    /// 选区的有序扁平边界。
    fn selection_bounds(&self) -> Option<(Flat, Flat)> {
        match self.selection? {
            Selection::Range { anchor, focus } => {
                let (a, f) = (self.flat_of(anchor)?, self.flat_of(focus)?);
                Some(if a <= f { (a, f) } else { (f, a) })
            }
            Selection::Node(path) => {
                let (block, start) = self.flat_of(Position::new(path, 0))?;
                let len = node_len(self.node_ref(path)?);
                Some(((block, start), (block, start + len)))
            }
        }
    }

    // ------------------------------------------------------------------
    // 编辑原语（不触发 commit，由外层 `edit` 统一收尾）
    // ------------------------------------------------------------------

    fn delete_flat(&mut self, (sb, s): Flat, (eb, e): Flat) -> Option<Position> {
        let head = slice_children(&self.blocks.get(sb)?.children, 0, s);
        let tail_block = self.blocks.get(eb)?;
        let tail = slice_children(&tail_block.children, e, tail_block.flat_len());
        let mut children = head;
        children.extend(tail);
        let children = flank(children, sb, &mut []);
        self.blocks[sb] = Paragraph::new(children);
        self.blocks.drain(sb + 1..=eb);
        self.position_at((sb, s), Affinity::Left)
    }

    fn delete_selection(&mut self) -> Option<Position> {
        let (start, end) = self.selection_bounds()?;
        let caret = self.delete_flat(start, end)?;
        self.selection = Some(Selection::caret(caret));
        Some(caret)
    }

    /// 编辑前把选区变成光标：有选中内容时先删除。
    fn collapse_for_edit(&mut self) -> Option<Position> {
        match self.selection? {
            Selection::Range { anchor, focus } if anchor == focus => Some(focus),
            _ => self.delete_selection(),
        }
    }

    /// 左右移动前的折叠：有选区时折叠到对应一端（不再额外移动则返回 `None`）。
    fn collapse_toward(&mut self, affinity: Affinity) -> Option<Position> {
        match self.selection? {
            Selection::Range { anchor, focus } if anchor == focus => Some(focus),
            Selection::Node(path) => {
                let pos = match affinity {
                    Affinity::Left => self.end_of(NodePath::new(path.block, path.index.checked_sub(1)?)),
                    Affinity::Right => Some(Position::new(NodePath::new(path.block, path.index + 1), 0)),
                };
                self.selection = pos.map(Selection::caret);
                None
            }
            Selection::Range { .. } => {
                let (start, end) = self.selection_bounds()?;
                let pos = match affinity {
                    Affinity::Left => self.position_at(start, Affinity::Right),
                    Affinity::Right => self.position_at(end, Affinity::Left),
                };
                self.selection = pos.map(Selection::caret);
                None
            }
        }
    }

    fn insert_plain(&mut self, s: &str) {
        let format = self.typing_format();
        self.pending_format = None;
        let Some(at) = self.collapse_for_edit() else {
            return;
        };
        let Some(node) = self.node_mut(at.node).and_then(InlineNode::as_text_mut) else {
            return;
        };
        if node.format == format {
            node.text.insert_str(at.offset, s);
            self.selection = Some(Selection::caret(Position::new(at.node, at.offset + s.len())));
            return;
        }
        let piece = text_piece(node, s, format);
        if let Ok(path) = self.replace_text_span(at.node, at.offset..at.offset, piece) {
            self.selection = Some(Selection::caret(Position::new(path, s.len())));
        }
    }

    fn split_paragraph(&mut self) {
        self.pending_format = None;
        let Some(at) = self.collapse_for_edit() else {
            return;
        };
        if self.text_ref(at.node).is_none() {
            return;
        }
        let b = at.node.block;
        let para = &mut self.blocks[b];
        let rest = para.children.split_off(at.node.index + 1);
        let Some(InlineNode::Text(node)) = para.children.last_mut() else {
            return;
        };
        let mut tail = node.clone();
        tail.text = node.text.split_off(at.offset);
        let mut children = vec![InlineNode::Text(tail)];
        children.extend(rest);
        self.blocks.insert(b + 1, Paragraph::new(children));
        self.selection = Some(Selection::caret(Position::new(NodePath::new(b + 1, 0), 0)));
    }

    fn delete_backward(&mut self, at: Position) {
        match self.prev_unit(at) {
            Some(Unit::Char { node, range }) => {
                if let Some(t) = self.node_mut(node).and_then(InlineNode::as_text_mut) {
                    t.text.replace_range(range.clone(), "");
                }
                self.selection = Some(Selection::caret(Position::new(node, range.start)));
            }
            Some(Unit::Mention(path)) => {
                let caret = self.end_of(NodePath::new(path.block, path.index - 1));
                self.blocks[path.block].children.remove(path.index);
                self.selection = caret.map(Selection::caret);
            }
            Some(Unit::Boundary) => {
                let b = at.node.block;
                let caret = self.block_end(b - 1);
                let para = self.blocks.remove(b);
                self.blocks[b - 1].children.extend(para.children);
                self.selection = caret.map(Selection::caret);
            }
            None => {}
        }
    }

    fn format_range(&mut self, flag: TextFormat) {
        let Some(Selection::Range { anchor, focus }) = self.selection else {
            return;
        };
        let (Some(a), Some(f)) = (self.flat_of(anchor), self.flat_of(focus)) else {
            return;
        };
        let forward = a <= f;
        let ((sb, s), (eb, e)) = if forward { (a, f) } else { (f, a) };
        let first = self
            .position_at((sb, s), Affinity::Right)
            .and_then(|p| self.text_ref(p.node))
            .map(|t| t.format)
            .unwrap_or_default();
        let enable = !first.contains(flag);
        for b in sb..=eb {
            let from = if b == sb { s } else { 0 };
            let to = if b == eb { e } else { self.blocks[b].flat_len() };
            let children = std::mem::take(&mut self.blocks[b].children);
            self.blocks[b].children = reformat_children(children, from, to, flag, enable);
        }
        let (Some(start), Some(end)) = (
            self.position_at((sb, s), Affinity::Right),
            self.position_at((eb, e), Affinity::Left),
        ) else {
            return;
        };
        self.selection = Some(if forward {
            Selection::Range { anchor: start, focus: end }
        } else {
            Selection::Range { anchor: end, focus: start }
        });
    }

    fn prev_unit(&self, at: Position) -> Option<Unit> {
        let para = self.blocks.get(at.node.block)?;
        if at.offset > 0 {
            let text = para.children.get(at.node.index)?.as_text()?;
            let ch = text.text.get(..at.offset)?.chars().next_back()?;
            return Some(Unit::Char {
                node: at.node,
                range: at.offset - ch.len_utf8()..at.offset,
            });
        }
        for i in (0..at.node.index).rev() {
            let path = NodePath::new(at.node.block, i);
            match &para.children[i] {
                InlineNode::Text(t) => {
                    if let Some(ch) = t.text.chars().next_back() {
                        let end = t.text.len();
                        return Some(Unit::Char {
                            node: path,
                            range: end - ch.len_utf8()..end,
                        });
                    }
                }
                InlineNode::Mention(_) => return Some(Unit::Mention(path)),
            }
        }
        (at.node.block > 0).then_some(Unit::Boundary)
    }

    fn next_unit(&self, at: Position) -> Option<Unit> {
        let para = self.blocks.get(at.node.block)?;
        let text = para.children.get(at.node.index)?.as_text()?;
        if let Some(ch) = text.text.get(at.offset..)?.chars().next() {
            return Some(Unit::Char {
                node: at.node,
                range: at.offset..at.offset + ch.len_utf8(),
            });
        }
        for i in at.node.index + 1..para.children.len() {
            let path = NodePath::new(at.node.block, i);
            match &para.children[i] {
                InlineNode::Text(t) => {
                    if let Some(ch) = t.text.chars().next() {
                        return Some(Unit::Char {
                            node: path,
                            range: 0..ch.len_utf8(),
                        });
                    }
                }
                InlineNode::Mention(_) => return Some(Unit::Mention(path)),
            }
        }
        (at.node.block + 1 < self.blocks.len()).then_some(Unit::Boundary)
    }

    /// 拆分后修正落在被拆节点上的选区。
    fn remap_after_split(&mut self, path: NodePath, span: Range<usize>) {
        let shift = |pos: &mut Position| {
            if pos.node.block != path.block || pos.node.index < path.index {
                return;
            }
            if pos.node.index > path.index {
                pos.node.index += 2;
            } else if pos.offset >= span.end && span.end > span.start {
                pos.node.index += 2;
                pos.offset -= span.end;
            } else if pos.offset > span.start {
                pos.node.index += 2;
                pos.offset = 0;
            }
        };
        self.selection = match self.selection {
            Some(Selection::Range { mut anchor, mut focus }) => {
                shift(&mut anchor);
                shift(&mut focus);
                Some(Selection::Range { anchor, focus })
            }
            Some(Selection::Node(p)) => {
                let mut pos = Position::new(p, 0);
                shift(&mut pos);
                Some(Selection::Node(pos.node))
            }
            None => None,
        };
    }
}

impl ReadTxn for Document {
    fn selection(&self) -> Option<Selection> {
        self.selection
    }

    fn node(&self, path: NodePath) -> Option<&InlineNode> {
        self.node_ref(path)
    }
}

impl UpdateTxn for Document {
    fn replace_text_span(
        &mut self,
        path: NodePath,
        range: Range<usize>,
        node: InlineNode,
    ) -> Result<NodePath, HostError> {
        let para = self
            .blocks
            .get_mut(path.block)
            .ok_or(HostError::NodeNotFound(path))?;
        let text = para
            .children
            .get(path.index)
            .ok_or(HostError::NodeNotFound(path))?
            .as_text()
            .ok_or(HostError::NotText(path))?;
        let len = text.text.len();
        if range.start > range.end || range.end > len {
            return Err(HostError::SpanOutOfBounds {
                start: range.start,
                end: range.end,
                len,
            });
        }
        for offset in [range.start, range.end] {
            if !text.text.is_char_boundary(offset) {
                return Err(HostError::NotCharBoundary(offset));
            }
        }
        let before = text_piece(text, &text.text[..range.start], text.format);
        let after = text_piece(text, &text.text[range.end..], text.format);
        para.children[path.index] = before;
        para.children.insert(path.index + 1, after);
        para.children.insert(path.index + 1, node);
        self.remap_after_split(path, range);
        Ok(NodePath::new(path.block, path.index + 1))
    }

    fn position_after(&self, path: NodePath) -> Option<Position> {
        let next = NodePath::new(path.block, path.index + 1);
        self.text_ref(next)?;
        Some(Position::new(next, 0))
    }

    fn set_selection(&mut self, selection: Option<Selection>) {
        self.pending_format = None;
        self.selection = selection;
    }
}

impl DocumentHost for Document {
    fn read<R>(&self, f: impl FnOnce(&dyn ReadTxn) -> R) -> R {
        f(self)
    }

    fn update<R>(&mut self, f: impl FnOnce(&mut dyn UpdateTxn) -> R) -> R {
        self.edit(|doc| f(doc))
    }

    fn caret_rect(&self) -> Option<Rect> {
        let (path, offset) = match self.selection? {
            Selection::Range { focus, .. } => (focus.node, focus.offset),
            Selection::Node(path) => (path, 0),
        };
        let para = self.blocks.get(path.block)?;
        let mut column: usize = para
            .children
            .get(..path.index)?
            .iter()
            .map(|n| n.text().chars().count())
            .sum();
        if let Some(t) = self.text_ref(path) {
            column += t.text.get(..offset)?.chars().count();
        }
        Some(self.layout.caret_rect(path.block, column))
    }

    fn scroll_offset(&self) -> Point {
        self.layout.scroll
    }
}
