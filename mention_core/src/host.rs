//! 宿主文档引擎的窄接口。
//!
//! 文档模型（节点树、撤销历史、渲染）完全属于宿主；core 只通过这里访问：
//! - `read`：只读事务，读取选区与节点
//! - `update`：写事务，替换节点、移动选区
//! - `caret_rect` / `scroll_offset`：布局钩子，用来定位 overlay
//!
//! UI 逻辑通过参数拿到宿主（`&H` / `&mut H`），不存在全局编辑器实例。
use std::ops::Range;

use crate::error::HostError;
use crate::model::{Point, Rect};
use crate::node::InlineNode;

/// 节点在文档中的位置：第几个段落的第几个行内节点。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodePath {
    pub block: usize,
    pub index: usize,
}

impl NodePath {
    pub fn new(block: usize, index: usize) -> Self {
        Self { block, index }
    }
}

/// 文本节点内的位置；`offset` 为字节偏移，必须落在字符边界上。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Position {
    pub node: NodePath,
    pub offset: usize,
}

impl Position {
    pub fn new(node: NodePath, offset: usize) -> Self {
        Self { node, offset }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Selection {
    /// 光标或区间（anchor 为起点，focus 为活动端）
    Range { anchor: Position, focus: Position },
    /// 整个节点被选中（例如点选一个 mention）
    Node(NodePath),
}

impl Selection {
    pub fn caret(at: Position) -> Self {
        Selection::Range {
            anchor: at,
            focus: at,
        }
    }

    pub fn is_collapsed(&self) -> bool {
        matches!(self, Selection::Range { anchor, focus } if anchor == focus)
    }
}

/// 只读事务视图。
pub trait ReadTxn {
    fn selection(&self) -> Option<Selection>;
    fn node(&self, path: NodePath) -> Option<&InlineNode>;
}

/// 写事务视图。
pub trait UpdateTxn: ReadTxn {
    /// 用 `node` 替换文本节点 `path` 中 `range`（字节区间）的内容，
    /// 原文本节点按需拆分；返回新节点的位置。
    fn replace_text_span(
        &mut self,
        path: NodePath,
        range: Range<usize>,
        node: InlineNode,
    ) -> Result<NodePath, HostError>;

    /// 紧跟在 `path` 节点之后的光标位置。
    fn position_after(&self, path: NodePath) -> Option<Position>;

    fn set_selection(&mut self, selection: Option<Selection>);
}

/// 宿主文档引擎。
///
/// 所有读取都必须发生在 `read` 内，所有结构修改都必须发生在 `update` 内。
pub trait DocumentHost {
    fn read<R>(&self, f: impl FnOnce(&dyn ReadTxn) -> R) -> R;
    fn update<R>(&mut self, f: impl FnOnce(&mut dyn UpdateTxn) -> R) -> R;
    /// 当前光标的包围矩形（视口坐标）；无法定位时返回 `None`
    fn caret_rect(&self) -> Option<Rect>;
    /// 视口滚动偏移
    fn scroll_offset(&self) -> Point {
        Point::ORIGIN
    }
}

/// 光标所在的纯文本片段。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CaretText<'a> {
    pub node: NodePath,
    /// 光标（anchor）的字节偏移
    pub offset: usize,
    /// 节点全文
    pub text: &'a str,
}

impl<'a> CaretText<'a> {
    /// 光标之前的文本。
    pub fn before(&self) -> &'a str {
        &self.text[..self.offset]
    }
}

/// 读取光标所在的纯文本片段。
///
/// 只接受 anchor 与 focus 位于同一纯文本节点的区间选区；其余情况返回 `None`。
pub fn caret_text<T: ReadTxn + ?Sized>(txn: &T) -> Option<CaretText<'_>> {
    let Selection::Range { anchor, focus } = txn.selection()? else {
        return None;
    };
    if anchor.node != focus.node {
        return None;
    }
    let text = txn.node(anchor.node)?.as_text()?;
    if !text.text.is_char_boundary(anchor.offset) {
        return None;
    }
    Some(CaretText {
        node: anchor.node,
        offset: anchor.offset,
        text: &text.text,
    })
}
