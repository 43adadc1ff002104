//! `Context`：processor 链共享的唯一状态容器（suggestion state）。
//!
//! 约定：
//! - `query`：触发字符与光标之间的文本；`None` 表示没有激活的触发
//! - `anchor`：与 `query` 同时为 `Some`/`None`
//! - `site`：触发字符在文档中的位置；换到另一个触发字符即视为新的触发上下文
//! - `tracker`：高亮下标；候选列表或触发位置一旦变化就回到 0
use tracing::debug;

use crate::{
    host::NodePath,
    key_event::Action,
    model::{Candidate, Point, UiState},
    processor::EngineFacade,
    tracker::SelectionTracker,
};

/// 触发字符所在的文本节点与字节偏移。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TriggerSite {
    pub node: NodePath,
    pub offset: usize,
}

impl TriggerSite {
    pub fn new(node: NodePath, offset: usize) -> Self {
        Self { node, offset }
    }
}

#[derive(Debug, Clone, Default)]
pub struct Context {
    pub query: Option<String>,
    pub anchor: Option<Point>,
    pub site: Option<TriggerSite>,
    /// 过滤后的候选
    pub candidate_list: Vec<Candidate>,
    pub tracker: SelectionTracker,
}

impl Context {
    /// 清空状态（关闭 overlay）。
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// overlay 是否处于打开状态：有触发且候选非空。
    pub fn is_open(&self) -> bool {
        self.query.is_some() && !self.candidate_list.is_empty()
    }

    /// 文档变化后重新计算状态。
    ///
    /// - `query == None`：丢失触发，整体 reset
    /// - `site` 变化：换到了另一个触发字符，高亮回到 0
    /// - `anchor == None`（宿主无法定位光标）：沿用上一次锚点，没有则用原点
    pub fn refresh(
        &mut self,
        engine: &dyn EngineFacade,
        query: Option<&str>,
        site: Option<TriggerSite>,
        anchor: Option<Point>,
    ) {
        let Some(query) = query else {
            if self.query.is_some() {
                debug!("mention trigger lost");
            }
            self.reset();
            return;
        };

        let candidate_list = engine.suggest(query);
        let was_active = self.query.is_some();
        let moved = was_active && site != self.site;
        if moved {
            debug!(?site, "mention trigger moved");
        }
        if !was_active || moved || candidate_list != self.candidate_list {
            self.tracker.reset(candidate_list.len());
        }
        if self.query.as_deref() != Some(query) {
            debug!(query, matches = candidate_list.len(), "mention query changed");
        }
        self.anchor = anchor.or(self.anchor).or(Some(Point::ORIGIN));
        self.query = Some(query.to_owned());
        self.site = site;
        self.candidate_list = candidate_list;
    }

    /// 生成 UI 层只读快照。
    pub fn ui_state(&self) -> UiState {
        UiState {
            query: self.query.clone(),
            anchor: self.anchor,
            selected: self.tracker.index(),
            candidate_list: self.candidate_list.clone(),
        }
    }

    pub fn selected_candidate(&self) -> Option<&Candidate> {
        if !self.is_open() {
            return None;
        }
        self.candidate_list.get(self.tracker.index())
    }

    /// Enter/Tab/点击：提交高亮候选。真正的替换由 `Session` 通过宿主完成。
    pub fn commit_selected(&self) -> Vec<Action> {
        match self.selected_candidate() {
            Some(c) => vec![Action::Commit(c.clone())],
            None => Vec::new(),
        }
    }

    /// Escape：关闭但不提交。
    pub fn dismiss(&mut self) -> Vec<Action> {
        let was_open = self.is_open();
        self.reset();
        if was_open { vec![Action::Dismiss] } else { Vec::new() }
    }
}
