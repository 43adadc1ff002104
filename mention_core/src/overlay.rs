//! `overlay`：候选浮层的展示模型（只做布局，不做绘制）。
//!
//! 浮层挂在文档流之外，锚点取触发被识别时光标矩形的左下角（加上滚动偏移）。
use crate::model::UiState;

#[derive(Debug, Clone, PartialEq)]
pub struct OverlayItem {
    pub label: String,
    pub id: String,
    pub highlighted: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct OverlayView {
    pub top: f32,
    pub left: f32,
    pub items: Vec<OverlayItem>,
}

impl OverlayView {
    /// 没有触发、没有锚点或没有候选时不渲染。
    pub fn from_ui(ui: &UiState, gap: f32) -> Option<Self> {
        if !ui.is_open() {
            return None;
        }
        let anchor = ui.anchor?;
        let items = ui
            .candidate_list
            .iter()
            .enumerate()
            .map(|(i, c)| OverlayItem {
                label: c.display_name.clone(),
                id: c.id.clone(),
                highlighted: i == ui.selected,
            })
            .collect();
        Some(Self {
            top: anchor.y + gap,
            left: anchor.x,
            items,
        })
    }

    pub fn highlighted(&self) -> Option<usize> {
        self.items.iter().position(|item| item.highlighted)
    }
}
