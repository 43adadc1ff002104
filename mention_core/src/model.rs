use serde::{Deserialize, Serialize};

/// 候选人（可被 overlay 展示与用户选择）。
///
/// 来自外部目录（`Directory`），进程内只读。
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Candidate {
    /// 不透明标识（写入 token 的 `reference_id`）
    pub id: String,
    /// 展示名（过滤依据，也是 token 的展示文本）
    #[serde(rename = "name")]
    pub display_name: String,
}

impl Candidate {
    pub fn new(id: impl Into<String>, display_name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            display_name: display_name.into(),
        }
    }
}

/// 屏幕坐标（像素）。
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

impl Point {
    pub const ORIGIN: Point = Point { x: 0.0, y: 0.0 };

    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

/// 光标的包围矩形（由宿主布局层给出）。
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Rect {
    pub top: f32,
    pub left: f32,
    pub bottom: f32,
    pub right: f32,
}

/// 引擎给 UI 的“快照视图”。
///
/// - UI 层只读 `UiState`，不直接读写 `Context`
/// - `anchor` 与 `query` 同时为 `Some` 或同时为 `None`
#[derive(Debug, Clone, Default, PartialEq)]
pub struct UiState {
    /// 触发符与光标之间的文本；`None` 表示没有激活的触发
    pub query: Option<String>,
    /// overlay 锚点（触发被识别时的光标位置）
    pub anchor: Option<Point>,
    /// 当前高亮的候选下标
    pub selected: usize,
    /// 过滤后的候选列表
    pub candidate_list: Vec<Candidate>,
}

impl UiState {
    /// overlay 是否应当显示：有触发且候选非空。
    pub fn is_open(&self) -> bool {
        self.query.is_some() && self.anchor.is_some() && !self.candidate_list.is_empty()
    }

    pub fn selected_candidate(&self) -> Option<&Candidate> {
        if self.query.is_none() {
            return None;
        }
        self.candidate_list.get(self.selected)
    }
}
