//! 等宽布局：每个字符占一格，每个段落占一行。
use mention_core::model::{Point, Rect};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LayoutMetrics {
    /// 单个字符宽度（像素）
    pub cell_width: f32,
    pub line_height: f32,
    /// 文档左上角在页面中的位置
    pub origin: Point,
    /// 视口滚动偏移
    pub scroll: Point,
}

impl Default for LayoutMetrics {
    fn default() -> Self {
        Self {
            cell_width: 8.0,
            line_height: 20.0,
            origin: Point::ORIGIN,
            scroll: Point::ORIGIN,
        }
    }
}

impl LayoutMetrics {
    /// 第 `line` 行第 `column` 列的光标矩形（视口坐标）。
    pub fn caret_rect(&self, line: usize, column: usize) -> Rect {
        let left = self.origin.x + column as f32 * self.cell_width - self.scroll.x;
        let top = self.origin.y + line as f32 * self.line_height - self.scroll.y;
        Rect {
            top,
            left,
            bottom: top + self.line_height,
            right: left,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_caret_rect_accounts_for_scroll() {
        let layout = LayoutMetrics {
            origin: Point::new(10.0, 5.0),
            scroll: Point::new(0.0, 20.0),
            ..LayoutMetrics::default()
        };
        let rect = layout.caret_rect(2, 3);
        assert_eq!(rect.left, 34.0);
        assert_eq!(rect.top, 25.0);
        assert_eq!(rect.bottom, 45.0);
    }
}
