//! 前端配置：RON 文件，所有字段都可省略。
//!
//! ```ron
//! (
//!     suggest: (trigger: '@', candidate_limit: 5, overlay_gap: 8.0),
//!     layout: (cell_width: 8.0, line_height: 20.0),
//! )
//! ```
use std::{fs, path::Path};

use anyhow::{Context, Result};
use mention_core::config::SuggestConfig;
use mention_doc::LayoutMetrics;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub suggest: SuggestConfig,
    pub layout: LayoutMetrics,
}

impl AppConfig {
    pub fn from_path(path: &Path) -> Result<Self> {
        let s = fs::read_to_string(path)
            .with_context(|| format!("读取配置文件失败: {}", path.display()))?;
        Self::from_ron(&s).with_context(|| format!("配置文件格式错误: {}", path.display()))
    }

    pub fn from_ron(s: &str) -> Result<Self, ron::error::SpannedError> {
        ron::from_str(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_config_keeps_defaults() {
        let cfg = AppConfig::from_ron("(suggest: (candidate_limit: 3))").unwrap();
        assert_eq!(cfg.suggest.candidate_limit, 3);
        assert_eq!(cfg.suggest.trigger, '@');
        assert_eq!(cfg.layout, LayoutMetrics::default());
    }

    #[test]
    fn test_empty_config() {
        assert_eq!(AppConfig::from_ron("()").unwrap(), AppConfig::default());
    }

    #[test]
    fn test_layout_override() {
        let cfg = AppConfig::from_ron("(layout: (cell_width: 10.0, scroll: (x: 0.0, y: 40.0)))").unwrap();
        assert_eq!(cfg.layout.cell_width, 10.0);
        assert_eq!(cfg.layout.scroll.y, 40.0);
        assert_eq!(cfg.layout.line_height, 20.0);
    }
}
