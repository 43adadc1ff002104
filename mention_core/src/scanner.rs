//! `scanner`：识别光标前文本末尾的触发模式。
//!
//! 模式为“触发字符 + 零个或多个单词字符”，并且必须贴着光标（文本末尾）。
//! - `"Hello @al"` -> `Some("al")`
//! - `"@"` -> `Some("")`（overlay 立即打开，显示未过滤的候选）
//! - `"plain text"` / `"@al "` -> `None`
use std::sync::LazyLock;

use regex::Regex;

use crate::config::DEFAULT_TRIGGER;

/// 单词字符，与常见 `\w`（ASCII）一致
const WORD_CLASS: &str = "[0-9A-Za-z_]";

static DEFAULT_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&trigger_pattern(DEFAULT_TRIGGER)).expect("默认触发模式必须合法")
});

fn trigger_pattern(trigger: char) -> String {
    format!("{}({WORD_CLASS}*)$", regex::escape(&trigger.to_string()))
}

/// Scanner：从光标前文本中提取触发查询。
pub trait Scanner: Send + Sync {
    /// 返回触发字符之后、光标之前的单词字符；没有触发时返回 `None`。
    fn scan<'a>(&self, before_caret: &'a str) -> Option<&'a str>;
    fn trigger(&self) -> char;
}

#[derive(Debug, Clone)]
pub struct TriggerScanner {
    trigger: char,
    pattern: Regex,
}

impl TriggerScanner {
    pub fn new(trigger: char) -> Result<Self, regex::Error> {
        Ok(Self {
            trigger,
            pattern: Regex::new(&trigger_pattern(trigger))?,
        })
    }
}

impl Default for TriggerScanner {
    fn default() -> Self {
        Self {
            trigger: DEFAULT_TRIGGER,
            pattern: DEFAULT_PATTERN.clone(),
        }
    }
}

impl Scanner for TriggerScanner {
    fn scan<'a>(&self, before_caret: &'a str) -> Option<&'a str> {
        // 模式锚定在末尾，匹配到的一定是离光标最近的触发字符
        let caps = self.pattern.captures(before_caret)?;
        caps.get(1).map(|m| m.as_str())
    }

    fn trigger(&self) -> char {
        self.trigger
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scan(text: &str) -> Option<&str> {
        TriggerScanner::default().scan(text)
    }

    #[test]
    fn test_trailing_query() {
        assert_eq!(scan("Hello @al"), Some("al"));
        assert_eq!(scan("@bob_2"), Some("bob_2"));
    }

    #[test]
    fn test_bare_trigger_is_empty_query() {
        assert_eq!(scan("@"), Some(""));
        assert_eq!(scan("hi @"), Some(""));
    }

    #[test]
    fn test_no_trigger() {
        assert_eq!(scan("plain text"), None);
        assert_eq!(scan(""), None);
    }

    #[test]
    fn test_trigger_must_touch_caret() {
        assert_eq!(scan("@al "), None);
        assert_eq!(scan("@al-x"), None);
        assert_eq!(scan("@é"), None);
    }

    #[test]
    fn test_nearest_trigger_wins() {
        assert_eq!(scan("@alice and @bo"), Some("bo"));
        assert_eq!(scan("@alice@"), Some(""));
        assert_eq!(scan("a@b@c"), Some("c"));
    }

    #[test]
    fn test_custom_trigger_is_escaped() {
        let scanner = TriggerScanner::new('+').unwrap();
        assert_eq!(scanner.trigger(), '+');
        assert_eq!(scanner.scan("ping +ca"), Some("ca"));
        assert_eq!(scanner.scan("ping @ca"), None);
    }
}
