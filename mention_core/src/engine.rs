use crate::config::{DEFAULT_CANDIDATE_LIMIT, SuggestConfig};
use crate::directory::Directory;
use crate::filter::{Filter, NameContains};
use crate::model::Candidate;
use crate::scanner::{Scanner, TriggerScanner};

/// 引擎：负责把“光标前文本”转成触发查询，再把查询转成候选列表。
///
/// 流水线：scanner（识别触发） -> directory（全部候选） -> filter（过滤/截断）
pub struct Engine<D> {
    /// 候选来源
    directory: D,
    scanner: TriggerScanner,
    /// 候选数量（1-9）；超出范围时回退到默认值
    candidate_limit: u8,
}

impl<D> Engine<D>
where
    D: Directory,
{
    pub fn new(directory: D) -> Self {
        Self {
            directory,
            scanner: TriggerScanner::default(),
            candidate_limit: DEFAULT_CANDIDATE_LIMIT,
        }
    }

    /// 按配置构建；trigger 无法编译成模式时返回错误。
    pub fn with_config(directory: D, config: &SuggestConfig) -> Result<Self, regex::Error> {
        Ok(Self::new(directory)
            .candidate_limit(config.candidate_limit)
            .trigger(config.trigger)?)
    }

    /// 设置候选数量上限（1..=9）；非法值会回退到 5。
    pub fn candidate_limit(mut self, limit: u8) -> Self {
        if limit == 0 || limit > 9 {
            self.candidate_limit = DEFAULT_CANDIDATE_LIMIT;
        } else {
            self.candidate_limit = limit;
        }
        self
    }

    pub fn trigger(mut self, trigger: char) -> Result<Self, regex::Error> {
        self.scanner = TriggerScanner::new(trigger)?;
        Ok(self)
    }

    pub fn trigger_char(&self) -> char {
        self.scanner.trigger()
    }

    pub fn limit(&self) -> u8 {
        self.candidate_limit
    }

    pub fn directory(&self) -> &D {
        &self.directory
    }

    /// 识别光标前文本中的触发查询。
    pub fn scan<'a>(&self, before_caret: &'a str) -> Option<&'a str> {
        self.scanner.scan(before_caret)
    }

    /// 查询 -> 过滤后的候选。
    pub fn suggest(&self, query: &str) -> Vec<Candidate> {
        NameContains::new(query, self.candidate_limit).apply(self.directory.list_all())
    }
}

impl<D> crate::processor::EngineFacade for Engine<D>
where
    D: Directory,
{
    fn scan<'a>(&self, before_caret: &'a str) -> Option<&'a str> {
        Engine::<D>::scan(self, before_caret)
    }

    fn suggest(&self, query: &str) -> Vec<Candidate> {
        Engine::<D>::suggest(self, query)
    }

    fn trigger_char(&self) -> char {
        Engine::<D>::trigger_char(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn engine() -> Engine<Vec<Candidate>> {
        Engine::new(vec![
            Candidate::new("1", "Alice"),
            Candidate::new("2", "Albert"),
            Candidate::new("3", "Bob"),
        ])
    }

    #[test]
    fn test_limit_falls_back_when_out_of_range() {
        assert_eq!(engine().candidate_limit(0).limit(), 5);
        assert_eq!(engine().candidate_limit(12).limit(), 5);
        assert_eq!(engine().candidate_limit(3).limit(), 3);
    }

    #[test]
    fn test_scan_then_suggest() {
        let e = engine();
        let query = e.scan("Hello @al").unwrap();
        let names: Vec<_> = e.suggest(query).into_iter().map(|c| c.display_name).collect();
        assert_eq!(names, ["Alice", "Albert"]);
    }

    #[test]
    fn test_with_config_uses_trigger() {
        let config = SuggestConfig {
            trigger: '#',
            candidate_limit: 1,
            ..SuggestConfig::default()
        };
        let e = Engine::with_config(engine().directory().clone(), &config).unwrap();
        assert_eq!(e.scan("x #b"), Some("b"));
        assert_eq!(e.scan("x @b"), None);
        assert_eq!(e.suggest("").len(), 1);
    }
}
