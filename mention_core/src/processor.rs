//! `processor`：输入事件处理链。
//!
//! 按顺序处理 `InputEvent`，对 `Context` 做状态变更，并可产生 `Action`（例如 Commit）。
//! 处理链必须排在宿主编辑器的按键处理之前：overlay 打开时，被消费（`Consume`）的
//! 事件不会再交给宿主，避免例如回车同时插入换行。
//!
//! 当前链路（`Session::new` 默认组装）：
//! - `NavigationProcessor`：Up/Down 移动高亮
//! - `PointerProcessor`：悬停更新高亮、点击提交
//! - `CommitProcessor`：Enter/Tab 提交高亮候选
//! - `DismissProcessor`：Escape 关闭

use crate::{
    context::Context,
    key_event::{Action, InputEvent},
    model::Candidate,
};

/// 给 processors 的对象安全引擎接口（避免在 processors 层引入泛型）。
pub trait EngineFacade {
    /// 光标前文本 -> 触发查询
    fn scan<'a>(&self, before_caret: &'a str) -> Option<&'a str>;
    /// 查询 -> 过滤后的候选
    fn suggest(&self, query: &str) -> Vec<Candidate>;
    fn trigger_char(&self) -> char;
}

/// Processor 执行结果：是否“消费”了本次事件。
///
/// - `Consume`：本 processor 已处理该事件，后续 processor 与宿主都不再处理
/// - `Continue`：本 processor 不处理该事件，交给下一个 processor（最终交给宿主）
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProcessStatus {
    Consume,
    Continue,
}

/// Processor：处理输入事件并改变 Context；必要时产生输出动作。
pub trait Processor: Send + Sync {
    fn process(
        &mut self,
        engine: &dyn EngineFacade,
        context: &mut Context,
        input_event: &InputEvent,
    ) -> (ProcessStatus, Vec<Action>);
}

pub struct NavigationProcessor;

impl Processor for NavigationProcessor {
    fn process(
        &mut self,
        _engine: &dyn EngineFacade,
        context: &mut Context,
        input_event: &InputEvent,
    ) -> (ProcessStatus, Vec<Action>) {
        if !context.is_open() {
            return (ProcessStatus::Continue, Vec::new());
        }
        match *input_event {
            InputEvent::Down => {
                context.tracker.advance();
                (ProcessStatus::Consume, Vec::new())
            }
            InputEvent::Up => {
                context.tracker.retreat();
                (ProcessStatus::Consume, Vec::new())
            }
            _ => (ProcessStatus::Continue, Vec::new()),
        }
    }
}

pub struct PointerProcessor;

impl Processor for PointerProcessor {
    fn process(
        &mut self,
        _engine: &dyn EngineFacade,
        context: &mut Context,
        input_event: &InputEvent,
    ) -> (ProcessStatus, Vec<Action>) {
        if !context.is_open() {
            return (ProcessStatus::Continue, Vec::new());
        }
        match *input_event {
            InputEvent::Hover(i) => {
                context.tracker.hover(i);
                (ProcessStatus::Consume, Vec::new())
            }
            // 点击与 Enter/Tab 完全一致：先高亮再提交
            InputEvent::Click(i) => {
                if !context.tracker.hover(i) {
                    return (ProcessStatus::Consume, Vec::new());
                }
                (ProcessStatus::Consume, context.commit_selected())
            }
            _ => (ProcessStatus::Continue, Vec::new()),
        }
    }
}

pub struct CommitProcessor;

impl Processor for CommitProcessor {
    fn process(
        &mut self,
        _engine: &dyn EngineFacade,
        context: &mut Context,
        input_event: &InputEvent,
    ) -> (ProcessStatus, Vec<Action>) {
        match *input_event {
            InputEvent::Enter | InputEvent::Tab if context.is_open() => {
                (ProcessStatus::Consume, context.commit_selected())
            }
            _ => (ProcessStatus::Continue, Vec::new()),
        }
    }
}

pub struct DismissProcessor;

impl Processor for DismissProcessor {
    fn process(
        &mut self,
        _engine: &dyn EngineFacade,
        context: &mut Context,
        input_event: &InputEvent,
    ) -> (ProcessStatus, Vec<Action>) {
        match *input_event {
            InputEvent::Escape if context.is_open() => (ProcessStatus::Consume, context.dismiss()),
            _ => (ProcessStatus::Continue, Vec::new()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::Engine;

    fn open_context(engine: &Engine<Vec<Candidate>>, query: &str) -> Context {
        let mut ctx = Context::default();
        ctx.refresh(engine, Some(query), None, None);
        ctx
    }

    fn engine() -> Engine<Vec<Candidate>> {
        Engine::new(vec![
            Candidate::new("1", "Alice"),
            Candidate::new("2", "Albert"),
            Candidate::new("3", "Bob"),
        ])
    }

    #[test]
    fn test_navigation_consumes_only_when_open() {
        let e = engine();
        let mut closed = Context::default();
        let (status, _) = NavigationProcessor.process(&e, &mut closed, &InputEvent::Down);
        assert_eq!(status, ProcessStatus::Continue);

        let mut ctx = open_context(&e, "");
        let (status, _) = NavigationProcessor.process(&e, &mut ctx, &InputEvent::Up);
        assert_eq!(status, ProcessStatus::Consume);
        assert_eq!(ctx.tracker.index(), 2);
    }

    #[test]
    fn test_enter_passes_through_when_no_matches() {
        let e = engine();
        let mut ctx = open_context(&e, "xyz");
        let (status, actions) = CommitProcessor.process(&e, &mut ctx, &InputEvent::Enter);
        assert_eq!(status, ProcessStatus::Continue);
        assert!(actions.is_empty());
    }

    #[test]
    fn test_tab_commits_highlighted() {
        let e = engine();
        let mut ctx = open_context(&e, "al");
        ctx.tracker.advance();
        let (status, actions) = CommitProcessor.process(&e, &mut ctx, &InputEvent::Tab);
        assert_eq!(status, ProcessStatus::Consume);
        assert_eq!(actions, vec![Action::Commit(Candidate::new("2", "Albert"))]);
    }

    #[test]
    fn test_click_commits_clicked_item() {
        let e = engine();
        let mut ctx = open_context(&e, "");
        let (status, actions) = PointerProcessor.process(&e, &mut ctx, &InputEvent::Click(2));
        assert_eq!(status, ProcessStatus::Consume);
        assert_eq!(actions, vec![Action::Commit(Candidate::new("3", "Bob"))]);
    }

    #[test]
    fn test_escape_dismisses() {
        let e = engine();
        let mut ctx = open_context(&e, "b");
        let (status, actions) = DismissProcessor.process(&e, &mut ctx, &InputEvent::Escape);
        assert_eq!(status, ProcessStatus::Consume);
        assert_eq!(actions, vec![Action::Dismiss]);
        assert!(ctx.query.is_none());
    }
}
