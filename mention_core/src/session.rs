//! `Session`：对上层（前端/编辑器外壳）提供的会话对象。
//!
//! `Session` 自身不做业务逻辑判断，而是：
//! - 持有 `Context`（状态）
//! - 持有 processors 链（可插拔）
//! - `handle`：把每次 `InputEvent` 依次交给 processors，直到被消费；Commit 通过宿主落地
//! - `sync`：宿主文档每次变化后重新识别触发、刷新候选
//!
//! 调用顺序约定：前端必须先调用 `Session::handle`，只有返回 `Continue` 时才把事件交给宿主。
use tracing::{info, warn};

use crate::{
    context::{Context, TriggerSite},
    directory::Directory,
    engine::Engine,
    host::{DocumentHost, caret_text},
    inserter,
    key_event::{Action, InputEvent},
    model::{Candidate, Point, UiState},
    processor::{
        CommitProcessor, DismissProcessor, NavigationProcessor, PointerProcessor, ProcessStatus,
        Processor,
    },
};

/// 一次事件分发的结果。
#[derive(Debug, Clone, PartialEq)]
pub struct Dispatch {
    /// `Consume` 时宿主不得再处理该事件
    pub status: ProcessStatus,
    pub ui: UiState,
    pub actions: Vec<Action>,
}

impl Dispatch {
    pub fn consumed(&self) -> bool {
        self.status == ProcessStatus::Consume
    }
}

/// mention 会话（suggestion 状态机容器）。
pub struct Session<D> {
    /// 引擎（包含候选来源、scanner、filter 编排）
    engine: Engine<D>,
    /// 会话上下文（processors 共享）
    ctx: Context,
    /// processors 链（可配置/可扩展）
    processors: Vec<Box<dyn Processor>>,
}

impl<D> Session<D>
where
    D: Directory,
{
    /// 创建会话，并组装默认 processors 链。
    pub fn new(engine: Engine<D>) -> Self {
        Self {
            engine,
            ctx: Context::default(),
            processors: vec![
                Box::new(NavigationProcessor),
                Box::new(PointerProcessor),
                Box::new(CommitProcessor),
                Box::new(DismissProcessor),
            ],
        }
    }

    pub fn engine(&self) -> &Engine<D> {
        &self.engine
    }

    /// 获取当前 UI 快照（只读）。
    pub fn ui_state(&self) -> UiState {
        self.ctx.ui_state()
    }

    pub fn is_open(&self) -> bool {
        self.ctx.is_open()
    }

    /// 处理一个输入事件；Commit 动作会在宿主的 update 事务内完成替换。
    pub fn handle<H: DocumentHost>(&mut self, host: &mut H, ev: &InputEvent) -> Dispatch {
        let mut actions = Vec::new();
        let mut status = ProcessStatus::Continue;
        for p in &mut self.processors {
            let (s, mut a) = p.process(&self.engine, &mut self.ctx, ev);
            actions.append(&mut a);
            if s == ProcessStatus::Consume {
                status = s;
                break;
            }
        }
        for action in &actions {
            if let Action::Commit(candidate) = action {
                self.apply_commit(host, candidate);
            }
        }
        Dispatch {
            status,
            ui: self.ctx.ui_state(),
            actions,
        }
    }

    /// 宿主文档变化通知：读取光标前文本，重新识别触发并定位 overlay。
    pub fn sync<H: DocumentHost>(&mut self, host: &H) -> UiState {
        let engine = &self.engine;
        let trigger = engine.trigger_char();
        let found: Option<(String, TriggerSite)> = host.read(|txn| {
            let caret = caret_text(txn)?;
            let query = engine.scan(caret.before())?;
            let offset = caret.offset - query.len() - trigger.len_utf8();
            Some((query.to_owned(), TriggerSite::new(caret.node, offset)))
        });
        let (query, site) = found.unzip();
        let anchor = match query {
            Some(_) => host.caret_rect().map(|rect| {
                let scroll = host.scroll_offset();
                Point::new(rect.left + scroll.x, rect.bottom + scroll.y)
            }),
            None => None,
        };
        self.ctx.refresh(&self.engine, query.as_deref(), site, anchor);
        self.ctx.ui_state()
    }

    /// 无论插入是否成功，提交后都关闭 overlay。
    fn apply_commit<H: DocumentHost>(&mut self, host: &mut H, candidate: &Candidate) {
        match inserter::insert_mention(host, self.engine.trigger_char(), candidate) {
            Ok(Some(path)) => {
                info!(id = %candidate.id, name = %candidate.display_name, ?path, "mention inserted")
            }
            Ok(None) => {}
            Err(err) => warn!(id = %candidate.id, %err, "mention insert rejected by host"),
        }
        self.ctx.reset();
    }
}
