//! `mention_core`：@mention 输入的纯逻辑层，不做任何 I/O。
//!
//! 设计目标：
//! - **宿主无关**：文档模型（节点树、选区、撤销）由宿主提供，core 只通过 `host::DocumentHost` 访问
//! - **分层清晰**：scanner（识别触发）-> filter（候选过滤）-> tracker（高亮）-> inserter（替换为 token）-> overlay（展示）
//! - **事件驱动**：所有状态变更都发生在一次 `Session::handle` / `Session::sync` 内
pub mod config;
pub mod context;
pub mod directory;
pub mod engine;
pub mod error;
pub mod filter;
pub mod host;
pub mod inserter;
pub mod key_event;
pub mod model;
pub mod node;
pub mod overlay;
pub mod processor;
pub mod record;
pub mod scanner;
pub mod session;
pub mod tracker;
