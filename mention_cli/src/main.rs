//! mention 演示前端（按行交互）。
//!
//! 普通输入行逐字符键入文档；以 `:` 开头的是按键/命令，输入 `:help` 查看。
mod config;

use std::{
    io::{self, BufRead, Write},
    path::PathBuf,
};

use anyhow::Result;
use clap::Parser;
use mention_core::{
    engine::Engine,
    host::Selection,
    key_event::{Action, InputEvent},
    node::{InlineNode, TextFormat},
};
use mention_doc::{Document, Editor, ImportReport};
use mention_users::StaticDirectory;
use tracing::info;
use tracing_subscriber::{EnvFilter, fmt};

use crate::config::AppConfig;

/// @mention 富文本输入演示。
#[derive(Parser, Debug)]
#[command(name = "mention_cli")]
#[command(about = "@mention 富文本输入演示")]
struct Args {
    /// 候选人 JSON 文件（`[{"id": "...", "name": "..."}]`），缺省使用内置列表
    #[arg(long)]
    users: Option<PathBuf>,

    /// RON 配置文件
    #[arg(long)]
    config: Option<PathBuf>,

    /// 候选数量上限（1-9），覆盖配置文件
    #[arg(long)]
    limit: Option<u8>,

    /// 触发字符，覆盖配置文件
    #[arg(long)]
    trigger: Option<char>,

    /// 日志级别（优先于 RUST_LOG）
    #[arg(long)]
    log: Option<String>,
}

fn main() -> Result<()> {
    let args = Args::parse();

    let filter = match &args.log {
        Some(level) => EnvFilter::try_new(level)?,
        None => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
    };
    fmt().with_env_filter(filter).with_writer(io::stderr).init();

    let mut cfg = match &args.config {
        Some(path) => AppConfig::from_path(path)?,
        None => AppConfig::default(),
    };
    if let Some(limit) = args.limit {
        cfg.suggest.candidate_limit = limit;
    }
    if let Some(trigger) = args.trigger {
        cfg.suggest.trigger = trigger;
    }

    let users = match &args.users {
        Some(path) => StaticDirectory::from_path(path)?,
        None => StaticDirectory::mock(),
    };
    info!(users = users.len(), trigger = %cfg.suggest.trigger, limit = cfg.suggest.candidate_limit, "starting");

    let engine = Engine::with_config(users, &cfg.suggest)?;
    let doc = Document::new().with_layout(cfg.layout.clone());
    let mut editor = Editor::new(engine, doc).overlay_gap(cfg.suggest.overlay_gap);
    repl(&mut editor, cfg.suggest.trigger)
}

/// 一行输入解析出的操作。
#[derive(Debug, PartialEq)]
enum Command {
    Type(String),
    Key(InputEvent),
    Paragraph,
    Format(TextFormat),
    Undo,
    Redo,
    Export,
    Import(String),
    Html,
    ImportHtml(String),
    Help,
    Quit,
}

fn parse_command(line: &str) -> Result<Command, String> {
    let Some(cmd) = line.strip_prefix(':') else {
        return Ok(Command::Type(line.to_owned()));
    };
    let (name, rest) = cmd.split_once(' ').unwrap_or((cmd, ""));
    let rest = rest.trim();
    let index = || -> Result<usize, String> {
        rest.parse::<usize>()
            .ok()
            .and_then(|n| n.checked_sub(1))
            .ok_or_else(|| format!("需要候选序号（从 1 开始）: {rest:?}"))
    };
    let command = match name {
        "down" => Command::Key(InputEvent::Down),
        "up" => Command::Key(InputEvent::Up),
        "enter" => Command::Key(InputEvent::Enter),
        "tab" => Command::Key(InputEvent::Tab),
        "esc" => Command::Key(InputEvent::Escape),
        "bs" => Command::Key(InputEvent::Backspace),
        "left" => Command::Key(InputEvent::Left),
        "right" => Command::Key(InputEvent::Right),
        "hover" => Command::Key(InputEvent::Hover(index()?)),
        "click" => Command::Key(InputEvent::Click(index()?)),
        "nl" => Command::Paragraph,
        "bold" => Command::Format(TextFormat::BOLD),
        "italic" => Command::Format(TextFormat::ITALIC),
        "underline" => Command::Format(TextFormat::UNDERLINE),
        "undo" => Command::Undo,
        "redo" => Command::Redo,
        "export" => Command::Export,
        "html" if !rest.is_empty() => Command::ImportHtml(rest.to_owned()),
        "html" => Command::Html,
        "import" if !rest.is_empty() => Command::Import(rest.to_owned()),
        "import" => return Err("用法：:import <json>".to_owned()),
        "help" | "h" => Command::Help,
        "q" | "quit" | "exit" => Command::Quit,
        other => return Err(format!("未知命令: :{other}")),
    };
    Ok(command)
}

const HELP: &str = "\
普通输入行：逐字符键入
:down :up        移动候选高亮
:enter :tab      提交高亮候选（overlay 关闭时交给文档）
:esc             关闭 overlay
:bs :left :right 退格 / 光标移动（mention 作为整体）
:nl              直接在文档中换段
:hover N :click N  指针悬停 / 点击第 N 个候选
:bold :italic :underline  切换格式
:undo :redo      撤销 / 重做
:export          导出 JSON
:import <json>   导入 JSON
:html            导出 HTML
:html <html>     导入 HTML
:q               退出";

fn repl(editor: &mut Editor<StaticDirectory>, trigger: char) -> Result<()> {
    let stdin = io::stdin();
    let mut out = io::stdout();
    writeln!(out, "mention demo | trigger: {trigger} | 输入 :help 查看命令，:q 退出")?;
    print_state(&mut out, editor)?;

    let mut line = String::new();
    loop {
        line.clear();
        write!(out, "mention> ")?;
        out.flush()?;
        if stdin.lock().read_line(&mut line)? == 0 {
            break;
        }
        let input = line.trim_end_matches(['\r', '\n']);
        if input.is_empty() {
            continue;
        }
        let command = match parse_command(input) {
            Ok(command) => command,
            Err(msg) => {
                writeln!(out, "({msg})")?;
                continue;
            }
        };
        match command {
            Command::Quit => break,
            Command::Help => {
                writeln!(out, "{HELP}")?;
                continue;
            }
            Command::Type(text) => print_actions(&mut out, &editor.type_text(&text))?,
            Command::Key(ev) => print_actions(&mut out, &editor.key(&ev))?,
            Command::Paragraph => editor.edit(Document::insert_paragraph),
            Command::Format(flag) => editor.format_text(flag),
            Command::Undo => {
                if !editor.undo() {
                    writeln!(out, "(没有可撤销的修改)")?;
                }
            }
            Command::Redo => {
                if !editor.redo() {
                    writeln!(out, "(没有可重做的修改)")?;
                }
            }
            Command::Html => {
                writeln!(out, "{}", editor.export_html())?;
                continue;
            }
            Command::ImportHtml(html) => print_skipped(&mut out, &editor.import_html(&html))?,
            Command::Export => {
                writeln!(out, "{}", editor.export_json()?)?;
                continue;
            }
            Command::Import(json) => match editor.import_json(&json) {
                Ok(report) => print_skipped(&mut out, &report)?,
                Err(err) => writeln!(out, "(导入失败: {err})")?,
            },
        }
        print_state(&mut out, editor)?;
    }
    Ok(())
}

fn print_skipped(out: &mut impl Write, report: &ImportReport) -> io::Result<()> {
    for skipped in &report.skipped {
        writeln!(
            out,
            "(跳过节点 {}:{}: {})",
            skipped.block, skipped.index, skipped.error
        )?;
    }
    for block in &report.skipped_blocks {
        writeln!(out, "(跳过块 {block})")?;
    }
    Ok(())
}

fn print_actions(out: &mut impl Write, actions: &[Action]) -> io::Result<()> {
    for action in actions {
        match action {
            Action::Commit(c) => writeln!(out, "commit: @{} ({})", c.display_name, c.id)?,
            Action::Dismiss => writeln!(out, "(overlay 已关闭)")?,
        }
    }
    Ok(())
}

fn print_state(out: &mut impl Write, editor: &Editor<StaticDirectory>) -> io::Result<()> {
    writeln!(out, "--------------------")?;
    for line in render_document(editor.document()) {
        writeln!(out, "| {line}")?;
    }
    let ui = editor.ui_state();
    if let Some(query) = &ui.query {
        writeln!(out, "  query: {query:?}")?;
    }
    if let Some(overlay) = editor.overlay() {
        writeln!(out, "  overlay @ ({:.0}, {:.0})", overlay.left, overlay.top)?;
        for (i, item) in overlay.items.iter().enumerate() {
            let mark = if item.highlighted { '>' } else { ' ' };
            writeln!(out, "  {mark} {}. {}", i + 1, item.label)?;
        }
    }
    Ok(())
}

/// 文本形式的文档：mention 显示为 `[@名字]`，格式用 `*` `_` `~` 包围，光标为 `|`。
fn render_document(doc: &Document) -> Vec<String> {
    let (caret, selected) = match doc.selection() {
        Some(Selection::Range { focus, .. }) => (Some(focus), None),
        Some(Selection::Node(path)) => (None, Some(path)),
        None => (None, None),
    };
    doc.blocks()
        .iter()
        .enumerate()
        .map(|(b, para)| {
            let mut line = String::new();
            for (i, node) in para.children.iter().enumerate() {
                let (body, format) = match node {
                    InlineNode::Text(t) => {
                        let mut body = t.text.clone();
                        if let Some(pos) = caret.filter(|p| p.node.block == b && p.node.index == i) {
                            body.insert(pos.offset, '|');
                        }
                        (body, t.format)
                    }
                    InlineNode::Mention(m) => {
                        let selected = selected.is_some_and(|p| p.block == b && p.index == i);
                        let body = if selected {
                            format!("[[@{}]]", m.display_text)
                        } else {
                            format!("[@{}]", m.display_text)
                        };
                        (body, m.format)
                    }
                };
                line.push_str(&decorate(body, format));
            }
            line
        })
        .collect()
}

fn decorate(mut body: String, format: TextFormat) -> String {
    if body.is_empty() || body == "|" {
        return body;
    }
    for (flag, mark) in [
        (TextFormat::BOLD, "*"),
        (TextFormat::ITALIC, "_"),
        (TextFormat::UNDERLINE, "~"),
    ] {
        if format.contains(flag) {
            body = format!("{mark}{body}{mark}");
        }
    }
    body
}

#[cfg(test)]
mod tests {
    use super::*;
    use mention_core::node::{MentionNode, TextNode};
    use mention_doc::Paragraph;

    #[test]
    fn test_parse_commands() {
        assert_eq!(parse_command("hi @al"), Ok(Command::Type("hi @al".to_owned())));
        assert_eq!(parse_command(":down"), Ok(Command::Key(InputEvent::Down)));
        assert_eq!(parse_command(":click 2"), Ok(Command::Key(InputEvent::Click(1))));
        assert_eq!(parse_command(":bold"), Ok(Command::Format(TextFormat::BOLD)));
        assert_eq!(parse_command(":import {}"), Ok(Command::Import("{}".to_owned())));
        assert_eq!(parse_command(":undo"), Ok(Command::Undo));
        assert_eq!(parse_command(":redo"), Ok(Command::Redo));
        assert_eq!(parse_command(":html"), Ok(Command::Html));
        assert_eq!(
            parse_command(":html <p>hi</p>"),
            Ok(Command::ImportHtml("<p>hi</p>".to_owned()))
        );
        assert!(parse_command(":hover 0").is_err());
        assert!(parse_command(":import").is_err());
        assert!(parse_command(":nope").is_err());
    }

    #[test]
    fn test_render_document_marks_mentions_and_caret() {
        let doc = Document::from_paragraphs(vec![Paragraph::new(vec![
            InlineNode::Text(TextNode::new("hi ").with_format(TextFormat::BOLD)),
            InlineNode::Mention(MentionNode::new("Bob Smith", "3")),
        ])]);
        assert_eq!(render_document(&doc), vec!["*hi *[@Bob Smith]|".to_owned()]);
    }
}
