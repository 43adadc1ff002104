//! `Editor`：组合根。
//!
//! 按键先交给 `Session`（优先级更高），只有 `Continue` 时才交给文档；
//! 文档每次变化后调用 `Session::sync` 刷新 suggestion 状态。
use mention_core::config::SuggestConfig;
use mention_core::directory::Directory;
use mention_core::engine::Engine;
use mention_core::host::Selection;
use mention_core::key_event::{Action, InputEvent};
use mention_core::model::UiState;
use mention_core::node::TextFormat;
use mention_core::overlay::OverlayView;
use mention_core::record::NodeRegistry;
use mention_core::session::Session;

use crate::document::Document;
use crate::error::DocError;
use crate::export::ImportReport;

pub struct Editor<D> {
    doc: Document,
    session: Session<D>,
    registry: NodeRegistry,
    overlay_gap: f32,
    /// 上一次 sync 时的文档版本
    synced_version: Option<u64>,
}

impl<D> Editor<D>
where
    D: Directory,
{
    pub fn new(engine: Engine<D>, doc: Document) -> Self {
        let mut editor = Self {
            doc,
            session: Session::new(engine),
            registry: NodeRegistry::default(),
            overlay_gap: SuggestConfig::default().overlay_gap,
            synced_version: None,
        };
        editor.sync();
        editor
    }

    pub fn overlay_gap(mut self, gap: f32) -> Self {
        self.overlay_gap = gap;
        self
    }

    pub fn registry_mut(&mut self) -> &mut NodeRegistry {
        &mut self.registry
    }

    pub fn document(&self) -> &Document {
        &self.doc
    }

    pub fn session(&self) -> &Session<D> {
        &self.session
    }

    pub fn ui_state(&self) -> UiState {
        self.session.ui_state()
    }

    pub fn overlay(&self) -> Option<OverlayView> {
        OverlayView::from_ui(&self.session.ui_state(), self.overlay_gap)
    }

    /// 处理一个按键；返回 session 产生的动作。
    pub fn key(&mut self, ev: &InputEvent) -> Vec<Action> {
        let dispatch = self.session.handle(&mut self.doc, ev);
        if !dispatch.consumed() {
            self.doc.apply_key(ev);
        }
        self.sync();
        dispatch.actions
    }

    /// 逐字符输入（每个字符都是一次按键）。
    pub fn type_text(&mut self, text: &str) -> Vec<Action> {
        let mut actions = Vec::new();
        for ch in text.chars() {
            let ev = match ch {
                '\n' => InputEvent::Enter,
                '\t' => InputEvent::Tab,
                ch => InputEvent::Char(ch),
            };
            actions.extend(self.key(&ev));
        }
        actions
    }

    pub fn format_text(&mut self, flag: TextFormat) {
        self.doc.format_text(flag);
        self.sync();
    }

    pub fn set_selection(&mut self, selection: Option<Selection>) {
        self.doc.set_selection(selection);
        self.sync();
    }

    /// 直接修改文档（例如外部程序化编辑），之后同步 suggestion 状态。
    pub fn edit<R>(&mut self, f: impl FnOnce(&mut Document) -> R) -> R {
        let out = f(&mut self.doc);
        self.sync();
        out
    }

    pub fn undo(&mut self) -> bool {
        let done = self.doc.undo();
        self.sync();
        done
    }

    pub fn redo(&mut self) -> bool {
        let done = self.doc.redo();
        self.sync();
        done
    }

    pub fn export_json(&self) -> Result<String, DocError> {
        self.doc.to_json_string()
    }

    /// 用导入的内容替换当前文档，布局参数保持不变。
    pub fn import_json(&mut self, json: &str) -> Result<ImportReport, DocError> {
        let (doc, report) = Document::from_json(json, &self.registry)?;
        self.replace_document(doc);
        Ok(report)
    }

    pub fn export_html(&self) -> String {
        self.doc.to_html()
    }

    pub fn import_html(&mut self, html: &str) -> ImportReport {
        let (doc, report) = Document::from_html(html);
        self.replace_document(doc);
        report
    }

    fn replace_document(&mut self, doc: Document) {
        self.doc = doc.with_layout(self.doc.layout().clone());
        self.synced_version = None;
        self.sync();
    }

    /// 只在文档版本变化时刷新，避免 Escape 关闭后被立即重新打开。
    fn sync(&mut self) {
        let version = self.doc.version();
        if self.synced_version == Some(version) {
            return;
        }
        self.session.sync(&self.doc);
        self.synced_version = Some(version);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mention_core::model::Candidate;

    fn editor() -> Editor<Vec<Candidate>> {
        let users = vec![
            Candidate::new("1", "Alice"),
            Candidate::new("2", "Albert"),
            Candidate::new("3", "Bob"),
        ];
        Editor::new(Engine::new(users), Document::new())
    }

    #[test]
    fn test_overlay_follows_typing() {
        let mut ed = editor();
        ed.type_text("hi @a");
        let overlay = ed.overlay().unwrap();
        assert_eq!(overlay.items.len(), 2);
        assert_eq!(overlay.highlighted(), Some(0));
        // 光标在第 5 列，第 0 行底部 20，间距 8
        assert_eq!(overlay.left, 40.0);
        assert_eq!(overlay.top, 28.0);
        ed.type_text(" ");
        assert!(ed.overlay().is_none());
    }

    #[test]
    fn test_escape_closes_until_next_edit() {
        let mut ed = editor();
        ed.type_text("@");
        assert!(ed.overlay().is_some());
        let actions = ed.key(&InputEvent::Escape);
        assert_eq!(actions, vec![Action::Dismiss]);
        assert!(ed.overlay().is_none());
        assert_eq!(ed.document().plain_text(), "@");
        ed.type_text("b");
        assert_eq!(ed.ui_state().query.as_deref(), Some("b"));
    }

    #[test]
    fn test_import_replaces_document_and_resyncs() {
        let mut ed = editor();
        ed.type_text("@al");
        let report = ed
            .import_json(r#"{"root":{"type":"root","version":1,"children":[
                {"type":"paragraph","version":1,"children":[{"type":"text","version":1,"text":"plain"}]}
            ]}}"#)
            .unwrap();
        assert!(report.is_clean());
        assert_eq!(ed.document().plain_text(), "plain");
        assert!(ed.ui_state().query.is_none());
    }

    #[test]
    fn test_import_html_replaces_document() {
        let mut ed = editor();
        ed.type_text("@al");
        let report = ed.import_html(
            r#"<p>hi <span data-lexical-mention="true" data-mention-id="3">Bob</span></p>"#,
        );
        assert!(report.is_clean());
        assert_eq!(ed.document().plain_text(), "hi Bob");
        assert!(ed.ui_state().query.is_none());
        assert_eq!(ed.import_html(&ed.export_html()).skipped.len(), 0);
    }
}
