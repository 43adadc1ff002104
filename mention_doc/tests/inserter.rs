use mention_core::engine::Engine;
use mention_core::host::{NodePath, Position, Selection};
use mention_core::key_event::{Action, InputEvent};
use mention_core::model::{Candidate, UiState};
use mention_core::node::{InlineNode, MentionNode, TextNode};
use mention_core::session::Session;
use mention_doc::{Document, Paragraph};

fn caret(index: usize, offset: usize) -> Position {
    Position::new(NodePath::new(0, index), offset)
}

/// "Hi @al" + @Bob + " x"，光标停在 "@al" 之后，session 已同步
fn open_session() -> (Document, Session<Vec<Candidate>>) {
    let mut doc = Document::from_paragraphs(vec![Paragraph::new(vec![
        InlineNode::Text(TextNode::new("Hi @al")),
        InlineNode::Mention(MentionNode::new("Bob", "3")),
        InlineNode::Text(TextNode::new(" x")),
    ])]);
    doc.set_selection(Some(Selection::caret(caret(0, 6))));
    let mut session = Session::new(Engine::new(vec![
        Candidate::new("1", "Alice"),
        Candidate::new("2", "Albert"),
    ]));
    assert!(session.sync(&doc).is_open());
    (doc, session)
}

fn commit(doc: &mut Document, session: &mut Session<Vec<Candidate>>) {
    let dispatch = session.handle(doc, &InputEvent::Enter);
    assert!(dispatch.consumed());
    assert_eq!(dispatch.actions, vec![Action::Commit(Candidate::new("1", "Alice"))]);
}

#[test]
fn test_commit_with_node_selection_leaves_document() {
    let (mut doc, mut session) = open_session();
    doc.select_node(NodePath::new(0, 1));
    commit(&mut doc, &mut session);
    assert_eq!(doc.plain_text(), "Hi @alBob x");
    assert_eq!(doc.selection(), Some(Selection::Node(NodePath::new(0, 1))));
    assert_eq!(session.ui_state(), UiState::default());
}

#[test]
fn test_commit_with_range_across_nodes_leaves_document() {
    let (mut doc, mut session) = open_session();
    let range = Selection::Range {
        anchor: caret(0, 6),
        focus: caret(2, 1),
    };
    doc.set_selection(Some(range));
    commit(&mut doc, &mut session);
    assert_eq!(doc.plain_text(), "Hi @alBob x");
    assert_eq!(doc.selection(), Some(range));
    assert_eq!(session.ui_state(), UiState::default());
}

#[test]
fn test_commit_without_trigger_before_caret_leaves_document() {
    let (mut doc, mut session) = open_session();
    doc.set_selection(Some(Selection::caret(caret(0, 2))));
    commit(&mut doc, &mut session);
    assert_eq!(doc.plain_text(), "Hi @alBob x");
    assert_eq!(session.ui_state(), UiState::default());
    assert!(!doc.can_undo());
}
