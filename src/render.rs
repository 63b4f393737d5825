//! Markdown rendering for the note list.
//!
//! Raw HTML embedded in notes is passed through untouched; output is not
//! sanitised.

use pulldown_cmark::{Options, Parser, html};

use crate::notes::Note;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedNote {
    pub html: String,
}

pub fn markdown_to_html(source: &str) -> String {
    let parser = Parser::new_ext(source, Options::empty());
    let mut out = String::with_capacity(source.len() + source.len() / 2);
    html::push_html(&mut out, parser);
    out
}

/// Renders `notes` (oldest first, as fetched) into display order, newest
/// first.
pub fn render_notes(notes: Vec<Note>) -> Vec<RenderedNote> {
    let mut rendered: Vec<RenderedNote> = notes
        .iter()
        .map(|note| RenderedNote {
            html: markdown_to_html(&note.description),
        })
        .collect();
    rendered.reverse();
    rendered
}
