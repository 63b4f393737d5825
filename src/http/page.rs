use std::fmt::Write as _;

use crate::{draft::Draft, render::RenderedNote};

const STYLE: &str = concat!(
    "body{font-family:system-ui,sans-serif;max-width:46rem;margin:2rem auto;padding:0 1rem;}",
    "textarea{width:100%;min-height:8rem;box-sizing:border-box;}",
    ".pending img,.note img{max-width:100%;}",
    ".pending img{max-height:6rem;margin-right:.5rem;}",
    ".note{border-top:1px solid #ddd;padding:.5rem 0;}",
);

pub fn index_html(notes: &[RenderedNote], draft: &Draft) -> String {
    let mut out = String::with_capacity(2048 + notes.iter().map(|n| n.html.len()).sum::<usize>());
    out.push_str("<!doctype html>\n<html lang=\"en\">\n<head>\n<meta charset=\"utf-8\">\n");
    out.push_str("<meta name=\"viewport\" content=\"width=device-width, initial-scale=1\">\n");
    out.push_str("<title>knote</title>\n");
    let _ = writeln!(out, "<style>{STYLE}</style>");
    out.push_str("</head>\n<body>\n<h1>knote</h1>\n");

    out.push_str("<form method=\"post\" action=\"/submit\">\n");
    let _ = writeln!(
        out,
        "<textarea name=\"note_content\" placeholder=\"Write a note in Markdown\">{}</textarea>",
        escape_html(&draft.text)
    );
    if !draft.image_links.is_empty() {
        out.push_str("<div class=\"pending\">\n");
        for link in &draft.image_links {
            let _ = writeln!(out, "<img src=\"{}\" alt=\"\">", escape_html(link));
        }
        out.push_str("</div>\n");
    }
    out.push_str("<input type=\"file\" name=\"uploaded_file\" accept=\"image/*\">\n");
    out.push_str(
        "<button type=\"submit\" formaction=\"/upload\" formenctype=\"multipart/form-data\">Upload image</button>\n",
    );
    out.push_str("<button type=\"submit\">Publish</button>\n");
    out.push_str("</form>\n");

    for note in notes {
        let _ = writeln!(out, "<article class=\"note\">\n{}</article>", note.html);
    }

    out.push_str("</body>\n</html>\n");
    out
}

pub fn escape_html(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for c in input.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn escapes_markup_in_draft_text() {
        let draft = Draft {
            text: "</textarea><script>alert(1)</script>".to_string(),
            image_links: vec!["/img/a\"b".to_string()],
        };
        let html = index_html(&[], &draft);
        assert!(html.contains("&lt;/textarea&gt;&lt;script&gt;"));
        assert!(html.contains("<img src=\"/img/a&quot;b\" alt=\"\">"));
        assert!(!html.contains("<script>"));
    }

    #[test]
    fn notes_appear_in_given_order() {
        let notes = vec![
            RenderedNote {
                html: "<p>newest</p>\n".to_string(),
            },
            RenderedNote {
                html: "<p>oldest</p>\n".to_string(),
            },
        ];
        let html = index_html(&notes, &Draft::default());
        let newest = html.find("newest").unwrap();
        let oldest = html.find("oldest").unwrap();
        assert!(newest < oldest);
        assert!(!html.contains("class=\"pending\""));
    }
}
