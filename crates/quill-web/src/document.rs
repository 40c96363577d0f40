#![forbid(unsafe_code)]

//! In-memory page body.

use quill_runtime::DocumentHost;

/// Elements that never have a closing tag.
const VOID_ELEMENTS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "source", "track",
    "wbr",
];

/// A document body held as markup.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WebDocument {
    body: String,
    writes: u64,
}

impl WebDocument {
    #[must_use]
    pub fn new(body: impl Into<String>) -> Self {
        Self {
            body: body.into(),
            writes: 0,
        }
    }

    #[must_use]
    pub fn body(&self) -> &str {
        &self.body
    }

    /// Number of `set_body_html` calls.
    #[must_use]
    pub fn writes(&self) -> u64 {
        self.writes
    }
}

impl DocumentHost for WebDocument {
    fn first_element_html(&self) -> Option<String> {
        first_element(&self.body).map(str::to_owned)
    }

    fn set_body_html(&mut self, html: &str) {
        html.clone_into(&mut self.body);
        self.writes += 1;
    }
}

/// Slice of `html` covering its first top-level element, if balanced.
fn first_element(html: &str) -> Option<&str> {
    let start = element_start(html, 0)?;
    let (name, open_end, self_closing) = open_tag(html, start)?;
    if self_closing || VOID_ELEMENTS.contains(&name.to_ascii_lowercase().as_str()) {
        return Some(&html[start..open_end]);
    }

    let mut depth = 1usize;
    let mut cursor = open_end;
    while let Some(offset) = html[cursor..].find('<') {
        let at = cursor + offset;
        let rest = &html[at..];
        if rest.starts_with("<!--") {
            cursor = at + rest.find("-->")? + 3;
        } else if let Some(closing) = rest.strip_prefix("</") {
            let end = at + rest.find('>')? + 1;
            if tag_name(closing).eq_ignore_ascii_case(name) {
                depth -= 1;
                if depth == 0 {
                    return Some(&html[start..end]);
                }
            }
            cursor = end;
        } else if let Some((inner, inner_end, inner_self_closing)) = open_tag(html, at) {
            if inner.eq_ignore_ascii_case(name) && !inner_self_closing {
                depth += 1;
            }
            cursor = inner_end;
        } else {
            cursor = at + 1;
        }
    }
    None
}

/// Offset of the first `<tag` at or after `from`, skipping text and comments.
fn element_start(html: &str, mut from: usize) -> Option<usize> {
    loop {
        let at = from + html[from..].find('<')?;
        let rest = &html[at..];
        if rest.starts_with("<!--") {
            from = at + rest.find("-->")? + 3;
        } else if rest[1..].starts_with(|c: char| c.is_ascii_alphabetic()) {
            return Some(at);
        } else {
            from = at + 1;
        }
    }
}

/// Name, end offset and self-closing flag of the open tag at `at`.
fn open_tag(html: &str, at: usize) -> Option<(&str, usize, bool)> {
    let rest = &html[at + 1..];
    if !rest.starts_with(|c: char| c.is_ascii_alphabetic()) {
        return None;
    }
    let name = tag_name(rest);
    let mut quote = None;
    for (offset, c) in rest.char_indices() {
        match (quote, c) {
            (Some(q), c) if c == q => quote = None,
            (Some(_), _) => {}
            (None, '"' | '\'') => quote = Some(c),
            (None, '>') => {
                let self_closing = rest[..offset].ends_with('/');
                return Some((name, at + 1 + offset + 1, self_closing));
            }
            (None, _) => {}
        }
    }
    None
}

fn tag_name(s: &str) -> &str {
    let end = s
        .find(|c: char| !(c.is_ascii_alphanumeric() || c == '-'))
        .unwrap_or(s.len());
    &s[..end]
}
