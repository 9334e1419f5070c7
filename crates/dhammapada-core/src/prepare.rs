//! Plain-text edition → chapter-map JSON.
//!
//! The input is a text of chapters (vagga) and numbered stanzas:
//!
//! ```text
//! 1. Yamakavaggo
//!
//! 1.
//! Manopubbaṅgamā dhammā, manoseṭṭhā manomayā;
//! Manasā ce paduṭṭhena, bhāsati vā karoti vā;
//! ```
//!
//! Chapter lines look like `N. Title`, stanza lines are a bare `N.`.
//! Stanza lines are whitespace-collapsed and joined with a literal `\n`
//! escape, which [`VerseStore`] turns back into line breaks.

use serde_json::{Map, Value};

use crate::verse::VerseStore;

const META_KEY: &str = "_meta";

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Chapter {
    /// `"1. Yamakavaggo"`
    pub title: String,
    /// Stanza number and text, in document order.
    pub stanzas: Vec<(String, String)>,
    /// Text found between the chapter header and its first stanza.
    pub meta: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PreparedText {
    pub chapters: Vec<Chapter>,
}

impl PreparedText {
    pub fn stanza_count(&self) -> usize {
        self.chapters.iter().map(|c| c.stanzas.len()).sum()
    }

    pub fn to_json_value(&self) -> Value {
        let mut root = Map::new();
        for chapter in &self.chapters {
            let mut entries = Map::new();
            if let Some(meta) = &chapter.meta {
                entries.insert(META_KEY.to_string(), Value::String(meta.clone()));
            }
            for (number, text) in &chapter.stanzas {
                entries.insert(number.clone(), Value::String(text.clone()));
            }
            root.insert(chapter.title.clone(), Value::Object(entries));
        }
        Value::Object(root)
    }

    pub fn to_json_string_pretty(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(&self.to_json_value())
    }

    pub fn into_store(self) -> crate::Result<VerseStore> {
        VerseStore::from_json_value(self.to_json_value())
    }
}

/// `N. Title` with at least one space after the dot.
fn parse_chapter_line(line: &str) -> Option<(&str, &str)> {
    let (number, rest) = split_number(line)?;
    let rest = rest.strip_prefix('.')?;
    let title = rest.trim_start();
    if title.len() == rest.len() || title.is_empty() {
        return None;
    }
    Some((number, title))
}

/// A bare `N.`.
fn parse_stanza_line(line: &str) -> Option<&str> {
    let (number, rest) = split_number(line)?;
    (rest == ".").then_some(number)
}

fn split_number(line: &str) -> Option<(&str, &str)> {
    let digits = line.bytes().take_while(u8::is_ascii_digit).count();
    (digits > 0).then(|| line.split_at(digits))
}

fn collapse_whitespace(line: &str) -> String {
    line.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn join_stanza(lines: &[String]) -> String {
    lines
        .iter()
        .filter(|l| !l.trim().is_empty())
        .map(|l| collapse_whitespace(l))
        .collect::<Vec<_>>()
        .join("\\n")
}

struct OpenStanza {
    number: String,
    lines: Vec<String>,
}

pub fn parse_text(text: &str) -> PreparedText {
    let mut chapters: Vec<Chapter> = Vec::new();
    let mut stanza: Option<OpenStanza> = None;

    /// A stanza with no lines survives only when another stanza follows it
    /// in the same chapter.
    fn flush(chapters: &mut [Chapter], stanza: Option<OpenStanza>, keep_empty: bool) {
        let (Some(chapter), Some(stanza)) = (chapters.last_mut(), stanza) else {
            return;
        };
        if stanza.lines.is_empty() && !keep_empty {
            return;
        }
        let content = join_stanza(&stanza.lines);
        match chapter.stanzas.iter_mut().find(|(n, _)| *n == stanza.number) {
            Some(existing) => existing.1 = content,
            None => chapter.stanzas.push((stanza.number, content)),
        }
    }

    for raw in text.lines() {
        let line = raw.trim();
        if line.is_empty() {
            continue;
        }

        if let Some((number, title)) = parse_chapter_line(line) {
            flush(&mut chapters, stanza.take(), false);
            chapters.push(Chapter {
                title: format!("{number}. {title}"),
                ..Chapter::default()
            });
            continue;
        }

        if let Some(number) = parse_stanza_line(line) {
            flush(&mut chapters, stanza.take(), true);
            if chapters.is_empty() {
                // Stanzas before any chapter have nowhere to go.
                tracing::debug!("dropping stanza {number} found before the first chapter");
            }
            stanza = Some(OpenStanza {
                number: number.to_string(),
                lines: Vec::new(),
            });
            continue;
        }

        match (&mut stanza, chapters.last_mut()) {
            (Some(open), _) => open.lines.push(line.to_string()),
            (None, Some(chapter)) => {
                let meta = chapter.meta.get_or_insert_with(String::new);
                if !meta.is_empty() {
                    meta.push(' ');
                }
                meta.push_str(line);
            }
            (None, None) => {}
        }
    }
    flush(&mut chapters, stanza, false);

    PreparedText { chapters }
}
