//! Verse records and the read-only, ordered verse store.

use std::path::Path;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::{Error, Result};

const BUNDLED_VERSES: &str = include_str!("../assets/dhammapada.json");

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    #[default]
    Pali,
    English,
    Vietnamese,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Verse {
    pub chapter: String,
    pub verse: String,
    pub pali: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub entrans: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vitrans: Option<String>,
}

impl Verse {
    pub fn new(chapter: impl Into<String>, verse: impl Into<String>, pali: impl Into<String>) -> Self {
        Self {
            chapter: chapter.into(),
            verse: verse.into(),
            pali: pali.into(),
            entrans: None,
            vitrans: None,
        }
    }

    /// Text in the requested language, falling back to Pali when no
    /// translation is present.
    pub fn text(&self, language: Language) -> &str {
        let translated = match language {
            Language::Pali => None,
            Language::English => self.entrans.as_deref(),
            Language::Vietnamese => self.vitrans.as_deref(),
        };
        translated.filter(|t| !t.is_empty()).unwrap_or(&self.pali)
    }

    /// `"Chapter 1: Yamakavaggo · Verse 1"`
    pub fn heading(&self) -> String {
        format!("{} \u{b7} {}", self.chapter, self.verse)
    }

    fn unescape(mut self) -> Self {
        self.pali = unescape_newlines(&self.pali);
        self.entrans = self.entrans.as_deref().map(unescape_newlines);
        self.vitrans = self.vitrans.as_deref().map(unescape_newlines);
        self
    }
}

/// Ordered, immutable verse collection. Clones share the same storage.
#[derive(Debug, Clone)]
pub struct VerseStore {
    verses: Arc<[Verse]>,
}

impl Default for VerseStore {
    fn default() -> Self {
        Self::empty()
    }
}

impl VerseStore {
    pub fn new(verses: Vec<Verse>) -> Self {
        Self {
            verses: verses.into(),
        }
    }

    pub fn empty() -> Self {
        Self::new(Vec::new())
    }

    /// The small verse set compiled into the binary.
    pub fn bundled() -> Self {
        match Self::from_json_str(BUNDLED_VERSES) {
            Ok(store) => store,
            Err(e) => {
                tracing::error!("bundled verse database is malformed: {e}");
                Self::empty()
            }
        }
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|e| Error::io(path, e))?;
        let store = Self::from_json_str(&text)?;
        tracing::info!("loaded {} verses from {}", store.len(), path.display());
        Ok(store)
    }

    /// Accepts either a flat array of verse records or a chapter map
    /// (`{"1. Yamakavaggo": {"1": "...", ...}}`).
    pub fn from_json_str(text: &str) -> Result<Self> {
        let value: Value = serde_json::from_str(text)?;
        Self::from_json_value(value)
    }

    pub fn from_json_value(value: Value) -> Result<Self> {
        let verses = match value {
            Value::Array(_) => serde_json::from_value::<Vec<Verse>>(value)?
                .into_iter()
                .map(Verse::unescape)
                .collect(),
            Value::Object(chapters) => verses_from_chapter_map(&chapters),
            other => {
                return Err(Error::Json(serde::de::Error::custom(format!(
                    "expected an array or an object of chapters, found {}",
                    json_kind(&other)
                ))))
            }
        };
        Ok(Self::new(verses))
    }

    pub fn len(&self) -> usize {
        self.verses.len()
    }

    pub fn is_empty(&self) -> bool {
        self.verses.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Verse> {
        self.verses.get(index)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Verse> {
        self.verses.iter()
    }
}

impl<'a> IntoIterator for &'a VerseStore {
    type Item = &'a Verse;
    type IntoIter = std::slice::Iter<'a, Verse>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

#[derive(Deserialize)]
struct TranslatedText {
    pali: String,
    #[serde(default)]
    entrans: Option<String>,
    #[serde(default)]
    vitrans: Option<String>,
}

fn verses_from_chapter_map(chapters: &Map<String, Value>) -> Vec<Verse> {
    let mut verses = Vec::new();
    for (chapter_name, stanzas) in chapters {
        let Some(stanzas) = stanzas.as_object() else {
            tracing::debug!("skipping non-object chapter entry {chapter_name:?}");
            continue;
        };
        let chapter = format!("Chapter {}", format_chapter_name(chapter_name));
        for (number, body) in stanzas {
            let number = number.trim();
            // `_meta` and other annotations are not verses.
            if !is_verse_number(number) {
                continue;
            }
            let verse = match body {
                Value::String(pali) => Verse::new(chapter.clone(), format!("Verse {number}"), pali.clone()),
                Value::Null => Verse::new(chapter.clone(), format!("Verse {number}"), ""),
                Value::Object(_) => match TranslatedText::deserialize(body) {
                    Ok(t) => Verse {
                        chapter: chapter.clone(),
                        verse: format!("Verse {number}"),
                        pali: t.pali,
                        entrans: t.entrans,
                        vitrans: t.vitrans,
                    },
                    Err(e) => {
                        tracing::warn!("skipping {chapter} verse {number}: {e}");
                        continue;
                    }
                },
                _ => {
                    tracing::warn!("skipping {chapter} verse {number}: unsupported value");
                    continue;
                }
            };
            verses.push(verse.unescape());
        }
    }
    verses
}

fn is_verse_number(key: &str) -> bool {
    !key.is_empty() && key.chars().all(|c| c.is_ascii_digit())
}

/// `"1. Yamakavaggo"` becomes `"1: Yamakavaggo"`; anything else is only
/// trimmed.
pub fn format_chapter_name(name: &str) -> String {
    let name = name.trim();
    let digits = name.chars().take_while(|c| c.is_ascii_digit()).count();
    if digits == 0 {
        return name.to_string();
    }
    let (number, rest) = name.split_at(digits);
    match rest.strip_prefix('.') {
        Some(title) => format!("{number}: {}", title.trim_start()),
        None => name.to_string(),
    }
}

fn unescape_newlines(text: &str) -> String {
    text.replace("\\n", "\n")
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn chapter_names_are_normalized() {
        assert_eq!(format_chapter_name("1. Yamakavaggo"), "1: Yamakavaggo");
        assert_eq!(format_chapter_name("  12.Maggavaggo "), "12: Maggavaggo");
        assert_eq!(format_chapter_name("Prologue"), "Prologue");
        assert_eq!(format_chapter_name("2 Appamāda"), "2 Appamāda");
    }

    #[test]
    fn chapter_map_keeps_document_order_and_skips_meta() {
        let store = VerseStore::from_json_str(
            r#"{
                "2. Appamādavaggo": {"_meta": "intro", "21": "a\\nb", "22": "c"},
                "1. Yamakavaggo": {"1": "d"},
                "broken": "not a chapter"
            }"#,
        )
        .unwrap();
        let labels: Vec<_> = store.iter().map(|v| v.heading()).collect();
        assert_eq!(
            labels,
            [
                "Chapter 2: Appamādavaggo \u{b7} Verse 21",
                "Chapter 2: Appamādavaggo \u{b7} Verse 22",
                "Chapter 1: Yamakavaggo \u{b7} Verse 1",
            ]
        );
        assert_eq!(store.get(0).unwrap().pali, "a\nb");
    }

    #[test]
    fn translations_fall_back_to_pali() {
        let store = VerseStore::from_json_str(
            r#"{"1. Yamakavaggo": {"1": {"pali": "p", "entrans": "e"}}}"#,
        )
        .unwrap();
        let verse = store.get(0).unwrap();
        assert_eq!(verse.text(Language::Pali), "p");
        assert_eq!(verse.text(Language::English), "e");
        assert_eq!(verse.text(Language::Vietnamese), "p");
    }

    #[test]
    fn odd_chapter_values_are_kept_or_skipped() {
        let store = VerseStore::from_json_str(
            r#"{"1. Yamakavaggo": {
                "1": null,
                "2": 5,
                "3": {"entrans": "no pali here"},
                "4": ["p"],
                "5": {"pali": "kept", "vitrans": 7},
                "6": "plain"
            }}"#,
        )
        .unwrap();
        let kept: Vec<(&str, &str)> = store.iter().map(|v| (v.verse.as_str(), v.pali.as_str())).collect();
        assert_eq!(kept, [("Verse 1", ""), ("Verse 6", "plain")]);
        assert_eq!(store.get(0).unwrap().text(Language::English), "");
    }

    #[test]
    fn flat_array_is_accepted() {
        let store = VerseStore::from_json_str(
            r#"[{"chapter": "Chapter 1: Yamakavaggo", "verse": "Verse 1", "pali": "x\\ny", "vitrans": "v"}]"#,
        )
        .unwrap();
        assert_eq!(store.len(), 1);
        let verse = store.get(0).unwrap();
        assert_eq!(verse.pali, "x\ny");
        assert_eq!(verse.text(Language::Vietnamese), "v");
    }

    #[test]
    fn scalar_document_is_rejected() {
        assert!(matches!(VerseStore::from_json_str("42"), Err(Error::Json(_))));
        assert!(VerseStore::from_json_str("{not json").is_err());
    }

    #[test]
    fn bundled_store_is_populated() {
        let store = VerseStore::bundled();
        assert!(!store.is_empty());
        let first = store.get(0).unwrap();
        assert_eq!(first.chapter, "Chapter 1: Yamakavaggo");
        assert_eq!(first.verse, "Verse 1");
        assert!(first.pali.contains('\n'));
        assert!(first.entrans.is_some());
    }

    #[test]
    fn clones_share_storage() {
        let store = VerseStore::new(vec![Verse::new("c", "v", "p")]);
        let other = store.clone();
        assert!(Arc::ptr_eq(&store.verses, &other.verses));
    }
}
