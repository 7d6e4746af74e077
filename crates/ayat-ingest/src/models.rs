//! Verse record models
//!
//! Two shapes share the same verse layout: what the content service returns
//! per locale ([`VerseResponse`], words carrying a single `translation`) and
//! the merged record kept in the checkpoint ([`VerseRecord`], words carrying
//! `translation_en`, `translation_ur` and `transliteration`).
//!
//! Fields the ingester does not interpret are kept in `extra` and written
//! back out unchanged.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Language-tagged text attached to a word.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LocaleText {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub language_name: Option<String>,
}

impl LocaleText {
    pub fn new(text: impl Into<String>, language_name: impl Into<String>) -> Self {
        Self {
            text: Some(text.into()),
            language_name: Some(language_name.into()),
        }
    }
}

/// A verse and its ordered words. `W` is the word shape.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Verse<W = Word> {
    pub id: u64,
    pub verse_key: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ruku_number: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text_imlaei: Option<String>,
    #[serde(default = "Vec::new")]
    pub words: Vec<W>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Word as returned for one locale.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RemoteWord {
    pub id: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub char_type_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text_imlaei: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub translation: Option<LocaleText>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transliteration: Option<LocaleText>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Word in a merged record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Word {
    pub id: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub char_type_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text_imlaei: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub translation_en: Option<LocaleText>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub translation_ur: Option<LocaleText>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transliteration: Option<LocaleText>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Body of `GET .../verses/by_key/{key}` for one locale.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VerseResponse {
    pub verse: Verse<RemoteWord>,
}

/// Merged verse as stored in the checkpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VerseRecord {
    pub verse: Verse,
}

/// Reduced projection of a [`VerseRecord`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MiniVerseRecord {
    pub verse: MiniVerse,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MiniVerse {
    pub id: u64,
    pub verse_key: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ruku_number: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text_imlaei: Option<String>,
    #[serde(default)]
    pub words: Vec<MiniWord>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MiniWord {
    pub id: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub char_type_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text_imlaei: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub translation_en: Option<LocaleText>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub translation_ur: Option<LocaleText>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transliteration: Option<LocaleText>,
}
