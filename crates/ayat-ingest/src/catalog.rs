//! Surah catalog and verse enumeration
//!
//! The catalog is the fixed list of surahs and how many verses each holds.
//! Its ascending `(surah, verse)` order is the single ordering used for the
//! resume position, for surah artifacts and for shard boundaries.

use crate::error::{IngestError, Result};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::collections::{BTreeMap, HashSet};
use std::fmt;
use std::path::Path;
use std::str::FromStr;

/// Verse counts for the 114 surahs, in surah order.
const QURAN_VERSE_COUNTS: [u32; 114] = [
    7, 286, 200, 176, 120, 165, 206, 75, 129, 109, 123, 111, 43, 52, 99, 128, 111, 110, 98, 135,
    112, 78, 118, 64, 77, 227, 93, 88, 69, 60, 34, 30, 73, 54, 45, 83, 182, 88, 75, 85, 54, 53,
    89, 59, 37, 35, 38, 29, 18, 45, 60, 49, 62, 55, 78, 96, 29, 22, 24, 13, 14, 11, 11, 18, 12,
    12, 30, 52, 52, 44, 28, 28, 20, 56, 40, 31, 50, 40, 46, 42, 29, 19, 36, 25, 22, 17, 19, 26,
    30, 20, 15, 21, 11, 8, 8, 19, 5, 8, 8, 11, 11, 8, 3, 9, 5, 4, 7, 3, 6, 3, 5, 4, 5, 6,
];

/// Canonical identity of a verse, written `"<surah>:<verse>"`.
///
/// Ordering is by surah then verse, which matches catalog enumeration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct VerseKey {
    pub surah: u32,
    pub verse: u32,
}

impl VerseKey {
    pub fn new(surah: u32, verse: u32) -> Self {
        Self { surah, verse }
    }
}

impl fmt::Display for VerseKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.surah, self.verse)
    }
}

impl FromStr for VerseKey {
    type Err = IngestError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let invalid = || IngestError::InvalidVerseKey(s.to_string());

        let (surah, verse) = s.split_once(':').ok_or_else(invalid)?;
        let surah: u32 = surah.trim().parse().map_err(|_| invalid())?;
        let verse: u32 = verse.trim().parse().map_err(|_| invalid())?;

        if surah == 0 || verse == 0 {
            return Err(invalid());
        }

        Ok(Self { surah, verse })
    }
}

impl Serialize for VerseKey {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for VerseKey {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

/// Immutable surah -> verse count table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Catalog {
    surahs: Vec<(u32, u32)>,
}

impl Catalog {
    /// Build a catalog from `(surah, verse_count)` pairs.
    ///
    /// Pairs may arrive in any order; they are stored ascending. Zero ids,
    /// zero counts and duplicate surahs are rejected.
    pub fn new(entries: impl IntoIterator<Item = (u32, u32)>) -> Result<Self> {
        let mut surahs: Vec<(u32, u32)> = entries.into_iter().collect();
        let mut seen = HashSet::with_capacity(surahs.len());

        for &(surah, count) in &surahs {
            if surah == 0 {
                return Err(IngestError::invalid_catalog("surah numbers start at 1"));
            }
            if count == 0 {
                return Err(IngestError::invalid_catalog(format!(
                    "surah {} has no verses",
                    surah
                )));
            }
            if !seen.insert(surah) {
                return Err(IngestError::invalid_catalog(format!(
                    "surah {} listed twice",
                    surah
                )));
            }
        }

        if surahs.is_empty() {
            return Err(IngestError::invalid_catalog("catalog is empty"));
        }

        surahs.sort_unstable_by_key(|&(surah, _)| surah);
        Ok(Self { surahs })
    }

    /// The full Quran: 114 surahs, 6236 verses.
    pub fn quran() -> Self {
        Self {
            surahs: (1u32..).zip(QURAN_VERSE_COUNTS).collect(),
        }
    }

    /// Load a catalog from a JSON object of `{"<surah>": <verse_count>}`.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let raw: BTreeMap<String, u32> = ayat_common::json_file::read_json(path)?
            .ok_or_else(|| {
                IngestError::invalid_catalog(format!("{} does not exist", path.display()))
            })?;

        let entries = raw
            .into_iter()
            .map(|(surah, count)| {
                surah
                    .trim()
                    .parse::<u32>()
                    .map(|surah| (surah, count))
                    .map_err(|_| {
                        IngestError::invalid_catalog(format!("'{}' is not a surah number", surah))
                    })
            })
            .collect::<Result<Vec<_>>>()?;

        Self::new(entries)
    }

    /// `(surah, verse_count)` pairs in ascending surah order.
    pub fn surahs(&self) -> &[(u32, u32)] {
        &self.surahs
    }

    pub fn verse_count(&self, surah: u32) -> Option<u32> {
        self.surahs
            .binary_search_by_key(&surah, |&(s, _)| s)
            .ok()
            .map(|idx| self.surahs[idx].1)
    }

    pub fn total_verses(&self) -> u64 {
        self.surahs.iter().map(|&(_, count)| u64::from(count)).sum()
    }

    /// Whether `key` falls inside the catalog.
    pub fn contains(&self, key: &VerseKey) -> bool {
        self.verse_count(key.surah)
            .is_some_and(|count| key.verse >= 1 && key.verse <= count)
    }

    /// Every verse key, ascending. Lazy and restartable: each call starts over.
    pub fn enumerate(&self) -> impl Iterator<Item = VerseKey> + '_ {
        self.surahs
            .iter()
            .flat_map(|&(surah, count)| verses_of(surah, count))
    }

    /// First key in enumeration order for which `is_stored` is false, or
    /// `None` when every verse is already stored.
    pub fn first_missing<F>(&self, mut is_stored: F) -> Option<VerseKey>
    where
        F: FnMut(&VerseKey) -> bool,
    {
        self.enumerate().find(|key| !is_stored(key))
    }
}

impl Default for Catalog {
    fn default() -> Self {
        Self::quran()
    }
}

/// Keys `surah:1 ..= surah:count`.
pub fn verses_of(surah: u32, count: u32) -> impl Iterator<Item = VerseKey> {
    (1..=count).map(move |verse| VerseKey::new(surah, verse))
}
