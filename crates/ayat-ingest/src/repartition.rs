//! Derived layouts of a finished checkpoint
//!
//! Nothing here is incremental. Every artifact is rebuilt from the full
//! checkpoint on each call and written atomically.

use crate::catalog::{verses_of, Catalog, VerseKey};
use crate::checkpoint::Snapshot;
use crate::error::{IngestError, Result};
use crate::models::{MiniVerse, MiniVerseRecord, MiniWord, VerseRecord, Word};
use ayat_common::json_file::{read_json, write_json_atomic};
use serde::Serialize;
use std::collections::BTreeMap;
use std::path::Path;
use tracing::{info, warn};

pub const SURAH_AGGREGATE_FILE: &str = "complete_quran.json";
pub const MINI_AGGREGATE_FILE: &str = "all_ayahs_small_version.json";
pub const MERGED_MINI_FILE: &str = "merged_all_ayahs_small_version.json";

/// Projected records keyed like the checkpoint.
pub type MiniSnapshot = BTreeMap<VerseKey, MiniVerseRecord>;

/// Verses of each surah in catalog order.
pub type Grouped = BTreeMap<u32, Vec<VerseRecord>>;

#[derive(Serialize)]
struct SurahArtifact<'a> {
    surah: u32,
    verses: &'a [VerseRecord],
}

/// Group stored verses by surah, following catalog order within each
/// surah. Surahs with no stored verse are left out.
pub fn group_by_parent(snapshot: &Snapshot, catalog: &Catalog) -> Grouped {
    let mut grouped = Grouped::new();

    for &(surah, count) in catalog.surahs() {
        let verses: Vec<VerseRecord> = verses_of(surah, count)
            .filter_map(|key| snapshot.get(&key).cloned())
            .collect();
        if !verses.is_empty() {
            grouped.insert(surah, verses);
        }
    }

    let outside = snapshot.keys().filter(|k| !catalog.contains(k)).count();
    if outside > 0 {
        warn!(count = outside, "Checkpoint holds verses outside the catalog, skipping them");
    }

    grouped
}

pub fn surah_file_name(surah: u32) -> String {
    format!("surah_{surah}.json")
}

/// Write one `surah_<n>.json` per group plus the aggregate file.
pub fn write_surah_artifacts(dir: &Path, grouped: &Grouped) -> Result<()> {
    for (&surah, verses) in grouped {
        let path = dir.join(surah_file_name(surah));
        write_json_atomic(&path, &SurahArtifact { surah, verses })?;
        info!(surah, verses = verses.len(), file = %path.display(), "Wrote surah file");
    }

    let aggregate = dir.join(SURAH_AGGREGATE_FILE);
    write_json_atomic(&aggregate, grouped)?;
    info!(surahs = grouped.len(), file = %aggregate.display(), "Wrote complete file");

    Ok(())
}

/// Reduce a verse to the mini schema.
pub fn project(record: &VerseRecord) -> MiniVerseRecord {
    let verse = &record.verse;
    MiniVerseRecord {
        verse: MiniVerse {
            id: verse.id,
            verse_key: verse.verse_key.clone(),
            ruku_number: verse.ruku_number,
            text_imlaei: verse.text_imlaei.clone(),
            words: verse.words.iter().map(project_word).collect(),
        },
    }
}

fn project_word(word: &Word) -> MiniWord {
    MiniWord {
        id: word.id,
        char_type_name: word.char_type_name.clone(),
        text_imlaei: word.text_imlaei.clone(),
        location: word.location.clone(),
        translation_en: word.translation_en.clone(),
        translation_ur: word.translation_ur.clone(),
        transliteration: word.transliteration.clone(),
    }
}

pub fn project_all(snapshot: &Snapshot) -> MiniSnapshot {
    snapshot
        .iter()
        .map(|(key, record)| (*key, project(record)))
        .collect()
}

/// Split into `parts` contiguous ranges of `ceil(total / parts)` keys.
///
/// Always returns exactly `parts` maps; trailing ones may be empty.
pub fn shard(mini: &MiniSnapshot, parts: usize) -> Result<Vec<MiniSnapshot>> {
    if parts == 0 {
        return Err(IngestError::InvalidShardCount(parts));
    }

    let part_size = mini.len().div_ceil(parts).max(1);
    let mut shards = vec![MiniSnapshot::new(); parts];
    for (index, (key, record)) in mini.iter().enumerate() {
        shards[index / part_size].insert(*key, record.clone());
    }

    Ok(shards)
}

/// `part_<i>_of_<n>.json`, `i` counted from 1.
pub fn shard_file_name(index: usize, parts: usize) -> String {
    format!("part_{index}_of_{parts}.json")
}

/// Write every shard plus the unsharded mini aggregate.
pub fn write_shards(dir: &Path, mini: &MiniSnapshot, parts: usize) -> Result<()> {
    let shards = shard(mini, parts)?;
    info!(
        verses = mini.len(),
        parts,
        part_size = mini.len().div_ceil(parts),
        "Splitting mini verses"
    );

    for (i, part) in shards.iter().enumerate() {
        let name = shard_file_name(i + 1, parts);
        write_json_atomic(&dir.join(&name), part)?;
        info!(file = %name, verses = part.len(), "Wrote shard");
    }

    write_json_atomic(&dir.join(MINI_AGGREGATE_FILE), mini)?;
    info!(file = MINI_AGGREGATE_FILE, verses = mini.len(), "Wrote mini aggregate");

    Ok(())
}

/// Read shards `1..=parts` back into one mapping and write it out.
///
/// A missing shard is logged and skipped. A shard that exists but does
/// not decode is an error.
pub fn merge_shards(dir: &Path, parts: usize) -> Result<MiniSnapshot> {
    if parts == 0 {
        return Err(IngestError::InvalidShardCount(parts));
    }

    let mut merged = MiniSnapshot::new();
    for i in 1..=parts {
        let name = shard_file_name(i, parts);
        match read_json::<MiniSnapshot>(&dir.join(&name))? {
            Some(part) => {
                info!(file = %name, verses = part.len(), "Merged shard");
                merged.extend(part);
            },
            None => warn!(file = %name, "Shard not found, skipping"),
        }
    }

    write_json_atomic(&dir.join(MERGED_MINI_FILE), &merged)?;
    info!(file = MERGED_MINI_FILE, verses = merged.len(), "Wrote merged mini file");

    Ok(merged)
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::models::{LocaleText, Verse};
    use serde_json::{json, Map};
    use tempfile::TempDir;

    fn record(key: VerseKey) -> VerseRecord {
        let mut extra = Map::new();
        extra.insert("page_number".to_string(), json!(1));
        VerseRecord {
            verse: Verse {
                id: u64::from(key.surah * 1000 + key.verse),
                verse_key: key.to_string(),
                ruku_number: Some(key.surah),
                text_imlaei: Some(format!("text {key}")),
                words: vec![Word {
                    id: 1,
                    char_type_name: Some("word".to_string()),
                    text_imlaei: None,
                    location: Some(format!("{key}:1")),
                    translation_en: Some(LocaleText::new("praise", "english")),
                    translation_ur: None,
                    transliteration: None,
                    extra: Map::new(),
                }],
                extra,
            },
        }
    }

    fn snapshot(keys: &[(u32, u32)]) -> Snapshot {
        keys.iter()
            .map(|&(s, v)| (VerseKey::new(s, v), record(VerseKey::new(s, v))))
            .collect()
    }

    #[test]
    fn test_group_by_parent_orders_within_surah() {
        let catalog = Catalog::new([(1, 3), (2, 2)]).unwrap();
        let snap = snapshot(&[(2, 2), (1, 3), (1, 1), (2, 1)]);

        let grouped = group_by_parent(&snap, &catalog);
        let keys: Vec<Vec<&str>> = grouped
            .values()
            .map(|vs| vs.iter().map(|r| r.verse.verse_key.as_str()).collect())
            .collect();
        assert_eq!(keys, vec![vec!["1:1", "1:3"], vec!["2:1", "2:2"]]);
    }

    #[test]
    fn test_group_by_parent_skips_keys_outside_catalog() {
        let catalog = Catalog::new([(1, 1)]).unwrap();
        let snap = snapshot(&[(1, 1), (1, 2), (9, 1)]);

        let grouped = group_by_parent(&snap, &catalog);
        assert_eq!(grouped.len(), 1);
        assert_eq!(grouped[&1].len(), 1);
    }

    #[test]
    fn test_surah_artifacts_layout() {
        let dir = TempDir::new().unwrap();
        let catalog = Catalog::new([(1, 2), (2, 1)]).unwrap();
        let grouped = group_by_parent(&snapshot(&[(1, 1), (1, 2), (2, 1)]), &catalog);

        write_surah_artifacts(dir.path(), &grouped).unwrap();

        let surah: serde_json::Value = serde_json::from_str(
            &std::fs::read_to_string(dir.path().join("surah_1.json")).unwrap(),
        )
        .unwrap();
        assert_eq!(surah["surah"], json!(1));
        assert_eq!(surah["verses"].as_array().unwrap().len(), 2);

        let all: serde_json::Value = serde_json::from_str(
            &std::fs::read_to_string(dir.path().join(SURAH_AGGREGATE_FILE)).unwrap(),
        )
        .unwrap();
        assert_eq!(all["2"][0]["verse"]["verse_key"], json!("2:1"));
    }

    #[test]
    fn test_project_keeps_only_mini_fields() {
        let mini = project(&record(VerseKey::new(1, 1)));
        let value = serde_json::to_value(&mini).unwrap();

        assert!(value["verse"].get("page_number").is_none());
        let word = &value["verse"]["words"][0];
        assert_eq!(word["translation_en"]["text"], json!("praise"));
        assert!(word.get("translation_ur").is_none());
        assert!(word.get("transliteration").is_none());
        assert!(word.get("text_imlaei").is_none());
    }

    #[test]
    fn test_shard_sizes() {
        let keys: Vec<(u32, u32)> = (1..=7).map(|v| (1, v)).collect();
        let mini = project_all(&snapshot(&keys));
        let sizes: Vec<usize> = shard(&mini, 3).unwrap().iter().map(BTreeMap::len).collect();
        assert_eq!(sizes, vec![3, 3, 1]);

        let sizes: Vec<usize> = shard(&mini, 10).unwrap().iter().map(BTreeMap::len).collect();
        assert_eq!(sizes, vec![1, 1, 1, 1, 1, 1, 1, 0, 0, 0]);
    }

    #[test]
    fn test_shards_are_contiguous_in_key_order() {
        let mini = project_all(&snapshot(&[(2, 1), (1, 2), (1, 1), (1, 10)]));
        let shards = shard(&mini, 2).unwrap();
        let first: Vec<String> = shards[0].keys().map(ToString::to_string).collect();
        let second: Vec<String> = shards[1].keys().map(ToString::to_string).collect();
        assert_eq!(first, vec!["1:1", "1:2"]);
        assert_eq!(second, vec!["1:10", "2:1"]);
    }

    #[test]
    fn test_zero_parts_rejected() {
        assert!(matches!(
            shard(&MiniSnapshot::new(), 0),
            Err(IngestError::InvalidShardCount(0))
        ));
        let dir = TempDir::new().unwrap();
        assert!(merge_shards(dir.path(), 0).is_err());
    }

    #[test]
    fn test_shard_file_name() {
        assert_eq!(shard_file_name(1, 10), "part_1_of_10.json");
    }

    #[test]
    fn test_malformed_shard_is_an_error() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join(shard_file_name(1, 1)), "[1, 2").unwrap();
        assert!(matches!(
            merge_shards(dir.path(), 1),
            Err(IngestError::StoreCorrupt { .. })
        ));
    }
}
