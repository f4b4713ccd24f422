use std::collections::HashMap;
use std::path::Path;
use std::str::FromStr;
use std::sync::LazyLock;

use regex::Regex;
use serde::Deserialize;

use super::text::{char_prefix, normalize};
use crate::error::ChorusError;

const MAX_KNOWLEDGE_FILE_SIZE: u64 = 64 * 1024; // 64 KiB

const BUILTIN_TABLE: &str = include_str!("knowledge.toml");

/// Known misspellings, applied word-by-word before retrying an exact match.
const TYPO_FIXES: &[(&str, &str)] = &[
    ("inda", "india"),
    ("indai", "india"),
    ("indiaa", "india"),
    ("minster", "minister"),
    ("ministr", "minister"),
    ("primeminister", "prime minister"),
    ("captial", "capital"),
    ("capitol", "capital"),
];

static INTERROGATIVE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?:who|what)(?: is|s) (?:the )?(.+)$").expect("valid interrogative regex")
});

/// Fuzzy-matching knobs. The defaults were tuned by hand; change them only
/// with the match-behaviour tests in view.
#[derive(Debug, Clone, PartialEq)]
pub struct MatcherTuning {
    /// Share of key tokens that must overlap the message.
    pub overlap_threshold: f64,
    /// Looser share used after stripping "who is" / "what is".
    pub interrogative_overlap_threshold: f64,
    /// Prefix length for the single-keyword scan.
    pub keyword_prefix_len: usize,
    /// Shortest normalized probe considered for containment.
    pub min_containment_len: usize,
    /// Containment compares whole words instead of raw substrings.
    pub whole_word_containment: bool,
    /// Tokens shorter than this are ignored by token overlap on both sides.
    pub min_overlap_token_len: usize,
}

impl Default for MatcherTuning {
    fn default() -> Self {
        Self {
            overlap_threshold: 0.70,
            interrogative_overlap_threshold: 0.60,
            keyword_prefix_len: 4,
            min_containment_len: 4,
            whole_word_containment: false,
            min_overlap_token_len: 3,
        }
    }
}

// --- TOML deserialization structs (private, map 1:1 to the table file) ---

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct TableFile {
    #[serde(default)]
    entry: Vec<EntryFile>,
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct EntryFile {
    key: String,
    answer: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KnowledgeEntry {
    /// Normalized phrase.
    pub key: String,
    pub answer: String,
}

/// Static fact table with exact, typo-corrected and fuzzy lookup.
/// Read-only after construction; share it freely across requests.
pub struct KnowledgeBase {
    entries: Vec<KnowledgeEntry>, // file order; containment returns the first hit
    index: HashMap<String, usize>,
    tuning: MatcherTuning,
}

impl std::fmt::Debug for KnowledgeBase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KnowledgeBase")
            .field("entry_count", &self.entries.len())
            .field("tuning", &self.tuning)
            .finish()
    }
}

impl FromStr for KnowledgeBase {
    type Err = ChorusError;

    /// Parse a table with default tuning.
    fn from_str(content: &str) -> Result<Self, ChorusError> {
        Self::parse(content, MatcherTuning::default())
    }
}

impl KnowledgeBase {
    /// The table compiled into the binary.
    pub fn builtin(tuning: MatcherTuning) -> Result<Self, ChorusError> {
        Self::parse(BUILTIN_TABLE, tuning)
    }

    pub fn parse(content: &str, tuning: MatcherTuning) -> Result<Self, ChorusError> {
        let file: TableFile =
            toml::from_str(content).map_err(|e| ChorusError::KnowledgeLoad(e.to_string()))?;

        let mut entries = Vec::with_capacity(file.entry.len());
        let mut index = HashMap::with_capacity(file.entry.len());
        for (position, raw) in file.entry.into_iter().enumerate() {
            let key = normalize(&raw.key);
            let answer = raw.answer.trim().to_owned();
            if key.is_empty() || answer.is_empty() {
                return Err(ChorusError::KnowledgeLoad(format!(
                    "entry {position}: key and answer must not be empty"
                )));
            }
            if index.insert(key.clone(), entries.len()).is_some() {
                return Err(ChorusError::KnowledgeLoad(format!(
                    "entry {position}: duplicate key '{key}'"
                )));
            }
            entries.push(KnowledgeEntry { key, answer });
        }

        Ok(Self {
            entries,
            index,
            tuning,
        })
    }

    /// Load a table from a TOML file. Checks file size before reading.
    pub fn load(path: &Path, tuning: MatcherTuning) -> Result<Self, ChorusError> {
        let metadata = std::fs::metadata(path).map_err(|e| {
            ChorusError::KnowledgeLoad(format!("cannot read {}: {e}", path.display()))
        })?;

        if metadata.len() > MAX_KNOWLEDGE_FILE_SIZE {
            return Err(ChorusError::KnowledgeLoad(format!(
                "knowledge file exceeds {MAX_KNOWLEDGE_FILE_SIZE} byte limit"
            )));
        }

        let content = std::fs::read_to_string(path).map_err(|e| {
            ChorusError::KnowledgeLoad(format!("cannot read {}: {e}", path.display()))
        })?;

        Self::parse(&content, tuning)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Find an answer for `message`. Stages, first hit wins:
    /// exact, typo-corrected exact, containment, token overlap, and finally
    /// the same with a leading "who is" / "what is" stripped.
    pub fn lookup(&self, message: &str) -> Option<&str> {
        let normalized = normalize(message);
        if normalized.is_empty() {
            return None;
        }

        if let Some(answer) = self.exact(&normalized) {
            return Some(answer);
        }

        let corrected = correct_typos(&normalized);
        let probe = match &corrected {
            Some(fixed) => {
                if let Some(answer) = self.exact(fixed) {
                    return Some(answer);
                }
                fixed.as_str()
            }
            None => normalized.as_str(),
        };

        if let Some(answer) = self.containment(probe) {
            return Some(answer);
        }
        if let Some(answer) = self.token_overlap(probe, self.tuning.overlap_threshold) {
            return Some(answer);
        }

        let subject = INTERROGATIVE.captures(probe)?.get(1)?.as_str().trim();
        self.exact(subject)
            .or_else(|| self.containment(subject))
            .or_else(|| self.token_overlap(subject, self.tuning.interrogative_overlap_threshold))
    }

    /// Single-token lookup used by the keyword scan: exact key, or a key
    /// word sharing the token's leading characters.
    pub fn keyword(&self, token: &str) -> Option<&str> {
        let token = normalize(token);
        if let Some(answer) = self.exact(&token) {
            return Some(answer);
        }

        let prefix = char_prefix(&token, self.tuning.keyword_prefix_len)?;
        self.entries
            .iter()
            .find(|e| e.key.split_whitespace().any(|w| w.starts_with(prefix)))
            .map(|e| e.answer.as_str())
    }

    fn exact(&self, normalized: &str) -> Option<&str> {
        self.index
            .get(normalized)
            .map(|&i| self.entries[i].answer.as_str())
    }

    /// Key inside the probe or probe inside the key, first entry in file order.
    fn containment(&self, normalized: &str) -> Option<&str> {
        if normalized.chars().count() < self.tuning.min_containment_len {
            return None;
        }
        if self.tuning.whole_word_containment {
            let padded = format!(" {normalized} ");
            return self
                .entries
                .iter()
                .find(|e| {
                    let key = format!(" {} ", e.key);
                    padded.contains(&key) || key.contains(&padded)
                })
                .map(|e| e.answer.as_str());
        }
        self.entries
            .iter()
            .find(|e| normalized.contains(e.key.as_str()) || e.key.contains(normalized))
            .map(|e| e.answer.as_str())
    }

    /// Scores each entry by the share of its tokens that have a message
    /// token containing them or contained by them. The best score at or
    /// above `threshold` wins; ties go to the earlier entry.
    fn token_overlap(&self, normalized: &str, threshold: f64) -> Option<&str> {
        let message_tokens = self.overlap_tokens(normalized);
        if message_tokens.is_empty() {
            return None;
        }

        let mut best: Option<(f64, &KnowledgeEntry)> = None;
        for entry in &self.entries {
            let key_tokens = self.overlap_tokens(&entry.key);
            if key_tokens.is_empty() {
                continue;
            }
            let hits = key_tokens
                .iter()
                .filter(|k| {
                    message_tokens
                        .iter()
                        .any(|m| m.contains(*k) || k.contains(*m))
                })
                .count();
            let score = hits as f64 / key_tokens.len() as f64;
            if score >= threshold && best.is_none_or(|(top, _)| score > top) {
                best = Some((score, entry));
            }
        }
        best.map(|(_, e)| e.answer.as_str())
    }

    fn overlap_tokens<'a>(&self, normalized: &'a str) -> Vec<&'a str> {
        normalized
            .split_whitespace()
            .filter(|t| t.chars().count() >= self.tuning.min_overlap_token_len)
            .collect()
    }
}

/// Apply `TYPO_FIXES` word by word. `None` when nothing changed.
fn correct_typos(normalized: &str) -> Option<String> {
    let mut changed = false;
    let words: Vec<&str> = normalized
        .split_whitespace()
        .map(|w| match TYPO_FIXES.iter().find(|(typo, _)| *typo == w) {
            Some((_, fix)) => {
                changed = true;
                *fix
            }
            None => w,
        })
        .collect();
    changed.then(|| words.join(" "))
}
