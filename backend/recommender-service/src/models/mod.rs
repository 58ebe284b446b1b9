/// Domain models for the problem recommendation engine.
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Difficulty tier, totally ordered (Easy < Medium < Hard).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub enum Difficulty {
    Easy,
    Medium,
    Hard,
}

impl Difficulty {
    /// Lenient parse: case-insensitive, anything unrecognized (or missing)
    /// falls back to Medium, matching the catalog preprocessing contract.
    pub fn parse(raw: Option<&str>) -> Self {
        match raw.map(|s| s.trim().to_lowercase()).as_deref() {
            Some("easy") => Difficulty::Easy,
            Some("hard") => Difficulty::Hard,
            _ => Difficulty::Medium,
        }
    }

    /// Ordinal encoding used by the feature builder (easy/medium/hard = 0/1/2).
    pub fn ladder(self) -> i8 {
        match self {
            Difficulty::Easy => 0,
            Difficulty::Medium => 1,
            Difficulty::Hard => 2,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Difficulty::Easy => "Easy",
            Difficulty::Medium => "Medium",
            Difficulty::Hard => "Hard",
        }
    }
}

/// One immutable catalog entry. Its position in the store's problem list
/// is also its row in the embedding matrix; both sides are built together
/// so the alignment holds for the lifetime of the store.
#[derive(Debug, Clone)]
pub struct Problem {
    pub frontend_id: u32,
    pub title: String,
    pub difficulty: Difficulty,
    pub tags: HashSet<String>,
    pub popularity: f32,
}

/// Transient (row index, cosine similarity to query) pair produced by recall.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Candidate {
    pub index: usize,
    pub similarity: f32,
}

/// One ranked recommendation in a response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Recommendation {
    pub frontend_id: u32,
    pub title: String,
    pub difficulty: String,
    pub topic_tags: Vec<String>,
    #[serde(rename = "problem_URL")]
    pub problem_url: String,
    pub score: f32,
}

/// One entry of a learning-path bucket, with a generated rationale.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PathEntry {
    pub frontend_id: u32,
    pub title: String,
    pub difficulty: String,
    pub tags: Vec<String>,
    pub reason: String,
    pub score: f32,
}

/// Difficulty-stratified learning path relative to a query problem.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LearningPath {
    pub before: Vec<PathEntry>,
    pub similar: Vec<PathEntry>,
    pub after: Vec<PathEntry>,
}

/// Normalize a title into the canonical problem slug: lowercase, strip a
/// leading "N. " numbering prefix, drop anything outside [a-z0-9 -],
/// collapse runs of whitespace.
pub fn clean_title(title: &str) -> String {
    let lowered = title.to_lowercase();
    let trimmed = lowered.trim();

    // Strip "123. " style numbering.
    let without_number = match trimmed.split_once('.') {
        Some((head, rest)) if !head.is_empty() && head.chars().all(|c| c.is_ascii_digit()) => {
            rest.trim_start()
        }
        _ => trimmed,
    };

    let mut cleaned = String::with_capacity(without_number.len());
    let mut last_was_space = false;
    for c in without_number.chars() {
        if c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-' {
            cleaned.push(c);
            last_was_space = false;
        } else if c.is_whitespace() {
            if !last_was_space && !cleaned.is_empty() {
                cleaned.push(' ');
            }
            last_was_space = true;
        }
    }
    cleaned.trim_end().to_string()
}

/// Canonical URL for a problem, derived from its title slug.
pub fn problem_url(title: &str) -> String {
    let slug = clean_title(title).replace(' ', "-");
    if slug.is_empty() {
        String::new()
    } else {
        format!("https://leetcode.com/problems/{}/", slug)
    }
}

/// Sorted tag list for response payloads.
pub fn sorted_tags(tags: &HashSet<String>) -> Vec<String> {
    let mut out: Vec<String> = tags.iter().cloned().collect();
    out.sort();
    out
}
