//! In-process port of PostgreSQL's `ts_rank` with default weights and no
//! length normalisation.
//!
//! Lexemes are lowercase alphanumeric words; English stop words are dropped but
//! still consume a position, as `to_tsvector('english', ...)` does. No stemming
//! is applied, so `posts` and `post` are distinct lexemes here.

use std::collections::BTreeMap;

/// Largest position a lexeme occurrence can carry.
const MAX_POSITION: u16 = (1 << 14) - 1;
/// Occurrences kept per lexeme.
const MAX_OCCURRENCES: usize = 256;
/// `sum(1/i^2)` for `i` in `1..`, i.e. `pi^2 / 6`.
const ZETA_2: f32 = 1.644_934_1;

/// Label attached to every position of a document section.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Weight {
    A,
    B,
    C,
    D,
}

impl Weight {
    pub fn value(self) -> f32 {
        match self {
            Weight::A => 1.0,
            Weight::B => 0.4,
            Weight::C => 0.2,
            Weight::D => 0.1,
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct Occurrence {
    position: u16,
    weight: Weight,
}

/// A `tsvector`-like document: lexeme to ascending weighted positions.
#[derive(Debug, Clone, Default)]
pub struct WeightedDocument {
    lexemes: BTreeMap<String, Vec<Occurrence>>,
    max_position: u16,
}

impl WeightedDocument {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append `text` with `weight`, positions continuing after the last stored one.
    pub fn append(&mut self, text: &str, weight: Weight) {
        let offset = usize::from(self.max_position);
        for (index, word) in words(text).enumerate() {
            if is_stop_word(&word) {
                continue;
            }
            let position = (offset + index + 1).min(usize::from(MAX_POSITION)) as u16;
            let occurrences = self.lexemes.entry(word).or_default();
            if occurrences.len() >= MAX_OCCURRENCES
                || occurrences.last().is_some_and(|o| o.position == position)
            {
                continue;
            }
            occurrences.push(Occurrence { position, weight });
            self.max_position = self.max_position.max(position);
        }
    }

    fn occurrences(&self, lexeme: &str) -> Option<&[Occurrence]> {
        self.lexemes.get(lexeme).map(Vec::as_slice)
    }
}

/// A plain query: every lexeme must match (`plainto_tsquery`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextQuery {
    terms: Vec<String>,
}

impl TextQuery {
    pub fn parse(text: &str) -> Self {
        let mut terms: Vec<String> = words(text).filter(|w| !is_stop_word(w)).collect();
        terms.sort();
        terms.dedup();
        Self { terms }
    }

    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }
}

/// Rank `doc` against `query`.
pub fn ts_rank(doc: &WeightedDocument, query: &TextQuery) -> f32 {
    if query.terms.is_empty() {
        return 0.0;
    }

    let rank = if query.terms.len() < 2 {
        rank_or(doc, &query.terms)
    } else {
        rank_and(doc, &query.terms)
    };

    if rank < 0.0 { 1e-20 } else { rank }
}

fn rank_or(doc: &WeightedDocument, terms: &[String]) -> f32 {
    let mut rank = 0.0_f32;

    for occurrences in terms.iter().filter_map(|t| doc.occurrences(t)) {
        let mut sum = 0.0_f32;
        let mut max_weight = -1.0_f32;
        let mut max_index = 0_usize;

        for (j, occurrence) in occurrences.iter().enumerate() {
            let w = occurrence.weight.value();
            sum += w / ((j + 1) * (j + 1)) as f32;
            if w > max_weight {
                max_weight = w;
                max_index = j;
            }
        }

        let damped = max_weight / ((max_index + 1) * (max_index + 1)) as f32;
        rank += (max_weight + sum - damped) / ZETA_2;
    }

    rank / terms.len() as f32
}

fn rank_and(doc: &WeightedDocument, terms: &[String]) -> f32 {
    let positions: Vec<Option<&[Occurrence]>> =
        terms.iter().map(|t| doc.occurrences(t)).collect();
    let mut rank = -1.0_f32;

    for (i, current) in positions.iter().enumerate() {
        let Some(current) = current else {
            continue;
        };
        for previous in positions[..i].iter().flatten() {
            for a in current.iter() {
                for b in previous.iter() {
                    let dist = (i32::from(a.position) - i32::from(b.position)).abs();
                    if dist == 0 {
                        continue;
                    }
                    let weight = (a.weight.value() * b.weight.value() * word_distance(dist)).sqrt();
                    rank = if rank < 0.0 {
                        weight
                    } else {
                        1.0 - (1.0 - rank) * (1.0 - weight)
                    };
                }
            }
        }
    }

    rank
}

fn word_distance(dist: i32) -> f32 {
    if dist > 100 {
        return 1e-30;
    }
    1.0 / (1.005 + 0.05 * ((dist as f32) / 1.5 - 2.0).exp())
}

fn words(text: &str) -> impl Iterator<Item = String> + '_ {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|w| !w.is_empty())
        .map(str::to_lowercase)
}

fn is_stop_word(word: &str) -> bool {
    ENGLISH_STOP_WORDS.contains(&word)
}

const ENGLISH_STOP_WORDS: &[&str] = &[
    "i", "me", "my", "myself", "we", "our", "ours", "ourselves", "you", "your", "yours",
    "yourself", "yourselves", "he", "him", "his", "himself", "she", "her", "hers", "herself",
    "it", "its", "itself", "they", "them", "their", "theirs", "themselves", "what", "which",
    "who", "whom", "this", "that", "these", "those", "am", "is", "are", "was", "were", "be",
    "been", "being", "have", "has", "had", "having", "do", "does", "did", "doing", "a", "an",
    "the", "and", "but", "if", "or", "because", "as", "until", "while", "of", "at", "by",
    "for", "with", "about", "against", "between", "into", "through", "during", "before",
    "after", "above", "below", "to", "from", "up", "down", "in", "out", "on", "off", "over",
    "under", "again", "further", "then", "once", "here", "there", "when", "where", "why",
    "how", "all", "any", "both", "each", "few", "more", "most", "other", "some", "such", "no",
    "nor", "not", "only", "own", "same", "so", "than", "too", "very", "s", "t", "can", "will",
    "just", "don", "should", "now",
];
