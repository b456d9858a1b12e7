/// Bag-of-words term vectors and cosine similarity.
///
/// Text is lowercased, split on whitespace and stripped of a closed set of English
/// function words. Each vector keeps its counts in order of first occurrence of the word
/// within its own text; there is no shared global vocabulary.
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

pub const STOP_WORDS: [&str; 40] = [
    "the", "be", "to", "of", "and", "a", "in", "that", "have", "i", "it", "for", "not", "on",
    "with", "he", "as", "you", "do", "at", "this", "but", "his", "by", "from", "they", "we",
    "say", "her", "she", "or", "an", "will", "my", "one", "all", "would", "there", "their",
    "what",
];

pub fn is_stop_word(word: &str) -> bool {
    STOP_WORDS.contains(&word)
}

/// How two independently built term vectors are lined up before the cosine.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Alignment {
    /// Pad the shorter vector with zeros and compare slot by slot, regardless of which
    /// word occupies the slot.
    #[default]
    Positional,
    /// Compare counts of the same word.
    SharedVocabulary,
}

impl Alignment {
    pub fn as_str(self) -> &'static str {
        match self {
            Alignment::Positional => "positional",
            Alignment::SharedVocabulary => "shared-vocabulary",
        }
    }
}

impl fmt::Display for Alignment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Alignment {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace('_', "-").as_str() {
            "positional" => Ok(Alignment::Positional),
            "shared-vocabulary" | "vocabulary" => Ok(Alignment::SharedVocabulary),
            other => Err(format!(
                "unknown similarity alignment '{other}' (expected 'positional' or 'shared-vocabulary')"
            )),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct TermVector {
    terms: Vec<String>,
    counts: Vec<f64>,
    norm: f64,
}

impl TermVector {
    pub fn from_text(text: &str) -> Self {
        let lowered = text.to_lowercase();
        let mut slots: HashMap<&str, usize> = HashMap::new();
        let mut terms: Vec<String> = Vec::new();
        let mut counts: Vec<f64> = Vec::new();

        for word in lowered.split_whitespace().filter(|w| !is_stop_word(w)) {
            match slots.get(word) {
                Some(&slot) => counts[slot] += 1.0,
                None => {
                    slots.insert(word, terms.len());
                    terms.push(word.to_string());
                    counts.push(1.0);
                }
            }
        }

        let norm = counts.iter().map(|c| c * c).sum::<f64>().sqrt();
        Self {
            terms,
            counts,
            norm,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }

    pub fn len(&self) -> usize {
        self.counts.len()
    }

    pub fn terms(&self) -> &[String] {
        &self.terms
    }

    pub fn counts(&self) -> &[f64] {
        &self.counts
    }

    pub fn similarity(&self, other: &TermVector, alignment: Alignment) -> f64 {
        let dot = match alignment {
            Alignment::Positional => self
                .counts
                .iter()
                .zip(&other.counts)
                .map(|(a, b)| a * b)
                .sum::<f64>(),
            Alignment::SharedVocabulary => {
                let (small, large) = if self.len() <= other.len() {
                    (self, other)
                } else {
                    (other, self)
                };
                let lookup: HashMap<&str, f64> = large
                    .terms
                    .iter()
                    .map(String::as_str)
                    .zip(large.counts.iter().copied())
                    .collect();
                small
                    .terms
                    .iter()
                    .zip(&small.counts)
                    .filter_map(|(term, count)| lookup.get(term.as_str()).map(|c| c * count))
                    .sum::<f64>()
            }
        };
        cosine(dot, self.norm, other.norm)
    }
}

fn cosine(dot: f64, norm_a: f64, norm_b: f64) -> f64 {
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    (dot / (norm_a * norm_b)).clamp(0.0, 1.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-12
    }

    #[test]
    fn counts_follow_first_occurrence_without_stop_words() {
        let v = TermVector::from_text("The Robotics lab and the robotics of Control");
        assert_eq!(v.terms(), &["robotics", "lab", "control"]);
        assert_eq!(v.counts(), &[2.0, 1.0, 1.0]);
    }

    #[test]
    fn blank_text_is_an_empty_vector() {
        assert!(TermVector::from_text("").is_empty());
        assert!(TermVector::from_text("  \t\n ").is_empty());
        assert!(TermVector::from_text("the and of").is_empty());
    }

    #[test]
    fn positional_alignment_pads_the_shorter_vector() {
        let a = TermVector::from_text("alpha beta");
        let b = TermVector::from_text("gamma gamma delta epsilon");
        // [1, 1, 0] . [2, 1, 1] = 3; |a| = sqrt(2); |b| = sqrt(6)
        let expected = 3.0 / (2.0_f64.sqrt() * 6.0_f64.sqrt());
        assert!(approx(a.similarity(&b, Alignment::Positional), expected));
    }

    #[test]
    fn positional_alignment_ignores_word_identity() {
        let a = TermVector::from_text("robotics");
        let b = TermVector::from_text("cooking");
        assert!(approx(a.similarity(&b, Alignment::Positional), 1.0));
        assert!(approx(a.similarity(&b, Alignment::SharedVocabulary), 0.0));
    }

    #[test]
    fn shared_vocabulary_matches_by_word() {
        let a = TermVector::from_text("learning machine");
        let b = TermVector::from_text("machine learning machine");
        // a = {learning:1, machine:1}; b = {machine:2, learning:1}
        let expected = 3.0 / (2.0_f64.sqrt() * 5.0_f64.sqrt());
        assert!(approx(a.similarity(&b, Alignment::SharedVocabulary), expected));
        assert!(approx(b.similarity(&a, Alignment::SharedVocabulary), expected));
    }

    #[test]
    fn empty_side_scores_zero() {
        let empty = TermVector::from_text("");
        let full = TermVector::from_text("robotics");
        assert_eq!(empty.similarity(&full, Alignment::Positional), 0.0);
        assert_eq!(full.similarity(&empty, Alignment::SharedVocabulary), 0.0);
    }

    #[test]
    fn alignment_parses_config_spellings() {
        assert_eq!("positional".parse::<Alignment>(), Ok(Alignment::Positional));
        assert_eq!(
            "Shared_Vocabulary".parse::<Alignment>(),
            Ok(Alignment::SharedVocabulary)
        );
        assert!("tfidf".parse::<Alignment>().is_err());
        assert_eq!(Alignment::SharedVocabulary.to_string(), "shared-vocabulary");
    }
}
