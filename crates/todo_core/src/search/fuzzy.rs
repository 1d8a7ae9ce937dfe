//! Fuzzy subsequence matching primitive.
//!
//! # Responsibility
//! - Decide whether a needle is a case-insensitive subsequence of a haystack.
//! - Score matches so that tighter, boundary-aligned hits rank first.
//!
//! # Invariants
//! - Lower scores are better; scores may be negative.
//! - An empty needle matches everything with score `0`.

use once_cell::sync::Lazy;
use regex::Regex;

static LETTERS_THEN_DIGITS_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^([a-z]+)([0-9]+)$").expect("valid letters/digits regex"));
static DIGITS_THEN_LETTERS_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^([0-9]+)([a-z]+)$").expect("valid digits/letters regex"));

const CONSECUTIVE_BONUS: f64 = 5.0;
const WORD_BOUNDARY_BONUS: f64 = 10.0;
const GAP_PENALTY_PER_CHAR: f64 = 2.0;
const POSITION_PENALTY: f64 = 0.1;
const SWAPPED_PENALTY: f64 = 5.0;

/// Pluggable matching/scoring function used by the rank engine.
pub trait FuzzyMatcher {
    /// Returns the match score, or `None` when `needle` does not match.
    fn score(&self, needle: &str, haystack: &str) -> Option<f64>;
}

impl<F> FuzzyMatcher for F
where
    F: Fn(&str, &str) -> Option<f64>,
{
    fn score(&self, needle: &str, haystack: &str) -> Option<f64> {
        self(needle, haystack)
    }
}

/// Default subsequence matcher.
///
/// Consecutive runs and word-boundary hits lower the score; gaps and late
/// positions raise it. Needles shaped like `abc123` / `123abc` that fail are
/// retried with the two halves swapped at a small penalty.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SubsequenceMatcher;

impl FuzzyMatcher for SubsequenceMatcher {
    fn score(&self, needle: &str, haystack: &str) -> Option<f64> {
        let needle = needle.to_lowercase();
        let haystack: Vec<char> = haystack.to_lowercase().chars().collect();

        if let Some(score) = score_subsequence(&needle, &haystack) {
            return Some(score);
        }

        let swapped = LETTERS_THEN_DIGITS_RE
            .captures(&needle)
            .or_else(|| DIGITS_THEN_LETTERS_RE.captures(&needle))
            .map(|caps| format!("{}{}", &caps[2], &caps[1]))?;
        score_subsequence(&swapped, &haystack).map(|score| score + SWAPPED_PENALTY)
    }
}

fn score_subsequence(needle: &str, haystack: &[char]) -> Option<f64> {
    let needle: Vec<char> = needle.chars().collect();
    if needle.is_empty() {
        return Some(0.0);
    }
    if needle.len() > haystack.len() {
        return None;
    }

    let mut needle_index = 0;
    let mut score = 0.0;
    let mut last_match: Option<usize> = None;
    let mut consecutive = 0u32;

    for (index, &c) in haystack.iter().enumerate() {
        if needle_index == needle.len() {
            break;
        }
        if c != needle[needle_index] {
            continue;
        }

        match last_match {
            Some(last) if last + 1 == index => {
                consecutive += 1;
                score -= f64::from(consecutive) * CONSECUTIVE_BONUS;
            }
            Some(last) => {
                consecutive = 0;
                score += (index - last - 1) as f64 * GAP_PENALTY_PER_CHAR;
            }
            None => consecutive = 0,
        }
        if index == 0 || is_word_separator(haystack[index - 1]) {
            score -= WORD_BOUNDARY_BONUS;
        }
        score += index as f64 * POSITION_PENALTY;

        last_match = Some(index);
        needle_index += 1;
    }

    (needle_index == needle.len()).then_some(score)
}

fn is_word_separator(c: char) -> bool {
    c.is_whitespace() || matches!(c, '-' | '_' | '.' | '/' | ':')
}
