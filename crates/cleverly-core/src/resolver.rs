//! Letter-to-text answer resolution for quiz items.
//!
//! Backends sometimes store a quiz answer as the option letter (`"B"`)
//! rather than the option text (`"London"`). Resolution rewrites the
//! letter to the text it references so answer checks can compare strings.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::artifact::QuizItem;

/// A bare option letter, surrounded by optional whitespace.
static OPTION_LETTER: Lazy<Option<Regex>> = Lazy::new(|| Regex::new(r"(?i)^\s*([a-d])\s*$").ok());

/// Returns the zero-based option index named by a bare letter answer.
///
/// `A` maps to 0 through `D` to 3; anything else yields `None`.
#[must_use]
pub fn letter_index(answer: &str) -> Option<usize> {
    let re = OPTION_LETTER.as_ref()?;
    let letter = re.captures(answer)?.get(1)?.as_str().chars().next()?;
    let index = (letter.to_ascii_uppercase() as usize).checked_sub('A' as usize)?;
    Some(index)
}

/// Resolves a quiz item's answer to the literal option text.
///
/// The answer is rewritten only when it is a bare letter `A`–`D`
/// (case-insensitive, surrounding whitespace ignored), the options are
/// non-empty and the letter's index is in bounds. An answer that already
/// matches an option verbatim is left alone, so resolving twice is the same
/// as resolving once. Out-of-range letters are kept as they are.
///
/// ```
/// use cleverly_core::{resolve_answer, QuizItem};
///
/// let item = QuizItem::new("Capital of the UK?", ["Paris", "London", "Rome", "Berlin"], "b");
/// assert_eq!(resolve_answer(item).answer, "London");
/// ```
#[must_use]
pub fn resolve_answer(item: QuizItem) -> QuizItem {
    if item.options.is_empty() || item.options.iter().any(|opt| *opt == item.answer) {
        return item;
    }

    let Some(index) = letter_index(&item.answer) else {
        return item;
    };

    match item.options.get(index) {
        Some(text) => {
            let answer = text.clone();
            QuizItem { answer, ..item }
        }
        None => {
            tracing::debug!(
                answer = %item.answer,
                options = item.options.len(),
                "Answer letter out of range, keeping it unresolved"
            );
            item
        }
    }
}

/// Resolves every item in a list, preserving order.
#[must_use]
pub fn resolve_all(items: Vec<QuizItem>) -> Vec<QuizItem> {
    items.into_iter().map(resolve_answer).collect()
}
