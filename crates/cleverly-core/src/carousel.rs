//! Carousel controllers for browsing flashcards and answering quizzes.
//!
//! A carousel only tracks a position (and, for quizzes, the answer
//! sub-state); the items themselves stay in the results store and are
//! passed in when a view is needed.

use serde::{Deserialize, Serialize};

use crate::artifact::{Flashcard, QuizItem};
use crate::error::CleverlyError;

/// Direction of a carousel move.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    /// Towards the first item.
    Prev,
    /// Towards the last item.
    Next,
}

impl std::str::FromStr for Direction {
    type Err = CleverlyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "prev" | "previous" | "p" => Ok(Self::Prev),
            "next" | "n" => Ok(Self::Next),
            _ => Err(CleverlyError::UnknownDirection(s.to_string())),
        }
    }
}

// ============================================================================
// Carousel
// ============================================================================

/// A bounds-checked cursor over a list of `len` items.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Carousel {
    index: usize,
    len: usize,
}

impl Carousel {
    /// Creates a carousel at the first of `len` items.
    #[must_use]
    pub const fn over(len: usize) -> Self {
        Self { index: 0, len }
    }

    /// Current zero-based position.
    #[must_use]
    pub const fn index(&self) -> usize {
        self.index
    }

    /// Number of items the carousel spans.
    #[must_use]
    pub const fn len(&self) -> usize {
        self.len
    }

    /// Returns `true` if there is nothing to show.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Returns `true` if `prev` would move.
    #[must_use]
    pub const fn has_prev(&self) -> bool {
        self.index > 0
    }

    /// Returns `true` if `next` would move.
    #[must_use]
    pub const fn has_next(&self) -> bool {
        self.index + 1 < self.len
    }

    /// Moves forward one item. Returns `false` at the last item.
    pub fn next(&mut self) -> bool {
        if !self.has_next() {
            return false;
        }
        self.index += 1;
        true
    }

    /// Moves back one item. Returns `false` at the first item.
    pub fn prev(&mut self) -> bool {
        if !self.has_prev() {
            return false;
        }
        self.index -= 1;
        true
    }

    /// Moves in `direction`. Returns `true` if the position changed.
    pub fn step(&mut self, direction: Direction) -> bool {
        match direction {
            Direction::Prev => self.prev(),
            Direction::Next => self.next(),
        }
    }

    /// Returns the item under the cursor.
    #[must_use]
    pub fn current<'a, T>(&self, items: &'a [T]) -> Option<&'a T> {
        items.get(self.index)
    }
}

// ============================================================================
// Flashcards
// ============================================================================

/// Read-only view of the flashcard carousel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FlashcardView {
    /// Zero-based position.
    pub index: usize,
    /// Number of cards.
    pub total: usize,
    /// The card under the cursor.
    pub card: Flashcard,
    /// Whether `prev` would move.
    pub has_prev: bool,
    /// Whether `next` would move.
    pub has_next: bool,
}

/// Navigator over a flashcard list.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FlashcardCarousel {
    nav: Carousel,
}

impl FlashcardCarousel {
    /// Creates a navigator over `len` cards, starting at the first.
    #[must_use]
    pub const fn over(len: usize) -> Self {
        Self {
            nav: Carousel::over(len),
        }
    }

    /// Current zero-based position.
    #[must_use]
    pub const fn index(&self) -> usize {
        self.nav.index()
    }

    /// Moves one card forward; no-op at the last card.
    pub fn next(&mut self) -> bool {
        self.nav.next()
    }

    /// Moves one card back; no-op at the first card.
    pub fn prev(&mut self) -> bool {
        self.nav.prev()
    }

    /// Moves in `direction`.
    pub fn step(&mut self, direction: Direction) -> bool {
        self.nav.step(direction)
    }

    /// Builds the view for `cards`, or `None` if there is nothing to show.
    #[must_use]
    pub fn view(&self, cards: &[Flashcard]) -> Option<FlashcardView> {
        let card = self.nav.current(cards)?.clone();
        Some(FlashcardView {
            index: self.nav.index(),
            total: cards.len(),
            card,
            has_prev: self.nav.has_prev(),
            has_next: self.nav.has_next(),
        })
    }
}

// ============================================================================
// Quiz
// ============================================================================

/// Outcome shown once an option has been picked.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "result", rename_all = "snake_case")]
pub enum QuizFeedback {
    /// The picked option is the answer.
    Correct,
    /// The picked option is not the answer.
    Incorrect {
        /// The answer text to show instead.
        #[serde(rename = "correctAnswer")]
        correct_answer: String,
    },
}

impl QuizFeedback {
    /// Returns `true` for [`QuizFeedback::Correct`].
    #[must_use]
    pub const fn is_correct(&self) -> bool {
        matches!(self, Self::Correct)
    }
}

/// How an option should be highlighted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OptionMark {
    /// Not revealed, or neither picked nor correct.
    Neutral,
    /// The correct option, after reveal.
    Correct,
    /// The picked option when it is wrong.
    Wrong,
}

/// Read-only view of the quiz carousel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuizView {
    /// Zero-based position.
    pub index: usize,
    /// Number of questions.
    pub total: usize,
    /// The question under the cursor.
    pub item: QuizItem,
    /// Highlight for each option, parallel to `item.options`.
    pub marks: Vec<OptionMark>,
    /// The option the user picked, if any.
    pub selected_option: Option<String>,
    /// Whether feedback is showing.
    pub revealed: bool,
    /// Feedback for the pick, once revealed.
    pub feedback: Option<QuizFeedback>,
    /// Whether `prev` would move.
    pub has_prev: bool,
    /// Whether `next` would move.
    pub has_next: bool,
}

/// Navigator over a quiz with a per-question reveal state.
///
/// The first option picked for a question is final; moving to another
/// question clears the pick.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QuizCarousel {
    nav: Carousel,
    selected_option: Option<String>,
    revealed: bool,
}

impl QuizCarousel {
    /// Creates a navigator over `len` questions, starting at the first.
    #[must_use]
    pub const fn over(len: usize) -> Self {
        Self {
            nav: Carousel::over(len),
            selected_option: None,
            revealed: false,
        }
    }

    /// Current zero-based position.
    #[must_use]
    pub const fn index(&self) -> usize {
        self.nav.index()
    }

    /// The option picked for the current question.
    #[must_use]
    pub fn selected_option(&self) -> Option<&str> {
        self.selected_option.as_deref()
    }

    /// Whether feedback is showing for the current question.
    #[must_use]
    pub const fn revealed(&self) -> bool {
        self.revealed
    }

    /// Moves to the next question and clears the pick.
    ///
    /// At the last question nothing changes and the pick stays revealed.
    pub fn next(&mut self) -> bool {
        let moved = self.nav.next();
        if moved {
            self.clear_selection();
        }
        moved
    }

    /// Moves to the previous question and clears the pick.
    pub fn prev(&mut self) -> bool {
        let moved = self.nav.prev();
        if moved {
            self.clear_selection();
        }
        moved
    }

    /// Moves in `direction`.
    pub fn step(&mut self, direction: Direction) -> bool {
        match direction {
            Direction::Prev => self.prev(),
            Direction::Next => self.next(),
        }
    }

    /// Picks an option and reveals feedback.
    ///
    /// Ignored once the current question has been revealed. Returns `true`
    /// if the pick was taken.
    pub fn select_option(&mut self, option: impl Into<String>) -> bool {
        if self.revealed {
            return false;
        }
        self.selected_option = Some(option.into());
        self.revealed = true;
        true
    }

    /// Feedback for `item`, once an option has been revealed.
    #[must_use]
    pub fn feedback(&self, item: &QuizItem) -> Option<QuizFeedback> {
        if !self.revealed {
            return None;
        }
        if self.selected_option.as_deref() == Some(item.answer.as_str()) {
            Some(QuizFeedback::Correct)
        } else {
            Some(QuizFeedback::Incorrect {
                correct_answer: item.answer.clone(),
            })
        }
    }

    /// Highlight for each option of `item`.
    #[must_use]
    pub fn marks(&self, item: &QuizItem) -> Vec<OptionMark> {
        item.options
            .iter()
            .map(|opt| {
                if !self.revealed {
                    OptionMark::Neutral
                } else if *opt == item.answer {
                    OptionMark::Correct
                } else if self.selected_option.as_deref() == Some(opt.as_str()) {
                    OptionMark::Wrong
                } else {
                    OptionMark::Neutral
                }
            })
            .collect()
    }

    /// Builds the view for `items`, or `None` if there is nothing to show.
    #[must_use]
    pub fn view(&self, items: &[QuizItem]) -> Option<QuizView> {
        let item = self.nav.current(items)?;
        Some(QuizView {
            index: self.nav.index(),
            total: items.len(),
            marks: self.marks(item),
            selected_option: self.selected_option.clone(),
            revealed: self.revealed,
            feedback: self.feedback(item),
            has_prev: self.nav.has_prev(),
            has_next: self.nav.has_next(),
            item: item.clone(),
        })
    }

    fn clear_selection(&mut self) {
        self.selected_option = None;
        self.revealed = false;
    }
}
