//! Markdown study sheet generation.
//!
//! This module provides the [`MarkdownGenerator`] struct for converting a
//! [`StudySheet`] into a printable Markdown document with:
//!
//! - The summary, paragraph by paragraph
//! - A flashcard table
//! - Numbered quiz questions with an answer key at the end
//!
//! # Example
//!
//! ```rust
//! use cleverly_render::{MarkdownGenerator, StudySheet};
//!
//! let sheet = StudySheet {
//!     document: "chemistry.pdf".to_string(),
//!     summary: Some("Atoms bond.\n\nMolecules form.".to_string()),
//!     ..Default::default()
//! };
//!
//! let markdown = MarkdownGenerator::new(&sheet).generate();
//! assert!(markdown.contains("## Summary"));
//! ```

use std::fmt::Write;

use cleverly_core::{Flashcard, QuizItem, PARAGRAPH_SEPARATOR};

use crate::StudySheet;

/// Option labels used in the quiz section.
const OPTION_LABELS: [char; 4] = ['A', 'B', 'C', 'D'];

/// Generates Markdown study sheets.
pub struct MarkdownGenerator<'a> {
    sheet: &'a StudySheet,
}

impl<'a> MarkdownGenerator<'a> {
    /// Creates a new Markdown generator for the given sheet.
    #[must_use]
    pub const fn new(sheet: &'a StudySheet) -> Self {
        Self { sheet }
    }

    /// Generates the complete Markdown document.
    ///
    /// Sections without content are skipped.
    #[must_use]
    pub fn generate(&self) -> String {
        let mut output = String::new();

        self.write_title(&mut output);
        self.write_summary(&mut output);
        self.write_flashcards(&mut output);
        self.write_quiz(&mut output);
        self.write_errors(&mut output);
        self.write_footer(&mut output);

        output
    }

    fn write_title(&self, output: &mut String) {
        let _ = writeln!(
            output,
            "# Study Sheet: {}\n",
            escape_markdown(&self.sheet.document)
        );
        if self.sheet.is_empty() {
            let _ = writeln!(output, "_Nothing has been generated for this document yet._\n");
        }
    }

    fn write_summary(&self, output: &mut String) {
        let Some(summary) = self.sheet.summary.as_deref() else {
            return;
        };
        if summary.trim().is_empty() {
            return;
        }

        let _ = writeln!(output, "## Summary\n");
        for paragraph in summary.split(PARAGRAPH_SEPARATOR) {
            let paragraph = paragraph.trim();
            if !paragraph.is_empty() {
                let _ = writeln!(output, "{paragraph}\n");
            }
        }
    }

    fn write_flashcards(&self, output: &mut String) {
        if self.sheet.flashcards.is_empty() {
            return;
        }

        let _ = writeln!(output, "## Flashcards\n");
        let _ = writeln!(output, "| # | Question | Answer |");
        let _ = writeln!(output, "|---|----------|--------|");
        for (i, Flashcard { question, answer }) in self.sheet.flashcards.iter().enumerate() {
            let _ = writeln!(
                output,
                "| {} | {} | {} |",
                i + 1,
                escape_table_cell(question),
                escape_table_cell(answer)
            );
        }
        let _ = writeln!(output);
    }

    fn write_quiz(&self, output: &mut String) {
        if self.sheet.quiz.is_empty() {
            return;
        }

        let _ = writeln!(output, "## Quiz\n");
        for (i, item) in self.sheet.quiz.iter().enumerate() {
            let _ = writeln!(output, "{}. {}\n", i + 1, escape_markdown(&item.question));
            for (j, option) in item.options.iter().enumerate() {
                let _ = writeln!(output, "   - {}) {}", option_label(j), escape_markdown(option));
            }
            let _ = writeln!(output);
        }

        let _ = writeln!(output, "### Answer Key\n");
        for (i, item) in self.sheet.quiz.iter().enumerate() {
            let _ = writeln!(output, "{}. {}", i + 1, answer_key_entry(item));
        }
        let _ = writeln!(output);
    }

    fn write_errors(&self, output: &mut String) {
        if self.sheet.errors.is_empty() {
            return;
        }

        let _ = writeln!(output, "## Not Generated\n");
        for error in &self.sheet.errors {
            let _ = writeln!(
                output,
                "- **{}**: {}",
                error.kind.title(),
                escape_markdown(&error.message)
            );
        }
        let _ = writeln!(output);
    }

    fn write_footer(&self, output: &mut String) {
        let _ = writeln!(output, "---\n");
        let _ = writeln!(
            output,
            "_Generated by Cleverly on {}_",
            self.sheet.generated_at.format("%Y-%m-%d %H:%M UTC")
        );
    }
}

/// Label for the option at `index`: `A`-`D`, then numbers.
fn option_label(index: usize) -> String {
    OPTION_LABELS
        .get(index)
        .map_or_else(|| (index + 1).to_string(), char::to_string)
}

/// The answer as `label) text`, or the bare answer when it is not an option.
fn answer_key_entry(item: &QuizItem) -> String {
    item.options
        .iter()
        .position(|opt| *opt == item.answer)
        .map_or_else(
            || escape_markdown(&item.answer),
            |index| format!("{}) {}", option_label(index), escape_markdown(&item.answer)),
        )
}

/// Escapes Markdown control characters.
fn escape_markdown(text: &str) -> String {
    let mut result = String::with_capacity(text.len());
    for ch in text.chars() {
        if matches!(ch, '*' | '_' | '`' | '#' | '[' | ']' | '\\' | '<' | '>' | '|') {
            result.push('\\');
        }
        result.push(ch);
    }
    result
}

/// Escapes text for a single table cell.
fn escape_table_cell(text: &str) -> String {
    escape_markdown(text).replace('\n', "<br>")
}

// ============================================================================
// Tests
// ============================================================================
