//! Plain-text views of a study session for the terminal.

use std::fmt::Write;

use cleverly_core::{
    ArtifactKind, CanonicalResult, FlashcardView, Notice, OptionMark, QuizFeedback, QuizView,
    SessionView, Stage,
};

/// Shown while a generation request is in flight.
pub const LOADING_TEXT: &str = "Generating with AI, please wait…";

/// Shown in place of content when the backend reports a content error.
pub const CONTENT_ERROR_TEXT: &str =
    "❌ AI output could not be processed. Please try again or use a different PDF.";

/// Option labels, in display order.
const OPTION_LABELS: [char; 4] = ['A', 'B', 'C', 'D'];

/// Renders the whole session for the current stage.
#[must_use]
pub fn render_view(view: &SessionView) -> String {
    let mut output = String::new();

    if let Some(notice) = &view.notice {
        let _ = writeln!(output, "{}\n", render_notice(notice));
    }

    match view.stage {
        Stage::Upload => {
            let _ = writeln!(output, "Upload a PDF to get started.");
        }
        Stage::Choose => {
            let document = view.document.as_deref().unwrap_or_default();
            let _ = writeln!(output, "📄 {document}");
            let _ = writeln!(output, "What would you like to generate?");
            let _ = writeln!(output, "  [f] Flashcards  [q] Quiz  [s] Summary");
        }
        Stage::Results => {
            if let Some(kind) = view.selected {
                let _ = writeln!(output, "{}\n", kind.title());
                output.push_str(&render_results(view, kind));
            }
        }
    }

    output
}

/// Renders the body of the results stage for `kind`.
fn render_results(view: &SessionView, kind: ArtifactKind) -> String {
    if view.loading {
        return format!("{LOADING_TEXT}\n");
    }

    match view.results.get(kind) {
        Some(CanonicalResult::ContentError(message)) => render_content_error(message),
        Some(CanonicalResult::Summary(text)) => render_summary(text),
        Some(CanonicalResult::Flashcards(_)) => view
            .flashcards
            .as_ref()
            .map_or_else(|| "No flashcards were generated.\n".to_string(), render_flashcard),
        Some(CanonicalResult::Quiz(_)) => view
            .quiz
            .as_ref()
            .map_or_else(|| "No quiz questions were generated.\n".to_string(), render_quiz),
        None => String::new(),
    }
}

/// Renders a failure notice.
#[must_use]
pub fn render_notice(notice: &Notice) -> String {
    format!("Error: {}", notice.message)
}

/// Renders a backend content error with its detail line.
#[must_use]
pub fn render_content_error(message: &str) -> String {
    format!("{CONTENT_ERROR_TEXT}\n\n{message}\n")
}

/// Renders summary text, or a placeholder when it is empty.
#[must_use]
pub fn render_summary(text: &str) -> String {
    if text.trim().is_empty() {
        return "No summary was generated.\n".to_string();
    }
    format!("{}\n", text.trim_end())
}

/// Renders the current flashcard with its position.
#[must_use]
pub fn render_flashcard(view: &FlashcardView) -> String {
    let mut output = String::new();
    let _ = writeln!(output, "Q: {}", view.card.question);
    let _ = writeln!(output, "A: {}", view.card.answer);
    let _ = writeln!(output);
    let _ = writeln!(output, "{}", nav_line(view.index, view.total, view.has_prev, view.has_next));
    output
}

/// Renders the current quiz question, its options and any feedback.
#[must_use]
pub fn render_quiz(view: &QuizView) -> String {
    let mut output = String::new();
    let _ = writeln!(output, "Q{}: {}", view.index + 1, view.item.question);

    for (i, option) in view.item.options.iter().enumerate() {
        let label = OPTION_LABELS
            .get(i)
            .map_or_else(|| (i + 1).to_string(), char::to_string);
        let mark = match view.marks.get(i) {
            Some(OptionMark::Correct) => " ✓",
            Some(OptionMark::Wrong) => " ✗",
            Some(OptionMark::Neutral) | None => "",
        };
        let _ = writeln!(output, "  {label}) {option}{mark}");
    }

    if let Some(feedback) = &view.feedback {
        let _ = writeln!(output);
        let _ = writeln!(output, "{}", render_feedback(feedback));
    }

    let _ = writeln!(output);
    let _ = writeln!(output, "{}", nav_line(view.index, view.total, view.has_prev, view.has_next));
    output
}

/// Renders answer feedback.
#[must_use]
pub fn render_feedback(feedback: &QuizFeedback) -> String {
    match feedback {
        QuizFeedback::Correct => "✅ Correct!".to_string(),
        QuizFeedback::Incorrect { correct_answer } => {
            format!("❌ Oops… The correct answer is: {correct_answer}")
        }
    }
}

/// Renders `← Prev  i / n  Next →`, dimming unavailable directions.
fn nav_line(index: usize, total: usize, has_prev: bool, has_next: bool) -> String {
    let prev = if has_prev { "← Prev" } else { "      " };
    let next = if has_next { "Next →" } else { "" };
    format!("{prev}  {} / {total}  {next}", index + 1)
        .trim_end()
        .to_string()
}
