//! JSON study sheet export.
//!
//! # Example
//!
//! ```rust
//! use cleverly_render::{json::JsonGenerator, StudySheet};
//!
//! let sheet = StudySheet {
//!     document: "history.pdf".to_string(),
//!     ..Default::default()
//! };
//!
//! let generator = JsonGenerator::new(&sheet);
//! let compact = generator.generate().unwrap();
//! assert!(compact.contains(r#""document":"history.pdf""#));
//! ```

use std::fs::File;
use std::io::Write;
use std::path::Path;

use crate::{RenderError, Result, StudySheet};

/// JSON study sheet generator.
pub struct JsonGenerator<'a> {
    sheet: &'a StudySheet,
}

impl<'a> JsonGenerator<'a> {
    /// Creates a new JSON generator for the given sheet.
    #[must_use]
    pub const fn new(sheet: &'a StudySheet) -> Self {
        Self { sheet }
    }

    /// Generates compact JSON output (single line, no extra whitespace).
    ///
    /// # Errors
    ///
    /// Returns [`RenderError::Serialization`] if JSON serialization fails.
    pub fn generate(&self) -> Result<String> {
        serde_json::to_string(self.sheet).map_err(RenderError::from)
    }

    /// Generates pretty-printed JSON output with 2-space indentation.
    ///
    /// # Errors
    ///
    /// Returns [`RenderError::Serialization`] if JSON serialization fails.
    pub fn generate_pretty(&self) -> Result<String> {
        serde_json::to_string_pretty(self.sheet).map_err(RenderError::from)
    }

    /// Writes the sheet to a file, creating or overwriting it.
    ///
    /// Parent directories must exist.
    ///
    /// # Errors
    ///
    /// Returns [`RenderError::Serialization`] if JSON serialization fails.
    /// Returns [`RenderError::Io`] if file creation or writing fails.
    pub fn write_to_file(&self, path: &Path, pretty: bool) -> Result<()> {
        let json = if pretty {
            self.generate_pretty()?
        } else {
            self.generate()?
        };

        let mut file = File::create(path)?;
        file.write_all(json.as_bytes())?;

        Ok(())
    }
}
