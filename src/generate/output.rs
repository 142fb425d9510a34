use crate::error::TranslateError;

/// Line buffer with a single indentation cursor.
///
/// Every statement lowering writes through `emit`; block rules pair one
/// `indent` with one `dedent` so the cursor returns to where it started.
pub struct Output {
    lines: Vec<String>,
    level: usize,
    unit: String,
}

impl Output {
    pub fn new(unit: impl Into<String>) -> Self {
        Self {
            lines: Vec::new(),
            level: 0,
            unit: unit.into(),
        }
    }

    pub fn indent(&mut self) {
        self.level += 1;
    }

    /// Fails instead of clamping so an unbalanced rule is caught immediately
    pub fn dedent(&mut self) -> Result<(), TranslateError> {
        self.level = self
            .level
            .checked_sub(1)
            .ok_or_else(|| TranslateError::Internal("indentation underflow".to_string()))?;
        Ok(())
    }

    /// Current cursor value
    pub fn level(&self) -> usize {
        self.level
    }

    /// Write one line prefixed by the indentation unit repeated `level` times
    pub fn emit(&mut self, line: impl AsRef<str>) {
        let mut text = self.unit.repeat(self.level);
        text.push_str(line.as_ref());
        text.push('\n');
        self.lines.push(text);
    }

    /// Finish and return the generated code
    pub fn finish(self) -> String {
        self.lines.concat()
    }
}

impl Default for Output {
    fn default() -> Self {
        Self::new("  ")
    }
}
