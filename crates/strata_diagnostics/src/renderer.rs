//! Plain-text rendering of diagnostics, one line each.

use crate::diagnostic::Diagnostic;
use crate::severity::Severity;

/// Renders diagnostics as single text lines suitable for a terminal.
///
/// Format: `severity[CODE] (pass): message`, followed by indented notes.
pub struct TextRenderer {
    /// Minimum severity to render; lower-severity diagnostics are skipped.
    pub min_severity: Severity,
}

impl TextRenderer {
    /// Creates a renderer that shows all diagnostics.
    pub fn new() -> Self {
        Self {
            min_severity: Severity::Note,
        }
    }

    /// Creates a renderer that only shows warnings and errors.
    pub fn quiet() -> Self {
        Self {
            min_severity: Severity::Warning,
        }
    }

    /// Renders a single diagnostic, or `None` if it is below the threshold.
    pub fn render(&self, diag: &Diagnostic) -> Option<String> {
        if diag.severity < self.min_severity {
            return None;
        }
        let mut line = match &diag.pass {
            Some(pass) => format!(
                "{}[{}] ({}): {}",
                diag.severity, diag.code, pass, diag.message
            ),
            None => format!("{}[{}]: {}", diag.severity, diag.code, diag.message),
        };
        for note in &diag.notes {
            line.push_str(&format!("\n  note: {note}"));
        }
        Some(line)
    }

    /// Renders a batch of diagnostics, one rendered entry per line.
    pub fn render_all(&self, diags: &[Diagnostic]) -> Vec<String> {
        diags.iter().filter_map(|d| self.render(d)).collect()
    }
}

impl Default for TextRenderer {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::code::{Category, DiagnosticCode};

    #[test]
    fn render_with_pass() {
        let diag = Diagnostic::note(
            DiagnosticCode::new(Category::Audit, 1),
            "overlap: 0 violations",
        )
        .with_pass("mis");
        let line = TextRenderer::new().render(&diag).unwrap();
        assert_eq!(line, "note[A001] (mis): overlap: 0 violations");
    }

    #[test]
    fn render_without_pass() {
        let diag = Diagnostic::error(DiagnosticCode::new(Category::Error, 1), "setup failed");
        let line = TextRenderer::new().render(&diag).unwrap();
        assert_eq!(line, "error[E001]: setup failed");
    }

    #[test]
    fn quiet_skips_notes() {
        let note = Diagnostic::note(DiagnosticCode::new(Category::Audit, 1), "ok");
        let warn = Diagnostic::warning(DiagnosticCode::new(Category::Warning, 1), "skipped");
        let renderer = TextRenderer::quiet();
        assert!(renderer.render(&note).is_none());
        assert!(renderer.render(&warn).is_some());
    }

    #[test]
    fn render_notes_indented() {
        let diag = Diagnostic::warning(DiagnosticCode::new(Category::Pass, 9), "no moves accepted")
            .with_note("tolerance 0.0");
        let line = TextRenderer::new().render(&diag).unwrap();
        assert!(line.contains("\n  note: tolerance 0.0"));
    }

    #[test]
    fn render_all_filters() {
        let diags = vec![
            Diagnostic::note(DiagnosticCode::new(Category::Audit, 1), "a"),
            Diagnostic::warning(DiagnosticCode::new(Category::Warning, 1), "b"),
        ];
        assert_eq!(TextRenderer::new().render_all(&diags).len(), 2);
        assert_eq!(TextRenderer::quiet().render_all(&diags).len(), 1);
    }
}
