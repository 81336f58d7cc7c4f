use std::ops::Range;

pub type Level = annotate_snippets::Level;

/// Builds error and warning reports.
///
/// `ReportBuilder` holds a copy of the text that was matched, and creates
/// reports with annotated snippets of it.
pub struct ReportBuilder {
    with_colors: bool,
    code: String,
    origin: Option<String>,
}

impl ReportBuilder {
    /// Creates a new report builder for `code`.
    pub fn new(code: &str) -> Self {
        Self {
            with_colors: false,
            // Replace tab characters with a single space. This doesn't
            // affect spans, because the number of bytes remain the same, but
            // prevents reports from being wrongly formatted when printed.
            code: code.replace('\t', " "),
            origin: None,
        }
    }

    /// Indicates whether the reports should have colors. By default, this
    /// is `false`.
    pub fn with_colors(&mut self, yes: bool) -> &mut Self {
        self.with_colors = yes;
        self
    }

    /// Sets the name shown as the origin of the code, like a file name.
    pub fn with_origin<S: Into<String>>(&mut self, origin: S) -> &mut Self {
        self.origin = Some(origin.into());
        self
    }

    /// Creates a new error or warning report.
    pub fn create_report(
        &self,
        level: Level,
        span: Range<usize>,
        title: &str,
        label: &str,
        note: Option<&str>,
    ) -> String {
        let span = span.start.min(self.code.len())..span.end.min(self.code.len());

        let snippet = annotate_snippets::Snippet::source(self.code.as_str())
            .origin(self.origin.as_deref().unwrap_or("line"))
            .fold(true)
            .annotation(level.span(span).label(label));

        let mut message = level.title(title).snippet(snippet);

        if let Some(note) = note {
            message = message.footer(Level::Note.title(note));
        }

        let renderer = if self.with_colors {
            annotate_snippets::Renderer::styled()
        } else {
            annotate_snippets::Renderer::plain()
        };

        let message = renderer.render(message);
        message.to_string()
    }
}
