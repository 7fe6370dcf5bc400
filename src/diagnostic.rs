use crate::error::ChainError;
use crate::span::Span;

/// An error or warning tied to a location in a chain script or manifest.
#[derive(Clone, Debug)]
pub struct Diagnostic {
    pub severity: Severity,
    pub message: String,
    pub span: Span,
    pub notes: Vec<String>,
    pub help: Option<String>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Severity {
    Error,
    Warning,
}

impl Diagnostic {
    pub fn error(message: String, span: Span) -> Self {
        Self {
            severity: Severity::Error,
            message,
            span,
            notes: Vec::new(),
            help: None,
        }
    }

    pub fn warning(message: String, span: Span) -> Self {
        Self {
            severity: Severity::Warning,
            message,
            span,
            notes: Vec::new(),
            help: None,
        }
    }

    pub fn with_note(mut self, note: String) -> Self {
        self.notes.push(note);
        self
    }

    pub fn with_help(mut self, help: String) -> Self {
        self.help = Some(help);
        self
    }

    pub fn is_error(&self) -> bool {
        self.severity == Severity::Error
    }

    fn report<'a>(&self, filename: &'a str, color: bool) -> ariadne::Report<'a, (&'a str, std::ops::Range<usize>)> {
        use ariadne::{Color, Config, Label, Report, ReportKind};

        let (kind, tint) = match self.severity {
            Severity::Error => (ReportKind::Error, Color::Red),
            Severity::Warning => (ReportKind::Warning, Color::Yellow),
        };

        let mut label = Label::new((filename, self.span.range())).with_message(&self.message);
        if color {
            label = label.with_color(tint);
        }

        let mut report = Report::build(kind, filename, self.span.start as usize)
            .with_config(Config::default().with_color(color))
            .with_message(&self.message)
            .with_label(label);

        for note in &self.notes {
            report = report.with_note(note);
        }
        if let Some(help) = &self.help {
            report = report.with_help(help);
        }
        report.finish()
    }

    /// Render the diagnostic to stderr.
    pub fn render(&self, filename: &str, source: &str) {
        let printed = self
            .report(filename, true)
            .eprint((filename, ariadne::Source::from(source)));
        if printed.is_err() {
            eprintln!("{}: {}", filename, self.message);
        }
    }

    /// Render without colors, for logs and tests.
    pub fn render_to_string(&self, filename: &str, source: &str) -> String {
        let mut buf = Vec::new();
        let written = self
            .report(filename, false)
            .write((filename, ariadne::Source::from(source)), &mut buf);
        match written {
            Ok(()) => String::from_utf8_lossy(&buf).into_owned(),
            Err(_) => format!("{}: {}", filename, self.message),
        }
    }
}

impl From<ChainError> for Diagnostic {
    fn from(err: ChainError) -> Self {
        let help = match &err {
            ChainError::NotFound { .. } => {
                Some("try a wider window or supply a chain script".to_string())
            }
            ChainError::Malformed(_) => None,
        };
        let diag = Diagnostic::error(err.to_string(), Span::dummy());
        match help {
            Some(help) => diag.with_help(help),
            None => diag,
        }
    }
}

/// Render a list of diagnostics.
pub fn render_diagnostics(diagnostics: &[Diagnostic], filename: &str, source: &str) {
    for diag in diagnostics {
        diag.render(filename, source);
    }
}
