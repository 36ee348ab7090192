//! User-facing diagnostics.
//!
//! Messages go to a text sink (stderr for the CLI) as
//! `file:line:col: error: message`, and are kept for inspection. Trace
//! messages carry no prefix and are dropped unless tracing is on.

use std::io::Write;

use serde::Serialize;

use crate::error::AsmError;
use crate::lexer::Pos;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Trace,
    Warning,
    Error,
    Fatal,
}

impl Severity {
    fn label(self) -> &'static str {
        match self {
            Severity::Trace => "",
            Severity::Warning => "warning: ",
            Severity::Error => "error: ",
            Severity::Fatal => "fatal: ",
        }
    }

    fn colour(self) -> &'static str {
        match self {
            Severity::Warning => "\x1b[95m",
            _ => "\x1b[91m",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Location {
    pub file: String,
    #[serde(flatten)]
    pub pos: Pos,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Diagnostic {
    pub severity: Severity,
    pub location: Option<Location>,
    pub message: String,
}

impl Diagnostic {
    pub fn render(&self, colour: bool) -> String {
        if self.severity == Severity::Trace {
            return self.message.clone();
        }
        let mut out = String::new();
        if let Some(loc) = &self.location {
            out.push_str(&format!("{}:{}:{}: ", loc.file, loc.pos.line, loc.pos.col));
        }
        if colour {
            out.push_str(self.severity.colour());
            out.push_str(self.severity.label());
            out.push_str("\x1b[0m");
        } else {
            out.push_str(self.severity.label());
        }
        out.push_str(&self.message);
        out
    }
}

pub struct Reporter {
    trace: bool,
    colour: bool,
    sink: Option<Box<dyn Write>>,
    emitted: Vec<Diagnostic>,
    errors: usize,
    warnings: usize,
}

impl Reporter {
    /// Keeps diagnostics in memory only.
    pub fn capture() -> Self {
        Self {
            trace: false,
            colour: false,
            sink: None,
            emitted: Vec::new(),
            errors: 0,
            warnings: 0,
        }
    }

    pub fn with_sink(sink: Box<dyn Write>, colour: bool) -> Self {
        Self {
            sink: Some(sink),
            colour,
            ..Self::capture()
        }
    }

    pub fn stderr(colour: bool) -> Self {
        Self::with_sink(Box::new(std::io::stderr()), colour)
    }

    pub fn set_trace(&mut self, on: bool) {
        self.trace = on;
    }

    pub fn trace_enabled(&self) -> bool {
        self.trace
    }

    pub fn report(&mut self, severity: Severity, location: Option<Location>, message: impl Into<String>) {
        match severity {
            Severity::Error | Severity::Fatal => self.errors += 1,
            Severity::Warning => self.warnings += 1,
            Severity::Trace if !self.trace => return,
            Severity::Trace => {}
        }
        let diag = Diagnostic {
            severity,
            location,
            message: message.into(),
        };
        if let Some(sink) = self.sink.as_mut() {
            let _ = writeln!(sink, "{}", diag.render(self.colour));
        }
        self.emitted.push(diag);
    }

    /// Reports a fatal diagnostic and hands back the error that ends the run.
    pub fn fatal(&mut self, location: Option<Location>, message: impl Into<String>) -> AsmError {
        let message = message.into();
        self.report(Severity::Fatal, location, message.clone());
        AsmError::Fatal(message)
    }

    /// True once any error or fatal diagnostic was reported.
    pub fn failed(&self) -> bool {
        self.errors > 0
    }

    pub fn error_count(&self) -> usize {
        self.errors
    }

    pub fn warning_count(&self) -> usize {
        self.warnings
    }

    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.emitted
    }

    pub fn take_diagnostics(&mut self) -> Vec<Diagnostic> {
        std::mem::take(&mut self.emitted)
    }
}
