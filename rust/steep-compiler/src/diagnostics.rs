//! Compile error diagnostics rendered as code frames.

use crate::CompileError;

/// A compile error located in its source, ready to render as a code frame.
#[derive(Debug, Clone)]
pub struct Diagnostic {
    pub code: Option<String>,
    pub message: String,
    pub file: Option<String>,
    pub line: Option<usize>,
    pub col: Option<usize>,
    pub source_line: Option<String>,
    pub underline: Option<String>,
    pub suggestions: Vec<String>,
}

impl Diagnostic {
    /// Render with ANSI colors for terminal
    pub fn render_ansi(&self) -> String {
        self.render(Paint(true))
    }

    /// Render without colors (for logs, tests)
    pub fn render_plain(&self) -> String {
        self.render(Paint(false))
    }

    fn render(&self, paint: Paint) -> String {
        let mut out = match self.code {
            Some(ref code) => format!("{}[{}]: ", paint.red("error"), paint.bold(code)),
            None => format!("{}: ", paint.red("error")),
        };
        out.push_str(&paint.bold(&self.message));
        out.push('\n');

        let gutter = paint.cyan("|");
        if let Some(location) = self.location() {
            out.push_str(&format!("  {} {}\n", paint.cyan("-->"), location));
        }
        if let (Some(line_num), Some(line_text), Some(underline)) = (self.line, &self.source_line, &self.underline) {
            out.push_str(&format!("   {}\n", gutter));
            out.push_str(&format!("{:>3} {} {}\n", paint.cyan(&line_num.to_string()), gutter, line_text));
            out.push_str(&format!("   {} {}\n", gutter, paint.red(underline)));
        }
        if !self.suggestions.is_empty() {
            out.push_str(&format!("   {}\n", gutter));
            for suggestion in &self.suggestions {
                out.push_str(&format!("   {} {}: {}\n", paint.cyan("="), paint.cyan("help"), suggestion));
            }
        }
        out
    }

    fn location(&self) -> Option<String> {
        match (&self.file, self.line, self.col) {
            (Some(file), Some(line), Some(col)) => Some(format!("{}:{}:{}", file, line, col)),
            (Some(file), Some(line), None) => Some(format!("{}:{}", file, line)),
            (Some(file), None, _) => Some(file.clone()),
            _ => None,
        }
    }
}

/// ANSI styling, or pass-through when off.
#[derive(Clone, Copy)]
struct Paint(bool);

impl Paint {
    fn wrap(self, sgr: &str, s: &str) -> String {
        if self.0 {
            format!("\x1b[{}m{}\x1b[0m", sgr, s)
        } else {
            s.to_string()
        }
    }

    fn red(self, s: &str) -> String {
        self.wrap("31", s)
    }

    fn cyan(self, s: &str) -> String {
        self.wrap("36", s)
    }

    fn bold(self, s: &str) -> String {
        self.wrap("1", s)
    }
}

/// Convert a CompileError + source text into a Diagnostic
pub fn format_compile_error(error: &CompileError, source: &str, filename: &str) -> Diagnostic {
    let (line, col) = match error.position() {
        Some((line, col)) => (Some(line), Some(col)),
        None => (None, None),
    };
    let source_line = line.and_then(|l| get_source_line(source, l));
    let underline = match (&source_line, col) {
        (Some(text), Some(col)) => Some(make_underline(col, word_len(text, col))),
        _ => None,
    };
    Diagnostic {
        code: Some(error.code().to_string()),
        message: error.to_string(),
        file: Some(filename.to_string()),
        line,
        col,
        source_line,
        underline,
        suggestions: suggestions_for(error),
    }
}

fn suggestions_for(error: &CompileError) -> Vec<String> {
    match error {
        CompileError::MissingContractDecorator { decorator } => {
            vec![format!("mark the deployable class with @{}", decorator)]
        }
        CompileError::MultipleContractDecorators { decorator, .. } => {
            vec![format!("keep @{} on exactly one class", decorator)]
        }
        CompileError::InvalidPropertyDecorator { member, decorator, .. } => {
            vec![format!("@{} applies to methods; remove it from property '{}'", decorator, member)]
        }
        CompileError::StateOnFunctionMember { member, .. } => {
            vec![format!("declare '{}' as a method, or drop @state", member)]
        }
        CompileError::ReservedLifecycleName { .. } => {
            vec!["use a constructor for deploy logic and @onReceived for inbound transfers".to_string()]
        }
        CompileError::PrivatePayableConflict { member, .. } => {
            vec![format!("make '{}' public or remove @payable", member)]
        }
        CompileError::Lex(_) | CompileError::Parse(_) | CompileError::InheritanceCycle { .. } => vec![],
    }
}

fn get_source_line(source: &str, line: usize) -> Option<String> {
    source.lines().nth(line.checked_sub(1)?).map(|s| s.to_string())
}

/// Length of the identifier-like run starting at `col`, at least 1.
fn word_len(line: &str, col: usize) -> usize {
    let len = line
        .chars()
        .skip(col.saturating_sub(1))
        .enumerate()
        .take_while(|(i, c)| c.is_alphanumeric() || *c == '_' || (*i == 0 && (*c == '@' || *c == '#')))
        .count();
    len.max(1)
}

fn make_underline(col: usize, len: usize) -> String {
    format!("{}{}", " ".repeat(col.saturating_sub(1)), "^".repeat(len))
}
