use std::fmt;

use substring::Substring;

use crate::token::{Kind, Token};

/// Owns the pipeline's error state. One value is threaded through
/// scanning, parsing, resolving and interpreting instead of process-global
/// mutable statics.
#[derive(Debug, Default)]
pub struct Diagnostics {
    had_error: bool,
    had_runtime_error: bool,
}

impl Diagnostics {
    pub fn new() -> Self {
        Diagnostics::default()
    }

    pub fn had_error(&self) -> bool {
        self.had_error
    }

    pub fn had_runtime_error(&self) -> bool {
        self.had_runtime_error
    }

    /// Clears both flags. Used by the REPL between lines so one bad
    /// statement doesn't poison the rest of the session.
    pub fn reset(&mut self) {
        self.had_error = false;
        self.had_runtime_error = false;
    }

    /// Reports a static error anchored at a token.
    pub fn error(&mut self, token: &Token, message: &str) {
        if token.kind == Kind::Eof {
            self.report(token.line, token.column, &token.line_text, "at end", message);
        } else {
            let location = format!("at '{}'", token.lexeme);
            self.report(token.line, token.column, &token.line_text, &location, message);
        }
        self.had_error = true;
    }

    /// Reports a lexical error for which no token exists yet.
    pub fn lex_error(&mut self, line: usize, column: usize, line_text: &str, message: &str) {
        self.report(line, column, line_text, "", message);
        self.had_error = true;
    }

    pub fn runtime_error(&mut self, token: &Token, message: &str) {
        let location = format!("at '{}'", token.lexeme);
        self.report(token.line, token.column, &token.line_text, &location, message);
        self.had_runtime_error = true;
    }

    pub fn warning(&self, token: &Token, message: &str) {
        eprintln!("[line {}:{}] warning: {}", token.line + 1, token.column + 1, message);
    }

    /// Internal diagnostics, e.g. a resolver invariant that should never
    /// trip; kept distinct from `error` so it's obvious in logs which stage
    /// produced it.
    pub fn debug_error(&mut self, message: &str) {
        eprintln!("internal error: {message}");
        self.had_error = true;
    }

    fn report(&self, line: usize, column: usize, line_text: &str, location: &str, message: &str) {
        if location.is_empty() {
            eprintln!("[line {}:{}] Error: {}", line + 1, column + 1, message);
        } else {
            eprintln!("[line {}:{}] Error {}: {}", line + 1, column + 1, location, message);
        }

        if !line_text.is_empty() {
            eprintln!("    {line_text}");
            let caret_column = column.min(line_text.len());
            let underline_len = line_text.substring(caret_column, line_text.len()).chars().take(1).count().max(1);
            eprintln!("    {}{}", " ".repeat(caret_column), "^".repeat(underline_len));
        }
    }
}

/// Carries a static message plus the token it is anchored to; every error
/// stage constructs one of these and hands it to a `Diagnostics` sink.
pub trait Reportable {
    fn token(&self) -> &Token;
    fn message(&self) -> &str;
}

#[derive(Debug)]
pub struct ScanError {
    pub line: usize,
    pub column: usize,
    pub line_text: std::rc::Rc<str>,
    pub message: String,
}

#[derive(Debug)]
pub struct ParseError {
    pub token: Token,
    pub message: String,
}

impl Reportable for ParseError {
    fn token(&self) -> &Token {
        &self.token
    }

    fn message(&self) -> &str {
        &self.message
    }
}

#[derive(Debug)]
pub struct ResolveError {
    pub token: Token,
    pub message: String,
}

impl Reportable for ResolveError {
    fn token(&self) -> &Token {
        &self.token
    }

    fn message(&self) -> &str {
        &self.message
    }
}

#[derive(Debug)]
pub struct RuntimeError {
    pub token: Token,
    pub message: String,
}

impl fmt::Display for RuntimeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for RuntimeError {}

/// Non-local control-flow signal for `return`. Not an error; every
/// statement execution returns `Result<(), Signal>` and the function-call
/// boundary catches `Signal::Return` rather than letting it propagate as an
/// exception.
#[derive(Debug)]
pub enum Signal {
    Return(crate::value::Value),
    Error(RuntimeError),
}

impl From<RuntimeError> for Signal {
    fn from(e: RuntimeError) -> Self {
        Signal::Error(e)
    }
}
