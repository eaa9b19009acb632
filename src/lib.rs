#![allow(clippy::needless_return)]

//! slatelox is a tree-walking interpreter for a small dynamically-typed,
//! lexically-scoped scripting language in the Lox family. It is a hobby
//! implementation built to learn how interpreters are put together, not a
//! production language runtime.
//!
//! ## Pipeline
//! Source text passes through four stages before it produces an effect:
//!
//! 1. **Scanning** ([`scanner`]) turns the raw source into a stream of
//!    [`Token`](token::Token)s, reporting lexical errors (unterminated
//!    strings, unexpected characters) as it goes without stopping.
//! 2. **Parsing** ([`parser`]) is a hand-written recursive-descent parser
//!    that turns the token stream into [`Expr`](expr::Expr)s and
//!    [`Stmt`](stmt::Stmt)s, synchronizing past a syntax error so later
//!    mistakes in the same source are still reported.
//! 3. **Resolving** ([`resolver`]) is a static pre-pass over the AST that
//!    records, for every variable reference, how many scopes out it is
//!    bound — the interpreter uses this instead of walking the environment
//!    chain from scratch on every lookup. It also enforces the language's
//!    static rules (no `return` outside a function, no `this`/`super`
//!    outside a class, and so on) and splices `import`ed modules into the
//!    statement list, since imports have no runtime representation of
//!    their own.
//! 4. **Interpreting** ([`interpreter`]) walks the resolved AST and
//!    evaluates it directly against an [`Environment`](environment::Environment)
//!    chain, producing [`Value`](value::Value)s and side effects.
//!
//! Every stage reports through a single [`Diagnostics`](error::Diagnostics)
//! sink threaded through the call, rather than process-global state — this
//! is what lets the REPL recover from a bad line instead of poisoning the
//! rest of the session.

use std::fs;
use std::path::{Path, PathBuf};

pub mod ast;
pub mod class;
pub mod environment;
pub mod error;
pub mod expr;
pub mod function;
pub mod interpreter;
pub mod parser;
pub mod resolver;
pub mod scanner;
pub mod stmt;
pub mod token;
pub mod value;

use error::Diagnostics;
use interpreter::Interpreter;
use parser::Parser;
use resolver::Resolver;
use scanner::Scanner;

/// Owns the interpreter state across a run. One `Lox` lives for the whole
/// process in file mode; the REPL reuses a single one across lines so
/// functions and classes defined on one line are visible on the next.
pub struct Lox {
    interpreter: Interpreter,
    search_dirs: Vec<PathBuf>,
}

impl Lox {
    pub fn new(search_dirs: Vec<PathBuf>) -> Self {
        Lox { interpreter: Interpreter::new(), search_dirs }
    }

    /// Runs a script file to completion. Returns the process exit code the
    /// caller should use: 0 on success, 65 on a scan/parse/resolve error,
    /// 70 on a runtime error.
    pub fn run_file(&mut self, path: &Path) -> i32 {
        let source = match fs::read_to_string(path) {
            Ok(source) => source,
            Err(e) => {
                eprintln!("Cannot read '{}': {e}", path.display());
                return 65;
            }
        };

        let mut search_dirs = self.search_dirs.clone();
        if search_dirs.is_empty() {
            if let Some(parent) = path.parent() {
                search_dirs.push(parent.to_path_buf());
            }
        }

        let root_module_path = path.canonicalize().ok();
        let diagnostics = self.run(&source, search_dirs, root_module_path);

        if diagnostics.had_error() {
            return 65;
        }
        if diagnostics.had_runtime_error() {
            return 70;
        }
        0
    }

    /// Runs one line (or block) of source in the REPL. Errors are reported
    /// but never terminate the process; the interpreter's environment
    /// persists across calls so top-level declarations accumulate.
    pub fn run_line(&mut self, source: &str) {
        self.run(source, self.search_dirs.clone(), None);
    }

    fn run(&mut self, source: &str, search_dirs: Vec<PathBuf>, root_module_path: Option<PathBuf>) -> Diagnostics {
        let mut diagnostics = Diagnostics::new();

        let mut scanner = Scanner::new(source);
        let tokens = scanner.scan_tokens(&mut diagnostics);

        let mut parser = Parser::new(tokens);
        let statements = parser.parse(&mut diagnostics);

        if diagnostics.had_error() {
            return diagnostics;
        }

        let statements = {
            let mut resolver = Resolver::new(&mut self.interpreter, &mut diagnostics, search_dirs, root_module_path);
            resolver.resolve_program(statements)
        };

        if diagnostics.had_error() {
            return diagnostics;
        }

        self.interpreter.interpret(&statements, &mut diagnostics);
        diagnostics
    }
}
