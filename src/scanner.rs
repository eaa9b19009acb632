use std::rc::Rc;
use std::str::Chars;

use peekmore::{PeekMore, PeekMoreIterator};

use crate::error::Diagnostics;
use crate::token::{Kind, Literal, Token};

/// Converts source text into a token stream. Lines are pre-split once into
/// shared `Rc<str>` buffers so every token's `line_text` is an O(1) clone
/// rather than a re-scan of the source.
pub struct Scanner<'a> {
    source: PeekMoreIterator<Chars<'a>>,
    lines: Vec<Rc<str>>,
    tokens: Vec<Token>,
    start_column: usize,
    current_column: usize,
    line: usize,
}

impl<'a> Scanner<'a> {
    pub fn new(source: &'a str) -> Scanner<'a> {
        let lines: Vec<Rc<str>> = if source.is_empty() {
            vec![Rc::from("")]
        } else {
            source.split('\n').map(Rc::from).collect()
        };

        Scanner {
            source: source.chars().peekmore(),
            lines,
            tokens: vec![],
            start_column: 0,
            current_column: 0,
            line: 0,
        }
    }

    fn current_line_text(&self) -> Rc<str> {
        self.lines.get(self.line).cloned().unwrap_or_else(|| Rc::from(""))
    }

    pub fn scan_tokens(&mut self, diagnostics: &mut Diagnostics) -> Vec<Token> {
        while !self.is_at_end() {
            self.start_column = self.current_column;
            self.scan_token(diagnostics);
        }

        self.tokens.push(Token::new(
            Kind::Eof,
            String::new(),
            None,
            self.line,
            self.current_column,
            self.current_line_text(),
        ));

        std::mem::take(&mut self.tokens)
    }

    fn advance(&mut self) -> Option<char> {
        let c = self.source.next();
        if c.is_some() {
            self.current_column += 1;
        }
        c
    }

    fn peek(&mut self) -> Option<char> {
        self.source.peek().copied()
    }

    fn peek_next(&mut self) -> Option<char> {
        self.source.peek_next().copied()
    }

    fn match_next(&mut self, expected: char) -> bool {
        if self.peek() == Some(expected) {
            self.advance();
            true
        } else {
            false
        }
    }

    fn is_at_end(&mut self) -> bool {
        self.peek().is_none()
    }

    fn add_token(&mut self, kind: Kind, lexeme: String, literal: Option<Literal>) {
        self.tokens.push(Token::new(
            kind,
            lexeme,
            literal,
            self.line,
            self.start_column,
            self.current_line_text(),
        ));
    }

    fn string(&mut self, diagnostics: &mut Diagnostics) {
        let start_line = self.line;
        let start_column = self.start_column;
        let mut value = String::new();

        loop {
            match self.peek() {
                None => {
                    diagnostics.lex_error(start_line, start_column, &self.current_line_text(), "Unterminated string.");
                    return;
                }
                Some('"') => break,
                Some('\n') => {
                    value.push(self.advance().unwrap());
                    self.line += 1;
                    self.current_column = 0;
                }
                Some(c) => {
                    value.push(c);
                    self.advance();
                }
            }
        }

        self.advance(); // closing quote

        self.add_token(Kind::String, value.clone(), Some(Literal::String(value)));
    }

    /// Consumes a `/* ... */` comment, tracking nested block comments and
    /// line numbers, up to but not including the trailing `*/`'s absence
    /// at end-of-file, which is reported as a lex error.
    fn block_comment(&mut self, diagnostics: &mut Diagnostics) {
        let start_line = self.line;
        let start_column = self.start_column;
        let mut depth = 1usize;

        while depth > 0 {
            match self.advance() {
                None => {
                    diagnostics.lex_error(
                        start_line,
                        start_column,
                        &self.current_line_text(),
                        "Unterminated block comment.",
                    );
                    return;
                }
                Some('\n') => {
                    self.line += 1;
                    self.current_column = 0;
                }
                Some('*') if self.peek() == Some('/') => {
                    self.advance();
                    depth -= 1;
                }
                Some('/') if self.peek() == Some('*') => {
                    self.advance();
                    depth += 1;
                }
                Some(_) => {}
            }
        }
    }

    fn scan_token(&mut self, diagnostics: &mut Diagnostics) {
        let c = match self.advance() {
            Some(c) => c,
            None => return,
        };

        match c {
            '(' => self.add_token(Kind::LeftParen, c.to_string(), None),
            ')' => self.add_token(Kind::RightParen, c.to_string(), None),
            '{' => self.add_token(Kind::LeftBrace, c.to_string(), None),
            '}' => self.add_token(Kind::RightBrace, c.to_string(), None),
            ',' => self.add_token(Kind::Comma, c.to_string(), None),
            '.' => self.add_token(Kind::Dot, c.to_string(), None),
            '-' => self.add_token(Kind::Minus, c.to_string(), None),
            '+' => self.add_token(Kind::Plus, c.to_string(), None),
            ';' => self.add_token(Kind::Semicolon, c.to_string(), None),
            '*' => self.add_token(Kind::Star, c.to_string(), None),

            '!' => {
                if self.match_next('=') {
                    self.add_token(Kind::BangEqual, "!=".to_string(), None);
                } else {
                    self.add_token(Kind::Bang, "!".to_string(), None);
                }
            }
            '=' => {
                if self.match_next('=') {
                    self.add_token(Kind::EqualEqual, "==".to_string(), None);
                } else {
                    self.add_token(Kind::Equal, "=".to_string(), None);
                }
            }
            '<' => {
                if self.match_next('=') {
                    self.add_token(Kind::LessEqual, "<=".to_string(), None);
                } else {
                    self.add_token(Kind::Less, "<".to_string(), None);
                }
            }
            '>' => {
                if self.match_next('=') {
                    self.add_token(Kind::GreaterEqual, ">=".to_string(), None);
                } else {
                    self.add_token(Kind::Greater, ">".to_string(), None);
                }
            }
            '/' => {
                if self.match_next('/') {
                    while !matches!(self.peek(), Some('\n') | None) {
                        self.advance();
                    }
                } else if self.match_next('*') {
                    self.block_comment(diagnostics);
                } else {
                    self.add_token(Kind::Slash, "/".to_string(), None);
                }
            }

            ' ' | '\r' | '\t' => {}

            '\n' => {
                self.line += 1;
                self.current_column = 0;
            }

            '"' => self.string(diagnostics),

            c if c.is_ascii_digit() => self.number_from(c, diagnostics),

            c if c.is_alphabetic() || c == '_' => self.identifier_from(c),

            c => diagnostics.lex_error(
                self.line,
                self.start_column,
                &self.current_line_text(),
                &format!("Unexpected character '{c}'."),
            ),
        }
    }

    fn number_from(&mut self, first: char, diagnostics: &mut Diagnostics) {
        let mut value = String::from(first);

        while matches!(self.peek(), Some(c) if c.is_ascii_digit()) {
            value.push(self.advance().unwrap());
        }

        if self.peek() == Some('.') {
            if matches!(self.peek_next(), Some(c) if c.is_ascii_digit()) {
                value.push(self.advance().unwrap());
                while matches!(self.peek(), Some(c) if c.is_ascii_digit()) {
                    value.push(self.advance().unwrap());
                }
            } else {
                diagnostics.lex_error(
                    self.line,
                    self.start_column,
                    &self.current_line_text(),
                    "A number literal cannot end with a trailing '.'.",
                );
                return;
            }
        }

        let parsed: f64 = value.parse().expect("scanner only collects valid digit/dot characters");
        self.add_token(Kind::Number, value, Some(Literal::Number(parsed)));
    }

    fn identifier_from(&mut self, first: char) {
        let mut value = String::from(first);

        while matches!(self.peek(), Some(c) if c.is_alphanumeric() || c == '_') {
            value.push(self.advance().unwrap());
        }

        let kind = match value.as_str() {
            "and" => Kind::And,
            "class" => Kind::Class,
            "else" => Kind::Else,
            "false" => Kind::False,
            "for" => Kind::For,
            "fun" => Kind::Fun,
            "if" => Kind::If,
            "nil" => Kind::Nil,
            "or" => Kind::Or,
            "print" => Kind::Print,
            "return" => Kind::Return,
            "super" => Kind::Super,
            "this" => Kind::This,
            "true" => Kind::True,
            "var" => Kind::Var,
            "while" => Kind::While,
            "import" => Kind::Import,
            "static" => Kind::Prefix,
            _ => Kind::Identifier,
        };

        self.add_token(kind, value, None);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scan(source: &str) -> (Vec<Token>, Diagnostics) {
        let mut diagnostics = Diagnostics::new();
        let mut scanner = Scanner::new(source);
        let tokens = scanner.scan_tokens(&mut diagnostics);
        (tokens, diagnostics)
    }

    #[test]
    fn scans_single_and_double_char_operators() {
        let (tokens, diagnostics) = scan("!= == <= >=");
        assert!(!diagnostics.had_error());
        let kinds: Vec<Kind> = tokens.iter().map(|t| t.kind).collect();
        assert_eq!(kinds, vec![Kind::BangEqual, Kind::EqualEqual, Kind::LessEqual, Kind::GreaterEqual, Kind::Eof]);
    }

    #[test]
    fn scans_keywords_including_import_and_static() {
        let (tokens, _) = scan("import static nil");
        let kinds: Vec<Kind> = tokens.iter().map(|t| t.kind).collect();
        assert_eq!(kinds, vec![Kind::Import, Kind::Prefix, Kind::Nil, Kind::Eof]);
    }

    #[test]
    fn nested_block_comments_are_skipped() {
        let (tokens, diagnostics) = scan("/* outer /* inner */ still outer */ 1");
        assert!(!diagnostics.had_error());
        let kinds: Vec<Kind> = tokens.iter().map(|t| t.kind).collect();
        assert_eq!(kinds, vec![Kind::Number, Kind::Eof]);
    }

    #[test]
    fn unterminated_string_reports_a_lex_error_without_panicking() {
        let (_, diagnostics) = scan("\"never closed");
        assert!(diagnostics.had_error());
    }

    #[test]
    fn number_parses_as_f64() {
        let (tokens, _) = scan("3.5");
        match &tokens[0].literal {
            Some(Literal::Number(n)) => assert_eq!(*n, 3.5),
            _ => panic!("expected a number literal"),
        }
    }
}
