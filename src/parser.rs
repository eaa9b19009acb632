use crate::error::{Diagnostics, ParseError};
use crate::expr::*;
use crate::stmt::*;
use crate::token::{Kind, Literal as TokenLiteral, Token};
use crate::value::Value;

type ParseResult<T> = Result<T, ParseError>;

/// Returns true (and consumes the token) if the next token is any of the
/// given kinds.
macro_rules! matches_kind {
    ( $self:ident, $( $kind:expr ),+ ) => {
        {
            if $( $self.check($kind) )||* {
                $self.advance();
                true
            } else {
                false
            }
        }
    }
}

/// Recursive-descent parser.
///
/// - Program     -> Declaration* EOF ;
/// - Block       -> "{" Declaration* "}" ;
/// - Declaration -> ImportDecl | ClassDecl | FunDecl | VarDecl | Statement ;
/// - ImportDecl  -> "import" IDENTIFIER ";" ;
/// - ClassDecl   -> "class" IDENTIFIER ( "<" IDENTIFIER )? "{" Function* "}" ;
/// - FunDecl     -> "fun" Function ;
/// - VarDecl     -> "var" IDENTIFIER ( "=" Expression )? ";" ;
/// - Function    -> "static"? IDENTIFIER "(" Parameters? ")" Block ;
/// - Parameters  -> IDENTIFIER ( "," IDENTIFIER )* ;
/// - Statement   -> ExprStmt | ForStmt | IfStmt | PrintStmt | ReturnStmt | WhileStmt | Block ;
/// - ExprStmt    -> Expression ";" ;
/// - ForStmt     -> "for" "(" ( VarDecl | ExprStmt | ";" ) Expression? ";" Expression? ")" Statement ;
/// - IfStmt      -> "if" "(" Expression ")" Statement ( "else" Statement )? ;
/// - PrintStmt   -> "print" Expression ";" ;
/// - ReturnStmt  -> "return" Expression? ";" ;
/// - WhileStmt   -> "while" "(" Expression ")" Statement ;
/// - Expression  -> Assignment ;
/// - Assignment  -> ( Call "." )? IDENTIFIER "=" Assignment | LogicOr ;
/// - LogicOr     -> LogicAnd ( "or" LogicAnd )* ;
/// - LogicAnd    -> Equality ( "and" Equality )* ;
/// - Equality    -> Comparison ( ( "!=" | "==" ) Comparison )* ;
/// - Comparison  -> Term ( ( ">" | ">=" | "<" | "<=" ) Term )* ;
/// - Term        -> Factor ( ( "+" | "-" ) Factor )* ;
/// - Factor      -> Unary ( ( "*" | "/" ) Unary )* ;
/// - Unary       -> ( "!" | "-" ) Unary | Call ;
/// - Arguments   -> Expression ( "," Expression )* ;
/// - Call        -> Primary ( "(" Arguments? ")" | "." IDENTIFIER )* ;
/// - Lambda      -> "fun" "(" Parameters? ")" Block ;
/// - Primary     -> NUMBER | STRING | "false" | "true" | "nil" | "this" | Lambda
///                  | "(" Expression ")" | IDENTIFIER | "super" "." IDENTIFIER ;
pub struct Parser {
    tokens: Vec<Token>,
    current: usize,
}

impl Parser {
    pub fn new(tokens: Vec<Token>) -> Self {
        Parser { tokens, current: 0 }
    }

    pub fn parse(&mut self, diagnostics: &mut Diagnostics) -> Vec<Stmt> {
        let mut statements = Vec::new();

        while !self.is_at_end() {
            if let Some(stmt) = self.declaration(diagnostics) {
                statements.push(stmt);
            }
        }

        statements
    }

    fn peek(&self) -> &Token {
        &self.tokens[self.current]
    }

    fn previous(&self) -> &Token {
        &self.tokens[self.current - 1]
    }

    fn is_at_end(&self) -> bool {
        self.peek().kind == Kind::Eof
    }

    fn check(&self, kind: Kind) -> bool {
        !self.is_at_end() && self.peek().kind == kind
    }

    fn advance(&mut self) -> &Token {
        if !self.is_at_end() {
            self.current += 1;
        }
        self.previous()
    }

    fn consume(&mut self, kind: Kind, message: &str) -> ParseResult<&Token> {
        if self.check(kind) {
            return Ok(self.advance());
        }

        Err(ParseError { token: self.peek().clone(), message: message.to_string() })
    }

    fn declaration(&mut self, diagnostics: &mut Diagnostics) -> Option<Stmt> {
        let statement = if matches_kind!(self, Kind::Import) {
            self.import_declaration()
        } else if matches_kind!(self, Kind::Class) {
            self.class_declaration(diagnostics)
        } else if self.check(Kind::Fun) && self.check_next(Kind::Identifier) {
            self.advance();
            self.function("function", vec![], diagnostics)
        } else if matches_kind!(self, Kind::Var) {
            self.var_declaration(diagnostics)
        } else {
            self.statement(diagnostics)
        };

        match statement {
            Ok(stmt) => Some(stmt),
            Err(error) => {
                diagnostics.error(&error.token, &error.message);
                self.synchronize();
                None
            }
        }
    }

    /// Looks one token past the current one without consuming anything.
    /// Used to distinguish a named function declaration (`fun name(...)`)
    /// from a lambda expression (`fun (...)`) that happens to appear where
    /// a statement is expected.
    fn check_next(&self, kind: Kind) -> bool {
        let idx = self.current + 1;
        idx < self.tokens.len() && self.tokens[idx].kind == kind
    }

    fn import_declaration(&mut self) -> ParseResult<Stmt> {
        let keyword = self.previous().clone();
        let module = self.consume(Kind::Identifier, "Expect module name after 'import'.")?.clone();
        self.consume(Kind::Semicolon, "Expect ';' after import.")?;
        Ok(Stmt::Import(ImportData { keyword, module }))
    }

    fn class_declaration(&mut self, diagnostics: &mut Diagnostics) -> ParseResult<Stmt> {
        let name = self.consume(Kind::Identifier, "Expect class name.")?.clone();

        let superclass = if matches_kind!(self, Kind::Less) {
            self.consume(Kind::Identifier, "Expect superclass name.")?;
            Some(Expr::Variable(VariableData { id: next_expr_id(), name: self.previous().clone() }))
        } else {
            None
        };

        self.consume(Kind::LeftBrace, "Expect '{' before class body.")?;

        let mut methods: Vec<Stmt> = vec![];
        while !self.check(Kind::RightBrace) && !self.is_at_end() {
            let mut prefixes = vec![];
            while matches_kind!(self, Kind::Prefix) {
                prefixes.push(self.previous().clone());
            }
            methods.push(self.function("method", prefixes, diagnostics)?);
        }

        self.consume(Kind::RightBrace, "Expect '}' after class body.")?;

        Ok(Stmt::Class(ClassData { name, superclass, methods }))
    }

    fn var_declaration(&mut self, diagnostics: &mut Diagnostics) -> ParseResult<Stmt> {
        let name = self.consume(Kind::Identifier, "Expect variable name.")?.clone();

        let initializer = if matches_kind!(self, Kind::Equal) {
            Some(self.expression(diagnostics)?)
        } else {
            None
        };

        self.consume(Kind::Semicolon, "Expect ';' after variable declaration.")?;
        Ok(Stmt::Var(VarData { name, initializer }))
    }

    fn while_statement(&mut self, diagnostics: &mut Diagnostics) -> ParseResult<Stmt> {
        self.consume(Kind::LeftParen, "Expect '(' after 'while'.")?;
        let condition = self.expression(diagnostics)?;
        self.consume(Kind::RightParen, "Expect ')' after condition.")?;
        let body = self.statement(diagnostics)?;

        Ok(Stmt::While(WhileData { condition, body: Box::new(body) }))
    }

    fn expression(&mut self, diagnostics: &mut Diagnostics) -> ParseResult<Expr> {
        self.assignment(diagnostics)
    }

    fn statement(&mut self, diagnostics: &mut Diagnostics) -> ParseResult<Stmt> {
        if matches_kind!(self, Kind::For) {
            return self.for_statement(diagnostics);
        }
        if matches_kind!(self, Kind::If) {
            return self.if_statement(diagnostics);
        }
        if matches_kind!(self, Kind::Print) {
            return self.print_statement(diagnostics);
        }
        if matches_kind!(self, Kind::Return) {
            return self.return_statement(diagnostics);
        }
        if matches_kind!(self, Kind::While) {
            return self.while_statement(diagnostics);
        }
        if matches_kind!(self, Kind::LeftBrace) {
            return Ok(Stmt::Block(BlockData { statements: self.block(diagnostics)? }));
        }

        self.expression_statement(diagnostics)
    }

    fn for_statement(&mut self, diagnostics: &mut Diagnostics) -> ParseResult<Stmt> {
        self.consume(Kind::LeftParen, "Expect '(' after 'for'.")?;

        let initializer = if matches_kind!(self, Kind::Semicolon) {
            None
        } else if matches_kind!(self, Kind::Var) {
            Some(self.var_declaration(diagnostics)?)
        } else {
            Some(self.expression_statement(diagnostics)?)
        };

        let condition = if !self.check(Kind::Semicolon) { Some(self.expression(diagnostics)?) } else { None };
        self.consume(Kind::Semicolon, "Expect ';' after loop condition.")?;

        let increment = if !self.check(Kind::RightParen) { Some(self.expression(diagnostics)?) } else { None };
        self.consume(Kind::RightParen, "Expect ')' after loop clauses.")?;

        let mut body = self.statement(diagnostics)?;

        if let Some(increment) = increment {
            body = Stmt::Block(BlockData {
                statements: vec![body, Stmt::Expression(ExpressionData { expr: increment })],
            });
        }

        body = Stmt::While(WhileData {
            condition: condition.unwrap_or(Expr::Literal(Value::Bool(true))),
            body: Box::new(body),
        });

        if let Some(initializer) = initializer {
            body = Stmt::Block(BlockData { statements: vec![initializer, body] });
        }

        Ok(body)
    }

    fn if_statement(&mut self, diagnostics: &mut Diagnostics) -> ParseResult<Stmt> {
        self.consume(Kind::LeftParen, "Expect '(' after 'if'.")?;
        let condition = self.expression(diagnostics)?;
        self.consume(Kind::RightParen, "Expect ')' after if condition.")?;

        let then_branch = Box::new(self.statement(diagnostics)?);
        let else_branch = if matches_kind!(self, Kind::Else) {
            Some(Box::new(self.statement(diagnostics)?))
        } else {
            None
        };

        Ok(Stmt::If(IfData { condition, then_branch, else_branch }))
    }

    fn print_statement(&mut self, diagnostics: &mut Diagnostics) -> ParseResult<Stmt> {
        let expr = self.expression(diagnostics)?;
        self.consume(Kind::Semicolon, "Expect ';' after value.")?;
        Ok(Stmt::Print(PrintData { expr }))
    }

    fn return_statement(&mut self, diagnostics: &mut Diagnostics) -> ParseResult<Stmt> {
        let keyword = self.previous().clone();

        let value = if self.check(Kind::Semicolon) { None } else { Some(self.expression(diagnostics)?) };

        self.consume(Kind::Semicolon, "Expect ';' after return value.")?;
        Ok(Stmt::Return(ReturnData { keyword, value }))
    }

    fn expression_statement(&mut self, diagnostics: &mut Diagnostics) -> ParseResult<Stmt> {
        let expr = self.expression(diagnostics)?;
        self.consume(Kind::Semicolon, "Expect ';' after expression.")?;
        Ok(Stmt::Expression(ExpressionData { expr }))
    }

    fn function(&mut self, kind: &str, prefixes: Vec<Token>, diagnostics: &mut Diagnostics) -> ParseResult<Stmt> {
        let name = self.consume(Kind::Identifier, &format!("Expect {kind} name."))?.clone();
        let (params, body) = self.function_tail(kind, diagnostics)?;
        Ok(Stmt::Function(FunctionData { name, params, body, prefixes }))
    }

    /// Shared by named functions/methods and lambdas: `"(" Parameters? ")" Block`.
    fn function_tail(&mut self, kind: &str, diagnostics: &mut Diagnostics) -> ParseResult<(Vec<Token>, Vec<Stmt>)> {
        self.consume(Kind::LeftParen, &format!("Expect '(' after {kind} name."))?;

        let mut params = vec![];
        if !self.check(Kind::RightParen) {
            loop {
                if params.len() >= 255 {
                    return Err(ParseError {
                        token: self.peek().clone(),
                        message: "Cannot have more than 255 parameters.".to_string(),
                    });
                }

                params.push(self.consume(Kind::Identifier, "Expect parameter name.")?.clone());

                if !matches_kind!(self, Kind::Comma) {
                    break;
                }
            }
        }

        self.consume(Kind::RightParen, "Expect ')' after parameters.")?;
        self.consume(Kind::LeftBrace, &format!("Expect '{{' before {kind} body."))?;

        let body = self.block(diagnostics)?;
        Ok((params, body))
    }

    fn block(&mut self, diagnostics: &mut Diagnostics) -> ParseResult<Vec<Stmt>> {
        let mut statements = Vec::new();

        while !self.check(Kind::RightBrace) && !self.is_at_end() {
            if let Some(stmt) = self.declaration(diagnostics) {
                statements.push(stmt);
            }
        }

        self.consume(Kind::RightBrace, "Expect '}' after block.")?;

        Ok(statements)
    }

    fn assignment(&mut self, diagnostics: &mut Diagnostics) -> ParseResult<Expr> {
        let expr = self.or(diagnostics)?;

        if matches_kind!(self, Kind::Equal) {
            let equals = self.previous().clone();
            let value = self.assignment(diagnostics)?;

            return match expr {
                Expr::Variable(data) => Ok(Expr::Assign(AssignData {
                    id: next_expr_id(),
                    name: data.name,
                    value: Box::new(value),
                })),
                Expr::Get(data) => Ok(Expr::Set(SetData {
                    object: data.object,
                    name: data.name,
                    value: Box::new(value),
                })),
                _ => Err(ParseError { token: equals, message: "Invalid assignment target.".to_string() }),
            };
        }

        Ok(expr)
    }

    fn or(&mut self, diagnostics: &mut Diagnostics) -> ParseResult<Expr> {
        let mut expr = self.and(diagnostics)?;

        while matches_kind!(self, Kind::Or) {
            let operator = self.previous().clone();
            let right = self.and(diagnostics)?;
            expr = Expr::Logical(LogicalData { left: Box::new(expr), operator, right: Box::new(right) });
        }

        Ok(expr)
    }

    fn and(&mut self, diagnostics: &mut Diagnostics) -> ParseResult<Expr> {
        let mut expr = self.equality(diagnostics)?;

        while matches_kind!(self, Kind::And) {
            let operator = self.previous().clone();
            let right = self.equality(diagnostics)?;
            expr = Expr::Logical(LogicalData { left: Box::new(expr), operator, right: Box::new(right) });
        }

        Ok(expr)
    }

    fn equality(&mut self, diagnostics: &mut Diagnostics) -> ParseResult<Expr> {
        let mut expr = self.comparison(diagnostics)?;

        while matches_kind!(self, Kind::BangEqual, Kind::EqualEqual) {
            let operator = self.previous().clone();
            let right = self.comparison(diagnostics)?;
            expr = Expr::Binary(BinaryData { left: Box::new(expr), operator, right: Box::new(right) });
        }

        Ok(expr)
    }

    fn comparison(&mut self, diagnostics: &mut Diagnostics) -> ParseResult<Expr> {
        let mut expr = self.term(diagnostics)?;

        while matches_kind!(self, Kind::Greater, Kind::GreaterEqual, Kind::Less, Kind::LessEqual) {
            let operator = self.previous().clone();
            let right = self.term(diagnostics)?;
            expr = Expr::Binary(BinaryData { left: Box::new(expr), operator, right: Box::new(right) });
        }

        Ok(expr)
    }

    fn term(&mut self, diagnostics: &mut Diagnostics) -> ParseResult<Expr> {
        let mut expr = self.factor(diagnostics)?;

        while matches_kind!(self, Kind::Minus, Kind::Plus) {
            let operator = self.previous().clone();
            let right = self.factor(diagnostics)?;
            expr = Expr::Binary(BinaryData { left: Box::new(expr), operator, right: Box::new(right) });
        }

        Ok(expr)
    }

    fn factor(&mut self, diagnostics: &mut Diagnostics) -> ParseResult<Expr> {
        let mut expr = self.unary(diagnostics)?;

        while matches_kind!(self, Kind::Slash, Kind::Star) {
            let operator = self.previous().clone();
            let right = self.unary(diagnostics)?;
            expr = Expr::Binary(BinaryData { left: Box::new(expr), operator, right: Box::new(right) });
        }

        Ok(expr)
    }

    fn unary(&mut self, diagnostics: &mut Diagnostics) -> ParseResult<Expr> {
        if matches_kind!(self, Kind::Bang, Kind::Minus) {
            let operator = self.previous().clone();
            let right = self.unary(diagnostics)?;
            return Ok(Expr::Unary(UnaryData { operator, expr: Box::new(right) }));
        }

        self.call(diagnostics)
    }

    fn finish_call(&mut self, callee: Expr, diagnostics: &mut Diagnostics) -> ParseResult<Expr> {
        let mut arguments = vec![];

        if !self.check(Kind::RightParen) {
            loop {
                if arguments.len() >= 255 {
                    return Err(ParseError {
                        token: self.peek().clone(),
                        message: "Cannot have more than 255 arguments.".to_string(),
                    });
                }

                arguments.push(self.expression(diagnostics)?);

                if !matches_kind!(self, Kind::Comma) {
                    break;
                }
            }
        }

        let paren = self.consume(Kind::RightParen, "Expect ')' after arguments.")?.clone();

        Ok(Expr::Call(CallData { callee: Box::new(callee), paren, arguments }))
    }

    fn call(&mut self, diagnostics: &mut Diagnostics) -> ParseResult<Expr> {
        let mut expr = self.primary(diagnostics)?;

        loop {
            if matches_kind!(self, Kind::LeftParen) {
                expr = self.finish_call(expr, diagnostics)?;
            } else if matches_kind!(self, Kind::Dot) {
                let name = self.consume(Kind::Identifier, "Expect property name after '.'.")?.clone();
                expr = Expr::Get(GetData { object: Box::new(expr), name });
            } else {
                break;
            }
        }

        Ok(expr)
    }

    fn primary(&mut self, diagnostics: &mut Diagnostics) -> ParseResult<Expr> {
        if matches_kind!(self, Kind::False) {
            return Ok(Expr::Literal(Value::Bool(false)));
        }
        if matches_kind!(self, Kind::True) {
            return Ok(Expr::Literal(Value::Bool(true)));
        }
        if matches_kind!(self, Kind::Nil) {
            return Ok(Expr::Literal(Value::Nil));
        }

        if matches_kind!(self, Kind::Number, Kind::String) {
            let literal = self.previous().literal.clone()
                .expect("number/string tokens always carry a literal");
            return Ok(Expr::Literal(match literal {
                TokenLiteral::Number(n) => Value::Number(n),
                TokenLiteral::String(s) => Value::String(s),
            }));
        }

        if matches_kind!(self, Kind::Super) {
            let keyword = self.previous().clone();
            self.consume(Kind::Dot, "Expect '.' after 'super'.")?;
            let method = self.consume(Kind::Identifier, "Expect superclass method name.")?.clone();
            return Ok(Expr::Super(SuperData { id: next_expr_id(), keyword, method }));
        }

        if matches_kind!(self, Kind::This) {
            return Ok(Expr::This(ThisData { id: next_expr_id(), keyword: self.previous().clone() }));
        }

        if matches_kind!(self, Kind::Fun) {
            let keyword = self.previous().clone();
            let (params, body) = self.function_tail("lambda", diagnostics)?;
            return Ok(Expr::Lambda(LambdaData { keyword, params, body }));
        }

        if matches_kind!(self, Kind::Identifier) {
            return Ok(Expr::Variable(VariableData { id: next_expr_id(), name: self.previous().clone() }));
        }

        if matches_kind!(self, Kind::LeftParen) {
            let expr = self.expression(diagnostics)?;
            self.consume(Kind::RightParen, "Expect ')' after expression.")?;
            return Ok(Expr::Grouping(GroupingData { expr: Box::new(expr) }));
        }

        Err(ParseError { token: self.peek().clone(), message: "Expect expression.".to_string() })
    }

    fn synchronize(&mut self) {
        self.advance();

        while !self.is_at_end() {
            if self.previous().kind == Kind::Semicolon {
                return;
            }

            match self.peek().kind {
                Kind::Class | Kind::Fun | Kind::Var | Kind::For | Kind::If | Kind::While
                | Kind::Print | Kind::Return | Kind::Import => return,
                _ => {
                    self.advance();
                }
            };
        }
    }
}
