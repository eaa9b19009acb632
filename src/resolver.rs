use std::collections::{HashMap, HashSet};
use std::fs;
use std::mem;
use std::path::PathBuf;

use crate::error::Diagnostics;
use crate::expr::*;
use crate::interpreter::Interpreter;
use crate::parser::Parser;
use crate::scanner::Scanner;
use crate::stmt::*;
use crate::token::Token;

#[derive(Clone, Copy, PartialEq)]
enum FunctionType {
    None,
    Function,
    Initializer,
    Method,
}

#[derive(Clone, Copy, PartialEq)]
enum ClassType {
    None,
    Class,
    Subclass,
}

/// Static pass over the AST: records scope distances on the interpreter's
/// resolution table, enforces the language's static rules, and — since
/// imports have no runtime representation of their own — loads and splices
/// imported modules into the statement queue the evaluator will execute.
pub struct Resolver<'a, 'd> {
    interpreter: &'a mut Interpreter,
    diagnostics: &'d mut Diagnostics,
    scopes: Vec<HashMap<String, bool>>,
    current_function: FunctionType,
    current_class: ClassType,
    search_dirs: Vec<PathBuf>,
    imported: HashSet<String>,
    current_module_path: Option<PathBuf>,
}

impl<'a, 'd> Resolver<'a, 'd> {
    pub fn new(
        interpreter: &'a mut Interpreter,
        diagnostics: &'d mut Diagnostics,
        search_dirs: Vec<PathBuf>,
        root_module_path: Option<PathBuf>,
    ) -> Self {
        Resolver {
            interpreter,
            diagnostics,
            scopes: vec![],
            current_function: FunctionType::None,
            current_class: ClassType::None,
            search_dirs,
            imported: HashSet::new(),
            current_module_path: root_module_path,
        }
    }

    fn resolve_expr(&mut self, expr: &Expr) {
        expr.accept(self);
    }

    fn resolve_stmt(&mut self, stmt: &Stmt) {
        stmt.accept(self);
    }

    fn resolve(&mut self, statements: &[Stmt]) {
        for statement in statements {
            self.resolve_stmt(statement);
        }
    }

    /// Resolves a module's top-level statements, splicing any imports into
    /// the returned queue in source order. Nested imports (inside a block,
    /// function, or class body) never reach this method — they're resolved
    /// through the ordinary `resolve_stmt` path, where `visit_import_stmt`
    /// rejects them.
    pub fn resolve_program(&mut self, statements: Vec<Stmt>) -> Vec<Stmt> {
        let mut queue = Vec::with_capacity(statements.len());

        for statement in statements {
            if let Stmt::Import(data) = &statement {
                self.load_import(data, &mut queue);
                queue.push(statement);
            } else {
                self.resolve_stmt(&statement);
                queue.push(statement);
            }
        }

        queue
    }

    fn locate_module(&self, module_name: &str) -> Option<PathBuf> {
        for dir in &self.search_dirs {
            let candidate = dir.join(format!("{module_name}.lox"));
            if candidate.is_file() {
                return Some(candidate);
            }
        }
        None
    }

    fn load_import(&mut self, data: &ImportData, queue: &mut Vec<Stmt>) {
        let module_name = data.module.lexeme.clone();

        if self.imported.contains(&module_name) {
            self.diagnostics.error(&data.keyword, &format!("Module '{module_name}' was already imported."));
            return;
        }

        let path = match self.locate_module(&module_name) {
            Some(path) => path,
            None => {
                self.diagnostics.error(&data.keyword, &format!("Cannot find module '{module_name}'."));
                return;
            }
        };

        let canonical = path.canonicalize().unwrap_or_else(|_| path.clone());
        if self.current_module_path.as_ref() == Some(&canonical) {
            self.diagnostics.error(&data.keyword, &format!("Module '{module_name}' cannot import itself."));
            return;
        }

        let source = match fs::read_to_string(&path) {
            Ok(source) => source,
            Err(_) => {
                self.diagnostics.error(&data.keyword, &format!("Cannot read module '{module_name}'."));
                return;
            }
        };

        self.imported.insert(module_name);

        let mut scanner = Scanner::new(&source);
        let tokens = scanner.scan_tokens(self.diagnostics);
        let mut parser = Parser::new(tokens);
        let module_statements = parser.parse(self.diagnostics);

        let previous_module = mem::replace(&mut self.current_module_path, Some(canonical));
        let resolved = self.resolve_program(module_statements);
        self.current_module_path = previous_module;

        queue.extend(resolved);
    }

    /// Shared by named function declarations, methods, and lambdas.
    fn resolve_function_body(&mut self, params: &[Token], body: &[Stmt], kind: FunctionType) {
        let enclosing_function = mem::replace(&mut self.current_function, kind);

        self.begin_scope();
        for param in params {
            self.declare(param);
            self.define(param);
        }
        self.resolve(body);
        self.end_scope();

        self.current_function = enclosing_function;
    }

    fn begin_scope(&mut self) {
        self.scopes.push(HashMap::new());
    }

    fn end_scope(&mut self) {
        self.scopes.pop();
    }

    fn declare(&mut self, name: &Token) {
        if self.scopes.is_empty() {
            return;
        }

        let scope = self.scopes.last_mut().expect("stack to be not empty");
        if scope.contains_key(&name.lexeme) {
            self.diagnostics.error(
                name,
                &format!("A variable is already defined with name '{}' in this scope.", name.lexeme),
            );
        }
        scope.insert(name.lexeme.to_owned(), false);
    }

    fn define(&mut self, name: &Token) {
        if self.scopes.is_empty() {
            return;
        }

        self.scopes.last_mut().expect("stack to be not empty").insert(name.lexeme.to_owned(), true);
    }

    fn resolve_local(&mut self, id: ExprId, name: &Token) {
        for (i, scope) in self.scopes.iter().rev().enumerate() {
            if scope.contains_key(&name.lexeme) {
                self.interpreter.resolve(id, i);
                return;
            }
        }
    }
}

impl<'a, 'd> ExprVisitor<()> for Resolver<'a, 'd> {
    fn visit_literal_expr(&mut self, _value: &crate::value::Value) {}

    fn visit_variable_expr(&mut self, data: &VariableData) {
        if let Some(scope) = self.scopes.last() {
            if let Some(false) = scope.get(&data.name.lexeme) {
                self.diagnostics.error(&data.name, "Can't read local variable in its own initializer.");
            }
        }

        self.resolve_local(data.id, &data.name);
    }

    fn visit_assign_expr(&mut self, data: &AssignData) {
        self.resolve_expr(&data.value);
        self.resolve_local(data.id, &data.name);
    }

    fn visit_logical_expr(&mut self, data: &LogicalData) {
        self.resolve_expr(&data.left);
        self.resolve_expr(&data.right);
    }

    fn visit_unary_expr(&mut self, data: &UnaryData) {
        self.resolve_expr(&data.expr);
    }

    fn visit_binary_expr(&mut self, data: &BinaryData) {
        self.resolve_expr(&data.left);
        self.resolve_expr(&data.right);
    }

    fn visit_grouping_expr(&mut self, data: &GroupingData) {
        self.resolve_expr(&data.expr);
    }

    fn visit_call_expr(&mut self, data: &CallData) {
        self.resolve_expr(&data.callee);
        for argument in &data.arguments {
            self.resolve_expr(argument);
        }
    }

    fn visit_lambda_expr(&mut self, data: &LambdaData) {
        self.resolve_function_body(&data.params, &data.body, FunctionType::Function);
    }

    fn visit_get_expr(&mut self, data: &GetData) {
        self.resolve_expr(&data.object);
    }

    fn visit_set_expr(&mut self, data: &SetData) {
        self.resolve_expr(&data.value);
        self.resolve_expr(&data.object);
    }

    fn visit_this_expr(&mut self, data: &ThisData) {
        if self.current_class == ClassType::None {
            self.diagnostics.error(&data.keyword, "Cannot use 'this' outside of a class.");
            return;
        }

        self.resolve_local(data.id, &data.keyword);
    }

    fn visit_super_expr(&mut self, data: &SuperData) {
        match self.current_class {
            ClassType::Subclass => {}
            ClassType::None => self.diagnostics.error(&data.keyword, "Cannot use 'super' outside of a class."),
            ClassType::Class => {
                self.diagnostics.error(&data.keyword, "Cannot use 'super' in a class with no superclass.")
            }
        }

        self.resolve_local(data.id, &data.keyword);
    }
}

impl<'a, 'd> StmtVisitor<()> for Resolver<'a, 'd> {
    fn visit_block_stmt(&mut self, data: &BlockData) {
        self.begin_scope();
        self.resolve(&data.statements);
        self.end_scope();
    }

    fn visit_var_stmt(&mut self, data: &VarData) {
        self.declare(&data.name);
        if let Some(initializer) = &data.initializer {
            self.resolve_expr(initializer);
        }
        self.define(&data.name);
    }

    fn visit_function_stmt(&mut self, data: &FunctionData) {
        self.declare(&data.name);
        self.define(&data.name);

        self.resolve_function_body(&data.params, &data.body, FunctionType::Function);
    }

    fn visit_expression_stmt(&mut self, data: &ExpressionData) {
        self.resolve_expr(&data.expr);
    }

    fn visit_if_stmt(&mut self, data: &IfData) {
        self.resolve_expr(&data.condition);
        self.resolve_stmt(&data.then_branch);
        if let Some(else_branch) = &data.else_branch {
            self.resolve_stmt(else_branch);
        }
    }

    fn visit_print_stmt(&mut self, data: &PrintData) {
        self.resolve_expr(&data.expr);
    }

    fn visit_return_stmt(&mut self, data: &ReturnData) {
        if self.current_function == FunctionType::None {
            self.diagnostics.error(&data.keyword, "Cannot return from top-level code.");
        }

        if let Some(value) = &data.value {
            if self.current_function == FunctionType::Initializer {
                self.diagnostics.error(&data.keyword, "Cannot return a value from an initializer.");
                return;
            }

            self.resolve_expr(value);
        }
    }

    fn visit_while_stmt(&mut self, data: &WhileData) {
        self.resolve_expr(&data.condition);
        self.resolve_stmt(&data.body);
    }

    fn visit_class_stmt(&mut self, data: &ClassData) {
        let enclosing_class = mem::replace(&mut self.current_class, ClassType::Class);

        self.declare(&data.name);
        self.define(&data.name);

        if let Some(superclass) = &data.superclass {
            if let Expr::Variable(variable) = superclass {
                if data.name.lexeme == variable.name.lexeme {
                    self.diagnostics.error(&variable.name, "A class cannot inherit from itself.");
                }
            }

            self.current_class = ClassType::Subclass;
            self.resolve_expr(superclass);

            self.begin_scope();
            self.scopes.last_mut().expect("stack to be not empty").insert("super".to_string(), true);
        }

        self.begin_scope();
        self.scopes.last_mut().expect("stack to be not empty").insert("this".to_string(), true);

        for method in &data.methods {
            let Stmt::Function(function) = method else {
                self.diagnostics.debug_error("class body contained a non-function member");
                continue;
            };

            let kind = if function.name.lexeme == "init" && function.prefixes.is_empty() {
                FunctionType::Initializer
            } else {
                FunctionType::Method
            };
            self.resolve_function_body(&function.params, &function.body, kind);
        }

        self.end_scope();

        if data.superclass.is_some() {
            self.end_scope();
        }

        self.current_class = enclosing_class;
    }

    fn visit_import_stmt(&mut self, data: &ImportData) {
        self.diagnostics.error(&data.keyword, "Imports are only allowed at the top level of a module.");
    }
}
