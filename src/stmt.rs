use crate::expr::Expr;
use crate::token::Token;

#[derive(Debug, Clone)]
pub struct ExpressionData {
    pub expr: Expr,
}

#[derive(Debug, Clone)]
pub struct PrintData {
    pub expr: Expr,
}

#[derive(Debug, Clone)]
pub struct VarData {
    pub name: Token,
    pub initializer: Option<Expr>,
}

#[derive(Debug, Clone)]
pub struct BlockData {
    pub statements: Vec<Stmt>,
}

#[derive(Debug, Clone)]
pub struct IfData {
    pub condition: Expr,
    pub then_branch: Box<Stmt>,
    pub else_branch: Option<Box<Stmt>>,
}

#[derive(Debug, Clone)]
pub struct WhileData {
    pub condition: Expr,
    pub body: Box<Stmt>,
}

/// `prefixes` holds the function's modifier tokens (currently only
/// `static`, legal solely inside a class body).
#[derive(Debug, Clone)]
pub struct FunctionData {
    pub name: Token,
    pub params: Vec<Token>,
    pub body: Vec<Stmt>,
    pub prefixes: Vec<Token>,
}

#[derive(Debug, Clone)]
pub struct ReturnData {
    pub keyword: Token,
    pub value: Option<Expr>,
}

#[derive(Debug, Clone)]
pub struct ClassData {
    pub name: Token,
    pub superclass: Option<Expr>,
    pub methods: Vec<Stmt>,
}

#[derive(Debug, Clone)]
pub struct ImportData {
    pub keyword: Token,
    pub module: Token,
}

#[derive(Debug, Clone)]
pub enum Stmt {
    Expression(ExpressionData),
    Print(PrintData),
    Var(VarData),
    Block(BlockData),
    If(IfData),
    While(WhileData),
    Function(FunctionData),
    Return(ReturnData),
    Class(ClassData),
    Import(ImportData),
}

impl Stmt {
    pub fn accept<T>(&self, visitor: &mut dyn StmtVisitor<T>) -> T {
        match self {
            Stmt::Expression(data) => visitor.visit_expression_stmt(data),
            Stmt::Print(data) => visitor.visit_print_stmt(data),
            Stmt::Var(data) => visitor.visit_var_stmt(data),
            Stmt::Block(data) => visitor.visit_block_stmt(data),
            Stmt::If(data) => visitor.visit_if_stmt(data),
            Stmt::While(data) => visitor.visit_while_stmt(data),
            Stmt::Function(data) => visitor.visit_function_stmt(data),
            Stmt::Return(data) => visitor.visit_return_stmt(data),
            Stmt::Class(data) => visitor.visit_class_stmt(data),
            Stmt::Import(data) => visitor.visit_import_stmt(data),
        }
    }
}

pub trait StmtVisitor<T> {
    fn visit_expression_stmt(&mut self, data: &ExpressionData) -> T;
    fn visit_print_stmt(&mut self, data: &PrintData) -> T;
    fn visit_var_stmt(&mut self, data: &VarData) -> T;
    fn visit_block_stmt(&mut self, data: &BlockData) -> T;
    fn visit_if_stmt(&mut self, data: &IfData) -> T;
    fn visit_while_stmt(&mut self, data: &WhileData) -> T;
    fn visit_function_stmt(&mut self, data: &FunctionData) -> T;
    fn visit_return_stmt(&mut self, data: &ReturnData) -> T;
    fn visit_class_stmt(&mut self, data: &ClassData) -> T;
    fn visit_import_stmt(&mut self, data: &ImportData) -> T;
}
