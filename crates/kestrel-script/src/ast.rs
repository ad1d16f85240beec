//! Abstract syntax tree for script modules.

use crate::lexer::Span;

/// A parsed module
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Module {
    pub statements: Vec<Statement>,
}

impl Module {
    /// Import declarations, in source order
    pub fn imports(&self) -> impl Iterator<Item = &ImportDecl> {
        self.statements.iter().filter_map(|stmt| match stmt {
            Statement::Import(decl) => Some(decl),
            _ => None,
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Statement {
    /// `import { a, b as c } from "./dep";` or `import "./dep";`
    Import(ImportDecl),
    /// `let x = expr;` / `export let x = expr;`
    Let {
        name: String,
        init: Expression,
        exported: bool,
        span: Span,
    },
    /// `export { a, b as c };`
    ExportList(Vec<ExportSpecifier>),
    /// `x = expr;`
    Assign {
        name: String,
        value: Expression,
        span: Span,
    },
    /// `expr;`
    Expression(Expression),
}

#[derive(Debug, Clone, PartialEq)]
pub struct ImportDecl {
    pub specifier: String,
    pub bindings: Vec<ImportBinding>,
    pub span: Span,
}

/// `imported as local`
#[derive(Debug, Clone, PartialEq)]
pub struct ImportBinding {
    pub imported: String,
    pub local: String,
    pub span: Span,
}

/// `local as exported`
#[derive(Debug, Clone, PartialEq)]
pub struct ExportSpecifier {
    pub local: String,
    pub exported: String,
    pub span: Span,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    Add,
    Subtract,
    Multiply,
    Divide,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Expression {
    Number(f64),
    String(String),
    Bool(bool),
    Null,
    Identifier { name: String, span: Span },
    Negate(Box<Expression>),
    Binary {
        op: BinaryOp,
        left: Box<Expression>,
        right: Box<Expression>,
    },
    Call {
        callee: Box<Expression>,
        args: Vec<Expression>,
        span: Span,
    },
}
