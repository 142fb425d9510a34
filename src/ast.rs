//! Closed syntax tree for the supported Python subset.
//!
//! Produced by [`crate::parser`] from a tree-sitter concrete tree and consumed
//! read-only by [`crate::generate`]. Every kind the generator can lower has a
//! variant here; anything else is rejected while lowering the concrete tree.

use serde::Serialize;
use std::collections::HashSet;

/// Position in source code
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct Position {
    /// Byte offset in source
    pub byte: usize,
    /// Line number (0-indexed)
    pub line: usize,
    /// Column number (0-indexed, in characters)
    pub col: usize,
}

/// Span in source code (a range from start position to end position)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct Span {
    pub start: Position,
    pub end: Position,
}

/// A parsed source file
#[derive(Debug, Clone)]
pub struct Module {
    pub body: Vec<Stmt>,
}

impl Module {
    pub fn new(body: Vec<Stmt>) -> Self {
        Self { body }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Stmt {
    pub kind: StmtKind,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub enum StmtKind {
    FunctionDef(FunctionDef),
    Return(Option<Expr>),
    /// `a = b = value`; `value` is `None` for a bare annotation (`x: int`)
    Assign {
        targets: Vec<Expr>,
        value: Option<Expr>,
    },
    AugAssign {
        target: Expr,
        op: BinOp,
        value: Expr,
    },
    If(IfStmt),
    While(WhileStmt),
    For(ForStmt),
    With(WithStmt),
    Try(TryStmt),
    Raise(Option<Expr>),
    Import(Vec<Alias>),
    ImportFrom {
        module: String,
        names: Vec<Alias>,
    },
    Expr(Expr),
    Break,
    Continue,
    Pass,
}

impl StmtKind {
    /// Kind name used in logs and diagnostics
    pub fn name(&self) -> &'static str {
        match self {
            StmtKind::FunctionDef(def) if def.is_async => "AsyncFunctionDef",
            StmtKind::FunctionDef(_) => "FunctionDef",
            StmtKind::Return(_) => "Return",
            StmtKind::Assign { .. } => "Assign",
            StmtKind::AugAssign { .. } => "AugAssign",
            StmtKind::If(_) => "If",
            StmtKind::While(_) => "While",
            StmtKind::For(f) if f.is_async => "AsyncFor",
            StmtKind::For(_) => "For",
            StmtKind::With(w) if w.is_async => "AsyncWith",
            StmtKind::With(_) => "With",
            StmtKind::Try(_) => "Try",
            StmtKind::Raise(_) => "Raise",
            StmtKind::Import(_) => "Import",
            StmtKind::ImportFrom { .. } => "ImportFrom",
            StmtKind::Expr(_) => "Expr",
            StmtKind::Break => "Break",
            StmtKind::Continue => "Continue",
            StmtKind::Pass => "Pass",
        }
    }
}

impl Stmt {
    /// Add every identifier this statement reads or binds to `names`
    pub fn collect_names<'a>(&'a self, names: &mut HashSet<&'a str>) {
        let body = |stmts: &'a [Stmt], names: &mut HashSet<&'a str>| {
            for stmt in stmts {
                stmt.collect_names(names);
            }
        };

        match &self.kind {
            StmtKind::FunctionDef(def) => {
                names.insert(&def.name);
                for param in &def.params {
                    names.insert(&param.name);
                    if let Some(default) = &param.default {
                        default.collect_names(names);
                    }
                }
                body(&def.body, names);
            }
            StmtKind::Return(value) | StmtKind::Raise(value) => {
                if let Some(value) = value {
                    value.collect_names(names);
                }
            }
            StmtKind::Assign { targets, value } => {
                targets.iter().chain(value).for_each(|e| e.collect_names(names));
            }
            StmtKind::AugAssign { target, value, .. } => {
                target.collect_names(names);
                value.collect_names(names);
            }
            StmtKind::If(IfStmt { test, body: then, orelse })
            | StmtKind::While(WhileStmt { test, body: then, orelse }) => {
                test.collect_names(names);
                body(then, names);
                body(orelse, names);
            }
            StmtKind::For(stmt) => {
                stmt.target.collect_names(names);
                stmt.iter.collect_names(names);
                body(&stmt.body, names);
            }
            StmtKind::With(stmt) => {
                for item in &stmt.items {
                    item.context.collect_names(names);
                    if let Some(alias) = &item.alias {
                        alias.collect_names(names);
                    }
                }
                body(&stmt.body, names);
            }
            StmtKind::Try(stmt) => {
                body(&stmt.body, names);
                for handler in &stmt.handlers {
                    if let Some(kind) = &handler.kind {
                        kind.collect_names(names);
                    }
                    if let Some(name) = &handler.name {
                        names.insert(name);
                    }
                    body(&handler.body, names);
                }
                body(&stmt.finalbody, names);
            }
            StmtKind::Import(aliases) | StmtKind::ImportFrom { names: aliases, .. } => {
                for alias in aliases {
                    names.insert(alias.asname.as_deref().unwrap_or(&alias.name));
                }
            }
            StmtKind::Expr(expr) => expr.collect_names(names),
            StmtKind::Break | StmtKind::Continue | StmtKind::Pass => {}
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct FunctionDef {
    pub name: String,
    pub params: Vec<Param>,
    pub body: Vec<Stmt>,
    pub is_async: bool,
}

/// Function parameter: `a`, `a=1` or `*rest`
#[derive(Debug, Clone, PartialEq)]
pub struct Param {
    pub name: String,
    pub default: Option<Expr>,
    pub rest: bool,
}

/// If/else. An `elif` chain is a nested `If` as the only `orelse` statement.
#[derive(Debug, Clone, PartialEq)]
pub struct IfStmt {
    pub test: Expr,
    pub body: Vec<Stmt>,
    pub orelse: Vec<Stmt>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct WhileStmt {
    pub test: Expr,
    pub body: Vec<Stmt>,
    pub orelse: Vec<Stmt>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ForStmt {
    pub target: Expr,
    pub iter: Expr,
    pub body: Vec<Stmt>,
    pub is_async: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct WithStmt {
    pub items: Vec<WithItem>,
    pub body: Vec<Stmt>,
    pub is_async: bool,
}

/// `context as alias`
#[derive(Debug, Clone, PartialEq)]
pub struct WithItem {
    pub context: Expr,
    pub alias: Option<Expr>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TryStmt {
    pub body: Vec<Stmt>,
    pub handlers: Vec<ExceptHandler>,
    pub finalbody: Vec<Stmt>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ExceptHandler {
    /// Exception type; `None` for a bare `except:`
    pub kind: Option<Expr>,
    /// Bound name from `except E as name`
    pub name: Option<String>,
    pub body: Vec<Stmt>,
    pub span: Span,
}

/// Imported name with optional `as` alias
#[derive(Debug, Clone, PartialEq)]
pub struct Alias {
    pub name: String,
    pub asname: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Expr {
    pub kind: ExprKind,
    pub span: Span,
}

impl Expr {
    pub fn new(kind: ExprKind, span: Span) -> Self {
        Self { kind, span }
    }

    pub fn name(id: impl Into<String>, span: Span) -> Self {
        Self::new(ExprKind::Name(id.into()), span)
    }

    /// Identifier text if this is a plain name
    pub fn as_name(&self) -> Option<&str> {
        match &self.kind {
            ExprKind::Name(id) => Some(id),
            _ => None,
        }
    }

    /// Add every identifier in this expression to `names`
    pub fn collect_names<'a>(&'a self, names: &mut HashSet<&'a str>) {
        let all = |exprs: &'a [Expr], names: &mut HashSet<&'a str>| {
            for expr in exprs {
                expr.collect_names(names);
            }
        };

        match &self.kind {
            ExprKind::Name(id) => {
                names.insert(id);
            }
            ExprKind::Int(_) | ExprKind::Float(_) | ExprKind::Str { .. } | ExprKind::Bool(_) | ExprKind::None => {}
            ExprKind::FString(parts) => {
                for part in parts {
                    if let FStringPart::Interpolation { expr, .. } = part {
                        expr.collect_names(names);
                    }
                }
            }
            ExprKind::BinOp { left, right, .. } => {
                left.collect_names(names);
                right.collect_names(names);
            }
            ExprKind::UnaryOp { operand: value, .. }
            | ExprKind::Attribute { value, .. }
            | ExprKind::Starred(value)
            | ExprKind::Await(value) => value.collect_names(names),
            ExprKind::BoolOp { values, .. } | ExprKind::List(values) | ExprKind::Tuple(values) => all(values, names),
            ExprKind::Compare { left, comparators, .. } => {
                left.collect_names(names);
                all(comparators, names);
            }
            ExprKind::Call { func, args } => {
                func.collect_names(names);
                all(args, names);
            }
            ExprKind::Subscript { value, index } => {
                value.collect_names(names);
                index.collect_names(names);
            }
            ExprKind::Dict(entries) => {
                for (key, value) in entries {
                    key.collect_names(names);
                    value.collect_names(names);
                }
            }
            ExprKind::IfExp { test, body, orelse } => {
                test.collect_names(names);
                body.collect_names(names);
                orelse.collect_names(names);
            }
            ExprKind::ListComp(comp) | ExprKind::GeneratorExp(comp) => {
                comp.element.collect_names(names);
                for clause in &comp.clauses {
                    match clause {
                        Clause::For { target, iter } => {
                            target.collect_names(names);
                            iter.collect_names(names);
                        }
                        Clause::If(condition) => condition.collect_names(names),
                    }
                }
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ExprKind {
    Name(String),
    /// Integer literal, already in decimal
    Int(String),
    Float(String),
    /// String literal body as written between the quotes
    Str { body: String, raw: bool },
    FString(Vec<FStringPart>),
    Bool(bool),
    None,
    BinOp {
        left: Box<Expr>,
        op: BinOp,
        right: Box<Expr>,
    },
    UnaryOp {
        op: UnaryOp,
        operand: Box<Expr>,
    },
    BoolOp {
        op: BoolOp,
        values: Vec<Expr>,
    },
    Compare {
        left: Box<Expr>,
        ops: Vec<CmpOp>,
        comparators: Vec<Expr>,
    },
    Call {
        func: Box<Expr>,
        args: Vec<Expr>,
    },
    Attribute {
        value: Box<Expr>,
        attr: String,
    },
    Subscript {
        value: Box<Expr>,
        index: Box<Expr>,
    },
    List(Vec<Expr>),
    Tuple(Vec<Expr>),
    Dict(Vec<(Expr, Expr)>),
    Starred(Box<Expr>),
    Await(Box<Expr>),
    IfExp {
        test: Box<Expr>,
        body: Box<Expr>,
        orelse: Box<Expr>,
    },
    ListComp(Comprehension),
    GeneratorExp(Comprehension),
}

impl ExprKind {
    /// Kind name used in diagnostics
    pub fn name(&self) -> &'static str {
        match self {
            ExprKind::Name(_) => "Name",
            ExprKind::Int(_) | ExprKind::Float(_) => "Num",
            ExprKind::Str { .. } => "Str",
            ExprKind::FString(_) => "JoinedStr",
            ExprKind::Bool(_) | ExprKind::None => "NameConstant",
            ExprKind::BinOp { .. } => "BinOp",
            ExprKind::UnaryOp { .. } => "UnaryOp",
            ExprKind::BoolOp { .. } => "BoolOp",
            ExprKind::Compare { .. } => "Compare",
            ExprKind::Call { .. } => "Call",
            ExprKind::Attribute { .. } => "Attribute",
            ExprKind::Subscript { .. } => "Subscript",
            ExprKind::List(_) => "List",
            ExprKind::Tuple(_) => "Tuple",
            ExprKind::Dict(_) => "Dict",
            ExprKind::Starred(_) => "Starred",
            ExprKind::Await(_) => "Await",
            ExprKind::IfExp { .. } => "IfExp",
            ExprKind::ListComp(_) => "ListComp",
            ExprKind::GeneratorExp(_) => "GeneratorExp",
        }
    }
}

/// Piece of an f-string
#[derive(Debug, Clone, PartialEq)]
pub enum FStringPart {
    /// Literal text as written, with `{{`/`}}` already collapsed. Backslashes
    /// of a raw f-string are doubled.
    Literal(String),
    Interpolation {
        expr: Box<Expr>,
        /// `!r`, `!s`, `!a` as written
        conversion: Option<String>,
        /// `:>10` as written, including the colon
        format_spec: Option<String>,
    },
}

/// Comprehension body: `element for ... in ... if ...`
#[derive(Debug, Clone, PartialEq)]
pub struct Comprehension {
    pub element: Box<Expr>,
    /// Clauses in source order; the first one is always `Clause::For`
    pub clauses: Vec<Clause>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Clause {
    For { target: Expr, iter: Expr },
    If(Expr),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinOp {
    Add,
    Sub,
    Mult,
    Div,
    FloorDiv,
    Mod,
    Pow,
    BitAnd,
    BitOr,
    BitXor,
    LShift,
    RShift,
}

impl BinOp {
    /// Map a Python operator token (`+`, `//`, ...) to its operator
    pub fn from_python(token: &str) -> Option<Self> {
        Some(match token {
            "+" => BinOp::Add,
            "-" => BinOp::Sub,
            "*" => BinOp::Mult,
            "/" => BinOp::Div,
            "//" => BinOp::FloorDiv,
            "%" => BinOp::Mod,
            "**" => BinOp::Pow,
            "&" => BinOp::BitAnd,
            "|" => BinOp::BitOr,
            "^" => BinOp::BitXor,
            "<<" => BinOp::LShift,
            ">>" => BinOp::RShift,
            _ => return None,
        })
    }

    /// Map an augmented assignment token (`+=`, `//=`, ...) to its operator
    pub fn from_augmented(token: &str) -> Option<Self> {
        token.strip_suffix('=').and_then(Self::from_python)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOp {
    Not,
    USub,
    UAdd,
    Invert,
}

impl UnaryOp {
    pub fn from_python(token: &str) -> Option<Self> {
        Some(match token {
            "not" => UnaryOp::Not,
            "-" => UnaryOp::USub,
            "+" => UnaryOp::UAdd,
            "~" => UnaryOp::Invert,
            _ => return None,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BoolOp {
    And,
    Or,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CmpOp {
    Eq,
    NotEq,
    Lt,
    LtE,
    Gt,
    GtE,
    Is,
    IsNot,
    In,
    NotIn,
}

impl CmpOp {
    /// Map a comparison token to its operator; multi-word tokens must be
    /// normalized to single spaces (`not in`, `is not`)
    pub fn from_python(token: &str) -> Option<Self> {
        Some(match token {
            "==" => CmpOp::Eq,
            "!=" | "<>" => CmpOp::NotEq,
            "<" => CmpOp::Lt,
            "<=" => CmpOp::LtE,
            ">" => CmpOp::Gt,
            ">=" => CmpOp::GtE,
            "is" => CmpOp::Is,
            "is not" => CmpOp::IsNot,
            "in" => CmpOp::In,
            "not in" => CmpOp::NotIn,
            _ => return None,
        })
    }
}
