//! Lowers a tree-sitter-python concrete tree into the closed [`crate::ast`] types.
//!
//! Every node kind outside the supported subset is rejected here with an
//! UnsupportedConstruct error naming the tree-sitter kind, so generation never
//! starts on a tree it cannot finish.

use super::positions::span_of;
use crate::ast::*;
use crate::error::TranslateError;
use tree_sitter::Node;

type Result<T> = std::result::Result<T, TranslateError>;

/// All children, including anonymous tokens
fn children<'t>(node: Node<'t>) -> Vec<Node<'t>> {
    let mut cursor = node.walk();
    node.children(&mut cursor).collect()
}

/// Named children without comments and other extras
fn named<'t>(node: Node<'t>) -> Vec<Node<'t>> {
    children(node)
        .into_iter()
        .filter(|child| child.is_named() && !child.is_extra())
        .collect()
}

/// All children stored under a repeated field
fn fields<'t>(node: Node<'t>, name: &str) -> Vec<Node<'t>> {
    let mut cursor = node.walk();
    node.children_by_field_name(name, &mut cursor).collect()
}

/// `async def`, `async for`, `async with` start with an anonymous `async` token
fn starts_with_async(node: Node<'_>) -> bool {
    node.child(0).is_some_and(|first| first.kind() == "async")
}

/// Builds AST statements from a tree-sitter tree
pub struct TreeBuilder<'s> {
    source: &'s str,
}

impl<'s> TreeBuilder<'s> {
    pub fn new(source: &'s str) -> Self {
        Self { source }
    }

    pub fn build(&self, root: Node<'_>) -> Result<Vec<Stmt>> {
        self.statements(root)
    }

    fn text(&self, node: Node<'_>) -> &'s str {
        &self.source[node.byte_range()]
    }

    fn span(&self, node: Node<'_>) -> Span {
        span_of(self.source, node)
    }

    fn unsupported(&self, kind: impl Into<String>, node: Node<'_>) -> TranslateError {
        TranslateError::unsupported(kind, self.span(node))
    }

    fn field<'t>(&self, node: Node<'t>, name: &str) -> Result<Node<'t>> {
        node.child_by_field_name(name).ok_or_else(|| {
            TranslateError::malformed(format!("`{}` is missing its {}", node.kind(), name), self.span(node))
        })
    }

    // === Statements ===

    fn statements(&self, parent: Node<'_>) -> Result<Vec<Stmt>> {
        named(parent).into_iter().map(|child| self.statement(child)).collect()
    }

    fn block(&self, node: Node<'_>) -> Result<Vec<Stmt>> {
        if node.kind() != "block" {
            return Err(TranslateError::malformed(
                format!("expected an indented block, found `{}`", node.kind()),
                self.span(node),
            ));
        }
        self.statements(node)
    }

    /// Body block of a clause node (`else:`, `finally:`, `except ...:`)
    fn clause_block(&self, clause: Node<'_>) -> Result<Vec<Stmt>> {
        let block = clause
            .child_by_field_name("body")
            .or_else(|| named(clause).into_iter().find(|c| c.kind() == "block"))
            .ok_or_else(|| TranslateError::malformed(format!("`{}` has no body", clause.kind()), self.span(clause)))?;
        self.block(block)
    }

    fn statement(&self, node: Node<'_>) -> Result<Stmt> {
        let span = self.span(node);
        let kind = match node.kind() {
            "expression_statement" => self.expression_statement(node)?,
            "function_definition" => self.function_definition(node)?,
            "return_statement" => StmtKind::Return(self.optional_expressions(node)?),
            "if_statement" => self.if_statement(node)?,
            "while_statement" => self.while_statement(node)?,
            "for_statement" => self.for_statement(node)?,
            "try_statement" => self.try_statement(node)?,
            "with_statement" => self.with_statement(node)?,
            "raise_statement" => self.raise_statement(node)?,
            "import_statement" => StmtKind::Import(self.imported_names(node)?),
            "import_from_statement" => self.import_from_statement(node)?,
            "print_statement" => self.print_statement(node)?,
            "pass_statement" => StmtKind::Pass,
            "break_statement" => StmtKind::Break,
            "continue_statement" => StmtKind::Continue,
            other => return Err(self.unsupported(other, node)),
        };
        Ok(Stmt { kind, span })
    }

    fn expression_statement(&self, node: Node<'_>) -> Result<StmtKind> {
        let parts = named(node);
        match parts.as_slice() {
            [only] if only.kind() == "assignment" => self.assignment(*only),
            [only] if only.kind() == "augmented_assignment" => self.augmented_assignment(*only),
            [] => Err(TranslateError::malformed("empty expression statement", self.span(node))),
            _ => Ok(StmtKind::Expr(self.expressions(&parts, node)?)),
        }
    }

    fn assignment(&self, node: Node<'_>) -> Result<StmtKind> {
        let mut targets = Vec::new();
        let mut current = node;
        let value = loop {
            targets.push(self.target(self.field(current, "left")?)?);
            match current.child_by_field_name("right") {
                Some(right) if right.kind() == "assignment" => current = right,
                Some(right) => break Some(self.expression(right)?),
                None => break None,
            }
        };
        Ok(StmtKind::Assign { targets, value })
    }

    fn augmented_assignment(&self, node: Node<'_>) -> Result<StmtKind> {
        let operator = self.field(node, "operator")?;
        let token = self.text(operator);
        let op = BinOp::from_augmented(token)
            .ok_or_else(|| self.unsupported(format!("augmented_assignment `{}`", token), operator))?;
        Ok(StmtKind::AugAssign {
            target: self.target(self.field(node, "left")?)?,
            op,
            value: self.expression(self.field(node, "right")?)?,
        })
    }

    fn function_definition(&self, node: Node<'_>) -> Result<StmtKind> {
        if let Some(type_params) = node.child_by_field_name("type_parameters") {
            return Err(self.unsupported("type_parameter", type_params));
        }
        Ok(StmtKind::FunctionDef(FunctionDef {
            name: self.text(self.field(node, "name")?).to_string(),
            params: self.parameters(self.field(node, "parameters")?)?,
            body: self.block(self.field(node, "body")?)?,
            is_async: starts_with_async(node),
        }))
    }

    fn parameters(&self, node: Node<'_>) -> Result<Vec<Param>> {
        let mut params = Vec::new();
        for param in named(node) {
            match param.kind() {
                "identifier" => params.push(Param { name: self.text(param).to_string(), default: None, rest: false }),
                "typed_parameter" => {
                    let inner = named(param)
                        .into_iter()
                        .next()
                        .ok_or_else(|| TranslateError::malformed("typed parameter without a name", self.span(param)))?;
                    match inner.kind() {
                        "identifier" => params.push(Param { name: self.text(inner).to_string(), default: None, rest: false }),
                        "list_splat_pattern" => params.push(self.rest_parameter(inner)?),
                        other => return Err(self.unsupported(other, inner)),
                    }
                }
                "default_parameter" | "typed_default_parameter" => params.push(Param {
                    name: self.text(self.field(param, "name")?).to_string(),
                    default: Some(self.expression(self.field(param, "value")?)?),
                    rest: false,
                }),
                "list_splat_pattern" => params.push(self.rest_parameter(param)?),
                // `/` only constrains how callers pass arguments
                "positional_separator" => {}
                other => return Err(self.unsupported(other, param)),
            }
        }
        Ok(params)
    }

    fn rest_parameter(&self, node: Node<'_>) -> Result<Param> {
        let name = named(node)
            .into_iter()
            .find(|c| c.kind() == "identifier")
            .ok_or_else(|| TranslateError::malformed("`*` parameter without a name", self.span(node)))?;
        Ok(Param { name: self.text(name).to_string(), default: None, rest: true })
    }

    fn if_statement(&self, node: Node<'_>) -> Result<StmtKind> {
        Ok(StmtKind::If(IfStmt {
            test: self.expression(self.field(node, "condition")?)?,
            body: self.block(self.field(node, "consequence")?)?,
            orelse: self.alternatives(&fields(node, "alternative"))?,
        }))
    }

    /// Fold `elif`/`else` clauses into a nested `orelse` chain
    fn alternatives(&self, clauses: &[Node<'_>]) -> Result<Vec<Stmt>> {
        let Some((first, rest)) = clauses.split_first() else {
            return Ok(Vec::new());
        };
        match first.kind() {
            "else_clause" => self.clause_block(*first),
            "elif_clause" => {
                let nested = IfStmt {
                    test: self.expression(self.field(*first, "condition")?)?,
                    body: self.block(self.field(*first, "consequence")?)?,
                    orelse: self.alternatives(rest)?,
                };
                Ok(vec![Stmt { kind: StmtKind::If(nested), span: self.span(*first) }])
            }
            other => Err(self.unsupported(other, *first)),
        }
    }

    fn while_statement(&self, node: Node<'_>) -> Result<StmtKind> {
        let orelse = match node.child_by_field_name("alternative") {
            Some(clause) => self.clause_block(clause)?,
            None => Vec::new(),
        };
        Ok(StmtKind::While(WhileStmt {
            test: self.expression(self.field(node, "condition")?)?,
            body: self.block(self.field(node, "body")?)?,
            orelse,
        }))
    }

    fn for_statement(&self, node: Node<'_>) -> Result<StmtKind> {
        if let Some(clause) = node.child_by_field_name("alternative") {
            return Err(self.unsupported("for_else_clause", clause));
        }
        Ok(StmtKind::For(ForStmt {
            target: self.target(self.field(node, "left")?)?,
            iter: self.expression(self.field(node, "right")?)?,
            body: self.block(self.field(node, "body")?)?,
            is_async: starts_with_async(node),
        }))
    }

    fn try_statement(&self, node: Node<'_>) -> Result<StmtKind> {
        let body = self.block(self.field(node, "body")?)?;
        let mut handlers = Vec::new();
        let mut finalbody = Vec::new();

        for clause in named(node) {
            match clause.kind() {
                "block" => {}
                "except_clause" => handlers.push(self.except_clause(clause)?),
                "else_clause" => return Err(self.unsupported("try_else_clause", clause)),
                "finally_clause" => finalbody = self.clause_block(clause)?,
                other => return Err(self.unsupported(other, clause)),
            }
        }

        Ok(StmtKind::Try(TryStmt { body, handlers, finalbody }))
    }

    fn except_clause(&self, clause: Node<'_>) -> Result<ExceptHandler> {
        let parts: Vec<_> = named(clause).into_iter().filter(|c| c.kind() != "block").collect();

        let (kind, name) = match parts.as_slice() {
            [] => (None, None),
            [single] if single.kind() == "as_pattern" => {
                let exception = named(*single)
                    .into_iter()
                    .next()
                    .ok_or_else(|| TranslateError::malformed("`except ... as` without a type", self.span(*single)))?;
                let alias = self.field(*single, "alias")?;
                (Some(self.expression(exception)?), Some(self.alias_name(alias)?))
            }
            [single] => (Some(self.expression(*single)?), None),
            [exception, alias] => (Some(self.expression(*exception)?), Some(self.alias_name(*alias)?)),
            _ => {
                return Err(TranslateError::malformed("unexpected `except` clause shape", self.span(clause)));
            }
        };

        Ok(ExceptHandler { kind, name, body: self.clause_block(clause)?, span: self.span(clause) })
    }

    fn alias_name(&self, node: Node<'_>) -> Result<String> {
        let name = match node.kind() {
            "as_pattern_target" => named(node).into_iter().next().unwrap_or(node),
            _ => node,
        };
        if name.kind() != "identifier" {
            return Err(TranslateError::structural("exception alias must be a plain name", self.span(name)));
        }
        Ok(self.text(name).to_string())
    }

    fn with_statement(&self, node: Node<'_>) -> Result<StmtKind> {
        let clause = named(node)
            .into_iter()
            .find(|c| c.kind() == "with_clause")
            .ok_or_else(|| TranslateError::malformed("`with` without items", self.span(node)))?;

        let items = named(clause)
            .into_iter()
            .filter(|c| c.kind() == "with_item")
            .map(|item| self.with_item(item))
            .collect::<Result<Vec<_>>>()?;

        Ok(StmtKind::With(WithStmt {
            items,
            body: self.block(self.field(node, "body")?)?,
            is_async: starts_with_async(node),
        }))
    }

    fn with_item(&self, item: Node<'_>) -> Result<WithItem> {
        let value = item
            .child_by_field_name("value")
            .or_else(|| named(item).into_iter().next())
            .ok_or_else(|| TranslateError::malformed("empty `with` item", self.span(item)))?;

        if value.kind() != "as_pattern" {
            return Ok(WithItem { context: self.expression(value)?, alias: None });
        }

        let context = named(value)
            .into_iter()
            .next()
            .ok_or_else(|| TranslateError::malformed("`with ... as` without a resource", self.span(value)))?;
        let alias = self.field(value, "alias")?;
        let alias = match alias.kind() {
            "as_pattern_target" => named(alias).into_iter().next().unwrap_or(alias),
            _ => alias,
        };

        Ok(WithItem { context: self.expression(context)?, alias: Some(self.target(alias)?) })
    }

    fn raise_statement(&self, node: Node<'_>) -> Result<StmtKind> {
        if let Some(cause) = node.child_by_field_name("cause") {
            return Err(self.unsupported("raise_from", cause));
        }
        Ok(StmtKind::Raise(self.optional_expressions(node)?))
    }

    fn imported_names(&self, node: Node<'_>) -> Result<Vec<Alias>> {
        fields(node, "name")
            .into_iter()
            .map(|name| match name.kind() {
                "dotted_name" => Ok(Alias { name: self.text(name).to_string(), asname: None }),
                "aliased_import" => Ok(Alias {
                    name: self.text(self.field(name, "name")?).to_string(),
                    asname: Some(self.text(self.field(name, "alias")?).to_string()),
                }),
                other => Err(self.unsupported(other, name)),
            })
            .collect()
    }

    fn import_from_statement(&self, node: Node<'_>) -> Result<StmtKind> {
        if let Some(wildcard) = named(node).into_iter().find(|c| c.kind() == "wildcard_import") {
            return Err(self.unsupported("wildcard_import", wildcard));
        }
        Ok(StmtKind::ImportFrom {
            module: self.text(self.field(node, "module_name")?).to_string(),
            names: self.imported_names(node)?,
        })
    }

    /// Python 2 `print x, y`; tree-sitter can also pick this shape for `print(x)`
    fn print_statement(&self, node: Node<'_>) -> Result<StmtKind> {
        let mut args = Vec::new();
        for arg in named(node) {
            if arg.kind() == "chevron" {
                return Err(self.unsupported("chevron", arg));
            }
            let expr = self.expression(arg)?;
            match expr.kind {
                ExprKind::Tuple(items) if arg.kind() == "tuple" => args.extend(items),
                kind => args.push(Expr::new(kind, expr.span)),
            }
        }

        let print = node.child(0).unwrap_or(node);
        let span = self.span(node);
        Ok(StmtKind::Expr(Expr::new(
            ExprKind::Call { func: Box::new(Expr::name("print", self.span(print))), args },
            span,
        )))
    }

    /// Value of `return`/`raise`: absent, a single expression, or a bare tuple
    fn optional_expressions(&self, node: Node<'_>) -> Result<Option<Expr>> {
        let parts = named(node);
        if parts.is_empty() {
            return Ok(None);
        }
        self.expressions(&parts, node).map(Some)
    }

    fn expressions(&self, parts: &[Node<'_>], parent: Node<'_>) -> Result<Expr> {
        match parts {
            [single] => self.expression(*single),
            _ => {
                let items = parts.iter().map(|p| self.expression(*p)).collect::<Result<Vec<_>>>()?;
                Ok(Expr::new(ExprKind::Tuple(items), self.span(parent)))
            }
        }
    }

    // === Assignment targets ===

    fn target(&self, node: Node<'_>) -> Result<Expr> {
        let span = self.span(node);
        let kind = match node.kind() {
            "identifier" => ExprKind::Name(self.text(node).to_string()),
            "pattern_list" | "tuple_pattern" | "tuple" | "expression_list" => ExprKind::Tuple(self.targets(node)?),
            "list_pattern" | "list" => ExprKind::List(self.targets(node)?),
            "list_splat_pattern" | "list_splat" => {
                let inner = named(node)
                    .into_iter()
                    .next()
                    .ok_or_else(|| TranslateError::malformed("`*` target without a name", span))?;
                ExprKind::Starred(Box::new(self.target(inner)?))
            }
            "attribute" | "subscript" => return self.expression(node),
            "parenthesized_expression" => match named(node).as_slice() {
                [inner] => return self.target(*inner),
                _ => return Err(TranslateError::malformed("empty parenthesized target", span)),
            },
            other => return Err(self.unsupported(other, node)),
        };
        Ok(Expr::new(kind, span))
    }

    fn targets(&self, node: Node<'_>) -> Result<Vec<Expr>> {
        named(node).into_iter().map(|child| self.target(child)).collect()
    }

    // === Expressions ===

    fn expression(&self, node: Node<'_>) -> Result<Expr> {
        let span = self.span(node);
        let kind = match node.kind() {
            "identifier" | "keyword_identifier" => ExprKind::Name(self.text(node).to_string()),
            "integer" => self.integer(node)?,
            "float" => self.float(node)?,
            "true" => ExprKind::Bool(true),
            "false" => ExprKind::Bool(false),
            "none" => ExprKind::None,
            "string" => self.string(node)?,
            "concatenated_string" => return self.concatenated_string(node),
            "binary_operator" => {
                let operator = self.field(node, "operator")?;
                let token = self.text(operator);
                let op = BinOp::from_python(token)
                    .ok_or_else(|| self.unsupported(format!("binary_operator `{}`", token), operator))?;
                ExprKind::BinOp {
                    left: Box::new(self.expression(self.field(node, "left")?)?),
                    op,
                    right: Box::new(self.expression(self.field(node, "right")?)?),
                }
            }
            "unary_operator" => {
                let operator = self.field(node, "operator")?;
                let token = self.text(operator);
                let op = UnaryOp::from_python(token)
                    .ok_or_else(|| self.unsupported(format!("unary_operator `{}`", token), operator))?;
                ExprKind::UnaryOp { op, operand: Box::new(self.expression(self.field(node, "argument")?)?) }
            }
            "not_operator" => ExprKind::UnaryOp {
                op: UnaryOp::Not,
                operand: Box::new(self.expression(self.field(node, "argument")?)?),
            },
            "boolean_operator" => self.boolean_operator(node)?,
            "comparison_operator" => self.comparison_operator(node)?,
            "call" => self.call(node)?,
            "attribute" => ExprKind::Attribute {
                value: Box::new(self.expression(self.field(node, "object")?)?),
                attr: self.text(self.field(node, "attribute")?).to_string(),
            },
            "subscript" => {
                let indices = fields(node, "subscript");
                let index = match indices.as_slice() {
                    [] => return Err(TranslateError::malformed("subscript without an index", span)),
                    parts => self.expressions(parts, node)?,
                };
                ExprKind::Subscript {
                    value: Box::new(self.expression(self.field(node, "value")?)?),
                    index: Box::new(index),
                }
            }
            "list" => ExprKind::List(self.elements(node)?),
            "tuple" | "expression_list" => ExprKind::Tuple(self.elements(node)?),
            "dictionary" => self.dictionary(node)?,
            "parenthesized_expression" => match named(node).as_slice() {
                [inner] => return self.expression(*inner),
                _ => return Err(TranslateError::malformed("unexpected parenthesized expression", span)),
            },
            "list_splat" => ExprKind::Starred(Box::new(self.first_operand(node)?)),
            "await" => ExprKind::Await(Box::new(self.first_operand(node)?)),
            "conditional_expression" => match named(node).as_slice() {
                [body, test, orelse] => ExprKind::IfExp {
                    test: Box::new(self.expression(*test)?),
                    body: Box::new(self.expression(*body)?),
                    orelse: Box::new(self.expression(*orelse)?),
                },
                _ => return Err(TranslateError::malformed("incomplete conditional expression", span)),
            },
            "list_comprehension" => ExprKind::ListComp(self.comprehension(node)?),
            "generator_expression" => ExprKind::GeneratorExp(self.comprehension(node)?),
            other => return Err(self.unsupported(other, node)),
        };
        Ok(Expr::new(kind, span))
    }

    fn first_operand(&self, node: Node<'_>) -> Result<Expr> {
        let operand = named(node)
            .into_iter()
            .next()
            .ok_or_else(|| TranslateError::malformed(format!("`{}` without an operand", node.kind()), self.span(node)))?;
        self.expression(operand)
    }

    fn elements(&self, node: Node<'_>) -> Result<Vec<Expr>> {
        named(node).into_iter().map(|child| self.expression(child)).collect()
    }

    fn integer(&self, node: Node<'_>) -> Result<ExprKind> {
        let digits = self.text(node).replace('_', "");
        if digits.ends_with(['j', 'J']) {
            return Err(self.unsupported("imaginary_literal", node));
        }

        let radix = match digits.get(..2).map(|p| p.to_ascii_lowercase()).as_deref() {
            Some("0x") => 16,
            Some("0o") => 8,
            Some("0b") => 2,
            _ => return Ok(ExprKind::Int(digits)),
        };
        let value = u128::from_str_radix(&digits[2..], radix)
            .map_err(|e| TranslateError::malformed(format!("invalid integer literal: {}", e), self.span(node)))?;
        Ok(ExprKind::Int(value.to_string()))
    }

    fn float(&self, node: Node<'_>) -> Result<ExprKind> {
        let digits = self.text(node).replace('_', "");
        if digits.ends_with(['j', 'J']) {
            return Err(self.unsupported("imaginary_literal", node));
        }
        Ok(ExprKind::Float(digits))
    }

    fn string(&self, node: Node<'_>) -> Result<ExprKind> {
        let parts = children(node);
        let start = parts.iter().find(|c| c.kind() == "string_start");
        let end = parts.iter().find(|c| c.kind() == "string_end");
        let (Some(start), Some(end)) = (start, end) else {
            return Err(TranslateError::malformed("unterminated string", self.span(node)));
        };

        let prefix: String = self
            .text(*start)
            .chars()
            .take_while(|c| c.is_ascii_alphabetic())
            .map(|c| c.to_ascii_lowercase())
            .collect();
        if prefix.contains('b') {
            return Err(self.unsupported("bytes_literal", node));
        }

        let body_start = start.end_byte();
        let body_end = end.start_byte();
        if !prefix.contains('f') {
            return Ok(ExprKind::Str {
                body: self.source[body_start..body_end].to_string(),
                raw: prefix.contains('r'),
            });
        }

        let raw = prefix.contains('r');
        let literal = |text: &str| {
            let text = collapse_braces(text);
            FStringPart::Literal(if raw { text.replace('\\', "\\\\") } else { text })
        };

        let mut pieces = Vec::new();
        let mut cursor = body_start;
        for interpolation in parts.iter().filter(|c| c.kind() == "interpolation") {
            if interpolation.start_byte() > cursor {
                pieces.push(literal(&self.source[cursor..interpolation.start_byte()]));
            }
            pieces.push(self.interpolation(*interpolation)?);
            cursor = interpolation.end_byte();
        }
        if body_end > cursor {
            pieces.push(literal(&self.source[cursor..body_end]));
        }

        Ok(ExprKind::FString(pieces))
    }

    fn interpolation(&self, node: Node<'_>) -> Result<FStringPart> {
        // `{x=}` echoes its own source text
        if children(node).iter().any(|c| c.kind() == "=") {
            return Err(self.unsupported("interpolation `=`", node));
        }

        let expression = node
            .child_by_field_name("expression")
            .or_else(|| {
                named(node)
                    .into_iter()
                    .find(|c| !matches!(c.kind(), "type_conversion" | "format_specifier"))
            })
            .ok_or_else(|| TranslateError::malformed("empty f-string replacement field", self.span(node)))?;

        let modifier = |field: &str, kind: &str| {
            node.child_by_field_name(field)
                .or_else(|| named(node).into_iter().find(|c| c.kind() == kind))
                .map(|m| self.text(m).to_string())
        };

        Ok(FStringPart::Interpolation {
            expr: Box::new(self.expression(expression)?),
            conversion: modifier("type_conversion", "type_conversion"),
            format_spec: modifier("format_specifier", "format_specifier"),
        })
    }

    /// `'a' 'b'` becomes `'a' + 'b'`
    fn concatenated_string(&self, node: Node<'_>) -> Result<Expr> {
        let mut strings = named(node).into_iter();
        let first = strings
            .next()
            .ok_or_else(|| TranslateError::malformed("empty string concatenation", self.span(node)))?;
        let mut joined = self.expression(first)?;
        for next in strings {
            let right = self.expression(next)?;
            let span = Span { start: joined.span.start, end: right.span.end };
            joined = Expr::new(
                ExprKind::BinOp { left: Box::new(joined), op: BinOp::Add, right: Box::new(right) },
                span,
            );
        }
        Ok(joined)
    }

    /// `a and b and c` flattens into one operation with three values
    fn boolean_operator(&self, node: Node<'_>) -> Result<ExprKind> {
        let operator = self.field(node, "operator")?;
        let op = match self.text(operator) {
            "and" => BoolOp::And,
            "or" => BoolOp::Or,
            other => return Err(self.unsupported(format!("boolean_operator `{}`", other), operator)),
        };

        let mut values = Vec::new();
        for side in [self.field(node, "left")?, self.field(node, "right")?] {
            let flatten = side.kind() == "boolean_operator";
            let expr = self.expression(side)?;
            match expr.kind {
                ExprKind::BoolOp { op: inner, values: inner_values } if flatten && inner == op => {
                    values.extend(inner_values)
                }
                kind => values.push(Expr::new(kind, expr.span)),
            }
        }
        Ok(ExprKind::BoolOp { op, values })
    }

    fn comparison_operator(&self, node: Node<'_>) -> Result<ExprKind> {
        let mut operands = Vec::new();
        let mut ops = Vec::new();
        let mut pending = String::new();

        for child in children(node) {
            if child.is_extra() {
                continue;
            }
            if child.is_named() {
                if !pending.is_empty() {
                    let op = CmpOp::from_python(&pending)
                        .ok_or_else(|| self.unsupported(format!("comparison_operator `{}`", pending), node))?;
                    ops.push(op);
                    pending.clear();
                }
                operands.push(self.expression(child)?);
            } else {
                for word in self.text(child).split_whitespace() {
                    if !pending.is_empty() {
                        pending.push(' ');
                    }
                    pending.push_str(word);
                }
            }
        }

        if operands.len() != ops.len() + 1 || ops.is_empty() {
            return Err(TranslateError::malformed("unbalanced comparison", self.span(node)));
        }
        let left = operands.remove(0);
        Ok(ExprKind::Compare { left: Box::new(left), ops, comparators: operands })
    }

    fn call(&self, node: Node<'_>) -> Result<ExprKind> {
        let func = self.expression(self.field(node, "function")?)?;
        let arguments = self.field(node, "arguments")?;

        let args = match arguments.kind() {
            "generator_expression" => vec![self.expression(arguments)?],
            _ => named(arguments)
                .into_iter()
                .map(|arg| match arg.kind() {
                    "keyword_argument" | "dictionary_splat" => Err(self.unsupported(arg.kind(), arg)),
                    _ => self.expression(arg),
                })
                .collect::<Result<Vec<_>>>()?,
        };

        Ok(ExprKind::Call { func: Box::new(func), args })
    }

    fn dictionary(&self, node: Node<'_>) -> Result<ExprKind> {
        let mut entries = Vec::new();
        for entry in named(node) {
            match entry.kind() {
                "pair" => entries.push((
                    self.expression(self.field(entry, "key")?)?,
                    self.expression(self.field(entry, "value")?)?,
                )),
                other => return Err(self.unsupported(other, entry)),
            }
        }
        Ok(ExprKind::Dict(entries))
    }

    fn comprehension(&self, node: Node<'_>) -> Result<Comprehension> {
        let element = self.expression(self.field(node, "body")?)?;
        let mut clauses = Vec::new();

        for clause in named(node) {
            match clause.kind() {
                "for_in_clause" => {
                    if starts_with_async(clause) {
                        return Err(self.unsupported("async_comprehension", clause));
                    }
                    let iters = fields(clause, "right");
                    let iter = match iters.as_slice() {
                        [] => return Err(TranslateError::malformed("`for` clause without an iterable", self.span(clause))),
                        parts => self.expressions(parts, clause)?,
                    };
                    clauses.push(Clause::For { target: self.target(self.field(clause, "left")?)?, iter });
                }
                "if_clause" => clauses.push(Clause::If(self.first_operand(clause)?)),
                _ => {}
            }
        }

        if !matches!(clauses.first(), Some(Clause::For { .. })) {
            return Err(TranslateError::malformed("comprehension must start with a `for` clause", self.span(node)));
        }

        Ok(Comprehension { element: Box::new(element), clauses })
    }
}

/// `{{` and `}}` in f-string literal text stand for single braces
fn collapse_braces(text: &str) -> String {
    text.replace("{{", "{").replace("}}", "}")
}

#[cfg(test)]
mod tests {
    use crate::ast::*;
    use crate::error::ErrorKind;
    use crate::parser::{Parser, PythonParser};

    fn parse(source: &str) -> Vec<Stmt> {
        PythonParser::new().parse(source).unwrap().body
    }

    fn parse_expr(source: &str) -> ExprKind {
        match parse(source).remove(0).kind {
            StmtKind::Expr(expr) => expr.kind,
            other => panic!("expected expression statement, got {:?}", other),
        }
    }

    #[test]
    fn test_elif_becomes_nested_if() {
        let body = parse("if a:\n    x = 1\nelif b:\n    x = 2\nelse:\n    x = 3\n");
        let StmtKind::If(outer) = &body[0].kind else { panic!("expected if") };
        assert_eq!(outer.orelse.len(), 1);
        let StmtKind::If(inner) = &outer.orelse[0].kind else { panic!("expected nested if") };
        assert_eq!(inner.test.as_name(), Some("b"));
        assert_eq!(inner.orelse.len(), 1);
    }

    #[test]
    fn test_bool_op_flattens() {
        let ExprKind::BoolOp { op, values } = parse_expr("a and b and c\n") else { panic!("expected bool op") };
        assert_eq!(op, BoolOp::And);
        assert_eq!(values.len(), 3);
    }

    #[test]
    fn test_parenthesized_bool_op_stays_nested() {
        let ExprKind::BoolOp { values, .. } = parse_expr("(a or b) and c\n") else { panic!("expected bool op") };
        assert_eq!(values.len(), 2);
        assert!(matches!(values[0].kind, ExprKind::BoolOp { op: BoolOp::Or, .. }));
    }

    #[test]
    fn test_comparison_operators() {
        let ExprKind::Compare { ops, comparators, .. } = parse_expr("a not in b\n") else { panic!("expected compare") };
        assert_eq!(ops, vec![CmpOp::NotIn]);
        assert_eq!(comparators.len(), 1);

        let ExprKind::Compare { ops, .. } = parse_expr("a < b <= c\n") else { panic!("expected compare") };
        assert_eq!(ops, vec![CmpOp::Lt, CmpOp::LtE]);
    }

    #[test]
    fn test_integer_radix() {
        assert_eq!(parse_expr("0x10\n"), ExprKind::Int("16".into()));
        assert_eq!(parse_expr("0b101\n"), ExprKind::Int("5".into()));
        assert_eq!(parse_expr("1_000\n"), ExprKind::Int("1000".into()));
    }

    #[test]
    fn test_fstring_parts() {
        let ExprKind::FString(parts) = parse_expr("f'sum {total!r:>4} {{x}}'\n") else { panic!("expected f-string") };
        assert_eq!(parts[0], FStringPart::Literal("sum ".into()));
        let FStringPart::Interpolation { expr, conversion, format_spec } = &parts[1] else { panic!("expected field") };
        assert_eq!(expr.as_name(), Some("total"));
        assert_eq!(conversion.as_deref(), Some("!r"));
        assert_eq!(format_spec.as_deref(), Some(":>4"));
        assert_eq!(parts[2], FStringPart::Literal(" {x}".into()));
    }

    #[test]
    fn test_raw_fstring_keeps_backslashes() {
        let ExprKind::FString(parts) = parse_expr("rf'\\d{n}'\n") else { panic!("expected f-string") };
        assert_eq!(parts[0], FStringPart::Literal("\\\\d".into()));

        let ExprKind::FString(parts) = parse_expr("f'\\n{n}'\n") else { panic!("expected f-string") };
        assert_eq!(parts[0], FStringPart::Literal("\\n".into()));
    }

    #[test]
    fn test_fstring_debug_form_rejected() {
        let err = PythonParser::new().parse("f'{x=}'\n").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::UnsupportedConstruct);
        assert!(err.to_string().contains("interpolation `=`"));
    }

    #[test]
    fn test_chained_assignment_targets() {
        let body = parse("a = b = 1\n");
        let StmtKind::Assign { targets, value } = &body[0].kind else { panic!("expected assign") };
        assert_eq!(targets.len(), 2);
        assert_eq!(targets[1].as_name(), Some("b"));
        assert!(value.is_some());
    }

    #[test]
    fn test_comprehension_clauses() {
        let ExprKind::ListComp(comp) = parse_expr("[x * 2 for x in nums if x > 1]\n") else { panic!("expected listcomp") };
        assert_eq!(comp.clauses.len(), 2);
        assert!(matches!(comp.clauses[0], Clause::For { .. }));
        assert!(matches!(comp.clauses[1], Clause::If(_)));
    }

    #[test]
    fn test_except_alias() {
        let body = parse("try:\n    f()\nexcept ValueError as err:\n    pass\n");
        let StmtKind::Try(try_stmt) = &body[0].kind else { panic!("expected try") };
        let handler = &try_stmt.handlers[0];
        assert_eq!(handler.kind.as_ref().and_then(|k| k.as_name()), Some("ValueError"));
        assert_eq!(handler.name.as_deref(), Some("err"));
    }

    #[test]
    fn test_unsupported_kinds() {
        for (source, kind) in [
            ("class Foo:\n    pass\n", "class_definition"),
            ("f = lambda x: x\n", "lambda"),
            ("f(key=1)\n", "keyword_argument"),
            ("for x in y:\n    pass\nelse:\n    pass\n", "for_else_clause"),
            ("from os import *\n", "wildcard_import"),
        ] {
            let err = PythonParser::new().parse(source).unwrap_err();
            assert_eq!(err.kind(), ErrorKind::UnsupportedConstruct, "{}", source);
            assert!(err.to_string().contains(kind), "{}: {}", source, err);
        }
    }
}
