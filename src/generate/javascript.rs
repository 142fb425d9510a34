use super::{ExprTranslator, GenerateOptions, GenerateResult, Generator, Output, WithLowering};
use crate::ast::*;
use crate::error::TranslateError;
use std::collections::HashSet;

type Result<T> = std::result::Result<T, TranslateError>;

/// Name bound to the caught value when handlers need to inspect it
const CAUGHT: &str = "_error";

/// Loop counter for a zip loop: `i` unless the loop already mentions it,
/// then `_i`, `_i1`, `_i2`, ...
fn zip_index(used: &HashSet<&str>) -> String {
    ["i".to_string(), "_i".to_string()]
        .into_iter()
        .chain((1..).map(|n| format!("_i{}", n)))
        .find(|candidate| !used.contains(candidate.as_str()))
        .unwrap_or_default()
}

/// 1-based line for log fields
fn line_number(span: Span) -> usize {
    span.start.line + 1
}

/// Emits JavaScript for a module.
///
/// Owns the output buffer and its indentation cursor for one run. Build a
/// fresh emitter per translation.
pub struct JsEmitter {
    out: Output,
    exprs: ExprTranslator,
    with_lowering: WithLowering,
    /// Counter for anonymous `using` resources
    resources: usize,
}

impl JsEmitter {
    pub fn new(options: &GenerateOptions) -> Self {
        Self {
            out: Output::new(options.indent.clone()),
            exprs: ExprTranslator::new(),
            with_lowering: options.with_lowering,
            resources: 0,
        }
    }

    /// Indentation cursor, zero outside any block
    pub fn level(&self) -> usize {
        self.out.level()
    }

    pub fn finish(self) -> String {
        self.out.finish()
    }

    pub fn visit_module(&mut self, module: &Module) -> Result<()> {
        self.visit_body(&module.body)
    }

    pub fn visit_body(&mut self, body: &[Stmt]) -> Result<()> {
        for stmt in body {
            self.visit_stmt(stmt)?;
        }
        Ok(())
    }

    pub fn visit_stmt(&mut self, stmt: &Stmt) -> Result<()> {
        tracing::trace!(kind = stmt.kind.name(), line = line_number(stmt.span), "lowering statement");

        match &stmt.kind {
            StmtKind::FunctionDef(def) => self.function_def(def),
            StmtKind::Return(Some(value)) => {
                let value = self.expr(value)?;
                self.out.emit(format!("return {};", value));
                Ok(())
            }
            StmtKind::Return(None) => {
                self.out.emit("return;");
                Ok(())
            }
            StmtKind::Assign { targets, value } => self.assign(targets, value.as_ref()),
            StmtKind::AugAssign { target, op, value } => self.aug_assign(target, *op, value),
            StmtKind::If(if_stmt) => self.if_stmt(if_stmt),
            StmtKind::While(while_stmt) => self.while_stmt(while_stmt),
            StmtKind::For(for_stmt) => self.for_stmt(for_stmt),
            StmtKind::With(with_stmt) => self.with_stmt(with_stmt, stmt.span),
            StmtKind::Try(try_stmt) => self.try_stmt(try_stmt),
            StmtKind::Raise(Some(exc)) => {
                let exc = self.expr(exc)?;
                self.out.emit(format!("throw {};", exc));
                Ok(())
            }
            StmtKind::Raise(None) => {
                self.out.emit("throw new Error();");
                Ok(())
            }
            StmtKind::Import(names) => {
                for alias in names {
                    let binding = match &alias.asname {
                        Some(asname) => asname.as_str(),
                        None => alias.name.split('.').next().unwrap_or(&alias.name),
                    };
                    self.out.emit(format!("const {} = require(\"{}\");", binding, alias.name));
                }
                Ok(())
            }
            StmtKind::ImportFrom { module, names } => {
                for alias in names {
                    let binding = alias.asname.as_deref().unwrap_or(&alias.name);
                    self.out.emit(format!("const {} = require(\"{}.{}\");", binding, module, alias.name));
                }
                Ok(())
            }
            StmtKind::Expr(expr) => {
                let text = self.expr(expr)?;
                self.out.emit(format!("{};", text));
                Ok(())
            }
            StmtKind::Break => {
                self.out.emit("break;");
                Ok(())
            }
            StmtKind::Continue => {
                self.out.emit("continue;");
                Ok(())
            }
            StmtKind::Pass => Ok(()),
        }
    }

    fn expr(&self, expr: &Expr) -> Result<String> {
        self.exprs.translate(expr)
    }

    /// Indent, lower every statement, dedent
    fn block(&mut self, body: &[Stmt]) -> Result<()> {
        self.out.indent();
        self.visit_body(body)?;
        self.out.dedent()
    }

    fn function_def(&mut self, def: &FunctionDef) -> Result<()> {
        let params = def
            .params
            .iter()
            .map(|param| match (&param.default, param.rest) {
                (_, true) => Ok(format!("...{}", param.name)),
                (Some(default), false) => Ok(format!("{} = {}", param.name, self.expr(default)?)),
                (None, false) => Ok(param.name.clone()),
            })
            .collect::<Result<Vec<_>>>()?;

        let prefix = if def.is_async { "async " } else { "" };
        self.out.emit(format!("{}function {}({}) {{", prefix, def.name, params.join(", ")));
        self.block(&def.body)?;
        self.out.emit("}");
        Ok(())
    }

    fn assign(&mut self, targets: &[Expr], value: Option<&Expr>) -> Result<()> {
        let Some(value) = value else {
            // Bare annotation: declare plain names, ignore the rest
            for target in targets {
                if let Some(name) = target.as_name() {
                    self.out.emit(format!("let {};", name));
                }
            }
            return Ok(());
        };

        let Some((first, rest)) = targets.split_first() else {
            return Err(TranslateError::Internal("assignment without a target".to_string()));
        };

        let first_text = self.exprs.pattern(first)?;
        let value_text = if is_destructuring(first) { self.exprs.sequence(value)? } else { self.expr(value)? };
        self.out.emit(format!("{}{} = {};", declaration(first), first_text, value_text));

        for target in rest {
            let text = self.exprs.pattern(target)?;
            self.out.emit(format!("{}{} = {};", declaration(target), text, first_text));
        }
        Ok(())
    }

    fn aug_assign(&mut self, target: &Expr, op: BinOp, value: &Expr) -> Result<()> {
        let target = self.exprs.pattern(target)?;
        let value = self.expr(value)?;
        let line = match op {
            BinOp::FloorDiv => format!("{} = Math.floor({} / {});", target, target, value),
            _ => format!("{} {}= {};", target, augmented_symbol(op), value),
        };
        self.out.emit(line);
        Ok(())
    }

    fn if_stmt(&mut self, stmt: &IfStmt) -> Result<()> {
        let test = self.expr(&stmt.test)?;
        self.out.emit(format!("if ({}) {{", test));
        self.block(&stmt.body)?;
        if !stmt.orelse.is_empty() {
            self.out.emit("} else {");
            self.block(&stmt.orelse)?;
        }
        self.out.emit("}");
        Ok(())
    }

    /// `while ... else` keeps the source shape; the else block has no native meaning
    fn while_stmt(&mut self, stmt: &WhileStmt) -> Result<()> {
        let test = self.expr(&stmt.test)?;
        self.out.emit(format!("while ({}) {{", test));
        self.block(&stmt.body)?;
        if !stmt.orelse.is_empty() {
            self.out.emit("} else {");
            self.block(&stmt.orelse)?;
        }
        self.out.emit("}");
        Ok(())
    }

    fn for_stmt(&mut self, stmt: &ForStmt) -> Result<()> {
        if stmt.is_async {
            let target = self.exprs.pattern(&stmt.target)?;
            let iter = self.expr(&stmt.iter)?;
            self.out.emit(format!("for await (let {} of {}) {{", target, iter));
            return self.loop_body(&stmt.body);
        }

        if let ExprKind::Call { func, args } = &stmt.iter.kind {
            match &func.kind {
                ExprKind::Name(name) if name == "range" => return self.range_loop(stmt, args),
                ExprKind::Name(name) if name == "zip" => return self.zip_loop(stmt, args),
                ExprKind::Attribute { value, attr } if args.is_empty() => {
                    let helper = match attr.as_str() {
                        "items" => Some("entries"),
                        "keys" => Some("keys"),
                        "values" => Some("values"),
                        _ => None,
                    };
                    if let Some(helper) = helper {
                        let target = self.exprs.pattern(&stmt.target)?;
                        let mapping = self.expr(value)?;
                        self.out.emit(format!("for (let {} of Object.{}({})) {{", target, helper, mapping));
                        return self.loop_body(&stmt.body);
                    }
                }
                _ => {}
            }
        }

        let target = self.exprs.pattern(&stmt.target)?;
        let iter = self.expr(&stmt.iter)?;
        self.out.emit(format!("for (let {} of {}) {{", target, iter));
        self.loop_body(&stmt.body)
    }

    fn loop_body(&mut self, body: &[Stmt]) -> Result<()> {
        self.block(body)?;
        self.out.emit("}");
        Ok(())
    }

    fn range_loop(&mut self, stmt: &ForStmt, args: &[Expr]) -> Result<()> {
        let Some(var) = stmt.target.as_name() else {
            return Err(TranslateError::structural("range loop target must be a single name", stmt.target.span));
        };

        let args = args.iter().map(|arg| self.expr(arg)).collect::<Result<Vec<_>>>()?;
        let header = match args.as_slice() {
            [stop] => format!("for (let {v} = 0; {v} < {}; {v}++) {{", stop, v = var),
            [start, stop] => format!("for (let {v} = {}; {v} < {}; {v}++) {{", start, stop, v = var),
            [start, stop, step] => {
                format!("for (let {v} = {}; {v} < {}; {v} += {}) {{", start, stop, step, v = var)
            }
            _ => {
                return Err(TranslateError::structural(
                    format!("range() takes 1 to 3 arguments, found {}", args.len()),
                    stmt.iter.span,
                ));
            }
        };

        self.out.emit(header);
        self.loop_body(&stmt.body)
    }

    /// `for a, b in zip(xs, ys)` walks all sequences with one shared index
    fn zip_loop(&mut self, stmt: &ForStmt, sequences: &[Expr]) -> Result<()> {
        let ExprKind::Tuple(targets) = &stmt.target.kind else {
            return Err(TranslateError::structural("zip loop target must be a tuple of names", stmt.target.span));
        };
        if targets.len() != sequences.len() || sequences.is_empty() {
            return Err(TranslateError::structural(
                format!("zip loop unpacks {} names from {} sequences", targets.len(), sequences.len()),
                stmt.target.span,
            ));
        }
        let names = targets
            .iter()
            .map(|target| {
                target
                    .as_name()
                    .ok_or_else(|| TranslateError::structural("zip loop targets must be plain names", target.span))
            })
            .collect::<Result<Vec<_>>>()?;

        let mut used: HashSet<&str> = names.iter().copied().collect();
        sequences.iter().for_each(|sequence| sequence.collect_names(&mut used));
        stmt.body.iter().for_each(|body| body.collect_names(&mut used));
        let counter = zip_index(&used);
        let index = counter.as_str();
        let first = &sequences[0];
        let length = Expr::new(
            ExprKind::Attribute { value: Box::new(first.clone()), attr: "length".to_string() },
            first.span,
        );
        let length = self.expr(&length)?;

        for name in &names {
            self.out.emit(format!("let {};", name));
        }
        self.out.emit(format!("for (let {i} = 0; {i} < {}; {i}++) {{", length, i = index));
        self.out.indent();
        for (name, sequence) in names.iter().zip(sequences) {
            let sequence = self.expr(sequence)?;
            self.out.emit(format!("{} = {}[{}];", name, sequence, index));
        }
        self.visit_body(&stmt.body)?;
        self.out.dedent()?;
        self.out.emit("}");
        Ok(())
    }

    fn with_stmt(&mut self, stmt: &WithStmt, span: Span) -> Result<()> {
        match self.with_lowering {
            WithLowering::PseudoWith => self.pseudo_with(stmt, span),
            WithLowering::Using => self.using_block(stmt),
        }
    }

    fn pseudo_with(&mut self, stmt: &WithStmt, span: Span) -> Result<()> {
        tracing::warn!(
            line = line_number(span),
            "`with` lowered to an object-literal block; resources are not released on exit"
        );

        self.out.emit(if stmt.is_async { "await with ({" } else { "with ({" });
        self.out.indent();
        for item in &stmt.items {
            let context = self.expr(&item.context)?;
            let alias = match &item.alias {
                Some(alias) => self.exprs.pattern(alias)?,
                None => "null".to_string(),
            };
            self.out.emit(format!("{}: {},", context, alias));
        }
        self.out.dedent()?;
        self.out.emit("}) {");
        self.block(&stmt.body)?;
        self.out.emit("}");
        Ok(())
    }

    fn using_block(&mut self, stmt: &WithStmt) -> Result<()> {
        let keyword = if stmt.is_async { "await using" } else { "using" };

        self.out.emit("{");
        self.out.indent();
        for item in &stmt.items {
            let binding = match &item.alias {
                Some(alias) => alias
                    .as_name()
                    .map(str::to_string)
                    .ok_or_else(|| TranslateError::structural("`using` can only bind a plain name", alias.span))?,
                None => {
                    self.resources += 1;
                    format!("_resource{}", self.resources)
                }
            };
            let context = self.expr(&item.context)?;
            self.out.emit(format!("{} {} = {};", keyword, binding, context));
        }
        self.visit_body(&stmt.body)?;
        self.out.dedent()?;
        self.out.emit("}");
        Ok(())
    }

    fn try_stmt(&mut self, stmt: &TryStmt) -> Result<()> {
        self.out.emit("try {");
        self.block(&stmt.body)?;

        match stmt.handlers.as_slice() {
            [] => {}
            [handler] => {
                self.out.emit(format!("}} catch ({}) {{", handler.name.as_deref().unwrap_or(CAUGHT)));
                self.block(&handler.body)?;
            }
            handlers => {
                self.out.emit(format!("}} catch ({}) {{", CAUGHT));
                self.out.indent();
                self.handler_chain(handlers)?;
                self.out.dedent()?;
            }
        }

        if !stmt.finalbody.is_empty() {
            self.out.emit("} finally {");
            self.block(&stmt.finalbody)?;
        }
        self.out.emit("}");
        Ok(())
    }

    /// Several `except` clauses share one `catch` and pick a branch by type
    fn handler_chain(&mut self, handlers: &[ExceptHandler]) -> Result<()> {
        let mut has_fallback = false;

        for (i, handler) in handlers.iter().enumerate() {
            let opener = if i == 0 { "" } else { "} else " };
            match &handler.kind {
                Some(kind) => {
                    let test = self.instance_test(kind)?;
                    self.out.emit(format!("{}if ({}) {{", opener, test));
                }
                None if i == 0 || i + 1 != handlers.len() => {
                    return Err(TranslateError::structural("bare `except:` must be the last handler", handler.span));
                }
                None => {
                    has_fallback = true;
                    self.out.emit("} else {");
                }
            }

            self.out.indent();
            if let Some(name) = &handler.name {
                self.out.emit(format!("let {} = {};", name, CAUGHT));
            }
            self.visit_body(&handler.body)?;
            self.out.dedent()?;
        }

        if !has_fallback {
            self.out.emit("} else {");
            self.out.indent();
            self.out.emit(format!("throw {};", CAUGHT));
            self.out.dedent()?;
        }
        self.out.emit("}");
        Ok(())
    }

    fn instance_test(&self, kind: &Expr) -> Result<String> {
        match &kind.kind {
            ExprKind::Tuple(kinds) => {
                let tests = kinds
                    .iter()
                    .map(|k| Ok(format!("{} instanceof {}", CAUGHT, self.expr(k)?)))
                    .collect::<Result<Vec<_>>>()?;
                Ok(tests.join(" || "))
            }
            _ => Ok(format!("{} instanceof {}", CAUGHT, self.expr(kind)?)),
        }
    }
}

fn is_destructuring(target: &Expr) -> bool {
    matches!(target.kind, ExprKind::Tuple(_) | ExprKind::List(_))
}

/// Names and patterns introduce a binding; attribute and subscript targets don't
fn declaration(target: &Expr) -> &'static str {
    match target.kind {
        ExprKind::Attribute { .. } | ExprKind::Subscript { .. } => "",
        _ => "let ",
    }
}

fn augmented_symbol(op: BinOp) -> &'static str {
    match op {
        BinOp::Add => "+",
        BinOp::Sub => "-",
        BinOp::Mult => "*",
        BinOp::Div | BinOp::FloorDiv => "/",
        BinOp::Mod => "%",
        BinOp::Pow => "**",
        BinOp::BitAnd => "&",
        BinOp::BitOr => "|",
        BinOp::BitXor => "^",
        BinOp::LShift => "<<",
        BinOp::RShift => ">>",
    }
}

/// Generator producing JavaScript source
pub struct JavaScriptGenerator;

impl JavaScriptGenerator {
    pub fn new() -> Self {
        Self
    }
}

impl Default for JavaScriptGenerator {
    fn default() -> Self {
        Self::new()
    }
}

impl Generator for JavaScriptGenerator {
    fn generate(&self, module: &Module, options: &GenerateOptions) -> Result<GenerateResult> {
        let mut emitter = JsEmitter::new(options);
        emitter.visit_module(module)?;

        if emitter.level() != 0 {
            return Err(TranslateError::Internal(format!(
                "indentation left at level {} after module",
                emitter.level()
            )));
        }

        let code = emitter.finish();
        tracing::debug!(statements = module.body.len(), lines = code.lines().count(), "generated javascript");

        Ok(GenerateResult { code, statements: module.body.len() })
    }
}
