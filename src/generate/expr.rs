//! Expression lowering: tree node in, JavaScript text fragment out.
//!
//! Nothing here touches the output buffer. Statement rules combine the
//! returned fragments into lines.

use super::comprehension;
use crate::ast::*;
use crate::error::TranslateError;

type Result<T> = std::result::Result<T, TranslateError>;

/// Pure expression translator
#[derive(Debug, Clone, Copy, Default)]
pub struct ExprTranslator;

impl ExprTranslator {
    pub fn new() -> Self {
        Self
    }

    pub fn translate(&self, expr: &Expr) -> Result<String> {
        Ok(match &expr.kind {
            ExprKind::Name(id) => id.clone(),
            ExprKind::Int(digits) | ExprKind::Float(digits) => digits.clone(),
            ExprKind::Str { body, raw } => quote_single(body, *raw),
            ExprKind::FString(parts) => self.fstring(parts)?,
            ExprKind::Bool(true) => "true".to_string(),
            ExprKind::Bool(false) => "false".to_string(),
            ExprKind::None => "null".to_string(),
            ExprKind::BinOp { left, op, right } => self.binop(left, *op, right)?,
            ExprKind::UnaryOp { op, operand } => self.unary(*op, operand)?,
            ExprKind::BoolOp { op, values } => {
                let joiner = match op {
                    BoolOp::And => " && ",
                    BoolOp::Or => " || ",
                };
                format!("({})", self.joined(values, joiner)?)
            }
            ExprKind::Compare { left, ops, comparators } => self.compare(left, ops, comparators)?,
            ExprKind::Call { func, args } => {
                let callee = match func.as_name() {
                    Some("print") => "console.log".to_string(),
                    _ => self.translate(func)?,
                };
                format!("{}({})", callee, self.joined(args, ", ")?)
            }
            ExprKind::Attribute { value, attr } => format!("{}.{}", self.translate(value)?, attr),
            ExprKind::Subscript { value, index } => format!("{}[{}]", self.translate(value)?, self.translate(index)?),
            ExprKind::List(items) => format!("[{}]", self.joined(items, ", ")?),
            ExprKind::Tuple(items) => format!("({})", self.joined(items, ", ")?),
            ExprKind::Dict(entries) => {
                let entries = entries
                    .iter()
                    .map(|(key, value)| Ok(format!("{}: {}", self.key(key)?, self.translate(value)?)))
                    .collect::<Result<Vec<_>>>()?;
                format!("{{{}}}", entries.join(", "))
            }
            ExprKind::Starred(value) => format!("...{}", self.translate(value)?),
            ExprKind::Await(value) => format!("await {}", self.translate(value)?),
            ExprKind::IfExp { test, body, orelse } => format!(
                "({} ? {} : {})",
                self.translate(test)?,
                self.translate(body)?,
                self.translate(orelse)?
            ),
            ExprKind::ListComp(comp) | ExprKind::GeneratorExp(comp) => comprehension::desugar(self, comp)?,
        })
    }

    /// Render an assignment or loop target. Tuples and lists become array
    /// destructuring patterns.
    pub fn pattern(&self, target: &Expr) -> Result<String> {
        match &target.kind {
            ExprKind::Name(id) => Ok(id.clone()),
            ExprKind::Tuple(items) | ExprKind::List(items) => {
                let items = items.iter().map(|item| self.pattern(item)).collect::<Result<Vec<_>>>()?;
                Ok(format!("[{}]", items.join(", ")))
            }
            ExprKind::Starred(inner) => Ok(format!("...{}", self.pattern(inner)?)),
            ExprKind::Attribute { .. } | ExprKind::Subscript { .. } => self.translate(target),
            other => Err(TranslateError::structural(
                format!("cannot assign to `{}`", other.name()),
                target.span,
            )),
        }
    }

    /// Translate a value as an array literal when it is a bare tuple
    pub fn sequence(&self, value: &Expr) -> Result<String> {
        match &value.kind {
            ExprKind::Tuple(items) => Ok(format!("[{}]", self.joined(items, ", ")?)),
            _ => self.translate(value),
        }
    }

    fn joined(&self, exprs: &[Expr], separator: &str) -> Result<String> {
        let parts = exprs.iter().map(|e| self.translate(e)).collect::<Result<Vec<_>>>()?;
        Ok(parts.join(separator))
    }

    /// Literal keys stay as written; any other key is computed
    fn key(&self, key: &Expr) -> Result<String> {
        let text = self.translate(key)?;
        Ok(match key.kind {
            ExprKind::Str { .. } | ExprKind::Int(_) | ExprKind::Float(_) => text,
            _ => format!("[{}]", text),
        })
    }

    fn unary(&self, op: UnaryOp, operand: &Expr) -> Result<String> {
        let text = self.translate(operand)?;
        let sign = |op: UnaryOp| matches!(op, UnaryOp::USub | UnaryOp::UAdd);
        Ok(match &operand.kind {
            // `- -x` must not become `--x`
            ExprKind::UnaryOp { op: inner, .. } if sign(op) && sign(*inner) => {
                format!("{}({})", unary_symbol(op), text)
            }
            _ => format!("{}{}", unary_symbol(op), text),
        })
    }

    fn binop(&self, left: &Expr, op: BinOp, right: &Expr) -> Result<String> {
        let base = self.translate(left)?;
        // A unary operand directly before `**` is a syntax error
        let left = match left.kind {
            ExprKind::UnaryOp { .. } | ExprKind::Await(_) if op == BinOp::Pow => format!("({})", base),
            _ => base,
        };
        let right = self.translate(right)?;
        Ok(match op {
            BinOp::FloorDiv => format!("Math.floor({} / {})", left, right),
            _ => format!("({} {} {})", left, binop_symbol(op), right),
        })
    }

    fn compare(&self, left: &Expr, ops: &[CmpOp], comparators: &[Expr]) -> Result<String> {
        let mut operands = Vec::with_capacity(comparators.len() + 1);
        operands.push(self.translate(left)?);
        for comparator in comparators {
            operands.push(self.translate(comparator)?);
        }

        let links: Vec<String> = ops
            .iter()
            .zip(operands.windows(2))
            .map(|(op, pair)| comparison(*op, &pair[0], &pair[1]))
            .collect();

        Ok(match links.as_slice() {
            [single] => single.clone(),
            _ => format!("({})", links.join(" && ")),
        })
    }

    fn fstring(&self, parts: &[FStringPart]) -> Result<String> {
        let mut text = String::from("`");
        for part in parts {
            match part {
                FStringPart::Literal(literal) => text.push_str(&escape_template(literal)),
                FStringPart::Interpolation { expr, conversion, format_spec } => {
                    text.push_str("${");
                    text.push_str(&self.translate(expr)?);
                    text.push('}');
                    // Modifiers have no JavaScript meaning; kept as written
                    text.push_str(conversion.as_deref().unwrap_or_default());
                    text.push_str(format_spec.as_deref().unwrap_or_default());
                }
            }
        }
        text.push('`');
        Ok(text)
    }
}

fn binop_symbol(op: BinOp) -> &'static str {
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

fn unary_symbol(op: UnaryOp) -> &'static str {
    match op {
        UnaryOp::Not => "!",
        UnaryOp::USub => "-",
        UnaryOp::UAdd => "+",
        UnaryOp::Invert => "~",
    }
}

fn comparison(op: CmpOp, left: &str, right: &str) -> String {
    let symbol = match op {
        CmpOp::Eq => "==",
        CmpOp::NotEq => "!=",
        CmpOp::Lt => "<",
        CmpOp::LtE => "<=",
        CmpOp::Gt => ">",
        CmpOp::GtE => ">=",
        CmpOp::Is => "===",
        CmpOp::IsNot => "!==",
        CmpOp::In => return format!("{}.includes({})", right, left),
        CmpOp::NotIn => return format!("!{}.includes({})", right, left),
    };
    format!("({} {} {})", left, symbol, right)
}

/// Requote a Python string body with single quotes
fn quote_single(body: &str, raw: bool) -> String {
    let mut quoted = String::with_capacity(body.len() + 2);
    quoted.push('\'');
    let mut chars = body.chars();
    while let Some(c) = chars.next() {
        match c {
            '\\' if raw => quoted.push_str("\\\\"),
            '\\' => {
                quoted.push('\\');
                if let Some(escaped) = chars.next() {
                    quoted.push(escaped);
                }
            }
            '\'' => quoted.push_str("\\'"),
            '\n' => quoted.push_str("\\n"),
            '\r' => quoted.push_str("\\r"),
            _ => quoted.push(c),
        }
    }
    quoted.push('\'');
    quoted
}

/// Escape literal text for a template literal
fn escape_template(text: &str) -> String {
    text.replace('`', "\\`").replace("${", "\\${")
}
