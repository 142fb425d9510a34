//! List comprehensions and generator expressions as array method chains.
//!
//! `[e for x in xs if c]` becomes `xs.filter((x) => c).map((x) => e)`. Each
//! further `for` clause nests through `.flatMap`.

use super::expr::ExprTranslator;
use crate::ast::{Clause, Comprehension, Expr, ExprKind};
use crate::error::TranslateError;

/// One `for` clause with the `if` clauses that follow it
struct Loop<'a> {
    target: &'a Expr,
    iter: &'a Expr,
    conditions: Vec<&'a Expr>,
}

pub(super) fn desugar(exprs: &ExprTranslator, comp: &Comprehension) -> Result<String, TranslateError> {
    let mut loops: Vec<Loop<'_>> = Vec::new();
    for clause in &comp.clauses {
        match clause {
            Clause::For { target, iter } => loops.push(Loop { target, iter, conditions: Vec::new() }),
            Clause::If(condition) => match loops.last_mut() {
                Some(current) => current.conditions.push(condition),
                None => {
                    return Err(TranslateError::structural(
                        "comprehension condition before its `for` clause",
                        condition.span,
                    ));
                }
            },
        }
    }

    if loops.is_empty() {
        return Err(TranslateError::structural("comprehension without a `for` clause", comp.element.span));
    }

    chain(exprs, &loops, &comp.element)
}

fn chain(exprs: &ExprTranslator, loops: &[Loop<'_>], element: &Expr) -> Result<String, TranslateError> {
    let Some((current, rest)) = loops.split_first() else {
        return arrow_body(exprs, element);
    };

    let params = format!("({})", exprs.pattern(current.target)?);
    let mut text = source(exprs, current.iter)?;

    for condition in &current.conditions {
        text.push_str(&format!(".filter({} => {})", params, arrow_body(exprs, condition)?));
    }

    let method = if rest.is_empty() { "map" } else { "flatMap" };
    text.push_str(&format!(".{}({} => {})", method, params, chain(exprs, rest, element)?));
    Ok(text)
}

/// A bare `{` after `=>` opens a block, so object literals are wrapped
fn arrow_body(exprs: &ExprTranslator, expr: &Expr) -> Result<String, TranslateError> {
    let text = exprs.translate(expr)?;
    Ok(match expr.kind {
        ExprKind::Dict(_) => format!("({})", text),
        _ => text,
    })
}

/// Iterable text, parenthesized where a method call would bind too tightly
fn source(exprs: &ExprTranslator, iter: &Expr) -> Result<String, TranslateError> {
    let text = exprs.translate(iter)?;
    Ok(match iter.kind {
        ExprKind::Await(_) | ExprKind::UnaryOp { .. } => format!("({})", text),
        _ => text,
    })
}

#[cfg(test)]
mod tests {
    use crate::ast::StmtKind;
    use crate::generate::ExprTranslator;
    use crate::parser::{Parser, PythonParser};

    fn js(source: &str) -> String {
        let module = PythonParser::new().parse(source).unwrap();
        let StmtKind::Expr(expr) = &module.body[0].kind else { panic!("expected expression statement") };
        ExprTranslator::new().translate(expr).unwrap()
    }

    #[test]
    fn test_map_only() {
        assert_eq!(js("[x * 2 for x in nums]\n"), "nums.map((x) => (x * 2))");
    }

    #[test]
    fn test_filter_before_map() {
        assert_eq!(
            js("[x for x in nums if x > 1 if x < 9]\n"),
            "nums.filter((x) => (x > 1)).filter((x) => (x < 9)).map((x) => x)"
        );
    }

    #[test]
    fn test_tuple_target_destructures() {
        assert_eq!(
            js("[k for k, v in pairs if v]\n"),
            "pairs.filter(([k, v]) => v).map(([k, v]) => k)"
        );
    }

    #[test]
    fn test_nested_for_uses_flat_map() {
        assert_eq!(
            js("[x + y for x in xs for y in ys]\n"),
            "xs.flatMap((x) => ys.map((y) => (x + y)))"
        );
    }

    #[test]
    fn test_dict_element_is_parenthesized() {
        assert_eq!(js("[{'a': x} for x in xs]\n"), "xs.map((x) => ({'a': x}))");
        assert_eq!(
            js("[{k: v} for k in ks for v in vs]\n"),
            "ks.flatMap((k) => vs.map((v) => ({[k]: v})))"
        );
    }

    #[test]
    fn test_generator_expression_same_chain() {
        assert_eq!(js("(n * n for n in values)\n"), "values.map((n) => (n * n))");
        assert_eq!(js("sum(n for n in values if n)\n"), "sum(values.filter((n) => n).map((n) => n))");
    }
}
