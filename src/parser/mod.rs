pub mod positions;
mod tree_builder;

use tree_builder::TreeBuilder;

use crate::ast::Module;
use crate::error::TranslateError;
use tree_sitter::Node;

/// Parser trait - converts source code to AST
pub trait Parser {
    fn parse(&self, source: &str) -> Result<Module, TranslateError>;
}

/// Python parser backed by tree-sitter-python
pub struct PythonParser {
    // Configuration only, no state
}

impl PythonParser {
    pub fn new() -> Self {
        Self {}
    }
}

impl Default for PythonParser {
    fn default() -> Self {
        Self::new()
    }
}

impl Parser for PythonParser {
    fn parse(&self, source: &str) -> Result<Module, TranslateError> {
        let mut parser = tree_sitter::Parser::new();
        parser
            .set_language(&tree_sitter_python::LANGUAGE.into())
            .map_err(|e| TranslateError::Internal(format!("failed to load Python grammar: {}", e)))?;

        let tree = parser
            .parse(source, None)
            .ok_or_else(|| TranslateError::Internal("tree-sitter produced no tree".to_string()))?;
        let root = tree.root_node();

        if root.has_error() {
            return Err(syntax_error(source, root));
        }

        let body = TreeBuilder::new(source).build(root)?;
        tracing::debug!(statements = body.len(), bytes = source.len(), "parsed module");

        Ok(Module::new(body))
    }
}

/// Build a MalformedInput error pointing at the first ERROR or MISSING node
fn syntax_error(source: &str, root: Node<'_>) -> TranslateError {
    let node = first_error(root).unwrap_or(root);
    let message = if node.is_missing() {
        format!("missing `{}`", node.kind())
    } else {
        "invalid syntax".to_string()
    };
    TranslateError::malformed(message, positions::span_of(source, node))
}

fn first_error(node: Node<'_>) -> Option<Node<'_>> {
    if node.is_error() || node.is_missing() {
        return Some(node);
    }
    if !node.has_error() {
        return None;
    }
    let mut cursor = node.walk();
    let children: Vec<_> = node.children(&mut cursor).collect();
    children.into_iter().find_map(first_error)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::{ExprKind, StmtKind};
    use crate::error::ErrorKind;

    #[test]
    fn test_parse_module() {
        let module = PythonParser::new().parse("x = 1\nprint(x)\n").unwrap();
        assert_eq!(module.body.len(), 2);
        assert!(matches!(module.body[0].kind, StmtKind::Assign { .. }));
        assert!(matches!(&module.body[1].kind, StmtKind::Expr(e) if matches!(e.kind, ExprKind::Call { .. })));
    }

    #[test]
    fn test_syntax_error_is_malformed() {
        let err = PythonParser::new().parse("x = (1 +\n").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::MalformedInput);
    }

    #[test]
    fn test_comments_are_skipped() {
        let module = PythonParser::new().parse("# header\nx = 1  # trailing\n").unwrap();
        assert_eq!(module.body.len(), 1);
    }
}
