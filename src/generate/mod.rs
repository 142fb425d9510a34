mod comprehension;
mod expr;
mod javascript;
mod output;

pub use expr::ExprTranslator;
pub use javascript::{JavaScriptGenerator, JsEmitter};
pub use output::Output;

use crate::ast::Module;
use crate::error::TranslateError;

/// How `with` blocks are lowered
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum WithLowering {
    /// Object-literal `with ({ resource: alias, }) { ... }` block
    #[default]
    PseudoWith,
    /// Block scope with `using alias = resource;` declarations
    Using,
}

/// Generator options
#[derive(Debug, Clone)]
pub struct GenerateOptions {
    /// Indentation unit repeated once per nesting level
    pub indent: String,
    pub with_lowering: WithLowering,
}

impl Default for GenerateOptions {
    fn default() -> Self {
        Self {
            indent: "  ".to_string(),
            with_lowering: WithLowering::default(),
        }
    }
}

/// Generation result
#[derive(Debug, Clone)]
pub struct GenerateResult {
    pub code: String,
    /// Top-level statements translated
    pub statements: usize,
}

/// Generator trait - converts AST to code
pub trait Generator {
    fn generate(&self, module: &Module, options: &GenerateOptions) -> Result<GenerateResult, TranslateError>;
}
