//! AMBA: translate a subset of Python into JavaScript.
//!
//! ```
//! let js = amba_transpiler::translate("for i in range(3):\n    print(i)\n").unwrap();
//! assert_eq!(js, "for (let i = 0; i < 3; i++) {\n  console.log(i);\n}\n");
//! ```

pub mod ast;
pub mod error;
pub mod export;
pub mod generate;
pub mod html;
pub mod macros;
pub mod parser;

pub use error::{ErrorKind, TranslateError};
pub use export::export_js;
pub use generate::{GenerateOptions, Generator, JavaScriptGenerator, WithLowering};
pub use html::{EmbedOptions, HtmlEmbedder};
pub use parser::{Parser, PythonParser};

use serde::Serialize;

/// When the text macros run relative to tree translation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MacroPhase {
    /// Leave `%dqs{...}` and `%innerHTML{...}{...}` untouched
    Off,
    /// Expand on the Python source, so escapes must sit where Python expects an expression
    #[default]
    BeforeParse,
    /// Expand on the generated JavaScript
    AfterTranslate,
}

/// Configuration for translation.
#[derive(Debug, Clone)]
pub struct Options {
    /// Indentation unit, spaces or tabs only (default: two spaces)
    pub indent: String,
    pub with_lowering: WithLowering,
    pub macros: MacroPhase,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            indent: "  ".to_string(),
            with_lowering: WithLowering::default(),
            macros: MacroPhase::default(),
        }
    }
}

impl Options {
    fn validate(&self) -> Result<(), TranslateError> {
        if !self.indent.chars().all(|c| c == ' ' || c == '\t') {
            return Err(TranslateError::InvalidOptions(format!(
                "indent must contain only spaces or tabs, got {:?}",
                self.indent
            )));
        }
        Ok(())
    }

    fn generate_options(&self) -> GenerateOptions {
        GenerateOptions {
            indent: self.indent.clone(),
            with_lowering: self.with_lowering,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct TranslateResult {
    pub code: String,
    /// Top-level statements translated
    pub statements: usize,
}

/// Parse-then-generate pipeline with swappable stages
pub struct Pipeline {
    parser: Box<dyn Parser>,
    generator: Box<dyn Generator>,
}

impl Pipeline {
    pub fn new(parser: Box<dyn Parser>, generator: Box<dyn Generator>) -> Self {
        Self { parser, generator }
    }

    /// tree-sitter-python front end with the JavaScript generator
    pub fn standard() -> Self {
        Self::new(Box::new(PythonParser::new()), Box::new(JavaScriptGenerator::new()))
    }

    /// Translate one source text. Any failure aborts the whole call with no partial output.
    pub fn compile(&self, source: &str, options: &Options) -> Result<TranslateResult, TranslateError> {
        options.validate()?;

        let expanded;
        let source = if options.macros == MacroPhase::BeforeParse && macros::has_macros(source) {
            expanded = macros::expand(source);
            expanded.as_str()
        } else {
            source
        };

        let module = self.parser.parse(source)?;
        let generated = self.generator.generate(&module, &options.generate_options())?;

        let code = match options.macros {
            MacroPhase::AfterTranslate => macros::expand(&generated.code),
            _ => generated.code,
        };

        tracing::debug!(statements = generated.statements, bytes = code.len(), "translated module");
        Ok(TranslateResult { code, statements: generated.statements })
    }
}

impl Default for Pipeline {
    fn default() -> Self {
        Self::standard()
    }
}

/// Translate Python source to JavaScript with default options
pub fn translate(source: &str) -> Result<String, TranslateError> {
    translate_with(source, Options::default()).map(|result| result.code)
}

pub fn translate_with(source: &str, options: Options) -> Result<TranslateResult, TranslateError> {
    Pipeline::standard().compile(source, &options)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_simple() {
        assert_eq!(translate("x = 1 + 2\n").unwrap(), "let x = (1 + 2);\n");
    }

    #[test]
    fn test_statement_count() {
        let result = translate_with("a = 1\nb = 2\nprint(a)\n", Options::default()).unwrap();
        assert_eq!(result.statements, 3);
    }

    #[test]
    fn test_macros_before_parse() {
        let code = translate("el = %dqs{'#app'}\n").unwrap();
        assert_eq!(code, "let el = document.querySelector('#app');\n");
    }

    #[test]
    fn test_macros_after_translate() {
        let options = Options { macros: MacroPhase::AfterTranslate, ..Options::default() };
        let code = translate_with("x = '%dqs{'\n", options).unwrap().code;
        assert_eq!(code, "let x = '%dqs{';\n");
    }

    #[test]
    fn test_macros_off_keeps_escape() {
        let options = Options { macros: MacroPhase::Off, ..Options::default() };
        let err = translate_with("el = %dqs{'#app'}\n", options).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::MalformedInput);
    }

    #[test]
    fn test_invalid_indent() {
        let options = Options { indent: "--".to_string(), ..Options::default() };
        let err = translate_with("x = 1\n", options).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidOptions);
    }
}
