//! Markup embedding: Python inside a custom tag becomes a `<script>` block.
//!
//! Everything outside the tagged regions is copied through byte for byte.

use crate::error::TranslateError;
use crate::{Options, Pipeline};
use regex::Regex;

/// Configuration for [`HtmlEmbedder`]
#[derive(Debug, Clone)]
pub struct EmbedOptions {
    /// Tag that marks embedded Python (default: `jiminy`)
    pub tag_name: String,
    /// Wrapper for each generated block; `{}` marks where the code goes
    pub template: String,
}

impl Default for EmbedOptions {
    fn default() -> Self {
        Self {
            tag_name: "jiminy".to_string(),
            template: "{}".to_string(),
        }
    }
}

pub struct HtmlEmbedder {
    pattern: Regex,
    template: String,
    options: Options,
    pipeline: Pipeline,
}

impl HtmlEmbedder {
    pub fn new(embed: EmbedOptions, options: Options) -> Result<Self, TranslateError> {
        if embed.tag_name.is_empty() {
            return Err(TranslateError::InvalidOptions("tag name must not be empty".to_string()));
        }
        if !embed.template.contains("{}") {
            return Err(TranslateError::InvalidOptions(format!(
                "template {:?} has no `{{}}` slot",
                embed.template
            )));
        }

        let tag = regex::escape(&embed.tag_name);
        let pattern = Regex::new(&format!("(?s)<{tag}>(.+?)</{tag}>"))
            .map_err(|e| TranslateError::InvalidOptions(format!("bad tag name: {}", e)))?;

        Ok(Self {
            pattern,
            template: embed.template,
            options,
            pipeline: Pipeline::standard(),
        })
    }

    /// Replace every tagged region with its translated `<script>` block
    pub fn embed(&self, html: &str) -> Result<String, TranslateError> {
        let mut output = String::with_capacity(html.len());
        let mut last = 0;
        let mut blocks = 0;

        for captures in self.pattern.captures_iter(html) {
            let (Some(region), Some(body)) = (captures.get(0), captures.get(1)) else {
                continue;
            };

            let source = dedent(body.as_str());
            let code = self.pipeline.compile(&source, &self.options)?.code;

            output.push_str(&html[last..region.start()]);
            output.push_str("<script>");
            output.push_str(&self.template.replacen("{}", &code, 1));
            output.push_str("</script>");
            last = region.end();
            blocks += 1;
        }
        output.push_str(&html[last..]);

        tracing::debug!(blocks, "embedded python regions");
        Ok(output)
    }
}

/// Strip blank edges and the indentation shared by every non-blank line
fn dedent(text: &str) -> String {
    let lines: Vec<&str> = text.lines().collect();
    let start = lines.iter().position(|l| !l.trim().is_empty()).unwrap_or(lines.len());
    let end = lines.iter().rposition(|l| !l.trim().is_empty()).map_or(start, |i| i + 1);
    let lines = &lines[start..end];

    let margin = lines
        .iter()
        .filter(|l| !l.trim().is_empty())
        .map(|l| l.len() - l.trim_start().len())
        .min()
        .unwrap_or(0);

    let mut source = String::new();
    for line in lines {
        source.push_str(line.get(margin..).unwrap_or("").trim_end());
        source.push('\n');
    }
    source
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    #[test]
    fn test_dedent() {
        assert_eq!(dedent("\n    a = 1\n    if a:\n        b\n  "), "a = 1\nif a:\n    b\n");
        assert_eq!(dedent("x = 1"), "x = 1\n");
        assert_eq!(dedent("   \n"), "");
    }

    #[test]
    fn test_template_without_slot() {
        let embed = EmbedOptions { template: "no slot".to_string(), ..EmbedOptions::default() };
        let err = HtmlEmbedder::new(embed, Options::default()).err().unwrap();
        assert_eq!(err.kind(), ErrorKind::InvalidOptions);
    }

    #[test]
    fn test_tag_name_is_literal() {
        let embed = EmbedOptions { tag_name: "py.x".to_string(), ..EmbedOptions::default() };
        let embedder = HtmlEmbedder::new(embed, Options::default()).unwrap();
        let html = "<pyax>x = 1</pyax><py.x>y = 2</py.x>";
        assert_eq!(embedder.embed(html).unwrap(), "<pyax>x = 1</pyax><script>let y = 2;\n</script>");
    }
}
