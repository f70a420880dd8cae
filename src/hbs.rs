//! Handlebars pass applied before and/or after the pug conversion.

use handlebars::{no_escape, Handlebars};
use serde::Serialize;

use std::fmt;

use crate::RenderError;

/// Secondary templating engine based on [Handlebars].
///
/// The engine runs in two places of the pipeline: executing a loaded template against
/// the render context before the text reaches the pug CLI, and post-processing the
/// CLI output. HTML escaping is disabled since the processed text is markup already;
/// strict mode is off, so a placeholder without a matching context key renders as an
/// empty string (the same as an undefined Jinja-style variable would).
///
/// [Handlebars]: https://handlebarsjs.com/
///
/// # Examples
///
/// ```
/// use pug_bridge::HbsEngine;
/// use serde_json::json;
///
/// # fn main() -> anyhow::Result<()> {
/// let engine = HbsEngine::new();
/// let html = engine.render_str("<h1>hello {{ name }}</h1>", &json!({ "name": "fred" }))?;
/// assert_eq!(html, "<h1>hello fred</h1>");
/// # Ok(())
/// # }
/// ```
pub struct HbsEngine {
    handlebars: Handlebars<'static>,
}

impl fmt::Debug for HbsEngine {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.debug_struct("HbsEngine").finish_non_exhaustive()
    }
}

impl Default for HbsEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl HbsEngine {
    /// Initializes the engine.
    pub fn new() -> Self {
        let mut handlebars = Handlebars::new();
        handlebars.set_strict_mode(false);
        handlebars.register_escape_fn(no_escape);
        Self { handlebars }
    }

    /// Renders `text` as a one-off template against the provided `context`.
    ///
    /// # Errors
    ///
    /// Returns an error if `text` is not a valid Handlebars template or rendering
    /// fails.
    #[cfg_attr(
        feature = "tracing",
        tracing::instrument(level = "debug", skip_all, err)
    )]
    pub fn render_str(
        &self,
        text: &str,
        context: &impl Serialize,
    ) -> Result<String, RenderError> {
        Ok(self.handlebars.render_template(text, context)?)
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn interpolating_context_value() {
        let engine = HbsEngine::new();
        let html = engine
            .render_str("<h1>hello {{ name }}!</h1>", &json!({ "name": "sam" }))
            .unwrap();
        assert_eq!(html, "<h1>hello sam!</h1>");
    }

    #[test]
    fn unmatched_placeholder_renders_empty() {
        let engine = HbsEngine::new();
        let html = engine.render_str("<h1>hello {{ name }}!</h1>", &json!({})).unwrap();
        assert_eq!(html, "<h1>hello !</h1>");
    }

    #[test]
    fn markup_is_not_escaped() {
        let engine = HbsEngine::new();
        let context = json!({ "body": "<p>1 < 2 && 3 > 2</p>" });
        let html = engine.render_str("{{ body }}", &context).unwrap();
        assert_eq!(html, "<p>1 < 2 && 3 > 2</p>");
    }

    #[test]
    fn conditional_with_nested_context_access() {
        let engine = HbsEngine::new();
        let template = r#"{{#if (eq person.name "sam")}}<h1>hello {{ person.name }}</h1>{{/if}}"#;

        let html = engine
            .render_str(template, &json!({ "person": { "name": "sam" } }))
            .unwrap();
        assert_eq!(html, "<h1>hello sam</h1>");

        let html = engine
            .render_str(template, &json!({ "person": { "name": "fred" } }))
            .unwrap();
        assert_eq!(html, "");
    }
}
