//! Template rendering.
//!
//! Handlers receive a [`Templates`] value explicitly; there is no global
//! environment. A disabled instance fails every render with
//! [`TemplateError::Disabled`].

use std::path::Path;

use minijinja::{Environment, ErrorKind};
use serde::Serialize;
use thiserror::Error;

/// Errors surfaced by [`Templates::render`].
#[derive(Debug, Error)]
pub enum TemplateError {
    /// No template with this name exists.
    #[error("Template \"{0}\" not found")]
    NotFound(String),

    /// Templates are turned off in the application settings.
    #[error("Template engine is disabled by the application settings")]
    Disabled,

    /// The template failed to compile or render.
    #[error("Template error: {0}")]
    Render(#[from] minijinja::Error),
}

/// A template environment, or its disabled stand-in.
pub struct Templates {
    env: Option<Environment<'static>>,
}

impl Templates {
    /// An enabled environment with no templates registered.
    pub fn new() -> Self {
        Self {
            env: Some(Environment::new()),
        }
    }

    /// An enabled environment that loads templates from `dir` on demand.
    ///
    /// Templates whose names end in `.html` are auto-escaped.
    pub fn from_dir(dir: impl AsRef<Path>) -> Self {
        let mut env = Environment::new();
        env.set_loader(minijinja::path_loader(dir.as_ref().to_path_buf()));
        Self { env: Some(env) }
    }

    /// A renderer that refuses every request.
    pub fn disabled() -> Self {
        Self { env: None }
    }

    pub fn is_enabled(&self) -> bool {
        self.env.is_some()
    }

    /// Register a template from source.
    pub fn add_template(&mut self, name: impl Into<String>, source: impl Into<String>) -> Result<(), TemplateError> {
        let env = self.env.as_mut().ok_or(TemplateError::Disabled)?;
        env.add_template_owned(name.into(), source.into())?;
        Ok(())
    }

    /// Render the named template with `context`.
    pub fn render<S: Serialize>(&self, name: &str, context: S) -> Result<String, TemplateError> {
        let env = self.env.as_ref().ok_or(TemplateError::Disabled)?;
        let template = env.get_template(name).map_err(|e| match e.kind() {
            ErrorKind::TemplateNotFound => TemplateError::NotFound(name.to_string()),
            _ => TemplateError::Render(e),
        })?;
        Ok(template.render(context)?)
    }
}

impl Default for Templates {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_render_registered_template() {
        let mut templates = Templates::new();
        templates.add_template("hello.txt", "Hello {{ name }}!").unwrap();
        let rendered = templates.render("hello.txt", json!({ "name": "World" })).unwrap();
        assert_eq!(rendered, "Hello World!");
    }

    #[test]
    fn test_html_templates_are_escaped() {
        let mut templates = Templates::new();
        templates.add_template("page.html", "<p>{{ body }}</p>").unwrap();
        let rendered = templates.render("page.html", json!({ "body": "<b> & <i>" })).unwrap();
        assert_eq!(rendered, "<p>&lt;b&gt; &amp; &lt;i&gt;</p>");
    }

    #[test]
    fn test_missing_template() {
        let templates = Templates::new();
        let result = templates.render("missing.html", json!({}));
        assert!(matches!(result, Err(TemplateError::NotFound(ref name)) if name == "missing.html"));
    }

    #[test]
    fn test_disabled_renderer() {
        let mut templates = Templates::disabled();
        assert!(!templates.is_enabled());
        assert!(matches!(templates.render("index.html", json!({})), Err(TemplateError::Disabled)));
        assert!(matches!(templates.add_template("a", "b"), Err(TemplateError::Disabled)));
    }

    #[test]
    fn test_syntax_error_is_a_render_error() {
        let mut templates = Templates::new();
        assert!(matches!(
            templates.add_template("broken.txt", "{% if %}"),
            Err(TemplateError::Render(_))
        ));
    }

    #[test]
    fn test_load_from_directory() {
        let templates = Templates::from_dir(concat!(env!("CARGO_MANIFEST_DIR"), "/templates"));
        let rendered = templates.render("index.html", json!({})).unwrap();
        assert!(rendered.contains("<a href=\"/items\">"));
        assert!(matches!(
            templates.render("nope.html", json!({})),
            Err(TemplateError::NotFound(_))
        ));
    }
}
