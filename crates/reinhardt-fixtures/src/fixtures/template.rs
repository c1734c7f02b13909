//! Template pre-pass applied to fixture documents before parsing.

use std::error::Error as StdError;

use serde::Serialize;
use tera::{Context, Tera};
use thiserror::Error;

/// Failure of the template pre-pass.
#[derive(Debug, Error)]
pub enum TemplateError {
	/// Tera rejected the document
	#[error("{}", error_chain(.0))]
	Tera(#[from] tera::Error),

	/// A custom renderer failed
	#[error(transparent)]
	Other(#[from] Box<dyn StdError + Send + Sync>),
}

/// Renders the raw text of a fixture document.
pub trait TemplateRenderer: Send + Sync {
	/// Renders `content`, returning the text handed to the format parser.
	fn render(&self, content: &str) -> Result<String, TemplateError>;
}

/// Renderer that returns documents unchanged.
#[derive(Debug, Default, Clone, Copy)]
pub struct PlainRenderer;

impl TemplateRenderer for PlainRenderer {
	fn render(&self, content: &str) -> Result<String, TemplateError> {
		Ok(content.to_string())
	}
}

/// Renders fixture documents as Tera templates.
///
/// ```
/// use reinhardt_fixtures::fixtures::{TemplateRenderer, TeraRenderer};
///
/// let renderer = TeraRenderer::new().with_var("domain", "example.com");
/// let rendered = renderer
///     .render("{% for i in range(end=2) %}user_{{ i }}:\n  email: u{{ i }}@{{ domain }}\n{% endfor %}")
///     .unwrap();
/// assert!(rendered.contains("user_1:\n  email: u1@example.com"));
/// ```
#[derive(Debug, Default, Clone)]
pub struct TeraRenderer {
	context: Context,
}

impl TeraRenderer {
	/// Creates a renderer with an empty context.
	pub fn new() -> Self {
		Self::default()
	}

	/// Makes a variable available to every fixture template.
	pub fn with_var<T: Serialize + ?Sized>(mut self, key: impl Into<String>, value: &T) -> Self {
		self.context.insert(key, value);
		self
	}
}

impl TemplateRenderer for TeraRenderer {
	fn render(&self, content: &str) -> Result<String, TemplateError> {
		Ok(Tera::one_off(content, &self.context, false)?)
	}
}

/// Joins an error with all of its sources; Tera keeps the useful detail there.
fn error_chain(error: &dyn StdError) -> String {
	let mut message = error.to_string();
	let mut source = error.source();
	while let Some(cause) = source {
		message.push_str(": ");
		message.push_str(&cause.to_string());
		source = cause.source();
	}
	message
}
