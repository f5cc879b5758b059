//! Page template system.
//!
//! This module provides:
//! - A small `{{...}}` template language: escaped `{{path}}` interpolation,
//!   `{{#each path}}` iteration, `{{#if path}}...{{else}}...{{/if}}`
//!   conditionals, and `{{> name}}` partial inclusion
//! - A registry that compiles every page file together with the shared base
//!   layout and partials at startup, once, into immutable executable sets
//!
//! Inclusions are resolved while the registry is built, so a [`CompiledPage`]
//! is a flat segment tree with no remaining file or name references. It never
//! touches the filesystem after build and is safe for unlimited concurrent
//! execution.
//!
//! Inside an `{{#each}}` body, paths resolve against the current element;
//! elsewhere they resolve against the payload root. A missing path is a
//! render error for `{{path}}` and `{{#each}}`, and simply falsey for
//! `{{#if}}` so pages can branch on optional payload fields.

mod parser;
mod registry;

pub use parser::ParseError;
pub use registry::{BuildError, TemplateRegistry};

use serde_json::Value;
use thiserror::Error;

/// Errors produced while executing a compiled page against a payload.
#[derive(Debug, Error)]
pub enum RenderError {
    #[error("payload has no value at '{0}'")]
    MissingValue(String),

    #[error("value at '{0}' is not a list")]
    NotAList(String),

    #[error("value at '{0}' cannot be rendered as text")]
    NotScalar(String),
}

/// One element of a compiled page. Unlike [`parser::Node`] there is no
/// include variant; the registry splices partials and the page body in
/// during the build.
#[derive(Debug, Clone)]
pub(crate) enum Segment {
    Text(String),
    Variable(Vec<String>),
    Each {
        path: Vec<String>,
        body: Vec<Segment>,
    },
    If {
        path: Vec<String>,
        then_body: Vec<Segment>,
        else_body: Vec<Segment>,
    },
}

/// An immutable, executable template set: base layout + partials + one page
/// body, fully linked. Built once at startup by [`TemplateRegistry::build`].
#[derive(Debug, Clone)]
pub struct CompiledPage {
    segments: Vec<Segment>,
}

impl CompiledPage {
    pub(crate) fn new(segments: Vec<Segment>) -> Self {
        Self { segments }
    }

    /// Execute this page against a payload, producing the full HTML body.
    pub fn render(&self, data: &Value) -> Result<String, RenderError> {
        let mut out = String::with_capacity(1024);
        render_segments(&self.segments, data, &mut out)?;
        Ok(out)
    }
}

fn render_segments(
    segments: &[Segment],
    context: &Value,
    out: &mut String,
) -> Result<(), RenderError> {
    for segment in segments {
        match segment {
            Segment::Text(text) => out.push_str(text),
            Segment::Variable(path) => {
                let value = lookup(context, path)
                    .filter(|v| !v.is_null())
                    .ok_or_else(|| RenderError::MissingValue(path.join(".")))?;
                render_scalar(value, path, out)?;
            }
            Segment::Each { path, body } => {
                let value = lookup(context, path)
                    .ok_or_else(|| RenderError::MissingValue(path.join(".")))?;
                let items = value
                    .as_array()
                    .ok_or_else(|| RenderError::NotAList(path.join(".")))?;
                for item in items {
                    render_segments(body, item, out)?;
                }
            }
            Segment::If {
                path,
                then_body,
                else_body,
            } => {
                let branch = if lookup(context, path).map(is_truthy).unwrap_or(false) {
                    then_body
                } else {
                    else_body
                };
                render_segments(branch, context, out)?;
            }
        }
    }
    Ok(())
}

fn render_scalar(value: &Value, path: &[String], out: &mut String) -> Result<(), RenderError> {
    match value {
        Value::String(s) => escape_html(s, out),
        Value::Number(n) => out.push_str(&n.to_string()),
        Value::Bool(b) => out.push_str(if *b { "true" } else { "false" }),
        Value::Null | Value::Array(_) | Value::Object(_) => {
            return Err(RenderError::NotScalar(path.join(".")));
        }
    }
    Ok(())
}

fn lookup<'a>(context: &'a Value, path: &[String]) -> Option<&'a Value> {
    let mut current = context;
    for segment in path {
        current = current.as_object()?.get(segment)?;
    }
    Some(current)
}

fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().map(|f| f != 0.0).unwrap_or(true),
        Value::String(s) => !s.is_empty(),
        Value::Array(items) => !items.is_empty(),
        Value::Object(_) => true,
    }
}

fn escape_html(input: &str, out: &mut String) {
    for c in input.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
}
