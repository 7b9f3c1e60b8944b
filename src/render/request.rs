//! Validation of untyped tool arguments.
//!
//! Tool arguments arrive as arbitrary JSON. This module narrows them into a
//! well-typed [`GenerateImageRequest`] or a structured [`InvalidRequest`]
//! value. Validation runs before any filesystem or process work, so a
//! rejected request has no side effects.

use serde_json::Value;
use thiserror::Error;

/// A validated `generate_image` request.
///
/// Request-scoped; constructed once per tool call and discarded when the
/// call completes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerateImageRequest {
    /// Raw Mermaid diagram source text.
    pub code: String,
    /// Output base name, without extension.
    pub name: String,
    /// Optional output directory. When absent the configured default is
    /// used.
    pub folder: Option<String>,
}

/// Why a request failed validation.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum InvalidRequest {
    /// Arguments were not a JSON object.
    #[error("tool arguments must be an object")]
    NotAnObject,

    /// A required field is absent.
    #[error("missing required parameter: {0}")]
    MissingField(&'static str),

    /// A field is present but has the wrong type.
    #[error("parameter '{0}' must be a string")]
    NotAString(&'static str),
}

impl GenerateImageRequest {
    /// Narrows untyped tool arguments into a typed request.
    ///
    /// `code` and `name` are required strings; `folder` is an optional
    /// string. No restrictions are placed on the diagram text itself; its
    /// correctness is the renderer's concern.
    ///
    /// # Errors
    ///
    /// Returns [`InvalidRequest`] describing the first rule violated.
    pub fn parse(arguments: &Value) -> Result<Self, InvalidRequest> {
        let obj = arguments.as_object().ok_or(InvalidRequest::NotAnObject)?;

        let code = required_string(obj, "code")?;
        let name = required_string(obj, "name")?;

        let folder = match obj.get("folder") {
            None | Some(Value::Null) => None,
            Some(Value::String(s)) => Some(s.clone()),
            Some(_) => return Err(InvalidRequest::NotAString("folder")),
        };

        Ok(Self { code, name, folder })
    }
}

fn required_string(
    obj: &serde_json::Map<String, Value>,
    field: &'static str,
) -> Result<String, InvalidRequest> {
    match obj.get(field) {
        None | Some(Value::Null) => Err(InvalidRequest::MissingField(field)),
        Some(Value::String(s)) => Ok(s.clone()),
        Some(_) => Err(InvalidRequest::NotAString(field)),
    }
}
