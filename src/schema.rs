//! Structural validation of inbound payloads.
//!
//! A schema is plain data: a tree of [`Shape`]s naming the JSON kind each
//! position must have and which object keys are required. [`validate`] walks
//! the tree and reports the first constraint the document violates.

use serde_json::Value;

/// Expected JSON kind at one position of a document.
#[derive(Debug, Clone, Copy)]
pub enum Shape {
    String,
    /// Array with unconstrained elements.
    Array,
    Object(&'static [Field]),
}

/// One key of an object shape.
#[derive(Debug, Clone, Copy)]
pub struct Field {
    pub name: &'static str,
    pub shape: Shape,
    pub required: bool,
}

impl Shape {
    fn describe(self) -> &'static str {
        match self {
            Shape::String => "string",
            Shape::Array => "array",
            Shape::Object(_) => "object",
        }
    }

    fn matches(self, value: &Value) -> bool {
        match self {
            Shape::String => value.is_string(),
            Shape::Array => value.is_array(),
            Shape::Object(_) => value.is_object(),
        }
    }
}

static REPOSITORY_FIELDS: [Field; 1] = [Field {
    name: "name",
    shape: Shape::String,
    required: true,
}];

static PUSH_EVENT_FIELDS: [Field; 3] = [
    Field {
        name: "repository",
        shape: Shape::Object(&REPOSITORY_FIELDS),
        required: true,
    },
    Field {
        name: "ref",
        shape: Shape::String,
        required: true,
    },
    Field {
        name: "commits",
        shape: Shape::Array,
        required: true,
    },
];

/// Contract for `push` deliveries.
pub static PUSH_EVENT: Shape = Shape::Object(&PUSH_EVENT_FIELDS);

/// Checks `document` against `shape`, returning a description of the first
/// violation.
pub fn validate(document: &Value, shape: Shape) -> Result<(), String> {
    check(document, shape, "$")
}

fn check(value: &Value, shape: Shape, path: &str) -> Result<(), String> {
    if !shape.matches(value) {
        return Err(format!(
            "{} is not of type '{}' at {}",
            value,
            shape.describe(),
            path
        ));
    }

    if let (Shape::Object(fields), Some(map)) = (shape, value.as_object()) {
        for field in fields {
            let child_path = format!("{}.{}", path, field.name);
            match map.get(field.name) {
                Some(child) => check(child, field.shape, &child_path)?,
                None if field.required => {
                    return Err(format!(
                        "'{}' is a required property at {}",
                        field.name, path
                    ));
                }
                None => {}
            }
        }
    }

    Ok(())
}
