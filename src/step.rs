//! Step value normalization
//!
//! A step template such as `Say "hello" to <name>` is reduced to a lookup key
//! where every parameter is replaced by the marker `{}`:
//! `Say {} to {}`. Two templates that only differ in parameter text share a
//! key, so a spec step written with concrete values resolves to the
//! implementation declared with placeholder names.
//!
//! Recognized parameter delimiters:
//! - `"..."`: static parameter; a backslash escapes the next character
//! - `<...>`: dynamic parameter placeholder
//!
//! The marker itself is plain text, which makes normalization idempotent.

use crate::error::{Result, RunnerError};

/// Marker token that replaces every parameter in a normalized key
pub const PARAMETER_MARKER: &str = "{}";

/// A parameter found in a step template
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StepParameter {
    /// Zero-based position among the template's parameters
    pub index: usize,

    /// Byte offset of this parameter's marker within the normalized key
    pub offset: usize,

    /// Literal text between the delimiters
    pub text: String,
}

/// Canonical form of a step template
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StepValue {
    /// Normalized lookup key
    pub key: String,

    /// Parameters in order of appearance
    pub parameters: Vec<StepParameter>,

    /// Template with every parameter rendered as `<text>`
    pub parameterized: String,
}

impl StepValue {
    /// Normalize a raw step template.
    ///
    /// Fails with [`RunnerError::MalformedTemplate`] on an unterminated quote
    /// or placeholder, an empty `<>`, or a `<` nested inside a placeholder.
    pub fn parse(template: &str) -> Result<Self> {
        let mut key = String::with_capacity(template.len());
        let mut parameterized = String::with_capacity(template.len());
        let mut parameters = Vec::new();
        let mut chars = template.chars();

        while let Some(c) = chars.next() {
            let text = match c {
                '"' => read_quoted(&mut chars)
                    .ok_or_else(|| malformed(template, "unterminated quote"))?,
                '<' => read_placeholder(template, &mut chars)?,
                other => {
                    key.push(other);
                    parameterized.push(other);
                    continue;
                }
            };

            parameters.push(StepParameter {
                index: parameters.len(),
                offset: key.len(),
                text: text.clone(),
            });
            key.push_str(PARAMETER_MARKER);
            parameterized.push('<');
            parameterized.push_str(&text);
            parameterized.push('>');
        }

        Ok(Self {
            key,
            parameters,
            parameterized,
        })
    }

    /// Number of parameters in the template
    pub fn parameter_count(&self) -> usize {
        self.parameters.len()
    }

    /// Parameter texts in order
    pub fn parameter_texts(&self) -> Vec<&str> {
        self.parameters.iter().map(|p| p.text.as_str()).collect()
    }
}

/// Normalize a template and return only its lookup key.
pub fn normalize(template: &str) -> Result<String> {
    StepValue::parse(template).map(|value| value.key)
}

/// Read a quoted segment after its opening `"`. `None` if unterminated.
fn read_quoted(chars: &mut std::str::Chars<'_>) -> Option<String> {
    let mut text = String::new();
    while let Some(c) = chars.next() {
        match c {
            '"' => return Some(text),
            '\\' => text.push(chars.next()?),
            other => text.push(other),
        }
    }
    None
}

/// Read a placeholder name after its opening `<`.
fn read_placeholder(template: &str, chars: &mut std::str::Chars<'_>) -> Result<String> {
    let mut text = String::new();
    for c in chars.by_ref() {
        match c {
            '>' if text.is_empty() => return Err(malformed(template, "empty placeholder")),
            '>' => return Ok(text),
            '<' => return Err(malformed(template, "nested placeholder")),
            other => text.push(other),
        }
    }
    Err(malformed(template, "unterminated placeholder"))
}

fn malformed(template: &str, reason: &str) -> RunnerError {
    RunnerError::MalformedTemplate {
        template: template.to_string(),
        reason: reason.to_string(),
    }
}
