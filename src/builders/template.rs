//! Key templates shared by the wide-column and key/value builders.
//!
//! A template mixes literal text with `{field.path}` placeholders, e.g.
//! `orders#{customer.id}#{order_id}`. Template syntax errors surface at
//! construction time as building errors; a placeholder naming a field the
//! schema does not have surfaces at render time as an unknown-field error.

use crate::parser::{FieldPath, ParsedMessage};
use crate::{ConvertError, ConvertResult};

#[derive(Debug, Clone)]
enum Segment {
    Literal(String),
    Placeholder(FieldPath),
}

/// A parsed key template
#[derive(Debug, Clone)]
pub(crate) struct Template {
    raw: String,
    segments: Vec<Segment>,
}

impl Template {
    /// Parse template text, validating placeholder path syntax up front
    pub(crate) fn parse(raw: &str) -> ConvertResult<Self> {
        let mut segments = Vec::new();
        let mut literal = String::new();
        let mut chars = raw.chars();

        while let Some(c) = chars.next() {
            if c != '{' {
                literal.push(c);
                continue;
            }
            if !literal.is_empty() {
                segments.push(Segment::Literal(std::mem::take(&mut literal)));
            }

            let mut path = String::new();
            let mut closed = false;
            for c in chars.by_ref() {
                if c == '}' {
                    closed = true;
                    break;
                }
                path.push(c);
            }
            if !closed {
                return Err(ConvertError::Build(format!(
                    "malformed template '{raw}': unclosed placeholder"
                )));
            }
            if path.is_empty() {
                return Err(ConvertError::Build(format!(
                    "malformed template '{raw}': empty placeholder"
                )));
            }
            let parsed = FieldPath::parse(&path).map_err(|e| {
                ConvertError::Build(format!("malformed template '{raw}': {e}"))
            })?;
            segments.push(Segment::Placeholder(parsed));
        }
        if !literal.is_empty() {
            segments.push(Segment::Literal(literal));
        }
        if segments.is_empty() {
            return Err(ConvertError::Build("template cannot be empty".to_string()));
        }

        Ok(Self {
            raw: raw.to_string(),
            segments,
        })
    }

    /// Render against one parsed message
    ///
    /// A placeholder whose path does not resolve in the schema fails with
    /// the path error; a resolvable but unset well-known field renders as
    /// the empty string.
    pub(crate) fn render(&self, parsed: &ParsedMessage) -> ConvertResult<String> {
        let mut out = String::new();
        for segment in &self.segments {
            match segment {
                Segment::Literal(text) => out.push_str(text),
                Segment::Placeholder(path) => {
                    if let Some(value) = parsed.get(path.raw())? {
                        out.push_str(&value.render());
                    }
                }
            }
        }
        Ok(out)
    }

    /// The original template text
    pub(crate) fn raw(&self) -> &str {
        &self.raw
    }
}
