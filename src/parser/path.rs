//! Field path grammar.
//!
//! A path addresses a field inside a parsed message: dot-separated segment
//! names, each optionally suffixed with a bracketed index for repeated
//! fields, e.g. `order.items[0].sku`.

use crate::{ConvertError, ConvertResult};

/// One path segment: a field name plus an optional repeated-field index
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathSegment {
    pub name: String,
    pub index: Option<usize>,
}

/// A parsed field path
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldPath {
    raw: String,
    segments: Vec<PathSegment>,
}

impl FieldPath {
    /// Parse a path expression
    pub fn parse(path: &str) -> ConvertResult<Self> {
        if path.is_empty() {
            return Err(ConvertError::invalid_path(path, "path is empty"));
        }

        let mut segments = Vec::new();
        for part in path.split('.') {
            if part.is_empty() {
                return Err(ConvertError::invalid_path(path, "empty path segment"));
            }
            segments.push(Self::parse_segment(path, part)?);
        }

        Ok(Self {
            raw: path.to_string(),
            segments,
        })
    }

    fn parse_segment(path: &str, part: &str) -> ConvertResult<PathSegment> {
        let Some(open) = part.find('[') else {
            if part.contains(']') {
                return Err(ConvertError::invalid_path(
                    path,
                    format!("unmatched ']' in segment '{part}'"),
                ));
            }
            return Ok(PathSegment {
                name: part.to_string(),
                index: None,
            });
        };

        let name = &part[..open];
        if name.is_empty() {
            return Err(ConvertError::invalid_path(
                path,
                format!("segment '{part}' has no field name"),
            ));
        }
        let rest = &part[open + 1..];
        let Some(close) = rest.find(']') else {
            return Err(ConvertError::invalid_path(
                path,
                format!("unterminated index in segment '{part}'"),
            ));
        };
        if !rest[close + 1..].is_empty() {
            return Err(ConvertError::invalid_path(
                path,
                format!("trailing characters after index in segment '{part}'"),
            ));
        }
        let index: usize = rest[..close].parse().map_err(|_| {
            ConvertError::invalid_path(path, format!("invalid index '{}'", &rest[..close]))
        })?;

        Ok(PathSegment {
            name: name.to_string(),
            index: Some(index),
        })
    }

    /// The original path expression
    pub fn raw(&self) -> &str {
        &self.raw
    }

    /// Segments in order
    pub fn segments(&self) -> &[PathSegment] {
        &self.segments
    }
}

impl std::fmt::Display for FieldPath {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.raw)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_simple_path() {
        let path = FieldPath::parse("first_name").unwrap();
        assert_eq!(path.segments().len(), 1);
        assert_eq!(path.segments()[0].name, "first_name");
        assert_eq!(path.segments()[0].index, None);
    }

    #[test]
    fn test_nested_indexed_path() {
        let path = FieldPath::parse("order.items[0].sku").unwrap();
        let segments = path.segments();
        assert_eq!(segments.len(), 3);
        assert_eq!(segments[0].name, "order");
        assert_eq!(segments[1].name, "items");
        assert_eq!(segments[1].index, Some(0));
        assert_eq!(segments[2].name, "sku");
    }

    #[test]
    fn test_empty_path_rejected() {
        assert!(FieldPath::parse("").is_err());
        assert!(FieldPath::parse("a..b").is_err());
        assert!(FieldPath::parse(".a").is_err());
    }

    #[test]
    fn test_malformed_index_rejected() {
        assert!(FieldPath::parse("items[").is_err());
        assert!(FieldPath::parse("items[x]").is_err());
        assert!(FieldPath::parse("items[1]x").is_err());
        assert!(FieldPath::parse("[0]").is_err());
        assert!(FieldPath::parse("items]").is_err());
    }
}
