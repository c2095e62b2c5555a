//! URI patterns of the `http` trait
//!
//! `/things/{thingId}/children/{rest+}?tag=1`: path segments are literals or
//! labels, a label ending in `+` is greedy. Labels may not appear in the
//! query string.

use crate::domain::id::is_valid_identifier;
use std::fmt;
use thiserror::Error;

#[derive(Debug, Error, PartialEq)]
pub enum UriPatternError {
    #[error("URI pattern must start with '/': '{0}'")]
    MissingLeadingSlash(String),

    #[error("Invalid URI label in segment '{0}'")]
    InvalidLabel(String),

    #[error("Duplicate URI label '{0}'")]
    DuplicateLabel(String),

    #[error("At most one greedy label is allowed in a URI pattern: '{0}'")]
    MultipleGreedyLabels(String),

    #[error("Labels are not allowed in the query string of a URI pattern: '{0}'")]
    LabelInQuery(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment {
    Literal(String),
    Label(UriLabel),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UriLabel {
    pub name: String,
    pub greedy: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UriPattern {
    pattern: String,
    segments: Vec<Segment>,
    query: Option<String>,
}

impl UriPattern {
    pub fn parse(pattern: &str) -> Result<Self, UriPatternError> {
        if !pattern.starts_with('/') {
            return Err(UriPatternError::MissingLeadingSlash(pattern.to_string()));
        }

        let (path, query) = match pattern.split_once('?') {
            Some((path, query)) => (path, Some(query)),
            None => (pattern, None),
        };

        if let Some(query) = query {
            if query.contains('{') || query.contains('}') {
                return Err(UriPatternError::LabelInQuery(pattern.to_string()));
            }
        }

        let mut segments = Vec::new();
        let mut seen_greedy = false;
        for raw in path[1..].split('/').filter(|s| !s.is_empty()) {
            if let Some(inner) = raw.strip_prefix('{').and_then(|s| s.strip_suffix('}')) {
                let (name, greedy) = match inner.strip_suffix('+') {
                    Some(name) => (name, true),
                    None => (inner, false),
                };
                if !is_valid_identifier(name) {
                    return Err(UriPatternError::InvalidLabel(raw.to_string()));
                }
                if segments
                    .iter()
                    .any(|s| matches!(s, Segment::Label(l) if l.name == name))
                {
                    return Err(UriPatternError::DuplicateLabel(name.to_string()));
                }
                if greedy {
                    if seen_greedy {
                        return Err(UriPatternError::MultipleGreedyLabels(pattern.to_string()));
                    }
                    seen_greedy = true;
                }
                segments.push(Segment::Label(UriLabel {
                    name: name.to_string(),
                    greedy,
                }));
            } else if raw.contains('{') || raw.contains('}') {
                return Err(UriPatternError::InvalidLabel(raw.to_string()));
            } else {
                segments.push(Segment::Literal(raw.to_string()));
            }
        }

        Ok(Self {
            pattern: pattern.to_string(),
            segments,
            query: query.map(str::to_string),
        })
    }

    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    pub fn query(&self) -> Option<&str> {
        self.query.as_deref()
    }

    /// Returns the labels of the pattern in path order
    pub fn labels(&self) -> impl Iterator<Item = &UriLabel> {
        self.segments.iter().filter_map(|s| match s {
            Segment::Label(label) => Some(label),
            Segment::Literal(_) => None,
        })
    }

    pub fn label(&self, name: &str) -> Option<&UriLabel> {
        self.labels().find(|l| l.name == name)
    }
}

impl fmt::Display for UriPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.pattern)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_labels_and_literals() {
        let uri = UriPattern::parse("/things/{thingId}/files/{path+}?list=true").unwrap();
        assert_eq!(uri.segments().len(), 4);
        assert_eq!(uri.query(), Some("list=true"));
        let labels: Vec<&str> = uri.labels().map(|l| l.name.as_str()).collect();
        assert_eq!(labels, vec!["thingId", "path"]);
        assert!(uri.label("path").unwrap().greedy);
        assert!(!uri.label("thingId").unwrap().greedy);
        assert_eq!(uri.to_string(), "/things/{thingId}/files/{path+}?list=true");
    }

    #[test]
    fn root_pattern_has_no_segments() {
        let uri = UriPattern::parse("/").unwrap();
        assert!(uri.segments().is_empty());
    }

    #[test]
    fn rejects_malformed_patterns() {
        assert!(matches!(
            UriPattern::parse("things"),
            Err(UriPatternError::MissingLeadingSlash(_))
        ));
        assert!(matches!(
            UriPattern::parse("/a{b}"),
            Err(UriPatternError::InvalidLabel(_))
        ));
        assert!(matches!(
            UriPattern::parse("/{a}/{a}"),
            Err(UriPatternError::DuplicateLabel(_))
        ));
        assert!(matches!(
            UriPattern::parse("/{a+}/{b+}"),
            Err(UriPatternError::MultipleGreedyLabels(_))
        ));
        assert!(matches!(
            UriPattern::parse("/a?x={b}"),
            Err(UriPatternError::LabelInQuery(_))
        ));
    }
}
