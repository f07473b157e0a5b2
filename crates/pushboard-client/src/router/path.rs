//! Path patterns, parsed locations and path builders.

use std::collections::BTreeMap;

use percent_encoding::{percent_decode_str, utf8_percent_encode, AsciiSet, CONTROLS};

use pushboard_shared::AppId;

/// Characters escaped inside a single path segment.
pub const SEGMENT: &AsciiSet = &CONTROLS
    .add(b' ')
    .add(b'"')
    .add(b'#')
    .add(b'%')
    .add(b'/')
    .add(b'<')
    .add(b'>')
    .add(b'?')
    .add(b'`')
    .add(b'{')
    .add(b'}');

/// One segment of a route pattern.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment {
    Static(String),
    /// `$name` placeholder binding one URL segment.
    Param(String),
}

/// How a route node consumes the URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RoutePath {
    /// Consumes nothing and never ends a match (layouts).
    Pathless,
    /// Matches only once the whole URL has been consumed.
    Index,
    Segments(Vec<Segment>),
}

impl RoutePath {
    /// Parse `"releases/$label"` style patterns. `"/"` and `""` are the index.
    pub fn parse(pattern: &str) -> Self {
        let segments: Vec<Segment> = pattern
            .split('/')
            .filter(|s| !s.is_empty())
            .map(|s| match s.strip_prefix('$') {
                Some(name) => Segment::Param(name.to_string()),
                None => Segment::Static(s.to_string()),
            })
            .collect();

        if segments.is_empty() {
            Self::Index
        } else {
            Self::Segments(segments)
        }
    }
}

/// Parameters bound while matching.
pub type Params = BTreeMap<String, String>;

/// A parsed navigation target.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Location {
    /// Normalised path: leading slash, no trailing slash, no query.
    pub pathname: String,
    /// Decoded path segments.
    pub segments: Vec<String>,
}

impl Location {
    pub fn parse(target: &str) -> Self {
        let path = target
            .split(['?', '#'])
            .next()
            .unwrap_or_default();

        let raw: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();
        let segments = raw
            .iter()
            .map(|s| percent_decode_str(s).decode_utf8_lossy().into_owned())
            .collect();

        Self {
            pathname: format!("/{}", raw.join("/")),
            segments,
        }
    }
}

impl std::fmt::Display for Location {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.pathname)
    }
}

/// Builders for the console's concrete paths.
pub mod paths {
    use super::*;

    pub fn app(app: &AppId) -> String {
        format!("/apps/{}", encode(app.as_str()))
    }

    pub fn release(app_id: &AppId, label: &str) -> String {
        format!("{}/releases/{}", app(app_id), encode(label))
    }

    fn encode(segment: &str) -> String {
        utf8_percent_encode(segment, SEGMENT).to_string()
    }
}
