//! Path templates and their compiled matchers.
//!
//! A template such as `/user/<int:id>/files/<path:rest>` is split on `/`.
//! Segments of the form `<kind:name>` (or `<name>`) become typed
//! placeholders, everything else is matched literally. The compiled regex is
//! anchored at both ends.

use std::fmt;

use regex::Regex;

use crate::router::error::{ConversionError, RouteError};
use crate::router::params::{ParamValue, Params};

/// The kind of a placeholder, which decides what it matches and how the
/// captured text is converted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParamKind {
    /// One or more non-`/` characters, kept as a string.
    Str,
    /// One or more decimal digits, converted to `i64`.
    Int,
    /// Digits and `.`, converted to `f64`.
    Float,
    /// One or more of any character including `/`.
    Path,
}

impl ParamKind {
    /// Maps a placeholder tag to a kind. Unknown or empty tags are strings.
    pub fn from_tag(tag: &str) -> Self {
        match tag {
            "int" => ParamKind::Int,
            "float" => ParamKind::Float,
            "path" => ParamKind::Path,
            _ => ParamKind::Str,
        }
    }

    fn regex(self) -> &'static str {
        match self {
            ParamKind::Str => "[^/]+",
            ParamKind::Int => "[0-9]+",
            ParamKind::Float => "[0-9.]+",
            ParamKind::Path => ".+",
        }
    }

    /// Converts a captured substring to this kind.
    pub fn convert(self, name: &str, raw: &str) -> Result<ParamValue, ConversionError> {
        let error = || ConversionError {
            name: name.to_string(),
            kind: self,
            value: raw.to_string(),
        };

        match self {
            ParamKind::Str | ParamKind::Path => Ok(ParamValue::Str(raw.to_string())),
            ParamKind::Int => raw.parse().map(ParamValue::Int).map_err(|_| error()),
            ParamKind::Float => raw.parse().map(ParamValue::Float).map_err(|_| error()),
        }
    }
}

impl fmt::Display for ParamKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ParamKind::Str => "string",
            ParamKind::Int => "int",
            ParamKind::Float => "float",
            ParamKind::Path => "path",
        })
    }
}

/// One `/`-separated piece of a template.
#[derive(Debug, Clone, PartialEq)]
pub enum Segment {
    Literal(String),
    Placeholder { name: String, kind: ParamKind },
}

/// A compiled dynamic path template.
#[derive(Debug, Clone)]
pub struct PathPattern {
    template: String,
    segments: Vec<Segment>,
    regex: Regex,
}

impl PathPattern {
    /// Whether a template should be registered as a static route.
    pub fn is_static(template: &str) -> bool {
        !template.contains('<')
    }

    /// Compiles a template into an anchored matcher.
    pub fn compile(template: &str) -> Result<Self, RouteError> {
        let mut segments = Vec::new();
        let mut parts = Vec::new();

        for raw in template.trim_matches('/').split('/') {
            let segment = parse_segment(template, raw)?;
            parts.push(match &segment {
                Segment::Literal(text) => regex::escape(text),
                Segment::Placeholder { name, kind } => format!("(?P<{name}>{})", kind.regex()),
            });
            segments.push(segment);
        }

        let regex = Regex::new(&format!("^/{}$", parts.join("/")))?;

        Ok(Self {
            template: template.to_string(),
            segments,
            regex,
        })
    }

    pub fn template(&self) -> &str {
        &self.template
    }

    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    /// Matches a full path.
    ///
    /// # Returns
    ///
    /// `None` if the path does not match, otherwise the converted parameters
    /// or the first conversion that failed
    pub fn captures(&self, path: &str) -> Option<Result<Params, ConversionError>> {
        let caps = self.regex.captures(path)?;

        let mut params = Params::new();
        for segment in &self.segments {
            if let Segment::Placeholder { name, kind } = segment {
                let raw = caps.name(name).map_or("", |m| m.as_str());
                match kind.convert(name, raw) {
                    Ok(value) => params.push(name.clone(), value),
                    Err(e) => return Some(Err(e)),
                }
            }
        }
        Some(Ok(params))
    }
}

fn parse_segment(template: &str, raw: &str) -> Result<Segment, RouteError> {
    let inner = match raw.strip_prefix('<').and_then(|s| s.strip_suffix('>')) {
        Some(inner) => inner,
        None => return Ok(Segment::Literal(raw.to_string())),
    };

    let (tag, name) = inner.split_once(':').unwrap_or(("", inner));
    if !is_identifier(name) {
        return Err(RouteError::InvalidPlaceholder {
            template: template.to_string(),
            segment: raw.to_string(),
        });
    }

    Ok(Segment::Placeholder {
        name: name.to_string(),
        kind: ParamKind::from_tag(tag),
    })
}

fn is_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    matches!(chars.next(), Some(c) if c.is_ascii_alphabetic() || c == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}
