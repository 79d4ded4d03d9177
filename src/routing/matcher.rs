//! Route pattern matching module
//!
//! Compiles route paths such as `/users/:id` or `/files/*rest` and matches
//! request paths against them.

use crate::error::MockError;

/// How specific a pattern is, used to rank overlapping routes
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum PatternKind {
    /// Ends in a `*name` catch-all
    Wildcard,
    /// Contains at least one `:name` segment
    Param,
    /// Literal segments only
    Static,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Literal(String),
    Param(String),
    Wildcard(String),
}

/// Compiled route path
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathPattern {
    raw: String,
    segments: Vec<Segment>,
}

impl PathPattern {
    /// Compile a pattern; it must be absolute (start with `/`)
    pub fn parse(pattern: &str) -> Result<Self, MockError> {
        let invalid = |reason: &str| MockError::InvalidPattern {
            pattern: pattern.to_string(),
            reason: reason.to_string(),
        };

        let Some(rest) = pattern.strip_prefix('/') else {
            return Err(invalid("must start with '/'"));
        };

        let parts: Vec<&str> = rest.split('/').collect();
        let mut segments = Vec::with_capacity(parts.len());
        for (i, part) in parts.iter().enumerate() {
            let segment = if let Some(name) = part.strip_prefix(':') {
                if name.is_empty() {
                    return Err(invalid("parameter segment needs a name"));
                }
                Segment::Param(name.to_string())
            } else if let Some(name) = part.strip_prefix('*') {
                if name.is_empty() {
                    return Err(invalid("wildcard segment needs a name"));
                }
                if i + 1 != parts.len() {
                    return Err(invalid("wildcard must be the last segment"));
                }
                Segment::Wildcard(name.to_string())
            } else {
                Segment::Literal((*part).to_string())
            };
            segments.push(segment);
        }

        Ok(Self {
            raw: pattern.to_string(),
            segments,
        })
    }

    pub fn as_str(&self) -> &str {
        &self.raw
    }

    pub fn kind(&self) -> PatternKind {
        match self.segments.last() {
            Some(Segment::Wildcard(_)) => PatternKind::Wildcard,
            _ if self
                .segments
                .iter()
                .any(|s| matches!(s, Segment::Param(_))) =>
            {
                PatternKind::Param
            }
            _ => PatternKind::Static,
        }
    }

    /// The pattern with parameter and wildcard names erased
    ///
    /// Two patterns with the same shape match exactly the same paths.
    pub fn shape(&self) -> String {
        let mut shape = String::with_capacity(self.raw.len());
        for segment in &self.segments {
            shape.push('/');
            match segment {
                Segment::Literal(lit) => shape.push_str(lit),
                Segment::Param(_) => shape.push(':'),
                Segment::Wildcard(_) => shape.push('*'),
            }
        }
        shape
    }

    /// Check whether a request path (without query string) matches
    pub fn matches(&self, path: &str) -> bool {
        let Some(rest) = path.strip_prefix('/') else {
            return false;
        };
        let mut parts = rest.split('/');

        for segment in &self.segments {
            match segment {
                // Catch-all takes whatever is left, including nothing
                Segment::Wildcard(_) => return true,
                Segment::Param(_) => match parts.next() {
                    Some(part) if !part.is_empty() => {}
                    _ => return false,
                },
                Segment::Literal(lit) => match parts.next() {
                    Some(part) if part == lit => {}
                    _ => return false,
                },
            }
        }

        parts.next().is_none()
    }
}

/// Join a base URL and a route path the way router groups do
///
/// Exactly one `/` separates the parts, the result is absolute, and a
/// trailing slash on the route path is kept.
pub fn join_paths(base: &str, path: &str) -> String {
    let base = base.trim_end_matches('/');
    let relative = path.trim_start_matches('/');

    let joined = if path.is_empty() {
        base.to_string()
    } else {
        format!("{base}/{relative}")
    };

    let mut joined = collapse_slashes(&joined);
    if !joined.starts_with('/') {
        joined.insert(0, '/');
    }
    joined
}

fn collapse_slashes(path: &str) -> String {
    let mut out = String::with_capacity(path.len());
    let mut prev_slash = false;
    for c in path.chars() {
        if c == '/' {
            if !prev_slash {
                out.push(c);
            }
            prev_slash = true;
        } else {
            out.push(c);
            prev_slash = false;
        }
    }
    out
}
