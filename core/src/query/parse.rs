use std::fmt;

use lazy_static::lazy_static;
use regex::Regex;
use tracing::warn;

use super::viewport::{Orientation, Viewport};
use crate::error::QueryError;

/// Pixels per `em`/`rem` when no font size is known.
const PX_PER_EM: f64 = 16.0;

lazy_static! {
    static ref TOKEN_RE: Regex = Regex::new(r"\([^()]*\)|[^\s()]+").unwrap();
    static ref FEATURE_RE: Regex =
        Regex::new(r"^\(\s*([a-z][a-z-]*)\s*(?::\s*([^()]*?))?\s*\)$").unwrap();
    static ref LENGTH_RE: Regex = Regex::new(r"^(\d+(?:\.\d+)?)\s*(px|em|rem)?$").unwrap();
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaType {
    All,
    Screen,
    Print,
    /// Recognised legacy types (`tv`, `handheld`, ...). Never match.
    Other,
}

impl MediaType {
    fn parse(ident: &str) -> Result<Self, QueryError> {
        match ident {
            "all" => Ok(Self::All),
            "screen" => Ok(Self::Screen),
            "print" => Ok(Self::Print),
            "tv" | "handheld" | "projection" | "tty" | "braille" | "embossed" | "aural"
            | "speech" => Ok(Self::Other),
            other => Err(QueryError::UnknownMediaType(other.to_string())),
        }
    }

    fn matches_screen(self) -> bool {
        matches!(self, Self::All | Self::Screen)
    }
}

/// A single media feature test; lengths are normalised to CSS pixels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MediaFeature {
    Width(f64),
    MinWidth(f64),
    MaxWidth(f64),
    Height(f64),
    MinHeight(f64),
    MaxHeight(f64),
    /// `(width)` in boolean context.
    AnyWidth,
    /// `(height)` in boolean context.
    AnyHeight,
    Orientation(Orientation),
}

impl MediaFeature {
    fn parse(token: &str) -> Result<Self, QueryError> {
        let caps = FEATURE_RE
            .captures(token)
            .ok_or_else(|| QueryError::Malformed(token.to_string()))?;
        let name = &caps[1];
        let value = caps.get(2).map(|m| m.as_str().trim());

        let Some(value) = value else {
            return match name {
                "width" => Ok(Self::AnyWidth),
                "height" => Ok(Self::AnyHeight),
                "min-width" | "max-width" | "min-height" | "max-height" | "orientation" => {
                    Err(QueryError::InvalidValue {
                        feature: name.to_string(),
                        value: String::new(),
                    })
                }
                other => Err(QueryError::UnknownFeature(other.to_string())),
            };
        };

        let length = || parse_length(name, value);
        match name {
            "width" => Ok(Self::Width(length()?)),
            "min-width" => Ok(Self::MinWidth(length()?)),
            "max-width" => Ok(Self::MaxWidth(length()?)),
            "height" => Ok(Self::Height(length()?)),
            "min-height" => Ok(Self::MinHeight(length()?)),
            "max-height" => Ok(Self::MaxHeight(length()?)),
            "orientation" => match value {
                "portrait" => Ok(Self::Orientation(Orientation::Portrait)),
                "landscape" => Ok(Self::Orientation(Orientation::Landscape)),
                _ => Err(QueryError::InvalidValue {
                    feature: name.to_string(),
                    value: value.to_string(),
                }),
            },
            other => Err(QueryError::UnknownFeature(other.to_string())),
        }
    }

    pub fn matches(&self, viewport: &Viewport) -> bool {
        let width = f64::from(viewport.width);
        let height = f64::from(viewport.height);
        match *self {
            Self::Width(px) => width == px,
            Self::MinWidth(px) => width >= px,
            Self::MaxWidth(px) => width <= px,
            Self::Height(px) => height == px,
            Self::MinHeight(px) => height >= px,
            Self::MaxHeight(px) => height <= px,
            Self::AnyWidth => viewport.width > 0,
            Self::AnyHeight => viewport.height > 0,
            Self::Orientation(o) => viewport.orientation() == o,
        }
    }
}

fn parse_length(feature: &str, value: &str) -> Result<f64, QueryError> {
    let invalid = || QueryError::InvalidValue {
        feature: feature.to_string(),
        value: value.to_string(),
    };
    let caps = LENGTH_RE.captures(value).ok_or_else(invalid)?;
    let number: f64 = caps[1].parse().map_err(|_| invalid())?;
    match caps.get(2).map(|m| m.as_str()) {
        Some("px") => Ok(number),
        Some("em") | Some("rem") => Ok(number * PX_PER_EM),
        // unitless lengths are only legal for zero
        None if number == 0.0 => Ok(0.0),
        _ => Err(invalid()),
    }
}

/// One comma-separated branch of a query list.
#[derive(Debug, Clone, PartialEq)]
struct QueryBranch {
    negated: bool,
    media_type: MediaType,
    features: Vec<MediaFeature>,
}

impl QueryBranch {
    fn parse(source: &str) -> Result<Self, QueryError> {
        let leftover = TOKEN_RE.replace_all(source, "");
        if !leftover.trim().is_empty() {
            return Err(QueryError::Malformed(leftover.trim().to_string()));
        }

        let mut tokens = TOKEN_RE.find_iter(source).map(|m| m.as_str()).peekable();
        if tokens.peek().is_none() {
            return Err(QueryError::Empty);
        }

        let mut negated = false;
        match tokens.peek() {
            Some(&"not") => {
                negated = true;
                tokens.next();
            }
            Some(&"only") => {
                tokens.next();
            }
            _ => {}
        }

        let mut media_type = MediaType::All;
        let mut features = Vec::new();

        match tokens.next() {
            Some(tok) if tok.starts_with('(') => features.push(MediaFeature::parse(tok)?),
            Some(tok) => media_type = MediaType::parse(tok)?,
            None => return Err(QueryError::Malformed(source.trim().to_string())),
        }

        while let Some(tok) = tokens.next() {
            if tok != "and" {
                return Err(QueryError::Malformed(tok.to_string()));
            }
            match tokens.next() {
                Some(feature) if feature.starts_with('(') => {
                    features.push(MediaFeature::parse(feature)?)
                }
                Some(other) => return Err(QueryError::Malformed(other.to_string())),
                None => return Err(QueryError::Malformed("and".to_string())),
            }
        }

        Ok(Self {
            negated,
            media_type,
            features,
        })
    }

    fn matches(&self, viewport: &Viewport) -> bool {
        let hit = self.media_type.matches_screen()
            && self.features.iter().all(|f| f.matches(viewport));
        hit != self.negated
    }
}

/// A parsed media query list; matches when any branch matches.
///
/// Branches that fail to parse are left out, so `(min-width: wide), print`
/// parses to a list that only ever matches print.
#[derive(Debug, Clone, PartialEq)]
pub struct MediaQuery {
    source: String,
    branches: Vec<QueryBranch>,
}

impl MediaQuery {
    pub fn parse(source: &str) -> Result<Self, QueryError> {
        let normalized = source.trim().to_ascii_lowercase();
        if normalized.is_empty() {
            return Err(QueryError::Empty);
        }

        // a bad branch is dropped and never matches; the list fails only
        // when no branch survives
        let mut branches = Vec::new();
        let mut first_err = None;
        for part in normalized.split(',') {
            match QueryBranch::parse(part) {
                Ok(branch) => branches.push(branch),
                Err(e) => {
                    warn!(branch = part.trim(), error = %e, "ignoring invalid media query branch");
                    first_err.get_or_insert(e);
                }
            }
        }
        if branches.is_empty() {
            return Err(first_err.unwrap_or(QueryError::Empty));
        }

        Ok(Self {
            source: source.trim().to_string(),
            branches,
        })
    }

    pub fn matches(&self, viewport: &Viewport) -> bool {
        self.branches.iter().any(|b| b.matches(viewport))
    }

    pub fn as_str(&self) -> &str {
        &self.source
    }
}

impl fmt::Display for MediaQuery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.source)
    }
}

impl std::str::FromStr for MediaQuery {
    type Err = QueryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}
