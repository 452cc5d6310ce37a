//! Path templates with `{name}` placeholders.

use std::collections::BTreeMap;

use percent_encoding::{AsciiSet, CONTROLS, utf8_percent_encode};

use crate::{Error, Result};

/// Characters escaped when a value is substituted into a path.
///
/// `/` is kept so a value may span several segments.
const PATH_VALUE: &AsciiSet = &CONTROLS
    .add(b' ')
    .add(b'"')
    .add(b'#')
    .add(b'%')
    .add(b'<')
    .add(b'>')
    .add(b'?')
    .add(b'`')
    .add(b'{')
    .add(b'}');

/// Named values substituted into a [`PathTemplate`].
///
/// # Example
///
/// ```
/// use roundtrip_core::PathParams;
///
/// let params = PathParams::new().with("org", "rust-lang").with("id", 42);
/// assert_eq!(params.get("id"), Some("42"));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PathParams(BTreeMap<String, String>);

impl PathParams {
    /// An empty mapping.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a value, replacing any previous one.
    pub fn insert(&mut self, name: impl Into<String>, value: impl ToString) {
        self.0.insert(name.into(), value.to_string());
    }

    /// Builder-style [`PathParams::insert`].
    #[must_use]
    pub fn with(mut self, name: impl Into<String>, value: impl ToString) -> Self {
        self.insert(name, value);
        self
    }

    /// Value for `name`.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&str> {
        self.0.get(name).map(String::as_str)
    }

    /// Number of values.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// No values at all.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterate over `(name, value)` pairs in name order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

impl<K: Into<String>, V: ToString> FromIterator<(K, V)> for PathParams {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut params = Self::new();
        for (name, value) in iter {
            params.insert(name, value);
        }
        params
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Part<'a> {
    Literal(&'a str),
    Param(&'a str),
}

/// A parsed path such as `/orgs/{org}/repos/{id}`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathTemplate<'a> {
    source: &'a str,
    parts: Vec<Part<'a>>,
}

impl<'a> PathTemplate<'a> {
    /// Parse a template.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Template`] for an unmatched brace or an empty or
    /// malformed placeholder name.
    pub fn parse(source: &'a str) -> Result<Self> {
        let mut parts = Vec::new();
        let mut rest = source;

        while let Some(at) = rest.find(['{', '}']) {
            let (literal, tail) = rest.split_at(at);
            let Some(tail) = tail.strip_prefix('{') else {
                return Err(Error::template(source, "unmatched '}'"));
            };
            if !literal.is_empty() {
                parts.push(Part::Literal(literal));
            }

            let Some((name, after)) = tail.split_once('}') else {
                return Err(Error::template(source, "unclosed '{'"));
            };
            if name.is_empty() {
                return Err(Error::template(source, "empty placeholder"));
            }
            if name.contains(['{', '/']) {
                return Err(Error::template(
                    source,
                    format!("invalid placeholder name '{name}'"),
                ));
            }
            parts.push(Part::Param(name));
            rest = after;
        }

        if !rest.is_empty() {
            parts.push(Part::Literal(rest));
        }

        Ok(Self { source, parts })
    }

    /// The template as written.
    #[must_use]
    pub const fn as_str(&self) -> &'a str {
        self.source
    }

    /// Placeholder names in order of appearance.
    pub fn params(&self) -> impl Iterator<Item = &'a str> + '_ {
        self.parts.iter().filter_map(|part| match part {
            Part::Param(name) => Some(*name),
            Part::Literal(_) => None,
        })
    }

    /// Substitute every placeholder, percent-encoding the values.
    ///
    /// Values that are not referenced are ignored.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Template`] when a placeholder has no value.
    pub fn render(&self, params: &PathParams) -> Result<String> {
        let mut rendered = String::with_capacity(self.source.len());
        for part in &self.parts {
            match part {
                Part::Literal(literal) => rendered.push_str(literal),
                Part::Param(name) => {
                    let value = params.get(name).ok_or_else(|| {
                        Error::template(self.source, format!("missing path parameter '{name}'"))
                    })?;
                    rendered.extend(utf8_percent_encode(value, PATH_VALUE));
                }
            }
        }
        Ok(rendered)
    }
}

impl std::fmt::Display for PathTemplate<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.source)
    }
}
