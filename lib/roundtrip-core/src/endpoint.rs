//! Base endpoint and relative path resolution.

use std::borrow::Cow;

use url::{Url, form_urlencoded};

use crate::{Error, PathParams, PathTemplate, Result};

/// Base URL every request of a client is resolved against.
///
/// The base carries scheme, host, a base path and persistent query
/// parameters.
///
/// # Example
///
/// ```
/// use roundtrip_core::Endpoint;
///
/// let endpoint = Endpoint::parse("https://api.example.com/api?y=2").unwrap();
/// let url = endpoint.resolve("/v1/users?x=1");
/// assert_eq!(url.as_str(), "https://api.example.com/api/v1/users?x=1&y=2");
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoint {
    url: Url,
}

impl Endpoint {
    /// Wrap an already parsed base URL.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidRequest`] for URLs that cannot carry a path,
    /// such as `mailto:` URLs.
    pub fn new(url: Url) -> Result<Self> {
        if url.cannot_be_a_base() {
            return Err(Error::invalid_request(format!(
                "base URL cannot carry a path: {url}"
            )));
        }
        Ok(Self { url })
    }

    /// Parse a base URL.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidUrl`] if the URL does not parse.
    pub fn parse(base: impl AsRef<str>) -> Result<Self> {
        Self::new(Url::parse(base.as_ref())?)
    }

    /// The base URL.
    #[must_use]
    pub fn url(&self) -> &Url {
        &self.url
    }

    /// Resolve a relative path (optionally carrying a query) against the base.
    ///
    /// Query parameters of both sides are kept; repeated keys accumulate.
    #[must_use]
    pub fn resolve(&self, relative: &str) -> Url {
        let (path, query) = self.merge(relative);
        self.finish(&path, query.as_deref())
    }

    /// Like [`Endpoint::resolve`], then substitute `{name}` placeholders in
    /// the joined path.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Template`] for a malformed template or a missing
    /// parameter.
    pub fn resolve_with_params(&self, relative: &str, params: &PathParams) -> Result<Url> {
        let (path, query) = self.merge(relative);
        let rendered = PathTemplate::parse(&path)?.render(params)?;
        Ok(self.finish(&rendered, query.as_deref()))
    }

    fn merge(&self, relative: &str) -> (String, Option<String>) {
        let relative = relative.split_once('#').map_or(relative, |(before, _)| before);
        let (path, query) = match relative.split_once('?') {
            Some((path, query)) => (path, Some(query)),
            None => (relative, None),
        };

        let path = join_paths(self.url.path(), path);
        let query = merge_query(self.url.query(), query);
        (path, query)
    }

    fn finish(&self, path: &str, query: Option<&str>) -> Url {
        let mut url = self.url.clone();
        url.set_path(path);
        url.set_query(query);
        url
    }
}

/// Combine base and relative query strings, sorted by key.
///
/// Values of a repeated key keep their relative order, base values first.
fn merge_query(base: Option<&str>, relative: Option<&str>) -> Option<String> {
    let mut pairs: Vec<(Cow<'_, str>, Cow<'_, str>)> = [base, relative]
        .into_iter()
        .flatten()
        .flat_map(|query| form_urlencoded::parse(query.as_bytes()))
        .collect();
    if pairs.is_empty() {
        return None;
    }
    pairs.sort_by(|(a, _), (b, _)| a.cmp(b));

    Some(
        form_urlencoded::Serializer::new(String::new())
            .extend_pairs(pairs)
            .finish(),
    )
}

/// Join two paths and clean the result.
///
/// Empty elements and `.` are dropped, `..` removes the previous element,
/// and the trailing slash is not kept.
#[must_use]
pub fn join_paths(base: &str, relative: &str) -> String {
    let joined = match (base.is_empty(), relative.is_empty()) {
        (true, true) => return String::new(),
        (false, true) => Cow::Borrowed(base),
        (true, false) => Cow::Borrowed(relative),
        (false, false) => Cow::Owned(format!("{base}/{relative}")),
    };
    clean_path(&joined)
}

fn clean_path(path: &str) -> String {
    let rooted = path.starts_with('/');
    let mut segments: Vec<&str> = Vec::new();

    for segment in path.split('/') {
        match segment {
            "" | "." => {}
            ".." => {
                if segments.last().is_some_and(|last| *last != "..") {
                    segments.pop();
                } else if !rooted {
                    segments.push("..");
                }
            }
            other => segments.push(other),
        }
    }

    let cleaned = segments.join("/");
    match (rooted, cleaned.is_empty()) {
        (true, _) => format!("/{cleaned}"),
        (false, true) => ".".to_string(),
        (false, false) => cleaned,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn endpoint(base: &str) -> Endpoint {
        Endpoint::parse(base).expect("valid base")
    }

    #[test]
    fn merges_path_and_query() {
        let url = endpoint("https://api.example.com/api?y=2").resolve("/v1/users?x=1");

        assert_eq!(url.path(), "/api/v1/users");
        let pairs: Vec<(String, String)> = url.query_pairs().into_owned().collect();
        assert!(pairs.contains(&("x".to_string(), "1".to_string())));
        assert!(pairs.contains(&("y".to_string(), "2".to_string())));
    }

    #[test]
    fn duplicate_keys_accumulate() {
        let url = endpoint("https://h/?tag=a&key=k").resolve("items?tag=b&tag=c");
        assert_eq!(url.query(), Some("key=k&tag=a&tag=b&tag=c"));
    }

    #[test]
    fn no_query_means_no_question_mark() {
        let url = endpoint("https://h/base").resolve("/items");
        assert_eq!(url.as_str(), "https://h/base/items");
    }

    #[test]
    fn fragment_of_relative_path_is_dropped() {
        let url = endpoint("https://h/").resolve("/items?a=1#top");
        assert_eq!(url.as_str(), "https://h/items?a=1");
    }

    #[test]
    fn joins_without_double_slashes() {
        assert_eq!(join_paths("/api/", "/v1/users/"), "/api/v1/users");
        assert_eq!(join_paths("/api", "v1//users"), "/api/v1/users");
        assert_eq!(join_paths("/", ""), "/");
        assert_eq!(join_paths("", ""), "");
        assert_eq!(join_paths("/api", "../v2/./items"), "/v2/items");
        assert_eq!(join_paths("/", "../.."), "/");
        assert_eq!(join_paths("a", "../../b"), "../b");
    }

    #[test]
    fn resolves_path_parameters_after_join() {
        let params = PathParams::new().with("org", "acme").with("id", "a b");
        let url = endpoint("https://h/api?key=k")
            .resolve_with_params("/orgs/{org}/members/{id}?page=2", &params)
            .expect("render");
        assert_eq!(url.as_str(), "https://h/api/orgs/acme/members/a%20b?key=k&page=2");
    }

    #[test]
    fn missing_path_parameter_fails() {
        let err = endpoint("https://h/")
            .resolve_with_params("/users/{id}", &PathParams::new())
            .expect_err("missing");
        assert!(matches!(err, Error::Template { .. }));
    }

    #[test]
    fn rejects_bad_base_urls() {
        assert!(matches!(Endpoint::parse("not a url"), Err(Error::InvalidUrl(_))));
        assert!(matches!(
            Endpoint::parse("mailto:ops@example.com"),
            Err(Error::InvalidRequest(_))
        ));
    }
}
