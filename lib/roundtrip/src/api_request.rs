//! Call descriptors.
//!
//! An [`ApiRequest`] describes one API call before it is bound to a client:
//! method, relative path (possibly a `{name}` template), path parameters,
//! extra headers and an optional JSON body.

use roundtrip_core::{Method, PathParams};

/// One API call, not yet resolved against an endpoint.
///
/// # Example
///
/// ```
/// use roundtrip::ApiRequest;
///
/// let request = ApiRequest::get("/users/{id}/repos?sort=updated")
///     .path_param("id", 42)
///     .header("Accept", "application/json");
/// assert_eq!(request.path(), "/users/{id}/repos?sort=updated");
/// ```
#[derive(Debug, Clone)]
pub struct ApiRequest<B = ()> {
    method: Method,
    path: String,
    path_params: Option<PathParams>,
    headers: Vec<(String, String)>,
    body: Option<B>,
}

impl ApiRequest {
    /// A call without body.
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            path_params: None,
            headers: Vec::new(),
            body: None,
        }
    }

    /// `GET path`.
    pub fn get(path: impl Into<String>) -> Self {
        Self::new(Method::Get, path)
    }

    /// `POST path`.
    pub fn post(path: impl Into<String>) -> Self {
        Self::new(Method::Post, path)
    }

    /// `PUT path`.
    pub fn put(path: impl Into<String>) -> Self {
        Self::new(Method::Put, path)
    }

    /// `PATCH path`.
    pub fn patch(path: impl Into<String>) -> Self {
        Self::new(Method::Patch, path)
    }

    /// `DELETE path`.
    pub fn delete(path: impl Into<String>) -> Self {
        Self::new(Method::Delete, path)
    }
}

impl<B> ApiRequest<B> {
    /// Bind a path template placeholder.
    ///
    /// Binding any parameter makes the path a template: every `{name}` in it
    /// must then have a value.
    #[must_use]
    pub fn path_param(mut self, name: impl Into<String>, value: impl ToString) -> Self {
        self.path_params
            .get_or_insert_with(PathParams::new)
            .insert(name, value);
        self
    }

    /// Replace all path parameters.
    #[must_use]
    pub fn path_params(mut self, params: PathParams) -> Self {
        self.path_params = Some(params);
        self
    }

    /// Add a header. Later values replace earlier ones with the same name.
    #[must_use]
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    /// Attach a body, encoded as JSON when the request is built.
    #[must_use]
    pub fn body<T>(self, body: T) -> ApiRequest<T> {
        ApiRequest {
            method: self.method,
            path: self.path,
            path_params: self.path_params,
            headers: self.headers,
            body: Some(body),
        }
    }

    /// HTTP method.
    #[must_use]
    pub const fn method(&self) -> Method {
        self.method
    }

    /// Relative path or path template.
    #[must_use]
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Bound path parameters, if the path is a template.
    #[must_use]
    pub const fn params(&self) -> Option<&PathParams> {
        self.path_params.as_ref()
    }

    /// Extra headers, in insertion order.
    #[must_use]
    pub fn headers(&self) -> &[(String, String)] {
        &self.headers
    }

    /// The body, if any.
    #[must_use]
    pub const fn body_ref(&self) -> Option<&B> {
        self.body.as_ref()
    }
}
