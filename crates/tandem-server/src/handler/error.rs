//! HTTP errors rendered as plain-text responses.

use std::borrow::Cow;
use std::fmt;

use axum::http::{HeaderName, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use tandem_tools::ToolError;

use crate::handler::request::ValidationError;
use crate::service::WorkflowError;

/// Header naming the workflow step that failed.
pub const FAILED_STEP_HEADER: HeaderName = HeaderName::from_static("x-failed-step");

/// The error type for HTTP handlers.
///
/// The response body is the custom message, or the kind's default message.
/// The context is only logged, never sent to the client.
#[derive(Clone)]
#[must_use = "errors do nothing unless serialized"]
pub struct Error<'a> {
    kind: ErrorKind,
    message: Option<Cow<'a, str>>,
    context: Option<Cow<'a, str>>,
    failed_step: Option<&'static str>,
}

impl Error<'static> {
    /// Creates a new [`Error`] with the specified kind.
    #[inline]
    pub fn new(kind: ErrorKind) -> Self {
        Self {
            kind,
            message: None,
            context: None,
            failed_step: None,
        }
    }
}

impl<'a> Error<'a> {
    /// Sets the response body.
    #[inline]
    pub fn with_message(self, message: impl Into<Cow<'a, str>>) -> Self {
        Self {
            message: Some(message.into()),
            ..self
        }
    }

    /// Attaches context for logs.
    #[inline]
    pub fn with_context(self, context: impl Into<Cow<'a, str>>) -> Self {
        Self {
            context: Some(context.into()),
            ..self
        }
    }

    /// Names the workflow step that failed.
    #[inline]
    pub fn with_failed_step(self, step: &'static str) -> Self {
        Self {
            failed_step: Some(step),
            ..self
        }
    }

    /// Returns the error kind.
    #[inline]
    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    /// Returns the custom message if present.
    #[inline]
    pub fn message(&self) -> Option<&str> {
        self.message.as_deref()
    }

    /// Returns the context if present.
    #[inline]
    pub fn context(&self) -> Option<&str> {
        self.context.as_deref()
    }

    /// Returns the failed workflow step if present.
    #[inline]
    pub fn failed_step(&self) -> Option<&'static str> {
        self.failed_step
    }

    /// Converts this error into a static version by cloning all borrowed data.
    pub fn into_static(self) -> Error<'static> {
        Error {
            kind: self.kind,
            message: self.message.map(|m| Cow::Owned(m.into_owned())),
            context: self.context.map(|c| Cow::Owned(c.into_owned())),
            failed_step: self.failed_step,
        }
    }
}

impl Default for Error<'static> {
    #[inline]
    fn default() -> Self {
        Self::new(ErrorKind::default())
    }
}

impl fmt::Debug for Error<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut debug_struct = f.debug_struct("Error");
        debug_struct
            .field("kind", &self.kind)
            .field("status", &self.kind.status_code());

        if let Some(ref message) = self.message {
            debug_struct.field("message", message);
        }

        if let Some(ref context) = self.context {
            debug_struct.field("context", context);
        }

        if let Some(step) = self.failed_step {
            debug_struct.field("failed_step", &step);
        }

        debug_struct.finish()
    }
}

impl fmt::Display for Error<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let message = self.message.as_deref().unwrap_or(self.kind.default_message());
        write!(f, "{} ({}): {}", self.kind, self.kind.status_code().as_u16(), message)?;

        if let Some(ref context) = self.context {
            write!(f, " - {context}")?;
        }

        if let Some(step) = self.failed_step {
            write!(f, " [step: {step}]")?;
        }

        Ok(())
    }
}

impl std::error::Error for Error<'_> {}

impl IntoResponse for Error<'_> {
    fn into_response(self) -> Response {
        let body = match self.message {
            Some(message) => message.into_owned(),
            None => self.kind.default_message().to_owned(),
        };

        let mut response = (self.kind.status_code(), body).into_response();
        if let Some(step) = self.failed_step {
            response
                .headers_mut()
                .insert(FAILED_STEP_HEADER, HeaderValue::from_static(step));
        }

        response
    }
}

impl From<ErrorKind> for Error<'static> {
    #[inline]
    fn from(kind: ErrorKind) -> Self {
        Self::new(kind)
    }
}

impl From<ValidationError> for Error<'static> {
    fn from(error: ValidationError) -> Self {
        ErrorKind::BadRequest.with_message(error.to_string())
    }
}

impl From<WorkflowError> for Error<'static> {
    fn from(error: WorkflowError) -> Self {
        match error {
            WorkflowError::Validation(message) => ErrorKind::BadRequest.with_message(message),
            error => Error::new(ErrorKind::InternalServerError)
                .with_context(error.to_string())
                .with_failed_step(error.step()),
        }
    }
}

impl From<ToolError> for Error<'static> {
    fn from(error: ToolError) -> Self {
        let kind = match &error {
            ToolError::InvalidInput(_) => ErrorKind::BadRequest,
            ToolError::NotFound(_) => ErrorKind::NotFound,
            ToolError::Configuration(_) => ErrorKind::InternalServerError,
            ToolError::Upstream { .. } => ErrorKind::BadGateway,
        };

        let context = match std::error::Error::source(&error) {
            Some(source) => source.to_string(),
            None => error.to_string(),
        };

        kind.with_message(error.to_string()).with_context(context)
    }
}

/// A specialized [`Result`] type for HTTP handlers.
///
/// [`Result`]: std::result::Result
pub type Result<T, E = Error<'static>> = std::result::Result<T, E>;

/// HTTP error kinds, organized by status code family.
#[must_use = "error kinds do nothing unless used to create errors"]
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    // 4xx Client Errors
    /// 400 Bad Request - invalid request body or input
    BadRequest,
    /// 404 Not Found - unknown resource; empty body by default
    NotFound,
    /// 405 Method Not Allowed - only `POST` is served
    MethodNotAllowed,

    // 5xx Server Errors
    /// 500 Internal Server Error - a workflow step or the server failed
    #[default]
    InternalServerError,
    /// 502 Bad Gateway - a collaborator behind a tool failed
    BadGateway,
}

impl ErrorKind {
    /// Converts this error kind into a full [`Error`].
    #[inline]
    pub fn into_error(self) -> Error<'static> {
        Error::new(self)
    }

    /// Creates an [`Error`] with the specified message.
    #[inline]
    pub fn with_message<'a>(self, message: impl Into<Cow<'a, str>>) -> Error<'a> {
        Error::new(self).with_message(message)
    }

    /// Creates an [`Error`] with the specified context.
    #[inline]
    pub fn with_context<'a>(self, context: impl Into<Cow<'a, str>>) -> Error<'a> {
        Error::new(self).with_context(context)
    }

    /// Returns the HTTP status code for this error kind.
    #[inline]
    pub fn status_code(self) -> StatusCode {
        match self {
            Self::BadRequest => StatusCode::BAD_REQUEST,
            Self::NotFound => StatusCode::NOT_FOUND,
            Self::MethodNotAllowed => StatusCode::METHOD_NOT_ALLOWED,
            Self::InternalServerError => StatusCode::INTERNAL_SERVER_ERROR,
            Self::BadGateway => StatusCode::BAD_GATEWAY,
        }
    }

    /// Body sent when the error has no custom message.
    pub fn default_message(self) -> &'static str {
        match self {
            Self::BadRequest => "Bad Request",
            Self::NotFound => "",
            Self::MethodNotAllowed => "Only POST method allowed",
            Self::InternalServerError => "Internal Server Error",
            Self::BadGateway => "Bad Gateway",
        }
    }

    /// Snake-case name used in logs.
    pub fn name(self) -> &'static str {
        match self {
            Self::BadRequest => "bad_request",
            Self::NotFound => "not_found",
            Self::MethodNotAllowed => "method_not_allowed",
            Self::InternalServerError => "internal_server_error",
            Self::BadGateway => "bad_gateway",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl IntoResponse for ErrorKind {
    #[inline]
    fn into_response(self) -> Response {
        Error::new(self).into_response()
    }
}

#[cfg(test)]
mod tests {
    use axum::body::to_bytes;

    use super::*;

    async fn body(response: Response) -> String {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    #[test]
    fn default_http_error() {
        let error = Error::default();
        assert_eq!(error.kind(), ErrorKind::InternalServerError);
        assert_eq!(error.kind().status_code(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[tokio::test]
    async fn internal_error_hides_context() {
        let error = ErrorKind::InternalServerError
            .with_context("vector upsert failed: connection refused")
            .with_failed_step("upsert");

        let response = error.into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(response.headers()[&FAILED_STEP_HEADER], "upsert");
        assert_eq!(body(response).await, "Internal Server Error");
    }

    #[tokio::test]
    async fn not_found_has_empty_body() {
        let response = ErrorKind::NotFound.into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert!(body(response).await.is_empty());
    }

    #[tokio::test]
    async fn method_not_allowed_body() {
        let response = ErrorKind::MethodNotAllowed.into_response();
        assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
        assert_eq!(body(response).await, "Only POST method allowed");
    }

    #[test]
    fn workflow_errors_map_to_status() {
        let error: Error = WorkflowError::Validation("topK must be between 1 and 20".into()).into();
        assert_eq!(error.kind(), ErrorKind::BadRequest);
        assert_eq!(error.failed_step(), None);

        let source = tandem_core::Error::external_error().with_message("model offline");
        let error: Error = WorkflowError::EmbeddingProvider(source).into();
        assert_eq!(error.kind(), ErrorKind::InternalServerError);
        assert_eq!(error.failed_step(), Some("embed"));
        assert!(error.context().unwrap().contains("model offline"));
    }

    #[test]
    fn tool_errors_map_to_status() {
        let cases = [
            (ToolError::invalid_input("query must not be empty"), ErrorKind::BadRequest),
            (ToolError::NotFound("nope".into()), ErrorKind::NotFound),
            (ToolError::configuration("missing key"), ErrorKind::InternalServerError),
            (
                ToolError::upstream("Failed to generate embeddings", tandem_core::Error::timeout()),
                ErrorKind::BadGateway,
            ),
        ];

        for (tool_error, kind) in cases {
            let error: Error = tool_error.into();
            assert_eq!(error.kind(), kind);
            assert!(error.message().is_some());
        }
    }

    #[test]
    fn std_fmt_display() {
        let error = ErrorKind::InternalServerError
            .with_context("query failed")
            .with_failed_step("query");

        let display = error.to_string();
        assert!(display.contains("internal_server_error"));
        assert!(display.contains("500"));
        assert!(display.contains("query failed"));
        assert!(display.contains("[step: query]"));
    }

    #[test]
    fn error_into_static() {
        let message = String::from("Missing or invalid 'text' in body");
        let error = ErrorKind::BadRequest.with_message(message.as_str()).into_static();
        drop(message);

        assert_eq!(error.message(), Some("Missing or invalid 'text' in body"));
    }
}
