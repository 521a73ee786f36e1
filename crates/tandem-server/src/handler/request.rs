//! Indexer request parsing and validation.

use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use tandem_core::Metadata;
use thiserror::Error;
use validator::{Validate, ValidateArgs, ValidationErrors};

/// Reasons a request body is rejected with `400`.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// The body is not JSON.
    #[error("Request body must be valid JSON")]
    MalformedJson,

    /// The body is JSON but not an object.
    #[error("Request body must be a JSON object")]
    NotAnObject,

    /// `text` is missing, not a string or empty.
    #[error("Missing or invalid 'text' in body")]
    Text,

    /// `email` is not a string, or is missing while required.
    #[error("Missing or invalid 'email' in body")]
    Email,

    /// `metadata` is not an object of primitive values.
    #[error("Invalid 'metadata' in body: {0}")]
    Metadata(String),

    /// `topK` is not an integer in range.
    #[error("'topK' must be an integer between 1 and {max}")]
    TopK {
        /// Largest accepted value.
        max: usize,
    },
}

/// Limits applied while validating a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RequestRules {
    /// Reject requests without `email`.
    pub require_email: bool,
    /// Largest accepted `topK`.
    pub max_top_k: usize,
}

/// Indexer request body as sent by the caller.
#[derive(Debug, Deserialize, Validate)]
#[validate(context = RequestRules)]
struct IndexRequestBody {
    #[validate(custom(function = "not_blank"))]
    text: String,
    email: Option<String>,
    metadata: Option<Metadata>,
    #[serde(rename = "topK")]
    #[validate(custom(function = "top_k_in_range", use_context))]
    top_k: Option<usize>,
}

fn not_blank(text: &str) -> Result<(), validator::ValidationError> {
    if text.trim().is_empty() {
        return Err(validator::ValidationError::new("blank"));
    }

    Ok(())
}

fn top_k_in_range(top_k: &usize, rules: &RequestRules) -> Result<(), validator::ValidationError> {
    if !(1..=rules.max_top_k).contains(top_k) {
        return Err(validator::ValidationError::new("range"));
    }

    Ok(())
}

/// A validated indexer request.
#[derive(Debug, Clone, PartialEq)]
pub struct IndexRequest {
    /// Text to embed.
    pub text: String,
    /// E-mail address associated with the text.
    pub email: Option<String>,
    /// Caller metadata.
    pub metadata: Metadata,
    /// Requested number of similar items.
    pub top_k: Option<usize>,
}

impl IndexRequest {
    /// Parses and validates a raw request body.
    pub fn parse(body: &[u8], rules: RequestRules) -> Result<Self, ValidationError> {
        let value: Value =
            serde_json::from_slice(body).map_err(|_| ValidationError::MalformedJson)?;
        let Value::Object(object) = &value else {
            return Err(ValidationError::NotAnObject);
        };

        let fields = IndexRequestBody::deserialize(&value)
            .map_err(|_| rejected_field(object, rules))?;
        fields
            .validate_with_args(&rules)
            .map_err(|errors| invalid_field(&errors, rules))?;

        if rules.require_email && fields.email.is_none() {
            return Err(ValidationError::Email);
        }

        Ok(Self {
            text: fields.text,
            email: fields.email,
            metadata: fields.metadata.unwrap_or_default(),
            top_k: fields.top_k,
        })
    }

    /// Metadata stored with every vector: caller metadata plus `text` and `email`.
    pub fn vector_metadata(&self) -> Metadata {
        let mut metadata = self.metadata.clone();
        metadata.insert("text", self.text.as_str());
        if let Some(email) = &self.email {
            metadata.insert("email", email.as_str());
        }

        metadata
    }
}

/// Names the first field, checked in declaration order, whose value does
/// not deserialize.
fn rejected_field(object: &Map<String, Value>, rules: RequestRules) -> ValidationError {
    fn accepts<T: DeserializeOwned>(object: &Map<String, Value>, key: &str) -> bool {
        object.get(key).is_none_or(|value| T::deserialize(value).is_ok())
    }

    if !object.contains_key("text") || !accepts::<String>(object, "text") {
        return ValidationError::Text;
    }

    if !accepts::<Option<String>>(object, "email") {
        return ValidationError::Email;
    }

    if !accepts::<Option<Metadata>>(object, "metadata") {
        let reason = match object.get("metadata") {
            Some(Value::Object(_)) => {
                "values must be strings, numbers, booleans or lists of strings"
            }
            _ => "expected an object",
        };
        return ValidationError::Metadata(reason.to_owned());
    }

    ValidationError::TopK {
        max: rules.max_top_k,
    }
}

fn invalid_field(errors: &ValidationErrors, rules: RequestRules) -> ValidationError {
    if errors.field_errors().contains_key("text") {
        ValidationError::Text
    } else {
        ValidationError::TopK {
            max: rules.max_top_k,
        }
    }
}

#[cfg(test)]
mod tests {
    use tandem_core::MetadataValue;

    use super::*;

    const RULES: RequestRules = RequestRules {
        require_email: false,
        max_top_k: 20,
    };

    fn parse(body: &str) -> Result<IndexRequest, ValidationError> {
        IndexRequest::parse(body.as_bytes(), RULES)
    }

    #[test]
    fn parses_minimal_request() {
        let request = parse(r#"{"text":"hello world","email":"a@b.com"}"#).unwrap();

        assert_eq!(request.text, "hello world");
        assert_eq!(request.email.as_deref(), Some("a@b.com"));
        assert!(request.metadata.is_empty());
        assert_eq!(request.top_k, None);
    }

    #[test]
    fn rejects_invalid_bodies() {
        assert_eq!(parse("not json"), Err(ValidationError::MalformedJson));
        assert_eq!(parse("[1, 2]"), Err(ValidationError::NotAnObject));
        assert_eq!(parse("{}"), Err(ValidationError::Text));
        assert_eq!(parse(r#"{"text":123}"#), Err(ValidationError::Text));
        assert_eq!(parse(r#"{"text":"  "}"#), Err(ValidationError::Text));
        assert_eq!(
            parse(r#"{"text":"hi","email":42}"#),
            Err(ValidationError::Email)
        );
    }

    #[test]
    fn email_can_be_required() {
        let rules = RequestRules {
            require_email: true,
            ..RULES
        };

        let error = IndexRequest::parse(br#"{"text":"hi"}"#, rules).unwrap_err();
        assert_eq!(error, ValidationError::Email);
        assert_eq!(error.to_string(), "Missing or invalid 'email' in body");
    }

    #[test]
    fn validates_top_k_range() {
        assert_eq!(parse(r#"{"text":"hi","topK":5}"#).unwrap().top_k, Some(5));
        assert_eq!(
            parse(r#"{"text":"hi","topK":0}"#),
            Err(ValidationError::TopK { max: 20 })
        );
        assert_eq!(
            parse(r#"{"text":"hi","topK":21}"#),
            Err(ValidationError::TopK { max: 20 })
        );
        assert_eq!(
            parse(r#"{"text":"hi","topK":2.5}"#),
            Err(ValidationError::TopK { max: 20 })
        );
    }

    #[test]
    fn null_optionals_are_absent() {
        let request = parse(r#"{"text":"hi","email":null,"metadata":null,"topK":null}"#).unwrap();

        assert_eq!(request.email, None);
        assert!(request.metadata.is_empty());
        assert_eq!(request.top_k, None);
    }

    #[test]
    fn text_is_reported_before_other_fields() {
        assert_eq!(
            parse(r#"{"text":" ","topK":0}"#),
            Err(ValidationError::Text)
        );
        assert_eq!(
            parse(r#"{"email":7,"topK":"ten"}"#),
            Err(ValidationError::Text)
        );
        assert_eq!(
            parse(r#"{"text":"hi","metadata":[],"topK":"ten"}"#),
            Err(ValidationError::Metadata("expected an object".to_owned()))
        );
        assert_eq!(
            parse(r#"{"text":"hi","topK":-1}"#),
            Err(ValidationError::TopK { max: 20 })
        );
    }

    #[test]
    fn metadata_must_be_primitive() {
        let request = parse(r#"{"text":"hi","metadata":{"source":"call","tags":["a"]}}"#).unwrap();
        assert_eq!(request.metadata.len(), 2);

        assert!(matches!(
            parse(r#"{"text":"hi","metadata":{"nested":{"a":1}}}"#),
            Err(ValidationError::Metadata(_))
        ));
        assert!(matches!(
            parse(r#"{"text":"hi","metadata":"flat"}"#),
            Err(ValidationError::Metadata(_))
        ));
    }

    #[test]
    fn vector_metadata_adds_text_and_email() {
        let request = parse(
            r#"{"text":"hello world","email":"a@b.com","metadata":{"text":"ignored","source":"call"}}"#,
        )
        .unwrap();

        let metadata = request.vector_metadata();
        assert_eq!(metadata.len(), 3);
        assert_eq!(
            metadata.get("text"),
            Some(&MetadataValue::String("hello world".into()))
        );
        assert_eq!(metadata.get("email").and_then(MetadataValue::as_str), Some("a@b.com"));
        assert_eq!(metadata.get("source").and_then(MetadataValue::as_str), Some("call"));
    }
}
