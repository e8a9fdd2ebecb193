//! Strict JSON request decoding.
//!
//! # Responsibilities
//! - Bound the body with the configured byte cap
//! - Decode exactly one JSON value into the caller's type
//! - Optionally reject keys the target type does not declare
//! - Translate every parser failure into the toolkit taxonomy
//!
//! # Design Decisions
//! - Unknown keys are detected at runtime (`serde_ignored`), so strictness is
//!   a per-call policy rather than a property of the target type
//! - Field paths for type errors come from `serde_path_to_error`
//! - Byte offsets are derived from serde_json's line/column positions

use std::io;

use axum::extract::{FromRef, FromRequest, Request};
use serde::de::DeserializeOwned;
use serde_json::error::Category;

use crate::config::JsonPolicy;
use crate::error::{ToolkitError, ToolkitResult};
use crate::observability::metrics;
use crate::security::limits::{check_content_length, read_to_end};

/// Read the request body and decode it strictly into `T`.
pub async fn read_json<T: DeserializeOwned>(
    request: Request,
    policy: &JsonPolicy,
) -> ToolkitResult<T> {
    let (parts, body) = request.into_parts();

    let result = match check_content_length(&parts.headers, policy.max_json_bytes) {
        Ok(()) => match read_to_end(body, policy.max_json_bytes).await {
            Ok(bytes) => decode_json(&bytes, policy),
            Err(err) => Err(err),
        },
        Err(err) => Err(err),
    };

    if let Err(err) = &result {
        tracing::debug!(
            reason = err.reason(),
            path = %parts.uri.path(),
            "Rejected JSON request body"
        );
        metrics::record_json_failure(err);
    }

    result
}

/// Decode a complete body into `T` under `policy`.
///
/// The byte cap is not applied here; [`read_json`] enforces it while reading.
pub fn decode_json<T: DeserializeOwned>(body: &[u8], policy: &JsonPolicy) -> ToolkitResult<T> {
    if body.iter().all(|&b| is_json_whitespace(b)) {
        return Err(ToolkitError::EmptyBody);
    }

    let mut unknown: Option<String> = None;
    let mut de = serde_json::Deserializer::from_slice(body);

    let decoded = {
        let mut on_ignored = |path: serde_ignored::Path<'_>| {
            if unknown.is_none() {
                unknown = Some(path.to_string());
            }
        };
        let tracked = serde_ignored::Deserializer::new(&mut de, &mut on_ignored);
        serde_path_to_error::deserialize::<_, T>(tracked)
    };
    let value = decoded.map_err(|err| classify(err, body))?;

    if !policy.allow_unknown_fields {
        if let Some(field) = unknown {
            return Err(ToolkitError::UnknownField { field });
        }
    }

    de.end().map_err(|_| ToolkitError::MultipleJsonValues)?;

    Ok(value)
}

/// Extractor decoding the body with the [`JsonPolicy`] found in router state.
///
/// ```ignore
/// async fn create(StrictJson(input): StrictJson<NewItem>) -> impl IntoResponse { ... }
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct StrictJson<T>(pub T);

impl<S, T> FromRequest<S> for StrictJson<T>
where
    T: DeserializeOwned + Send,
    S: Send + Sync,
    JsonPolicy: FromRef<S>,
{
    type Rejection = ToolkitError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let policy = JsonPolicy::from_ref(state);
        read_json(req, &policy).await.map(StrictJson)
    }
}

fn is_json_whitespace(b: u8) -> bool {
    matches!(b, b' ' | b'\t' | b'\n' | b'\r')
}

fn classify(err: serde_path_to_error::Error<serde_json::Error>, body: &[u8]) -> ToolkitError {
    let field = known_path(&err.path().to_string());
    let inner = err.into_inner();
    let offset = byte_offset(body, inner.line(), inner.column());

    match inner.classify() {
        Category::Syntax => ToolkitError::Syntax { offset },
        Category::Eof => ToolkitError::Syntax { offset: None },
        Category::Io => ToolkitError::Io(io::Error::other(inner)),
        Category::Data => {
            let message = inner.to_string();
            if let Some(name) = message.strip_prefix("unknown field ").and_then(backticked) {
                ToolkitError::UnknownField {
                    field: qualify(field.as_deref(), name),
                }
            } else if let Some(name) = message.strip_prefix("missing field ").and_then(backticked)
            {
                ToolkitError::MissingField {
                    field: qualify(field.as_deref(), name),
                }
            } else {
                ToolkitError::TypeMismatch { field, offset }
            }
        }
    }
}

// Drops segments serde_path_to_error could not name.
fn known_path(path: &str) -> Option<String> {
    let segments: Vec<&str> = path
        .split('.')
        .filter(|s| !s.is_empty() && *s != "?")
        .collect();
    (!segments.is_empty()).then(|| segments.join("."))
}

/// First backtick-quoted token, as serde formats field names.
fn backticked(message: &str) -> Option<&str> {
    let rest = message.strip_prefix('`')?;
    rest.split_once('`').map(|(name, _)| name)
}

fn qualify(parent: Option<&str>, name: &str) -> String {
    match parent {
        Some(parent) if parent == name || parent.ends_with(&format!(".{name}")) => {
            parent.to_string()
        }
        Some(parent) => format!("{parent}.{name}"),
        None => name.to_string(),
    }
}

/// Convert serde_json's 1-based line and column into a byte count from the
/// start of the body.
fn byte_offset(body: &[u8], line: usize, column: usize) -> Option<u64> {
    if line == 0 {
        return None;
    }
    let line_start: usize = body
        .split(|&b| b == b'\n')
        .take(line - 1)
        .map(|l| l.len() + 1)
        .sum();
    Some((line_start + column) as u64)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, Default, Deserialize, PartialEq)]
    #[serde(default)]
    struct Foo {
        foo: String,
    }

    #[derive(Debug, Deserialize)]
    struct Nested {
        inner: Foo,
        count: u32,
    }

    fn strict() -> JsonPolicy {
        JsonPolicy::default().with_max_json_bytes(1024)
    }

    fn lenient() -> JsonPolicy {
        strict().with_unknown_fields(true)
    }

    #[test]
    fn test_good_json() {
        let decoded: Foo = decode_json(br#"{"foo":"bar"}"#, &strict()).unwrap();
        assert_eq!(decoded.foo, "bar");
    }

    #[test]
    fn test_badly_formatted() {
        let err = decode_json::<Foo>(br#"{"foo":}"#, &strict()).unwrap_err();
        assert!(matches!(err, ToolkitError::Syntax { offset: Some(8) }), "{err:?}");
        assert_eq!(err.to_string(), "body contains badly formed JSON at character 8");
    }

    #[test]
    fn test_incorrect_type_names_field() {
        let err = decode_json::<Foo>(br#"{"foo": 1}"#, &strict()).unwrap_err();
        match err {
            ToolkitError::TypeMismatch { field, .. } => assert_eq!(field.as_deref(), Some("foo")),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_incorrect_top_level_type_uses_offset() {
        let err = decode_json::<Foo>(br#""just a string""#, &strict()).unwrap_err();
        assert!(matches!(err, ToolkitError::TypeMismatch { field: None, offset: Some(_) }));
    }

    #[test]
    fn test_two_values() {
        let err = decode_json::<Foo>(br#"{"foo": "bar"}{"alpha":"beta"}"#, &strict()).unwrap_err();
        assert!(matches!(err, ToolkitError::MultipleJsonValues));

        let err = decode_json::<Foo>(br#"{"foo": "bar"} trailing"#, &strict()).unwrap_err();
        assert!(matches!(err, ToolkitError::MultipleJsonValues));

        let ok: Foo = decode_json(b"{\"foo\": \"bar\"}\n\n", &strict()).unwrap();
        assert_eq!(ok.foo, "bar");
    }

    #[test]
    fn test_empty_body() {
        assert!(matches!(decode_json::<Foo>(b"", &strict()), Err(ToolkitError::EmptyBody)));
        assert!(matches!(decode_json::<Foo>(b" \r\n\t", &strict()), Err(ToolkitError::EmptyBody)));
    }

    #[test]
    fn test_syntax_errors() {
        let bodies: [&[u8]; 3] = [br#"{"foo":1"}"#, br#"{booo:"1"}"#, b"hello"];
        for body in bodies {
            assert!(decode_json::<Foo>(body, &lenient()).is_err(), "{body:?}");
        }
        assert!(matches!(
            decode_json::<Foo>(br#"{booo:"1"}"#, &lenient()),
            Err(ToolkitError::Syntax { offset: Some(_) })
        ));
        assert!(matches!(
            decode_json::<Foo>(br#"{"foo":"bar""#, &lenient()),
            Err(ToolkitError::Syntax { offset: None })
        ));
    }

    #[test]
    fn test_unknown_field() {
        let err = decode_json::<Foo>(br#"{"fooo":"1"}"#, &strict()).unwrap_err();
        match &err {
            ToolkitError::UnknownField { field } => assert_eq!(field, "fooo"),
            other => panic!("unexpected {other:?}"),
        }
        assert_eq!(err.to_string(), "body contains unknown key \"fooo\"");
    }

    #[test]
    fn test_allow_unknown_field() {
        let decoded: Foo = decode_json(br#"{"fooo":"1"}"#, &lenient()).unwrap();
        assert_eq!(decoded, Foo::default());
    }

    #[test]
    fn test_nested_paths() {
        let err = decode_json::<Nested>(br#"{"inner":{"foo":"a","x":1},"count":1}"#, &strict())
            .unwrap_err();
        assert!(matches!(err, ToolkitError::UnknownField { ref field } if field == "inner.x"));

        let err = decode_json::<Nested>(br#"{"inner":{"foo":2},"count":1}"#, &strict())
            .unwrap_err();
        assert!(matches!(err, ToolkitError::TypeMismatch { field: Some(ref f), .. } if f == "inner.foo"));

        let err = decode_json::<Nested>(br#"{"inner":{}}"#, &strict()).unwrap_err();
        assert!(matches!(err, ToolkitError::MissingField { ref field } if field == "count"));
    }

    #[test]
    fn test_deny_unknown_fields_targets() {
        #[derive(Debug, Deserialize)]
        #[serde(deny_unknown_fields)]
        #[allow(dead_code)]
        struct Closed {
            foo: String,
        }

        let err = decode_json::<Closed>(br#"{"foo":"a","bar":1}"#, &lenient()).unwrap_err();
        assert!(matches!(err, ToolkitError::UnknownField { ref field } if field == "bar"));
    }

    #[test]
    fn test_byte_offset() {
        assert_eq!(byte_offset(b"abc", 1, 2), Some(2));
        assert_eq!(byte_offset(b"ab\ncd", 2, 1), Some(4));
        assert_eq!(byte_offset(b"", 0, 0), None);
    }

    #[test]
    fn test_known_path() {
        assert_eq!(known_path("."), None);
        assert_eq!(known_path("?"), None);
        assert_eq!(known_path("inner.foo").as_deref(), Some("inner.foo"));
        assert_eq!(known_path("items.0.?").as_deref(), Some("items.0"));
    }

    #[test]
    fn test_qualify() {
        assert_eq!(qualify(None, "a"), "a");
        assert_eq!(qualify(Some("outer"), "a"), "outer.a");
        assert_eq!(qualify(Some("outer.a"), "a"), "outer.a");
    }
}
