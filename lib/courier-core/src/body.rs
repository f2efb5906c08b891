//! Body and query serialization.

use bytes::Bytes;

use crate::Result;

/// Content types the request builder sets for structured bodies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ContentType {
    /// `application/json`
    Json,
    /// `application/x-www-form-urlencoded`
    FormUrlEncoded,
}

impl ContentType {
    /// Get the MIME type string.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Json => "application/json",
            Self::FormUrlEncoded => "application/x-www-form-urlencoded",
        }
    }
}

impl std::fmt::Display for ContentType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Serialize a value to JSON bytes.
///
/// # Errors
///
/// Returns an error if JSON serialization fails.
///
/// # Example
///
/// ```
/// use courier_core::to_json;
///
/// #[derive(serde::Serialize)]
/// struct NewItem { title: String }
///
/// let bytes = to_json(&NewItem { title: "milk".to_string() }).expect("serialize");
/// assert_eq!(bytes.as_ref(), br#"{"title":"milk"}"#);
/// ```
pub fn to_json<T: serde::Serialize>(value: &T) -> Result<Bytes> {
    serde_json::to_vec(value)
        .map(Bytes::from)
        .map_err(Into::into)
}

/// Serialize a value to form URL-encoded bytes.
///
/// `Vec<T>` fields become repeated keys (`tag=a&tag=b`).
///
/// # Errors
///
/// Returns an error if form serialization fails.
pub fn to_form<T: serde::Serialize>(value: &T) -> Result<Bytes> {
    serde_html_form::to_string(value)
        .map(|s| Bytes::from(s.into_bytes()))
        .map_err(Into::into)
}

/// Serialize a value to a query string.
///
/// # Errors
///
/// Returns an error if query serialization fails.
///
/// # Example
///
/// ```
/// use courier_core::to_query_string;
///
/// #[derive(serde::Serialize)]
/// struct Page {
///     page: u32,
///     #[serde(skip_serializing_if = "Option::is_none")]
///     per_page: Option<u32>,
/// }
///
/// let query = to_query_string(&Page { page: 2, per_page: None }).expect("serialize");
/// assert_eq!(query, "page=2");
/// ```
pub fn to_query_string<T: serde::Serialize>(value: &T) -> Result<String> {
    serde_html_form::to_string(value).map_err(Into::into)
}

/// Deserialize JSON bytes, reporting the path of the field that failed.
///
/// # Errors
///
/// Returns [`Error::JsonDeserialization`](crate::Error::JsonDeserialization)
/// with the failing path (e.g. `items.0.id`).
pub fn from_json<T: serde::de::DeserializeOwned>(bytes: &[u8]) -> Result<T> {
    let mut deserializer = serde_json::Deserializer::from_slice(bytes);
    serde_path_to_error::deserialize(&mut deserializer).map_err(|e| {
        crate::Error::json_deserialization(e.path().to_string(), e.inner().to_string())
    })
}
