//! HTTP method types.

use derive_more::Display;

/// HTTP request method.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Display)]
pub enum Method {
    /// GET method - retrieve a resource.
    #[display("GET")]
    Get,
    /// POST method - create a resource.
    #[display("POST")]
    Post,
    /// PUT method - replace a resource.
    #[display("PUT")]
    Put,
    /// DELETE method - remove a resource.
    #[display("DELETE")]
    Delete,
    /// PATCH method - partially update a resource.
    #[display("PATCH")]
    Patch,
}

impl Method {
    /// Returns `true` if repeating the request has the same effect as sending it once.
    #[must_use]
    pub const fn is_idempotent(&self) -> bool {
        matches!(self, Self::Get | Self::Put | Self::Delete)
    }

    /// Returns `true` if successful responses to this method may be served from cache.
    #[must_use]
    pub const fn is_cacheable(&self) -> bool {
        matches!(self, Self::Get)
    }
}

impl From<Method> for http::Method {
    fn from(method: Method) -> Self {
        match method {
            Method::Get => Self::GET,
            Method::Post => Self::POST,
            Method::Put => Self::PUT,
            Method::Delete => Self::DELETE,
            Method::Patch => Self::PATCH,
        }
    }
}

impl TryFrom<http::Method> for Method {
    type Error = crate::Error;

    fn try_from(method: http::Method) -> Result<Self, Self::Error> {
        match method {
            http::Method::GET => Ok(Self::Get),
            http::Method::POST => Ok(Self::Post),
            http::Method::PUT => Ok(Self::Put),
            http::Method::DELETE => Ok(Self::Delete),
            http::Method::PATCH => Ok(Self::Patch),
            other => Err(crate::Error::invalid_request(format!(
                "unsupported HTTP method: {other}"
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn method_display() {
        assert_eq!(Method::Get.to_string(), "GET");
        assert_eq!(Method::Post.to_string(), "POST");
        assert_eq!(Method::Put.to_string(), "PUT");
        assert_eq!(Method::Delete.to_string(), "DELETE");
        assert_eq!(Method::Patch.to_string(), "PATCH");
    }

    #[test]
    fn method_is_idempotent() {
        assert!(Method::Get.is_idempotent());
        assert!(Method::Put.is_idempotent());
        assert!(Method::Delete.is_idempotent());
        assert!(!Method::Post.is_idempotent());
        assert!(!Method::Patch.is_idempotent());
    }

    #[test]
    fn only_get_is_cacheable() {
        assert!(Method::Get.is_cacheable());
        for method in [Method::Post, Method::Put, Method::Delete, Method::Patch] {
            assert!(!method.is_cacheable(), "{method} should not be cacheable");
        }
    }

    #[test]
    fn method_into_http() {
        assert_eq!(http::Method::from(Method::Get), http::Method::GET);
        assert_eq!(http::Method::from(Method::Patch), http::Method::PATCH);
    }

    #[test]
    fn method_from_http() {
        assert_eq!(
            Method::try_from(http::Method::DELETE).expect("DELETE"),
            Method::Delete
        );
        assert!(Method::try_from(http::Method::OPTIONS).is_err());
    }
}
