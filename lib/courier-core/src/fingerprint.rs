//! Cache keys derived from a request.

use derive_more::Display;

use crate::Request;

/// Deterministic cache key for a `(method, URL, query)` triple.
///
/// The canonical form is `METHOD scheme://authority/path?query`, where the
/// query merges the URL's own pairs with the request's query list, sorted by
/// key then value and form-encoded. Headers, body and fragment do not
/// participate.
///
/// # Example
///
/// ```
/// use courier_core::{Fingerprint, Method, Request};
///
/// let url: url::Url = "https://api.example.com/items".parse().unwrap();
/// let a = Request::builder(Method::Get, url.clone()).query("b", "2").query("a", "1").build();
/// let b = Request::builder(Method::Get, url).query("a", "1").query("b", "2").build();
///
/// assert_eq!(Fingerprint::of(&a), Fingerprint::of(&b));
/// assert_eq!(Fingerprint::of(&a).as_str(), "GET https://api.example.com/items?a=1&b=2");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Display)]
pub struct Fingerprint(String);

impl Fingerprint {
    /// Computes the fingerprint of a request.
    #[must_use]
    pub fn of(request: &Request) -> Self {
        let url = request.url();

        let mut pairs: Vec<(String, String)> = url.query_pairs().into_owned().collect();
        pairs.extend(request.query().iter().cloned());
        pairs.sort();

        let mut base = url.clone();
        base.set_query(None);
        base.set_fragment(None);

        let mut key = format!("{} {base}", request.method());
        if !pairs.is_empty() {
            let query = url::form_urlencoded::Serializer::new(String::new())
                .extend_pairs(&pairs)
                .finish();
            key.push('?');
            key.push_str(&query);
        }
        Self(key)
    }

    /// The canonical key.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&Request> for Fingerprint {
    fn from(request: &Request) -> Self {
        Self::of(request)
    }
}
