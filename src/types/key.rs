use super::ValidationError;
use crate::constants::ROOT_KEY;
use serde::{Deserialize, Serialize};
use std::borrow::Borrow;
use std::fmt;
use url::form_urlencoded;

/// Canonical identity of a resource in the cache.
///
/// Always the root-stripped form produced by [`UriNormalizer::normalize`];
/// the bare API root is `/`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CacheKey(String);

impl CacheKey {
    /// The key of the API root document.
    pub fn root() -> Self {
        Self(ROOT_KEY.to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for CacheKey {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl From<String> for CacheKey {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl Borrow<str> for CacheKey {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl AsRef<str> for CacheKey {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// The network-visible prefix every absolute resource URI of the API starts with.
///
/// Either an absolute `http(s)` URL or an absolute path such as `/api`.
/// A trailing slash is dropped so that stripping leaves keys starting with `/`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiRoot(String);

impl ApiRoot {
    pub fn new(input: impl AsRef<str>) -> Result<Self, ValidationError> {
        let trimmed = input.as_ref().trim();
        if trimmed.is_empty() {
            return Err(ValidationError::EmptyField("api_root"));
        }

        if !trimmed.starts_with('/') {
            let parsed = url::Url::parse(trimmed).map_err(|e| ValidationError::InvalidUrl {
                url: trimmed.to_string(),
                reason: e.to_string(),
            })?;
            if !matches!(parsed.scheme(), "http" | "https") {
                return Err(ValidationError::InvalidUrl {
                    url: trimmed.to_string(),
                    reason: format!("unsupported scheme '{}'", parsed.scheme()),
                });
            }
            if parsed.query().is_some() || parsed.fragment().is_some() {
                return Err(ValidationError::InvalidUrl {
                    url: trimmed.to_string(),
                    reason: "API root must not carry a query or fragment".to_string(),
                });
            }
        }

        Ok(Self(trimmed.trim_end_matches('/').to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Builds the network URI for a cache key.
    ///
    /// Keys that are already absolute URLs (resources outside the API root) pass through.
    pub fn join(&self, key: &CacheKey) -> String {
        let key = key.as_str();
        if key.starts_with("http://") || key.starts_with("https://") {
            key.to_string()
        } else if key.starts_with('/') {
            format!("{}{}", self.0, key)
        } else {
            format!("{}/{}", self.0, key)
        }
    }
}

impl fmt::Display for ApiRoot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Turns absolute or relative resource URIs into cache keys.
#[derive(Debug, Clone)]
pub struct UriNormalizer {
    root: ApiRoot,
    sort_query: bool,
}

impl UriNormalizer {
    pub fn new(root: ApiRoot) -> Self {
        Self {
            root,
            sort_query: false,
        }
    }

    /// Sort query parameters so that `?b=2&a=1` and `?a=1&b=2` share a key.
    pub fn sort_query(mut self, enabled: bool) -> Self {
        self.sort_query = enabled;
        self
    }

    pub fn root(&self) -> &ApiRoot {
        &self.root
    }

    /// Canonicalizes a resource URI.
    ///
    /// Absent or empty input maps to `/`. A leading API root is stripped; anything
    /// else is returned unchanged. The root only matches on a path boundary, so
    /// `http://api.test` does not strip `http://api.testing/x`.
    pub fn normalize(&self, uri: Option<&str>) -> CacheKey {
        let uri = match uri {
            Some(u) if !u.is_empty() => u,
            _ => return CacheKey::root(),
        };

        let stripped = match uri.strip_prefix(self.root.as_str()) {
            Some(rest) if rest.is_empty() => ROOT_KEY,
            Some(rest) if rest.starts_with('/') => rest,
            Some(rest) if rest.starts_with('?') => {
                return self.finish(format!("{}{}", ROOT_KEY, rest));
            }
            _ => uri,
        };

        self.finish(stripped.to_string())
    }

    fn finish(&self, key: String) -> CacheKey {
        if self.sort_query {
            CacheKey(sorted_query(&key))
        } else {
            CacheKey(key)
        }
    }
}

/// Reorders the query pairs of `uri` by key, then value. Fragments are kept as-is.
fn sorted_query(uri: &str) -> String {
    let (without_fragment, fragment) = match uri.split_once('#') {
        Some((head, frag)) => (head, Some(frag)),
        None => (uri, None),
    };
    let Some((path, query)) = without_fragment.split_once('?') else {
        return uri.to_string();
    };

    let mut pairs: Vec<(String, String)> = form_urlencoded::parse(query.as_bytes())
        .into_owned()
        .collect();
    pairs.sort();

    let mut out = path.to_string();
    if !pairs.is_empty() {
        let encoded = form_urlencoded::Serializer::new(String::new())
            .extend_pairs(pairs)
            .finish();
        out.push('?');
        out.push_str(&encoded);
    }
    if let Some(frag) = fragment {
        out.push('#');
        out.push_str(frag);
    }
    out
}
