//! The HTTP method allow-list.
//!
//! Operations can only be declared for the methods in [`ValidMethod`]. Any
//! other request method is rejected by the dispatcher before operation
//! selection, with an `Allow` header built by [`ValidMethod::allow_header`].

use std::fmt;
use std::str::FromStr;

use http::Method;
use serde::{Deserialize, Serialize};

/// An HTTP method an operation may be declared for.
///
/// # Example
///
/// ```rust
/// use heron_core::ValidMethod;
/// use http::Method;
///
/// assert_eq!(ValidMethod::from_http(&Method::POST), Some(ValidMethod::Post));
/// assert_eq!(ValidMethod::from_http(&Method::TRACE), None);
/// assert_eq!(ValidMethod::Patch.as_lowercase(), "patch");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ValidMethod {
    /// GET
    Get,
    /// PUT
    Put,
    /// POST
    Post,
    /// DELETE
    Delete,
    /// OPTIONS
    Options,
    /// HEAD
    Head,
    /// PATCH
    Patch,
}

impl ValidMethod {
    /// Every valid method, in allow-list order.
    pub const ALL: [ValidMethod; 7] = [
        Self::Get,
        Self::Put,
        Self::Post,
        Self::Delete,
        Self::Options,
        Self::Head,
        Self::Patch,
    ];

    /// Converts an `http::Method`, returning `None` for methods outside the allow-list.
    #[must_use]
    pub fn from_http(method: &Method) -> Option<Self> {
        match *method {
            Method::GET => Some(Self::Get),
            Method::PUT => Some(Self::Put),
            Method::POST => Some(Self::Post),
            Method::DELETE => Some(Self::Delete),
            Method::OPTIONS => Some(Self::Options),
            Method::HEAD => Some(Self::Head),
            Method::PATCH => Some(Self::Patch),
            _ => None,
        }
    }

    /// Returns the equivalent `http::Method`.
    #[must_use]
    pub fn to_http(self) -> Method {
        match self {
            Self::Get => Method::GET,
            Self::Put => Method::PUT,
            Self::Post => Method::POST,
            Self::Delete => Method::DELETE,
            Self::Options => Method::OPTIONS,
            Self::Head => Method::HEAD,
            Self::Patch => Method::PATCH,
        }
    }

    /// Upper-case method name, as sent on the wire.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Put => "PUT",
            Self::Post => "POST",
            Self::Delete => "DELETE",
            Self::Options => "OPTIONS",
            Self::Head => "HEAD",
            Self::Patch => "PATCH",
        }
    }

    /// Lower-case method name, as used for OpenAPI path item keys.
    #[must_use]
    pub const fn as_lowercase(self) -> &'static str {
        match self {
            Self::Get => "get",
            Self::Put => "put",
            Self::Post => "post",
            Self::Delete => "delete",
            Self::Options => "options",
            Self::Head => "head",
            Self::Patch => "patch",
        }
    }

    /// Builds an `Allow` header value.
    ///
    /// Methods keep their given order; repeats are dropped.
    ///
    /// ```rust
    /// use heron_core::ValidMethod;
    ///
    /// let allow = ValidMethod::allow_header([ValidMethod::Post, ValidMethod::Get, ValidMethod::Post]);
    /// assert_eq!(allow, "POST, GET");
    /// ```
    pub fn allow_header(methods: impl IntoIterator<Item = ValidMethod>) -> String {
        let mut seen: Vec<ValidMethod> = Vec::with_capacity(Self::ALL.len());
        for method in methods {
            if !seen.contains(&method) {
                seen.push(method);
            }
        }
        seen.iter()
            .map(|m| m.as_str())
            .collect::<Vec<_>>()
            .join(", ")
    }
}

impl fmt::Display for ValidMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ValidMethod {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|m| m.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| format!("unsupported HTTP method: {s}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_http_accepts_allow_list() {
        for method in ValidMethod::ALL {
            assert_eq!(ValidMethod::from_http(&method.to_http()), Some(method));
        }
    }

    #[test]
    fn test_from_http_rejects_others() {
        assert_eq!(ValidMethod::from_http(&Method::TRACE), None);
        assert_eq!(ValidMethod::from_http(&Method::CONNECT), None);
        let custom = Method::from_bytes(b"PURGE").unwrap();
        assert_eq!(ValidMethod::from_http(&custom), None);
    }

    #[test]
    fn test_allow_header_single() {
        assert_eq!(ValidMethod::allow_header([ValidMethod::Post]), "POST");
    }

    #[test]
    fn test_allow_header_keeps_declaration_order() {
        let allow = ValidMethod::allow_header([
            ValidMethod::Delete,
            ValidMethod::Get,
            ValidMethod::Delete,
            ValidMethod::Patch,
        ]);
        assert_eq!(allow, "DELETE, GET, PATCH");
    }

    #[test]
    fn test_allow_header_empty() {
        assert_eq!(ValidMethod::allow_header([]), "");
    }

    #[test]
    fn test_from_str_case_insensitive() {
        assert_eq!("post".parse::<ValidMethod>(), Ok(ValidMethod::Post));
        assert_eq!("Head".parse::<ValidMethod>(), Ok(ValidMethod::Head));
        assert!("TRACE".parse::<ValidMethod>().is_err());
    }

    #[test]
    fn test_serde_uppercase() {
        let json = serde_json::to_string(&ValidMethod::Options).unwrap();
        assert_eq!(json, "\"OPTIONS\"");
        let back: ValidMethod = serde_json::from_str("\"PATCH\"").unwrap();
        assert_eq!(back, ValidMethod::Patch);
    }
}
