//! Request method as a typed enum.
//!
//! Covers the verbs a route declaration may carry. [`Method::All`] is a
//! routing-level wildcard — it never appears on the wire, but a route
//! declared under it admits any request method.
//!
//! Unknown method strings are rejected at the server level with
//! `405 Method Not Allowed` before they ever reach a controller.

use std::fmt;
use std::str::FromStr;

/// A routable request method.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum Method {
    /// Routing wildcard — admits every wire method.
    All,
    Delete,
    Get,
    Head,
    Options,
    Patch,
    Post,
    Put,
}

impl Method {
    /// Returns the uppercase wire representation (e.g. `"GET"`).
    pub fn as_str(self) -> &'static str {
        match self {
            Self::All     => "ALL",
            Self::Delete  => "DELETE",
            Self::Get     => "GET",
            Self::Head    => "HEAD",
            Self::Options => "OPTIONS",
            Self::Patch   => "PATCH",
            Self::Post    => "POST",
            Self::Put     => "PUT",
        }
    }

    /// Whether a route declared under `self` fires for a request made with
    /// `request`. Exact match, except `All`, which admits everything.
    pub fn admits(self, request: Method) -> bool {
        self == Method::All || self == request
    }
}

/// Parses an uppercase method string (e.g. `"GET"`). Case-sensitive per RFC 9110 §9.1.
impl FromStr for Method {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "ALL"     => Ok(Self::All),
            "DELETE"  => Ok(Self::Delete),
            "GET"     => Ok(Self::Get),
            "HEAD"    => Ok(Self::Head),
            "OPTIONS" => Ok(Self::Options),
            "PATCH"   => Ok(Self::Patch),
            "POST"    => Ok(Self::Post),
            "PUT"     => Ok(Self::Put),
            _         => Err(()),
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn all_admits_every_wire_method() {
        for m in [Method::Delete, Method::Get, Method::Head, Method::Options,
                  Method::Patch, Method::Post, Method::Put] {
            assert!(Method::All.admits(m));
        }
    }

    #[test]
    fn concrete_verbs_admit_only_themselves() {
        assert!(Method::Get.admits(Method::Get));
        assert!(!Method::Get.admits(Method::Post));
        assert!(!Method::Post.admits(Method::All));
    }

    #[test]
    fn wire_round_trip() {
        assert_eq!("GET".parse::<Method>(), Ok(Method::Get));
        assert_eq!(Method::Patch.as_str(), "PATCH");
        assert!("get".parse::<Method>().is_err());
        assert!("PURGE".parse::<Method>().is_err());
    }
}
