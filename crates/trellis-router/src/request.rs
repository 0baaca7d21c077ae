//! The request descriptor the resolver consumes.
//!
//! The core never reads ambient process or server state; callers build a
//! [`RouteRequest`] from whatever transport they front.

use crate::segment::Method;

/// Method and path of one incoming request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteRequest {
    pub method: Method,
    pub path: String,
}

impl RouteRequest {
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        RouteRequest {
            method,
            path: path.into(),
        }
    }

    /// Builds a request from raw tokens. Returns `None` for methods the
    /// router does not route; callers translate that into a 404.
    pub fn parse(method: &str, path: &str) -> Option<Self> {
        Some(RouteRequest::new(Method::parse(method)?, path))
    }

    /// Path segments: leading/trailing slashes trimmed, empty segments
    /// dropped, and the relative components `.`/`..` rejected so a
    /// request can never walk out of the routes tree. An empty result
    /// means a root lookup.
    pub fn segments(&self) -> Vec<&str> {
        self.path
            .split('/')
            .filter(|s| !s.is_empty() && *s != "." && *s != "..")
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn splits_path_into_segments() {
        let request = RouteRequest::new(Method::Get, "/users/42/posts");
        assert_eq!(request.segments(), vec!["users", "42", "posts"]);
    }

    #[test]
    fn trailing_and_doubled_slashes_are_trimmed() {
        let request = RouteRequest::new(Method::Get, "/blog//drafts/");
        assert_eq!(request.segments(), vec!["blog", "drafts"]);
    }

    #[test]
    fn root_paths_have_no_segments() {
        assert!(RouteRequest::new(Method::Get, "/").segments().is_empty());
        assert!(RouteRequest::new(Method::Get, "").segments().is_empty());
    }

    #[test]
    fn relative_components_are_dropped() {
        let request = RouteRequest::new(Method::Get, "/../etc/passwd");
        assert_eq!(request.segments(), vec!["etc", "passwd"]);
    }

    #[test]
    fn parse_rejects_unknown_methods() {
        assert!(RouteRequest::parse("TRACE", "/about").is_none());
        assert!(RouteRequest::parse("delete", "/about").is_some());
    }
}
