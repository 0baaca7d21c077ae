//! Segment and filename classification for routes-tree entries.
//!
//! The routes directory uses naming conventions to declare how a path
//! segment is matched:
//! - `about` — static, matched literally
//! - `[id]` — dynamic, matches any segment and binds it to `id`
//! - `[category]-[brand]-[id]` — composite filename stem, matched with a
//!   derived regular expression binding each token left to right
//!
//! Handler files carry an optional HTTP method suffix before the extension
//! (`users.post.php`); a missing suffix means `get`.

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;

/// File extension handler files must carry.
pub const HANDLER_EXT: &str = "php";

/// HTTP methods a handler file can be pinned to.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum Method {
    Get,
    Post,
    Put,
    Delete,
    Patch,
}

impl Method {
    /// Parses a request method token, case-insensitively.
    ///
    /// Unknown tokens return `None`; the caller treats the request as
    /// unroutable rather than erroring.
    pub fn parse(token: &str) -> Option<Method> {
        Method::from_suffix(&token.to_ascii_lowercase())
    }

    /// Parses a filename method suffix. Suffixes are lowercase only:
    /// `users.POST.php` is a plain GET handler with the stem `users.POST`.
    fn from_suffix(suffix: &str) -> Option<Method> {
        match suffix {
            "get" => Some(Method::Get),
            "post" => Some(Method::Post),
            "put" => Some(Method::Put),
            "delete" => Some(Method::Delete),
            "patch" => Some(Method::Patch),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Method::Get => "get",
            Method::Post => "post",
            Method::Put => "put",
            Method::Delete => "delete",
            Method::Patch => "patch",
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A handler filename split into its stem and method.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HandlerFilename {
    /// Filename with the extension and any method suffix stripped.
    pub stem: String,
    pub method: Method,
    /// Whether the method came from an explicit suffix rather than the
    /// GET default. Explicit files win ties against default files.
    pub explicit_method: bool,
}

/// Parses `<stem>.php` or `<stem>.<method>.php`. Any other file is not a
/// handler and returns `None`.
pub fn parse_handler_filename(file_name: &str) -> Option<HandlerFilename> {
    let stem = file_name.strip_suffix(&format!(".{HANDLER_EXT}"))?;
    if stem.is_empty() {
        return None;
    }

    if let Some((name, suffix)) = stem.rsplit_once('.') {
        if let Some(method) = Method::from_suffix(suffix) {
            if name.is_empty() {
                return None;
            }
            return Some(HandlerFilename {
                stem: name.to_string(),
                method,
                explicit_method: true,
            });
        }
    }

    Some(HandlerFilename {
        stem: stem.to_string(),
        method: Method::Get,
        explicit_method: false,
    })
}

/// Checks a bracketed parameter name against the `\w+` grammar.
fn is_param_name(name: &str) -> bool {
    !name.is_empty()
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_')
}

/// Extracts the parameter name from a whole-segment `[name]` pattern.
///
/// Names outside the `\w+` grammar are not recognized as dynamic, so
/// `[bad name]` stays a literal directory or filename.
pub fn dynamic_param_name(name: &str) -> Option<&str> {
    let inner = name.strip_prefix('[')?.strip_suffix(']')?;
    is_param_name(inner).then_some(inner)
}

/// A filename stem containing several `[name]` tokens and/or literal text,
/// matched against a whole segment with a derived anchored regex.
#[derive(Debug, Clone)]
pub struct CompositePattern {
    /// Parameter names in declaration (left to right) order.
    pub params: Vec<String>,
    regex: Regex,
}

impl CompositePattern {
    /// Parses a stem like `[category]-[brand]-[id]` into a pattern.
    ///
    /// Returns `None` for stems without brackets, plain `[name]` stems
    /// (those are whole-segment dynamic matches, not composites), and
    /// stems whose bracketed names fall outside the parameter grammar.
    pub fn parse(stem: &str) -> Option<CompositePattern> {
        let mut params = Vec::new();
        let mut pattern = String::from("^");
        let mut saw_literal = false;
        let mut rest = stem;

        while let Some(open) = rest.find('[') {
            let (literal, bracketed) = rest.split_at(open);
            if !literal.is_empty() {
                saw_literal = true;
                pattern.push_str(&regex::escape(literal));
            }
            let close = bracketed.find(']')?;
            let name = &bracketed[1..close];
            if !is_param_name(name) {
                return None;
            }
            params.push(name.to_string());
            // Lazy so each token stops at the next literal separator.
            pattern.push_str("([^/]+?)");
            rest = &bracketed[close + 1..];
        }

        if rest.contains(']') {
            return None;
        }
        if !rest.is_empty() {
            saw_literal = true;
            pattern.push_str(&regex::escape(rest));
        }
        pattern.push('$');

        if params.is_empty() || (params.len() == 1 && !saw_literal) {
            return None;
        }

        let regex = Regex::new(&pattern).ok()?;
        Some(CompositePattern { params, regex })
    }

    /// Matches a segment, binding each token in declaration order.
    pub fn capture(&self, segment: &str) -> Option<Vec<(String, String)>> {
        let captures = self.regex.captures(segment)?;
        let bindings = self
            .params
            .iter()
            .zip(captures.iter().skip(1))
            .filter_map(|(name, group)| {
                group.map(|m| (name.clone(), m.as_str().to_string()))
            })
            .collect();
        Some(bindings)
    }
}

impl PartialEq for CompositePattern {
    fn eq(&self, other: &Self) -> bool {
        self.params == other.params && self.regex.as_str() == other.regex.as_str()
    }
}

/// How a filename stem matches an incoming path segment.
#[derive(Debug, Clone, PartialEq)]
pub enum SegmentPattern {
    /// Matched literally.
    Static(String),
    /// `[name]`: matches any segment, binds it whole.
    Dynamic(String),
    /// Multiple tokens and/or literal text, matched via regex.
    Composite(CompositePattern),
}

/// Classifies a filename stem.
pub fn classify_stem(stem: &str) -> SegmentPattern {
    if let Some(name) = dynamic_param_name(stem) {
        return SegmentPattern::Dynamic(name.to_string());
    }
    if let Some(pattern) = CompositePattern::parse(stem) {
        return SegmentPattern::Composite(pattern);
    }
    SegmentPattern::Static(stem.to_string())
}
