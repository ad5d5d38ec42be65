//! Proxy prefix handling.
//!
//! # Responsibilities
//! - Normalize the configured prefix (`/proxy`, `/proxy/` and `proxy` are equal)
//! - Produce the axum route patterns that cover the prefix
//! - Strip the prefix from an inbound path, leaving the raw target segment

/// Path of the liveness endpoint, served outside the proxy prefix.
pub const HEALTH_PATH: &str = "/health";

/// The mount point under which every path carries an embedded target URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProxyRoute {
    prefix: String,
}

impl ProxyRoute {
    /// Create a route for the given prefix.
    pub fn new(prefix: impl AsRef<str>) -> Self {
        let trimmed = prefix.as_ref().trim().trim_matches('/');
        Self {
            prefix: format!("/{}", trimmed),
        }
    }

    /// Normalized prefix, always starting with `/` and never ending with one.
    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// True when the bare prefix is `path`, so both would claim the same route.
    pub fn shadows(&self, path: &str) -> bool {
        self.prefix == path
    }

    /// Route patterns to register: the bare prefix, the prefix with a trailing
    /// slash, and the catch-all below it.
    pub fn patterns(&self) -> [String; 3] {
        [
            self.prefix.clone(),
            format!("{}/", self.prefix),
            format!("{}/{{*target}}", self.prefix),
        ]
    }

    /// Raw (still percent-encoded) target segment of `path`, or `None` when the
    /// path is not under this prefix.
    pub fn target_segment<'a>(&self, path: &'a str) -> Option<&'a str> {
        let rest = path.strip_prefix(self.prefix.as_str())?;
        if rest.is_empty() {
            return Some(rest);
        }
        rest.strip_prefix('/')
    }
}

impl Default for ProxyRoute {
    fn default() -> Self {
        Self::new("/proxy")
    }
}
