//! Route classification: public, auth-only, or protected.

use brokle_core::config::RoutesConfig;

/// The three route classes the gate distinguishes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouteClass {
    /// Never requires a token.
    Public,
    /// Only for signed-out visitors (sign-in, sign-up, ...).
    AuthOnly,
    /// Requires a verified, non-expired token.
    Protected,
}

impl RouteClass {
    /// Lowercase label for logs.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Public => "public",
            Self::AuthOnly => "auth_only",
            Self::Protected => "protected",
        }
    }
}

/// Path prefixes for each non-protected route class.
#[derive(Debug, Clone)]
pub struct RouteTable {
    public: Vec<String>,
    auth_only: Vec<String>,
}

impl RouteTable {
    /// Builds the table from configuration, normalizing trailing slashes.
    pub fn from_config(config: &RoutesConfig) -> Self {
        Self {
            public: config.public_paths.iter().map(|p| normalize(p)).collect(),
            auth_only: config.auth_only_paths.iter().map(|p| normalize(p)).collect(),
        }
    }

    /// Classifies a request path. Public entries win over auth-only ones;
    /// everything unlisted is protected.
    pub fn classify(&self, path: &str) -> RouteClass {
        if self.public.iter().any(|p| path_matches(p, path)) {
            RouteClass::Public
        } else if self.auth_only.iter().any(|p| path_matches(p, path)) {
            RouteClass::AuthOnly
        } else {
            RouteClass::Protected
        }
    }
}

fn normalize(pattern: &str) -> String {
    let trimmed = pattern.trim().trim_end_matches('/');
    if trimmed.is_empty() {
        "/".to_string()
    } else if trimmed.starts_with('/') {
        trimmed.to_string()
    } else {
        format!("/{trimmed}")
    }
}

/// `/` matches only the root; other patterns match themselves and any
/// sub-path on a segment boundary.
fn path_matches(pattern: &str, path: &str) -> bool {
    if pattern == "/" {
        return path == "/";
    }
    match path.strip_prefix(pattern) {
        Some(rest) => rest.is_empty() || rest.starts_with('/'),
        None => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table() -> RouteTable {
        RouteTable::from_config(&RoutesConfig::default())
    }

    #[test]
    fn test_root_is_exact() {
        let t = table();
        assert_eq!(t.classify("/"), RouteClass::Public);
        assert_eq!(t.classify("/dashboard"), RouteClass::Protected);
    }

    #[test]
    fn test_prefix_respects_segments() {
        let t = table();
        assert_eq!(t.classify("/api/health"), RouteClass::Public);
        assert_eq!(t.classify("/api/health/live"), RouteClass::Public);
        assert_eq!(t.classify("/api/healthz"), RouteClass::Protected);
        assert_eq!(t.classify("/_next/static/chunk.js"), RouteClass::Public);
    }

    #[test]
    fn test_auth_only_paths() {
        let t = table();
        assert_eq!(t.classify("/auth/signin"), RouteClass::AuthOnly);
        assert_eq!(t.classify("/auth/signup/verify"), RouteClass::AuthOnly);
        assert_eq!(t.classify("/auth/callback"), RouteClass::Protected);
    }

    #[test]
    fn test_trailing_slash_in_config() {
        let config = RoutesConfig {
            public_paths: vec!["docs/".into()],
            ..RoutesConfig::default()
        };
        let t = RouteTable::from_config(&config);
        assert_eq!(t.classify("/docs"), RouteClass::Public);
        assert_eq!(t.classify("/docs/intro"), RouteClass::Public);
    }
}
