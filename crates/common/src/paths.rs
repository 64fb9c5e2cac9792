//! Ordered path classification.
//!
//! Every request path is classified as public, authentication-required or
//! internal by walking an explicit rule table. Precedence is fixed and does
//! not depend on the order rules were supplied in:
//!
//! 0. internal rules (health checks, API docs, metrics)
//! 1. exact matches
//! 2. prefix matches
//! 3. suffix matches
//! 4. substring matches
//! 5. default: authentication required
//!
//! Within one tier rules keep their supplied order. The first match wins.

use std::fmt;

/// Authentication treatment for a request path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PathClass {
    /// No credential needed; the edge still attaches the gateway secret.
    Public,
    /// A valid bearer credential is required.
    AuthRequired,
    /// Operational endpoint; bypasses authentication and trust checks at
    /// every layer.
    Internal,
}

impl PathClass {
    /// Bounded label for logs and metrics.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            PathClass::Public => "public",
            PathClass::AuthRequired => "auth_required",
            PathClass::Internal => "internal",
        }
    }
}

impl fmt::Display for PathClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How a rule's pattern is compared against a path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MatchKind {
    /// Path equals the pattern.
    Exact,
    /// Path starts with the pattern.
    Prefix,
    /// Path ends with the pattern.
    Suffix,
    /// Path contains the pattern anywhere.
    Contains,
}

impl MatchKind {
    fn tier(self) -> u8 {
        match self {
            MatchKind::Exact => 1,
            MatchKind::Prefix => 2,
            MatchKind::Suffix => 3,
            MatchKind::Contains => 4,
        }
    }
}

/// One row of the classification table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathRule {
    /// Literal pattern compared against the request path.
    pub pattern: String,
    /// Comparison applied to `pattern`.
    pub kind: MatchKind,
    /// Classification assigned on match.
    pub class: PathClass,
}

impl PathRule {
    /// Creates a new rule.
    #[must_use]
    pub fn new(pattern: impl Into<String>, kind: MatchKind, class: PathClass) -> Self {
        Self {
            pattern: pattern.into(),
            kind,
            class,
        }
    }

    /// Whether `path` satisfies this rule.
    #[must_use]
    pub fn matches(&self, path: &str) -> bool {
        let pattern = self.pattern.as_str();
        match self.kind {
            MatchKind::Exact => path == pattern,
            MatchKind::Prefix => path.starts_with(pattern),
            MatchKind::Suffix => path.ends_with(pattern),
            MatchKind::Contains => path.contains(pattern),
        }
    }

    fn precedence(&self) -> u8 {
        match self.class {
            PathClass::Internal => 0,
            PathClass::Public | PathClass::AuthRequired => self.kind.tier(),
        }
    }
}

/// Ordered rule table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathClassifier {
    rules: Vec<PathRule>,
}

impl PathClassifier {
    /// Build a classifier from `rules`, ordering them by fixed precedence.
    #[must_use]
    pub fn new(mut rules: Vec<PathRule>) -> Self {
        // Stable sort keeps caller order within a tier
        rules.sort_by_key(PathRule::precedence);
        Self { rules }
    }

    /// Rules in evaluation order.
    #[must_use]
    pub fn rules(&self) -> &[PathRule] {
        &self.rules
    }

    /// Classify a request path (without query string).
    #[must_use]
    pub fn classify(&self, path: &str) -> PathClass {
        // Dot segments could walk a public prefix back into a protected tree
        if has_dot_segments(path) {
            return PathClass::AuthRequired;
        }

        self.rules
            .iter()
            .find(|rule| rule.matches(path))
            .map_or(PathClass::AuthRequired, |rule| rule.class)
    }
}

impl Default for PathClassifier {
    /// The platform's standard table.
    fn default() -> Self {
        use MatchKind::{Contains, Exact, Prefix, Suffix};
        use PathClass::{Internal, Public};

        Self::new(vec![
            // Health checks, API documentation, metrics
            PathRule::new("/actuator", Exact, Internal),
            PathRule::new("/actuator/", Prefix, Internal),
            PathRule::new("/swagger-ui.html", Exact, Internal),
            PathRule::new("/swagger-ui/", Prefix, Internal),
            PathRule::new("/v3/api-docs", Exact, Internal),
            PathRule::new("/v3/api-docs/", Prefix, Internal),
            PathRule::new("/metrics", Exact, Internal),
            // Site root and entry pages
            PathRule::new("/", Exact, Public),
            PathRule::new("/index.html", Exact, Public),
            PathRule::new("/favicon.ico", Exact, Public),
            PathRule::new("/login", Exact, Public),
            // Static asset directories
            PathRule::new("/static/", Prefix, Public),
            PathRule::new("/assets/", Prefix, Public),
            PathRule::new("/images/", Prefix, Public),
            // Static file extensions
            PathRule::new(".html", Suffix, Public),
            PathRule::new(".js", Suffix, Public),
            PathRule::new(".css", Suffix, Public),
            PathRule::new(".ico", Suffix, Public),
            PathRule::new(".png", Suffix, Public),
            PathRule::new(".svg", Suffix, Public),
            // Public API segments
            PathRule::new("/api/test/", Contains, Public),
            PathRule::new("/api/user/login", Contains, Public),
            PathRule::new("/api/user/register", Contains, Public),
        ])
    }
}

/// Encoded characters a backend may decode into a dot segment or separator.
const SUSPICIOUS_ENCODINGS: [&str; 3] = ["%2e", "%2f", "%5c"];

/// Whether `path` could be normalised downstream into a different tree.
///
/// Matrix parameters are ignored when comparing segments, so `..;x` counts
/// as `..`. Backslashes count as separators.
fn has_dot_segments(path: &str) -> bool {
    let lowered = path.to_ascii_lowercase();
    if SUSPICIOUS_ENCODINGS
        .iter()
        .any(|encoded| lowered.contains(encoded))
    {
        return true;
    }

    lowered
        .replace("%3b", ";")
        .split(['/', '\\'])
        .map(|segment| segment.split(';').next().unwrap_or(segment))
        .any(|segment| segment == "." || segment == "..")
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn test_root_and_index_are_public() {
        let classifier = PathClassifier::default();
        assert_eq!(classifier.classify("/"), PathClass::Public);
        assert_eq!(classifier.classify("/index.html"), PathClass::Public);
        assert_eq!(classifier.classify("/favicon.ico"), PathClass::Public);
    }

    #[test]
    fn test_static_prefixes_and_extensions_are_public() {
        let classifier = PathClassifier::default();
        assert_eq!(classifier.classify("/static/app.bundle"), PathClass::Public);
        assert_eq!(classifier.classify("/assets/logo"), PathClass::Public);
        assert_eq!(classifier.classify("/chat/main.js"), PathClass::Public);
        assert_eq!(classifier.classify("/styles/site.css"), PathClass::Public);
    }

    #[test]
    fn test_public_api_segments_win_over_api_default() {
        let classifier = PathClassifier::default();
        assert_eq!(classifier.classify("/api/test/ping"), PathClass::Public);
        assert_eq!(classifier.classify("/api/user/login"), PathClass::Public);
        assert_eq!(classifier.classify("/api/user/register"), PathClass::Public);
    }

    #[test]
    fn test_api_paths_require_auth() {
        let classifier = PathClassifier::default();
        assert_eq!(
            classifier.classify("/api/user/42/profile"),
            PathClass::AuthRequired
        );
        assert_eq!(classifier.classify("/api/qa/ask"), PathClass::AuthRequired);
        assert_eq!(classifier.classify("/api/test"), PathClass::AuthRequired);
        assert_eq!(classifier.classify(""), PathClass::AuthRequired);
    }

    #[test]
    fn test_internal_paths() {
        let classifier = PathClassifier::default();
        assert_eq!(classifier.classify("/actuator/health"), PathClass::Internal);
        assert_eq!(classifier.classify("/swagger-ui.html"), PathClass::Internal);
        assert_eq!(
            classifier.classify("/swagger-ui/index.html"),
            PathClass::Internal
        );
        assert_eq!(
            classifier.classify("/v3/api-docs/gateway"),
            PathClass::Internal
        );
        assert_eq!(classifier.classify("/metrics"), PathClass::Internal);
    }

    #[test]
    fn test_internal_beats_public_suffix() {
        // "/swagger-ui/index.html" also ends in ".html"
        let classifier = PathClassifier::new(vec![
            PathRule::new(".html", MatchKind::Suffix, PathClass::Public),
            PathRule::new("/swagger-ui/", MatchKind::Prefix, PathClass::Internal),
        ]);
        assert_eq!(
            classifier.classify("/swagger-ui/index.html"),
            PathClass::Internal
        );
    }

    #[test]
    fn test_precedence_is_independent_of_supplied_order() {
        let classifier = PathClassifier::new(vec![
            PathRule::new("/api/", MatchKind::Contains, PathClass::Public),
            PathRule::new("/api/admin", MatchKind::Prefix, PathClass::AuthRequired),
        ]);

        // Prefix tier is evaluated before substring tier
        assert_eq!(
            classifier.classify("/api/admin/users"),
            PathClass::AuthRequired
        );
        assert_eq!(classifier.classify("/api/docs"), PathClass::Public);

        let kinds: Vec<_> = classifier.rules().iter().map(|r| r.kind).collect();
        assert_eq!(kinds, vec![MatchKind::Prefix, MatchKind::Contains]);
    }

    #[test]
    fn test_dot_segments_never_bypass_auth() {
        let classifier = PathClassifier::default();
        assert_eq!(
            classifier.classify("/api/test/../user/42/profile"),
            PathClass::AuthRequired
        );
        assert_eq!(
            classifier.classify("/static/%2E%2E/api/user/42"),
            PathClass::AuthRequired
        );
        assert_eq!(
            classifier.classify("/actuator/../api/user/42"),
            PathClass::AuthRequired
        );
    }

    #[test]
    fn test_normalisable_traversal_never_bypasses_auth() {
        let classifier = PathClassifier::default();
        for path in [
            "/api/test/..;/user/42/profile",
            "/static/..;/api/user/42",
            "/static/..;jsessionid=1/api/user/42",
            "/static/..%3B/api/user/42",
            "/api/test/..%2fuser%2f42%2fprofile",
            "/api/test/..%2Fuser",
            "/static/..\\api\\user\\42",
            "/static/%5c..%5capi",
            "/index.html/.;/api/user/42",
        ] {
            assert_eq!(classifier.classify(path), PathClass::AuthRequired, "{path}");
        }
    }

    #[test]
    fn test_matrix_parameters_on_ordinary_segments_are_untouched() {
        let classifier = PathClassifier::default();
        assert_eq!(
            classifier.classify("/static/app.js;v=3"),
            PathClass::Public
        );
        assert_eq!(classifier.classify("/api/test/ping;x=1"), PathClass::Public);
    }

    #[test]
    fn test_empty_table_requires_auth_everywhere() {
        let classifier = PathClassifier::new(Vec::new());
        assert_eq!(classifier.classify("/"), PathClass::AuthRequired);
        assert_eq!(classifier.classify("/index.html"), PathClass::AuthRequired);
    }

    #[test]
    fn test_path_class_labels() {
        assert_eq!(PathClass::Public.to_string(), "public");
        assert_eq!(PathClass::AuthRequired.as_str(), "auth_required");
        assert_eq!(PathClass::Internal.as_str(), "internal");
    }
}
