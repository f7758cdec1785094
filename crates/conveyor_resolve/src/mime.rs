//! Registries mapping file extensions to content types, and mime-range
//! matching.

use std::collections::BTreeMap;

/// Registry of format extensions and their content types.
///
/// Extensions are stored without the leading dot (`js`, not `.js`). The
/// registry is a plain value: configuration changes replace the whole
/// registry rather than mutating one that is in use.
#[derive(Debug, Clone, Default)]
pub struct MimeRegistry {
    by_ext: BTreeMap<String, String>,
}

impl MimeRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a copy with the extension registered for the content type.
    pub fn register(mut self, ext: &str, content_type: &str) -> Self {
        self.by_ext
            .insert(ext.trim_start_matches('.').to_string(), content_type.to_string());
        self
    }

    /// Content type for a format extension, if registered.
    pub fn content_type_for(&self, ext: &str) -> Option<&str> {
        self.by_ext.get(ext.trim_start_matches('.')).map(String::as_str)
    }

    /// Returns `true` if the extension names a known format.
    pub fn is_format_ext(&self, ext: &str) -> bool {
        self.by_ext.contains_key(ext.trim_start_matches('.'))
    }

    /// Extensions registered for a content type, in sorted order.
    pub fn exts_for(&self, content_type: &str) -> Vec<&str> {
        self.by_ext
            .iter()
            .filter(|(_, ct)| ct.as_str() == content_type)
            .map(|(ext, _)| ext.as_str())
            .collect()
    }
}

/// Registry of engine extensions.
///
/// An engine is a per-extension content transform chained before format
/// resolution; each engine extension maps to the content type its transform
/// produces (e.g. `coffee` produces `application/javascript`).
#[derive(Debug, Clone, Default)]
pub struct EngineRegistry {
    by_ext: BTreeMap<String, String>,
}

impl EngineRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a copy with the engine extension registered.
    pub fn register(mut self, ext: &str, target_type: &str) -> Self {
        self.by_ext
            .insert(ext.trim_start_matches('.').to_string(), target_type.to_string());
        self
    }

    /// Returns `true` if the extension names a known engine.
    pub fn is_engine_ext(&self, ext: &str) -> bool {
        self.by_ext.contains_key(ext.trim_start_matches('.'))
    }

    /// The content type an engine's transform produces.
    pub fn target_type(&self, ext: &str) -> Option<&str> {
        self.by_ext.get(ext.trim_start_matches('.')).map(String::as_str)
    }
}

/// Matches a content type against a mime range.
///
/// Supports exact matches, `type/*` subtype wildcards, and the `*/*`
/// wildcard.
pub fn mime_range_match(range: &str, content_type: &str) -> bool {
    if range == "*/*" || range == content_type {
        return true;
    }
    match range.strip_suffix("/*") {
        Some(range_type) => content_type
            .split_once('/')
            .is_some_and(|(main, _)| main == range_type),
        None => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn registry() -> MimeRegistry {
        MimeRegistry::new()
            .register("js", "application/javascript")
            .register("mjs", "application/javascript")
            .register("css", "text/css")
    }

    #[test]
    fn lookup_by_extension() {
        let r = registry();
        assert_eq!(r.content_type_for("js"), Some("application/javascript"));
        assert_eq!(r.content_type_for(".css"), Some("text/css"));
        assert_eq!(r.content_type_for("png"), None);
    }

    #[test]
    fn exts_for_type_sorted() {
        let r = registry();
        assert_eq!(r.exts_for("application/javascript"), vec!["js", "mjs"]);
    }

    #[test]
    fn registration_produces_new_value() {
        let base = registry();
        let extended = base.clone().register("html", "text/html");
        assert!(!base.is_format_ext("html"));
        assert!(extended.is_format_ext("html"));
    }

    #[test]
    fn engine_target_types() {
        let engines = EngineRegistry::new().register("coffee", "application/javascript");
        assert!(engines.is_engine_ext("coffee"));
        assert_eq!(engines.target_type("coffee"), Some("application/javascript"));
        assert_eq!(engines.target_type("scss"), None);
    }

    #[test]
    fn exact_range_match() {
        assert!(mime_range_match("text/css", "text/css"));
        assert!(!mime_range_match("text/css", "text/html"));
    }

    #[test]
    fn wildcard_subtype_match() {
        assert!(mime_range_match("text/*", "text/css"));
        assert!(mime_range_match("text/*", "text/html"));
        assert!(!mime_range_match("text/*", "application/javascript"));
    }

    #[test]
    fn full_wildcard_match() {
        assert!(mime_range_match("*/*", "application/javascript"));
        assert!(mime_range_match("*/*", "text/css"));
    }
}
