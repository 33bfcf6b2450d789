//! Cache Namespace Module
//!
//! A namespace is the versioned partition of the store holding one deployed
//! version's assets.

use std::fmt;

// == Cache Namespace ==
/// Namespace identifier of the form `{appName}-{version}`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheNamespace {
    app_name: String,
    version: String,
}

impl CacheNamespace {
    pub fn new(app_name: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            app_name: app_name.into(),
            version: version.into(),
        }
    }

    /// The identifier used as the store's namespace key.
    pub fn id(&self) -> String {
        format!("{}-{}", self.app_name, self.version)
    }

    /// Returns true when `other` names a namespace that is not this one.
    pub fn is_stale(&self, other: &str) -> bool {
        other != self.id()
    }
}

impl fmt::Display for CacheNamespace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.app_name, self.version)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_namespace_id() {
        let ns = CacheNamespace::new("notes", "v2");
        assert_eq!(ns.id(), "notes-v2");
        assert_eq!(ns.to_string(), "notes-v2");
    }

    #[test]
    fn test_stale_detection() {
        let ns = CacheNamespace::new("notes", "v2");
        assert!(!ns.is_stale("notes-v2"));
        assert!(ns.is_stale("notes-v1"));
        assert!(ns.is_stale("other-v2"));
    }
}
