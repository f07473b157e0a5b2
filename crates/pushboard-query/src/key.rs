/// Hierarchical cache key, e.g. `["releases", "Turneo-iOS", "production"]`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct QueryKey(Vec<String>);

impl QueryKey {
    pub fn new(root: impl Into<String>) -> Self {
        Self(vec![root.into()])
    }

    /// Append a scope part.
    pub fn with(mut self, part: impl ToString) -> Self {
        self.0.push(part.to_string());
        self
    }

    /// Whether every part of `prefix` matches the head of this key.
    pub fn starts_with(&self, prefix: &QueryKey) -> bool {
        self.0.starts_with(&prefix.0)
    }
}

impl std::fmt::Display for QueryKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0.join("/"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prefix_matching() {
        let key = QueryKey::new("releases").with("A").with("production");
        assert!(key.starts_with(&QueryKey::new("releases")));
        assert!(key.starts_with(&QueryKey::new("releases").with("A")));
        assert!(!key.starts_with(&QueryKey::new("releases").with("B")));
        assert!(!key.starts_with(&QueryKey::new("apps")));
        assert_eq!(key.to_string(), "releases/A/production");
    }
}
