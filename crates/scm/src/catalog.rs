//! Static service-name → repo mappings consulted during discovery
//! steps 3 and 4 (spec.md §4.2).

use std::collections::HashMap;

/// A case-insensitive `workload name -> "org/repo"` lookup table.
#[derive(Debug, Clone, Default)]
pub struct ServiceCatalog {
    entries: HashMap<String, String>,
}

impl ServiceCatalog {
    #[must_use]
    pub fn new(entries: impl IntoIterator<Item = (String, String)>) -> Self {
        Self {
            entries: entries
                .into_iter()
                .map(|(k, v)| (k.to_ascii_lowercase(), v))
                .collect(),
        }
    }

    #[must_use]
    pub fn lookup(&self, name: &str) -> Option<String> {
        self.entries.get(&name.to_ascii_lowercase()).cloned()
    }

    pub fn insert(&mut self, name: impl Into<String>, repo: impl Into<String>) {
        self.entries.insert(name.into().to_ascii_lowercase(), repo.into());
    }
}

/// Third-party catalog: a custom overlay consulted before the default
/// third-party table (spec.md step 4: "custom overlay preferred").
#[derive(Debug, Clone, Default)]
pub struct ThirdPartyCatalog {
    pub custom: ServiceCatalog,
    pub default: ServiceCatalog,
}

impl ThirdPartyCatalog {
    #[must_use]
    pub fn lookup(&self, name: &str) -> Option<String> {
        self.custom.lookup(name).or_else(|| self.default.lookup(name))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lookup_is_case_insensitive() {
        let catalog = ServiceCatalog::new([(
            "Order-Processing-Service".to_string(),
            "myorg/order-processing-service".to_string(),
        )]);
        assert_eq!(
            catalog.lookup("order-processing-service"),
            Some("myorg/order-processing-service".to_string())
        );
        assert_eq!(
            catalog.lookup("ORDER-PROCESSING-SERVICE"),
            Some("myorg/order-processing-service".to_string())
        );
    }

    #[test]
    fn third_party_custom_overlay_wins() {
        let mut tp = ThirdPartyCatalog::default();
        tp.default.insert("datadog-agent", "DataDog/default-repo");
        tp.custom.insert("datadog-agent", "DataDog/pinned-repo");
        assert_eq!(tp.lookup("datadog-agent"), Some("DataDog/pinned-repo".to_string()));
    }
}
