use serde::{Deserialize, Serialize};

use crate::domain::bundle::Versions;

/// Read-only view of a page's elements. Selector resolution is the
/// responsibility of the implementation; the probe only consumes text.
pub trait DomQuery: Send + Sync {
    /// Text content of every element matching the selector, in document
    /// order.
    fn select_text(&self, selector: &str) -> Vec<String>;
}

/// One element of a settled page snapshot, tagged with the selector it
/// matches.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DomElement {
    pub selector: String,
    pub text: String,
}

/// A settled snapshot of a page's elements.
#[derive(Debug, Clone, Default)]
pub struct StaticDom {
    elements: Vec<DomElement>,
}

impl StaticDom {
    pub fn new(elements: Vec<DomElement>) -> Self {
        Self { elements }
    }
}

impl DomQuery for StaticDom {
    fn select_text(&self, selector: &str) -> Vec<String> {
        self.elements
            .iter()
            .filter(|element| element.selector == selector)
            .map(|element| element.text.clone())
            .collect()
    }
}

#[derive(Debug, Clone)]
pub struct ProbeConfig {
    pub selector: String,
    pub fe_prefix: String,
    pub be_prefix: String,
}

/// Scrapes version markers from the page. For each matching element the
/// trimmed text is checked against the FE and BE prefixes; the trimmed
/// remainder becomes the version, and a later match overwrites an earlier
/// one. Unmatched versions stay empty.
pub fn probe_versions(dom: &dyn DomQuery, config: &ProbeConfig) -> Versions {
    let mut versions = Versions::default();
    for text in dom.select_text(&config.selector) {
        let text = text.trim();
        if let Some(rest) = text.strip_prefix(&config.fe_prefix) {
            versions.fe_version = rest.trim().to_string();
        } else if let Some(rest) = text.strip_prefix(&config.be_prefix) {
            versions.be_version = rest.trim().to_string();
        }
    }
    versions
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> ProbeConfig {
        ProbeConfig {
            selector: "p.--technology-version".to_string(),
            fe_prefix: "FE:".to_string(),
            be_prefix: "BE:".to_string(),
        }
    }

    fn element(text: &str) -> DomElement {
        DomElement {
            selector: "p.--technology-version".to_string(),
            text: text.to_string(),
        }
    }

    #[test]
    fn empty_page_yields_empty_versions() {
        let versions = probe_versions(&StaticDom::default(), &config());
        assert_eq!(versions, Versions::default());
    }

    #[test]
    fn picks_both_prefixes_and_trims() {
        let dom = StaticDom::new(vec![element("  FE: 2.4.1  "), element("BE:   9.0.3")]);
        let versions = probe_versions(&dom, &config());
        assert_eq!(versions.fe_version, "2.4.1");
        assert_eq!(versions.be_version, "9.0.3");
    }

    #[test]
    fn last_matching_element_wins() {
        let dom = StaticDom::new(vec![
            element("FE: 1.0.0"),
            element("FE: 1.0.1"),
            element("BE: 3.0.0"),
        ]);
        let versions = probe_versions(&dom, &config());
        assert_eq!(versions.fe_version, "1.0.1");
        assert_eq!(versions.be_version, "3.0.0");
    }

    #[test]
    fn other_selectors_are_invisible() {
        let dom = StaticDom::new(vec![DomElement {
            selector: "div.footer".to_string(),
            text: "FE: 5.5.5".to_string(),
        }]);
        let versions = probe_versions(&dom, &config());
        assert_eq!(versions, Versions::default());
    }

    #[test]
    fn unprefixed_text_is_ignored() {
        let dom = StaticDom::new(vec![element("build 2024-11-02"), element("FE: 2.0.0")]);
        let versions = probe_versions(&dom, &config());
        assert_eq!(versions.fe_version, "2.0.0");
        assert_eq!(versions.be_version, "");
    }
}
