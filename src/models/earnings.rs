// ============================================================================
// Earnings-call documents
// ============================================================================

/// One listed transcript. The label comes from the filename stem on the
/// docs server, e.g. "2024 Q4".
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EarningsDoc {
    pub label: String,
    pub filename: Option<String>,
    pub link: Option<String>,
}

impl EarningsDoc {
    /// Dead "#" links from the static table count as no link at all.
    pub fn from_fallback(label: &str, link: &str) -> Self {
        let link = match link {
            "" | "#" => None,
            url => Some(url.to_string()),
        };
        Self {
            label: label.to_string(),
            filename: None,
            link,
        }
    }

    pub fn display(&self) -> String {
        format!("{} Transcript", self.label)
    }

    pub fn link_text(&self) -> &str {
        self.link.as_deref().unwrap_or("-")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fallback_doc_drops_dead_links() {
        let doc = EarningsDoc::from_fallback("2024 Q1", "#");
        assert_eq!(doc.display(), "2024 Q1 Transcript");
        assert!(doc.link.is_none());
        assert_eq!(doc.link_text(), "-");

        let doc = EarningsDoc::from_fallback("2023 Q4", "/earningcall/NVDA/2023-Q4.pdf");
        assert_eq!(doc.link_text(), "/earningcall/NVDA/2023-Q4.pdf");
    }
}
