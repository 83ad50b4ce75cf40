use serde::{Deserialize, Serialize};
use std::fmt;

/// How an element is found on the page.
///
/// Locators are serialized as-is and handed to the in-page locate script, so
/// the tag and field names are part of that contract.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Locator {
    /// Innermost element whose visible text contains `text`
    /// (case-insensitive, whitespace collapsed).
    Text { text: String },
    /// CSS selector, optionally narrowed to elements containing `has_text`.
    Css {
        selector: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        has_text: Option<String>,
    },
    /// Element whose `role` attribute equals `role`.
    Role { role: String },
}

impl Locator {
    pub fn text(text: impl Into<String>) -> Self {
        Locator::Text { text: text.into() }
    }

    pub fn css(selector: impl Into<String>) -> Self {
        Locator::Css {
            selector: selector.into(),
            has_text: None,
        }
    }

    pub fn css_has_text(selector: impl Into<String>, text: impl Into<String>) -> Self {
        Locator::Css {
            selector: selector.into(),
            has_text: Some(text.into()),
        }
    }

    pub fn role(role: impl Into<String>) -> Self {
        Locator::Role { role: role.into() }
    }

    pub fn to_js_query(&self) -> Result<serde_json::Value, serde_json::Error> {
        serde_json::to_value(self)
    }
}

impl fmt::Display for Locator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Locator::Text { text } => write!(f, "text={}", text),
            Locator::Css {
                selector,
                has_text: Some(text),
            } => write!(f, "{}:has-text('{}')", selector, text),
            Locator::Css {
                selector,
                has_text: None,
            } => write!(f, "{}", selector),
            Locator::Role { role } => write!(f, "[role='{}']", role),
        }
    }
}

/// Collapse runs of whitespace and lowercase, the way the locate script
/// compares element text.
pub fn normalize_text(text: &str) -> String {
    text.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_display_forms() {
        assert_eq!(Locator::text("CODE BLUE").to_string(), "text=CODE BLUE");
        assert_eq!(
            Locator::css_has_text("h1", "CPC EXAM MODE").to_string(),
            "h1:has-text('CPC EXAM MODE')"
        );
        assert_eq!(Locator::css("#timer").to_string(), "#timer");
        assert_eq!(
            Locator::role("progressbar").to_string(),
            "[role='progressbar']"
        );
    }

    #[test]
    fn test_js_query_shape() {
        let query = Locator::css_has_text("h1", "CPC EXAM MODE")
            .to_js_query()
            .unwrap();
        assert_eq!(
            query,
            json!({"kind": "css", "selector": "h1", "has_text": "CPC EXAM MODE"})
        );

        let query = Locator::role("progressbar").to_js_query().unwrap();
        assert_eq!(query, json!({"kind": "role", "role": "progressbar"}));
    }

    #[test]
    fn test_normalize_text() {
        assert_eq!(normalize_text("  START\n   Exam "), "start exam");
    }
}
