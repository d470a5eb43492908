use crate::error::AppError;
use serde::{Deserialize, Serialize};

/// One normalized search hit. Records are never deduplicated across sources.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ArticleRecord {
    pub title: String,
    pub url: String,
    pub source: String,
    pub description: Option<String>,
    pub author: Option<String>,
    pub published_at: Option<String>,
    pub content: Option<String>,
}

impl ArticleRecord {
    pub fn link(title: impl Into<String>, url: impl Into<String>, source: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            url: url.into(),
            source: source.into(),
            description: None,
            author: None,
            published_at: None,
            content: None,
        }
    }
}

/// A non-fatal failure reported next to the results of a run.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Diagnostic {
    pub source: String,
    pub message: String,
    pub unauthorized: bool,
}

impl Diagnostic {
    pub fn new(source: impl Into<String>, message: impl Into<String>) -> Self {
        Self { source: source.into(), message: message.into(), unauthorized: false }
    }

    pub fn from_error(source: impl Into<String>, error: &AppError) -> Self {
        Self {
            source: source.into(),
            message: error.to_string(),
            unauthorized: error.is_unauthorized(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ServiceErrorKind;

    #[test]
    fn record_uses_camel_case_wire_names() {
        let mut record = ArticleRecord::link("Title", "https://example.com/a", "Lovin Malta");
        record.published_at = Some("2024-05-01T10:00:00Z".into());
        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["publishedAt"], "2024-05-01T10:00:00Z");
        assert!(json["description"].is_null());
    }

    #[test]
    fn diagnostic_flags_unauthorized() {
        let error = AppError::service("NewsAPI", ServiceErrorKind::Unauthorized);
        let diagnostic = Diagnostic::from_error("NewsAPI", &error);
        assert!(diagnostic.unauthorized);
        assert!(diagnostic.message.contains("API key"));
    }
}
