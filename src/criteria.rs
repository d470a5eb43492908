use crate::error::AppError;
use crate::metadata::ImageMetadata;
use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq)]
#[serde(default)]
pub struct SearchCriteria {
    pub name: String,
    pub city: String,
    pub country: String,
    pub keywords: String,
}

impl SearchCriteria {
    /// Criteria taken from the descriptive tags of a decoded photograph.
    /// The resolved `place` is display-only and never feeds `country`.
    pub fn from_metadata(metadata: &ImageMetadata) -> Self {
        let mut keywords = metadata.text_tag("Keywords");
        if keywords.is_empty() {
            keywords = metadata.text_tag("XPKeywords");
        }
        Self {
            name: metadata.text_tag("Artist"),
            city: metadata.text_tag("City"),
            country: metadata.text_tag("Country"),
            keywords,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.fields().iter().all(|f| f.trim().is_empty())
    }

    pub fn validate(&self) -> Result<(), AppError> {
        if self.is_empty() {
            return Err(AppError::Input("Please provide at least one search criterion.".into()));
        }
        Ok(())
    }

    fn fields(&self) -> [&str; 4] {
        [&self.name, &self.city, &self.country, &self.keywords]
    }
}

/// Joins the non-empty criteria with `+`, each word form-encoded.
pub fn build_query(criteria: &SearchCriteria) -> String {
    criteria
        .fields()
        .iter()
        .flat_map(|field| field.split_whitespace())
        .map(|word| url::form_urlencoded::byte_serialize(word.as_bytes()).collect::<String>())
        .collect::<Vec<_>>()
        .join("+")
}
