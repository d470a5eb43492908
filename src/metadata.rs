// src/metadata.rs

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq)]
pub struct GeoCoordinate {
    pub latitude: f64,
    pub longitude: f64,
}

/// Decoded state of one geographic axis.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq)]
pub enum GeoField {
    NotAvailable,
    Invalid,
    Degrees(f64),
}

impl fmt::Display for GeoField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GeoField::NotAvailable => write!(f, "Not available"),
            GeoField::Invalid => write!(f, "Invalid data"),
            GeoField::Degrees(value) => write!(f, "{}", value),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(untagged)]
pub enum TagValue {
    Text(String),
    Integer(i64),
    Number(f64),
    List(Vec<TagValue>),
}

impl fmt::Display for TagValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TagValue::Text(text) => write!(f, "{}", text),
            TagValue::Integer(value) => write!(f, "{}", value),
            TagValue::Number(value) => write!(f, "{}", value),
            TagValue::List(items) => {
                let parts: Vec<String> = items.iter().map(|item| item.to_string()).collect();
                write!(f, "[{}]", parts.join(", "))
            }
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct ImageMetadata {
    pub file_path: String,
    pub width: u32,
    pub height: u32,
    pub format: String,
    pub color_mode: String,
    pub tags: BTreeMap<String, TagValue>,
    /// `None` when the image carries no tag block at all.
    pub gps_latitude: Option<GeoField>,
    pub gps_longitude: Option<GeoField>,
    pub place: Option<String>,
}

impl ImageMetadata {
    /// The decoded position, only when both axes hold degrees.
    pub fn coordinate(&self) -> Option<GeoCoordinate> {
        match (self.gps_latitude, self.gps_longitude) {
            (Some(GeoField::Degrees(latitude)), Some(GeoField::Degrees(longitude))) => {
                Some(GeoCoordinate { latitude, longitude })
            }
            _ => None,
        }
    }

    /// Text content of a tag, empty when the tag is absent or not textual.
    pub fn text_tag(&self, name: &str) -> String {
        match self.tags.get(name) {
            Some(TagValue::Text(text)) => text.trim().to_string(),
            _ => String::new(),
        }
    }

    pub fn with_place(self, place: Option<String>) -> Self {
        Self { place, ..self }
    }

    /// Flattened `key: value` view used for display.
    pub fn display_entries(&self) -> Vec<(String, String)> {
        let mut entries = vec![
            ("Image Size".to_string(), format!("{} x {}", self.width, self.height)),
            ("Image Width".to_string(), self.width.to_string()),
            ("Image Height".to_string(), self.height.to_string()),
            ("Image Format".to_string(), self.format.clone()),
            ("Image Mode".to_string(), self.color_mode.clone()),
        ];
        entries.extend(self.tags.iter().map(|(k, v)| (k.clone(), v.to_string())));
        if let Some(latitude) = self.gps_latitude {
            entries.push(("GPS Latitude".to_string(), latitude.to_string()));
        }
        if let Some(longitude) = self.gps_longitude {
            entries.push(("GPS Longitude".to_string(), longitude.to_string()));
        }
        if let Some(place) = &self.place {
            entries.push(("Country".to_string(), place.clone()));
        }
        entries
    }
}

#[cfg(test)]
pub(crate) fn sample_metadata(tags: &[(&str, &str)]) -> ImageMetadata {
    ImageMetadata {
        file_path: "photo.jpg".into(),
        width: 4,
        height: 3,
        format: "Jpeg".into(),
        color_mode: "Rgb8".into(),
        tags: tags
            .iter()
            .map(|(k, v)| (k.to_string(), TagValue::Text(v.to_string())))
            .collect(),
        gps_latitude: Some(GeoField::NotAvailable),
        gps_longitude: Some(GeoField::NotAvailable),
        place: None,
    }
}
