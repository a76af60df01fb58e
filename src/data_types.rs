/*!
 * Data type definitions for provider directory records
 *
 * This module contains the raw shape of records served by the provider
 * endpoint, the normalized in-memory record, and the filter criteria and
 * derived view types the engine works with.
 */

use std::collections::BTreeSet;
use serde::{Deserialize, Deserializer, Serialize};

/// Opaque unique provider identifier
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ProviderId(pub String);

impl ProviderId {
    pub fn new(id: impl Into<String>) -> Self {
        ProviderId(id.into())
    }

    /// Get the identifier as a string
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for ProviderId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Nested specialty object as served by the endpoint
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawSpecialty {
    pub name: String,
}

/// Provider object exactly as served by the endpoint, before normalization
///
/// Fields the directory does not use (clinic, languages, introduction) are
/// ignored. Missing `fees` or `experience` deserialize to empty strings so
/// that the normalizer, not the JSON parser, decides what to do with them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawProviderRecord {
    #[serde(deserialize_with = "deserialize_opaque_id")]
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub photo: Option<String>,
    #[serde(default)]
    pub video_consult: bool,
    #[serde(default)]
    pub in_clinic: bool,
    #[serde(default)]
    pub fees: String,
    #[serde(default)]
    pub experience: String,
    #[serde(default)]
    pub specialities: Vec<RawSpecialty>,
}

fn deserialize_opaque_id<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum OpaqueId {
        Text(String),
        Number(serde_json::Number),
    }

    Ok(match OpaqueId::deserialize(deserializer)? {
        OpaqueId::Text(s) => s,
        OpaqueId::Number(n) => n.to_string(),
    })
}

/// Normalized provider record
///
/// Only the normalizer constructs these from raw records; the engine never
/// sees a [`RawProviderRecord`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderRecord {
    pub id: ProviderId,
    pub name: String,
    pub photo_url: String,
    /// Specialty names in source order
    pub specialties: Vec<String>,
    pub fee_amount: u32,
    pub experience_years: u32,
    pub supports_video_consult: bool,
    pub supports_in_clinic: bool,
}

impl ProviderRecord {
    /// Case-insensitive substring test on the display name.
    ///
    /// `query_lower` must already be lowercased.
    pub fn name_matches(&self, query_lower: &str) -> bool {
        self.name.to_lowercase().contains(query_lower)
    }

    /// Check if the provider offers the given consultation mode
    pub fn supports(&self, mode: ConsultationMode) -> bool {
        match mode {
            ConsultationMode::None => true,
            ConsultationMode::VideoConsult => self.supports_video_consult,
            ConsultationMode::InClinic => self.supports_in_clinic,
        }
    }

    pub fn has_specialty(&self, specialty: &str) -> bool {
        self.specialties.iter().any(|s| s == specialty)
    }

    /// Check that every selected specialty is listed for this provider
    pub fn has_all_specialties(&self, selected: &BTreeSet<String>) -> bool {
        selected.iter().all(|s| self.has_specialty(s))
    }

    /// Fee as shown on a provider card
    pub fn fee_display(&self) -> String {
        format!("₹{}", self.fee_amount)
    }

    /// Experience as shown on a provider card
    pub fn experience_display(&self) -> String {
        format!("{} years of experience", self.experience_years)
    }
}

/// Consultation mode filter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum ConsultationMode {
    /// No constraint
    #[default]
    None,
    VideoConsult,
    InClinic,
}

impl ConsultationMode {
    /// Parse the value stored under the `consultation` query key.
    ///
    /// Anything other than the two exact labels means no constraint.
    pub fn from_query_value(value: &str) -> Self {
        match value {
            "Video Consult" => ConsultationMode::VideoConsult,
            "In Clinic" => ConsultationMode::InClinic,
            _ => ConsultationMode::None,
        }
    }

    /// Value written under the `consultation` query key, `None` for the default
    pub fn query_value(&self) -> Option<&'static str> {
        match self {
            ConsultationMode::None => None,
            ConsultationMode::VideoConsult => Some("Video Consult"),
            ConsultationMode::InClinic => Some("In Clinic"),
        }
    }
}

impl std::fmt::Display for ConsultationMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.query_value().unwrap_or("Any"))
    }
}

/// Sort order applied after filtering
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum SortKey {
    /// Keep catalog order
    #[default]
    None,
    FeeAscending,
    ExperienceDescending,
}

impl SortKey {
    /// Parse the value stored under the `sort` query key
    pub fn from_query_value(value: &str) -> Self {
        match value {
            "fees" => SortKey::FeeAscending,
            "experience" => SortKey::ExperienceDescending,
            _ => SortKey::None,
        }
    }

    pub fn query_value(&self) -> Option<&'static str> {
        match self {
            SortKey::None => None,
            SortKey::FeeAscending => Some("fees"),
            SortKey::ExperienceDescending => Some("experience"),
        }
    }
}

impl std::fmt::Display for SortKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SortKey::None => write!(f, "None"),
            SortKey::FeeAscending => write!(f, "Fees (Low to High)"),
            SortKey::ExperienceDescending => write!(f, "Experience (High to Low)"),
        }
    }
}

/// What the user currently wants to see
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct FilterCriteria {
    pub search_text: String,
    pub consultation_mode: ConsultationMode,
    /// Empty means no constraint
    pub specialties: BTreeSet<String>,
    pub sort_key: SortKey,
}

impl FilterCriteria {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_search(mut self, text: impl Into<String>) -> Self {
        self.search_text = text.into();
        self
    }

    pub fn with_consultation(mut self, mode: ConsultationMode) -> Self {
        self.consultation_mode = mode;
        self
    }

    pub fn with_specialty(mut self, specialty: impl Into<String>) -> Self {
        self.specialties.insert(specialty.into());
        self
    }

    pub fn with_sort(mut self, key: SortKey) -> Self {
        self.sort_key = key;
        self
    }

    /// Flip membership of a specialty; returns whether it is now selected
    pub fn toggle_specialty(&mut self, specialty: &str) -> bool {
        if self.specialties.remove(specialty) {
            false
        } else {
            self.specialties.insert(specialty.to_string());
            true
        }
    }

    /// Whether every field is at its default
    pub fn is_default(&self) -> bool {
        *self == Self::default()
    }
}

/// The list shown to the user plus name-match suggestions
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct DerivedView {
    pub visible_providers: Vec<ProviderRecord>,
    /// At most three names, in catalog order
    pub name_suggestions: Vec<String>,
}

impl DerivedView {
    pub fn len(&self) -> usize {
        self.visible_providers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.visible_providers.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_raw_record_accepts_numeric_id() {
        let raw: RawProviderRecord = serde_json::from_str(
            r#"{"id": 42, "name": "Dr. A", "fees": "₹ 500", "experience": "13 Years of experience",
                "specialities": [{"name": "Dentist"}], "clinic": {"name": "ignored"}}"#,
        ).unwrap();
        assert_eq!(raw.id, "42");
        assert_eq!(raw.photo, None);
        assert!(!raw.video_consult);
        assert_eq!(raw.specialities[0].name, "Dentist");
    }

    #[test]
    fn test_consultation_mode_values() {
        assert_eq!(ConsultationMode::from_query_value("Video Consult"), ConsultationMode::VideoConsult);
        assert_eq!(ConsultationMode::from_query_value("In Clinic"), ConsultationMode::InClinic);
        assert_eq!(ConsultationMode::from_query_value("in clinic"), ConsultationMode::None);
        assert_eq!(ConsultationMode::None.query_value(), None);
    }

    #[test]
    fn test_sort_key_values() {
        assert_eq!(SortKey::from_query_value("fees"), SortKey::FeeAscending);
        assert_eq!(SortKey::from_query_value("experience"), SortKey::ExperienceDescending);
        assert_eq!(SortKey::from_query_value("rating"), SortKey::None);
    }

    #[test]
    fn test_toggle_specialty() {
        let mut criteria = FilterCriteria::new();
        assert!(criteria.toggle_specialty("ENT"));
        assert!(criteria.specialties.contains("ENT"));
        assert!(!criteria.toggle_specialty("ENT"));
        assert!(criteria.is_default());
    }
}
