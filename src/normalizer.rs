/*!
 * Normalization of raw provider records
 *
 * Turns the string-typed fee and experience fields and nested specialty
 * objects served by the endpoint into a [`ProviderRecord`].
 */

use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::{Result, DirectoryError};
use crate::data_types::*;

lazy_static::lazy_static! {
    static ref DIGIT_RUN: Regex = Regex::new(r"[0-9]+").expect("digit run pattern is valid");
}

/// What to do with a raw record whose fee or experience cannot be parsed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MalformedRecordPolicy {
    /// Drop the record, log it, and keep loading
    #[default]
    Skip,
    /// Fail the whole catalog load
    Reject,
}

impl MalformedRecordPolicy {
    pub fn from_name(name: &str) -> Option<Self> {
        match name.to_lowercase().as_str() {
            "skip" => Some(MalformedRecordPolicy::Skip),
            "reject" => Some(MalformedRecordPolicy::Reject),
            _ => None,
        }
    }
}

/// Result of normalizing a whole raw list
#[derive(Debug, Default)]
pub struct NormalizedCatalog {
    pub records: Vec<ProviderRecord>,
    /// Errors for records dropped under [`MalformedRecordPolicy::Skip`]
    pub skipped: Vec<DirectoryError>,
}

/// Extract the fee amount by stripping every non-digit character.
///
/// "₹ 500" becomes 500, "1,200" becomes 1200.
pub fn extract_fee(record_id: &str, raw_fee: &str) -> Result<u32> {
    let digits: String = raw_fee.chars().filter(|c| c.is_ascii_digit()).collect();
    if digits.is_empty() {
        return Err(DirectoryError::malformed_record(record_id, "fees", raw_fee, "contains no digits"));
    }
    digits.parse::<u32>().map_err(|_| {
        DirectoryError::malformed_record(record_id, "fees", raw_fee, "is out of range")
    })
}

/// Extract years of experience from the first run of digits.
///
/// "13 Years of experience" becomes 13.
pub fn extract_experience(record_id: &str, raw_experience: &str) -> Result<u32> {
    let run = DIGIT_RUN.find(raw_experience).ok_or_else(|| {
        DirectoryError::malformed_record(record_id, "experience", raw_experience, "contains no number")
    })?;
    run.as_str().parse::<u32>().map_err(|_| {
        DirectoryError::malformed_record(record_id, "experience", raw_experience, "is out of range")
    })
}

/// Normalize one raw record
pub fn normalize_record(raw: &RawProviderRecord) -> Result<ProviderRecord> {
    let fee_amount = extract_fee(&raw.id, &raw.fees)?;
    let experience_years = extract_experience(&raw.id, &raw.experience)?;

    Ok(ProviderRecord {
        id: ProviderId::new(raw.id.clone()),
        name: raw.name.clone(),
        photo_url: raw.photo.clone().unwrap_or_default(),
        specialties: raw.specialities.iter().map(|s| s.name.clone()).collect(),
        fee_amount,
        experience_years,
        supports_video_consult: raw.video_consult,
        supports_in_clinic: raw.in_clinic,
    })
}

/// Normalize a raw list, applying `policy` to records that fail
pub fn normalize_catalog(
    raw_records: &[RawProviderRecord],
    policy: MalformedRecordPolicy,
) -> Result<NormalizedCatalog> {
    let mut catalog = NormalizedCatalog {
        records: Vec::with_capacity(raw_records.len()),
        skipped: Vec::new(),
    };

    for raw in raw_records {
        match normalize_record(raw) {
            Ok(record) => catalog.records.push(record),
            Err(e) => match policy {
                MalformedRecordPolicy::Reject => return Err(e),
                MalformedRecordPolicy::Skip => {
                    warn!(record_id = %raw.id, error = %e, "skipping malformed provider record");
                    catalog.skipped.push(e);
                }
            },
        }
    }

    debug!(
        normalized = catalog.records.len(),
        skipped = catalog.skipped.len(),
        "normalized provider catalog"
    );
    Ok(catalog)
}
