/*!
 * The normalized provider catalog
 *
 * Provides a builder for loading the catalog from raw records, a JSON file,
 * or the provider endpoint, plus summary statistics over the loaded list.
 */

use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};
use chrono::{DateTime, Utc};
use tracing::info;

use crate::{Result, DirectoryError};
use crate::config::DirectoryConfig;
use crate::data_types::*;
use crate::engine::{self, ProviderQuery};
use crate::normalizer::{normalize_catalog, MalformedRecordPolicy};
use crate::source;

/// Builder for loading a provider catalog
///
/// # Example
/// ```no_run
/// # use doctor_directory::catalog::CatalogBuilder;
/// # use doctor_directory::normalizer::MalformedRecordPolicy;
/// let catalog = CatalogBuilder::new()
///     .json_file("data/providers.json")
///     .malformed_record_policy(MalformedRecordPolicy::Reject)
///     .build()?;
/// # Ok::<(), doctor_directory::DirectoryError>(())
/// ```
pub struct CatalogBuilder {
    json_path: Option<PathBuf>,
    raw_records: Option<Vec<RawProviderRecord>>,
    policy: MalformedRecordPolicy,
    index_by_id: bool,
}

impl Default for CatalogBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl CatalogBuilder {
    /// Create a new catalog builder
    pub fn new() -> Self {
        Self {
            json_path: None,
            raw_records: None,
            policy: MalformedRecordPolicy::default(),
            index_by_id: true,
        }
    }

    /// Start from the loading options in a configuration
    pub fn from_config(config: &DirectoryConfig) -> Self {
        Self::new().malformed_record_policy(config.malformed_record_policy)
    }

    /// Load raw records from a JSON file
    pub fn json_file<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.json_path = Some(path.as_ref().to_path_buf());
        self
    }

    /// Use raw records that were already fetched or parsed
    pub fn raw_records(mut self, records: Vec<RawProviderRecord>) -> Self {
        self.raw_records = Some(records);
        self
    }

    pub fn malformed_record_policy(mut self, policy: MalformedRecordPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Set whether to build the id index
    pub fn index_by_id(mut self, build: bool) -> Self {
        self.index_by_id = build;
        self
    }

    /// Normalize the configured source into a catalog
    pub fn build(self) -> Result<Catalog> {
        let raw = match (self.raw_records, &self.json_path) {
            (Some(records), _) => records,
            (None, Some(path)) => source::read_raw_catalog_file(path)?,
            (None, None) => {
                return Err(DirectoryError::Configuration {
                    message: "No catalog source configured".to_string(),
                    suggestion: Some("Call raw_records() or json_file() before build()".to_string()),
                })
            }
        };

        let normalized = normalize_catalog(&raw, self.policy)?;
        let mut catalog = Catalog::new(normalized.records);
        catalog.skipped_records = normalized.skipped.len();
        if self.index_by_id {
            catalog.build_index();
        }

        info!(
            providers = catalog.len(),
            skipped = catalog.skipped_records,
            "provider catalog loaded"
        );
        Ok(catalog)
    }

    /// Fetch raw records from the configured endpoint, then build
    #[cfg(feature = "fetch")]
    pub async fn fetch(self, fetcher: &mut crate::fetch::CatalogFetcher) -> Result<Catalog> {
        let raw = fetcher.fetch_raw().await?;
        self.raw_records(raw).build()
    }
}

/// Normalized, read-only provider catalog
#[derive(Debug, Clone)]
pub struct Catalog {
    providers: Vec<ProviderRecord>,

    /// Number of raw records dropped during normalization
    pub skipped_records: usize,

    /// When the catalog was normalized
    pub loaded_at: DateTime<Utc>,

    id_index: Option<HashMap<ProviderId, usize>>,
}

impl Default for Catalog {
    fn default() -> Self {
        Self::new(Vec::new())
    }
}

impl Catalog {
    /// Wrap already-normalized records
    pub fn new(providers: Vec<ProviderRecord>) -> Self {
        Self {
            providers,
            skipped_records: 0,
            loaded_at: Utc::now(),
            id_index: None,
        }
    }

    /// Load and normalize a JSON file with default options
    pub fn load_json<P: AsRef<Path>>(path: P) -> Result<Self> {
        CatalogBuilder::new().json_file(path).build()
    }

    /// Provider records in endpoint order
    pub fn providers(&self) -> &[ProviderRecord] {
        &self.providers
    }

    /// Get the total number of providers
    pub fn len(&self) -> usize {
        self.providers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.providers.is_empty()
    }

    /// Build the id lookup index; the first record wins on duplicate ids
    pub fn build_index(&mut self) {
        let mut index = HashMap::with_capacity(self.providers.len());
        for (i, provider) in self.providers.iter().enumerate() {
            index.entry(provider.id.clone()).or_insert(i);
        }
        self.id_index = Some(index);
    }

    /// Look up a provider by id (O(1) if indexed)
    pub fn get_by_id(&self, id: &ProviderId) -> Option<&ProviderRecord> {
        match &self.id_index {
            Some(index) => index.get(id).map(|&i| &self.providers[i]),
            None => self.providers.iter().find(|p| &p.id == id),
        }
    }

    /// Create a query builder for this catalog
    pub fn query(&self) -> ProviderQuery<'_> {
        ProviderQuery::new(&self.providers)
    }

    /// Derive the view for `criteria`
    pub fn apply(&self, criteria: &FilterCriteria) -> DerivedView {
        engine::apply(&self.providers, criteria)
    }

    /// Get catalog statistics
    pub fn statistics(&self) -> CatalogStatistics {
        CatalogStatistics::from_catalog(self)
    }
}

/// Catalog statistics
#[derive(Debug, Clone, PartialEq)]
pub struct CatalogStatistics {
    pub total_providers: usize,
    pub skipped_records: usize,
    pub video_consult_providers: usize,
    pub in_clinic_providers: usize,
    pub min_fee: Option<u32>,
    pub max_fee: Option<u32>,
    pub average_fee: Option<f64>,
    pub max_experience: Option<u32>,
    pub loaded_at: DateTime<Utc>,
    /// Specialty name to number of providers listing it
    pub specialty_counts: BTreeMap<String, usize>,
}

impl CatalogStatistics {
    /// Calculate statistics from a catalog
    pub fn from_catalog(catalog: &Catalog) -> Self {
        let providers = &catalog.providers;
        let mut specialty_counts = BTreeMap::new();

        for provider in providers {
            let mut seen: Vec<&str> = Vec::new();
            for specialty in &provider.specialties {
                if !seen.contains(&specialty.as_str()) {
                    seen.push(specialty);
                    *specialty_counts.entry(specialty.clone()).or_insert(0) += 1;
                }
            }
        }

        let total_fees: u64 = providers.iter().map(|p| u64::from(p.fee_amount)).sum();

        Self {
            total_providers: providers.len(),
            skipped_records: catalog.skipped_records,
            video_consult_providers: providers.iter().filter(|p| p.supports_video_consult).count(),
            in_clinic_providers: providers.iter().filter(|p| p.supports_in_clinic).count(),
            min_fee: providers.iter().map(|p| p.fee_amount).min(),
            max_fee: providers.iter().map(|p| p.fee_amount).max(),
            average_fee: (!providers.is_empty())
                .then(|| total_fees as f64 / providers.len() as f64),
            max_experience: providers.iter().map(|p| p.experience_years).max(),
            loaded_at: catalog.loaded_at,
            specialty_counts,
        }
    }

    /// Specialties ordered by provider count, most common first
    pub fn top_specialties(&self, limit: usize) -> Vec<(&str, usize)> {
        let mut counts: Vec<_> = self.specialty_counts.iter()
            .map(|(name, &count)| (name.as_str(), count))
            .collect();
        counts.sort_by(|a, b| b.1.cmp(&a.1));
        counts.truncate(limit);
        counts
    }

    /// Print a formatted summary of the statistics
    pub fn print_summary(&self) {
        let pct = |n: usize| {
            if self.total_providers == 0 {
                0.0
            } else {
                (n as f64 / self.total_providers as f64) * 100.0
            }
        };

        println!("=== Provider Directory Statistics ===");
        println!("Loaded At: {}", self.loaded_at.format("%Y-%m-%d %H:%M:%S UTC"));
        println!("Total Providers: {}", self.total_providers);
        if self.skipped_records > 0 {
            println!("Skipped Malformed Records: {}", self.skipped_records);
        }
        println!("  Video Consult: {} ({:.1}%)", self.video_consult_providers, pct(self.video_consult_providers));
        println!("  In Clinic: {} ({:.1}%)", self.in_clinic_providers, pct(self.in_clinic_providers));
        if let (Some(min), Some(max), Some(avg)) = (self.min_fee, self.max_fee, self.average_fee) {
            println!("Fees: ₹{} to ₹{} (average ₹{:.0})", min, max, avg);
        }
        if let Some(years) = self.max_experience {
            println!("Most Experienced: {} years", years);
        }
        println!("Specialties Represented: {}", self.specialty_counts.len());
        for (name, count) in self.top_specialties(5) {
            println!("  {}: {}", name, count);
        }
    }
}
