/*!
 * # Doctor Directory Library
 *
 * Search, filter, and sort a healthcare provider directory, with the
 * current filter state kept in a shareable URL query string.
 *
 * ## Features
 *
 * - **Normalization**: Raw endpoint records (fee strings like "₹ 500",
 *   experience strings like "13 Years of experience") become typed records
 * - **Pure Filtering**: Name search, consultation mode, conjunctive specialty
 *   filter, and stable fee/experience sorting in one side-effect-free call
 * - **Shareable State**: Criteria round-trip through `search`, `consultation`,
 *   `specialties` and `sort` query keys
 * - **Explicit State Owner**: UI events in, derived view and URL updates out
 *
 * ## Quick Start
 *
 * ```no_run
 * use doctor_directory::prelude::*;
 *
 * # fn main() -> Result<()> {
 * let catalog = Catalog::load_json("providers.json")?;
 *
 * let criteria = FilterCriteria::new()
 *     .with_consultation(ConsultationMode::VideoConsult)
 *     .with_specialty("Dentist")
 *     .with_sort(SortKey::FeeAscending);
 *
 * let view = catalog.apply(&criteria);
 * println!("{} dentists offer video consults", view.len());
 * println!("Share: ?{}", doctor_directory::query_sync::serialize_criteria(&criteria));
 * # Ok(())
 * # }
 * ```
 *
 * ## Driving a UI
 *
 * ```
 * use doctor_directory::prelude::*;
 *
 * let mut state = DirectoryState::new(MemoryQueryStore::new("?sort=experience"));
 * state.subscribe(|render| println!("{} providers", render.view.len()));
 * state.complete_load(Ok(Catalog::default()));
 * state.dispatch(UiEvent::SearchChanged("sharma".to_string()));
 *
 * assert_eq!(state.store().current_query(), "search=sharma&sort=experience");
 * ```
 *
 * ## Fetching
 *
 * With the `fetch` feature the catalog can be loaded straight from the
 * provider endpoint:
 *
 * ```ignore
 * let config = DirectoryConfig::load();
 * let mut fetcher = CatalogFetcher::with_config(&config);
 * let catalog = CatalogBuilder::from_config(&config).fetch(&mut fetcher).await?;
 * ```
 */

// Re-export error types from root
pub use error::{DirectoryError, Result, ErrorContext, OutputFormat};

// Public modules
pub mod data_types;
pub mod error;
pub mod normalizer;
pub mod engine;
pub mod query_sync;
pub mod source;
pub mod catalog;
pub mod state;
pub mod render;
pub mod config;
#[cfg(feature = "fetch")]
pub mod fetch;

/// Prelude module for convenient imports
///
/// Import everything you need with:
/// ```
/// use doctor_directory::prelude::*;
/// ```
pub mod prelude {
    pub use crate::data_types::*;
    pub use crate::error::{DirectoryError, Result};
    pub use crate::normalizer::{normalize_record, MalformedRecordPolicy};
    pub use crate::engine::{apply, ProviderQuery};
    pub use crate::query_sync::{QueryStore, MemoryQueryStore, UrlQueryStore};
    pub use crate::catalog::{Catalog, CatalogBuilder, CatalogStatistics};
    pub use crate::state::{DirectoryState, LoadStatus, RenderState, UiEvent};
    pub use crate::render::{ViewRenderer, TextRenderer, JsonRenderer, CsvRenderer};
    pub use crate::config::{ConfigBuilder, DirectoryConfig};
    #[cfg(feature = "fetch")]
    pub use crate::fetch::CatalogFetcher;
    pub use crate::OutputFormat;
}

/// Directory constants
pub mod constants {
    /// Maximum number of name suggestions offered for a search
    pub const MAX_SUGGESTIONS: usize = 3;

    /// Endpoint serving the provider list
    pub const DEFAULT_ENDPOINT: &str = "https://srijandubey.github.io/campus-api-mock/SRM-C1-25.json";

    /// Specialties offered by the filter panel, in display order
    pub const SPECIALTY_OPTIONS: [&str; 25] = [
        "General Physician", "Dentist", "Dermatologist", "Paediatrician", "Gynaecologist",
        "ENT", "Diabetologist", "Cardiologist", "Physiotherapist", "Endocrinologist",
        "Orthopaedic", "Ophthalmologist", "Gastroenterologist", "Pulmonologist",
        "Psychiatrist", "Urologist", "Dietitian/Nutritionist", "Psychologist",
        "Sexologist", "Nephrologist", "Neurologist", "Oncologist", "Ayurveda", "Homeopath",
        "Gynaecologist and Obstetrician",
    ];

    /// Identifier of the filter control for a specialty
    ///
    /// "/" and " and " become "-", so "Dietitian/Nutritionist" maps to
    /// `filter-specialty-Dietitian-Nutritionist`.
    pub fn specialty_control_id(specialty: &str) -> String {
        format!("filter-specialty-{}", specialty.replace('/', "-").replace(" and ", "-"))
    }
}
