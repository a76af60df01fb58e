/*!
 * Filter and sort engine
 *
 * Pure derivation of the visible provider list and name suggestions from a
 * catalog and a set of [`FilterCriteria`]. Nothing in here touches the query
 * string; the state owner syncs it after calling [`apply`].
 */

use std::collections::BTreeSet;
use tracing::debug;

use crate::constants::MAX_SUGGESTIONS;
use crate::data_types::*;

type Predicate<'a> = Box<dyn Fn(&ProviderRecord) -> bool + Send + Sync + 'a>;

/// Derive the view for `criteria` over `catalog`
///
/// # Example
/// ```
/// # use doctor_directory::prelude::*;
/// # use doctor_directory::engine::apply;
/// let catalog: Vec<ProviderRecord> = Vec::new();
/// let view = apply(&catalog, &FilterCriteria::new().with_search("dr"));
/// assert!(view.is_empty());
/// ```
pub fn apply(catalog: &[ProviderRecord], criteria: &FilterCriteria) -> DerivedView {
    apply_with_limit(catalog, criteria, MAX_SUGGESTIONS)
}

/// [`apply`] with a suggestion limit, capped at [`MAX_SUGGESTIONS`]
pub fn apply_with_limit(
    catalog: &[ProviderRecord],
    criteria: &FilterCriteria,
    suggestion_limit: usize,
) -> DerivedView {
    let visible_providers: Vec<ProviderRecord> = ProviderQuery::new(catalog)
        .criteria(criteria)
        .execute()
        .into_iter()
        .cloned()
        .collect();

    let name_suggestions = suggestions(catalog, &criteria.search_text, suggestion_limit.min(MAX_SUGGESTIONS));

    debug!(
        catalog = catalog.len(),
        visible = visible_providers.len(),
        suggestions = name_suggestions.len(),
        "derived provider view"
    );

    DerivedView {
        visible_providers,
        name_suggestions,
    }
}

/// Names of the first `limit` providers matching `search_text`, in catalog
/// order. Other filters are deliberately ignored.
pub fn suggestions(catalog: &[ProviderRecord], search_text: &str, limit: usize) -> Vec<String> {
    if search_text.is_empty() {
        return Vec::new();
    }
    let query_lower = search_text.to_lowercase();
    catalog
        .iter()
        .filter(|p| p.name_matches(&query_lower))
        .take(limit)
        .map(|p| p.name.clone())
        .collect()
}

/// Sort providers in place; `sort_by_key` is stable so ties keep catalog order
pub fn sort_providers(providers: &mut [&ProviderRecord], key: SortKey) {
    match key {
        SortKey::None => {}
        SortKey::FeeAscending => providers.sort_by_key(|p| p.fee_amount),
        SortKey::ExperienceDescending => {
            providers.sort_by_key(|p| std::cmp::Reverse(p.experience_years))
        }
    }
}

/// Query builder over a provider catalog
///
/// # Example
/// ```
/// # use doctor_directory::prelude::*;
/// # use doctor_directory::engine::ProviderQuery;
/// # let catalog: Vec<ProviderRecord> = Vec::new();
/// let dentists_by_fee = ProviderQuery::new(&catalog)
///     .consultation(ConsultationMode::InClinic)
///     .specialty("Dentist")
///     .sort(SortKey::FeeAscending)
///     .execute();
/// # assert!(dentists_by_fee.is_empty());
/// ```
pub struct ProviderQuery<'a> {
    catalog: &'a [ProviderRecord],
    filters: Vec<Predicate<'a>>,
    sort_key: SortKey,
}

impl<'a> ProviderQuery<'a> {
    /// Create a new query over the full catalog
    pub fn new(catalog: &'a [ProviderRecord]) -> Self {
        Self {
            catalog,
            filters: Vec::new(),
            sort_key: SortKey::None,
        }
    }

    /// Apply every field of `criteria`
    pub fn criteria(self, criteria: &FilterCriteria) -> Self {
        self.search(&criteria.search_text)
            .consultation(criteria.consultation_mode)
            .specialties(criteria.specialties.clone())
            .sort(criteria.sort_key)
    }

    /// Case-insensitive name substring filter; empty text is no constraint
    pub fn search(mut self, text: &str) -> Self {
        if !text.is_empty() {
            let query_lower = text.to_lowercase();
            self.filters.push(Box::new(move |p: &ProviderRecord| p.name_matches(&query_lower)));
        }
        self
    }

    /// Filter by consultation mode
    pub fn consultation(mut self, mode: ConsultationMode) -> Self {
        if mode != ConsultationMode::None {
            self.filters.push(Box::new(move |p: &ProviderRecord| p.supports(mode)));
        }
        self
    }

    /// Require a single specialty
    pub fn specialty(mut self, specialty: &'a str) -> Self {
        self.filters.push(Box::new(move |p: &ProviderRecord| p.has_specialty(specialty)));
        self
    }

    /// Require every specialty in the set
    pub fn specialties(mut self, selected: BTreeSet<String>) -> Self {
        if !selected.is_empty() {
            self.filters.push(Box::new(move |p: &ProviderRecord| p.has_all_specialties(&selected)));
        }
        self
    }

    pub fn sort(mut self, key: SortKey) -> Self {
        self.sort_key = key;
        self
    }

    fn keep(&self, provider: &ProviderRecord) -> bool {
        self.filters.iter().all(|filter| filter(provider))
    }

    /// Execute the query and return matching providers in result order
    pub fn execute(self) -> Vec<&'a ProviderRecord> {
        let catalog: &'a [ProviderRecord] = self.catalog;

        #[cfg(feature = "parallel")]
        let mut results: Vec<&'a ProviderRecord> = {
            use rayon::prelude::*;
            catalog.par_iter()
                .filter(|provider| self.keep(provider))
                .collect()
        };

        #[cfg(not(feature = "parallel"))]
        let mut results: Vec<&'a ProviderRecord> = catalog.iter()
            .filter(|provider| self.keep(provider))
            .collect();

        sort_providers(&mut results, self.sort_key);
        results
    }

    /// Execute the query and return count only
    pub fn count(self) -> usize {
        self.catalog.iter().filter(|p| self.keep(p)).count()
    }

    /// Execute the query and keep the first `limit` results
    pub fn limit(self, limit: usize) -> Vec<&'a ProviderRecord> {
        let mut results = self.execute();
        results.truncate(limit);
        results
    }
}
