/*!
 * Directory state owner
 *
 * [`DirectoryState`] holds the catalog, the current [`FilterCriteria`], the
 * derived view and the load status. It is the only place criteria change:
 * every UI event mutates them, re-derives the view through the engine,
 * writes them back to the query store, and notifies render subscribers, all
 * within the same call.
 */

use tracing::{debug, info, warn};

use crate::Result;
use crate::catalog::{Catalog, CatalogBuilder};
use crate::constants::MAX_SUGGESTIONS;
use crate::data_types::*;
use crate::engine;
use crate::normalizer::MalformedRecordPolicy;
use crate::query_sync::{self, QueryStore};

/// Where the catalog load stands
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum LoadStatus {
    /// The catalog has not arrived yet
    #[default]
    Loading,
    /// Catalog loaded; `skipped` malformed records were dropped
    Ready { skipped: usize },
    /// The load failed; the catalog stays empty
    Failed { message: String },
}

impl LoadStatus {
    pub fn is_failed(&self) -> bool {
        matches!(self, LoadStatus::Failed { .. })
    }
}

/// Interactions forwarded by the UI binding layer
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UiEvent {
    /// Text typed into the search box
    SearchChanged(String),
    /// A name suggestion was picked
    SuggestionClicked(String),
    ConsultationChanged(ConsultationMode),
    SortChanged(SortKey),
    /// A specialty checkbox was toggled
    SpecialtyToggled(String),
}

/// Everything a renderer needs after a change
#[derive(Debug, Clone, Copy)]
pub struct RenderState<'a> {
    pub criteria: &'a FilterCriteria,
    pub view: &'a DerivedView,
    pub status: &'a LoadStatus,
}

type Subscriber = Box<dyn FnMut(&RenderState<'_>)>;

/// Owner of all mutable directory state
pub struct DirectoryState<S: QueryStore> {
    catalog: Catalog,
    criteria: FilterCriteria,
    view: DerivedView,
    status: LoadStatus,
    store: S,
    suggestion_limit: usize,
    suggestions_dismissed: bool,
    subscribers: Vec<Subscriber>,
}

impl<S: QueryStore> DirectoryState<S> {
    /// Create state in the loading phase with criteria read from `store`
    pub fn new(store: S) -> Self {
        let criteria = query_sync::load(&store);
        Self {
            catalog: Catalog::default(),
            criteria,
            view: DerivedView::default(),
            status: LoadStatus::Loading,
            store,
            suggestion_limit: MAX_SUGGESTIONS,
            suggestions_dismissed: false,
            subscribers: Vec::new(),
        }
    }

    /// Offer fewer than three suggestions
    pub fn with_suggestion_limit(mut self, limit: usize) -> Self {
        self.suggestion_limit = limit.min(MAX_SUGGESTIONS);
        self
    }

    /// Register a render callback, invoked after every change
    pub fn subscribe<F>(&mut self, callback: F)
    where
        F: FnMut(&RenderState<'_>) + 'static,
    {
        self.subscribers.push(Box::new(callback));
    }

    /// Finish the startup load: install the catalog (or record the failure),
    /// re-derive the view for the current criteria, and notify.
    pub fn complete_load(&mut self, result: Result<Catalog>) {
        match result {
            Ok(catalog) => {
                info!(providers = catalog.len(), skipped = catalog.skipped_records, "directory ready");
                self.status = LoadStatus::Ready { skipped: catalog.skipped_records };
                self.catalog = catalog;
            }
            Err(e) => {
                warn!(error = %e, "directory load failed");
                self.status = LoadStatus::Failed { message: e.to_string() };
                self.catalog = Catalog::default();
            }
        }

        self.refresh();
    }

    /// Normalize raw records under `policy`, then [`complete_load`](Self::complete_load)
    pub fn complete_raw_load(
        &mut self,
        result: Result<Vec<RawProviderRecord>>,
        policy: MalformedRecordPolicy,
    ) {
        let catalog = result.and_then(|raw| {
            CatalogBuilder::new()
                .raw_records(raw)
                .malformed_record_policy(policy)
                .build()
        });
        self.complete_load(catalog);
    }

    /// Fetch the catalog and complete the load with the outcome
    #[cfg(feature = "fetch")]
    pub async fn load_from(
        &mut self,
        fetcher: &mut crate::fetch::CatalogFetcher,
        policy: MalformedRecordPolicy,
    ) {
        let raw = fetcher.fetch_raw().await;
        self.complete_raw_load(raw, policy);
    }

    /// Apply one UI interaction
    pub fn dispatch(&mut self, event: UiEvent) {
        debug!(?event, "ui event");
        match event {
            UiEvent::SearchChanged(text) => {
                self.suggestions_dismissed = false;
                self.criteria.search_text = text;
            }
            UiEvent::SuggestionClicked(name) => {
                self.suggestions_dismissed = true;
                self.criteria.search_text = name;
            }
            UiEvent::ConsultationChanged(mode) => self.criteria.consultation_mode = mode,
            UiEvent::SortChanged(key) => self.criteria.sort_key = key,
            UiEvent::SpecialtyToggled(name) => {
                self.criteria.toggle_specialty(&name);
            }
        }
        self.refresh();
    }

    /// Re-derive, write the query string, and notify subscribers
    fn refresh(&mut self) {
        let derived = engine::apply_with_limit(self.catalog.providers(), &self.criteria, self.suggestion_limit);
        self.view = if self.suggestions_dismissed {
            DerivedView {
                visible_providers: derived.visible_providers,
                name_suggestions: Vec::new(),
            }
        } else {
            derived
        };

        query_sync::save(&mut self.store, &self.criteria);

        let render = RenderState {
            criteria: &self.criteria,
            view: &self.view,
            status: &self.status,
        };
        for subscriber in self.subscribers.iter_mut() {
            subscriber(&render);
        }
    }

    pub fn criteria(&self) -> &FilterCriteria {
        &self.criteria
    }

    pub fn view(&self) -> &DerivedView {
        &self.view
    }

    pub fn status(&self) -> &LoadStatus {
        &self.status
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Current render surface
    pub fn render_state(&self) -> RenderState<'_> {
        RenderState {
            criteria: &self.criteria,
            view: &self.view,
            status: &self.status,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query_sync::MemoryQueryStore;
    use crate::DirectoryError;
    use std::cell::RefCell;
    use std::rc::Rc;

    fn provider(id: &str, name: &str, fee: u32) -> ProviderRecord {
        ProviderRecord {
            id: ProviderId::new(id),
            name: name.to_string(),
            photo_url: String::new(),
            specialties: vec!["Dentist".to_string()],
            fee_amount: fee,
            experience_years: 3,
            supports_video_consult: true,
            supports_in_clinic: false,
        }
    }

    fn loaded(query: &str) -> DirectoryState<MemoryQueryStore> {
        let mut state = DirectoryState::new(MemoryQueryStore::new(query));
        state.complete_load(Ok(Catalog::new(vec![
            provider("1", "Dr. Asha", 500),
            provider("2", "Dr. Arun", 300),
            provider("3", "Mr. Bose", 100),
        ])));
        state
    }

    #[test]
    fn test_load_reads_criteria_from_store() {
        let state = loaded("?sort=fees&search=dr");
        assert_eq!(state.criteria().sort_key, SortKey::FeeAscending);
        let names: Vec<_> = state.view().visible_providers.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, vec!["Dr. Arun", "Dr. Asha"]);
        assert_eq!(state.status(), &LoadStatus::Ready { skipped: 0 });
        assert_eq!(state.store().current_query(), "search=dr&sort=fees");
    }

    #[test]
    fn test_every_event_writes_store_and_notifies() {
        let mut state = loaded("");
        let renders = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&renders);
        state.subscribe(move |render| sink.borrow_mut().push(render.view.len()));

        state.dispatch(UiEvent::ConsultationChanged(ConsultationMode::VideoConsult));
        assert_eq!(state.store().current_query(), "consultation=Video+Consult");
        state.dispatch(UiEvent::SpecialtyToggled("Dentist".to_string()));
        state.dispatch(UiEvent::SpecialtyToggled("Dentist".to_string()));
        assert_eq!(state.store().current_query(), "consultation=Video+Consult");

        assert_eq!(*renders.borrow(), vec![3, 3, 3]);
        assert_eq!(state.store().writes(), 4);
    }

    #[test]
    fn test_suggestion_click_sets_search_and_clears_suggestions() {
        let mut state = loaded("");
        state.dispatch(UiEvent::SearchChanged("dr".to_string()));
        assert_eq!(state.view().name_suggestions, vec!["Dr. Asha", "Dr. Arun"]);

        state.dispatch(UiEvent::SuggestionClicked("Dr. Arun".to_string()));
        assert_eq!(state.criteria().search_text, "Dr. Arun");
        assert!(state.view().name_suggestions.is_empty());
        assert_eq!(state.view().len(), 1);

        state.dispatch(UiEvent::SearchChanged("Dr. A".to_string()));
        assert_eq!(state.view().name_suggestions.len(), 2);
    }

    #[test]
    fn test_failed_load_is_visible_and_interactive() {
        let mut state = DirectoryState::new(MemoryQueryStore::new("search=x"));
        state.complete_load(Err(DirectoryError::network("HTTP error 503", None, Some(503))));
        assert!(state.status().is_failed());
        assert!(state.view().is_empty());

        state.dispatch(UiEvent::SortChanged(SortKey::ExperienceDescending));
        assert_eq!(state.store().current_query(), "search=x&sort=experience");
        assert!(state.view().is_empty());
    }

    #[test]
    fn test_event_before_load_keeps_shared_filters() {
        let mut state = DirectoryState::new(MemoryQueryStore::new("?sort=fees&specialties=ENT"));
        assert_eq!(state.criteria().sort_key, SortKey::FeeAscending);

        state.dispatch(UiEvent::SearchChanged("dr".to_string()));
        assert_eq!(state.status(), &LoadStatus::Loading);
        assert_eq!(state.store().current_query(), "search=dr&specialties=ENT&sort=fees");

        state.complete_load(Ok(Catalog::default()));
        assert_eq!(state.criteria().search_text, "dr");
        assert_eq!(state.criteria().sort_key, SortKey::FeeAscending);
        assert!(state.criteria().specialties.contains("ENT"));
        assert_eq!(state.store().current_query(), "search=dr&specialties=ENT&sort=fees");
    }

    #[test]
    fn test_suggestion_limit() {
        let mut state = loaded("").with_suggestion_limit(1);
        state.dispatch(UiEvent::SearchChanged("a".to_string()));
        assert_eq!(state.view().name_suggestions, vec!["Dr. Asha"]);
    }
}
