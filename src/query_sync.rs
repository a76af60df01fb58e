/*!
 * Query-string synchronization of filter criteria
 *
 * Maps [`FilterCriteria`] to and from the `search`, `consultation`,
 * `specialties` and `sort` query keys. The address bar itself is abstracted
 * behind [`QueryStore`] so the state owner can write to a browser location,
 * a [`url::Url`], or a plain string.
 */

use url::{form_urlencoded, Url};

use crate::{Result, DirectoryError};
use crate::data_types::*;

pub const SEARCH_KEY: &str = "search";
pub const CONSULTATION_KEY: &str = "consultation";
pub const SPECIALTIES_KEY: &str = "specialties";
pub const SORT_KEY: &str = "sort";

const CONSULTATION_VALUES: [&str; 2] = ["Video Consult", "In Clinic"];
const SORT_VALUES: [&str; 2] = ["fees", "experience"];

/// Key-value query-string store, i.e. the current address-bar entry
pub trait QueryStore {
    /// The current query string, without a leading `?`
    fn current_query(&self) -> String;

    /// Replace the current entry's query without adding a history entry
    fn replace_query(&mut self, query: &str);
}

/// In-memory query store
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MemoryQueryStore {
    query: String,
    writes: usize,
}

impl MemoryQueryStore {
    pub fn new(query: impl Into<String>) -> Self {
        let query = query.into();
        Self {
            query: query.strip_prefix('?').map(str::to_string).unwrap_or(query),
            writes: 0,
        }
    }

    /// Number of times the query has been replaced
    pub fn writes(&self) -> usize {
        self.writes
    }
}

impl QueryStore for MemoryQueryStore {
    fn current_query(&self) -> String {
        self.query.clone()
    }

    fn replace_query(&mut self, query: &str) {
        self.query = query.to_string();
        self.writes += 1;
    }
}

/// Query store backed by a full URL, standing in for a browser location
#[derive(Debug, Clone)]
pub struct UrlQueryStore {
    url: Url,
}

impl UrlQueryStore {
    pub fn new(url: Url) -> Self {
        Self { url }
    }

    pub fn parse(url: &str) -> Result<Self> {
        let url = Url::parse(url).map_err(|e| DirectoryError::Custom {
            message: format!("Invalid URL '{}': {}", url, e),
            suggestion: Some("Use an absolute URL such as https://example.com/doctors".to_string()),
        })?;
        Ok(Self::new(url))
    }

    pub fn url(&self) -> &Url {
        &self.url
    }
}

impl QueryStore for UrlQueryStore {
    fn current_query(&self) -> String {
        self.url.query().unwrap_or_default().to_string()
    }

    fn replace_query(&mut self, query: &str) {
        if query.is_empty() {
            self.url.set_query(None);
        } else {
            self.url.set_query(Some(query));
        }
    }
}

/// Parse criteria from a query string.
///
/// Unknown keys are ignored, the first occurrence of a repeated key wins, and
/// unrecognized consultation or sort values fall back to no constraint.
pub fn parse_query(query: &str) -> FilterCriteria {
    let query = query.strip_prefix('?').unwrap_or(query);

    let mut search = None;
    let mut consultation = None;
    let mut specialties = None;
    let mut sort = None;

    for (key, value) in form_urlencoded::parse(query.as_bytes()) {
        let slot = match &*key {
            SEARCH_KEY => &mut search,
            CONSULTATION_KEY => &mut consultation,
            SPECIALTIES_KEY => &mut specialties,
            SORT_KEY => &mut sort,
            _ => continue,
        };
        if slot.is_none() {
            *slot = Some(value.into_owned());
        }
    }

    FilterCriteria {
        search_text: search.unwrap_or_default(),
        consultation_mode: consultation
            .as_deref()
            .map(ConsultationMode::from_query_value)
            .unwrap_or_default(),
        specialties: specialties
            .as_deref()
            .map(|list| {
                list.split(',')
                    .filter(|s| !s.is_empty())
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default(),
        sort_key: sort.as_deref().map(SortKey::from_query_value).unwrap_or_default(),
    }
}

/// Like [`parse_query`], but a non-empty `consultation` or `sort` value that
/// is not recognized is an error instead of no constraint.
pub fn parse_query_strict(query: &str) -> Result<FilterCriteria> {
    let query = query.strip_prefix('?').unwrap_or(query);
    let mut seen_consultation = false;
    let mut seen_sort = false;

    for (key, value) in form_urlencoded::parse(query.as_bytes()) {
        let (seen, valid): (&mut bool, &[&str]) = match &*key {
            CONSULTATION_KEY => (&mut seen_consultation, &CONSULTATION_VALUES),
            SORT_KEY => (&mut seen_sort, &SORT_VALUES),
            _ => continue,
        };
        // Later repeats are ignored by parse_query too
        if std::mem::replace(seen, true) {
            continue;
        }
        if !value.is_empty() && !valid.iter().any(|v| *v == &*value) {
            return Err(DirectoryError::invalid_criteria(&key, &value, valid));
        }
    }

    Ok(parse_query(query))
}

/// Serialize criteria, omitting every key that holds its default value
pub fn serialize_criteria(criteria: &FilterCriteria) -> String {
    let mut serializer = form_urlencoded::Serializer::new(String::new());

    if !criteria.search_text.is_empty() {
        serializer.append_pair(SEARCH_KEY, &criteria.search_text);
    }
    if let Some(mode) = criteria.consultation_mode.query_value() {
        serializer.append_pair(CONSULTATION_KEY, mode);
    }
    if !criteria.specialties.is_empty() {
        let joined = criteria.specialties.iter().map(String::as_str).collect::<Vec<_>>().join(",");
        serializer.append_pair(SPECIALTIES_KEY, &joined);
    }
    if let Some(sort) = criteria.sort_key.query_value() {
        serializer.append_pair(SORT_KEY, sort);
    }

    serializer.finish()
}

/// Read criteria from the store; the store is left untouched
pub fn load<S: QueryStore + ?Sized>(store: &S) -> FilterCriteria {
    parse_query(&store.current_query())
}

/// Write criteria to the store, replacing the current entry
pub fn save<S: QueryStore + ?Sized>(store: &mut S, criteria: &FilterCriteria) {
    store.replace_query(&serialize_criteria(criteria));
}

/// Build a bookmarkable link for `criteria` on top of `base_url`
pub fn shareable_link(base_url: &str, criteria: &FilterCriteria) -> Result<Url> {
    let mut store = UrlQueryStore::parse(base_url)?;
    save(&mut store, criteria);
    Ok(store.url)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_defaults() {
        assert!(parse_query("").is_default());
        assert!(parse_query("?page=2&utm_source=x").is_default());
    }

    #[test]
    fn test_parse_all_keys() {
        let criteria = parse_query(
            "?search=dr+a&consultation=Video+Consult&specialties=Dentist%2C%2CENT&sort=experience",
        );
        assert_eq!(criteria.search_text, "dr a");
        assert_eq!(criteria.consultation_mode, ConsultationMode::VideoConsult);
        assert_eq!(criteria.specialties.len(), 2);
        assert!(criteria.specialties.contains("Dentist"));
        assert!(criteria.specialties.contains("ENT"));
        assert_eq!(criteria.sort_key, SortKey::ExperienceDescending);
    }

    #[test]
    fn test_parse_unrecognized_values() {
        let criteria = parse_query("consultation=Home+Visit&sort=rating");
        assert_eq!(criteria.consultation_mode, ConsultationMode::None);
        assert_eq!(criteria.sort_key, SortKey::None);
    }

    #[test]
    fn test_first_repeated_key_wins() {
        assert_eq!(parse_query("search=a&search=b").search_text, "a");
    }

    #[test]
    fn test_serialize_omits_defaults() {
        let criteria = FilterCriteria::new().with_search("abc").with_sort(SortKey::FeeAscending);
        assert_eq!(serialize_criteria(&criteria), "search=abc&sort=fees");
        assert_eq!(serialize_criteria(&FilterCriteria::new()), "");
    }

    #[test]
    fn test_serialize_encodes_spaces_and_commas() {
        let criteria = FilterCriteria::new()
            .with_consultation(ConsultationMode::InClinic)
            .with_specialty("General Physician")
            .with_specialty("Dentist");
        assert_eq!(
            serialize_criteria(&criteria),
            "consultation=In+Clinic&specialties=Dentist%2CGeneral+Physician"
        );
    }

    #[test]
    fn test_load_does_not_write() {
        let store = MemoryQueryStore::new("?search=x");
        let criteria = load(&store);
        assert_eq!(criteria.search_text, "x");
        assert_eq!(store.writes(), 0);
    }

    #[test]
    fn test_url_store_replaces_in_place() {
        let mut store = UrlQueryStore::parse("https://example.com/doctors?search=old").unwrap();
        save(&mut store, &FilterCriteria::new().with_sort(SortKey::ExperienceDescending));
        assert_eq!(store.url().as_str(), "https://example.com/doctors?sort=experience");

        save(&mut store, &FilterCriteria::new());
        assert_eq!(store.url().as_str(), "https://example.com/doctors");
    }

    #[test]
    fn test_strict_parse_rejects_unknown_values() {
        match parse_query_strict("?sort=price") {
            Err(DirectoryError::InvalidCriteria { key, value, valid_options }) => {
                assert_eq!(key, "sort");
                assert_eq!(value, "price");
                assert_eq!(valid_options, vec!["fees", "experience"]);
            }
            other => panic!("expected InvalidCriteria, got {:?}", other),
        }
        assert!(parse_query_strict("consultation=Home+Visit").is_err());
    }

    #[test]
    fn test_strict_parse_accepts_known_values() {
        let criteria = parse_query_strict("consultation=In+Clinic&sort=fees&sort=bogus&page=2").unwrap();
        assert_eq!(criteria.consultation_mode, ConsultationMode::InClinic);
        assert_eq!(criteria.sort_key, SortKey::FeeAscending);
        assert!(parse_query_strict("sort=&search=x").is_ok());
    }

    #[test]
    fn test_shareable_link() {
        let link = shareable_link(
            "https://example.com/",
            &FilterCriteria::new().with_search("Dr. Shah"),
        ).unwrap();
        assert_eq!(link.as_str(), "https://example.com/?search=Dr.+Shah");
    }
}
