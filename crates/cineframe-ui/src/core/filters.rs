//! URL-backed catalog filters.
//!
//! # Design
//! - The URL query is the single source of truth; a [`FilterSet`] is decoded from it on
//!   demand and never mutated in place.
//! - Writing one filter touches only that key; other parameters, recognised or not, keep
//!   their raw text and position.
//! - Writing a filter replaces the current history entry instead of pushing a new one.
//! - Clearing filters empties the whole query.

use std::fmt;
use std::str::FromStr;

/// Recognised filter query keys, in canonical serialisation order.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum FilterKey {
    /// Free-text title search.
    Search,
    /// Genre name.
    Genre,
    /// Release year.
    Year,
    /// `true` for series, `false` for films.
    IsSeries,
    /// Sort field (`title`, `year`).
    SortBy,
    /// Sort direction (`asc`, `desc`).
    SortOrder,
}

impl FilterKey {
    /// Every key in canonical order.
    pub const ALL: [Self; 6] = [
        Self::Search,
        Self::Genre,
        Self::Year,
        Self::IsSeries,
        Self::SortBy,
        Self::SortOrder,
    ];

    /// Query parameter name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Search => "search",
            Self::Genre => "genre",
            Self::Year => "year",
            Self::IsSeries => "is_series",
            Self::SortBy => "sort_by",
            Self::SortOrder => "sort_order",
        }
    }

    const fn index(self) -> usize {
        match self {
            Self::Search => 0,
            Self::Genre => 1,
            Self::Year => 2,
            Self::IsSeries => 3,
            Self::SortBy => 4,
            Self::SortOrder => 5,
        }
    }
}

impl fmt::Display for FilterKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Returned when parsing a query parameter that is not a filter key.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
#[error("unrecognised filter key `{0}`")]
pub struct UnknownFilterKey(pub String);

impl FromStr for FilterKey {
    type Err = UnknownFilterKey;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|key| key.as_str() == value)
            .ok_or_else(|| UnknownFilterKey(value.to_string()))
    }
}

/// Decoded view of the filter query parameters. Empty values mean "no constraint".
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct FilterSet {
    values: [String; 6],
}

impl FilterSet {
    /// Value for `key`, empty when unconstrained.
    #[must_use]
    pub fn get(&self, key: FilterKey) -> &str {
        &self.values[key.index()]
    }

    /// Copy of this set with `key` set to `value`.
    #[must_use]
    pub fn with(mut self, key: FilterKey, value: impl Into<String>) -> Self {
        self.values[key.index()] = value.into();
        self
    }

    /// Non-empty entries in canonical order.
    pub fn active(&self) -> impl Iterator<Item = (FilterKey, &str)> + '_ {
        FilterKey::ALL
            .into_iter()
            .map(|key| (key, self.get(key)))
            .filter(|(_, value)| !value.is_empty())
    }

    /// Whether any recognised key is non-empty.
    #[must_use]
    pub fn has_active_filters(&self) -> bool {
        self.active().next().is_some()
    }

    /// Non-empty keys as request query parameters.
    #[must_use]
    pub fn to_api_params(&self) -> Vec<(&'static str, String)> {
        self.active()
            .map(|(key, value)| (key.as_str(), value.to_string()))
            .collect()
    }

    /// Serialise to a URL query string (no leading `?`).
    #[must_use]
    pub fn to_query(&self) -> String {
        self.active()
            .map(|(key, value)| format!("{}={}", key.as_str(), urlencoding::encode(value)))
            .collect::<Vec<_>>()
            .join("&")
    }
}

/// Decode a URL query (with or without a leading `?`) into a [`FilterSet`].
///
/// Unknown parameters are dropped; for repeated keys the first occurrence wins.
#[must_use]
pub fn decode(query: &str) -> FilterSet {
    let mut filters = FilterSet::default();
    let mut seen = [false; 6];
    for pair in query.trim_start_matches('?').split('&') {
        if pair.is_empty() {
            continue;
        }
        let (raw_key, raw_value) = pair.split_once('=').unwrap_or((pair, ""));
        let Ok(key) = decode_component(raw_key).parse::<FilterKey>() else {
            continue;
        };
        if seen[key.index()] {
            continue;
        }
        seen[key.index()] = true;
        filters.values[key.index()] = decode_component(raw_value);
    }
    filters
}

/// Produce the query for `filters` with `key` set to `value`, or removed when empty.
#[must_use]
pub fn encode(filters: &FilterSet, key: FilterKey, value: &str) -> String {
    encode_query(&filters.to_query(), key, value)
}

/// Rewrite a raw URL query with `key` set to `value`, or removed when `value` is empty.
///
/// The first occurrence of `key` is replaced in place and later repeats are dropped; a new
/// key is appended. Every other parameter is kept verbatim.
#[must_use]
pub fn encode_query(query: &str, key: FilterKey, value: &str) -> String {
    let replacement = (!value.is_empty())
        .then(|| format!("{}={}", key.as_str(), urlencoding::encode(value)));
    let mut pairs = Vec::new();
    let mut seen = false;
    for pair in query.trim_start_matches('?').split('&') {
        if pair.is_empty() {
            continue;
        }
        let raw_key = pair.split_once('=').map_or(pair, |(raw_key, _)| raw_key);
        if decode_component(raw_key) != key.as_str() {
            pairs.push(pair.to_string());
            continue;
        }
        if !seen {
            pairs.extend(replacement.clone());
            seen = true;
        }
    }
    if !seen {
        pairs.extend(replacement);
    }
    pairs.join("&")
}

/// Whether any recognised key is non-empty.
#[must_use]
pub fn has_active_filters(filters: &FilterSet) -> bool {
    filters.has_active_filters()
}

/// Non-empty keys as request query parameters.
#[must_use]
pub fn to_api_params(filters: &FilterSet) -> Vec<(&'static str, String)> {
    filters.to_api_params()
}

fn decode_component(raw: &str) -> String {
    let spaced = raw.replace('+', " ");
    String::from_utf8_lossy(&urlencoding::decode_binary(spaced.as_bytes())).into_owned()
}

/// Owner of the current URL query.
pub trait Navigator {
    /// Current query string, with or without a leading `?`.
    fn query(&self) -> String;
    /// Swap the current history entry for one with `query`.
    fn replace_query(&self, query: &str);
}

/// In-process navigator used off-browser.
#[derive(Clone, Debug, Default)]
pub struct MemoryNavigator {
    query: std::rc::Rc<std::cell::RefCell<String>>,
}

impl MemoryNavigator {
    /// Navigator positioned at `query`.
    #[must_use]
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            query: std::rc::Rc::new(std::cell::RefCell::new(query.into())),
        }
    }
}

impl Navigator for MemoryNavigator {
    fn query(&self) -> String {
        self.query.borrow().clone()
    }

    fn replace_query(&self, query: &str) {
        query.clone_into(&mut self.query.borrow_mut());
    }
}

/// Filter controls bound to a [`Navigator`].
///
/// Holds the search box draft separately from the URL so typing does not refetch; the
/// draft is committed with [`UrlFilters::apply_search`].
#[derive(Debug)]
pub struct UrlFilters<N: Navigator> {
    navigator: N,
    local_search: String,
    observed_search: String,
}

impl<N: Navigator> UrlFilters<N> {
    /// Bind to `navigator`, seeding the search draft from the URL.
    pub fn new(navigator: N) -> Self {
        let search = decode(&navigator.query()).get(FilterKey::Search).to_string();
        Self {
            navigator,
            local_search: search.clone(),
            observed_search: search,
        }
    }

    /// Filters decoded from the current URL.
    #[must_use]
    pub fn filters(&self) -> FilterSet {
        decode(&self.navigator.query())
    }

    /// Re-read the URL after an external navigation. The search draft follows the URL
    /// when its `search` value changed.
    pub fn refresh(&mut self) -> FilterSet {
        let filters = self.filters();
        let search = filters.get(FilterKey::Search);
        if search != self.observed_search {
            search.clone_into(&mut self.observed_search);
            search.clone_into(&mut self.local_search);
        }
        filters
    }

    /// Current search box draft.
    #[must_use]
    pub fn local_search(&self) -> &str {
        &self.local_search
    }

    /// Update the search box draft without touching the URL.
    pub fn set_local_search(&mut self, value: impl Into<String>) {
        self.local_search = value.into();
    }

    /// Write one filter to the URL and return the resulting filters.
    pub fn update_filter(&mut self, key: FilterKey, value: &str) -> FilterSet {
        let query = encode_query(&self.navigator.query(), key, value);
        tracing::debug!(key = key.as_str(), query = %query, "filter updated");
        self.navigator.replace_query(&query);
        self.refresh()
    }

    /// Commit the trimmed search draft to the URL.
    pub fn apply_search(&mut self) -> FilterSet {
        let search = self.local_search.trim().to_string();
        self.update_filter(FilterKey::Search, &search)
    }

    /// Drop every filter and clear the search draft.
    pub fn clear_filters(&mut self) -> FilterSet {
        self.navigator.replace_query("");
        self.local_search.clear();
        self.refresh()
    }

    /// Whether the URL currently constrains the listing.
    #[must_use]
    pub fn has_active_filters(&self) -> bool {
        self.filters().has_active_filters()
    }
}

/// Value/label pair for a filter select control.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FilterOption {
    /// Query value; empty for the "any" entry.
    pub value: &'static str,
    /// Display label.
    pub label: &'static str,
}

/// Options for [`FilterKey::IsSeries`].
pub const TYPE_OPTIONS: [FilterOption; 3] = [
    FilterOption { value: "", label: "All Types" },
    FilterOption { value: "false", label: "Movie" },
    FilterOption { value: "true", label: "Series" },
];

/// Options for [`FilterKey::SortBy`].
pub const SORT_BY_OPTIONS: [FilterOption; 3] = [
    FilterOption { value: "", label: "Sort: Default" },
    FilterOption { value: "title", label: "Title" },
    FilterOption { value: "year", label: "Year" },
];

/// Options for [`FilterKey::SortOrder`].
pub const SORT_ORDER_OPTIONS: [FilterOption; 3] = [
    FilterOption { value: "", label: "Order: Default" },
    FilterOption { value: "desc", label: "Newest" },
    FilterOption { value: "asc", label: "Oldest" },
];

/// Oldest year offered by the year filter.
pub const EARLIEST_YEAR: i32 = 1980;

/// Selectable years, newest first.
#[must_use]
pub fn year_options(current_year: i32) -> Vec<i32> {
    (EARLIEST_YEAR..=current_year).rev().collect()
}

/// Result count line shown above the grid; `None` when nothing matched.
#[must_use]
pub fn results_summary(filters: &FilterSet, total: u64) -> Option<String> {
    if total == 0 {
        return None;
    }
    let search = filters.get(FilterKey::Search);
    let scope = if search.is_empty() {
        "All Movies".to_string()
    } else {
        format!("Results for \"{search}\"")
    };
    Some(format!("{scope} • {total} found"))
}
