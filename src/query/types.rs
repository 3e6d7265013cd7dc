use std::collections::BTreeMap;

/// Row selection criteria.
///
/// Every constraint is optional: an empty search term or an empty equality
/// value means "no constraint" for that criterion.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilterSpec {
    /// Case-insensitive substring matched against the record's searchable
    /// fields.
    pub search: Option<String>,
    /// Exact field matches, keyed by wire field name.
    pub equals: BTreeMap<String, String>,
}

impl FilterSpec {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_search<S: Into<String>>(mut self, term: S) -> Self {
        self.search = Some(term.into());
        self
    }

    pub fn with_equals<K: Into<String>, V: Into<String>>(mut self, field: K, value: V) -> Self {
        self.equals.insert(field.into(), value.into());
        self
    }

    /// Search term, if one is set and non-blank.
    pub fn search_term(&self) -> Option<&str> {
        self.search
            .as_deref()
            .map(str::trim)
            .filter(|term| !term.is_empty())
    }

    /// Equality predicates that actually constrain the result.
    pub fn active_equals(&self) -> impl Iterator<Item = (&str, &str)> {
        self.equals
            .iter()
            .filter(|(_, value)| !value.is_empty())
            .map(|(field, value)| (field.as_str(), value.as_str()))
    }

    /// Value of a single active equality predicate.
    pub fn equals_value(&self, field: &str) -> Option<&str> {
        self.equals
            .get(field)
            .map(String::as_str)
            .filter(|value| !value.is_empty())
    }

    pub fn is_empty(&self) -> bool {
        self.search_term().is_none() && self.active_equals().next().is_none()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortDirection {
    Asc,
    Desc,
}

impl SortDirection {
    pub fn parse(value: &str) -> Option<Self> {
        match value.to_ascii_lowercase().as_str() {
            "asc" | "ascending" => Some(SortDirection::Asc),
            "desc" | "descending" => Some(SortDirection::Desc),
            _ => None,
        }
    }

    pub fn toggled(self) -> Self {
        match self {
            SortDirection::Asc => SortDirection::Desc,
            SortDirection::Desc => SortDirection::Asc,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SortSpec {
    pub key: String,
    pub direction: SortDirection,
}

impl SortSpec {
    pub fn asc<S: Into<String>>(key: S) -> Self {
        Self { key: key.into(), direction: SortDirection::Asc }
    }

    pub fn desc<S: Into<String>>(key: S) -> Self {
        Self { key: key.into(), direction: SortDirection::Desc }
    }
}

/// 1-based page window. Both values are clamped to at least 1.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageSpec {
    page: usize,
    size: usize,
}

impl PageSpec {
    pub fn new(page: usize, size: usize) -> Self {
        Self { page: page.max(1), size: size.max(1) }
    }

    /// A single page large enough to hold `len` rows.
    pub fn all(len: usize) -> Self {
        Self::new(1, len)
    }

    pub fn page(&self) -> usize {
        self.page
    }

    pub fn size(&self) -> usize {
        self.size
    }

    /// Zero-based index of the first row on this page.
    pub fn offset(&self) -> usize {
        (self.page - 1).saturating_mul(self.size)
    }

    pub fn with_page(self, page: usize) -> Self {
        Self::new(page, self.size)
    }
}

/// Number of pages needed for `total` rows; never less than one.
pub fn total_pages(total: usize, size: usize) -> usize {
    let size = size.max(1);
    total.div_ceil(size).max(1)
}
