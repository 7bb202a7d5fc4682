use crate::builder::{QueryBuilder, SearchTerms};

/// Fields requested when a filter names none.
pub const DEFAULT_FIELDS: &str = "id,name,mimeType,modifiedTime,size,parents";
/// Folders first, then by name, newest first among equals.
pub const DEFAULT_ORDER_BY: &str = "folder,name,modifiedTime desc";
pub const RECENT_ORDER_BY: &str = "modifiedTime desc";
pub const DEFAULT_LIMIT: usize = 1000;
/// Largest page the store will return.
pub const MAX_PAGE_SIZE: usize = 1000;

/// A search description: predicate terms plus result controls.
///
/// `unique` wins over `recent` when both are set.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SearchFilter {
    pub terms: SearchTerms,
    pub limit: usize,
    /// Expect at most one match; requests a page of two to detect duplicates.
    pub unique: bool,
    /// Return only the most recently modified match.
    pub recent: bool,
    /// Explicit field list; disables term-based augmentation.
    pub fields: Option<String>,
    pub order_by: Option<String>,
    pub allow_match_all: bool,
}

impl Default for SearchFilter {
    fn default() -> Self {
        Self {
            terms: SearchTerms::default(),
            limit: DEFAULT_LIMIT,
            unique: false,
            recent: false,
            fields: None,
            order_by: None,
            allow_match_all: false,
        }
    }
}

impl SearchFilter {
    pub fn new(terms: SearchTerms) -> Self {
        Self {
            terms,
            ..Self::default()
        }
    }

    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = limit;
        self
    }

    pub fn unique(mut self) -> Self {
        self.unique = true;
        self
    }

    pub fn recent(mut self) -> Self {
        self.recent = true;
        self
    }

    pub fn fields(mut self, fields: impl Into<String>) -> Self {
        self.fields = Some(fields.into());
        self
    }

    pub fn order_by(mut self, order_by: impl Into<String>) -> Self {
        self.order_by = Some(order_by.into());
        self
    }

    pub fn allow_match_all(mut self) -> Self {
        self.allow_match_all = true;
        self
    }

    /// Only folders.
    pub fn folders(mut self) -> Self {
        self.terms.is_folder = Some(true);
        self
    }

    /// Only non-folders.
    pub fn files(mut self) -> Self {
        self.terms.is_folder = Some(false);
        self
    }

    /// Whether this filter is in recent mode (and not overridden by unique).
    pub fn is_recent(&self) -> bool {
        self.recent && !self.unique
    }

    /// Page size sent to the store.
    pub fn page_size(&self) -> usize {
        if self.unique {
            2
        } else if self.recent {
            1
        } else {
            self.limit.clamp(1, MAX_PAGE_SIZE)
        }
    }

    pub fn effective_order_by(&self) -> &str {
        match &self.order_by {
            Some(order) => order.as_str(),
            None if self.is_recent() => RECENT_ORDER_BY,
            None => DEFAULT_ORDER_BY,
        }
    }

    pub fn query_builder(&self) -> QueryBuilder {
        QueryBuilder::new(self.terms.clone()).allow_match_all(self.allow_match_all)
    }

    /// Fields to request: the explicit list as given, or the defaults plus
    /// the fields of every explicit term.
    pub fn result_fields(&self) -> String {
        match &self.fields {
            Some(fields) => fields.clone(),
            None => self.query_builder().fields(DEFAULT_FIELDS),
        }
    }
}
