use std::collections::BTreeMap;

use chrono::{DateTime, SecondsFormat, Utc};
use drivex_types::FOLDER_MIME_TYPE;

use crate::error::{QueryError, QueryResult};

/// Predicate terms of a search.
///
/// `parent` and `name` are not here: they are supplied per call so one
/// filter can be reused across a path walk.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SearchTerms {
    pub name: Option<String>,
    pub mime_type: Option<String>,
    /// Synthetic: rendered as a MIME type comparison against the folder type.
    pub is_folder: Option<bool>,
    /// Synthetic: full-text match, not a node field.
    pub full_text: Option<String>,
    pub modified_after: Option<DateTime<Utc>>,
    /// `None` renders as `trashed=false`.
    pub trashed: Option<bool>,
    pub starred: Option<bool>,
    pub properties: BTreeMap<String, String>,
    pub app_properties: BTreeMap<String, String>,
}

impl SearchTerms {
    /// Node fields named by explicitly given terms.
    ///
    /// Synthetic terms (`is_folder`, `full_text`) have no field of their own.
    pub fn field_names(&self) -> Vec<&'static str> {
        let mut names = Vec::new();
        if self.name.is_some() {
            names.push("name");
        }
        if self.mime_type.is_some() {
            names.push("mimeType");
        }
        if self.modified_after.is_some() {
            names.push("modifiedTime");
        }
        if self.trashed.is_some() {
            names.push("trashed");
        }
        if self.starred.is_some() {
            names.push("starred");
        }
        if !self.properties.is_empty() {
            names.push("properties");
        }
        if !self.app_properties.is_empty() {
            names.push("appProperties");
        }
        names
    }
}

/// Escape a value for embedding in a single-quoted query literal.
pub fn escape(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for c in value.chars() {
        if c == '\\' || c == '\'' {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

fn quoted(value: &str) -> String {
    format!("'{}'", escape(value))
}

/// Renders [`SearchTerms`] into the store's query language.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct QueryBuilder {
    terms: SearchTerms,
    allow_match_all: bool,
}

impl QueryBuilder {
    pub fn new(terms: SearchTerms) -> Self {
        Self {
            terms,
            allow_match_all: false,
        }
    }

    /// Permit queries with no predicate besides the implicit `trashed=false`.
    pub fn allow_match_all(mut self, allow: bool) -> Self {
        self.allow_match_all = allow;
        self
    }

    pub fn terms(&self) -> &SearchTerms {
        &self.terms
    }

    /// Build the query string. A per-call `name` overrides the term's name.
    ///
    /// Fails with `BadRequest` when the query would match every node and
    /// match-all was not allowed.
    pub fn build(&self, parent: Option<&str>, name: Option<&str>) -> QueryResult<String> {
        let t = &self.terms;
        let mut clauses = Vec::new();

        if let Some(name) = name.or(t.name.as_deref()) {
            clauses.push(format!("name={}", quoted(name)));
        }
        if let Some(parent) = parent {
            clauses.push(format!("{} in parents", quoted(parent)));
        }
        if let Some(mime_type) = &t.mime_type {
            clauses.push(format!("mimeType={}", quoted(mime_type)));
        }
        match t.is_folder {
            Some(true) => clauses.push(format!("mimeType={}", quoted(FOLDER_MIME_TYPE))),
            Some(false) => clauses.push(format!("mimeType!={}", quoted(FOLDER_MIME_TYPE))),
            None => {}
        }
        if let Some(text) = &t.full_text {
            clauses.push(format!("fullText contains {}", quoted(text)));
        }
        if let Some(after) = t.modified_after {
            let stamp = after.to_rfc3339_opts(SecondsFormat::Millis, true);
            clauses.push(format!("modifiedTime > {}", quoted(&stamp)));
        }
        if let Some(starred) = t.starred {
            clauses.push(format!("starred={starred}"));
        }
        for (map, props) in [
            ("properties", &t.properties),
            ("appProperties", &t.app_properties),
        ] {
            for (key, value) in props {
                clauses.push(format!(
                    "{map} has {{ key={} and value={} }}",
                    quoted(key),
                    quoted(value)
                ));
            }
        }

        if clauses.is_empty() && !self.allow_match_all {
            return Err(QueryError::BadRequest(
                "search would match every file; give a predicate or allow match-all".into(),
            ));
        }

        clauses.push(format!("trashed={}", t.trashed.unwrap_or(false)));
        Ok(clauses.join(" and "))
    }

    /// `base` plus every explicit term's field not already listed.
    pub fn fields(&self, base: &str) -> String {
        let mut fields: Vec<String> = base
            .split(',')
            .map(str::trim)
            .filter(|f| !f.is_empty())
            .map(String::from)
            .collect();
        for name in self.terms.field_names() {
            if !fields.iter().any(|f| f == name) {
                fields.push(name.to_string());
            }
        }
        fields.join(",")
    }
}
