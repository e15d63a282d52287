//! Client-side filter evaluator.
//!
//! A pure conjunction of per-field predicates over the *currently cached
//! page*. This is not a substitute for server-side filtering: the `total`
//! shown next to a filtered view is still the unfiltered server count. The
//! evaluator is a plain function over the `Filterable` seam so a future
//! server-side predicate can replace it without changing the `Filter` shape.

use std::borrow::Cow;
use std::collections::{BTreeMap, BTreeSet};

use chrono::{DateTime, Utc};

use crate::model::{Customer, Lead, Opportunity};

/// Per-field predicate. An empty value (empty string, empty tag set) matches
/// everything, mirroring an untouched form input.
#[derive(Debug, Clone, PartialEq)]
pub enum Predicate {
    /// Case-insensitive substring.
    Text(String),
    /// Exact match (select inputs).
    Exact(String),
    /// Inclusive lower bound.
    Min(f64),
    /// Inclusive upper bound.
    Max(f64),
    /// Inclusive calendar-instant lower bound.
    After(DateTime<Utc>),
    /// Inclusive calendar-instant upper bound.
    Before(DateTime<Utc>),
    /// All criteria tags must be present (AND semantics).
    Tags(BTreeSet<String>),
}

impl Predicate {
    fn is_vacuous(&self) -> bool {
        match self {
            Self::Text(text) | Self::Exact(text) => text.is_empty(),
            Self::Tags(tags) => tags.is_empty(),
            _ => false,
        }
    }
}

/// A mapping from criterion key to predicate.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Filter {
    criteria: BTreeMap<String, Predicate>,
}

impl Filter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, key: impl Into<String>, predicate: Predicate) -> Self {
        self.criteria.insert(key.into(), predicate);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.criteria.is_empty()
    }
}

/// A typed field value exposed to the evaluator.
pub enum FieldValue<'a> {
    Text(Cow<'a, str>),
    Number(f64),
    Date(DateTime<Utc>),
    Tags(&'a BTreeSet<String>),
}

/// Maps criterion keys to field values. A `None` return means the entity
/// does not carry the field: it then fails the criterion, but only when a
/// non-vacuous predicate is set for it.
pub trait Filterable {
    fn field(&self, key: &str) -> Option<FieldValue<'_>>;
}

pub fn entity_matches<T: Filterable>(entity: &T, filter: &Filter) -> bool {
    filter
        .criteria
        .iter()
        .all(|(key, predicate)| predicate_matches(entity.field(key), predicate))
}

/// Reduces a cached page to its filtered view. Idempotent:
/// `apply_filter(apply_filter(s, f), f) == apply_filter(s, f)`.
pub fn apply_filter<T: Filterable + Clone>(entities: &[T], filter: &Filter) -> Vec<T> {
    entities
        .iter()
        .filter(|entity| entity_matches(*entity, filter))
        .cloned()
        .collect()
}

fn predicate_matches(field: Option<FieldValue<'_>>, predicate: &Predicate) -> bool {
    if predicate.is_vacuous() {
        return true;
    }
    let Some(field) = field else {
        return false;
    };
    match (predicate, field) {
        (Predicate::Text(needle), FieldValue::Text(haystack)) => haystack
            .to_lowercase()
            .contains(&needle.to_lowercase()),
        (Predicate::Exact(expected), FieldValue::Text(actual)) => actual.as_ref() == expected,
        (Predicate::Min(bound), FieldValue::Number(value)) => value >= *bound,
        (Predicate::Max(bound), FieldValue::Number(value)) => value <= *bound,
        (Predicate::After(bound), FieldValue::Date(value)) => value >= *bound,
        (Predicate::Before(bound), FieldValue::Date(value)) => value <= *bound,
        (Predicate::Tags(wanted), FieldValue::Tags(present)) => {
            wanted.iter().all(|tag| present.contains(tag))
        }
        // Predicate and field kinds disagree.
        _ => false,
    }
}

fn search_haystack<'a>(name: &str, email: &str, company: Option<&str>) -> FieldValue<'a> {
    FieldValue::Text(Cow::Owned(format!(
        "{name}\n{email}\n{}",
        company.unwrap_or("")
    )))
}

impl Filterable for Customer {
    fn field(&self, key: &str) -> Option<FieldValue<'_>> {
        match key {
            "search" => Some(search_haystack(
                &self.name,
                &self.email,
                self.company.as_deref(),
            )),
            "language" => Some(FieldValue::Text(Cow::Borrowed(&self.language))),
            "currency" => Some(FieldValue::Text(Cow::Borrowed(&self.currency))),
            "total_value_min" | "total_value_max" => Some(FieldValue::Number(self.total_value)),
            "created_at_after" | "created_at_before" => Some(FieldValue::Date(self.created_at)),
            "tags" => Some(FieldValue::Tags(&self.tags)),
            _ => None,
        }
    }
}

impl Filterable for Lead {
    fn field(&self, key: &str) -> Option<FieldValue<'_>> {
        match key {
            "search" => Some(search_haystack(
                &self.name,
                &self.email,
                self.company.as_deref(),
            )),
            "status" => Some(FieldValue::Text(Cow::Borrowed(&self.status))),
            "source" => self
                .source
                .as_deref()
                .map(|source| FieldValue::Text(Cow::Borrowed(source))),
            "score_min" | "score_max" => Some(FieldValue::Number(self.score as f64)),
            "created_at_after" | "created_at_before" => Some(FieldValue::Date(self.created_at)),
            "tags" => Some(FieldValue::Tags(&self.tags)),
            _ => None,
        }
    }
}

impl Filterable for Opportunity {
    fn field(&self, key: &str) -> Option<FieldValue<'_>> {
        match key {
            "search" | "name" => Some(FieldValue::Text(Cow::Borrowed(&self.name))),
            "stage" => Some(FieldValue::Text(Cow::Borrowed(&self.stage))),
            "assigned_to" => self
                .assigned_to
                .as_deref()
                .map(|assignee| FieldValue::Text(Cow::Borrowed(assignee))),
            "value_min" | "value_max" => Some(FieldValue::Number(self.value)),
            "created_at_after" | "created_at_before" => Some(FieldValue::Date(self.created_at)),
            "tags" => Some(FieldValue::Tags(&self.tags)),
            _ => None,
        }
    }
}
