//! Remote table gateway abstraction.
//!
//! The gateway offers filtered/paginated reads with total count, single-row
//! insert/update/delete, and a change-event subscription per table. Owner
//! scoping is NOT added here; the repository layer always includes the
//! owner-column equality condition itself.

pub mod memory;

use std::cmp::Ordering;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::Value;
use tokio::task::JoinHandle;

use crate::core::Result;

pub use memory::MemoryGateway;

/// An untyped table row as it travels over the wire.
pub type Row = serde_json::Map<String, Value>;

/// A single predicate in a gateway query.
#[derive(Debug, Clone)]
pub enum Condition {
    Eq(String, Value),
    /// Case-insensitive substring match; `%` wildcards at either end are
    /// tolerated and stripped.
    ILike(String, String),
    In(String, Vec<Value>),
    NotIn(String, Vec<Value>),
    NotNull(String),
}

/// Query builder in the style of a hosted table store client: equality and
/// pattern conditions, an order column, an inclusive row range, and an
/// optional exact count.
#[derive(Debug, Clone, Default)]
pub struct Query {
    pub conditions: Vec<Condition>,
    pub order: Option<(String, bool)>,
    pub range: Option<(usize, usize)>,
    pub count: bool,
    /// Count-only query: no rows are materialized.
    pub head: bool,
}

impl Query {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn eq(mut self, column: impl Into<String>, value: impl Into<Value>) -> Self {
        self.conditions.push(Condition::Eq(column.into(), value.into()));
        self
    }

    pub fn ilike(mut self, column: impl Into<String>, pattern: impl Into<String>) -> Self {
        self.conditions
            .push(Condition::ILike(column.into(), pattern.into()));
        self
    }

    pub fn in_list(mut self, column: impl Into<String>, values: Vec<Value>) -> Self {
        self.conditions.push(Condition::In(column.into(), values));
        self
    }

    pub fn not_in(mut self, column: impl Into<String>, values: Vec<Value>) -> Self {
        self.conditions.push(Condition::NotIn(column.into(), values));
        self
    }

    pub fn not_null(mut self, column: impl Into<String>) -> Self {
        self.conditions.push(Condition::NotNull(column.into()));
        self
    }

    pub fn condition(mut self, condition: Condition) -> Self {
        self.conditions.push(condition);
        self
    }

    pub fn order(mut self, column: impl Into<String>, ascending: bool) -> Self {
        self.order = Some((column.into(), ascending));
        self
    }

    /// Inclusive row window, e.g. `(0, 9)` for the first ten rows.
    pub fn range(mut self, start: usize, end: usize) -> Self {
        self.range = Some((start, end));
        self
    }

    pub fn with_count(mut self) -> Self {
        self.count = true;
        self
    }

    pub fn head_only(mut self) -> Self {
        self.head = true;
        self
    }
}

#[derive(Debug, Clone)]
pub struct SelectResult {
    pub rows: Vec<Row>,
    /// Present when the query asked for a count; taken before the range
    /// slice.
    pub count: Option<u64>,
}

/// Untyped change event as emitted by the gateway. Decoded into a typed
/// `ChangeEvent` at the repository boundary.
#[derive(Debug, Clone)]
pub enum RawEvent {
    Insert(Row),
    Update(Row),
    Delete(String),
}

pub type EventHandler = Arc<dyn Fn(RawEvent) + Send + Sync>;

/// Live change feed handle. An explicitly owned resource: call `cancel()`
/// exactly once on teardown; dropping the handle also stops delivery so a
/// stale cache never receives events.
pub struct Subscription {
    task: JoinHandle<()>,
}

impl Subscription {
    pub(crate) fn new(task: JoinHandle<()>) -> Self {
        Self { task }
    }

    pub fn cancel(self) {
        self.task.abort();
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.task.abort();
    }
}

#[async_trait]
pub trait TableGateway: Send + Sync {
    async fn select(&self, table: &str, query: Query) -> Result<SelectResult>;

    async fn insert(&self, table: &str, row: Row) -> Result<Row>;

    /// Merges `patch` over the single row matched by `matching`. Fails with
    /// `NotFound` when nothing matches.
    async fn update(&self, table: &str, patch: Row, matching: Query) -> Result<Row>;

    /// NOT idempotent: deleting an absent row fails with `NotFound`.
    async fn delete(&self, table: &str, matching: Query) -> Result<()>;

    /// Streams change events for rows matching `matching.conditions`.
    /// Per-row ordering follows commit order; cross-row ordering is
    /// unspecified and delivery is at-least-once.
    async fn subscribe(
        &self,
        table: &str,
        matching: Query,
        handler: EventHandler,
    ) -> Result<Subscription>;
}

pub(crate) fn row_matches(row: &Row, conditions: &[Condition]) -> bool {
    conditions.iter().all(|condition| match condition {
        Condition::Eq(column, value) => row.get(column) == Some(value),
        Condition::ILike(column, pattern) => {
            let needle = pattern.trim_matches('%').to_lowercase();
            row.get(column)
                .and_then(Value::as_str)
                .is_some_and(|text| text.to_lowercase().contains(&needle))
        }
        Condition::In(column, values) => row
            .get(column)
            .is_some_and(|value| values.contains(value)),
        Condition::NotIn(column, values) => row
            .get(column)
            .is_some_and(|value| !values.contains(value)),
        Condition::NotNull(column) => {
            matches!(row.get(column), Some(value) if !value.is_null())
        }
    })
}

/// Ordering for heterogeneous json column values. Timestamp strings are
/// compared as instants so that sub-second precision differences do not
/// leak into the sort.
pub(crate) fn cmp_values(a: &Value, b: &Value) -> Ordering {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => x
            .as_f64()
            .unwrap_or(0.0)
            .total_cmp(&y.as_f64().unwrap_or(0.0)),
        (Value::String(x), Value::String(y)) => {
            match (parse_instant(x), parse_instant(y)) {
                (Some(tx), Some(ty)) => tx.cmp(&ty),
                _ => x.cmp(y),
            }
        }
        (Value::Bool(x), Value::Bool(y)) => x.cmp(y),
        (Value::Null, Value::Null) => Ordering::Equal,
        (Value::Null, _) => Ordering::Less,
        (_, Value::Null) => Ordering::Greater,
        _ => Ordering::Equal,
    }
}

fn parse_instant(text: &str) -> Option<DateTime<Utc>> {
    text.parse::<DateTime<Utc>>().ok()
}
