use serde::{Deserialize, Serialize};

/// One page of an owner-scoped collection.
///
/// `total` is the server-side row count taken at fetch time, before the page
/// slice. Under concurrent mutation it is not guaranteed to stay consistent
/// with `data` (see the reconciliation rules on `PageCache`).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Page<T> {
    pub data: Vec<T>,
    pub total: u64,
}

impl<T> Page<T> {
    pub fn empty() -> Self {
        Self {
            data: Vec::new(),
            total: 0,
        }
    }
}

/// Typed change event, decoded at the repository boundary.
///
/// Per-row ordering follows commit order; ordering across different rows is
/// unspecified and delivery is at-least-once, so consumers must tolerate
/// duplicates.
#[derive(Debug, Clone)]
pub enum ChangeEvent<T> {
    Insert(T),
    Update(T),
    Delete(String),
}

/// Sort request passed through to the gateway.
#[derive(Debug, Clone)]
pub struct Sort {
    pub column: String,
    pub ascending: bool,
}

impl Sort {
    pub fn by(column: impl Into<String>, ascending: bool) -> Self {
        Self {
            column: column.into(),
            ascending,
        }
    }

    /// Default listing order: `created_at` descending.
    pub fn newest_first() -> Self {
        Self::by("created_at", false)
    }
}

/// Lightweight id+name pair for selection dropdowns.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SelectionItem {
    pub id: String,
    pub name: String,
}
