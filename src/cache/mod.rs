//! Page cache with realtime event reconciliation.
//!
//! One cache per (entity type, owner). The cache holds exactly one fetched
//! page plus a `total` counter tracked independently of the materialized
//! rows. Reconciliation trades strict consistency for latency: off-page
//! inserts and deletes move (or leave) `total` without touching `data`, so
//! `total >= data.len()` must not be assumed; only exact page-1 scenarios
//! keep the two aligned. Callers must not compensate with eager refetching.

mod live;

use crate::core::{ChangeEvent, Page};
use crate::repo::Record;

pub use live::LivePage;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheState {
    Empty,
    Loading,
    Ready,
}

#[derive(Debug)]
pub struct PageCache<T> {
    state: CacheState,
    page: u32,
    limit: usize,
    data: Vec<T>,
    total: u64,
    loaded_once: bool,
}

impl<T: Record> PageCache<T> {
    pub fn new(limit: usize) -> Self {
        Self {
            state: CacheState::Empty,
            page: 1,
            limit: limit.max(1),
            data: Vec::new(),
            total: 0,
            loaded_once: false,
        }
    }

    pub fn state(&self) -> CacheState {
        self.state
    }

    pub fn page(&self) -> u32 {
        self.page
    }

    pub fn limit(&self) -> usize {
        self.limit
    }

    pub fn data(&self) -> &[T] {
        &self.data
    }

    pub fn total(&self) -> u64 {
        self.total
    }

    /// Enters `Loading` for the given page; existing data stays visible
    /// until the fetch settles.
    pub fn begin_load(&mut self, page: u32) {
        self.page = page.max(1);
        self.state = CacheState::Loading;
    }

    /// Stores exactly the fetched page's data and total.
    pub fn install(&mut self, fetched: Page<T>) {
        self.data = fetched.data;
        self.data.truncate(self.limit);
        self.total = fetched.total;
        self.state = CacheState::Ready;
        self.loaded_once = true;
    }

    /// Fetch failure leaves the cache in its last-known-good state.
    pub fn load_failed(&mut self) {
        self.state = if self.loaded_once {
            CacheState::Ready
        } else {
            CacheState::Empty
        };
    }

    /// Merges one change event, in arrival order.
    ///
    /// - Insert: duplicate ids are ignored (at-least-once delivery). New
    ///   rows bump `total`; only page 1 materializes them, prepending and
    ///   evicting the last entry once the page is full.
    /// - Update: replaced in place, preserving position; off-page rows are
    ///   a no-op.
    /// - Delete: removed with a `total` decrement only when the row was
    ///   actually present; off-page deletes leave `total` stale until the
    ///   next refetch.
    pub fn apply(&mut self, event: ChangeEvent<T>) {
        match event {
            ChangeEvent::Insert(row) => {
                if self.data.iter().any(|existing| existing.id() == row.id()) {
                    return;
                }
                self.total += 1;
                if self.page == 1 {
                    self.data.insert(0, row);
                    self.data.truncate(self.limit);
                }
            }
            ChangeEvent::Update(row) => {
                if let Some(slot) = self
                    .data
                    .iter_mut()
                    .find(|existing| existing.id() == row.id())
                {
                    *slot = row;
                }
            }
            ChangeEvent::Delete(id) => {
                if let Some(position) = self.data.iter().position(|existing| existing.id() == id) {
                    self.data.remove(position);
                    self.total = self.total.saturating_sub(1);
                }
            }
        }
        debug_assert!(self.data.len() <= self.limit);
    }
}
