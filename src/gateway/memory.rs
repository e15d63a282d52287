//! In-memory `TableGateway` with broadcast change feeds.
//!
//! Backs the test suite and local runs: tables are plain row vectors and
//! every mutation is fanned out to subscribers through a per-table broadcast
//! channel, mirroring the change feeds a hosted table store delivers.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

use async_trait::async_trait;
use serde_json::{Value, json};
use tokio::sync::broadcast;
use uuid::Uuid;

use crate::core::{CrmError, Result};
use crate::gateway::{
    Condition, EventHandler, Query, RawEvent, Row, SelectResult, Subscription, TableGateway,
    cmp_values, row_matches,
};

const FEED_CAPACITY: usize = 256;

/// Full-row envelope on the internal feed; the old row is kept for deletes
/// so the subscriber-side owner filter can still be applied.
#[derive(Debug, Clone)]
enum FeedEvent {
    Inserted(Row),
    Updated(Row),
    Deleted(Row),
}

#[derive(Clone, Default)]
pub struct MemoryGateway {
    tables: Arc<Mutex<HashMap<String, Vec<Row>>>>,
    feeds: Arc<Mutex<HashMap<String, broadcast::Sender<FeedEvent>>>>,
}

impl MemoryGateway {
    pub fn new() -> Self {
        Self::default()
    }

    fn feed(&self, table: &str) -> broadcast::Sender<FeedEvent> {
        let mut feeds = self.feeds.lock().unwrap_or_else(PoisonError::into_inner);
        feeds
            .entry(table.to_string())
            .or_insert_with(|| broadcast::channel(FEED_CAPACITY).0)
            .clone()
    }

    fn publish(&self, table: &str, event: FeedEvent) {
        let sender = {
            let feeds = self.feeds.lock().unwrap_or_else(PoisonError::into_inner);
            feeds.get(table).cloned()
        };
        if let Some(sender) = sender {
            // No subscribers is fine.
            let _ = sender.send(event);
        }
    }

    fn not_found(table: &str, matching: &Query) -> CrmError {
        let id = matching
            .conditions
            .iter()
            .find_map(|condition| match condition {
                Condition::Eq(column, Value::String(value)) if column == "id" => {
                    Some(value.clone())
                }
                _ => None,
            })
            .unwrap_or_else(|| "<match>".to_string());
        CrmError::NotFound {
            table: table.to_string(),
            id,
        }
    }
}

#[async_trait]
impl TableGateway for MemoryGateway {
    async fn select(&self, table: &str, query: Query) -> Result<SelectResult> {
        let tables = self.tables.lock().unwrap_or_else(PoisonError::into_inner);
        let mut rows: Vec<Row> = tables
            .get(table)
            .map(|rows| {
                rows.iter()
                    .filter(|row| row_matches(row, &query.conditions))
                    .cloned()
                    .collect()
            })
            .unwrap_or_default();

        // Count is taken before the page slice.
        let count = query.count.then_some(rows.len() as u64);

        if let Some((column, ascending)) = &query.order {
            rows.sort_by(|a, b| {
                let ordering = cmp_values(
                    a.get(column).unwrap_or(&Value::Null),
                    b.get(column).unwrap_or(&Value::Null),
                );
                if *ascending { ordering } else { ordering.reverse() }
            });
        }

        if query.head {
            return Ok(SelectResult { rows: Vec::new(), count });
        }

        if let Some((start, end)) = query.range {
            rows = if start >= rows.len() {
                Vec::new()
            } else {
                let end = end.min(rows.len().saturating_sub(1));
                rows[start..=end].to_vec()
            };
        }

        Ok(SelectResult { rows, count })
    }

    async fn insert(&self, table: &str, mut row: Row) -> Result<Row> {
        if !row.contains_key("id") {
            row.insert("id".into(), json!(Uuid::new_v4().to_string()));
        }
        {
            let mut tables = self.tables.lock().unwrap_or_else(PoisonError::into_inner);
            tables.entry(table.to_string()).or_default().push(row.clone());
        }
        self.publish(table, FeedEvent::Inserted(row.clone()));
        Ok(row)
    }

    async fn update(&self, table: &str, patch: Row, matching: Query) -> Result<Row> {
        let updated = {
            let mut tables = self.tables.lock().unwrap_or_else(PoisonError::into_inner);
            let rows = tables
                .get_mut(table)
                .ok_or_else(|| Self::not_found(table, &matching))?;
            let slot = rows
                .iter_mut()
                .find(|row| row_matches(row, &matching.conditions))
                .ok_or_else(|| Self::not_found(table, &matching))?;
            for (key, value) in patch {
                slot.insert(key, value);
            }
            slot.clone()
        };
        self.publish(table, FeedEvent::Updated(updated.clone()));
        Ok(updated)
    }

    async fn delete(&self, table: &str, matching: Query) -> Result<()> {
        let removed = {
            let mut tables = self.tables.lock().unwrap_or_else(PoisonError::into_inner);
            let rows = tables
                .get_mut(table)
                .ok_or_else(|| Self::not_found(table, &matching))?;
            let position = rows
                .iter()
                .position(|row| row_matches(row, &matching.conditions))
                .ok_or_else(|| Self::not_found(table, &matching))?;
            rows.remove(position)
        };
        self.publish(table, FeedEvent::Deleted(removed));
        Ok(())
    }

    async fn subscribe(
        &self,
        table: &str,
        matching: Query,
        handler: EventHandler,
    ) -> Result<Subscription> {
        let mut receiver = self.feed(table).subscribe();
        let conditions = matching.conditions;
        let task = tokio::spawn(async move {
            loop {
                match receiver.recv().await {
                    Ok(event) => {
                        let (row, raw) = match event {
                            FeedEvent::Inserted(row) => {
                                (row.clone(), RawEvent::Insert(row))
                            }
                            FeedEvent::Updated(row) => (row.clone(), RawEvent::Update(row)),
                            FeedEvent::Deleted(row) => {
                                let id = row
                                    .get("id")
                                    .and_then(Value::as_str)
                                    .unwrap_or_default()
                                    .to_string();
                                (row, RawEvent::Delete(id))
                            }
                        };
                        if row_matches(&row, &conditions) {
                            handler(raw);
                        }
                    }
                    Err(broadcast::error::RecvError::Lagged(skipped)) => {
                        log::warn!("change feed lagged, {skipped} events dropped");
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                }
            }
        });
        Ok(Subscription::new(task))
    }
}
