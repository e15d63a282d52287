//! Selection tracking and bulk message fan-out.

use std::collections::BTreeSet;

use futures::future::join_all;

use crate::core::{CrmError, Result};
use crate::model::{CommunicationKind, Customer, Direction, NewCommunication};
use crate::repo::CommunicationRepo;

/// A set of selected entity ids, always a subset of the last-rendered
/// filtered view. Prune with `retain_visible` whenever rows leave the view
/// through a delete or a filter change.
#[derive(Debug, Clone, Default)]
pub struct Selection {
    ids: BTreeSet<String>,
}

impl Selection {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn toggle(&mut self, id: &str) {
        if !self.ids.remove(id) {
            self.ids.insert(id.to_string());
        }
    }

    pub fn contains(&self, id: &str) -> bool {
        self.ids.contains(id)
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    pub fn clear(&mut self) {
        self.ids.clear();
    }

    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.ids.iter().map(String::as_str)
    }

    /// Select-all scoped to the *filtered* view: when the selection size
    /// already equals the view size the selection is cleared, otherwise it
    /// becomes the whole view. The comparison is by size only, so toggling
    /// twice restores the prior state for an empty or full selection.
    pub fn select_all<'a>(&mut self, filtered_ids: impl IntoIterator<Item = &'a str>) {
        let view: BTreeSet<String> = filtered_ids
            .into_iter()
            .map(str::to_string)
            .collect();
        if self.ids.len() == view.len() {
            self.ids.clear();
        } else {
            self.ids = view;
        }
    }

    /// Drops ids no longer present in the view.
    pub fn retain_visible<'a>(&mut self, visible_ids: impl IntoIterator<Item = &'a str>) {
        let visible: BTreeSet<&str> = visible_ids.into_iter().collect();
        self.ids.retain(|id| visible.contains(id.as_str()));
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BulkReport {
    pub sent: usize,
    /// Recipients that failed the precondition and were never attempted.
    pub skipped: usize,
}

/// Fans a message out across a selection of customers.
///
/// Recipients without a phone number are skipped up front; the rest each get
/// one independent communication write, issued concurrently. A failure does
/// not cancel sibling writes already in flight and nothing is rolled back:
/// the aggregate error only reports how many landed.
pub struct BulkMessenger {
    communications: CommunicationRepo,
    from_address: String,
}

impl BulkMessenger {
    pub fn new(communications: CommunicationRepo, from_address: impl Into<String>) -> Self {
        Self {
            communications,
            from_address: from_address.into(),
        }
    }

    pub async fn send_whatsapp(
        &self,
        recipients: &[Customer],
        message: &str,
    ) -> Result<BulkReport> {
        let (eligible, skipped): (Vec<&Customer>, Vec<&Customer>) = recipients
            .iter()
            .partition(|customer| customer.phone.as_deref().is_some_and(|p| !p.is_empty()));

        let writes = eligible.iter().map(|customer| {
            let draft = NewCommunication {
                customer_id: Some(customer.id.clone()),
                lead_id: None,
                kind: CommunicationKind::Whatsapp,
                direction: Direction::Outbound,
                from_address: self.from_address.clone(),
                to_address: customer.phone.clone().unwrap_or_default(),
                subject: None,
                content: message.to_string(),
                status: None,
            };
            self.communications.create(draft)
        });

        let results = join_all(writes).await;
        let failed = results.iter().filter(|result| result.is_err()).count();
        let sent = results.len() - failed;
        if failed > 0 {
            for result in results {
                if let Err(err) = result {
                    log::warn!("bulk message write failed: {err}");
                }
            }
            return Err(CrmError::PartialBulkFailure { sent, failed });
        }

        Ok(BulkReport {
            sent,
            skipped: skipped.len(),
        })
    }
}
