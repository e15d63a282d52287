use std::sync::Arc;

use chrono::Utc;
use serde_json::json;

use crate::core::{ChangeEvent, Page, Result, Sort};
use crate::gateway::{Condition, Subscription, TableGateway};
use crate::model::{Communication, NewCommunication};
use crate::repo::{Repository, require};
use crate::session::SessionProvider;

pub struct CommunicationRepo {
    communications: Repository<Communication>,
}

impl CommunicationRepo {
    pub fn new(gateway: Arc<dyn TableGateway>, session: Arc<dyn SessionProvider>) -> Self {
        Self {
            communications: Repository::new(gateway, session),
        }
    }

    pub fn repository(&self) -> Repository<Communication> {
        self.communications.clone()
    }

    pub async fn list(&self, page: u32, limit: usize) -> Result<Page<Communication>> {
        self.communications
            .list_with(page, limit, Vec::new(), Sort::by("timestamp", false))
            .await
    }

    /// Stamps the timestamp at create time.
    pub async fn create(&self, draft: NewCommunication) -> Result<Communication> {
        require("communication content", &draft.content)?;
        self.communications
            .insert_row(draft.into_row(Utc::now()))
            .await
    }

    /// All communications for one lead, newest first.
    pub async fn list_for_lead(&self, lead_id: &str) -> Result<Vec<Communication>> {
        self.communications
            .select_as(
                vec![Condition::Eq("lead_id".into(), json!(lead_id))],
                Some(Sort::by("timestamp", false)),
            )
            .await
    }

    pub async fn subscribe<F>(&self, on_event: F) -> Result<Subscription>
    where
        F: Fn(ChangeEvent<Communication>) + Send + Sync + 'static,
    {
        self.communications.subscribe(on_event).await
    }
}
