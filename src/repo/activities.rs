use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::Utc;
use serde_json::json;

use crate::core::{ChangeEvent, Page, Result, Sort};
use crate::gateway::{Condition, Subscription, TableGateway};
use crate::model::{Activity, ActivityPatch, NewActivity};
use crate::repo::{Repository, patch_to_row, require};
use crate::session::SessionProvider;

pub struct ActivityRepo {
    activities: Repository<Activity>,
}

impl ActivityRepo {
    pub fn new(gateway: Arc<dyn TableGateway>, session: Arc<dyn SessionProvider>) -> Self {
        Self {
            activities: Repository::new(gateway, session),
        }
    }

    pub fn repository(&self) -> Repository<Activity> {
        self.activities.clone()
    }

    /// Paged listing with keyed server-side filters: `title` matches as a
    /// case-insensitive substring, every other key as exact equality. Empty
    /// values are skipped.
    pub async fn list(
        &self,
        page: u32,
        limit: usize,
        filters: &BTreeMap<String, String>,
    ) -> Result<Page<Activity>> {
        let conditions = filters
            .iter()
            .filter(|(_, value)| !value.is_empty())
            .map(|(key, value)| {
                if key == "title" {
                    Condition::ILike(key.clone(), format!("%{value}%"))
                } else {
                    Condition::Eq(key.clone(), json!(value))
                }
            })
            .collect();
        self.activities
            .list_with(page, limit, conditions, Sort::newest_first())
            .await
    }

    pub async fn create(&self, draft: NewActivity) -> Result<Activity> {
        require("activity title", &draft.title)?;
        require("activity type", &draft.activity_type)?;
        self.activities.insert_row(draft.into_row(Utc::now())).await
    }

    pub async fn update(&self, id: &str, patch: ActivityPatch) -> Result<Activity> {
        self.activities.update_row(id, patch_to_row(&patch)?).await
    }

    pub async fn delete(&self, id: &str) -> Result<()> {
        self.activities.delete(id).await
    }

    pub async fn subscribe<F>(&self, on_event: F) -> Result<Subscription>
    where
        F: Fn(ChangeEvent<Activity>) + Send + Sync + 'static,
    {
        self.activities.subscribe(on_event).await
    }
}
