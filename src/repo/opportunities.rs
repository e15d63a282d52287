use std::sync::Arc;

use chrono::Utc;
use serde_json::json;

use crate::core::{ChangeEvent, Page, Result, SelectionItem, Sort};
use crate::gateway::{Condition, Subscription, TableGateway};
use crate::model::{NewOpportunity, Opportunity, OpportunityFilters, OpportunityPatch};
use crate::repo::{Repository, patch_to_row, require};
use crate::session::SessionProvider;

pub struct OpportunityRepo {
    opportunities: Repository<Opportunity>,
}

impl OpportunityRepo {
    pub fn new(gateway: Arc<dyn TableGateway>, session: Arc<dyn SessionProvider>) -> Self {
        Self {
            opportunities: Repository::new(gateway, session),
        }
    }

    pub fn repository(&self) -> Repository<Opportunity> {
        self.opportunities.clone()
    }

    /// Paged listing with server-side filters and caller-chosen sort.
    pub async fn list(
        &self,
        page: u32,
        limit: usize,
        filters: &OpportunityFilters,
        sort: Sort,
    ) -> Result<Page<Opportunity>> {
        let mut conditions = Vec::new();
        if let Some(name) = filters.name.as_deref().filter(|n| !n.is_empty()) {
            conditions.push(Condition::ILike("name".into(), format!("%{name}%")));
        }
        if let Some(stage) = filters.stage.as_deref().filter(|s| !s.is_empty()) {
            conditions.push(Condition::Eq("stage".into(), json!(stage)));
        }
        if let Some(assignee) = filters.assigned_to.as_deref().filter(|a| !a.is_empty()) {
            conditions.push(Condition::Eq("assigned_to".into(), json!(assignee)));
        }
        self.opportunities
            .list_with(page, limit, conditions, sort)
            .await
    }

    pub async fn find(&self, id: &str) -> Result<Option<Opportunity>> {
        self.opportunities.find(id).await
    }

    pub async fn list_for_selection(&self) -> Result<Vec<SelectionItem>> {
        self.opportunities.select_as(Vec::new(), None).await
    }

    pub async fn create(&self, draft: NewOpportunity) -> Result<Opportunity> {
        require("opportunity name", &draft.name)?;
        self.opportunities
            .insert_row(draft.into_row(Utc::now()))
            .await
    }

    pub async fn update(&self, id: &str, patch: OpportunityPatch) -> Result<Opportunity> {
        self.opportunities
            .update_row(id, patch_to_row(&patch)?)
            .await
    }

    pub async fn delete(&self, id: &str) -> Result<()> {
        self.opportunities.delete(id).await
    }

    pub async fn subscribe<F>(&self, on_event: F) -> Result<Subscription>
    where
        F: Fn(ChangeEvent<Opportunity>) + Send + Sync + 'static,
    {
        self.opportunities.subscribe(on_event).await
    }
}
