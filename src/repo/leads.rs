use std::sync::Arc;

use chrono::{Duration, Utc};

use crate::core::{ChangeEvent, Page, Result, SelectionItem};
use crate::gateway::{Subscription, TableGateway};
use crate::model::{Lead, LeadPatch, NewLead, NewOpportunity, Opportunity};
use crate::repo::{DerivedPolicy, Repository, patch_to_row, require};
use crate::session::SessionProvider;

/// Owner-scoped lead repository.
///
/// Creating a lead also synthesizes its opportunity (stage "prospecting",
/// probability 10, value 0, close date 30 days out). By default that trigger
/// is required: its failure propagates as the lead-create error, leaving the
/// already-inserted lead behind.
pub struct LeadRepo {
    leads: Repository<Lead>,
    opportunities: Repository<Opportunity>,
    derived: DerivedPolicy,
}

impl LeadRepo {
    pub fn new(
        gateway: Arc<dyn TableGateway>,
        session: Arc<dyn SessionProvider>,
        derived: DerivedPolicy,
    ) -> Self {
        Self {
            leads: Repository::new(Arc::clone(&gateway), Arc::clone(&session)),
            opportunities: Repository::new(gateway, session),
            derived,
        }
    }

    pub fn repository(&self) -> Repository<Lead> {
        self.leads.clone()
    }

    pub async fn list(&self, page: u32, limit: usize) -> Result<Page<Lead>> {
        self.leads.list(page, limit).await
    }

    pub async fn find(&self, id: &str) -> Result<Option<Lead>> {
        self.leads.find(id).await
    }

    /// Id+name pairs for dropdowns, unpaged.
    pub async fn list_for_selection(&self) -> Result<Vec<SelectionItem>> {
        self.leads.select_as(Vec::new(), None).await
    }

    pub async fn create(&self, draft: NewLead) -> Result<Lead> {
        require("lead name", &draft.name)?;
        require("lead email", &draft.email)?;

        let owner = self.leads.principal()?;
        let now = Utc::now();
        let lead: Lead = self.leads.insert_row(draft.into_row(now)).await?;

        let opportunity = NewOpportunity {
            name: format!("{}'s Opportunity", lead.name),
            lead_id: Some(lead.id.clone()),
            value: Some(0.0),
            currency: Some("USD".to_string()),
            stage: Some("prospecting".to_string()),
            probability: Some(10),
            expected_close_date: Some(now + Duration::days(30)),
            assigned_to: Some(lead.assigned_to.clone().unwrap_or(owner)),
            description: Some(format!(
                "Opportunity automatically created for lead: {}",
                lead.name
            )),
            tags: lead.tags.clone(),
        };
        if let Err(err) = self.opportunities.insert_row(opportunity.into_row(now)).await {
            match self.derived {
                DerivedPolicy::BestEffort => {
                    log::warn!("derived opportunity for lead {} failed: {err}", lead.id);
                }
                DerivedPolicy::Required => return Err(err),
            }
        }

        Ok(lead)
    }

    pub async fn update(&self, id: &str, patch: LeadPatch) -> Result<Lead> {
        self.leads.update_row(id, patch_to_row(&patch)?).await
    }

    pub async fn delete(&self, id: &str) -> Result<()> {
        self.leads.delete(id).await
    }

    pub async fn subscribe<F>(&self, on_event: F) -> Result<Subscription>
    where
        F: Fn(ChangeEvent<Lead>) + Send + Sync + 'static,
    {
        self.leads.subscribe(on_event).await
    }
}
