use std::sync::Arc;

use chrono::Utc;
use serde::Deserialize;
use serde_json::json;

use crate::core::{ChangeEvent, Page, Result, Sort};
use crate::gateway::{Condition, Row, Subscription, TableGateway};
use crate::model::{Communication, Customer, CustomerPatch, Lead, NewCustomer};
use crate::repo::{DerivedPolicy, Repository, patch_to_row, require};
use crate::session::SessionProvider;

/// Owner-scoped customer repository.
///
/// Creating a customer also synthesizes a lead carrying the customer's
/// contact fields; by default that trigger is best-effort (failure is
/// logged, the customer create still succeeds).
pub struct CustomerRepo {
    customers: Repository<Customer>,
    leads: Repository<Lead>,
    communications: Repository<Communication>,
    derived: DerivedPolicy,
}

impl CustomerRepo {
    pub fn new(
        gateway: Arc<dyn TableGateway>,
        session: Arc<dyn SessionProvider>,
        derived: DerivedPolicy,
    ) -> Self {
        Self {
            customers: Repository::new(Arc::clone(&gateway), Arc::clone(&session)),
            leads: Repository::new(Arc::clone(&gateway), Arc::clone(&session)),
            communications: Repository::new(gateway, session),
            derived,
        }
    }

    pub fn repository(&self) -> Repository<Customer> {
        self.customers.clone()
    }

    pub async fn list(&self, page: u32, limit: usize) -> Result<Page<Customer>> {
        self.customers.list(page, limit).await
    }

    pub async fn find(&self, id: &str) -> Result<Option<Customer>> {
        self.customers.find(id).await
    }

    pub async fn create(&self, draft: NewCustomer) -> Result<Customer> {
        require("customer name", &draft.name)?;
        require("customer email", &draft.email)?;

        let now = Utc::now();
        let customer: Customer = self
            .customers
            .insert_row(draft.into_row(now))
            .await?;

        // Derived relationship: one lead per new customer, create-time only.
        let mut lead_row = Row::new();
        lead_row.insert("name".into(), json!(customer.name));
        lead_row.insert("email".into(), json!(customer.email));
        lead_row.insert("phone".into(), json!(customer.phone));
        lead_row.insert("company".into(), json!(customer.company));
        lead_row.insert("status".into(), json!("new"));
        lead_row.insert("score".into(), json!(0));
        lead_row.insert("tags".into(), json!([]));
        lead_row.insert("created_at".into(), json!(now));
        if let Err(err) = self.leads.insert_row(lead_row).await {
            match self.derived {
                DerivedPolicy::BestEffort => {
                    log::warn!("derived lead for customer {} failed: {err}", customer.id);
                }
                DerivedPolicy::Required => return Err(err),
            }
        }

        Ok(customer)
    }

    /// Merges the patch over the stored row. `last_activity` is refreshed on
    /// every update regardless of which fields changed.
    pub async fn update(&self, id: &str, patch: CustomerPatch) -> Result<Customer> {
        let mut row = patch_to_row(&patch)?;
        row.insert("last_activity".into(), json!(Utc::now()));
        self.customers.update_row(id, row).await
    }

    pub async fn delete(&self, id: &str) -> Result<()> {
        self.customers.delete(id).await
    }

    pub async fn subscribe<F>(&self, on_event: F) -> Result<Subscription>
    where
        F: Fn(ChangeEvent<Customer>) + Send + Sync + 'static,
    {
        self.customers.subscribe(on_event).await
    }

    /// Communications reached through the customer's email: any lead sharing
    /// the address links the customer to its communication history. Newest
    /// first.
    pub async fn communications_for(&self, customer_id: &str) -> Result<Vec<Communication>> {
        let Some(customer) = self.customers.find(customer_id).await? else {
            return Ok(Vec::new());
        };

        #[derive(Deserialize)]
        struct LeadId {
            id: String,
        }

        let leads: Vec<LeadId> = self
            .leads
            .select_as(
                vec![Condition::Eq("email".into(), json!(customer.email))],
                None,
            )
            .await?;
        if leads.is_empty() {
            return Ok(Vec::new());
        }

        let lead_ids = leads.into_iter().map(|lead| json!(lead.id)).collect();
        self.communications
            .select_as(
                vec![Condition::In("lead_id".into(), lead_ids)],
                Some(Sort::by("timestamp", false)),
            )
            .await
    }
}
