//! Entity repositories: owner scoping, default population, typed decode.
//!
//! `Repository<T>` is the generic core every typed repo builds on. Each
//! operation resolves the principal first and always includes the owner
//! column in its gateway query; cross-owner rows are unreachable from here.

mod activities;
mod communications;
mod customers;
mod leads;
mod opportunities;

use std::marker::PhantomData;
use std::sync::Arc;

use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::core::{ChangeEvent, CrmError, Page, Result, Sort};
use crate::gateway::{Condition, EventHandler, Query, RawEvent, Row, Subscription, TableGateway};
use crate::session::SessionProvider;

pub use activities::ActivityRepo;
pub use communications::CommunicationRepo;
pub use customers::CustomerRepo;
pub use leads::LeadRepo;
pub use opportunities::OpportunityRepo;

/// Failure policy for a derived-relationship trigger.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DerivedPolicy {
    /// Trigger failure is logged and swallowed; the parent create still
    /// reports success.
    BestEffort,
    /// Trigger failure propagates as the parent create's error.
    Required,
}

/// Per-relation derived-trigger policies. The defaults preserve the
/// historical asymmetry: customer→lead is best-effort, lead→opportunity is
/// required.
#[derive(Debug, Clone, Copy)]
pub struct RepoConfig {
    pub customer_lead: DerivedPolicy,
    pub lead_opportunity: DerivedPolicy,
}

impl Default for RepoConfig {
    fn default() -> Self {
        Self {
            customer_lead: DerivedPolicy::BestEffort,
            lead_opportunity: DerivedPolicy::Required,
        }
    }
}

/// A row type stored in a gateway table.
pub trait Record: Serialize + DeserializeOwned + Clone + Send + Sync + 'static {
    const TABLE: &'static str;
    /// Column carrying the owning principal id. Activities override this
    /// with their legacy `assignedTo` column.
    const OWNER_COLUMN: &'static str = "user_id";

    fn id(&self) -> &str;
}

impl Record for crate::model::Customer {
    const TABLE: &'static str = "customers";

    fn id(&self) -> &str {
        &self.id
    }
}

impl Record for crate::model::Lead {
    const TABLE: &'static str = "leads";

    fn id(&self) -> &str {
        &self.id
    }
}

impl Record for crate::model::Opportunity {
    const TABLE: &'static str = "opportunities";

    fn id(&self) -> &str {
        &self.id
    }
}

impl Record for crate::model::Activity {
    const TABLE: &'static str = "activities";
    const OWNER_COLUMN: &'static str = "assignedTo";

    fn id(&self) -> &str {
        &self.id
    }
}

impl Record for crate::model::Communication {
    const TABLE: &'static str = "communications";

    fn id(&self) -> &str {
        &self.id
    }
}

pub(crate) fn decode_row<T: DeserializeOwned>(row: Row) -> Result<T> {
    serde_json::from_value(Value::Object(row)).map_err(|err| CrmError::Decode(err.to_string()))
}

pub(crate) fn patch_to_row<P: Serialize>(patch: &P) -> Result<Row> {
    match serde_json::to_value(patch).map_err(|err| CrmError::Decode(err.to_string()))? {
        Value::Object(row) => Ok(row),
        other => Err(CrmError::Decode(format!(
            "patch serialized to non-object value: {other}"
        ))),
    }
}

/// Generic owner-scoped repository over one table.
pub struct Repository<T: Record> {
    gateway: Arc<dyn TableGateway>,
    session: Arc<dyn SessionProvider>,
    _entity: PhantomData<fn() -> T>,
}

impl<T: Record> Clone for Repository<T> {
    fn clone(&self) -> Self {
        Self {
            gateway: Arc::clone(&self.gateway),
            session: Arc::clone(&self.session),
            _entity: PhantomData,
        }
    }
}

impl<T: Record> Repository<T> {
    pub fn new(gateway: Arc<dyn TableGateway>, session: Arc<dyn SessionProvider>) -> Self {
        Self {
            gateway,
            session,
            _entity: PhantomData,
        }
    }

    pub(crate) fn principal(&self) -> Result<String> {
        self.session.principal().ok_or(CrmError::AccessDenied)
    }

    fn owner_query(&self) -> Result<Query> {
        let owner = self.principal()?;
        Ok(Query::new().eq(T::OWNER_COLUMN, owner))
    }

    /// Fetches one page, newest first. An owner with zero matching rows gets
    /// an empty page, not an error.
    pub async fn list(&self, page: u32, limit: usize) -> Result<Page<T>> {
        self.list_with(page, limit, Vec::new(), Sort::newest_first())
            .await
    }

    pub async fn list_with(
        &self,
        page: u32,
        limit: usize,
        extra: Vec<Condition>,
        sort: Sort,
    ) -> Result<Page<T>> {
        let limit = limit.max(1);
        let start = (page.max(1) as usize - 1) * limit;
        let mut query = self
            .owner_query()?
            .order(sort.column, sort.ascending)
            .range(start, start + limit - 1)
            .with_count();
        query.conditions.extend(extra);

        let result = self.gateway.select(T::TABLE, query).await?;
        let data = result
            .rows
            .into_iter()
            .map(decode_row)
            .collect::<Result<Vec<T>>>()?;
        Ok(Page {
            data,
            total: result.count.unwrap_or(0),
        })
    }

    /// Unpaged select decoded into an arbitrary shape (e.g. id+name pairs).
    pub async fn select_as<S: DeserializeOwned>(
        &self,
        extra: Vec<Condition>,
        sort: Option<Sort>,
    ) -> Result<Vec<S>> {
        let mut query = self.owner_query()?;
        query.conditions.extend(extra);
        if let Some(sort) = sort {
            query = query.order(sort.column, sort.ascending);
        }
        let result = self.gateway.select(T::TABLE, query).await?;
        result.rows.into_iter().map(decode_row).collect()
    }

    pub async fn find(&self, id: &str) -> Result<Option<T>> {
        let query = self.owner_query()?.eq("id", id);
        let result = self.gateway.select(T::TABLE, query).await?;
        result.rows.into_iter().next().map(decode_row).transpose()
    }

    /// Inserts a prepared row, stamping the owner column. Drafts populate
    /// their defaults before reaching this point.
    pub(crate) async fn insert_row(&self, mut row: Row) -> Result<T> {
        let owner = self.principal()?;
        row.insert(T::OWNER_COLUMN.to_string(), Value::String(owner));
        let stored = self.gateway.insert(T::TABLE, row).await?;
        decode_row(stored)
    }

    pub async fn update_row(&self, id: &str, patch: Row) -> Result<T> {
        let matching = self.owner_query()?.eq("id", id);
        let updated = self.gateway.update(T::TABLE, patch, matching).await?;
        decode_row(updated)
    }

    pub async fn delete(&self, id: &str) -> Result<()> {
        let matching = self.owner_query()?.eq("id", id);
        self.gateway.delete(T::TABLE, matching).await
    }

    /// Subscribes to the owner's change feed with events decoded at this
    /// boundary. Rows that fail to decode are logged and dropped rather than
    /// surfaced as untyped payloads.
    pub async fn subscribe<F>(&self, on_event: F) -> Result<Subscription>
    where
        F: Fn(ChangeEvent<T>) + Send + Sync + 'static,
    {
        let matching = self.owner_query()?;
        let handler: EventHandler = Arc::new(move |raw| match decode_event::<T>(raw) {
            Ok(event) => on_event(event),
            Err(err) => {
                log::warn!("dropping undecodable {} event: {err}", T::TABLE);
            }
        });
        self.gateway.subscribe(T::TABLE, matching, handler).await
    }
}

fn decode_event<T: Record>(raw: RawEvent) -> Result<ChangeEvent<T>> {
    Ok(match raw {
        RawEvent::Insert(row) => ChangeEvent::Insert(decode_row(row)?),
        RawEvent::Update(row) => ChangeEvent::Update(decode_row(row)?),
        RawEvent::Delete(id) => ChangeEvent::Delete(id),
    })
}

pub(crate) fn require(field: &str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(CrmError::Validation(format!("{field} is required")));
    }
    Ok(())
}
