//! Dashboard aggregation over the gateway.
//!
//! Cross-table reads scoped to the acting principal. Computation happens
//! client-side over the owner's rows, matching the rest of this layer.

use std::collections::BTreeMap;
use std::sync::Arc;

use serde::Deserialize;
use serde_json::{Value, json};

use crate::core::{CrmError, Result};
use crate::gateway::{Query, TableGateway};
use crate::session::SessionProvider;

#[derive(Debug, Clone, PartialEq)]
pub struct DashboardMetrics {
    pub total_leads: u64,
    pub total_opportunities: u64,
    /// Opportunities not yet closed either way.
    pub active_opportunities: u64,
    /// Sum of closed-won opportunity values.
    pub total_revenue: f64,
    pub avg_deal_size: f64,
    /// Closed-won opportunities per lead, percent, one decimal.
    pub conversion_rate: f64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LeadSourcePoint {
    pub source: String,
    pub count: u64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PipelineStagePoint {
    pub stage: String,
    pub count: u64,
    pub value: f64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TopOpportunity {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub value: f64,
    #[serde(default)]
    pub probability: i64,
    pub stage: String,
}

const CLOSED_STAGES: [&str; 2] = ["closed-won", "closed-lost"];

pub struct Dashboard {
    gateway: Arc<dyn TableGateway>,
    session: Arc<dyn SessionProvider>,
}

impl Dashboard {
    pub fn new(gateway: Arc<dyn TableGateway>, session: Arc<dyn SessionProvider>) -> Self {
        Self { gateway, session }
    }

    fn principal(&self) -> Result<String> {
        self.session.principal().ok_or(CrmError::AccessDenied)
    }

    pub async fn metrics(&self) -> Result<DashboardMetrics> {
        let owner = self.principal()?;

        let leads = self
            .gateway
            .select(
                "leads",
                Query::new().eq("user_id", owner.as_str()).with_count().head_only(),
            )
            .await?;
        let total_leads = leads.count.unwrap_or(0);

        let opportunities = self
            .gateway
            .select("opportunities", Query::new().eq("user_id", owner.as_str()))
            .await?
            .rows;

        let stages_and_values: Vec<(String, f64)> = opportunities
            .iter()
            .map(|row| {
                (
                    row.get("stage").and_then(Value::as_str).unwrap_or("").to_string(),
                    row.get("value").and_then(Value::as_f64).unwrap_or(0.0),
                )
            })
            .collect();

        let total_opportunities = stages_and_values.len() as u64;
        let active_opportunities = stages_and_values
            .iter()
            .filter(|(stage, _)| !CLOSED_STAGES.contains(&stage.as_str()))
            .count() as u64;
        let closed_won: Vec<f64> = stages_and_values
            .iter()
            .filter(|(stage, _)| stage == "closed-won")
            .map(|(_, value)| *value)
            .collect();

        let total_revenue: f64 = closed_won.iter().sum();
        let avg_deal_size = if closed_won.is_empty() {
            0.0
        } else {
            total_revenue / closed_won.len() as f64
        };
        let conversion_rate = if total_leads > 0 {
            let raw = closed_won.len() as f64 / total_leads as f64 * 100.0;
            (raw * 10.0).round() / 10.0
        } else {
            0.0
        };

        Ok(DashboardMetrics {
            total_leads,
            total_opportunities,
            active_opportunities,
            total_revenue,
            avg_deal_size,
            conversion_rate,
        })
    }

    /// Lead counts per source, skipping leads without one.
    pub async fn lead_sources(&self) -> Result<Vec<LeadSourcePoint>> {
        let owner = self.principal()?;
        let rows = self
            .gateway
            .select(
                "leads",
                Query::new().eq("user_id", owner.as_str()).not_null("source"),
            )
            .await?
            .rows;

        let mut counts: BTreeMap<String, u64> = BTreeMap::new();
        for row in rows {
            if let Some(source) = row.get("source").and_then(Value::as_str)
                && !source.is_empty()
            {
                *counts.entry(source.to_string()).or_default() += 1;
            }
        }
        Ok(counts
            .into_iter()
            .map(|(source, count)| LeadSourcePoint { source, count })
            .collect())
    }

    /// Opportunity count and summed value per pipeline stage.
    pub async fn pipeline(&self) -> Result<Vec<PipelineStagePoint>> {
        let owner = self.principal()?;
        let rows = self
            .gateway
            .select("opportunities", Query::new().eq("user_id", owner.as_str()))
            .await?
            .rows;

        let mut stages: BTreeMap<String, (u64, f64)> = BTreeMap::new();
        for row in rows {
            let Some(stage) = row.get("stage").and_then(Value::as_str) else {
                continue;
            };
            let value = row.get("value").and_then(Value::as_f64).unwrap_or(0.0);
            let entry = stages.entry(stage.to_string()).or_default();
            entry.0 += 1;
            entry.1 += value;
        }
        Ok(stages
            .into_iter()
            .map(|(stage, (count, value))| PipelineStagePoint { stage, count, value })
            .collect())
    }

    /// Highest-value open opportunities.
    pub async fn top_opportunities(&self, limit: usize) -> Result<Vec<TopOpportunity>> {
        let limit = limit.max(1);
        let owner = self.principal()?;
        let result = self
            .gateway
            .select(
                "opportunities",
                Query::new()
                    .eq("user_id", owner.as_str())
                    .not_in(
                        "stage",
                        CLOSED_STAGES.iter().map(|stage| json!(stage)).collect(),
                    )
                    .order("value", false)
                    .range(0, limit - 1),
            )
            .await?;
        result
            .rows
            .into_iter()
            .map(crate::repo::decode_row)
            .collect()
    }
}
