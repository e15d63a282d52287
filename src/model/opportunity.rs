use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::gateway::Row;
use crate::model::defaults;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Opportunity {
    pub id: String,
    pub user_id: String,
    pub name: String,
    #[serde(default)]
    pub lead_id: Option<String>,
    #[serde(default)]
    pub value: f64,
    #[serde(default = "defaults::currency")]
    pub currency: String,
    #[serde(default = "defaults::stage")]
    pub stage: String,
    #[serde(default = "defaults::probability")]
    pub probability: i64,
    #[serde(default)]
    pub expected_close_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub assigned_to: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub tags: BTreeSet<String>,
    pub created_at: DateTime<Utc>,
}

/// Draft for `OpportunityRepo::create`. Only `name` is required.
#[derive(Debug, Clone, Default)]
pub struct NewOpportunity {
    pub name: String,
    pub lead_id: Option<String>,
    pub value: Option<f64>,
    pub currency: Option<String>,
    pub stage: Option<String>,
    pub probability: Option<i64>,
    pub expected_close_date: Option<DateTime<Utc>>,
    pub assigned_to: Option<String>,
    pub description: Option<String>,
    pub tags: BTreeSet<String>,
}

impl NewOpportunity {
    pub(crate) fn into_row(self, now: DateTime<Utc>) -> Row {
        let mut row = Row::new();
        row.insert("name".into(), json!(self.name));
        row.insert("lead_id".into(), json!(self.lead_id));
        row.insert("value".into(), json!(self.value.unwrap_or(0.0)));
        row.insert(
            "currency".into(),
            json!(self.currency.unwrap_or_else(defaults::currency)),
        );
        row.insert(
            "stage".into(),
            json!(self.stage.unwrap_or_else(defaults::stage)),
        );
        row.insert(
            "probability".into(),
            json!(self.probability.unwrap_or_else(defaults::probability)),
        );
        row.insert("expected_close_date".into(), json!(self.expected_close_date));
        row.insert("assigned_to".into(), json!(self.assigned_to));
        row.insert("description".into(), json!(self.description));
        row.insert("tags".into(), json!(self.tags));
        row.insert("created_at".into(), json!(now));
        row
    }
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct OpportunityPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lead_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub currency: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stage: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub probability: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expected_close_date: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub assigned_to: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tags: Option<BTreeSet<String>>,
}

/// Server-side filters for opportunity listings, applied by the gateway
/// (unlike the client-side `Filter`, which only narrows the cached page).
#[derive(Debug, Clone, Default)]
pub struct OpportunityFilters {
    /// Case-insensitive substring on `name`.
    pub name: Option<String>,
    pub stage: Option<String>,
    pub assigned_to: Option<String>,
}
