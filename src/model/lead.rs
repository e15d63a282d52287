use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::gateway::Row;
use crate::model::defaults;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Lead {
    pub id: String,
    pub user_id: String,
    pub name: String,
    pub email: String,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub company: Option<String>,
    #[serde(default = "defaults::lead_status")]
    pub status: String,
    #[serde(default)]
    pub score: i64,
    #[serde(default)]
    pub source: Option<String>,
    #[serde(default)]
    pub tags: BTreeSet<String>,
    #[serde(default)]
    pub assigned_to: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Draft for `LeadRepo::create`. `name` and `email` are required; `status`
/// defaults to "new" and `score` to 0.
#[derive(Debug, Clone, Default)]
pub struct NewLead {
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    pub company: Option<String>,
    pub status: Option<String>,
    pub score: Option<i64>,
    pub source: Option<String>,
    pub tags: BTreeSet<String>,
    pub assigned_to: Option<String>,
}

impl NewLead {
    pub(crate) fn into_row(self, now: DateTime<Utc>) -> Row {
        let mut row = Row::new();
        row.insert("name".into(), json!(self.name));
        row.insert("email".into(), json!(self.email));
        row.insert("phone".into(), json!(self.phone));
        row.insert("company".into(), json!(self.company));
        row.insert(
            "status".into(),
            json!(self.status.unwrap_or_else(defaults::lead_status)),
        );
        row.insert("score".into(), json!(self.score.unwrap_or(0)));
        row.insert("source".into(), json!(self.source));
        row.insert("tags".into(), json!(self.tags));
        row.insert("assigned_to".into(), json!(self.assigned_to));
        row.insert("created_at".into(), json!(now));
        row
    }
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct LeadPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub company: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub score: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tags: Option<BTreeSet<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub assigned_to: Option<String>,
}
