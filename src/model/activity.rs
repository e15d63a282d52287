use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::gateway::Row;
use crate::model::defaults;

/// Activity rows keep the legacy camelCase column names, including the
/// `assignedTo` owner column (see `Record::OWNER_COLUMN` on this type).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Activity {
    pub id: String,
    #[serde(rename = "assignedTo")]
    pub assigned_to: String,
    pub title: String,
    #[serde(rename = "type")]
    pub activity_type: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default, rename = "relatedTo")]
    pub related_to: Option<String>,
    #[serde(default, rename = "dueDate")]
    pub due_date: Option<DateTime<Utc>>,
    #[serde(default, rename = "completedAt")]
    pub completed_at: Option<DateTime<Utc>>,
    #[serde(default = "defaults::activity_status")]
    pub status: String,
    pub created_at: DateTime<Utc>,
}

/// Draft for `ActivityRepo::create`. `title` and `activity_type` are
/// required; `status` defaults to "pending".
#[derive(Debug, Clone, Default)]
pub struct NewActivity {
    pub title: String,
    pub activity_type: String,
    pub description: Option<String>,
    pub related_to: Option<String>,
    pub due_date: Option<DateTime<Utc>>,
    pub status: Option<String>,
}

impl NewActivity {
    pub(crate) fn into_row(self, now: DateTime<Utc>) -> Row {
        let mut row = Row::new();
        row.insert("title".into(), json!(self.title));
        row.insert("type".into(), json!(self.activity_type));
        row.insert("description".into(), json!(self.description));
        row.insert("relatedTo".into(), json!(self.related_to));
        row.insert("dueDate".into(), json!(self.due_date));
        row.insert("completedAt".into(), json!(None::<DateTime<Utc>>));
        row.insert(
            "status".into(),
            json!(self.status.unwrap_or_else(defaults::activity_status)),
        );
        row.insert("created_at".into(), json!(now));
        row
    }
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct ActivityPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub activity_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(rename = "relatedTo", skip_serializing_if = "Option::is_none")]
    pub related_to: Option<String>,
    #[serde(rename = "dueDate", skip_serializing_if = "Option::is_none")]
    pub due_date: Option<DateTime<Utc>>,
    #[serde(rename = "completedAt", skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
}
