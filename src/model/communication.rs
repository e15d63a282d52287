use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::gateway::Row;
use crate::model::defaults;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CommunicationKind {
    Email,
    Sms,
    Whatsapp,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Inbound,
    Outbound,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Communication {
    pub id: String,
    pub user_id: String,
    #[serde(default)]
    pub customer_id: Option<String>,
    #[serde(default)]
    pub lead_id: Option<String>,
    #[serde(rename = "type")]
    pub kind: CommunicationKind,
    pub direction: Direction,
    pub from_address: String,
    pub to_address: String,
    #[serde(default)]
    pub subject: Option<String>,
    pub content: String,
    #[serde(default = "defaults::sent_status")]
    pub status: String,
    /// Stamped server-side at create time.
    pub timestamp: DateTime<Utc>,
}

/// Draft for `CommunicationRepo::create`. `content` is required; the
/// timestamp is stamped at create time.
#[derive(Debug, Clone)]
pub struct NewCommunication {
    pub customer_id: Option<String>,
    pub lead_id: Option<String>,
    pub kind: CommunicationKind,
    pub direction: Direction,
    pub from_address: String,
    pub to_address: String,
    pub subject: Option<String>,
    pub content: String,
    pub status: Option<String>,
}

impl NewCommunication {
    pub(crate) fn into_row(self, now: DateTime<Utc>) -> Row {
        let mut row = Row::new();
        row.insert("customer_id".into(), json!(self.customer_id));
        row.insert("lead_id".into(), json!(self.lead_id));
        row.insert("type".into(), json!(self.kind));
        row.insert("direction".into(), json!(self.direction));
        row.insert("from_address".into(), json!(self.from_address));
        row.insert("to_address".into(), json!(self.to_address));
        row.insert("subject".into(), json!(self.subject));
        row.insert("content".into(), json!(self.content));
        row.insert(
            "status".into(),
            json!(self.status.unwrap_or_else(defaults::sent_status)),
        );
        row.insert("timestamp".into(), json!(now));
        row
    }
}
