use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::gateway::Row;
use crate::model::defaults;

/// Postal address attached to a customer, stored inline in the row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Address {
    #[serde(default)]
    pub label: String,
    pub street: String,
    pub city: String,
    pub country: String,
    #[serde(default)]
    pub postal_code: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Customer {
    pub id: String,
    pub user_id: String,
    pub name: String,
    pub email: String,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub company: Option<String>,
    #[serde(default = "defaults::language")]
    pub language: String,
    #[serde(default = "defaults::currency")]
    pub currency: String,
    #[serde(default)]
    pub total_value: f64,
    #[serde(default)]
    pub tags: BTreeSet<String>,
    #[serde(default)]
    pub addresses: Vec<Address>,
    #[serde(default)]
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    /// Refreshed on every update, regardless of which fields changed.
    pub last_activity: DateTime<Utc>,
}

/// Draft for `CustomerRepo::create`. Missing optional fields get the
/// documented defaults; `name` and `email` are required.
#[derive(Debug, Clone, Default)]
pub struct NewCustomer {
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    pub company: Option<String>,
    pub language: Option<String>,
    pub currency: Option<String>,
    pub total_value: Option<f64>,
    pub tags: BTreeSet<String>,
    pub addresses: Vec<Address>,
    pub notes: Option<String>,
}

impl NewCustomer {
    pub(crate) fn into_row(self, now: DateTime<Utc>) -> Row {
        let mut row = Row::new();
        row.insert("name".into(), json!(self.name));
        row.insert("email".into(), json!(self.email));
        row.insert("phone".into(), json!(self.phone));
        row.insert("company".into(), json!(self.company));
        row.insert(
            "language".into(),
            json!(self.language.unwrap_or_else(defaults::language)),
        );
        row.insert(
            "currency".into(),
            json!(self.currency.unwrap_or_else(defaults::currency)),
        );
        row.insert("total_value".into(), json!(self.total_value.unwrap_or(0.0)));
        row.insert("tags".into(), json!(self.tags));
        row.insert("addresses".into(), json!(self.addresses));
        row.insert("notes".into(), json!(self.notes));
        row.insert("created_at".into(), json!(now));
        row.insert("last_activity".into(), json!(now));
        row
    }
}

/// Partial update for a customer. `None` fields are left untouched.
#[derive(Debug, Clone, Default, Serialize)]
pub struct CustomerPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub company: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub currency: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total_value: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tags: Option<BTreeSet<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub addresses: Option<Vec<Address>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}
