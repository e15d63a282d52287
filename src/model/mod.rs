//! Entity types and their create drafts / update patches.
//!
//! Rows travel through the gateway as untyped `serde_json` maps and are
//! decoded into these types at the repository boundary; untyped payloads
//! never cross that layer.

mod activity;
mod communication;
mod customer;
mod lead;
mod opportunity;

pub use activity::{Activity, ActivityPatch, NewActivity};
pub use communication::{
    Communication, CommunicationKind, Direction, NewCommunication,
};
pub use customer::{Address, Customer, CustomerPatch, NewCustomer};
pub use lead::{Lead, LeadPatch, NewLead};
pub use opportunity::{
    NewOpportunity, Opportunity, OpportunityFilters, OpportunityPatch,
};

/// Documented default field values, shared between drafts and serde.
pub(crate) mod defaults {
    pub fn language() -> String {
        "English".to_string()
    }

    pub fn currency() -> String {
        "USD".to_string()
    }

    pub fn lead_status() -> String {
        "new".to_string()
    }

    pub fn stage() -> String {
        "prospecting".to_string()
    }

    pub fn probability() -> i64 {
        10
    }

    pub fn activity_status() -> String {
        "pending".to_string()
    }

    pub fn sent_status() -> String {
        "sent".to_string()
    }
}
