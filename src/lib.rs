// ============================================================================
// crmsync Library
// ============================================================================

pub mod cache;
pub mod core;
pub mod dashboard;
pub mod filter;
pub mod gateway;
pub mod model;
pub mod relay;
pub mod repo;
pub mod selection;
pub mod session;

// Re-export main types for convenience
pub use cache::{CacheState, LivePage, PageCache};
pub use core::{ChangeEvent, CrmError, Page, Result, SelectionItem, Sort};
pub use dashboard::Dashboard;
pub use filter::{Filter, Predicate, apply_filter};
pub use gateway::{MemoryGateway, Query, Subscription, TableGateway};
pub use relay::{HttpRelay, Mailer, MessageRelay, OutboundMessage};
pub use repo::{
    ActivityRepo, CommunicationRepo, CustomerRepo, DerivedPolicy, LeadRepo, OpportunityRepo,
    RepoConfig, Repository,
};
pub use selection::{BulkMessenger, BulkReport, Selection};
pub use session::{AnonymousSession, SessionProvider, StaticSession};

use std::sync::Arc;

// ============================================================================
// High-level client (one per signed-in principal)
// ============================================================================

/// Entry point bundling a table gateway and a session into per-entity
/// repositories.
///
/// # Examples
///
/// ```
/// use crmsync::{CrmClient, MemoryGateway, StaticSession};
/// use crmsync::model::NewLead;
/// use std::sync::Arc;
///
/// # tokio_test::block_on(async {
/// let client = CrmClient::new(
///     Arc::new(MemoryGateway::new()),
///     Arc::new(StaticSession::new("user-1")),
/// );
///
/// let leads = client.leads();
/// leads
///     .create(NewLead {
///         name: "Jane Doe".into(),
///         email: "jane@example.com".into(),
///         ..Default::default()
///     })
///     .await
///     .unwrap();
///
/// let page = leads.list(1, 10).await.unwrap();
/// assert_eq!(page.total, 1);
/// # });
/// ```
pub struct CrmClient {
    gateway: Arc<dyn TableGateway>,
    session: Arc<dyn SessionProvider>,
    config: RepoConfig,
}

impl CrmClient {
    pub fn new(gateway: Arc<dyn TableGateway>, session: Arc<dyn SessionProvider>) -> Self {
        Self::with_config(gateway, session, RepoConfig::default())
    }

    pub fn with_config(
        gateway: Arc<dyn TableGateway>,
        session: Arc<dyn SessionProvider>,
        config: RepoConfig,
    ) -> Self {
        Self {
            gateway,
            session,
            config,
        }
    }

    pub fn config(&self) -> &RepoConfig {
        &self.config
    }

    pub fn customers(&self) -> CustomerRepo {
        CustomerRepo::new(
            Arc::clone(&self.gateway),
            Arc::clone(&self.session),
            self.config.customer_lead,
        )
    }

    pub fn leads(&self) -> LeadRepo {
        LeadRepo::new(
            Arc::clone(&self.gateway),
            Arc::clone(&self.session),
            self.config.lead_opportunity,
        )
    }

    pub fn opportunities(&self) -> OpportunityRepo {
        OpportunityRepo::new(Arc::clone(&self.gateway), Arc::clone(&self.session))
    }

    pub fn activities(&self) -> ActivityRepo {
        ActivityRepo::new(Arc::clone(&self.gateway), Arc::clone(&self.session))
    }

    pub fn communications(&self) -> CommunicationRepo {
        CommunicationRepo::new(Arc::clone(&self.gateway), Arc::clone(&self.session))
    }

    pub fn dashboard(&self) -> Dashboard {
        Dashboard::new(Arc::clone(&self.gateway), Arc::clone(&self.session))
    }

    pub fn bulk_messenger(&self, from_address: impl Into<String>) -> BulkMessenger {
        BulkMessenger::new(self.communications(), from_address)
    }

    pub fn mailer(
        &self,
        relay: Arc<dyn MessageRelay>,
        from_address: impl Into<String>,
    ) -> Mailer {
        Mailer::new(relay, self.communications(), from_address)
    }
}
