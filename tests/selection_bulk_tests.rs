//! Selection semantics and bulk WhatsApp fan-out.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use chrono::Utc;
use crmsync::gateway::{EventHandler, Query, Row, SelectResult};
use crmsync::model::Customer;
use crmsync::{CrmClient, CrmError, MemoryGateway, Selection, StaticSession, Subscription, TableGateway};

#[test]
fn toggle_flips_membership() {
    let mut selection = Selection::new();

    selection.toggle("a");
    assert!(selection.contains("a"));
    assert_eq!(selection.len(), 1);

    selection.toggle("a");
    assert!(!selection.contains("a"));
    assert!(selection.is_empty());
}

#[test]
fn select_all_toggles_between_empty_and_full() {
    let view = ["a", "b", "c"];
    let mut selection = Selection::new();

    selection.select_all(view);
    assert_eq!(selection.len(), 3);

    selection.select_all(view);
    assert!(selection.is_empty());
}

#[test]
fn select_all_from_partial_selection_takes_the_whole_view() {
    let view = ["a", "b", "c"];
    let mut selection = Selection::new();
    selection.toggle("a");

    selection.select_all(view);
    assert_eq!(selection.len(), 3);
    assert!(view.iter().all(|id| selection.contains(id)));
}

#[test]
fn retain_visible_prunes_departed_rows() {
    let mut selection = Selection::new();
    selection.toggle("a");
    selection.toggle("b");
    selection.toggle("c");

    selection.retain_visible(["a", "c"]);
    assert_eq!(selection.len(), 2);
    assert!(!selection.contains("b"));
}

fn customer(id: &str, phone: Option<&str>) -> Customer {
    Customer {
        id: id.to_string(),
        user_id: "user-a".to_string(),
        name: format!("Customer {id}"),
        email: format!("{id}@example.com"),
        phone: phone.map(str::to_string),
        company: None,
        language: "English".to_string(),
        currency: "USD".to_string(),
        total_value: 0.0,
        tags: Default::default(),
        addresses: Vec::new(),
        notes: None,
        created_at: Utc::now(),
        last_activity: Utc::now(),
    }
}

#[tokio::test]
async fn bulk_send_skips_phoneless_customers_up_front() {
    let gateway = Arc::new(MemoryGateway::new());
    let client = CrmClient::new(gateway.clone(), Arc::new(StaticSession::new("user-a")));
    let messenger = client.bulk_messenger("crm@example.com");

    let recipients = vec![
        customer("c1", Some("+111")),
        customer("c2", None),
        customer("c3", Some("+333")),
    ];

    let report = messenger
        .send_whatsapp(&recipients, "hello there")
        .await
        .unwrap();
    assert_eq!(report.sent, 2);
    assert_eq!(report.skipped, 1);

    let stored = gateway
        .select("communications", Query::new())
        .await
        .unwrap();
    assert_eq!(stored.rows.len(), 2);
    for row in &stored.rows {
        assert_eq!(row.get("type").and_then(|v| v.as_str()), Some("whatsapp"));
        assert_eq!(row.get("direction").and_then(|v| v.as_str()), Some("outbound"));
        assert_eq!(row.get("content").and_then(|v| v.as_str()), Some("hello there"));
    }
}

/// Delegates to an in-memory gateway but fails every insert past a budget.
struct FlakyGateway {
    inner: Arc<MemoryGateway>,
    inserts_allowed: usize,
    inserts_seen: AtomicUsize,
}

#[async_trait]
impl TableGateway for FlakyGateway {
    async fn select(&self, table: &str, query: Query) -> crmsync::Result<SelectResult> {
        self.inner.select(table, query).await
    }

    async fn insert(&self, table: &str, row: Row) -> crmsync::Result<Row> {
        if self.inserts_seen.fetch_add(1, Ordering::SeqCst) >= self.inserts_allowed {
            return Err(CrmError::Network("connection reset".to_string()));
        }
        self.inner.insert(table, row).await
    }

    async fn update(&self, table: &str, patch: Row, matching: Query) -> crmsync::Result<Row> {
        self.inner.update(table, patch, matching).await
    }

    async fn delete(&self, table: &str, matching: Query) -> crmsync::Result<()> {
        self.inner.delete(table, matching).await
    }

    async fn subscribe(
        &self,
        table: &str,
        matching: Query,
        handler: EventHandler,
    ) -> crmsync::Result<Subscription> {
        self.inner.subscribe(table, matching, handler).await
    }
}

#[tokio::test]
async fn partial_bulk_failure_reports_counts_and_keeps_landed_writes() {
    let inner = Arc::new(MemoryGateway::new());
    let gateway = Arc::new(FlakyGateway {
        inner: Arc::clone(&inner),
        inserts_allowed: 1,
        inserts_seen: AtomicUsize::new(0),
    });
    let client = CrmClient::new(gateway, Arc::new(StaticSession::new("user-a")));
    let messenger = client.bulk_messenger("crm@example.com");

    let recipients = vec![customer("c1", Some("+111")), customer("c2", Some("+222"))];

    let err = messenger
        .send_whatsapp(&recipients, "promo")
        .await
        .unwrap_err();
    match err {
        CrmError::PartialBulkFailure { sent, failed } => {
            assert_eq!(sent, 1);
            assert_eq!(failed, 1);
        }
        other => panic!("expected partial bulk failure, got {other:?}"),
    }

    // Landed writes are not rolled back.
    let stored = inner
        .select("communications", Query::new())
        .await
        .unwrap();
    assert_eq!(stored.rows.len(), 1);
}
