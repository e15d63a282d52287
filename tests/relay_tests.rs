//! Message relay and the mailer's record-on-success rule.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::Utc;
use crmsync::model::{CommunicationKind, Customer, Direction};
use crmsync::{CrmClient, CrmError, MemoryGateway, MessageRelay, OutboundMessage, StaticSession};

#[derive(Default)]
struct RecordingRelay {
    sent: Mutex<Vec<OutboundMessage>>,
}

#[async_trait]
impl MessageRelay for RecordingRelay {
    async fn send(&self, message: &OutboundMessage) -> crmsync::Result<String> {
        self.sent.lock().unwrap().push(message.clone());
        Ok("msg-1".to_string())
    }
}

struct DownRelay;

#[async_trait]
impl MessageRelay for DownRelay {
    async fn send(&self, _message: &OutboundMessage) -> crmsync::Result<String> {
        Err(CrmError::Relay("upstream returned 502".to_string()))
    }
}

fn customer() -> Customer {
    Customer {
        id: "c1".to_string(),
        user_id: "user-a".to_string(),
        name: "Jane Doe".to_string(),
        email: "jane@example.com".to_string(),
        phone: None,
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
async fn successful_send_records_an_outbound_email() {
    let gateway = Arc::new(MemoryGateway::new());
    let client = CrmClient::new(gateway.clone(), Arc::new(StaticSession::new("user-a")));
    let relay = Arc::new(RecordingRelay::default());
    let mailer = client.mailer(Arc::clone(&relay) as Arc<dyn MessageRelay>, "crm@example.com");

    let recorded = mailer
        .send_to_customer(&customer(), "Welcome", "Hello Jane")
        .await
        .unwrap();

    assert_eq!(recorded.kind, CommunicationKind::Email);
    assert_eq!(recorded.direction, Direction::Outbound);
    assert_eq!(recorded.to_address, "jane@example.com");
    assert_eq!(recorded.from_address, "crm@example.com");
    assert_eq!(recorded.subject.as_deref(), Some("Welcome"));
    assert_eq!(recorded.content, "Hello Jane");

    let delivered = relay.sent.lock().unwrap();
    assert_eq!(delivered.len(), 1);
    assert_eq!(delivered[0].to, "jane@example.com");
    assert_eq!(delivered[0].subject, "Welcome");

    // The communication is visible through the normal listing.
    let listed = client.communications().list(1, 10).await.unwrap();
    assert_eq!(listed.total, 1);
}

#[tokio::test]
async fn relay_failure_records_nothing() {
    let gateway = Arc::new(MemoryGateway::new());
    let client = CrmClient::new(gateway.clone(), Arc::new(StaticSession::new("user-a")));
    let mailer = client.mailer(Arc::new(DownRelay), "crm@example.com");

    let err = mailer
        .send_to_customer(&customer(), "Welcome", "Hello Jane")
        .await
        .unwrap_err();
    assert!(matches!(err, CrmError::Relay(_)));

    let listed = client.communications().list(1, 10).await.unwrap();
    assert_eq!(listed.total, 0);
}
