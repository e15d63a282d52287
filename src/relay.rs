//! Outbound messaging relay client.
//!
//! The relay is fire-and-forget from this layer's perspective: one HTTPS
//! POST per message, any non-200 is a delivery failure, and nothing is
//! retried.

use std::sync::Arc;

use async_trait::async_trait;
use serde::Serialize;
use serde_json::Value;

use crate::core::{CrmError, Result};
use crate::model::{CommunicationKind, Customer, Direction, NewCommunication};
use crate::repo::CommunicationRepo;

#[derive(Debug, Clone, Serialize)]
pub struct OutboundMessage {
    pub to: String,
    pub subject: String,
    pub body: String,
}

#[async_trait]
pub trait MessageRelay: Send + Sync {
    /// Delivers one message, returning the provider's message id.
    async fn send(&self, message: &OutboundMessage) -> Result<String>;
}

/// HTTPS relay endpoint client (e.g. a serverless email function).
pub struct HttpRelay {
    client: reqwest::Client,
    endpoint: String,
    auth_token: Option<String>,
}

impl HttpRelay {
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            endpoint: endpoint.into(),
            auth_token: None,
        }
    }

    pub fn with_auth_token(mut self, token: impl Into<String>) -> Self {
        self.auth_token = Some(token.into());
        self
    }
}

#[async_trait]
impl MessageRelay for HttpRelay {
    async fn send(&self, message: &OutboundMessage) -> Result<String> {
        let mut request = self.client.post(&self.endpoint).json(message);
        if let Some(token) = &self.auth_token {
            request = request.bearer_auth(token);
        }
        let response = request
            .send()
            .await
            .map_err(|err| CrmError::Network(err.to_string()))?;
        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|err| CrmError::Network(err.to_string()))?;
        if !status.is_success() {
            return Err(CrmError::Relay(body));
        }
        // Providers answer {"id": "..."}; fall back to the raw body.
        let id = serde_json::from_str::<Value>(&body)
            .ok()
            .and_then(|value| {
                value
                    .get("id")
                    .and_then(Value::as_str)
                    .map(str::to_string)
            })
            .unwrap_or(body);
        Ok(id)
    }
}

/// Sends an email through the relay and records the outbound communication
/// on success. A relay failure surfaces immediately and records nothing.
pub struct Mailer {
    relay: Arc<dyn MessageRelay>,
    communications: CommunicationRepo,
    from_address: String,
}

impl Mailer {
    pub fn new(
        relay: Arc<dyn MessageRelay>,
        communications: CommunicationRepo,
        from_address: impl Into<String>,
    ) -> Self {
        Self {
            relay,
            communications,
            from_address: from_address.into(),
        }
    }

    pub async fn send_to_customer(
        &self,
        customer: &Customer,
        subject: &str,
        body: &str,
    ) -> Result<crate::model::Communication> {
        let message = OutboundMessage {
            to: customer.email.clone(),
            subject: subject.to_string(),
            body: body.to_string(),
        };
        self.relay.send(&message).await?;

        self.communications
            .create(NewCommunication {
                customer_id: Some(customer.id.clone()),
                lead_id: None,
                kind: CommunicationKind::Email,
                direction: Direction::Outbound,
                from_address: self.from_address.clone(),
                to_address: customer.email.clone(),
                subject: Some(subject.to_string()),
                content: body.to_string(),
                status: None,
            })
            .await
    }
}
