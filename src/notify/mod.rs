//! Outbound WhatsApp notifications.
//!
//! Delivery is best-effort: implementations report failure through
//! [`Delivery`] instead of erroring, and callers turn a failed delivery into a
//! warning on an already committed response.

use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;

use crate::config::NotifyConfig;

pub mod messages;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Delivery {
    pub delivered: bool,
    pub detail: Option<String>,
}

impl Delivery {
    pub fn delivered() -> Self {
        Self {
            delivered: true,
            detail: None,
        }
    }

    pub fn failed(detail: impl Into<String>) -> Self {
        Self {
            delivered: false,
            detail: Some(detail.into()),
        }
    }
}

#[async_trait]
pub trait Notifier: Send + Sync {
    async fn send(&self, target: &str, message: &str) -> Delivery;
}

/// Used when no provider token is configured.
#[derive(Debug, Default, Clone, Copy)]
pub struct DisabledNotifier;

#[async_trait]
impl Notifier for DisabledNotifier {
    async fn send(&self, target: &str, _message: &str) -> Delivery {
        tracing::debug!(target_phone = %target, "notification skipped, provider not configured");
        Delivery::failed("notification provider is not configured")
    }
}

/// Fonnte WhatsApp gateway client.
#[derive(Debug, Clone)]
pub struct FonnteNotifier {
    client: reqwest::Client,
    endpoint: String,
    token: String,
}

#[derive(Debug, Deserialize)]
struct FonnteReply {
    status: Option<bool>,
    reason: Option<String>,
}

impl FonnteNotifier {
    pub fn new(endpoint: impl Into<String>, token: impl Into<String>, timeout: Duration) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            endpoint: endpoint.into(),
            token: token.into(),
        })
    }
}

#[async_trait]
impl Notifier for FonnteNotifier {
    async fn send(&self, target: &str, message: &str) -> Delivery {
        let response = self
            .client
            .post(&self.endpoint)
            .header(reqwest::header::AUTHORIZATION, &self.token)
            .form(&[("target", target), ("message", message)])
            .send()
            .await;

        let response = match response {
            Ok(response) => response,
            Err(err) => return Delivery::failed(format!("transport error: {err}")),
        };

        let status = response.status();
        if !status.is_success() {
            return Delivery::failed(format!("provider responded {status}"));
        }

        // Fonnte answers 200 with `status: false` for rejected sends.
        match response.json::<FonnteReply>().await {
            Ok(FonnteReply {
                status: Some(false),
                reason,
            }) => Delivery::failed(reason.unwrap_or_else(|| "provider rejected message".into())),
            Ok(_) | Err(_) => Delivery::delivered(),
        }
    }
}

/// Picks the provider implementation for the configured credentials.
pub fn from_config(config: &NotifyConfig) -> anyhow::Result<std::sync::Arc<dyn Notifier>> {
    match &config.token {
        Some(token) => Ok(std::sync::Arc::new(FonnteNotifier::new(
            config.endpoint.clone(),
            token.clone(),
            Duration::from_secs(config.timeout_secs),
        )?)),
        None => {
            tracing::warn!("FONNTE_TOKEN is not set, WhatsApp notifications are disabled");
            Ok(std::sync::Arc::new(DisabledNotifier))
        }
    }
}

/// Sends and logs; returns `true` when the provider accepted the message.
pub async fn send_logged(notifier: &dyn Notifier, target: &str, message: &str, kind: &str) -> bool {
    let delivery = notifier.send(target, message).await;
    if delivery.delivered {
        tracing::info!(kind, target_phone = %target, "notification delivered");
    } else {
        tracing::warn!(
            kind,
            target_phone = %target,
            detail = delivery.detail.as_deref().unwrap_or("-"),
            "notification failed"
        );
    }
    delivery.delivered
}
