use async_trait::async_trait;
use serde_json::Value;

/// The narrow boundary the monitor talks to peer CSEs through. Kept as a
/// trait, the same way the storage facade is, so reconciliation logic can be
/// exercised against a fake in tests without a network.
#[async_trait]
pub trait PeerConnector: Send + Sync {
    async fn fetch(&self, poa: &str) -> Option<Value>;
    async fn push(&self, poa: &str, body: &Value) -> bool;
    async fn create(&self, poa: &str, body: &Value) -> Option<Value>;
    async fn delete(&self, poa: &str) -> bool;
}

pub struct ReqwestPeerConnector {
    client: reqwest::Client,
}

impl ReqwestPeerConnector {
    pub fn new(client: reqwest::Client) -> Self {
        ReqwestPeerConnector { client }
    }
}

#[async_trait]
impl PeerConnector for ReqwestPeerConnector {
    async fn fetch(&self, poa: &str) -> Option<Value> {
        let resp = self.client.get(poa).send().await.ok()?;
        if !resp.status().is_success() {
            return None;
        }
        resp.json().await.ok()
    }

    async fn push(&self, poa: &str, body: &Value) -> bool {
        self.client
            .put(poa)
            .json(body)
            .send()
            .await
            .map(|resp| resp.status().is_success())
            .unwrap_or(false)
    }

    async fn create(&self, poa: &str, body: &Value) -> Option<Value> {
        let resp = self.client.post(poa).json(body).send().await.ok()?;
        if !resp.status().is_success() {
            return None;
        }
        resp.json().await.ok()
    }

    async fn delete(&self, poa: &str) -> bool {
        self.client
            .delete(poa)
            .send()
            .await
            .map(|resp| resp.status().is_success())
            .unwrap_or(false)
    }
}
