use std::collections::HashMap;
use std::sync::Arc;

use cse_storage::ResourceStore;
use serde_json::{Value, json};
use tokio::sync::{Mutex, Notify, RwLock, watch};
use tracing::{debug, warn};

use crate::config::NotifyConfig;
use crate::event::EventType;
use crate::queue::{BoundedQueue, QueuedNotification};

/// Maintains the subscribed-to-resource -> subscription index and the
/// delivery queue/worker. `store` is used to read subscription bodies
/// (`nu`, `enc`, `exc`) and to decrement/delete them as notifications are
/// delivered.
pub struct NotifyEngine {
    index: RwLock<HashMap<String, Vec<String>>>,
    queue: Mutex<BoundedQueue>,
    wake: Notify,
    stop_tx: watch::Sender<bool>,
    stop_rx: watch::Receiver<bool>,
    client: reqwest::Client,
    config: NotifyConfig,
    store: Arc<dyn ResourceStore>,
}

impl NotifyEngine {
    pub fn new(store: Arc<dyn ResourceStore>, config: NotifyConfig) -> Arc<Self> {
        let (stop_tx, stop_rx) = watch::channel(false);
        let client = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());
        Arc::new(NotifyEngine {
            index: RwLock::new(HashMap::new()),
            queue: Mutex::new(BoundedQueue::new(config.queue_capacity)),
            wake: Notify::new(),
            stop_tx,
            stop_rx,
            client,
            config,
            store,
        })
    }

    pub async fn register(&self, subscribed_to_ri: &str, sub_ri: &str) {
        let mut index = self.index.write().await;
        let entry = index.entry(subscribed_to_ri.to_string()).or_default();
        if !entry.iter().any(|r| r == sub_ri) {
            entry.push(sub_ri.to_string());
        }
    }

    pub async fn unregister(&self, subscribed_to_ri: &str, sub_ri: &str) {
        let mut index = self.index.write().await;
        if let Some(entry) = index.get_mut(subscribed_to_ri) {
            entry.retain(|r| r != sub_ri);
            if entry.is_empty() {
                index.remove(subscribed_to_ri);
            }
        }
    }

    /// Called by the dispatcher after a successful mutation. Looks up every
    /// subscription on `subscribed_to_ri` whose `enc.net` includes
    /// `event_type`, and enqueues a notification for each.
    pub async fn emit(&self, subscribed_to_ri: &str, event_type: EventType, resource_snapshot: &Value) {
        let sub_ris = {
            let index = self.index.read().await;
            index.get(subscribed_to_ri).cloned().unwrap_or_default()
        };
        if sub_ris.is_empty() {
            return;
        }

        let mut queue = self.queue.lock().await;
        for sub_ri in sub_ris {
            let Ok(sub_resource) = self.store.get(&sub_ri).await else {
                continue;
            };
            let Some(sub) = sub_resource.body.as_subscription() else {
                continue;
            };
            if !event_type.matches(&sub.enc.net) {
                continue;
            }
            let payload = json!({
                "sur": subscribed_to_ri,
                "net": event_type.code(),
                "repr": resource_snapshot,
            });
            queue.push(QueuedNotification {
                sub_ri: sub_ri.clone(),
                targets: sub.nu.clone(),
                payload,
            });
        }
        drop(queue);
        self.wake.notify_one();
    }

    /// Signals the worker loop to stop at its next checkpoint.
    pub fn shutdown(&self) {
        let _ = self.stop_tx.send(true);
    }

    /// The long-lived background worker. Spawn with `tokio::spawn` once at
    /// startup; returns once `shutdown` has been called and the queue is
    /// drained.
    pub async fn run_worker(self: Arc<Self>) {
        let mut stop_rx = self.stop_rx.clone();
        loop {
            if *stop_rx.borrow() {
                break;
            }
            let item = {
                let mut queue = self.queue.lock().await;
                queue.pop()
            };
            let Some(item) = item else {
                tokio::select! {
                    _ = self.wake.notified() => continue,
                    _ = stop_rx.changed() => continue,
                };
            };
            self.deliver(item).await;
        }
    }

    async fn deliver(&self, item: QueuedNotification) {
        let mut any_delivered = false;
        for target in &item.targets {
            let mut attempts = 0;
            loop {
                match self.client.post(target).json(&item.payload).send().await {
                    Ok(resp) if resp.status().is_success() => {
                        any_delivered = true;
                        break;
                    }
                    _ if attempts < self.config.retry_attempts => {
                        attempts += 1;
                    }
                    _ => {
                        warn!(target, sub_ri = item.sub_ri, "notification delivery failed, giving up");
                        break;
                    }
                }
            }
        }
        if any_delivered {
            self.after_delivery(&item.sub_ri).await;
        }
    }

    async fn after_delivery(&self, sub_ri: &str) {
        let Ok(mut sub_resource) = self.store.get(sub_ri).await else {
            return;
        };
        let Some(sub) = sub_resource.body.as_subscription() else {
            return;
        };
        let Some(exc) = sub.exc else {
            return;
        };
        if exc <= 1 {
            debug!(sub_ri, "subscription expiration counter reached zero, deleting");
            let _ = self.store.delete(sub_ri).await;
            return;
        }
        if let cse_resource::ResourceBody::Subscription(body) = &mut sub_resource.body {
            body.exc = Some(exc - 1);
        }
        let _ = self.store.put(sub_resource).await;
    }
}
