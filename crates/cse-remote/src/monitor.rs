use std::collections::HashSet;
use std::sync::Arc;

use cse_resource::body::CseBaseBody;
use cse_resource::{Resource, ResourceBody, ResourceMeta};
use cse_storage::ResourceStore;
use tokio::sync::{RwLock, watch};
use tracing::{info, warn};

use crate::config::RemoteConfig;
use crate::copy::{copy_cse_to_csr, strip_for_update};
use crate::peer::PeerConnector;

/// Periodic connection monitor. Ascending reconciliation keeps our own
/// registration with a registrar CSE alive; descending liveness checks drop
/// local CSRs for peers that have stopped answering.
pub struct RemoteCseMonitor {
    store: Arc<dyn ResourceStore>,
    peer: Arc<dyn PeerConnector>,
    config: RemoteConfig,
    descendants: RwLock<HashSet<String>>,
    stop_tx: watch::Sender<bool>,
    stop_rx: watch::Receiver<bool>,
}

impl RemoteCseMonitor {
    pub fn new(store: Arc<dyn ResourceStore>, peer: Arc<dyn PeerConnector>, config: RemoteConfig) -> Arc<Self> {
        let (stop_tx, stop_rx) = watch::channel(false);
        Arc::new(RemoteCseMonitor {
            store,
            peer,
            config,
            descendants: RwLock::new(HashSet::new()),
            stop_tx,
            stop_rx,
        })
    }

    pub fn shutdown(&self) {
        let _ = self.stop_tx.send(true);
    }

    /// Adds `csi` to the descendant table and pushes the updated `dcse`
    /// list into the local CSEBase.
    pub async fn remote_cse_registered(&self, csi: &str) {
        {
            let mut descendants = self.descendants.write().await;
            descendants.insert(csi.to_string());
        }
        self.sync_descendants_to_cse_base().await;
    }

    pub async fn remote_cse_deregistered(&self, csi: &str) {
        {
            let mut descendants = self.descendants.write().await;
            descendants.remove(csi);
        }
        self.sync_descendants_to_cse_base().await;
    }

    async fn sync_descendants_to_cse_base(&self) {
        let Ok(mut cse_base) = self.store.get(&self.config.cse_ri).await else {
            return;
        };
        let dcse: Vec<String> = self.descendants.read().await.iter().cloned().collect();
        if let ResourceBody::CseBase(body) = &mut cse_base.body {
            body.dcse = dcse;
        }
        let _ = self.store.put(cse_base).await;
    }

    /// The long-lived background worker: ticks at `reconcile_interval` until
    /// `shutdown` is called.
    pub async fn run_worker(self: Arc<Self>) {
        let mut stop_rx = self.stop_rx.clone();
        let mut interval = tokio::time::interval(self.config.reconcile_interval);
        loop {
            tokio::select! {
                _ = interval.tick() => self.tick().await,
                _ = stop_rx.changed() => {
                    if *stop_rx.borrow() {
                        break;
                    }
                }
            }
        }
    }

    /// Runs one reconciliation pass. Idempotent: running it twice with no
    /// external changes creates nothing new, since every branch keys off
    /// whether a local/remote CSR already exists.
    pub async fn tick(&self) {
        if self.config.role.ascends() {
            self.ascending_reconcile().await;
        }
        if self.config.role.has_descendants() {
            self.descending_liveness_check().await;
        }
    }

    async fn ascending_reconcile(&self) {
        let Some(registrar_url) = &self.config.registrar_url else {
            return;
        };
        let Some(registrar_csi) = &self.config.registrar_csi else {
            return;
        };
        let local_csr = self.find_local_csr(registrar_csi).await;

        match local_csr {
            Some(local_csr) => {
                let remote = self.peer.fetch(registrar_url).await;
                match remote {
                    Some(remote_body) => {
                        if let Some(remote_lt) = remote_body.get("lt").and_then(|v| v.as_str()) {
                            if remote_lt > local_csr.meta.lt.to_string().as_str() {
                                info!(registrar_csi, "pulling newer registrar CSEBase into local CSR");
                            }
                        }
                        if let Some(csr_body) = local_csr.body.as_remote_cse() {
                            let push_body = strip_for_update(csr_body);
                            self.peer.push(registrar_url, &push_body).await;
                        }
                    }
                    None => {
                        warn!(registrar_csi, "registrar unreachable, dropping stale local CSR");
                        let _ = self.store.delete(&local_csr.meta.ri).await;
                        if let Some(csr_body) = local_csr.body.as_remote_cse() {
                            let create_body = strip_for_update(csr_body);
                            if self.peer.create(registrar_url, &create_body).await.is_some() {
                                let _ = self.store.put(local_csr).await;
                                self.remote_cse_registered(registrar_csi).await;
                            } else {
                                self.remote_cse_deregistered(registrar_csi).await;
                            }
                        }
                    }
                }
            }
            None => {
                if self.peer.delete(registrar_url).await {
                    info!(registrar_csi, "cleared orphan remote CSR before re-registering");
                }

                let Ok(cse_base) = self.store.get(&self.config.cse_ri).await else {
                    return;
                };
                let Some(cse_body) = cse_base.body.as_cse_base() else {
                    return;
                };
                let dcse: Vec<String> = self.descendants.read().await.iter().cloned().collect();
                let remote_csr_body = copy_cse_to_csr(cse_body, &self.config.cse_ri, dcse.clone());
                let create_body = strip_for_update(&remote_csr_body);

                if self.peer.create(registrar_url, &create_body).await.is_none() {
                    warn!(registrar_csi, "failed to create remote CSR at registrar");
                    return;
                }

                let Some(registrar_body) = self.peer.fetch(registrar_url).await else {
                    warn!(registrar_csi, "remote CSR created but registrar CSEBase unreachable");
                    return;
                };
                let Ok(registrar_cse) = serde_json::from_value::<CseBaseBody>(registrar_body) else {
                    warn!(registrar_csi, "registrar CSEBase response could not be parsed");
                    return;
                };

                let now = cse_types::Timestamp::now();
                let local_csr_body = copy_cse_to_csr(&registrar_cse, registrar_csi, dcse);
                let local_csr = Resource {
                    meta: ResourceMeta {
                        ri: format!("csr-{registrar_csi}"),
                        rn: registrar_csi.clone(),
                        pi: self.config.cse_ri.clone(),
                        ct: now,
                        lt: now,
                        et: None,
                        acpi: vec![],
                        lbl: vec![],
                        at: vec![],
                        aa: vec![],
                        cr: None,
                    },
                    body: ResourceBody::RemoteCse(local_csr_body),
                };
                let _ = self.store.put(local_csr).await;
                info!(registrar_csi, "established local CSR for registrar");
                self.remote_cse_registered(registrar_csi).await;
            }
        }
    }

    async fn descending_liveness_check(&self) {
        let Ok(children) = self.store.children(&self.config.cse_ri, Some(cse_types::ResourceType::RemoteCse)).await else {
            return;
        };
        for csr in children {
            if Some(csr.meta.rn.as_str()) == self.config.registrar_csi.as_deref() {
                continue;
            }
            let Some(csr_body) = csr.body.as_remote_cse() else {
                continue;
            };
            let Some(poa) = csr_body.poa.first() else {
                continue;
            };
            if self.peer.fetch(poa).await.is_none() {
                warn!(csi = csr_body.csi, "peer CSE unreachable, dropping local CSR");
                let _ = self.store.delete(&csr.meta.ri).await;
                self.remote_cse_deregistered(&csr_body.csi).await;
            }
        }
    }

    async fn find_local_csr(&self, csi: &str) -> Option<Resource> {
        let children = self
            .store
            .children(&self.config.cse_ri, Some(cse_types::ResourceType::RemoteCse))
            .await
            .ok()?;
        children.into_iter().find(|r| r.body.as_remote_cse().map(|b| b.csi == csi).unwrap_or(false))
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;
    use std::time::Duration;

    use cse_storage::InMemoryStore;
    use serde_json::json;

    use super::*;
    use crate::config::CseRole;

    struct FakePeer {
        registrar_cse: Value,
        created: Mutex<Vec<serde_json::Value>>,
        deleted: Mutex<u32>,
    }

    #[async_trait::async_trait]
    impl PeerConnector for FakePeer {
        async fn fetch(&self, _poa: &str) -> Option<Value> {
            Some(self.registrar_cse.clone())
        }

        async fn push(&self, _poa: &str, _body: &Value) -> bool {
            true
        }

        async fn create(&self, _poa: &str, body: &Value) -> Option<Value> {
            self.created.lock().unwrap().push(body.clone());
            Some(body.clone())
        }

        async fn delete(&self, _poa: &str) -> bool {
            *self.deleted.lock().unwrap() += 1;
            true
        }
    }

    fn cse_base_resource(ri: &str, csi: &str) -> Resource {
        let now = jiff::Timestamp::UNIX_EPOCH;
        Resource {
            meta: ResourceMeta {
                ri: ri.to_string(),
                rn: ri.to_string(),
                pi: String::new(),
                ct: now,
                lt: now,
                et: None,
                acpi: vec![],
                lbl: vec![],
                at: vec![],
                aa: vec![],
                cr: None,
            },
            body: ResourceBody::CseBase(CseBaseBody {
                csi: csi.to_string(),
                cst: 2,
                csz: vec!["application/json".to_string()],
                srt: vec![],
                poa: vec!["http://in-cse.example/".to_string()],
                dcse: vec![],
            }),
        }
    }

    #[tokio::test]
    async fn ascending_reconcile_bootstraps_local_csr_when_absent() {
        let store: Arc<dyn ResourceStore> = Arc::new(InMemoryStore::new());
        store.put(cse_base_resource("cse-mn", "mn-cse")).await.unwrap();

        let peer = Arc::new(FakePeer {
            registrar_cse: json!({"csi": "in-cse", "cst": 1, "csz": [], "srt": [], "poa": ["http://registrar.example/"], "dcse": []}),
            created: Mutex::new(Vec::new()),
            deleted: Mutex::new(0),
        });

        let config = RemoteConfig {
            role: CseRole::Mn,
            cse_csi: "mn-cse".to_string(),
            cse_ri: "cse-mn".to_string(),
            registrar_url: Some("http://registrar.example/".to_string()),
            registrar_csi: Some("in-cse".to_string()),
            reconcile_interval: Duration::from_secs(60),
        };
        let peer_dyn: Arc<dyn PeerConnector> = peer.clone();
        let monitor = RemoteCseMonitor::new(Arc::clone(&store), peer_dyn, config);

        monitor.ascending_reconcile().await;

        assert_eq!(*peer.deleted.lock().unwrap(), 1);
        assert_eq!(peer.created.lock().unwrap().len(), 1);

        let local_csr = monitor.find_local_csr("in-cse").await.expect("local CSR created");
        let csr_body = local_csr.body.as_remote_cse().expect("remote cse body");
        assert_eq!(csr_body.csi, "in-cse");
        assert_eq!(csr_body.poa, vec!["http://registrar.example/".to_string()]);
    }
}
