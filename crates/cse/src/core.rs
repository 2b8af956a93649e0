use std::sync::Arc;

use cse_access::AccessConfig;
use cse_dispatch::{DispatchConfig, Dispatcher, EventBus};
use cse_notify::{NotifyConfig, NotifyEngine};
use cse_registration::RegistrationConfig;
use cse_remote::{CseRole, ReqwestPeerConnector, RemoteCseMonitor, RemoteConfig};
use cse_resource::{Resource, ResourceMeta, body::CseBaseBody, ResourceBody};
use cse_storage::{InMemoryStore, ResourceStore};
use cse_types::{Permission, ResourceType};

use crate::config::CseConfig;

/// Bundles every long-lived component this CSE needs, the way the reference
/// implementation threads its dispatcher/registration/remote-CSE/
/// notification singletons, generalized here into one value whose
/// components hold `Arc`-wrapped handles to each other.
pub struct Core {
    pub dispatcher: Arc<Dispatcher>,
    pub notify: Arc<NotifyEngine>,
    pub remote: Arc<RemoteCseMonitor>,
}

impl Core {
    /// Builds every component and seeds the store with this CSE's own
    /// CSEBase resource, the root every structured path resolves under.
    pub async fn bootstrap(config: &CseConfig) -> Self {
        let store: Arc<dyn ResourceStore> = Arc::new(InMemoryStore::new());
        seed_cse_base(store.as_ref(), config).await;

        let access = AccessConfig {
            admin_originator: config.admin_originator.clone(),
            full_access_admin: true,
            allowed_ae_originators: vec!["*".to_string()],
            allowed_csr_originators: vec!["*".to_string()],
            registrar_csi: config.registrar_csi.clone(),
            inherit_acp: true,
            acp_checks_disabled: false,
        };

        let registration = RegistrationConfig {
            cse_originator: config.admin_originator.clone(),
            acp_prefix: "acp".to_string(),
            default_ae_permission: Permission::CREATE
                .union(Permission::RETRIEVE)
                .union(Permission::UPDATE)
                .union(Permission::DELETE)
                .union(Permission::NOTIFY)
                .union(Permission::DISCOVERY),
            acp_self_permission: Permission::RETRIEVE.union(Permission::UPDATE),
            allowed_ae_originators: vec!["*".to_string()],
            creator_allowed_types: vec![
                ResourceType::Container,
                ResourceType::ContentInstance,
                ResourceType::FlexContainer,
                ResourceType::Group,
                ResourceType::Subscription,
            ],
        };

        let notify_config = NotifyConfig {
            retry_attempts: config.notify_retry_attempts,
            queue_capacity: config.notify_queue_capacity,
            ..NotifyConfig::default()
        };
        let notify = NotifyEngine::new(Arc::clone(&store), notify_config);

        let events = Arc::new(EventBus::default());

        let dispatch_config = DispatchConfig {
            cse_csi: config.cse_csi.clone(),
            cse_ri: config.cse_ri.clone(),
            cse_rn: config.cse_rn.clone(),
            cse_originator: config.admin_originator.clone(),
            rvi: config.rvi.clone(),
            discovery_default_limit: 1000,
        };

        let dispatcher = Arc::new(Dispatcher::new(
            Arc::clone(&store),
            access,
            registration,
            Arc::clone(&notify),
            events,
            dispatch_config,
        ));

        let remote_config = RemoteConfig {
            role: config.role.0,
            cse_csi: config.cse_csi.clone(),
            cse_ri: config.cse_ri.clone(),
            registrar_url: config.registrar_url.clone(),
            registrar_csi: config.registrar_csi.clone(),
            reconcile_interval: config.reconcile_interval(),
        };
        let peer = Arc::new(ReqwestPeerConnector::new(reqwest::Client::new()));
        let remote = RemoteCseMonitor::new(Arc::clone(&store), peer, remote_config);

        Core {
            dispatcher,
            notify,
            remote,
        }
    }

    /// Spawns the background workers (notification delivery, remote-CSE
    /// reconciliation) as independent cooperative tasks.
    pub fn spawn_workers(&self) {
        tokio::spawn(Arc::clone(&self.notify).run_worker());
        tokio::spawn(Arc::clone(&self.remote).run_worker());
    }

    pub fn shutdown(&self) {
        self.notify.shutdown();
        self.remote.shutdown();
    }
}

async fn seed_cse_base(store: &dyn ResourceStore, config: &CseConfig) {
    if store.get(&config.cse_ri).await.is_ok() {
        return;
    }

    let now = cse_types::Timestamp::now();
    let resource = Resource {
        meta: ResourceMeta {
            ri: config.cse_ri.clone(),
            rn: config.cse_rn.clone(),
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
            csi: config.cse_csi.clone(),
            cst: match config.role.0 {
                CseRole::Asn => 2,
                CseRole::Mn => 1,
                CseRole::In => 1,
            },
            csz: vec!["application/json".to_string()],
            srt: vec![],
            poa: vec![],
            dcse: vec![],
        }),
    };

    let _ = store.put(resource).await;
}
