//! Registration side effects for AE and CSR resources: originator minting,
//! implicit ACP creation, creator attribution, and deregistration cleanup.
//! Transcribed from the reference CSE's registration manager.

use cse_resource::{AcpBody, PermissionRecord, Resource, ResourceMeta};
use cse_storage::ResourceStore;
use cse_types::{Permission, ResourceType, is_allowed_originator, stem};
use rand::Rng;
use snafu::Snafu;

#[derive(Debug, Snafu)]
pub enum RegistrationError {
    #[snafu(display("originator not allowed to register"))]
    OriginatorNotAllowed,
    #[snafu(display("AE may only be created under the CSEBase"))]
    ParentNotCseBase,
    #[snafu(display("setting the creator attribute is not allowed"))]
    CreatorNotSettable,
    #[snafu(display("internal ACP {rn} could not be created"))]
    AcpCreationFailed { rn: String },
}

pub type Result<T, E = RegistrationError> = std::result::Result<T, E>;

#[derive(Clone, Debug)]
pub struct RegistrationConfig {
    pub cse_originator: String,
    pub acp_prefix: String,
    pub default_ae_permission: Permission,
    pub acp_self_permission: Permission,
    pub allowed_ae_originators: Vec<String>,
    /// Resource types for which `cr` is assigned on creation.
    pub creator_allowed_types: Vec<ResourceType>,
}

/// Generates a fresh AE-ID with the given sentinel prefix (`C` for a
/// CSE-assigned application, `S` for one the CSE additionally trusts).
pub fn unique_aei(prefix: &str) -> String {
    let suffix: String = {
        let mut rng = rand::rng();
        (0..10).map(|_| char::from(rng.sample(rand::distr::Alphanumeric))).collect()
    };
    format!("{prefix}{suffix}")
}

/// Rejects a client-supplied `cr`, then assigns it for resource types that
/// carry creator attribution.
pub fn handle_creator(meta: &mut ResourceMeta, ty: ResourceType, originator: &str, config: &RegistrationConfig) -> Result<()> {
    if meta.cr.is_some() {
        return Err(RegistrationError::CreatorNotSettable);
    }
    if config.creator_allowed_types.contains(&ty) {
        let cr = if matches!(originator, "C" | "S" | "") {
            config.cse_originator.clone()
        } else {
            originator.to_string()
        };
        meta.cr = Some(cr);
    }
    Ok(())
}

/// Resolves (and if necessary mints) the AE originator, assigns `aei`/`ri`,
/// and creates an internal ACP for the AE if it didn't request one of its
/// own. Returns the resolved originator the caller must use from here on.
pub async fn handle_ae_registration(
    store: &dyn ResourceStore,
    config: &RegistrationConfig,
    ae_meta: &mut ResourceMeta,
    ae_body: &mut cse_resource::body::AeBody,
    requested_originator: &str,
    parent: &Resource,
    now: cse_types::Timestamp,
) -> Result<String> {
    let mut originator = if requested_originator.is_empty() {
        "C".to_string()
    } else {
        requested_originator.to_string()
    };

    if !is_allowed_originator(&originator, &config.allowed_ae_originators) {
        return Err(RegistrationError::OriginatorNotAllowed);
    }

    originator = match originator.as_str() {
        "C" => unique_aei("C"),
        "S" => unique_aei("S"),
        other => stem(other).to_string(),
    };

    ae_body.aei = originator.clone();
    ae_meta.ri = stem(&originator).to_string();

    if parent.ty() != ResourceType::CseBase {
        return Err(RegistrationError::ParentNotCseBase);
    }

    if ae_meta.acpi.is_empty() {
        let acp = create_internal_acp(
            store,
            config,
            &parent.meta.ri,
            &format!("{}{}", config.acp_prefix, ae_meta.rn),
            &ae_meta.ri,
            &[originator.clone(), config.cse_originator.clone()],
            config.default_ae_permission,
            now,
        )
        .await?;
        ae_meta.acpi = vec![acp];
    }

    Ok(originator)
}

/// Deletes the internal ACP created during AE registration, if this AE is
/// the one that created it.
pub async fn handle_ae_deregistration(store: &dyn ResourceStore, config: &RegistrationConfig, ae: &Resource) -> Result<()> {
    let rn = format!("{}{}", config.acp_prefix, ae.meta.rn);
    remove_internal_acp(store, &ae.meta.pi, &rn, &ae.meta.ri).await
}

/// Creates the two internal ACPs a CSR registration needs: one granting the
/// peer full access to its own CSR, one granting it RETRIEVE on the local
/// CSEBase (appended to the CSEBase's own `acpi`).
pub async fn handle_csr_registration(
    store: &dyn ResourceStore,
    config: &RegistrationConfig,
    csr_meta: &mut ResourceMeta,
    originator: &str,
    local_cse: &mut Resource,
    now: cse_types::Timestamp,
) -> Result<()> {
    let csr_acp = create_internal_acp(
        store,
        config,
        &local_cse.meta.ri,
        &format!("{}{}", config.acp_prefix, csr_meta.rn),
        &csr_meta.ri,
        &[originator.to_string(), config.cse_originator.clone()],
        Permission::ALL,
        now,
    )
    .await?;
    csr_meta.acpi = vec![csr_acp];

    let cse_acp = create_internal_acp(
        store,
        config,
        &local_cse.meta.ri,
        &format!("{}{}_CSE", config.acp_prefix, csr_meta.rn),
        &csr_meta.ri,
        &[originator.to_string(), config.cse_originator.clone()],
        Permission::RETRIEVE,
        now,
    )
    .await?;
    local_cse.meta.acpi.push(cse_acp);
    store.put(local_cse.clone()).await.map_err(|_| RegistrationError::AcpCreationFailed { rn: cse_meta_rn(local_cse) })?;

    Ok(())
}

/// Removes both internal ACPs created for a CSR and detaches the CSEBase
/// reference, updating `local_cse` in the caller's storage handle.
pub async fn handle_csr_deregistration(
    store: &dyn ResourceStore,
    config: &RegistrationConfig,
    csr: &Resource,
    local_cse: &mut Resource,
) -> Result<()> {
    let rn = format!("{}{}", config.acp_prefix, csr.meta.rn);
    remove_internal_acp(store, &local_cse.meta.ri, &rn, &csr.meta.ri).await?;

    let cse_acp_rn = format!("{rn}_CSE");
    let removed_ri = find_by_name(store, &local_cse.meta.ri, &cse_acp_rn).await;
    remove_internal_acp(store, &local_cse.meta.ri, &cse_acp_rn, &csr.meta.ri).await?;

    if let Some(removed_ri) = removed_ri {
        local_cse.meta.acpi.retain(|ri| ri != &removed_ri);
    }
    store
        .put(local_cse.clone())
        .await
        .map_err(|_| RegistrationError::AcpCreationFailed { rn: cse_meta_rn(local_cse) })?;
    Ok(())
}

fn cse_meta_rn(resource: &Resource) -> String {
    resource.meta.rn.clone()
}

async fn find_by_name(store: &dyn ResourceStore, pi: &str, rn: &str) -> Option<String> {
    store.get_by_name(pi, rn).await.ok().map(|r| r.meta.ri)
}

#[allow(clippy::too_many_arguments)]
async fn create_internal_acp(
    store: &dyn ResourceStore,
    config: &RegistrationConfig,
    parent_ri: &str,
    rn: &str,
    created_for: &str,
    originators: &[String],
    permission: Permission,
    now: cse_types::Timestamp,
) -> Result<String> {
    let mut origs = originators.to_vec();
    if !origs.contains(&config.cse_originator) {
        origs.push(config.cse_originator.clone());
    }
    let ri = format!("{rn}-{created_for}");
    let acp = Resource {
        meta: ResourceMeta {
            ri: ri.clone(),
            rn: rn.to_string(),
            pi: parent_ri.to_string(),
            ct: now,
            lt: now,
            et: None,
            acpi: vec![],
            lbl: vec![],
            at: vec![],
            aa: vec![],
            cr: Some(config.cse_originator.clone()),
        },
        body: cse_resource::ResourceBody::AccessControlPolicy(AcpBody {
            pv: vec![PermissionRecord {
                originators: origs,
                operations: permission,
                ty_filter: None,
            }],
            pvs: vec![PermissionRecord {
                originators: vec![config.cse_originator.clone()],
                operations: config.acp_self_permission,
                ty_filter: None,
            }],
            created_internally_for: Some(created_for.to_string()),
        }),
    };
    store
        .put(acp)
        .await
        .map_err(|_| RegistrationError::AcpCreationFailed { rn: rn.to_string() })?;
    Ok(ri)
}

async fn remove_internal_acp(store: &dyn ResourceStore, pi: &str, rn: &str, owner_ri: &str) -> Result<()> {
    let Ok(acp_resource) = store.get_by_name(pi, rn).await else {
        // Not found: either never created or already removed. Not an error,
        // matching the reference manager's log-and-continue behavior.
        return Ok(());
    };
    if let Some(acp) = acp_resource.body.as_acp() {
        if acp.created_internally_for.as_deref() == Some(owner_ri) {
            let _ = store.delete(&acp_resource.meta.ri).await;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use cse_resource::ResourceBody;
    use cse_storage::InMemoryStore;

    fn config() -> RegistrationConfig {
        RegistrationConfig {
            cse_originator: "CAdmin".to_string(),
            acp_prefix: "acp".to_string(),
            default_ae_permission: Permission::ALL,
            acp_self_permission: Permission::ALL,
            allowed_ae_originators: vec!["*".to_string()],
            creator_allowed_types: vec![ResourceType::Ae, ResourceType::Container, ResourceType::ContentInstance],
        }
    }

    fn cse_base() -> Resource {
        Resource {
            meta: ResourceMeta {
                ri: "cse-ri".to_string(),
                rn: "cse-in".to_string(),
                pi: String::new(),
                ct: jiff::Timestamp::UNIX_EPOCH,
                lt: jiff::Timestamp::UNIX_EPOCH,
                et: None,
                acpi: vec![],
                lbl: vec![],
                at: vec![],
                aa: vec![],
                cr: None,
            },
            body: ResourceBody::CseBase(Default::default()),
        }
    }

    #[tokio::test]
    async fn ae_registration_mints_id_and_creates_acp() {
        let store = InMemoryStore::new();
        let parent = cse_base();
        let cfg = config();
        let mut ae_meta = ResourceMeta {
            ri: String::new(),
            rn: "demo".to_string(),
            pi: parent.meta.ri.clone(),
            ct: jiff::Timestamp::UNIX_EPOCH,
            lt: jiff::Timestamp::UNIX_EPOCH,
            et: None,
            acpi: vec![],
            lbl: vec![],
            at: vec![],
            aa: vec![],
            cr: None,
        };
        let mut ae_body = cse_resource::body::AeBody::default();

        let originator = handle_ae_registration(&store, &cfg, &mut ae_meta, &mut ae_body, "C", &parent, jiff::Timestamp::UNIX_EPOCH)
            .await
            .unwrap();

        assert!(originator.starts_with('C'));
        assert_eq!(ae_meta.acpi.len(), 1);
        assert!(store.get(&ae_meta.acpi[0]).await.is_ok());
    }

    #[test]
    fn handle_creator_rejects_client_supplied() {
        let cfg = config();
        let mut meta = cse_base().meta;
        meta.cr = Some("Cforged".to_string());
        let err = handle_creator(&mut meta, ResourceType::Ae, "Cfoo", &cfg).unwrap_err();
        assert!(matches!(err, RegistrationError::CreatorNotSettable));
    }

    #[test]
    fn handle_creator_assigns_cse_originator_for_anonymous() {
        let cfg = config();
        let mut meta = cse_base().meta;
        handle_creator(&mut meta, ResourceType::Ae, "C", &cfg).unwrap();
        assert_eq!(meta.cr.as_deref(), Some("CAdmin"));
    }
}
