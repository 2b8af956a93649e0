//! The access-control engine: evaluates ACPs against
//! `(originator, operation, resource type)`, following the evaluation order
//! transcribed from the reference CSE's security manager.

use cse_resource::{AcpBody, PermissionRecord, Resource};
use cse_storage::ResourceStore;
use cse_types::{Operation, Permission, ResourceType, is_allowed_originator, matches_originator};
use snafu::Snafu;
use tracing::warn;

#[derive(Debug, Snafu)]
pub enum AccessError {
    #[snafu(display("failed to look up ACP {ri} referenced by {holder}"))]
    AcpLookup { ri: String, holder: String },
}

pub type Result<T, E = AccessError> = std::result::Result<T, E>;

/// Deployment-wide access-control configuration consulted by `has_access`.
#[derive(Clone, Debug)]
pub struct AccessConfig {
    pub admin_originator: String,
    pub full_access_admin: bool,
    pub allowed_ae_originators: Vec<String>,
    pub allowed_csr_originators: Vec<String>,
    pub registrar_csi: Option<String>,
    pub inherit_acp: bool,
    pub acp_checks_disabled: bool,
}

impl Default for AccessConfig {
    fn default() -> Self {
        AccessConfig {
            admin_originator: "CAdmin".to_string(),
            full_access_admin: true,
            allowed_ae_originators: vec!["*".to_string()],
            allowed_csr_originators: vec![],
            registrar_csi: None,
            inherit_acp: true,
            acp_checks_disabled: false,
        }
    }
}

/// Extra context an evaluation needs beyond `(originator, resource, op)`.
#[derive(Debug, Default)]
pub struct AccessContext<'a> {
    /// Evaluate against the ACP's `pvs` (self-privileges) instead of `pv`.
    pub check_self: bool,
    /// The child type being created, when `op == Create`.
    pub ty: Option<ResourceType>,
    /// The parent resource, required for CREATE checks and ACP inheritance.
    pub parent: Option<&'a Resource>,
}

/// Evaluates whether `originator` may perform `op` against `resource`,
/// consulting `store` to resolve any ACPs named in `resource.meta.acpi`.
///
/// Evaluation order (first match grants; later steps are reached only when
/// an earlier one doesn't apply):
/// 1. ACP checks disabled -> grant.
/// 2. Admin originator with full access -> grant.
/// 3. CREATE of AE -> grant per registration policy.
/// 4. CREATE of CSR/Announced -> grant per registration policy.
/// 5. RETRIEVE of the CSEBase -> grant broadly to registered peers.
/// 6. Group with `macp` set -> evaluate against `macp` instead of `acpi`.
/// 7. ACP/ACPAnnc -> evaluate against its own `pvs`.
/// 8. SUB on CREATE -> additionally requires RETRIEVE on the parent.
/// 9. No `acpi` but the type supports it -> grant to holder/creator only.
/// 10. No `acpi` support, inheritance on -> recurse on the parent.
/// 11. Otherwise iterate `acpi`, granting on first match.
pub async fn has_access(
    store: &dyn ResourceStore,
    config: &AccessConfig,
    originator: &str,
    resource: &Resource,
    op: Operation,
    ctx: &AccessContext<'_>,
) -> Result<bool> {
    if config.acp_checks_disabled {
        return Ok(true);
    }
    if originator == config.admin_originator && config.full_access_admin {
        return Ok(true);
    }

    let ty = resource.ty();

    if op == Operation::Create && ctx.ty == Some(ResourceType::Ae) {
        return Ok(originator.is_empty()
            || originator == "C"
            || originator == "S"
            || is_allowed_originator(originator, &config.allowed_ae_originators));
    }

    if op == Operation::Create
        && matches!(ctx.ty, Some(ResourceType::RemoteCse) | Some(ResourceType::Announced(_)))
    {
        if is_allowed_originator(originator, &config.allowed_csr_originators) {
            return Ok(true);
        }
        if let Some(parent) = ctx.parent {
            if matches!(ctx.ty, Some(ResourceType::Announced(_))) && cse_types::stem(originator) == parent.meta.ri {
                return Ok(true);
            }
        }
        return Ok(false);
    }

    if op == Operation::Retrieve && ty == ResourceType::CseBase {
        let registered = !originator.is_empty() && originator != "C" && originator != "S";
        let is_registrar = config.registrar_csi.as_deref() == Some(originator);
        if registered || is_registrar || is_allowed_originator(originator, &config.allowed_csr_originators) {
            return Ok(true);
        }
    }

    let perm = Permission::from(op);

    if let Some(group) = resource.body.as_group() {
        if !group.macp.is_empty() {
            return evaluate_acp_list(store, &group.macp, originator, perm, ctx.ty).await;
        }
    }

    if let Some(acp) = resource.body.as_acp() {
        let records = if ctx.check_self { &acp.pvs } else { &acp.pv };
        return Ok(evaluate_records(records, originator, perm, ctx.ty));
    }

    if op == Operation::Create && ty == ResourceType::Subscription {
        if let Some(parent) = ctx.parent {
            let retrieve_ctx = AccessContext {
                check_self: false,
                ty: None,
                parent: None,
            };
            if !Box::pin(has_access(store, config, originator, parent, Operation::Retrieve, &retrieve_ctx)).await? {
                return Ok(false);
            }
        }
    }

    if resource.meta.acpi.is_empty() {
        if ty.supports_acpi() {
            let holder_match = resource.meta.cr.as_deref() == Some(originator);
            return Ok(holder_match);
        }
        if config.inherit_acp {
            if let Some(parent) = ctx.parent {
                return Box::pin(has_access(store, config, originator, parent, op, ctx)).await;
            }
        }
        return Ok(false);
    }

    evaluate_acp_list(store, &resource.meta.acpi, originator, perm, ctx.ty).await
}

async fn evaluate_acp_list(
    store: &dyn ResourceStore,
    acpi: &[String],
    originator: &str,
    perm: Permission,
    ty: Option<ResourceType>,
) -> Result<bool> {
    for acp_ri in acpi {
        match store.get(acp_ri).await {
            Ok(acp_resource) => {
                if let Some(acp) = acp_resource.body.as_acp() {
                    if evaluate_records(&acp.pv, originator, perm, ty) {
                        return Ok(true);
                    }
                }
            }
            Err(_) => {
                warn!(acp_ri, "referenced ACP not found, skipping");
            }
        }
    }
    Ok(false)
}

fn evaluate_records(records: &[PermissionRecord], originator: &str, perm: Permission, ty: Option<ResourceType>) -> bool {
    records.iter().any(|record| {
        record.operations.contains(perm)
            && record
                .originators
                .iter()
                .any(|pattern| matches_originator(originator, pattern))
            && record.ty_filter.as_ref().is_none_or(|filter| Some(filter) == ty.as_ref())
    })
}

/// Authorization rule for an UPDATE request that touches `acpi`: such a
/// request must set `acpi` exclusively; authorization requires either no
/// prior `acpi` (only the creator may set one) or that one of the currently
/// listed ACPs grants UPDATE to the originator.
pub async fn check_acpi_update(
    store: &dyn ResourceStore,
    resource: &Resource,
    originator: &str,
) -> Result<bool> {
    if resource.meta.acpi.is_empty() {
        return Ok(resource.meta.cr.as_deref() == Some(originator));
    }
    evaluate_acp_list(store, &resource.meta.acpi, originator, Permission::UPDATE, None).await
}

/// An ACP body restricted to being checked for no reason other than its own
/// `pv`/`pvs`, exposed for callers (e.g. `cse-dispatch`) that already hold
/// the ACP in hand and don't need a store round-trip.
pub fn acp_grants(acp: &AcpBody, originator: &str, perm: Permission, check_self: bool) -> bool {
    let records = if check_self { &acp.pvs } else { &acp.pv };
    evaluate_records(records, originator, perm, None)
}
