use std::sync::Arc;

use cse_access::{AccessConfig, AccessContext};
use cse_notify::{EventType, NotifyEngine};
use cse_registration::RegistrationConfig;
use cse_resource::{AttributePolicy, ChildOutcome, Resource, ResourceBody, ResourceMeta};
use cse_storage::{ResourceStore, SearchCriteria};
use cse_types::{Filters, Operation, Request, Response, ResourceType, Rsc};
use serde_json::{Map, Value, json};
use tracing::instrument;

use crate::config::DispatchConfig;
use crate::error::DispatchError;
use crate::events::{CoreEvent, EventBus};
use crate::resolve::{ResolvedTarget, VirtualKind, resolve_path};
use crate::transit;

/// Ties the resource model, storage facade, access-control engine,
/// registration manager, and notification engine together into the
/// CRUD/discovery pipelines a request travels through.
pub struct Dispatcher {
    store: Arc<dyn ResourceStore>,
    access: AccessConfig,
    registration: RegistrationConfig,
    notify: Arc<NotifyEngine>,
    events: Arc<EventBus>,
    http: reqwest::Client,
    config: DispatchConfig,
}

impl Dispatcher {
    pub fn new(
        store: Arc<dyn ResourceStore>,
        access: AccessConfig,
        registration: RegistrationConfig,
        notify: Arc<NotifyEngine>,
        events: Arc<EventBus>,
        config: DispatchConfig,
    ) -> Self {
        Dispatcher {
            store,
            access,
            registration,
            notify,
            events,
            http: reqwest::Client::new(),
            config,
        }
    }

    /// Top-level entry point: resolves `request.to`, routes to the matching
    /// pipeline, and folds every failure into an error [`Response`] so the
    /// gateway always has something to render back to the originator.
    #[instrument(skip(self, request), fields(op = ?request.op, to = %request.to))]
    pub async fn handle(&self, request: Request) -> Response {
        if request.rvi != self.config.rvi {
            return Response::error(
                request.rqi.clone(),
                self.config.rvi.clone(),
                Rsc::ReleaseVersionNotSupported,
                format!("unsupported release version {}", request.rvi),
            );
        }

        if let Some(ret) = request.ret {
            if ret < cse_types::Timestamp::now() {
                return self.to_error_response(&request, DispatchError::RequestTimeout);
            }
        }

        let resolved = match resolve_path(self.store.as_ref(), &self.config.cse_csi, &self.config.cse_ri, &self.config.cse_rn, &request.to).await {
            Ok(resolved) => resolved,
            Err(err) => return self.to_error_response(&request, err),
        };

        let result = if let ResolvedTarget::Transit { csi, remainder } = &resolved {
            self.transit(&request, csi, remainder).await
        } else {
            match request.op {
                Operation::Create => self.create(&request, &resolved).await,
                Operation::Retrieve => self.retrieve(&request, &resolved).await,
                Operation::Update => self.update(&request, &resolved).await,
                Operation::Delete => self.delete(&request, &resolved).await,
                Operation::Notify => Err(DispatchError::NotAllowed {
                    reason: "NOTIFY is not a dispatchable request operation".to_string(),
                }),
            }
        };

        match result {
            Ok(response) => response,
            Err(err) => self.to_error_response(&request, err),
        }
    }

    fn to_error_response(&self, request: &Request, err: DispatchError) -> Response {
        Response::error(request.rqi.clone(), request.rvi.clone(), err.rsc(), err.to_string())
    }

    async fn transit(&self, request: &Request, csi: &str, remainder: &str) -> Result<Response, DispatchError> {
        let csr = self.find_csr_by_csi(csi).await.ok_or(DispatchError::TargetNotReachable)?;
        transit::forward(&self.http, &csr, remainder, request).await
    }

    async fn find_csr_by_csi(&self, csi: &str) -> Option<Resource> {
        let children = self.store.children(&self.config.cse_ri, Some(ResourceType::RemoteCse)).await.ok()?;
        children.into_iter().find(|r| r.body.as_remote_cse().is_some_and(|b| b.csi == csi))
    }

    /// Evaluates access against `resource`, fetching its parent (for ACP
    /// inheritance) when one exists. Not used for CREATE, where the
    /// resource under evaluation is the parent the new child is added to.
    async fn check_access(&self, originator: &str, resource: &Resource, op: Operation) -> Result<bool, DispatchError> {
        let parent = if resource.meta.pi.is_empty() {
            None
        } else {
            self.store.get(&resource.meta.pi).await.ok()
        };
        let ctx = AccessContext {
            check_self: false,
            ty: None,
            parent: parent.as_ref(),
        };
        cse_access::has_access(self.store.as_ref(), &self.access, originator, resource, op, &ctx)
            .await
            .map_err(|_| DispatchError::NoPrivilege)
    }

    // ---- CREATE --------------------------------------------------------

    async fn create(&self, request: &Request, resolved: &ResolvedTarget) -> Result<Response, DispatchError> {
        let parent_ri = match resolved {
            ResolvedTarget::Local { ri } => ri.clone(),
            ResolvedTarget::Virtual { .. } => {
                return Err(DispatchError::NotAllowed {
                    reason: "cannot create under a virtual resource".to_string(),
                });
            }
            ResolvedTarget::Transit { .. } => unreachable!("transit is routed before reaching create"),
        };
        let mut parent = self.store.get(&parent_ri).await?;
        let ty = request.ty.clone().ok_or(DispatchError::NotAllowed {
            reason: "CREATE requires ty".to_string(),
        })?;

        let access_ctx = AccessContext {
            check_self: false,
            ty: Some(ty.clone()),
            parent: Some(&parent),
        };
        let allowed = cse_access::has_access(self.store.as_ref(), &self.access, &request.originator, &parent, Operation::Create, &access_ctx)
            .await
            .map_err(|_| DispatchError::NoPrivilege)?;
        if !allowed {
            return Err(DispatchError::NoPrivilege);
        }

        let body_map = request.body.as_object().cloned().unwrap_or_default();
        let policy = attribute_policy(&ty);
        cse_resource::validate_on_create(&policy, &body_map)?;

        let rn = body_map
            .get("rn")
            .and_then(Value::as_str)
            .map(str::to_string)
            .unwrap_or_else(|| generate_rn(&ty));
        if self.store.get_by_name(&parent.meta.ri, &rn).await.is_ok() {
            return Err(DispatchError::AlreadyExists { rn });
        }

        let now = cse_types::Timestamp::now();
        let mut meta = ResourceMeta {
            ri: format!("{}-{}", short_type_tag(&ty), cse_registration::unique_aei("")),
            rn,
            pi: parent.meta.ri.clone(),
            ct: now,
            lt: now,
            et: None,
            acpi: extract_string_list(&body_map, "acpi"),
            lbl: extract_string_list(&body_map, "lbl"),
            at: vec![],
            aa: vec![],
            cr: None,
        };
        let mut body = build_body(&ty, &body_map)?;

        let mut originator = request.originator.clone();
        match &mut body {
            ResourceBody::Ae(ae_body) => {
                originator =
                    cse_registration::handle_ae_registration(self.store.as_ref(), &self.registration, &mut meta, ae_body, &request.originator, &parent, now).await?;
            }
            ResourceBody::RemoteCse(_) => {
                cse_registration::handle_csr_registration(self.store.as_ref(), &self.registration, &mut meta, &originator, &mut parent, now).await?;
            }
            _ => {}
        }
        cse_registration::handle_creator(&mut meta, ty.clone(), &originator, &self.registration)?;

        let resource = Resource { meta, body };

        if let ChildOutcome::Reject(reason) = child_will_be_added(&parent, &resource) {
            return Err(DispatchError::NotAllowed { reason: reason.to_string() });
        }

        self.store.put(resource.clone()).await?;

        if ty.is_instance() {
            self.enforce_instance_quota(&mut parent).await?;
        }
        if ty == ResourceType::Subscription {
            self.notify.register(&parent.meta.ri, &resource.meta.ri).await;
        }

        let snapshot = serde_json::to_value(&resource).unwrap_or(Value::Null);
        self.notify.emit(&parent.meta.ri, EventType::CreateOfDirectChild, &snapshot).await;
        self.events.publish(CoreEvent::CreateResource {
            ri: resource.meta.ri.clone(),
            snapshot: snapshot.clone(),
        });

        Ok(Response {
            rsc: Rsc::Created,
            rqi: request.rqi.clone(),
            rvi: request.rvi.clone(),
            body: Some(snapshot),
            dbg: None,
        })
    }

    // ---- RETRIEVE / DISCOVERY ------------------------------------------

    async fn retrieve(&self, request: &Request, resolved: &ResolvedTarget) -> Result<Response, DispatchError> {
        match resolved {
            ResolvedTarget::Local { ri } => {
                if has_discovery_filters(&request.filters) {
                    return self.discover(request, ri).await;
                }
                let resource = self.store.get(ri).await?;
                if !self.check_access(&request.originator, &resource, Operation::Retrieve).await? {
                    return Err(DispatchError::NoPrivilege);
                }
                let body = serde_json::to_value(&resource).unwrap_or(Value::Null);
                Ok(Response::ok(request.rqi.clone(), request.rvi.clone(), body))
            }
            ResolvedTarget::Virtual { parent_ri, kind } => self.retrieve_virtual(request, parent_ri, *kind).await,
            ResolvedTarget::Transit { .. } => unreachable!("transit is routed before reaching retrieve"),
        }
    }

    async fn retrieve_virtual(&self, request: &Request, parent_ri: &str, kind: VirtualKind) -> Result<Response, DispatchError> {
        let parent = self.store.get(parent_ri).await?;
        if !self.check_access(&request.originator, &parent, Operation::Retrieve).await? {
            return Err(DispatchError::NoPrivilege);
        }
        let instance_ty = instance_type_of(parent.ty());
        let mut children = self.store.children(parent_ri, Some(instance_ty)).await?;
        if children.is_empty() {
            self.notify.emit(parent_ri, EventType::RetrieveOfContainerWithNoChildren, &Value::Null).await;
            let leaf = if kind == VirtualKind::Latest { "la" } else { "ol" };
            return Err(DispatchError::NotFound {
                target: format!("{parent_ri}/{leaf}"),
            });
        }
        let chosen = match kind {
            VirtualKind::Latest => children.pop().expect("non-empty checked above"),
            VirtualKind::Oldest => children.remove(0),
        };
        let body = serde_json::to_value(&chosen).unwrap_or(Value::Null);
        Ok(Response::ok(request.rqi.clone(), request.rvi.clone(), body))
    }

    async fn discover(&self, request: &Request, root_ri: &str) -> Result<Response, DispatchError> {
        let root = self.store.get(root_ri).await?;
        if !self.check_access(&request.originator, &root, Operation::Retrieve).await? {
            return Err(DispatchError::NoPrivilege);
        }
        let criteria = SearchCriteria {
            root: root_ri.to_string(),
            ty: request.filters.ty.clone(),
            labels: request.filters.labels.clone(),
            created_after: request.filters.created_after,
            created_before: request.filters.created_before,
            attributes: request.filters.attributes.clone(),
            limit: request.filters.limit.or(Some(self.config.discovery_default_limit)),
            level: request.filters.level,
        };
        let candidates = self.store.search(&criteria).await?;
        let mut uril = Vec::with_capacity(candidates.len());
        for candidate in candidates {
            if self
                .check_access(&request.originator, &candidate, Operation::Retrieve)
                .await
                .unwrap_or(false)
            {
                uril.push(candidate.meta.ri);
            }
        }
        Ok(Response::ok(request.rqi.clone(), request.rvi.clone(), json!({ "uril": uril })))
    }

    // ---- UPDATE ----------------------------------------------------------

    async fn update(&self, request: &Request, resolved: &ResolvedTarget) -> Result<Response, DispatchError> {
        let ri = match resolved {
            ResolvedTarget::Local { ri } => ri.clone(),
            ResolvedTarget::Virtual { .. } => {
                return Err(DispatchError::NotAllowed {
                    reason: "virtual resources cannot be updated".to_string(),
                });
            }
            ResolvedTarget::Transit { .. } => unreachable!("transit is routed before reaching update"),
        };
        let mut resource = self.store.get(&ri).await?;
        let patch = request.body.as_object().cloned().unwrap_or_default();

        let touches_acpi = patch.contains_key("acpi");
        if touches_acpi && patch.len() > 1 {
            return Err(DispatchError::AcpiUpdateMustBeExclusive);
        }

        let allowed = if touches_acpi {
            cse_access::check_acpi_update(self.store.as_ref(), &resource, &request.originator)
                .await
                .map_err(|_| DispatchError::NoPrivilege)?
        } else {
            self.check_access(&request.originator, &resource, Operation::Update).await?
        };
        if !allowed {
            return Err(DispatchError::NoPrivilege);
        }

        let ty = resource.ty();
        let policy = attribute_policy(&ty);
        cse_resource::validate_on_update(&policy, &patch)?;

        if touches_acpi {
            resource.meta.acpi = extract_string_list(&patch, "acpi");
        } else {
            apply_patch(&mut resource.body, &patch)?;
            if let Some(lbl) = patch.get("lbl") {
                resource.meta.lbl = lbl
                    .as_array()
                    .map(|items| items.iter().filter_map(|v| v.as_str().map(str::to_string)).collect())
                    .unwrap_or_default();
            }
        }
        resource.meta.lt = cse_types::Timestamp::now();

        if let ResourceBody::FlexContainer(fc) = &mut resource.body {
            fc.cs = cse_resource::canonical_size(&fc.custom);
        }
        self.store.put(resource.clone()).await?;

        if let ResourceBody::FlexContainer(fc) = &resource.body {
            if fc.mni.is_some() || fc.mbs.is_some() {
                let snapshot_body = cse_resource::snapshot_instance(fc);
                let snapshot_resource = Resource {
                    meta: ResourceMeta {
                        ri: format!("fci-{}", cse_registration::unique_aei("")),
                        rn: format!("fci_{}", cse_registration::unique_aei("")),
                        pi: resource.meta.ri.clone(),
                        ct: resource.meta.lt,
                        lt: resource.meta.lt,
                        et: None,
                        acpi: vec![],
                        lbl: vec![],
                        at: vec![],
                        aa: vec![],
                        cr: resource.meta.cr.clone(),
                    },
                    body: ResourceBody::FlexContainerInstance(snapshot_body),
                };
                self.store.put(snapshot_resource).await?;
                self.enforce_instance_quota(&mut resource).await?;
            }
        }

        let snapshot = serde_json::to_value(&resource).unwrap_or(Value::Null);
        self.notify.emit(&resource.meta.ri, EventType::UpdateOfResource, &snapshot).await;
        self.events.publish(CoreEvent::UpdateResource {
            ri: resource.meta.ri.clone(),
            snapshot: snapshot.clone(),
        });

        Ok(Response {
            rsc: Rsc::Updated,
            rqi: request.rqi.clone(),
            rvi: request.rvi.clone(),
            body: Some(snapshot),
            dbg: None,
        })
    }

    // ---- DELETE ----------------------------------------------------------

    async fn delete(&self, request: &Request, resolved: &ResolvedTarget) -> Result<Response, DispatchError> {
        let ri = match resolved {
            ResolvedTarget::Local { ri } => ri.clone(),
            ResolvedTarget::Virtual { .. } => {
                return Err(DispatchError::NotAllowed {
                    reason: "virtual resources cannot be deleted".to_string(),
                });
            }
            ResolvedTarget::Transit { .. } => unreachable!("transit is routed before reaching delete"),
        };
        let resource = self.store.get(&ri).await?;
        if !self.check_access(&request.originator, &resource, Operation::Delete).await? {
            return Err(DispatchError::NoPrivilege);
        }

        match resource.ty() {
            ResourceType::Ae => {
                cse_registration::handle_ae_deregistration(self.store.as_ref(), &self.registration, &resource).await?;
            }
            ResourceType::RemoteCse => {
                if let Ok(mut local_cse) = self.store.get(&resource.meta.pi).await {
                    cse_registration::handle_csr_deregistration(self.store.as_ref(), &self.registration, &resource, &mut local_cse).await?;
                }
            }
            ResourceType::Subscription => {
                self.notify.unregister(&resource.meta.pi, &ri).await;
            }
            _ => {}
        }

        Box::pin(self.delete_subtree(&ri)).await?;
        self.store.delete(&ri).await?;

        let parent_ri = resource.meta.pi.clone();
        if resource.ty().is_instance() {
            if let Ok(mut parent) = self.store.get(&parent_ri).await {
                self.enforce_instance_quota(&mut parent).await?;
            }
        }

        self.notify.emit(&parent_ri, EventType::DeleteOfDirectChild, &json!({ "ri": ri })).await;
        self.events.publish(CoreEvent::DeleteResource { ri: ri.clone() });

        Ok(Response {
            rsc: Rsc::Deleted,
            rqi: request.rqi.clone(),
            rvi: request.rvi.clone(),
            body: None,
            dbg: None,
        })
    }

    async fn delete_subtree(&self, ri: &str) -> Result<(), DispatchError> {
        let children = self.store.children(ri, None).await.unwrap_or_default();
        for child in children {
            Box::pin(self.delete_subtree(&child.meta.ri)).await?;
            let _ = self.store.delete(&child.meta.ri).await;
        }
        Ok(())
    }

    /// Recomputes `cni`/`cbs` for a container-like parent from its current
    /// instance children, evicting oldest-first until both are back within
    /// `mni`/`mbs`.
    async fn enforce_instance_quota(&self, parent: &mut Resource) -> Result<(), DispatchError> {
        let ty = parent.ty();
        if !ty.is_container_like() {
            return Ok(());
        }
        let instance_ty = instance_type_of(ty);
        let children = self.store.children(&parent.meta.ri, Some(instance_ty)).await?;
        let pairs: Vec<(String, u64)> = children.iter().map(|c| (c.meta.ri.clone(), c.body.content_size())).collect();
        let (mni, mbs) = match &parent.body {
            ResourceBody::Container(c) => (c.mni, c.mbs),
            ResourceBody::FlexContainer(fc) => (fc.mni, fc.mbs),
            _ => (None, None),
        };
        let outcome = cse_resource::enforce_quota(&pairs, mni, mbs);
        for evicted_ri in &outcome.evict {
            let _ = self.store.delete(evicted_ri).await;
        }
        match &mut parent.body {
            ResourceBody::Container(c) => {
                c.cni = outcome.cni;
                c.cbs = outcome.cbs;
            }
            ResourceBody::FlexContainer(fc) => {
                fc.cni = outcome.cni;
                fc.cbs = outcome.cbs;
            }
            _ => {}
        }
        self.store.put(parent.clone()).await?;
        Ok(())
    }
}

fn instance_type_of(parent_ty: ResourceType) -> ResourceType {
    if parent_ty == ResourceType::Container {
        ResourceType::ContentInstance
    } else {
        ResourceType::FlexContainerInstance
    }
}

fn has_discovery_filters(filters: &Filters) -> bool {
    filters.ty.is_some() || !filters.labels.is_empty() || !filters.attributes.is_empty() || filters.created_after.is_some() || filters.created_before.is_some()
}

/// The parent's veto for a child about to be inserted underneath it. Kept as
/// a plain function matched on type rather than a trait object per the
/// resource model's capability-table design (see `cse-resource::lifecycle`):
/// the set of resource kinds is closed, so a match expression here already
/// gives every call site exhaustiveness checking for free.
fn child_will_be_added(parent: &Resource, child: &Resource) -> ChildOutcome {
    if parent.ty().is_container_like() && matches!(child.meta.rn.as_str(), "la" | "ol") {
        return ChildOutcome::Reject("rn la/ol is reserved for the virtual latest/oldest child");
    }
    if child.ty().is_instance() {
        let mni = match &parent.body {
            ResourceBody::Container(c) => c.mni,
            ResourceBody::FlexContainer(fc) => fc.mni,
            _ => None,
        };
        if mni == Some(0) {
            return ChildOutcome::Reject("container capacity is zero");
        }
    }
    ChildOutcome::Allow
}

fn extract_string_list(map: &Map<String, Value>, key: &str) -> Vec<String> {
    map.get(key)
        .and_then(Value::as_array)
        .map(|items| items.iter().filter_map(|v| v.as_str().map(str::to_string)).collect())
        .unwrap_or_default()
}

/// Builds a typed [`ResourceBody`] from a raw attribute map by re-wrapping it
/// in the same `{"ty": ..., "body": ...}` shape [`ResourceBody`]'s internally
/// tagged representation already expects, then letting serde do the work.
fn build_body(ty: &ResourceType, body_map: &Map<String, Value>) -> Result<ResourceBody, DispatchError> {
    let tag = resource_body_tag(ty)?;
    let envelope = json!({ "ty": tag, "body": Value::Object(body_map.clone()) });
    serde_json::from_value(envelope).map_err(|source| DispatchError::NotAllowed {
        reason: format!("malformed body for {tag}: {source}"),
    })
}

/// Applies a raw patch map on top of an existing body by merging it into the
/// body's current JSON representation before re-deserializing, so unset
/// fields retain their previous value rather than resetting to default.
fn apply_patch(body: &mut ResourceBody, patch: &Map<String, Value>) -> Result<(), DispatchError> {
    let ty = body.ty();
    let tag = resource_body_tag(&ty)?;
    let current = serde_json::to_value(&*body).map_err(|source| DispatchError::NotAllowed { reason: source.to_string() })?;
    let mut merged = current.get("body").and_then(Value::as_object).cloned().unwrap_or_default();
    for (key, value) in patch {
        if key == "lbl" || key == "acpi" {
            continue;
        }
        merged.insert(key.clone(), value.clone());
    }
    let envelope = json!({ "ty": tag, "body": Value::Object(merged) });
    *body = serde_json::from_value(envelope).map_err(|source| DispatchError::NotAllowed {
        reason: format!("malformed patch for {tag}: {source}"),
    })?;
    Ok(())
}

fn resource_body_tag(ty: &ResourceType) -> Result<&'static str, DispatchError> {
    Ok(match ty {
        ResourceType::CseBase => "CseBase",
        ResourceType::Ae => "Ae",
        ResourceType::Container => "Container",
        ResourceType::ContentInstance => "ContentInstance",
        ResourceType::AccessControlPolicy => "AccessControlPolicy",
        ResourceType::FlexContainer => "FlexContainer",
        ResourceType::FlexContainerInstance => "FlexContainerInstance",
        ResourceType::Group => "Group",
        ResourceType::Subscription => "Subscription",
        ResourceType::RemoteCse => "RemoteCse",
        ResourceType::Mgmt(_) | ResourceType::Announced(_) => {
            return Err(DispatchError::NotAllowed {
                reason: format!("{ty} has no storable resource body in this core"),
            });
        }
    })
}

fn short_type_tag(ty: &ResourceType) -> &'static str {
    match ty {
        ResourceType::CseBase => "cb",
        ResourceType::Ae => "ae",
        ResourceType::Container => "cnt",
        ResourceType::ContentInstance => "cin",
        ResourceType::AccessControlPolicy => "acp",
        ResourceType::FlexContainer => "fcnt",
        ResourceType::FlexContainerInstance => "fci",
        ResourceType::Group => "grp",
        ResourceType::Subscription => "sub",
        ResourceType::RemoteCse => "csr",
        ResourceType::Mgmt(_) => "mgmt",
        ResourceType::Announced(_) => "ann",
    }
}

fn generate_rn(ty: &ResourceType) -> String {
    format!("{}_{}", short_type_tag(ty), cse_registration::unique_aei(""))
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use cse_access::AccessConfig;
    use cse_notify::{NotifyConfig, NotifyEngine};
    use cse_registration::RegistrationConfig;
    use cse_resource::body::CseBaseBody;
    use cse_storage::InMemoryStore;
    use cse_types::{MgmtObjKind, Permission};

    use super::*;

    const CSE_RI: &str = "cse-in";
    const CSE_RN: &str = "cse-in";
    const CSE_CSI: &str = "in-cse";
    const RVI: &str = "3";

    fn base_request(op: Operation, to: &str, originator: &str, ty: Option<ResourceType>, body: Value) -> Request {
        Request {
            op,
            to: to.to_string(),
            originator: originator.to_string(),
            rqi: "rqi-1".to_string(),
            rvi: RVI.to_string(),
            ty,
            body,
            filters: Filters::default(),
            ec: None,
            ret: None,
            vsi: None,
            accept: None,
        }
    }

    async fn new_dispatcher() -> Dispatcher {
        let store: Arc<dyn ResourceStore> = Arc::new(InMemoryStore::new());
        let now = cse_types::Timestamp::now();
        store
            .put(Resource {
                meta: ResourceMeta {
                    ri: CSE_RI.to_string(),
                    rn: CSE_RN.to_string(),
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
                    csi: CSE_CSI.to_string(),
                    cst: 1,
                    csz: vec!["application/json".to_string()],
                    srt: vec![],
                    poa: vec![],
                    dcse: vec![],
                }),
            })
            .await
            .unwrap();

        let access = AccessConfig {
            admin_originator: "CAdmin".to_string(),
            full_access_admin: true,
            allowed_ae_originators: vec!["*".to_string()],
            allowed_csr_originators: vec!["*".to_string()],
            registrar_csi: None,
            inherit_acp: true,
            acp_checks_disabled: false,
        };
        let registration = RegistrationConfig {
            cse_originator: "CAdmin".to_string(),
            acp_prefix: "acp".to_string(),
            default_ae_permission: Permission::CREATE.union(Permission::RETRIEVE).union(Permission::UPDATE).union(Permission::DELETE),
            acp_self_permission: Permission::RETRIEVE.union(Permission::UPDATE),
            allowed_ae_originators: vec!["*".to_string()],
            creator_allowed_types: vec![ResourceType::Container, ResourceType::ContentInstance, ResourceType::Subscription],
        };
        let notify = NotifyEngine::new(Arc::clone(&store), NotifyConfig::default());
        let events = Arc::new(EventBus::default());
        let config = DispatchConfig {
            cse_csi: CSE_CSI.to_string(),
            cse_ri: CSE_RI.to_string(),
            cse_rn: CSE_RN.to_string(),
            cse_originator: "CAdmin".to_string(),
            rvi: RVI.to_string(),
            discovery_default_limit: 1000,
        };

        Dispatcher::new(store, access, registration, notify, events, config)
    }

    #[tokio::test]
    async fn unsupported_release_version_is_rejected_before_resolution() {
        let dispatcher = new_dispatcher().await;
        let mut request = base_request(Operation::Retrieve, CSE_RN, "CAdmin", None, Value::Null);
        request.rvi = "1".to_string();

        let response = dispatcher.handle(request).await;
        assert_eq!(response.rsc, Rsc::ReleaseVersionNotSupported);
    }

    #[tokio::test]
    async fn create_ae_then_retrieve_round_trips() {
        let dispatcher = new_dispatcher().await;
        let create = base_request(
            Operation::Create,
            CSE_RN,
            "Cmyapp",
            Some(ResourceType::Ae),
            json!({ "api": "N.example.app", "rn": "myapp" }),
        );

        let created = dispatcher.handle(create).await;
        assert_eq!(created.rsc, Rsc::Created);
        let ri = created.body.as_ref().unwrap()["meta"]["ri"].as_str().unwrap().to_string();

        let retrieve = base_request(Operation::Retrieve, &ri, "CAdmin", None, Value::Null);
        let retrieved = dispatcher.handle(retrieve).await;
        assert_eq!(retrieved.rsc, Rsc::Ok);
        assert_eq!(retrieved.body.unwrap()["body"]["body"]["api"], "N.example.app");
    }

    #[tokio::test]
    async fn create_with_unsupported_type_is_rejected() {
        let dispatcher = new_dispatcher().await;
        let create = base_request(Operation::Create, CSE_RN, "CAdmin", Some(ResourceType::Mgmt(MgmtObjKind::Firmware)), json!({}));

        let response = dispatcher.handle(create).await;
        assert_eq!(response.rsc, Rsc::OperationNotAllowed);
    }

    #[tokio::test]
    async fn container_instance_quota_evicts_oldest() {
        let dispatcher = new_dispatcher().await;

        let create_container = base_request(
            Operation::Create,
            CSE_RN,
            "CAdmin",
            Some(ResourceType::Container),
            json!({ "rn": "data", "mni": 2 }),
        );
        let container = dispatcher.handle(create_container).await;
        assert_eq!(container.rsc, Rsc::Created);
        let container_ri = container.body.unwrap()["meta"]["ri"].as_str().unwrap().to_string();

        for i in 0..3 {
            let create_instance = base_request(
                Operation::Create,
                &container_ri,
                "CAdmin",
                Some(ResourceType::ContentInstance),
                json!({ "con": format!("payload-{i}") }),
            );
            let response = dispatcher.handle(create_instance).await;
            assert_eq!(response.rsc, Rsc::Created);
        }

        let retrieve_container = base_request(Operation::Retrieve, &container_ri, "CAdmin", None, Value::Null);
        let retrieved = dispatcher.handle(retrieve_container).await;
        assert_eq!(retrieved.body.unwrap()["body"]["body"]["cni"].as_u64(), Some(2));
    }

    #[tokio::test]
    async fn creating_la_under_a_container_is_rejected() {
        let dispatcher = new_dispatcher().await;

        let create_container = base_request(
            Operation::Create,
            CSE_RN,
            "CAdmin",
            Some(ResourceType::Container),
            json!({ "rn": "data" }),
        );
        let container = dispatcher.handle(create_container).await;
        assert_eq!(container.rsc, Rsc::Created);
        let container_ri = container.body.unwrap()["meta"]["ri"].as_str().unwrap().to_string();

        let create_la = base_request(
            Operation::Create,
            &container_ri,
            "CAdmin",
            Some(ResourceType::ContentInstance),
            json!({ "rn": "la", "con": "x" }),
        );
        let response = dispatcher.handle(create_la).await;
        assert_eq!(response.rsc, Rsc::OperationNotAllowed);
    }

    #[tokio::test]
    async fn request_past_its_expiration_is_rejected_before_resolution() {
        let dispatcher = new_dispatcher().await;
        let mut request = base_request(Operation::Retrieve, CSE_RN, "CAdmin", None, Value::Null);
        request.ret = Some(cse_types::Timestamp::UNIX_EPOCH);

        let response = dispatcher.handle(request).await;
        assert_eq!(response.rsc, Rsc::RequestTimeout);
    }

    #[tokio::test]
    async fn delete_ae_cleans_up_registration_state() {
        let dispatcher = new_dispatcher().await;
        let create = base_request(
            Operation::Create,
            CSE_RN,
            "Cmyapp",
            Some(ResourceType::Ae),
            json!({ "api": "N.example.app", "rn": "myapp" }),
        );
        let created = dispatcher.handle(create).await;
        let ri = created.body.unwrap()["meta"]["ri"].as_str().unwrap().to_string();

        let delete = base_request(Operation::Delete, &ri, "CAdmin", None, Value::Null);
        let response = dispatcher.handle(delete).await;
        assert_eq!(response.rsc, Rsc::Deleted);

        let retrieve = base_request(Operation::Retrieve, &ri, "CAdmin", None, Value::Null);
        let missing = dispatcher.handle(retrieve).await;
        assert_eq!(missing.rsc, Rsc::NotFound);
    }

    #[tokio::test]
    async fn transit_target_is_forwarded_not_resolved_locally() {
        let dispatcher = new_dispatcher().await;
        let request = base_request(Operation::Retrieve, "//sp.example.com/other-cse/container", "CAdmin", None, Value::Null);

        let response = dispatcher.handle(request).await;
        assert_eq!(response.rsc, Rsc::TargetNotReachable);
    }

    #[tokio::test]
    async fn unknown_resource_is_not_found() {
        let dispatcher = new_dispatcher().await;
        let request = base_request(Operation::Retrieve, "does-not-exist", "CAdmin", None, Value::Null);

        let response = dispatcher.handle(request).await;
        assert_eq!(response.rsc, Rsc::NotFound);
    }
}

fn attribute_policy(ty: &ResourceType) -> AttributePolicy {
    match ty {
        ResourceType::Ae => AttributePolicy {
            ty: ResourceType::Ae,
            mandatory_on_create: &["api"],
            allowed_on_update: &["lbl", "rr", "srv"],
            read_only: &["aei"],
            internal: &["cr"],
        },
        ResourceType::Container => AttributePolicy {
            ty: ResourceType::Container,
            mandatory_on_create: &[],
            allowed_on_update: &["lbl", "mni", "mbs", "mia", "acpi"],
            read_only: &["cni", "cbs"],
            internal: &["cr"],
        },
        ResourceType::ContentInstance => AttributePolicy {
            ty: ResourceType::ContentInstance,
            mandatory_on_create: &["con"],
            allowed_on_update: &[],
            read_only: &["cs"],
            internal: &["cr"],
        },
        ResourceType::AccessControlPolicy => AttributePolicy {
            ty: ResourceType::AccessControlPolicy,
            mandatory_on_create: &["pv", "pvs"],
            allowed_on_update: &["pv", "pvs", "lbl"],
            read_only: &[],
            internal: &["created_internally_for"],
        },
        ResourceType::FlexContainer => AttributePolicy {
            ty: ResourceType::FlexContainer,
            mandatory_on_create: &["cnd"],
            allowed_on_update: &["lbl", "mni", "mbs", "acpi"],
            read_only: &["cni", "cbs", "cs"],
            internal: &["cr"],
        },
        ResourceType::FlexContainerInstance => AttributePolicy {
            ty: ResourceType::FlexContainerInstance,
            mandatory_on_create: &[],
            allowed_on_update: &[],
            read_only: &["cs"],
            internal: &["cr"],
        },
        ResourceType::Group => AttributePolicy {
            ty: ResourceType::Group,
            mandatory_on_create: &["mt", "mid"],
            allowed_on_update: &["lbl", "mid", "mnm", "macp"],
            read_only: &["cnm"],
            internal: &["cr"],
        },
        ResourceType::Subscription => AttributePolicy {
            ty: ResourceType::Subscription,
            mandatory_on_create: &["nu", "enc"],
            allowed_on_update: &["lbl", "nu", "enc", "exc", "nct"],
            read_only: &[],
            internal: &["cr"],
        },
        ResourceType::RemoteCse => AttributePolicy {
            ty: ResourceType::RemoteCse,
            mandatory_on_create: &["csi", "cb"],
            allowed_on_update: &["lbl", "poa", "rr"],
            read_only: &["csi", "cst"],
            internal: &["created_internally_acps", "cr"],
        },
        ResourceType::CseBase | ResourceType::Mgmt(_) | ResourceType::Announced(_) => AttributePolicy {
            ty: ty.clone(),
            mandatory_on_create: &[],
            allowed_on_update: &["lbl", "poa"],
            read_only: &["csi", "cst"],
            internal: &["cr"],
        },
    }
}
