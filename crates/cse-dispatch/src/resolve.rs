use cse_storage::ResourceStore;

use crate::error::DispatchError;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum VirtualKind {
    Latest,
    Oldest,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ResolvedTarget {
    /// A concrete resource already in our tree.
    Local { ri: String },
    /// A virtual `la`/`ol` leaf under a concrete parent.
    Virtual { parent_ri: String, kind: VirtualKind },
    /// Not ours: forward to the named peer CSE.
    Transit { csi: String, remainder: String },
}

/// Resolves a `to` target in any of the four forms the gateway may hand us:
/// unstructured (`ri`), structured (`<cseRn>/a/b/c`), SP-relative
/// (`/<csi>/a/b/c`), or absolute (`//<sp>/<csi>/a/b/c`).
pub async fn resolve_path(store: &dyn ResourceStore, cse_csi: &str, cse_ri: &str, cse_rn: &str, to: &str) -> Result<ResolvedTarget, DispatchError> {
    if let Some(rest) = to.strip_prefix("//") {
        let mut segments = rest.splitn(2, '/');
        let _sp = segments.next().unwrap_or_default();
        let tail = segments.next().unwrap_or_default();
        let mut tail_segments = tail.splitn(2, '/');
        let csi = tail_segments.next().unwrap_or_default();
        let remainder = tail_segments.next().unwrap_or_default();
        return route_by_csi(store, cse_csi, cse_ri, csi, remainder).await;
    }

    if let Some(rest) = to.strip_prefix('/') {
        let mut segments = rest.splitn(2, '/');
        let csi = segments.next().unwrap_or_default();
        let remainder = segments.next().unwrap_or_default();
        return route_by_csi(store, cse_csi, cse_ri, csi, remainder).await;
    }

    let mut parts = to.splitn(2, '/');
    let first = parts.next().unwrap_or_default();
    if first == cse_rn {
        let remainder = parts.next().unwrap_or_default();
        return resolve_structured(store, cse_ri, remainder).await;
    }

    // Unstructured: a bare resource identifier.
    Ok(ResolvedTarget::Local { ri: to.to_string() })
}

async fn route_by_csi(store: &dyn ResourceStore, cse_csi: &str, cse_ri: &str, csi: &str, remainder: &str) -> Result<ResolvedTarget, DispatchError> {
    if csi == cse_csi || csi.is_empty() {
        resolve_structured(store, cse_ri, remainder).await
    } else {
        Ok(ResolvedTarget::Transit {
            csi: csi.to_string(),
            remainder: remainder.to_string(),
        })
    }
}

async fn resolve_structured(store: &dyn ResourceStore, cse_ri: &str, remainder: &str) -> Result<ResolvedTarget, DispatchError> {
    if remainder.is_empty() {
        return Ok(ResolvedTarget::Local { ri: cse_ri.to_string() });
    }
    let segments: Vec<&str> = remainder.split('/').filter(|s| !s.is_empty()).collect();
    let mut current_ri = cse_ri.to_string();

    for (i, segment) in segments.iter().enumerate() {
        let is_last = i == segments.len() - 1;
        if is_last && (*segment == "la" || *segment == "ol") {
            return Ok(ResolvedTarget::Virtual {
                parent_ri: current_ri,
                kind: if *segment == "la" { VirtualKind::Latest } else { VirtualKind::Oldest },
            });
        }
        let child = store
            .get_by_name(&current_ri, segment)
            .await
            .map_err(|_| DispatchError::NotFound { target: remainder.to_string() })?;
        current_ri = child.meta.ri;
    }

    Ok(ResolvedTarget::Local { ri: current_ri })
}

#[cfg(test)]
mod tests {
    use cse_resource::body::CseBaseBody;
    use cse_resource::{Resource, ResourceBody, ResourceMeta};
    use cse_storage::{InMemoryStore, ResourceStore};

    use super::*;

    const CSE_RI: &str = "cse-in";
    const CSE_CSI: &str = "in-cse";
    const CSE_RN: &str = "cse-in";

    fn meta(ri: &str, pi: &str, rn: &str) -> ResourceMeta {
        ResourceMeta {
            ri: ri.to_string(),
            rn: rn.to_string(),
            pi: pi.to_string(),
            ct: cse_types::Timestamp::UNIX_EPOCH,
            lt: cse_types::Timestamp::UNIX_EPOCH,
            et: None,
            acpi: vec![],
            lbl: vec![],
            at: vec![],
            aa: vec![],
            cr: None,
        }
    }

    async fn seeded_store() -> InMemoryStore {
        let store = InMemoryStore::new();
        store
            .put(Resource {
                meta: meta(CSE_RI, "", CSE_RN),
                body: ResourceBody::CseBase(CseBaseBody {
                    csi: CSE_CSI.to_string(),
                    cst: 1,
                    csz: vec![],
                    srt: vec![],
                    poa: vec![],
                    dcse: vec![],
                }),
            })
            .await
            .unwrap();
        store
    }

    #[tokio::test]
    async fn bare_to_resolves_as_unstructured_local() {
        let store = seeded_store().await;
        let resolved = resolve_path(&store, CSE_CSI, CSE_RI, CSE_RN, "some-ri").await.unwrap();
        assert_eq!(resolved, ResolvedTarget::Local { ri: "some-ri".to_string() });
    }

    #[tokio::test]
    async fn structured_path_walks_into_children() {
        let store = seeded_store().await;
        store
            .put(Resource {
                meta: meta("cnt1", CSE_RI, "box"),
                body: ResourceBody::Container(Default::default()),
            })
            .await
            .unwrap();

        let resolved = resolve_path(&store, CSE_CSI, CSE_RI, CSE_RN, &format!("{CSE_RN}/box")).await.unwrap();
        assert_eq!(resolved, ResolvedTarget::Local { ri: "cnt1".to_string() });
    }

    #[tokio::test]
    async fn trailing_la_segment_resolves_to_virtual_latest() {
        let store = seeded_store().await;
        store
            .put(Resource {
                meta: meta("cnt1", CSE_RI, "box"),
                body: ResourceBody::Container(Default::default()),
            })
            .await
            .unwrap();

        let resolved = resolve_path(&store, CSE_CSI, CSE_RI, CSE_RN, &format!("{CSE_RN}/box/la")).await.unwrap();
        assert_eq!(
            resolved,
            ResolvedTarget::Virtual {
                parent_ri: "cnt1".to_string(),
                kind: VirtualKind::Latest,
            }
        );
    }

    #[tokio::test]
    async fn structured_path_into_unknown_child_is_not_found() {
        let store = seeded_store().await;
        let err = resolve_path(&store, CSE_CSI, CSE_RI, CSE_RN, &format!("{CSE_RN}/missing")).await.unwrap_err();
        assert!(matches!(err, DispatchError::NotFound { .. }));
    }

    #[tokio::test]
    async fn sp_relative_path_to_a_different_csi_is_transit() {
        let store = seeded_store().await;
        let resolved = resolve_path(&store, CSE_CSI, CSE_RI, CSE_RN, "/other-cse/box").await.unwrap();
        assert_eq!(
            resolved,
            ResolvedTarget::Transit {
                csi: "other-cse".to_string(),
                remainder: "box".to_string(),
            }
        );
    }

    #[tokio::test]
    async fn sp_relative_path_to_our_own_csi_resolves_locally() {
        let store = seeded_store().await;
        let resolved = resolve_path(&store, CSE_CSI, CSE_RI, CSE_RN, &format!("/{CSE_CSI}")).await.unwrap();
        assert_eq!(resolved, ResolvedTarget::Local { ri: CSE_RI.to_string() });
    }
}
