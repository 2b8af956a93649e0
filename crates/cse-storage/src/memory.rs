use std::collections::HashMap;

use async_trait::async_trait;
use cse_resource::Resource;
use cse_types::ResourceType;
use tokio::sync::RwLock;
use tracing::trace;

use crate::{ResourceStore, Result, SearchCriteria, StoreError};

#[derive(Default)]
struct Indexes {
    by_ri: HashMap<String, Resource>,
    /// `(pi, rn) -> ri`
    by_sibling: HashMap<(String, String), String>,
    /// `pi -> [ri]`, insertion-ordered so DFS discovery stays stable.
    children: HashMap<String, Vec<String>>,
}

/// The reference [`ResourceStore`]: a single `RwLock`-guarded map plus the
/// sibling and directory indexes from the data model. Mirrors the client's
/// narrow `get`/`create`/`patch`/`update` boundary, generalized from a single
/// Kubernetes API object shape to the CSE's closed resource-type set.
pub struct InMemoryStore {
    indexes: RwLock<Indexes>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        InMemoryStore {
            indexes: RwLock::new(Indexes::default()),
        }
    }
}

impl Default for InMemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ResourceStore for InMemoryStore {
    async fn put(&self, resource: Resource) -> Result<()> {
        let mut idx = self.indexes.write().await;
        let ri = resource.meta.ri.clone();
        let pi = resource.meta.pi.clone();
        let rn = resource.meta.rn.clone();

        // Clear any previous sibling-index entry for this ri (an update may
        // not change pi/rn, but a first insert needs the entry created).
        if let Some(existing) = idx.by_ri.get(&ri) {
            let old_key = (existing.meta.pi.clone(), existing.meta.rn.clone());
            if old_key != (pi.clone(), rn.clone()) {
                idx.by_sibling.remove(&old_key);
            }
        } else {
            idx.children.entry(pi.clone()).or_default().push(ri.clone());
        }

        idx.by_sibling.insert((pi, rn), ri.clone());
        idx.by_ri.insert(ri, resource);
        Ok(())
    }

    async fn get(&self, ri: &str) -> Result<Resource> {
        let idx = self.indexes.read().await;
        idx.by_ri.get(ri).cloned().ok_or_else(|| StoreError::NotFound { ri: ri.to_string() })
    }

    async fn get_by_name(&self, pi: &str, rn: &str) -> Result<Resource> {
        let idx = self.indexes.read().await;
        let ri = idx
            .by_sibling
            .get(&(pi.to_string(), rn.to_string()))
            .ok_or_else(|| StoreError::NotFound { ri: format!("{pi}/{rn}") })?;
        idx.by_ri
            .get(ri)
            .cloned()
            .ok_or_else(|| StoreError::NotFound { ri: ri.clone() })
    }

    async fn delete(&self, ri: &str) -> Result<Resource> {
        let mut idx = self.indexes.write().await;
        let resource = idx.by_ri.remove(ri).ok_or_else(|| StoreError::NotFound { ri: ri.to_string() })?;
        idx.by_sibling.remove(&(resource.meta.pi.clone(), resource.meta.rn.clone()));
        if let Some(siblings) = idx.children.get_mut(&resource.meta.pi) {
            siblings.retain(|child| child != ri);
        }
        idx.children.remove(ri);
        trace!(ri, "resource removed from store");
        Ok(resource)
    }

    async fn children(&self, pi: &str, ty: Option<ResourceType>) -> Result<Vec<Resource>> {
        let idx = self.indexes.read().await;
        let Some(child_ris) = idx.children.get(pi) else {
            return Ok(Vec::new());
        };
        let mut out: Vec<Resource> = child_ris
            .iter()
            .filter_map(|ri| idx.by_ri.get(ri))
            .filter(|r| ty.as_ref().is_none_or(|t| &r.ty() == t))
            .cloned()
            .collect();
        out.sort_by(|a, b| a.meta.ct.cmp(&b.meta.ct).then_with(|| a.meta.ri.cmp(&b.meta.ri)));
        Ok(out)
    }

    async fn search(&self, criteria: &SearchCriteria) -> Result<Vec<Resource>> {
        let idx = self.indexes.read().await;
        let mut matches = Vec::new();
        let mut stack = vec![criteria.root.clone()];
        let mut seen_levels: HashMap<String, u32> = HashMap::from([(criteria.root.clone(), 0)]);

        while let Some(ri) = stack.pop() {
            let level = seen_levels.get(&ri).copied().unwrap_or(0);
            if let Some(child_ris) = idx.children.get(&ri) {
                for child_ri in child_ris {
                    seen_levels.insert(child_ri.clone(), level + 1);
                    if criteria.level.is_none_or(|max| level + 1 <= max) {
                        stack.push(child_ri.clone());
                    }
                    if let Some(resource) = idx.by_ri.get(child_ri) {
                        if matches_criteria(resource, criteria) {
                            matches.push(resource.clone());
                        }
                    }
                }
            }
        }

        matches.sort_by(|a, b| a.meta.ct.cmp(&b.meta.ct).then_with(|| a.meta.ri.cmp(&b.meta.ri)));
        if let Some(limit) = criteria.limit {
            matches.truncate(limit);
        }
        Ok(matches)
    }
}

fn matches_criteria(resource: &Resource, criteria: &SearchCriteria) -> bool {
    if let Some(ty) = &criteria.ty {
        if &resource.ty() != ty {
            return false;
        }
    }
    if !criteria.labels.is_empty() && !criteria.labels.iter().any(|l| resource.meta.lbl.contains(l)) {
        return false;
    }
    if let Some(after) = criteria.created_after {
        if resource.meta.ct <= after {
            return false;
        }
    }
    if let Some(before) = criteria.created_before {
        if resource.meta.ct >= before {
            return false;
        }
    }
    if !criteria.attributes.is_empty() {
        let body = match serde_json::to_value(&resource.body) {
            Ok(serde_json::Value::Object(map)) => map.get("body").cloned().unwrap_or(serde_json::Value::Null),
            _ => serde_json::Value::Null,
        };
        for (key, expected) in &criteria.attributes {
            if body.get(key) != Some(expected) {
                return false;
            }
        }
    }
    true
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use super::*;
    use cse_resource::{Resource, ResourceMeta};
    use cse_resource::ResourceBody::CseBase;

    fn meta(ri: &str, pi: &str, rn: &str) -> ResourceMeta {
        ResourceMeta {
            ri: ri.to_string(),
            rn: rn.to_string(),
            pi: pi.to_string(),
            ct: jiff::Timestamp::UNIX_EPOCH,
            lt: jiff::Timestamp::UNIX_EPOCH,
            et: None,
            acpi: vec![],
            lbl: vec![],
            at: vec![],
            aa: vec![],
            cr: None,
        }
    }

    #[tokio::test]
    async fn put_then_get_roundtrips() {
        let store = InMemoryStore::new();
        let resource = Resource {
            meta: meta("ri1", "", "cse-in"),
            body: CseBase(Default::default()),
        };
        store.put(resource).await.unwrap();
        let got = store.get("ri1").await.unwrap();
        assert_eq!(got.meta.rn, "cse-in");
    }

    #[tokio::test]
    async fn delete_then_get_is_not_found() {
        let store = InMemoryStore::new();
        let resource = Resource {
            meta: meta("ri1", "", "cse-in"),
            body: CseBase(Default::default()),
        };
        store.put(resource).await.unwrap();
        store.delete("ri1").await.unwrap();
        assert!(matches!(store.get("ri1").await, Err(StoreError::NotFound { .. })));
    }

    #[tokio::test]
    async fn sibling_lookup_finds_by_name() {
        let store = InMemoryStore::new();
        let resource = Resource {
            meta: meta("ri1", "", "cse-in"),
            body: CseBase(Default::default()),
        };
        store.put(resource).await.unwrap();
        let got = store.get_by_name("", "cse-in").await.unwrap();
        assert_eq!(got.meta.ri, "ri1");
    }

    #[tokio::test]
    async fn search_matches_on_attribute_equality() {
        use cse_resource::ResourceBody::Ae;
        use cse_resource::body::AeBody;
        use cse_types::ResourceType;

        let store = InMemoryStore::new();
        store
            .put(Resource {
                meta: meta("cse-in", "", "cse-in"),
                body: CseBase(Default::default()),
            })
            .await
            .unwrap();
        store
            .put(Resource {
                meta: meta("ae1", "cse-in", "myapp"),
                body: Ae(AeBody {
                    aei: "Cmyapp".to_string(),
                    api: "N.example.app".to_string(),
                    rr: true,
                    srv: vec![],
                }),
            })
            .await
            .unwrap();
        store
            .put(Resource {
                meta: meta("ae2", "cse-in", "otherapp"),
                body: Ae(AeBody {
                    aei: "Cotherapp".to_string(),
                    api: "N.other.app".to_string(),
                    rr: false,
                    srv: vec![],
                }),
            })
            .await
            .unwrap();

        let criteria = SearchCriteria {
            root: "cse-in".to_string(),
            ty: Some(ResourceType::Ae),
            labels: vec![],
            created_after: None,
            created_before: None,
            attributes: BTreeMap::from([("api".to_string(), serde_json::json!("N.example.app"))]),
            limit: None,
            level: None,
        };

        let found = store.search(&criteria).await.unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].meta.ri, "ae1");
    }
}
