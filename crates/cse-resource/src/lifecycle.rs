use cse_types::Ri;

use crate::meta::Resource;

/// Outcome of a `child_will_be_added` veto check.
#[derive(Debug, PartialEq, Eq)]
pub enum ChildOutcome {
    Allow,
    Reject(&'static str),
}

/// The small virtual interface every resource type may participate in.
/// Implemented as a capability table keyed by resource type (see
/// `cse-dispatch`'s pipeline, which looks hooks up by `ty()` rather than
/// dispatching through a trait object per instance) rather than an
/// inheritance hierarchy, since the set of types is closed and known at
/// compile time.
pub trait ResourceLifecycle {
    /// Called after a resource has been inserted into storage. May create
    /// virtual/support children (e.g. nothing to materialize eagerly for
    /// `la`/`ol`, which are computed views; FlexContainer instance bearing
    /// containers need no activation work either, their FCI is created on
    /// the parent's first UPDATE).
    fn activate(&self, _resource: &Resource) {}

    /// Called before a resource (and its subtree) is deleted.
    fn deactivate(&self, _resource: &Resource) {}

    /// The parent's veto for a child about to be inserted underneath it.
    fn child_will_be_added(&self, parent: &Resource, child: &Resource) -> ChildOutcome {
        let _ = (parent, child);
        ChildOutcome::Allow
    }
}

/// Eviction plan produced by [`enforce_quota`]: the `ri`s of children to
/// delete, oldest-by-`ct` first, followed by the resulting `cni`/`cbs`
/// totals the caller should persist on the parent.
#[derive(Debug, Default)]
pub struct QuotaOutcome {
    pub evict: Vec<Ri>,
    pub cni: u64,
    pub cbs: u64,
}

/// Computes which instance children must be evicted to bring `cni` within
/// `mni` and `cbs` within `mbs`, given the full ordered list of
/// `(ri, ct_ordinal, size)` for a container-like parent's instance children
/// (already sorted oldest-first by `(ct, ri)`).
pub fn enforce_quota(children: &[(Ri, u64)], mni: Option<u64>, mbs: Option<u64>) -> QuotaOutcome {
    let mut cni = children.len() as u64;
    let mut cbs: u64 = children.iter().map(|(_, size)| size).sum();
    let mut evict = Vec::new();

    let mut remaining: Vec<&(Ri, u64)> = children.iter().collect();

    if let Some(mni) = mni {
        while cni > mni {
            if let Some((ri, size)) = remaining.first().copied() {
                evict.push(ri.clone());
                cni -= 1;
                cbs -= size;
                remaining.remove(0);
            } else {
                break;
            }
        }
    }
    if let Some(mbs) = mbs {
        while cbs > mbs {
            if let Some((ri, size)) = remaining.first().copied() {
                evict.push(ri.clone());
                cni -= 1;
                cbs -= size;
                remaining.remove(0);
            } else {
                break;
            }
        }
    }

    QuotaOutcome { evict, cni, cbs }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn evicts_oldest_first_over_mni() {
        let children = vec![
            ("a".to_string(), 10),
            ("b".to_string(), 10),
            ("c".to_string(), 10),
        ];
        let outcome = enforce_quota(&children, Some(2), None);
        assert_eq!(outcome.evict, vec!["a".to_string()]);
        assert_eq!(outcome.cni, 2);
    }

    #[test]
    fn evicts_over_mbs() {
        let children = vec![("a".to_string(), 40), ("b".to_string(), 40), ("c".to_string(), 40)];
        let outcome = enforce_quota(&children, None, Some(100));
        assert_eq!(outcome.evict, vec!["a".to_string()]);
        assert_eq!(outcome.cbs, 80);
    }

    #[test]
    fn no_quota_set_evicts_nothing() {
        let children = vec![("a".to_string(), 40)];
        let outcome = enforce_quota(&children, None, None);
        assert!(outcome.evict.is_empty());
    }
}
