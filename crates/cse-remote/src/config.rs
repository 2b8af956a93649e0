use std::time::Duration;

/// The three CSE roles that determine which half of the reconciliation
/// monitor applies: ASN/MN ascend toward a registrar, MN/IN watch
/// descendants for liveness.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CseRole {
    Asn,
    Mn,
    In,
}

impl CseRole {
    pub fn ascends(self) -> bool {
        matches!(self, CseRole::Asn | CseRole::Mn)
    }

    pub fn has_descendants(self) -> bool {
        matches!(self, CseRole::Mn | CseRole::In)
    }
}

#[derive(Clone, Debug)]
pub struct RemoteConfig {
    pub role: CseRole,
    pub cse_csi: String,
    pub cse_ri: String,
    pub registrar_url: Option<String>,
    pub registrar_csi: Option<String>,
    pub reconcile_interval: Duration,
}
