use cse_types::{Csi, Ri, Rn, Timestamp};
use serde::{Deserialize, Serialize};

use crate::body::ResourceBody;

/// Attributes common to every resource, regardless of type. Mirrors the
/// oneM2M "universal" and "common" attribute groups.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ResourceMeta {
    pub ri: Ri,
    pub rn: Rn,
    /// Parent `ri`. Empty only for the CSEBase root.
    pub pi: Ri,
    pub ct: Timestamp,
    pub lt: Timestamp,
    pub et: Option<Timestamp>,
    #[serde(default)]
    pub acpi: Vec<Ri>,
    #[serde(default)]
    pub lbl: Vec<String>,
    #[serde(default)]
    pub at: Vec<Csi>,
    #[serde(default)]
    pub aa: Vec<String>,
    /// Creator originator, assigned by the registration manager. Rejecting a
    /// client-supplied value is enforced in `cse-registration`, not here.
    pub cr: Option<String>,
}

/// A full resource: common metadata plus its type-specific body.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Resource {
    pub meta: ResourceMeta,
    pub body: ResourceBody,
}

impl Resource {
    pub fn ty(&self) -> cse_types::ResourceType {
        self.body.ty()
    }
}
