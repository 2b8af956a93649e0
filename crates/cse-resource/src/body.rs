use cse_types::{Permission, ResourceType};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Per-permission-record access control entry, used by [`AcpBody`].
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct PermissionRecord {
    pub originators: Vec<String>,
    pub operations: Permission,
    pub ty_filter: Option<ResourceType>,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CseBaseBody {
    pub csi: String,
    pub cst: u8,
    pub csz: Vec<String>,
    pub srt: Vec<String>,
    pub poa: Vec<String>,
    pub dcse: Vec<String>,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AeBody {
    pub aei: String,
    pub api: String,
    pub rr: bool,
    pub srv: Vec<String>,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ContainerBody {
    pub cni: u64,
    pub cbs: u64,
    pub mni: Option<u64>,
    pub mbs: Option<u64>,
    pub mia: Option<u64>,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ContentInstanceBody {
    pub cnf: Option<String>,
    pub cs: u64,
    pub con: Value,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AcpBody {
    pub pv: Vec<PermissionRecord>,
    pub pvs: Vec<PermissionRecord>,
    /// `ri` of the resource this ACP was created internally for, if any.
    /// Cleared on every ACP that a client created directly.
    pub created_internally_for: Option<String>,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct FlexContainerBody {
    pub cnd: String,
    #[serde(rename = "or")]
    pub ontology_ref: Option<String>,
    pub cs: u64,
    pub cni: u64,
    pub cbs: u64,
    pub mni: Option<u64>,
    pub mbs: Option<u64>,
    #[serde(flatten)]
    pub custom: Map<String, Value>,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct FlexContainerInstanceBody {
    pub cs: u64,
    #[serde(flatten)]
    pub snapshot: Map<String, Value>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct GroupBody {
    pub mt: ResourceType,
    #[serde(default)]
    pub cnm: u64,
    #[serde(default)]
    pub mnm: Option<u64>,
    #[serde(default)]
    pub mid: Vec<String>,
    #[serde(default)]
    pub macp: Vec<String>,
    #[serde(default)]
    pub mtv: bool,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct NotificationEventCriteria {
    pub net: Vec<u8>,
    pub atr: Vec<String>,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SubscriptionBody {
    pub nu: Vec<String>,
    pub enc: NotificationEventCriteria,
    pub nct: u8,
    pub exc: Option<u64>,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RemoteCseBody {
    pub csi: String,
    pub cst: u8,
    pub csz: Vec<String>,
    pub poa: Vec<String>,
    pub cb: String,
    pub rr: bool,
    pub srv: Vec<String>,
    pub dcse: Vec<String>,
    /// `ri` of the internally created ACPs for this CSR, tracked for cleanup
    /// on deregistration.
    pub created_internally_acps: Vec<String>,
}

/// The closed sum type over every resource kind this CSE stores. Each
/// variant is a strongly typed struct; `FlexContainerBody` and
/// `FlexContainerInstanceBody` additionally carry an overflow map for custom
/// ontology-defined attributes, mirroring how the resource model keeps known
/// fields typed while still accepting passthrough data.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(tag = "ty", content = "body")]
pub enum ResourceBody {
    CseBase(CseBaseBody),
    Ae(AeBody),
    Container(ContainerBody),
    ContentInstance(ContentInstanceBody),
    AccessControlPolicy(AcpBody),
    FlexContainer(FlexContainerBody),
    FlexContainerInstance(FlexContainerInstanceBody),
    Group(GroupBody),
    Subscription(SubscriptionBody),
    RemoteCse(RemoteCseBody),
}

impl ResourceBody {
    pub fn ty(&self) -> ResourceType {
        match self {
            ResourceBody::CseBase(_) => ResourceType::CseBase,
            ResourceBody::Ae(_) => ResourceType::Ae,
            ResourceBody::Container(_) => ResourceType::Container,
            ResourceBody::ContentInstance(_) => ResourceType::ContentInstance,
            ResourceBody::AccessControlPolicy(_) => ResourceType::AccessControlPolicy,
            ResourceBody::FlexContainer(_) => ResourceType::FlexContainer,
            ResourceBody::FlexContainerInstance(_) => ResourceType::FlexContainerInstance,
            ResourceBody::Group(_) => ResourceType::Group,
            ResourceBody::Subscription(_) => ResourceType::Subscription,
            ResourceBody::RemoteCse(_) => ResourceType::RemoteCse,
        }
    }

    pub fn as_acp(&self) -> Option<&AcpBody> {
        match self {
            ResourceBody::AccessControlPolicy(acp) => Some(acp),
            _ => None,
        }
    }

    pub fn as_container(&self) -> Option<&ContainerBody> {
        match self {
            ResourceBody::Container(c) => Some(c),
            _ => None,
        }
    }

    pub fn as_container_mut(&mut self) -> Option<&mut ContainerBody> {
        match self {
            ResourceBody::Container(c) => Some(c),
            _ => None,
        }
    }

    pub fn as_flexcontainer(&self) -> Option<&FlexContainerBody> {
        match self {
            ResourceBody::FlexContainer(fc) => Some(fc),
            _ => None,
        }
    }

    pub fn as_flexcontainer_mut(&mut self) -> Option<&mut FlexContainerBody> {
        match self {
            ResourceBody::FlexContainer(fc) => Some(fc),
            _ => None,
        }
    }

    pub fn as_subscription(&self) -> Option<&SubscriptionBody> {
        match self {
            ResourceBody::Subscription(sub) => Some(sub),
            _ => None,
        }
    }

    pub fn as_group(&self) -> Option<&GroupBody> {
        match self {
            ResourceBody::Group(g) => Some(g),
            _ => None,
        }
    }

    pub fn as_remote_cse(&self) -> Option<&RemoteCseBody> {
        match self {
            ResourceBody::RemoteCse(csr) => Some(csr),
            _ => None,
        }
    }

    pub fn as_cse_base(&self) -> Option<&CseBaseBody> {
        match self {
            ResourceBody::CseBase(cse) => Some(cse),
            _ => None,
        }
    }

    pub fn content_size(&self) -> u64 {
        match self {
            ResourceBody::ContentInstance(cin) => cin.cs,
            ResourceBody::FlexContainerInstance(fci) => fci.cs,
            _ => 0,
        }
    }
}
