use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// The closed set of resource kinds a CSE can hold.
///
/// `Mgmt` and `Announced` are kept as wrapping variants rather than being
/// expanded into one flat case per combination, so that management-object
/// kinds and announced variants don't multiply the enum size.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString)]
#[serde(tag = "ty")]
pub enum ResourceType {
    CseBase,
    Ae,
    Container,
    ContentInstance,
    AccessControlPolicy,
    FlexContainer,
    FlexContainerInstance,
    Group,
    Subscription,
    RemoteCse,
    Mgmt(MgmtObjKind),
    Announced(Box<ResourceType>),
}

impl ResourceType {
    /// Whether instances of this type may carry an `acpi` attribute list.
    pub fn supports_acpi(&self) -> bool {
        !matches!(
            self,
            ResourceType::ContentInstance
                | ResourceType::FlexContainerInstance
                | ResourceType::AccessControlPolicy
        )
    }

    /// Whether this type participates in quota accounting (`cni`/`cbs`) as a
    /// container-like parent.
    pub fn is_container_like(&self) -> bool {
        matches!(self, ResourceType::Container | ResourceType::FlexContainer)
    }

    /// Whether this type is an instance kind that container-like parents
    /// track via `cni`/`cbs`.
    pub fn is_instance(&self) -> bool {
        matches!(
            self,
            ResourceType::ContentInstance | ResourceType::FlexContainerInstance
        )
    }

    /// The oneM2M numeric type tag, used on the wire (`ty`) and in the
    /// `X-M2M-RSC`-adjacent `Content-Type: ty=<n>` negotiation.
    pub fn numeric(&self) -> u16 {
        match self {
            ResourceType::AccessControlPolicy => 1,
            ResourceType::Ae => 2,
            ResourceType::Container => 3,
            ResourceType::ContentInstance => 4,
            ResourceType::CseBase => 5,
            ResourceType::Group => 9,
            ResourceType::RemoteCse => 16,
            ResourceType::Subscription => 23,
            ResourceType::FlexContainer => 28,
            ResourceType::FlexContainerInstance => 29,
            ResourceType::Mgmt(_) => 13,
            ResourceType::Announced(inner) => inner.numeric(),
        }
    }
}

/// Management-object kinds, nested under `ResourceType::Mgmt`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString)]
pub enum MgmtObjKind {
    Firmware,
    Software,
    Memory,
    Battery,
    DeviceInfo,
}
