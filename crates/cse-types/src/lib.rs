//! Shared types used across the CSE core crates: the resource type
//! enumeration, response status codes, the permission bitset, the
//! canonical request/response envelope, and originator helpers.

mod envelope;
mod originator;
mod permission;
mod resource_type;
mod rsc;

pub use envelope::{Filters, Operation, Request, Response};
pub use originator::{is_allowed_originator, matches_originator, stem};
pub use permission::Permission;
pub use resource_type::{MgmtObjKind, ResourceType};
pub use rsc::Rsc;

/// A oneM2M resource identifier. Globally unique within this CSE.
pub type Ri = String;

/// A oneM2M resource name. Unique among siblings.
pub type Rn = String;

/// A oneM2M CSE identifier, e.g. `/in-cse`.
pub type Csi = String;

/// An absolute timestamp, used for `ct`, `lt`, `et`.
pub type Timestamp = jiff::Timestamp;
