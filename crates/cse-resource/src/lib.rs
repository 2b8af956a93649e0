//! The resource model: typed resource bodies, attribute policy validation,
//! lifecycle hooks, and container quota enforcement.

pub mod body;
mod flexcontainer;
mod lifecycle;
mod meta;
mod policy;

pub use body::{AcpBody, PermissionRecord, ResourceBody};
pub use flexcontainer::{canonical_size, snapshot_instance};
pub use lifecycle::{ChildOutcome, ResourceLifecycle, enforce_quota};
pub use meta::{Resource, ResourceMeta};
pub use policy::{AttributePolicy, ValidationError, Validator, validate_on_create, validate_on_update};
