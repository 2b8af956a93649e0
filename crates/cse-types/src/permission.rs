use serde::{Deserialize, Serialize};

use crate::envelope::Operation;

/// A bitset of the six oneM2M access-control operations. Kept as a plain
/// `u16` with named constants rather than pulling in `bitflags`, mirroring
/// the integer-bitmask style the permission model was originally specified
/// with.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Permission(pub u16);

impl Permission {
    pub const CREATE: Permission = Permission(1 << 0);
    pub const RETRIEVE: Permission = Permission(1 << 1);
    pub const UPDATE: Permission = Permission(1 << 2);
    pub const DELETE: Permission = Permission(1 << 3);
    pub const NOTIFY: Permission = Permission(1 << 4);
    pub const DISCOVERY: Permission = Permission(1 << 5);
    pub const NONE: Permission = Permission(0);
    pub const ALL: Permission = Permission(
        Self::CREATE.0 | Self::RETRIEVE.0 | Self::UPDATE.0 | Self::DELETE.0 | Self::NOTIFY.0 | Self::DISCOVERY.0,
    );

    pub fn contains(self, other: Permission) -> bool {
        self.0 & other.0 == other.0
    }

    pub fn union(self, other: Permission) -> Permission {
        Permission(self.0 | other.0)
    }
}

impl From<Operation> for Permission {
    fn from(op: Operation) -> Self {
        match op {
            Operation::Create => Permission::CREATE,
            Operation::Retrieve => Permission::RETRIEVE,
            Operation::Update => Permission::UPDATE,
            Operation::Delete => Permission::DELETE,
            Operation::Notify => Permission::NOTIFY,
        }
    }
}
