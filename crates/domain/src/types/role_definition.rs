//! Role definition types
//!
//! Permission levels defined on a site (`_api/web/roledefinitions`).

use serde::{Deserialize, Serialize};

/// 64-bit permission mask split into its high and low words
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BasePermissions {
    /// Permission kinds 33..=64
    pub high: i64,
    /// Permission kinds 1..=32
    pub low: i64,
}

/// `PermissionKind` value that stands for every permission at once
pub const FULL_MASK: u32 = 65;

impl BasePermissions {
    /// Whether the mask grants `permission`, a `PermissionKind` value
    /// (1 = ViewListItems ... 64, or [`FULL_MASK`]).
    ///
    /// Kind `n` is bit `n - 1`: kinds 1..=32 live in `low`, 33..=64 in
    /// `high`. `EmptyMask` (0) is never granted.
    pub fn has(&self, permission: u32) -> bool {
        if permission == FULL_MASK {
            return self.high & 0x7FFF == 0x7FFF && self.low == 0xFFFF;
        }
        match permission {
            1..=32 => self.low & (1_i64 << (permission - 1)) != 0,
            33..=64 => self.high & (1_i64 << (permission - 33)) != 0,
            _ => false,
        }
    }
}

/// A permission level such as "Full Control" or "Read"
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoleDefinition {
    pub base_permissions: BasePermissions,
    pub description: String,
    pub hidden: bool,
    pub id: i32,
    pub name: String,
    pub order: i32,
    pub role_type_kind: i32,
}
