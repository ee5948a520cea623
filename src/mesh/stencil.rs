//! Reserved stencil identities for composited meshes.
//!
//! The top eight stencil values (248..=255) are reserved so composited
//! geometry can be told apart in downstream passes. Each mask role has a
//! twin used when the mesh bypasses depth of field.

pub const TRANSLUCENT_SOFT_MASK: u8 = 255;
pub const OPAQUE_SOFT_MASK: u8 = 254;
pub const TRANSLUCENT_HARD_MASK: u8 = 253;
pub const OPAQUE_HARD_MASK: u8 = 252;
pub const TRANSLUCENT_SOFT_MASK_NO_DOF: u8 = 251;
pub const OPAQUE_SOFT_MASK_NO_DOF: u8 = 250;
pub const TRANSLUCENT_HARD_MASK_NO_DOF: u8 = 249;
pub const OPAQUE_HARD_MASK_NO_DOF: u8 = 248;

/// First value of the reserved range.
pub const RESERVED_RANGE_START: u8 = OPAQUE_HARD_MASK_NO_DOF;

/// Mask role of a mesh render component.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum StencilRole {
    OpaqueSoftMask,
    TranslucentSoftMask,
    OpaqueHardMask,
    TranslucentHardMask,
}

/// Stencil value for a role, honoring the depth of field bypass twin set.
#[must_use]
pub fn stencil_value(role: StencilRole, bypass_depth_of_field: bool) -> u8 {
    match (role, bypass_depth_of_field) {
        (StencilRole::TranslucentSoftMask, false) => TRANSLUCENT_SOFT_MASK,
        (StencilRole::OpaqueSoftMask, false) => OPAQUE_SOFT_MASK,
        (StencilRole::TranslucentHardMask, false) => TRANSLUCENT_HARD_MASK,
        (StencilRole::OpaqueHardMask, false) => OPAQUE_HARD_MASK,
        (StencilRole::TranslucentSoftMask, true) => TRANSLUCENT_SOFT_MASK_NO_DOF,
        (StencilRole::OpaqueSoftMask, true) => OPAQUE_SOFT_MASK_NO_DOF,
        (StencilRole::TranslucentHardMask, true) => TRANSLUCENT_HARD_MASK_NO_DOF,
        (StencilRole::OpaqueHardMask, true) => OPAQUE_HARD_MASK_NO_DOF,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ROLES: [StencilRole; 4] = [
        StencilRole::OpaqueSoftMask,
        StencilRole::TranslucentSoftMask,
        StencilRole::OpaqueHardMask,
        StencilRole::TranslucentHardMask,
    ];

    #[test]
    fn values_stay_in_reserved_range() {
        for role in ROLES {
            for bypass in [false, true] {
                assert!(stencil_value(role, bypass) >= RESERVED_RANGE_START);
            }
        }
    }

    #[test]
    fn roles_are_pairwise_distinct_per_bypass_state() {
        for bypass in [false, true] {
            let mut seen: Vec<u8> = ROLES.iter().map(|r| stencil_value(*r, bypass)).collect();
            seen.sort_unstable();
            seen.dedup();
            assert_eq!(seen.len(), ROLES.len());
        }
    }

    #[test]
    fn bypass_swaps_to_twin_values() {
        for role in ROLES {
            assert_ne!(stencil_value(role, false), stencil_value(role, true));
        }
    }
}
