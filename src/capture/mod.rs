//! Auxiliary scene capture passes.
//!
//! Two pass kinds exist: the planar reflection capture and the soft mask
//! capture. Both size their render target as a percentage of the media
//! resolution and derive their camera from the shared precedence rule
//! (debug camera, then editor viewport, then player camera).

use bitflags::bitflags;
use glam::{Affine3A, Mat3, Quat, UVec2, Vec3};

use crate::frame::{CameraPose, TickContext};
use crate::materials::{RenderTargetKey, Texture};
use crate::world::CompositeWorldData;

/// Capture targets never shrink below this per-axis extent.
pub const MIN_TARGET_EXTENT: u32 = 2;
/// Media resolution assumed when no media input texture is set.
pub const FALLBACK_MEDIA_SIZE: UVec2 = UVec2::new(1920, 1080);
/// Lower clamp for any derived field of view, in degrees.
pub const MIN_FIELD_OF_VIEW: f32 = 5.0;
/// Field of view used when no camera and no lens data is available.
pub const DEFAULT_FIELD_OF_VIEW: f32 = 90.0;

slotmap::new_key_type! {
    /// Identity of a planar reflection in the subsystem's store.
    pub struct ReflectionKey;
}

/// Effective media resolution: texture dimensions clamped to the minimum
/// extent. A missing texture, or a degenerate one with a zero axis, yields
/// the fallback resolution instead of poisoning the frame.
#[must_use]
pub fn media_size(texture: Option<&Texture>) -> UVec2 {
    match texture {
        Some(tex) if tex.size.x > 0 && tex.size.y > 0 => {
            tex.size.max(UVec2::splat(MIN_TARGET_EXTENT))
        }
        _ => FALLBACK_MEDIA_SIZE,
    }
}

/// Capture target size: floor of the media size scaled per axis, never
/// below the minimum extent.
#[must_use]
pub fn compute_target_size(media: UVec2, screen_percentage: f32) -> UVec2 {
    let scale = screen_percentage / 100.0;
    UVec2::new(
        (media.x as f32 * scale) as u32,
        (media.y as f32 * scale) as u32,
    )
    .max(UVec2::splat(MIN_TARGET_EXTENT))
}

bitflags! {
    /// What a capture pass renders.
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
    pub struct CaptureShowFlags: u32 {
        const LIGHTING        = 1 << 0;
        const SKY_LIGHTING    = 1 << 1;
        const REFLECTIONS     = 1 << 2;
        const FOG             = 1 << 3;
        const PARTICLES       = 1 << 4;
        const TRANSLUCENCY    = 1 << 5;
        const POST_PROCESSING = 1 << 6;
        /// Write scene depth into the capture's alpha channel.
        const DEPTH_IN_ALPHA  = 1 << 7;
    }
}

/// The closed set of capture pass kinds.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum CapturePassKind {
    PlanarReflection,
    SoftMask,
}

impl CapturePassKind {
    /// Show flags a freshly created pass of this kind starts with.
    /// Reflections capture the lit HDR scene; the soft mask captures an
    /// unlit mask with depth in alpha and no post effects.
    #[must_use]
    pub fn default_show_flags(self) -> CaptureShowFlags {
        match self {
            Self::PlanarReflection => {
                CaptureShowFlags::LIGHTING
                    | CaptureShowFlags::SKY_LIGHTING
                    | CaptureShowFlags::REFLECTIONS
                    | CaptureShowFlags::FOG
                    | CaptureShowFlags::TRANSLUCENCY
            }
            Self::SoftMask => CaptureShowFlags::DEPTH_IN_ALPHA,
        }
    }
}

/// State of one capture pass.
#[derive(Clone, Debug)]
pub struct CapturePass {
    pub kind: CapturePassKind,
    pub target: RenderTargetKey,
    pub show_flags: CaptureShowFlags,
    pub capture_every_frame: bool,
}

impl CapturePass {
    #[must_use]
    pub fn new(kind: CapturePassKind, target: RenderTargetKey) -> Self {
        Self {
            kind,
            target,
            show_flags: kind.default_show_flags(),
            capture_every_frame: kind == CapturePassKind::SoftMask,
        }
    }
}

/// Fully derived view of one capture, handed to the host.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CaptureView {
    pub position: Vec3,
    pub rotation: Quat,
    pub fov: f32,
    pub clip_plane_base: Vec3,
    pub clip_plane_normal: Vec3,
    pub clip_plane_enabled: bool,
}

impl CaptureView {
    /// A view straight from a camera pose, no clip plane.
    #[must_use]
    pub fn from_pose(pose: &CameraPose) -> Self {
        Self {
            position: pose.position,
            rotation: pose.rotation,
            fov: pose.fov,
            clip_plane_base: Vec3::ZERO,
            clip_plane_normal: Vec3::Y,
            clip_plane_enabled: false,
        }
    }
}

/// Shared camera precedence: the debug camera when the world allows it,
/// the editor viewport camera in editor worlds (FOV clamped), the player
/// camera otherwise, and a default pose as the last resort.
#[must_use]
pub fn resolve_camera(ctx: &TickContext, world: &CompositeWorldData) -> CameraPose {
    if world.is_debug_camera_allowed(ctx.world_type) {
        if let Some(debug) = world.debug_camera {
            return debug.pose;
        }
    }
    if ctx.world_type == crate::world::WorldType::Editor {
        if let Some(editor) = ctx.editor_camera {
            return CameraPose {
                fov: editor.fov.max(MIN_FIELD_OF_VIEW),
                ..editor
            };
        }
    }
    ctx.player_camera.unwrap_or_default()
}

/// Reflects `v` across the plane with unit normal `n`.
#[must_use]
pub fn mirror_by_normal(v: Vec3, n: Vec3) -> Vec3 {
    v - 2.0 * v.dot(n) * n
}

/// A planar reflection surface and its capture pass.
///
/// The transform places the mirror plane: its translation is the clip plane
/// base and its local Y axis the plane normal.
#[derive(Clone, Debug)]
pub struct PlanarReflection {
    pub transform: Affine3A,
    pub pass: CapturePass,
}

impl PlanarReflection {
    #[must_use]
    pub fn new(transform: Affine3A, target: RenderTargetKey) -> Self {
        Self {
            transform,
            pass: CapturePass::new(CapturePassKind::PlanarReflection, target),
        }
    }

    /// Derives the mirrored capture view from the scene camera pose.
    ///
    /// The camera position is reflected through the mirror plane by moving
    /// into plane space, flipping the local vertical axis and moving back.
    /// Forward and right are mirrored across the plane normal and recombined
    /// into the capture rotation.
    #[must_use]
    pub fn mirrored_view(&self, camera: &CameraPose) -> CaptureView {
        let (_, rotation, translation) = self.transform.to_scale_rotation_translation();

        let base = Affine3A::from_rotation_translation(rotation, translation);
        let flipped = Affine3A::from_scale_rotation_translation(
            Vec3::new(1.0, -1.0, 1.0),
            rotation,
            translation,
        );
        let local = base.inverse().transform_point3(camera.position);
        let position = flipped.transform_point3(local);

        let normal = rotation * Vec3::Y;
        let forward = mirror_by_normal(camera.rotation * Vec3::NEG_Z, normal);
        let right = mirror_by_normal(camera.rotation * Vec3::X, normal);
        let up = right.cross(forward).normalize_or_zero();
        let right = forward.cross(up).normalize_or_zero();
        let mirrored = Quat::from_mat3(&Mat3::from_cols(right, up, -forward.normalize_or_zero()));

        CaptureView {
            position,
            rotation: mirrored,
            fov: camera.fov,
            clip_plane_base: translation,
            clip_plane_normal: normal,
            clip_plane_enabled: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn target_size_has_floor() {
        assert_eq!(compute_target_size(UVec2::new(10, 10), 1.0), UVec2::splat(2));
        assert_eq!(compute_target_size(UVec2::ZERO, 50.0), UVec2::splat(2));
    }

    #[test]
    fn target_size_floors_fraction() {
        assert_eq!(
            compute_target_size(UVec2::new(1919, 1079), 50.0),
            UVec2::new(959, 539)
        );
    }

    #[test]
    fn mirror_preserves_tangent() {
        let v = Vec3::new(1.0, 0.0, 0.0);
        assert_eq!(mirror_by_normal(v, Vec3::Y), v);
    }

    #[test]
    fn mirror_flips_normal_component() {
        let v = Vec3::new(0.0, 3.0, 0.0);
        assert_eq!(mirror_by_normal(v, Vec3::Y), Vec3::new(0.0, -3.0, 0.0));
    }
}
