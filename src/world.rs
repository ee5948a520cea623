//! Per-world compositing state.

use serde::{Deserialize, Serialize};

use crate::capture::ReflectionKey;
use crate::composite::CompositeKey;
use crate::frame::CameraPose;

/// What kind of world is being ticked.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum WorldType {
    Editor,
    #[default]
    Game,
    /// Play-in-editor session.
    Pie,
}

impl WorldType {
    /// Game and PIE worlds drive a live viewport.
    #[must_use]
    pub fn is_play(self) -> bool {
        matches!(self, Self::Game | Self::Pie)
    }
}

/// A debug camera override configured on the world.
#[derive(Clone, Copy, Debug)]
pub struct DebugCamera {
    pub pose: CameraPose,
    pub enabled: bool,
    /// Debug cameras normally only apply in editor worlds.
    pub allow_in_play_mode: bool,
}

/// Compositing state attached to one world, created on demand.
///
/// Holds the world composite (the active configuration root), the viewport
/// coupling flags and the debug visualization toggles. At most one planar
/// reflection is designated per world.
#[derive(Debug)]
pub struct CompositeWorldData {
    world_composite: CompositeKey,

    pub is_compositing_enabled: bool,
    pub match_viewport_resolution_with_media_input: bool,
    pub auto_pilot_editor_preview_camera: bool,
    /// Off by default, camera motion blur causes artifacts when keying.
    pub enable_camera_motion_blur: bool,

    pub debug_camera: Option<DebugCamera>,
    /// Debug fade of the media over the scene, 0 to 1.
    pub debug_media_overlay: f32,

    pub(crate) planar_reflection: Option<ReflectionKey>,

    debug_visualize_composite_meshes: bool,
    debug_visualize_shadows: bool,
    debug_visualize_alpha_in_rgb: bool,
}

impl CompositeWorldData {
    #[must_use]
    pub fn new(world_composite: CompositeKey) -> Self {
        Self {
            world_composite,
            is_compositing_enabled: true,
            match_viewport_resolution_with_media_input: true,
            auto_pilot_editor_preview_camera: true,
            enable_camera_motion_blur: false,
            debug_camera: None,
            debug_media_overlay: 0.0,
            planar_reflection: None,
            debug_visualize_composite_meshes: false,
            debug_visualize_shadows: false,
            debug_visualize_alpha_in_rgb: false,
        }
    }

    /// The active configuration root of this world.
    #[must_use]
    pub fn world_composite(&self) -> CompositeKey {
        self.world_composite
    }

    /// The planar reflection currently designated for capture, if any.
    #[must_use]
    pub fn planar_reflection(&self) -> Option<ReflectionKey> {
        self.planar_reflection
    }

    /// Whether the debug camera takes precedence for capture views.
    #[must_use]
    pub fn is_debug_camera_allowed(&self, world_type: WorldType) -> bool {
        self.debug_camera.is_some_and(|cam| {
            cam.enabled && (world_type == WorldType::Editor || cam.allow_in_play_mode)
        })
    }

    // The three visualization toggles are mutually exclusive; enabling one
    // clears the other two.

    #[must_use]
    pub fn debug_visualize_composite_meshes(&self) -> bool {
        self.debug_visualize_composite_meshes
    }

    #[must_use]
    pub fn debug_visualize_shadows(&self) -> bool {
        self.debug_visualize_shadows
    }

    #[must_use]
    pub fn debug_visualize_alpha_in_rgb(&self) -> bool {
        self.debug_visualize_alpha_in_rgb
    }

    pub fn set_debug_visualize_composite_meshes(&mut self, enabled: bool) {
        self.debug_visualize_composite_meshes = enabled;
        if enabled {
            self.debug_visualize_shadows = false;
            self.debug_visualize_alpha_in_rgb = false;
        }
    }

    pub fn set_debug_visualize_shadows(&mut self, enabled: bool) {
        self.debug_visualize_shadows = enabled;
        if enabled {
            self.debug_visualize_composite_meshes = false;
            self.debug_visualize_alpha_in_rgb = false;
        }
    }

    pub fn set_debug_visualize_alpha_in_rgb(&mut self, enabled: bool) {
        self.debug_visualize_alpha_in_rgb = enabled;
        if enabled {
            self.debug_visualize_composite_meshes = false;
            self.debug_visualize_shadows = false;
        }
    }
}
