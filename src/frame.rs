//! Per-frame inputs and outputs of the orchestrator.
//!
//! The host feeds a [`TickContext`] in and drains an ordered
//! [`FrameCommands`] list out; nothing in the core touches a GPU.

use glam::{Quat, UVec2, Vec3, Vec4};

use crate::capture::{CapturePassKind, CaptureView};
use crate::lens::LensCalibration;
use crate::materials::{MidKey, RenderTargetKey};
use crate::world::WorldType;

/// A camera position, orientation and horizontal field of view in degrees.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CameraPose {
    pub position: Vec3,
    pub rotation: Quat,
    pub fov: f32,
}

impl Default for CameraPose {
    fn default() -> Self {
        Self {
            position: Vec3::ZERO,
            rotation: Quat::IDENTITY,
            fov: crate::capture::DEFAULT_FIELD_OF_VIEW,
        }
    }
}

/// Everything the host knows about the current frame.
#[derive(Clone, Debug, Default)]
pub struct TickContext {
    pub world_type: WorldType,
    /// Headless worlds (servers, cookers) never run the compositing tick.
    pub headless: bool,
    pub player_camera: Option<CameraPose>,
    /// Pose of the editor viewport camera, supplied in editor worlds.
    pub editor_camera: Option<CameraPose>,
    pub lens: Option<LensCalibration>,
}

/// Rendering mode of a view, for post-process gating.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ViewMode {
    #[default]
    Lit,
    Unlit,
    Wireframe,
}

/// Description of the view about to be rendered.
#[derive(Clone, Copy, Debug, Default)]
pub struct ViewInfo {
    pub is_scene_capture: bool,
    pub view_mode: ViewMode,
    pub post_processing: bool,
}

/// One render command for the host, in submission order.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum RenderOp {
    ResizeTarget {
        target: RenderTargetKey,
        size: UVec2,
    },
    ClearTarget {
        target: RenderTargetKey,
        color: Vec4,
    },
    DrawMaterial {
        target: RenderTargetKey,
        material: MidKey,
    },
    CaptureScene {
        pass: CapturePassKind,
        target: RenderTargetKey,
        view: CaptureView,
    },
}

/// Ordered command list produced by one tick.
#[derive(Debug, Default)]
pub struct FrameCommands {
    ops: Vec<RenderOp>,
}

impl FrameCommands {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, op: RenderOp) {
        self.ops.push(op);
    }

    #[must_use]
    pub fn ops(&self) -> &[RenderOp] {
        &self.ops
    }

    pub fn clear(&mut self) {
        self.ops.clear();
    }

    /// Hands the frame's commands to the host and resets the list.
    pub fn drain(&mut self) -> Vec<RenderOp> {
        std::mem::take(&mut self.ops)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.ops.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }
}

/// Host viewport the pipeline may pin to the media resolution.
#[derive(Clone, Copy, Debug, Default)]
pub struct Viewport {
    pub size: UVec2,
    /// When set, the host must present at exactly this size.
    pub fixed_size: Option<UVec2>,
}
