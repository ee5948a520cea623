//! Lens and undistortion state.

use crate::capture::{DEFAULT_FIELD_OF_VIEW, MIN_FIELD_OF_VIEW};
use crate::materials::TextureHandle;

/// Lens calibration the host supplies when a calibrated lens is live.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LensCalibration {
    /// UV displacement map encoding the undistortion.
    pub displacement_map: TextureHandle,
    /// How much the capture overscans to survive undistortion.
    pub overscan_factor: f32,
    /// Horizontal field of view of the calibrated lens, in degrees.
    pub calibrated_fov: f32,
}

/// Current lens state, updated every tick.
#[derive(Clone, Copy, Debug)]
pub struct LensState {
    pub fov_without_overscan: f32,
    pub overscan_factor: f32,
    pub undistortion_texture: TextureHandle,
}

impl LensState {
    /// Identity state: default FOV, no overscan, identity displacement.
    #[must_use]
    pub fn identity(default_texture: TextureHandle) -> Self {
        Self {
            fov_without_overscan: DEFAULT_FIELD_OF_VIEW,
            overscan_factor: 1.0,
            undistortion_texture: default_texture,
        }
    }

    /// Applies calibration when present, falling back to the camera FOV and
    /// the identity displacement otherwise. FOV never drops below the clamp.
    pub fn update(
        &mut self,
        calibration: Option<&LensCalibration>,
        camera_fov: f32,
        default_texture: TextureHandle,
    ) {
        match calibration {
            Some(lens) => {
                self.fov_without_overscan = lens.calibrated_fov.max(MIN_FIELD_OF_VIEW);
                self.overscan_factor = lens.overscan_factor;
                self.undistortion_texture = lens.displacement_map;
            }
            None => {
                self.fov_without_overscan = camera_fov.max(MIN_FIELD_OF_VIEW);
                self.overscan_factor = 1.0;
                self.undistortion_texture = default_texture;
            }
        }
    }
}
