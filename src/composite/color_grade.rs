//! Color grading payload of a composite.
//!
//! Three independent ranges are graded: the captured scene, the media input,
//! and the combined result. Each range carries the usual five controls as
//! RGBA vectors (the W channel scales the whole control).

use glam::Vec4;
use serde::{Deserialize, Serialize};

/// One graded range: scene, media or combined.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct ColorGradePerRange {
    pub saturation: Vec4,
    pub contrast: Vec4,
    pub gamma: Vec4,
    pub gain: Vec4,
    pub offset: Vec4,
}

impl Default for ColorGradePerRange {
    fn default() -> Self {
        Self {
            saturation: Vec4::ONE,
            contrast: Vec4::ONE,
            gamma: Vec4::ONE,
            gain: Vec4::ONE,
            offset: Vec4::ZERO,
        }
    }
}

/// Full color grade payload of a composite node.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ColorGrade {
    pub scene: ColorGradePerRange,
    pub media: ColorGradePerRange,
    pub combined: ColorGradePerRange,
}
