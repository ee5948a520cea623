//! Closed enumerations shared by the composite configuration model.

use serde::{Deserialize, Serialize};

/// Color encoding applied to the composited RGB output.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum OutputRgbEncoding {
    /// Raw linear output, for pipelines that encode later.
    Linear,
    /// sRGB encoded output, the common case for direct display.
    #[default]
    Srgb,
}

/// Where the media input is blended into the scene relative to the tone curve.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum MediaBlend {
    /// Media is not blended in at all.
    None,
    /// Blend before tone mapping, so the media runs through the scene tone curve.
    PreToneCurve,
    /// Blend after tone mapping, keeping the media untouched by the tone curve.
    #[default]
    PostToneCurve,
}

/// What the alpha channel of the composited output carries.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum OutputAlpha {
    /// Alpha forced to zero.
    Black,
    /// Alpha forced to one.
    White,
    /// Opacity of the composited meshes.
    #[default]
    Opacity,
    /// Inverted mesh opacity, for hosts that expect a background matte.
    InvertedOpacity,
}

/// How a mesh renders into the soft mask capture.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum RenderSoftMaskType {
    /// Opaque, fully masked out.
    #[default]
    OpaqueBlack,
    /// Opaque, fully included.
    OpaqueWhite,
    /// Opaque, mask weight taken from vertex color alpha.
    OpaqueVertexColorAlpha,
    /// Translucent, mask weight taken from vertex color alpha.
    TranslucentVertexColorAlpha,
}

impl RenderSoftMaskType {
    /// Whether this mode renders with the translucent soft mask material.
    #[must_use]
    pub fn is_translucent(self) -> bool {
        matches!(self, Self::TranslucentVertexColorAlpha)
    }
}
