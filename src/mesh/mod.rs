//! Composited meshes.
//!
//! A composite mesh is one piece of geometry rendered through four
//! coordinated components sharing a transform: the opaque base, a
//! stencil-writing duplicate, a translucent duplicate and a soft mask
//! component. Each component owns a material instance built from one of the
//! five base materials; derived parameter indices are resolved once at
//! construction and pushed by index on every configuration update.

pub mod stencil;

use glam::Affine3A;
use uuid::Uuid;

use crate::composite::{RenderSoftMaskType, ResolvedComposite};
use crate::materials::{CompositeAssets, MaterialHandle, MaterialInstance};
use crate::mesh::stencil::{StencilRole, stencil_value};

slotmap::new_key_type! {
    /// Stable identity of a mesh in the world's mesh store.
    pub struct MeshKey;
}

/// Scalar parameter carrying the mesh's shadow contribution.
pub const SHADOWS_INTENSITY_PARAM: &str = "ShadowsIntensity";
/// Scalar parameter scaling the planar reflection color on this mesh.
pub const REFLECTION_INTENSITY_PARAM: &str = "PlanarReflectionColorIntensity";
/// Scalar parameter controlling how much the mesh occludes the reflection background.
pub const REFLECTION_OCCLUSION_PARAM: &str = "PlanarReflectionBackgroundOcclusion";
/// Scalar on the opaque soft mask material: render a custom mask value (white mode).
pub const SOFT_MASK_CUSTOM_VALUE_PARAM: &str = "CustomValue";
/// Scalar on the opaque soft mask material: take the mask from vertex color alpha.
pub const SOFT_MASK_VERTEX_COLOR_PARAM: &str = "RenderVertexColor";

/// The five base materials composite mesh components are built from.
#[derive(Clone, Copy, Debug)]
pub struct BaseMaterials {
    pub opaque: MaterialHandle,
    pub stencil: MaterialHandle,
    pub translucent: MaterialHandle,
    pub soft_mask_opaque: MaterialHandle,
    pub soft_mask_translucent: MaterialHandle,
}

/// One render component of a composite mesh.
#[derive(Clone, Debug)]
pub struct MeshComponent {
    pub visible: bool,
    pub stencil_value: Option<u8>,
    pub material: MaterialInstance,
    shadows_index: Option<usize>,
    reflection_intensity_index: Option<usize>,
    reflection_occlusion_index: Option<usize>,
    custom_value_index: Option<usize>,
    vertex_color_index: Option<usize>,
}

impl MeshComponent {
    fn new(assets: &CompositeAssets, parent: MaterialHandle, stencil: Option<u8>) -> Self {
        let mut material = MaterialInstance::new(parent);
        let mut shadows_index = None;
        let mut reflection_intensity_index = None;
        let mut reflection_occlusion_index = None;
        let mut custom_value_index = None;
        let mut vertex_color_index = None;
        if let Some(desc) = assets.materials.get(parent) {
            shadows_index = material.init_scalar(desc, SHADOWS_INTENSITY_PARAM, 1.0);
            reflection_intensity_index = material.init_scalar(desc, REFLECTION_INTENSITY_PARAM, 1.0);
            reflection_occlusion_index = material.init_scalar(desc, REFLECTION_OCCLUSION_PARAM, 0.0);
            custom_value_index = material.init_scalar(desc, SOFT_MASK_CUSTOM_VALUE_PARAM, 1.0);
            vertex_color_index = material.init_scalar(desc, SOFT_MASK_VERTEX_COLOR_PARAM, 1.0);
        }
        Self {
            visible: true,
            stencil_value: stencil,
            material,
            shadows_index,
            reflection_intensity_index,
            reflection_occlusion_index,
            custom_value_index,
            vertex_color_index,
        }
    }
}

/// A piece of composited scene geometry.
#[derive(Clone, Debug)]
pub struct CompositeMesh {
    pub uuid: Uuid,
    pub name: String,
    /// Transient meshes (previews, spawned editor helpers) never register.
    pub transient: bool,
    pub transform: Affine3A,
    pub two_sided: bool,

    pub receive_shadows_intensity: f32,
    pub planar_reflection_color_intensity: f32,
    pub planar_reflection_background_occlusion: f32,

    bypass_depth_of_field: bool,
    render_soft_mask: RenderSoftMaskType,

    pub opaque: MeshComponent,
    pub stencil: MeshComponent,
    pub translucent: MeshComponent,
    pub soft_mask: MeshComponent,

    version: u64,
}

impl CompositeMesh {
    #[must_use]
    pub fn new(name: &str, base: &BaseMaterials, assets: &CompositeAssets) -> Self {
        let bypass = false;
        let mut mesh = Self {
            uuid: Uuid::new_v4(),
            name: name.to_owned(),
            transient: false,
            transform: Affine3A::IDENTITY,
            two_sided: false,
            receive_shadows_intensity: 1.0,
            planar_reflection_color_intensity: 1.0,
            planar_reflection_background_occlusion: 0.0,
            bypass_depth_of_field: bypass,
            render_soft_mask: RenderSoftMaskType::default(),
            opaque: MeshComponent::new(
                assets,
                base.opaque,
                Some(stencil_value(StencilRole::OpaqueSoftMask, bypass)),
            ),
            stencil: MeshComponent::new(
                assets,
                base.stencil,
                Some(stencil_value(StencilRole::TranslucentSoftMask, bypass)),
            ),
            translucent: MeshComponent::new(assets, base.translucent, None),
            soft_mask: MeshComponent::new(assets, base.soft_mask_opaque, None),
            version: 0,
        };
        mesh.apply_render_soft_mask();
        mesh
    }

    #[must_use]
    pub fn bypass_depth_of_field(&self) -> bool {
        self.bypass_depth_of_field
    }

    /// Toggling the bypass swaps the components over to the twin stencil set.
    pub fn set_bypass_depth_of_field(&mut self, bypass: bool) {
        self.bypass_depth_of_field = bypass;
        self.opaque.stencil_value = Some(stencil_value(StencilRole::OpaqueSoftMask, bypass));
        self.stencil.stencil_value = Some(stencil_value(StencilRole::TranslucentSoftMask, bypass));
    }

    #[must_use]
    pub fn render_soft_mask(&self) -> RenderSoftMaskType {
        self.render_soft_mask
    }

    /// Switches the soft mask mode: rebuilds the soft mask component when the
    /// translucency of the mode changes its base material, pushes the
    /// mode-derived mask parameters and re-derives component visibility.
    /// `OpaqueBlack` geometry exists only as a mask, so its opaque and
    /// stencil components do not render into the scene.
    pub fn set_render_soft_mask(
        &mut self,
        mode: RenderSoftMaskType,
        base: &BaseMaterials,
        assets: &CompositeAssets,
    ) {
        let parent = if mode.is_translucent() {
            base.soft_mask_translucent
        } else {
            base.soft_mask_opaque
        };
        if self.render_soft_mask.is_translucent() != mode.is_translucent() {
            self.soft_mask = MeshComponent::new(assets, parent, None);
        }
        self.render_soft_mask = mode;
        self.apply_render_soft_mask();
    }

    fn apply_render_soft_mask(&mut self) {
        let mode = self.render_soft_mask;
        if let Some(i) = self.soft_mask.custom_value_index {
            self.soft_mask
                .material
                .set_scalar_by_index(i, f32::from(u8::from(mode == RenderSoftMaskType::OpaqueWhite)));
        }
        if let Some(i) = self.soft_mask.vertex_color_index {
            self.soft_mask.material.set_scalar_by_index(
                i,
                f32::from(u8::from(mode == RenderSoftMaskType::OpaqueVertexColorAlpha)),
            );
        }
        let opaque_black = mode == RenderSoftMaskType::OpaqueBlack;
        self.opaque.visible = !opaque_black;
        self.stencil.visible = !opaque_black;
        self.translucent.visible = true;
    }

    /// Number of configuration updates this mesh has received.
    #[must_use]
    pub fn version(&self) -> u64 {
        self.version
    }

    fn components_mut(&mut self) -> [&mut MeshComponent; 4] {
        [
            &mut self.opaque,
            &mut self.stencil,
            &mut self.translucent,
            &mut self.soft_mask,
        ]
    }

    /// Applies a newly resolved configuration, pushing the derived material
    /// parameters by their cached indices.
    pub fn on_composite_update(&mut self, resolved: &ResolvedComposite) {
        let shadows = if resolved.enable_media_shadows {
            self.receive_shadows_intensity
        } else {
            0.0
        };
        let reflection_intensity = self.planar_reflection_color_intensity;
        let reflection_occlusion = self.planar_reflection_background_occlusion;

        for component in self.components_mut() {
            if let Some(i) = component.shadows_index {
                component.material.set_scalar_by_index(i, shadows);
            }
            if let Some(i) = component.reflection_intensity_index {
                component.material.set_scalar_by_index(i, reflection_intensity);
            }
            if let Some(i) = component.reflection_occlusion_index {
                component.material.set_scalar_by_index(i, reflection_occlusion);
            }
        }
        self.version += 1;
    }
}
