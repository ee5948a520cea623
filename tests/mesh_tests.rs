//! Composite Mesh Tests
//!
//! Tests for:
//! - Stencil assignment of the render components and the DoF bypass twin set
//! - Soft mask mode switching the soft mask component's base material
//! - Mode-derived mask parameters and component visibility
//! - Derived material parameters pushed on configuration updates

use chroma::mesh::{SOFT_MASK_CUSTOM_VALUE_PARAM, SOFT_MASK_VERTEX_COLOR_PARAM, stencil};
use chroma::subsystem::CompositorSubsystem;
use chroma::{CompositeMesh, RenderSoftMaskType};

#[test]
fn components_carry_soft_mask_stencils() {
    let mut subsystem = CompositorSubsystem::new();
    let key = subsystem.add_mesh("Wall");
    let mesh = &subsystem.meshes[key];

    assert_eq!(mesh.opaque.stencil_value, Some(stencil::OPAQUE_SOFT_MASK));
    assert_eq!(mesh.stencil.stencil_value, Some(stencil::TRANSLUCENT_SOFT_MASK));
    assert_eq!(mesh.translucent.stencil_value, None);
    assert_eq!(mesh.soft_mask.stencil_value, None);
}

#[test]
fn bypass_depth_of_field_swaps_stencil_set() {
    let mut subsystem = CompositorSubsystem::new();
    let key = subsystem.add_mesh("Wall");

    let mesh = &mut subsystem.meshes[key];
    mesh.set_bypass_depth_of_field(true);
    assert_eq!(mesh.opaque.stencil_value, Some(stencil::OPAQUE_SOFT_MASK_NO_DOF));
    assert_eq!(
        mesh.stencil.stencil_value,
        Some(stencil::TRANSLUCENT_SOFT_MASK_NO_DOF)
    );

    mesh.set_bypass_depth_of_field(false);
    assert_eq!(mesh.opaque.stencil_value, Some(stencil::OPAQUE_SOFT_MASK));
}

#[test]
fn soft_mask_mode_switches_base_material() {
    let mut subsystem = CompositorSubsystem::new();
    let key = subsystem.add_mesh("Wall");
    let base = *subsystem.base_materials();

    let mesh = &mut subsystem.meshes[key];
    assert_eq!(mesh.soft_mask.material.parent(), base.soft_mask_opaque);

    mesh.set_render_soft_mask(
        RenderSoftMaskType::TranslucentVertexColorAlpha,
        &base,
        &subsystem.assets,
    );
    assert_eq!(mesh.soft_mask.material.parent(), base.soft_mask_translucent);

    mesh.set_render_soft_mask(RenderSoftMaskType::OpaqueWhite, &base, &subsystem.assets);
    assert_eq!(mesh.soft_mask.material.parent(), base.soft_mask_opaque);
}

#[test]
fn opaque_black_mode_hides_scene_components() {
    let mut subsystem = CompositorSubsystem::new();
    let key = subsystem.add_mesh("Wall");
    let base = *subsystem.base_materials();

    // The default mode renders the mesh only as a mask.
    let mesh = &mut subsystem.meshes[key];
    assert_eq!(mesh.render_soft_mask(), RenderSoftMaskType::OpaqueBlack);
    assert!(!mesh.opaque.visible);
    assert!(!mesh.stencil.visible);
    assert!(mesh.translucent.visible);

    mesh.set_render_soft_mask(RenderSoftMaskType::OpaqueWhite, &base, &subsystem.assets);
    assert!(mesh.opaque.visible);
    assert!(mesh.stencil.visible);

    mesh.set_render_soft_mask(RenderSoftMaskType::OpaqueBlack, &base, &subsystem.assets);
    assert!(!mesh.opaque.visible);
    assert!(!mesh.stencil.visible);
}

#[test]
fn soft_mask_mode_drives_mask_parameters() {
    let mut subsystem = CompositorSubsystem::new();
    let key = subsystem.add_mesh("Wall");
    let base = *subsystem.base_materials();

    let mesh = &mut subsystem.meshes[key];
    let custom = |m: &CompositeMesh| m.soft_mask.material.scalar(SOFT_MASK_CUSTOM_VALUE_PARAM);
    let vertex = |m: &CompositeMesh| m.soft_mask.material.scalar(SOFT_MASK_VERTEX_COLOR_PARAM);

    assert_eq!(custom(mesh), Some(0.0));
    assert_eq!(vertex(mesh), Some(0.0));

    mesh.set_render_soft_mask(RenderSoftMaskType::OpaqueWhite, &base, &subsystem.assets);
    assert_eq!(custom(mesh), Some(1.0));
    assert_eq!(vertex(mesh), Some(0.0));

    mesh.set_render_soft_mask(RenderSoftMaskType::OpaqueVertexColorAlpha, &base, &subsystem.assets);
    assert_eq!(custom(mesh), Some(0.0));
    assert_eq!(vertex(mesh), Some(1.0));

    // The translucent soft mask material declares neither parameter.
    mesh.set_render_soft_mask(RenderSoftMaskType::TranslucentVertexColorAlpha, &base, &subsystem.assets);
    assert_eq!(custom(mesh), None);
    assert_eq!(vertex(mesh), None);
}

#[test]
fn shadows_param_follows_enable_media_shadows() {
    let mut subsystem = CompositorSubsystem::new();
    let key = subsystem.add_mesh("Wall");
    subsystem.register_mesh(key);
    subsystem.find_or_add_world_data();

    let world_composite = subsystem.world_data().unwrap().world_composite();
    let mut resolved = subsystem.composites.resolve_all(world_composite);

    let mesh = &mut subsystem.meshes[key];
    mesh.receive_shadows_intensity = 0.75;
    mesh.on_composite_update(&resolved);
    assert_eq!(
        mesh.opaque.material.scalar(chroma::mesh::SHADOWS_INTENSITY_PARAM),
        Some(0.75)
    );

    resolved.enable_media_shadows = false;
    mesh.on_composite_update(&resolved);
    assert_eq!(
        mesh.opaque.material.scalar(chroma::mesh::SHADOWS_INTENSITY_PARAM),
        Some(0.0)
    );
}
