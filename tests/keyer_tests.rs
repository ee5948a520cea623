//! Keyer Binding Tests
//!
//! Tests for:
//! - Binding only the parameters the keying material declares
//! - Per-frame value pushes and the draw into the keyer target
//! - Missing material / stale material recovery
//! - Keyer asset forwarding and enabled-chain evaluation

use chroma::frame::{FrameCommands, RenderOp};
use chroma::keyer::{
    self, CompositeKeyer, KeyerBinding, KeyerData, KeyerKey, MEDIA_INPUT_PARAM,
};
use chroma::materials::{
    CompositeAssets, MaterialDesc, MaterialHandle, MaterialInstance, MidKey, RenderTarget,
    RenderTargetKey,
};
use glam::{UVec2, Vec4};
use slotmap::SlotMap;

struct Rig {
    assets: CompositeAssets,
    instances: SlotMap<MidKey, MaterialInstance>,
    target: RenderTargetKey,
    material: MaterialHandle,
}

fn rig() -> Rig {
    let mut assets = CompositeAssets::new();
    let material = assets.add_material(
        MaterialDesc::new("M_ChromaKey")
            .with_scalars(&["ClipBlack", "ClipWhite", "EnableDespill"])
            .with_vectors(&["KeyColor"])
            .with_textures(&[MEDIA_INPUT_PARAM]),
    );
    let target = assets.add_render_target(RenderTarget::new("RT_Keyer", UVec2::new(1920, 1080)));
    Rig {
        assets,
        instances: SlotMap::with_key(),
        target,
        material,
    }
}

// ============================================================================
// Binding
// ============================================================================

#[test]
fn initialize_binds_declared_parameters_only() {
    let mut rig = rig();
    let mut keyer = CompositeKeyer::new("Keyer");
    keyer.material = Some(rig.material);

    let mut binding = KeyerBinding::new();
    binding
        .initialize(&keyer, &rig.assets, &mut rig.instances)
        .unwrap();
    assert!(binding.is_bound());

    let instance = &rig.instances[binding.instance_key().unwrap()];
    assert_eq!(instance.scalar("ClipBlack"), Some(0.0));
    assert_eq!(instance.scalar("EnableDespill"), Some(1.0));
    assert_eq!(instance.vector("KeyColor"), Some(Vec4::new(0.0, 1.0, 0.0, 1.0)));
    // EdgeSoftness exists in the table but not on this material.
    assert_eq!(instance.scalar("EdgeSoftness"), None);
}

#[test]
fn missing_material_leaves_binding_idle() {
    let _ = env_logger::builder().is_test(true).try_init();
    let mut rig = rig();
    let keyer = CompositeKeyer::new("Keyer");

    let mut binding = KeyerBinding::new();
    assert!(binding.initialize(&keyer, &rig.assets, &mut rig.instances).is_err());
    assert!(!binding.is_bound());

    let mut frame = FrameCommands::new();
    binding.update(
        &keyer,
        None,
        rig.target,
        &rig.assets,
        &mut rig.instances,
        &mut frame,
    );
    assert!(frame.is_empty());
}

#[test]
fn update_pushes_values_and_draws() {
    let mut rig = rig();
    let mut keyer = CompositeKeyer::new("Keyer");
    keyer.material = Some(rig.material);
    keyer.properties.clip_black = 0.2;

    let mut binding = KeyerBinding::new();
    let mut frame = FrameCommands::new();
    binding.update(
        &keyer,
        None,
        rig.target,
        &rig.assets,
        &mut rig.instances,
        &mut frame,
    );

    let mid = binding.instance_key().unwrap();
    assert_eq!(
        frame.ops(),
        &[RenderOp::DrawMaterial {
            target: rig.target,
            material: mid
        }]
    );
    assert_eq!(rig.instances[mid].scalar("ClipBlack"), Some(0.2));

    // Values keep flowing on subsequent updates.
    keyer.properties.clip_black = 0.4;
    binding.update(
        &keyer,
        None,
        rig.target,
        &rig.assets,
        &mut rig.instances,
        &mut frame,
    );
    assert_eq!(rig.instances[mid].scalar("ClipBlack"), Some(0.4));
}

#[test]
fn dangling_material_is_not_retried_until_changed() {
    let _ = env_logger::builder().is_test(true).try_init();
    let mut rig = rig();
    let mut keyer = CompositeKeyer::new("Keyer");
    keyer.material = Some(rig.material);
    rig.assets.materials.remove(rig.material);

    let mut binding = KeyerBinding::new();
    let mut frame = FrameCommands::new();
    for _ in 0..3 {
        binding.update(
            &keyer,
            None,
            rig.target,
            &rig.assets,
            &mut rig.instances,
            &mut frame,
        );
    }
    assert!(!binding.is_bound());
    assert!(frame.is_empty());
    assert!(rig.instances.is_empty());

    // Assigning a live material recovers the binding.
    let replacement = rig
        .assets
        .add_material(MaterialDesc::new("M_ChromaKeyV2").with_scalars(&["ClipBlack"]));
    keyer.material = Some(replacement);
    binding.update(
        &keyer,
        None,
        rig.target,
        &rig.assets,
        &mut rig.instances,
        &mut frame,
    );
    assert!(binding.is_bound());
    assert_eq!(frame.len(), 1);
}

#[test]
fn stale_material_triggers_rebind() {
    let mut rig = rig();
    let mut keyer = CompositeKeyer::new("Keyer");
    keyer.material = Some(rig.material);

    let mut binding = KeyerBinding::new();
    let mut frame = FrameCommands::new();
    binding.update(
        &keyer,
        None,
        rig.target,
        &rig.assets,
        &mut rig.instances,
        &mut frame,
    );

    let replacement = rig.assets.add_material(
        MaterialDesc::new("M_ChromaKeyV2").with_scalars(&["ClipBlack"]),
    );
    keyer.material = Some(replacement);
    binding.update(
        &keyer,
        None,
        rig.target,
        &rig.assets,
        &mut rig.instances,
        &mut frame,
    );

    let instance = &rig.instances[binding.instance_key().unwrap()];
    assert_eq!(instance.parent(), replacement);
}

// ============================================================================
// Asset Forwarding
// ============================================================================

#[test]
fn reference_forwards_to_concrete_keyer() {
    let mut keyers: SlotMap<KeyerKey, KeyerData> = SlotMap::with_key();
    let inline = keyers.insert(KeyerData::Inline(CompositeKeyer::new("Inner")));
    let reference = keyers.insert(KeyerData::FromAsset {
        enabled: true,
        asset: Some(inline),
    });

    let resolved = keyer::resolve_keyer(&keyers, reference).unwrap();
    assert_eq!(resolved.name, "Inner");
    assert!(keyer::is_keyer_enabled(&keyers, reference));
}

#[test]
fn disabled_link_gates_the_chain() {
    let mut keyers: SlotMap<KeyerKey, KeyerData> = SlotMap::with_key();
    let inline = keyers.insert(KeyerData::Inline(CompositeKeyer::new("Inner")));
    let reference = keyers.insert(KeyerData::FromAsset {
        enabled: false,
        asset: Some(inline),
    });

    assert!(!keyer::is_keyer_enabled(&keyers, reference));
    assert!(!keyer::is_keyer_enabled(&keyers, KeyerKey::default()));
}

#[test]
fn reference_cycle_resolves_to_nothing() {
    let mut keyers: SlotMap<KeyerKey, KeyerData> = SlotMap::with_key();
    let a = keyers.insert(KeyerData::FromAsset {
        enabled: true,
        asset: None,
    });
    let b = keyers.insert(KeyerData::FromAsset {
        enabled: true,
        asset: Some(a),
    });
    keyers[a] = KeyerData::FromAsset {
        enabled: true,
        asset: Some(b),
    };

    assert!(keyer::resolve_keyer(&keyers, a).is_none());
    assert!(!keyer::is_keyer_enabled(&keyers, a));
}
