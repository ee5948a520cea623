//! Mesh Registration Tests
//!
//! Tests for:
//! - Idempotent register/unregister and transient rejection
//! - The soft mask show-only list following registration
//! - Configuration fan-out: immediate delivery, late registration, ancestry

use chroma::subsystem::CompositorSubsystem;

// ============================================================================
// Registration
// ============================================================================

#[test]
fn register_is_idempotent() {
    let mut subsystem = CompositorSubsystem::new();
    let key = subsystem.add_mesh("Wall");

    assert!(subsystem.register_mesh(key));
    assert!(!subsystem.register_mesh(key));
    assert_eq!(subsystem.registry.len(), 1);
    assert_eq!(subsystem.registry.soft_mask_show_only().len(), 1);
}

#[test]
fn transient_meshes_never_register() {
    let mut subsystem = CompositorSubsystem::new();
    let key = subsystem.add_mesh("Preview");
    subsystem.meshes[key].transient = true;

    assert!(!subsystem.register_mesh(key));
    assert!(subsystem.registry.is_empty());
}

#[test]
fn unregister_is_idempotent() {
    let mut subsystem = CompositorSubsystem::new();
    let key = subsystem.add_mesh("Wall");
    subsystem.register_mesh(key);

    subsystem.unregister_mesh(key);
    subsystem.unregister_mesh(key);
    assert!(subsystem.registry.is_empty());
    assert!(subsystem.registry.soft_mask_show_only().is_empty());
}

// ============================================================================
// Configuration Fan-Out
// ============================================================================

#[test]
fn registration_with_active_config_delivers_immediately() {
    let mut subsystem = CompositorSubsystem::new();
    subsystem.find_or_add_world_data();

    let key = subsystem.add_mesh("Wall");
    subsystem.register_mesh(key);
    assert_eq!(subsystem.meshes[key].version(), 1);
}

#[test]
fn late_registration_receives_exactly_one_update() {
    let mut subsystem = CompositorSubsystem::new();
    let key = subsystem.add_mesh("Wall");
    subsystem.register_mesh(key);
    assert_eq!(subsystem.meshes[key].version(), 0);

    // World data appears: the now-active configuration reaches the mesh once.
    subsystem.find_or_add_world_data();
    assert_eq!(subsystem.meshes[key].version(), 1);

    // An idle tick must not deliver it again.
    subsystem.tick(&chroma::TickContext::default());
    assert_eq!(subsystem.meshes[key].version(), 1);
}

#[test]
fn active_composite_change_broadcasts_on_tick() {
    let mut subsystem = CompositorSubsystem::new();
    subsystem.find_or_add_world_data();
    let key = subsystem.add_mesh("Wall");
    subsystem.register_mesh(key);
    let world_composite = subsystem.world_data().unwrap().world_composite();

    subsystem
        .composites
        .composite_mut(world_composite)
        .unwrap()
        .set_shadows_gamma(2.0);
    subsystem.tick(&chroma::TickContext::default());
    assert_eq!(subsystem.meshes[key].version(), 2);
}

#[test]
fn ancestor_change_broadcasts_on_tick() {
    let mut subsystem = CompositorSubsystem::new();
    subsystem.find_or_add_world_data();
    let key = subsystem.add_mesh("Wall");
    subsystem.register_mesh(key);
    let world_composite = subsystem.world_data().unwrap().world_composite();

    let parent = subsystem
        .composites
        .add(chroma::Composite::new("ShowDefaults"));
    subsystem
        .composites
        .set_parent(world_composite, Some(parent))
        .unwrap();
    subsystem.tick(&chroma::TickContext::default());
    let after_parenting = subsystem.meshes[key].version();

    subsystem
        .composites
        .composite_mut(parent)
        .unwrap()
        .set_shadows_gamma(2.0);
    subsystem.tick(&chroma::TickContext::default());
    assert_eq!(subsystem.meshes[key].version(), after_parenting + 1);
}

#[test]
fn unrelated_composite_change_does_not_broadcast() {
    let mut subsystem = CompositorSubsystem::new();
    subsystem.find_or_add_world_data();
    let key = subsystem.add_mesh("Wall");
    subsystem.register_mesh(key);

    let unrelated = subsystem.composites.add(chroma::Composite::new("Other"));
    subsystem
        .composites
        .composite_mut(unrelated)
        .unwrap()
        .set_shadows_gamma(2.0);
    subsystem.tick(&chroma::TickContext::default());
    assert_eq!(subsystem.meshes[key].version(), 1);
}
