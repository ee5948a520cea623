//! Composite Override Chain Tests
//!
//! Tests for:
//! - Class defaults when nothing in a chain overrides a property
//! - Local override short-circuit and delegation to the parent chain
//! - Parent assignment: round-trip, self-parenting, cycle rejection
//! - Change tracking: dirty list and version

use chroma::composite::{Composite, CompositeOverrides, CompositeStore};
use chroma::errors::ChromaError;
use chroma::{MediaBlend, OutputAlpha, OutputRgbEncoding};
use glam::Vec4;

// ============================================================================
// Class Defaults
// ============================================================================

#[test]
fn unset_chain_yields_class_defaults() {
    let mut store = CompositeStore::new();
    let a = store.add(Composite::new("A"));

    assert!(store.resolve_enable_media_shadows(a));
    assert_eq!(store.resolve_shadows_black_level(a), 0.0);
    assert_eq!(store.resolve_shadows_white_level(a), 1.0);
    assert_eq!(store.resolve_shadows_gamma(a), 1.0);
    assert_eq!(store.resolve_shadows_tint(a), Vec4::ZERO);
    assert!(store.resolve_enable_soft_mask(a));
    assert_eq!(store.resolve_soft_mask_screen_percentage(a), 25.0);
    assert!(!store.resolve_enable_planar_reflection(a));
    assert_eq!(
        store.resolve_planar_reflection_color(a),
        Vec4::new(1.0, 1.0, 1.0, 0.0)
    );
    assert_eq!(store.resolve_planar_reflection_screen_percentage(a), 50.0);
    assert_eq!(store.resolve_media_blend(a), MediaBlend::PostToneCurve);
    assert_eq!(store.resolve_brightness_mask_gamma(a), 1.0);
    assert!(store.resolve_apply_inverse_tone_curve(a));
    assert_eq!(store.resolve_output_rgb_encoding(a), OutputRgbEncoding::Srgb);
    assert_eq!(store.resolve_output_alpha(a), OutputAlpha::Opacity);
    assert!(store.resolve_media_input_texture(a).is_none());
    assert!(store.resolve_media_input_keyer(a).is_none());
}

#[test]
fn local_override_short_circuits() {
    let mut store = CompositeStore::new();
    let a = store.add(Composite::new("A"));

    store.composite_mut(a).unwrap().set_shadows_gamma(2.5);
    assert_eq!(store.resolve_shadows_gamma(a), 2.5);
}

#[test]
fn unset_override_delegates_to_parent() {
    let mut store = CompositeStore::new();
    let parent = store.add(Composite::new("Parent"));
    let child = store.add(Composite::new("Child"));
    store.set_parent(child, Some(parent)).unwrap();

    store.composite_mut(parent).unwrap().set_shadows_white_level(0.8);

    assert_eq!(
        store.resolve_shadows_white_level(child),
        store.resolve_shadows_white_level(parent)
    );
    assert_eq!(store.resolve_shadows_white_level(child), 0.8);
}

#[test]
fn chain_resolves_through_grandparent() {
    // A <- B <- C, only A overrides ShadowsGamma.
    let mut store = CompositeStore::new();
    let a = store.add(Composite::new("A"));
    let b = store.add(Composite::new("B"));
    let c = store.add(Composite::new("C"));
    store.set_parent(b, Some(a)).unwrap();
    store.set_parent(c, Some(b)).unwrap();

    store.composite_mut(a).unwrap().set_shadows_gamma(2.0);

    assert_eq!(store.resolve_shadows_gamma(c), 2.0);
}

#[test]
fn clearing_override_restores_inheritance() {
    let mut store = CompositeStore::new();
    let parent = store.add(Composite::new("Parent"));
    let child = store.add(Composite::new("Child"));
    store.set_parent(child, Some(parent)).unwrap();

    store.composite_mut(parent).unwrap().set_shadows_gamma(3.0);
    store.composite_mut(child).unwrap().set_shadows_gamma(1.5);
    assert_eq!(store.resolve_shadows_gamma(child), 1.5);

    store
        .composite_mut(child)
        .unwrap()
        .clear_overrides(CompositeOverrides::SHADOWS_GAMMA);
    assert_eq!(store.resolve_shadows_gamma(child), 3.0);
}

// ============================================================================
// Parent Assignment
// ============================================================================

#[test]
fn set_parent_round_trips() {
    let mut store = CompositeStore::new();
    let parent = store.add(Composite::new("Parent"));
    let child = store.add(Composite::new("Child"));

    store.set_parent(child, Some(parent)).unwrap();
    assert_eq!(store.get(child).unwrap().parent(), Some(parent));

    store.set_parent(child, None).unwrap();
    assert_eq!(store.get(child).unwrap().parent(), None);
}

#[test]
fn self_parent_is_rejected() {
    let _ = env_logger::builder().is_test(true).try_init();
    let mut store = CompositeStore::new();
    let a = store.add(Composite::new("A"));

    let err = store.set_parent(a, Some(a)).unwrap_err();
    assert!(matches!(err, ChromaError::CompositeCycle(_)));
    assert_eq!(store.get(a).unwrap().parent(), None);
}

#[test]
fn descendant_parent_is_rejected() {
    // A's parent is C; making C's parent A would close the loop.
    let mut store = CompositeStore::new();
    let a = store.add(Composite::new("A"));
    let c = store.add(Composite::new("C"));
    store.set_parent(a, Some(c)).unwrap();

    let err = store.set_parent(c, Some(a)).unwrap_err();
    assert!(matches!(err, ChromaError::CompositeCycle(_)));
    assert_eq!(store.get(c).unwrap().parent(), None);
    assert_eq!(store.get(a).unwrap().parent(), Some(c));
}

#[test]
fn deep_cycle_is_rejected() {
    let mut store = CompositeStore::new();
    let a = store.add(Composite::new("A"));
    let b = store.add(Composite::new("B"));
    let c = store.add(Composite::new("C"));
    store.set_parent(b, Some(a)).unwrap();
    store.set_parent(c, Some(b)).unwrap();

    assert!(store.set_parent(a, Some(c)).is_err());
    assert_eq!(store.get(a).unwrap().parent(), None);
}

#[test]
fn removed_parent_behaves_as_root() {
    let mut store = CompositeStore::new();
    let parent = store.add(Composite::new("Parent"));
    let child = store.add(Composite::new("Child"));
    store.set_parent(child, Some(parent)).unwrap();
    store.composite_mut(parent).unwrap().set_shadows_gamma(4.0);
    assert_eq!(store.resolve_shadows_gamma(child), 4.0);

    store.remove(parent);

    assert_eq!(store.get(child).unwrap().parent(), None);
    assert_eq!(store.resolve_shadows_gamma(child), 1.0);
}

// ============================================================================
// Snapshot & Change Tracking
// ============================================================================

#[test]
fn resolve_all_matches_individual_resolvers() {
    let mut store = CompositeStore::new();
    let parent = store.add(Composite::new("Parent"));
    let child = store.add(Composite::new("Child"));
    store.set_parent(child, Some(parent)).unwrap();
    store.composite_mut(parent).unwrap().set_shadows_gamma(2.0);
    store.composite_mut(child).unwrap().set_media_blend(MediaBlend::None);

    let resolved = store.resolve_all(child);
    assert_eq!(resolved.shadows_gamma, store.resolve_shadows_gamma(child));
    assert_eq!(resolved.media_blend, MediaBlend::None);
    assert_eq!(resolved.output_alpha, OutputAlpha::Opacity);
}

#[test]
fn mutation_marks_dirty_and_bumps_version() {
    let mut store = CompositeStore::new();
    let a = store.add(Composite::new("A"));
    assert!(store.take_dirty().is_empty());

    let before = store.version();
    store.composite_mut(a).unwrap().set_shadows_gamma(2.0);
    assert!(store.version() > before);

    let dirty = store.take_dirty();
    assert_eq!(dirty, vec![a]);
    assert!(store.take_dirty().is_empty());
}

#[test]
fn composite_round_trips_through_json() {
    let mut composite = Composite::new("Graded");
    composite.set_shadows_gamma(2.2);
    composite.set_media_blend(MediaBlend::PreToneCurve);

    let json = serde_json::to_string(&composite).unwrap();
    let back: Composite = serde_json::from_str(&json).unwrap();
    assert_eq!(back.name, "Graded");
    assert_eq!(back.overrides(), composite.overrides());
    assert_eq!(back.shadows_gamma(), 2.2);
    assert_eq!(back.media_blend(), MediaBlend::PreToneCurve);
}

#[test]
fn stale_key_resolves_to_defaults() {
    let mut store = CompositeStore::new();
    let a = store.add(Composite::new("A"));
    store.composite_mut(a).unwrap().set_shadows_gamma(9.0);
    store.remove(a);

    assert_eq!(store.resolve_shadows_gamma(a), 1.0);
}
