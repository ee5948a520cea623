//! Composite nodes and the per-property override chain.
//!
//! A [`Composite`] is one node of a configuration hierarchy. Every
//! inheritable property carries an override bit: resolving a property walks
//! upward from a node and the first node with the bit set supplies the value.
//! A chain with no override anywhere yields the property's class default.
//!
//! Nodes reference their parent by [`CompositeKey`], never by pointer, and
//! every walk is bounded by the store size, so a broken or removed parent
//! simply terminates the walk.

use bitflags::bitflags;
use glam::Vec4;
use serde::{Deserialize, Serialize};
use slotmap::SlotMap;
use uuid::Uuid;

use crate::composite::color_grade::{ColorGrade, ColorGradePerRange};
use crate::composite::types::{MediaBlend, OutputAlpha, OutputRgbEncoding};
use crate::errors::{ChromaError, Result};
use crate::keyer::KeyerKey;
use crate::materials::TextureHandle;

slotmap::new_key_type! {
    /// Stable identity of a composite node inside a [`CompositeStore`].
    pub struct CompositeKey;
}

bitflags! {
    /// One bit per inheritable property. A set bit means the node supplies
    /// its own value instead of deferring to its parent chain.
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
    pub struct CompositeOverrides: u32 {
        const MEDIA_INPUT_TEXTURE                   = 1 << 0;
        const MEDIA_INPUT_KEYER                     = 1 << 1;
        const ENABLE_SOFT_MASK                      = 1 << 2;
        const SOFT_MASK_SCREEN_PERCENTAGE           = 1 << 3;
        const ENABLE_MEDIA_SHADOWS                  = 1 << 4;
        const SHADOWS_OFFSET                        = 1 << 5;
        const SHADOWS_BLACK_LEVEL                   = 1 << 6;
        const SHADOWS_WHITE_LEVEL                   = 1 << 7;
        const SHADOWS_GAMMA                         = 1 << 8;
        const SHADOWS_TINT                          = 1 << 9;
        const ENABLE_PLANAR_REFLECTION              = 1 << 10;
        const PLANAR_REFLECTION_COLOR               = 1 << 11;
        const PLANAR_REFLECTION_DISTORTION          = 1 << 12;
        const PLANAR_REFLECTION_DISTORTION_OFFSET   = 1 << 13;
        const PLANAR_REFLECTION_SCREEN_PERCENTAGE   = 1 << 14;
        const COLOR_GRADE_SCENE                     = 1 << 15;
        const COLOR_GRADE_MEDIA                     = 1 << 16;
        const COLOR_GRADE_COMBINED                  = 1 << 17;
        const MEDIA_BLEND                           = 1 << 18;
        const BRIGHTNESS_MASK_GAMMA                 = 1 << 19;
        const APPLY_INVERSE_TONE_CURVE              = 1 << 20;
        const OUTPUT_RGB_ENCODING                   = 1 << 21;
        const OUTPUT_ALPHA                          = 1 << 22;
    }
}

/// One configuration node.
///
/// Field values are only meaningful where the matching override bit is set;
/// resolution happens through [`CompositeStore`].
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Composite {
    pub uuid: Uuid,
    pub name: String,
    pub(crate) parent: Option<CompositeKey>,
    pub(crate) overrides: CompositeOverrides,

    media_input_texture: Option<TextureHandle>,
    media_input_keyer: Option<KeyerKey>,

    enable_soft_mask: bool,
    soft_mask_screen_percentage: f32,

    enable_media_shadows: bool,
    shadows_offset: f32,
    shadows_black_level: f32,
    shadows_white_level: f32,
    shadows_gamma: f32,
    shadows_tint: Vec4,

    enable_planar_reflection: bool,
    planar_reflection_color: Vec4,
    planar_reflection_distortion: f32,
    planar_reflection_distortion_offset: f32,
    planar_reflection_screen_percentage: f32,

    color_grade: ColorGrade,

    media_blend: MediaBlend,
    brightness_mask_gamma: f32,
    apply_inverse_tone_curve: bool,
    output_rgb_encoding: OutputRgbEncoding,
    output_alpha: OutputAlpha,
}

impl Composite {
    #[must_use]
    pub fn new(name: &str) -> Self {
        Self {
            uuid: Uuid::new_v4(),
            name: name.to_owned(),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn parent(&self) -> Option<CompositeKey> {
        self.parent
    }

    #[must_use]
    pub fn overrides(&self) -> CompositeOverrides {
        self.overrides
    }

    /// Clears override bits, reverting the covered properties to inheritance.
    pub fn clear_overrides(&mut self, flags: CompositeOverrides) {
        self.overrides.remove(flags);
    }
}

impl Default for Composite {
    fn default() -> Self {
        Self {
            uuid: Uuid::new_v4(),
            name: String::new(),
            parent: None,
            overrides: CompositeOverrides::empty(),
            media_input_texture: None,
            media_input_keyer: None,
            enable_soft_mask: true,
            soft_mask_screen_percentage: 25.0,
            enable_media_shadows: true,
            shadows_offset: 0.0,
            shadows_black_level: 0.0,
            shadows_white_level: 1.0,
            shadows_gamma: 1.0,
            shadows_tint: Vec4::ZERO,
            enable_planar_reflection: false,
            planar_reflection_color: Vec4::new(1.0, 1.0, 1.0, 0.0),
            planar_reflection_distortion: 0.0,
            planar_reflection_distortion_offset: 0.0,
            planar_reflection_screen_percentage: 50.0,
            color_grade: ColorGrade::default(),
            media_blend: MediaBlend::PostToneCurve,
            brightness_mask_gamma: 1.0,
            apply_inverse_tone_curve: true,
            output_rgb_encoding: OutputRgbEncoding::Srgb,
            output_alpha: OutputAlpha::Opacity,
        }
    }
}

// Generates the raw accessor pair for an inheritable property. The setter
// also raises the override bit, so a set value is always locally effective;
// inheritance is restored with `clear_overrides`.
macro_rules! override_accessors {
    ($(($field:ident, $set:ident, $flag:ident, $ty:ty)),+ $(,)?) => {
        impl Composite {
            $(
                #[must_use]
                pub fn $field(&self) -> $ty {
                    self.$field
                }

                pub fn $set(&mut self, value: $ty) {
                    self.$field = value;
                    self.overrides.insert(CompositeOverrides::$flag);
                }
            )+
        }
    };
}

override_accessors!(
    (media_input_texture, set_media_input_texture, MEDIA_INPUT_TEXTURE, Option<TextureHandle>),
    (media_input_keyer, set_media_input_keyer, MEDIA_INPUT_KEYER, Option<KeyerKey>),
    (enable_soft_mask, set_enable_soft_mask, ENABLE_SOFT_MASK, bool),
    (soft_mask_screen_percentage, set_soft_mask_screen_percentage, SOFT_MASK_SCREEN_PERCENTAGE, f32),
    (enable_media_shadows, set_enable_media_shadows, ENABLE_MEDIA_SHADOWS, bool),
    (shadows_offset, set_shadows_offset, SHADOWS_OFFSET, f32),
    (shadows_black_level, set_shadows_black_level, SHADOWS_BLACK_LEVEL, f32),
    (shadows_white_level, set_shadows_white_level, SHADOWS_WHITE_LEVEL, f32),
    (shadows_gamma, set_shadows_gamma, SHADOWS_GAMMA, f32),
    (shadows_tint, set_shadows_tint, SHADOWS_TINT, Vec4),
    (enable_planar_reflection, set_enable_planar_reflection, ENABLE_PLANAR_REFLECTION, bool),
    (planar_reflection_color, set_planar_reflection_color, PLANAR_REFLECTION_COLOR, Vec4),
    (planar_reflection_distortion, set_planar_reflection_distortion, PLANAR_REFLECTION_DISTORTION, f32),
    (planar_reflection_distortion_offset, set_planar_reflection_distortion_offset, PLANAR_REFLECTION_DISTORTION_OFFSET, f32),
    (planar_reflection_screen_percentage, set_planar_reflection_screen_percentage, PLANAR_REFLECTION_SCREEN_PERCENTAGE, f32),
    (media_blend, set_media_blend, MEDIA_BLEND, MediaBlend),
    (brightness_mask_gamma, set_brightness_mask_gamma, BRIGHTNESS_MASK_GAMMA, f32),
    (apply_inverse_tone_curve, set_apply_inverse_tone_curve, APPLY_INVERSE_TONE_CURVE, bool),
    (output_rgb_encoding, set_output_rgb_encoding, OUTPUT_RGB_ENCODING, OutputRgbEncoding),
    (output_alpha, set_output_alpha, OUTPUT_ALPHA, OutputAlpha),
);

impl Composite {
    #[must_use]
    pub fn color_grade(&self) -> &ColorGrade {
        &self.color_grade
    }

    pub fn set_color_grade_scene(&mut self, grade: ColorGradePerRange) {
        self.color_grade.scene = grade;
        self.overrides.insert(CompositeOverrides::COLOR_GRADE_SCENE);
    }

    pub fn set_color_grade_media(&mut self, grade: ColorGradePerRange) {
        self.color_grade.media = grade;
        self.overrides.insert(CompositeOverrides::COLOR_GRADE_MEDIA);
    }

    pub fn set_color_grade_combined(&mut self, grade: ColorGradePerRange) {
        self.color_grade.combined = grade;
        self.overrides.insert(CompositeOverrides::COLOR_GRADE_COMBINED);
    }
}

/// Flat snapshot of every effective property of a composite chain.
///
/// This is what registered meshes receive on configuration changes.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ResolvedComposite {
    pub media_input_texture: Option<TextureHandle>,
    pub media_input_keyer: Option<KeyerKey>,
    pub enable_soft_mask: bool,
    pub soft_mask_screen_percentage: f32,
    pub enable_media_shadows: bool,
    pub shadows_offset: f32,
    pub shadows_black_level: f32,
    pub shadows_white_level: f32,
    pub shadows_gamma: f32,
    pub shadows_tint: Vec4,
    pub enable_planar_reflection: bool,
    pub planar_reflection_color: Vec4,
    pub planar_reflection_distortion: f32,
    pub planar_reflection_distortion_offset: f32,
    pub planar_reflection_screen_percentage: f32,
    pub color_grade_scene: ColorGradePerRange,
    pub color_grade_media: ColorGradePerRange,
    pub color_grade_combined: ColorGradePerRange,
    pub media_blend: MediaBlend,
    pub brightness_mask_gamma: f32,
    pub apply_inverse_tone_curve: bool,
    pub output_rgb_encoding: OutputRgbEncoding,
    pub output_alpha: OutputAlpha,
}

// Generates an effective-value getter: walk upward from the node, first
// override bit wins, empty chain falls back to the class default.
macro_rules! resolver {
    ($(#[$meta:meta])* $get:ident, $field:ident, $flag:ident, $ty:ty) => {
        $(#[$meta])*
        #[must_use]
        pub fn $get(&self, key: CompositeKey) -> $ty {
            let mut current = Some(key);
            let mut hops = self.nodes.len() + 1;
            while let (Some(k), true) = (current, hops > 0) {
                hops -= 1;
                let Some(node) = self.nodes.get(k) else { break };
                if node.overrides.contains(CompositeOverrides::$flag) {
                    return node.$field;
                }
                current = node.parent;
            }
            CLASS_DEFAULT.$field
        }
    };
}

// Class defaults the resolvers fall back to. Identity fields of the template
// node are never read.
static CLASS_DEFAULT: std::sync::LazyLock<Composite> = std::sync::LazyLock::new(Composite::default);

/// Keyed store of composite nodes plus change tracking.
///
/// All mutation funnels through [`CompositeStore::composite_mut`], which
/// records the touched key and bumps the change version. The orchestrator
/// drains the dirty list once per frame to decide whether the active chain
/// needs a re-broadcast.
#[derive(Debug, Default)]
pub struct CompositeStore {
    nodes: SlotMap<CompositeKey, Composite>,
    dirty: Vec<CompositeKey>,
    version: u64,
}

impl CompositeStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts a node. Insertion is not a change: nothing can reference a
    /// brand-new node yet, so it never lands on the dirty list.
    pub fn add(&mut self, composite: Composite) -> CompositeKey {
        self.nodes.insert(composite)
    }

    /// Removes a node. Children referencing it become roots.
    pub fn remove(&mut self, key: CompositeKey) -> Option<Composite> {
        let removed = self.nodes.remove(key)?;
        let orphans: Vec<CompositeKey> = self
            .nodes
            .iter()
            .filter(|(_, node)| node.parent == Some(key))
            .map(|(k, _)| k)
            .collect();
        for orphan in orphans {
            if let Some(node) = self.nodes.get_mut(orphan) {
                node.parent = None;
            }
            self.mark_dirty(orphan);
        }
        Some(removed)
    }

    #[must_use]
    pub fn get(&self, key: CompositeKey) -> Option<&Composite> {
        self.nodes.get(key)
    }

    /// Mutable access. Marks the node dirty and bumps the change version.
    pub fn composite_mut(&mut self, key: CompositeKey) -> Option<&mut Composite> {
        if self.nodes.contains_key(key) {
            self.mark_dirty(key);
        }
        self.nodes.get_mut(key)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    #[must_use]
    pub fn version(&self) -> u64 {
        self.version
    }

    /// Drains the keys touched since the last drain.
    pub fn take_dirty(&mut self) -> Vec<CompositeKey> {
        std::mem::take(&mut self.dirty)
    }

    fn mark_dirty(&mut self, key: CompositeKey) {
        self.version += 1;
        if !self.dirty.contains(&key) {
            self.dirty.push(key);
        }
    }

    /// Whether `ancestor` appears in the parent chain of `node`
    /// (a node is an ancestor of itself).
    #[must_use]
    pub fn is_ancestor(&self, ancestor: CompositeKey, node: CompositeKey) -> bool {
        let mut current = Some(node);
        let mut hops = self.nodes.len() + 1;
        while let (Some(k), true) = (current, hops > 0) {
            hops -= 1;
            if k == ancestor {
                return true;
            }
            current = self.nodes.get(k).and_then(Composite::parent);
        }
        false
    }

    /// Re-parents `child`. Any assignment that would make `child` its own
    /// ancestor is rejected: the parent reverts to none and an error is
    /// returned, matching what the user sees.
    pub fn set_parent(&mut self, child: CompositeKey, parent: Option<CompositeKey>) -> Result<()> {
        if let Some(p) = parent {
            if self.is_ancestor(child, p) {
                let name = if let Some(node) = self.composite_mut(child) {
                    node.parent = None;
                    node.name.clone()
                } else {
                    String::from("<removed>")
                };
                log::error!("rejected cyclic parent assignment on composite '{name}'");
                return Err(ChromaError::CompositeCycle(name));
            }
        }
        if let Some(node) = self.composite_mut(child) {
            node.parent = parent;
        }
        Ok(())
    }

    resolver!(resolve_media_input_texture, media_input_texture, MEDIA_INPUT_TEXTURE, Option<TextureHandle>);
    resolver!(resolve_media_input_keyer, media_input_keyer, MEDIA_INPUT_KEYER, Option<KeyerKey>);
    resolver!(resolve_enable_soft_mask, enable_soft_mask, ENABLE_SOFT_MASK, bool);
    resolver!(resolve_soft_mask_screen_percentage, soft_mask_screen_percentage, SOFT_MASK_SCREEN_PERCENTAGE, f32);
    resolver!(resolve_enable_media_shadows, enable_media_shadows, ENABLE_MEDIA_SHADOWS, bool);
    resolver!(resolve_shadows_offset, shadows_offset, SHADOWS_OFFSET, f32);
    resolver!(resolve_shadows_black_level, shadows_black_level, SHADOWS_BLACK_LEVEL, f32);
    resolver!(resolve_shadows_white_level, shadows_white_level, SHADOWS_WHITE_LEVEL, f32);
    resolver!(resolve_shadows_gamma, shadows_gamma, SHADOWS_GAMMA, f32);
    resolver!(resolve_shadows_tint, shadows_tint, SHADOWS_TINT, Vec4);
    resolver!(resolve_enable_planar_reflection, enable_planar_reflection, ENABLE_PLANAR_REFLECTION, bool);
    resolver!(resolve_planar_reflection_color, planar_reflection_color, PLANAR_REFLECTION_COLOR, Vec4);
    resolver!(resolve_planar_reflection_distortion, planar_reflection_distortion, PLANAR_REFLECTION_DISTORTION, f32);
    resolver!(resolve_planar_reflection_distortion_offset, planar_reflection_distortion_offset, PLANAR_REFLECTION_DISTORTION_OFFSET, f32);
    resolver!(resolve_planar_reflection_screen_percentage, planar_reflection_screen_percentage, PLANAR_REFLECTION_SCREEN_PERCENTAGE, f32);
    resolver!(resolve_media_blend, media_blend, MEDIA_BLEND, MediaBlend);
    resolver!(resolve_brightness_mask_gamma, brightness_mask_gamma, BRIGHTNESS_MASK_GAMMA, f32);
    resolver!(resolve_apply_inverse_tone_curve, apply_inverse_tone_curve, APPLY_INVERSE_TONE_CURVE, bool);
    resolver!(resolve_output_rgb_encoding, output_rgb_encoding, OUTPUT_RGB_ENCODING, OutputRgbEncoding);
    resolver!(resolve_output_alpha, output_alpha, OUTPUT_ALPHA, OutputAlpha);

    fn resolve_color_grade_range(
        &self,
        key: CompositeKey,
        flag: CompositeOverrides,
        pick: fn(&ColorGrade) -> ColorGradePerRange,
    ) -> ColorGradePerRange {
        let mut current = Some(key);
        let mut hops = self.nodes.len() + 1;
        while let (Some(k), true) = (current, hops > 0) {
            hops -= 1;
            let Some(node) = self.nodes.get(k) else { break };
            if node.overrides.contains(flag) {
                return pick(&node.color_grade);
            }
            current = node.parent;
        }
        ColorGradePerRange::default()
    }

    #[must_use]
    pub fn resolve_color_grade_scene(&self, key: CompositeKey) -> ColorGradePerRange {
        self.resolve_color_grade_range(key, CompositeOverrides::COLOR_GRADE_SCENE, |g| g.scene)
    }

    #[must_use]
    pub fn resolve_color_grade_media(&self, key: CompositeKey) -> ColorGradePerRange {
        self.resolve_color_grade_range(key, CompositeOverrides::COLOR_GRADE_MEDIA, |g| g.media)
    }

    #[must_use]
    pub fn resolve_color_grade_combined(&self, key: CompositeKey) -> ColorGradePerRange {
        self.resolve_color_grade_range(key, CompositeOverrides::COLOR_GRADE_COMBINED, |g| g.combined)
    }

    /// Snapshots every effective property of the chain rooted at `key`.
    #[must_use]
    pub fn resolve_all(&self, key: CompositeKey) -> ResolvedComposite {
        ResolvedComposite {
            media_input_texture: self.resolve_media_input_texture(key),
            media_input_keyer: self.resolve_media_input_keyer(key),
            enable_soft_mask: self.resolve_enable_soft_mask(key),
            soft_mask_screen_percentage: self.resolve_soft_mask_screen_percentage(key),
            enable_media_shadows: self.resolve_enable_media_shadows(key),
            shadows_offset: self.resolve_shadows_offset(key),
            shadows_black_level: self.resolve_shadows_black_level(key),
            shadows_white_level: self.resolve_shadows_white_level(key),
            shadows_gamma: self.resolve_shadows_gamma(key),
            shadows_tint: self.resolve_shadows_tint(key),
            enable_planar_reflection: self.resolve_enable_planar_reflection(key),
            planar_reflection_color: self.resolve_planar_reflection_color(key),
            planar_reflection_distortion: self.resolve_planar_reflection_distortion(key),
            planar_reflection_distortion_offset: self.resolve_planar_reflection_distortion_offset(key),
            planar_reflection_screen_percentage: self.resolve_planar_reflection_screen_percentage(key),
            color_grade_scene: self.resolve_color_grade_scene(key),
            color_grade_media: self.resolve_color_grade_media(key),
            color_grade_combined: self.resolve_color_grade_combined(key),
            media_blend: self.resolve_media_blend(key),
            brightness_mask_gamma: self.resolve_brightness_mask_gamma(key),
            apply_inverse_tone_curve: self.resolve_apply_inverse_tone_curve(key),
            output_rgb_encoding: self.resolve_output_rgb_encoding(key),
            output_alpha: self.resolve_output_alpha(key),
        }
    }
}
