//! Renderer-agnostic material and texture descriptions.
//!
//! The core never talks to a GPU. Textures, render targets and materials are
//! lightweight records the host mirrors onto real resources; material
//! instances carry index-addressable parameter arrays so the per-frame hot
//! path never does a name lookup.

use glam::{UVec2, Vec4};
use rustc_hash::FxHashMap;
use smallvec::SmallVec;

slotmap::new_key_type! {
    /// Key of a [`Texture`] in the asset store.
    pub struct TextureHandle;
    /// Key of a [`MaterialDesc`] in the asset store.
    pub struct MaterialHandle;
    /// Key of a [`RenderTarget`] in the asset store.
    pub struct RenderTargetKey;
    /// Key of a subsystem-owned [`MaterialInstance`], referenced by draw ops.
    pub struct MidKey;
}

/// Color space tag of a texture's content.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ColorSpace {
    Linear,
    Srgb,
}

/// An external texture the host feeds in (media input, displacement maps).
#[derive(Clone, Debug)]
pub struct Texture {
    pub name: String,
    pub size: UVec2,
    pub color_space: ColorSpace,
}

impl Texture {
    #[must_use]
    pub fn new(name: &str, size: UVec2, color_space: ColorSpace) -> Self {
        Self {
            name: name.to_owned(),
            size,
            color_space,
        }
    }
}

/// A resizable render target owned by the pipeline.
#[derive(Clone, Debug)]
pub struct RenderTarget {
    pub name: String,
    pub size: UVec2,
}

impl RenderTarget {
    #[must_use]
    pub fn new(name: &str, size: UVec2) -> Self {
        Self {
            name: name.to_owned(),
            size,
        }
    }
}

/// A base material: a name plus the parameter names it declares.
///
/// Instances can only bind parameters the base material declares, the same
/// contract a shader-backed material would enforce.
#[derive(Clone, Debug, Default)]
pub struct MaterialDesc {
    pub name: String,
    scalar_params: Vec<String>,
    vector_params: Vec<String>,
    texture_params: Vec<String>,
}

impl MaterialDesc {
    #[must_use]
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_owned(),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_scalars(mut self, names: &[&str]) -> Self {
        self.scalar_params.extend(names.iter().map(|n| (*n).to_owned()));
        self
    }

    #[must_use]
    pub fn with_vectors(mut self, names: &[&str]) -> Self {
        self.vector_params.extend(names.iter().map(|n| (*n).to_owned()));
        self
    }

    #[must_use]
    pub fn with_textures(mut self, names: &[&str]) -> Self {
        self.texture_params.extend(names.iter().map(|n| (*n).to_owned()));
        self
    }

    #[must_use]
    pub fn declares_scalar(&self, name: &str) -> bool {
        self.scalar_params.iter().any(|n| n == name)
    }

    #[must_use]
    pub fn declares_vector(&self, name: &str) -> bool {
        self.vector_params.iter().any(|n| n == name)
    }

    #[must_use]
    pub fn declares_texture(&self, name: &str) -> bool {
        self.texture_params.iter().any(|n| n == name)
    }
}

/// A parameterized instance of a base material.
///
/// `init_*` resolves a parameter name against the base declaration exactly
/// once and hands back an index; per-frame updates go through
/// `set_*_by_index`.
#[derive(Clone, Debug)]
pub struct MaterialInstance {
    parent: MaterialHandle,
    scalars: SmallVec<[(String, f32); 8]>,
    vectors: SmallVec<[(String, Vec4); 4]>,
    textures: SmallVec<[(String, Option<TextureHandle>); 2]>,
}

impl MaterialInstance {
    #[must_use]
    pub fn new(parent: MaterialHandle) -> Self {
        Self {
            parent,
            scalars: SmallVec::new(),
            vectors: SmallVec::new(),
            textures: SmallVec::new(),
        }
    }

    #[must_use]
    pub fn parent(&self) -> MaterialHandle {
        self.parent
    }

    pub fn init_scalar(&mut self, desc: &MaterialDesc, name: &str, value: f32) -> Option<usize> {
        if !desc.declares_scalar(name) {
            return None;
        }
        if let Some(i) = self.scalars.iter().position(|(n, _)| n == name) {
            self.scalars[i].1 = value;
            return Some(i);
        }
        self.scalars.push((name.to_owned(), value));
        Some(self.scalars.len() - 1)
    }

    pub fn init_vector(&mut self, desc: &MaterialDesc, name: &str, value: Vec4) -> Option<usize> {
        if !desc.declares_vector(name) {
            return None;
        }
        if let Some(i) = self.vectors.iter().position(|(n, _)| n == name) {
            self.vectors[i].1 = value;
            return Some(i);
        }
        self.vectors.push((name.to_owned(), value));
        Some(self.vectors.len() - 1)
    }

    pub fn init_texture(
        &mut self,
        desc: &MaterialDesc,
        name: &str,
        value: Option<TextureHandle>,
    ) -> Option<usize> {
        if !desc.declares_texture(name) {
            return None;
        }
        if let Some(i) = self.textures.iter().position(|(n, _)| n == name) {
            self.textures[i].1 = value;
            return Some(i);
        }
        self.textures.push((name.to_owned(), value));
        Some(self.textures.len() - 1)
    }

    pub fn set_scalar_by_index(&mut self, index: usize, value: f32) {
        if let Some(slot) = self.scalars.get_mut(index) {
            slot.1 = value;
        }
    }

    pub fn set_vector_by_index(&mut self, index: usize, value: Vec4) {
        if let Some(slot) = self.vectors.get_mut(index) {
            slot.1 = value;
        }
    }

    pub fn set_texture_by_index(&mut self, index: usize, value: Option<TextureHandle>) {
        if let Some(slot) = self.textures.get_mut(index) {
            slot.1 = value;
        }
    }

    #[must_use]
    pub fn scalar(&self, name: &str) -> Option<f32> {
        self.scalars.iter().find(|(n, _)| n == name).map(|(_, v)| *v)
    }

    #[must_use]
    pub fn vector(&self, name: &str) -> Option<Vec4> {
        self.vectors.iter().find(|(n, _)| n == name).map(|(_, v)| *v)
    }

    #[must_use]
    pub fn texture(&self, name: &str) -> Option<TextureHandle> {
        self.textures
            .iter()
            .find(|(n, _)| n == name)
            .and_then(|(_, v)| *v)
    }
}

/// Global named parameter table every composited material samples.
///
/// Written only by the orchestrator, read by the host each frame.
#[derive(Debug, Default)]
pub struct ParameterCollection {
    scalars: FxHashMap<&'static str, f32>,
    vectors: FxHashMap<&'static str, Vec4>,
}

impl ParameterCollection {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_scalar(&mut self, name: &'static str, value: f32) {
        self.scalars.insert(name, value);
    }

    pub fn set_vector(&mut self, name: &'static str, value: Vec4) {
        self.vectors.insert(name, value);
    }

    #[must_use]
    pub fn scalar(&self, name: &str) -> Option<f32> {
        self.scalars.get(name).copied()
    }

    #[must_use]
    pub fn vector(&self, name: &str) -> Option<Vec4> {
        self.vectors.get(name).copied()
    }
}

/// The keyed asset stores of one compositing world.
#[derive(Debug, Default)]
pub struct CompositeAssets {
    pub textures: slotmap::SlotMap<TextureHandle, Texture>,
    pub materials: slotmap::SlotMap<MaterialHandle, MaterialDesc>,
    pub render_targets: slotmap::SlotMap<RenderTargetKey, RenderTarget>,
}

impl CompositeAssets {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_texture(&mut self, texture: Texture) -> TextureHandle {
        self.textures.insert(texture)
    }

    pub fn add_material(&mut self, desc: MaterialDesc) -> MaterialHandle {
        self.materials.insert(desc)
    }

    pub fn add_render_target(&mut self, target: RenderTarget) -> RenderTargetKey {
        self.render_targets.insert(target)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn instance_init_resolves_declared_params_only() {
        let desc = MaterialDesc::new("M").with_scalars(&["A"]);
        let mut inst = MaterialInstance::new(MaterialHandle::default());
        assert_eq!(inst.init_scalar(&desc, "A", 1.0), Some(0));
        assert_eq!(inst.init_scalar(&desc, "B", 1.0), None);
    }

    #[test]
    fn instance_init_is_idempotent_per_name() {
        let desc = MaterialDesc::new("M").with_scalars(&["A", "B"]);
        let mut inst = MaterialInstance::new(MaterialHandle::default());
        let a = inst.init_scalar(&desc, "A", 1.0);
        let b = inst.init_scalar(&desc, "B", 2.0);
        assert_eq!(inst.init_scalar(&desc, "A", 3.0), a);
        assert_ne!(a, b);
        assert_eq!(inst.scalar("A"), Some(3.0));
    }

    #[test]
    fn instance_set_by_index_updates_value() {
        let desc = MaterialDesc::new("M").with_scalars(&["A"]);
        let mut inst = MaterialInstance::new(MaterialHandle::default());
        let Some(i) = inst.init_scalar(&desc, "A", 0.0) else {
            panic!("param not declared");
        };
        inst.set_scalar_by_index(i, 7.0);
        assert_eq!(inst.scalar("A"), Some(7.0));
    }
}
