//! Keyer assets and the material parameter binding that drives them.
//!
//! Keyer properties are pushed to the keying material by parameter name.
//! The wiring is a declarative table ([`KEYER_PARAMS`]): each entry names a
//! material parameter and an accessor into [`KeyerProperties`]. Binding
//! resolves each name against the material exactly once; per-frame updates
//! push values by the cached indices and then draw the material into the
//! keyer render target.

use glam::Vec4;
use serde::{Deserialize, Serialize};
use slotmap::SlotMap;
use smallvec::SmallVec;
use uuid::Uuid;

use crate::errors::{ChromaError, Result};
use crate::frame::{FrameCommands, RenderOp};
use crate::materials::{
    CompositeAssets, MaterialHandle, MaterialInstance, MidKey, RenderTargetKey, TextureHandle,
};

slotmap::new_key_type! {
    /// Stable identity of a keyer asset.
    pub struct KeyerKey;
}

/// Hop limit when following keyer asset references.
const MAX_ASSET_HOPS: usize = 8;

/// Material parameter name the media input texture binds to.
pub const MEDIA_INPUT_PARAM: &str = "MediaInput";

/// Keyable properties of the built-in chroma keyer.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct KeyerProperties {
    pub key_color: Vec4,
    pub clip_black: f32,
    pub clip_white: f32,
    pub enable_despill: bool,
    pub despill_amount: f32,
    pub despill_shadow_tint: Vec4,
    pub edge_softness: f32,
    pub invert_matte: bool,
}

impl Default for KeyerProperties {
    fn default() -> Self {
        Self {
            key_color: Vec4::new(0.0, 1.0, 0.0, 1.0),
            clip_black: 0.0,
            clip_white: 1.0,
            enable_despill: true,
            despill_amount: 0.5,
            despill_shadow_tint: Vec4::new(0.0, 0.0, 0.0, 0.0),
            edge_softness: 0.0,
            invert_matte: false,
        }
    }
}

/// How one table entry reads its value out of the properties.
#[derive(Clone, Copy)]
pub enum ParamAccessor {
    Bool(fn(&KeyerProperties) -> bool),
    Scalar(fn(&KeyerProperties) -> f32),
    Color(fn(&KeyerProperties) -> Vec4),
}

/// One row of the keyer parameter table.
pub struct ParamSpec {
    pub name: &'static str,
    pub accessor: ParamAccessor,
}

/// The full wiring between [`KeyerProperties`] and material parameters.
/// Adding a property is one struct field plus one row here.
pub const KEYER_PARAMS: &[ParamSpec] = &[
    ParamSpec {
        name: "KeyColor",
        accessor: ParamAccessor::Color(|p| p.key_color),
    },
    ParamSpec {
        name: "ClipBlack",
        accessor: ParamAccessor::Scalar(|p| p.clip_black),
    },
    ParamSpec {
        name: "ClipWhite",
        accessor: ParamAccessor::Scalar(|p| p.clip_white),
    },
    ParamSpec {
        name: "EnableDespill",
        accessor: ParamAccessor::Bool(|p| p.enable_despill),
    },
    ParamSpec {
        name: "DespillAmount",
        accessor: ParamAccessor::Scalar(|p| p.despill_amount),
    },
    ParamSpec {
        name: "DespillShadowTint",
        accessor: ParamAccessor::Color(|p| p.despill_shadow_tint),
    },
    ParamSpec {
        name: "EdgeSoftness",
        accessor: ParamAccessor::Scalar(|p| p.edge_softness),
    },
    ParamSpec {
        name: "InvertMatte",
        accessor: ParamAccessor::Bool(|p| p.invert_matte),
    },
];

/// A concrete keyer: a keying material plus property values.
#[derive(Clone, Debug)]
pub struct CompositeKeyer {
    pub uuid: Uuid,
    pub name: String,
    pub enabled: bool,
    pub material: Option<MaterialHandle>,
    pub properties: KeyerProperties,
}

impl CompositeKeyer {
    #[must_use]
    pub fn new(name: &str) -> Self {
        Self {
            uuid: Uuid::new_v4(),
            name: name.to_owned(),
            enabled: true,
            material: None,
            properties: KeyerProperties::default(),
        }
    }
}

/// A keyer asset: either a concrete keyer or a reference forwarding to
/// another asset.
#[derive(Clone, Debug)]
pub enum KeyerData {
    Inline(CompositeKeyer),
    /// Forwards initialize/update/enabled to the referenced asset. Its own
    /// enabled flag gates the whole chain.
    FromAsset {
        enabled: bool,
        asset: Option<KeyerKey>,
    },
}

/// Follows asset references down to the concrete keyer, if any.
/// Reference chains are capped so a self-referencing pair cannot spin.
#[must_use]
pub fn resolve_keyer(keyers: &SlotMap<KeyerKey, KeyerData>, key: KeyerKey) -> Option<&CompositeKeyer> {
    let mut current = key;
    for _ in 0..MAX_ASSET_HOPS {
        match keyers.get(current)? {
            KeyerData::Inline(keyer) => return Some(keyer),
            KeyerData::FromAsset { asset, .. } => current = (*asset)?,
        }
    }
    log::error!("keyer asset reference chain exceeds {MAX_ASSET_HOPS} hops, ignoring");
    None
}

/// Whether the keyer chain rooted at `key` is enabled end to end.
#[must_use]
pub fn is_keyer_enabled(keyers: &SlotMap<KeyerKey, KeyerData>, key: KeyerKey) -> bool {
    let mut current = key;
    for _ in 0..MAX_ASSET_HOPS {
        match keyers.get(current) {
            Some(KeyerData::Inline(keyer)) => return keyer.enabled,
            Some(KeyerData::FromAsset { enabled, asset }) => match (*enabled, *asset) {
                (true, Some(next)) => current = next,
                _ => return false,
            },
            None => return false,
        }
    }
    false
}

/// Runtime binding between a keyer and its material instance.
#[derive(Debug, Default)]
pub struct KeyerBinding {
    instance: Option<MidKey>,
    parent: Option<MaterialHandle>,
    bound: SmallVec<[(usize, usize); 16]>,
    media_input_index: Option<usize>,
    initialized: bool,
}

impl KeyerBinding {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn is_bound(&self) -> bool {
        self.instance.is_some()
    }

    /// Key of the bound material instance, once initialized.
    #[must_use]
    pub fn instance_key(&self) -> Option<MidKey> {
        self.instance
    }

    /// Drops the bound instance, returning to the idle state.
    pub fn reset(&mut self, instances: &mut SlotMap<MidKey, MaterialInstance>) {
        if let Some(mid) = self.instance.take() {
            instances.remove(mid);
        }
        self.parent = None;
        self.bound.clear();
        self.media_input_index = None;
        self.initialized = false;
    }

    /// Builds a material instance for the keyer and resolves an index for
    /// every table row the material declares. A keyer without a material
    /// leaves the binding idle.
    pub fn initialize(
        &mut self,
        keyer: &CompositeKeyer,
        assets: &CompositeAssets,
        instances: &mut SlotMap<MidKey, MaterialInstance>,
    ) -> Result<()> {
        self.reset(instances);
        self.initialized = true;

        let Some(handle) = keyer.material else {
            log::error!("keyer '{}' has no material assigned, keying disabled", keyer.name);
            return Err(ChromaError::KeyerMaterialMissing(keyer.name.clone()));
        };
        // Record the attempt up front: a handle that fails to bind is not
        // retried (or re-logged) until the keyer's material changes.
        self.parent = Some(handle);
        let Some(desc) = assets.materials.get(handle) else {
            log::error!("keyer '{}' references a missing material", keyer.name);
            return Err(ChromaError::AssetNotFound(keyer.name.clone()));
        };

        let mut instance = MaterialInstance::new(handle);
        for (row, spec) in KEYER_PARAMS.iter().enumerate() {
            let index = match spec.accessor {
                ParamAccessor::Bool(get) => {
                    instance.init_scalar(desc, spec.name, f32::from(u8::from(get(&keyer.properties))))
                }
                ParamAccessor::Scalar(get) => {
                    instance.init_scalar(desc, spec.name, get(&keyer.properties))
                }
                ParamAccessor::Color(get) => {
                    instance.init_vector(desc, spec.name, get(&keyer.properties))
                }
            };
            if let Some(index) = index {
                self.bound.push((row, index));
            }
        }
        self.media_input_index = instance.init_texture(desc, MEDIA_INPUT_PARAM, None);

        self.instance = Some(instances.insert(instance));
        Ok(())
    }

    /// Pushes the keyer's current values and draws it into `target`.
    ///
    /// A binding whose material changed since initialization re-initializes
    /// itself first; a material that failed to bind is left alone until it
    /// changes again. An unbindable keyer leaves the frame untouched.
    pub fn update(
        &mut self,
        keyer: &CompositeKeyer,
        media: Option<TextureHandle>,
        target: RenderTargetKey,
        assets: &CompositeAssets,
        instances: &mut SlotMap<MidKey, MaterialInstance>,
        frame: &mut FrameCommands,
    ) {
        if !self.initialized || self.parent != keyer.material {
            if self.initialized {
                log::warn!("keyer '{}' material changed, rebinding", keyer.name);
            }
            if self.initialize(keyer, assets, instances).is_err() {
                return;
            }
        }
        let Some(mid) = self.instance else { return };
        let Some(instance) = instances.get_mut(mid) else { return };

        for (row, index) in &self.bound {
            match KEYER_PARAMS[*row].accessor {
                ParamAccessor::Bool(get) => instance
                    .set_scalar_by_index(*index, f32::from(u8::from(get(&keyer.properties)))),
                ParamAccessor::Scalar(get) => {
                    instance.set_scalar_by_index(*index, get(&keyer.properties));
                }
                ParamAccessor::Color(get) => {
                    instance.set_vector_by_index(*index, get(&keyer.properties));
                }
            }
        }
        if let Some(index) = self.media_input_index {
            instance.set_texture_by_index(index, media);
        }

        frame.push(RenderOp::DrawMaterial { target, material: mid });
    }
}
