//! Registration of composite meshes and fan-out of configuration updates.

use slotmap::SlotMap;

use crate::composite::ResolvedComposite;
use crate::mesh::{CompositeMesh, MeshKey};

/// The set of meshes participating in compositing, in registration order,
/// plus the show-only list the soft mask capture renders exclusively.
#[derive(Debug, Default)]
pub struct UpdateRegistry {
    registered: Vec<MeshKey>,
    soft_mask_show_only: Vec<MeshKey>,
}

impl UpdateRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a mesh for configuration updates.
    ///
    /// Transient meshes are rejected. Registering an already registered mesh
    /// changes nothing. On success the mesh immediately receives the active
    /// resolved configuration when one exists, and its soft mask component
    /// joins the show-only list.
    pub fn register(
        &mut self,
        key: MeshKey,
        meshes: &mut SlotMap<MeshKey, CompositeMesh>,
        active: Option<&ResolvedComposite>,
    ) -> bool {
        let Some(mesh) = meshes.get_mut(key) else {
            return false;
        };
        if mesh.transient {
            log::debug!("skipping registration of transient mesh '{}'", mesh.name);
            return false;
        }
        if self.registered.contains(&key) {
            return false;
        }
        self.registered.push(key);
        self.soft_mask_show_only.push(key);
        if let Some(resolved) = active {
            mesh.on_composite_update(resolved);
        }
        true
    }

    /// Removes a mesh from the registry and the show-only list. Idempotent.
    pub fn unregister(&mut self, key: MeshKey) {
        self.registered.retain(|k| *k != key);
        self.soft_mask_show_only.retain(|k| *k != key);
    }

    #[must_use]
    pub fn is_registered(&self, key: MeshKey) -> bool {
        self.registered.contains(&key)
    }

    #[must_use]
    pub fn registered(&self) -> &[MeshKey] {
        &self.registered
    }

    #[must_use]
    pub fn soft_mask_show_only(&self) -> &[MeshKey] {
        &self.soft_mask_show_only
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.registered.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.registered.is_empty()
    }

    /// Delivers a resolved configuration to every registered mesh,
    /// in registration order.
    pub fn broadcast(
        &self,
        meshes: &mut SlotMap<MeshKey, CompositeMesh>,
        resolved: &ResolvedComposite,
    ) {
        for key in &self.registered {
            if let Some(mesh) = meshes.get_mut(*key) {
                mesh.on_composite_update(resolved);
            }
        }
    }
}
