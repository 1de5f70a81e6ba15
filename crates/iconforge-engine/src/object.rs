//! Renderable objects and their identity.
//!
//! The catalog itself (which objects exist, their display names) is supplied
//! by an external collaborator; this module only defines what the pipeline
//! needs: a canonical id, geometry, and a declared lighting requirement.

use std::fmt;

use crate::render::mesh::IconMesh;

/// Canonical identity of a renderable object (`namespace:name`).
///
/// Ordering and equality drive the deduplicating failure set; the output
/// filename is derived from both parts (see `export::naming`).
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ObjectId {
    pub namespace: String,
    pub name: String,
}

impl ObjectId {
    pub fn new(namespace: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
            name: name.into(),
        }
    }
}

impl fmt::Display for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.namespace, self.name)
    }
}

/// Lighting rig an object declares for itself.
///
/// `Flat` suits sprite-style icons (vertex color passes through unshaded);
/// `Shaded` is the multi-axis rig used for block-style icons: two fixed
/// directional lights over an ambient floor.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum LightingProfile {
    Flat,
    Shaded,
}

/// A single exportable object: identity, geometry, lighting requirement.
#[derive(Debug, Clone)]
pub struct IconObject {
    pub id: ObjectId,
    pub mesh: IconMesh,
    pub lighting: LightingProfile,
}

impl IconObject {
    pub fn new(id: ObjectId, mesh: IconMesh, lighting: LightingProfile) -> Self {
        Self { id, mesh, lighting }
    }

    /// An object with no geometry is skipped by the orchestrator (counted as
    /// completed, never rendered).
    pub fn is_empty(&self) -> bool {
        self.mesh.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn object_id_display() {
        let id = ObjectId::new("iconforge", "gem_red");
        assert_eq!(id.to_string(), "iconforge:gem_red");
    }

    #[test]
    fn object_id_ordering_is_namespace_then_name() {
        let a = ObjectId::new("alpha", "zzz");
        let b = ObjectId::new("beta", "aaa");
        assert!(a < b);
    }

    #[test]
    fn empty_mesh_object_reports_empty() {
        let obj = IconObject::new(
            ObjectId::new("ns", "nothing"),
            IconMesh::default(),
            LightingProfile::Flat,
        );
        assert!(obj.is_empty());
    }
}
