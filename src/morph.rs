use std::sync::Arc;

use glam::Vec3;

/// One shape-interpolation target. Displacement data is shared; the unique
/// identifier comes from the owning scene's counter, the same space nodes and
/// skeletons draw from, so clone remapping treats targets like any entity.
#[derive(Clone)]
pub struct MorphTarget {
    pub name: String,
    pub unique_id: u64,
    pub weight: f32,
    /// Per-vertex position displacements relative to the base geometry.
    pub position_deltas: Arc<[Vec3]>,
}

/// The named set of morph targets attached to one mesh.
#[derive(Clone, Default)]
pub struct MorphTargetManager {
    pub targets: Vec<MorphTarget>,
}

impl MorphTargetManager {
    pub fn num_targets(&self) -> usize {
        self.targets.len()
    }
}
