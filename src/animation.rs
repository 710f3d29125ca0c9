use std::sync::Arc;

use glam::{Quat, Vec3};
use id_arena::Id;

use crate::scene_graph::node::NodeId;

pub type AnimationGroupId = Id<AnimationGroup>;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Keyframe<T> {
    pub time: f32,
    pub value: T,
}

/// Key data for one animated property. Shared between an animation group and
/// its clones through `Arc`; only the target reference differs per clone.
pub enum AnimationChannel {
    Translation(Vec<Keyframe<Vec3>>),
    Rotation(Vec<Keyframe<Quat>>),
    Scaling(Vec<Keyframe<Vec3>>),
    /// Influence of one morph target over time.
    Weight(Vec<Keyframe<f32>>),
}

pub struct Animation {
    pub name: String,
    pub channel: AnimationChannel,
}

impl Animation {
    pub fn duration(&self) -> f32 {
        match &self.channel {
            AnimationChannel::Translation(keys) | AnimationChannel::Scaling(keys) => {
                keys.last().map(|key| key.time).unwrap_or(0.0)
            }
            AnimationChannel::Rotation(keys) => keys.last().map(|key| key.time).unwrap_or(0.0),
            AnimationChannel::Weight(keys) => keys.last().map(|key| key.time).unwrap_or(0.0),
        }
    }
}

/// The entity an animation drives. Resolved to a unique identifier through
/// [`Scene::target_unique_id`](crate::scene_graph::Scene::target_unique_id)
/// when clones need remapping.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnimationTarget {
    Node(NodeId),
    MorphTarget { node: NodeId, index: usize },
}

#[derive(Clone)]
pub struct TargetedAnimation {
    pub animation: Arc<Animation>,
    pub target: AnimationTarget,
}

pub struct AnimationGroup {
    pub name: String,
    pub unique_id: u64,
    pub targeted_animations: Vec<TargetedAnimation>,
    pub attached: bool,
    pub disposed: bool,
}

impl AnimationGroup {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            unique_id: 0,
            targeted_animations: Vec::new(),
            attached: true,
            disposed: false,
        }
    }

    pub fn add_targeted_animation(&mut self, animation: Arc<Animation>, target: AnimationTarget) {
        self.targeted_animations
            .push(TargetedAnimation { animation, target });
    }

    pub fn duration(&self) -> f32 {
        self.targeted_animations
            .iter()
            .map(|targeted| targeted.animation.duration())
            .fold(0.0, f32::max)
    }
}
