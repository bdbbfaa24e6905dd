//! Retained-mode scene that visualizers draw into.
//!
//! Visualizers never own the scene. Each call receives a `&mut dyn Plotter`,
//! adds actors once and afterwards only moves, restyles or removes them
//! through their [`ActorHandle`]s.

mod actor;
mod bounds;
mod style;

pub use actor::*;
pub use bounds::*;
pub use style::*;

use std::collections::HashMap;

use glam::DMat4;

/// Scene errors
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SceneError {
    #[error("Actor not found: {0}")]
    ActorNotFound(ActorHandle),
}

/// Rendering surface the visualizers draw into.
pub trait Plotter {
    /// Add an actor with an identity transform and return its handle.
    fn add_actor(&mut self, geometry: Geometry, style: ActorStyle) -> ActorHandle;

    /// Replace the actor's local-to-world transform.
    fn set_transform(&mut self, actor: ActorHandle, transform: DMat4) -> Result<(), SceneError>;

    /// Replace the actor's geometry.
    fn set_geometry(&mut self, actor: ActorHandle, geometry: Geometry) -> Result<(), SceneError>;

    fn set_style(&mut self, actor: ActorHandle, style: ActorStyle) -> Result<(), SceneError>;

    fn set_visible(&mut self, actor: ActorHandle, visible: bool) -> Result<(), SceneError>;

    fn remove_actor(&mut self, actor: ActorHandle) -> Result<(), SceneError>;

    fn contains(&self, actor: ActorHandle) -> bool;

    fn actor_count(&self) -> usize;
}

/// In-memory [`Plotter`].
///
/// Actors are iterated in insertion order so later actors draw on top of
/// earlier ones at equal depth.
pub struct Scene {
    actors: HashMap<ActorHandle, Actor>,
    order: Vec<ActorHandle>,
    dirty: bool,
}

impl Scene {
    /// Creates a new empty scene.
    pub fn new() -> Self {
        Self {
            actors: HashMap::new(),
            order: Vec::new(),
            dirty: false,
        }
    }

    /// Returns true if the scene has been modified since last render.
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Marks the scene as clean (called after rendering).
    pub fn mark_clean(&mut self) {
        self.dirty = false;
    }

    pub fn actor(&self, handle: ActorHandle) -> Option<&Actor> {
        self.actors.get(&handle)
    }

    fn actor_mut(&mut self, handle: ActorHandle) -> Result<&mut Actor, SceneError> {
        self.dirty = true;
        self.actors
            .get_mut(&handle)
            .ok_or(SceneError::ActorNotFound(handle))
    }

    /// Iterates actors in insertion order.
    pub fn actors(&self) -> impl Iterator<Item = &Actor> {
        self.order.iter().filter_map(|h| self.actors.get(h))
    }

    pub fn len(&self) -> usize {
        self.actors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.actors.is_empty()
    }

    /// Removes every actor.
    pub fn clear(&mut self) {
        self.actors.clear();
        self.order.clear();
        self.dirty = true;
    }

    /// Computes the bounding box of all visible actors.
    pub fn compute_bounds(&self) -> Option<BoundingBox> {
        self.actors()
            .filter(|actor| actor.visible)
            .filter_map(Actor::world_bounds)
            .reduce(|a, b| a.union(&b))
    }
}

impl Default for Scene {
    fn default() -> Self {
        Self::new()
    }
}

impl Plotter for Scene {
    fn add_actor(&mut self, geometry: Geometry, style: ActorStyle) -> ActorHandle {
        let actor = Actor::new(geometry, style);
        let id = actor.id;
        self.actors.insert(id, actor);
        self.order.push(id);
        self.dirty = true;
        id
    }

    fn set_transform(&mut self, actor: ActorHandle, transform: DMat4) -> Result<(), SceneError> {
        self.actor_mut(actor)?.transform = transform;
        Ok(())
    }

    fn set_geometry(&mut self, actor: ActorHandle, geometry: Geometry) -> Result<(), SceneError> {
        self.actor_mut(actor)?.geometry = geometry;
        Ok(())
    }

    fn set_style(&mut self, actor: ActorHandle, style: ActorStyle) -> Result<(), SceneError> {
        self.actor_mut(actor)?.style = style;
        Ok(())
    }

    fn set_visible(&mut self, actor: ActorHandle, visible: bool) -> Result<(), SceneError> {
        self.actor_mut(actor)?.visible = visible;
        Ok(())
    }

    fn remove_actor(&mut self, actor: ActorHandle) -> Result<(), SceneError> {
        self.actors
            .remove(&actor)
            .ok_or(SceneError::ActorNotFound(actor))?;
        self.order.retain(|h| *h != actor);
        self.dirty = true;
        Ok(())
    }

    fn contains(&self, actor: ActorHandle) -> bool {
        self.actors.contains_key(&actor)
    }

    fn actor_count(&self) -> usize {
        self.actors.len()
    }
}
