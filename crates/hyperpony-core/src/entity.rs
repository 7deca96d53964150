//! Entities and primary-key lookup.
//!
//! Hyperpony has no ORM. Entity-typed parameters are resolved through an
//! [`EntityLookup`] the host registers with the site.

use std::any::Any;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use crate::error::{HyperponyError, HyperponyResult};

/// A record addressable by primary key.
pub trait Entity: Any + Send + Sync + fmt::Debug {
    /// The entity type name used for lookups (e.g. `"Contact"`).
    fn entity_name(&self) -> &str;

    /// The primary key in its textual form.
    fn pk(&self) -> String;

    /// Upcast for downcasting to the concrete type.
    fn as_any(&self) -> &dyn Any;
}

/// Shared handle to an entity.
pub type EntityRef = Arc<dyn Entity>;

/// Downcasts an entity handle to its concrete type.
#[must_use]
pub fn downcast_entity<T: Entity>(entity: &EntityRef) -> Option<&T> {
    entity.as_any().downcast_ref::<T>()
}

/// Resolves entities by type name and primary key.
///
/// Implementations return [`HyperponyError::EntityNotFound`] on a miss; the
/// parameter engine rewrites it to the key-carrying variant when the
/// parameter asks for that.
pub trait EntityLookup: Send + Sync {
    /// Fetches one entity.
    fn get_by_pk(&self, entity: &str, pk: &str) -> HyperponyResult<EntityRef>;
}

/// An in-memory [`EntityLookup`], mostly for tests and demos.
#[derive(Debug, Default, Clone)]
pub struct MemoryEntityStore {
    entities: HashMap<(String, String), EntityRef>,
}

impl MemoryEntityStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds or replaces an entity.
    pub fn insert(&mut self, entity: impl Entity) {
        let entity: EntityRef = Arc::new(entity);
        self.entities
            .insert((entity.entity_name().to_string(), entity.pk()), entity);
    }

    /// Builder form of [`insert`](Self::insert).
    #[must_use]
    pub fn with(mut self, entity: impl Entity) -> Self {
        self.insert(entity);
        self
    }
}

impl EntityLookup for MemoryEntityStore {
    fn get_by_pk(&self, entity: &str, pk: &str) -> HyperponyResult<EntityRef> {
        self.entities
            .get(&(entity.to_string(), pk.to_string()))
            .cloned()
            .ok_or_else(|| HyperponyError::entity_not_found(entity))
    }
}
