// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Dirty region tracking: comparing the blocking entities of a scene with the
//! fingerprints of the previous build.

use hashbrown::HashSet;
use understory_tiling::{Aabb3D, Damage};

use crate::fingerprint::{FingerprintTable, content_hash};
use crate::scene::Entity;
use crate::types::EntityId;

/// How an entity relates to the previous build.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum EntityState {
    /// Not present in the previous build.
    New,
    /// Present with a different content hash.
    Changed,
    /// Present with the same content hash; the previous entry is reused.
    Unchanged,
}

/// One current entity with its classification.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct EntityDelta {
    /// The entity.
    pub id: EntityId,
    /// Position of the entity in the slice passed to [`diff`].
    pub index: usize,
    /// Current content hash.
    pub content_hash: u64,
    /// Classification.
    pub state: EntityState,
}

/// An entity of the previous build that no longer blocks.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct RemovedEntity {
    /// The entity.
    pub id: EntityId,
    /// Bounds of its last bounded geometry.
    pub bounds: Aabb3D,
    /// Whether it carried unbounded planes.
    pub had_unbounded: bool,
}

/// Result of [`diff`].
#[derive(Clone, Debug, Default, PartialEq)]
pub struct SceneDiff {
    /// Current entities in scene order, duplicates removed.
    pub entities: Vec<EntityDelta>,
    /// Entities of the previous build absent from the scene, by ascending id.
    pub removed: Vec<RemovedEntity>,
}

/// Classify every entity of `current` against `previous`.
///
/// `current` is expected to hold only blocking entities; anything that stopped blocking
/// is therefore reported as removed. When an id appears more than once the first
/// occurrence wins.
pub fn diff(previous: &FingerprintTable, current: &[Entity]) -> SceneDiff {
    let mut seen = HashSet::with_capacity(current.len());
    let mut entities = Vec::with_capacity(current.len());
    for (index, entity) in current.iter().enumerate() {
        if !seen.insert(entity.id) {
            log::warn!("skipping duplicate entity {}", entity.id);
            continue;
        }
        let hash = content_hash(entity);
        let state = match previous.get(&entity.id) {
            None => EntityState::New,
            Some(prev) if prev.content_hash != hash => EntityState::Changed,
            Some(_) => EntityState::Unchanged,
        };
        entities.push(EntityDelta {
            id: entity.id,
            index,
            content_hash: hash,
            state,
        });
    }

    let removed = previous
        .ids()
        .into_iter()
        .filter(|id| !seen.contains(id))
        .filter_map(|id| previous.get(&id))
        .map(|entry| RemovedEntity {
            id: entry.entity_id,
            bounds: entry.bounds(),
            had_unbounded: entry.has_unbounded(),
        })
        .collect();

    SceneDiff { entities, removed }
}

impl SceneDiff {
    /// Ids of new and changed entities, in scene order.
    pub fn changed(&self) -> impl Iterator<Item = EntityId> + '_ {
        self.entities
            .iter()
            .filter(|d| d.state != EntityState::Unchanged)
            .map(|d| d.id)
    }

    /// Last known bounds of every removed entity.
    pub fn removed_regions(&self) -> impl Iterator<Item = Aabb3D> + '_ {
        self.removed.iter().map(|r| r.bounds)
    }

    /// Number of entities in `state`.
    pub fn count(&self, state: EntityState) -> usize {
        self.entities.iter().filter(|d| d.state == state).count()
    }

    /// True if nothing was added, changed, or removed.
    pub fn is_clean(&self) -> bool {
        self.removed.is_empty() && self.changed().next().is_none()
    }

    /// Fold the diff into bounding-volume damage.
    ///
    /// New entities contribute their current bounds, changed ones both their previous and
    /// current bounds, removed ones their last bounds.
    pub fn damage(&self, current: &FingerprintTable, previous: &FingerprintTable) -> Damage {
        let mut damage = Damage::default();
        for delta in &self.entities {
            let new_bounds = current.get(&delta.id).map(|e| e.bounds());
            match delta.state {
                EntityState::Unchanged => {}
                EntityState::New => damage.added.extend(new_bounds),
                EntityState::Changed => {
                    let old = previous
                        .get(&delta.id)
                        .map_or(Aabb3D::EMPTY, |e| e.bounds());
                    damage
                        .moved
                        .push((old, new_bounds.unwrap_or(Aabb3D::EMPTY)));
                }
            }
        }
        damage.removed.extend(self.removed_regions());
        damage
    }

    /// Whether any new, changed, or removed entity carries or carried unbounded planes.
    pub fn touches_unbounded(
        &self,
        current: &FingerprintTable,
        previous: &FingerprintTable,
    ) -> bool {
        let carries = |table: &FingerprintTable, id: &EntityId| {
            table.get(id).is_some_and(|e| e.has_unbounded())
        };
        self.changed()
            .any(|id| carries(current, &id) || carries(previous, &id))
            || self.removed.iter().any(|r| r.had_unbounded)
    }
}
