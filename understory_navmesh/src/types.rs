// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Public identifier and flag types.

use core::fmt;

/// Stable identifier of a scene entity.
///
/// Identifiers are opaque to the builder; they only need to stay the same for the same
/// entity across builds so fingerprints can be matched.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct EntityId(pub u128);

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:032x}", self.0)
    }
}

impl From<u128> for EntityId {
    fn from(value: u128) -> Self {
        Self(value)
    }
}

bitflags::bitflags! {
    /// Collision groups a collider belongs to, or a build includes.
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
    #[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
    pub struct CollisionGroups: u16 {
        /// Default group of newly created colliders.
        const DEFAULT = 0x0001;
        /// Static world geometry.
        const STATIC = 0x0002;
        /// Kinematic bodies.
        const KINEMATIC = 0x0004;
        /// Small debris.
        const DEBRIS = 0x0008;
        /// Sensors and triggers.
        const SENSOR_TRIGGER = 0x0010;
        /// Characters.
        const CHARACTER = 0x0020;
        /// User group 1.
        const CUSTOM1 = 0x0040;
        /// User group 2.
        const CUSTOM2 = 0x0080;
        /// User group 3.
        const CUSTOM3 = 0x0100;
        /// User group 4.
        const CUSTOM4 = 0x0200;
        /// User group 5.
        const CUSTOM5 = 0x0400;
        /// User group 6.
        const CUSTOM6 = 0x0800;
        /// User group 7.
        const CUSTOM7 = 0x1000;
        /// User group 8.
        const CUSTOM8 = 0x2000;
        /// User group 9.
        const CUSTOM9 = 0x4000;
        /// User group 10.
        const CUSTOM10 = 0x8000;
    }
}

impl Default for CollisionGroups {
    fn default() -> Self {
        Self::DEFAULT
    }
}
