//! Collision groups, collider tags and the data packed into collider user data.

use engine_core::Entity;
use rapier3d::prelude::*;

/// Collision groups for different body types.
#[repr(u32)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CollisionGroup {
    /// Static scene geometry (planets, platforms)
    Environment = 1 << 0,
    /// The player ship
    Ship = 1 << 1,
}

impl CollisionGroup {
    /// Create a collision group for environment.
    pub fn environment() -> InteractionGroups {
        InteractionGroups::new(
            Group::from_bits_retain(Self::Environment as u32),
            Group::ALL,
        )
    }

    /// Create a collision group for the ship.
    pub fn ship() -> InteractionGroups {
        InteractionGroups::new(
            Group::from_bits_retain(Self::Ship as u32),
            Group::from_bits_retain(Self::Environment as u32),
        )
    }
}

/// Classification tags carried by scene colliders.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct ColliderTags(u32);

impl ColliderTags {
    pub const NONE: Self = Self(0);
    /// Pulls radially toward the collider center.
    pub const SPHERE_GRAVITY: Self = Self(1 << 0);
    /// Pulls along world down inside the platform volume.
    pub const DIR_GRAVITY: Self = Self(1 << 1);
    /// Large enough that the chase camera flips to the other side instead of diving in.
    pub const LARGE: Self = Self(1 << 2);

    pub fn bits(self) -> u32 {
        self.0
    }

    pub fn from_bits(bits: u32) -> Self {
        Self(bits)
    }

    pub fn contains(self, other: Self) -> bool {
        other.0 != 0 && self.0 & other.0 == other.0
    }

    pub fn is_empty(self) -> bool {
        self.0 == 0
    }
}

impl std::ops::BitOr for ColliderTags {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

impl std::ops::BitOrAssign for ColliderTags {
    fn bitor_assign(&mut self, rhs: Self) {
        self.0 |= rhs.0;
    }
}

/// What a collider's `user_data` encodes: tags in the low 32 bits,
/// the owning scene entity in the high 64 bits (0 = no owner).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ColliderData {
    pub tags: ColliderTags,
    pub owner: Option<Entity>,
}

impl ColliderData {
    pub fn new(tags: ColliderTags, owner: Option<Entity>) -> Self {
        Self { tags, owner }
    }

    pub fn pack(self) -> u128 {
        let owner = self.owner.map_or(0, |e| e.to_bits().get());
        ((owner as u128) << 64) | self.tags.bits() as u128
    }

    pub fn unpack(user_data: u128) -> Self {
        let tags = ColliderTags::from_bits(user_data as u32);
        let owner = Entity::from_bits((user_data >> 64) as u64);
        Self { tags, owner }
    }
}

/// Component linking an arena entity to its static collider.
#[derive(Debug, Clone, Copy)]
pub struct PhysicsBody {
    pub collider: ColliderHandle,
}

impl PhysicsBody {
    pub fn fixed(collider: ColliderHandle) -> Self {
        Self { collider }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tags_contain_combined_bits() {
        let planet = ColliderTags::SPHERE_GRAVITY | ColliderTags::LARGE;
        assert!(planet.contains(ColliderTags::SPHERE_GRAVITY));
        assert!(planet.contains(ColliderTags::LARGE));
        assert!(!planet.contains(ColliderTags::DIR_GRAVITY));
        assert!(!planet.contains(ColliderTags::NONE));
    }

    #[test]
    fn collider_data_survives_user_data_packing() {
        let mut world = engine_core::World::new();
        let entity = world.spawn((1u32,));
        let data = ColliderData::new(ColliderTags::DIR_GRAVITY, Some(entity));
        assert_eq!(ColliderData::unpack(data.pack()), data);

        let orphan = ColliderData::new(ColliderTags::LARGE, None);
        assert_eq!(ColliderData::unpack(orphan.pack()), orphan);
    }
}
