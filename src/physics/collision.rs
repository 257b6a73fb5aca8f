use crate::physics::collider::ColliderRef;

/// Unordered pair of collider identifiers, stored smaller-first so (a, b)
/// and (b, a) land on the same tracked entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct CollisionPair(u32, u32);

impl CollisionPair {
    pub fn new(a: u32, b: u32) -> Self {
        if a <= b {
            Self(a, b)
        } else {
            Self(b, a)
        }
    }

    pub fn first(&self) -> u32 {
        self.0
    }

    pub fn second(&self) -> u32 {
        self.1
    }

    pub fn involves(&self, id: u32) -> bool {
        self.0 == id || self.1 == id
    }
}

/// Payload of the collision started/ended signals.
#[derive(Clone)]
pub struct CollisionEvent {
    /// The record whose signal fired.
    pub collider: ColliderRef,
    /// The other side of the contact.
    pub partner: ColliderRef,
}
