use crate::physics::backend::BodyHandle;
use crate::physics::collider::ColliderRef;
use rustc_hash::FxHashMap;
use std::sync::Arc;

/// Registry entry owning the native body for one record.
pub struct RegistryEntry {
    pub collider: ColliderRef,
    pub body: BodyHandle,
}

/// Bidirectional collider/body map.
///
/// Both directions go through the same insert and remove calls, so their
/// consistency is structural rather than a convention to uphold.
#[derive(Default)]
pub struct ColliderRegistry {
    by_id: FxHashMap<u32, RegistryEntry>,
    by_body: FxHashMap<BodyHandle, u32>,
}

impl ColliderRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, id: u32, collider: ColliderRef, body: BodyHandle) {
        debug_assert!(!self.by_id.contains_key(&id), "id {} already mapped", id);
        debug_assert!(!self.by_body.contains_key(&body), "body already mapped");
        self.by_body.insert(body, id);
        self.by_id.insert(id, RegistryEntry { collider, body });
    }

    pub fn remove(&mut self, id: u32) -> Option<RegistryEntry> {
        let entry = self.by_id.remove(&id)?;
        self.by_body.remove(&entry.body);
        Some(entry)
    }

    pub fn get(&self, id: u32) -> Option<&RegistryEntry> {
        self.by_id.get(&id)
    }

    pub fn id_of_body(&self, body: BodyHandle) -> Option<u32> {
        self.by_body.get(&body).copied()
    }

    /// Whether this exact record is registered here.
    pub fn contains(&self, collider: &ColliderRef) -> bool {
        collider.id().is_some_and(|id| {
            self.by_id
                .get(&id)
                .is_some_and(|entry| Arc::ptr_eq(&entry.collider, collider))
        })
    }

    pub fn entries(&self) -> impl Iterator<Item = (u32, &RegistryEntry)> {
        self.by_id.iter().map(|(id, entry)| (*id, entry))
    }

    pub fn len(&self) -> usize {
        self.by_id.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_id.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::physics::collider::{Collider, ColliderShape};

    fn sphere() -> ColliderRef {
        Collider::dynamic(ColliderShape::Sphere { radius: 1.0 }, 1.0)
    }

    #[test]
    fn test_insert_keeps_both_directions_consistent() {
        let mut registry = ColliderRegistry::new();
        let collider = sphere();
        let body = BodyHandle::from_raw(42);

        registry.insert(7, collider.clone(), body);

        assert_eq!(registry.len(), 1);
        assert_eq!(registry.id_of_body(body), Some(7));
        let entry = registry.get(7).expect("Failed to look up entry");
        assert_eq!(entry.body, body);
        assert!(Arc::ptr_eq(&entry.collider, &collider));
    }

    #[test]
    fn test_remove_erases_both_directions() {
        let mut registry = ColliderRegistry::new();
        let body = BodyHandle::from_raw(1);
        registry.insert(0, sphere(), body);

        let entry = registry.remove(0).expect("Failed to remove entry");
        assert_eq!(entry.body, body);
        assert!(registry.get(0).is_none());
        assert!(registry.id_of_body(body).is_none());
        assert!(registry.is_empty());

        assert!(registry.remove(0).is_none());
    }

    #[test]
    fn test_contains_requires_record_identity() {
        let mut registry = ColliderRegistry::new();
        let registered = sphere();
        registered.assign_id(3);
        registry.insert(3, registered.clone(), BodyHandle::from_raw(9));

        assert!(registry.contains(&registered));

        // A different record that happens to carry the same id.
        let imposter = sphere();
        imposter.assign_id(3);
        assert!(!registry.contains(&imposter));

        let unregistered = sphere();
        assert!(!registry.contains(&unregistered));
    }
}
