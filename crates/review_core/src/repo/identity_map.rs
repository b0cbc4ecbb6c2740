//! Identity map from persisted review id to the live in-memory instance.
//!
//! # Invariants
//! - One entry per id; lookups hand out the same `Rc`, never a copy.
//! - The map does not touch storage.

use crate::model::review::{Review, ReviewId};
use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

/// Shared handle to a live review. Identity is `Rc::ptr_eq`.
pub type ReviewHandle = Rc<RefCell<Review>>;

#[derive(Debug, Default)]
pub struct IdentityMap {
    entries: HashMap<ReviewId, ReviewHandle>,
}

impl IdentityMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the live instance for `id`, if one is mapped.
    pub fn get(&self, id: ReviewId) -> Option<ReviewHandle> {
        self.entries.get(&id).map(Rc::clone)
    }

    pub fn contains(&self, id: ReviewId) -> bool {
        self.entries.contains_key(&id)
    }

    /// Maps `id` to `handle`.
    ///
    /// Returns the previously mapped instance when it was a different object.
    pub fn register(&mut self, id: ReviewId, handle: ReviewHandle) -> Option<ReviewHandle> {
        let previous = self.entries.insert(id, Rc::clone(&handle))?;
        if Rc::ptr_eq(&previous, &handle) {
            None
        } else {
            Some(previous)
        }
    }

    pub fn remove(&mut self, id: ReviewId) -> Option<ReviewHandle> {
        self.entries.remove(&id)
    }

    /// Iterates the mapped instances in no particular order.
    pub fn handles(&self) -> impl Iterator<Item = &ReviewHandle> {
        self.entries.values()
    }

    /// Empties the map and returns every evicted instance.
    pub fn clear(&mut self) -> Vec<ReviewHandle> {
        self.entries.drain().map(|(_, handle)| handle).collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::{IdentityMap, ReviewHandle};
    use crate::model::review::Review;
    use std::cell::RefCell;
    use std::rc::Rc;

    fn handle(summary: &str) -> ReviewHandle {
        let review = Review::from_storage(1, 2024, summary.to_string(), 1).unwrap();
        Rc::new(RefCell::new(review))
    }

    #[test]
    fn get_returns_the_registered_object() {
        let mut map = IdentityMap::new();
        let review = handle("steady");
        assert!(map.register(1, Rc::clone(&review)).is_none());

        let found = map.get(1).unwrap();
        assert!(Rc::ptr_eq(&found, &review));
        assert!(map.contains(1));
        assert!(map.get(2).is_none());
    }

    #[test]
    fn re_registering_same_object_reports_nothing_replaced() {
        let mut map = IdentityMap::new();
        let review = handle("steady");
        map.register(1, Rc::clone(&review));

        assert!(map.register(1, Rc::clone(&review)).is_none());
        assert_eq!(map.len(), 1);
    }

    #[test]
    fn registering_different_object_returns_the_replaced_one() {
        let mut map = IdentityMap::new();
        let first = handle("first");
        let second = handle("second");
        map.register(1, Rc::clone(&first));

        let replaced = map.register(1, Rc::clone(&second)).unwrap();
        assert!(Rc::ptr_eq(&replaced, &first));
        assert!(Rc::ptr_eq(&map.get(1).unwrap(), &second));
    }

    #[test]
    fn clear_evicts_everything() {
        let mut map = IdentityMap::new();
        map.register(1, handle("a"));
        map.register(2, handle("b"));

        let evicted = map.clear();
        assert_eq!(evicted.len(), 2);
        assert!(map.is_empty());
        assert!(map.remove(1).is_none());
    }
}
