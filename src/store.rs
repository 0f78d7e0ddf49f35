//! Data access for handlers.
//!
//! Handlers talk to storage only through [`Repository`]. The in-memory
//! implementation assigns ids in insertion order starting at 1.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::{PoisonError, RwLock};

/// Read access to one entity type.
pub trait Repository<T> {
    /// The entity with this primary key, if any.
    fn get(&self, id: i64) -> Option<T>;

    /// Every entity, in primary-key order.
    fn all(&self) -> Vec<T>;
}

/// A thread-safe repository held in memory.
pub struct MemoryRepository<T> {
    rows: RwLock<BTreeMap<i64, T>>,
    next_id: AtomicI64,
}

impl<T: Clone> MemoryRepository<T> {
    pub fn new() -> Self {
        Self {
            rows: RwLock::new(BTreeMap::new()),
            next_id: AtomicI64::new(1),
        }
    }

    /// Store a new entity built from its assigned id and return a copy.
    pub fn insert(&self, build: impl FnOnce(i64) -> T) -> T {
        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        let row = build(id);
        self.rows
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(id, row.clone());
        row
    }

    pub fn len(&self) -> usize {
        self.rows.read().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<T: Clone> Default for MemoryRepository<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Clone> Repository<T> for MemoryRepository<T> {
    fn get(&self, id: i64) -> Option<T> {
        self.rows
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&id)
            .cloned()
    }

    fn all(&self) -> Vec<T> {
        self.rows
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .values()
            .cloned()
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, PartialEq)]
    struct Author {
        id: i64,
        name: String,
    }

    #[test]
    fn test_insert_assigns_sequential_ids() {
        let authors = MemoryRepository::new();
        let first = authors.insert(|id| Author { id, name: "Ann".to_string() });
        let second = authors.insert(|id| Author { id, name: "Bob".to_string() });
        assert_eq!(first.id, 1);
        assert_eq!(second.id, 2);
        assert_eq!(authors.len(), 2);
    }

    #[test]
    fn test_get_and_all() {
        let authors = MemoryRepository::new();
        assert!(authors.is_empty());
        assert!(authors.all().is_empty());

        authors.insert(|id| Author { id, name: "Ann".to_string() });
        authors.insert(|id| Author { id, name: "Bob".to_string() });

        assert_eq!(authors.get(2).unwrap().name, "Bob");
        assert!(authors.get(3).is_none());
        let names: Vec<String> = authors.all().into_iter().map(|a| a.name).collect();
        assert_eq!(names, vec!["Ann", "Bob"]);
    }
}
