//! Window handle to instance routing.
//!
//! Native callbacks arrive with nothing but a window handle, so each
//! backend keeps a process wide table from handle to its shared state.
//! Entries are weak: the table routes, it never owns. An entry is
//! removed during teardown before the handle itself is invalidated, so
//! a lookup can never hand out state whose window is already gone.

use std::collections::HashMap;
use std::sync::{Arc, RwLock, Weak};

pub struct Registry<T> {
    entries: RwLock<HashMap<isize, Weak<T>>>,
}

impl<T> Registry<T> {
    pub fn new() -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
        }
    }

    pub fn insert(&self, handle: isize, instance: &Arc<T>) {
        self.entries
            .write()
            .unwrap()
            .insert(handle, Arc::downgrade(instance));
    }

    /// Upgrades the entry for `handle`, if it is still live.
    pub fn get(&self, handle: isize) -> Option<Arc<T>> {
        self.entries.read().unwrap().get(&handle)?.upgrade()
    }

    pub fn remove(&self, handle: isize) {
        self.entries.write().unwrap().remove(&handle);
    }

    pub fn len(&self) -> usize {
        self.entries.read().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<T> Default for Registry<T> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    #[test]
    fn test_insert_get_remove() {
        let registry = Registry::new();
        let instance = Arc::new("state");
        registry.insert(7, &instance);
        assert_eq!(registry.len(), 1);
        assert_eq!(registry.get(7).as_deref(), Some(&"state"));
        registry.remove(7);
        assert!(registry.get(7).is_none());
        assert!(registry.is_empty());
    }

    #[test]
    fn test_entries_do_not_keep_instances_alive() {
        let registry = Registry::new();
        let instance = Arc::new(1u32);
        registry.insert(9, &instance);
        drop(instance);
        assert!(registry.get(9).is_none());
        // The stale entry still counts until removed.
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_concurrent_access() {
        let registry = Arc::new(Registry::new());
        let instance = Arc::new(0u8);
        registry.insert(1, &instance);

        let readers: Vec<_> = (0..4)
            .map(|_| {
                let registry = registry.clone();
                thread::spawn(move || {
                    for _ in 0..1000 {
                        let _ = registry.get(1);
                    }
                })
            })
            .collect();
        let writer = {
            let registry = registry.clone();
            let instance = instance.clone();
            thread::spawn(move || {
                for handle in 2..1000 {
                    registry.insert(handle, &instance);
                    registry.remove(handle);
                }
            })
        };

        for reader in readers {
            reader.join().unwrap();
        }
        writer.join().unwrap();
        assert_eq!(registry.len(), 1);
    }
}
