use std::collections::HashMap;
use slotmap::{Key, SlotMap};
use crate::gl::GLuint;

slotmap::new_key_type! {
    pub struct TextureHandle;
    pub struct FramebufferHandle;
    pub struct BufferHandle;
    pub struct ProgramHandle;
}

struct Entry<T> {
    object: T,
    ref_count: u32,
}

/// Reference-counted storage for resource objects addressed by stable handles.
///
/// Whoever holds a handle (a GL name, a binding point, a framebuffer
/// attachment) owns one reference. The object is dropped, freeing its GPU
/// memory, when the last reference is released.
pub struct ResourceArena<K: Key, T> {
    entries: SlotMap<K, Entry<T>>,
}

impl<K: Key, T> Default for ResourceArena<K, T> {
    fn default() -> Self {
        Self {
            entries: SlotMap::with_key(),
        }
    }
}

impl<K: Key, T> ResourceArena<K, T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store `object` with a single reference held by the caller.
    pub fn insert(&mut self, object: T) -> K {
        self.entries.insert(Entry { object, ref_count: 1 })
    }

    pub fn retain(&mut self, handle: K) {
        if let Some(entry) = self.entries.get_mut(handle) {
            entry.ref_count += 1;
        }
    }

    /// Drop one reference. Returns the object when that was the last one.
    pub fn release(&mut self, handle: K) -> Option<T> {
        let entry = self.entries.get_mut(handle)?;
        entry.ref_count -= 1;
        if entry.ref_count == 0 {
            self.entries.remove(handle).map(|entry| entry.object)
        } else {
            None
        }
    }

    pub fn get(&self, handle: K) -> Option<&T> {
        self.entries.get(handle).map(|entry| &entry.object)
    }

    pub fn get_mut(&mut self, handle: K) -> Option<&mut T> {
        self.entries.get_mut(handle).map(|entry| &mut entry.object)
    }

    pub fn contains(&self, handle: K) -> bool {
        self.entries.contains_key(handle)
    }

    pub fn ref_count(&self, handle: K) -> u32 {
        self.entries.get(handle).map_or(0, |entry| entry.ref_count)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = (K, &mut T)> {
        self.entries.iter_mut().map(|(k, entry)| (k, &mut entry.object))
    }
}

/// GL object names of one namespace. Name 0 is reserved and never mapped.
pub struct NameTable<K: Key> {
    names: HashMap<GLuint, Option<K>>,
    next_name: GLuint,
}

impl<K: Key> Default for NameTable<K> {
    fn default() -> Self {
        Self {
            names: HashMap::new(),
            next_name: 1,
        }
    }
}

impl<K: Key> NameTable<K> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reserve `count` unused names. Objects are only created on first bind.
    pub fn generate(&mut self, count: usize) -> Vec<GLuint> {
        let mut generated = Vec::with_capacity(count);
        while generated.len() < count {
            let name = self.next_name;
            self.next_name = self.next_name.wrapping_add(1).max(1);
            if !self.names.contains_key(&name) {
                self.names.insert(name, None);
                generated.push(name);
            }
        }
        generated
    }

    /// Handle bound to `name`, if an object was created for it.
    pub fn get(&self, name: GLuint) -> Option<K> {
        self.names.get(&name).copied().flatten()
    }

    pub fn is_name(&self, name: GLuint) -> bool {
        name != 0 && self.names.contains_key(&name)
    }

    /// Associate `name` with a newly created object.
    pub fn bind(&mut self, name: GLuint, handle: K) {
        if name != 0 {
            self.names.insert(name, Some(handle));
        }
    }

    /// Forget `name`, returning the object handle it referred to.
    pub fn remove(&mut self, name: GLuint) -> Option<K> {
        if name == 0 {
            return None;
        }
        self.names.remove(&name).flatten()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn last_release_returns_object() {
        let mut arena: ResourceArena<TextureHandle, String> = ResourceArena::new();
        let handle = arena.insert("texture".to_owned());
        arena.retain(handle);
        assert_eq!(arena.ref_count(handle), 2);
        assert_eq!(arena.release(handle), None);
        assert!(arena.contains(handle));
        assert_eq!(arena.release(handle).as_deref(), Some("texture"));
        assert!(!arena.contains(handle));
        assert_eq!(arena.release(handle), None);
    }

    #[test]
    fn stale_handle_does_not_alias_new_object() {
        let mut arena: ResourceArena<BufferHandle, u32> = ResourceArena::new();
        let old = arena.insert(1);
        arena.release(old);
        let new = arena.insert(2);
        assert_eq!(arena.get(old), None);
        assert_eq!(arena.get(new), Some(&2));
    }

    #[test]
    fn generated_names_are_unique_and_nonzero() {
        let mut names: NameTable<TextureHandle> = NameTable::new();
        let first = names.generate(3);
        let second = names.generate(2);
        assert_eq!(first, vec![1, 2, 3]);
        assert_eq!(second, vec![4, 5]);
        assert!(names.is_name(2));
        assert!(!names.is_name(0));
        assert_eq!(names.get(2), None);
    }

    #[test]
    fn bound_name_resolves_until_removed() {
        let mut arena: ResourceArena<TextureHandle, ()> = ResourceArena::new();
        let mut names: NameTable<TextureHandle> = NameTable::new();
        let handle = arena.insert(());
        names.bind(7, handle);
        assert_eq!(names.get(7), Some(handle));
        assert_eq!(names.remove(7), Some(handle));
        assert_eq!(names.get(7), None);
        names.bind(0, handle);
        assert!(!names.is_name(0));
    }
}
