//! Slot storage for the entities of one run-queue.
//!
//! The arena is also the run-queue timeline's [`NodeStore`]: a tree node id
//! is the slot index of the entity that embeds the node.

use super::entity::{EntityId, SchedEntity};
use crate::rbtree::{NodeId, NodeStore, RbNode};
use alloc::vec::Vec;

#[derive(Debug)]
struct Slot {
    generation: u32,
    entity: Option<SchedEntity>,
}

#[derive(Debug, Default)]
pub(crate) struct EntityArena {
    slots: Vec<Slot>,
    free: Vec<usize>,
    len: usize,
}

impl EntityArena {
    pub(crate) const fn new() -> Self {
        Self {
            slots: Vec::new(),
            free: Vec::new(),
            len: 0,
        }
    }

    pub(crate) fn insert(&mut self, entity: SchedEntity) -> EntityId {
        self.len += 1;
        if let Some(index) = self.free.pop() {
            let slot = &mut self.slots[index];
            slot.entity = Some(entity);
            return EntityId::new(index, slot.generation);
        }

        let index = self.slots.len();
        self.slots.push(Slot {
            generation: 0,
            entity: Some(entity),
        });
        EntityId::new(index, 0)
    }

    pub(crate) fn remove(&mut self, id: EntityId) -> Option<SchedEntity> {
        let slot = self.slots.get_mut(id.index())?;
        if slot.generation != id.generation() {
            return None;
        }
        let entity = slot.entity.take()?;
        slot.generation = slot.generation.wrapping_add(1);
        self.free.push(id.index());
        self.len -= 1;
        Some(entity)
    }

    pub(crate) fn get(&self, id: EntityId) -> Option<&SchedEntity> {
        self.slots
            .get(id.index())
            .filter(|slot| slot.generation == id.generation())
            .and_then(|slot| slot.entity.as_ref())
    }

    pub(crate) fn get_mut(&mut self, id: EntityId) -> Option<&mut SchedEntity> {
        self.slots
            .get_mut(id.index())
            .filter(|slot| slot.generation == id.generation())
            .and_then(|slot| slot.entity.as_mut())
    }

    /// Live handle of the entity in slot `index`.
    pub(crate) fn id_at(&self, index: usize) -> Option<EntityId> {
        let slot = self.slots.get(index)?;
        slot.entity
            .as_ref()
            .map(|_| EntityId::new(index, slot.generation))
    }

    pub(crate) fn len(&self) -> usize {
        self.len
    }

    pub(crate) fn iter(&self) -> impl Iterator<Item = (EntityId, &SchedEntity)> + '_ {
        self.slots.iter().enumerate().filter_map(|(index, slot)| {
            slot.entity
                .as_ref()
                .map(|se| (EntityId::new(index, slot.generation), se))
        })
    }

    fn occupied(&self, index: NodeId) -> &SchedEntity {
        match self.slots.get(index).and_then(|slot| slot.entity.as_ref()) {
            Some(se) => se,
            None => panic!("timeline links vacant entity slot {}", index),
        }
    }

    fn occupied_mut(&mut self, index: NodeId) -> &mut SchedEntity {
        match self.slots.get_mut(index).and_then(|slot| slot.entity.as_mut()) {
            Some(se) => se,
            None => panic!("timeline links vacant entity slot {}", index),
        }
    }
}

impl NodeStore for EntityArena {
    fn node(&self, id: NodeId) -> &RbNode {
        &self.occupied(id).run_node
    }

    fn node_mut(&mut self, id: NodeId) -> &mut RbNode {
        &mut self.occupied_mut(id).run_node
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insert_and_lookup() {
        let mut arena = EntityArena::new();
        let a = arena.insert(SchedEntity::new());
        let b = arena.insert(SchedEntity::new());

        assert_ne!(a, b);
        assert_eq!(arena.len(), 2);
        assert!(arena.get(a).is_some());
        assert_eq!(arena.id_at(b.index()), Some(b));
    }

    #[test]
    fn test_reused_slot_rejects_stale_handle() {
        let mut arena = EntityArena::new();
        let old = arena.insert(SchedEntity::new());
        assert!(arena.remove(old).is_some());
        assert!(arena.remove(old).is_none());

        let new = arena.insert(SchedEntity::new());
        assert_eq!(new.index(), old.index());
        assert_ne!(new.generation(), old.generation());
        assert!(arena.get(old).is_none());
        assert!(arena.get_mut(old).is_none());
        assert!(arena.get(new).is_some());
        assert_eq!(arena.len(), 1);
    }

    #[test]
    fn test_iter_skips_vacant_slots() {
        let mut arena = EntityArena::new();
        let ids: Vec<EntityId> = (0..4).map(|_| arena.insert(SchedEntity::new())).collect();
        arena.remove(ids[1]);

        let live: Vec<EntityId> = arena.iter().map(|(id, _)| id).collect();
        assert_eq!(live, alloc::vec![ids[0], ids[2], ids[3]]);
    }
}
