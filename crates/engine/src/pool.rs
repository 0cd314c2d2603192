use tracing::debug;

use crate::actor::Actor;

/// Instances constructed by `ActorPool::init`.
pub const INITIAL_BATCH_SIZE: usize = 20;

/// Stable handle to one pooled instance. Instances are never freed, so an id
/// stays valid for the pool's lifetime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PoolId(u32);

impl PoolId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// Returned by a pooled instance's update to stay active or go back to the
/// free list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PoolStep {
    Continue,
    Release,
}

/// Per-tick behavior of a pooled type when the pool runs as an actor.
pub trait Poolable<C> {
    fn update(&mut self, sync: f32, ctx: &mut C) -> PoolStep;
}

#[derive(Debug, Clone, Copy, Default)]
struct Links {
    prev: Option<u32>,
    next: Option<u32>,
}

#[derive(Debug, Clone, Copy, Default)]
struct List {
    head: Option<u32>,
    tail: Option<u32>,
    len: usize,
}

struct PoolSlot<T> {
    value: T,
    active: bool,
    links: Links,
}

/// Recycling allocator for churn-heavy instances. Every instance sits in
/// exactly one of two index-linked lists, free or active, and only
/// `set_active` moves it between them.
pub struct ActorPool<T> {
    name: &'static str,
    priority: i32,
    slots: Vec<PoolSlot<T>>,
    free: List,
    active: List,
}

impl<T> ActorPool<T> {
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            priority: 0,
            slots: Vec::new(),
            free: List::default(),
            active: List::default(),
        }
    }

    /// Update priority when the pool is scheduled as an actor.
    pub fn with_priority(mut self, priority: i32) -> Self {
        self.priority = priority;
        self
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Adds one batch of freshly constructed inactive instances.
    pub fn init(&mut self, mut factory: impl FnMut() -> T) {
        for _ in 0..INITIAL_BATCH_SIZE {
            self.allocate(factory());
        }
        debug!(
            pool = self.name,
            batch = INITIAL_BATCH_SIZE,
            size = self.slots.len(),
            "pool_initialized"
        );
    }

    /// Head of the free list, or a newly constructed instance when none is
    /// free. The returned instance is inactive until `set_active`, and stays
    /// the head: repeated calls without activating return the same id.
    pub fn get(&mut self, factory: impl FnOnce() -> T) -> PoolId {
        if let Some(head) = self.free.head {
            return PoolId(head);
        }
        let id = self.allocate(factory());
        debug!(pool = self.name, size = self.slots.len(), "pool_grew");
        id
    }

    /// `get`, configure, then activate.
    pub fn spawn(&mut self, factory: impl FnOnce() -> T, configure: impl FnOnce(&mut T)) -> PoolId {
        let id = self.get(factory);
        configure(&mut self.slots[id.index()].value);
        self.set_active(id, true);
        id
    }

    /// Moves an instance between the free and active lists. Returns false
    /// when it already had the requested state or the id is unknown.
    pub fn set_active(&mut self, id: PoolId, active: bool) -> bool {
        let index = id.0;
        let Some(slot) = self.slots.get(index as usize) else {
            return false;
        };
        if slot.active == active {
            return false;
        }
        if active {
            unlink(&mut self.free, &mut self.slots, index);
            push_back(&mut self.active, &mut self.slots, index);
        } else {
            unlink(&mut self.active, &mut self.slots, index);
            push_front(&mut self.free, &mut self.slots, index);
        }
        self.slots[index as usize].active = active;
        true
    }

    pub fn is_active(&self, id: PoolId) -> bool {
        self.slots
            .get(id.index())
            .is_some_and(|slot| slot.active)
    }

    pub fn has_active(&self) -> bool {
        self.active.head.is_some()
    }

    pub fn active_count(&self) -> usize {
        self.active.len
    }

    pub fn free_count(&self) -> usize {
        self.free.len
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub fn instance(&self, id: PoolId) -> Option<&T> {
        self.slots.get(id.index()).map(|slot| &slot.value)
    }

    pub fn instance_mut(&mut self, id: PoolId) -> Option<&mut T> {
        self.slots.get_mut(id.index()).map(|slot| &mut slot.value)
    }

    /// Active instances in activation order.
    pub fn iter_active(&self) -> ActiveIter<'_, T> {
        ActiveIter {
            slots: &self.slots,
            cursor: self.active.head,
        }
    }

    pub fn active_ids(&self) -> Vec<PoolId> {
        self.iter_active().map(|(id, _)| id).collect()
    }

    /// Returns every active instance to the free list.
    pub fn reset(&mut self) {
        self.reset_with(|_, _| {});
    }

    /// Like `reset`, calling `release` on each instance before it moves.
    pub fn reset_with(&mut self, mut release: impl FnMut(PoolId, &mut T)) {
        let mut released = 0usize;
        while let Some(head) = self.active.head {
            let id = PoolId(head);
            release(id, &mut self.slots[head as usize].value);
            self.set_active(id, false);
            released += 1;
        }
        debug!(pool = self.name, released, "pool_reset");
    }

    fn allocate(&mut self, value: T) -> PoolId {
        let index = self.slots.len() as u32;
        self.slots.push(PoolSlot {
            value,
            active: false,
            links: Links::default(),
        });
        push_back(&mut self.free, &mut self.slots, index);
        PoolId(index)
    }
}

impl<C, T: Poolable<C>> Actor<C> for ActorPool<T> {
    /// Visits active instances in activation order; an instance that asks
    /// for release returns to the free list right after its update.
    fn update(&mut self, sync: f32, ctx: &mut C) {
        let mut cursor = self.active.head;
        while let Some(index) = cursor {
            let slot = &mut self.slots[index as usize];
            cursor = slot.links.next;
            if slot.value.update(sync, ctx) == PoolStep::Release {
                self.set_active(PoolId(index), false);
            }
        }
    }

    fn is_active(&self) -> bool {
        self.has_active()
    }

    fn priority(&self) -> i32 {
        self.priority
    }

    fn name(&self) -> &'static str {
        self.name
    }
}

pub struct ActiveIter<'a, T> {
    slots: &'a [PoolSlot<T>],
    cursor: Option<u32>,
}

impl<'a, T> Iterator for ActiveIter<'a, T> {
    type Item = (PoolId, &'a T);

    fn next(&mut self) -> Option<Self::Item> {
        let index = self.cursor?;
        let slot = &self.slots[index as usize];
        self.cursor = slot.links.next;
        Some((PoolId(index), &slot.value))
    }
}

fn push_back<T>(list: &mut List, slots: &mut [PoolSlot<T>], index: u32) {
    slots[index as usize].links = Links {
        prev: list.tail,
        next: None,
    };
    match list.tail {
        Some(tail) => slots[tail as usize].links.next = Some(index),
        None => list.head = Some(index),
    }
    list.tail = Some(index);
    list.len += 1;
}

fn push_front<T>(list: &mut List, slots: &mut [PoolSlot<T>], index: u32) {
    slots[index as usize].links = Links {
        prev: None,
        next: list.head,
    };
    match list.head {
        Some(head) => slots[head as usize].links.prev = Some(index),
        None => list.tail = Some(index),
    }
    list.head = Some(index);
    list.len += 1;
}

fn unlink<T>(list: &mut List, slots: &mut [PoolSlot<T>], index: u32) {
    let Links { prev, next } = slots[index as usize].links;
    match prev {
        Some(prev) => slots[prev as usize].links.next = next,
        None => list.head = next,
    }
    match next {
        Some(next) => slots[next as usize].links.prev = prev,
        None => list.tail = prev,
    }
    slots[index as usize].links = Links::default();
    list.len -= 1;
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::*;

    #[derive(Debug, Default)]
    struct Spark {
        life: u32,
        configured: bool,
    }

    impl Poolable<u32> for Spark {
        fn update(&mut self, _sync: f32, ticks: &mut u32) -> PoolStep {
            *ticks += 1;
            self.life = self.life.saturating_sub(1);
            if self.life == 0 {
                PoolStep::Release
            } else {
                PoolStep::Continue
            }
        }
    }

    fn initialized() -> ActorPool<Spark> {
        let mut pool = ActorPool::new("sparks");
        pool.init(Spark::default);
        pool
    }

    #[test]
    fn init_creates_one_inactive_batch() {
        let pool = initialized();
        assert!(!pool.has_active());
        assert_eq!(pool.len(), INITIAL_BATCH_SIZE);
        assert_eq!(pool.free_count(), INITIAL_BATCH_SIZE);
        assert!((0..INITIAL_BATCH_SIZE as u32).all(|i| !pool.is_active(PoolId(i))));
    }

    #[test]
    fn gets_reuse_the_batch_before_allocating() {
        let mut pool = initialized();
        let mut seen = HashSet::new();
        for _ in 0..INITIAL_BATCH_SIZE {
            let id = pool.get(|| panic!("batch should satisfy the first gets"));
            assert!(!pool.is_active(id));
            assert!(seen.insert(id));
            pool.set_active(id, true);
        }
        assert_eq!(pool.len(), INITIAL_BATCH_SIZE);

        let mut allocated = false;
        let extra = pool.get(|| {
            allocated = true;
            Spark::default()
        });
        assert!(allocated);
        assert!(!seen.contains(&extra));
        assert_eq!(pool.len(), INITIAL_BATCH_SIZE + 1);
        assert!(!pool.is_active(extra));
    }

    #[test]
    fn get_returns_same_head_until_activated() {
        let mut pool = initialized();
        let first = pool.get(|| panic!("batch is free"));
        let again = pool.get(|| panic!("batch is free"));
        assert_eq!(first, again);
        assert_eq!(pool.free_count(), INITIAL_BATCH_SIZE);

        pool.set_active(first, true);
        let next = pool.get(|| panic!("batch is free"));
        assert_ne!(next, first);
    }

    #[test]
    fn same_state_toggle_is_noop() {
        let mut pool = initialized();
        let id = pool.get(Spark::default);
        assert!(!pool.set_active(id, false));
        assert_eq!(pool.free_count(), INITIAL_BATCH_SIZE);

        assert!(pool.set_active(id, true));
        assert!(!pool.set_active(id, true));
        assert_eq!(pool.active_count(), 1);
        assert_eq!(pool.free_count(), INITIAL_BATCH_SIZE - 1);

        assert!(pool.set_active(id, false));
        assert_eq!(pool.active_count(), 0);
        assert_eq!(pool.free_count(), INITIAL_BATCH_SIZE);
    }

    #[test]
    fn reset_returns_everything_to_free_list() {
        let mut pool = initialized();
        for _ in 0..5 {
            pool.spawn(Spark::default, |spark| spark.life = 3);
        }
        let mut released = Vec::new();
        pool.reset_with(|id, _| released.push(id));
        assert_eq!(released.len(), 5);
        assert!(!pool.has_active());
        assert_eq!(pool.free_count(), INITIAL_BATCH_SIZE);
    }

    #[test]
    fn iter_active_follows_activation_order() {
        let mut pool = initialized();
        let a = pool.spawn(Spark::default, |s| s.configured = true);
        let b = pool.spawn(Spark::default, |s| s.configured = true);
        let c = pool.spawn(Spark::default, |s| s.configured = true);
        pool.set_active(b, false);
        pool.set_active(b, true);
        assert_eq!(pool.active_ids(), vec![a, c, b]);
        assert!(pool.iter_active().all(|(_, spark)| spark.configured));
    }

    #[test]
    fn released_instances_leave_the_active_list_after_update() {
        let mut pool = initialized().with_priority(3);
        let short = pool.spawn(Spark::default, |s| s.life = 1);
        let long = pool.spawn(Spark::default, |s| s.life = 2);
        let mut ticks = 0u32;

        Actor::update(&mut pool, 0.1, &mut ticks);
        assert_eq!(ticks, 2);
        assert!(!pool.is_active(short));
        assert!(pool.is_active(long));

        Actor::update(&mut pool, 0.1, &mut ticks);
        assert_eq!(ticks, 3);
        assert!(!Actor::<u32>::is_active(&pool));
        assert_eq!(Actor::<u32>::priority(&pool), 3);
    }

    #[test]
    fn pools_over_one_type_are_independent() {
        let mut first = initialized();
        let mut second = initialized();
        let id = first.spawn(Spark::default, |_| {});
        assert!(first.is_active(id));
        assert!(!second.is_active(id));
        assert!(!second.has_active());
        second.reset();
        assert!(first.has_active());
    }
}
