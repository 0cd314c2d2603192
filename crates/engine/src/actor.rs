use std::cmp::Reverse;

use tracing::debug;

/// Unit of game logic advanced once per tick. `C` is the context the
/// scheduler's owner passes through to every actor.
pub trait Actor<C> {
    fn update(&mut self, sync: f32, ctx: &mut C);

    /// Inactive actors stay registered but are skipped by the update pass.
    fn is_active(&self) -> bool {
        true
    }

    /// Higher values update earlier within a tick.
    fn priority(&self) -> i32 {
        0
    }

    fn name(&self) -> &'static str {
        "actor"
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ActorId(u64);

/// Owns actors and runs the per-tick update pass.
pub struct Scheduler<C> {
    actors: Vec<(ActorId, Box<dyn Actor<C>>)>,
    order: Vec<usize>,
    next_id: u64,
}

impl<C> Default for Scheduler<C> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C> Scheduler<C> {
    pub fn new() -> Self {
        Self {
            actors: Vec::new(),
            order: Vec::new(),
            next_id: 0,
        }
    }

    pub fn add(&mut self, actor: Box<dyn Actor<C>>) -> ActorId {
        let id = ActorId(self.next_id);
        self.next_id += 1;
        debug!(
            actor = actor.name(),
            priority = actor.priority(),
            "actor_registered"
        );
        self.actors.push((id, actor));
        id
    }

    pub fn remove(&mut self, id: ActorId) -> Option<Box<dyn Actor<C>>> {
        let position = self.actors.iter().position(|(actor_id, _)| *actor_id == id)?;
        Some(self.actors.remove(position).1)
    }

    pub fn contains(&self, id: ActorId) -> bool {
        self.actors.iter().any(|(actor_id, _)| *actor_id == id)
    }

    pub fn len(&self) -> usize {
        self.actors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.actors.is_empty()
    }

    pub fn clear(&mut self) {
        self.actors.clear();
    }

    /// Updates every active actor, highest priority first. Equal priorities
    /// keep registration order. Returns how many actors ran.
    pub fn update(&mut self, sync: f32, ctx: &mut C) -> usize {
        self.order.clear();
        self.order.extend(
            self.actors
                .iter()
                .enumerate()
                .filter(|(_, (_, actor))| actor.is_active())
                .map(|(index, _)| index),
        );
        let actors = &self.actors;
        self.order
            .sort_by_key(|&index| Reverse(actors[index].1.priority()));

        for &index in &self.order {
            self.actors[index].1.update(sync, ctx);
        }
        self.order.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Probe {
        label: &'static str,
        priority: i32,
        active: bool,
    }

    impl Actor<Vec<&'static str>> for Probe {
        fn update(&mut self, _sync: f32, log: &mut Vec<&'static str>) {
            log.push(self.label);
        }

        fn is_active(&self) -> bool {
            self.active
        }

        fn priority(&self) -> i32 {
            self.priority
        }
    }

    fn probe(label: &'static str, priority: i32, active: bool) -> Box<Probe> {
        Box::new(Probe {
            label,
            priority,
            active,
        })
    }

    #[test]
    fn higher_priority_runs_first_and_ties_keep_order() {
        let mut scheduler: Scheduler<Vec<&'static str>> = Scheduler::new();
        scheduler.add(probe("low", 0, true));
        scheduler.add(probe("high_a", 5, true));
        scheduler.add(probe("mid", 2, true));
        scheduler.add(probe("high_b", 5, true));

        let mut log = Vec::new();
        assert_eq!(scheduler.update(0.016, &mut log), 4);
        assert_eq!(log, vec!["high_a", "high_b", "mid", "low"]);
    }

    #[test]
    fn inactive_actors_are_skipped_but_kept() {
        let mut scheduler: Scheduler<Vec<&'static str>> = Scheduler::new();
        scheduler.add(probe("on", 0, true));
        scheduler.add(probe("off", 9, false));

        let mut log = Vec::new();
        scheduler.update(0.016, &mut log);
        assert_eq!(log, vec!["on"]);
        assert_eq!(scheduler.len(), 2);
    }

    #[test]
    fn removed_actor_no_longer_updates() {
        let mut scheduler: Scheduler<Vec<&'static str>> = Scheduler::new();
        let gone = scheduler.add(probe("gone", 0, true));
        scheduler.add(probe("kept", 0, true));
        assert!(scheduler.remove(gone).is_some());
        assert!(!scheduler.contains(gone));
        assert!(scheduler.remove(gone).is_none());

        let mut log = Vec::new();
        scheduler.update(0.016, &mut log);
        assert_eq!(log, vec!["kept"]);
    }
}
