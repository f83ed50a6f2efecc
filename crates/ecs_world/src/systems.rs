//! An ordered list of named world callbacks.
//!
//! [`Systems::run`] calls every system once, in the order they were added.
//! There is no dependency graph and no parallelism; a panicking system
//! unwinds through `run`.

use std::fmt;

use tracing::trace;

use crate::world::World;

type SystemFn = Box<dyn FnMut(&mut World) + Send>;

/// Named callbacks run against a [`World`] in insertion order.
#[derive(Default)]
pub struct Systems {
    systems: Vec<(String, SystemFn)>,
}

impl Systems {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a system.
    pub fn add<F>(&mut self, name: impl Into<String>, system: F) -> &mut Self
    where
        F: FnMut(&mut World) + Send + 'static,
    {
        self.systems.push((name.into(), Box::new(system)));
        self
    }

    /// Runs every system once, in insertion order.
    pub fn run(&mut self, world: &mut World) {
        for (name, system) in &mut self.systems {
            trace!(world = %world.name(), system = %name, "running system");
            system(world);
        }
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.systems.iter().map(|(name, _)| name.as_str())
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.systems.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.systems.is_empty()
    }
}

impl fmt::Debug for Systems {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.names()).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query::Query;

    #[test]
    fn test_run_in_insertion_order() {
        let mut world = World::new();
        let trail = world.register::<Vec<&'static str>>("Trail").unwrap();
        let e = world.spawn();
        world.set(e, trail, Vec::new()).unwrap();

        let mut systems = Systems::new();
        systems
            .add("first", move |w: &mut World| w.get_mut(e, trail).unwrap().push("first"))
            .add("second", move |w: &mut World| w.get_mut(e, trail).unwrap().push("second"));
        systems.run(&mut world);
        systems.run(&mut world);

        assert_eq!(
            world.get(e, trail).unwrap(),
            &vec!["first", "second", "first", "second"]
        );
        assert_eq!(systems.names().collect::<Vec<_>>(), vec!["first", "second"]);
        assert_eq!(systems.len(), 2);
    }

    #[test]
    fn test_system_driving_a_query() {
        let mut world = World::new();
        let pos = world.register::<f32>("Position").unwrap();
        let vel = world.register::<f32>("Velocity").unwrap();
        let e = world.spawn();
        world.set(e, pos, 0.0).unwrap();
        world.set(e, vel, 1.5).unwrap();

        let mut systems = Systems::new();
        systems.add("movement", move |w: &mut World| {
            Query::new((pos, vel)).each_mut(w, |w, entity, (p, v)| {
                w.set(entity, pos, p + v).unwrap();
            });
        });
        systems.run(&mut world);
        systems.run(&mut world);
        assert_eq!(world.get(e, pos), Some(&3.0));
    }
}
