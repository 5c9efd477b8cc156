//! The application driver — registration, ticks, and frames.
//!
//! One tick runs every registered system strictly in registration order,
//! then reconciles the spawn queue into storage, then refreshes the entity
//! count. One frame runs every renderer in registration order against the
//! caller's render target. Nothing here suspends or locks: the whole engine
//! is single-threaded and cooperative.

use tracing::{debug, info};

use roam_ecs::{ColumnStorage, EcsError, EntityAllocator, Manager};

use crate::context::{Bounds, FrameInfo, SystemContext};
use crate::descriptor::SystemDescriptor;
use crate::error::AppError;

type SystemFn<R> = Box<dyn FnMut(&mut SystemContext<'_, R>) -> Result<(), EcsError>>;
type RenderFn<R, S> = Box<dyn FnMut(&mut SystemContext<'_, R>, &mut S) -> Result<(), EcsError>>;

struct SystemEntry<R> {
    name: String,
    run: SystemFn<R>,
}

struct RenderEntry<R, S> {
    name: String,
    run: RenderFn<R, S>,
}

/// The application: storage, spawn queue, resource slots, and the registered
/// systems and renderers that consume them.
///
/// `R` is the application's typed resource context, shared by every system;
/// `S` is the opaque render target handed through to renderers untouched.
pub struct App<R = (), S = ()> {
    allocator: EntityAllocator,
    storage: ColumnStorage,
    manager: Manager,
    resources: R,
    frame: FrameInfo,
    startup: Vec<SystemEntry<R>>,
    systems: Vec<SystemEntry<R>>,
    renderers: Vec<RenderEntry<R, S>>,
    started: bool,
}

impl<R, S> App<R, S> {
    /// Create an app owning `resources`, the typed slots systems share.
    #[must_use]
    pub fn new(resources: R) -> Self {
        Self {
            allocator: EntityAllocator::new(),
            storage: ColumnStorage::new(),
            manager: Manager::new(),
            resources,
            frame: FrameInfo::default(),
            startup: Vec::new(),
            systems: Vec::new(),
            renderers: Vec::new(),
            started: false,
        }
    }

    /// Register a system that runs once, at the start of the first tick.
    ///
    /// Anything it spawns reconciles at the end of that same tick.
    pub fn add_startup_system(
        &mut self,
        descriptor: SystemDescriptor,
        run: impl FnMut(&mut SystemContext<'_, R>) -> Result<(), EcsError> + 'static,
    ) -> Result<(), AppError> {
        self.register(&descriptor)?;
        info!(system = descriptor.name(), "registered startup system");
        self.startup.push(SystemEntry {
            name: descriptor.into_name(),
            run: Box::new(run),
        });
        Ok(())
    }

    /// Register a per-tick system.
    ///
    /// Declared shapes are validated and their columns resolved now, so a
    /// malformed shape fails registration rather than a tick.
    pub fn add_system(
        &mut self,
        descriptor: SystemDescriptor,
        run: impl FnMut(&mut SystemContext<'_, R>) -> Result<(), EcsError> + 'static,
    ) -> Result<(), AppError> {
        self.register(&descriptor)?;
        info!(system = descriptor.name(), "registered system");
        self.systems.push(SystemEntry {
            name: descriptor.into_name(),
            run: Box::new(run),
        });
        Ok(())
    }

    /// Register a per-frame renderer. Renderers run in registration order
    /// and receive the render target alongside the usual context.
    pub fn add_renderer(
        &mut self,
        descriptor: SystemDescriptor,
        run: impl FnMut(&mut SystemContext<'_, R>, &mut S) -> Result<(), EcsError> + 'static,
    ) -> Result<(), AppError> {
        self.register(&descriptor)?;
        info!(renderer = descriptor.name(), "registered renderer");
        self.renderers.push(RenderEntry {
            name: descriptor.into_name(),
            run: Box::new(run),
        });
        Ok(())
    }

    fn register(&mut self, descriptor: &SystemDescriptor) -> Result<(), AppError> {
        let shapes = descriptor.validate().map_err(|source| AppError::Register {
            name: descriptor.name().to_string(),
            source,
        })?;
        for shape in &shapes {
            for decl in shape.fields() {
                self.storage.resolve_mut(decl);
            }
        }
        Ok(())
    }

    /// Run one tick: startup systems (first call only), then every system in
    /// registration order, then spawn-queue reconciliation, then the entity
    /// count refresh.
    ///
    /// A failing system or a rejected queued bundle aborts the tick and
    /// surfaces here.
    pub fn update(&mut self) -> Result<(), AppError> {
        self.frame.tick += 1;

        if !self.started {
            self.started = true;
            Self::run_systems(
                &mut self.startup,
                &mut self.storage,
                &mut self.manager,
                &mut self.resources,
                self.frame,
            )?;
        }

        Self::run_systems(
            &mut self.systems,
            &mut self.storage,
            &mut self.manager,
            &mut self.resources,
            self.frame,
        )?;

        self.reconcile()?;
        self.frame.entities = self.storage.count();
        Ok(())
    }

    /// Run one frame: every renderer in registration order, drawing into
    /// `target`. The engine never inspects the target.
    pub fn draw(&mut self, target: &mut S) -> Result<(), AppError> {
        for entry in &mut self.renderers {
            let mut ctx = SystemContext::new(
                &mut self.storage,
                &mut self.manager,
                &mut self.resources,
                self.frame,
            );
            (entry.run)(&mut ctx, target).map_err(|source| AppError::System {
                name: entry.name.clone(),
                source,
            })?;
        }
        Ok(())
    }

    /// Record the logical output bounds reported by the host surface.
    pub fn layout(&mut self, width: u32, height: u32) {
        self.frame.bounds = Bounds { width, height };
    }

    /// The current frame information.
    #[must_use]
    pub fn frame(&self) -> FrameInfo {
        self.frame
    }

    /// Read-only access to the component store.
    #[must_use]
    pub fn storage(&self) -> &ColumnStorage {
        &self.storage
    }

    /// The application's resource slots.
    #[must_use]
    pub fn resources(&self) -> &R {
        &self.resources
    }

    /// Mutable access to the application's resource slots.
    pub fn resources_mut(&mut self) -> &mut R {
        &mut self.resources
    }

    fn run_systems(
        entries: &mut [SystemEntry<R>],
        storage: &mut ColumnStorage,
        manager: &mut Manager,
        resources: &mut R,
        frame: FrameInfo,
    ) -> Result<(), AppError> {
        for entry in entries {
            let mut ctx = SystemContext::new(&mut *storage, &mut *manager, &mut *resources, frame);
            (entry.run)(&mut ctx).map_err(|source| AppError::System {
                name: entry.name.clone(),
                source,
            })?;
        }
        Ok(())
    }

    /// Drain the spawn queue, allocating one fresh identity per pending
    /// bundle in enqueue order.
    fn reconcile(&mut self) -> Result<(), AppError> {
        let pending = self.manager.drain();
        if pending.is_empty() {
            return Ok(());
        }
        let spawned = pending.len();
        for bundle in pending {
            let id = self.allocator.allocate();
            let name = bundle.bundle_name();
            self.storage
                .add_dyn(id, bundle)
                .map_err(|source| AppError::Reconcile {
                    bundle: name,
                    source,
                })?;
        }
        debug!(
            tick = self.frame.tick,
            spawned,
            entities = self.storage.count(),
            "reconciled spawn queue"
        );
        Ok(())
    }
}

impl<R: Default, S> Default for App<R, S> {
    fn default() -> Self {
        Self::new(R::default())
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::collections::HashSet;
    use std::rc::Rc;

    use roam_ecs::bundle;

    use super::*;

    #[derive(Debug, Clone, Copy, PartialEq)]
    struct X {
        value: i32,
    }

    #[derive(Debug, Clone, PartialEq)]
    struct Y {
        value: String,
    }

    bundle! {
        #[derive(Debug, Clone)]
        struct Pair {
            x: X,
            y: Y,
        }
    }

    bundle! {
        #[derive(Debug, Clone)]
        struct Lone {
            x: X,
        }
    }

    fn pair(value: i32) -> Pair {
        Pair {
            x: X { value },
            y: Y {
                value: value.to_string(),
            },
        }
    }

    #[test]
    fn test_spawns_are_deferred_to_the_next_tick() {
        let mut app: App = App::new(());
        let seen = Rc::new(RefCell::new(Vec::new()));

        let observed = Rc::clone(&seen);
        app.add_startup_system(SystemDescriptor::new("seed"), move |ctx| {
            for value in [10, 23, 45, 12] {
                ctx.spawn(Lone { x: X { value } });
            }
            Ok(())
        })
        .unwrap();
        app.add_system(
            SystemDescriptor::new("observe").shape::<Lone>(),
            move |ctx| {
                ctx.query::<Lone>()?.for_each(|lone| {
                    observed.borrow_mut().push(lone.x.value);
                })
            },
        )
        .unwrap();

        // Tick 1: the startup spawns reconcile only after the systems ran.
        app.update().unwrap();
        assert!(seen.borrow().is_empty());

        // Tick 2: all four are visible.
        app.update().unwrap();
        let mut values = seen.borrow().clone();
        values.sort_unstable();
        assert_eq!(values, vec![10, 12, 23, 45]);
    }

    #[test]
    fn test_reconciliation_allocates_increasing_ids_in_enqueue_order() {
        let mut app: App = App::new(());
        let ids = Rc::new(RefCell::new(Vec::new()));

        app.add_startup_system(SystemDescriptor::new("seed"), |ctx| {
            for value in [1, 2, 3] {
                ctx.spawn(Lone { x: X { value } });
            }
            Ok(())
        })
        .unwrap();
        let recorded = Rc::clone(&ids);
        app.add_system(
            SystemDescriptor::new("record").shape::<Lone>(),
            move |ctx| {
                let mut pairs = Vec::new();
                ctx.query::<Lone>()?.iterate(|id, lone| {
                    pairs.push((id, lone.x.value));
                    true
                })?;
                pairs.sort();
                *recorded.borrow_mut() = pairs;
                Ok(())
            },
        )
        .unwrap();

        app.update().unwrap();
        app.update().unwrap();

        let pairs = ids.borrow().clone();
        assert_eq!(pairs.len(), 3);
        // Enqueue order 1, 2, 3 maps to strictly increasing identities.
        assert_eq!(
            pairs.iter().map(|(_, v)| *v).collect::<Vec<_>>(),
            vec![1, 2, 3]
        );
        assert!(pairs.windows(2).all(|w| w[0].0 < w[1].0));
        assert!(pairs.iter().all(|(id, _)| id.is_valid()));
    }

    #[test]
    fn test_narrow_shape_matches_both_bundle_widths() {
        // Spawn {10,"10"}, {23,"23"}, {45,"45"} as pairs plus {42} alone:
        // `x` alone matches four entities, `x`+`y` exactly three.
        let mut app: App = App::new(());
        let xs = Rc::new(RefCell::new(Vec::new()));
        let pairs = Rc::new(RefCell::new(Vec::new()));

        app.add_startup_system(SystemDescriptor::new("seed"), |ctx| {
            ctx.spawn(pair(10));
            ctx.spawn(pair(23));
            ctx.spawn(pair(45));
            ctx.spawn(Lone { x: X { value: 42 } });
            Ok(())
        })
        .unwrap();

        let lone_seen = Rc::clone(&xs);
        let pair_seen = Rc::clone(&pairs);
        app.add_system(
            SystemDescriptor::new("collect").shape::<Lone>().shape::<Pair>(),
            move |ctx| {
                ctx.query::<Lone>()?.for_each(|lone| {
                    lone_seen.borrow_mut().push(lone.x.value);
                })?;
                ctx.query::<Pair>()?.for_each(|p| {
                    pair_seen.borrow_mut().push((p.x.value, p.y.value.clone()));
                })
            },
        )
        .unwrap();

        app.update().unwrap();
        app.update().unwrap();

        let mut lone_values = xs.borrow().clone();
        lone_values.sort_unstable();
        assert_eq!(lone_values, vec![10, 23, 42, 45]);

        let mut pair_values = pairs.borrow().clone();
        pair_values.sort();
        assert_eq!(
            pair_values,
            vec![
                (10, "10".to_string()),
                (23, "23".to_string()),
                (45, "45".to_string()),
            ]
        );
    }

    #[test]
    fn test_zero_shape_query_sees_every_spawned_entity() {
        let mut app: App = App::new(());
        let counted = Rc::new(RefCell::new(HashSet::new()));

        app.add_startup_system(SystemDescriptor::new("seed"), |ctx| {
            ctx.spawn(pair(1));
            ctx.spawn(Lone { x: X { value: 2 } });
            ctx.spawn(());
            Ok(())
        })
        .unwrap();
        let seen = Rc::clone(&counted);
        app.add_system(SystemDescriptor::new("census").shape::<()>(), move |ctx| {
            ctx.query::<()>()?.iterate(|id, _| {
                assert!(seen.borrow_mut().insert(id), "entity visited twice");
                true
            })
        })
        .unwrap();

        app.update().unwrap();
        assert!(counted.borrow().is_empty());
        app.update().unwrap();
        assert_eq!(counted.borrow().len(), 3);
    }

    #[test]
    fn test_count_is_refreshed_after_reconciliation() {
        let mut app: App = App::new(());
        app.add_startup_system(SystemDescriptor::new("seed"), |ctx| {
            ctx.spawn(pair(1));
            ctx.spawn(pair(2));
            Ok(())
        })
        .unwrap();

        assert_eq!(app.frame().entities, 0);
        app.update().unwrap();
        assert_eq!(app.frame().entities, 2);
        assert_eq!(app.storage().count(), 2);
    }

    #[test]
    fn test_systems_run_in_registration_order() {
        let mut app: App = App::new(());
        let order = Rc::new(RefCell::new(Vec::new()));

        for name in ["first", "second", "third"] {
            let log = Rc::clone(&order);
            app.add_system(SystemDescriptor::new(name), move |_ctx| {
                log.borrow_mut().push(name);
                Ok(())
            })
            .unwrap();
        }

        app.update().unwrap();
        assert_eq!(*order.borrow(), vec!["first", "second", "third"]);
    }

    #[test]
    fn test_registration_rejects_a_malformed_shape() {
        #[derive(Debug, Clone)]
        struct Doubled;

        impl roam_ecs::Bundle for Doubled {
            fn fields() -> Vec<roam_ecs::FieldDecl> {
                vec![
                    roam_ecs::FieldDecl::of::<X>("x"),
                    roam_ecs::FieldDecl::of::<X>("x"),
                ]
            }

            fn disperse(self, _sink: &mut roam_ecs::InsertSink) -> Result<(), EcsError> {
                unreachable!("registration rejects this shape first")
            }

            fn gather(_source: &mut roam_ecs::FieldSource<'_>) -> Result<Self, EcsError> {
                unreachable!("registration rejects this shape first")
            }

            fn scatter(self, _sink: &mut roam_ecs::FieldSink<'_>) -> Result<(), EcsError> {
                unreachable!("registration rejects this shape first")
            }
        }

        let mut app: App = App::new(());
        let err = app
            .add_system(SystemDescriptor::new("bad").shape::<Doubled>(), |_ctx| {
                Ok(())
            })
            .unwrap_err();
        assert!(matches!(err, AppError::Register { .. }));
        // Nothing was registered.
        app.update().unwrap();
    }

    #[test]
    fn test_renderers_receive_the_target_untouched() {
        let mut app: App<(), Vec<String>> = App::new(());
        app.add_startup_system(SystemDescriptor::new("seed"), |ctx| {
            ctx.spawn(Lone { x: X { value: 5 } });
            Ok(())
        })
        .unwrap();
        app.add_renderer(
            SystemDescriptor::new("labels").shape::<Lone>(),
            |ctx, target| {
                ctx.query::<Lone>()?.for_each(|lone| {
                    target.push(format!("x={}", lone.x.value));
                })
            },
        )
        .unwrap();

        let mut target = vec!["preexisting".to_string()];
        app.draw(&mut target).unwrap();
        assert_eq!(target, vec!["preexisting".to_string()]);

        app.update().unwrap();
        app.draw(&mut target).unwrap();
        assert_eq!(
            target,
            vec!["preexisting".to_string(), "x=5".to_string()]
        );
    }

    #[test]
    fn test_mutation_through_one_shape_is_seen_by_another() {
        let mut app: App = App::new(());
        let seen = Rc::new(RefCell::new(Vec::new()));

        app.add_startup_system(SystemDescriptor::new("seed"), |ctx| {
            ctx.spawn(pair(10));
            Ok(())
        })
        .unwrap();
        app.add_system(SystemDescriptor::new("bump").shape::<Lone>(), |ctx| {
            ctx.query::<Lone>()?.for_each(|lone| {
                lone.x.value += 1;
            })
        })
        .unwrap();
        let observed = Rc::clone(&seen);
        app.add_system(SystemDescriptor::new("observe").shape::<Pair>(), move |ctx| {
            ctx.query::<Pair>()?.for_each(|p| {
                observed.borrow_mut().push(p.x.value);
            })
        })
        .unwrap();

        app.update().unwrap();
        app.update().unwrap();
        // The bump through the narrow shape committed before observe ran.
        assert_eq!(*seen.borrow(), vec![11]);
    }

    #[test]
    fn test_layout_updates_bounds() {
        let mut app: App = App::new(());
        app.layout(80, 24);
        assert_eq!(app.frame().bounds, Bounds {
            width: 80,
            height: 24
        });
    }

    #[test]
    fn test_startup_runs_once() {
        let mut app: App = App::new(());
        let runs = Rc::new(RefCell::new(0));
        let counter = Rc::clone(&runs);
        app.add_startup_system(SystemDescriptor::new("once"), move |_ctx| {
            *counter.borrow_mut() += 1;
            Ok(())
        })
        .unwrap();

        app.update().unwrap();
        app.update().unwrap();
        app.update().unwrap();
        assert_eq!(*runs.borrow(), 1);
    }
}
