//! # World Property Tests
//!
//! Handle safety, compaction, component round trips, tick fidelity, and
//! deferred commands, exercised through the public API only.

use std::cell::RefCell;
use std::collections::HashSet;
use std::rc::Rc;

use bytemuck::{Pod, Zeroable};
use stratum_core::{Component, ComponentId, EcsError, Entity, System, View, World};

#[derive(Clone, Copy, Debug, Default, PartialEq, Pod, Zeroable)]
#[repr(C)]
struct Position {
    x: f32,
    y: f32,
}

impl Component for Position {}

#[derive(Clone, Copy, Debug, Default, PartialEq, Pod, Zeroable)]
#[repr(C)]
struct Velocity {
    x: f32,
    y: f32,
}

impl Component for Velocity {}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Pod, Zeroable)]
#[repr(C)]
struct Health(u32);

impl Component for Health {}

fn world() -> World {
    World::builder()
        .component::<Position>()
        .component::<Velocity>()
        .component::<Health>()
        .build()
        .unwrap()
}

/// Test: Every handle handed out is unique, and destroyed handles never
/// validate again even after their slot is reused.
#[test]
fn test_handles_are_unique_across_reuse() {
    let mut world = world();
    let mut seen = HashSet::new();
    let mut destroyed = Vec::new();

    for round in 0..10 {
        let batch: Vec<Entity> = (0..50).map(|_| world.create()).collect();
        for &entity in &batch {
            assert!(seen.insert(entity), "handle {entity} handed out twice");
        }
        // Destroy every other entity of the batch.
        for &entity in batch.iter().skip(round % 2).step_by(2) {
            assert!(world.destroy(entity));
            destroyed.push(entity);
        }
    }

    assert!(destroyed.iter().all(|&entity| !world.validate(entity)));
    assert_eq!(world.len(), seen.len() - destroyed.len());
}

/// Test: Destroying an invalid handle is a no-op, any number of times.
#[test]
fn test_destroy_is_idempotent() {
    let mut world = world();
    let keep = world.create();
    let gone = world.create();
    world.attach(keep, Health(10)).unwrap();

    assert!(world.destroy(gone));
    for _ in 0..3 {
        assert!(!world.destroy(gone));
    }
    assert!(!world.destroy(Entity::NULL));

    assert_eq!(world.len(), 1);
    assert_eq!(world.fetch::<Health>(keep), Some(&Health(10)));
}

/// Test: Destroying a middle entity moves the last one into its dense index
/// with identical payloads.
#[test]
fn test_compaction_moves_last_entity() {
    let mut world = world();
    let entities: Vec<Entity> = (0..5).map(|_| world.create()).collect();
    for (i, &entity) in entities.iter().enumerate() {
        world.attach(entity, Health(i as u32 * 100)).unwrap();
        if i % 2 == 0 {
            world.attach(entity, Position { x: i as f32, y: -(i as f32) }).unwrap();
        }
    }

    let last = entities[4];
    let hole = world.dense_index(entities[1]).unwrap();
    assert!(world.destroy(entities[1]));

    assert_eq!(world.dense_index(last), Some(hole));
    assert!(world.validate(last));
    assert_eq!(world.fetch::<Health>(last), Some(&Health(400)));
    assert_eq!(world.fetch::<Position>(last), Some(&Position { x: 4.0, y: -4.0 }));
    assert_eq!(world.entities().len(), 4);

    for (i, &entity) in entities.iter().enumerate().filter(|&(i, _)| i != 1) {
        assert_eq!(world.fetch::<Health>(entity), Some(&Health(i as u32 * 100)));
    }
}

/// Test: Destroyed, forged, and null handles read as absent and every
/// mutation through them is rejected without touching live entities.
#[test]
fn test_stale_handle_is_inert() {
    let mut world = world();
    let health = world.component_id::<Health>().unwrap();
    let keep = world.create();
    world.attach(keep, Health(5)).unwrap();
    world.attach(keep, Position { x: 1.0, y: 2.0 }).unwrap();

    let gone = world.create();
    world.attach(gone, Health(9)).unwrap();
    assert!(world.destroy(gone));

    let forged = Entity::new(keep.slot(), keep.generation().wrapping_add(1));
    let unused_slot = Entity::new(0xFF_FFFE, 3);

    for entity in [gone, forged, unused_slot, Entity::NULL] {
        assert!(!world.validate(entity));
        assert_eq!(world.fetch::<Health>(entity), None);
        assert_eq!(world.fetch_mut::<Health>(entity), None);
        assert_eq!(world.fetch_bytes(entity, health), None);
        assert_eq!(world.fetch_bytes_mut(entity, health), None);
        assert!(!world.has::<Health>(entity));
        assert!(!world.has_id(entity, health));
        assert_eq!(world.detach::<Health>(entity), Err(EcsError::StaleEntity(entity)));
        assert_eq!(world.detach_id(entity, health), Err(EcsError::StaleEntity(entity)));
        assert_eq!(
            world.attach_bytes(entity, ComponentId::new(200), &[]),
            Err(EcsError::StaleEntity(entity))
        );
    }

    for raw in [40, 255] {
        let unknown = ComponentId::new(raw);
        assert!(!world.has_id(keep, unknown));
        assert_eq!(world.fetch_bytes(keep, unknown), None);
        assert_eq!(world.fetch_bytes_mut(keep, unknown), None);
        assert_eq!(
            world.detach_id(keep, unknown),
            Err(EcsError::UnknownComponent(unknown))
        );
    }

    assert_eq!(world.len(), 1);
    assert_eq!(world.fetch::<Health>(keep), Some(&Health(5)));
    assert_eq!(world.fetch::<Position>(keep), Some(&Position { x: 1.0, y: 2.0 }));
}

/// Test: attach, fetch, detach, fetch round trip.
#[test]
fn test_attach_detach_round_trip() {
    let mut world = world();
    let entity = world.create();
    let value = Velocity { x: 0.25, y: 4.0 };

    world.attach(entity, value).unwrap();
    assert_eq!(world.fetch::<Velocity>(entity), Some(&value));

    world.detach::<Velocity>(entity).unwrap();
    assert!(!world.has::<Velocity>(entity));
    assert_eq!(world.fetch::<Velocity>(entity), None);
    assert!(world.detach::<Velocity>(entity).is_err());
}

struct Integrate;

impl System for Integrate {
    fn run(&mut self, view: &mut View) {
        let dt = view.delta_seconds() as f32;
        if let Some((positions, velocities)) = view.field_pair_mut::<Position, Velocity>() {
            for (p, v) in positions.iter_mut().zip(velocities.iter()) {
                p.x += v.x * dt;
                p.y += v.y * dt;
            }
        }
    }

    fn name(&self) -> &str {
        "integrate"
    }
}

/// Test: Mutations made through the view are visible in the world after tick,
/// also for entities moved by compaction between ticks.
#[test]
fn test_tick_view_fidelity() {
    let mut world = world();
    let position = world.component_id::<Position>().unwrap();
    let velocity = world.component_id::<Velocity>().unwrap();
    let system = world.register(Integrate, &[position, velocity]).unwrap();
    assert_eq!(world.system_name(system), Some("integrate"));

    let entities: Vec<Entity> = (0..4).map(|_| world.create()).collect();
    for (i, &entity) in entities.iter().enumerate() {
        world.attach(entity, Position::default()).unwrap();
        world.attach(entity, Velocity { x: i as f32, y: 1.0 }).unwrap();
    }

    world.tick(1.0);
    world.destroy(entities[0]);
    world.tick(1.0);

    for (i, &entity) in entities.iter().enumerate().skip(1) {
        let expected = Position { x: 2.0 * i as f32, y: 2.0 };
        assert_eq!(world.fetch::<Position>(entity), Some(&expected));
    }
}

/// Test: Components a system does not require are untouched by its tick.
#[test]
fn test_tick_leaves_other_components_alone() {
    let mut world = world();
    let health = world.component_id::<Health>().unwrap();
    world
        .register(
            |view: &mut View| {
                if let Some(values) = view.field_mut::<Health>() {
                    for value in values {
                        value.0 += 1;
                    }
                }
                assert!(view.field::<Position>().is_none());
            },
            &[health],
        )
        .unwrap();

    let entity = world.create();
    world.attach(entity, Health(1)).unwrap();
    world.attach(entity, Position { x: 7.0, y: 7.0 }).unwrap();
    world.tick(1.0);

    assert_eq!(world.fetch::<Health>(entity), Some(&Health(2)));
    assert_eq!(world.fetch::<Position>(entity), Some(&Position { x: 7.0, y: 7.0 }));
}

/// Test: Commands queued during a tick only take effect after every system
/// ran, in queue order.
#[test]
fn test_commands_apply_after_all_systems() {
    let mut world = world();
    let health = world.component_id::<Health>().unwrap();
    let entity = world.create();
    world.attach(entity, Health(0)).unwrap();

    world
        .register(
            |view: &mut View| {
                let entities = view.entities().to_vec();
                for entity in entities {
                    view.commands().detach::<Health>(entity);
                    view.commands().attach(entity, Health(99));
                }
            },
            &[health],
        )
        .unwrap();

    let later_saw = Rc::new(RefCell::new(0));
    let counter = Rc::clone(&later_saw);
    world
        .register(move |view: &mut View| *counter.borrow_mut() += view.len(), &[health])
        .unwrap();

    world.tick(1.0);

    // The second system still saw the entity with Health attached.
    assert_eq!(*later_saw.borrow(), 1);
    assert_eq!(world.fetch::<Health>(entity), Some(&Health(99)));
}

/// Test: A system with no required components runs over every live entity.
#[test]
fn test_empty_requirement_matches_everything() {
    let mut world = world();
    let all = world.register(|_: &mut View| {}, &[]).unwrap();

    let a = world.create();
    let b = world.create();
    world.attach(b, Health(1)).unwrap();
    assert_eq!(world.system_entities(all), Some(&[a, b][..]));

    world.destroy(a);
    assert_eq!(world.system_entities(all), Some(&[b][..]));
}

/// Test: A slot whose generation runs out is retired instead of wrapping.
#[test]
fn test_exhausted_slot_is_retired() {
    let mut world = world();
    let first = world.create();
    let slot = first.slot();
    world.destroy(first);

    let mut previous = vec![first];
    loop {
        let entity = world.create();
        if entity.slot() != slot {
            break;
        }
        assert!(previous.iter().all(|&old| old != entity));
        previous.push(entity);
        world.destroy(entity);
    }

    assert_eq!(world.retired_slots(), 1);
    assert!(previous.iter().all(|&old| !world.validate(old)));
}
