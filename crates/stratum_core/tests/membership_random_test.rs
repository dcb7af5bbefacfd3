//! # Randomized Membership Test
//!
//! Drives a world through long random sequences of structural mutations and
//! checks, after every step, that each system's cache holds exactly the live
//! entities whose components cover the system's requirement.

use std::collections::{HashMap, HashSet};

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use stratum_core::{ComponentId, Entity, Signature, SystemId, View, World};

const STEPS: usize = 2_000;
const COMPONENTS: u8 = 4;

/// Reference model: what each live entity carries.
type Model = HashMap<Entity, Signature>;

fn build_world() -> World {
    (0..COMPONENTS)
        .fold(World::builder(), |builder, i| {
            builder.byte_component(&format!("c{i}"), usize::from(i) + 1)
        })
        .build()
        .unwrap()
}

fn register_systems(world: &mut World) -> Vec<SystemId> {
    let id = ComponentId::new;
    let requirements: [&[ComponentId]; 5] = [
        &[],
        &[id(0)],
        &[id(0), id(1)],
        &[id(2), id(3)],
        &[id(0), id(1), id(2), id(3)],
    ];
    requirements
        .iter()
        .map(|required| world.register(|_: &mut View| {}, required).unwrap())
        .collect()
}

fn check(world: &World, systems: &[SystemId], model: &Model) {
    assert_eq!(world.len(), model.len());

    for &system in systems {
        let required = world.system_signature(system).unwrap();
        let cached = world.system_entities(system).unwrap();
        let cached_set: HashSet<Entity> = cached.iter().copied().collect();
        assert_eq!(cached_set.len(), cached.len(), "{system} caches a duplicate");

        let expected: HashSet<Entity> = model
            .iter()
            .filter(|(_, signature)| signature.contains_all(required))
            .map(|(&entity, _)| entity)
            .collect();
        assert_eq!(cached_set, expected, "{system} cache diverged");
    }

    for (&entity, &signature) in model {
        assert!(world.validate(entity));
        assert_eq!(world.signature(entity), Some(signature));
    }
}

fn run(seed: u64) {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut world = build_world();
    let systems = register_systems(&mut world);
    let mut model = Model::new();
    let mut dead = Vec::new();

    for _ in 0..STEPS {
        let live: Vec<Entity> = model.keys().copied().collect();
        let component = ComponentId::new(rng.gen_range(0..COMPONENTS));

        match rng.gen_range(0..10) {
            0..=2 => {
                let entity = world.create();
                model.insert(entity, Signature::EMPTY);
            }
            3 if !live.is_empty() => {
                let entity = live[rng.gen_range(0..live.len())];
                assert!(world.destroy(entity));
                model.remove(&entity);
                dead.push(entity);
            }
            4..=6 if !live.is_empty() => {
                let entity = live[rng.gen_range(0..live.len())];
                let size = usize::from(component.raw()) + 1;
                let attached = world.attach_bytes(entity, component, &vec![7; size]).is_ok();
                let signature = model.get_mut(&entity).unwrap();
                assert_eq!(attached, !signature.contains(component));
                *signature = signature.with(component);
            }
            7..=8 if !live.is_empty() => {
                let entity = live[rng.gen_range(0..live.len())];
                let detached = world.detach_id(entity, component).is_ok();
                let signature = model.get_mut(&entity).unwrap();
                assert_eq!(detached, signature.contains(component));
                *signature = signature.without(component);
            }
            9 if !dead.is_empty() => {
                let entity = dead[rng.gen_range(0..dead.len())];
                assert!(!world.destroy(entity));
                assert!(!world.validate(entity));
            }
            _ => world.tick(0.016),
        }

        check(&world, &systems, &model);
    }
}

/// Test: Caches stay consistent over random mutation sequences.
#[test]
fn test_membership_consistency_random() {
    for seed in [1, 7, 42, 1337] {
        run(seed);
    }
}
