//! Randomized operation sequences
//!
//! Drives the registry with seeded random operations (many of them
//! invalid on purpose) and checks the table invariants after every step.

mod common;

use common::*;
use diskmgmt_core::{
    DiskId, DiskRegistry, DriveLetter, ExtentId, FileSystem, Operation, Preset, RegistryConfig,
};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

const STEPS: usize = 400;

fn random_extent(rng: &mut StdRng, reg: &DiskRegistry, disk: &DiskId) -> ExtentId {
    let table = extents(reg, disk);
    if rng.gen_bool(0.05) {
        // Occasionally aim at something that does not exist
        return ExtentId::from_raw(u64::MAX);
    }
    table[rng.gen_range(0..table.len())].id
}

fn random_amount(rng: &mut StdRng, reg: &DiskRegistry, disk: &DiskId) -> u64 {
    let total = reg.disk(disk.as_str()).unwrap().total_mb;
    match rng.gen_range(0..4) {
        0 => 0,
        1 => rng.gen_range(1..=64),
        2 => rng.gen_range(1..=total / 8),
        _ => rng.gen_range(1..=total),
    }
}

fn random_op(rng: &mut StdRng, reg: &DiskRegistry) -> Operation {
    let disk = if reg.disk("disk-1").is_some() && rng.gen_bool(0.3) {
        disk1()
    } else {
        disk0()
    };
    let extent = random_extent(rng, reg, &disk);
    let letter = DriveLetter::new(rng.gen_range(b'D'..=b'Z') as char);
    let filesystem = FileSystem::ALL[rng.gen_range(0..FileSystem::ALL.len())];

    match rng.gen_range(0..20) {
        0..=5 => Operation::CreatePartition {
            disk: disk.clone(),
            extent,
            size_mb: random_amount(rng, reg, &disk),
            letter,
            label: "Volume".into(),
            filesystem,
        },
        6..=8 => Operation::DeletePartition { disk, extent },
        9..=11 => Operation::ShrinkPartition {
            disk: disk.clone(),
            extent,
            amount_mb: random_amount(rng, reg, &disk),
        },
        12..=14 => Operation::ExtendPartition {
            disk: disk.clone(),
            extent,
            amount_mb: random_amount(rng, reg, &disk),
        },
        15 => Operation::FormatPartition {
            disk,
            extent,
            label: "Formatted".into(),
            filesystem,
        },
        16 => Operation::ChangeLetter {
            disk,
            extent,
            letter,
        },
        17 => Operation::AddRemovableDisk,
        18 => Operation::Select(Some(extent)),
        _ => Operation::Select(None),
    }
}

fn run(seed: u64, config: RegistryConfig) {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut reg = DiskRegistry::new(config);
    let mut accepted = 0;

    for step in 0..STEPS {
        let op = random_op(&mut rng, &reg);
        match reg.try_dispatch(op.clone()) {
            Ok(next) => {
                accepted += 1;
                reg = next;
            }
            Err(_) => {
                // Rejections must be pure no-ops
                assert_eq!(reg.dispatch(op.clone()), reg, "seed {} step {}: {:?}", seed, step, op);
            }
        }
        assert_invariants(&reg);
        if let Some(id) = reg.selected() {
            assert!(reg.find_extent(id).is_some(), "seed {} step {}: stale selection", seed, step);
        }
    }

    assert!(accepted > 0, "seed {} never accepted an operation", seed);
}

#[test]
fn test_random_sequences_keep_invariants_on_blank_disk() {
    for seed in 0..8 {
        run(seed, RegistryConfig::default());
    }
}

#[test]
fn test_random_sequences_keep_invariants_on_preinstalled_disk() {
    for seed in 100..108 {
        run(seed, RegistryConfig::default().preset(Preset::Preinstalled));
    }
}

#[test]
fn test_random_sequences_keep_system_volumes() {
    let mut rng = StdRng::seed_from_u64(7);
    let mut reg = DiskRegistry::new(RegistryConfig::preinstalled());
    let protected: Vec<ExtentId> = extents(&reg, &disk0())
        .iter()
        .filter(|e| e.is_system)
        .map(|e| e.id)
        .collect();

    for _ in 0..STEPS {
        let op = random_op(&mut rng, &reg);
        reg = reg.dispatch(op);
    }

    for id in protected {
        let (_, extent) = reg.find_extent(id).expect("system volume disappeared");
        assert!(extent.is_allocated());
    }
}
