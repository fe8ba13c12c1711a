// crates/lg_particles/tests/parallel_tests.rs
//!
//! 分区并行与进程间移交测试
//!
//! 移交保持身份和状态、接收方变换、串行与分区结果一致

use glam::DVec3;
use lg_config::{CloudConfig, DragLaw, InterpolationScheme};
use lg_fields::CarrierFields;
use lg_mesh::{
    decompose_x, processor_patch_name, BlockMesh, PatchKind, PatchTransform, PolyMeshAccess,
};
use lg_particles::{DecomposedCase, InProcessTransport, ParticleCloud, RankDomain};

fn channel() -> lg_mesh::PolyMesh {
    BlockMesh::new(DVec3::ZERO, DVec3::new(4.0, 1.0, 1.0), [4, 1, 1])
        .build()
        .unwrap()
}

// ============================================================
// Test 1: 移交保持身份和状态
// ============================================================

#[test]
fn test_handoff_preserves_identity_and_state() {
    let mesh = channel();
    let carrier = DVec3::new(1.0, 0.0, 0.0);
    let fields = CarrierFields::uniform(mesh.n_cells(), carrier, 1.2, 1.5e-5);
    let mut case = DecomposedCase::new(
        &mesh,
        &fields,
        2,
        "kinematicCloud",
        &CloudConfig::default(),
        InterpolationScheme::Cell,
        DVec3::ZERO,
    )
    .unwrap();

    // 随流颗粒，一步内穿过 x = 2 的进程边界
    let (rank, id) = case.seed(DVec3::new(1.5, 0.25, 0.75), 3e-4, carrier).unwrap();
    assert_eq!(rank, 0);
    let report = case.evolve(1.0).unwrap();
    assert_eq!(report.migrated, 1);
    assert_eq!(report.removed, 0);
    assert_eq!(report.dropped, 0);

    let moved: Vec<_> = case.particles().collect();
    assert_eq!(moved.len(), 1);
    let (rank, p) = moved[0];
    assert_eq!(rank, 1);
    assert_eq!(p.id, id);
    assert_eq!(p.d, 3e-4);
    assert_eq!(p.velocity, carrier);
    assert_eq!(p.step_fraction, 1.0);
    assert!((p.position - DVec3::new(2.5, 0.25, 0.75)).length() < 1e-12);
    assert!(case.ranks()[0].cloud.is_empty());
}

#[test]
fn test_handoff_through_several_ranks() {
    let mesh = channel();
    let fields = CarrierFields::uniform(mesh.n_cells(), DVec3::ZERO, 0.0, 1.5e-5);
    let config = CloudConfig {
        drag: DragLaw::None,
        ..Default::default()
    };
    let mut case = DecomposedCase::new(
        &mesh,
        &fields,
        4,
        "cloud",
        &config,
        InterpolationScheme::Cell,
        DVec3::ZERO,
    )
    .unwrap();
    case.seed(DVec3::new(0.5, 0.5, 0.5), 1e-4, DVec3::new(3.0, 0.0, 0.0))
        .unwrap();

    let report = case.evolve(1.0).unwrap();
    assert_eq!(report.migrated, 3);
    assert_eq!(report.rounds, 4);
    let (rank, p) = case.particles().next().unwrap();
    assert_eq!(rank, 3);
    assert!((p.position.x - 3.5).abs() < 1e-12);
}

// ============================================================
// Test 2: 接收方按进程边界变换位置
// ============================================================

#[test]
fn test_receiver_applies_separation() {
    let mesh = BlockMesh::new(DVec3::ZERO, DVec3::new(2.0, 1.0, 1.0), [2, 1, 1])
        .build()
        .unwrap();
    let config = CloudConfig {
        drag: DragLaw::None,
        ..Default::default()
    };
    let mut parts = decompose_x(&mesh, 2).unwrap();

    let separation = DVec3::new(0.0, 0.0, 0.1);
    let receiver = &mut parts[1].mesh;
    let patch = receiver.find_patch(&processor_patch_name(1, 0)).unwrap();
    receiver.patches[patch.as_usize()].kind = PatchKind::Processor {
        my_rank: 1,
        neighbour_rank: 0,
        transform: PatchTransform::Separation(separation),
    };

    let ranks = parts
        .into_iter()
        .map(|decomposed| RankDomain {
            fields: CarrierFields::uniform(decomposed.mesh.n_cells(), DVec3::ZERO, 0.0, 1.5e-5),
            cloud: ParticleCloud::new("cloud", config.clone()),
            decomposed,
        })
        .collect();
    let mut case = DecomposedCase::with_transport(
        ranks,
        InProcessTransport::new(2),
        InterpolationScheme::Cell,
        DVec3::ZERO,
    );
    case.seed(DVec3::new(0.5, 0.5, 0.3), 1e-4, DVec3::X).unwrap();
    case.evolve(1.0).unwrap();

    let (rank, p) = case.particles().next().unwrap();
    assert_eq!(rank, 1);
    assert!((p.position - DVec3::new(1.5, 0.5, 0.4)).length() < 1e-12);
    assert_eq!(p.velocity, DVec3::X);
}

// ============================================================
// Test 3: 串行与分区结果一致
// ============================================================

fn bouncing_case(n_ranks: usize) -> DecomposedCase {
    let mesh = BlockMesh::new(DVec3::ZERO, DVec3::new(3.0, 1.0, 1.0), [6, 2, 2])
        .build()
        .unwrap();
    let fields = CarrierFields::uniform(mesh.n_cells(), DVec3::new(1.0, 0.2, 0.1), 1.2, 1.5e-5);
    let config = CloudConfig {
        e: 0.9,
        ..Default::default()
    };
    let mut case = DecomposedCase::new(
        &mesh,
        &fields,
        n_ranks,
        "cloud",
        &config,
        InterpolationScheme::Cell,
        DVec3::ZERO,
    )
    .unwrap();
    for i in 0..8 {
        let t = i as f64;
        case.seed(
            DVec3::new(0.2 + 0.33 * t, 0.15 + 0.09 * t, 0.8 - 0.07 * t),
            1e-4 * (1.0 + t),
            DVec3::new(2.0 - 0.6 * t, 0.7 - 0.15 * t, 0.3 * t - 1.0),
        )
        .unwrap();
    }
    case
}

#[test]
fn test_serial_and_decomposed_agree() {
    let mut serial = bouncing_case(1);
    let mut split = bouncing_case(3);

    let mut migrated = 0;
    for _ in 0..20 {
        serial.evolve(0.05).unwrap();
        migrated += split.evolve(0.05).unwrap().migrated;
    }
    assert!(migrated > 0);
    assert_eq!(serial.n_particles(), 8);
    assert_eq!(split.n_particles(), 8);

    for (_, a) in serial.particles() {
        let (_, b) = split.particles().find(|(_, b)| b.id == a.id).unwrap();
        assert!((a.position - b.position).length() < 1e-10, "颗粒 {}", a.id);
        assert!((a.velocity - b.velocity).length() < 1e-10, "颗粒 {}", a.id);
        assert_eq!(a.d, b.d);
    }
}
