use deep_woods_core::{
    Battery, BatteryId, Extents, GroundCoord, ObjectId, PlacedObject, Renderable, StructureKind,
    Tree, TreeSpecies, WorldBoundary,
};
use deep_woods_system_collision::{
    is_inside_any_object, is_inside_object, Collider, Collision, Config,
};
use glam::{Quat, Vec3};

fn structure(id: u32, kind: StructureKind, origin: Vec3, yaw: f32) -> PlacedObject {
    PlacedObject::new(
        ObjectId::new(id),
        kind,
        origin,
        yaw,
        Extents::new(Vec3::new(-1.2, 0.0, -0.7), Vec3::new(0.8, 3.0, 1.4)),
    )
}

fn chalice_at(origin: Vec3) -> PlacedObject {
    PlacedObject::new(
        ObjectId::new(3),
        StructureKind::Chalice,
        origin,
        0.0,
        Extents::new(Vec3::new(-0.15, 0.0, -0.15), Vec3::new(0.15, 0.4, 0.15)),
    )
}

#[test]
fn inside_test_is_invariant_under_shared_rotation() {
    let origin = Vec3::new(-5.0, 0.0, 10.0);
    let base = structure(0, StructureKind::Windmill, origin, 0.0);

    let mut samples = Vec::new();
    for ix in -12..=12 {
        for iz in -12..=12 {
            samples.push(origin + Vec3::new(ix as f32 * 0.17, 0.0, iz as f32 * 0.19));
        }
    }

    for angle in [15.0_f32, 37.5, 90.0, 133.0, 180.0, 271.0, -64.0] {
        let rotated_object = structure(0, StructureKind::Windmill, origin, angle);
        let rotation = Quat::from_rotation_y(angle.to_radians());

        for sample in &samples {
            let rotated_point = origin + rotation * (*sample - origin);
            let local = *sample - origin;
            let near_edge = [
                local.x - (-1.2 - 0.05),
                local.x - (0.8 + 0.05),
                local.z - (-0.7 - 0.05),
                local.z - (1.4 + 0.05),
            ]
            .iter()
            .any(|distance| distance.abs() < 1e-3);
            if near_edge {
                continue;
            }

            assert_eq!(
                is_inside_object(*sample, &base, 0.05),
                is_inside_object(rotated_point, &rotated_object, 0.05),
                "angle {angle} sample {sample:?}"
            );
        }
    }
}

#[test]
fn any_object_covers_structures_and_trees() {
    let objects = [
        structure(0, StructureKind::House, Vec3::new(5.0, 0.0, 5.0), 30.0),
        structure(1, StructureKind::Chapel, Vec3::new(-5.0, 0.0, 5.0), 0.0),
    ];
    let trees = [Tree {
        species: TreeSpecies::new(2),
        coord: GroundCoord::new(0.0, -8.0),
    }];

    assert!(is_inside_any_object(Vec3::new(5.0, 0.35, 5.0), &objects, &trees, 0.1));
    assert!(is_inside_any_object(Vec3::new(0.05, 0.35, -8.1), &objects, &trees, 0.1));
    assert!(!is_inside_any_object(Vec3::new(0.0, 0.35, 0.0), &objects, &trees, 0.1));
}

#[test]
fn collider_reports_boundary_before_objects() {
    let collider = Collider::new(WorldBoundary::symmetric(10.0), Config::default());
    let objects = [structure(4, StructureKind::House, Vec3::new(10.0, 0.0, 0.0), 0.0)];

    assert_eq!(
        collider.check(Vec3::new(10.5, 0.0, 0.0), &objects, &[]),
        Some(Collision::OutOfBounds)
    );
    assert_eq!(
        collider.check(Vec3::new(9.5, 0.0, 0.0), &objects, &[]),
        Some(Collision::Object(ObjectId::new(4)))
    );
    assert!(!collider.blocks(Vec3::new(0.0, 0.0, 0.0), &objects, &[]));
}

#[test]
fn collider_names_the_tree_that_blocked() {
    let collider = Collider::new(WorldBoundary::symmetric(10.0), Config::default());
    let trees = [
        Tree {
            species: TreeSpecies::new(0),
            coord: GroundCoord::new(1.0, 1.0),
        },
        Tree {
            species: TreeSpecies::new(1),
            coord: GroundCoord::new(-3.0, 2.0),
        },
    ];

    assert_eq!(
        collider.check(Vec3::new(-3.1, 0.35, 2.1), &[], &trees),
        Some(Collision::Tree(1))
    );
}

#[test]
fn goal_margin_decides_arrival() {
    let collider = Collider::new(
        WorldBoundary::symmetric(25.0),
        Config {
            goal_margin: 0.2,
            ..Config::default()
        },
    );
    let chalice = chalice_at(Vec3::new(-10.0, 0.0, 5.0));
    let at_chalice = chalice.object_coord() + Vec3::new(0.0, 0.35, 0.0);

    assert!(collider.reached_goal(at_chalice, &chalice));
    assert!(!collider.reached_goal(at_chalice + Vec3::new(0.2 + 0.21, 0.0, 0.0), &chalice));
    assert!(!collider.reached_goal(at_chalice + Vec3::new(0.0, 0.0, -0.41), &chalice));
}

#[test]
fn battery_pickup_uses_its_own_margin() {
    let collider = Collider::new(WorldBoundary::symmetric(25.0), Config::default());
    let battery = Battery {
        id: BatteryId::new(0),
        coord: GroundCoord::new(4.0, 4.0),
    };

    assert!(collider.touches_battery(Vec3::new(4.35, 0.35, 3.7), &battery));
    assert!(!collider.touches_battery(Vec3::new(4.5, 0.35, 4.0), &battery));
}
