#![warn(clippy::pedantic)]

use approx::assert_relative_eq;
use timberjoin::{
    export, point, Assembly, AssemblyData, AssemblyError, BeamKey, ClassificationError, Feature,
    JointKey, JointKind, JointOptions, JointState, Line, Settings, Topology,
};

fn frame_assembly() -> Assembly {
    let settings = Settings {
        point_precision: 2,
        ..Settings::default()
    };
    let mut assembly = Assembly::new(settings);
    let sill = assembly
        .add_beam(
            Line::new(point(0.0, 0.0, 0.0), point(3000.0, 0.0, 0.0)),
            120.0,
            160.0,
            None,
        )
        .expect("sill is valid");
    let post = assembly
        .add_beam(
            Line::new(point(1500.0, -1000.0, 0.0), point(1500.0, 0.0, 0.0)),
            120.0,
            160.0,
            None,
        )
        .expect("post is valid");
    let corner = assembly
        .add_beam(
            Line::new(point(0.0, 0.0, 0.0), point(0.0, 2000.0, 0.0)),
            120.0,
            160.0,
            None,
        )
        .expect("corner beam is valid");
    let options = JointOptions {
        cut_plane_bias: 0.4,
        flip_lap_side: true,
    };
    assembly
        .create_joint(JointKind::DovetailLap, post, sill, JointOptions::default())
        .expect("dovetail resolves");
    assembly
        .create_joint(JointKind::HalfLapL, sill, corner, options)
        .expect("corner lap resolves");
    assembly
}

#[test]
fn json_round_trip_reproduces_features() {
    let assembly = frame_assembly();
    let json = assembly.to_json().expect("assembly serializes");
    let restored = Assembly::from_json(&json).expect("assembly deserializes");

    assert_eq!(restored.to_data().joints, assembly.to_data().joints);
    assert_eq!(restored.settings(), assembly.settings());
    assert_eq!(restored.settings().point_precision, 2);
    for (before, after) in assembly.beams().zip(restored.beams()) {
        assert_eq!(before.key(), after.key());
        assert_relative_eq!(before.blank_length(), after.blank_length(), epsilon = 1.0e-9);
        assert_eq!(before.features().len(), after.features().len());
        for (a, b) in before.features().iter().zip(after.features()) {
            assert_eq!(a.joint, b.joint);
            match (&a.feature, &b.feature) {
                (Feature::Cut(a), Feature::Cut(b)) => {
                    assert_relative_eq!(a.origin, b.origin, epsilon = 1.0e-9);
                    assert_relative_eq!(a.normal(), b.normal(), epsilon = 1.0e-9);
                }
                (Feature::Mill(a), Feature::Mill(b)) => {
                    assert_eq!(a.name, b.name);
                    for (p, q) in a.volume.vertices().iter().zip(b.volume.vertices()) {
                        assert_relative_eq!(p, q, epsilon = 1.0e-9);
                    }
                }
                _ => panic!("feature kinds differ"),
            }
        }
    }
    assert!(restored
        .joints()
        .all(|joint| joint.state() == JointState::FeaturesApplied));
    assert_eq!(export(&restored).parameters.len(), export(&assembly).parameters.len());
}

#[test]
fn settings_fill_in_missing_fields() {
    let json = r#"{
        "beams": [
            { "key": 0, "start": [0.0, 0.0, 0.0], "end": [1000.0, 0.0, 0.0],
              "width": 100.0, "height": 200.0, "z_vector": [0.0, 0.0, 1.0] },
            { "key": 4, "start": [500.0, -500.0, 0.0], "end": [500.0, 500.0, 0.0],
              "width": 100.0, "height": 200.0, "z_vector": [0.0, 0.0, 1.0] }
        ],
        "joints": [
            { "key": 2, "kind": "HalfLapX", "main": 0, "cross": 4, "options": {} }
        ]
    }"#;
    let assembly = Assembly::from_json(json).expect("assembly deserializes");
    assert_eq!(assembly.settings(), &Settings::default());
    assert_eq!(assembly.beam_count(), 2);
    let data: AssemblyData = assembly.to_data();
    assert_eq!(data.joints[0].options, JointOptions::default());
    assert!(assembly.beams().all(|beam| beam.features().len() == 1));

    // New keys continue after the highest restored key.
    let mut assembly = assembly;
    let next = assembly
        .add_beam(
            Line::new(point(0.0, 800.0, 0.0), point(1000.0, 800.0, 0.0)),
            100.0,
            200.0,
            None,
        )
        .expect("beam is valid");
    assert_eq!(next.0, 5);
}

#[test]
fn malformed_json_is_reported() {
    let err = Assembly::from_json("{ \"beams\": 3 }").expect_err("beams must be a list");
    assert!(matches!(err, AssemblyError::Serialization(_)));
}

/// Two crossing beams and a single joint of `kind` between them.
fn crossing_json(kind: &str, second_key: u32, joint_key: u32) -> String {
    format!(
        r#"{{
        "beams": [
            {{ "key": 0, "start": [0.0, 0.0, 0.0], "end": [1000.0, 0.0, 0.0],
              "width": 100.0, "height": 200.0, "z_vector": [0.0, 0.0, 1.0] }},
            {{ "key": {second_key}, "start": [500.0, -500.0, 0.0], "end": [500.0, 500.0, 0.0],
              "width": 100.0, "height": 200.0, "z_vector": [0.0, 0.0, 1.0] }}
        ],
        "joints": [
            {{ "key": 1, "kind": "HalfLapX", "main": 0, "cross": {second_key}, "options": {{}} }},
            {{ "key": {joint_key}, "kind": "{kind}", "main": 0, "cross": {second_key},
              "options": {{}} }}
        ]
    }}"#
    )
}

#[test]
fn restored_joints_must_match_their_topology() {
    // Crossing beams can only carry X joints.
    let err = Assembly::from_json(&crossing_json("Miter", 1, 2))
        .expect_err("a miter needs an L topology");
    let AssemblyError::Classification(ClassificationError::TopologyMismatch {
        expected, found, ..
    }) = err
    else {
        panic!("unexpected error: {err:?}");
    };
    assert_eq!(expected, Topology::L);
    assert_eq!(found, Topology::X);
}

#[test]
fn duplicate_keys_are_rejected() {
    let err = Assembly::from_json(&crossing_json("HalfLapX", 0, 2))
        .expect_err("beam key listed twice");
    assert!(matches!(err, AssemblyError::DuplicateBeam(BeamKey(0))), "{err:?}");

    let err = Assembly::from_json(&crossing_json("HalfLapX", 1, 1))
        .expect_err("joint key listed twice");
    assert!(matches!(err, AssemblyError::DuplicateJoint(JointKey(1))), "{err:?}");
}

#[test]
fn restored_t_joint_takes_the_classified_main_beam() {
    let json = r#"{
        "beams": [
            { "key": 0, "start": [0.0, -1000.0, 0.0], "end": [0.0, 1000.0, 0.0],
              "width": 100.0, "height": 200.0, "z_vector": [0.0, 0.0, 1.0] },
            { "key": 1, "start": [-1000.0, 0.0, 0.0], "end": [0.0, 0.0, 0.0],
              "width": 100.0, "height": 200.0, "z_vector": [0.0, 0.0, 1.0] }
        ],
        "joints": [
            { "key": 0, "kind": "HalfLapT", "main": 0, "cross": 1, "options": {} }
        ]
    }"#;
    let assembly = Assembly::from_json(json).expect("assembly deserializes");
    let joint = assembly.joint(JointKey(0)).expect("joint exists");
    assert_eq!(joint.main(), BeamKey(1));
    assert_eq!(joint.cross(), BeamKey(0));
    assert_eq!(joint.state(), JointState::FeaturesApplied);
}
