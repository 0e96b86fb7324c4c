#![warn(clippy::pedantic)]

use approx::assert_relative_eq;
use timberjoin::{
    export, point, Assembly, AssemblyError, Beam, BeamKey, Feature, Frame, JoiningFailure,
    JointKind, JointOptions, JointState, Line, Point, Process, Settings, Topology, Vector,
};

fn beam(assembly: &mut Assembly, start: Point, end: Point, width: f64) -> BeamKey {
    assembly
        .add_beam(Line::new(start, end), width, 200.0, None)
        .expect("beam is valid")
}

fn cuts(beam: &Beam) -> Vec<Frame> {
    beam.features()
        .iter()
        .filter_map(|f| match &f.feature {
            Feature::Cut(plane) => Some(*plane),
            Feature::Mill(_) => None,
        })
        .collect()
}

fn mills(beam: &Beam) -> usize {
    beam.features()
        .iter()
        .filter(|f| matches!(f.feature, Feature::Mill(_)))
        .count()
}

/// Unit vector from the joint end of `beam` into its body.
fn into_body(beam: &Beam) -> Vector {
    -beam.frame().xaxis
}

/// Two rafters of a roof meeting at the ridge, both ending in the origin.
fn rafters(width_b: f64) -> (Assembly, BeamKey, BeamKey) {
    let mut assembly = Assembly::new(Settings::default());
    let a = beam(
        &mut assembly,
        point(-1000.0, 0.0, -500.0),
        point(0.0, 0.0, 0.0),
        100.0,
    );
    let b = beam(
        &mut assembly,
        point(1000.0, 0.0, -500.0),
        point(0.0, 0.0, 0.0),
        width_b,
    );
    (assembly, a, b)
}

#[test]
fn crossing_beams_are_both_lapped() {
    let mut assembly = Assembly::new(Settings::default());
    let a = beam(&mut assembly, point(-500.0, 0.0, 0.0), point(500.0, 0.0, 0.0), 100.0);
    let b = beam(&mut assembly, point(0.0, -500.0, 0.0), point(0.0, 500.0, 0.0), 100.0);
    assert_eq!(assembly.classify(a, b).expect("beams cross").topology, Topology::X);
    assembly
        .create_joint(JointKind::HalfLapX, a, b, JointOptions::default())
        .expect("X lap resolves");
    for key in [a, b] {
        let beam = assembly.find_by_key(key).expect("beam exists");
        assert_eq!(mills(beam), 1);
        assert!(cuts(beam).is_empty());
        assert_relative_eq!(beam.blank_length(), 1000.0);
    }

    let report = export(&assembly);
    assert!(report.failures.is_empty(), "{:?}", report.failures);
    let sides: Vec<u8> = report.parameters.iter().map(|p| p.reference_side).collect();
    // The main beam is notched from below, the cross beam from above.
    assert_eq!(sides, [2, 4]);
}

#[test]
fn stacked_crossing_beams_share_the_shallower_depth() {
    let mut assembly = Assembly::new(Settings::default());
    let a = beam(&mut assembly, point(-500.0, 0.0, 0.0), point(500.0, 0.0, 0.0), 100.0);
    // Shallow beam whose bottom face sits on the centerline of the deep one.
    let b = assembly
        .add_beam(
            Line::new(point(0.0, -500.0, 50.0), point(0.0, 500.0, 50.0)),
            100.0,
            100.0,
            None,
        )
        .expect("beam is valid");
    for bias in [0.3, 0.5] {
        let mut assembly = assembly.clone();
        let options = JointOptions {
            cut_plane_bias: bias,
            ..JointOptions::default()
        };
        assembly
            .create_joint(JointKind::HalfLapX, a, b, options)
            .expect("stacked lap resolves");
        let report = export(&assembly);
        assert!(report.failures.is_empty(), "{:?}", report.failures);
        let depths: Vec<f64> = report
            .parameters
            .iter()
            .filter_map(|p| match &p.process {
                Process::Lap(lap) => Some(lap.depth),
                Process::JackCut(_) => None,
            })
            .collect();
        assert_eq!(depths.len(), 2);
        assert_relative_eq!(depths[0], bias * 100.0, epsilon = 1.0e-6);
        assert_relative_eq!(depths[0] + depths[1], 100.0, epsilon = 1.0e-6);
    }
}

#[test]
fn miter_cuts_lie_on_the_bisector() {
    let mut assembly = Assembly::new(Settings::default());
    let a = beam(&mut assembly, point(1000.0, 0.0, 0.0), point(0.0, 0.0, 0.0), 100.0);
    let b = beam(&mut assembly, point(0.0, 0.0, 0.0), point(0.0, 1000.0, 0.0), 100.0);
    assembly
        .create_joint(JointKind::Miter, a, b, JointOptions::default())
        .expect("miter resolves");
    let beam_a = assembly.find_by_key(a).expect("beam exists");
    let beam_b = assembly.find_by_key(b).expect("beam exists");
    let cut_a = cuts(beam_a)[0];
    let cut_b = cuts(beam_b)[0];
    // Each cut keeps its own beam and removes the part beyond the bisector.
    assert!(cut_a.normal().dot(&into_body(beam_a)) < 0.0);
    assert!(cut_b.normal().dot(&beam_b.frame().xaxis) < 0.0);
    assert_relative_eq!(cut_a.normal(), -cut_b.normal(), epsilon = 1.0e-12);
    assert_relative_eq!(
        cut_a.normal().dot(&Vector::new(1.0, 1.0, 0.0).normalize()),
        0.0,
        epsilon = 1.0e-12
    );
    // Both beams reach past the corner to the outer tip of the miter.
    assert!(beam_a.blank_length() > 1000.0);
    assert!(beam_b.blank_length() > 1000.0);
}

#[test]
fn corner_half_lap_trims_both_beams() {
    let mut assembly = Assembly::new(Settings::default());
    let a = beam(&mut assembly, point(1000.0, 0.0, 0.0), point(0.0, 0.0, 0.0), 100.0);
    let b = beam(&mut assembly, point(0.0, 0.0, 0.0), point(0.0, 1000.0, 0.0), 100.0);
    assembly
        .create_joint(JointKind::HalfLapL, a, b, JointOptions::default())
        .expect("corner lap resolves");
    for key in [a, b] {
        let beam = assembly.find_by_key(key).expect("beam exists");
        assert_eq!(mills(beam), 1);
        assert_eq!(cuts(beam).len(), 1);
        assert_relative_eq!(beam.blank_length(), 1050.01, epsilon = 1.0e-9);
    }
    let cut_a = cuts(assembly.find_by_key(a).expect("beam exists"))[0];
    assert_relative_eq!(cut_a.origin.x, -50.0, epsilon = 1.0e-9);
    assert_relative_eq!(cut_a.normal(), Vector::new(-1.0, 0.0, 0.0), epsilon = 1.0e-12);

    let report = export(&assembly);
    assert!(report.failures.is_empty(), "{:?}", report.failures);
    assert_eq!(report.parameters.len(), 4);
}

#[test]
fn miter_rejects_crossing_beams() {
    let mut assembly = Assembly::new(Settings::default());
    let a = beam(&mut assembly, point(-500.0, 0.0, 0.0), point(500.0, 0.0, 0.0), 100.0);
    let b = beam(&mut assembly, point(0.0, -500.0, 0.0), point(0.0, 500.0, 0.0), 100.0);
    let err = assembly
        .create_joint(JointKind::Miter, a, b, JointOptions::default())
        .expect_err("miter needs an L");
    assert!(matches!(err, AssemblyError::Classification(_)));
    assert!(assembly.beams().all(|beam| beam.features().is_empty()));
}

#[test]
fn french_ridge_meets_on_the_ridge_plane() {
    let (mut assembly, a, b) = rafters(100.0);
    assert_eq!(assembly.classify(a, b).expect("rafters meet").topology, Topology::L);
    let joint = assembly
        .create_joint(JointKind::FrenchRidgeLap, a, b, JointOptions::default())
        .expect("ridge lap resolves");
    assert_eq!(
        assembly.joint(joint).expect("joint exists").state(),
        JointState::FeaturesApplied
    );
    let beam_a = assembly.find_by_key(a).expect("beam exists");
    let beam_b = assembly.find_by_key(b).expect("beam exists");
    for beam in [beam_a, beam_b] {
        assert_eq!(mills(beam), 1);
        assert_eq!(cuts(beam).len(), 1);
        assert!(cuts(beam)[0].normal().dot(&into_body(beam)) < 0.0);
        assert!(beam.blank_length() > beam.length());
    }
    let ridge = cuts(beam_a)[0];
    assert_relative_eq!(ridge.normal(), Vector::new(1.0, 0.0, 0.0), epsilon = 1.0e-9);
    assert_relative_eq!(ridge.origin.x, 0.0, epsilon = 1.0e-9);

    let report = export(&assembly);
    assert!(report.failures.is_empty(), "{:?}", report.failures);
}

#[test]
fn french_ridge_needs_matching_widths() {
    let (mut assembly, a, b) = rafters(120.0);
    let err = assembly
        .create_joint(JointKind::FrenchRidgeLap, a, b, JointOptions::default())
        .expect_err("widths differ");
    let AssemblyError::Joining(err) = err else {
        panic!("unexpected error: {err:?}");
    };
    assert_eq!(err.reason, JoiningFailure::WidthMismatch);
    assert_eq!(
        assembly.joint(err.joint).expect("joint stays registered").state(),
        JointState::JoiningFailed
    );
}

#[test]
fn pairs_and_neighbors_follow_the_layout() {
    let mut assembly = Assembly::new(Settings::default());
    let a = beam(&mut assembly, point(-500.0, 0.0, 0.0), point(500.0, 0.0, 0.0), 100.0);
    let b = beam(&mut assembly, point(0.0, -500.0, 0.0), point(0.0, 500.0, 0.0), 100.0);
    // Parallel to the first beam and never classified against it.
    let c = beam(&mut assembly, point(-500.0, 800.0, 0.0), point(500.0, 800.0, 0.0), 100.0);
    let pairs = assembly.find_intersecting_pairs();
    assert_eq!(pairs.len(), 1);
    assert_eq!(pairs[0].topology, Topology::X);

    assert!(assembly.neighbors(a).is_empty());
    let joint = assembly
        .create_joint(JointKind::HalfLapX, a, b, JointOptions::default())
        .expect("X lap resolves");
    assert_eq!(assembly.neighbors(a), vec![b]);
    assert_eq!(assembly.neighbors(b), vec![a]);
    assert!(assembly.neighbors(c).is_empty());
    assert_eq!(assembly.joints_of(b), vec![joint]);
    assert!(matches!(
        assembly.classify(a, a),
        Err(AssemblyError::SelfJoint(_))
    ));
}
