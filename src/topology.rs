//! Classification of how two beam centerlines meet.

use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::beam::{Beam, BeamEnd, BeamKey};
use crate::config::Settings;
use crate::errors::ClassificationError;
use crate::geometry::intersection_line_line;

/// Geometric relationship between two beams.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Topology {
    /// Collinear beams meeting end to end.
    I,
    /// Two beams meeting at one end each.
    L,
    /// One beam ending along the length of the other.
    T,
    /// Two beams crossing along their lengths.
    X,
}

impl fmt::Display for Topology {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::I => "I",
            Self::L => "L",
            Self::T => "T",
            Self::X => "X",
        };
        f.write_str(name)
    }
}

/// Result of classifying a pair of beams.
///
/// For [`Topology::T`] the main beam is always the one whose end participates. For the other
/// topologies the input order is kept.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Classification {
    /// Detected topology.
    pub topology: Topology,
    /// Main beam of the joint.
    pub main: BeamKey,
    /// Cross beam of the joint.
    pub cross: BeamKey,
    /// End of the main beam at the joint, if an end participates.
    pub main_end: Option<BeamEnd>,
    /// End of the cross beam at the joint, if an end participates.
    pub cross_end: Option<BeamEnd>,
    /// Length of the closest-approach segment between the centerlines.
    pub gap: f64,
}

/// Position of a closest point relative to a beam segment.
#[derive(Clone, Copy, Debug, PartialEq)]
enum Reach {
    /// Within the end tolerance of an endpoint.
    AtEnd(BeamEnd),
    /// Strictly between the endpoints.
    Interior,
    /// Beyond the segment.
    Outside,
}

/// Where parameter `t` falls on a segment of `length`; ties go to the start.
fn reach(t: f64, length: f64, end_tolerance: f64) -> Reach {
    let from_start = (t * length).abs();
    let from_end = ((1.0 - t) * length).abs();
    let near_start = from_start <= end_tolerance;
    let near_end = from_end <= end_tolerance;
    match (near_start, near_end) {
        (true, true) if from_end < from_start => Reach::AtEnd(BeamEnd::End),
        (true, _) => Reach::AtEnd(BeamEnd::Start),
        (false, true) => Reach::AtEnd(BeamEnd::End),
        (false, false) if t > 0.0 && t < 1.0 => Reach::Interior,
        (false, false) => Reach::Outside,
    }
}

/// Classify how `a` and `b` meet.
///
/// Endpoints within [`Settings::end_tolerance`] of the closest point count as participating
/// ends. A closest point that lies beyond either segment is rejected.
///
/// # Errors
///
/// Returns a [`ClassificationError`] for parallel beams that do not meet end to end, for
/// centerlines further apart than [`Settings::max_distance`], and for closest points that
/// lie outside of either beam.
pub fn classify(
    a: &Beam,
    b: &Beam,
    settings: &Settings,
) -> Result<Classification, ClassificationError> {
    let Ok(closest) = intersection_line_line(a.centerline(), b.centerline()) else {
        return classify_parallel(a, b, settings);
    };
    let gap = closest.gap();
    if let Some(max_distance) = settings.max_distance {
        if gap > max_distance {
            return Err(ClassificationError::TooFar {
                a: a.key(),
                b: b.key(),
                gap,
                max_distance,
            });
        }
    }

    let reach_a = reach(closest.t_a, a.length(), settings.end_tolerance);
    let reach_b = reach(closest.t_b, b.length(), settings.end_tolerance);
    let classification = |topology, main: &Beam, cross: &Beam, main_end, cross_end| Classification {
        topology,
        main: main.key(),
        cross: cross.key(),
        main_end,
        cross_end,
        gap,
    };
    let result = match (reach_a, reach_b) {
        (Reach::Outside, _) => Err(a.key()),
        (_, Reach::Outside) => Err(b.key()),
        (Reach::AtEnd(end_a), Reach::AtEnd(end_b)) => Ok(classification(
            Topology::L,
            a,
            b,
            Some(end_a),
            Some(end_b),
        )),
        (Reach::AtEnd(end_a), Reach::Interior) => {
            Ok(classification(Topology::T, a, b, Some(end_a), None))
        }
        (Reach::Interior, Reach::AtEnd(end_b)) => {
            Ok(classification(Topology::T, b, a, Some(end_b), None))
        }
        (Reach::Interior, Reach::Interior) => Ok(classification(Topology::X, a, b, None, None)),
    };
    let classification = result.map_err(|outside| ClassificationError::OutOfReach {
        a: a.key(),
        b: b.key(),
        outside,
    })?;
    debug!(
        topology = %classification.topology,
        main = %classification.main,
        cross = %classification.cross,
        gap,
        "classified beam pair"
    );
    Ok(classification)
}

/// Classify parallel beams, which only meet end to end as an I topology.
fn classify_parallel(
    a: &Beam,
    b: &Beam,
    settings: &Settings,
) -> Result<Classification, ClassificationError> {
    let rejected = ClassificationError::ParallelBeams {
        a: a.key(),
        b: b.key(),
    };
    let ends = [BeamEnd::Start, BeamEnd::End];
    let endpoint = |beam: &Beam, end| match end {
        BeamEnd::Start => beam.centerline().start,
        BeamEnd::End => beam.centerline().end,
    };
    let touching = ends
        .iter()
        .flat_map(|&end_a| ends.iter().map(move |&end_b| (end_a, end_b)))
        .map(|(end_a, end_b)| {
            let distance = (endpoint(a, end_a) - endpoint(b, end_b)).norm();
            (distance, end_a, end_b)
        })
        .filter(|(distance, _, _)| *distance <= settings.end_tolerance)
        .min_by(|x, y| x.0.total_cmp(&y.0));
    let Some((gap, end_a, end_b)) = touching else {
        return Err(rejected);
    };
    // Only collinear beams can touch end to end.
    let direction = a.centerline().vector().normalize();
    let offset = b.centerline().start - a.centerline().start;
    if offset.cross(&direction).norm() > settings.end_tolerance {
        return Err(rejected);
    }
    debug!(a = %a.key(), b = %b.key(), "classified collinear beam pair");
    Ok(Classification {
        topology: Topology::I,
        main: a.key(),
        cross: b.key(),
        main_end: Some(end_a),
        cross_end: Some(end_b),
        gap,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::{point, Line};

    fn beam(key: u32, start: [f64; 3], end: [f64; 3]) -> Beam {
        let centerline = Line::new(
            point(start[0], start[1], start[2]),
            point(end[0], end[1], end[2]),
        );
        Beam::from_centerline(BeamKey(key), centerline, 100.0, 200.0, None)
            .expect("beam construction succeeds")
    }

    #[test]
    fn end_on_interior_is_t_regardless_of_order() {
        let cross = beam(0, [0.0, -1000.0, 0.0], [0.0, 1000.0, 0.0]);
        let main = beam(1, [-1000.0, 0.0, 0.0], [0.0, 0.0, 0.0]);
        let settings = Settings::default();
        for (a, b) in [(&cross, &main), (&main, &cross)] {
            let classification = classify(a, b, &settings).expect("beams meet");
            assert_eq!(classification.topology, Topology::T);
            assert_eq!(classification.main, BeamKey(1));
            assert_eq!(classification.cross, BeamKey(0));
            assert_eq!(classification.main_end, Some(BeamEnd::End));
        }
    }

    #[test]
    fn crossing_interiors_are_x_in_input_order() {
        let a = beam(0, [-500.0, 0.0, 0.0], [500.0, 0.0, 0.0]);
        let b = beam(1, [0.0, -500.0, 0.0], [0.0, 500.0, 0.0]);
        let classification = classify(&b, &a, &Settings::default()).expect("beams meet");
        assert_eq!(classification.topology, Topology::X);
        assert_eq!(classification.main, BeamKey(1));
    }

    #[test]
    fn shared_endpoint_is_l() {
        let a = beam(0, [1000.0, 0.0, 0.0], [0.0, 0.0, 0.0]);
        let b = beam(1, [0.0, 0.0, 0.0], [0.0, 1000.0, 0.0]);
        let classification = classify(&a, &b, &Settings::default()).expect("beams meet");
        assert_eq!(classification.topology, Topology::L);
        assert_eq!(classification.main_end, Some(BeamEnd::End));
        assert_eq!(classification.cross_end, Some(BeamEnd::Start));
    }

    #[test]
    fn collinear_beams_meeting_end_to_end_are_i() {
        let a = beam(0, [0.0, 0.0, 0.0], [1000.0, 0.0, 0.0]);
        let b = beam(1, [1000.0, 0.0, 0.0], [2000.0, 0.0, 0.0]);
        let settings = Settings::default();
        let classification = classify(&a, &b, &settings).expect("beams meet");
        assert_eq!(classification.topology, Topology::I);
        assert_eq!(classification.main_end, Some(BeamEnd::End));
        assert_eq!(classification.cross_end, Some(BeamEnd::Start));

        let swapped = classify(&b, &a, &settings).expect("beams meet");
        assert_eq!(swapped.topology, Topology::I);
        assert_eq!(swapped.main, BeamKey(1));
        assert_eq!(swapped.cross, BeamKey(0));
        assert_eq!(swapped.main_end, Some(BeamEnd::Start));
        assert_eq!(swapped.cross_end, Some(BeamEnd::End));
    }

    #[test]
    fn parallel_offset_beams_are_rejected() {
        let a = beam(0, [0.0, 0.0, 0.0], [1000.0, 0.0, 0.0]);
        let b = beam(1, [0.0, 300.0, 0.0], [1000.0, 300.0, 0.0]);
        let err = classify(&a, &b, &Settings::default()).expect_err("parallel pair rejected");
        assert!(matches!(err, ClassificationError::ParallelBeams { .. }));
    }

    #[test]
    fn closest_point_beyond_segment_is_rejected() {
        let a = beam(0, [-500.0, 0.0, 0.0], [500.0, 0.0, 0.0]);
        let b = beam(1, [0.0, 200.0, 0.0], [0.0, 900.0, 0.0]);
        let err = classify(&a, &b, &Settings::default()).expect_err("gap rejected");
        assert_eq!(
            err,
            ClassificationError::OutOfReach {
                a: BeamKey(0),
                b: BeamKey(1),
                outside: BeamKey(1),
            }
        );
    }

    #[test]
    fn max_distance_limits_skew_pairs() {
        let a = beam(0, [-500.0, 0.0, 0.0], [500.0, 0.0, 0.0]);
        let b = beam(1, [0.0, -500.0, 150.0], [0.0, 500.0, 150.0]);
        let settings = Settings {
            max_distance: Some(100.0),
            ..Settings::default()
        };
        let err = classify(&a, &b, &settings).expect_err("distant pair rejected");
        assert!(matches!(err, ClassificationError::TooFar { .. }));
        let classification = classify(&a, &b, &Settings::default()).expect("unlimited reach");
        assert_eq!(classification.topology, Topology::X);
    }
}
