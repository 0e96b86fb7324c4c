//! Closed polyhedra describing material removed from a beam.
//!
//! Each builder takes its vertices in a fixed order and pairs them with a face table whose
//! loops wind counter-clockwise when viewed from outside. A volume is only returned when its
//! signed volume is positive, so downstream consumers never see inward-facing loops.

use crate::errors::VolumeError;
use crate::geometry::{Point, Vector, KERNEL_EPSILON};

/// Layout of the vertex list handed to [`NegativeVolume::build`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum VolumeShape {
    /// Half-lap notch: four edge lines, each contributing its outer point at an even index
    /// and its bias point at the following odd index.
    Lap,
    /// Rectangular notch given as two layers of four points, lower layer first.
    Layered {
        /// Whether the vertex order is the mirror image of the canonical order.
        mirrored: bool,
    },
    /// Triangular prism given as two layers of three points.
    Wedge {
        /// Whether the vertex order is the mirror image of the canonical order.
        mirrored: bool,
    },
}

/// Face loops of a lap notch: outer and floor points alternate along four edges.
const LAP_FACES: [&[usize]; 6] = [
    &[1, 7, 5, 3],
    &[0, 2, 4, 6],
    &[1, 3, 2, 0],
    &[3, 5, 4, 2],
    &[5, 7, 6, 4],
    &[7, 1, 0, 6],
];

/// Face loops of a box given as a bottom and a top layer of four points.
const LAYERED_FACES: [&[usize]; 6] = [
    &[1, 0, 2, 3],
    &[4, 5, 7, 6],
    &[4, 6, 2, 0],
    &[1, 5, 4, 0],
    &[1, 3, 7, 5],
    &[6, 7, 3, 2],
];

/// Face loops of a prism given as two layers of three points.
const WEDGE_FACES: [&[usize]; 5] = [
    &[0, 2, 1],
    &[4, 5, 3],
    &[0, 1, 4, 3],
    &[1, 2, 5, 4],
    &[3, 5, 2, 0],
];

impl VolumeShape {
    /// Number of vertices the shape expects.
    #[must_use]
    pub const fn vertex_count(self) -> usize {
        match self {
            Self::Lap | Self::Layered { .. } => 8,
            Self::Wedge { .. } => 6,
        }
    }

    /// Face loops for this shape, reversed when mirrored.
    fn faces(self) -> Vec<Vec<usize>> {
        let (table, mirrored): (&[&[usize]], bool) = match self {
            Self::Lap => (&LAP_FACES, false),
            Self::Layered { mirrored } => (&LAYERED_FACES, mirrored),
            Self::Wedge { mirrored } => (&WEDGE_FACES, mirrored),
        };
        table
            .iter()
            .map(|face| {
                let mut face = face.to_vec();
                if mirrored {
                    face.reverse();
                }
                face
            })
            .collect()
    }
}

/// Closed polyhedron with outward-wound face loops.
#[derive(Clone, Debug, PartialEq)]
pub struct NegativeVolume {
    /// Corner points.
    vertices: Vec<Point>,
    /// Vertex index loops, one per face.
    faces: Vec<Vec<usize>>,
}

impl NegativeVolume {
    /// Assemble a volume from vertices laid out as described by `shape`.
    ///
    /// # Errors
    ///
    /// Returns [`VolumeError::VertexCount`] for the wrong number of vertices,
    /// [`VolumeError::Degenerate`] for a flat result and [`VolumeError::InwardWinding`] when
    /// the vertex order produces inward-facing loops.
    pub fn build(vertices: &[Point], shape: VolumeShape) -> Result<Self, VolumeError> {
        if vertices.len() != shape.vertex_count() {
            return Err(VolumeError::VertexCount {
                expected: shape.vertex_count(),
                found: vertices.len(),
            });
        }
        let volume = Self {
            vertices: vertices.to_vec(),
            faces: shape.faces(),
        };
        let signed = volume.signed_volume();
        let scale = volume.bounding_diagonal().powi(3).max(1.0);
        if signed.abs() <= KERNEL_EPSILON * scale {
            return Err(VolumeError::Degenerate);
        }
        if signed < 0.0 {
            return Err(VolumeError::InwardWinding { volume: signed });
        }
        Ok(volume)
    }

    /// Vertex positions.
    #[must_use]
    pub fn vertices(&self) -> &[Point] {
        &self.vertices
    }

    /// Face loops as indices into [`NegativeVolume::vertices`].
    #[must_use]
    pub fn faces(&self) -> &[Vec<usize>] {
        &self.faces
    }

    /// Average of the vertices.
    #[must_use]
    pub fn centroid(&self) -> Point {
        let sum = self
            .vertices
            .iter()
            .fold(Vector::zeros(), |acc, v| acc + v.coords);
        #[allow(clippy::cast_precision_loss)]
        let count = self.vertices.len().max(1) as f64;
        Point::from(sum / count)
    }

    /// Enclosed volume; positive when the loops wind outward.
    #[must_use]
    pub fn signed_volume(&self) -> f64 {
        let Some(reference) = self.vertices.first() else {
            return 0.0;
        };
        let mut total = 0.0;
        for face in &self.faces {
            let Some((&first, rest)) = face.split_first() else {
                continue;
            };
            let a = self.vertices[first] - reference;
            for pair in rest.windows(2) {
                let b = self.vertices[pair[0]] - reference;
                let c = self.vertices[pair[1]] - reference;
                total += a.dot(&b.cross(&c));
            }
        }
        total / 6.0
    }

    /// Area-weighted normal of face `index` from Newell's method, pointing outward.
    #[must_use]
    pub fn face_normal(&self, index: usize) -> Vector {
        let Some(face) = self.faces.get(index) else {
            return Vector::zeros();
        };
        let mut normal = Vector::zeros();
        for (i, &current) in face.iter().enumerate() {
            let next = face[(i + 1) % face.len()];
            normal += self.vertices[current].coords.cross(&self.vertices[next].coords);
        }
        normal * 0.5
    }

    /// Centroid of the vertices of face `index`.
    #[must_use]
    pub fn face_center(&self, index: usize) -> Point {
        let Some(face) = self.faces.get(index) else {
            return self.centroid();
        };
        let sum = face
            .iter()
            .fold(Vector::zeros(), |acc, &i| acc + self.vertices[i].coords);
        #[allow(clippy::cast_precision_loss)]
        let count = face.len().max(1) as f64;
        Point::from(sum / count)
    }

    /// Whether every face normal points away from the centroid.
    #[must_use]
    pub fn faces_point_outward(&self) -> bool {
        let centroid = self.centroid();
        (0..self.faces.len())
            .all(|i| self.face_normal(i).dot(&(self.face_center(i) - centroid)) > 0.0)
    }

    /// Length of the axis-aligned bounding box diagonal.
    fn bounding_diagonal(&self) -> f64 {
        let mut min = Vector::repeat(f64::INFINITY);
        let mut max = Vector::repeat(f64::NEG_INFINITY);
        for v in &self.vertices {
            min = min.inf(&v.coords);
            max = max.sup(&v.coords);
        }
        (max - min).norm()
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;

    use super::*;
    use crate::geometry::point;

    fn unit_layers() -> Vec<Point> {
        vec![
            point(0.0, 0.0, 0.0),
            point(1.0, 0.0, 0.0),
            point(0.0, 1.0, 0.0),
            point(1.0, 1.0, 0.0),
            point(0.0, 0.0, 1.0),
            point(1.0, 0.0, 1.0),
            point(0.0, 1.0, 1.0),
            point(1.0, 1.0, 1.0),
        ]
    }

    #[test]
    fn layered_cube_has_outward_faces() {
        let volume = NegativeVolume::build(&unit_layers(), VolumeShape::Layered { mirrored: false })
            .expect("cube builds");
        assert_relative_eq!(volume.signed_volume(), 1.0, epsilon = 1.0e-12);
        assert!(volume.faces_point_outward());
    }

    #[test]
    fn mirrored_layers_need_reversed_loops() {
        let mirrored: Vec<Point> = unit_layers()
            .into_iter()
            .map(|p| point(-p.x, p.y, p.z))
            .collect();
        let err = NegativeVolume::build(&mirrored, VolumeShape::Layered { mirrored: false })
            .expect_err("mirror image winds inward");
        assert!(matches!(err, VolumeError::InwardWinding { .. }));
        let volume = NegativeVolume::build(&mirrored, VolumeShape::Layered { mirrored: true })
            .expect("reversed loops wind outward");
        assert!(volume.faces_point_outward());
    }

    #[test]
    fn lap_order_pairs_outer_and_bias_points() {
        // Four vertical edge lines: outer points on z = 1, bias points on z = 0.
        let corners = [(0.0, 0.0), (1.0, 0.0), (1.0, 1.0), (0.0, 1.0)];
        let vertices: Vec<Point> = corners
            .iter()
            .flat_map(|&(x, y)| [point(x, y, 1.0), point(x, y, 0.0)])
            .collect();
        let volume = NegativeVolume::build(&vertices, VolumeShape::Lap).expect("lap builds");
        assert_relative_eq!(volume.signed_volume(), 1.0, epsilon = 1.0e-12);
        assert!(volume.faces_point_outward());
    }

    #[test]
    fn wedge_has_outward_faces() {
        let vertices = [
            point(0.0, 0.0, 0.0),
            point(1.0, 0.0, 0.0),
            point(0.0, 1.0, 0.0),
            point(0.0, 0.0, 1.0),
            point(1.0, 0.0, 1.0),
            point(0.0, 1.0, 1.0),
        ];
        let volume = NegativeVolume::build(&vertices, VolumeShape::Wedge { mirrored: false })
            .expect("wedge builds");
        assert_relative_eq!(volume.signed_volume(), 0.5, epsilon = 1.0e-12);
        assert!(volume.faces_point_outward());
    }

    #[test]
    fn wrong_vertex_count_is_rejected() {
        let err = NegativeVolume::build(&unit_layers()[..6], VolumeShape::Lap)
            .expect_err("six vertices rejected");
        assert_eq!(
            err,
            VolumeError::VertexCount {
                expected: 8,
                found: 6
            }
        );
    }

    #[test]
    fn flat_volume_is_degenerate() {
        let flat: Vec<Point> = unit_layers()
            .into_iter()
            .map(|p| point(p.x, p.y, 0.0))
            .collect();
        let err = NegativeVolume::build(&flat, VolumeShape::Layered { mirrored: false })
            .expect_err("flat volume rejected");
        assert_eq!(err, VolumeError::Degenerate);
    }
}
