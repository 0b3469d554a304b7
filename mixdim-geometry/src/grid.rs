//! Polytopal grids with face-based topology.
use crate::Real;
use itertools::Itertools;
use nalgebra::{Point3, Scalar, Vector3};
use nalgebra_sparse::pattern::SparsityPattern;
use nalgebra_sparse::CscMatrix;
use numeric_literals::replace_float_literals;
use rustc_hash::FxHashMap;
use std::error::Error;
use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GridError {
    /// Grids of the requested dimension can not be built by this constructor.
    UnsupportedDimension(usize),
    /// A simplex cell does not have `dim + 1` nodes.
    WrongNodeCount { cell: usize, expected: usize, actual: usize },
    NodeIndexOutOfBounds { index: usize, num_nodes: usize },
    FaceIndexOutOfBounds { index: usize, num_faces: usize },
    /// Orientation signs must be exactly `1` or `-1`.
    InvalidOrientation { cell: usize, face: usize },
    /// The nodes of a face or cell do not span the required number of dimensions.
    DegenerateEntity(String),
    /// The incidence data can not be represented in compressed format (e.g. duplicate entries).
    InvalidIncidence(String),
}

impl fmt::Display for GridError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnsupportedDimension(dim) => write!(f, "Unsupported grid dimension {}", dim),
            Self::WrongNodeCount { cell, expected, actual } => {
                write!(f, "Cell {} has {} nodes, expected {}", cell, actual, expected)
            }
            Self::NodeIndexOutOfBounds { index, num_nodes } => {
                write!(f, "Node index {} out of bounds for grid with {} nodes", index, num_nodes)
            }
            Self::FaceIndexOutOfBounds { index, num_faces } => {
                write!(f, "Face index {} out of bounds for grid with {} faces", index, num_faces)
            }
            Self::InvalidOrientation { cell, face } => {
                write!(f, "Orientation of face {} in cell {} is neither 1 nor -1", face, cell)
            }
            Self::DegenerateEntity(msg) => write!(f, "Degenerate grid entity: {}", msg),
            Self::InvalidIncidence(msg) => write!(f, "Invalid incidence data: {}", msg),
        }
    }
}

impl Error for GridError {}

/// A grid of dimension 0 to 3 embedded in three-dimensional space.
///
/// The topology is face based: `face_nodes` maps faces to nodes, and `cell_faces` is the
/// `num_faces x num_cells` oriented incidence matrix whose column `c` holds the faces of cell `c`,
/// sorted by face index, with value `1` if the face normal points out of the cell and `-1`
/// otherwise. Face normals are scaled by the face area.
#[derive(Debug, Clone)]
pub struct Grid<T: Scalar> {
    dim: usize,
    nodes: Vec<Point3<T>>,
    face_nodes: SparsityPattern,
    cell_faces: CscMatrix<T>,
    face_areas: Vec<T>,
    face_normals: Vec<Vector3<T>>,
    face_centers: Vec<Point3<T>>,
    cell_volumes: Vec<T>,
    cell_centers: Vec<Point3<T>>,
}

impl<T: Scalar> Grid<T> {
    pub fn dim(&self) -> usize {
        self.dim
    }

    pub fn num_nodes(&self) -> usize {
        self.nodes.len()
    }

    pub fn num_faces(&self) -> usize {
        self.face_nodes.major_dim()
    }

    pub fn num_cells(&self) -> usize {
        self.cell_faces.ncols()
    }

    pub fn nodes(&self) -> &[Point3<T>] {
        &self.nodes
    }

    pub fn face_nodes(&self) -> &SparsityPattern {
        &self.face_nodes
    }

    pub fn cell_faces(&self) -> &CscMatrix<T> {
        &self.cell_faces
    }

    pub fn face_areas(&self) -> &[T] {
        &self.face_areas
    }

    pub fn face_normals(&self) -> &[Vector3<T>] {
        &self.face_normals
    }

    pub fn face_centers(&self) -> &[Point3<T>] {
        &self.face_centers
    }

    pub fn cell_volumes(&self) -> &[T] {
        &self.cell_volumes
    }

    pub fn cell_centers(&self) -> &[Point3<T>] {
        &self.cell_centers
    }

    /// The (sorted) node indices of the given face.
    pub fn face_node_indices(&self, face: usize) -> &[usize] {
        self.face_nodes.lane(face)
    }

    /// The (sorted) face indices of the given cell.
    pub fn cell_face_indices(&self, cell: usize) -> &[usize] {
        self.cell_faces.pattern().lane(cell)
    }

    /// The orientation signs of the faces of the given cell, in the order of
    /// [`cell_face_indices`](Self::cell_face_indices).
    pub fn cell_face_signs(&self, cell: usize) -> &[T] {
        let offsets = self.cell_faces.col_offsets();
        &self.cell_faces.values()[offsets[cell]..offsets[cell + 1]]
    }

    /// The sorted, unique node indices of the given cell.
    pub fn cell_nodes(&self, cell: usize) -> Vec<usize> {
        self.cell_face_indices(cell)
            .iter()
            .flat_map(|&face| self.face_node_indices(face).iter().copied())
            .sorted_unstable()
            .dedup()
            .collect()
    }

    /// Number of cells adjacent to each face.
    pub fn face_cell_counts(&self) -> Vec<usize> {
        let mut counts = vec![0; self.num_faces()];
        for &face in self.cell_faces.row_indices() {
            counts[face] += 1;
        }
        counts
    }

    /// Faces adjacent to exactly one cell.
    pub fn boundary_faces(&self) -> Vec<usize> {
        self.face_cell_counts()
            .into_iter()
            .positions(|count| count == 1)
            .collect()
    }
}

impl<T: Real> Grid<T> {
    /// Creates the 0-dimensional grid consisting of a single point.
    ///
    /// The grid has one cell with unit volume and one degenerate face holding the node, so that
    /// its unknowns are laid out as `[flux slot, pressure]` like every other grid.
    pub fn point(point: Point3<T>) -> Self {
        let face_nodes = SparsityPattern::try_from_offsets_and_indices(1, 1, vec![0, 1], vec![0])
            .expect("Internal error: point grid face-node pattern must be valid.");
        let cell_faces = CscMatrix::try_from_csc_data(1, 1, vec![0, 1], vec![0], vec![T::one()])
            .expect("Internal error: point grid cell-face incidence must be valid.");
        Self {
            dim: 0,
            nodes: vec![point],
            face_nodes,
            cell_faces,
            face_areas: vec![T::one()],
            face_normals: vec![Vector3::zeros()],
            face_centers: vec![point],
            cell_volumes: vec![T::one()],
            cell_centers: vec![point],
        }
    }

    /// Creates a simplicial grid of dimension `dim` (1, 2 or 3) from cells given as node lists.
    ///
    /// Faces are generated by dropping one node from each cell and are numbered in order of
    /// first appearance. Orientation signs are computed from the geometry.
    pub fn from_simplices(dim: usize, nodes: Vec<Point3<T>>, cells: &[Vec<usize>]) -> Result<Self, GridError> {
        if !(1..=3).contains(&dim) {
            return Err(GridError::UnsupportedDimension(dim));
        }

        let mut face_lookup: FxHashMap<Vec<usize>, usize> = FxHashMap::default();
        let mut face_nodes = Vec::new();
        let mut cell_faces = Vec::with_capacity(cells.len());
        for (cell_idx, cell) in cells.iter().enumerate() {
            if cell.len() != dim + 1 {
                return Err(GridError::WrongNodeCount {
                    cell: cell_idx,
                    expected: dim + 1,
                    actual: cell.len(),
                });
            }
            check_node_indices(cell, nodes.len())?;

            let mut faces = Vec::with_capacity(dim + 1);
            for skipped in 0..=dim {
                let key: Vec<usize> = cell
                    .iter()
                    .enumerate()
                    .filter(|(local_idx, _)| *local_idx != skipped)
                    .map(|(_, &node)| node)
                    .sorted_unstable()
                    .collect();
                let face = match face_lookup.get(&key) {
                    Some(&face) => face,
                    None => {
                        let face = face_nodes.len();
                        face_lookup.insert(key.clone(), face);
                        face_nodes.push(key);
                        face
                    }
                };
                faces.push(face);
            }
            cell_faces.push(faces);
        }

        Self::from_topology(dim, nodes, face_nodes, cell_faces, None)
    }

    /// Creates a grid from explicit polytopal topology.
    ///
    /// `cell_faces[c]` lists `(face, sign)` pairs for cell `c`, where `sign` is `1` if the face
    /// normal computed for the face should point out of the cell. Since the computed face normal
    /// direction is an implementation detail, callers that do not know it can pass `None` as
    /// sign for every face to have the orientation derived from the geometry instead.
    pub fn from_cell_faces(
        dim: usize,
        nodes: Vec<Point3<T>>,
        face_nodes: Vec<Vec<usize>>,
        cell_faces: Vec<Vec<(usize, Option<T>)>>,
    ) -> Result<Self, GridError> {
        if !(1..=3).contains(&dim) {
            return Err(GridError::UnsupportedDimension(dim));
        }
        for face in &face_nodes {
            check_node_indices(face, nodes.len())?;
        }

        let mut faces = Vec::with_capacity(cell_faces.len());
        let mut signs = Vec::with_capacity(cell_faces.len());
        for (cell_idx, cell) in cell_faces.into_iter().enumerate() {
            let (cell_face_indices, cell_signs): (Vec<_>, Vec<_>) = cell.into_iter().unzip();
            for (&face, sign) in cell_face_indices.iter().zip(&cell_signs) {
                if face >= face_nodes.len() {
                    return Err(GridError::FaceIndexOutOfBounds {
                        index: face,
                        num_faces: face_nodes.len(),
                    });
                }
                if let Some(sign) = sign {
                    if *sign != T::one() && *sign != -T::one() {
                        return Err(GridError::InvalidOrientation { cell: cell_idx, face });
                    }
                }
            }
            faces.push(cell_face_indices);
            signs.push(cell_signs);
        }

        let face_nodes = face_nodes
            .into_iter()
            .map(|nodes| nodes.into_iter().sorted_unstable().collect())
            .collect();
        Self::from_topology(dim, nodes, face_nodes, faces, Some(signs))
    }

    fn from_topology(
        dim: usize,
        nodes: Vec<Point3<T>>,
        face_nodes: Vec<Vec<usize>>,
        cell_faces: Vec<Vec<usize>>,
        signs: Option<Vec<Vec<Option<T>>>>,
    ) -> Result<Self, GridError> {
        let num_faces = face_nodes.len();
        let num_cells = cell_faces.len();

        let face_node_pattern = {
            let offsets = std::iter::once(0)
                .chain(face_nodes.iter().scan(0, |offset, nodes| {
                    *offset += nodes.len();
                    Some(*offset)
                }))
                .collect();
            let indices = face_nodes.iter().flatten().copied().collect();
            SparsityPattern::try_from_offsets_and_indices(num_faces, nodes.len(), offsets, indices)
                .map_err(|err| GridError::InvalidIncidence(err.to_string()))?
        };

        let face_centers: Vec<_> = face_nodes.iter().map(|face| centroid(&nodes, face)).collect();
        let cell_nodes: Vec<Vec<usize>> = cell_faces
            .iter()
            .map(|faces| {
                faces
                    .iter()
                    .flat_map(|&face| face_nodes[face].iter().copied())
                    .sorted_unstable()
                    .dedup()
                    .collect()
            })
            .collect();
        let cell_centers: Vec<_> = cell_nodes.iter().map(|cell| centroid(&nodes, cell)).collect();

        let face_normals = compute_face_normals(dim, &nodes, &face_nodes, &cell_nodes)?;
        let face_areas: Vec<_> = face_normals.iter().map(|n| n.norm()).collect();

        // Orientation and volumes
        let dim_as_t = T::from_usize(dim).expect("Dimension must fit in T");
        let mut col_offsets = Vec::with_capacity(num_cells + 1);
        let mut row_indices = Vec::new();
        let mut values = Vec::new();
        let mut cell_volumes = Vec::with_capacity(num_cells);
        col_offsets.push(0);
        for (cell_idx, faces) in cell_faces.iter().enumerate() {
            let center = &cell_centers[cell_idx];
            let mut entries = Vec::with_capacity(faces.len());
            let mut volume = T::zero();
            for (local_idx, &face) in faces.iter().enumerate() {
                let offset = face_centers[face] - center;
                let projection = offset.dot(&face_normals[face]);
                volume += projection.abs() / dim_as_t;

                let given_sign = signs.as_ref().and_then(|signs| signs[cell_idx][local_idx]);
                let sign = given_sign.unwrap_or_else(|| {
                    if projection > T::zero() {
                        T::one()
                    } else {
                        -T::one()
                    }
                });
                entries.push((face, sign));
            }
            entries.sort_unstable_by_key(|(face, _)| *face);
            row_indices.extend(entries.iter().map(|(face, _)| *face));
            values.extend(entries.iter().map(|(_, sign)| *sign));
            col_offsets.push(row_indices.len());
            cell_volumes.push(volume);
        }
        let cell_faces = CscMatrix::try_from_csc_data(num_faces, num_cells, col_offsets, row_indices, values)
            .map_err(|err| GridError::InvalidIncidence(err.to_string()))?;

        Ok(Self {
            dim,
            nodes,
            face_nodes: face_node_pattern,
            cell_faces,
            face_areas,
            face_normals,
            face_centers,
            cell_volumes,
            cell_centers,
        })
    }
}

fn check_node_indices(indices: &[usize], num_nodes: usize) -> Result<(), GridError> {
    match indices.iter().find(|&&index| index >= num_nodes) {
        Some(&index) => Err(GridError::NodeIndexOutOfBounds { index, num_nodes }),
        None => Ok(()),
    }
}

fn centroid<T: Real>(nodes: &[Point3<T>], indices: &[usize]) -> Point3<T> {
    let sum = indices
        .iter()
        .fold(Vector3::zeros(), |sum, &index| sum + nodes[index].coords);
    let count = T::from_usize(indices.len().max(1)).expect("Node count must fit in T");
    Point3::from(sum / count)
}

/// Length of the diagonal of the axis-aligned bounding box of the points.
fn extent<T: Real>(points: &[Point3<T>]) -> T {
    let first = match points.first() {
        Some(p) => p.coords,
        None => return T::zero(),
    };
    let (min, max) = points
        .iter()
        .fold((first, first), |(min, max), p| (min.inf(&p.coords), max.sup(&p.coords)));
    (max - min).norm()
}

/// Unit normal of the plane best spanned by the given points, if they span a plane.
///
/// Points are considered collinear if the largest cross product is negligible relative to the
/// squared extent of the points.
#[replace_float_literals(T::from_f64(literal).unwrap())]
pub(crate) fn plane_normal<T: Real>(points: &[Point3<T>]) -> Option<Vector3<T>> {
    let p0 = points.first()?;
    let scale = extent(points);
    points
        .iter()
        .tuple_combinations()
        .map(|(a, b)| (a - p0).cross(&(b - p0)))
        .max_by(|a, b| {
            a.norm_squared()
                .partial_cmp(&b.norm_squared())
                .unwrap_or(std::cmp::Ordering::Equal)
        })
        .and_then(|n| n.try_normalize(1e-12 * scale * scale))
}

/// Area-weighted normal of a planar, convex polygon with nodes in arbitrary order.
#[replace_float_literals(T::from_f64(literal).unwrap())]
fn polygon_area_normal<T: Real>(points: &[Point3<T>]) -> Option<Vector3<T>> {
    let n = plane_normal(points)?;
    let center = Point3::from(points.iter().fold(Vector3::zeros(), |sum, p| sum + p.coords) / T::from_usize(points.len())?);
    let e1 = (points[0] - center).try_normalize(1e-12 * extent(points))?;
    let e2 = n.cross(&e1);
    let ordered: Vec<_> = points
        .iter()
        .map(|p| {
            let d = p - center;
            (d.dot(&e2).atan2(d.dot(&e1)), d)
        })
        .sorted_by(|(a, _), (b, _)| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal))
        .map(|(_, d)| d)
        .collect();

    let area_normal = ordered
        .iter()
        .circular_tuple_windows()
        .fold(Vector3::zeros(), |sum, (a, b)| sum + a.cross(b) * 0.5);
    Some(area_normal)
}

#[replace_float_literals(T::from_f64(literal).unwrap())]
fn compute_face_normals<T: Real>(
    dim: usize,
    nodes: &[Point3<T>],
    face_nodes: &[Vec<usize>],
    cell_nodes: &[Vec<usize>],
) -> Result<Vec<Vector3<T>>, GridError> {
    let points = |indices: &[usize]| indices.iter().map(|&i| nodes[i]).collect::<Vec<_>>();
    match dim {
        1 => {
            // All faces share the tangent of the (straight) grid line
            let first_cell = match cell_nodes.first() {
                Some(cell) => cell,
                // Without cells there is no line or plane to orient the faces in
                None => return Ok(vec![Vector3::zeros(); face_nodes.len()]),
            };
            let (a, b) = match first_cell.as_slice() {
                [a, b] => (*a, *b),
                _ => return Err(GridError::DegenerateEntity("1D cell without two nodes".to_string())),
            };
            let tangent = (nodes[b] - nodes[a])
                .try_normalize(1e-12 * extent(nodes))
                .ok_or_else(|| GridError::DegenerateEntity("1D cell of zero length".to_string()))?;
            Ok(vec![tangent; face_nodes.len()])
        }
        2 => {
            // All face normals are rotated within the plane of the first cell
            let first_cell = match cell_nodes.first() {
                Some(cell) => cell,
                // Without cells there is no line or plane to orient the faces in
                None => return Ok(vec![Vector3::zeros(); face_nodes.len()]),
            };
            let plane_normal = plane_normal(&points(first_cell))
                .ok_or_else(|| GridError::DegenerateEntity("2D cell does not span a plane".to_string()))?;
            face_nodes
                .iter()
                .map(|face| match face.as_slice() {
                    [a, b] => Ok((nodes[*b] - nodes[*a]).cross(&plane_normal)),
                    _ => Err(GridError::DegenerateEntity(format!(
                        "2D face with {} nodes",
                        face.len()
                    ))),
                })
                .collect()
        }
        3 => face_nodes
            .iter()
            .map(|face| {
                polygon_area_normal(&points(face))
                    .ok_or_else(|| GridError::DegenerateEntity(format!("3D face with nodes {:?}", face)))
            })
            .collect(),
        _ => Err(GridError::UnsupportedDimension(dim)),
    }
}
