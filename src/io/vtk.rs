//! Export of grids and cell fields to legacy VTK files.
use eyre::{bail, eyre};
use mixdim_geometry::Grid;
use nalgebra::Matrix3xX;
use std::convert::TryFrom;
use std::path::Path;
use vtkio::model::{
    Attribute, Attributes, ByteOrder, CellType, Cells, DataArrayBase, DataSet, ElementType, UnstructuredGridPiece,
    Version, VertexNumbers, Vtk,
};
use vtkio::IOBuffer;

/// Builds an unstructured VTK data set from a simplicial grid, optionally with cell fields such
/// as pressures and reconstructed velocities.
pub struct GridDataSetBuilder<'a> {
    grid: &'a Grid<f64>,
    cell_attributes: Vec<(String, CellField)>,

    // Only used for exporting directly to file
    title: Option<String>,
}

enum CellField {
    Scalars(Vec<f64>),
    Vectors(Vec<f64>),
}

impl<'a> GridDataSetBuilder<'a> {
    pub fn from_grid(grid: &'a Grid<f64>) -> Self {
        Self {
            grid,
            cell_attributes: Vec::new(),
            title: None,
        }
    }

    pub fn with_title(self, title: impl Into<String>) -> Self {
        Self {
            title: Some(title.into()),
            ..self
        }
    }

    /// Adds a scalar field with one value per cell, e.g. the pressure.
    pub fn with_cell_scalar_attributes(mut self, name: impl Into<String>, values: &[f64]) -> Self {
        self.cell_attributes
            .push((name.into(), CellField::Scalars(values.to_vec())));
        self
    }

    /// Adds a vector field with one column per cell, e.g. the output of `Rt0::project_flux`.
    pub fn with_cell_vector_attributes(mut self, name: impl Into<String>, vectors: &Matrix3xX<f64>) -> Self {
        self.cell_attributes
            .push((name.into(), CellField::Vectors(vectors.as_slice().to_vec())));
        self
    }

    pub fn try_build(&self) -> eyre::Result<DataSet> {
        let grid = self.grid;
        let points = grid
            .nodes()
            .iter()
            .flat_map(|p| p.coords.iter().copied())
            .collect::<Vec<_>>();

        // Vertices is laid out as follows: N, i_1, i_2, ... i_N
        let mut vertices = Vec::new();
        let mut types = Vec::with_capacity(grid.num_cells());
        for cell in 0..grid.num_cells() {
            let nodes = grid.cell_nodes(cell);
            let cell_type = match (grid.dim(), nodes.len()) {
                (0, 1) => CellType::Vertex,
                (1, 2) => CellType::Line,
                (2, 3) => CellType::Triangle,
                (3, 4) => CellType::Tetra,
                (dim, num_nodes) => bail!(
                    "Cell {} with {} nodes in a {}D grid is not a simplex",
                    cell,
                    num_nodes,
                    dim
                ),
            };
            vertices.push(u32::try_from(nodes.len())?);
            for node in nodes {
                vertices.push(u32::try_from(node)?);
            }
            types.push(cell_type);
        }

        let mut cell_data = Vec::with_capacity(self.cell_attributes.len());
        for (name, field) in &self.cell_attributes {
            let (elem, values, num_comp) = match field {
                CellField::Scalars(values) => (
                    ElementType::Scalars {
                        num_comp: 1,
                        lookup_table: None,
                    },
                    values,
                    1,
                ),
                CellField::Vectors(values) => (ElementType::Vectors, values, 3),
            };
            if values.len() != num_comp * grid.num_cells() {
                bail!(
                    "Cell attribute {} has {} values, expected {} per cell for {} cells",
                    name,
                    values.len(),
                    num_comp,
                    grid.num_cells()
                );
            }
            cell_data.push(Attribute::DataArray(DataArrayBase {
                name: name.clone(),
                elem,
                data: IOBuffer::F64(values.clone()),
            }));
        }

        let piece = UnstructuredGridPiece {
            points: points.into(),
            cells: Cells {
                cell_verts: VertexNumbers::Legacy {
                    num_cells: u32::try_from(grid.num_cells())?,
                    vertices,
                },
                types,
            },
            data: Attributes {
                point: Vec::new(),
                cell: cell_data,
            },
        };
        Ok(DataSet::inline(piece))
    }

    /// Convenience function for directly exporting the dataset to a file.
    pub fn try_export(&self, filename: impl AsRef<Path>) -> eyre::Result<()> {
        let filepath = filename.as_ref();
        let fallback_title = filepath
            .file_stem()
            .map(|os_str| os_str.to_string_lossy().to_string())
            .unwrap_or_else(|| "untitled".to_string());
        if let Some(dir) = filepath.parent() {
            std::fs::create_dir_all(dir)?;
        }
        Vtk {
            version: Version { major: 4, minor: 1 },
            // If we don't have a title then just make the filepath the title
            title: self.title.clone().unwrap_or(fallback_title),
            byte_order: ByteOrder::BigEndian,
            data: self.try_build()?,
            file_path: None,
        }
        .export(filepath)
        .map_err(|err| eyre!("Failed to export VTK file {}: {:?}", filepath.display(), err))
    }
}
