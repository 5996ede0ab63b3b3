use std::{fs, path::Path};

use log::debug;
use thiserror::Error;

use crate::geometry::{Triangle, WorldPoint};

/// Vertex list plus triangle index triples, the shape every mesh parser in
/// front of this core is expected to produce. Indices are zero-based.
#[derive(Clone, Debug, Default)]
pub struct MeshData {
    pub vertices: Vec<WorldPoint>,
    pub indices: Vec<[u32; 3]>,
}

#[derive(Debug, Error)]
pub enum MeshLoadError {
    #[error("failed to read file: {0}")]
    Read(#[from] std::io::Error),

    #[error("failed to parse file: {0}")]
    Parse(#[from] wavefront_obj::ParseError),

    #[error("triangle references vertex {index} but only {vertex_count} vertices exist")]
    IndexOutOfRange { index: u32, vertex_count: usize },

    #[error("geometry stream contains no triangles")]
    NoTriangles,
}

impl MeshData {
    pub fn from_obj_file(path: impl AsRef<Path>) -> Result<MeshData, MeshLoadError> {
        let content = fs::read_to_string(path)?;
        Self::from_obj_str(&content)
    }

    pub fn from_obj_str(content: &str) -> Result<MeshData, MeshLoadError> {
        let parsed = wavefront_obj::obj::parse(content)?;

        let mut mesh = MeshData::default();
        for object in parsed.objects {
            let base = mesh.vertices.len() as u32;
            mesh.vertices.extend(
                object
                    .vertices
                    .iter()
                    .map(|v| WorldPoint::new(v.x as f32, v.y as f32, v.z as f32)),
            );
            for geometry in object.geometry {
                for shape in geometry.shapes {
                    let wavefront_obj::obj::Primitive::Triangle(a, b, c) = shape.primitive else {
                        debug!("skipping non-triangle primitive");
                        continue;
                    };
                    mesh.indices
                        .push([base + a.0 as u32, base + b.0 as u32, base + c.0 as u32]);
                }
            }
        }

        mesh.validate()?;
        Ok(mesh)
    }

    fn validate(&self) -> Result<(), MeshLoadError> {
        if self.indices.is_empty() {
            return Err(MeshLoadError::NoTriangles);
        }
        let vertex_count = self.vertices.len();
        for triple in &self.indices {
            for &index in triple {
                if index as usize >= vertex_count {
                    return Err(MeshLoadError::IndexOutOfRange {
                        index,
                        vertex_count,
                    });
                }
            }
        }
        Ok(())
    }

    /// Resolves the index triples into owned triangles, in stream order.
    pub fn triangle_list(&self) -> Vec<Triangle> {
        self.indices
            .iter()
            .map(|[a, b, c]| {
                Triangle::new(
                    self.vertices[*a as usize],
                    self.vertices[*b as usize],
                    self.vertices[*c as usize],
                )
            })
            .collect()
    }
}
