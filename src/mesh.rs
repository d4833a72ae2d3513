//! Triangle mesh: positions, optional texture coordinates, and an index
//! buffer grouped in triples.
//!
//! Derived data (normals, tangents, bounds) is cached on the mesh and
//! refreshed with [`Mesh::recalculate`].

use std::io::Write;
use std::path::Path;

use crate::error::MeshError;
use crate::math::{Aabb, Vec2, Vec3, Vec4};

pub const CUBE_VERTEX_COUNT: usize = 8;
pub const CUBE_TRIANGLE_COUNT: usize = 12;

/// Unit cube corners (edge length 2, centered on the origin).
pub const CUBE_VERTICES: [Vec3; CUBE_VERTEX_COUNT] = [
    Vec3::new(-1.0, -1.0, -1.0),
    Vec3::new(-1.0, 1.0, -1.0),
    Vec3::new(1.0, 1.0, -1.0),
    Vec3::new(1.0, -1.0, -1.0),
    Vec3::new(1.0, 1.0, 1.0),
    Vec3::new(1.0, -1.0, 1.0),
    Vec3::new(-1.0, 1.0, 1.0),
    Vec3::new(-1.0, -1.0, 1.0),
];

/// Cube triangles; `(b - a) × (c - a)` points out of the cube.
pub const CUBE_TRIANGLES: [[u32; 3]; CUBE_TRIANGLE_COUNT] = [
    // Front face (z = -1)
    [0, 1, 2],
    [0, 2, 3],
    // Right face (x = +1)
    [3, 2, 4],
    [3, 4, 5],
    // Back face (z = +1)
    [5, 4, 6],
    [5, 6, 7],
    // Left face (x = -1)
    [7, 6, 1],
    [7, 1, 0],
    // Top face (y = +1)
    [1, 6, 4],
    [1, 4, 2],
    // Bottom face (y = -1)
    [5, 7, 0],
    [5, 0, 3],
];

/// Running attribute counts while several meshes are written to one OBJ file.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ObjCursor {
    pub positions: u32,
    pub uvs: u32,
    pub normals: u32,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct Mesh {
    positions: Vec<Vec3>,
    uvs: Option<Vec<Vec2>>,
    indices: Vec<u32>,
    normals: Vec<Vec3>,
    tangents: Option<Vec<Vec4>>,
    bounds: Option<Aabb>,
}

impl Mesh {
    /// Creates a mesh, checking that the index buffer holds whole triangles
    /// and that every index refers to an existing vertex.
    pub fn new(positions: Vec<Vec3>, indices: Vec<u32>) -> Result<Self, MeshError> {
        if indices.len() % 3 != 0 {
            return Err(MeshError::IndexCountNotMultipleOfThree(indices.len()));
        }
        if let Some(&index) = indices.iter().find(|&&i| i as usize >= positions.len()) {
            return Err(MeshError::IndexOutOfRange {
                index,
                vertex_count: positions.len(),
            });
        }

        let bounds = Aabb::from_points(&positions);
        Ok(Self {
            positions,
            uvs: None,
            indices,
            normals: Vec::new(),
            tangents: None,
            bounds,
        })
    }

    /// Builds a mesh from triangle triples.
    pub fn from_triangles(positions: Vec<Vec3>, triangles: &[[u32; 3]]) -> Result<Self, MeshError> {
        Self::new(positions, triangles.iter().flatten().copied().collect())
    }

    /// Attaches one texture coordinate per vertex.
    pub fn with_uvs(mut self, uvs: Vec<Vec2>) -> Result<Self, MeshError> {
        if uvs.len() != self.positions.len() {
            return Err(MeshError::UvCountMismatch {
                uvs: uvs.len(),
                vertices: self.positions.len(),
            });
        }
        self.uvs = Some(uvs);
        Ok(self)
    }

    /// Axis-aligned cube with the given half edge length, centered on the origin.
    pub fn cube(half_extent: f32) -> Self {
        let positions = CUBE_VERTICES.iter().map(|&v| v * half_extent).collect();
        let indices = CUBE_TRIANGLES.iter().flatten().copied().collect();
        let mut mesh = Self {
            positions,
            indices,
            ..Self::default()
        };
        mesh.recalculate();
        mesh
    }

    /// Loads the first mesh of an OBJ file.
    pub fn from_obj<P: AsRef<Path>>(path: P) -> Result<Self, MeshError> {
        Self::load_all_from_obj(path)?
            .into_iter()
            .next()
            .map(|(_, mesh)| mesh)
            .ok_or(MeshError::NoMeshes)
    }

    /// Loads every object/group of an OBJ file as a named mesh.
    ///
    /// Faces are triangulated and attributes are unified to a single index
    /// buffer. Texture coordinates are kept when present for every vertex.
    pub fn load_all_from_obj<P: AsRef<Path>>(path: P) -> Result<Vec<(String, Self)>, MeshError> {
        let options = tobj::LoadOptions {
            single_index: true,
            triangulate: true,
            ..Default::default()
        };
        let (models, _materials) = tobj::load_obj(path.as_ref(), &options)?;

        models
            .into_iter()
            .map(|model| {
                let source = model.mesh;
                let positions: Vec<Vec3> = source
                    .positions
                    .chunks_exact(3)
                    .map(|p| Vec3::new(p[0], p[1], p[2]))
                    .collect();
                let vertex_count = positions.len();

                let mut mesh = Self::new(positions, source.indices)?;
                if source.texcoords.len() == vertex_count * 2 && vertex_count > 0 {
                    let uvs = source
                        .texcoords
                        .chunks_exact(2)
                        .map(|t| Vec2::new(t[0], t[1]))
                        .collect();
                    mesh = mesh.with_uvs(uvs)?;
                }
                mesh.recalculate();
                Ok((model.name, mesh))
            })
            .collect()
    }

    /// Writes the mesh as Wavefront OBJ text (positions, texture coordinates
    /// and normals when present, 1-based faces).
    pub fn write_obj<W: Write>(&self, out: &mut W) -> std::io::Result<()> {
        self.write_obj_object(out, None, &mut ObjCursor::default())
    }

    /// Writes the mesh as one object of a multi-object OBJ file. Face
    /// indices are offset by `cursor`, which is advanced past this mesh.
    pub fn write_obj_object<W: Write>(
        &self,
        out: &mut W,
        name: Option<&str>,
        cursor: &mut ObjCursor,
    ) -> std::io::Result<()> {
        if let Some(name) = name {
            writeln!(out, "o {name}")?;
        }
        for p in &self.positions {
            writeln!(out, "v {} {} {}", p.x, p.y, p.z)?;
        }
        if let Some(uvs) = &self.uvs {
            for uv in uvs {
                writeln!(out, "vt {} {}", uv.x, uv.y)?;
            }
        }
        let has_normals = self.normals.len() == self.positions.len();
        if has_normals {
            for n in &self.normals {
                writeln!(out, "vn {} {} {}", n.x, n.y, n.z)?;
            }
        }

        for triangle in self.triangles() {
            write!(out, "f")?;
            for index in triangle {
                let v = cursor.positions + index + 1;
                let t = cursor.uvs + index + 1;
                let n = cursor.normals + index + 1;
                match (self.uvs.is_some(), has_normals) {
                    (true, true) => write!(out, " {v}/{t}/{n}")?,
                    (true, false) => write!(out, " {v}/{t}")?,
                    (false, true) => write!(out, " {v}//{n}")?,
                    (false, false) => write!(out, " {v}")?,
                }
            }
            writeln!(out)?;
        }

        let count = self.positions.len() as u32;
        cursor.positions += count;
        if self.uvs.is_some() {
            cursor.uvs += count;
        }
        if has_normals {
            cursor.normals += count;
        }
        Ok(())
    }

    pub fn positions(&self) -> &[Vec3] {
        &self.positions
    }

    pub fn uvs(&self) -> Option<&[Vec2]> {
        self.uvs.as_deref()
    }

    pub fn indices(&self) -> &[u32] {
        &self.indices
    }

    /// Iterates the index buffer as triangles.
    pub fn triangles(&self) -> impl Iterator<Item = [u32; 3]> + '_ {
        self.indices
            .chunks_exact(3)
            .map(|t| [t[0], t[1], t[2]])
    }

    pub fn vertex_count(&self) -> usize {
        self.positions.len()
    }

    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    /// True when the mesh has no triangles.
    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }

    /// Per-vertex normals; empty until [`Mesh::recalculate`] runs.
    pub fn normals(&self) -> &[Vec3] {
        &self.normals
    }

    /// Per-vertex tangents with handedness in `w`; only for meshes with UVs.
    pub fn tangents(&self) -> Option<&[Vec4]> {
        self.tangents.as_deref()
    }

    pub fn bounds(&self) -> Option<Aabb> {
        self.bounds
    }

    /// Refreshes bounds, normals and (when UVs exist) tangents.
    pub fn recalculate(&mut self) {
        self.bounds = Aabb::from_points(&self.positions);
        self.recalculate_normals();
        self.recalculate_tangents();
    }

    /// Area-weighted vertex normals. Vertices used by no triangle, or only by
    /// degenerate ones, get a zero normal.
    pub fn recalculate_normals(&mut self) {
        let mut normals = vec![Vec3::ZERO; self.positions.len()];
        for [a, b, c] in self.triangles() {
            let (pa, pb, pc) = self.corners([a, b, c]);
            let face = (pb - pa).cross(pc - pa);
            for i in [a, b, c] {
                normals[i as usize] += face;
            }
        }
        for n in normals.iter_mut() {
            *n = n.try_normalize(f32::EPSILON).unwrap_or(Vec3::ZERO);
        }
        self.normals = normals;
    }

    /// Per-vertex tangents from UV gradients, orthogonalized against the
    /// vertex normal. Requires up-to-date normals.
    pub fn recalculate_tangents(&mut self) {
        let Some(uvs) = &self.uvs else {
            self.tangents = None;
            return;
        };

        let count = self.positions.len();
        let mut tan_u = vec![Vec3::ZERO; count];
        let mut tan_v = vec![Vec3::ZERO; count];
        for [a, b, c] in self.triangles() {
            let (pa, pb, pc) = self.corners([a, b, c]);
            let (ua, ub, uc) = (uvs[a as usize], uvs[b as usize], uvs[c as usize]);
            let (e1, e2) = (pb - pa, pc - pa);
            let (d1, d2) = (ub - ua, uc - ua);
            let r = d1.x * d2.y - d2.x * d1.y;
            if r.abs() <= f32::EPSILON {
                continue;
            }
            let sdir = (e1 * d2.y - e2 * d1.y) / r;
            let tdir = (e2 * d1.x - e1 * d2.x) / r;
            for i in [a, b, c] {
                tan_u[i as usize] += sdir;
                tan_v[i as usize] += tdir;
            }
        }

        let tangents = (0..count)
            .map(|i| {
                let n = self.normals.get(i).copied().unwrap_or(Vec3::ZERO);
                let t = tan_u[i];
                let tangent = (t - n * n.dot(t))
                    .try_normalize(f32::EPSILON)
                    .unwrap_or(Vec3::ZERO);
                let handedness = if n.cross(t).dot(tan_v[i]) < 0.0 { -1.0 } else { 1.0 };
                Vec4::from_vec3(tangent, handedness)
            })
            .collect();
        self.tangents = Some(tangents);
    }

    fn corners(&self, [a, b, c]: [u32; 3]) -> (Vec3, Vec3, Vec3) {
        (
            self.positions[a as usize],
            self.positions[b as usize],
            self.positions[c as usize],
        )
    }
}
