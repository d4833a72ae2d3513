//! Compaction of clipped buffers into a fresh mesh.

use crate::error::{ClipError, Result};
use crate::math::{Vec2, Vec3};
use crate::mesh::Mesh;

/// Builds a compact mesh from the kept vertex indices and the emitted
/// triangles.
///
/// Output vertex `i` is `positions[kept[i]]` (and likewise for UVs).
/// Triangle indices are remapped through the same table; an index that was
/// not kept is an [`ClipError::InconsistentRemap`]. Normals, tangents and
/// bounds of the result are recomputed.
pub fn rebuild(
    kept: &[u32],
    positions: &[Vec3],
    uvs: Option<&[Vec2]>,
    triangles: &[[u32; 3]],
) -> Result<Mesh> {
    let mut remap: Vec<Option<u32>> = vec![None; positions.len()];
    let mut new_positions = Vec::with_capacity(kept.len());
    let mut new_uvs = uvs.map(|_| Vec::with_capacity(kept.len()));

    for &old in kept {
        let position = positions
            .get(old as usize)
            .ok_or(ClipError::InconsistentRemap { index: old })?;
        if let (Some(source), Some(out)) = (uvs, new_uvs.as_mut()) {
            let uv = source
                .get(old as usize)
                .ok_or(ClipError::InconsistentRemap { index: old })?;
            out.push(*uv);
        }
        remap[old as usize] = Some(new_positions.len() as u32);
        new_positions.push(*position);
    }

    let mut indices = Vec::with_capacity(triangles.len() * 3);
    for triangle in triangles {
        for &old in triangle {
            let new = remap
                .get(old as usize)
                .copied()
                .flatten()
                .ok_or(ClipError::InconsistentRemap { index: old })?;
            indices.push(new);
        }
    }

    let mut mesh = Mesh::new(new_positions, indices)?;
    if let Some(uvs) = new_uvs {
        mesh = mesh.with_uvs(uvs)?;
    }
    mesh.recalculate();
    Ok(mesh)
}
