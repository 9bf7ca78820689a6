use crate::foundation::core::Region;
use crate::foundation::error::{RestorableError, RestorableResult};

/// Floats per interleaved vertex: destination x/y, source x/y, color scale r/g/b/a.
pub const VERTEX_FLOAT_COUNT: usize = 8;

/// Unpacked view of one interleaved vertex.
#[derive(Clone, Copy, Debug, PartialEq)]
pub(crate) struct Vertex {
    pub(crate) dst: [f32; 2],
    pub(crate) src: [f32; 2],
    pub(crate) color: [f32; 4],
}

pub(crate) fn vertex_at(vertices: &[f32], i: usize) -> Vertex {
    let v = &vertices[i * VERTEX_FLOAT_COUNT..(i + 1) * VERTEX_FLOAT_COUNT];
    Vertex {
        dst: [v[0], v[1]],
        src: [v[2], v[3]],
        color: [v[4], v[5], v[6], v[7]],
    }
}

/// Indices for the two triangles of a quad built by [`quad_vertices`].
pub fn quad_indices() -> [u32; 6] {
    [0, 1, 2, 1, 2, 3]
}

/// Vertices mapping `src` (in source slot 0 texels) onto `dst` (in destination pixels).
pub fn quad_vertices(dst: Region, src: Region, color: [f32; 4]) -> Vec<f32> {
    let (dx0, dy0) = (dst.x as f32, dst.y as f32);
    let (dx1, dy1) = (dst.right() as f32, dst.bottom() as f32);
    let (sx0, sy0) = (src.x as f32, src.y as f32);
    let (sx1, sy1) = (src.right() as f32, src.bottom() as f32);
    let [r, g, b, a] = color;
    vec![
        dx0, dy0, sx0, sy0, r, g, b, a, //
        dx1, dy0, sx1, sy0, r, g, b, a, //
        dx0, dy1, sx0, sy1, r, g, b, a, //
        dx1, dy1, sx1, sy1, r, g, b, a,
    ]
}

/// Check the shape of a vertex/index buffer pair.
///
/// Vertices must be whole, finite records and every index must name an existing vertex of a
/// complete triangle.
pub(crate) fn validate_mesh(vertices: &[f32], indices: &[u32]) -> RestorableResult<()> {
    if !vertices.len().is_multiple_of(VERTEX_FLOAT_COUNT) {
        return Err(RestorableError::bounds(format!(
            "vertex buffer length {} is not a multiple of {VERTEX_FLOAT_COUNT}",
            vertices.len()
        )));
    }
    if !indices.len().is_multiple_of(3) {
        return Err(RestorableError::bounds(format!(
            "index buffer length {} is not a multiple of 3",
            indices.len()
        )));
    }
    if let Some(bad) = vertices.iter().position(|v| !v.is_finite()) {
        return Err(RestorableError::bounds(format!(
            "vertex component {bad} is not finite"
        )));
    }
    let count = vertices.len() / VERTEX_FLOAT_COUNT;
    if let Some(&bad) = indices.iter().find(|&&i| i as usize >= count) {
        return Err(RestorableError::bounds(format!(
            "index {bad} out of range for {count} vertices"
        )));
    }
    Ok(())
}

/// Check that every source coordinate lies inside `region` (edges included).
pub(crate) fn validate_source_coords(vertices: &[f32], region: Region) -> RestorableResult<()> {
    let (x0, y0) = (region.x as f32, region.y as f32);
    let (x1, y1) = (region.right() as f32, region.bottom() as f32);
    for (i, v) in vertices.chunks_exact(VERTEX_FLOAT_COUNT).enumerate() {
        let (sx, sy) = (v[2], v[3]);
        if sx < x0 || sy < y0 || sx > x1 || sy > y1 {
            return Err(RestorableError::bounds(format!(
                "vertex {i} samples ({sx}, {sy}) outside source region {region:?}"
            )));
        }
    }
    Ok(())
}

#[cfg(test)]
#[path = "../../tests/unit/graphics/geometry.rs"]
mod tests;
