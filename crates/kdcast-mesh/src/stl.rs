//! Binary STL reading and writing.
//!
//! Standard binary STL layout: an 80-byte header, a `u32` triangle count,
//! then one 50-byte record per triangle (facet normal as 3 f32, three
//! vertices as 3 f32 each, `u16` attribute). All values little-endian.

use std::collections::HashMap;
use std::fs;
use std::path::Path;

use kdcast_math::Point3f;

use crate::{MeshError, Result, TriangleMesh};

const HEADER_LEN: usize = 80;
const RECORD_LEN: usize = 50;

/// Load a binary STL file into a deduplicated indexed mesh.
pub fn load_stl(path: impl AsRef<Path>) -> Result<TriangleMesh> {
    let bytes = fs::read(path)?;
    parse_stl(&bytes)
}

/// Parse binary STL data into a deduplicated indexed mesh.
///
/// Vertices that are equal bit for bit are merged into a single mesh
/// vertex. The facet normal and attribute fields are ignored; normals are
/// recomputed from vertex positions where needed. Non-finite vertex
/// coordinates are rejected by the mesh constructor.
pub fn parse_stl(bytes: &[u8]) -> Result<TriangleMesh> {
    if bytes.len() < HEADER_LEN + 4 {
        return Err(MeshError::Truncated {
            expected: HEADER_LEN + 4,
            found: bytes.len(),
        });
    }

    let count = read_u32(bytes, HEADER_LEN) as usize;
    let expected = HEADER_LEN + 4 + count * RECORD_LEN;
    if bytes.len() < expected {
        return Err(MeshError::Truncated {
            expected,
            found: bytes.len(),
        });
    }

    let mut vertices: Vec<Point3f> = Vec::new();
    let mut triangles: Vec<[u32; 3]> = Vec::with_capacity(count);
    let mut dedup: HashMap<[u32; 3], u32> = HashMap::new();

    for i in 0..count {
        let record = HEADER_LEN + 4 + i * RECORD_LEN;
        let mut tri = [0u32; 3];
        for (corner, slot) in tri.iter_mut().enumerate() {
            // The 12-byte facet normal precedes the vertices.
            let offset = record + 12 + corner * 12;
            let bits = [
                read_u32(bytes, offset),
                read_u32(bytes, offset + 4),
                read_u32(bytes, offset + 8),
            ];
            *slot = *dedup.entry(bits).or_insert_with(|| {
                vertices.push(Point3f::new(
                    f32::from_bits(bits[0]),
                    f32::from_bits(bits[1]),
                    f32::from_bits(bits[2]),
                ));
                (vertices.len() - 1) as u32
            });
        }
        triangles.push(tri);
    }

    TriangleMesh::new(vertices, triangles)
}

/// Serialize a mesh as binary STL bytes.
///
/// Facet normals are recomputed from the vertex winding; degenerate
/// triangles get a (0, 0, 1) placeholder normal.
pub fn stl_bytes(mesh: &TriangleMesh) -> Vec<u8> {
    let count = mesh.triangle_count();
    let mut data = Vec::with_capacity(HEADER_LEN + 4 + count * RECORD_LEN);

    let mut header = [0u8; HEADER_LEN];
    let tag = b"kdcast STL export";
    header[..tag.len()].copy_from_slice(tag);
    data.extend_from_slice(&header);
    data.extend_from_slice(&(count as u32).to_le_bytes());

    for i in 0..count {
        let [v0, v1, v2] = mesh.triangle(i);

        let e1 = [v1.x - v0.x, v1.y - v0.y, v1.z - v0.z];
        let e2 = [v2.x - v0.x, v2.y - v0.y, v2.z - v0.z];
        let nx = e1[1] * e2[2] - e1[2] * e2[1];
        let ny = e1[2] * e2[0] - e1[0] * e2[2];
        let nz = e1[0] * e2[1] - e1[1] * e2[0];
        let len = (nx * nx + ny * ny + nz * nz).sqrt();
        let (nx, ny, nz) = if len > 1e-10 {
            (nx / len, ny / len, nz / len)
        } else {
            (0.0, 0.0, 1.0)
        };

        data.extend_from_slice(&nx.to_le_bytes());
        data.extend_from_slice(&ny.to_le_bytes());
        data.extend_from_slice(&nz.to_le_bytes());
        for v in [v0, v1, v2] {
            data.extend_from_slice(&v.x.to_le_bytes());
            data.extend_from_slice(&v.y.to_le_bytes());
            data.extend_from_slice(&v.z.to_le_bytes());
        }
        data.extend_from_slice(&0u16.to_le_bytes());
    }

    data
}

fn read_u32(bytes: &[u8], offset: usize) -> u32 {
    u32::from_le_bytes([
        bytes[offset],
        bytes[offset + 1],
        bytes[offset + 2],
        bytes[offset + 3],
    ])
}

#[cfg(test)]
mod tests {
    use super::*;

    fn quad_mesh() -> TriangleMesh {
        let vertices = vec![
            Point3f::new(0.0, 0.0, 0.0),
            Point3f::new(1.0, 0.0, 0.0),
            Point3f::new(0.0, 1.0, 0.0),
            Point3f::new(1.0, 1.0, 0.0),
        ];
        TriangleMesh::new(vertices, vec![[0, 1, 2], [1, 3, 2]]).unwrap()
    }

    #[test]
    fn test_round_trip_deduplicates() {
        let mesh = quad_mesh();
        let bytes = stl_bytes(&mesh);
        assert_eq!(bytes.len(), HEADER_LEN + 4 + 2 * RECORD_LEN);

        // The STL records store 6 corners; dedup recovers the 4 vertices.
        let loaded = parse_stl(&bytes).unwrap();
        assert_eq!(loaded.triangle_count(), 2);
        assert_eq!(loaded.vertex_count(), 4);

        for i in 0..2 {
            let original = mesh.triangle(i);
            let restored = loaded.triangle(i);
            for (a, b) in original.iter().zip(restored.iter()) {
                assert_eq!(a, b);
            }
        }
    }

    #[test]
    fn test_truncated_header() {
        let err = parse_stl(&[0u8; 40]).unwrap_err();
        assert!(matches!(err, MeshError::Truncated { .. }));
    }

    #[test]
    fn test_truncated_body() {
        let mut bytes = stl_bytes(&quad_mesh());
        bytes.truncate(bytes.len() - 1);
        let err = parse_stl(&bytes).unwrap_err();
        assert!(matches!(err, MeshError::Truncated { .. }));
    }

    #[test]
    fn test_nan_vertex_rejected() {
        let mut bytes = stl_bytes(&quad_mesh());
        // Overwrite the x coordinate of the first vertex of triangle 1.
        let offset = HEADER_LEN + 4 + RECORD_LEN + 12;
        bytes[offset..offset + 4].copy_from_slice(&f32::NAN.to_le_bytes());
        let err = parse_stl(&bytes).unwrap_err();
        assert!(matches!(err, MeshError::NonFiniteVertex(1)));
    }

    #[test]
    fn test_empty_mesh_round_trip() {
        let mesh = TriangleMesh::new(Vec::new(), Vec::new()).unwrap();
        let loaded = parse_stl(&stl_bytes(&mesh)).unwrap();
        assert_eq!(loaded.triangle_count(), 0);
    }
}
