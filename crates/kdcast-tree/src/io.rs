//! Persistent on-disk format for k-d trees.
//!
//! Little-endian layout:
//!
//! | offset  | size | field                                  |
//! |---------|------|----------------------------------------|
//! | 0       | 4    | `u32` node count M                     |
//! | 4       | 4    | `u32` triangle-index count K           |
//! | 8       | 8M   | nodes (`u32` header, `u32` split/index)|
//! | 8 + 8M  | 4K   | `i32` triangle indices                 |
//!
//! The arrays are written verbatim, so a load after a save reproduces the
//! tree bit for bit.

use std::fs;
use std::path::Path;

use kdcast_math::BBox64;
use kdcast_mesh::TriangleMesh;

use crate::node::{Node, MAX_NODE_COUNT};
use crate::tree::KdTree;
use crate::{Result, TreeError};

const HEADER_LEN: usize = 8;
const NODE_LEN: usize = 8;

impl<'m> KdTree<'m> {
    /// Write the tree to a file.
    pub fn save_to_file(&self, path: impl AsRef<Path>) -> Result<()> {
        let nodes = self.nodes();
        let triangle_indices = self.triangle_indices();

        let mut data =
            Vec::with_capacity(HEADER_LEN + NODE_LEN * nodes.len() + 4 * triangle_indices.len());
        data.extend_from_slice(&(nodes.len() as u32).to_le_bytes());
        data.extend_from_slice(&(triangle_indices.len() as u32).to_le_bytes());
        for node in nodes {
            data.extend_from_slice(&node.header.to_le_bytes());
            data.extend_from_slice(&node.data.to_le_bytes());
        }
        for &index in triangle_indices {
            data.extend_from_slice(&index.to_le_bytes());
        }

        fs::write(path, data)?;
        Ok(())
    }

    /// Read a tree from a file and bind it to `mesh`.
    ///
    /// The structural checks of [`KdTree::validate`] run against the mesh
    /// the tree is being bound to, so a tree saved for a different mesh is
    /// rejected rather than producing out-of-range triangle lookups.
    pub fn load_from_file(path: impl AsRef<Path>, mesh: &'m TriangleMesh) -> Result<KdTree<'m>> {
        let bytes = fs::read(path)?;
        if bytes.len() < HEADER_LEN {
            return Err(TreeError::Format("file header is truncated".to_string()));
        }

        let node_count = read_u32(&bytes, 0) as usize;
        let index_count = read_u32(&bytes, 4) as usize;

        if node_count > MAX_NODE_COUNT {
            return Err(TreeError::Format(format!(
                "node count {} exceeds the supported maximum",
                node_count
            )));
        }

        let expected = HEADER_LEN + NODE_LEN * node_count + 4 * index_count;
        if bytes.len() != expected {
            return Err(TreeError::Format(format!(
                "expected {} bytes of tree data, found {}",
                expected,
                bytes.len()
            )));
        }

        let mut nodes = Vec::with_capacity(node_count);
        for i in 0..node_count {
            let offset = HEADER_LEN + NODE_LEN * i;
            nodes.push(Node::from_raw(
                read_u32(&bytes, offset),
                read_u32(&bytes, offset + 4),
            ));
        }

        let mut triangle_indices = Vec::with_capacity(index_count);
        let indices_base = HEADER_LEN + NODE_LEN * node_count;
        for i in 0..index_count {
            triangle_indices.push(read_u32(&bytes, indices_base + 4 * i) as i32);
        }

        let tree = KdTree::new(
            nodes,
            triangle_indices,
            mesh,
            BBox64::from(mesh.bounds()),
        );
        tree.validate()?;
        Ok(tree)
    }
}

fn read_u32(bytes: &[u8], offset: usize) -> u32 {
    u32::from_le_bytes([
        bytes[offset],
        bytes[offset + 1],
        bytes[offset + 2],
        bytes[offset + 3],
    ])
}
