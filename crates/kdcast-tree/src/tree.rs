//! The k-d tree structure and its ray traversal engine.

use kdcast_math::{BBox64, Ray};
use kdcast_mesh::TriangleMesh;

use crate::node::Node;
use crate::{Result, TreeError};

/// Depth limit of the traversal stack; also caps the build depth.
pub(crate) const MAX_TRAVERSAL_DEPTH: usize = 64;

/// Closest-hit result of a tree query.
#[derive(Debug, Clone, Copy)]
pub struct Intersection {
    /// Ray parameter at the hit point.
    pub t: f64,
    /// Index of the hit triangle in the mesh.
    pub triangle_index: u32,
    /// Barycentric weight of the hit triangle's second vertex.
    pub b1: f64,
    /// Barycentric weight of the hit triangle's third vertex.
    pub b2: f64,
}

/// An immutable SAH k-d tree over a borrowed triangle mesh.
///
/// The tree owns its node and triangle-index arrays and borrows the mesh,
/// which must outlive it. Queries take `&self` only, so one tree can serve
/// any number of concurrent traversals.
pub struct KdTree<'m> {
    nodes: Vec<Node>,
    triangle_indices: Vec<i32>,
    mesh: &'m TriangleMesh,
    mesh_bounds: BBox64,
}

#[derive(Clone, Copy, Default)]
struct TraversalFrame {
    node_index: usize,
    t_near: f64,
    t_far: f64,
}

impl<'m> KdTree<'m> {
    pub(crate) fn new(
        nodes: Vec<Node>,
        triangle_indices: Vec<i32>,
        mesh: &'m TriangleMesh,
        mesh_bounds: BBox64,
    ) -> Self {
        Self {
            nodes,
            triangle_indices,
            mesh,
            mesh_bounds,
        }
    }

    /// The mesh this tree accelerates.
    pub fn mesh(&self) -> &TriangleMesh {
        self.mesh
    }

    /// Bounding box of the whole mesh.
    pub fn mesh_bounds(&self) -> &BBox64 {
        &self.mesh_bounds
    }

    /// Number of nodes in the tree.
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Read-only view of the pre-order node array.
    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    /// Read-only view of the triangle-index array backing multi-triangle
    /// leaves.
    pub fn triangle_indices(&self) -> &[i32] {
        &self.triangle_indices
    }

    /// Find the closest triangle hit along a ray, if any.
    ///
    /// Walks the tree iteratively with a fixed-size stack. The traversal
    /// itself never fails: a ray that misses everything returns `None`.
    pub fn intersect(&self, ray: &Ray) -> Option<Intersection> {
        let (t_near, t_far) = ray.intersect_bounds(&self.mesh_bounds)?;
        let mut t_near = t_near.max(ray.t_min);
        let mut t_far = t_far.min(ray.t_max);
        if t_near > t_far {
            return None;
        }

        let mut stack = [TraversalFrame::default(); MAX_TRAVERSAL_DEPTH];
        let mut stack_size = 0usize;

        let mut closest: Option<Intersection> = None;
        let mut node_index = 0usize;

        loop {
            let node = self.nodes[node_index];

            if node.is_leaf() {
                self.intersect_leaf(node, ray, &mut closest);

                // Any node still on the stack starts at or beyond t_far,
                // so a hit inside this leaf's slab cannot be improved.
                if let Some(hit) = closest {
                    if hit.t <= t_far {
                        return closest;
                    }
                }

                if stack_size == 0 {
                    break;
                }
                stack_size -= 1;
                let frame = stack[stack_size];
                node_index = frame.node_index;
                t_near = frame.t_near;
                t_far = frame.t_far;
            } else {
                let axis = node.split_axis();
                let distance_to_split = node.split_position() as f64 - ray.origin[axis];

                let below = node_index + 1;
                let above = node.above_child();

                if distance_to_split != 0.0 {
                    let (near, far) = if distance_to_split > 0.0 {
                        (below, above)
                    } else {
                        (above, below)
                    };

                    // Nonzero by construction; +-inf when the direction is
                    // parallel to the split plane.
                    let t_split = distance_to_split * ray.inv_direction()[axis];

                    if t_split >= t_far || t_split < 0.0 {
                        node_index = near;
                    } else if t_split <= t_near {
                        node_index = far;
                    } else {
                        stack[stack_size] = TraversalFrame {
                            node_index: far,
                            t_near: t_split,
                            t_far,
                        };
                        stack_size += 1;
                        node_index = near;
                        t_far = t_split;
                    }
                } else {
                    // Origin exactly on the split plane: the direction sign
                    // picks the half-space the ray travels through.
                    node_index = if ray.direction[axis] > 0.0 { above } else { below };
                }
            }
        }

        None
    }

    fn intersect_leaf(&self, node: Node, ray: &Ray, closest: &mut Option<Intersection>) {
        let count = node.leaf_triangle_count();
        if count == 1 {
            self.test_triangle(node.leaf_payload() as u32, ray, closest);
        } else {
            let offset = node.leaf_payload() as usize;
            for k in 0..count {
                self.test_triangle(self.triangle_indices[offset + k] as u32, ray, closest);
            }
        }
    }

    fn test_triangle(&self, triangle_index: u32, ray: &Ray, closest: &mut Option<Intersection>) {
        if let Some(hit) = self.mesh.intersect_triangle(triangle_index as usize, ray) {
            if closest.map_or(true, |c| hit.t < c.t) {
                *closest = Some(Intersection {
                    t: hit.t,
                    triangle_index,
                    b1: hit.b1,
                    b2: hit.b2,
                });
            }
        }
    }

    /// Check the structural invariants of the node and index arrays.
    ///
    /// Run after every build and on every load: child indices stay in
    /// bounds and point forward, leaf runs stay inside the triangle-index
    /// array, every stored triangle id is valid, and no root-to-leaf path
    /// exceeds the traversal stack depth.
    pub fn validate(&self) -> Result<()> {
        let node_count = self.nodes.len();
        if node_count == 0 {
            return Err(TreeError::Format("tree has no nodes".to_string()));
        }

        let triangle_count = self.mesh.triangle_count();

        for (i, node) in self.nodes.iter().enumerate() {
            if node.is_leaf() {
                let count = node.leaf_triangle_count();
                let payload = node.leaf_payload();
                if count == 1 {
                    if payload < 0 || payload as usize >= triangle_count {
                        return Err(TreeError::Format(format!(
                            "leaf {} references invalid triangle {}",
                            i, payload
                        )));
                    }
                } else if count >= 2 {
                    let offset = payload as i64;
                    if offset < 0 || offset + count as i64 > self.triangle_indices.len() as i64 {
                        return Err(TreeError::Format(format!(
                            "leaf {} run [{}, {}) escapes the triangle-index array",
                            i,
                            payload,
                            offset + count as i64
                        )));
                    }
                }
            } else {
                let above = node.above_child();
                if above <= i + 1 || above >= node_count {
                    return Err(TreeError::Format(format!(
                        "interior node {} has invalid above child {}",
                        i, above
                    )));
                }
            }
        }

        for &index in &self.triangle_indices {
            if index < 0 || index as usize >= triangle_count {
                return Err(TreeError::Format(format!(
                    "stored triangle index {} is out of range",
                    index
                )));
            }
        }

        // Depth check: forward-pointing children make the walk acyclic.
        let mut pending = vec![(0usize, 0usize)];
        while let Some((index, depth)) = pending.pop() {
            let node = &self.nodes[index];
            if node.is_leaf() {
                continue;
            }
            if depth + 1 > MAX_TRAVERSAL_DEPTH {
                return Err(TreeError::Format(format!(
                    "tree depth exceeds the traversal limit of {}",
                    MAX_TRAVERSAL_DEPTH
                )));
            }
            pending.push((index + 1, depth + 1));
            pending.push((node.above_child(), depth + 1));
        }

        Ok(())
    }
}
