//! SAH-driven recursive k-d tree construction.
//!
//! The builder selects axis-aligned splitting planes with the Surface Area
//! Heuristic: for each candidate plane (a triangle AABB edge), the expected
//! traversal cost is the traversal constant plus the intersection cost of
//! each half-space weighted by its surface-area hit probability. Candidates
//! come from a sorted sweep over the 2N bound edges of the node's
//! triangles; the winning plane partitions the triangles and recursion
//! proceeds in pre-order, so the below child of every interior node lands
//! at the next array slot.

use std::cmp::Ordering;
use std::mem;

use kdcast_math::{BBox32, BBox64};
use kdcast_mesh::TriangleMesh;
use serde::{Deserialize, Serialize};

use crate::node::{Node, MAX_NODE_COUNT, MAX_TRIANGLE_COUNT};
use crate::stats::BuildStats;
use crate::tree::{KdTree, MAX_TRAVERSAL_DEPTH};
use crate::{Result, TreeError};

/// Build configuration for [`KdTreeBuilder`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BuildParams {
    /// Cost attributed to one ray-triangle test.
    pub intersection_cost: f32,
    /// Cost attributed to one interior-node traversal step.
    pub traversal_cost: f32,
    /// Fractional cost discount in `[0, 1]` for splits that cut off an
    /// empty half-space.
    pub empty_bonus: f32,
    /// Maximum recursion depth. Non-positive selects the automatic depth
    /// `8 + 1.3 * log2(N)`; values are clamped to the traversal limit.
    pub max_depth: i32,
    /// Examine axes in decreasing extent order and take the first axis
    /// admitting any split, instead of the cheapest split of all three.
    pub split_along_the_longest_axis: bool,
    /// Nodes with this many triangles or fewer become leaves outright.
    /// The actual leaf population can be larger when no split pays off.
    pub leaf_triangles_limit: usize,
    /// Collect [`BuildStats`] during construction.
    pub collect_stats: bool,
}

impl Default for BuildParams {
    fn default() -> Self {
        Self {
            intersection_cost: 80.0,
            traversal_cost: 1.0,
            empty_bonus: 0.3,
            max_depth: -1,
            split_along_the_longest_axis: false,
            leaf_triangles_limit: 2,
            collect_stats: true,
        }
    }
}

impl BuildParams {
    /// Validate parameter ranges.
    pub fn validate(&self) -> Result<()> {
        if !self.intersection_cost.is_finite() || self.intersection_cost <= 0.0 {
            return Err(TreeError::InvalidParams(
                "intersection_cost must be positive".to_string(),
            ));
        }
        if !self.traversal_cost.is_finite() || self.traversal_cost < 0.0 {
            return Err(TreeError::InvalidParams(
                "traversal_cost must be non-negative".to_string(),
            ));
        }
        if !(0.0..=1.0).contains(&self.empty_bonus) {
            return Err(TreeError::InvalidParams(
                "empty_bonus must lie in [0, 1]".to_string(),
            ));
        }
        Ok(())
    }
}

const EDGE_END_MASK: u32 = 0x8000_0000;
const EDGE_TRIANGLE_MASK: u32 = 0x7fff_ffff;

/// One end of a triangle's bounding interval along the current axis. The
/// top bit of `triangle_and_flag` marks the end edge, the low 31 bits hold
/// the triangle index.
#[derive(Debug, Clone, Copy, Default)]
struct BoundEdge {
    position_on_axis: f32,
    triangle_and_flag: u32,
}

impl BoundEdge {
    fn start(triangle_index: i32, position: f32) -> Self {
        Self {
            position_on_axis: position,
            triangle_and_flag: triangle_index as u32,
        }
    }

    fn end(triangle_index: i32, position: f32) -> Self {
        Self {
            position_on_axis: position,
            triangle_and_flag: triangle_index as u32 | EDGE_END_MASK,
        }
    }

    fn is_start(self) -> bool {
        self.triangle_and_flag & EDGE_END_MASK == 0
    }

    fn is_end(self) -> bool {
        !self.is_start()
    }

    fn triangle_index(self) -> i32 {
        (self.triangle_and_flag & EDGE_TRIANGLE_MASK) as i32
    }
}

/// Edge ordering for the sweep: position ascending, and at a shared
/// coordinate the end edge sorts before the start edge, so coincident
/// triangles leave the above set before they enter the below set. The
/// sort applying this must be stable.
fn edge_order(a: &BoundEdge, b: &BoundEdge) -> Ordering {
    if a.position_on_axis == b.position_on_axis {
        match (a.is_end(), b.is_end()) {
            (true, false) => Ordering::Less,
            (false, true) => Ordering::Greater,
            _ => Ordering::Equal,
        }
    } else if a.position_on_axis < b.position_on_axis {
        Ordering::Less
    } else {
        Ordering::Greater
    }
}

#[derive(Debug, Clone, Copy)]
struct Split {
    /// Index into the edge buffer of the winning candidate.
    edge: usize,
    axis: usize,
}

/// Builds a [`KdTree`] for a triangle mesh.
///
/// All working memory is allocated once up front and reused across the
/// recursion; `build` transfers the finished arrays into the tree and
/// drops the scratch.
pub struct KdTreeBuilder<'m> {
    mesh: &'m TriangleMesh,
    params: BuildParams,
    stats: BuildStats,
    triangle_bounds: Vec<BBox32>,
    edges_buffer: Vec<BoundEdge>,
    triangles_buffer: Vec<i32>,
    nodes: Vec<Node>,
    triangle_indices: Vec<i32>,
}

impl<'m> KdTreeBuilder<'m> {
    /// Create a builder for `mesh` with the given parameters.
    ///
    /// Fails when the parameters are out of range or the mesh holds more
    /// triangles than the node encoding can address.
    pub fn new(mesh: &'m TriangleMesh, mut params: BuildParams) -> Result<Self> {
        params.validate()?;

        if mesh.triangle_count() > MAX_TRIANGLE_COUNT {
            return Err(TreeError::TooManyTriangles(mesh.triangle_count()));
        }

        if params.max_depth <= 0 {
            let triangles_count_log = (mesh.triangle_count().max(1) as f64).log2().floor();
            params.max_depth = (0.5 + 8.0 + 1.3 * triangles_count_log).floor() as i32;
        }
        if params.max_depth > MAX_TRAVERSAL_DEPTH as i32 {
            params.max_depth = MAX_TRAVERSAL_DEPTH as i32;
        }

        let stats = BuildStats::new(params.collect_stats);

        Ok(Self {
            mesh,
            params,
            stats,
            triangle_bounds: Vec::new(),
            edges_buffer: Vec::new(),
            triangles_buffer: Vec::new(),
            nodes: Vec::new(),
            triangle_indices: Vec::new(),
        })
    }

    /// Run the recursive construction and hand the arrays to the tree.
    ///
    /// Scratch memory lives only for the duration of the call;
    /// [`KdTreeBuilder::stats`] stays readable afterwards.
    pub fn build(&mut self) -> Result<KdTree<'m>> {
        let triangle_count = self.mesh.triangle_count();

        self.stats = BuildStats::new(self.params.collect_stats);
        self.triangle_bounds = Vec::with_capacity(triangle_count);
        let mut mesh_bounds = BBox32::empty();
        for i in 0..triangle_count {
            let bounds = self.mesh.triangle_bounds(i);
            mesh_bounds = BBox32::union(mesh_bounds, bounds);
            self.triangle_bounds.push(bounds);
        }

        self.edges_buffer = vec![BoundEdge::default(); 2 * triangle_count];

        // Overlapping-slice scratch: each recursion level claims at most N
        // slots beyond its parent, so N * (max_depth + 1) bounds the total.
        let scratch_len = triangle_count * (self.params.max_depth as usize + 1);
        self.triangles_buffer = vec![0i32; scratch_len];
        for i in 0..triangle_count {
            self.triangles_buffer[i] = i as i32;
        }

        self.build_node(
            mesh_bounds,
            0,
            triangle_count,
            self.params.max_depth,
            0,
            triangle_count,
        )?;

        self.stats.finalize();

        self.triangle_bounds = Vec::new();
        self.edges_buffer = Vec::new();
        self.triangles_buffer = Vec::new();

        let tree = KdTree::new(
            mem::take(&mut self.nodes),
            mem::take(&mut self.triangle_indices),
            self.mesh,
            BBox64::from(mesh_bounds),
        );
        debug_assert!(tree.validate().is_ok());
        Ok(tree)
    }

    /// Statistics collected by the last `build` call.
    pub fn stats(&self) -> &BuildStats {
        &self.stats
    }

    /// Recursively build the subtree for the triangles stored at
    /// `[tri_start, tri_start + tri_count)` in the scratch buffer.
    ///
    /// `offset0` and `offset1` are the scratch positions for the below and
    /// above partitions. The below recursion receives `offset1 + n1` as its
    /// own above offset so its scratch never reaches the parent's above
    /// partition; the above recursion repartitions `[offset1, offset1+n1)`
    /// in place once the below subtree is finished with the lower region.
    fn build_node(
        &mut self,
        node_bounds: BBox32,
        tri_start: usize,
        tri_count: usize,
        depth: i32,
        offset0: usize,
        offset1: usize,
    ) -> Result<()> {
        if self.nodes.len() >= MAX_NODE_COUNT {
            return Err(TreeError::NodeCapacityExceeded(MAX_NODE_COUNT));
        }

        if tri_count <= self.params.leaf_triangles_limit || depth == 0 {
            self.create_leaf(tri_start, tri_count);
            self.stats.new_leaf(tri_count, self.params.max_depth - depth);
            return Ok(());
        }

        let split = match self.select_split(node_bounds, tri_start, tri_count) {
            Some(split) => split,
            None => {
                self.create_leaf(tri_start, tri_count);
                self.stats.new_leaf(tri_count, self.params.max_depth - depth);
                return Ok(());
            }
        };
        let split_position = self.edges_buffer[split.edge].position_on_axis;

        // Classify triangles against the split plane: start edges strictly
        // left of the winning edge go below, end edges strictly right of
        // it go above. Triangles straddling the plane land in both sets.
        let mut n0 = 0;
        for i in 0..split.edge {
            if self.edges_buffer[i].is_start() {
                self.triangles_buffer[offset0 + n0] = self.edges_buffer[i].triangle_index();
                n0 += 1;
            }
        }

        let mut n1 = 0;
        for i in split.edge + 1..2 * tri_count {
            if self.edges_buffer[i].is_end() {
                self.triangles_buffer[offset1 + n1] = self.edges_buffer[i].triangle_index();
                n1 += 1;
            }
        }

        let this_node_index = self.nodes.len();
        self.nodes.push(Node::placeholder());

        let mut bounds0 = node_bounds;
        bounds0.max[split.axis] = split_position;
        self.build_node(bounds0, offset0, n0, depth - 1, 0, offset1 + n1)?;

        let above_child = self.nodes.len();
        self.nodes[this_node_index] = Node::interior(split.axis, above_child, split_position);

        let mut bounds1 = node_bounds;
        bounds1.min[split.axis] = split_position;
        self.build_node(bounds1, offset1, n1, depth - 1, 0, offset1)
    }

    fn create_leaf(&mut self, tri_start: usize, tri_count: usize) {
        let node = if tri_count == 0 {
            Node::empty_leaf()
        } else if tri_count == 1 {
            Node::single_triangle_leaf(self.triangles_buffer[tri_start])
        } else {
            let offset = self.triangle_indices.len() as i32;
            self.triangle_indices
                .extend_from_slice(&self.triangles_buffer[tri_start..tri_start + tri_count]);
            Node::multi_triangle_leaf(tri_count as i32, offset)
        };
        self.nodes.push(node);
    }

    /// Pick the splitting plane for a node, or `None` to make a leaf.
    ///
    /// On return the edge buffer holds the sorted edges of the winning
    /// axis, ready for partitioning.
    fn select_split(
        &mut self,
        node_bounds: BBox32,
        tri_start: usize,
        tri_count: usize,
    ) -> Option<Split> {
        let mut axes = [0usize, 1, 2];
        if self.params.split_along_the_longest_axis {
            let diag = node_bounds.diagonal();
            axes.sort_by(|&a, &b| diag[b].total_cmp(&diag[a]));
        }

        let mut best: Option<Split> = None;
        let mut best_cost = f32::INFINITY;

        for &axis in &axes {
            self.fill_edges(axis, tri_start, tri_count);

            if let Some((edge, cost)) = self.select_split_for_axis(node_bounds, tri_count, axis) {
                if self.params.split_along_the_longest_axis {
                    return Some(Split { edge, axis });
                }
                if cost < best_cost {
                    best_cost = cost;
                    best = Some(Split { edge, axis });
                }
            }
        }

        // The caller partitions with the winning axis's edges; re-emit them
        // unless axis 2, whose edges are still in the buffer, won.
        if let Some(split) = best {
            if split.axis != 2 {
                self.fill_edges(split.axis, tri_start, tri_count);
            }
        }
        best
    }

    fn fill_edges(&mut self, axis: usize, tri_start: usize, tri_count: usize) {
        for i in 0..tri_count {
            let triangle_index = self.triangles_buffer[tri_start + i];
            let bounds = &self.triangle_bounds[triangle_index as usize];
            self.edges_buffer[2 * i] = BoundEdge::start(triangle_index, bounds.min[axis]);
            self.edges_buffer[2 * i + 1] = BoundEdge::end(triangle_index, bounds.max[axis]);
        }
        self.edges_buffer[..2 * tri_count].sort_by(edge_order);
    }

    /// Sweep the sorted edges of one axis and return the cheapest
    /// candidate, or `None` when no candidate beats leaving the node
    /// unsplit (`intersection_cost * N`).
    fn select_split_for_axis(
        &self,
        node_bounds: BBox32,
        tri_count: usize,
        axis: usize,
    ) -> Option<(usize, f32)> {
        const OTHER_AXES: [[usize; 2]; 3] = [[1, 2], [0, 2], [0, 1]];
        let [other0, other1] = OTHER_AXES[axis];
        let diag = node_bounds.diagonal();

        // Surface of the two faces parallel to the split axis, and the
        // perimeter contribution that grows with the position along it.
        let s0 = 2.0 * (diag[other0] * diag[other1]);
        let d0 = 2.0 * (diag[other0] + diag[other1]);

        let inv_total_s = 1.0 / (2.0 * (diag.x * diag.y + diag.x * diag.z + diag.y * diag.z));

        let num_edges = 2 * tri_count;

        let mut best_edge: Option<usize> = None;
        let mut best_cost = self.params.intersection_cost * tri_count as f32;

        let mut num_below: i32 = 0;
        let mut num_above = tri_count as i32;

        let mut i = 0;
        while i < num_edges {
            let edge = self.edges_buffer[i];

            // Edges sharing this exact coordinate form the group
            // [i, group_end); its prefix [i, middle_edge) holds the end
            // edges, the suffix the start edges.
            let mut group_end = i + 1;
            while group_end < num_edges
                && edge.position_on_axis == self.edges_buffer[group_end].position_on_axis
            {
                group_end += 1;
            }

            let mut middle_edge = i;
            while middle_edge != group_end && self.edges_buffer[middle_edge].is_end() {
                middle_edge += 1;
            }

            // Triangles ending at or left of this plane are no longer above.
            num_above -= (middle_edge - i) as i32;

            let t = edge.position_on_axis;
            if t > node_bounds.min[axis] && t < node_bounds.max[axis] {
                let below_s = s0 + d0 * (t - node_bounds.min[axis]);
                let above_s = s0 + d0 * (node_bounds.max[axis] - t);

                let p_below = below_s * inv_total_s;
                let p_above = above_s * inv_total_s;

                let empty_bonus = if num_below == 0 || num_above == 0 {
                    self.params.empty_bonus
                } else {
                    0.0
                };

                let cost = self.params.traversal_cost
                    + (1.0 - empty_bonus)
                        * self.params.intersection_cost
                        * (p_below * num_below as f32 + p_above * num_above as f32);

                if cost < best_cost {
                    best_cost = cost;
                    // A group of only end edges has middle_edge == group_end;
                    // record the last end edge, which still lies at `t`.
                    best_edge = Some(if middle_edge == group_end {
                        middle_edge - 1
                    } else {
                        middle_edge
                    });
                }
            }

            num_below += (group_end - middle_edge) as i32;
            i = group_end;
        }

        best_edge.map(|edge| (edge, best_cost))
    }
}
