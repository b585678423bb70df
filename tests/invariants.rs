//! Structural invariants of built trees and the persistent format.

use std::collections::HashSet;

use kdcast::{BuildParams, KdTree, KdTreeBuilder, Node, Point3f, TriangleMesh};

/// Deterministic pseudorandom f32 in [0, 1).
fn next_f32(state: &mut u64) -> f32 {
    *state = state
        .wrapping_mul(6364136223846793005)
        .wrapping_add(1442695040888963407);
    ((*state >> 40) as f32) / (1u32 << 24) as f32
}

fn random_soup(seed: u64, count: usize) -> TriangleMesh {
    let mut state = seed;
    let mut vertices = Vec::with_capacity(3 * count);
    let mut triangles = Vec::with_capacity(count);
    for i in 0..count {
        let base = Point3f::new(
            next_f32(&mut state) * 10.0,
            next_f32(&mut state) * 10.0,
            next_f32(&mut state) * 10.0,
        );
        vertices.push(base);
        for _ in 0..2 {
            vertices.push(Point3f::new(
                base.x + next_f32(&mut state) * 2.0 - 1.0,
                base.y + next_f32(&mut state) * 2.0 - 1.0,
                base.z + next_f32(&mut state) * 2.0 - 1.0,
            ));
        }
        let v = 3 * i as u32;
        triangles.push([v, v + 1, v + 2]);
    }
    TriangleMesh::new(vertices, triangles).unwrap()
}

#[test]
fn test_structural_invariants() {
    let mesh = random_soup(3, 500);
    let mut builder = KdTreeBuilder::new(&mesh, BuildParams::default()).unwrap();
    let tree = builder.build().unwrap();
    tree.validate().unwrap();

    let nodes = tree.nodes();
    let indices = tree.triangle_indices();

    for (i, node) in nodes.iter().enumerate() {
        if node.is_leaf() {
            let count = node.leaf_triangle_count();
            if count == 1 {
                assert!((node.leaf_payload() as usize) < mesh.triangle_count());
            } else if count >= 2 {
                let offset = node.leaf_payload() as usize;
                assert!(offset + count <= indices.len());
                for &index in &indices[offset..offset + count] {
                    assert!((index as usize) < mesh.triangle_count());
                }
            }
        } else {
            assert!(node.above_child() > i + 1);
            assert!(node.above_child() < nodes.len());
        }
    }
}

#[test]
fn test_every_triangle_reaches_a_leaf() {
    let mesh = random_soup(11, 400);
    let mut builder = KdTreeBuilder::new(&mesh, BuildParams::default()).unwrap();
    let tree = builder.build().unwrap();

    let mut covered: HashSet<i32> = HashSet::new();
    for node in tree.nodes() {
        if !node.is_leaf() {
            continue;
        }
        let count = node.leaf_triangle_count();
        if count == 1 {
            covered.insert(node.leaf_payload());
        } else if count >= 2 {
            let offset = node.leaf_payload() as usize;
            covered.extend(&tree.triangle_indices()[offset..offset + count]);
        }
    }

    for i in 0..mesh.triangle_count() as i32 {
        assert!(covered.contains(&i), "triangle {} is in no leaf", i);
    }
}

#[test]
fn test_depth_stays_within_limits() {
    let mesh = random_soup(23, 600);
    let mut builder = KdTreeBuilder::new(&mesh, BuildParams::default()).unwrap();
    let tree = builder.build().unwrap();

    // 600 triangles: floor(0.5 + 8 + 1.3 * floor(log2 600)) = 20
    let expected_max_depth = 20;

    fn max_interior_depth(nodes: &[Node], index: usize) -> usize {
        let node = &nodes[index];
        if node.is_leaf() {
            0
        } else {
            let below = max_interior_depth(nodes, index + 1);
            let above = max_interior_depth(nodes, node.above_child());
            1 + below.max(above)
        }
    }

    let depth = max_interior_depth(tree.nodes(), 0);
    assert!(depth <= expected_max_depth, "depth {} too deep", depth);
    assert!(depth <= 64);
}

#[test]
fn test_save_load_round_trip_via_facade() {
    let mesh = random_soup(31, 250);
    let mut builder = KdTreeBuilder::new(&mesh, BuildParams::default()).unwrap();
    let tree = builder.build().unwrap();

    let mut path = std::env::temp_dir();
    path.push(format!("kdcast-facade-{}.kdtree", std::process::id()));

    tree.save_to_file(&path).unwrap();
    let loaded = KdTree::load_from_file(&path, &mesh).unwrap();
    std::fs::remove_file(&path).unwrap();

    assert_eq!(tree.nodes(), loaded.nodes());
    assert_eq!(tree.triangle_indices(), loaded.triangle_indices());

    // Byte-identical arrays answer queries identically.
    let ray = kdcast::Ray::new(
        kdcast::Point3d::new(5.0, 5.0, -10.0),
        kdcast::Vec3d::new(0.0, 0.0, 1.0),
    );
    let a = tree.intersect(&ray).map(|hit| (hit.triangle_index, hit.t));
    let b = loaded.intersect(&ray).map(|hit| (hit.triangle_index, hit.t));
    assert_eq!(a, b);
}

#[test]
fn test_stl_to_tree_pipeline() {
    let mesh = random_soup(37, 120);

    let mut stl_path = std::env::temp_dir();
    stl_path.push(format!("kdcast-pipeline-{}.stl", std::process::id()));
    std::fs::write(&stl_path, kdcast::stl_bytes(&mesh)).unwrap();

    let loaded: TriangleMesh = kdcast::load_stl(&stl_path).unwrap();
    std::fs::remove_file(&stl_path).unwrap();
    assert_eq!(loaded.triangle_count(), mesh.triangle_count());

    let mut builder = KdTreeBuilder::new(&loaded, BuildParams::default()).unwrap();
    let tree = builder.build().unwrap();
    tree.validate().unwrap();

    let stats = builder.stats();
    assert!(stats.leaf_count > 0);
    assert!(stats.average_depth > 0.0);
}
