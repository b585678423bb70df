//! kdcast benchmark driver.
//!
//! Builds k-d trees for the three benchmark models in a directory and
//! ray-casts the saved trees. The elapsed milliseconds are printed and
//! also returned as the process exit code, clamped to 255 where 8-bit
//! exit codes cannot carry more.

use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::time::Instant;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use kdcast_math::{Point3d, Ray, Vec3d};
use kdcast_mesh::load_stl;
use kdcast_tree::{BuildParams, KdTree, KdTreeBuilder};

const MODEL_FILES: [&str; 3] = ["teapot.stl", "bunny.stl", "dragon.stl"];
const TREE_FILES: [&str; 3] = ["teapot.kdtree", "bunny.kdtree", "dragon.kdtree"];
const RAYS_PER_MODEL: usize = 100_000;

#[derive(Parser)]
#[command(name = "kdcast")]
#[command(about = "k-d tree construction and ray casting benchmarks", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Build k-d trees for the benchmark models and save them
    Build {
        /// Directory containing teapot.stl, bunny.stl, and dragon.stl
        models_dir: PathBuf,
    },
    /// Ray-cast previously built k-d trees
    Raycast {
        /// Directory containing the models and their .kdtree files
        models_dir: PathBuf,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Build { models_dir } => run_build(&models_dir),
        Commands::Raycast { models_dir } => run_raycast(&models_dir),
    };

    match result {
        // The printed time is authoritative; the exit code carries it
        // where 8 bits allow.
        Ok(elapsed_ms) => ExitCode::from(elapsed_ms.min(255) as u8),
        Err(err) => {
            eprintln!("error: {:#}", err);
            ExitCode::FAILURE
        }
    }
}

fn load_models(models_dir: &Path) -> Result<Vec<kdcast_mesh::TriangleMesh>> {
    let mut meshes = Vec::new();
    for file in MODEL_FILES {
        let path = models_dir.join(file);
        let mesh = load_stl(&path).with_context(|| format!("loading {}", path.display()))?;
        if mesh.degenerate_triangle_count() > 0 {
            eprintln!(
                "warning: {} contains {} degenerate triangles",
                path.display(),
                mesh.degenerate_triangle_count()
            );
        }
        meshes.push(mesh);
    }
    Ok(meshes)
}

fn run_build(models_dir: &Path) -> Result<u64> {
    let meshes = load_models(models_dir)?;

    let start = Instant::now();
    let mut trees = Vec::new();
    let mut stats = Vec::new();
    for mesh in &meshes {
        let mut builder = KdTreeBuilder::new(mesh, BuildParams::default())?;
        trees.push(builder.build()?);
        stats.push(builder.stats().clone());
    }
    let elapsed_ms = start.elapsed().as_millis() as u64;

    for ((file, tree), tree_stats) in MODEL_FILES.iter().zip(&trees).zip(&stats) {
        println!(
            "{}: {} triangles, {} nodes",
            file,
            tree.mesh().triangle_count(),
            tree.node_count()
        );
        println!(
            "  leaves: {} ({} empty), triangles per leaf: {:.5}",
            tree_stats.leaf_count, tree_stats.empty_leaf_count, tree_stats.triangles_per_leaf
        );
        println!(
            "  depth: perfect {}, average {:.5}, stddev {:.5}",
            tree_stats.perfect_depth, tree_stats.average_depth, tree_stats.depth_standard_deviation
        );
    }

    for (file, tree) in TREE_FILES.iter().zip(&trees) {
        let path = models_dir.join(file);
        tree.save_to_file(&path)
            .with_context(|| format!("saving {}", path.display()))?;
    }

    println!("build time: {} ms", elapsed_ms);
    Ok(elapsed_ms)
}

fn run_raycast(models_dir: &Path) -> Result<u64> {
    let meshes = load_models(models_dir)?;

    let mut trees = Vec::new();
    for (mesh, file) in meshes.iter().zip(TREE_FILES) {
        let path = models_dir.join(file);
        let tree = KdTree::load_from_file(&path, mesh)
            .with_context(|| format!("loading {}", path.display()))?;
        trees.push(tree);
    }

    let start = Instant::now();
    let mut hits = 0usize;
    for tree in &trees {
        let mut rng = StdRng::seed_from_u64(0x5eed);
        hits += cast_rays(tree, &mut rng, RAYS_PER_MODEL);
    }
    let elapsed_ms = start.elapsed().as_millis() as u64;

    let total_rays = trees.len() * RAYS_PER_MODEL;
    let rays_per_second = total_rays as f64 / start.elapsed().as_secs_f64();
    println!(
        "{} rays, {} hits, {:.2} Mrays/s",
        total_rays,
        hits,
        rays_per_second / 1.0e6
    );
    println!("raycast time: {} ms", elapsed_ms);
    Ok(elapsed_ms)
}

/// Shoot seeded random rays from a sphere around the scene toward points
/// inside the mesh bounds; returns the number of rays that hit anything.
fn cast_rays(tree: &KdTree<'_>, rng: &mut StdRng, count: usize) -> usize {
    let bounds = tree.mesh_bounds();
    let center = (bounds.min + bounds.max) * 0.5;
    let radius = (bounds.max - bounds.min).norm() * 0.75;

    let mut hits = 0;
    for _ in 0..count {
        let origin = Point3d::from(center + random_unit(rng) * radius);
        let target = Point3d::new(
            rng.gen_range(bounds.min.x..=bounds.max.x),
            rng.gen_range(bounds.min.y..=bounds.max.y),
            rng.gen_range(bounds.min.z..=bounds.max.z),
        );
        let ray = Ray::new(origin, target - origin);
        if tree.intersect(&ray).is_some() {
            hits += 1;
        }
    }
    hits
}

fn random_unit(rng: &mut StdRng) -> Vec3d {
    // Rejection-sample the unit ball, then normalize.
    loop {
        let v = Vec3d::new(
            rng.gen_range(-1.0..=1.0),
            rng.gen_range(-1.0..=1.0),
            rng.gen_range(-1.0..=1.0),
        );
        let n = v.norm_squared();
        if n > 1e-6 && n <= 1.0 {
            return v / n.sqrt();
        }
    }
}
