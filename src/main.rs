//! frustum-clip CLI
//!
//! Clips every object of an OBJ file against a camera frustum and writes the
//! clipped objects to a new OBJ file.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::Parser;
use log::{info, warn};

use frustum_clip::config::{DEFAULT_EPSILON, DEFAULT_TAGS};
use frustum_clip::mesh::ObjCursor;
use frustum_clip::prelude::*;

#[derive(Parser)]
#[command(name = "frustum-clip")]
#[command(about = "Clip OBJ meshes against a perspective view frustum", long_about = None)]
struct Cli {
    /// Input OBJ file
    #[arg(value_name = "INPUT")]
    input: PathBuf,

    /// Output OBJ file
    #[arg(short, long, value_name = "FILE")]
    output: PathBuf,

    /// Camera position as x,y,z
    #[arg(long, value_parser = parse_vec3, default_value = "0,0,0")]
    camera: Vec3,

    /// Camera yaw in degrees (positive turns right)
    #[arg(long, default_value_t = 0.0, allow_hyphen_values = true)]
    yaw: f32,

    /// Camera pitch in degrees (positive looks up)
    #[arg(long, default_value_t = 0.0, allow_hyphen_values = true)]
    pitch: f32,

    /// Vertical field of view in degrees
    #[arg(long, default_value_t = 60.0)]
    fov: f32,

    /// Aspect ratio (width / height)
    #[arg(long, default_value_t = 16.0 / 9.0)]
    aspect: f32,

    /// Near plane distance
    #[arg(long, default_value_t = 0.3)]
    near: f32,

    /// Far plane distance
    #[arg(long, default_value_t = 1000.0)]
    far: f32,

    /// Classify vertices with a cube of this edge length instead of exactly
    #[arg(long, value_name = "SIZE")]
    bounds: Option<f32>,

    /// Numeric tolerance for intersections and containment
    #[arg(long, default_value_t = DEFAULT_EPSILON)]
    epsilon: f32,

    /// Cut every triangle independently instead of sharing edge vertices
    #[arg(long)]
    no_weld: bool,

    /// Verbose output (repeat for more)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

fn parse_vec3(s: &str) -> Result<Vec3, String> {
    let parts: Vec<f32> = s
        .split(',')
        .map(|p| p.trim().parse::<f32>().map_err(|e| format!("{p:?}: {e}")))
        .collect::<Result<_, _>>()?;
    match parts.as_slice() {
        [x, y, z] => Ok(Vec3::new(*x, *y, *z)),
        _ => Err(format!("expected x,y,z but got {} values", parts.len())),
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let level = match cli.verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();

    if cli.near <= 0.0 || cli.far <= cli.near {
        bail!("near must be positive and less than far (got {} and {})", cli.near, cli.far);
    }

    let meshes = Mesh::load_all_from_obj(&cli.input)
        .with_context(|| format!("failed to load {}", cli.input.display()))?;
    info!("loaded {} objects from {}", meshes.len(), cli.input.display());

    let mut scene = Scene::new();
    for (name, mesh) in meshes {
        scene.spawn(Entity::new(name, Transform::default(), mesh).with_tag(DEFAULT_TAGS[0]));
    }

    let mut camera = Camera::new(cli.camera);
    camera.set_orientation(cli.yaw.to_radians(), cli.pitch.to_radians());
    let projection = Projection::from_degrees(cli.fov, cli.aspect, cli.near, cli.far);
    let frustum = projection.frustum(&camera).context("invalid camera frustum")?;

    let mut config = ClipConfig::default()
        .with_epsilon(cli.epsilon)
        .with_weld_edges(!cli.no_weld);
    if let Some(size) = cli.bounds {
        config = config.with_vertex_test(VertexTest::Bounds { size });
    }

    let mut pipeline = ClipPipeline::new(&config);
    let report = pipeline.snapshot(&mut scene, &frustum, camera.position());
    for failure in &report.failures {
        warn!("{:?}: {}", failure.object, failure.error);
    }

    let handles: Vec<_> = pipeline.pending().iter().map(|p| p.handle).collect();
    pipeline.place(&mut scene, camera.position());

    let file = File::create(&cli.output)
        .with_context(|| format!("failed to create {}", cli.output.display()))?;
    let mut out = BufWriter::new(file);
    let mut cursor = ObjCursor::default();
    for handle in &handles {
        if let Some(entity) = scene.get(*handle) {
            entity
                .mesh
                .write_obj_object(&mut out, Some(&entity.name), &mut cursor)
                .with_context(|| format!("failed to write {}", cli.output.display()))?;
        }
    }
    out.flush()
        .with_context(|| format!("failed to write {}", cli.output.display()))?;

    println!(
        "{} of {} objects in view, {} triangles kept, {} cut, {} vertices synthesized",
        report.clipped,
        report.considered,
        report.stats.retained,
        report.stats.clipped,
        report.stats.synthesized
    );
    if !report.diagnostics.is_empty() {
        println!(
            "{} triangles dropped, {} objects lost every triangle",
            report.diagnostics.len(),
            report.collapsed
        );
    }
    println!("wrote {}", cli.output.display());

    Ok(())
}
