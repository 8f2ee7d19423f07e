use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing_subscriber::EnvFilter;

use polyplot::Point3;
use polyplot::config::{FileConfig, resolve_verbose};
use polyplot::domain::{Mesh, Polyline};
use polyplot::export::{
    ColorMode, ExportConfig, PrimitiveKind, VectorExporter, decode, write_picture,
};
use polyplot::field::ExtrusionField;
use polyplot::geometry::{MatrixViewport, Viewport, ViewportSpec};

/// Extrusion fields and depth-sorted vector pictures from polygonal meshes
///
/// Examples:
///   # Export a mesh with cell colors, sorted back to front
///   polyplot export part.json -o part.vpic
///
///   # Single color, coarse grid, no sorting
///   polyplot export part.json --color-mode specified --color 0.2,0.2,0.8 --resolution 500 --no-sort
///
///   # Evaluate the extrusion field of a polyline at two points
///   polyplot sample section.json --point 0,1,0 --point 2.5,0,3
///
///   # Summarize an exported picture
///   polyplot inspect part.vpic
#[derive(Parser, Debug)]
#[command(name = "polyplot")]
#[command(version, about, long_about = None)]
struct Args {
    /// Path to config file (optional, auto-searches polyplot.toml if not provided)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short = 'v', long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Export a mesh (JSON) to a picture stream
    Export {
        /// Mesh file: {"points": [[x,y,z],...], "verts"|"lines"|"polys"|"strips": [{"indices": [...], "color": [r,g,b]}]}
        mesh: PathBuf,

        /// Output file (defaults to the mesh path with a .vpic extension)
        #[arg(short = 'o', long)]
        output: Option<PathBuf>,

        /// Grid units along the longer side of the picture (at least 100)
        #[arg(short = 'r', long)]
        resolution: Option<u32>,

        /// How primitives are colored
        #[arg(long, value_enum)]
        color_mode: Option<ColorMode>,

        /// Specified color as R,G,B in [0, 1]
        #[arg(long, value_parser = parse_triple)]
        color: Option<[f64; 3]>,

        /// Keep mesh order instead of drawing back to front
        #[arg(long)]
        no_sort: bool,

        /// Seed for random colors
        #[arg(long)]
        seed: Option<u64>,

        /// Viewport file: {"matrix": [[...4]; 4 rows], "width": w, "height": h}
        #[arg(long)]
        viewport: Option<PathBuf>,
    },

    /// Evaluate the extrusion field of a polyline (JSON) at points
    Sample {
        /// Polyline file: {"points": [[x,y,z], ...]}
        polyline: PathBuf,

        /// Query point as X,Y,Z (repeatable)
        #[arg(short = 'p', long = "point", value_parser = parse_triple, required = true)]
        points: Vec<[f64; 3]>,
    },

    /// Decode a picture stream and print a summary
    Inspect {
        picture: PathBuf,
    },
}

fn main() -> Result<()> {
    let args = Args::parse();

    let file_config = if let Some(ref config_path) = args.config {
        if !config_path.exists() {
            bail!("Config file not found: {:?}", config_path);
        }
        Some(
            FileConfig::from_path(config_path)
                .context(format!("Failed to read config file: {:?}", config_path))?,
        )
    } else {
        // The log level depends on the file, so report search problems
        // through a warn-only subscriber until it is known.
        tracing::subscriber::with_default(log_subscriber(args.verbose), FileConfig::load)
    };
    let verbose = resolve_verbose(args.verbose, file_config.as_ref());
    tracing::subscriber::set_global_default(log_subscriber(verbose))
        .context("Failed to initialise logging")?;

    match args.command {
        Command::Export {
            mesh,
            output,
            resolution,
            color_mode,
            color,
            no_sort,
            seed,
            viewport,
        } => {
            let mut config = file_config
                .as_ref()
                .map(FileConfig::export_config)
                .unwrap_or_default();
            if let Some(r) = resolution {
                config.resolution = r;
            }
            if let Some(mode) = color_mode {
                config.color_mode = mode;
            }
            if let Some(c) = color {
                config.specified_color = c;
            }
            if no_sort {
                config.sort = false;
            }
            if seed.is_some() {
                config.random_seed = seed;
            }

            let output = output
                .or_else(|| file_config.as_ref().and_then(|c| c.output.clone()))
                .unwrap_or_else(|| mesh.with_extension("vpic"));

            run_export(&mesh, &output, config, viewport.as_deref(), verbose)
        }
        Command::Sample { polyline, points } => run_sample(&polyline, &points),
        Command::Inspect { picture } => run_inspect(&picture),
    }
}

fn run_export(
    mesh_path: &Path,
    output: &Path,
    config: ExportConfig,
    viewport_path: Option<&Path>,
    verbose: bool,
) -> Result<()> {
    let total_start = Instant::now();

    println!("polyplot - Mesh to Vector Picture");
    println!("=================================");
    println!();

    if verbose {
        println!("Configuration:");
        println!("  Mesh: {}", mesh_path.display());
        println!("  Resolution: {}", config.resolution);
        println!("  Color mode: {:?}", config.color_mode);
        println!("  Specified color: {:?}", config.specified_color);
        println!(
            "  Sorting: {}",
            if config.sort { "back to front" } else { "mesh order" }
        );
        if let Some(path) = viewport_path {
            println!("  Viewport: {}", path.display());
        }
        println!("  Output: {}", output.display());
        println!();
    }

    let spinner = create_spinner("Reading mesh...");
    let start = Instant::now();
    let mesh: Mesh = read_json(mesh_path).context("Failed to load mesh")?;
    if mesh.is_empty() {
        spinner.finish_and_clear();
        bail!("Mesh has no cells: {}", mesh_path.display());
    }
    spinner.finish_with_message(format!(
        "Read {} points, {} cells [{:.1}s]",
        mesh.points.len(),
        mesh.cell_count(),
        start.elapsed().as_secs_f32()
    ));

    let matrix_viewport: Option<MatrixViewport> = match viewport_path {
        Some(path) => {
            let spec: ViewportSpec = read_json(path).context("Failed to load viewport")?;
            Some(spec.into())
        }
        None => None,
    };

    let mut exporter = VectorExporter::new(config).context("Invalid export settings")?;
    if let Some(ref vp) = matrix_viewport {
        exporter = exporter.with_viewport(vp as &dyn Viewport);
    }

    let spinner = create_spinner("Projecting, coloring and encoding...");
    let start = Instant::now();
    let (bytes, summary) = exporter
        .export_to_vec(&mesh)
        .context("Failed to export mesh")?;
    spinner.finish_with_message(format!(
        "Encoded {} primitives with {} palette colors{} [{:.1}s]",
        summary.primitives,
        summary.palette_size,
        if summary.palette_reduced {
            " (reduced)"
        } else {
            ""
        },
        start.elapsed().as_secs_f32()
    ));

    write_picture(output, &bytes).context("Failed to write picture file")?;

    println!();
    println!(
        "Done! Wrote {:.1} KB in {:.1}s",
        bytes.len() as f64 / 1024.0,
        total_start.elapsed().as_secs_f32()
    );
    println!("Output: {}", output.display());

    Ok(())
}

fn run_sample(polyline_path: &Path, points: &[[f64; 3]]) -> Result<()> {
    let polyline: Polyline = read_json(polyline_path).context("Failed to load polyline")?;
    let mut field = ExtrusionField::new(polyline.into_shared());

    for p in points {
        let point = Point3::from(*p);
        let sample = field
            .evaluate(&point)
            .context(format!("Failed to evaluate field at {:?}", p))?;
        let g = sample.gradient();
        println!(
            "({:.4}, {:.4}, {:.4}) -> {:.6}  gradient ({:.4}, {:.4}, {:.4})  segment {}",
            p[0],
            p[1],
            p[2],
            sample.value(),
            g.x,
            g.y,
            g.z,
            sample.segment()
        );
    }

    Ok(())
}

fn run_inspect(path: &Path) -> Result<()> {
    let bytes = std::fs::read(path)
        .with_context(|| format!("Failed to read picture file: {}", path.display()))?;
    let picture = decode(&bytes).context("Failed to decode picture")?;

    let count = |kind: PrimitiveKind| {
        picture
            .primitives
            .iter()
            .filter(|p| p.kind == kind)
            .count()
    };

    println!("Picture: {}", path.display());
    println!("  Resolution: {}", picture.resolution);
    println!(
        "  Extent: {} x {}",
        picture.extent[0], picture.extent[1]
    );
    println!("  Palette: {} colors", picture.palette.len());
    println!("  Points: {}", count(PrimitiveKind::Point));
    println!("  Segments: {}", count(PrimitiveKind::Segment));
    println!("  Polygons: {}", count(PrimitiveKind::Polygon));

    Ok(())
}

fn read_json<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T> {
    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    serde_json::from_str(&contents).with_context(|| format!("Failed to parse {}", path.display()))
}

fn parse_triple(s: &str) -> std::result::Result<[f64; 3], String> {
    let values: Vec<f64> = s
        .split(',')
        .map(|v| v.trim().parse::<f64>())
        .collect::<std::result::Result<_, _>>()
        .map_err(|e| format!("invalid number in {s:?}: {e}"))?;
    <[f64; 3]>::try_from(values).map_err(|v| format!("expected 3 values, got {}", v.len()))
}

fn log_subscriber(verbose: bool) -> impl tracing::Subscriber + Send + Sync {
    let default = if verbose { "polyplot=debug" } else { "polyplot=warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .finish()
}

fn create_spinner(message: &str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    let style = ProgressStyle::with_template("{spinner:.green} {msg}")
        .unwrap_or_else(|_| ProgressStyle::default_spinner())
        .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"]);
    pb.set_style(style);
    pb.set_message(message.to_string());
    pb.enable_steady_tick(std::time::Duration::from_millis(80));
    pb
}
