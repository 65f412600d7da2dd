use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand, ValueEnum};
use rand::SeedableRng;
use rand::rngs::StdRng;
use ribbonscape_geometry::RibbonBuilder;
use ribbonscape_render::{DebugTextRenderer, frame};
use ribbonscape_scene::{SceneConfig, SceneContext, Viewport};
use ribbonscape_tools::{MeshInspector, write_json, write_obj};
use std::io::Write;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "ribbonscape-cli", about = "Headless ribbon tool: build, inspect, export")]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Scene config file (YAML)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// RNG seed for the control-point jitter
    #[arg(short, long, global = true)]
    seed: Option<u64>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, ValueEnum)]
enum ExportFormat {
    Obj,
    Json,
}

#[derive(Subcommand)]
enum Commands {
    /// Print version and crate info
    Info,
    /// Build a ribbon and report its invariants
    Build {
        /// Override the number of arc-length samples
        #[arg(short = 'm', long)]
        samples: Option<usize>,
    },
    /// Build a ribbon and write the mesh to a file or stdout
    Export {
        #[arg(short, long, value_enum, default_value = "obj")]
        format: ExportFormat,
        /// Output path; stdout when omitted
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Run the render tick and print the debug text renderer's output
    RenderText {
        /// Number of frames to render
        #[arg(short, long, default_value = "3")]
        frames: u32,
        /// Seconds between frames
        #[arg(long, default_value = "1.0")]
        dt: f32,
    },
    /// Print the default scene config as YAML
    DefaultConfig,
}

fn load_config(cli: &Cli) -> Result<SceneConfig> {
    let mut config = match &cli.config {
        Some(path) => SceneConfig::load(path)
            .with_context(|| format!("loading config {}", path.display()))?,
        None => SceneConfig::default(),
    };
    if cli.seed.is_some() {
        config.seed = cli.seed;
    }
    Ok(config)
}

fn rng_for(config: &SceneConfig) -> StdRng {
    match config.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_os_rng(),
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter))
        .with_writer(std::io::stderr)
        .init();

    let mut config = load_config(&cli)?;

    match cli.command {
        Commands::Info => {
            println!("ribbonscape-cli v{}", env!("CARGO_PKG_VERSION"));
            println!("common: {}", ribbonscape_common::crate_info());
            println!("geometry: {}", ribbonscape_geometry::crate_info());
            println!("assets: {}", ribbonscape_assets::crate_info());
            println!("scene: {}", ribbonscape_scene::crate_info());
            println!("render: {}", ribbonscape_render::crate_info());
            println!("tools: {}", ribbonscape_tools::crate_info());
        }
        Commands::Build { samples } => {
            if let Some(m) = samples {
                config.ribbon.sample_count = m;
            }
            config.ribbon.validate()?;

            let mut builder = RibbonBuilder::new(config.ribbon.clone(), rng_for(&config));
            let ribbon = builder.build();
            let summary = MeshInspector::summary(&ribbon.mesh);

            println!(
                "Curve: {} control points, length {:.4}, {:?}",
                ribbon.control_points.len(),
                ribbon.curve.length(),
                ribbon.curve.curve_type()
            );
            println!("{summary}");
            for group in &ribbon.mesh.groups {
                println!(
                    "  group material={} indices={}..{}",
                    group.material_index,
                    group.start,
                    group.start + group.count
                );
            }
            if !summary.is_valid() {
                bail!("mesh invariants violated");
            }
            println!("Invariants: OK");
        }
        Commands::Export { format, output } => {
            config.ribbon.validate()?;
            let mut rng = rng_for(&config);
            let mesh = RibbonBuilder::new(config.ribbon.clone(), &mut rng).build().mesh;

            let mut out: Box<dyn Write> = match &output {
                Some(path) => Box::new(std::io::BufWriter::new(
                    std::fs::File::create(path)
                        .with_context(|| format!("creating {}", path.display()))?,
                )),
                None => Box::new(std::io::stdout().lock()),
            };
            match format {
                ExportFormat::Obj => write_obj(&mesh, &["front", "back"], &mut out)?,
                ExportFormat::Json => write_json(&mesh, &mut out)?,
            }
            out.flush()?;

            if let Some(path) = output {
                tracing::info!(path = %path.display(), vertices = mesh.vertex_count(), "mesh exported");
            }
        }
        Commands::RenderText { frames, dt } => {
            config.validate()?;
            let mut rng = rng_for(&config);
            let mut scene = SceneContext::new(config, &mut rng, Viewport::default());
            let renderer = DebugTextRenderer::new();
            for i in 0..frames {
                let elapsed = i as f32 * dt;
                println!("--- t={elapsed:.2}s ---");
                print!("{}", frame(&renderer, elapsed, &mut scene));
            }
        }
        Commands::DefaultConfig => {
            print!("{}", SceneConfig::default().to_yaml()?);
        }
    }

    Ok(())
}
