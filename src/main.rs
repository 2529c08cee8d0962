//! Terrasim CLI - procedural planet surface simulator.
//!
//! Builds a geodesic grid, runs the generation pipeline over it and writes
//! the finished cells as JSON.

use std::fs::File;
use std::io::BufWriter;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::time::Instant;

use clap::{Parser, Subcommand, ValueEnum};
use tracing_subscriber::EnvFilter;

use terrasim::geometry::{icosphere, icosphere_cell_count};
use terrasim::pipeline::{Pipeline, StageProfile};
use terrasim::terrain::{Cell, GenerationSettings, PlanetConfiguration, WorldContext};

/// Procedural planet surface simulator.
#[derive(Parser)]
#[command(name = "terrasim")]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate a planet and write its cells as JSON.
    Generate {
        /// Icosphere subdivision level (cells = 10 * 4^level + 2).
        #[arg(short, long, default_value = "5")]
        level: u32,

        /// Random seed for reproducible generation.
        #[arg(short, long)]
        seed: Option<u64>,

        /// Planet preset.
        #[arg(short, long, default_value = "earth")]
        planet: PlanetPreset,

        /// Number of tectonic plates.
        #[arg(long, default_value = "12")]
        plates: usize,

        /// Fraction of cells below sea level, overriding the preset's water coverage.
        #[arg(long)]
        ocean_coverage: Option<f32>,

        /// Use reduced iteration counts.
        #[arg(long)]
        fast: bool,

        /// Run per-cell work on a single thread.
        #[arg(long)]
        sequential: bool,

        /// Output file for the cell array (JSON).
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Output file for the run report (JSON).
        #[arg(long)]
        report: Option<PathBuf>,
    },

    /// Display information about a planet configuration.
    Info {
        /// Icosphere subdivision level.
        #[arg(short, long, default_value = "5")]
        level: u32,

        /// Planet preset.
        #[arg(short, long, default_value = "earth")]
        planet: PlanetPreset,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum PlanetPreset {
    Earth,
    Mars,
    Moon,
    Venus,
    Lava,
    Ice,
    /// Tidally locked terrestrial world.
    Locked,
}

impl PlanetPreset {
    fn configuration(self) -> PlanetConfiguration {
        match self {
            PlanetPreset::Earth => PlanetConfiguration::earth_like(),
            PlanetPreset::Mars => PlanetConfiguration::mars_like(),
            PlanetPreset::Moon => PlanetConfiguration::moon_like(),
            PlanetPreset::Venus => PlanetConfiguration::venus_like(),
            PlanetPreset::Lava => PlanetConfiguration::lava_world(),
            PlanetPreset::Ice => PlanetConfiguration::ice_world(),
            PlanetPreset::Locked => PlanetConfiguration::tidally_locked_terran(),
        }
    }
}

const MAX_LEVEL: u32 = 8;

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Generate { level, seed, planet, plates, ocean_coverage, fast, sequential, output, report } => {
            run_generate(GenerateArgs {
                level,
                seed,
                planet,
                plates,
                ocean_coverage,
                fast,
                sequential,
                output,
                report,
            })
        }
        Commands::Info { level, planet } => run_info(level, planet),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(message) => {
            eprintln!("Error: {}", message);
            ExitCode::FAILURE
        }
    }
}

struct GenerateArgs {
    level: u32,
    seed: Option<u64>,
    planet: PlanetPreset,
    plates: usize,
    ocean_coverage: Option<f32>,
    fast: bool,
    sequential: bool,
    output: Option<PathBuf>,
    report: Option<PathBuf>,
}

fn write_json<T: serde::Serialize>(path: &Path, value: &T) -> Result<(), String> {
    let file = File::create(path).map_err(|e| format!("cannot create {}: {}", path.display(), e))?;
    serde_json::to_writer_pretty(BufWriter::new(file), value)
        .map_err(|e| format!("cannot write {}: {}", path.display(), e))
}

fn run_generate(args: GenerateArgs) -> Result<(), String> {
    if args.level > MAX_LEVEL {
        return Err(format!("level must be at most {}", MAX_LEVEL));
    }
    if !(1..=200).contains(&args.plates) {
        return Err("number of plates must be between 1 and 200".into());
    }
    if let Some(coverage) = args.ocean_coverage {
        if !(0.0..=1.0).contains(&coverage) {
            return Err("ocean coverage must be between 0.0 and 1.0".into());
        }
    }

    let seed = args.seed.unwrap_or_else(|| {
        use std::time::{SystemTime, UNIX_EPOCH};
        SystemTime::now().duration_since(UNIX_EPOCH).map(|d| d.as_secs()).unwrap_or(0)
    });

    let planet = args.planet.configuration();
    let mut settings = if args.fast { GenerationSettings::fast(seed) } else { GenerationSettings::with_seed(seed) };
    settings.parallel = !args.sequential;
    settings.ocean_coverage = args.ocean_coverage;

    println!("Terrasim - Procedural Planet Surface Simulator");
    println!("==============================================");
    println!("Cells: {} (level {})", icosphere_cell_count(args.level), args.level);
    println!("Seed: {}", seed);
    println!("Profile: {:?}", StageProfile::for_planet(&planet));

    let start = Instant::now();
    let cells: Vec<Cell> = icosphere(args.level);
    let mut ctx = WorldContext::new(cells, planet, settings, args.plates);
    let pipeline = Pipeline::standard();
    let report = pipeline
        .run_with_callbacks(
            &mut ctx,
            |name, i, total| println!("  [{}/{}] Starting: {}", i + 1, total, name),
            |name, _, elapsed_ms| println!("        Completed: {} ({:.1} ms)", name, elapsed_ms),
        )
        .map_err(|e| e.to_string())?;

    println!("\nGeneration complete in {:.2}s", start.elapsed().as_secs_f64());
    match report.sea_level {
        Some(level) => println!("Sea level: {}", level),
        None => println!("Sea level: none"),
    }
    if let Some(rivers) = &report.rivers {
        println!(
            "Rivers: {} sources, {} cells, {} swamps, max discharge {:.1} m³/s",
            rivers.sources, rivers.river_cells, rivers.swamps, rivers.max_discharge
        );
    }

    if let Some(path) = &args.report {
        write_json(path, &report)?;
        println!("Report written to {}", path.display());
    }
    if let Some(path) = &args.output {
        write_json(path, &ctx.cells)?;
        println!("Cells written to {}", path.display());
    }
    Ok(())
}

fn run_info(level: u32, preset: PlanetPreset) -> Result<(), String> {
    if level > MAX_LEVEL {
        return Err(format!("level must be at most {}", MAX_LEVEL));
    }
    let planet = preset.configuration();
    let cells = icosphere_cell_count(level);
    let cell_area = planet.surface_area_km2() / cells as f32;

    println!("Planet Configuration");
    println!("====================");
    println!("Cells: {} (12 pentagons, {} hexagons)", cells, cells - 12);
    println!("Radius: {} km", planet.radius_km);
    println!("Gravity: {} g", planet.gravity);
    println!("Cell area: {:.0} km² (~{:.0} km across)", cell_area, cell_area.sqrt());
    println!("Surface pressure: {:.1} hPa", planet.surface_pressure_hpa());
    println!("Rotation: {:.1} h ({:?})", planet.rotation_period_hours, planet.rotation);
    println!("Tidally locked: {}", planet.tidally_locked);
    println!("Temperature range: {} to {} °C", planet.min_temperature_c, planet.max_temperature_c);
    println!("Profile: {:?}", StageProfile::for_planet(&planet));
    Ok(())
}
