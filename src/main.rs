//! BIOTOPE - CLI Entry Point
//!
//! Closed 2D ecosystem simulator.

use biotope::{benchmark, Config, Ecosystem};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::time::Instant;

#[derive(Parser)]
#[command(name = "biotope")]
#[command(version)]
#[command(about = "Closed 2D ecosystem simulator with terrain, water, plants, herbivores and predators")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a new simulation
    Run {
        /// Configuration file (YAML)
        #[arg(short, long, default_value = "config.yaml")]
        config: PathBuf,

        /// Number of ticks to simulate
        #[arg(short, long, default_value = "1000")]
        ticks: u64,

        /// Random seed for reproducibility
        #[arg(long)]
        seed: Option<u64>,

        /// Override the initial herbivore count
        #[arg(long)]
        herbivores: Option<usize>,

        /// Override the initial predator count
        #[arg(long)]
        predators: Option<usize>,

        /// Rain chance per tick, in percent
        #[arg(long)]
        precipitation: Option<f64>,

        /// Write population history (JSON) here when done
        #[arg(long)]
        history: Option<PathBuf>,

        /// Print the final map as text
        #[arg(long)]
        map: bool,

        /// Quiet mode (minimal output)
        #[arg(short, long)]
        quiet: bool,
    },

    /// Run performance benchmark
    Benchmark {
        /// Number of ticks
        #[arg(short, long, default_value = "500")]
        ticks: u64,

        /// Initial herbivores
        #[arg(long, default_value = "150")]
        herbivores: usize,

        /// Initial predators
        #[arg(long, default_value = "75")]
        predators: usize,
    },

    /// Generate default configuration file
    Init {
        /// Output path
        #[arg(short, long, default_value = "config.yaml")]
        output: PathBuf,
    },
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Run {
            config,
            ticks,
            seed,
            herbivores,
            predators,
            precipitation,
            history,
            map,
            quiet,
        } => {
            let mut config = load_config(&config)?;
            init_logging(&config.logging.log_level);
            if let Some(n) = herbivores {
                config.world.initial_herbivores = n;
            }
            if let Some(n) = predators {
                config.world.initial_predators = n;
            }
            if let Some(level) = precipitation {
                config.hydrology.precipitation_level = level;
            }
            run_simulation(&config, ticks, seed, history, map, quiet)
        }

        Commands::Benchmark {
            ticks,
            herbivores,
            predators,
        } => {
            init_logging("warn");
            run_benchmark(ticks, herbivores, predators)
        }

        Commands::Init { output } => {
            init_logging("info");
            generate_config(output)
        }
    }
}

fn init_logging(default_level: &str) {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level))
        .init();
}

fn load_config(path: &Path) -> Result<Config, Box<dyn std::error::Error>> {
    if path.exists() {
        println!("Loading config from: {:?}", path);
        Ok(Config::from_file(path)?)
    } else {
        println!("Using default configuration");
        Ok(Config::default())
    }
}

fn run_simulation(
    config: &Config,
    ticks: u64,
    seed: Option<u64>,
    history: Option<PathBuf>,
    map: bool,
    quiet: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut eco = match seed {
        Some(s) => {
            println!("Using seed: {}", s);
            Ecosystem::from_config(config, s)?
        }
        None => Ecosystem::new(config)?,
    };

    println!("Starting simulation (seed {})", eco.seed());
    println!("  Grid size: {}x{}", config.world.rows, config.world.cols);
    println!(
        "  Herbivores: {}  Predators: {}  Plants: {}",
        eco.herbivores().len(),
        eco.predators().len(),
        eco.plants().len()
    );
    println!("  Ticks: {}", ticks);
    println!();

    let start = Instant::now();
    let stats_interval = config.logging.stats_interval;

    for _ in 0..ticks {
        let summary = eco.tick()?;

        if !quiet && stats_interval > 0 && summary.cycle % stats_interval == 0 {
            println!("{}", summary.summary());
        }

        if summary.living_herbivores == 0 && summary.living_predators == 0 {
            println!("\nAll animals gone at tick {}", summary.cycle);
            break;
        }
    }

    let elapsed = start.elapsed();

    println!();
    println!("=== Simulation Complete ===");
    println!("Time: {:.2}s", elapsed.as_secs_f64());
    println!("Ticks: {}", eco.cycle());
    println!(
        "Speed: {:.1} ticks/s",
        eco.cycle() as f64 / elapsed.as_secs_f64()
    );
    println!("{}", eco.census().summary());

    if map {
        println!();
        print!("{}", eco.snapshot().to_ascii());
    }

    if let Some(path) = history {
        eco.history().save_json(&path.to_string_lossy())?;
        println!("Population history: {:?}", path);
    }

    Ok(())
}

fn run_benchmark(
    ticks: u64,
    herbivores: usize,
    predators: usize,
) -> Result<(), Box<dyn std::error::Error>> {
    println!("=== BIOTOPE Benchmark ===");
    println!("Ticks: {}", ticks);
    println!("Herbivores: {}  Predators: {}", herbivores, predators);
    println!();

    let result = benchmark(ticks, herbivores, predators)?;
    println!("{}", result);

    Ok(())
}

fn generate_config(output: PathBuf) -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::default();
    config.save(&output)?;
    println!("Configuration saved to: {:?}", output);
    Ok(())
}
