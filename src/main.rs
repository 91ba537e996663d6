//! evonet - CLI entry point
//!
//! Evolves feed-forward network weights with genetic or particle-swarm
//! search.

use clap::{Parser, Subcommand};
use evonet::artifacts::RunArtifacts;
use evonet::config::{Config, FitnessConfig};
use evonet::dataset::Dataset;
use evonet::fitness::{
    evaluate_or, ClassificationFitness, ExternalFitness, FitnessSource,
};
use evonet::neural::{encoding, Network};
use evonet::stats::{GenerationStats, StatsHistory};
use evonet::swarm::{Direction, RandomDraw, SwarmParams, SwarmTrainer};
use evonet::GeneticTrainer;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use std::path::PathBuf;
use std::time::Instant;

#[derive(Parser)]
#[command(name = "evonet")]
#[command(version)]
#[command(about = "Population-based neuroevolution of feed-forward networks")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Train with the genetic algorithm
    Genetic {
        /// Configuration file (YAML)
        #[arg(short, long, default_value = "config.yaml")]
        config: PathBuf,

        /// Override the configured generation count
        #[arg(short, long)]
        generations: Option<usize>,

        /// Output directory for per-generation artifacts
        #[arg(short, long, default_value = "output")]
        output: PathBuf,

        /// Random seed for reproducibility
        #[arg(long)]
        seed: Option<u64>,

        /// Quiet mode (minimal output)
        #[arg(short, long)]
        quiet: bool,
    },

    /// Train with particle swarm optimization
    Pso {
        /// Configuration file (YAML)
        #[arg(short, long, default_value = "config.yaml")]
        config: PathBuf,

        /// Override the configured generation count
        #[arg(short, long)]
        generations: Option<usize>,

        /// Output directory for per-generation artifacts
        #[arg(short, long, default_value = "output")]
        output: PathBuf,

        /// Random seed for reproducibility
        #[arg(long)]
        seed: Option<u64>,

        /// Quiet mode (minimal output)
        #[arg(short, long)]
        quiet: bool,
    },

    /// Minimize the sphere function with a vector swarm (demo)
    Sphere {
        /// Vector dimensionality
        #[arg(short, long, default_value = "7")]
        dimensions: usize,

        /// Swarm size
        #[arg(short, long, default_value = "100")]
        population: usize,

        /// Number of generations
        #[arg(short, long, default_value = "100")]
        generations: usize,

        /// Inertia weight
        #[arg(long, default_value = "1.0")]
        inertia: f32,

        /// Inertia decay per generation
        #[arg(long, default_value = "0.99")]
        damping: f32,

        /// Personal-best acceleration c1
        #[arg(long, default_value = "2.0")]
        c1: f32,

        /// Global-best acceleration c2
        #[arg(long, default_value = "2.0")]
        c2: f32,

        /// Random seed for reproducibility
        #[arg(long)]
        seed: Option<u64>,
    },

    /// Generate a default configuration file
    Init {
        /// Output path
        #[arg(short, long, default_value = "config.yaml")]
        output: PathBuf,
    },

    /// Analyze a serialized network file
    Inspect {
        /// Network file
        network: PathBuf,
    },

    /// Summarize a dataset file
    Dataset {
        /// Dataset file
        path: PathBuf,

        /// Column delimiter
        #[arg(short, long, default_value = ",")]
        delimiter: char,
    },
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Genetic {
            config,
            generations,
            output,
            seed,
            quiet,
        } => run_genetic(config, generations, output, seed, quiet),

        Commands::Pso {
            config,
            generations,
            output,
            seed,
            quiet,
        } => run_pso(config, generations, output, seed, quiet),

        Commands::Sphere {
            dimensions,
            population,
            generations,
            inertia,
            damping,
            c1,
            c2,
            seed,
        } => run_sphere(dimensions, population, generations, inertia, damping, c1, c2, seed),

        Commands::Init { output } => generate_config(output),

        Commands::Inspect { network } => inspect_network(network),

        Commands::Dataset { path, delimiter } => summarize_dataset(path, delimiter),
    }
}

fn load_config(
    config_path: &PathBuf,
    generations: Option<usize>,
) -> Result<Config, Box<dyn std::error::Error>> {
    let mut config = if config_path.exists() {
        println!("Loading config from: {:?}", config_path);
        Config::from_file(config_path)?
    } else {
        println!("Using default configuration");
        Config::default()
    };

    if let Some(g) = generations {
        config.run.generations = g;
    }
    config.validate()?;
    Ok(config)
}

fn resolve_seed(seed: Option<u64>) -> u64 {
    let seed = seed.unwrap_or_else(|| rand::thread_rng().gen());
    println!("Using seed: {}", seed);
    seed
}

/// Fitness sources for a run: the training source plus an optional
/// held-out test source.
fn build_sources(
    config: &Config,
    artifacts: &RunArtifacts,
    seed: u64,
) -> Result<
    (
        Box<dyn FitnessSource>,
        Option<ClassificationFitness>,
        usize,
        usize,
    ),
    Box<dyn std::error::Error>,
> {
    match &config.fitness {
        FitnessConfig::Dataset { path, delimiter } => {
            let full = Dataset::from_file(path, *delimiter)?;
            let (n_inputs, n_outputs) = config.resolve_dimensions(Some(&full))?;

            let mut rng = ChaCha8Rng::seed_from_u64(seed);
            let (train, test) = full.split(config.run.train_fraction, &mut rng);
            train.save(artifacts.root().join("train.csv"), *delimiter)?;
            test.save(artifacts.root().join("test.csv"), *delimiter)?;
            println!(
                "Dataset: {} rows ({} train / {} test), {} features, {} labels",
                full.len(),
                train.len(),
                test.len(),
                full.n_features(),
                full.labels().len()
            );

            Ok((
                Box::new(ClassificationFitness::new(train)),
                Some(ClassificationFitness::new(test)),
                n_inputs,
                n_outputs,
            ))
        }
        FitnessConfig::External { command, samples } => {
            let (n_inputs, n_outputs) = config.resolve_dimensions(None)?;
            println!("External scorer: {} ({} samples per candidate)", command, samples);
            Ok((
                Box::new(ExternalFitness::new(command.clone(), *samples)),
                None,
                n_inputs,
                n_outputs,
            ))
        }
    }
}

fn run_genetic(
    config_path: PathBuf,
    generations: Option<usize>,
    output: PathBuf,
    seed: Option<u64>,
    quiet: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let config = load_config(&config_path, generations)?;
    let seed = resolve_seed(seed);

    let mut artifacts = RunArtifacts::new(&output)?;
    let (fitness, test_source, n_inputs, n_outputs) = build_sources(&config, &artifacts, seed)?;

    println!("Starting genetic run");
    println!("  Population: {}", config.run.population_size);
    println!(
        "  Topology: {:?} ({} in, {} out)",
        config.network.topology, n_inputs, n_outputs
    );
    println!("  Generations: {}", config.run.generations);
    println!();

    let mut trainer = GeneticTrainer::new(config.clone(), n_inputs, n_outputs, fitness, seed)?;
    let mut history = StatsHistory::new();
    let start = Instant::now();

    for _ in 0..config.run.generations {
        trainer.step()?;

        let best = trainer.best();
        let test_fitness = test_source
            .as_ref()
            .map(|source| evaluate_or(source, &best.net, 0.0));

        let stats = GenerationStats {
            generation: trainer.generation,
            best_fitness: best.fitness,
            mean_fitness: trainer.mean_fitness(),
            test_fitness,
        };

        artifacts.write_generation(trainer.generation, &trainer.population)?;
        artifacts.append_point(trainer.generation, stats.best_fitness, stats.test_fitness)?;

        if !quiet {
            println!("{}", stats.summary());
        }
        history.record(stats);
    }

    let elapsed = start.elapsed();
    let best_path = artifacts.write_best(&trainer.best().net)?;
    let history_path = output.join("stats_history.json");
    history.save(history_path.to_str().unwrap())?;

    println!();
    println!("=== Run Complete ===");
    println!("Time: {:.2}s", elapsed.as_secs_f64());
    println!("Best fitness: {:.4}", trainer.best().fitness);
    println!("Best network: {:?}", best_path);
    println!("Stats history: {:?}", history_path);

    Ok(())
}

fn run_pso(
    config_path: PathBuf,
    generations: Option<usize>,
    output: PathBuf,
    seed: Option<u64>,
    quiet: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let config = load_config(&config_path, generations)?;
    let seed = resolve_seed(seed);

    let mut artifacts = RunArtifacts::new(&output)?;
    let (fitness, test_source, n_inputs, n_outputs) = build_sources(&config, &artifacts, seed)?;

    println!("Starting swarm run");
    println!("  Particles: {}", config.run.population_size);
    println!(
        "  Topology: {:?} ({} in, {} out)",
        config.network.topology, n_inputs, n_outputs
    );
    println!(
        "  w={} wdamp={} c1={} c2={}",
        config.swarm.inertia, config.swarm.damping, config.swarm.cognitive, config.swarm.social
    );
    println!("  Generations: {}", config.run.generations);
    println!();

    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let positions = (0..config.run.population_size)
        .map(|_| {
            Network::random(
                &config.network.topology,
                n_inputs,
                n_outputs,
                config.network.init,
                &mut rng,
            )
        })
        .collect::<Result<Vec<Network>, _>>()?;

    let objective = move |net: &Network| fitness.evaluate(net);
    let mut swarm = SwarmTrainer::new(positions, config.swarm, objective, seed)?;
    let mut history = StatsHistory::new();
    let start = Instant::now();

    for _ in 0..config.run.generations {
        swarm.step()?;

        let mean = swarm.particles.iter().map(|p| p.fitness).sum::<f32>()
            / swarm.particles.len() as f32;
        let test_fitness = test_source
            .as_ref()
            .map(|source| evaluate_or(source, &swarm.global_best.position, 0.0));

        let stats = GenerationStats {
            generation: swarm.generation,
            best_fitness: swarm.global_best.fitness,
            mean_fitness: mean,
            test_fitness,
        };

        artifacts.write_swarm_generation(swarm.generation, &swarm.particles)?;
        artifacts.append_point(swarm.generation, stats.best_fitness, stats.test_fitness)?;

        if !quiet {
            println!("{}", stats.summary());
        }
        history.record(stats);
    }

    let elapsed = start.elapsed();
    let best_path = artifacts.write_best(&swarm.global_best.position)?;
    let history_path = output.join("stats_history.json");
    history.save(history_path.to_str().unwrap())?;

    println!();
    println!("=== Run Complete ===");
    println!("Time: {:.2}s", elapsed.as_secs_f64());
    println!("Global best: {:.4}", swarm.global_best.fitness);
    println!("Best network: {:?}", best_path);
    println!("Stats history: {:?}", history_path);

    Ok(())
}

fn run_sphere(
    dimensions: usize,
    population: usize,
    generations: usize,
    inertia: f32,
    damping: f32,
    c1: f32,
    c2: f32,
    seed: Option<u64>,
) -> Result<(), Box<dyn std::error::Error>> {
    let seed = resolve_seed(seed);
    let mut rng = ChaCha8Rng::seed_from_u64(seed);

    let positions: Vec<Vec<f32>> = (0..population)
        .map(|_| (0..dimensions).map(|_| rng.gen_range(-100.0..100.0)).collect())
        .collect();

    let params = SwarmParams {
        inertia,
        damping,
        cognitive: c1,
        social: c2,
        draw: RandomDraw::PerParticle,
        direction: Direction::Minimize,
    };
    let sphere = |v: &Vec<f32>| -> Result<f32, evonet::EvoError> {
        Ok(v.iter().map(|x| x * x).sum())
    };

    let mut swarm = SwarmTrainer::new(positions, params, sphere, seed)?;
    println!(
        "Minimizing the {}-dimensional sphere function with {} particles",
        dimensions, population
    );

    for generation in 1..=generations {
        swarm.step()?;
        if generation % 10 == 0 || generation == generations {
            println!(
                "Generation {:4}: best {:.6e}",
                generation, swarm.global_best.fitness
            );
        }
    }

    println!();
    println!("Final best: {:.6e}", swarm.global_best.fitness);
    println!("Position: {:?}", swarm.global_best.position);

    Ok(())
}

fn generate_config(output: PathBuf) -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::default();
    config.save(&output)?;
    println!("Configuration saved to: {:?}", output);
    Ok(())
}

fn inspect_network(path: PathBuf) -> Result<(), Box<dyn std::error::Error>> {
    println!("=== Network Analysis ===");
    println!("File: {:?}", path);
    println!();

    let net = encoding::from_file(&path)?;
    println!("Inputs: {}", net.n_inputs);
    println!("Outputs: {}", net.n_outputs);
    println!("Hidden layers: {:?}", net.topology);
    println!("Total weights: {}", net.weight_count());

    let flat = net.to_flat();
    let min = flat.iter().cloned().fold(f32::INFINITY, f32::min);
    let max = flat.iter().cloned().fold(f32::NEG_INFINITY, f32::max);
    let mean = flat.iter().sum::<f32>() / flat.len() as f32;
    println!();
    println!("Weight range: [{:.4}, {:.4}], mean {:.4}", min, max, mean);
    println!("Finite: {}", net.is_valid());

    Ok(())
}

fn summarize_dataset(path: PathBuf, delimiter: char) -> Result<(), Box<dyn std::error::Error>> {
    let dataset = Dataset::from_file(&path, delimiter)?;

    println!("Dataset at {:?} has the following attributes:", path);
    println!("  {} inputs", dataset.n_features());
    println!("  {} outputs", dataset.labels().len());
    println!("  {} instances", dataset.len());
    println!();
    println!("Labels: {:?}", dataset.labels());

    Ok(())
}
