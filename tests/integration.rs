//! Integration tests for evonet

use evonet::artifacts::RunArtifacts;
use evonet::config::{Config, FitnessConfig};
use evonet::dataset::Dataset;
use evonet::fitness::{ClassificationFitness, ExternalFitness, FitnessSource};
use evonet::genetic::SelectionPolicy;
use evonet::neural::{encoding, InitPolicy, Network};
use evonet::swarm::{Direction, SwarmParams, SwarmTrainer};
use evonet::{EvoError, GeneticTrainer};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

const DATASET: &str = "\
5.1,3.5,1.4,0.2,setosa
4.9,3.0,1.4,0.2,setosa
6.4,3.2,4.5,1.5,versicolor
6.9,3.1,4.9,1.5,versicolor
5.8,2.7,5.1,1.9,virginica
6.3,2.9,5.6,1.8,virginica
5.0,3.6,1.4,0.2,setosa
5.5,2.3,4.0,1.3,versicolor
6.5,3.0,5.8,2.2,virginica
4.7,3.2,1.3,0.2,setosa
6.0,2.9,4.5,1.5,versicolor
7.1,3.0,5.9,2.1,virginica
";

fn small_config() -> Config {
    let mut config = Config::default();
    config.network.topology = vec![5, 5];
    config.run.population_size = 10;
    config.run.survival_fraction = 0.4;
    config.run.generations = 3;
    config
}

fn dataset_fitness() -> (Box<dyn FitnessSource>, usize, usize) {
    let dataset = Dataset::parse(DATASET, ',').unwrap();
    let n_inputs = dataset.n_features();
    let n_outputs = dataset.labels().len();
    (
        Box::new(ClassificationFitness::new(dataset)),
        n_inputs,
        n_outputs,
    )
}

#[test]
fn test_full_genetic_cycle() {
    let (fitness, n_inputs, n_outputs) = dataset_fitness();
    let mut trainer =
        GeneticTrainer::new(small_config(), n_inputs, n_outputs, fitness, 12345).unwrap();

    for _ in 0..3 {
        trainer.step().unwrap();

        assert_eq!(trainer.population.len(), 10);
        for org in &trainer.population {
            assert!(org.net.is_valid());
            assert!((0.0..=1.0).contains(&org.fitness));
            assert_eq!(org.net.topology, vec![5, 5]);
        }
    }
    assert_eq!(trainer.generation, 3);
}

#[test]
fn test_genetic_run_is_reproducible() {
    let run = |seed: u64| {
        let (fitness, n_inputs, n_outputs) = dataset_fitness();
        let mut trainer =
            GeneticTrainer::new(small_config(), n_inputs, n_outputs, fitness, seed).unwrap();
        trainer.run(3).unwrap();
        trainer
            .population
            .iter()
            .map(|o| o.net.to_flat())
            .collect::<Vec<Vec<f32>>>()
    };

    assert_eq!(run(99), run(99));
    assert_ne!(run(99), run(100));
}

#[test]
fn test_generation_artifacts_on_disk() {
    let dir = tempfile::tempdir().unwrap();
    let mut artifacts = RunArtifacts::new(dir.path().join("run")).unwrap();

    let (fitness, n_inputs, n_outputs) = dataset_fitness();
    let mut trainer =
        GeneticTrainer::new(small_config(), n_inputs, n_outputs, fitness, 7).unwrap();

    for _ in 0..2 {
        trainer.step().unwrap();
        artifacts
            .write_generation(trainer.generation, &trainer.population)
            .unwrap();
        artifacts
            .append_point(trainer.generation, trainer.best().fitness, None)
            .unwrap();
    }

    for generation in 1..=2 {
        let gen_dir = dir.path().join(format!("run/generation{}", generation));
        let index = std::fs::read_to_string(gen_dir.join("index.csv")).unwrap();
        assert_eq!(index.lines().count(), 10);

        for line in index.lines() {
            let (fitness, name) = line.split_once(',').unwrap();
            fitness.parse::<f32>().unwrap();
            let net = encoding::from_file(gen_dir.join(name)).unwrap();
            assert_eq!(net.topology, vec![5, 5]);
        }
    }

    let points = std::fs::read_to_string(dir.path().join("run/points.csv")).unwrap();
    assert_eq!(points.lines().count(), 2);
}

#[test]
fn test_best_network_survives_persistence() {
    let dir = tempfile::tempdir().unwrap();
    let artifacts = RunArtifacts::new(dir.path().join("run")).unwrap();

    let (fitness, n_inputs, n_outputs) = dataset_fitness();
    let mut trainer =
        GeneticTrainer::new(small_config(), n_inputs, n_outputs, fitness, 3).unwrap();
    trainer.run(2).unwrap();

    let best = trainer.best();
    let path = artifacts.write_best(&best.net).unwrap();
    let loaded = encoding::from_file(path).unwrap();
    assert_eq!(loaded, best.net);

    // the persisted network scores identically
    let dataset = Dataset::parse(DATASET, ',').unwrap();
    let source = ClassificationFitness::new(dataset);
    assert_eq!(
        source.evaluate(&loaded).unwrap(),
        source.evaluate(&best.net).unwrap()
    );
}

#[test]
fn test_end_to_end_forward_through_file() {
    let mut rng = ChaCha8Rng::seed_from_u64(55);
    let net = Network::random(&[5, 5], 4, 3, InitPolicy::default(), &mut rng).unwrap();
    let inputs = [1.0, 2.0, 3.0, 4.0];

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("net.net");
    encoding::to_file(&net, &path).unwrap();
    let loaded = encoding::from_file(&path).unwrap();

    let original = net.forward(&inputs).unwrap();
    let reloaded = loaded.forward(&inputs).unwrap();

    assert_eq!(original.len(), 3);
    assert_eq!(original, reloaded);
}

#[test]
fn test_sphere_swarm_converges() {
    let mut rng = ChaCha8Rng::seed_from_u64(21);
    let positions: Vec<Vec<f32>> = (0..30)
        .map(|_| (0..7).map(|_| rng.gen_range(-100.0..100.0)).collect())
        .collect();

    let params = SwarmParams {
        direction: Direction::Minimize,
        inertia: 1.0,
        damping: 0.99,
        cognitive: 2.0,
        social: 2.0,
        ..SwarmParams::default()
    };
    let sphere = |v: &Vec<f32>| -> Result<f32, EvoError> {
        Ok(v.iter().map(|x| x * x).sum())
    };

    let mut swarm = SwarmTrainer::new(positions, params, sphere, 21).unwrap();
    let start = swarm.global_best.fitness;
    swarm.run(100).unwrap();

    assert!(swarm.global_best.fitness < start / 10.0);
}

#[test]
fn test_pso_trains_networks_against_dataset() {
    let dataset = Dataset::parse(DATASET, ',').unwrap();
    let (n_inputs, n_outputs) = (dataset.n_features(), dataset.labels().len());
    let source = ClassificationFitness::new(dataset);

    let mut rng = ChaCha8Rng::seed_from_u64(33);
    let positions: Vec<Network> = (0..15)
        .map(|_| Network::random(&[6], n_inputs, n_outputs, InitPolicy::default(), &mut rng).unwrap())
        .collect();

    let params = SwarmParams::default(); // maximize
    let objective = move |net: &Network| source.evaluate(net);
    let mut swarm = SwarmTrainer::new(positions, params, objective, 33).unwrap();

    let mut previous = swarm.global_best.fitness;
    for _ in 0..10 {
        swarm.step().unwrap();
        assert!(swarm.global_best.fitness >= previous);
        previous = swarm.global_best.fitness;
    }

    assert!((0.0..=1.0).contains(&swarm.global_best.fitness));
    for particle in &swarm.particles {
        assert!(particle.position.same_shape(&particle.velocity));
    }
}

#[test]
fn test_failed_scorer_is_isolated_not_fatal() {
    // every evaluation fails; initialization must survive with
    // worst-scored organisms rather than aborting
    let mut config = small_config();
    config.genetic.selection = SelectionPolicy::Truncation;
    config.fitness = FitnessConfig::External {
        command: "/nonexistent/scorer".to_string(),
        samples: 1,
    };
    config.network.n_inputs = Some(4);
    config.network.n_outputs = Some(3);

    let fitness = Box::new(ExternalFitness::new("/nonexistent/scorer".to_string(), 1));
    let trainer = GeneticTrainer::new(config, 4, 3, fitness, 1).unwrap();

    assert_eq!(trainer.population.len(), 10);
    assert!(trainer.population.iter().all(|o| o.fitness == 0.0));
}

#[test]
fn test_all_zero_fitness_is_degenerate_for_reproduction() {
    let mut config = small_config();
    config.genetic.selection = SelectionPolicy::Truncation;

    let fitness = Box::new(ExternalFitness::new("/nonexistent/scorer".to_string(), 1));
    let mut trainer = GeneticTrainer::new(config, 4, 3, fitness, 1).unwrap();

    // truncation selection tolerates the zero-sum pool, but the
    // fitness-proportionate parent draw cannot
    assert!(matches!(
        trainer.step(),
        Err(EvoError::DegenerateDistribution)
    ));
}
