//! Fitness evaluation strategies.
//!
//! A fitness source maps a network to a scalar score without mutating it.
//! Two strategies are provided: classification accuracy against an
//! in-memory dataset, and an external scoring command for candidates that
//! can only be judged inside a simulator.

use crate::dataset::Dataset;
use crate::error::EvoError;
use crate::neural::{encoding, Network};
use std::process::Command;

/// A pluggable fitness function.
pub trait FitnessSource: Send + Sync {
    fn evaluate(&self, net: &Network) -> Result<f32, EvoError>;
}

/// Evaluate through a source, isolating per-candidate failures.
///
/// A failed evaluation is logged and scored with `fallback` (the run's
/// worst value) so one bad candidate never aborts a generation.
pub fn evaluate_or(source: &dyn FitnessSource, net: &Network, fallback: f32) -> f32 {
    match source.evaluate(net) {
        Ok(score) => score,
        Err(e) => {
            log::warn!("evaluation failed, scoring {}: {}", fallback, e);
            fallback
        }
    }
}

/// Index of the largest value; the first wins a tie.
fn argmax(values: &[f32]) -> usize {
    let mut best = 0;
    for (i, &v) in values.iter().enumerate().skip(1) {
        if v > values[best] {
            best = i;
        }
    }
    best
}

/// Classification accuracy over a labeled dataset, in `[0, 1]`.
///
/// The label list is re-derived from the evaluated rows on every call
/// (first-seen order), so scores from differently-sampled datasets are
/// only comparable when their label sets coincide.
pub struct ClassificationFitness {
    dataset: Dataset,
}

impl ClassificationFitness {
    pub fn new(dataset: Dataset) -> Self {
        Self { dataset }
    }

    pub fn dataset(&self) -> &Dataset {
        &self.dataset
    }
}

impl FitnessSource for ClassificationFitness {
    fn evaluate(&self, net: &Network) -> Result<f32, EvoError> {
        if self.dataset.is_empty() {
            return Err(EvoError::Configuration(
                "cannot score against an empty dataset".to_string(),
            ));
        }
        let labels = self.dataset.labels();

        let mut correct = 0usize;
        for row in &self.dataset.rows {
            let outputs = net.forward(&row.features)?;
            let predicted = argmax(&outputs);
            let actual = labels
                .iter()
                .position(|l| l == &row.label)
                .expect("label came from this dataset");

            if predicted == actual {
                correct += 1;
            }
        }

        Ok(correct as f32 / self.dataset.len() as f32)
    }
}

/// Mean score over repeated runs of an external scoring command.
///
/// The command is invoked with the candidate's serialized file path as its
/// single argument and must print one scalar on stdout. Scores vary
/// between invocations, so `samples` runs are averaged.
pub struct ExternalFitness {
    command: String,
    samples: usize,
}

impl ExternalFitness {
    pub fn new(command: String, samples: usize) -> Self {
        Self {
            command,
            samples: samples.max(1),
        }
    }

    fn run_once(&self, net_path: &std::path::Path) -> Result<f32, EvoError> {
        let output = Command::new(&self.command)
            .arg(net_path)
            .output()
            .map_err(|e| EvoError::ExternalScore(format!("{}: {}", self.command, e)))?;

        if !output.status.success() {
            return Err(EvoError::ExternalScore(format!(
                "{} exited with {}",
                self.command, output.status
            )));
        }

        let stdout = String::from_utf8_lossy(&output.stdout);
        stdout.trim().parse::<f32>().map_err(|_| {
            EvoError::ExternalScore(format!(
                "{} printed '{}', expected a scalar",
                self.command,
                stdout.trim()
            ))
        })
    }
}

impl FitnessSource for ExternalFitness {
    fn evaluate(&self, net: &Network) -> Result<f32, EvoError> {
        let file = tempfile::Builder::new()
            .prefix("candidate")
            .suffix(".net")
            .tempfile()?;
        encoding::to_file(net, file.path())?;

        let mut total = 0.0;
        for _ in 0..self.samples {
            total += self.run_once(file.path())?;
        }
        Ok(total / self.samples as f32)
    }
}
