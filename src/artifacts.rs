//! Per-generation run artifacts.
//!
//! Each generation gets its own directory of serialized networks plus an
//! `index.csv` of `fitness,network_filename`; the run keeps one
//! `points.csv` with a row per generation.

use crate::error::EvoError;
use crate::genetic::Organism;
use crate::neural::{encoding, Network};
use crate::swarm::Particle;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

/// Writer for a single run's on-disk artifacts.
pub struct RunArtifacts {
    root: PathBuf,
    points: BufWriter<File>,
}

impl RunArtifacts {
    /// Create the run directory and its points log.
    pub fn new<P: AsRef<Path>>(root: P) -> Result<Self, EvoError> {
        let root = root.as_ref().to_path_buf();
        std::fs::create_dir_all(&root)?;

        let points = BufWriter::new(File::create(root.join("points.csv"))?);
        Ok(Self { root, points })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn generation_dir(&self, generation: usize) -> PathBuf {
        self.root.join(format!("generation{}", generation))
    }

    /// Persist a genetic generation: every organism's network plus the
    /// index rows.
    pub fn write_generation(
        &mut self,
        generation: usize,
        organisms: &[Organism],
    ) -> Result<(), EvoError> {
        let dir = self.generation_dir(generation);
        std::fs::create_dir_all(&dir)?;

        let mut index = BufWriter::new(File::create(dir.join("index.csv"))?);
        for organism in organisms {
            encoding::to_file(&organism.net, dir.join(&organism.name))?;
            writeln!(index, "{},{}", organism.fitness, organism.name)?;
        }
        index.flush()?;
        Ok(())
    }

    /// Persist a swarm generation: every particle's position network plus
    /// the index rows.
    pub fn write_swarm_generation(
        &mut self,
        generation: usize,
        particles: &[Particle<Network>],
    ) -> Result<(), EvoError> {
        let dir = self.generation_dir(generation);
        std::fs::create_dir_all(&dir)?;

        let mut index = BufWriter::new(File::create(dir.join("index.csv"))?);
        for (i, particle) in particles.iter().enumerate() {
            let name = format!("p{}.net", i);
            encoding::to_file(&particle.position, dir.join(&name))?;
            writeln!(index, "{},{}", particle.fitness, name)?;
        }
        index.flush()?;
        Ok(())
    }

    /// Append one row to the run-level points log.
    pub fn append_point(
        &mut self,
        generation: usize,
        fitness: f32,
        test_fitness: Option<f32>,
    ) -> Result<(), EvoError> {
        match test_fitness {
            Some(test) => writeln!(self.points, "{},{},{}", generation, fitness, test)?,
            None => writeln!(self.points, "{},{}", generation, fitness)?,
        }
        self.points.flush()?;
        Ok(())
    }

    /// Persist the run's best network at the top level.
    pub fn write_best(&self, net: &Network) -> Result<PathBuf, EvoError> {
        let path = self.root.join("best.net");
        encoding::to_file(net, &path)?;
        Ok(path)
    }
}
