//! Per-generation statistics tracking.

use serde::{Deserialize, Serialize};

/// Statistics snapshot for one generation.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct GenerationStats {
    pub generation: usize,
    pub best_fitness: f32,
    pub mean_fitness: f32,
    /// Held-out score of the generation's best candidate, when a test
    /// set exists.
    pub test_fitness: Option<f32>,
}

impl GenerationStats {
    /// Format as a one-line summary.
    pub fn summary(&self) -> String {
        match self.test_fitness {
            Some(test) => format!(
                "Gen:{:4} | Best:{:.4} | Mean:{:.4} | Test:{:.4}",
                self.generation, self.best_fitness, self.mean_fitness, test
            ),
            None => format!(
                "Gen:{:4} | Best:{:.4} | Mean:{:.4}",
                self.generation, self.best_fitness, self.mean_fitness
            ),
        }
    }
}

/// Historical statistics tracker for a whole run.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct StatsHistory {
    pub snapshots: Vec<GenerationStats>,
}

impl StatsHistory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a generation snapshot.
    pub fn record(&mut self, stats: GenerationStats) {
        self.snapshots.push(stats);
    }

    /// Best fitness over time.
    pub fn best_series(&self) -> Vec<(usize, f32)> {
        self.snapshots
            .iter()
            .map(|s| (s.generation, s.best_fitness))
            .collect()
    }

    /// Save history to a JSON file.
    pub fn save(&self, path: &str) -> std::io::Result<()> {
        let json = serde_json::to_string(self)?;
        std::fs::write(path, json)
    }

    /// Load history from a JSON file.
    pub fn load(path: &str) -> std::io::Result<Self> {
        let json = std::fs::read_to_string(path)?;
        serde_json::from_str(&json)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_summary_formats() {
        let stats = GenerationStats {
            generation: 3,
            best_fitness: 0.91,
            mean_fitness: 0.62,
            test_fitness: None,
        };
        assert!(stats.summary().contains("Best:0.9100"));
        assert!(!stats.summary().contains("Test"));

        let with_test = GenerationStats {
            test_fitness: Some(0.8),
            ..stats
        };
        assert!(with_test.summary().contains("Test:0.8000"));
    }

    #[test]
    fn test_history_series() {
        let mut history = StatsHistory::new();
        for i in 0..5 {
            history.record(GenerationStats {
                generation: i,
                best_fitness: i as f32 / 10.0,
                mean_fitness: 0.0,
                test_fitness: None,
            });
        }

        let series = history.best_series();
        assert_eq!(series.len(), 5);
        assert_eq!(series[4], (4, 0.4));
    }

    #[test]
    fn test_history_file_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("history.json");

        let mut history = StatsHistory::new();
        history.record(GenerationStats {
            generation: 1,
            best_fitness: 0.5,
            mean_fitness: 0.25,
            test_fitness: Some(0.4),
        });

        history.save(path.to_str().unwrap()).unwrap();
        let loaded = StatsHistory::load(path.to_str().unwrap()).unwrap();
        assert_eq!(loaded.snapshots.len(), 1);
        assert_eq!(loaded.snapshots[0].test_fitness, Some(0.4));
    }
}
