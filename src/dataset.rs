//! Labeled dataset parsing and train/test splitting.
//!
//! A dataset file is one row per line: delimiter-separated numeric
//! feature columns followed by one opaque label token in the last column.

use crate::error::EvoError;
use rand::seq::SliceRandom;
use rand::Rng;
use std::io::Write;
use std::path::Path;

/// One labeled instance.
#[derive(Clone, Debug, PartialEq)]
pub struct Row {
    pub features: Vec<f32>,
    pub label: String,
}

/// An in-memory labeled dataset.
#[derive(Clone, Debug, Default)]
pub struct Dataset {
    pub rows: Vec<Row>,
}

impl Dataset {
    /// Parse a dataset from a delimiter-separated text file.
    pub fn from_file<P: AsRef<Path>>(path: P, delimiter: char) -> Result<Self, EvoError> {
        let text = std::fs::read_to_string(&path)?;
        Self::parse(&text, delimiter).map_err(|e| {
            EvoError::Configuration(format!("{}: {}", path.as_ref().display(), e))
        })
    }

    /// Parse a dataset from text. Blank lines are skipped.
    pub fn parse(text: &str, delimiter: char) -> Result<Self, String> {
        let mut rows = Vec::new();
        let mut n_features = None;

        for (line_no, line) in text.lines().enumerate() {
            let line = line.trim();
            if line.is_empty() {
                continue;
            }

            let columns: Vec<&str> = line.split(delimiter).collect();
            if columns.len() < 2 {
                return Err(format!(
                    "line {}: need at least one feature and a label",
                    line_no + 1
                ));
            }

            let (feature_cols, label) = columns.split_at(columns.len() - 1);
            let features = feature_cols
                .iter()
                .map(|c| {
                    c.trim()
                        .parse::<f32>()
                        .map_err(|_| format!("line {}: bad feature '{}'", line_no + 1, c))
                })
                .collect::<Result<Vec<f32>, String>>()?;

            match n_features {
                None => n_features = Some(features.len()),
                Some(n) if n != features.len() => {
                    return Err(format!(
                        "line {}: {} features, expected {}",
                        line_no + 1,
                        features.len(),
                        n
                    ));
                }
                Some(_) => {}
            }

            rows.push(Row {
                features,
                label: label[0].trim().to_string(),
            });
        }

        if rows.is_empty() {
            return Err("no data rows".to_string());
        }

        Ok(Self { rows })
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Feature column count.
    pub fn n_features(&self) -> usize {
        self.rows.first().map_or(0, |r| r.features.len())
    }

    /// Distinct labels in first-seen order.
    pub fn labels(&self) -> Vec<String> {
        let mut labels: Vec<String> = Vec::new();
        for row in &self.rows {
            if !labels.iter().any(|l| l == &row.label) {
                labels.push(row.label.clone());
            }
        }
        labels
    }

    /// Shuffle and split into training and testing sets.
    pub fn split<R: Rng>(&self, train_fraction: f32, rng: &mut R) -> (Dataset, Dataset) {
        let mut rows = self.rows.clone();
        rows.shuffle(rng);

        let train_size = (train_fraction * rows.len() as f32) as usize;
        let test_rows = rows.split_off(train_size);

        (Dataset { rows }, Dataset { rows: test_rows })
    }

    /// Write the dataset back out in its file form.
    pub fn save<P: AsRef<Path>>(&self, path: P, delimiter: char) -> Result<(), EvoError> {
        let mut file = std::fs::File::create(path)?;
        for row in &self.rows {
            for feature in &row.features {
                write!(file, "{}{}", feature, delimiter)?;
            }
            writeln!(file, "{}", row.label)?;
        }
        Ok(())
    }
}
