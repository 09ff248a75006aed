//! Pair generation for verification-mode evaluation.
//!
//! A [`PairGenerator`] turns a table of [`FaceSample`] rows into labelled
//! pairs under one of two strategies:
//!
//! - [`PairingStrategy::AugmentationOnly`]: each identity's original row
//!   against each of its augmented rows. Genuine pairs only, so FMR in this
//!   mode is always `0.0` and does not measure false matches.
//! - [`PairingStrategy::IdentityWithImpostorCap`]: every same-identity pair,
//!   plus cross-identity impostor pairs up to a global cap. The cap is not
//!   stratified by group; pre-stratify the input for balanced coverage.
//!
//! Pairing and scoring are separate steps: [`PairGenerator::candidates`]
//! yields index pairs, and [`PairGenerator::pairs`] scores them with any
//! similarity function ([`cosine_similarity`] by default).

mod similarity;

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

pub use similarity::cosine_similarity;

/// Augmentation tag of an identity's unmodified image.
pub const ORIGINAL: &str = "original";

/// Default global cap on impostor pairs.
pub const DEFAULT_IMPOSTOR_CAP: usize = 1000;

fn default_augmentation() -> String {
    ORIGINAL.to_string()
}

/// One embedded face image.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FaceSample {
    /// Row identifier (usually the image path).
    pub id: String,
    /// Person the image belongs to.
    pub identity: String,
    /// Protected-group tag.
    pub group: String,
    /// Augmentation applied to the image, `"original"` for none.
    #[serde(default = "default_augmentation")]
    pub augmentation: String,
    /// Embedding produced by the external model.
    pub embedding: Vec<f64>,
}

/// How pairs are formed from the sample table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PairingStrategy {
    /// Original vs. augmented rows of the same identity; genuine only.
    AugmentationOnly,
    /// All same-identity pairs plus at most `cap` impostor pairs.
    IdentityWithImpostorCap {
        /// Global impostor-pair cap.
        cap: usize,
    },
}

impl Default for PairingStrategy {
    fn default() -> Self {
        Self::IdentityWithImpostorCap {
            cap: DEFAULT_IMPOSTOR_CAP,
        }
    }
}

impl PairingStrategy {
    /// Short name used in report metadata and on the command line.
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Self::AugmentationOnly => "augmentation",
            Self::IdentityWithImpostorCap { .. } => "identity",
        }
    }

    /// Whether the strategy can produce impostor pairs.
    #[must_use]
    pub fn produces_impostors(&self) -> bool {
        matches!(self, Self::IdentityWithImpostorCap { cap } if *cap > 0)
    }
}

/// Unscored pair of row indices into the sample table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CandidatePair {
    /// Index of the left row.
    pub left: usize,
    /// Index of the right row.
    pub right: usize,
    /// Whether both rows share an identity.
    pub genuine: bool,
}

/// Scored pair, the unit of verification-mode metrics.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Pair {
    /// Id of the left sample.
    pub left_id: String,
    /// Id of the right sample.
    pub right_id: String,
    /// `true` for same identity, `false` for impostor.
    pub genuine: bool,
    /// Group tag of the left row.
    pub group: String,
    /// Augmentation tag of the right row.
    pub augmentation: String,
    /// Similarity of the two embeddings.
    pub similarity: f64,
}

/// Builds pairs according to a [`PairingStrategy`].
#[derive(Debug, Clone, Copy, Default)]
pub struct PairGenerator {
    strategy: PairingStrategy,
}

impl PairGenerator {
    #[must_use]
    pub fn new(strategy: PairingStrategy) -> Self {
        Self { strategy }
    }

    #[must_use]
    pub fn strategy(&self) -> PairingStrategy {
        self.strategy
    }

    /// Index pairs for `samples`, genuine pairs first.
    #[must_use]
    pub fn candidates(&self, samples: &[FaceSample]) -> Vec<CandidatePair> {
        let identities = rows_by_identity(samples);
        match self.strategy {
            PairingStrategy::AugmentationOnly => augmentation_pairs(samples, &identities),
            PairingStrategy::IdentityWithImpostorCap { cap } => {
                let mut pairs = genuine_pairs(&identities);
                pairs.extend(impostor_pairs(samples, cap));
                pairs
            }
        }
    }

    /// Generate pairs and score them with `similarity`.
    ///
    /// Fails with [`Error::InvalidPartition`] if a sample has no identity,
    /// and propagates errors from `similarity`.
    pub fn pairs<F>(&self, samples: &[FaceSample], similarity: F) -> Result<Vec<Pair>>
    where
        F: Fn(&[f64], &[f64]) -> Result<f64>,
    {
        if let Some(index) = samples.iter().position(|s| s.identity.is_empty()) {
            return Err(Error::InvalidPartition {
                reason: format!("sample {index} has no identity"),
            });
        }

        let candidates = self.candidates(samples);
        let genuine = candidates.iter().filter(|c| c.genuine).count();
        log::info!(
            "Generated {} pairs ({} genuine, {} impostor) with {} pairing",
            candidates.len(),
            genuine,
            candidates.len() - genuine,
            self.strategy.name()
        );

        candidates
            .into_iter()
            .map(|c| {
                let left = &samples[c.left];
                let right = &samples[c.right];
                Ok(Pair {
                    left_id: left.id.clone(),
                    right_id: right.id.clone(),
                    genuine: c.genuine,
                    group: left.group.clone(),
                    augmentation: right.augmentation.clone(),
                    similarity: similarity(&left.embedding, &right.embedding)?,
                })
            })
            .collect()
    }

    /// Generate pairs scored by cosine similarity.
    pub fn cosine_pairs(&self, samples: &[FaceSample]) -> Result<Vec<Pair>> {
        self.pairs(samples, cosine_similarity)
    }
}

/// Row indices per identity, identities in first-seen order.
fn rows_by_identity(samples: &[FaceSample]) -> Vec<Vec<usize>> {
    let mut index: HashMap<&str, usize> = HashMap::new();
    let mut rows: Vec<Vec<usize>> = Vec::new();
    for (i, sample) in samples.iter().enumerate() {
        let slot = *index.entry(sample.identity.as_str()).or_insert_with(|| {
            rows.push(Vec::new());
            rows.len() - 1
        });
        rows[slot].push(i);
    }
    rows
}

fn augmentation_pairs(samples: &[FaceSample], identities: &[Vec<usize>]) -> Vec<CandidatePair> {
    let mut pairs = Vec::new();
    for rows in identities {
        let Some(&original) = rows.iter().find(|&&i| samples[i].augmentation == ORIGINAL) else {
            log::debug!("Identity {} has no original row", samples[rows[0]].identity);
            continue;
        };
        pairs.extend(
            rows.iter()
                .filter(|&&i| samples[i].augmentation != ORIGINAL)
                .map(|&right| CandidatePair {
                    left: original,
                    right,
                    genuine: true,
                }),
        );
    }
    pairs
}

fn genuine_pairs(identities: &[Vec<usize>]) -> Vec<CandidatePair> {
    let mut pairs = Vec::new();
    for rows in identities.iter().filter(|rows| rows.len() >= 2) {
        for (a, &left) in rows.iter().enumerate() {
            for &right in &rows[a + 1..] {
                pairs.push(CandidatePair {
                    left,
                    right,
                    genuine: true,
                });
            }
        }
    }
    pairs
}

/// Cross-identity pairs in row order until `cap` is reached.
fn impostor_pairs(samples: &[FaceSample], cap: usize) -> Vec<CandidatePair> {
    let mut pairs = Vec::new();
    if cap == 0 {
        return pairs;
    }
    for left in 0..samples.len() {
        for right in left + 1..samples.len() {
            if samples[left].identity != samples[right].identity {
                pairs.push(CandidatePair {
                    left,
                    right,
                    genuine: false,
                });
                if pairs.len() >= cap {
                    return pairs;
                }
            }
        }
    }
    pairs
}
