//! Skip-gram word embeddings
//!
//! Trains dense word vectors on the tokenized corpus with skip-gram and
//! negative sampling. Training is seeded and single-threaded so the same
//! corpus, parameters and seed always yield the same vectors.

use std::collections::HashMap;
use std::fs;
use std::path::Path;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

use crate::config::PipelineConfig;
use crate::error::PipelineResult;

/// Negative samples drawn per positive pair
const NEGATIVE_SAMPLES: usize = 5;

/// Initial learning rate, decayed linearly over training
const INITIAL_LEARNING_RATE: f64 = 0.025;

/// Learning rate floor
const MIN_LEARNING_RATE: f64 = 1e-4;

/// Exponent applied to token counts for the negative-sampling distribution
const SAMPLING_POWER: f64 = 0.75;

/// Skip-gram training parameters
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmbeddingParams {
    /// Embedding dimensionality
    pub dim: usize,
    /// Context window radius on each side of the center token
    pub window: usize,
    /// Minimum corpus frequency for a token to enter the vocabulary
    pub min_count: usize,
    /// Passes over the corpus
    pub iterations: usize,
    /// Seed for initialization and negative sampling
    pub seed: u64,
}

impl From<&PipelineConfig> for EmbeddingParams {
    fn from(config: &PipelineConfig) -> Self {
        Self {
            dim: config.embedding_dim,
            window: config.window_size,
            min_count: config.min_token_freq,
            iterations: config.embedding_iterations,
            seed: config.seed,
        }
    }
}

/// Trained skip-gram embedding model
#[derive(Debug, Clone)]
pub struct SkipGramModel {
    dim: usize,
    vocab: Vec<String>,
    counts: Vec<u64>,
    index: HashMap<String, usize>,
    vectors: Vec<Vec<f64>>,
}

/// Serialized form of a [`SkipGramModel`]
#[derive(Debug, Serialize, Deserialize)]
struct SkipGramModelData {
    dim: usize,
    vocab: Vec<String>,
    counts: Vec<u64>,
    vectors: Vec<Vec<f64>>,
}

impl SkipGramModel {
    /// Train embeddings on a tokenized corpus.
    ///
    /// The vocabulary keeps tokens whose corpus frequency is at least
    /// `params.min_count`, ordered by descending count with ties broken
    /// alphabetically. Tokens outside the vocabulary are skipped when
    /// forming context windows.
    pub fn train(corpus: &[Vec<String>], params: &EmbeddingParams) -> Self {
        let (vocab, counts, index) = build_vocabulary(corpus, params.min_count);
        let mut rng = StdRng::seed_from_u64(params.seed);

        let mut input: Vec<Vec<f64>> = Vec::with_capacity(vocab.len());
        let mut output: Vec<Vec<f64>> = Vec::with_capacity(vocab.len());
        for _ in 0..vocab.len() {
            let row = (0..params.dim)
                .map(|_| (rng.gen::<f64>() - 0.5) / params.dim as f64)
                .collect();
            input.push(row);
            output.push(vec![0.0; params.dim]);
        }

        // Map documents to in-vocabulary index sequences once up front;
        // windows then close over dropped tokens.
        let encoded: Vec<Vec<usize>> = corpus
            .iter()
            .map(|doc| doc.iter().filter_map(|t| index.get(t).copied()).collect())
            .collect();

        let sampler = NegativeSampler::new(&counts);
        let total_tokens: usize = encoded.iter().map(|d| d.len()).sum();
        let total_steps = (params.iterations * total_tokens).max(1);
        let mut processed = 0usize;

        if !vocab.is_empty() && total_tokens > 0 {
            let mut gradient = vec![0.0; params.dim];
            for _ in 0..params.iterations {
                for doc in &encoded {
                    for (pos, &center) in doc.iter().enumerate() {
                        let lr = (INITIAL_LEARNING_RATE
                            * (1.0 - processed as f64 / total_steps as f64))
                            .max(MIN_LEARNING_RATE);
                        processed += 1;

                        let lo = pos.saturating_sub(params.window);
                        let hi = (pos + params.window + 1).min(doc.len());
                        for ctx_pos in lo..hi {
                            if ctx_pos == pos {
                                continue;
                            }
                            let context = doc[ctx_pos];
                            train_pair(
                                &mut input,
                                &mut output,
                                center,
                                context,
                                lr,
                                &sampler,
                                &mut rng,
                                &mut gradient,
                            );
                        }
                    }
                }
            }
        }

        tracing::info!(
            vocab = vocab.len(),
            dim = params.dim,
            iterations = params.iterations,
            "trained skip-gram embeddings"
        );

        Self {
            dim: params.dim,
            vocab,
            counts,
            index,
            vectors: input,
        }
    }

    /// Build a model from pretrained token vectors.
    ///
    /// All vectors must share one dimensionality and tokens must be unique.
    pub fn from_parts(tokens: Vec<String>, vectors: Vec<Vec<f64>>) -> PipelineResult<Self> {
        use crate::error::PipelineError;

        if tokens.len() != vectors.len() {
            return Err(PipelineError::InvalidConfig(format!(
                "embedding token/vector count mismatch: {} tokens, {} vectors",
                tokens.len(),
                vectors.len()
            )));
        }
        let dim = vectors.first().map(|v| v.len()).unwrap_or(0);
        if vectors.iter().any(|v| v.len() != dim) {
            return Err(PipelineError::InvalidConfig(
                "embedding vectors have inconsistent dimensionality".to_string(),
            ));
        }

        let mut index = HashMap::with_capacity(tokens.len());
        for (i, token) in tokens.iter().enumerate() {
            if index.insert(token.clone(), i).is_some() {
                return Err(PipelineError::InvalidConfig(format!(
                    "duplicate token in embedding vocabulary: {token}"
                )));
            }
        }

        let counts = vec![0; tokens.len()];
        Ok(Self {
            dim,
            vocab: tokens,
            counts,
            index,
            vectors,
        })
    }

    /// Embedding dimensionality
    pub fn dim(&self) -> usize {
        self.dim
    }

    /// Number of vocabulary entries
    pub fn vocab_len(&self) -> usize {
        self.vocab.len()
    }

    /// Vocabulary tokens in model order
    pub fn vocab(&self) -> &[String] {
        &self.vocab
    }

    /// Corpus frequency of a token, zero when out of vocabulary
    pub fn count(&self, token: &str) -> u64 {
        self.index.get(token).map(|&i| self.counts[i]).unwrap_or(0)
    }

    pub fn contains(&self, token: &str) -> bool {
        self.index.contains_key(token)
    }

    /// Vector for a token, `None` when out of vocabulary
    pub fn vector(&self, token: &str) -> Option<&[f64]> {
        self.index.get(token).map(|&i| self.vectors[i].as_slice())
    }

    pub fn to_json(&self) -> PipelineResult<String> {
        let data = SkipGramModelData {
            dim: self.dim,
            vocab: self.vocab.clone(),
            counts: self.counts.clone(),
            vectors: self.vectors.clone(),
        };
        Ok(serde_json::to_string(&data)?)
    }

    pub fn from_json(json: &str) -> PipelineResult<Self> {
        let data: SkipGramModelData = serde_json::from_str(json)?;
        let index = data
            .vocab
            .iter()
            .enumerate()
            .map(|(i, t)| (t.clone(), i))
            .collect();
        Ok(Self {
            dim: data.dim,
            vocab: data.vocab,
            counts: data.counts,
            index,
            vectors: data.vectors,
        })
    }

    pub fn save(&self, path: &Path) -> PipelineResult<()> {
        fs::write(path, self.to_json()?)?;
        Ok(())
    }

    pub fn load(path: &Path) -> PipelineResult<Self> {
        let json = fs::read_to_string(path)?;
        Self::from_json(&json)
    }
}

// ============================================================================
// Helper Functions
// ============================================================================

fn build_vocabulary(
    corpus: &[Vec<String>],
    min_count: usize,
) -> (Vec<String>, Vec<u64>, HashMap<String, usize>) {
    let mut freq: HashMap<&str, u64> = HashMap::new();
    for doc in corpus {
        for token in doc {
            *freq.entry(token.as_str()).or_insert(0) += 1;
        }
    }

    let mut entries: Vec<(&str, u64)> = freq
        .into_iter()
        .filter(|&(_, count)| count >= min_count as u64)
        .collect();
    entries.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(b.0)));

    let vocab: Vec<String> = entries.iter().map(|(t, _)| t.to_string()).collect();
    let counts: Vec<u64> = entries.iter().map(|&(_, c)| c).collect();
    let index = vocab
        .iter()
        .enumerate()
        .map(|(i, t)| (t.clone(), i))
        .collect();

    (vocab, counts, index)
}

/// Draws negative samples from the count^0.75 unigram distribution.
struct NegativeSampler {
    cumulative: Vec<f64>,
    total: f64,
}

impl NegativeSampler {
    fn new(counts: &[u64]) -> Self {
        let mut cumulative = Vec::with_capacity(counts.len());
        let mut total = 0.0;
        for &count in counts {
            total += (count as f64).powf(SAMPLING_POWER);
            cumulative.push(total);
        }
        Self { cumulative, total }
    }

    fn sample(&self, rng: &mut StdRng) -> usize {
        let r = rng.gen::<f64>() * self.total;
        self.cumulative.partition_point(|&c| c <= r).min(self.cumulative.len() - 1)
    }
}

#[allow(clippy::too_many_arguments)]
fn train_pair(
    input: &mut [Vec<f64>],
    output: &mut [Vec<f64>],
    center: usize,
    context: usize,
    lr: f64,
    sampler: &NegativeSampler,
    rng: &mut StdRng,
    gradient: &mut [f64],
) {
    gradient.iter_mut().for_each(|g| *g = 0.0);

    for d in 0..=NEGATIVE_SAMPLES {
        let (target, label) = if d == 0 {
            (context, 1.0)
        } else {
            let negative = sampler.sample(rng);
            if negative == context {
                continue;
            }
            (negative, 0.0)
        };

        let score: f64 = input[center]
            .iter()
            .zip(&output[target])
            .map(|(a, b)| a * b)
            .sum();
        let g = (label - sigmoid(score)) * lr;

        for k in 0..gradient.len() {
            gradient[k] += g * output[target][k];
        }
        let center_row = &input[center];
        for (k, out) in output[target].iter_mut().enumerate() {
            *out += g * center_row[k];
        }
    }

    for (k, value) in input[center].iter_mut().enumerate() {
        *value += gradient[k];
    }
}

fn sigmoid(x: f64) -> f64 {
    1.0 / (1.0 + (-x).exp())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_corpus() -> Vec<Vec<String>> {
        let docs = [
            "tax reform drives economic growth",
            "tax cuts slow economic growth",
            "healthcare reform expands coverage",
            "healthcare spending drives deficits",
            "immigration reform divides congress",
        ];
        docs.iter()
            .map(|d| d.split_whitespace().map(str::to_string).collect())
            .collect()
    }

    fn params() -> EmbeddingParams {
        EmbeddingParams {
            dim: 8,
            window: 2,
            min_count: 1,
            iterations: 3,
            seed: 7,
        }
    }

    #[test]
    fn test_vocabulary_ordering() {
        let model = SkipGramModel::train(&sample_corpus(), &params());
        // "reform" appears three times and sorts first; ties broken
        // alphabetically.
        assert_eq!(model.vocab()[0], "reform");
        assert_eq!(model.count("reform"), 3);
        let counts: Vec<u64> = model.vocab().iter().map(|t| model.count(t)).collect();
        for pair in counts.windows(2) {
            assert!(pair[0] >= pair[1]);
        }
    }

    #[test]
    fn test_min_count_filters_vocabulary() {
        let mut p = params();
        p.min_count = 2;
        let model = SkipGramModel::train(&sample_corpus(), &p);
        assert!(model.contains("reform"));
        assert!(model.contains("tax"));
        assert!(!model.contains("congress"));
    }

    #[test]
    fn test_training_is_deterministic() {
        let a = SkipGramModel::train(&sample_corpus(), &params());
        let b = SkipGramModel::train(&sample_corpus(), &params());
        assert_eq!(a.vocab(), b.vocab());
        for token in a.vocab() {
            assert_eq!(a.vector(token), b.vector(token));
        }

        let mut other = params();
        other.seed = 8;
        let c = SkipGramModel::train(&sample_corpus(), &other);
        assert_ne!(a.vector("reform"), c.vector("reform"));
    }

    #[test]
    fn test_vectors_have_requested_dim_and_are_finite() {
        let model = SkipGramModel::train(&sample_corpus(), &params());
        for token in model.vocab() {
            let v = model.vector(token).unwrap();
            assert_eq!(v.len(), 8);
            assert!(v.iter().all(|x| x.is_finite()));
        }
        assert!(model.vector("unseen").is_none());
    }

    #[test]
    fn test_empty_corpus_yields_empty_vocabulary() {
        let model = SkipGramModel::train(&[], &params());
        assert_eq!(model.vocab_len(), 0);
        assert!(model.vector("anything").is_none());
    }

    #[test]
    fn test_json_round_trip() {
        let model = SkipGramModel::train(&sample_corpus(), &params());
        let json = model.to_json().unwrap();
        let restored = SkipGramModel::from_json(&json).unwrap();
        assert_eq!(restored.dim(), model.dim());
        assert_eq!(restored.vocab(), model.vocab());
        assert_eq!(restored.vector("tax"), model.vector("tax"));
    }

    #[test]
    fn test_from_parts_validates_shape() {
        let ok = SkipGramModel::from_parts(
            vec!["left".to_string(), "right".to_string()],
            vec![vec![1.0, 0.0], vec![0.0, 1.0]],
        );
        assert!(ok.is_ok());
        assert_eq!(ok.unwrap().vector("left"), Some(&[1.0, 0.0][..]));

        let bad = SkipGramModel::from_parts(
            vec!["left".to_string()],
            vec![vec![1.0], vec![0.0]],
        );
        assert!(bad.is_err());

        let ragged = SkipGramModel::from_parts(
            vec!["left".to_string(), "right".to_string()],
            vec![vec![1.0, 0.0], vec![0.0]],
        );
        assert!(ragged.is_err());
    }
}
