//! Pipeline engine
//!
//! Runs the staged batch pipeline: ingest, tokenize, embed, vectorize,
//! split, filter, train, evaluate, cross-validate, report. Each stage
//! completes before the next begins and every stage output lands in one
//! [`PipelineRun`] aggregate, so nothing accumulates in shared state. A
//! model family that fails to train is recorded and its siblings keep
//! running; the comparison report is produced from whatever succeeded.

use std::fs;
use std::path::Path;

use ndarray::{Array2, Axis};

use crate::classifiers::{Classifier, KernelSvmClassifier, RandomForestClassifier};
use crate::config::PipelineConfig;
use crate::corpus::{filter_short_documents, Document};
use crate::crossval::{CrossValidator, CvSummary};
use crate::embedding::{EmbeddingParams, SkipGramModel};
use crate::error::{PipelineError, PipelineResult};
use crate::features::VarianceFilter;
use crate::metrics::MetricBundle;
use crate::report::{
    write_confusion_csv, write_cv_csv, write_predictions_csv, ComparisonReport, PredictionRow,
};
use crate::split::{train_test_split, SplitIndices};
use crate::tokenizers::WordTokenizer;
use crate::vectorizer::DocumentVectorizer;

/// Model families the engine trains on every run.
const MODEL_FAMILIES: &[&str] = &[
    crate::classifiers::kernel_svm::MODEL_NAME,
    crate::classifiers::random_forest::MODEL_NAME,
];

/// A model family that could not complete training or cross-validation
#[derive(Debug, Clone)]
pub struct ModelFailure {
    pub model: String,
    pub stage: String,
    pub reason: String,
}

/// Every stage output of one pipeline run, by name
pub struct PipelineRun {
    /// Documents that survived the minimum-length policy
    pub documents: Vec<Document>,
    /// Documents excluded at ingestion
    pub excluded_documents: usize,
    /// Token sequences, one per surviving document
    pub corpus: Vec<Vec<String>>,
    /// Embedding model trained over the full corpus
    pub embedding: SkipGramModel,
    /// Scaled document vectors before column filtering
    pub vectors: Array2<f64>,
    /// Documents whose vector fell back to all zeros
    pub empty_documents: usize,
    /// Non-finite vector components coerced to zero
    pub coerced_values: usize,
    /// Variance filter fitted on the training rows
    pub variance_filter: VarianceFilter,
    /// Document vectors projected onto the retained columns
    pub features: Array2<f64>,
    pub split: SplitIndices,
    /// Successfully trained models, at most one per family
    pub models: Vec<Box<dyn Classifier>>,
    pub failures: Vec<ModelFailure>,
    /// Train and test bundles for every trained model
    pub bundles: Vec<MetricBundle>,
    /// Test-split predictions for every trained model
    pub predictions: Vec<PredictionRow>,
    pub cv_summaries: Vec<CvSummary>,
    pub report: ComparisonReport,
}

/// Staged batch pipeline over labeled documents
pub struct PipelineEngine {
    config: PipelineConfig,
}

impl PipelineEngine {
    pub fn new(config: PipelineConfig) -> PipelineResult<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Run the whole pipeline over a labeled document collection.
    ///
    /// Aborts only on corpus-level impossibilities (too few documents to
    /// split). Family-level failures are recorded in the run and leave
    /// the other family's results intact.
    pub fn run(&self, documents: Vec<Document>) -> PipelineResult<PipelineRun> {
        let config = &self.config;

        // Stage 1: ingestion policy
        let (documents, excluded_documents) =
            filter_short_documents(documents, config.min_doc_chars);
        if documents.len() < 2 {
            return Err(PipelineError::DegenerateSplit(format!(
                "{} document(s) left after the minimum-length filter",
                documents.len()
            )));
        }

        // Stage 2: tokenization
        let tokenizer = WordTokenizer::new();
        let corpus = tokenizer.tokenize_corpus(&documents);

        // Stage 3: embedding training over the full token corpus
        let embedding = SkipGramModel::train(&corpus, &EmbeddingParams::from(config));

        // Stage 4: document vectors
        let outcome = DocumentVectorizer::new(config.aggregation).vectorize(&corpus, &embedding);

        // Stage 5: stratified split
        let labels: Vec<String> = documents.iter().map(|d| d.label.clone()).collect();
        let split = train_test_split(&labels, config.train_fraction, config.seed)?;

        // Stage 6: variance filter fitted on training rows only
        let variance_filter =
            VarianceFilter::fit(&outcome.matrix, &split.train, config.variance_threshold);
        let features = variance_filter.apply(&outcome.matrix);

        let train_features = features.select(Axis(0), &split.train);
        let train_labels: Vec<String> = split.train.iter().map(|&i| labels[i].clone()).collect();
        let test_features = features.select(Axis(0), &split.test);
        let test_labels: Vec<String> = split.test.iter().map(|&i| labels[i].clone()).collect();

        // Stage 7: per-family training, evaluation and cross-validation
        let mut models: Vec<Box<dyn Classifier>> = Vec::new();
        let mut failures = Vec::new();
        let mut bundles = Vec::new();
        let mut predictions = Vec::new();
        let mut cv_summaries = Vec::new();
        let validator = CrossValidator::new(config.cv_folds, config.seed);

        for &family in MODEL_FAMILIES {
            let model = match train_family(family, &train_features, &train_labels, config) {
                Ok(model) => model,
                Err(err) => {
                    tracing::warn!(model = family, error = %err, "model training failed");
                    failures.push(ModelFailure {
                        model: family.to_string(),
                        stage: "train".to_string(),
                        reason: err.to_string(),
                    });
                    continue;
                }
            };

            bundles.push(evaluate_split(
                model.as_ref(),
                "train",
                &train_features,
                &train_labels,
            ));
            bundles.push(evaluate_split(
                model.as_ref(),
                "test",
                &test_features,
                &test_labels,
            ));
            predictions.extend(prediction_rows(
                model.as_ref(),
                &documents,
                &split.test,
                &test_features,
                &test_labels,
            ));

            match validator.run(&features, &labels, family, &config.primary_metric, |f, l| {
                train_family(family, f, l, config)
            }) {
                Ok(summary) => cv_summaries.push(summary),
                Err(err) => {
                    tracing::warn!(model = family, error = %err, "cross-validation failed");
                    failures.push(ModelFailure {
                        model: family.to_string(),
                        stage: "cross_validation".to_string(),
                        reason: err.to_string(),
                    });
                }
            }

            models.push(model);
        }

        // Stage 8: comparison report over everything that succeeded
        let report = ComparisonReport::new(bundles.clone());
        tracing::info!(
            documents = documents.len(),
            models = models.len(),
            failures = failures.len(),
            bundles = bundles.len(),
            "pipeline run complete"
        );

        Ok(PipelineRun {
            documents,
            excluded_documents,
            corpus,
            embedding,
            vectors: outcome.matrix,
            empty_documents: outcome.empty_documents,
            coerced_values: outcome.coerced_values,
            variance_filter,
            features,
            split,
            models,
            failures,
            bundles,
            predictions,
            cv_summaries,
            report,
        })
    }

    /// Persist the run's artifacts under one directory: embedding and
    /// tokenized corpus JSON, one model JSON per trained family, the
    /// prediction and comparison CSVs, per-bundle confusion CSVs and the
    /// cross-validation summary CSV.
    pub fn persist(&self, run: &PipelineRun, dir: impl AsRef<Path>) -> PipelineResult<()> {
        let dir = dir.as_ref();
        fs::create_dir_all(dir)?;

        run.embedding.save(&dir.join("embedding.json"))?;
        fs::write(
            dir.join("corpus_tokens.json"),
            serde_json::to_string(&run.corpus)?,
        )?;

        for model in &run.models {
            fs::write(dir.join(format!("{}.json", model.name())), model.to_json()?)?;
        }

        write_predictions_csv(&run.predictions, dir.join("predictions.csv"))?;
        run.report.write_csv(dir.join("comparison.csv"))?;
        for bundle in &run.bundles {
            let name = format!("confusion_{}_{}.csv", bundle.model_name, bundle.split_name);
            write_confusion_csv(&bundle.confusion, dir.join(name))?;
        }
        write_cv_csv(&run.cv_summaries, dir.join("cross_validation.csv"))?;

        tracing::info!(dir = %dir.display(), "persisted pipeline artifacts");
        Ok(())
    }
}

// ============================================================================
// Helper Functions
// ============================================================================

fn train_family(
    family: &str,
    features: &Array2<f64>,
    labels: &[String],
    config: &PipelineConfig,
) -> PipelineResult<Box<dyn Classifier>> {
    match family {
        crate::classifiers::kernel_svm::MODEL_NAME => {
            KernelSvmClassifier::train(features, labels, config)
                .map(|m| Box::new(m) as Box<dyn Classifier>)
        }
        crate::classifiers::random_forest::MODEL_NAME => {
            RandomForestClassifier::train(features, labels, config)
                .map(|m| Box::new(m) as Box<dyn Classifier>)
        }
        other => Err(PipelineError::training(other, "unknown model family")),
    }
}

fn evaluate_split(
    model: &dyn Classifier,
    split_name: &str,
    features: &Array2<f64>,
    labels: &[String],
) -> MetricBundle {
    let predicted = model.predict(features);
    let proba = model.predict_proba(features);
    MetricBundle::evaluate(model.name(), split_name, labels, &predicted, proba.as_ref())
}

/// One prediction row per test document, with the probability of the
/// predicted class when the model exposes probabilities.
fn prediction_rows(
    model: &dyn Classifier,
    documents: &[Document],
    test_indices: &[usize],
    test_features: &Array2<f64>,
    test_labels: &[String],
) -> Vec<PredictionRow> {
    let predicted = model.predict(test_features);
    let proba = model.predict_proba(test_features);

    test_indices
        .iter()
        .enumerate()
        .map(|(i, &doc_index)| {
            let probability = proba.as_ref().and_then(|p| {
                let col = p.classes.iter().position(|c| c == &predicted[i])?;
                Some(p.values[[i, col]])
            });
            PredictionRow {
                id: documents[doc_index].id.clone(),
                model: model.name().to_string(),
                actual: test_labels[i].clone(),
                predicted: predicted[i].clone(),
                probability,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Synthetic three-class corpus with distinctive vocabulary per
    /// class, long enough to pass the ingestion filter and large enough
    /// to clear the trainability guard in every fold.
    fn sample_documents() -> Vec<Document> {
        let phrases = [
            (
                "left",
                [
                    "tax the wealthy to fund universal healthcare and public schools",
                    "unions protect workers from corporate greed and wage theft",
                    "climate justice demands regulation of polluting industries now",
                ],
            ),
            (
                "center",
                [
                    "both parties should compromise on the budget this congress",
                    "moderate reforms beat sweeping change for most voters here",
                    "bipartisan committees negotiate practical policy trade offs",
                ],
            ),
            (
                "right",
                [
                    "lower taxes let small business create jobs and growth",
                    "secure the border and defend constitutional liberty first",
                    "free markets outperform government programs every single time",
                ],
            ),
        ];

        let mut documents = Vec::new();
        for (label, texts) in phrases {
            for repeat in 0..34 {
                let text = texts[repeat % texts.len()];
                documents.push(Document::new(
                    format!("{label}-{repeat}"),
                    format!("{text} opinion {repeat}"),
                    label,
                ));
            }
        }
        documents
    }

    fn quick_engine() -> PipelineEngine {
        PipelineEngine::new(PipelineConfig::quick().with_cv_folds(2)).unwrap()
    }

    #[test]
    fn test_run_produces_bundles_for_both_families() {
        let run = quick_engine().run(sample_documents()).unwrap();

        assert!(run.failures.is_empty(), "failures: {:?}", run.failures);
        assert_eq!(run.models.len(), 2);
        // Two bundles (train, test) per family.
        assert_eq!(run.bundles.len(), 4);
        assert_eq!(run.cv_summaries.len(), 2);
        assert!(!run.report.is_empty());

        // Prediction rows cover the test split once per model.
        assert_eq!(run.predictions.len(), 2 * run.split.test_len());
        assert!(run.predictions.iter().all(|p| !p.id.is_empty()));
    }

    #[test]
    fn test_run_is_deterministic() {
        let engine = quick_engine();
        let a = engine.run(sample_documents()).unwrap();
        let b = engine.run(sample_documents()).unwrap();

        assert_eq!(a.split.train, b.split.train);
        assert_eq!(a.vectors, b.vectors);
        let predicted_a: Vec<&str> = a.predictions.iter().map(|p| p.predicted.as_str()).collect();
        let predicted_b: Vec<&str> = b.predictions.iter().map(|p| p.predicted.as_str()).collect();
        assert_eq!(predicted_a, predicted_b);
    }

    #[test]
    fn test_stratified_split_and_filter_are_wired_through() {
        let run = quick_engine().run(sample_documents()).unwrap();

        assert!(run.split.stratified);
        assert_eq!(run.features.ncols(), run.variance_filter.output_dim());
        assert_eq!(run.vectors.nrows(), run.documents.len());
        // Scaled vectors stay inside the unit range.
        assert!(run.vectors.iter().all(|v| v.abs() <= 1.0));
    }

    #[test]
    fn test_short_documents_are_excluded_and_counted() {
        let mut documents = sample_documents();
        documents.push(Document::new("tiny", "meh", "left"));

        let engine =
            PipelineEngine::new(PipelineConfig::quick().with_cv_folds(2).with_min_doc_chars(10))
                .unwrap();
        let run = engine.run(documents).unwrap();
        assert_eq!(run.excluded_documents, 1);
        assert!(run.documents.iter().all(|d| d.id != "tiny"));
    }

    #[test]
    fn test_insufficient_corpus_fails_models_but_not_run() {
        // 30 documents split 0.8 leaves 24 training rows, under the
        // trainability floor: both families record failures and the
        // report is empty, but the run itself completes.
        let documents: Vec<Document> = sample_documents().into_iter().take(30).collect();
        let run = quick_engine().run(documents).unwrap();

        assert!(run.models.is_empty());
        assert_eq!(run.failures.len(), 2);
        assert!(run.report.is_empty());
    }

    #[test]
    fn test_empty_input_aborts() {
        assert!(quick_engine().run(Vec::new()).is_err());
    }

    #[test]
    fn test_persist_writes_all_artifacts() {
        let run = quick_engine().run(sample_documents()).unwrap();
        let dir = std::env::temp_dir().join("stance_engine_test");
        let _ = fs::remove_dir_all(&dir);

        quick_engine().persist(&run, &dir).unwrap();
        for name in [
            "embedding.json",
            "corpus_tokens.json",
            "kernel_svm.json",
            "random_forest.json",
            "predictions.csv",
            "comparison.csv",
            "confusion_kernel_svm_test.csv",
            "confusion_random_forest_train.csv",
            "cross_validation.csv",
        ] {
            assert!(dir.join(name).exists(), "missing artifact {name}");
        }

        // The persisted embedding reloads to an identical vocabulary.
        let restored = SkipGramModel::load(&dir.join("embedding.json")).unwrap();
        assert_eq!(restored.vocab(), run.embedding.vocab());
    }
}
