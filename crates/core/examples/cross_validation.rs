//! Cross-validation and artifact persistence demo.
//!
//! Runs the pipeline, prints per-fold cross-validation summaries, writes
//! every artifact to a directory and reloads a persisted model.
//!
//! Run with: cargo run --example cross_validation

use stance_core::{Classifier, Document, KernelSvmClassifier, PipelineConfig, PipelineEngine};

fn synthetic_documents() -> Vec<Document> {
    let phrases = [
        (
            "left",
            [
                "raise the minimum wage and strengthen collective bargaining",
                "public healthcare saves families from medical bankruptcy",
                "wind and solar subsidies beat fossil fuel handouts",
            ],
        ),
        (
            "right",
            [
                "deregulate energy and let domestic producers compete freely",
                "school choice gives parents control over their children",
                "strong defense spending keeps the nation safe and sovereign",
            ],
        ),
    ];

    let mut documents = Vec::new();
    for (label, texts) in phrases {
        for repeat in 0..50 {
            let text = texts[repeat % texts.len()];
            documents.push(
                Document::new(
                    format!("{label}-{repeat}"),
                    format!("{text} take {repeat}"),
                    label,
                )
                .with_score(if label == "left" { -0.5 } else { 0.5 }),
            );
        }
    }
    documents
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt::init();

    let config = PipelineConfig::quick()
        .with_cv_folds(5)
        .with_primary_metric("balanced_accuracy");
    let engine = PipelineEngine::new(config)?;
    let run = engine.run(synthetic_documents())?;

    for summary in &run.cv_summaries {
        let mean = summary
            .mean
            .map(|v| format!("{v:.4}"))
            .unwrap_or_else(|| "NA".to_string());
        let std_dev = summary
            .std_dev
            .map(|v| format!("{v:.4}"))
            .unwrap_or_else(|| "NA".to_string());
        println!(
            "{}: {} over {} folds (requested {}): {mean} ± {std_dev}",
            summary.model_name, summary.metric, summary.folds, summary.requested_folds
        );
    }

    let dir = std::env::temp_dir().join("stance_demo_artifacts");
    engine.persist(&run, &dir)?;
    println!("artifacts written to {}", dir.display());

    // A persisted model reloads without the training data.
    let json = std::fs::read_to_string(dir.join("kernel_svm.json"))?;
    let restored = KernelSvmClassifier::from_json(&json)?;
    println!("reloaded kernel svm over classes {:?}", restored.classes());

    Ok(())
}
