//! End-to-end pipeline demo on a synthetic labeled corpus.
//!
//! Run with: cargo run --example basic_pipeline

use stance_core::{run_pipeline, Document, PipelineConfig};

fn synthetic_documents() -> Vec<Document> {
    let phrases = [
        (
            "left",
            [
                "tax the wealthy to fund universal healthcare and public schools",
                "unions protect workers from corporate greed and wage theft",
                "climate justice demands regulation of polluting industries now",
                "expand voting rights and invest in public transit for everyone",
            ],
        ),
        (
            "center",
            [
                "both parties should compromise on the budget this congress",
                "moderate reforms beat sweeping change for most voters here",
                "bipartisan committees negotiate practical policy trade offs",
                "independent voters want competence over ideology in office",
            ],
        ),
        (
            "right",
            [
                "lower taxes let small business create jobs and growth",
                "secure the border and defend constitutional liberty first",
                "free markets outperform government programs every single time",
                "cut spending and reduce the deficit before raising taxes",
            ],
        ),
    ];

    let mut documents = Vec::new();
    for (label, texts) in phrases {
        for repeat in 0..40 {
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

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt::init();

    let config = PipelineConfig::quick().with_cv_folds(3);
    let run = run_pipeline(synthetic_documents(), config)?;

    println!("documents: {} (excluded {})", run.documents.len(), run.excluded_documents);
    println!(
        "vocabulary: {} tokens, features: {} of {} columns kept",
        run.embedding.vocab_len(),
        run.variance_filter.output_dim(),
        run.variance_filter.input_dim()
    );
    println!(
        "split: {} train / {} test (stratified: {})\n",
        run.split.train_len(),
        run.split.test_len(),
        run.split.stratified
    );

    println!("{}", run.report.to_text());

    println!("ranking by accuracy:");
    for entry in run.report.ranking("accuracy")? {
        let value = entry
            .value
            .map(|v| format!("{v:.4}"))
            .unwrap_or_else(|| "NA".to_string());
        println!("  {:<16} {:<8} {value}", entry.model_name, entry.split_name);
    }

    for failure in &run.failures {
        println!("failed: {} at {}: {}", failure.model, failure.stage, failure.reason);
    }

    Ok(())
}
