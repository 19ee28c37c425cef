use anyhow::{Context, Result};
use eval::{BenchmarkResults, Benchmarker, get_test_set};
use intent::KeywordClassifier;
use std::path::PathBuf;
use std::sync::Arc;
use store::FileStore;
use workflow::WorkflowEngine;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .init();

    println!("=== Company Intel Benchmark ===\n");

    let data_dir = data_dir_from_args().unwrap_or_else(|| PathBuf::from("demo_data"));
    if !data_dir.is_dir() {
        anyhow::bail!("Data directory {} does not exist", data_dir.display());
    }

    let engine = WorkflowEngine::new(
        Arc::new(FileStore::new(&data_dir)),
        Arc::new(KeywordClassifier::default()),
    );
    let benchmarker = Benchmarker::new(engine);

    let test_set = get_test_set();
    println!("Data directory: {}", data_dir.display());
    println!("Test set: {} queries\n", test_set.len());

    let results = benchmarker.run_benchmark(&test_set).await;
    print_results(&results);

    let results_json = serde_json::to_string_pretty(&results)?;
    std::fs::write("benchmark_results.json", results_json)
        .context("Failed to write benchmark_results.json")?;
    println!("\nResults saved to benchmark_results.json");

    Ok(())
}

fn print_results(results: &BenchmarkResults) {
    println!("=== RESULTS ({} classifier) ===\n", results.classifier_mode);

    println!("Analysis type accuracy: {:.1}%", results.analysis_type_accuracy * 100.0);
    for entry in &results.by_analysis_type {
        println!(
            "  {:<18} {}/{} ({:.1}%)",
            entry.category,
            entry.correct,
            entry.count,
            entry.accuracy * 100.0
        );
    }
    println!("Query type accuracy:    {:.1}%", results.query_type_accuracy * 100.0);
    println!("Completed responses:    {:.1}%", results.completed_rate * 100.0);

    println!("\nLatency:");
    println!("  Mean:    {:.2} ms", results.latency.mean_ms);
    println!("  Std dev: {:.2} ms", results.latency.std_dev_ms);
    println!("  P50:     {:.2} ms", results.latency.p50_ms);
    println!("  P95:     {:.2} ms", results.latency.p95_ms);

    if !results.mismatches.is_empty() {
        println!("\nMismatches:");
        for mismatch in &results.mismatches {
            println!(
                "  {:?}: expected {}, got {}",
                mismatch.query, mismatch.expected, mismatch.actual
            );
        }
    }
}

fn data_dir_from_args() -> Option<PathBuf> {
    let mut args = std::env::args().skip(1);
    while let Some(arg) = args.next() {
        if arg == "--data-dir" {
            return args.next().map(PathBuf::from);
        }
        if let Some(path) = arg.strip_prefix("--data-dir=") {
            return Some(PathBuf::from(path));
        }
    }
    None
}
