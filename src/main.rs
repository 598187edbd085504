use anyhow::{Context, Result};
use clap::Parser;
use insightgen::clients::HttpStageClient;
use insightgen::config::Config;
use insightgen::pipeline::PipelineOrchestrator;
use insightgen::value::ResultSet;
use prettytable::{Cell, Row as TableRow, Table};
use std::sync::Arc;
use std::time::Duration;

/// Ask a natural-language question, get back the generated query, a result
/// table, a chart suggestion, and a narrative insight.
#[derive(Parser, Debug)]
#[command(name = "insightgen", version)]
struct Cli {
    /// The question to run through the pipeline
    #[arg(required = true)]
    question: Vec<String>,

    /// Backend base URL (overrides INSIGHT_API_URL)
    #[arg(long)]
    api_url: Option<String>,

    /// How long to wait for the detached insight stage before giving up
    #[arg(long, default_value_t = 30)]
    insight_wait_secs: u64,
}

#[tokio::main]
async fn main() -> Result<()> {
    insightgen::load_env();
    tracing_subscriber::fmt()
        .with_env_filter(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "insightgen=warn".to_string()),
        )
        .init();

    let cli = Cli::parse();
    let question = cli.question.join(" ");

    let mut config = Config::load_from_env();
    if let Some(url) = &cli.api_url {
        config = config.with_api_url(url);
    }

    let client = Arc::new(HttpStageClient::new(&config)?);
    client
        .health_check()
        .await
        .with_context(|| format!("backend is not reachable at {}", config.api_url))?;

    let orchestrator = PipelineOrchestrator::new(client);
    let outcome = orchestrator.submit(&question).await;
    let state = orchestrator.snapshot().await;

    if let Some(query) = &state.query_text {
        println!("Generated query:\n  {}\n", query);
    }
    if outcome.is_err() {
        anyhow::bail!(
            state
                .error
                .unwrap_or_else(|| "pipeline failed".to_string())
        );
    }

    if let Some(result) = &state.result {
        print_table(result);
    }

    if let Some(encoding) = state.chart_encoding()
        && encoding.is_presentable()
    {
        println!(
            "\nSuggested chart: x={}, y={}",
            encoding.x_key.as_deref().unwrap_or("?"),
            encoding.y_key.as_deref().unwrap_or("?"),
        );
    }

    // The insight stage is detached; give it a bounded window to land
    // before this one-shot process exits.
    let deadline = tokio::time::Instant::now() + Duration::from_secs(cli.insight_wait_secs);
    let insight = loop {
        let snapshot = orchestrator.snapshot().await;
        if snapshot.insight.is_some() {
            break snapshot.insight;
        }
        if tokio::time::Instant::now() >= deadline {
            break None;
        }
        tokio::time::sleep(Duration::from_millis(200)).await;
    };
    match insight {
        Some(text) => println!("\nInsights:\n{}", text),
        None => println!("\nInsights: (not available)"),
    }

    Ok(())
}

fn print_table(result: &ResultSet) {
    let mut table = Table::new();
    table.set_titles(TableRow::new(
        result.columns.iter().map(|c| Cell::new(c)).collect(),
    ));
    for row in &result.rows {
        let cells = result
            .columns
            .iter()
            .map(|col| {
                Cell::new(
                    &row.get(col)
                        .map(|v| v.to_string())
                        .unwrap_or_default(),
                )
            })
            .collect();
        table.add_row(TableRow::new(cells));
    }
    table.printstd();
}
