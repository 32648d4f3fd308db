use anyhow::Context;
use clap::{Parser, ValueEnum};
use coach_agent::cli::{self, Cli, Command, Example, GOODBYE, QUESTION_PROMPT};
use coach_agent::config::{AgentConfig, SERVICE_NAME};
use coach_agent::evaluation::{
    evaluate_agent, select_prompts, Category, EvaluationSummary, SummaryDensityJudge,
};
use coach_agent::FitnessAgent;
use service_core::observability::init_tracing;
use std::process::ExitCode;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let config = match AgentConfig::load() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("\n❌ Error: {}", e);
            return ExitCode::FAILURE;
        }
    };

    let log_level = if cli.verbose {
        "debug"
    } else {
        config.log_level.as_str()
    };
    init_tracing(SERVICE_NAME, log_level, config.otlp_endpoint.as_deref());
    config.log_summary();

    tokio::select! {
        result = run(cli, &config) => match result {
            Ok(()) => ExitCode::SUCCESS,
            Err(e) => {
                tracing::error!(error = %e, "Error running agent");
                eprintln!("\n❌ Error: {:#}", e);
                ExitCode::FAILURE
            }
        },
        _ = tokio::signal::ctrl_c() => {
            println!("\n\n{}", GOODBYE);
            ExitCode::SUCCESS
        }
    }
}

async fn run(cli: Cli, config: &AgentConfig) -> anyhow::Result<()> {
    tracing::info!(
        path = %cli.retriever_config_path.display(),
        "Loading agent"
    );
    let agent = FitnessAgent::build(config, &cli.retriever_config_path).await?;

    match cli.command {
        Some(Command::Evaluate {
            include_tool_tests,
            category,
        }) => evaluate(&agent, config, category, include_tool_tests).await,
        None => ask(&agent, cli.query, cli.example).await,
    }
}

async fn ask(
    agent: &FitnessAgent,
    query: Option<String>,
    example: Option<Example>,
) -> anyhow::Result<()> {
    let query = match (example, query) {
        (Some(example), _) => {
            tracing::info!(example = ?example, "Using example query");
            example.query().to_string()
        }
        (None, Some(query)) if !query.trim().is_empty() => query,
        _ => {
            tracing::info!("No query provided. Entering interactive mode...");
            read_question().await?
        }
    };

    println!("{}", cli::render_query(&query));

    tracing::info!("Processing query...");
    let report = agent.run(&query).await?;
    tracing::debug!(
        steps = report.steps,
        tool_calls = report.tool_calls,
        total_tokens = report.usage.total_tokens,
        "Agent run finished"
    );

    println!("{}", cli::render_response(&report.answer));
    Ok(())
}

/// Prompts on stdout until a non-blank line arrives on stdin.
async fn read_question() -> anyhow::Result<String> {
    let mut stdout = tokio::io::stdout();
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    loop {
        stdout
            .write_all(format!("\n{}: ", QUESTION_PROMPT).as_bytes())
            .await?;
        stdout.flush().await?;

        match lines.next_line().await.context("Failed to read from stdin")? {
            Some(line) if !line.trim().is_empty() => return Ok(line.trim().to_string()),
            Some(_) => continue,
            None => anyhow::bail!("No question provided"),
        }
    }
}

async fn evaluate(
    agent: &FitnessAgent,
    config: &AgentConfig,
    category: Category,
    include_tool_tests: bool,
) -> anyhow::Result<()> {
    let judge = SummaryDensityJudge::from_config(config)?;
    let prompts = select_prompts(category, include_tool_tests);
    let category_name = category
        .to_possible_value()
        .map(|v| v.get_name().to_string())
        .unwrap_or_default();

    println!("Running evaluation with {} prompts...", prompts.len());
    println!("Category: {}", category_name);
    println!("Include tool tests: {}", include_tool_tests);

    let results = evaluate_agent(agent, &judge, &prompts).await;
    for (i, result) in results.iter().enumerate() {
        match &result.error {
            Some(error) => println!("[{}] Score: {:.2} (failed: {})", i + 1, result.score, error),
            None => println!("[{}] Score: {:.2} - {}", i + 1, result.score, result.reason),
        }
    }

    if let Some(summary) = EvaluationSummary::from_results(&results) {
        println!("\n{}", summary.render());
    }
    Ok(())
}
