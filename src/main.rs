use anyhow::{Context, Result};
use clap::Parser;
use console::style;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use ytsum::extractors::{YoutubeCaptionSource, YtDlpResolver};
use ytsum::summarize::OpenAiSummarizer;
use ytsum::{utils, Cli, Config, ConsolePresenter, SummaryMode, SummaryOptions, SummaryPipeline};

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize tracing; diagnostics go to stderr so stdout only carries the summary
    let default_filter = if cli.verbose { "ytsum=debug" } else { "ytsum=warn" };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let mut config = Config::load().await?;
    if let Some(model) = &cli.model {
        config.llm.model = model.clone();
    }

    if cli.show_config {
        config.display();
        return Ok(());
    }

    // Check for required external dependencies (non-fatal)
    let missing_deps = utils::check_dependencies(&config.app.yt_dlp_path).await;
    if !missing_deps.is_empty() {
        eprintln!("⚠️  Dependency check warnings:");
        for dep in missing_deps {
            eprintln!("   • {}", dep);
        }
        eprintln!("   (Continuing anyway - tools may be available)");
    }

    let video = cli.video.clone().context("A video URL or id is required")?;
    let api_key = cli
        .api_key
        .clone()
        .or_else(|| config.api_key_from_env())
        .with_context(|| {
            format!(
                "Missing API key: set {} or pass --api-key",
                config.llm.api_key_env
            )
        })?;

    let mode = cli
        .mode
        .map(|mode| SummaryMode::from(mode).to_string())
        .unwrap_or_else(|| config.app.default_mode.clone());
    let language = cli
        .lang
        .clone()
        .unwrap_or_else(|| config.app.default_language.clone());

    let options = SummaryOptions::new(video)
        .language(language)
        .mode(mode)
        .max_tokens(Some(cli.max_tokens.unwrap_or(config.llm.max_tokens)))
        .copy_to_clipboard(cli.copy);

    let pipeline = SummaryPipeline::new(
        Box::new(YtDlpResolver::with_path(&config.app.yt_dlp_path).with_progress(!cli.quiet)),
        Box::new(YoutubeCaptionSource::new()?),
        Box::new(OpenAiSummarizer::new(&config.llm, api_key)?.with_progress(!cli.quiet)),
        Box::new(ConsolePresenter::new(cli.format, cli.quiet)),
    );

    tracing::info!("Starting summary for: {}", options.reference);

    match pipeline.run(&options).await {
        Ok(result) => {
            tracing::debug!("Summary has {} characters", result.text.len());
            Ok(())
        }
        Err(e) => {
            if cli.verbose {
                eprintln!(
                    "{} pipeline stopped at stage '{}'",
                    style("Error:").red().bold().for_stderr(),
                    e.stage()
                );
            }
            std::process::exit(1);
        }
    }
}
