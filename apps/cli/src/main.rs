mod logging;
mod progress;

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use console::style;
use tokio::fs;

use yt2blog_core::{
    ArticlePipeline, Credentials, EventBus, GenerationRequest, HttpChatClient, PipelineConfig,
    Provider, YoutubeClient, Yt2BlogError, collect_content, format_usage_report,
    format_verification, validate_inputs, validation::check_llm_api_key,
};

use crate::progress::{RunReport, create_spinner, render_events};

const YOUTUBE_KEY_ENV: &str = "YOUTUBE_API_KEY";

/// CLI wrapper for Provider enum (needed for clap ValueEnum)
#[derive(Clone, ValueEnum)]
enum CliProvider {
    Openai,
    Grok,
    Gemini,
}

impl From<CliProvider> for Provider {
    fn from(cli: CliProvider) -> Self {
        match cli {
            CliProvider::Openai => Provider::Openai,
            CliProvider::Grok => Provider::Grok,
            CliProvider::Gemini => Provider::Gemini,
        }
    }
}

#[derive(Parser)]
#[command(name = "yt2blog")]
#[command(about = "Turn YouTube videos into a blog article by drafting, critiquing and refining")]
struct Cli {
    /// LLM provider (overrides config file and YT2BLOG_PROVIDER)
    #[arg(short, long, global = true)]
    provider: Option<CliProvider>,

    /// Model name (overrides the provider default)
    #[arg(short, long, global = true)]
    model: Option<String>,

    /// Path to config.toml
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Debug logging to stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Generate an article from one or more videos
    Generate {
        /// YouTube video URLs
        #[arg(required = true)]
        urls: Vec<String>,

        /// What the article should be like (length, tone, audience)
        #[arg(short, long)]
        instruction: String,

        /// Keep channel branding and add a references section
        #[arg(long)]
        keep_branding: bool,

        /// Enrich the drafts with a web search
        #[arg(long)]
        search: bool,

        /// Feedback from a previous attempt
        #[arg(long)]
        feedback: Option<String>,

        /// Score the finished article against the instruction
        #[arg(long)]
        verify: bool,

        /// Write the article here instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Score an existing article against an instruction
    Verify {
        /// Markdown file containing the article
        article: PathBuf,

        #[arg(short, long)]
        instruction: String,
    },
    /// Rewrite an instruction into a more specific one
    Enhance { instruction: String },
    /// Check that the YouTube and LLM keys are accepted
    CheckKeys,
}

fn load_config(cli: &Cli) -> Result<PipelineConfig> {
    let mut config = PipelineConfig::load(cli.config.as_deref())?;
    if let Some(provider) = cli.provider.clone() {
        config.provider = provider.into();
    }
    if let Some(model) = &cli.model {
        config.model = Some(model.clone());
    }
    Ok(config)
}

fn print_error(err: &Yt2BlogError) {
    eprintln!("{} {}", style("Error:").red().bold(), err.user_message());
    tracing::debug!(error = ?err, "command failed");
}

fn print_usage(report: &RunReport) {
    if report.usage.entries().is_empty() {
        return;
    }
    eprintln!("\n{}", style("Token usage").bold());
    eprint!(
        "{}",
        style(format_usage_report(
            report.usage.entries(),
            &report.usage.summary()
        ))
        .dim()
    );
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    logging::init_tracing(cli.verbose)?;

    let config = match load_config(&cli) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("{} {:#}", style("Error:").red().bold(), e);
            std::process::exit(1);
        }
    };

    let llm_key = match (config.provider.api_key_from_env(), &cli.command) {
        (Ok(key), _) => key,
        (Err(_), Command::CheckKeys) => String::new(),
        (Err(e), _) => {
            eprintln!("{} {}", style("Error:").red().bold(), e);
            std::process::exit(1);
        }
    };

    let ok = match cli.command {
        Command::Generate {
            urls,
            instruction,
            keep_branding,
            search,
            feedback,
            verify,
            output,
        } => {
            let request = GenerateArgs {
                urls,
                instruction,
                keep_branding,
                search,
                feedback,
                verify,
                output,
            };
            generate(config, llm_key, request).await?
        }
        Command::Verify {
            article,
            instruction,
        } => verify(config, llm_key, article, instruction).await?,
        Command::Enhance { instruction } => enhance(config, llm_key, instruction).await?,
        Command::CheckKeys => check_keys(config, llm_key).await,
    };

    if !ok {
        std::process::exit(1);
    }
    Ok(())
}

struct GenerateArgs {
    urls: Vec<String>,
    instruction: String,
    keep_branding: bool,
    search: bool,
    feedback: Option<String>,
    verify: bool,
    output: Option<PathBuf>,
}

async fn generate(config: PipelineConfig, llm_key: String, args: GenerateArgs) -> Result<bool> {
    let credentials = Credentials {
        youtube_api_key: std::env::var(YOUTUBE_KEY_ENV).unwrap_or_default(),
        llm_api_key: llm_key,
    };

    if let Err(errors) = validate_inputs(&credentials, &args.urls, &args.instruction) {
        for e in errors {
            eprintln!("{} {}", style("Invalid:").red().bold(), e);
        }
        return Ok(false);
    }

    eprintln!(
        "\n{}  {}\n",
        style("yt2blog").cyan().bold(),
        style(format!("{} / {}", config.provider.name(), config.model())).dim()
    );

    let youtube = YoutubeClient::new(config.request_timeout());
    let spinner = create_spinner(&format!("Fetching {} video(s)...", args.urls.len()));
    let content = match collect_content(&youtube, &credentials.youtube_api_key, &args.urls).await
    {
        Ok(content) => {
            spinner.finish_with_message(format!(
                "{} Fetched: {}",
                style("✓").green().bold(),
                style(content.topic()).dim()
            ));
            content
        }
        Err(e) => {
            spinner.finish_and_clear();
            print_error(&e);
            return Ok(false);
        }
    };

    let request = GenerationRequest {
        api_key: credentials.llm_api_key,
        content,
        instruction: args.instruction,
        keep_branding: args.keep_branding,
        search_internet: args.search,
        feedback: args.feedback,
    };

    let (bus, rx) = EventBus::new();
    let renderer = tokio::spawn(render_events(rx));
    let pipeline = ArticlePipeline::from_config(config, bus);

    let result = pipeline.generate_article(&request).await;
    let verification = match (&result, args.verify) {
        (Ok(article), true) => Some(
            pipeline
                .verify_article(&request.api_key, article, &request.instruction)
                .await,
        ),
        _ => None,
    };
    drop(pipeline);

    let report = renderer.await.context("progress renderer panicked")?;
    print_usage(&report);

    let article = match result {
        Ok(article) => article,
        Err(e) => {
            let failed = report.tracker.failed_stages();
            if !failed.is_empty() {
                let titles: Vec<&str> = failed.iter().map(|s| s.title()).collect();
                eprintln!("{} {}", style("Failed stages:").red(), titles.join(", "));
            }
            print_error(&e);
            return Ok(false);
        }
    };

    match verification {
        Some(Ok(v)) => eprintln!("\n{}", format_verification(&v)),
        Some(Err(e)) => print_error(&e),
        None => {}
    }

    match args.output {
        Some(path) => {
            fs::write(&path, &article)
                .await
                .with_context(|| format!("failed to write {}", path.display()))?;
            eprintln!(
                "\n{} {}",
                style("Saved:").dim(),
                style(path.display()).cyan()
            );
        }
        None => {
            eprintln!("{}", style("─".repeat(60)).dim());
            println!("{article}");
        }
    }

    Ok(true)
}

async fn verify(
    config: PipelineConfig,
    llm_key: String,
    article: PathBuf,
    instruction: String,
) -> Result<bool> {
    let text = fs::read_to_string(&article)
        .await
        .with_context(|| format!("failed to read {}", article.display()))?;

    let (bus, rx) = EventBus::new();
    let renderer = tokio::spawn(render_events(rx));
    let pipeline = ArticlePipeline::from_config(config, bus);

    let spinner = create_spinner("Analyzing article quality...");
    let result = pipeline.verify_article(&llm_key, &text, &instruction).await;
    spinner.finish_and_clear();
    drop(pipeline);

    let report = renderer.await.context("progress renderer panicked")?;

    match result {
        Ok(verification) => {
            println!("{}", format_verification(&verification));
            print_usage(&report);
            Ok(verification.passed)
        }
        Err(e) => {
            print_error(&e);
            Ok(false)
        }
    }
}

async fn enhance(config: PipelineConfig, llm_key: String, instruction: String) -> Result<bool> {
    let pipeline = ArticlePipeline::from_config(config, EventBus::detached());

    let spinner = create_spinner("Enhancing instruction...");
    let result = pipeline.enhance_instructions(&llm_key, &instruction).await;
    spinner.finish_and_clear();

    match result {
        Ok(enhanced) => {
            println!("{enhanced}");
            Ok(true)
        }
        Err(e) => {
            print_error(&e);
            Ok(false)
        }
    }
}

async fn check_keys(config: PipelineConfig, llm_key: String) -> bool {
    let youtube_key = std::env::var(YOUTUBE_KEY_ENV).unwrap_or_default();
    let youtube = YoutubeClient::new(config.request_timeout());
    let llm = HttpChatClient::new(config.api_url(), config.request_timeout());

    let spinner = create_spinner("Checking API keys...");
    let (youtube_ok, llm_ok) = tokio::join!(
        youtube.check_api_key(&youtube_key),
        check_llm_api_key(&llm, &llm_key, config.model()),
    );
    spinner.finish_and_clear();

    let mark = |ok: bool| {
        if ok {
            style("✓").green().bold()
        } else {
            style("✗").red().bold()
        }
    };
    println!("{} YouTube ({YOUTUBE_KEY_ENV})", mark(youtube_ok));
    println!(
        "{} {} ({})",
        mark(llm_ok),
        config.provider.name(),
        config.provider.config().env_var
    );

    youtube_ok && llm_ok
}
