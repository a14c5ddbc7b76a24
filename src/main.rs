//! Resume tailor: rewrites a Google Docs résumé for a job posting

use anyhow::Context;
use clap::Parser;
use log::{error, info};
use resume_tailor::auth::{Session, StaticToken};
use resume_tailor::cli::{Cli, Commands, ConfigAction, Prompter};
use resume_tailor::config::{self, Config};
use resume_tailor::docs::{DocumentService, GoogleDocsClient};
use resume_tailor::input::{extract_doc_id, PostingLoader};
use resume_tailor::llm::{Intensity, OpenAiClient, Tailor};
use resume_tailor::output::SummaryFormatter;
use resume_tailor::pipeline::Pipeline;
use resume_tailor::processing::reconcile::Reconciler;
use resume_tailor::processing::segment::Segmenter;
use resume_tailor::ResumeTailorError;
use std::path::{Path, PathBuf};
use std::process;

#[tokio::main(flavor = "current_thread")]
async fn main() {
    // Parse CLI arguments
    let cli = Cli::parse();

    // Initialize logging
    let log_level = if cli.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(log_level)).init();

    config::load_dotenv();

    // Load configuration
    let config = match Config::load(cli.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            error!("Failed to load configuration: {}", e);
            process::exit(1);
        }
    };

    let command = cli.command.unwrap_or(Commands::Tailor {
        link: None,
        posting: None,
        intensity: None,
    });

    if let Err(e) = run_command(command, config, cli.config).await {
        if matches!(e.downcast_ref::<ResumeTailorError>(), Some(ResumeTailorError::Cancelled)) {
            println!("\nExiting application...");
            return;
        }
        error!("{:#}", e);
        process::exit(1);
    }
}

async fn run_command(command: Commands, config: Config, config_override: Option<PathBuf>) -> anyhow::Result<()> {
    match command {
        Commands::Tailor {
            link,
            posting,
            intensity,
        } => tailor(&config, link, posting, intensity).await,

        Commands::Config { action } => {
            let path = config_override.unwrap_or_else(Config::config_path);
            match action {
                Some(ConfigAction::Show) | None => show_config(&config, &path),
                Some(ConfigAction::Reset) => {
                    println!("🔄 Resetting configuration to defaults...");
                    Config::default().save_to(&path)?;
                    println!("✅ Configuration reset successfully!");
                }
                Some(ConfigAction::Path) => println!("{}", path.display()),
            }
            Ok(())
        }

        Commands::Logout => {
            if Session::remove_token_file(&config.google.token_path)? {
                println!("✅ Removed stored Google token.");
            } else {
                println!("No stored Google token at {}", config.google.token_path.display());
            }
            Ok(())
        }
    }
}

async fn tailor(
    config: &Config,
    link: Option<String>,
    posting: Option<PathBuf>,
    intensity: Option<Intensity>,
) -> anyhow::Result<()> {
    let api_key = config::openai_api_key()?;
    let generator = OpenAiClient::new(api_key, &config.generation)?;
    let tailor = Tailor::new(generator, config.generation.max_tokens);
    let reconciler = Reconciler::new(Segmenter::new(&config.segmentation));

    let mut prompter = Prompter::stdio();
    let document_id = match link {
        Some(link) => extract_doc_id(&link)?,
        None => prompter.ask_document_id()?,
    };

    let loader = PostingLoader::new(&config.posting.default_path);
    let (posting_path, posting_text) = loader.load(posting.as_deref(), &mut prompter).await?;
    println!("💼 Job posting: {}", posting_path.display());

    let intensity = match intensity {
        Some(intensity) => intensity,
        None => prompter.ask_intensity()?,
    };

    let docs: Box<dyn DocumentService> = match config::google_access_token() {
        Some(token) => {
            info!("Using access token from {}", config::GOOGLE_ACCESS_TOKEN_VAR);
            Box::new(GoogleDocsClient::new(StaticToken::new(token), &config.google)?)
        }
        None => {
            let session = Session::load(&config.google).context("Failed to load Google session")?;
            Box::new(GoogleDocsClient::new(session, &config.google)?)
        }
    };

    println!("\n🚀 Tailoring résumé ({})", intensity);
    let summary = Pipeline::new(docs.as_ref(), &tailor, &reconciler)
        .run(&document_id, &posting_text, intensity)
        .await?;

    print!("{}", SummaryFormatter::new(true).format(&summary));
    Ok(())
}

fn show_config(config: &Config, path: &Path) {
    println!("⚙️  Current Configuration\n");
    println!("File: {}", path.display());
    println!("\nGeneration:");
    println!("  Model: {}", config.generation.model);
    println!("  API base: {}", config.generation.api_base);
    println!("  Max tokens: {}", config.generation.max_tokens);
    println!("  Timeout: {}s", config.generation.timeout_secs);
    println!("\nGoogle:");
    println!("  Credentials: {}", config.google.credentials_path.display());
    println!("  Token: {}", config.google.token_path.display());
    println!("  Docs API: {}", config.google.docs_api_base);
    println!("\nPosting:");
    println!("  Default file: {}", config.posting.default_path.display());
    println!("\nSegmentation:");
    println!("  Heading max chars: {}", config.segmentation.heading_max_chars);
    println!("  Indent width: {}", config.segmentation.indent_width);
}
