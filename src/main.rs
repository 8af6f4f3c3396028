//! # AI News Poster
//!
//! A scheduled content pipeline that fetches the latest AI news, summarizes
//! each story with a chat-completion model, and publishes a daily digest to
//! LinkedIn.
//!
//! ## Usage
//!
//! ```sh
//! export NEWS_API_KEY=... DEEPSEEK_API_KEY=...
//! export LINKEDIN_ACCESS_TOKEN=... LINKEDIN_PERSON_ID=...   # or put them in ./.env
//! ai_news_poster            # run now, then every day at 09:00 UTC
//! ai_news_poster once       # run once and exit
//! ai_news_poster preview    # print the post without publishing
//! ai_news_poster whoami     # print the member id for the token
//! ```
//!
//! ## Architecture
//!
//! Each run is a one-way pipeline:
//! 1. **Fetching**: query the news search API for recent AI stories
//! 2. **Filtering**: drop duplicate and market-news titles, keep the top 3
//! 3. **Analyzing**: summarize each story in three sentences via the model
//! 4. **Formatting**: render the digest post
//! 5. **Publishing**: post it to LinkedIn
//!
//! Failures inside a run are logged and absorbed; only missing credentials
//! or a bad settings file stop the process.

use clap::Parser;
use std::error::Error;
use std::process::ExitCode;
use tracing::{error, info};
use tracing_subscriber::{EnvFilter, fmt as tfmt};

mod chat;
mod cli;
mod config;
mod error;
mod filter;
mod formatter;
mod linkedin;
mod models;
mod news;
mod pipeline;
mod scheduler;
mod summarizer;
#[cfg(test)]
mod test_support;
mod transport;
mod utils;

use chat::ChatClient;
use cli::{Cli, Command, Credentials};
use config::Settings;
use linkedin::{LinkedInClient, Publisher};
use news::NewsApiClient;
use pipeline::{Mode, NoPublisher, Pipeline, Query, RunReport};
use scheduler::Scheduler;
use summarizer::Summarizer;
use transport::Transport;

#[tokio::main]
async fn main() -> Result<ExitCode, Box<dyn Error>> {
    let dotenv = config::load_dotenv(None);

    // --- Tracing init ---
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tfmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_file(false)
        .with_line_number(false)
        .with_timer(tracing_subscriber::fmt::time::UtcTime::rfc_3339())
        .init();

    if let Some(path) = dotenv {
        info!(path = %path.display(), "Loaded environment file");
    }
    let args = Cli::parse();
    let command = args.command();
    info!(?command, version = env!("CARGO_PKG_VERSION"), "ai_news_poster starting up");

    let settings = Settings::load(args.config.as_deref()).inspect_err(|e| {
        error!(error = %e, "Invalid settings");
    })?;
    let transport = Transport::new(&settings.http)?;

    if command == Command::Whoami {
        let token = args.access_token()?;
        let client = LinkedInClient::new(transport, &settings.linkedin, token, None)?;
        let id = client.member_id().await?;
        println!("{}", id);
        return Ok(ExitCode::SUCCESS);
    }

    let credentials = args.pipeline_credentials().inspect_err(|e| {
        error!(error = %e, "Missing configuration; refusing to start");
    })?;

    match (command, credentials.linkedin.clone()) {
        (Command::Preview, _) => {
            let pipeline = build_pipeline(&settings, &transport, &credentials, NoPublisher, Mode::Preview)?;
            match pipeline.run().await {
                RunReport::Previewed { post, .. } => println!("{}", post),
                report => println!("Nothing to preview: {}", report),
            }
            Ok(ExitCode::SUCCESS)
        }
        (_, Some(linkedin)) => {
            let publisher = LinkedInClient::new(
                transport.clone(),
                &settings.linkedin,
                linkedin.access_token,
                Some(linkedin.person_id),
            )?;
            let pipeline = build_pipeline(&settings, &transport, &credentials, publisher, Mode::Publish)?;

            if command == Command::Once {
                let report = pipeline.run().await;
                return Ok(if report.is_success() {
                    ExitCode::SUCCESS
                } else {
                    ExitCode::FAILURE
                });
            }

            let scheduler = Scheduler::new(
                settings.schedule.fire_time()?,
                settings.schedule.poll_interval(),
            );
            info!(at = %settings.schedule.at, "Will post daily (UTC)");
            scheduler.run(&pipeline, shutdown_signal()).await;
            Ok(ExitCode::SUCCESS)
        }
        (_, None) => Err(error::ConfigError::Missing("LINKEDIN_ACCESS_TOKEN").into()),
    }
}

/// Assemble a pipeline from settings, sharing one transport between clients.
fn build_pipeline<P: Publisher>(
    settings: &Settings,
    transport: &Transport,
    credentials: &Credentials,
    publisher: P,
    mode: Mode,
) -> Result<Pipeline<NewsApiClient, ChatClient, P>, Box<dyn Error>> {
    let source = NewsApiClient::new(
        transport.clone(),
        &settings.news,
        credentials.news_api_key.clone(),
    );
    let model = ChatClient::new(
        transport.clone(),
        &settings.chat,
        credentials.deepseek_api_key.clone(),
    );
    let query = Query {
        text: settings.news.query.clone(),
        page_size: settings.news.page_size,
    };
    let filter = filter::RelevanceFilter::new(&settings.news.exclusions, settings.news.top_n)?;
    Ok(Pipeline::new(
        source,
        query,
        filter,
        Summarizer::new(model, settings.chat.clone()),
        publisher,
        mode,
    ))
}

/// Resolves on SIGINT or SIGTERM. Handlers are installed immediately, so a
/// signal that arrives mid-run is seen once the run completes.
#[cfg(unix)]
fn shutdown_signal() -> impl std::future::Future<Output = ()> {
    use tokio::signal::unix::{SignalKind, signal};
    let interrupt = signal(SignalKind::interrupt());
    let terminate = signal(SignalKind::terminate());
    async move {
        match (interrupt, terminate) {
            (Ok(mut interrupt), Ok(mut terminate)) => {
                tokio::select! {
                    _ = interrupt.recv() => info!("Received SIGINT"),
                    _ = terminate.recv() => info!("Received SIGTERM"),
                }
            }
            _ => {
                error!("Failed to install signal handlers; falling back to Ctrl-C");
                let _ = tokio::signal::ctrl_c().await;
            }
        }
    }
}

#[cfg(not(unix))]
fn shutdown_signal() -> impl std::future::Future<Output = ()> {
    async {
        let _ = tokio::signal::ctrl_c().await;
        info!("Received Ctrl-C");
    }
}
