//! Command-line interface definitions for the AI news poster.
//!
//! Credentials can be given as flags or, more usually, through environment
//! variables. Which ones are required depends on the command; a missing one
//! stops the process before anything runs.

use crate::config::{Secret, require};
use crate::error::ConfigError;
use clap::{Parser, Subcommand};

/// Command-line arguments for the AI news poster.
///
/// # Examples
///
/// ```sh
/// # Post every day at the configured time (default 09:00 UTC)
/// ai_news_poster
///
/// # Build today's post and print it without publishing
/// ai_news_poster preview
///
/// # Use a settings file
/// ai_news_poster --config poster.yaml once
/// ```
#[derive(Parser, Debug)]
#[command(author, version, about)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Command>,

    /// Optional path to a YAML settings file
    #[arg(short, long, env = "AI_NEWS_POSTER_CONFIG")]
    pub config: Option<String>,

    /// NewsAPI key
    #[arg(long, env = "NEWS_API_KEY", hide_env_values = true)]
    pub news_api_key: Option<String>,

    /// Chat-completion (DeepSeek) API key
    #[arg(long, env = "DEEPSEEK_API_KEY", hide_env_values = true)]
    pub deepseek_api_key: Option<String>,

    /// LinkedIn OAuth access token
    #[arg(long, env = "LINKEDIN_ACCESS_TOKEN", hide_env_values = true)]
    pub linkedin_access_token: Option<String>,

    /// LinkedIn member id that authors the posts
    #[arg(long, env = "LINKEDIN_PERSON_ID")]
    pub linkedin_person_id: Option<String>,
}

#[derive(Subcommand, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    /// Run once now, then daily at the scheduled time (default)
    Run,
    /// Run the pipeline a single time and exit
    Once,
    /// Fetch and analyze today's news and print the post without publishing
    Preview,
    /// Print the LinkedIn member id that owns the access token
    Whoami,
}

/// Credentials validated for the chosen command.
#[derive(Debug, Clone)]
pub struct Credentials {
    pub news_api_key: Secret,
    pub deepseek_api_key: Secret,
    /// `None` in preview mode, which never publishes.
    pub linkedin: Option<LinkedInCredentials>,
}

#[derive(Debug, Clone)]
pub struct LinkedInCredentials {
    pub access_token: Secret,
    pub person_id: Secret,
}

impl Cli {
    pub fn command(&self) -> Command {
        self.command.unwrap_or(Command::Run)
    }

    /// Credentials for the pipeline commands (`run`, `once`, `preview`).
    pub fn pipeline_credentials(&self) -> Result<Credentials, ConfigError> {
        let linkedin = match self.command() {
            Command::Preview => None,
            _ => Some(LinkedInCredentials {
                access_token: self.access_token()?,
                person_id: require("LINKEDIN_PERSON_ID", self.linkedin_person_id.as_deref())?,
            }),
        };
        Ok(Credentials {
            news_api_key: require("NEWS_API_KEY", self.news_api_key.as_deref())?,
            deepseek_api_key: require("DEEPSEEK_API_KEY", self.deepseek_api_key.as_deref())?,
            linkedin,
        })
    }

    pub fn access_token(&self) -> Result<Secret, ConfigError> {
        require("LINKEDIN_ACCESS_TOKEN", self.linkedin_access_token.as_deref())
    }
}
