//! CLI command definitions and argument parsing

use std::path::PathBuf;

use clap::Parser;
use clap::Subcommand;

use crate::profile::ProfileRequest;

#[derive(Parser, Debug)]
#[command(name = "icebreaker")]
#[command(about = "Ask questions about a LinkedIn profile using retrieval-augmented generation")]
#[command(version)]
pub struct Cli {
    /// Enable verbose debug logging (default: info level)
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Path to a TOML configuration file (default: ./config.toml when present)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Use the bundled mock profile instead of calling ProxyCurl
    #[arg(long)]
    pub mock: bool,

    /// LinkedIn profile URL to process
    #[arg(long)]
    pub url: Option<String>,

    /// ProxyCurl API key (overrides the configured key)
    #[arg(long)]
    pub api_key: Option<String>,

    /// Generation model for this run (must be one of the supported models)
    #[arg(long)]
    pub model: Option<String>,

    /// Run the end-to-end self test against the mock profile
    #[arg(long)]
    pub test: bool,

    /// Ask this question and exit; may be repeated. Without it an interactive loop starts
    #[arg(short, long)]
    pub question: Vec<String>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

impl Cli {
    /// Profile request described by `--mock`, `--url` and `--api-key`
    ///
    /// No URL means the mock profile.
    pub fn profile_request(&self) -> ProfileRequest {
        match self.url.as_deref().map(str::trim) {
            Some(url) if !self.mock && !url.is_empty() => {
                ProfileRequest::live(url, self.api_key.clone())
            }
            _ => ProfileRequest::mock(),
        }
    }
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Start the web form server
    Serve {
        /// Host to bind to (default: server.host)
        #[arg(long)]
        host: Option<String>,
        /// Port to listen on (default: server.port)
        #[arg(short, long)]
        port: Option<u16>,
    },
    /// Show the effective configuration with secrets redacted
    Config,
    /// Check the ProxyCurl key and the model provider
    Diagnose,
}
