use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "site-chat")]
#[command(about = "Crawls a website and answers questions about it over a JSON API")]
#[command(version)]
pub struct Args {
    /// JSON configuration file; environment variables override its values
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    /// Run the HTTP API (default)
    Serve,
    /// Crawl the site once and persist the pages
    Crawl,
    /// Push the latest crawl into the search index
    Index,
}

impl Args {
    pub fn command(&self) -> Command {
        self.command.unwrap_or(Command::Serve)
    }
}
