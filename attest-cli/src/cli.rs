use clap::{Parser, Subcommand};
use std::path::PathBuf;

use crate::config::CliConfig;
use crate::error::CliError;
use crate::runner::AssessmentRunner;

#[derive(Debug, Parser)]
#[command(name = "attest")]
#[command(about = "Compliance self-assessment sessions from the terminal")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(author = env!("CARGO_PKG_AUTHORS"))]
#[command(long_about = None)]
pub struct Cli {
    /// Enable verbose logging
    #[arg(long, global = true)]
    pub verbose: bool,

    /// Configuration file path
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Subcommands
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Walk through one diagnosis round, both phases, and submit it
    Run {
        /// System under assessment
        #[arg(short, long)]
        system: i64,

        /// User performing the assessment
        #[arg(short, long)]
        user: i64,

        /// Profile answers as a JSON file (prompted for when registering without one)
        #[arg(short, long)]
        profile: Option<PathBuf>,
    },

    /// Show saved draft state for a system and user
    Status {
        /// System under assessment
        #[arg(short, long)]
        system: i64,

        /// User performing the assessment
        #[arg(short, long)]
        user: i64,

        /// Diagnosis round (defaults to the backend's next round)
        #[arg(short, long)]
        round: Option<u32>,
    },
}

impl Cli {
    pub async fn run(&self) -> Result<(), CliError> {
        match &self.command {
            Some(Commands::Run {
                system,
                user,
                profile,
            }) => self.handle_run(*system, *user, profile.as_deref()).await,
            Some(Commands::Status {
                system,
                user,
                round,
            }) => self.handle_status(*system, *user, *round).await,
            None => {
                // No subcommand provided, show help
                println!("attest - compliance self-assessment sessions");
                println!("Run 'attest --help' for usage information.");
                Ok(())
            }
        }
    }

    fn load_config(&self) -> Result<CliConfig, CliError> {
        match &self.config {
            Some(path) => Ok(CliConfig::load_from_file(path)?),
            None => Ok(CliConfig::load()?),
        }
    }

    async fn handle_run(
        &self,
        system: i64,
        user: i64,
        profile: Option<&std::path::Path>,
    ) -> Result<(), CliError> {
        let config = self.load_config()?;
        let runner = AssessmentRunner::from_config(&config)?;
        runner.run_round(system, user, profile).await
    }

    async fn handle_status(
        &self,
        system: i64,
        user: i64,
        round: Option<u32>,
    ) -> Result<(), CliError> {
        let config = self.load_config()?;
        let runner = AssessmentRunner::from_config(&config)?;
        runner.show_status(system, user, round).await
    }
}
