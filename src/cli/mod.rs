//! CLI adapter for CourseAlign
//!
//! Provides the command-line interface for building course collections
//! and retrieving textbook passages. Depends on `core/` only.
//!
//! # Architecture
//!
//! ```text
//! +------------------+
//! |     core/        |
//! |  (domain logic)  |
//! +--------+---------+
//!          |
//!          v
//! +------------------+
//! |      cli/        |
//! | (clap adapter)   |
//! +------------------+
//! ```

pub mod commands;
pub mod output;

use clap::{Parser, Subcommand};

/// CourseAlign - textbook retrieval for course planning
///
/// Index a course textbook into overlapping chunks and retrieve the
/// passages most similar to a concept or slide, with page citations.
#[derive(Parser, Debug)]
#[command(name = "coursealign")]
#[command(version)]
#[command(about = "Textbook chunk indexing and retrieval", long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Output format
    #[arg(long, global = true, default_value = "human")]
    pub format: OutputFormat,

    #[command(subcommand)]
    pub command: Commands,
}

/// Output format for CLI commands
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum OutputFormat {
    /// Human-readable output (default)
    #[default]
    Human,
    /// JSON output for scripting
    Json,
}

/// Available CLI commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Index a textbook (PDF or text) as a course collection
    #[command(name = "index-textbook")]
    IndexTextbook(commands::IndexArgs),

    /// Retrieve the passages most similar to one or more queries
    Retrieve(commands::RetrieveArgs),

    /// List registered courses and indexed collections
    #[command(name = "list-courses")]
    ListCourses(commands::courses::ListArgs),

    /// Show metadata of an indexed course collection
    #[command(name = "get-course-info")]
    GetCourseInfo(commands::courses::InfoArgs),

    /// Check collection artifacts for consistency
    #[command(name = "verify-course")]
    VerifyCourse(commands::VerifyArgs),

    /// Show current configuration
    #[command(name = "show-config")]
    ShowConfig(commands::ConfigArgs),

    /// Generate shell completion scripts
    ///
    /// Output completion script to stdout. To install:
    ///
    ///   bash:  coursealign completions bash > ~/.local/share/bash-completion/completions/coursealign
    ///   zsh:   coursealign completions zsh > ~/.zfunc/_coursealign
    ///   fish:  coursealign completions fish > ~/.config/fish/completions/coursealign.fish
    Completions(commands::CompletionsArgs),
}

/// Run the CLI with the provided arguments
pub async fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    use crate::core::config::Config;
    use crate::core::services::Services;
    use crate::core::xdg::XdgDirs;
    use std::sync::Arc;

    // Handle completions command early (doesn't need services)
    if let Commands::Completions(args) = cli.command {
        return commands::completions::execute(args);
    }

    let xdg = XdgDirs::new();
    xdg.ensure_dirs_exist()?;
    xdg.log_paths();

    let config = Config::load_with_xdg(&xdg)?;
    config.log_config();

    let services = Arc::new(Services::new(config)?);

    match cli.command {
        Commands::IndexTextbook(args) => {
            commands::index::execute(args, &services, cli.format).await
        }
        Commands::Retrieve(args) => commands::retrieve::execute(args, &services, cli.format).await,
        Commands::ListCourses(args) => {
            commands::courses::execute_list(args, &services, cli.format).await
        }
        Commands::GetCourseInfo(args) => {
            commands::courses::execute_info(args, &services, cli.format).await
        }
        Commands::VerifyCourse(args) => {
            commands::verify::execute(args, &services, cli.format).await
        }
        Commands::ShowConfig(args) => commands::config::execute(args, &services, cli.format).await,
        Commands::Completions(_) => unreachable!(), // Handled above
    }
}
