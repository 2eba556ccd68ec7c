//! CourseAlign CLI - index course textbooks and retrieve passages
//!
//! # Examples
//!
//! ```bash
//! # Index a textbook for a course
//! coursealign index-textbook ./biology.pdf --course BIO200
//!
//! # Retrieve passages for a concept
//! coursealign retrieve "cell membrane transport" --course BIO200 -k 5
//!
//! # Several slides at once
//! coursealign retrieve "osmosis" "active transport" --course BIO200
//!
//! # List courses
//! coursealign list-courses
//! ```

use clap::Parser;
use coursealign::cli::{output, run, Cli};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

fn init_tracing() {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("coursealign=warn"));
    let json = std::env::var("COURSEALIGN_LOG_FORMAT")
        .map(|v| v.eq_ignore_ascii_case("json"))
        .unwrap_or(false);

    // Logs go to stderr; stdout carries command output
    if json {
        tracing_subscriber::registry()
            .with(filter)
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_writer(std::io::stderr),
            )
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(
                tracing_subscriber::fmt::layer()
                    .compact()
                    .with_writer(std::io::stderr),
            )
            .init();
    }
}

#[tokio::main]
async fn main() {
    init_tracing();
    let cli = Cli::parse();

    if let Err(e) = run(cli).await {
        output::print_error(&e.to_string());
        std::process::exit(1);
    }
}
