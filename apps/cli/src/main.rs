//! atplan CLI: extract weekly curriculum data from Annual Teaching Plan tables.
//!
//! Reads table dumps produced by a PDF table extractor and writes one
//! combined JSON file of per-week topics, subtopics, formulas and assessments.

mod commands;

use clap::Parser;
use color_eyre::eyre::Result;

use commands::Cli;

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;
    let cli = Cli::parse();
    commands::init_tracing(&cli);
    commands::run(cli).await
}
