//! Topics Command
//!
//! Lists the main topics of a text document.
//!
//! Usage:
//!   coursewright topics notes.md

use std::path::Path;

use tokio::runtime::Runtime;

use crate::cli::{CommandContext, Output};
use crate::export::{PlainTextExtractor, TextExtractor};
use crate::types::Result;

pub fn run(file: &Path, config_path: Option<&Path>, quiet: bool) -> Result<()> {
    let out = Output::quiet(quiet);

    let text = PlainTextExtractor.extract_text(file)?;
    let ctx = CommandContext::load(config_path)?;

    let rt = Runtime::new()?;
    let topics = rt.block_on(ctx.generator().extract_topics(&text))?;

    if topics.is_empty() {
        out.warning(&format!("No topics found in {}", file.display()));
        return Ok(());
    }

    out.success(&format!("{} topics found in {}", topics.len(), file.display()));
    for (i, topic) in topics.iter().enumerate() {
        println!("{:>3}. {}", i + 1, topic);
    }
    Ok(())
}
