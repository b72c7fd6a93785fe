use anyhow::Result;
use colored::Colorize;
use std::time::Instant;

use crate::cargo::{self, OnFailure};

/// Build the workspace docs, simulator drivers included.
pub fn run(open: bool) -> Result<()> {
    println!();
    println!("{}", "📚 Building documentation...".cyan().bold());
    println!();

    let start = Instant::now();
    let mut args = vec!["doc", "--workspace", "--no-deps", "--features", "firmware/simulator"];
    if open {
        args.push("--open");
    }
    cargo::step("rustdoc", &args, OnFailure::Abort)?;

    if !open {
        println!(
            "   {}",
            "Start at target/doc/firmware/index.html, or pass --open".dimmed()
        );
    }
    cargo::done("Documentation built", start);
    Ok(())
}
