use anyhow::Result;
use colored::Colorize;
use std::time::Instant;

use crate::cargo::{self, OnFailure};

/// Crates whose `#[cfg(test)]` modules run on the host. The firmware crate
/// also compiles its simulator drivers and their tests.
const UNIT: &[(&str, &[&str])] = &[
    ("platform", &[]),
    ("playback", &[]),
    ("library", &[]),
    ("firmware", &["--features", "simulator"]),
];

/// Integration suites under each crate's `tests/`.
const SUITES: &[(&str, &str)] = &[
    ("platform", "audio_math_proptest"),
    ("playback", "slot_ownership_proptest"),
    ("library", "catalog_scan"),
    ("firmware", "input_debounce"),
    ("firmware", "scenarios"),
];

pub fn run(unit_only: bool, integration_only: bool) -> Result<()> {
    println!();
    println!("{}", "🧪 Running tests...".cyan().bold());
    println!();

    let start = Instant::now();

    if !integration_only {
        for (krate, features) in UNIT {
            let mut args = vec!["test", "-p", krate, "--lib"];
            args.extend_from_slice(features);
            cargo::step(&format!("unit tests: {krate}"), &args, OnFailure::Abort)?;
        }
    }

    if !unit_only {
        for (krate, suite) in SUITES {
            cargo::step(
                &format!("{krate}: {suite}"),
                &["test", "-p", krate, "--test", suite],
                OnFailure::Abort,
            )?;
        }
    }

    cargo::done("All tests passed", start);
    Ok(())
}
