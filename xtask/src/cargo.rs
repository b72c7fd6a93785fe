use anyhow::{Context, Result};
use colored::Colorize;
use std::process::Command;
use std::time::Instant;

/// How a failing cargo run is reported.
#[derive(Clone, Copy, PartialEq, Eq)]
pub enum OnFailure {
    Abort,
    Warn,
}

/// Run `cargo <args>` under a progress label. Output is only shown when the
/// run fails; an aborting failure becomes an error.
pub fn step(label: &str, args: &[&str], on_failure: OnFailure) -> Result<()> {
    println!("{}", format!("  {label}...").cyan());
    let start = Instant::now();

    let output = Command::new("cargo")
        .args(args)
        .output()
        .with_context(|| format!("Failed to run cargo for {label}"))?;

    if output.status.success() {
        println!(
            "{}",
            format!("  ✓ {label} in {:.2}s", start.elapsed().as_secs_f64()).green()
        );
        println!();
        return Ok(());
    }

    match on_failure {
        OnFailure::Warn => eprintln!("{}", format!("  ⚠ {label} reported issues").yellow().bold()),
        OnFailure::Abort => eprintln!("{}", format!("  ✗ {label} failed").red().bold()),
    }
    eprintln!();
    // Test harness results go to stdout, compiler diagnostics to stderr.
    for line in String::from_utf8_lossy(&output.stdout)
        .lines()
        .chain(String::from_utf8_lossy(&output.stderr).lines())
        .filter(|l| !l.trim().is_empty())
    {
        eprintln!("  {line}");
    }
    eprintln!();
    if on_failure == OnFailure::Abort {
        anyhow::bail!("{label} failed");
    }
    Ok(())
}

/// Print the closing line of a task.
pub fn done(what: &str, start: Instant) {
    println!(
        "{}",
        format!("✓ {what} in {:.2}s", start.elapsed().as_secs_f64())
            .green()
            .bold()
    );
    println!();
}
