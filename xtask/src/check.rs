use anyhow::Result;
use colored::Colorize;
use std::time::Instant;

use crate::cargo::{self, OnFailure};

/// Embedded target the no_std crates must keep building for.
const EMBEDDED_TARGET: &str = "thumbv7em-none-eabihf";

struct Step {
    label: &'static str,
    args: &'static [&'static str],
    /// Failure only warns instead of aborting.
    advisory: bool,
}

const STEPS: &[Step] = &[
    Step {
        label: "host workspace",
        args: &["check", "--workspace", "--all-targets"],
        advisory: false,
    },
    Step {
        label: "simulator",
        args: &["check", "-p", "firmware", "--features", "simulator", "--bins"],
        advisory: false,
    },
    Step {
        label: "no_std crates (defmt)",
        args: &[
            "check",
            "-p",
            "platform",
            "-p",
            "playback",
            "-p",
            "library",
            "-p",
            "firmware",
            "--target",
            EMBEDDED_TARGET,
            "--features",
            "firmware/defmt",
        ],
        advisory: false,
    },
    Step {
        label: "clippy",
        args: &["clippy", "--workspace", "--all-targets", "--", "-D", "warnings"],
        advisory: true,
    },
    Step {
        label: "formatting",
        args: &["fmt", "--all", "--check"],
        advisory: true,
    },
];

pub fn run() -> Result<()> {
    println!();
    println!("{}", "🔍 Checking builds...".cyan().bold());
    println!();

    let start = Instant::now();
    for step in STEPS {
        let on_failure = if step.advisory {
            OnFailure::Warn
        } else {
            OnFailure::Abort
        };
        cargo::step(step.label, step.args, on_failure)?;
    }
    cargo::done("All checks completed", start);
    Ok(())
}
