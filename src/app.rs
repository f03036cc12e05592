use std::path::PathBuf;

use clap::Parser;

use crate::launcher::Launcher;
use crate::prelude::*;
use crate::{logger, manifest, report};

#[derive(Parser, Debug)]
#[command(
    version,
    about = "Launch applications in numbered groups and report their CPU times"
)]
pub struct Cli {
    /// Path to the launch manifest, one `group,application,arguments` record
    /// per line
    pub manifest: PathBuf,

    /// Run each group's processes one at a time instead of concurrently
    #[arg(long)]
    pub sequential: bool,
}

pub fn run() -> Result<()> {
    let cli = Cli::parse();
    logger::init_logger()?;

    let entries = manifest::read_manifest(&cli.manifest)?;

    let mut launcher = Launcher::new();
    let mut dropped = 0usize;
    for entry in &entries {
        if let Err(err) = launcher.add(entry) {
            error!("{err}");
            dropped += 1;
        }
    }
    if launcher.is_empty() {
        bail!(
            "no runnable records in {} ({dropped} dropped)",
            cli.manifest.display()
        );
    }

    info!(
        "running {} process(es) in {} launch group(s)",
        launcher.process_count(),
        launcher.group_count()
    );
    launcher.run_all(cli.sequential);

    println!("{}", report::render(&launcher.report()));
    Ok(())
}
