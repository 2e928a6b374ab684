use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use visor_assets::{AssetResolver, PhaseMount};

#[derive(Parser, Debug)]
#[command(
    about = "List mounted phase folders and expand asset patterns",
    version
)]
struct Args {
    /// Install directory containing extracted phase_* folders
    #[arg(value_name = "DIR")]
    install_dir: PathBuf,

    /// Glob patterns to expand against the mounted phases (may repeat)
    #[arg(long = "glob", value_name = "PATTERN")]
    patterns: Vec<String>,

    /// Print the mount table as JSON instead of text
    #[arg(long)]
    json: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();
    let mount = PhaseMount::open(&args.install_dir)
        .with_context(|| format!("mounting {}", args.install_dir.display()))?;

    if args.json {
        let json = serde_json::to_string_pretty(&mount).context("serializing mount table")?;
        println!("{json}");
    } else {
        println!(
            "{} phase folder(s) mounted from {}",
            mount.mounted().len(),
            mount.root().display()
        );
        for phase in mount.mounted() {
            println!(
                "  {name:<12} {path}",
                name = phase.dir_name,
                path = phase.path.display()
            );
        }
        if !mount.missing().is_empty() {
            println!("  missing: {}", mount.missing().join(", "));
        }
    }

    for pattern in &args.patterns {
        let hits = mount
            .glob(pattern)
            .with_context(|| format!("expanding {pattern}"))?;
        println!("{pattern}: {} match(es)", hits.len());
        for hit in hits {
            println!("  {hit}");
        }
    }
    Ok(())
}
