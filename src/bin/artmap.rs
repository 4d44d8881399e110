use anyhow::Result;
use artmap::Cli;
use clap::Parser;

fn main() -> Result<()> {
    let cli = Cli::parse();
    let settings = cli.build_settings()?;
    let summary = artmap::run(&settings)?;
    if !settings.quiet {
        println!(
            "{} records, {} locations, {} paintings -> {}",
            summary.records,
            summary.locations,
            summary.items,
            summary.output.display()
        );
    }
    Ok(())
}
