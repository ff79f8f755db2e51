//! Show the effective configuration.

use super::common::AnalysisOptions;
use clap::Args;
use soundscape_config::{default_config_path, to_toml};

#[derive(Args)]
pub struct ConfigArgs {
    /// Print the default configuration file path instead
    #[arg(long)]
    path: bool,

    #[command(flatten)]
    options: AnalysisOptions,
}

pub fn run(args: ConfigArgs) -> anyhow::Result<()> {
    if args.path {
        println!("{}", default_config_path().display());
        return Ok(());
    }

    let config = args.options.resolve()?;
    print!("{}", to_toml(&config)?);
    Ok(())
}
