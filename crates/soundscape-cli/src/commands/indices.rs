//! List supported acoustic indices.

use clap::Args;
use soundscape_analysis::indices::registry;

#[derive(Args)]
pub struct IndicesArgs {
    /// Only list indices of this domain (temporal, spectral, secondary)
    #[arg(long)]
    domain: Option<String>,
}

pub fn run(args: IndicesArgs) -> anyhow::Result<()> {
    let filter = args.domain.map(|d| d.to_ascii_lowercase());

    println!("Available Indices");
    println!();
    println!("{:<10} {:<10} Description", "Name", "Domain");
    println!("{}", "-".repeat(60));

    for descriptor in registry() {
        let domain = descriptor.domain.name();
        if filter.as_deref().is_some_and(|f| f != domain) {
            continue;
        }
        println!("{:<10} {:<10} {}", descriptor.name, domain, descriptor.description);
    }

    Ok(())
}
