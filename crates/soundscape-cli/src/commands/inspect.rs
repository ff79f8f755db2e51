//! Describe a saved index table.

use super::common::summarize;
use clap::Args;
use soundscape_analysis::read_index_table;
use std::path::PathBuf;

#[derive(Args)]
pub struct InspectArgs {
    /// Index table (CSV) written by `calculate`
    #[arg(value_name = "FILE")]
    file: PathBuf,
}

pub fn run(args: InspectArgs) -> anyhow::Result<()> {
    let table = read_index_table(&args.file)?;

    let segments = table.timestamps.len();
    let bins = table.frequencies.len();

    println!("File:        {}", args.file.display());
    println!("Segments:    {segments}");
    if let (Some(first), Some(last)) = (table.timestamps.first(), table.timestamps.last()) {
        println!("Timestamps:  {first}s .. {last}s");
    }
    println!("Bins:        {bins}");
    if let (Some(low), Some(high)) = (table.frequencies.first(), table.frequencies.last()) {
        println!("Frequencies: {low} Hz .. {high} Hz");
    }
    println!();
    println!("{:<10} {:>12} {:>12} {:>12}", "Index", "Min", "Mean", "Max");
    println!("{}", "-".repeat(49));

    for (name, matrix) in &table.indices {
        let (min, mean, max) = summarize(matrix.as_slice());
        println!("{name:<10} {min:>12.6} {mean:>12.6} {max:>12.6}");
    }

    Ok(())
}
