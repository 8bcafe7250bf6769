use clap::Parser;
use etl_core::driver::Config;
use etl_core::error::Result;

/// Runs the two-pass ETL pipeline over `compressed/` in the current directory.
#[derive(Parser)]
#[command(author, version, about = "etl CLI", long_about = None)]
struct Cli {
    /// Base name for the emitted columnar and variable-buffer files.
    index_name: String,
    /// Number of groups under `compressed/` to process.
    num_groups: usize,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    etl_core::driver::run(".", &cli.index_name, cli.num_groups, &Config::default())
}
