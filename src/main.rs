use std::io;

use anyhow::Result;
use clap::Parser;
use equity_lens::cli::Args;
use equity_lens::cli::Shell;
use equity_lens::cli::init_tracing;

fn main() -> Result<()> {
  let args = Args::parse();
  init_tracing(&args.log_level)?;

  let source = args.price_source()?;
  let stdin = io::stdin();
  let mut shell = Shell::new(&args, source, stdin.lock(), io::stdout());
  shell.run()
}
