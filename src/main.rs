#![deny(warnings)]

use clap::Parser;
use physique::cli::Cli;
use physique::logging::*;
use std::process;

#[tokio::main]
async fn main() {
    let log = DEFAULT.new(o!("function" => "main"));
    let cli = Cli::parse();

    if let Err(err) = physique::cli::run(cli).await {
        error!(log, "command failed"; "error" => %err);
        eprintln!("Error: {:#}", err);
        process::exit(1);
    }
}
