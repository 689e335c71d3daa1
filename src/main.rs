#![allow(clippy::doc_markdown)]
#![doc = include_str!("../README.md")]

mod api;
mod chart;
mod cli;
mod core;
mod display;
mod export;
mod input;
mod prelude;
mod quantity;
mod statistics;
mod tables;

use std::process::ExitCode;

use clap::{Parser, crate_version, error::ErrorKind};
use tracing_subscriber::EnvFilter;

use crate::{
    cli::{Args, Command, correlate, graph, normalize_help_flags},
    prelude::*,
};

fn main() -> ExitCode {
    let _ = dotenvy::dotenv();
    tracing_subscriber::fmt()
        .without_time()
        .compact()
        .with_writer(std::io::stderr)
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let args = match Args::try_parse_from(normalize_help_flags(std::env::args_os())) {
        Ok(args) => args,
        Err(error) if matches!(error.kind(), ErrorKind::DisplayHelp | ErrorKind::DisplayVersion) => {
            error.exit()
        }
        Err(error) => {
            let _ = error.print();
            return ExitCode::FAILURE;
        }
    };
    debug!(version = crate_version!(), "starting…");

    match run(args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(error) => {
            eprintln!("Error: {error:#}");
            ExitCode::FAILURE
        }
    }
}

fn run(args: Args) -> Result {
    match args.command {
        Command::Graph(args) => graph(&args),
        Command::Correlate(args) => correlate(&args),
    }
}
