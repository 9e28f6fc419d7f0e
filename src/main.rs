// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 DeCriCo Contributors

//! `decrico` maintenance tool for the local store.

use std::path::PathBuf;
use std::process::ExitCode;

use chrono::Utc;
use serde::Serialize;

use decrico_core::config::AppConfig;
use decrico_core::error::AppResult;
use decrico_core::logging;
use decrico_core::state::AppContext;
use decrico_core::storage::{seed_sample_data, ProposalRepository, StoreError};

const USAGE: &str = "usage: decrico <command>

commands:
  stats            print platform statistics as JSON (backend counts in remote mode)
  seed             insert sample data into an empty store
  export <file>    write every record to a JSON file
  import <file>    replace the store contents with a JSON export
  finalize         close proposals whose voting deadline has passed";

#[derive(Debug, PartialEq, Eq)]
enum Command {
    Stats,
    Seed,
    Export(PathBuf),
    Import(PathBuf),
    Finalize,
}

impl Command {
    fn parse(args: &[String]) -> Option<Self> {
        match args {
            [cmd] if cmd == "stats" => Some(Command::Stats),
            [cmd] if cmd == "seed" => Some(Command::Seed),
            [cmd] if cmd == "finalize" => Some(Command::Finalize),
            [cmd, file] if cmd == "export" => Some(Command::Export(PathBuf::from(file))),
            [cmd, file] if cmd == "import" => Some(Command::Import(PathBuf::from(file))),
            _ => None,
        }
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let config = match AppConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("configuration error: {e}");
            return ExitCode::FAILURE;
        }
    };
    if let Err(e) = logging::init(config.log_format) {
        eprintln!("failed to initialise logging: {e}");
    }

    let args: Vec<String> = std::env::args().skip(1).collect();
    let Some(command) = Command::parse(&args) else {
        eprintln!("{USAGE}");
        return ExitCode::from(2);
    };

    match run(config, command).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!(error = %e, "Command failed");
            eprintln!("{}", e.user_message());
            ExitCode::FAILURE
        }
    }
}

async fn run(config: AppConfig, command: Command) -> AppResult<()> {
    let ctx = AppContext::open(config)?;

    match command {
        Command::Stats => match ctx.remote() {
            Some(remote) => {
                let requests = remote.requests_with_details(None).await?;
                let proposals = remote.proposals(None).await?;
                println!("remote aid requests: {}", requests.len());
                println!("remote proposals: {}", proposals.len());
            }
            None => {
                let stats = ctx.analytics()?.platform_stats()?;
                println!("{}", to_json(&stats)?);
            }
        },
        Command::Seed => {
            let report = seed_sample_data(ctx.store()?)?;
            if report.is_empty() {
                println!("store already has users; nothing seeded");
            } else {
                println!(
                    "seeded {} users, {} requests, {} donations, {} proposals, {} votes",
                    report.users, report.requests, report.donations, report.proposals, report.votes
                );
            }
        }
        Command::Export(path) => {
            let dump = ctx.store()?.export()?;
            std::fs::write(&path, to_json(&dump)?)?;
            println!("exported {} records to {}", dump.record_count(), path.display());
        }
        Command::Import(path) => {
            let json = std::fs::read_to_string(&path)?;
            let count = ctx.store()?.import_json(&json)?;
            println!("imported {count} records from {}", path.display());
        }
        Command::Finalize => {
            let closed = ProposalRepository::new(ctx.store()?).finalize_expired(Utc::now())?;
            for proposal in &closed {
                println!(
                    "proposal {} \"{}\": {} ({} for, {} against)",
                    proposal.id,
                    proposal.title,
                    proposal.status.as_str(),
                    proposal.votes_for,
                    proposal.votes_against
                );
            }
            println!("{} proposal(s) finalized", closed.len());
        }
    }
    Ok(())
}

fn to_json<T: Serialize>(value: &T) -> AppResult<String> {
    Ok(serde_json::to_string_pretty(value).map_err(StoreError::from)?)
}
