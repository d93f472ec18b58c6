mod config;
mod event;
mod gh_client;
mod process;

use std::path::PathBuf;

use clap::Parser;
use log::error;
use tabled::{Table, Tabled};

use event::Event;
use gh_client::GithubClient;
use process::{process_event, ProcessOutcome};

#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Args {
    #[arg(
        short,
        long,
        help = "path to config file, also set by PRT_CONFIG_FILE env variable"
    )]
    config: Option<PathBuf>,

    #[arg(
        long,
        help = "webhook event name, defaults to the GITHUB_EVENT_NAME env variable"
    )]
    event_name: Option<String>,

    #[arg(
        long,
        help = "path to the webhook payload json, defaults to the GITHUB_EVENT_PATH env variable"
    )]
    event_path: Option<PathBuf>,

    #[arg(
        long,
        short,
        default_value_t = false,
        help = "compute and report label changes without writing them"
    )]
    dry_run: bool,
}

#[derive(Clone, Debug, Tabled)]
struct TriageRow {
    number: u64,
    todo: String,
    ci: String,
    labels_changed: bool,
}

fn summarize(outcome: &ProcessOutcome) -> Vec<TriageRow> {
    outcome
        .reports
        .iter()
        .map(|report| TriageRow {
            number: report.number,
            todo: report
                .triage
                .todo
                .map(|todo| todo.to_string())
                .unwrap_or_else(|| "-".to_string()),
            ci: report
                .triage
                .ci_status
                .map(|ci_status| ci_status.to_string())
                .unwrap_or_else(|| "-".to_string()),
            labels_changed: report.labels_changed,
        })
        .collect()
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    simple_logger::init_with_env().unwrap();

    let args = Args::parse();

    let cfg = config::load(args.config).await?;
    let event = Event::load(args.event_name, args.event_path).await?;
    let github_client = GithubClient::new().await?;

    let outcome = process_event(&event, &github_client, &cfg, args.dry_run).await?;

    if !outcome.reports.is_empty() {
        println!("{}", Table::new(summarize(&outcome)));
    }

    let mut failed = false;

    for failure in &outcome.failures {
        error!("PR#{}: {}", failure.number, failure.error);
        failed = true;
    }

    if outcome.missing_description() {
        error!("a pull request is ready to be merged, but it doesn't have a body, and one is required");
        failed = true;
    }

    if failed {
        std::process::exit(1);
    }

    Ok(())
}
