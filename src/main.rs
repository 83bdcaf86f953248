use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use serde::Serialize;

use leadbook_lib::db;
use leadbook_lib::devtools::seed_snapshot;
use leadbook_lib::error::{CrmError, CrmResult};
use leadbook_lib::intelligence::{provider_from_config, Assistant};
use leadbook_lib::queries::clients::{self, ClientFilter, LeadView};
use leadbook_lib::queries::dashboard;
use leadbook_lib::queries::enquiries::{self, EnquiryFilter, InboxTab};
use leadbook_lib::queries::follow_ups::{self, ClientScope, FollowUpView};
use leadbook_lib::queries::projects;
use leadbook_lib::state::{load_config, Store};
use leadbook_lib::types::{Config, LeadType, StorageBackend};

#[derive(Parser)]
#[command(name = "leadbook")]
#[command(about = "Lead lifecycle and follow-up tracking")]
struct Args {
    /// Override the storage backend from config.json (sqlite, json, memory)
    #[arg(long)]
    storage: Option<StorageBackend>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Replace all data with the demo pipeline
    Seed {
        /// Overwrite existing data
        #[arg(long)]
        force: bool,
    },
    /// Headline counts and sidebar badges
    Dashboard,
    /// Follow-up list
    FollowUps {
        /// all, overdue (missed), today, upcoming
        #[arg(long, default_value = "all")]
        view: FollowUpView,
        /// all, active, lead
        #[arg(long, default_value = "all")]
        scope: ClientScope,
    },
    /// Leads list
    Leads {
        /// pending, converted, dismissed
        #[arg(long, default_value = "pending")]
        view: LeadView,
        #[arg(long, default_value = "")]
        search: String,
        /// Only leads of this tier (hot, warm, cold)
        #[arg(long)]
        lead_type: Option<LeadType>,
    },
    /// Active clients
    Clients {
        #[arg(long, default_value = "")]
        search: String,
    },
    /// Enquiry inbox
    Inbox {
        /// inbox, hold, dismissed
        #[arg(long, default_value = "inbox")]
        tab: InboxTab,
        #[arg(long, default_value = "")]
        search: String,
        #[arg(long)]
        hide_irrelevant: bool,
    },
    /// Project board grouped by stage
    Board,
    /// Run the relevance check over unanalysed inbox enquiries
    Triage,
    /// Generated executive summary for one client
    Summary { client_id: String },
    /// Generated next step for one client
    NextAction { client_id: String },
    /// Copy the current data to a file
    Backup { dest: PathBuf },
}

#[tokio::main]
async fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();
    match run(args).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            log::error!("{}", e);
            eprintln!("Error: {}\n{}", e, e.recovery_suggestion());
            ExitCode::FAILURE
        }
    }
}

async fn run(args: Args) -> CrmResult<()> {
    let mut config = load_config()?;
    if let Some(storage) = args.storage {
        config.storage = storage;
    }
    let store = Store::open(db::open_repository(&config)?)?;
    let now = chrono::Local::now().naive_local();

    match args.command {
        Command::Seed { force } => {
            let current = store.snapshot();
            if !force && !(current.clients.is_empty() && current.enquiries.is_empty()) {
                return Err(CrmError::Config(
                    "Data already exists. Pass --force to overwrite it with the demo pipeline"
                        .to_string(),
                ));
            }
            store.replace_all(seed_snapshot(now))?;
            log::info!("Seeded demo pipeline into {}", store.repository().describe());
        }
        Command::Dashboard => print_json(&dashboard::summarize(&store.snapshot(), now))?,
        Command::FollowUps { view, scope } => {
            let snapshot = store.snapshot();
            let visible =
                follow_ups::filter_follow_ups(&snapshot.follow_ups, &snapshot.clients, view, scope, now);
            print_json(&follow_ups::rows(&visible, &snapshot.clients, now))?;
        }
        Command::Leads {
            view,
            search,
            lead_type,
        } => {
            let snapshot = store.snapshot();
            let filter = ClientFilter {
                search,
                lead_type,
                ..Default::default()
            };
            print_json(&clients::leads(&snapshot.clients, view, &filter))?;
        }
        Command::Clients { search } => {
            let snapshot = store.snapshot();
            let filter = ClientFilter {
                search,
                ..Default::default()
            };
            print_json(&clients::active_clients(&snapshot.clients, &filter))?;
        }
        Command::Inbox {
            tab,
            search,
            hide_irrelevant,
        } => {
            let snapshot = store.snapshot();
            let filter = EnquiryFilter {
                search,
                hide_irrelevant,
            };
            print_json(&enquiries::list(&snapshot.enquiries, tab, &filter))?;
        }
        Command::Board => print_json(&projects::board(&store.snapshot().projects))?,
        Command::Triage => {
            let report = assistant(&config).triage_inbox(&store).await?;
            print_json(&report)?;
        }
        Command::Summary { client_id } => {
            let summary = assistant(&config)
                .summarize_stored_client(&store, &client_id)
                .await?;
            println!("{}", summary);
        }
        Command::NextAction { client_id } => {
            let snapshot = store.snapshot();
            let client = snapshot
                .clients
                .iter()
                .find(|c| c.id == client_id)
                .ok_or_else(|| CrmError::not_found("client", &client_id))?;
            println!("{}", assistant(&config).suggest_next_action(client).await);
        }
        Command::Backup { dest } => {
            store.repository().backup_to(&dest)?;
            log::info!("Backed up {} to {}", store.repository().describe(), dest.display());
        }
    }
    Ok(())
}

fn assistant(config: &Config) -> Assistant {
    Assistant::new(provider_from_config(&config.ai), config)
}

fn print_json<T: Serialize + ?Sized>(value: &T) -> CrmResult<()> {
    let text = serde_json::to_string_pretty(value)?;
    println!("{}", text);
    Ok(())
}
