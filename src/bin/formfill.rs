//! Formfill CLI
//!
//! Drives the autofill engine from the command line: scan a page snapshot,
//! run the full fill cycle against a chat endpoint, extract a profile from
//! document text, and manage stored profiles.

use anyhow::Context;
use clap::{Parser, Subcommand};
use formfill::{ChatClient, LlmConfig, PageSnapshot, ProfileStore, Request, Service};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "formfill")]
#[command(version)]
#[command(about = "LLM-driven form autofill over page snapshots", long_about = None)]
struct Cli {
    /// Path to the profile store (default: the platform data directory)
    #[arg(long, value_name = "FILE")]
    store: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// List the fillable fields of a page snapshot with their descriptions
    Scan {
        /// Page snapshot JSON file
        page: PathBuf,
    },
    /// Run the full cycle: scan, ask the model, apply the fill
    Fill {
        /// Page snapshot JSON file
        page: PathBuf,
        /// Profile id to use instead of the active profile
        #[arg(long)]
        profile: Option<String>,
        /// Session instructions that override profile data
        #[arg(long)]
        instructions: Option<String>,
        /// Write the filled snapshot to this file
        #[arg(long, short = 'o', value_name = "FILE")]
        output: Option<PathBuf>,
    },
    /// Extract a structured profile from raw document text
    Extract {
        /// Text file (resume, cover letter, ...)
        text: PathBuf,
        /// Save the extracted profile under this id
        #[arg(long)]
        save_as: Option<String>,
    },
    /// Manage stored profiles
    Profile {
        #[command(subcommand)]
        command: ProfileCommand,
    },
}

#[derive(Subcommand)]
enum ProfileCommand {
    /// List profile ids, marking the active one
    List,
    /// Print a profile as JSON
    Show { id: String },
    /// Import a profile from a JSON file
    Import { id: String, file: PathBuf },
    /// Delete a profile
    Delete { id: String },
    /// Set the active profile
    Activate { id: String },
}

fn store_path(cli: &Cli) -> anyhow::Result<PathBuf> {
    if let Some(path) = &cli.store {
        return Ok(path.clone());
    }
    let base = dirs::data_dir().context("could not determine the platform data directory")?;
    Ok(base.join("formfill").join("profiles.json"))
}

fn print_payload(payload: &serde_json::Value) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(payload)?);
    if payload.get("error").is_some() {
        anyhow::bail!("request failed");
    }
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    env_logger::init();
    let cli = Cli::parse();
    let store = ProfileStore::open(store_path(&cli)?)?;

    match cli.command {
        Command::Scan { page } => {
            let raw = std::fs::read_to_string(&page)
                .with_context(|| format!("reading {}", page.display()))?;
            let page = PageSnapshot::from_json(&raw)?;
            let fields = formfill::scan_fields(&page);
            println!("{}", serde_json::to_string_pretty(&fields)?);
        }
        Command::Fill {
            page,
            profile,
            instructions,
            output,
        } => {
            let raw = std::fs::read_to_string(&page)
                .with_context(|| format!("reading {}", page.display()))?;
            let mut snapshot = PageSnapshot::from_json(&raw)?;
            let profile = match profile {
                Some(id) => store.get_profile(&id)?,
                None => store.active_profile()?,
            };

            let client = ChatClient::new(LlmConfig::from_env()?)?;
            let mut service = Service::new(client, store);

            let fields = formfill::scan_fields(&snapshot);
            let fields_found = fields.len();
            let context = formfill::service::PageContext {
                url: snapshot.url.clone(),
                title: snapshot.title.clone(),
                fields,
            };
            let response = service
                .handle(Request::Autofill {
                    context,
                    profile,
                    instructions,
                })
                .await;
            if response.get("error").is_some() {
                print_payload(&response)?;
            }

            let values = formfill::service::fill_values(&response);
            let report = formfill::fill_form(&mut snapshot, &values);
            print_payload(&serde_json::json!({
                "success": true,
                "fieldsFound": fields_found,
                "fieldsFilled": report.fields_filled(),
            }))?;
            if let Some(path) = output {
                std::fs::write(&path, snapshot.to_json()?)
                    .with_context(|| format!("writing {}", path.display()))?;
            }
        }
        Command::Extract { text, save_as } => {
            let raw = std::fs::read_to_string(&text)
                .with_context(|| format!("reading {}", text.display()))?;
            let client = ChatClient::new(LlmConfig::from_env()?)?;
            let mut service = Service::new(client, store);
            let response = service.handle(Request::ExtractProfile { text: raw }).await;
            print_payload(&response)?;
            if let Some(id) = save_as {
                service.store_mut().save_profile(&id, response)?;
                log::info!("saved profile {id}");
            }
        }
        Command::Profile { command } => {
            let mut store = store;
            match command {
                ProfileCommand::List => {
                    let active = store.active_profile_id();
                    for id in store.list_profiles() {
                        let marker = if Some(&id) == active.as_ref() { "*" } else { " " };
                        println!("{marker} {id}");
                    }
                }
                ProfileCommand::Show { id } => {
                    let profile = store.get_profile(&id)?;
                    println!("{}", serde_json::to_string_pretty(&profile)?);
                }
                ProfileCommand::Import { id, file } => {
                    let raw = std::fs::read_to_string(&file)
                        .with_context(|| format!("reading {}", file.display()))?;
                    let profile: serde_json::Value = serde_json::from_str(&raw)?;
                    store.save_profile(&id, profile)?;
                    println!("imported {id}");
                }
                ProfileCommand::Delete { id } => {
                    store.delete_profile(&id)?;
                    println!("deleted {id}");
                }
                ProfileCommand::Activate { id } => {
                    store.set_active_profile(&id)?;
                    println!("active profile: {id}");
                }
            }
        }
    }

    Ok(())
}
