use anyhow::{Context, Result};
use chrono::Utc;
use clap::{Args, Parser, Subcommand};
use dialoguer::{theme::ColorfulTheme, Select};
use log::info;
use serde::Serialize;
use std::path::PathBuf;
use std::time::Duration;

use deploylens::config::{ConfigFile, ConfigSource, Overrides, ServerConfig};
use deploylens::onboarding::{AnswerStore, Answers, Wizard, WizardState, QUESTIONS};
use deploylens::server::client::ApiClient;
use deploylens::server::DeployServer;
use deploylens::views::View;

#[derive(Parser)]
#[command(name = "deploylens")]
#[command(author, version, about = "Deployment Insights Tool", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Output file path (defaults to stdout)
    #[arg(short, long, global = true)]
    output: Option<PathBuf>,

    /// Pretty print JSON output
    #[arg(short, long, global = true, default_value_t = false)]
    pretty: bool,
}

#[derive(Args)]
struct ServerArgs {
    /// Deployment server URL
    #[arg(short = 's', long, env = "DEPLOYLENS_SERVER_URL")]
    server_url: Option<String>,

    /// API key for the deployment server
    #[arg(short = 'k', long, env = "DEPLOYLENS_API_KEY", hide_env_values = true)]
    api_key: Option<String>,

    /// Per-request timeout in seconds
    #[arg(long)]
    timeout: Option<u64>,

    /// Maximum number of spaces fetched at once
    #[arg(long)]
    concurrency: Option<usize>,

    /// Config file (defaults to ~/.deploylens/config.toml)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Seconds to wait for configuration to resolve
    #[arg(long, default_value_t = 10)]
    resolve_timeout: u64,
}

#[derive(Subcommand)]
enum Commands {
    /// Collect deployment insights across all active spaces
    Report {
        #[command(flatten)]
        server: ServerArgs,

        /// Which projection of the summary to print
        #[arg(long, value_enum, default_value_t = View::Overview)]
        view: View,
    },
    /// Estimate the value of automation from onboarding answers
    Value {
        #[command(flatten)]
        server: ServerArgs,
    },
    /// Answer the baseline questionnaire
    Onboard {
        /// Print the stored answers and exit
        #[arg(long)]
        show: bool,

        /// Delete the stored answers
        #[arg(long, conflicts_with = "show")]
        reset: bool,
    },
}

impl Cli {
    pub async fn execute(&self) -> Result<()> {
        match &self.command {
            Commands::Report { server, view } => self.report(server, *view).await,
            Commands::Value { server } => self.report(server, View::Value).await,
            Commands::Onboard { show, reset } => self.onboard(*show, *reset),
        }
    }

    async fn report(&self, args: &ServerArgs, view: View) -> Result<()> {
        let server = connect(args).await?;
        info!(
            "Collecting {} insights from {}",
            view.name(),
            server.client.server_url()
        );

        let answers = if view == View::Value {
            stored_answers()?
        } else {
            Answers::default()
        };

        let summary = server.collect_summary(Utc::now()).await?;
        self.write(&view.render(&summary, &answers))
    }

    fn onboard(&self, show: bool, reset: bool) -> Result<()> {
        let store = AnswerStore::user_default().context("Could not determine home directory")?;

        if reset {
            if store.clear()? {
                info!("Removed {}", store.path().display());
            } else {
                info!("No onboarding answers stored at {}", store.path().display());
            }
            return Ok(());
        }

        if show {
            return match store.load()? {
                Some(stored) => self.write(&stored),
                None => {
                    println!("No onboarding answers stored yet. Run `deploylens onboard`.");
                    Ok(())
                }
            };
        }

        run_wizard(store)
    }

    fn write<T: Serialize>(&self, value: &T) -> Result<()> {
        let json_output = if self.pretty {
            serde_json::to_string_pretty(value)?
        } else {
            serde_json::to_string(value)?
        };

        if let Some(output_path) = &self.output {
            std::fs::write(output_path, json_output)?;
            info!("Output written to: {}", output_path.display());
        } else {
            println!("{json_output}");
        }

        Ok(())
    }
}

async fn connect(args: &ServerArgs) -> Result<DeployServer> {
    let overrides = Overrides(ServerConfig {
        server_url: args.server_url.clone(),
        api_key: args.api_key.clone(),
        request_timeout_secs: args.timeout,
        max_concurrency: args.concurrency,
    });
    let file = match &args.config {
        Some(path) => Some(ConfigFile::new(path.clone())),
        None => ConfigFile::user_default(),
    };

    let mut sources: Vec<&dyn ConfigSource> = vec![&overrides];
    if let Some(file) = &file {
        sources.push(file);
    }

    let (client, settings) =
        ApiClient::init(&sources, Duration::from_secs(args.resolve_timeout)).await?;
    Ok(DeployServer::new(client, settings.max_concurrency))
}

fn stored_answers() -> Result<Answers> {
    Ok(AnswerStore::user_default()
        .map(|store| store.answers())
        .transpose()?
        .unwrap_or_default())
}

fn run_wizard(store: AnswerStore) -> Result<()> {
    let mut wizard = Wizard::new(store)?;
    let theme = ColorfulTheme::default();
    wizard.start();

    while let WizardState::InProgress { step } = wizard.state() {
        let Some(question) = wizard.current_question() else {
            break;
        };

        let mut items: Vec<&str> = question.options.iter().map(|o| o.label).collect();
        items.push("Back");
        items.push("Skip");

        let default = wizard
            .answers()
            .get(question.id)
            .and_then(|id| question.options.iter().position(|o| o.id == id))
            .unwrap_or(0);

        let choice = Select::with_theme(&theme)
            .with_prompt(format!(
                "[{}/{}] {}",
                step + 1,
                QUESTIONS.len(),
                question.prompt
            ))
            .items(items.as_slice())
            .default(default)
            .interact()?;

        match choice {
            i if i < question.options.len() => {
                wizard.select(question.options[i].id)?;
            }
            i if i == question.options.len() => wizard.back(),
            _ => wizard.skip()?,
        }
    }

    match wizard.state() {
        WizardState::Completed => println!("Thanks! Run `deploylens value` to see your estimate."),
        WizardState::Skipped => println!(
            "Saved {} answers. Run `deploylens onboard` again to finish.",
            wizard.answers().len()
        ),
        _ => {}
    }

    Ok(())
}
