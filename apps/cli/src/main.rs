use std::{
    io::{self, BufRead},
    path::PathBuf,
    sync::Arc,
};

use anyhow::{bail, Result};
use clap::{Parser, Subcommand};
use client_core::{
    load_settings,
    views::{
        landing_destination, DecisionDetailView, DecisionForm, DecisionListView, Navigation,
        SignInForm, SignUpForm,
    },
    ApiClient, ClientError, FileTokenStore, SessionStore,
};
use serde::Serialize;
use shared::{
    domain::{DecisionCategory, DecisionId, DecisionStatus},
    error::{ApiError, ApiException, ErrorCode},
    protocol::{DecisionUpdate, SimulationParams},
};
use tracing::debug;
use tracing_subscriber::EnvFilter;

mod render;

#[derive(Parser, Debug)]
#[command(name = "lifeecho", about = "Plan life decisions and explore simulated futures")]
struct Cli {
    /// Base URL of the decisions API; overrides lifeecho.toml and the environment.
    #[arg(long, global = true)]
    api_url: Option<String>,
    /// Where the session token is kept.
    #[arg(long, global = true)]
    token_file: Option<PathBuf>,
    /// Print results as JSON instead of text; failures go to stderr as
    /// `{"code", "message"}`.
    #[arg(long, global = true)]
    json: bool,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Create an account and sign in.
    Register {
        email: String,
        /// Read from stdin when neither the flag nor LIFEECHO_PASSWORD is set.
        #[arg(long, env = "LIFEECHO_PASSWORD", hide_env_values = true)]
        password: Option<String>,
        #[arg(long)]
        full_name: Option<String>,
    },
    Login {
        email: String,
        /// Read from stdin when neither the flag nor LIFEECHO_PASSWORD is set.
        #[arg(long, env = "LIFEECHO_PASSWORD", hide_env_values = true)]
        password: Option<String>,
    },
    Logout,
    Whoami,
    Health,
    /// List your decisions.
    List,
    /// Show a decision and one of its scenarios.
    Show {
        id: DecisionId,
        #[arg(long, default_value_t = 0)]
        scenario: usize,
    },
    Create {
        title: String,
        #[arg(long, default_value = "career")]
        category: DecisionCategory,
        #[arg(long, default_value = "")]
        description: String,
        #[arg(long, default_value = "")]
        situation: String,
        #[arg(long, default_value = "")]
        goals: String,
        #[arg(long, default_value = "")]
        constraints: String,
        #[arg(long, default_value = "")]
        timeline: String,
    },
    /// Generate future scenarios for a decision that has none yet.
    Simulate {
        id: DecisionId,
        #[arg(long, default_value_t = shared::protocol::DEFAULT_NUM_SCENARIOS)]
        scenarios: u8,
        #[arg(long, default_value_t = shared::protocol::DEFAULT_TIME_HORIZON_YEARS)]
        years: u8,
    },
    Update {
        id: DecisionId,
        #[arg(long)]
        title: Option<String>,
        #[arg(long)]
        description: Option<String>,
        #[arg(long)]
        category: Option<DecisionCategory>,
        #[arg(long)]
        status: Option<DecisionStatus>,
    },
    Delete {
        id: DecisionId,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();
    let cli = Cli::parse();

    let mut settings = load_settings();
    if let Some(api_url) = &cli.api_url {
        settings.api_url = api_url.clone();
    }
    let token_path = match cli.token_file.clone().or_else(|| settings.token_path.clone()) {
        Some(path) => path,
        None => FileTokenStore::default_path()?,
    };
    debug!(
        "cli: api_url={} token_path={}",
        settings.api_url,
        token_path.display()
    );

    let api = ApiClient::from_settings(&settings, Arc::new(FileTokenStore::new(token_path)))?;
    let session = SessionStore::new(api);

    let outcome = run(&cli, &session).await;
    if cli.json {
        if let Err(err) = &outcome {
            eprintln!("{}", serde_json::to_string(&structured_error(err))?);
            std::process::exit(1);
        }
    }
    outcome
}

async fn run(cli: &Cli, session: &SessionStore) -> Result<()> {
    let api = session.api();
    match &cli.command {
        Command::Register {
            email,
            password,
            full_name,
        } => {
            let password = resolve_password(password.clone(), io::stdin().lock())?;
            let mut form = SignUpForm::new(
                email.as_str(),
                password,
                full_name.clone().unwrap_or_default(),
            );
            if form.submit(session).await.is_none() {
                return Err(view_failure(form.failure(), "Registration failed"));
            }
            print_signed_in(cli, session)?;
        }
        Command::Login { email, password } => {
            let password = resolve_password(password.clone(), io::stdin().lock())?;
            let mut form = SignInForm::new(email.as_str(), password);
            if form.submit(session).await.is_none() {
                return Err(view_failure(form.failure(), "Login failed"));
            }
            print_signed_in(cli, session)?;
        }
        Command::Logout => {
            session.logout();
            println!("Signed out.");
        }
        Command::Whoami => {
            let current = session.check_auth().await;
            match current.user() {
                Some(user) if cli.json => print_json(user)?,
                Some(user) => println!("{}", render::user_line(user)),
                None => println!("Not signed in."),
            }
        }
        Command::Health => {
            let health = api.health().await?;
            if cli.json {
                print_json(&health)?;
            } else {
                println!("{}", render::health_line(&health));
            }
        }
        Command::List => {
            let mut view = DecisionListView::new();
            if view.mount(session).await == Some(Navigation::Login) {
                return Err(not_signed_in());
            }
            if let Some(failure) = view.failure() {
                return Err(view_failure(Some(failure), "Failed to load decisions"));
            }
            if cli.json {
                print_json(view.decisions())?;
            } else {
                println!("{}", render::decision_list(&view));
            }
        }
        Command::Show { id, scenario } => {
            require_session(session).await?;
            let mut view = DecisionDetailView::new(*id);
            view.load(api).await;
            if let Some(failure) = view.failure() {
                return Err(view_failure(Some(failure), "Failed to load decision"));
            }
            if !view.scenarios().is_empty() && !view.select(*scenario) {
                bail!(
                    "scenario {scenario} out of range; this decision has {}",
                    view.scenarios().len()
                );
            }
            if cli.json {
                print_json(&serde_json::json!({
                    "decision": view.decision(),
                    "scenarios": view.scenarios(),
                }))?;
            } else {
                println!("{}", render::decision_detail(&view));
            }
        }
        Command::Create {
            title,
            category,
            description,
            situation,
            goals,
            constraints,
            timeline,
        } => {
            require_session(session).await?;
            let mut form = DecisionForm::new(title.as_str(), *category);
            form.description = description.clone();
            form.current_situation = situation.clone();
            form.goals = goals.clone();
            form.constraints = constraints.clone();
            form.timeline = timeline.clone();

            match form.submit(api).await {
                Some(Navigation::Decision(id)) => {
                    if cli.json {
                        print_json(&serde_json::json!({ "id": id }))?;
                    } else {
                        println!("Created decision {id}");
                    }
                }
                _ => return Err(view_failure(form.failure(), "Failed to create decision")),
            }
        }
        Command::Simulate {
            id,
            scenarios,
            years,
        } => {
            require_session(session).await?;
            let mut view = DecisionDetailView::new(*id);
            view.load(api).await;
            if let Some(failure) = view.failure() {
                return Err(view_failure(Some(failure), "Failed to load decision"));
            }
            if !view.can_simulate() {
                bail!("decision {id} already has scenarios");
            }

            eprintln!("Generating scenarios...");
            let params = SimulationParams {
                num_scenarios: *scenarios,
                time_horizon_years: *years,
            };
            view.simulate_with(api, params).await;
            if let Some(failure) = view.failure() {
                return Err(view_failure(Some(failure), "Failed to generate scenarios"));
            }
            if cli.json {
                print_json(view.scenarios())?;
            } else {
                println!("{}", render::decision_detail(&view));
            }
        }
        Command::Update {
            id,
            title,
            description,
            category,
            status,
        } => {
            require_session(session).await?;
            let update = DecisionUpdate {
                title: title.clone(),
                description: description.clone(),
                category: *category,
                context: None,
                status: *status,
            };
            if update.is_empty() {
                bail!("nothing to update; pass at least one of --title, --description, --category, --status");
            }
            let decision = api.update_decision(*id, &update).await?;
            if cli.json {
                print_json(&decision)?;
            } else {
                println!("{}", render::decision_header(&decision).join("\n"));
            }
        }
        Command::Delete { id } => {
            require_session(session).await?;
            api.delete_decision(*id).await?;
            println!("Deleted decision {id}");
        }
    }
    Ok(())
}

async fn require_session(session: &SessionStore) -> Result<()> {
    match landing_destination(session).await {
        Navigation::Dashboard => Ok(()),
        _ => Err(not_signed_in()),
    }
}

fn not_signed_in() -> anyhow::Error {
    ApiException::new(
        ErrorCode::Unauthorized,
        "not signed in; run `lifeecho login <email>` first",
    )
    .into()
}

fn view_failure(failure: Option<&ApiError>, fallback: &str) -> anyhow::Error {
    match failure {
        Some(failure) => ApiException::from(failure.clone()).into(),
        None => ApiException::new(ErrorCode::Internal, fallback).into(),
    }
}

/// The `--json` error shape for any failure of a command.
fn structured_error(err: &anyhow::Error) -> ApiError {
    if let Some(client_err) = err.downcast_ref::<ClientError>() {
        return client_err.to_api_error();
    }
    if let Some(exception) = err.downcast_ref::<ApiException>() {
        return exception.clone().into();
    }
    ApiError::new(ErrorCode::BadRequest, err.to_string())
}

/// Uses the given password or reads the first line of `input`.
fn resolve_password(given: Option<String>, mut input: impl BufRead) -> Result<String> {
    if let Some(password) = given {
        return Ok(password);
    }
    eprint!("Password: ");
    let mut line = String::new();
    input.read_line(&mut line)?;
    let password = line.trim_end_matches(['\r', '\n']);
    if password.is_empty() {
        bail!("no password given; pass --password, set LIFEECHO_PASSWORD or pipe it on stdin");
    }
    Ok(password.to_string())
}

fn print_signed_in(cli: &Cli, session: &SessionStore) -> Result<()> {
    let current = session.snapshot();
    let Some(user) = current.user() else {
        return Err(not_signed_in());
    };
    if cli.json {
        print_json(user)
    } else {
        println!("Signed in as {}", render::user_line(user));
        Ok(())
    }
}

fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
