//! Command-line surfaces for LabTrack.
//!
//! The subcommands stand in for the two role-gated pages of the original
//! dashboard: `lines`, `types`, and `users` belong to the manager
//! surface, while the sample lifecycle commands admit either role and
//! derive their list scope from it. Every protected command runs the
//! session guard first; a rejection prints the redirect to login and
//! exits without touching the backend.

use std::io::{self, Write};
use std::path::PathBuf;
use std::time::Duration;

use anyhow::{bail, Result};
use clap::{Parser, Subcommand};

use crate::api::ApiClient;
use crate::config::Config;
use crate::models::{
    NewProductionLine, NewSampleType, NewUser, Role, Sample, SampleResult, SampleStatus,
    UserUpdate,
};
use crate::session::guard::{self, GuardOutcome};
use crate::session::{Session, SessionStore};
use crate::workflow::{
    AuthService, Confirmation, ReferenceService, RegisterRequest, SampleSelector, SampleService,
    Scope,
};

/// CLI arguments structure
#[derive(Parser, Debug)]
#[command(name = "labtrack")]
#[command(author, version, about = "A headless client for the LabTrack sample-tracking backend", long_about = None)]
pub struct Cli {
    /// Path to configuration file
    #[arg(short, long, default_value = "labtrack.toml")]
    pub config: PathBuf,

    /// Override log level
    #[arg(short, long)]
    pub log_level: Option<String>,

    /// API URL to connect to (default: http://localhost:3000)
    #[arg(long, env = "LABTRACK_API_URL")]
    pub api_url: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available CLI subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Log in and persist the session
    Login {
        /// User ID to authenticate as
        user_id: String,
        /// Password (prefer the LABTRACK_PASSWORD env var over the flag)
        #[arg(short, long, env = "LABTRACK_PASSWORD")]
        password: String,
    },

    /// Discard the persisted session
    Logout,

    /// Show the currently persisted session
    Whoami,

    /// Sample lifecycle commands
    #[command(subcommand)]
    Sample(SampleCommands),

    /// Production line management (manager only)
    #[command(subcommand)]
    Lines(LineCommands),

    /// Sample type management (manager only)
    #[command(subcommand)]
    Types(TypeCommands),

    /// User administration (manager only)
    #[command(subcommand)]
    Users(UserCommands),

    /// Date-filtered report of your samples
    Report {
        /// Start date (YYYY-MM-DD)
        #[arg(long)]
        start: String,
        /// End date (YYYY-MM-DD), open-ended if omitted
        #[arg(long)]
        end: Option<String>,
    },
}

/// Sample subcommands
#[derive(Subcommand, Debug)]
pub enum SampleCommands {
    /// List samples (managers see all, technicians see their own)
    List,
    /// Register a new sample (created pending)
    Register {
        /// Sample code; next SAMP-<year>-NNN code if omitted
        #[arg(long)]
        code: Option<String>,
        /// Production line id
        #[arg(long)]
        line: i64,
        /// Sample type id
        #[arg(long = "type")]
        sample_type: i64,
        /// Storage location, e.g. "Rack A-3"
        #[arg(long)]
        storage: Option<String>,
        /// Free-form note
        #[arg(long)]
        note: Option<String>,
    },
    /// Show one sample by id or code
    Show {
        /// Sample id
        id: Option<i64>,
        /// Sample code, as an alternative to the id
        #[arg(long, conflicts_with = "id")]
        code: Option<String>,
    },
    /// Record a test result (full replace of measurement fields)
    Result {
        /// Sample id
        id: Option<i64>,
        /// Sample code, as an alternative to the id
        #[arg(long, conflicts_with = "id")]
        code: Option<String>,
        /// New status: pending, completed or reject
        #[arg(long)]
        status: String,
        /// Dimensions, e.g. "300 x 300 mm"
        #[arg(long)]
        dimensions: Option<String>,
        /// Design/colour verdict
        #[arg(long)]
        design: Option<String>,
        /// Weight in kg
        #[arg(long)]
        weight: Option<f64>,
        /// Water absorption in percent
        #[arg(long)]
        water_absorption: Option<f64>,
        /// Breaking strength in newtons
        #[arg(long)]
        breaking_strength: Option<f64>,
        /// Test results / remarks
        #[arg(long)]
        remarks: Option<String>,
    },
    /// Delete a sample (prompts for confirmation)
    Delete {
        /// Sample id
        id: i64,
        /// Skip the confirmation prompt
        #[arg(short = 'y', long)]
        yes: bool,
    },
}

/// Production line subcommands
#[derive(Subcommand, Debug)]
pub enum LineCommands {
    /// List production lines
    List,
    /// Add a production line
    Add {
        /// Line code, e.g. "PL-01"
        code: String,
        /// Human-readable line name
        name: String,
        /// Line type/description
        #[arg(long = "type")]
        line_type: Option<String>,
    },
    /// Remove a production line (fails while samples reference it)
    Remove {
        /// Production line id
        id: i64,
    },
}

/// Sample type subcommands
#[derive(Subcommand, Debug)]
pub enum TypeCommands {
    /// List sample types
    List,
    /// Add a sample type
    Add {
        /// Type name
        name: String,
        /// Description
        #[arg(long)]
        description: Option<String>,
    },
    /// Remove a sample type (fails while samples reference it)
    Remove {
        /// Sample type id
        id: i64,
    },
}

/// User administration subcommands
#[derive(Subcommand, Debug)]
pub enum UserCommands {
    /// List users
    List,
    /// Create a user
    Add {
        /// User ID for the new account
        user_id: String,
        #[arg(long)]
        first_name: String,
        #[arg(long)]
        last_name: String,
        #[arg(long)]
        email: String,
        #[arg(long)]
        password: String,
        /// "manager" or "lab technician"
        #[arg(long)]
        role: String,
    },
    /// Update a user
    Update {
        /// User ID of the account to update
        user_id: String,
        #[arg(long)]
        first_name: String,
        #[arg(long)]
        last_name: String,
        #[arg(long)]
        email: String,
        /// "manager" or "lab technician"
        #[arg(long)]
        role: String,
        /// New password; unchanged if omitted
        #[arg(long)]
        password: Option<String>,
    },
    /// Delete a user
    Remove {
        /// User ID of the account to delete
        user_id: String,
    },
}

/// Run a CLI command
pub async fn run_command(cli: &Cli, config: &Config) -> Result<()> {
    let base_url = cli
        .api_url
        .clone()
        .unwrap_or_else(|| config.api.base_url.clone());
    let store = SessionStore::new(&config.session.dir);

    let mut api = ApiClient::new(&base_url, Duration::from_secs(config.api.timeout_secs))?;
    if let Some(token) = store.token() {
        api = api.with_token(token);
    }

    match &cli.command {
        Commands::Login { user_id, password } => cmd_login(&api, &store, user_id, password).await,
        Commands::Logout => cmd_logout(&api, &store),
        Commands::Whoami => cmd_whoami(&store),
        Commands::Sample(command) => cmd_sample(&api, &store, command).await,
        Commands::Lines(command) => cmd_lines(&api, &store, command).await,
        Commands::Types(command) => cmd_types(&api, &store, command).await,
        Commands::Users(command) => cmd_users(&api, &store, command).await,
        Commands::Report { start, end } => cmd_report(&api, &store, start, end.as_deref()).await,
    }
}

// ============================================================================
// Guard helpers
// ============================================================================

/// Gate a surface that requires one specific role. The printed message
/// never says whether the session was missing or merely the wrong role;
/// both cases redirect to login.
fn require_role(store: &SessionStore, required: Role) -> Result<Session> {
    match guard::check(store, required) {
        GuardOutcome::Admitted(session) => Ok(session),
        GuardOutcome::RedirectToLogin => {
            println!("Redirecting to login: run `labtrack login <user-id>`.");
            Err(crate::Error::Forbidden { required }.into())
        }
    }
}

/// Gate the surfaces both roles may enter. The manager check runs first;
/// the admitted session's role decides the scope later.
fn require_any_role(store: &SessionStore) -> Result<Session> {
    if let GuardOutcome::Admitted(session) = guard::check(store, Role::Manager) {
        return Ok(session);
    }
    match guard::check(store, Role::LabTechnician) {
        GuardOutcome::Admitted(session) => Ok(session),
        GuardOutcome::RedirectToLogin => {
            println!("Redirecting to login: run `labtrack login <user-id>`.");
            Err(crate::Error::NotLoggedIn.into())
        }
    }
}

fn selector_from(id: Option<i64>, code: Option<&str>) -> Result<SampleSelector> {
    match (id, code) {
        (Some(id), _) => Ok(SampleSelector::Id(id)),
        (None, Some(code)) => Ok(SampleSelector::Code(code.to_string())),
        (None, None) => bail!("give a sample id or --code"),
    }
}

/// Ask the operator before a destructive call goes out.
fn confirm(prompt: &str, assume_yes: bool) -> Result<Confirmation> {
    if assume_yes {
        return Ok(Confirmation::Confirmed);
    }

    print!("{prompt} [y/N] ");
    io::stdout().flush()?;
    let mut answer = String::new();
    io::stdin().read_line(&mut answer)?;

    match answer.trim().to_ascii_lowercase().as_str() {
        "y" | "yes" => Ok(Confirmation::Confirmed),
        _ => Ok(Confirmation::Declined),
    }
}

// ============================================================================
// Session commands
// ============================================================================

async fn cmd_login(
    api: &ApiClient,
    store: &SessionStore,
    user_id: &str,
    password: &str,
) -> Result<()> {
    let auth = AuthService::new(api, store);
    match auth.login(user_id, password).await {
        Ok(session) => {
            println!(
                "Logged in as {} ({})",
                session.user.full_name(),
                session.user.role
            );
            match session.user.role {
                Role::Manager => println!("Manager surface unlocked: samples, lines, types, users."),
                Role::LabTechnician => {
                    println!("Technician surface unlocked: your samples and reports.")
                }
            }
            Ok(())
        }
        Err(crate::Error::Auth(message)) => {
            // Inline message, no redirect, session untouched.
            println!("Login failed: {message}");
            bail!("login failed")
        }
        Err(e) => Err(e.into()),
    }
}

fn cmd_logout(api: &ApiClient, store: &SessionStore) -> Result<()> {
    AuthService::new(api, store).logout();
    println!("Logged out.");
    Ok(())
}

fn cmd_whoami(store: &SessionStore) -> Result<()> {
    match store.load() {
        Some(session) => {
            println!("{} <{}>", session.user.full_name(), session.user.email);
            println!("User ID: {}", session.user.user_id);
            println!("Role:    {}", session.user.role);
        }
        None => println!("Not logged in."),
    }
    Ok(())
}

// ============================================================================
// Sample commands
// ============================================================================

async fn cmd_sample(api: &ApiClient, store: &SessionStore, command: &SampleCommands) -> Result<()> {
    let session = require_any_role(store)?;
    let service = SampleService::new(api);

    match command {
        SampleCommands::List => {
            let scope = Scope::for_session(&session);
            let samples = service.list(&scope).await?;
            print_sample_table(&samples);
        }
        SampleCommands::Register {
            code,
            line,
            sample_type,
            storage,
            note,
        } => {
            let sample = service
                .register(
                    &session,
                    RegisterRequest {
                        sample_code: code.clone(),
                        production_id: *line,
                        sample_type_id: *sample_type,
                        storage_location: storage.clone(),
                        note: note.clone(),
                    },
                )
                .await?;
            println!("Registered sample {} (pending).", sample.sample_code);
        }
        SampleCommands::Show { id, code } => {
            let selector = selector_from(*id, code.as_deref())?;
            let sample = service.resolve(&selector).await?;
            print_sample_detail(&sample);
        }
        SampleCommands::Result {
            id,
            code,
            status,
            dimensions,
            design,
            weight,
            water_absorption,
            breaking_strength,
            remarks,
        } => {
            let selector = selector_from(*id, code.as_deref())?;
            let status: SampleStatus = status
                .parse()
                .map_err(|e| crate::Error::Validation(format!("{e}")))?;
            let result = SampleResult {
                status,
                dimensions: dimensions.clone(),
                colour: design.clone(),
                weight: *weight,
                water_absorption: *water_absorption,
                breaking_strength: *breaking_strength,
                test_results: remarks.clone(),
            };
            let updated = service.record_result(&selector, result).await?;
            println!(
                "Result recorded: sample {} is now {}.",
                updated.sample_code, updated.status
            );
        }
        SampleCommands::Delete { id, yes } => {
            let confirmation = confirm(
                &format!("Are you sure you want to delete sample {id}? This cannot be undone."),
                *yes,
            )?;
            if confirmation == Confirmation::Declined {
                println!("Aborted.");
                return Ok(());
            }
            service.delete(*id, confirmation).await?;
            println!("Sample {id} deleted.");
        }
    }
    Ok(())
}

// ============================================================================
// Manager surface commands
// ============================================================================

async fn cmd_lines(api: &ApiClient, store: &SessionStore, command: &LineCommands) -> Result<()> {
    require_role(store, Role::Manager)?;
    let service = ReferenceService::new(api);

    match command {
        LineCommands::List => {
            let lines = service.production_lines().await?;
            println!("{:<6} {:<12} {:<24} TYPE", "ID", "CODE", "NAME");
            for line in lines {
                println!(
                    "{:<6} {:<12} {:<24} {}",
                    line.production_id,
                    line.line_code,
                    line.line_name,
                    line.line_type.as_deref().unwrap_or("-")
                );
            }
        }
        LineCommands::Add {
            code,
            name,
            line_type,
        } => {
            service
                .add_production_line(NewProductionLine {
                    line_code: code.clone(),
                    line_name: name.clone(),
                    line_type: line_type.clone(),
                })
                .await?;
            println!("Production line {code} added.");
        }
        LineCommands::Remove { id } => {
            service.remove_production_line(*id).await?;
            println!("Production line {id} removed.");
        }
    }
    Ok(())
}

async fn cmd_types(api: &ApiClient, store: &SessionStore, command: &TypeCommands) -> Result<()> {
    require_role(store, Role::Manager)?;
    let service = ReferenceService::new(api);

    match command {
        TypeCommands::List => {
            let types = service.sample_types().await?;
            println!("{:<6} {:<24} DESCRIPTION", "ID", "NAME");
            for sample_type in types {
                println!(
                    "{:<6} {:<24} {}",
                    sample_type.sample_type_id,
                    sample_type.name,
                    sample_type.description.as_deref().unwrap_or("-")
                );
            }
        }
        TypeCommands::Add { name, description } => {
            service
                .add_sample_type(NewSampleType {
                    name: name.clone(),
                    description: description.clone(),
                })
                .await?;
            println!("Sample type {name:?} added.");
        }
        TypeCommands::Remove { id } => {
            service.remove_sample_type(*id).await?;
            println!("Sample type {id} removed.");
        }
    }
    Ok(())
}

async fn cmd_users(api: &ApiClient, store: &SessionStore, command: &UserCommands) -> Result<()> {
    require_role(store, Role::Manager)?;
    let service = ReferenceService::new(api);

    match command {
        UserCommands::List => {
            let users = service.users().await?;
            println!("{:<10} {:<24} {:<28} ROLE", "USER ID", "NAME", "EMAIL");
            for user in users {
                println!(
                    "{:<10} {:<24} {:<28} {}",
                    user.user_id,
                    user.full_name(),
                    user.email,
                    user.role
                );
            }
        }
        UserCommands::Add {
            user_id,
            first_name,
            last_name,
            email,
            password,
            role,
        } => {
            let role: Role = role.parse().map_err(crate::Error::Validation)?;
            service
                .add_user(NewUser {
                    user_id: user_id.clone(),
                    first_name: first_name.clone(),
                    last_name: last_name.clone(),
                    email: email.clone(),
                    password: password.clone(),
                    role,
                })
                .await?;
            println!("User {user_id} added.");
        }
        UserCommands::Update {
            user_id,
            first_name,
            last_name,
            email,
            role,
            password,
        } => {
            let role: Role = role.parse().map_err(crate::Error::Validation)?;
            service
                .update_user(
                    user_id,
                    UserUpdate {
                        first_name: first_name.clone(),
                        last_name: last_name.clone(),
                        email: email.clone(),
                        role,
                        password: password.clone(),
                    },
                )
                .await?;
            println!("User {user_id} updated.");
        }
        UserCommands::Remove { user_id } => {
            service.remove_user(user_id).await?;
            println!("User {user_id} removed.");
        }
    }
    Ok(())
}

// ============================================================================
// Reports
// ============================================================================

async fn cmd_report(
    api: &ApiClient,
    store: &SessionStore,
    start: &str,
    end: Option<&str>,
) -> Result<()> {
    let session = require_any_role(store)?;
    let service = SampleService::new(api);

    let samples = service.report(&session.user.user_id, start, end).await?;
    println!(
        "=== Report for {} ({} to {}) ===",
        session.user.user_id,
        start,
        end.unwrap_or("today")
    );
    println!();
    print_sample_table(&samples);
    Ok(())
}

// ============================================================================
// Display helpers
// ============================================================================

fn print_sample_table(samples: &[Sample]) {
    if samples.is_empty() {
        println!("No samples.");
        return;
    }

    println!(
        "{:<6} {:<16} {:<10} {:<10} {:<12} CREATED BY",
        "ID", "CODE", "STATUS", "LINE", "TYPE"
    );
    for sample in samples {
        println!(
            "{:<6} {:<16} {:<10} {:<10} {:<12} {}",
            sample.sample_id,
            sample.sample_code,
            sample.status,
            sample.production_id,
            sample.sample_type_id,
            sample.created_by
        );
    }
    println!();
    println!("{} sample(s)", samples.len());
}

fn print_sample_detail(sample: &Sample) {
    println!("=== Sample {} ===", sample.sample_code);
    println!("ID:                {}", sample.sample_id);
    println!("Status:            {}", sample.status);
    println!("Production line:   {}", sample.production_id);
    println!("Sample type:       {}", sample.sample_type_id);
    println!("Created by:        {}", sample.created_by);
    if let Some(created_at) = &sample.created_at {
        println!("Created at:        {created_at}");
    }
    if let Some(updated_at) = &sample.updated_at {
        println!("Updated at:        {updated_at}");
    }
    println!();
    println!("Dimensions:        {}", sample.dimensions.as_deref().unwrap_or("-"));
    println!("Design:            {}", sample.colour.as_deref().unwrap_or("-"));
    println!("Weight:            {}", format_measure(sample.weight, "kg"));
    println!(
        "Water absorption:  {}",
        format_measure(sample.water_absorption, "%")
    );
    println!(
        "Breaking strength: {}",
        format_measure(sample.breaking_strength, "N")
    );
    println!(
        "Storage location:  {}",
        sample.storage_location.as_deref().unwrap_or("-")
    );
    println!("Remarks:           {}", sample.test_results.as_deref().unwrap_or("-"));
    if let Some(note) = &sample.note {
        println!("Note:              {note}");
    }
}

fn format_measure(value: Option<f64>, unit: &str) -> String {
    match value {
        Some(value) => format!("{value} {unit}"),
        None => "-".to_string(),
    }
}
