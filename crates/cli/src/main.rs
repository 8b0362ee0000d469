//! Command Line Interface for the Systemic Risk Dashboard.
use anyhow::{Context, Result, bail};
use clap::{Args, Parser, Subcommand};
use dotenv::dotenv;
use riskdash_cache::{CacheSweeper, DomainCaches};
use riskdash_client::{ApiClient, ClientConfig, FileTokenStore};
use riskdash_domain::entities::{NewSimulation, RegisterRequest, ShareRequest};
use riskdash_domain::enums::{ExportFormat, SimulationStatus};
use riskdash_domain::value_objects::{ListQuery, ParameterUpdate, SimulationParameters};
use riskdash_export::ExportSession;
use riskdash_export::chart::ChartSpec;
use std::env;
use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::debug;
use uuid::Uuid;

mod output;
mod watch;

#[derive(Parser)]
#[command(name = "riskdash")]
#[command(about = "Systemic Risk Dashboard client for the banking simulation backend", long_about = None)]
struct Cli {
    /// Backend base URL (overrides RISKDASH_API_URL)
    #[arg(long, global = true)]
    api_url: Option<String>,

    /// Token file (overrides RISKDASH_TOKEN_FILE)
    #[arg(long, global = true)]
    token_file: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Log in and store the session tokens
    Login {
        #[arg(short, long)]
        username: String,

        /// Password (falls back to RISKDASH_PASSWORD, then a prompt)
        #[arg(short, long)]
        password: Option<String>,
    },
    /// Create a new account
    Register {
        #[arg(short, long)]
        username: String,

        #[arg(short, long)]
        email: String,

        #[arg(short, long)]
        password: Option<String>,
    },
    /// Log out and forget the stored tokens
    Logout,
    /// Show the logged-in user
    Whoami,
    /// Bank registry
    Banks {
        #[command(subcommand)]
        command: BankCommands,
    },
    /// Simulation runs
    Sims {
        #[command(subcommand)]
        command: SimCommands,
    },
    /// Open a shared simulation link
    Shared {
        /// Share token
        token: String,

        /// Password for protected links
        #[arg(long)]
        password: Option<String>,
    },
}

#[derive(Subcommand)]
enum BankCommands {
    /// List banks
    List {
        #[command(flatten)]
        page: PageArgs,
    },
    /// Show one bank
    Show { id: Uuid },
    /// Print the interbank exposure matrix
    Exposure,
    /// Upsert banks from a CSV file (admin only)
    Import { file: PathBuf },
    /// Download the bank registry as CSV
    ExportCsv {
        /// Output directory
        #[arg(short, long, default_value = ".")]
        out: PathBuf,
    },
}

#[derive(Subcommand)]
enum SimCommands {
    /// List simulations
    List {
        #[command(flatten)]
        page: PageArgs,

        /// Only runs with this status
        #[arg(long)]
        status: Option<SimulationStatus>,
    },
    /// Show one simulation
    Show { id: Uuid },
    /// Create and queue a simulation
    Create {
        /// Simulation name
        #[arg(short, long)]
        name: String,

        #[arg(short, long)]
        description: Option<String>,

        #[command(flatten)]
        params: ParamArgs,
    },
    /// Poll the current status
    Status { id: Uuid },
    /// Print results
    Results {
        id: Uuid,

        /// Include per-run raw data
        #[arg(long)]
        raw: bool,
    },
    /// Cancel a pending or running simulation
    Cancel { id: Uuid },
    /// Restart a finished simulation
    Restart { id: Uuid },
    /// Delete a simulation
    Delete { id: Uuid },
    /// Compare completed simulations
    Compare {
        #[arg(required = true, num_args = 1..)]
        ids: Vec<Uuid>,
    },
    /// Completed simulations over a trailing window
    History {
        #[arg(short, long, default_value_t = 30)]
        days: u32,
    },
    /// Follow live progress until the run finishes
    Watch { id: Uuid },
    /// Export results to disk
    Export {
        id: Uuid,

        /// json, csv, pdf or images
        #[arg(short, long, default_value = "json")]
        format: ExportFormat,

        /// Output directory
        #[arg(short, long, default_value = ".")]
        out: PathBuf,
    },
    /// Create a share link
    Share {
        id: Uuid,

        /// Days until the link expires
        #[arg(long)]
        days: Option<u32>,

        #[arg(long)]
        password: Option<String>,
    },
}

#[derive(Args)]
struct PageArgs {
    #[arg(long, default_value_t = 1)]
    page: u32,

    #[arg(long, default_value_t = 10)]
    per_page: u32,

    /// Name filter
    #[arg(short, long)]
    search: Option<String>,
}

impl PageArgs {
    fn query(&self) -> ListQuery {
        let query = ListQuery::page(self.page, self.per_page);
        match &self.search {
            Some(search) => query.with_search(search),
            None => query,
        }
    }
}

#[derive(Args)]
struct ParamArgs {
    /// Probability of an initial shock per bank
    #[arg(long)]
    shock_prob: Option<f64>,

    /// Number of Monte Carlo runs
    #[arg(long)]
    n_sim: Option<u32>,

    /// Failures that count as a systemic event
    #[arg(long)]
    systemic_threshold: Option<u32>,

    /// Loss given default, traditional system
    #[arg(long)]
    trad_lgd: Option<f64>,

    /// Loss given default, blockchain system
    #[arg(long)]
    bc_lgd: Option<f64>,

    /// Liability reduction from blockchain settlement
    #[arg(long)]
    bc_liability_reduction: Option<f64>,
}

impl ParamArgs {
    fn parameters(&self) -> SimulationParameters {
        ParameterUpdate {
            shock_prob: self.shock_prob,
            n_sim: self.n_sim,
            systemic_threshold: self.systemic_threshold,
            trad_lgd: self.trad_lgd,
            bc_lgd: self.bc_lgd,
            bc_liability_reduction: self.bc_liability_reduction,
        }
        .apply_to(&SimulationParameters::default())
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenv().ok();
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();

    let mut config = ClientConfig::from_env();
    if let Some(url) = &cli.api_url {
        config = ClientConfig {
            cache: config.cache,
            request_timeout: config.request_timeout,
            ..ClientConfig::new(url.as_str())
        };
    }
    let token_path = cli
        .token_file
        .clone()
        .unwrap_or_else(FileTokenStore::default_path);
    let tokens = Arc::new(
        FileTokenStore::open(&token_path)
            .with_context(|| format!("Failed to open token file {}", token_path.display()))?,
    );

    let caches = Arc::new(DomainCaches::new(config.cache));
    let sweeper = CacheSweeper::for_caches(caches.clone());
    let client = ApiClient::with_caches(config, tokens, caches)?;
    debug!(api = %client.config().base_url, "Client initialised");

    let result = run(&client, cli.command).await;
    sweeper.shutdown().await;
    result
}

async fn run(client: &ApiClient, command: Commands) -> Result<()> {
    match command {
        Commands::Login { username, password } => {
            let password = password_or_prompt(password)?;
            let session = client
                .auth()
                .login(&username, &password)
                .await
                .context("Login failed")?;
            println!(
                "Logged in as {} ({})",
                session.user.username, session.user.role
            );
        }
        Commands::Register {
            username,
            email,
            password,
        } => {
            let request = RegisterRequest {
                username,
                email,
                password: password_or_prompt(password)?,
            };
            let user = client
                .auth()
                .register(&request)
                .await
                .context("Registration failed")?;
            println!("Registered {} <{}>", user.username, user.email);
        }
        Commands::Logout => {
            client.auth().logout().await.context("Logout failed")?;
            println!("Logged out");
        }
        Commands::Whoami => {
            let user = client.auth().me().await.context("Not logged in")?;
            output::print_user(&user);
        }
        Commands::Banks { command } => run_banks(client, command).await?,
        Commands::Sims { command } => run_sims(client, command).await?,
        Commands::Shared { token, password } => {
            let shared = client
                .simulations()
                .shared(&token, password.as_deref())
                .await
                .context("Failed to open shared simulation")?;
            println!("{}", shared.simulation.name);
            if let Some(description) = &shared.simulation.description {
                println!("{description}");
            }
            output::print_parameters(&shared.simulation.parameters);
            output::print_results(&shared.results);
        }
    }
    Ok(())
}

async fn run_banks(client: &ApiClient, command: BankCommands) -> Result<()> {
    let banks = client.banks();
    match command {
        BankCommands::List { page } => {
            let page = banks.list(&page.query()).await.context("Failed to list banks")?;
            output::print_banks(&page);
        }
        BankCommands::Show { id } => {
            let bank = banks.get(id).await.context("Failed to fetch bank")?;
            output::print_bank(&bank);
        }
        BankCommands::Exposure => {
            let matrix = banks
                .exposure_matrix()
                .await
                .context("Failed to fetch exposure matrix")?;
            output::print_exposure(&matrix);
        }
        BankCommands::Import { file } => {
            let bytes = std::fs::read(&file)
                .with_context(|| format!("Failed to read {}", file.display()))?;
            let name = file
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default();
            let report = banks.import(&name, bytes).await.context("Failed to import banks")?;
            println!("Created {}, updated {}", report.created, report.updated);
            for error in &report.errors {
                println!("  {error}");
            }
        }
        BankCommands::ExportCsv { out } => {
            let bytes = banks.export_csv().await.context("Failed to export banks")?;
            let path = riskdash_export::download::save_download(&out, "banks.csv", &bytes)?;
            println!("Saved {}", path.display());
        }
    }
    Ok(())
}

async fn run_sims(client: &ApiClient, command: SimCommands) -> Result<()> {
    let sims = client.simulations();
    match command {
        SimCommands::List { page, status } => {
            let mut query = page.query();
            if let Some(status) = status {
                query = query.with_status(status);
            }
            let page = sims.list(&query).await.context("Failed to list simulations")?;
            output::print_simulations(&page);
        }
        SimCommands::Show { id } => {
            let simulation = sims.get(id).await.context("Failed to fetch simulation")?;
            output::print_simulation(&simulation);
        }
        SimCommands::Create {
            name,
            description,
            params,
        } => {
            let new = NewSimulation {
                name,
                description,
                parameters: params.parameters(),
            };
            let simulation = sims.create(&new).await.context("Failed to create simulation")?;
            println!("Created simulation {} ({})", simulation.id, simulation.status);
        }
        SimCommands::Status { id } => {
            let report = sims.status(id).await.context("Failed to fetch status")?;
            println!(
                "{} {:.0}%{}",
                report.status,
                (report.progress * 100.0).clamp(0.0, 100.0),
                report
                    .status_message
                    .as_deref()
                    .map(|m| format!(" {m}"))
                    .unwrap_or_default()
            );
            if let Some(error) = &report.error_message {
                println!("Error: {error}");
            }
        }
        SimCommands::Results { id, raw } => {
            let results = sims.results(id, raw).await.context("Failed to fetch results")?;
            output::print_results(&results);
        }
        SimCommands::Cancel { id } => {
            let simulation = sims.cancel(id).await.context("Failed to cancel simulation")?;
            println!("Simulation {} is {}", simulation.id, simulation.status);
        }
        SimCommands::Restart { id } => {
            let simulation = sims.restart(id).await.context("Failed to restart simulation")?;
            println!("Simulation {} is {}", simulation.id, simulation.status);
        }
        SimCommands::Delete { id } => {
            sims.delete(id).await.context("Failed to delete simulation")?;
            println!("Deleted simulation {id}");
        }
        SimCommands::Compare { ids } => {
            let comparison = sims.compare(&ids).await.context("Failed to compare simulations")?;
            output::print_comparison(&comparison);
        }
        SimCommands::History { days } => {
            let history = sims.history(days).await.context("Failed to fetch history")?;
            output::print_history(&history);
        }
        SimCommands::Watch { id } => watch::watch(client, id).await?,
        SimCommands::Export { id, format, out } => export(client, id, format, &out).await?,
        SimCommands::Share { id, days, password } => {
            let request = ShareRequest {
                expires_in_days: days,
                password,
            };
            let link = sims.share(id, &request).await.context("Failed to share simulation")?;
            println!("{}", link.url.as_deref().unwrap_or(&link.token));
            if let Some(expires) = link.expires_at {
                println!("Expires {}", expires.format("%Y-%m-%d %H:%M"));
            }
        }
    }
    Ok(())
}

async fn export(client: &ApiClient, id: Uuid, format: ExportFormat, out: &Path) -> Result<()> {
    let sims = client.simulations();
    let mut session = ExportSession::default();
    match format {
        ExportFormat::Json | ExportFormat::Csv => {
            let path = session.export_data(&sims, id, format, out).await?;
            println!("Saved {}", path.display());
        }
        ExportFormat::Pdf => {
            let simulation = sims.get(id).await.context("Failed to fetch simulation")?;
            let results = sims.results(id, true).await.context("Failed to fetch results")?;
            let charts = ChartSpec::standard_set(&results);
            let path = session.export_pdf(&simulation, &results, &charts, out)?;
            println!("Saved {}", path.display());
        }
        ExportFormat::Images => {
            let results = sims.results(id, true).await.context("Failed to fetch results")?;
            let outcomes = session.export_images(&ChartSpec::standard_set(&results), out);
            for outcome in &outcomes {
                match &outcome.result {
                    Ok(path) => println!("Saved {}", path.display()),
                    Err(e) => println!("Skipped {}: {e}", outcome.title),
                }
            }
            if let Some(error) = session.error() {
                bail!("Some charts could not be exported: {error}");
            }
        }
    }
    Ok(())
}

fn password_or_prompt(password: Option<String>) -> Result<String> {
    if let Some(password) = password.or_else(|| env::var("RISKDASH_PASSWORD").ok()) {
        return Ok(password);
    }
    print!("Password: ");
    io::stdout().flush()?;
    let mut line = String::new();
    io::stdin()
        .lock()
        .read_line(&mut line)
        .context("Failed to read password")?;
    Ok(line.trim_end_matches(['\r', '\n']).to_string())
}
