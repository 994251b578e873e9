//! Followup Tracker - command line front end.
//!
//! # Usage
//!
//! ```bash
//! # Start the daily reminders and wait for Ctrl-C
//! followup-tracker run
//!
//! # Export everything to Excel in ./backups
//! followup-tracker export --format xlsx --dir backups
//!
//! # Merge an export back in
//! followup-tracker import backups/followup_export_20261019_090000.xlsx
//!
//! # Manage reminder times
//! followup-tracker times add 18:30
//! followup-tracker times disable <id>
//! ```
//!
//! Logs go to stderr; command output goes to stdout.

use anyhow::{Context, Result};
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use followup_tracker::domain::{relative_label, PhoneNumber};
use followup_tracker::repositories::{CustomerRepository, FollowUpRepository, PreferencesRepository};
use followup_tracker::{
    Clock, Config, CustomerService, CustomerServiceImpl, FireOutcome, InterchangeFormat,
    LocalStore, MetricsTracker, NewCustomer, NotificationScheduler, NotificationTime,
    ReminderEvaluator, SettingsService, SettingsServiceImpl, SortOption, SystemClock,
    TokioJobScheduler, TracingNotifier,
};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "followup-tracker")]
#[command(author, version, about = "Customer payment follow-up tracker")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Register the daily reminders and run until interrupted
    Run,
    /// Evaluate the reminder once, right now
    Check,
    /// Export all customers and follow-ups
    Export {
        /// csv or xlsx (default from FOLLOWUP_DEFAULT_FORMAT)
        #[arg(short, long)]
        format: Option<InterchangeFormat>,

        /// Output directory (default from FOLLOWUP_EXPORT_DIR)
        #[arg(short, long)]
        dir: Option<PathBuf>,
    },
    /// Import a .csv or .xlsx export
    Import {
        /// File to import
        path: PathBuf,
    },
    /// Delete every customer and follow-up
    Clear {
        /// Required, to avoid accidents
        #[arg(long)]
        yes: bool,
    },
    /// Manage reminder times
    Times {
        #[command(subcommand)]
        action: TimesAction,
    },
    /// Manage customers
    Customers {
        #[command(subcommand)]
        action: CustomersAction,
    },
}

#[derive(Subcommand)]
enum TimesAction {
    /// List reminder times
    List,
    /// Add a reminder time (HH:MM)
    Add { time: String },
    /// Remove a reminder time
    Remove { id: String },
    /// Enable a reminder time
    Enable { id: String },
    /// Disable a reminder time
    Disable { id: String },
}

#[derive(Subcommand)]
enum CustomersAction {
    /// List customers
    List {
        /// date, name, amount or followups
        #[arg(short, long, default_value = "date")]
        sort: SortOption,
    },
    /// Add a customer
    Add {
        #[arg(short, long)]
        name: String,

        #[arg(short, long)]
        phone: String,

        #[arg(short, long)]
        amount: f64,

        /// Promised payment date (YYYY-MM-DD)
        #[arg(short = 'd', long)]
        promise_date: NaiveDate,

        #[arg(long, default_value = "")]
        notes: String,
    },
    /// Log a call to a customer
    Call {
        id: String,

        #[arg(short, long, default_value = "")]
        notes: String,

        /// New promised payment date (YYYY-MM-DD)
        #[arg(short = 'd', long)]
        next_promise_date: Option<NaiveDate>,
    },
    /// Delete a customer and their follow-ups
    Delete { id: String },
    /// Delete one logged call
    DeleteCall { id: String },
}

/// Everything the commands need, wired together.
struct App {
    settings: SettingsServiceImpl,
    customers: CustomerServiceImpl,
    evaluator: Arc<ReminderEvaluator>,
    jobs: Arc<TokioJobScheduler>,
    clock: Arc<dyn Clock>,
    metrics: MetricsTracker,
}

impl App {
    async fn build(config: &Config) -> Result<Self> {
        let store = LocalStore::open(&config.data_file)
            .await
            .with_context(|| format!("Failed to open {}", config.data_file.display()))?;

        let customer_repo = Arc::new(store.clone()) as Arc<dyn CustomerRepository>;
        let follow_up_repo = Arc::new(store.clone()) as Arc<dyn FollowUpRepository>;
        let preferences_repo = Arc::new(store) as Arc<dyn PreferencesRepository>;

        let clock = Arc::new(SystemClock) as Arc<dyn Clock>;
        let metrics = MetricsTracker::new();
        let jobs = Arc::new(TokioJobScheduler::new());

        let evaluator = Arc::new(ReminderEvaluator::new(
            customer_repo.clone(),
            Arc::new(TracingNotifier),
            clock.clone(),
            metrics.clone(),
        ));
        let scheduler = Arc::new(NotificationScheduler::new(
            jobs.clone(),
            evaluator.clone(),
            clock.clone(),
            metrics.clone(),
        ));

        let settings = SettingsServiceImpl::new(
            customer_repo.clone(),
            follow_up_repo.clone(),
            preferences_repo,
            scheduler,
            clock.clone(),
            metrics.clone(),
        );
        let customers = CustomerServiceImpl::new(customer_repo, follow_up_repo, clock.clone());

        Ok(Self {
            settings,
            customers,
            evaluator,
            jobs,
            clock,
            metrics,
        })
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let config = Config::from_env().context("Failed to load configuration")?;

    // Logs go to stderr so command output on stdout stays clean
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.log_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let app = App::build(&config).await?;

    if let Err(e) = run(cli.command, &app, &config).await {
        error!("Command failed: {:#}", e);
        return Err(e);
    }
    Ok(())
}

async fn run(command: Commands, app: &App, config: &Config) -> Result<()> {
    match command {
        Commands::Run => {
            let registered = app.settings.restore_schedule().await?;
            info!(registered, "Reminders running, press Ctrl-C to stop");
            tokio::signal::ctrl_c()
                .await
                .context("Failed to listen for Ctrl-C")?;
            app.jobs.shutdown();
            info!(metrics = %app.metrics.summary(), "Shutting down");
        }
        Commands::Check => match app.evaluator.evaluate().await {
            FireOutcome::Alerted(n) => println!("{} customer(s) due today", n),
            FireOutcome::NothingDue => println!("No customers due today"),
            FireOutcome::Failed(reason) => anyhow::bail!("Reminder check failed: {}", reason),
        },
        Commands::Export { format, dir } => {
            let format = format.unwrap_or(config.default_format);
            let dir = dir.unwrap_or_else(|| config.export_dir.clone());
            let path = app.settings.export_data(format, &dir).await?;
            println!("{}", path.display());
        }
        Commands::Import { path } => {
            let summary = app.settings.import_data(&path).await?;
            println!(
                "Imported {} customer(s) and {} follow-up(s), skipped {} row(s)",
                summary.customers,
                summary.follow_ups,
                summary.skipped.len()
            );
            for row in &summary.skipped {
                println!("  {}: {}", row.location, row.error);
            }
        }
        Commands::Clear { yes } => {
            if !yes {
                anyhow::bail!("Refusing to clear data without --yes");
            }
            app.settings.clear_all_data().await?;
            println!("All customers and follow-ups deleted");
        }
        Commands::Times { action } => run_times(action, app).await?,
        Commands::Customers { action } => run_customers(action, app).await?,
    }
    Ok(())
}

async fn run_times(action: TimesAction, app: &App) -> Result<()> {
    match action {
        TimesAction::List => {
            for time in app.settings.notification_times().await? {
                print_time(&time);
            }
        }
        TimesAction::Add { time } => {
            let parsed = NotificationTime::parse(&time)?;
            let added = app
                .settings
                .add_notification_time(parsed.hour, parsed.minute)
                .await?;
            print_time(&added);
        }
        TimesAction::Remove { id } => {
            app.settings.remove_notification_time(&id).await?;
            println!("Removed {}", id);
        }
        TimesAction::Enable { id } => {
            print_time(&app.settings.set_notification_enabled(&id, true).await?);
        }
        TimesAction::Disable { id } => {
            print_time(&app.settings.set_notification_enabled(&id, false).await?);
        }
    }
    Ok(())
}

async fn run_customers(action: CustomersAction, app: &App) -> Result<()> {
    match action {
        CustomersAction::List { sort } => {
            let today = app.clock.today();
            for entry in app.customers.sorted_customers(sort).await? {
                let c = &entry.customer;
                let phone = PhoneNumber::new(c.phone_number.as_str())
                    .map(|p| p.formatted())
                    .unwrap_or_else(|_| c.phone_number.clone());
                println!(
                    "{}  {:<24} {:<16} {:>12.2}  {} ({})  {} call(s), {:?}",
                    c.id,
                    c.name,
                    phone,
                    c.amount,
                    c.promise_date,
                    relative_label(c.promise_date, today),
                    entry.follow_up_count(),
                    entry.status()
                );
            }
        }
        CustomersAction::Add {
            name,
            phone,
            amount,
            promise_date,
            notes,
        } => {
            let customer = app
                .customers
                .add_customer(NewCustomer {
                    name,
                    phone_number: phone,
                    amount,
                    promise_date,
                    notes,
                })
                .await?;
            println!("{}", customer.id);
        }
        CustomersAction::Call {
            id,
            notes,
            next_promise_date,
        } => {
            let follow_up = app.customers.log_call(&id, &notes, next_promise_date).await?;
            println!("{}", follow_up.id);
        }
        CustomersAction::Delete { id } => {
            let removed = app.customers.delete_customer(&id).await?;
            println!("Deleted {} and {} follow-up(s)", id, removed);
        }
        CustomersAction::DeleteCall { id } => {
            app.customers.delete_follow_up(&id).await?;
            println!("Deleted follow-up {}", id);
        }
    }
    Ok(())
}

fn print_time(time: &NotificationTime) {
    let state = if time.is_enabled { "on" } else { "off" };
    println!("{}  {}  {}", time.id, time.time_string(), state);
}
