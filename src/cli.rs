// File: ./src/cli.rs
use crate::config::Config;
use crate::contacts::ContactFormat;
use crate::delivery::OutboxTransport;
use crate::pipeline::{GenerateOptions, MaterialsRequest, PackGenerator, parse_date};
use crate::scenario::{Building, ScenarioConditions, ScenarioId, Staffing, Technology, Weather};
use crate::store::SnapshotStore;
use anyhow::{Context, Result, bail};
use chrono::Local;
use clap::{Args, Parser, Subcommand};
use serde::Serialize;
use std::io::Write;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "subpack", version, about = "Substitute teacher continuity packs")]
struct Cli {
    /// Config file (defaults to $SUBPACK_CONFIG or the platform config dir)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    cmd: Command,
}

#[derive(Args)]
struct UserArg {
    /// Teacher whose planning data is used
    #[arg(long)]
    user: Option<String>,
}

#[derive(Subcommand)]
enum Command {
    #[command(flatten)]
    Pack(PackCommand),

    /// Write a default config file
    InitConfig {
        #[arg(long)]
        force: bool,
    },
}

/// Commands that read planning data.
#[derive(Subcommand)]
enum PackCommand {
    /// Render the substitute pack for a date
    Generate {
        /// YYYY-MM-DD
        date: String,
        #[arg(long)]
        days: Option<u32>,
        #[command(flatten)]
        user: UserArg,
        #[arg(long)]
        no_goals: bool,
        #[arg(long)]
        no_routines: bool,
        #[arg(long)]
        no_plans: bool,
        /// Replace student names with initials
        #[arg(long)]
        anonymize: bool,
        /// Mail the pack to this address
        #[arg(long)]
        email: Option<String>,
        #[arg(long)]
        notes: Option<String>,
        /// Record the generated pack in the audit log
        #[arg(long)]
        save: bool,
        /// Append emergency procedures for this scenario
        #[arg(long, value_enum)]
        scenario: Option<ScenarioId>,
        /// Write the document here instead of stdout
        #[arg(long, short)]
        out: Option<PathBuf>,
    },

    /// Multi-day plan with continuity notes, as JSON
    Weekly {
        start: String,
        #[arg(long, default_value_t = 5)]
        days: u32,
        #[command(flatten)]
        user: UserArg,
        #[arg(long)]
        anonymize: bool,
    },

    /// Materials needed for a date or a range of dates
    Materials {
        date: String,
        /// Extract a range starting at DATE instead of a single day
        #[arg(long)]
        days: Option<u32>,
        #[command(flatten)]
        user: UserArg,
    },

    /// List scenarios and the recommendation for the given conditions
    Scenarios {
        #[arg(long, value_enum)]
        weather: Option<Weather>,
        #[arg(long, value_enum)]
        technology: Option<Technology>,
        #[arg(long, value_enum)]
        staffing: Option<Staffing>,
        #[arg(long, value_enum)]
        building: Option<Building>,
    },

    /// Show one scenario with its filled-in template
    Scenario {
        id: String,
        #[arg(long)]
        teacher: Option<String>,
        #[arg(long)]
        class: Option<String>,
    },

    /// Pick a scenario from the clock and recent planning activity
    AutoScenario {
        #[command(flatten)]
        user: UserArg,
    },

    Contacts {
        #[command(flatten)]
        user: UserArg,
        #[arg(long, value_enum, default_value = "organized")]
        format: ContactFormat,
    },

    /// Send the prep reminder if an absence is coming up
    Remind {
        #[command(flatten)]
        user: UserArg,
        #[arg(long)]
        to: Option<String>,
        /// Pretend today is this date (YYYY-MM-DD)
        #[arg(long)]
        today: Option<String>,
    },
}

fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn load_config(path: Option<&PathBuf>) -> Result<Config> {
    match path {
        Some(p) => Config::load_from(p),
        None => Config::load(),
    }
}

pub async fn run() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match cli.cmd {
        Command::InitConfig { force } => init_config(cli.config, force),
        Command::Pack(cmd) => {
            let config = load_config(cli.config.as_ref())?;
            execute(open_generator(config)?, cmd).await
        }
    }
}

type Generator = PackGenerator<SnapshotStore, OutboxTransport>;

fn open_generator(config: Config) -> Result<Generator> {
    let store = SnapshotStore::open(&config)?;
    let outbox = config
        .outbox_dir()
        .context("no data directory on this platform; set outbox_dir")?;
    Ok(PackGenerator::new(config, store, OutboxTransport::new(outbox)))
}

fn init_config(path: Option<PathBuf>, force: bool) -> Result<()> {
    let path = match path {
        Some(p) => p,
        None => Config::config_path().context("no config directory on this platform")?,
    };
    if path.exists() && !force {
        bail!("{} already exists (use --force to overwrite)", path.display());
    }
    Config::default().save_to(&path)?;
    println!("Wrote {}", path.display());
    Ok(())
}

async fn execute(generator: Generator, cmd: PackCommand) -> Result<()> {
    match cmd {
        PackCommand::Generate {
            date,
            days,
            user,
            no_goals,
            no_routines,
            no_plans,
            anonymize,
            email,
            notes,
            save,
            scenario,
            out,
        } => {
            let opts = GenerateOptions {
                include_goals: !no_goals,
                include_routines: !no_routines,
                include_plans: !no_plans,
                anonymize,
                user_id: user.user,
                email_to: email,
                notes,
                save_record: save,
                scenario,
            };
            let days = days.unwrap_or(generator.config().default_days);
            let pack = generator.generate(&date, days, &opts).await?;
            match out {
                Some(path) => {
                    std::fs::write(&path, &pack.bytes)
                        .with_context(|| format!("writing {}", path.display()))?;
                    eprintln!("Wrote {}", path.display());
                }
                None => std::io::stdout().write_all(&pack.bytes)?,
            }
            if let Some(report) = &pack.delivery {
                match &report.error {
                    None => eprintln!("Sent to {}", report.recipient),
                    Some(e) => eprintln!("Could not send to {}: {}", report.recipient, e),
                }
            }
            if let Some(id) = pack.record_id {
                eprintln!("Recorded pack {}", id);
            }
        }
        PackCommand::Weekly {
            start,
            days,
            user,
            anonymize,
        } => {
            let opts = GenerateOptions {
                anonymize,
                user_id: user.user,
                ..GenerateOptions::default()
            };
            print_json(&generator.extract_weekly(&start, days, &opts).await?)?;
        }
        PackCommand::Materials { date, days, user } => {
            let request = match days {
                Some(days) => MaterialsRequest::Range { start: date, days },
                None => MaterialsRequest::Day(date),
            };
            let result = generator
                .extract_materials(&request, user.user.as_deref())
                .await?;
            print_json(&result)?;
        }
        PackCommand::Scenarios {
            weather,
            technology,
            staffing,
            building,
        } => {
            let conditions = ScenarioConditions {
                weather,
                technology,
                staffing,
                building,
            };
            let given = conditions != ScenarioConditions::default();
            print_json(&generator.extract_scenarios(given.then_some(&conditions)))?;
        }
        PackCommand::Scenario { id, teacher, class } => {
            let content =
                generator.get_scenario(&id, teacher.as_deref(), class.as_deref())?;
            print_json(&content)?;
        }
        PackCommand::AutoScenario { user } => {
            print_json(generator.auto_detect_scenario(user.user.as_deref()).await?)?;
        }
        PackCommand::Contacts { user, format } => {
            print_json(&generator.extract_contacts(user.user.as_deref(), format).await?)?;
        }
        PackCommand::Remind { user, to, today } => {
            let today = match today {
                Some(raw) => parse_date(&raw)?,
                None => Local::now().date_naive(),
            };
            match generator
                .send_reminder(user.user.as_deref(), to.as_deref(), today)
                .await?
            {
                Some(report) => print_json(&report)?,
                None => println!("No upcoming absence, nothing to send."),
            }
        }
    }

    Ok(())
}
