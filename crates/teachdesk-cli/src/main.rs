//! teachdesk - command line front end for the teacher and position roster.
//!
//! Works offline: reads fall back to the local cache and new teachers are
//! kept locally until the server accepts them.
//!
//! # Usage
//!
//! ```text
//! teachdesk teachers
//! teachdesk --api-url http://school.example/api add-position --code TG --name "Tro giang"
//! RUST_LOG=debug teachdesk --log-file delete-teacher 65f1c0
//! ```

mod display;

use std::io;
use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use tracing::info;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use teachdesk_core::models::date::parse_date;
use teachdesk_core::models::{DegreeDraft, PersonDraft};
use teachdesk_core::{
    ApiClient, Config, FileStore, PositionDraft, PositionPatch, RecordId, Store, StoreState,
    TeacherDraft, TeacherPatch,
};

/// Log file name inside the cache directory
const LOG_FILE: &str = "teachdesk.log";

type CliStore = Store<ApiClient, FileStore>;

// ============================================================================
// Arguments
// ============================================================================

#[derive(Parser, Debug)]
#[command(name = "teachdesk", version, about = "Teacher and position roster, online or offline")]
struct Args {
    /// Base URL of the roster API (default: TEACHDESK_API_URL, then config file).
    #[arg(long, value_name = "URL")]
    api_url: Option<String>,

    /// Directory for the local cache (default: the platform cache dir).
    #[arg(long, value_name = "DIR")]
    cache_dir: Option<PathBuf>,

    /// Also write logs to teachdesk.log in the cache directory.
    #[arg(long)]
    log_file: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List teachers (server merged with local cache).
    Teachers,

    /// List positions.
    Positions,

    /// Create a position.
    AddPosition {
        #[arg(long)]
        code: String,
        #[arg(long)]
        name: String,
        #[arg(long, default_value = "")]
        description: String,
    },

    /// Create a teacher. Repeat --degree/--major/--year for several degrees.
    AddTeacher {
        #[arg(long)]
        code: String,
        #[arg(long)]
        name: String,
        #[arg(long)]
        email: String,
        #[arg(long, default_value = "")]
        phone: String,
        #[arg(long, default_value = "")]
        address: String,
        #[arg(long, default_value = "")]
        identity: String,
        #[arg(long, value_parser = date_arg)]
        dob: Option<NaiveDate>,
        #[arg(long, value_parser = date_arg)]
        start_date: Option<NaiveDate>,
        /// Position id; may be repeated.
        #[arg(long = "position", value_name = "ID")]
        positions: Vec<String>,
        #[arg(long = "degree", value_name = "NAME", required = true)]
        degrees: Vec<String>,
        #[arg(long = "major", value_name = "MAJOR")]
        majors: Vec<String>,
        #[arg(long = "year", value_name = "YEAR")]
        years: Vec<i32>,
    },

    /// Change fields of a position.
    UpdatePosition {
        id: String,
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        description: Option<String>,
        #[arg(long, value_name = "BOOL")]
        active: Option<bool>,
    },

    /// Change fields of a teacher.
    UpdateTeacher {
        id: String,
        #[arg(long)]
        code: Option<String>,
        #[arg(long, value_parser = date_arg)]
        start_date: Option<NaiveDate>,
        #[arg(long, value_name = "BOOL")]
        active: Option<bool>,
    },

    /// Delete a teacher.
    DeleteTeacher { id: String },

    /// Show where the cache lives and how old it is.
    CacheInfo,
}

fn date_arg(s: &str) -> Result<NaiveDate, String> {
    parse_date(s).ok_or_else(|| format!("invalid date '{}', expected YYYY-MM-DD", s))
}

// ============================================================================
// Entry point
// ============================================================================

/// Initialize the tracing subscriber. The returned guard flushes the log
/// file and must live until exit.
fn init_tracing(log_dir: Option<&PathBuf>) -> Option<WorkerGuard> {
    // RUST_LOG controls the level (e.g. RUST_LOG=debug)
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));

    let (file_layer, guard) = match log_dir {
        Some(dir) => {
            let appender = tracing_appender::rolling::never(dir, LOG_FILE);
            let (writer, guard) = tracing_appender::non_blocking(appender);
            (
                Some(fmt::layer().with_writer(writer).with_ansi(false)),
                Some(guard),
            )
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(io::stderr))
        .with(file_layer)
        .with(filter)
        .init();

    guard
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present (silently ignore if not found)
    let _ = dotenvy::dotenv();

    let args = Args::parse();
    let config = Config::load()?;

    let cache_dir = match args.cache_dir.clone() {
        Some(dir) => dir,
        None => config.cache_dir()?,
    };
    let cache = FileStore::new(cache_dir.clone())
        .with_context(|| format!("opening cache directory {}", cache_dir.display()))?;

    let _log_guard = init_tracing(args.log_file.then_some(&cache_dir));

    let api_url = args.api_url.clone().unwrap_or_else(|| config.api_url());
    info!(api_url = %api_url, cache_dir = %cache_dir.display(), "teachdesk starting");
    let client = ApiClient::new(api_url, config.request_timeout())?;

    let store = Store::new(client, cache);
    run(&store, args.command).await
}

async fn run(store: &CliStore, command: Command) -> Result<()> {
    match command {
        Command::Teachers => {
            // The gateway resolves position names itself, so only teachers
            // are fetched and `error` reflects that fetch alone.
            store.fetch_teachers().await;
            let state = store.state();
            warn_if_offline(&state, "showing cached data");
            display::print_teachers(&state.teachers);
        }

        Command::Positions => {
            store.fetch_positions().await;
            let state = store.state();
            warn_if_offline(&state, "position list unavailable");
            display::print_positions(&state.positions);
        }

        Command::AddPosition {
            code,
            name,
            description,
        } => {
            let created = store
                .add_position(PositionDraft {
                    code,
                    name,
                    description,
                })
                .await?;
            println!("Added position {} ({})", created.code, created.id);
        }

        Command::AddTeacher {
            code,
            name,
            email,
            phone,
            address,
            identity,
            dob,
            start_date,
            positions,
            degrees,
            majors,
            years,
        } => {
            let draft = TeacherDraft {
                code,
                start_date,
                position_ids: positions.into_iter().map(RecordId::from).collect(),
                degrees: zip_degrees(degrees, majors, years),
                person: PersonDraft {
                    name,
                    email,
                    phone,
                    address,
                    identity,
                    date_of_birth: dob,
                },
            };

            // Positions and the current roster are needed to label the
            // local record and to catch duplicate emails.
            futures::join!(store.fetch_positions(), store.fetch_teachers());

            match store.add_teacher(draft).await {
                Ok(created) => println!("Added teacher {} ({})", created.code, created.id),
                Err(e) if e.is_remote_unavailable() => {
                    eprintln!("warning: server unreachable, teacher kept in the local cache");
                    return Err(e.into());
                }
                Err(e) => return Err(e.into()),
            }
        }

        Command::UpdatePosition {
            id,
            name,
            description,
            active,
        } => {
            let patch = PositionPatch {
                name,
                description,
                is_active: active,
                ..Default::default()
            };
            if patch.is_empty() {
                bail!("nothing to update");
            }
            match store.update_position(&RecordId::from(id.as_str()), patch).await? {
                Some(position) => println!("Updated position {} ({})", position.code, position.id),
                None => println!("No position with id {}", id),
            }
        }

        Command::UpdateTeacher {
            id,
            code,
            start_date,
            active,
        } => {
            let patch = TeacherPatch {
                code,
                start_date,
                is_active: active,
                ..Default::default()
            };
            if patch.is_empty() {
                bail!("nothing to update");
            }
            match store.update_teacher(&RecordId::from(id.as_str()), patch).await? {
                Some(teacher) => println!("Updated teacher {} ({})", teacher.code, teacher.id),
                None => println!("No teacher with id {}", id),
            }
        }

        Command::DeleteTeacher { id } => {
            store.delete_teacher(&RecordId::from(id)).await?;
            println!("Deleted teacher");
        }

        Command::CacheInfo => {
            display::print_cache_info(store.cache());
        }
    }
    Ok(())
}

fn warn_if_offline(state: &StoreState, fallback: &str) {
    if let Some(ref error) = state.error {
        eprintln!("warning: {} ({})", error, fallback);
    }
}

/// Pair up repeated degree flags. Missing majors or years are left blank.
fn zip_degrees(names: Vec<String>, majors: Vec<String>, years: Vec<i32>) -> Vec<DegreeDraft> {
    let mut majors = majors.into_iter();
    let mut years = years.into_iter();
    names
        .into_iter()
        .map(|name| DegreeDraft {
            name,
            major: majors.next().unwrap_or_default(),
            graduation_year: years.next(),
        })
        .collect()
}
