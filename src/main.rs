use std::path::PathBuf;
use std::time::Duration;

use anyhow::{bail, Context};
use clap::{Args, Parser, Subcommand, ValueEnum};
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use uuid::Uuid;

mod columns;
mod db;
mod insight;
mod merge;
mod models;
mod notify;
mod parse;
mod report;
mod score;

use models::{MetricKind, WorkroomRecord};
use parse::SchemaMode;

#[derive(Parser)]
#[command(name = "workroom-performance")]
#[command(about = "Workroom performance tracker for flooring installation", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum Mode {
    Visual,
    Survey,
}

impl Mode {
    fn schema(self) -> SchemaMode {
        match self {
            Mode::Visual => SchemaMode::Visual,
            Mode::Survey => SchemaMode::Survey,
        }
    }
}

/// File inputs shared by the scoring commands. Merging visual and survey
/// sets is opt-in; without `--merge` the two datasets sit side by side.
#[derive(Debug, Args)]
struct DatasetArgs {
    /// Visual (operational) export files: .csv, .xlsx, .xls or .json
    #[arg(long = "visual")]
    visual: Vec<PathBuf>,
    /// Survey export files
    #[arg(long = "survey")]
    survey: Vec<PathBuf>,
    /// Merge survey rows into visual rows by store + workroom
    #[arg(long)]
    merge: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Create or upgrade the database schema
    InitDb,
    /// Load realistic seed data
    Seed,
    /// Parse one export file and print a summary
    Import {
        file: PathBuf,
        #[arg(long, value_enum, default_value_t = Mode::Visual)]
        mode: Mode,
    },
    /// Compute component scores and the weighted WPI per workroom
    Score {
        #[command(flatten)]
        dataset: DatasetArgs,
        #[arg(long, default_value_t = 10)]
        limit: usize,
    },
    /// Qualitative ratings, financial risk tier and fix-now actions
    Insights {
        #[command(flatten)]
        dataset: DatasetArgs,
    },
    /// Generate a markdown report
    Report {
        #[command(flatten)]
        dataset: DatasetArgs,
        #[arg(long, default_value = "report.md")]
        out: PathBuf,
    },
    /// One threshold pass: create deduped notifications for weak metrics
    Check {
        #[command(flatten)]
        dataset: DatasetArgs,
    },
    /// Periodic mode: re-evaluate thresholds and refresh the unread count
    Watch {
        #[command(flatten)]
        dataset: DatasetArgs,
        #[arg(long, default_value_t = 30)]
        check_secs: u64,
        #[arg(long, default_value_t = 5)]
        refresh_secs: u64,
    },
    /// Inspect and manage notifications
    Notifications {
        #[command(subcommand)]
        command: NotificationCommands,
    },
    /// Corrective-action form submissions
    Forms {
        #[command(subcommand)]
        command: FormCommands,
    },
    /// User profile lookup by email
    Profile {
        #[command(subcommand)]
        command: ProfileCommands,
    },
}

#[derive(Subcommand)]
enum NotificationCommands {
    List {
        #[arg(long)]
        workroom: Option<String>,
    },
    Read {
        ids: Vec<Uuid>,
    },
    /// Delete untagged notifications in the old message format
    CleanupLegacy,
}

#[derive(Subcommand)]
enum FormCommands {
    Submit {
        #[arg(long)]
        workroom: String,
        #[arg(long)]
        metric: String,
        #[arg(long)]
        submitted_by: String,
        /// Form payload as a JSON object
        #[arg(long)]
        payload: String,
    },
    List {
        #[arg(long)]
        workroom: Option<String>,
    },
}

#[derive(Subcommand)]
enum ProfileCommands {
    Set {
        #[arg(long)]
        email: String,
        #[arg(long)]
        workroom: String,
        #[arg(long)]
        role: String,
    },
    Get {
        email: String,
    },
}

async fn connect() -> anyhow::Result<PgPool> {
    let database_url = std::env::var("DATABASE_URL")
        .context("DATABASE_URL must be set to a production Postgres instance")?;
    PgPoolOptions::new()
        .max_connections(5)
        .connect(&database_url)
        .await
        .context("failed to connect to Postgres")
}

fn load_dataset(dataset: &DatasetArgs) -> anyhow::Result<Vec<WorkroomRecord>> {
    if dataset.visual.is_empty() && dataset.survey.is_empty() {
        bail!("provide at least one --visual or --survey file");
    }

    let mut visual = Vec::new();
    for path in &dataset.visual {
        let sheet = parse::parse_file(path, SchemaMode::Visual)?;
        visual.extend(sheet.records);
    }
    let mut survey = Vec::new();
    for path in &dataset.survey {
        let sheet = parse::parse_file(path, SchemaMode::Survey)?;
        survey.extend(sheet.records);
    }

    if dataset.merge {
        Ok(merge::merge_datasets(&visual, &survey))
    } else {
        visual.extend(survey);
        Ok(visual)
    }
}

async fn run_check(pool: &PgPool, dataset: &DatasetArgs) -> anyhow::Result<usize> {
    let records = load_dataset(dataset)?;
    let totals = merge::totals_by_workroom(&records);
    let scored = score::score_all(&totals);
    let pending = notify::evaluate(&scored);
    let existing = db::fetch_notifications(pool, None).await?;

    let mut created = 0usize;
    for alert in notify::dedup(pending, &existing) {
        db::insert_notification(pool, &alert).await?;
        created += 1;
    }
    Ok(created)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::InitDb => {
            let pool = connect().await?;
            db::init_db(&pool).await?;
            println!("Schema ready.");
        }
        Commands::Seed => {
            let pool = connect().await?;
            db::seed(&pool).await?;
            println!("Seed data inserted.");
        }
        Commands::Import { file, mode } => {
            let sheet = parse::parse_file(&file, mode.schema())?;
            println!(
                "Parsed {} records across {} rows from {}.",
                sheet.records.len(),
                sheet.total_rows,
                file.display()
            );
        }
        Commands::Score { dataset, limit } => {
            let records = load_dataset(&dataset)?;
            let totals = merge::totals_by_workroom(&records);
            let mut scored = score::score_all(&totals);
            scored.sort_by(|a, b| {
                b.1.weighted_wpi
                    .partial_cmp(&a.1.weighted_wpi)
                    .unwrap_or(std::cmp::Ordering::Equal)
            });

            if scored.is_empty() {
                println!("No workrooms found in the provided files.");
                return Ok(());
            }

            println!("Workrooms by weighted WPI:");
            for (totals, scores) in scored.iter().take(limit) {
                println!(
                    "- {} WPI {:.1} (LTR {:.1}, jobs cycle {:.1}, WO cycle {:.1}, reschedule {:.1}, debits {:.1})",
                    totals.name,
                    scores.weighted_wpi,
                    scores.ltr_score,
                    scores.cycle_jobs_score,
                    scores.work_order_cycle_time_score,
                    scores.reschedule_rate_score,
                    scores.vendor_debits_score
                );
            }
        }
        Commands::Insights { dataset } => {
            let records = load_dataset(&dataset)?;
            let totals = merge::totals_by_workroom(&records);
            let scored = score::score_all(&totals);
            let population_labor_po: f64 = totals.iter().map(|t| t.labor_po).sum();

            for (totals, scores) in &scored {
                let item = insight::build_insight(totals, scores, population_labor_po);
                println!(
                    "{}: risk {} (store mix {}, LTR {}, labor volume {}, debits {})",
                    item.name,
                    item.financial_risk.as_str(),
                    item.store_mix.as_str(),
                    item.ltr_performance.as_str(),
                    item.labor_contribution.as_str(),
                    item.vendor_debit.as_str()
                );
                for bullet in &item.fix_now {
                    println!("  - {bullet}");
                }
            }
        }
        Commands::Report { dataset, out } => {
            let records = load_dataset(&dataset)?;
            let totals = merge::totals_by_workroom(&records);
            let scored = score::score_all(&totals);
            let label = dataset
                .visual
                .iter()
                .chain(dataset.survey.iter())
                .map(|path| path.display().to_string())
                .collect::<Vec<_>>()
                .join(", ");
            let report = report::build_report(&label, &totals, &scored);
            std::fs::write(&out, report)?;
            println!("Report written to {}.", out.display());
        }
        Commands::Check { dataset } => {
            let pool = connect().await?;
            let created = run_check(&pool, &dataset).await?;
            println!("Created {created} notifications.");
        }
        Commands::Watch {
            dataset,
            check_secs,
            refresh_secs,
        } => {
            let pool = connect().await?;
            let mut check_timer = tokio::time::interval(Duration::from_secs(check_secs.max(1)));
            let mut refresh_timer =
                tokio::time::interval(Duration::from_secs(refresh_secs.max(1)));
            println!(
                "Watching: threshold check every {check_secs}s, notification refresh every {refresh_secs}s. Ctrl-C to stop."
            );

            loop {
                tokio::select! {
                    _ = check_timer.tick() => {
                        match run_check(&pool, &dataset).await {
                            Ok(created) if created > 0 => {
                                println!("Created {created} notifications.");
                            }
                            Ok(_) => {}
                            Err(error) => eprintln!("threshold check failed: {error:#}"),
                        }
                    }
                    _ = refresh_timer.tick() => {
                        match db::fetch_notifications(&pool, None).await {
                            Ok(list) => {
                                println!("{} unread notifications.", notify::unread_count(&list));
                            }
                            Err(error) => eprintln!("notification refresh failed: {error:#}"),
                        }
                    }
                    _ = tokio::signal::ctrl_c() => {
                        println!("Stopping watch.");
                        break;
                    }
                }
            }
        }
        Commands::Notifications { command } => {
            let pool = connect().await?;
            match command {
                NotificationCommands::List { workroom } => {
                    let list = db::fetch_notifications(&pool, workroom.as_deref()).await?;
                    if list.is_empty() {
                        println!("No notifications.");
                        return Ok(());
                    }
                    println!("{} notifications ({} unread):", list.len(), notify::unread_count(&list));
                    for item in &list {
                        let route = notify::route_for(item).unwrap_or("-");
                        println!(
                            "- [{}] {} {} :: {} (route {})",
                            if item.is_read { "read" } else { "new" },
                            item.id,
                            item.workroom,
                            item.message,
                            route
                        );
                    }
                }
                NotificationCommands::Read { ids } => {
                    if ids.is_empty() {
                        bail!("provide at least one notification id");
                    }
                    let updated = db::mark_read(&pool, &ids).await?;
                    println!("Marked {updated} notifications read.");
                }
                NotificationCommands::CleanupLegacy => {
                    let deleted = db::cleanup_legacy(&pool).await?;
                    println!("Deleted {deleted} legacy notifications.");
                }
            }
        }
        Commands::Forms { command } => {
            let pool = connect().await?;
            match command {
                FormCommands::Submit {
                    workroom,
                    metric,
                    submitted_by,
                    payload,
                } => {
                    let metric = MetricKind::parse(&metric)
                        .with_context(|| format!("unknown metric '{metric}'"))?;
                    let payload: serde_json::Value = serde_json::from_str(&payload)
                        .context("payload must be valid JSON")?;
                    let id = db::insert_form(&pool, &workroom, metric, &submitted_by, &payload)
                        .await?;
                    println!("Form {id} recorded for {workroom} ({}).", metric.label());
                }
                FormCommands::List { workroom } => {
                    let forms = db::fetch_forms(&pool, workroom.as_deref()).await?;
                    if forms.is_empty() {
                        println!("No form submissions.");
                        return Ok(());
                    }
                    for form in &forms {
                        println!(
                            "- {} {} {} by {} at {}",
                            form.id,
                            form.workroom,
                            form.metric_type.as_str(),
                            form.submitted_by,
                            form.created_at
                        );
                    }
                }
            }
        }
        Commands::Profile { command } => {
            let pool = connect().await?;
            match command {
                ProfileCommands::Set {
                    email,
                    workroom,
                    role,
                } => {
                    db::upsert_profile(&pool, &email, &workroom, &role).await?;
                    println!("Profile stored for {email}.");
                }
                ProfileCommands::Get { email } => match db::fetch_profile(&pool, &email).await? {
                    Some(profile) => {
                        println!("{}: {} ({})", profile.email, profile.workroom, profile.role);
                    }
                    None => println!("No profile for {email}."),
                },
            }
        }
    }

    Ok(())
}
