mod browser;
mod crawler;
mod db;
mod error;
mod fetch;
mod names;
mod parser;
mod settings;

use std::path::PathBuf;
use std::time::Instant;

use clap::{Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};

use browser::chrome::ChromeDriver;
use browser::Navigator;
use crawler::{CrawlOptions, Crawler};
use fetch::HttpSource;
use settings::{PublicationPolicy, Settings};

#[derive(Parser)]
#[command(name = "staff_scraper", about = "Staff roster and publication crawler")]
struct Cli {
    /// Settings file, applied over staff_scraper.toml and under STAFF_* variables
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create the database tables
    Init,
    /// Crawl the roster and store staff and their publications
    Crawl {
        /// Max roster rows to process (default: all)
        #[arg(short = 'n', long)]
        limit: Option<usize>,
        /// Re-extract publications of staff already stored, keeping only new titles
        #[arg(long)]
        refresh: bool,
        /// Run Chrome with a visible window
        #[arg(long)]
        show_browser: bool,
    },
    /// Show database statistics
    Stats,
    /// List the stored publication titles of one staff member
    Publications {
        /// Staff ID as shown by `overview`
        id: i64,
    },
    /// Staff overview table
    Overview {
        /// Max rows to display
        #[arg(short = 'n', long, default_value = "50")]
        limit: usize,
    },
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let t0 = Instant::now();
    let cli = Cli::parse();
    let settings = Settings::load(cli.config.as_deref())?;

    let conn = db::connect(&settings.db_path)?;
    db::init_schema(&conn)?;

    let result = match cli.command {
        Commands::Init => {
            println!("Schema ready in {:?}", settings.db_path);
            Ok(())
        }
        Commands::Crawl {
            limit,
            refresh,
            show_browser,
        } => {
            let policy = if refresh {
                PublicationPolicy::Refresh
            } else {
                settings.publication_policy
            };
            let source = HttpSource::new(&settings.user_agent, settings.http_timeout())?;
            let driver = ChromeDriver::launch(
                settings.headless && !show_browser,
                settings.browser_idle_timeout(),
            )?;
            let navigator = Navigator::open(
                driver,
                &settings.roster_url,
                &settings.full_record_label,
                settings.wait_timeout(),
            )?;

            let pb = ProgressBar::new(0);
            pb.set_style(
                ProgressStyle::default_bar()
                    .template("[{elapsed_precise}] {bar:40} {pos}/{len} ({per_sec}, eta {eta})")?
                    .progress_chars("=> "),
            );

            let options = CrawlOptions {
                roster_url: settings.roster_url.clone(),
                limit,
                policy,
            };
            let stats = Crawler::new(&conn, navigator, source, options, pb).run()?;
            println!(
                "Done: {} rows ({} added, {} already stored, {} malformed names, {} failed), {} publications saved.",
                stats.rows, stats.added, stats.existing, stats.malformed, stats.failed, stats.publications
            );
            Ok(())
        }
        Commands::Stats => {
            let s = db::get_stats(&conn)?;
            println!("Staff:             {}", s.staff);
            println!("Publications:      {}", s.publications);
            println!("Staff w/o pubs:    {}", s.staff_without_publications);
            Ok(())
        }
        Commands::Publications { id } => {
            let titles = db::publication_titles(&conn, id)?;
            for (i, title) in titles.iter().enumerate() {
                println!("{:>4}. {}", i + 1, title);
            }
            println!("\n{} publications", titles.len());
            Ok(())
        }
        Commands::Overview { limit } => {
            let rows = db::fetch_overview(&conn, limit)?;
            if rows.is_empty() {
                println!("No staff stored. Run 'crawl' first.");
                return Ok(());
            }

            println!(
                "{:>5} | {:<20} | {:<16} | {:<24} | {:>5}",
                "ID", "Degree", "First name", "Last name", "Pubs"
            );
            println!("{}", "-".repeat(82));
            for r in &rows {
                println!(
                    "{:>5} | {:<20} | {:<16} | {:<24} | {:>5}",
                    r.id,
                    truncate(&r.degree, 20),
                    truncate(&r.first_name, 16),
                    truncate(&r.last_name, 24),
                    r.publications
                );
            }
            println!("\n{} staff", rows.len());
            Ok(())
        }
    };

    let elapsed = t0.elapsed();
    if elapsed.as_secs() >= 1 {
        println!("\nDone in {}", format_duration(elapsed));
    }

    result
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let truncated: String = s.chars().take(max).collect();
        format!("{}...", truncated)
    }
}

fn format_duration(d: std::time::Duration) -> String {
    let secs = d.as_secs();
    if secs < 60 {
        format!("{:.1}s", d.as_secs_f64())
    } else if secs < 3600 {
        format!("{}m {}s", secs / 60, secs % 60)
    } else {
        format!("{}h {}m {}s", secs / 3600, (secs % 3600) / 60, secs % 60)
    }
}
