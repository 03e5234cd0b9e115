use clap::{Parser, Subcommand};
use std::io::Write;
use std::path::PathBuf;
use tracing::{error, info};

use crate::aggregator::Aggregator;
use crate::config::Config;
use crate::domain::{parse_iso_date, Conference};
use crate::error::{ConfradarError, Result};
use crate::filter::ConferenceFilter;
use crate::normalize::split_topics;
use crate::sources::{HttpFetcher, SourceRegistry};
use crate::storage::{FsStorage, Library};
use crate::tui::{self, Browser};

/// Exit code for malformed user input.
pub const EXIT_USAGE: i32 = 2;

#[derive(Parser)]
#[command(name = "confradar")]
#[command(about = "Confradar - your radar for upcoming conferences")]
#[command(version)]
pub struct Cli {
    /// Directory holding user data (defaults to the platform data dir)
    #[arg(long, global = true)]
    pub data_dir: Option<PathBuf>,

    /// Log debug output to stderr
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// List upcoming conferences with optional filters
    List {
        /// Filter by topic keyword
        #[arg(short = 't', long)]
        topic: Option<String>,
        /// Filter by country
        #[arg(short = 'c', long)]
        country: Option<String>,
        /// Include conferences ending on/after this ISO date (YYYY-MM-DD)
        #[arg(long)]
        after: Option<String>,
        /// Include conferences starting on/before this ISO date (YYYY-MM-DD)
        #[arg(long)]
        before: Option<String>,
    },
    /// Show conferences whose name contains the given text
    Show {
        /// Exact or partial conference name
        name: String,
    },
    /// Add a custom conference to your local library (persisted)
    Add {
        /// Conference name
        name: String,
        /// Start date YYYY-MM-DD
        #[arg(long)]
        start_date: String,
        /// End date YYYY-MM-DD
        #[arg(long)]
        end_date: String,
        #[arg(long)]
        city: String,
        #[arg(long)]
        country: String,
        #[arg(long)]
        url: String,
        /// Comma-separated topics
        #[arg(long, default_value = "")]
        topics: String,
    },
    /// Star a conference by name
    Star { name: String },
    /// Remove the star from a conference
    Unstar { name: String },
    /// Refresh remote sources and update the local cache
    Refresh,
    /// Manage data sources (JSON URLs and local JSON files)
    Sources {
        #[command(subcommand)]
        action: SourcesAction,
    },
    /// Launch the interactive browser
    Interactive,
}

#[derive(Subcommand, Debug, Clone)]
pub enum SourcesAction {
    /// Add a URL or local file path
    Add { value: String },
    /// Print the configured sources with their indices
    List,
    /// Remove a source by its 0-based index from `sources list`
    Remove { index: String },
    /// Reset to the curated default sources
    Reset,
}

/// Resolved runtime context shared by every command.
pub struct Context {
    pub data_dir: PathBuf,
    pub config: Config,
}

impl Context {
    pub fn load(data_dir: PathBuf) -> Self {
        let config = Config::load(&data_dir);
        Self { data_dir, config }
    }

    fn library(&self) -> Library<FsStorage> {
        Library::new(FsStorage::new(&self.data_dir))
    }

    fn aggregator(&self) -> Result<Aggregator<FsStorage>> {
        Aggregator::new(self.library())
    }
}

/// Execute one command, writing user-facing output to `out`; returns the
/// process exit code.
pub fn run<W: Write>(command: Commands, ctx: &Context, out: &mut W) -> Result<i32> {
    match command {
        Commands::List { topic, country, after, before } => {
            let filter = ConferenceFilter { topic, country, after, before };
            let confs = match filter.apply(&ctx.aggregator()?.load()) {
                Ok(confs) => confs,
                Err(e @ ConfradarError::InvalidDate { .. }) => {
                    writeln!(out, "❌ {e}")?;
                    return Ok(EXIT_USAGE);
                }
                Err(e) => return Err(e),
            };
            if confs.is_empty() {
                writeln!(out, "No conferences matched your filters.")?;
                return Ok(0);
            }
            render_list(&confs, out)?;
            Ok(0)
        }
        Commands::Show { name } => {
            let needle = name.to_lowercase();
            let matches: Vec<Conference> = ctx
                .aggregator()?
                .load()
                .into_iter()
                .filter(|c| c.name.to_lowercase().contains(&needle))
                .collect();
            if matches.is_empty() {
                writeln!(out, "No conference found matching '{name}'.")?;
                return Ok(1);
            }
            for c in &matches {
                render_detail(c, out)?;
            }
            Ok(0)
        }
        Commands::Add { name, start_date, end_date, city, country, url, topics } => {
            for date in [&start_date, &end_date] {
                if let Err(e) = parse_iso_date(date) {
                    writeln!(out, "❌ {e}")?;
                    return Ok(EXIT_USAGE);
                }
            }
            let conference = Conference {
                name,
                start_date,
                end_date,
                city,
                country,
                url,
                topics: split_topics(&topics),
            };
            ctx.aggregator()?.add_user_conference(conference)?;
            writeln!(out, "✅ Added.")?;
            Ok(0)
        }
        Commands::Star { name } => {
            let library = ctx.library();
            let mut stars = library.load_stars();
            stars.insert(name.clone());
            library.save_stars(&stars)?;
            writeln!(out, "★ Starred {name}")?;
            Ok(0)
        }
        Commands::Unstar { name } => {
            let library = ctx.library();
            let mut stars = library.load_stars();
            if stars.remove(&name) {
                library.save_stars(&stars)?;
                writeln!(out, "Unstarred {name}")?;
            } else {
                writeln!(out, "{name} was not starred")?;
            }
            Ok(0)
        }
        Commands::Refresh => {
            let result = ctx
                .aggregator()?
                .refresh(ctx.config.refresh_timeout(), &ctx.config.refresh.user_agent)?;
            writeln!(out, "🔄 Fetched {} conferences from sources.", result.total_conferences)?;
            Ok(0)
        }
        Commands::Sources { action } => run_sources(action, ctx, out),
        Commands::Interactive => {
            let fetcher = HttpFetcher::new(ctx.config.refresh_timeout(), &ctx.config.refresh.user_agent)?;
            let mut browser = Browser::new(ctx.aggregator()?, Box::new(fetcher));
            tui::run_interactive(&mut browser, &ctx.config.tui)?;
            Ok(0)
        }
    }
}

fn run_sources<W: Write>(action: SourcesAction, ctx: &Context, out: &mut W) -> Result<i32> {
    let library = ctx.library();
    let registry = SourceRegistry::new(&library);
    match action {
        SourcesAction::List => {
            let sources = registry.list();
            if sources.is_empty() {
                writeln!(out, "No sources configured.")?;
            }
            for (i, source) in sources.iter().enumerate() {
                writeln!(out, "[{i}] {source}")?;
            }
            Ok(0)
        }
        SourcesAction::Add { value } => {
            if value.trim().is_empty() {
                writeln!(out, "❌ Provide a URL or path.")?;
                return Ok(EXIT_USAGE);
            }
            registry.add(&value)?;
            writeln!(out, "✅ Source added.")?;
            Ok(0)
        }
        SourcesAction::Remove { index } => {
            let Ok(index) = index.parse::<usize>() else {
                writeln!(out, "❌ Provide the index to remove.")?;
                return Ok(EXIT_USAGE);
            };
            match registry.remove(index) {
                Ok(removed) => {
                    writeln!(out, "✅ Removed {removed}")?;
                    Ok(0)
                }
                Err(e @ ConfradarError::InvalidSourceIndex { .. }) => {
                    writeln!(out, "❌ {e}")?;
                    Ok(EXIT_USAGE)
                }
                Err(e) => Err(e),
            }
        }
        SourcesAction::Reset => match registry.reset() {
            Ok(defaults) => {
                info!("Reset to {} default sources", defaults.len());
                writeln!(out, "✅ Sources reset to curated defaults.")?;
                Ok(0)
            }
            Err(e) => {
                error!("Failed to reset sources: {}", e);
                writeln!(out, "❌ Failed to reset sources.")?;
                Ok(1)
            }
        },
    }
}

/// Plain-text table: Dates, Name, Location, Topics, URL.
pub fn render_list<W: Write>(confs: &[Conference], out: &mut W) -> Result<()> {
    let header = ["Dates", "Name", "Location", "Topics", "URL"];
    let rows: Vec<[String; 5]> = confs
        .iter()
        .map(|c| [c.date_range(), c.name.clone(), c.location(), c.topics_label(), c.url.clone()])
        .collect();

    let mut widths = header.map(|h| h.chars().count());
    for row in &rows {
        for (width, cell) in widths.iter_mut().zip(row) {
            *width = (*width).max(cell.chars().count());
        }
    }

    writeln!(out, "Upcoming Conferences")?;
    write_row(out, &header.map(str::to_string), &widths)?;
    let rule: Vec<String> = widths.iter().map(|w| "━".repeat(*w)).collect();
    writeln!(out, "{}", rule.join("━━"))?;
    for row in &rows {
        write_row(out, row, &widths)?;
    }
    Ok(())
}

fn write_row<W: Write>(out: &mut W, cells: &[String; 5], widths: &[usize; 5]) -> Result<()> {
    let padded: Vec<String> = cells
        .iter()
        .zip(widths)
        .map(|(cell, width)| format!("{cell:<width$}"))
        .collect();
    writeln!(out, "{}", padded.join("  ").trim_end())?;
    Ok(())
}

fn render_detail<W: Write>(c: &Conference, out: &mut W) -> Result<()> {
    writeln!(out, "── {} ──", c.name)?;
    writeln!(out, "Dates: {}", c.date_range())?;
    writeln!(out, "Location: {}", c.location())?;
    writeln!(out, "Topics: {}", c.topics_label())?;
    writeln!(out, "URL: {}\n", c.url)?;
    Ok(())
}
