use anyhow::Context;
use clap::{Args, Parser, Subcommand, ValueEnum};
use doctor_directory::catalog::CatalogBuilder;
use doctor_directory::config::DirectoryConfig;
use doctor_directory::constants::{specialty_control_id, SPECIALTY_OPTIONS};
use doctor_directory::data_types::{ConsultationMode, FilterCriteria, RawProviderRecord, SortKey};
use doctor_directory::query_sync::{self, MemoryQueryStore, QueryStore};
use doctor_directory::render::renderer_for;
use doctor_directory::state::{DirectoryState, UiEvent};
use doctor_directory::{source, DirectoryError, OutputFormat};
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "ddcli")]
#[command(about = "Doctor Directory CLI - Search, filter, and sort healthcare providers", long_about = None)]
struct Cli {
    /// Log loading details to stderr
    #[arg(short, long, global = true)]
    verbose: bool,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List providers matching the given filters
    List(ListArgs),
    /// Show summary statistics for the catalog
    Stats(SourceArgs),
    /// Print the shareable query string for the given filters
    Link(LinkArgs),
    /// List the specialty filter options
    Specialties,
}

#[derive(Args)]
struct SourceArgs {
    /// JSON file with the provider list (fetched from the endpoint if omitted)
    #[arg(short, long)]
    file: Option<PathBuf>,
    /// TOML configuration file
    #[arg(long, env = "DOCDIR_CONFIG")]
    config: Option<PathBuf>,
}

#[derive(Args)]
struct CriteriaArgs {
    /// Starting query string, e.g. "search=dr&sort=fees"
    #[arg(short, long, default_value = "")]
    query: String,
    /// Search providers by name
    #[arg(short, long)]
    search: Option<String>,
    /// Consultation mode
    #[arg(long, value_enum)]
    consultation: Option<ConsultationOpt>,
    /// Required specialty (repeatable; all must match)
    #[arg(long = "specialty")]
    specialties: Vec<String>,
    /// Sort order
    #[arg(long, value_enum)]
    sort: Option<SortOpt>,
}

#[derive(Args)]
struct ListArgs {
    #[command(flatten)]
    source: SourceArgs,
    #[command(flatten)]
    criteria: CriteriaArgs,
    /// Output format
    #[arg(long, value_enum, default_value_t = FormatOpt::Text)]
    format: FormatOpt,
    /// Limit number of providers shown
    #[arg(long)]
    limit: Option<usize>,
}

#[derive(Args)]
struct LinkArgs {
    #[command(flatten)]
    criteria: CriteriaArgs,
    /// Page the link should point at
    #[arg(long)]
    base_url: Option<String>,
}

#[derive(Copy, Clone, PartialEq, Eq, ValueEnum)]
enum ConsultationOpt {
    Any,
    Video,
    Clinic,
}

#[derive(Copy, Clone, PartialEq, Eq, ValueEnum)]
enum SortOpt {
    None,
    Fees,
    Experience,
}

#[derive(Copy, Clone, PartialEq, Eq, ValueEnum)]
enum FormatOpt {
    Text,
    Json,
    Csv,
}

impl CriteriaArgs {
    /// Flag overrides, in the order a user would click them
    fn events(&self, current: &FilterCriteria) -> Vec<UiEvent> {
        let mut events = Vec::new();
        if let Some(search) = &self.search {
            events.push(UiEvent::SearchChanged(search.clone()));
        }
        if let Some(mode) = self.consultation {
            events.push(UiEvent::ConsultationChanged(match mode {
                ConsultationOpt::Any => ConsultationMode::None,
                ConsultationOpt::Video => ConsultationMode::VideoConsult,
                ConsultationOpt::Clinic => ConsultationMode::InClinic,
            }));
        }
        for specialty in &self.specialties {
            if !current.specialties.contains(specialty) {
                events.push(UiEvent::SpecialtyToggled(specialty.clone()));
            }
        }
        if let Some(sort) = self.sort {
            events.push(UiEvent::SortChanged(match sort {
                SortOpt::None => SortKey::None,
                SortOpt::Fees => SortKey::FeeAscending,
                SortOpt::Experience => SortKey::ExperienceDescending,
            }));
        }
        events
    }

    fn to_criteria(&self) -> doctor_directory::Result<FilterCriteria> {
        let mut criteria = query_sync::parse_query_strict(&self.query)?;
        for event in self.events(&criteria.clone()) {
            match event {
                UiEvent::SearchChanged(text) | UiEvent::SuggestionClicked(text) => criteria.search_text = text,
                UiEvent::ConsultationChanged(mode) => criteria.consultation_mode = mode,
                UiEvent::SortChanged(key) => criteria.sort_key = key,
                UiEvent::SpecialtyToggled(name) => {
                    criteria.toggle_specialty(&name);
                }
            }
        }
        Ok(criteria)
    }
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let result = match cli.command {
        Commands::List(args) => cmd_list(args),
        Commands::Stats(args) => cmd_stats(args),
        Commands::Link(args) => cmd_link(args),
        Commands::Specialties => cmd_specialties(),
    };

    if let Err(e) = result {
        match e.downcast_ref::<DirectoryError>() {
            Some(err) => eprintln!("Error: {}", err.user_message()),
            None => eprintln!("Error: {:#}", e),
        }
        std::process::exit(1);
    }
}

fn init_logging(verbose: bool) {
    let default_filter = if verbose { "info" } else { "warn" };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

fn load_config(source: &SourceArgs) -> anyhow::Result<DirectoryConfig> {
    match &source.config {
        Some(path) => DirectoryConfig::load_layered(Some(path))
            .with_context(|| format!("Failed to load config from {}", path.display())),
        None => Ok(DirectoryConfig::load()),
    }
}

fn load_raw(source: &SourceArgs, config: &DirectoryConfig) -> doctor_directory::Result<Vec<RawProviderRecord>> {
    match &source.file {
        Some(path) => source::read_raw_catalog_file(path),
        None => fetch_raw(config),
    }
}

#[cfg(feature = "fetch")]
fn fetch_raw(config: &DirectoryConfig) -> doctor_directory::Result<Vec<RawProviderRecord>> {
    use doctor_directory::fetch::CatalogFetcher;
    let runtime = tokio::runtime::Runtime::new()?;
    let mut fetcher = CatalogFetcher::with_config(config);
    runtime.block_on(fetcher.fetch_raw())
}

#[cfg(not(feature = "fetch"))]
fn fetch_raw(_config: &DirectoryConfig) -> doctor_directory::Result<Vec<RawProviderRecord>> {
    Err(DirectoryError::feature_required("fetch"))
}

fn cmd_list(args: ListArgs) -> anyhow::Result<()> {
    let config = load_config(&args.source)?;
    query_sync::parse_query_strict(&args.criteria.query)?;
    let mut state = DirectoryState::new(MemoryQueryStore::new(args.criteria.query.clone()))
        .with_suggestion_limit(config.suggestion_limit());

    // A failed fetch still renders; a missing fetch feature cannot
    let raw = match load_raw(&args.source, &config) {
        Err(err @ DirectoryError::FeatureNotEnabled { .. }) => return Err(err.into()),
        other => other,
    };
    state.complete_raw_load(raw, config.malformed_record_policy);
    for event in args.criteria.events(state.criteria()) {
        state.dispatch(event);
    }

    let format = match args.format {
        FormatOpt::Text => OutputFormat::Text,
        FormatOpt::Json => OutputFormat::Json,
        FormatOpt::Csv => OutputFormat::Csv,
    };
    let renderer = renderer_for(format, args.limit);
    let stdout = std::io::stdout();
    renderer.render(&state.render_state(), &mut stdout.lock())?;

    if format == OutputFormat::Text {
        let query = state.store().current_query();
        if !query.is_empty() {
            println!("Share: ?{}", query);
        }
    }
    Ok(())
}

fn cmd_stats(args: SourceArgs) -> anyhow::Result<()> {
    let config = load_config(&args)?;
    let raw = load_raw(&args, &config)?;
    let catalog = CatalogBuilder::from_config(&config).raw_records(raw).build()?;
    catalog.statistics().print_summary();
    Ok(())
}

fn cmd_link(args: LinkArgs) -> anyhow::Result<()> {
    let criteria = args.criteria.to_criteria()?;
    match args.base_url.as_deref() {
        Some(base) => println!("{}", query_sync::shareable_link(base, &criteria)?),
        None => println!("?{}", query_sync::serialize_criteria(&criteria)),
    }
    Ok(())
}

fn cmd_specialties() -> anyhow::Result<()> {
    for specialty in SPECIALTY_OPTIONS {
        println!("{:<32} {}", specialty, specialty_control_id(specialty));
    }
    Ok(())
}
