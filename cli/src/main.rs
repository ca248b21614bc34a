//! Telcogen CLI: generate the synthetic telecom tables from the command line

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use clap::{Parser, Subcommand};
use comfy_table::{ContentArrangement, Table};
use std::path::PathBuf;
use telcogen::catalog::load_locations_file;
use telcogen::{
    builtin_locations, FileStore, Generator, GeneratorConfig, PersistenceManager, PlanTier,
    RunManifest, SeedPolicy, TableFormat,
};
use tracing::Level;

#[derive(Parser)]
#[command(name = "telcogen", version, about = "Synthetic telecom dataset generator")]
struct Cli {
    /// Log every table write and derived seed
    #[arg(short, long, global = true, conflicts_with = "quiet")]
    verbose: bool,

    /// Only log warnings and errors
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Print results as JSON instead of tables
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, clap::ValueEnum)]
enum FormatArg {
    Csv,
    Jsonl,
}

impl From<FormatArg> for TableFormat {
    fn from(arg: FormatArg) -> Self {
        match arg {
            FormatArg::Csv => TableFormat::Csv,
            FormatArg::Jsonl => TableFormat::JsonLines,
        }
    }
}

#[derive(clap::Args)]
struct GenerateArgs {
    /// YAML or JSON configuration file
    #[arg(long)]
    config: Option<PathBuf>,

    /// Fixed master seed
    #[arg(long, conflicts_with = "random_seed")]
    seed: Option<u64>,

    /// Draw the master seed from the OS
    #[arg(long)]
    random_seed: bool,

    /// Reference instant (RFC 3339); defaults to now
    #[arg(long)]
    as_of: Option<DateTime<Utc>>,

    /// Root directory of the table store
    #[arg(long)]
    output: Option<PathBuf>,

    #[arg(long)]
    catalog: Option<String>,

    #[arg(long)]
    schema: Option<String>,

    #[arg(long, value_enum)]
    format: Option<FormatArg>,

    /// Real premises per synthetic premise row
    #[arg(long)]
    compression_ratio: Option<u32>,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate all seven tables and write them to the store
    Generate(GenerateArgs),
    /// Show the seed location catalog
    Locations {
        /// Configuration whose `locations_file` to show
        #[arg(long)]
        config: Option<PathBuf>,
    },
    /// Show the plan tier lookup table
    Plans,
}

fn main() {
    let cli = Cli::parse();
    init_tracing(&cli);

    let result = match cli.command {
        Commands::Generate(ref args) => run_generate(args, cli.json),
        Commands::Locations { ref config } => run_locations(config.as_ref(), cli.json),
        Commands::Plans => run_plans(cli.json),
    };

    if let Err(e) = result {
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
}

fn init_tracing(cli: &Cli) {
    let level = if cli.verbose {
        Level::DEBUG
    } else if cli.quiet {
        Level::WARN
    } else {
        Level::INFO
    };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .init();
}

fn load_config(path: Option<&PathBuf>) -> Result<GeneratorConfig> {
    match path {
        Some(path) => GeneratorConfig::from_file(path)
            .with_context(|| format!("loading configuration from {}", path.display())),
        None => Ok(GeneratorConfig::default()),
    }
}

/// Command-line flags override the configuration file
fn apply_overrides(config: &mut GeneratorConfig, args: &GenerateArgs) {
    if let Some(seed) = args.seed {
        config.seed = SeedPolicy::Fixed(seed);
    }
    if args.random_seed {
        config.seed = SeedPolicy::Entropy;
    }
    if let Some(as_of) = args.as_of {
        config.as_of = Some(as_of);
    }
    if let Some(root) = &args.output {
        config.output.root = root.clone();
    }
    if let Some(catalog) = &args.catalog {
        config.output.catalog = catalog.clone();
    }
    if let Some(schema) = &args.schema {
        config.output.schema = schema.clone();
    }
    if let Some(format) = args.format {
        config.output.format = format.into();
    }
    if let Some(ratio) = args.compression_ratio {
        config.premises_compression_ratio = ratio;
    }
}

fn run_generate(args: &GenerateArgs, json: bool) -> Result<()> {
    let mut config = load_config(args.config.as_ref())?;
    apply_overrides(&mut config, args);

    let generator = Generator::new(config)?;
    let store = FileStore::from_config(&generator.config().output)
        .context("opening output table store")?;
    let location = store.dir().to_path_buf();
    let manager = PersistenceManager::new(store);
    let manifest = manager.generate_and_persist(&generator)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&manifest)?);
    } else {
        print_summary(&manifest);
        println!("Tables written to {}", location.display());
    }
    Ok(())
}

fn print_summary(manifest: &RunManifest) {
    let mut table = Table::new();
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(vec!["Table", "Rows"]);
    for (name, count) in &manifest.tables {
        table.add_row(vec![
            format!("{}.{}.{}", manifest.catalog, manifest.schema, name),
            count.to_string(),
        ]);
    }
    table.add_row(vec!["total".to_string(), manifest.total_rows().to_string()]);

    println!("{}", table);
    println!(
        "seed {}  as of {}  in {} ms",
        manifest.master_seed,
        manifest.as_of.to_rfc3339(),
        manifest.elapsed_ms
    );
}

fn run_locations(config: Option<&PathBuf>, json: bool) -> Result<()> {
    let config = load_config(config)?;
    let locations = match &config.locations_file {
        Some(path) => load_locations_file(path)
            .with_context(|| format!("loading locations from {}", path.display()))?,
        None => builtin_locations(),
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&locations)?);
        return Ok(());
    }

    let mut table = Table::new();
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(vec![
        "State", "City", "Suburb", "Latitude", "Longitude", "Technology", "Premises",
    ]);
    for location in &locations {
        table.add_row(vec![
            location.state.clone(),
            location.city.clone(),
            location.suburb.clone(),
            format!("{:.4}", location.latitude),
            format!("{:.4}", location.longitude),
            location.technology.to_string(),
            location.premises_served.to_string(),
        ]);
    }
    println!("{}", table);
    println!("{} location(s)", locations.len());
    Ok(())
}

fn run_plans(json: bool) -> Result<()> {
    let plans: Vec<_> = PlanTier::ALL.iter().map(|tier| tier.spec()).collect();

    if json {
        println!("{}", serde_json::to_string_pretty(&plans)?);
        return Ok(());
    }

    let mut table = Table::new();
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(vec!["Plan", "Download (Mbps)", "Upload (Mbps)", "Monthly (AUD)"]);
    for plan in &plans {
        table.add_row(vec![
            plan.tier.to_string(),
            plan.download_mbps.to_string(),
            plan.upload_mbps.to_string(),
            format!("{:.2}", plan.monthly_price),
        ]);
    }
    println!("{}", table);
    Ok(())
}
