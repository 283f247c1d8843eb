use anyhow::{bail, Context, Result};
use clap::{ArgAction, Args, Parser, Subcommand, ValueEnum};
use colored::*;
use packing_core::{
    solve_batch, Bounds, EncodingStrategy, EngineConfig, EngineKind, Instance, Model,
    ModelBuilder, ModelOptions, PackingResult, SearchConfig, SearchMode, SolveStatus,
};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::debug;
use tracing_subscriber::EnvFilter;

mod format;

#[derive(Parser)]
#[command(name = "packing")]
#[command(about = "Strip packing benchmark - minimal plate height through SAT and SMT encodings", long_about = None)]
struct Cli {
    /// Increase log verbosity (-v debug, -vv trace); RUST_LOG takes precedence
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Find the minimal plate height of one or more instances
    Solve(SolveArgs),

    /// Print the lower and upper bound of an instance
    Bounds {
        /// Instance file (txt, JSON or YAML)
        #[arg(short, long)]
        input: PathBuf,

        /// Allow 90° rotation
        #[arg(long)]
        rotation: bool,
    },

    /// Print the model of an instance without solving it
    Emit {
        /// Instance file (txt, JSON or YAML)
        #[arg(short, long)]
        input: PathBuf,

        /// Fixed plate height; the parametric model is emitted when omitted
        #[arg(long)]
        height: Option<u32>,

        #[arg(long, value_enum, default_value = "big-m")]
        encoding: EncodingArg,

        /// Allow 90° rotation
        #[arg(long)]
        rotation: bool,

        #[arg(long)]
        no_symmetry_breaking: bool,
    },
}

#[derive(Args)]
struct SolveArgs {
    /// Instance file, or a directory of ins-N files
    #[arg(short, long)]
    input: PathBuf,

    /// Directory for out-N.txt solutions
    #[arg(short, long)]
    output_dir: Option<PathBuf>,

    #[arg(long, value_enum)]
    encoding: Option<EncodingArg>,

    #[arg(long, value_enum)]
    engine: Option<EngineArg>,

    /// Path of the z3/cvc5 binary
    #[arg(long)]
    solver_path: Option<PathBuf>,

    #[arg(long, value_enum)]
    mode: Option<ModeArg>,

    /// Allow 90° rotation
    #[arg(long)]
    rotation: bool,

    /// Time budget per instance in seconds
    #[arg(short, long)]
    timeout: Option<f64>,

    #[arg(long)]
    no_symmetry_breaking: bool,

    /// Run configuration (YAML or JSON); flags override it
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Write every result as JSON
    #[arg(short, long)]
    report: Option<PathBuf>,

    /// Only solve the instance with this id
    #[arg(long)]
    instance: Option<String>,

    /// Worker threads for the batch
    #[arg(short, long)]
    jobs: Option<usize>,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum EncodingArg {
    OrderSat,
    BigM,
    Cumulative,
}

impl From<EncodingArg> for EncodingStrategy {
    fn from(arg: EncodingArg) -> Self {
        match arg {
            EncodingArg::OrderSat => EncodingStrategy::OrderSat,
            EncodingArg::BigM => EncodingStrategy::BigM,
            EncodingArg::Cumulative => EncodingStrategy::Cumulative,
        }
    }
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum EngineArg {
    Sat,
    Z3,
    Cvc5,
}

impl From<EngineArg> for EngineKind {
    fn from(arg: EngineArg) -> Self {
        match arg {
            EngineArg::Sat => EngineKind::Sat,
            EngineArg::Z3 => EngineKind::Z3,
            EngineArg::Cvc5 => EngineKind::Cvc5,
        }
    }
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum ModeArg {
    Auto,
    Scan,
    Optimize,
}

impl From<ModeArg> for SearchMode {
    fn from(arg: ModeArg) -> Self {
        match arg {
            ModeArg::Auto => SearchMode::Auto,
            ModeArg::Scan => SearchMode::Scan,
            ModeArg::Optimize => SearchMode::Optimize,
        }
    }
}

/// Contents of a `--config` file.
#[derive(Debug, Default, Deserialize)]
struct RunConfig {
    #[serde(default)]
    search: SearchConfig,
    #[serde(default)]
    engine: EngineConfig,
    #[serde(default)]
    rotation: bool,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match cli.command {
        Commands::Solve(args) => {
            solve_command(args)?;
        }
        Commands::Bounds { input, rotation } => {
            bounds_command(&input, rotation)?;
        }
        Commands::Emit {
            input,
            height,
            encoding,
            rotation,
            no_symmetry_breaking,
        } => {
            let options = ModelOptions {
                symmetry_breaking: !no_symmetry_breaking,
            };
            emit_command(&input, height, encoding.into(), rotation, options)?;
        }
    }

    Ok(())
}

fn init_tracing(verbose: u8) {
    let default = match verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn load_run_config(path: &Path) -> Result<RunConfig> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config {}", path.display()))?;
    let config = match path.extension().and_then(|s| s.to_str()) {
        Some("yaml") | Some("yml") => serde_yaml::from_str(&content)?,
        _ => serde_json::from_str(&content)?,
    };
    Ok(config)
}

/// Instances named by `input`: one file, or every instance file of a directory.
fn load_inputs(input: &Path, only: Option<&str>) -> Result<Vec<Instance>> {
    let paths = if input.is_dir() {
        format::collect_inputs(input)?
    } else {
        vec![input.to_path_buf()]
    };

    let mut instances = Vec::with_capacity(paths.len());
    for path in &paths {
        let instance = format::load_instance(path)
            .with_context(|| format!("Failed to load instance {}", path.display()))?;
        if only.map_or(true, |id| id == instance.id) {
            instances.push(instance);
        }
    }

    if instances.is_empty() {
        bail!("No instances found in {}", input.display());
    }
    Ok(instances)
}

fn solve_command(args: SolveArgs) -> Result<()> {
    let mut run = match &args.config {
        Some(path) => load_run_config(path)?,
        None => RunConfig::default(),
    };
    if let Some(encoding) = args.encoding {
        run.search.encoding = encoding.into();
    }
    if let Some(mode) = args.mode {
        run.search.mode = mode.into();
    }
    if let Some(timeout) = args.timeout {
        run.search.time_budget_secs = timeout;
    }
    if args.no_symmetry_breaking {
        run.search.symmetry_breaking = false;
    }
    if let Some(engine) = args.engine {
        run.engine.kind = engine.into();
    }
    if let Some(path) = args.solver_path {
        run.engine.binary = Some(path);
    }
    let rotation = args.rotation || run.rotation;
    debug!("Run configuration: {:?}", run);

    if let Some(jobs) = args.jobs {
        rayon::ThreadPoolBuilder::new()
            .num_threads(jobs)
            .build_global()
            .context("Failed to configure worker threads")?;
    }

    println!("{}", "🔍 Loading instances...".bright_blue());
    let instances: Vec<Instance> = load_inputs(&args.input, args.instance.as_deref())?
        .into_iter()
        .map(|instance| {
            let rotation = rotation || instance.rotation;
            instance.with_rotation(rotation)
        })
        .collect();

    let engine = run.engine.for_family(run.search.encoding);
    println!(
        "  {} instance(s), {} encoding on {:?}, {}s budget each",
        instances.len().to_string().bright_white().bold(),
        run.search.encoding.to_string().bright_white(),
        engine.kind,
        run.search.time_budget_secs
    );
    println!();

    println!("{}", "🚀 Solving...".bright_blue());
    let results = solve_batch(&instances, &run.search, |_| engine.build());
    println!();

    for result in &results {
        print_result(result);
    }

    if let Some(dir) = &args.output_dir {
        std::fs::create_dir_all(dir)
            .with_context(|| format!("Failed to create {}", dir.display()))?;
        for result in &results {
            if let Some(packing) = &result.packing {
                let path = format::solution_path(dir, &result.instance_id);
                std::fs::write(&path, format::render_solution(packing))
                    .with_context(|| format!("Failed to write {}", path.display()))?;
            }
        }
        println!();
        println!(
            "💾 Saved solutions to {}",
            dir.display().to_string().bright_white()
        );
    }

    if let Some(report) = &args.report {
        let json = serde_json::to_string_pretty(&results)?;
        std::fs::write(report, json)?;
        println!(
            "💾 Saved report to {}",
            report.display().to_string().bright_white()
        );
    }

    let solved = results.iter().filter(|r| r.is_solved()).count();
    println!();
    println!(
        "{}",
        format!("✅ Solved {}/{} instance(s)", solved, results.len())
            .bright_green()
            .bold()
    );

    Ok(())
}

fn print_result(result: &PackingResult) {
    let status = match result.status {
        SolveStatus::Solved => result.status.to_string().bright_green(),
        SolveStatus::Timeout => result.status.to_string().bright_yellow(),
        _ => result.status.to_string().bright_red(),
    };
    let height = result
        .plate_height()
        .map(|h| h.to_string())
        .unwrap_or_else(|| "-".to_string());

    println!(
        "  • {}: {} height {} ({} attempt(s), {:.2}s)",
        result.instance_id.bright_white(),
        status,
        height.bright_white().bold(),
        result.attempts,
        result.elapsed_secs
    );
    if let Some(message) = &result.message {
        println!("      {}", message.dimmed());
    }
}

fn bounds_command(input: &Path, rotation: bool) -> Result<()> {
    let instance = format::load_instance(input)?;
    let rotation = rotation || instance.rotation;
    let instance = instance.with_rotation(rotation);
    let bounds = Bounds::compute(&instance)?;

    println!(
        "{} {} (width {}, {} items)",
        "📏".bright_blue(),
        instance.id.bright_white().bold(),
        instance.plate_width,
        instance.len()
    );
    println!("  Lower bound: {}", bounds.lower.to_string().bright_white());
    println!("  Upper bound: {}", bounds.upper.to_string().bright_white());

    Ok(())
}

fn emit_command(
    input: &Path,
    height: Option<u32>,
    encoding: EncodingStrategy,
    rotation: bool,
    options: ModelOptions,
) -> Result<()> {
    let instance = format::load_instance(input)?;
    let rotation = rotation || instance.rotation;
    let instance = instance.with_rotation(rotation);
    let builder = ModelBuilder::new(&instance, encoding, options)?;

    let model = match height {
        Some(height) => builder.build_for_height(height),
        None => builder.build_parametric(Bounds::compute(&instance)?)?,
    };

    match &model {
        Model::Linear(linear) => print!("{}", linear.to_smtlib()),
        Model::Cnf(cnf) => {
            println!(
                "{} model at height {}: {} variables, {} clauses{}",
                encoding,
                cnf.layout().plate_height,
                cnf.num_vars(),
                cnf.clauses().len(),
                if cnf.is_contradiction() {
                    " (refuted while building)"
                } else {
                    ""
                }
            );
        }
    }

    Ok(())
}
