use std::io::{self, Read};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use serde_json::json;
use tracing_subscriber::EnvFilter;

use cairn_checkpoint::{CheckpointOutcome, Checkpointer};
use cairn_config::{FlowDef, HOME_ENV, ResultConfig, Settings, load_file};
use cairn_result::{LocationContext, ResultFactory, ResultValue, TaskResult};
use cairn_store::{SqliteStore, TrackingStore};
use cairn_tasks::{Copy, Move, Remove};

/// Cairn - persist, track and read back task results
#[derive(Parser)]
#[command(name = "cairn")]
#[command(version, about, long_about = None)]
struct Cli {
  /// Path to the data directory (default: $CAIRN_HOME or ~/.cairn)
  #[arg(long, global = true)]
  data_dir: Option<PathBuf>,

  /// Enable checkpointing regardless of CAIRN__FLOWS__CHECKPOINTING
  #[arg(long, global = true)]
  checkpointing: bool,

  #[command(subcommand)]
  command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
  /// Work with a single result configuration
  Result {
    #[command(subcommand)]
    action: ResultAction,
  },

  /// Checkpoint a task's output (read from stdin) as its flow configures it
  Checkpoint {
    /// Path to the flow file (JSON or YAML)
    flow_file: PathBuf,

    /// The task whose output is on stdin
    #[arg(long)]
    task: String,

    #[command(flatten)]
    run: RunArgs,
  },

  /// List tracked task runs
  History {
    /// Records for this task name
    #[arg(long, conflicts_with = "flow_run_id", required_unless_present = "flow_run_id")]
    task: Option<String>,

    /// Records for this flow run
    #[arg(long)]
    flow_run_id: Option<String>,
  },

  /// Built-in file tasks
  Files {
    #[command(subcommand)]
    action: FilesAction,
  },
}

#[derive(Subcommand)]
enum ResultAction {
  /// Write the JSON value on stdin and print where it went
  Write {
    /// Path to the result config file (JSON or YAML)
    #[arg(long)]
    config: PathBuf,

    /// Location template, overriding the one in the config
    #[arg(long)]
    location: Option<String>,

    #[command(flatten)]
    run: RunArgs,
  },

  /// Read the value at a location
  Read {
    #[arg(long)]
    config: PathBuf,

    location: String,
  },

  /// Check whether a value exists at a location template
  Exists {
    #[arg(long)]
    config: PathBuf,

    location: String,

    #[command(flatten)]
    run: RunArgs,
  },
}

#[derive(Subcommand)]
enum FilesAction {
  /// Move a file or directory
  Move { source: PathBuf, target: PathBuf },
  /// Copy a file or directory
  Copy { source: PathBuf, target: PathBuf },
  /// Remove a file or directory
  Remove { path: PathBuf },
}

/// Values available to location templates.
#[derive(Args)]
struct RunArgs {
  #[arg(long)]
  flow_name: Option<String>,

  #[arg(long)]
  flow_run_id: Option<String>,

  #[arg(long)]
  task_name: Option<String>,

  #[arg(long)]
  task_run_id: Option<String>,

  #[arg(long)]
  map_index: Option<u32>,

  /// Template parameter, as name=value (repeatable)
  #[arg(long = "param", value_parser = parse_param)]
  params: Vec<(String, String)>,
}

impl RunArgs {
  fn context(&self) -> LocationContext {
    let mut ctx = LocationContext::new();
    ctx.flow_name = self.flow_name.clone();
    ctx.flow_run_id = self.flow_run_id.clone();
    if let Some(name) = &self.task_name {
      ctx = ctx.with_task(name.clone(), self.task_run_id.clone().unwrap_or_default());
    }
    ctx.task_run_id = self.task_run_id.clone();
    if let Some(index) = self.map_index {
      ctx = ctx.with_map_index(index);
    }
    for (name, value) in &self.params {
      ctx = ctx.with_parameter(name.clone(), value.clone());
    }
    ctx
  }
}

fn parse_param(raw: &str) -> Result<(String, String), String> {
  raw
    .split_once('=')
    .map(|(k, v)| (k.to_string(), v.to_string()))
    .ok_or_else(|| format!("expected name=value, got '{}'", raw))
}

fn main() -> Result<()> {
  let cli = Cli::parse();

  tracing_subscriber::fmt()
    .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
    .with_writer(io::stderr)
    .init();

  let settings = load_settings(cli.data_dir, cli.checkpointing, |name| {
    std::env::var(name).ok()
  })?;

  let rt = tokio::runtime::Runtime::new()?;
  match cli.command {
    Some(Commands::Result { action }) => rt.block_on(run_result(action, settings)),
    Some(Commands::Checkpoint {
      flow_file,
      task,
      run,
    }) => rt.block_on(run_checkpoint(flow_file, task, run, settings)),
    Some(Commands::History { task, flow_run_id }) => {
      rt.block_on(run_history(task, flow_run_id, settings))
    }
    Some(Commands::Files { action }) => rt.block_on(run_files(action)),
    None => {
      println!("cairn - use --help to see available commands");
      Ok(())
    }
  }
}

/// Settings from `lookup` (the environment), with CLI flags taking precedence.
fn load_settings(
  data_dir: Option<PathBuf>,
  checkpointing: bool,
  lookup: impl Fn(&str) -> Option<String>,
) -> Result<Settings> {
  let settings = Settings::from_vars(|name| match &data_dir {
    Some(dir) if name == HOME_ENV => Some(dir.display().to_string()),
    _ => lookup(name),
  })
  .context("failed to load settings")?;

  Ok(if checkpointing {
    settings.with_checkpointing(true)
  } else {
    settings
  })
}

fn load_result(config: &Path, factory: &ResultFactory) -> Result<TaskResult> {
  let config: ResultConfig = load_file(config)
    .with_context(|| format!("failed to load result config: {}", config.display()))?;
  Ok(factory.build(&config))
}

async fn run_result(action: ResultAction, settings: Settings) -> Result<()> {
  let factory = ResultFactory::new(settings);

  match action {
    ResultAction::Write {
      config,
      location,
      run,
    } => {
      let mut result = load_result(&config, &factory)?;
      if let Some(location) = location {
        result = result.with_location(location);
      }

      let value = read_value_from_stdin()?;
      let written = result
        .write(value, &run.context())
        .await
        .context("failed to write result")?;

      println!("{}", serde_json::to_string_pretty(&written.record())?);
    }
    ResultAction::Read { config, location } => {
      let result = load_result(&config, &factory)?;
      let read = result
        .read(&location)
        .await
        .with_context(|| format!("failed to read result at '{}'", location))?;

      println!("{}", serde_json::to_string_pretty(read.value())?);
    }
    ResultAction::Exists {
      config,
      location,
      run,
    } => {
      let result = load_result(&config, &factory)?;
      let exists = result
        .exists(&location, &run.context())
        .await
        .context("failed to check result location")?;

      println!("{}", exists);
    }
  }

  Ok(())
}

async fn run_checkpoint(
  flow_file: PathBuf,
  task_name: String,
  run: RunArgs,
  settings: Settings,
) -> Result<()> {
  let flow = FlowDef::from_file(&flow_file)
    .with_context(|| format!("failed to load flow file: {}", flow_file.display()))?;
  let task = flow.task(&task_name)?;

  eprintln!("Loaded flow: {} (task: {})", flow.name, task.name);

  let store = open_store(&settings).await?;
  let checkpointer = Checkpointer::new(settings).with_store(store);

  let mut ctx = run.context();
  if ctx.flow_run_id.is_none() {
    ctx.flow_run_id = Some(uuid::Uuid::new_v4().to_string());
  }

  if let Some(cached) = checkpointer
    .cached(&flow, task, &ctx)
    .await
    .context("failed to check task target")?
  {
    eprintln!("Target exists, using cached result");
    println!("{}", serde_json::to_string_pretty(&outcome_json(&cached))?);
    return Ok(());
  }

  let value = read_value_from_stdin()?;
  let outcome = checkpointer
    .checkpoint(&flow, task, value, &ctx)
    .await
    .context("checkpoint failed")?;

  println!("{}", serde_json::to_string_pretty(&outcome_json(&outcome))?);

  Ok(())
}

fn outcome_json(outcome: &CheckpointOutcome) -> serde_json::Value {
  match outcome {
    CheckpointOutcome::Persisted { result, source } => json!({
      "state": "persisted",
      "source": source,
      "result": result.record(),
    }),
    CheckpointOutcome::Cached { result } => json!({
      "state": "cached",
      "result": result.record(),
      "value": result.value(),
    }),
    CheckpointOutcome::Skipped { reason, .. } => json!({
      "state": "skipped",
      "reason": reason,
    }),
  }
}

async fn run_history(
  task: Option<String>,
  flow_run_id: Option<String>,
  settings: Settings,
) -> Result<()> {
  let store = open_store(&settings).await?;
  let records = match (task, flow_run_id) {
    (Some(task), _) => store.list_for_task(&task).await?,
    (None, Some(flow_run_id)) => store.list_for_flow_run(&flow_run_id).await?,
    (None, None) => Vec::new(),
  };

  println!("{}", serde_json::to_string_pretty(&records)?);
  Ok(())
}

async fn run_files(action: FilesAction) -> Result<()> {
  match action {
    FilesAction::Move { source, target } => {
      let path = Move::new(source, target).run(None, None).await?;
      println!("{}", path.display());
    }
    FilesAction::Copy { source, target } => {
      let path = Copy::new(source, target).run(None, None).await?;
      println!("{}", path.display());
    }
    FilesAction::Remove { path } => {
      Remove::new(path).run(None).await?;
    }
  }
  Ok(())
}

async fn open_store(settings: &Settings) -> Result<Arc<SqliteStore>> {
  tokio::fs::create_dir_all(&settings.home_dir)
    .await
    .with_context(|| format!("failed to create {}", settings.home_dir.display()))?;

  let store = SqliteStore::open(&settings.database_path)
    .await
    .context("failed to open tracking database")?;
  store
    .migrate()
    .await
    .context("failed to migrate tracking database")?;
  Ok(Arc::new(store))
}

/// Read the task's output from stdin. Nothing on stdin means NoResult.
fn read_value_from_stdin() -> Result<ResultValue> {
  use std::io::IsTerminal;

  if io::stdin().is_terminal() {
    return Ok(ResultValue::NoResult);
  }

  let mut input = String::new();
  io::stdin()
    .read_to_string(&mut input)
    .context("failed to read value from stdin")?;

  if input.trim().is_empty() {
    Ok(ResultValue::NoResult)
  } else {
    let value: serde_json::Value =
      serde_json::from_str(&input).context("failed to parse value JSON from stdin")?;
    Ok(ResultValue::Value(value))
  }
}
