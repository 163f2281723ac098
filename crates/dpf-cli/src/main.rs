use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use dpf_audit::{JsonlAuditLogger, VerifyResult};
use dpf_config::{LoadedConfig, ReconcilerConfig, UnusedKeyPolicy};
use dpf_reconcile::{
    AuditLogger, FormatReconciler, HostResult, ReconcileError, WorkFormatsAccessor, WorkRef,
};
use dpf_store::JsonWorkStore;
use std::path::PathBuf;
use tracing::{info, warn};

/// Store path used when `--store` is omitted.
const ENV_STORE: &str = "DPF_STORE";

#[derive(Parser)]
#[command(name = "dpf")]
#[command(about = "Default publication format reconciler", long_about = None)]
struct Cli {
    #[command(subcommand)]
    cmd: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create missing catalog formats on a work and re-sequence existing ones
    Reconcile {
        #[command(flatten)]
        target: TargetArgs,
    },

    /// Delete the formats a previous reconcile created (per the work's marker)
    RemoveAuto {
        #[command(flatten)]
        target: TargetArgs,
    },

    /// Print the effective catalog in policy order
    Catalog {
        #[command(flatten)]
        config: ConfigArgs,
    },

    /// Compute layered config hash + print canonical JSON
    ConfigHash {
        /// Paths in merge order (base -> env -> overrides...)
        #[arg(required = true)]
        paths: Vec<String>,
    },

    /// Audit trail utilities
    Audit {
        #[command(subcommand)]
        cmd: AuditCmd,
    },
}

#[derive(clap::Args)]
struct TargetArgs {
    /// Work store JSON file (falls back to $DPF_STORE)
    #[arg(long)]
    store: Option<PathBuf>,

    /// Work id
    #[arg(long)]
    work: String,

    #[command(flatten)]
    config: ConfigArgs,
}

#[derive(clap::Args)]
struct ConfigArgs {
    /// Layered config paths in merge order
    #[arg(long = "config")]
    config_paths: Vec<String>,

    /// Fail instead of warn when the config carries keys nothing reads
    #[arg(long, default_value_t = false)]
    strict_config: bool,
}

#[derive(Subcommand)]
enum AuditCmd {
    /// Verify the hash chain of an audit JSONL file
    Verify {
        /// Path to the audit JSONL file
        path: PathBuf,
    },
}

fn main() -> Result<()> {
    // dev-time bootstrap; absence is fine
    let _ = dotenvy::from_filename(".env.local");
    init_tracing();

    let cli = Cli::parse();

    match cli.cmd {
        Commands::Reconcile { target } => {
            let (cfg, loaded) = load_config(&target.config)?;
            let store = open_store(target.store)?;
            let audit = AuditSink::open(&cfg, &store)?;
            let rec = FormatReconciler::new(&store, &store, &store, &audit, cfg.settings.clone());

            info!(
                work_id = %target.work,
                config_hash = %loaded.config_hash,
                formats = cfg.catalog.len(),
                "reconcile requested"
            );
            let outcome = rec.reconcile_by_id(&cfg.catalog, &target.work);

            save_if_touched(&store, &outcome)?;
            let result = outcome.with_context(|| format!("reconcile work '{}'", target.work))?;
            println!("{}", serde_json::to_string_pretty(&result)?);
        }

        Commands::RemoveAuto { target } => {
            let (cfg, _) = load_config(&target.config)?;
            let store = open_store(target.store)?;
            let audit = AuditSink::open(&cfg, &store)?;
            let work = find_work(&store, &target.work)?;
            let rec = FormatReconciler::new(&store, &store, &store, &audit, cfg.settings.clone());

            let outcome = rec.remove_auto_created(&store, &work);
            save_if_touched(&store, &outcome)?;
            let result = outcome
                .with_context(|| format!("remove auto-created formats of work '{}'", target.work))?;
            println!("{}", serde_json::to_string_pretty(&result)?);
        }

        Commands::Catalog { config } => {
            let (cfg, _) = load_config(&config)?;
            let ordered = cfg.catalog.ordered(cfg.settings.order);
            println!("order={}", cfg.settings.order.as_str());
            println!("{}", serde_json::to_string_pretty(&ordered)?);
        }

        Commands::ConfigHash { paths } => {
            let path_refs: Vec<&str> = paths.iter().map(|s| s.as_str()).collect();
            let loaded = dpf_config::load_layered_yaml(&path_refs)?;
            println!("config_hash={}", loaded.config_hash);
            println!("{}", loaded.canonical_json);
        }

        Commands::Audit { cmd } => match cmd {
            AuditCmd::Verify { path } => match dpf_audit::verify_hash_chain(&path)? {
                VerifyResult::Valid { lines } => {
                    println!("audit_valid=true lines={} path={}", lines, path.display());
                }
                VerifyResult::Broken { line, reason } => {
                    println!("audit_valid=false line={} path={}", line, path.display());
                    bail!("audit chain broken at line {line}: {reason}");
                }
            },
        },
    }

    Ok(())
}

fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()),
        )
        .with_writer(std::io::stderr)
        .init();
}

fn load_config(args: &ConfigArgs) -> Result<(ReconcilerConfig, LoadedConfig)> {
    let path_refs: Vec<&str> = args.config_paths.iter().map(|s| s.as_str()).collect();
    let loaded = dpf_config::load_layered_yaml(&path_refs)?;

    let policy = if args.strict_config {
        UnusedKeyPolicy::Fail
    } else {
        UnusedKeyPolicy::Warn
    };
    let report = dpf_config::report_unused_keys(&loaded.config_json, policy)?;
    if !report.is_clean() {
        warn!(keys = ?report.unused_leaf_pointers, "config keys not read by dpf");
    }

    let cfg = ReconcilerConfig::from_config_json(&loaded.config_json)?;
    Ok((cfg, loaded))
}

fn open_store(arg: Option<PathBuf>) -> Result<JsonWorkStore> {
    let path = arg
        .or_else(|| std::env::var_os(ENV_STORE).map(PathBuf::from))
        .with_context(|| format!("no work store given (use --store or set {ENV_STORE})"))?;
    JsonWorkStore::open(path)
}

/// Persist the store unless the run failed before its first write.
///
/// A `Persistence` failure can follow completed creates or deletes, which are
/// kept as a database would keep them.
fn save_if_touched<T>(store: &JsonWorkStore, outcome: &Result<T, ReconcileError>) -> Result<()> {
    match outcome {
        Err(e) if !e.is_persistence() => Ok(()),
        _ => store.save(),
    }
}

fn find_work(store: &JsonWorkStore, work_id: &str) -> Result<WorkRef> {
    match store.find_work(work_id) {
        Ok(Some(work)) => Ok(work),
        Ok(None) => bail!("work '{work_id}' not found"),
        Err(e) => Err(anyhow::anyhow!(e).context("look up work")),
    }
}

/// Where format events go: the configured JSONL chain, or the store's
/// tracing-only logger when no audit path is set.
enum AuditSink<'a> {
    Jsonl(JsonlAuditLogger),
    Trace(&'a JsonWorkStore),
}

impl<'a> AuditSink<'a> {
    fn open(cfg: &ReconcilerConfig, store: &'a JsonWorkStore) -> Result<Self> {
        match &cfg.audit.path {
            Some(path) => {
                let logger = JsonlAuditLogger::open(path, cfg.audit.hash_chain)
                    .with_context(|| format!("open audit log: {}", path.display()))?;
                Ok(AuditSink::Jsonl(logger))
            }
            None => Ok(AuditSink::Trace(store)),
        }
    }
}

impl AuditLogger for AuditSink<'_> {
    fn log_format_created(&self, work: &WorkRef, format_name: &str) -> HostResult<()> {
        match self {
            AuditSink::Jsonl(l) => l.log_format_created(work, format_name),
            AuditSink::Trace(s) => s.log_format_created(work, format_name),
        }
    }

    fn log_format_removed(&self, work: &WorkRef, format_name: &str) -> HostResult<()> {
        match self {
            AuditSink::Jsonl(l) => l.log_format_removed(work, format_name),
            AuditSink::Trace(s) => s.log_format_removed(work, format_name),
        }
    }
}
