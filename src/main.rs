use std::io;
use std::path::PathBuf;
use std::sync::atomic::Ordering;

use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use clap_verbosity_flag::{InfoLevel, Verbosity};
use log::{error, info, warn};
use signal_hook::consts::{SIGINT, SIGTERM};

use pathmtu::adjust::AdjustmentPolicy;
use pathmtu::config::{DiscoveryConfig, IpVersion, ManualOverride};
use pathmtu::constants::{MAX_STEP, REQUIRED_TOOLS};
use pathmtu::engine::{Apply, MtuSearchEngine, RunReport};
use pathmtu::error::MtuError;
use pathmtu::iface::{normalize_name, InterfaceEnumerator, SystemInterfaceEnumerator};
use pathmtu::interrupt;
use pathmtu::persist::{DryRunGateway, PersistenceGateway, SystemGateway};
use pathmtu::probe::ping::PingTransport;
use pathmtu::prompt::{self, ParamFlags};
use pathmtu::store::{default_state_path, ConfigStore, JsonFileStore};
use pathmtu::tools;


#[derive(Parser)]
#[command(name = "pathmtu", version, about = "Find the largest MTU each interface's path carries and apply it")]
struct Cli {
    #[command(flatten)]
    verbose: Verbosity<InfoLevel>,

    #[command(subcommand)]
    command: Option<Commands>,

    #[command(flatten)]
    discovery: DiscoveryArgs,

    /// Where run parameters and the manual override are kept
    #[arg(long, global = true)]
    state_file: Option<PathBuf>,

    /// Also write the MTU into netplan / ifupdown configuration
    #[arg(long, global = true)]
    persist: bool,

    /// Only log what would be changed
    #[arg(long, global = true)]
    dry_run: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Show the interfaces discovery would probe
    List,
    /// Set an exact MTU on one interface and exclude it from discovery
    Manual {
        interface: String,
        #[arg(value_parser = clap::value_parser!(u32).range(68..=65535))]
        mtu: u32,
    },
    /// Let discovery handle the manually configured interface again
    ClearOverride,
}

#[derive(Args)]
struct DiscoveryArgs {
    /// Reuse the parameters of the last interactive run instead of prompting
    #[arg(short = 'y', long)]
    unattended: bool,

    /// IP version to probe with: 4 or 6
    #[arg(short, long, value_parser = parse_ip_version)]
    protocol: Option<IpVersion>,

    /// Destination to probe
    #[arg(short, long)]
    target: Option<String>,

    /// Decrement between candidate MTUs
    #[arg(short, long, value_parser = clap::value_parser!(u32).range(1..=MAX_STEP as i64))]
    step: Option<u32>,

    #[arg(long)]
    min_mtu: Option<u32>,

    #[arg(long)]
    max_mtu: Option<u32>,

    /// Bytes taken off the MTU of non-physical interfaces
    #[arg(long)]
    correction: Option<u32>,

    /// Bytes taken off every discovered MTU
    #[arg(long)]
    safety_margin: Option<u32>,

    /// Interfaces that get no correction (trailing '*' for a prefix). Replaces the defaults.
    #[arg(long = "physical", value_name = "PATTERN")]
    physical_patterns: Vec<String>,

    /// Interface name prefixes never probed. Replaces the defaults.
    #[arg(long = "reserved-prefix", value_name = "PREFIX")]
    reserved_prefixes: Vec<String>,

    /// Per-probe timeout in seconds
    #[arg(long)]
    timeout: Option<u32>,

    /// Send each interface's probes through that interface (ping -I)
    #[arg(long)]
    bind_interface: bool,

    /// Set the interface MTU to the upper bound before probing
    #[arg(long)]
    raise_first: bool,
}

fn parse_ip_version(s: &str) -> Result<IpVersion, String> {
    match s {
        "4" => Ok(IpVersion::V4),
        "6" => Ok(IpVersion::V6),
        _ => Err(format!("expected 4 or 6, got {s}")),
    }
}

impl DiscoveryArgs {
    fn to_config(&self, persist: bool) -> DiscoveryConfig {
        let mut config = DiscoveryConfig {
            persist,
            raise_before_probe: self.raise_first,
            ..Default::default()
        };
        if let Some(x) = self.min_mtu { config.min_mtu = x; }
        if let Some(x) = self.max_mtu { config.max_mtu = x; }
        if let Some(x) = self.step { config.step = x; }
        if let Some(x) = self.correction { config.correction = x; }
        if let Some(x) = self.safety_margin { config.safety_margin = x; }
        if let Some(x) = self.timeout { config.probe_timeout_secs = x; }
        if !self.physical_patterns.is_empty() {
            config.physical_patterns = self.physical_patterns.clone();
        }
        if !self.reserved_prefixes.is_empty() {
            config.reserved_prefixes = self.reserved_prefixes.clone();
        }
        config
    }

    fn param_flags(&self) -> ParamFlags {
        ParamFlags {
            unattended: self.unattended,
            protocol: self.protocol,
            target: self.target.clone(),
            step: self.step,
        }
    }
}

fn gateway(dry_run: bool) -> Box<dyn PersistenceGateway> {
    if dry_run {
        Box::new(DryRunGateway::default())
    } else {
        Box::new(SystemGateway::default())
    }
}

fn print_summary(report: &RunReport) {
    println!("\n{:<16} {:>8} {:>8}  STATUS", "INTERFACE", "FOUND", "APPLIED");
    for iface in &report.interfaces {
        let fmt_mtu = |mtu: Option<u32>| mtu.map_or("-".to_string(), |x| x.to_string());
        let (found, applied) = match &iface.outcome {
            Some(outcome) => (fmt_mtu(outcome.raw_mtu), fmt_mtu(outcome.applied_mtu)),
            None => ("-".into(), "-".into()),
        };
        println!("{:<16} {:>8} {:>8}  {}", iface.interface, found, applied, iface.status);
    }
}

fn discover(cli: &Cli, store: &mut JsonFileStore) -> Result<()> {
    tools::check_requirements(REQUIRED_TOOLS)?;

    let args = &cli.discovery;
    let params = prompt::resolve_params(&args.param_flags(), &*store,
                                        &mut io::stdin().lock(), &mut io::stdout())?;
    let config = DiscoveryConfig {
        step: params.step,
        ..args.to_config(cli.persist)
    };
    let overrides: Vec<ManualOverride> = store.load_override()?.into_iter().collect();

    let interrupted = interrupt::register(&[SIGINT, SIGTERM])?;

    let enumerator = SystemInterfaceEnumerator::new(config.reserved_prefixes.clone());
    let engine = MtuSearchEngine::new(PingTransport::new(args.bind_interface), config)
        .with_interrupt_flag(interrupted.clone());
    let mut gateway = gateway(cli.dry_run);

    let report = loop {
        match engine.run(&enumerator, &overrides, &mut gateway, params.ip_version, &params.target) {
            Ok(report) => break report,
            Err(MtuError::Interrupted) if !args.unattended => {
                warn!("Interrupted, MTUs already set stay in place (Ctrl-C again to quit)");
                let retry = prompt::confirm(&mut io::stdin().lock(), &mut io::stdout(), "Retry?")?;
                if !retry {
                    return Err(MtuError::Interrupted.into());
                }
                interrupted.store(false, Ordering::SeqCst);
            },
            Err(e) => return Err(e.into()),
        }
    };
    print_summary(&report);

    if !args.unattended {
        store.save_params(&params)?;
        info!("Saved parameters to {} for unattended runs", store.path().display());
    }
    Ok(())
}

fn manual(cli: &Cli, interface: &str, mtu: u32, store: &mut JsonFileStore) -> Result<()> {
    if !cli.dry_run {
        tools::check_requirements(&["ip"])?;
    }
    let apply = Apply { interface: normalize_name(interface).to_string(), mtu };
    let mut gateway = gateway(cli.dry_run);

    gateway.apply_live(&apply)?;
    info!("MTU successfully set to {} on {}", apply.mtu, apply.interface);
    if cli.persist {
        if let Err(e) = gateway.persist(&apply) {
            error!("{e}");
        }
    }

    store.save_override(&ManualOverride { interface: apply.interface.clone(), mtu })?;
    info!("Discovery will skip {} until the override is cleared", apply.interface);
    Ok(())
}

fn list(cli: &Cli, store: &JsonFileStore) -> Result<()> {
    let config = cli.discovery.to_config(cli.persist);
    let policy = AdjustmentPolicy::from_config(&config);
    let manual = store.load_override()?;

    let interfaces = SystemInterfaceEnumerator::new(config.reserved_prefixes.clone()).list()?;
    if interfaces.is_empty() {
        return Err(MtuError::NoInterfacesFound.into());
    }
    for iface in interfaces {
        let class = if policy.is_physical(&iface) { "physical" } else { "corrected" };
        let kind = if iface.is_virtual { "virtual" } else { "device" };
        let addresses: Vec<&str> = iface.addresses.iter().map(|x| x.as_str()).collect();
        let note = match &manual {
            Some(m) if m.interface == iface.name => format!("  [manual MTU {}]", m.mtu),
            _ => String::new(),
        };
        println!("{:<16} {:<9} {:<7} {}{}", iface.name, class, kind, addresses.join(","), note);
    }
    Ok(())
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    simple_logger::SimpleLogger::new()
        .with_level(cli.verbose.log_level_filter())
        .without_timestamps()
        .init()?;

    let mut store = JsonFileStore::new(cli.state_file.clone().unwrap_or_else(default_state_path));

    match &cli.command {
        Some(Commands::List) => list(&cli, &store),
        Some(Commands::Manual { interface, mtu }) => manual(&cli, interface, *mtu, &mut store),
        Some(Commands::ClearOverride) => {
            store.clear_override()?;
            info!("Manual override cleared");
            Ok(())
        },
        None => discover(&cli, &mut store),
    }
}
