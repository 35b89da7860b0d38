use anyhow::Result;
use clap::Parser;
use log::debug;
use meraki_provider::commands::{self, Services};
use meraki_provider::config::ConfigOverrides;
use meraki_provider::retry::cancellation;
use meraki_provider::runtime::RealRuntime;
use meraki_provider::state::DEFAULT_STATE_FILE;
use std::path::PathBuf;

/// meraki-provider - manage Cisco Meraki Dashboard objects
///
/// Creates, imports, refreshes and destroys Dashboard objects, tracking
/// them in a local JSON state file.
///
/// The API key is read from the MERAKI_DASHBOARD_API_KEY environment
/// variable. Writes that fail with a 4xx response are retried, since the
/// Dashboard reports concurrent modifications that way.
///
/// Examples:
///   meraki-provider import meraki_networks_appliance_vlans.voice N_123,10
///   meraki-provider apply meraki_networks_syslog_servers.main --plan syslog.json
///   meraki-provider data meraki_networks --config org.json
#[derive(Parser, Debug)]
#[command(author, version = env!("MERAKI_PROVIDER_VERSION"), about)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// State file (also via MERAKI_STATE)
    #[arg(
        long = "state",
        short = 's',
        env = "MERAKI_STATE",
        value_name = "PATH",
        default_value = DEFAULT_STATE_FILE,
        global = true
    )]
    pub state: PathBuf,

    /// Dashboard API URL (defaults to https://api.meraki.com/api/v1)
    #[arg(long = "api-url", value_name = "URL", global = true)]
    pub api_url: Option<String>,

    /// Retries for writes rejected with a 4xx status
    #[arg(long = "max-retries", value_name = "N", global = true)]
    pub max_retries: Option<u32>,

    /// Delay between retries in milliseconds
    #[arg(long = "retry-delay-ms", value_name = "MS", global = true)]
    pub retry_delay_ms: Option<u64>,

    /// Log progress (RUST_LOG takes precedence)
    #[arg(long, short = 'v', global = true)]
    pub verbose: bool,
}

impl Cli {
    fn overrides(&self) -> ConfigOverrides {
        ConfigOverrides {
            base_url: self.api_url.clone(),
            max_retries: self.max_retries,
            retry_delay_ms: self.retry_delay_ms,
            ..Default::default()
        }
    }
}

#[derive(clap::Subcommand, Debug)]
enum Commands {
    /// Create or update a resource from a JSON plan
    Apply(ApplyArgs),

    /// Re-read resources and drop those deleted outside this tool
    Refresh(AddressArgs),

    /// Import an existing Dashboard object into state
    Import(ImportArgs),

    /// Delete a resource and remove it from state
    Destroy(DestroyArgs),

    /// Print the state, or the attributes of one resource
    Show(AddressArgs),

    /// Read a data source and print the result
    Data(DataArgs),
}

#[derive(clap::Args, Debug)]
pub struct ApplyArgs {
    /// Resource address in the format "<type>.<name>"
    #[arg(value_name = "ADDRESS")]
    pub address: String,

    /// JSON file with the desired attributes
    #[arg(long, value_name = "FILE")]
    pub plan: PathBuf,
}

#[derive(clap::Args, Debug)]
pub struct AddressArgs {
    /// Limit to a single resource address
    #[arg(value_name = "ADDRESS")]
    pub address: Option<String>,
}

#[derive(clap::Args, Debug)]
pub struct ImportArgs {
    /// Resource address in the format "<type>.<name>"
    #[arg(value_name = "ADDRESS")]
    pub address: String,

    /// Comma-separated identifier, e.g. "networkId,vlanId"
    #[arg(value_name = "IMPORT_ID")]
    pub id: String,
}

#[derive(clap::Args, Debug)]
pub struct DestroyArgs {
    /// Resource address in the format "<type>.<name>"
    #[arg(value_name = "ADDRESS")]
    pub address: String,
}

#[derive(clap::Args, Debug)]
pub struct DataArgs {
    /// Data source type, e.g. "meraki_networks"
    #[arg(value_name = "TYPE")]
    pub type_name: String,

    /// JSON file with the data source configuration
    #[arg(long, value_name = "FILE")]
    pub config: PathBuf,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let default_filter = if cli.verbose { "info" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter))
        .init();

    let runtime = RealRuntime;
    let (handle, cancel) = cancellation();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            debug!("Interrupted, cancelling pending retries");
            handle.cancel();
        }
    });

    let services = || Services::load(&runtime, cli.overrides());

    match &cli.command {
        Commands::Apply(args) => {
            commands::apply(
                &runtime,
                &services()?,
                &cancel,
                &cli.state,
                &args.address,
                &args.plan,
            )
            .await?
        }
        Commands::Refresh(args) => {
            commands::refresh(
                &runtime,
                &services()?,
                &cancel,
                &cli.state,
                args.address.as_deref(),
            )
            .await?
        }
        Commands::Import(args) => {
            commands::import(
                &runtime,
                &services()?,
                &cancel,
                &cli.state,
                &args.address,
                &args.id,
            )
            .await?
        }
        Commands::Destroy(args) => {
            commands::destroy(&runtime, &services()?, &cancel, &cli.state, &args.address).await?
        }
        Commands::Show(args) => commands::show(&runtime, &cli.state, args.address.as_deref())?,
        Commands::Data(args) => {
            commands::data(
                &runtime,
                &services()?,
                &cancel,
                &args.type_name,
                &args.config,
            )
            .await?
        }
    }
    Ok(())
}
