use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Context;
use clap::{ArgAction, Parser, Subcommand, ValueEnum};
use eks_lifecycle_core::{CancellationToken, ConfigError, LifecycleConfig};
use eks_lifecycle_service::{
    LifecycleError, LifecycleService, ResourceKind, ResourceRef, Transition,
};
use log::{info, warn};

/// Exit code for arguments, IDs or config files that cannot be used.
const EXIT_USAGE: u8 = 2;

#[derive(Parser, Debug)]
#[command(name = "eks-lifecycle", author, version, about, long_about = None)]
struct Cli {
    /// Increase log verbosity (-v info, -vv debug, -vvv trace). RUST_LOG takes precedence.
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    /// TOML file with poll interval, retry and timeout settings
    #[arg(long, env = "EKS_LIFECYCLE_CONFIG", global = true)]
    config: Option<PathBuf>,

    /// AWS region
    #[arg(long, env = "AWS_REGION", global = true)]
    region: Option<String>,

    /// AWS shared config profile
    #[arg(long, env = "AWS_PROFILE", global = true)]
    profile: Option<String>,

    /// Override the poll interval, in seconds
    #[arg(long, global = true)]
    poll_interval: Option<u64>,

    /// Override the create, update and delete timeouts, in seconds
    #[arg(long, global = true)]
    timeout: Option<u64>,

    /// Print the outcome as a JSON object
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Wait for a resource to finish a transition without changing it
    Wait {
        #[arg(value_enum)]
        kind: Kind,

        /// Resource ID, e.g. CLUSTER_NAME:ADDON_NAME
        id: String,

        /// Transition to wait for. Update waits take the update ID as the last ID part.
        #[arg(long = "for", value_enum, default_value_t = For::Created)]
        transition: For,
    },
    /// Delete a resource and wait until it is gone
    Delete {
        #[arg(value_enum)]
        kind: Kind,

        /// Resource ID, e.g. CLUSTER_NAME:NODE_GROUP_NAME
        id: String,
    },
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum Kind {
    Cluster,
    Addon,
    Capability,
    NodeGroup,
    FargateProfile,
    IdentityProviderConfig,
    AccessEntry,
    AccessPolicyAssociation,
}

impl From<Kind> for ResourceKind {
    fn from(kind: Kind) -> Self {
        match kind {
            Kind::Cluster => Self::Cluster,
            Kind::Addon => Self::Addon,
            Kind::Capability => Self::Capability,
            Kind::NodeGroup => Self::NodeGroup,
            Kind::FargateProfile => Self::FargateProfile,
            Kind::IdentityProviderConfig => Self::IdentityProviderConfig,
            Kind::AccessEntry => Self::AccessEntry,
            Kind::AccessPolicyAssociation => Self::AccessPolicyAssociation,
        }
    }
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum For {
    Created,
    Updated,
    Deleted,
}

impl From<For> for Transition {
    fn from(value: For) -> Self {
        match value {
            For::Created => Self::Created,
            For::Updated => Self::Updated,
            For::Deleted => Self::Deleted,
        }
    }
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .format_timestamp_secs()
        .init();
}

fn exit_code(err: &anyhow::Error) -> u8 {
    if let Some(err) = err.downcast_ref::<LifecycleError>() {
        return if err.is_usage() || matches!(err, LifecycleError::Config(_)) {
            EXIT_USAGE
        } else {
            1
        };
    }
    if err.downcast_ref::<ConfigError>().is_some() {
        return EXIT_USAGE;
    }
    1
}

async fn load_config(cli: &Cli) -> anyhow::Result<LifecycleConfig> {
    let mut config = LifecycleConfig::load(cli.config.as_deref()).await?;
    if let Some(secs) = cli.poll_interval {
        config.poll_interval_secs = secs;
    }
    if let Some(secs) = cli.timeout {
        config.timeouts.create_secs = secs;
        config.timeouts.update_secs = secs;
        config.timeouts.delete_secs = secs;
    }
    config.validate()?;
    Ok(config)
}

fn report(json: bool, kind: ResourceKind, resource: &ResourceRef, status: &str) {
    if json {
        let outcome = serde_json::json!({
            "kind": kind.display_name(),
            "id": resource.to_string(),
            "status": status,
        });
        println!("{outcome}");
    } else {
        println!("{resource}\t{status}");
    }
}

/// Cancel `token` on the first Ctrl-C.
fn cancel_on_ctrl_c(token: CancellationToken) {
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("interrupted, cancelling");
            token.cancel();
        }
    });
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    // IDs are validated before any AWS configuration is resolved.
    let (kind, id, transition) = match &cli.command {
        Commands::Wait {
            kind,
            id,
            transition,
        } => (ResourceKind::from(*kind), id, Transition::from(*transition)),
        Commands::Delete { kind, id } => (ResourceKind::from(*kind), id, Transition::Deleted),
    };
    let resource = kind.parse(id, transition)?;
    let config = load_config(&cli).await?;

    let service = LifecycleService::new(config, cli.region.clone(), cli.profile.clone()).await?;
    let cancel = CancellationToken::new();
    cancel_on_ctrl_c(cancel.clone());

    match cli.command {
        Commands::Wait { .. } => {
            let snapshot = service
                .wait_for(&resource, transition, &cancel)
                .await
                .with_context(|| format!("{} ({resource}) was not {transition}", kind.display_name()))?;
            let status = snapshot
                .as_ref()
                .and_then(|s| s.status())
                .unwrap_or("gone");
            info!("{} ({resource}) {transition}", kind.display_name());
            report(cli.json, kind, &resource, status);
        }
        Commands::Delete { .. } => {
            service.delete(&resource, &cancel).await?;
            report(cli.json, kind, &resource, "deleted");
        }
    }
    Ok(())
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("Error: {err:#}");
            ExitCode::from(exit_code(&err))
        }
    }
}
