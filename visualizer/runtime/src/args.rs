use crate::{
    analyzer::Analyzer,
    core::{ResourceId, WorkloadKind},
    source::{ClusterSource, Snapshot, Source},
};
use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use std::{io::Write, path::PathBuf};
use tracing::{debug, info};

#[derive(Debug, Parser)]
#[clap(
    name = "netpol-visualizer",
    about = "Analyzes reachability between workloads under Kubernetes NetworkPolicies"
)]
pub struct Args {
    #[clap(
        long,
        default_value = "netpol_visualizer=info,warn",
        env = "NETPOL_VISUALIZER_LOG"
    )]
    log_level: kubert::LogFilter,

    #[clap(long, default_value = "plain")]
    log_format: kubert::LogFormat,

    #[clap(flatten)]
    client: kubert::ClientArgs,

    /// The kind of workload to analyze: `pod` or `deployment`.
    #[clap(
        long,
        default_value = "deployment",
        env = "NETPOL_VISUALIZER_RESOURCE_TYPE"
    )]
    resource_type: WorkloadKind,

    /// A JSON list of NetworkPolicies, e.g. from `kubectl get netpol -A -o json`.
    #[clap(long, requires = "workloads", conflicts_with = "from_cluster")]
    policies: Option<PathBuf>,

    /// A JSON list of pods or deployments, matching `--resource-type`.
    #[clap(long, requires = "policies", conflicts_with = "from_cluster")]
    workloads: Option<PathBuf>,

    /// Lists resources from the Kubernetes API server instead of reading
    /// files.
    #[clap(long)]
    from_cluster: bool,

    /// Pretty-prints JSON output.
    #[clap(long)]
    pretty: bool,

    #[clap(subcommand)]
    command: Command,
}

#[derive(Clone, Debug, PartialEq, Eq, Subcommand)]
enum Command {
    /// Prints the reachability graph.
    Graph,

    /// Prints every workload's allowed and blocked peers.
    Analyze,

    /// Checks whether one workload may send traffic to another.
    Check {
        #[clap(long)]
        source: ResourceId,

        #[clap(long)]
        target: ResourceId,
    },

    /// Prints the rules of a NetworkPolicy.
    Policy { name: String },

    /// Prints a workload's labels and status.
    Resource { id: ResourceId },

    /// Lists namespaces.
    Namespaces,
}

impl Args {
    #[inline]
    pub async fn parse_and_run() -> Result<()> {
        Self::parse().run().await
    }

    pub async fn run(self) -> Result<()> {
        let Self {
            log_level,
            log_format,
            client,
            resource_type,
            policies,
            workloads,
            from_cluster,
            pretty,
            command,
        } = self;

        log_format.try_init(log_level)?;

        let output = match (policies, workloads) {
            (Some(policies), Some(workloads)) => {
                debug!(policies = %policies.display(), workloads = %workloads.display(), "Reading documents");
                let snapshot = Snapshot::from_files(&policies, &workloads).await?;
                command.execute(&Analyzer::new(snapshot), resource_type).await?
            }
            _ if from_cluster => {
                let client = client
                    .try_client()
                    .await
                    .context("failed to connect to the Kubernetes API")?;
                let source = ClusterSource::new(client);
                command.execute(&Analyzer::new(source), resource_type).await?
            }
            _ => bail!("either --policies and --workloads, or --from-cluster, must be set"),
        };

        let mut stdout = std::io::stdout().lock();
        if pretty {
            serde_json::to_writer_pretty(&mut stdout, &output)?;
        } else {
            serde_json::to_writer(&mut stdout, &output)?;
        }
        writeln!(stdout)?;
        Ok(())
    }
}

// === impl Command ===

impl Command {
    async fn execute<S: Source>(
        self,
        analyzer: &Analyzer<S>,
        kind: WorkloadKind,
    ) -> Result<serde_json::Value> {
        info!(command = ?self, %kind, "Running");
        let value = match self {
            Self::Graph => serde_json::to_value(&*analyzer.graph(kind).await?)?,
            Self::Analyze => serde_json::to_value(analyzer.communication_map(kind).await?)?,
            Self::Check { source, target } => {
                serde_json::to_value(analyzer.check(kind, &source, &target).await?)?
            }
            Self::Policy { name } => serde_json::to_value(analyzer.policy_details(&name).await?)?,
            Self::Resource { id } => {
                serde_json::to_value(analyzer.resource_details(kind, &id).await?)?
            }
            Self::Namespaces => {
                serde_json::json!({ "namespaces": analyzer.namespaces().await? })
            }
        };
        Ok(value)
    }
}
