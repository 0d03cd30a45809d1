//! # TCPCTL CLI
//!
//! Command-line interface for inspecting TenantControlPlane resources.
//!
//! ## Usage
//!
//! ```bash
//! # List TenantControlPlanes with their version status
//! tcpctl list
//!
//! # Show sub-records, provisioning plan and conditions of one tenant
//! tcpctl status --namespace tenants --name alpha
//!
//! # Recompute readiness for a manifest on disk, without a cluster
//! tcpctl evaluate --file alpha.yaml
//!
//! # Recompute readiness and endpoint and commit them to the cluster
//! tcpctl refresh --namespace tenants --name alpha
//!
//! # Same, then print the commit and readiness metrics
//! tcpctl refresh --namespace tenants --name alpha --metrics
//! ```

use anyhow::{anyhow, Context, Result};
use chrono::Utc;
use clap::{Parser, Subcommand};
use kube::Client;
use tenant_control_plane::config::CommitConfig;
use tenant_control_plane::convergence::{plan, refresh, Readiness};
use tenant_control_plane::crd::TenantControlPlane;
use tenant_control_plane::observability::metrics;
use tenant_control_plane::scheme::{add_to_scheme, Format, Scheme};
use tenant_control_plane::store::{refresh_and_commit, KubeStore, TenantControlPlaneStore};

/// TenantControlPlane CLI
#[derive(Parser)]
#[command(name = "tcpctl")]
#[command(about = "Inspect and refresh TenantControlPlane resources", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Kubernetes namespace (defaults to "default", or all namespaces for list)
    #[arg(short, long, global = true)]
    namespace: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// List TenantControlPlane resources
    List,
    /// Show the observed state of a TenantControlPlane
    Status {
        /// Name of the TenantControlPlane resource
        #[arg(long)]
        name: String,
    },
    /// Evaluate a TenantControlPlane manifest offline
    Evaluate {
        /// Path to a JSON or YAML manifest
        #[arg(short, long)]
        file: std::path::PathBuf,

        /// Print the refreshed object as JSON instead of YAML
        #[arg(long)]
        json: bool,
    },
    /// Recompute derived status fields and commit them
    Refresh {
        /// Name of the TenantControlPlane resource
        #[arg(long)]
        name: String,

        /// Print commit and readiness metrics in Prometheus text format
        #[arg(long)]
        metrics: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "tenant_control_plane=info,tcpctl=info".into()),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::List => list_command(cli.namespace).await,
        Commands::Status { name } => status_command(name, cli.namespace).await,
        Commands::Evaluate { file, json } => evaluate_command(&file, json),
        Commands::Refresh { name, metrics } => {
            refresh_command(name, cli.namespace, metrics).await
        }
    }
}

async fn connect() -> Result<Client> {
    // rustls 0.23 needs a process-wide provider before the first TLS handshake
    rustls::crypto::ring::default_provider()
        .install_default()
        .map_err(|existing| anyhow!("rustls crypto provider already installed: {existing:?}"))?;

    Client::try_default()
        .await
        .context("Failed to create Kubernetes client. Ensure kubeconfig is configured.")
}

fn store(client: Client) -> (KubeStore, CommitConfig) {
    let config = CommitConfig::from_env();
    (KubeStore::new(client, config.field_manager.clone()), config)
}

async fn list_command(namespace: Option<String>) -> Result<()> {
    let (store, _) = store(connect().await?);
    let list = store
        .list(namespace.as_deref())
        .await
        .context("Failed to list TenantControlPlane resources")?;

    if list.items.is_empty() {
        println!("No TenantControlPlane resources found.");
        return Ok(());
    }

    println!(
        "{:<20} {:<25} {:<10} {:<13} {:<28} {:<25}",
        "NAMESPACE", "NAME", "VERSION", "STATUS", "ENDPOINT", "KUBECONFIG"
    );
    println!("{}", "-".repeat(124));

    for tcp in &list.items {
        let summary = tcp.summary();
        println!(
            "{:<20} {:<25} {:<10} {:<13} {:<28} {:<25}",
            summary.namespace,
            summary.name,
            summary.version,
            summary.status,
            summary.endpoint.as_deref().unwrap_or("-"),
            summary.admin_kubeconfig.as_deref().unwrap_or("-"),
        );
    }

    Ok(())
}

async fn status_command(name: String, namespace: Option<String>) -> Result<()> {
    let ns = namespace.as_deref().unwrap_or("default");
    let (store, _) = store(connect().await?);
    let tcp = store
        .get(ns, &name)
        .await
        .with_context(|| format!("Failed to get TenantControlPlane '{ns}/{name}'"))?;

    print_details(&tcp);
    Ok(())
}

fn evaluate_command(file: &std::path::Path, json: bool) -> Result<()> {
    let payload = std::fs::read_to_string(file)
        .with_context(|| format!("Failed to read {}", file.display()))?;

    let scheme = add_to_scheme(Scheme::builder()).build();
    let mut tcp: TenantControlPlane = scheme
        .decode(&payload)
        .with_context(|| format!("Failed to decode {}", file.display()))?;

    let readiness = refresh(&mut tcp, Utc::now());
    print_readiness(&readiness);
    print_details(&tcp);

    let format = if json { Format::Json } else { Format::Yaml };
    println!("\n{}", scheme.encode(&tcp, format)?);
    Ok(())
}

async fn refresh_command(name: String, namespace: Option<String>, show_metrics: bool) -> Result<()> {
    let ns = namespace.as_deref().unwrap_or("default");
    if show_metrics {
        metrics::register_metrics().context("Failed to register metrics")?;
    }
    let (store, config) = store(connect().await?);

    let (tcp, readiness) = refresh_and_commit(&store, ns, &name, &config)
        .await
        .with_context(|| format!("Failed to refresh TenantControlPlane '{ns}/{name}'"))?;

    println!("Refreshed TenantControlPlane '{ns}/{name}'");
    println!(
        "  Resource Version: {}",
        tcp.metadata.resource_version.as_deref().unwrap_or("-")
    );
    print_readiness(&readiness);

    if show_metrics {
        println!("\n{}", metrics::render().context("Failed to encode metrics")?);
    }
    Ok(())
}

fn print_readiness(readiness: &Readiness) {
    println!("Readiness: {}", readiness.status);
    if let Some(version) = readiness.running_version.as_deref() {
        println!("  Running Version: {version}");
    }
    for blocker in &readiness.blockers {
        println!("  Blocked: {blocker}");
    }
}

fn print_details(tcp: &TenantControlPlane) {
    let summary = tcp.summary();
    let status = tcp.observed();

    println!("\nMetadata:");
    println!("  Name: {}", summary.name);
    println!("  Namespace: {}", summary.namespace);
    if let Some(generation) = tcp.metadata.generation {
        println!("  Generation: {generation}");
    }

    println!("\nSpec:");
    println!("  Kubernetes Version: {}", tcp.desired_version());
    println!("  Replicas: {}", tcp.desired_replicas());
    println!(
        "  Service Type: {}",
        tcp.spec.control_plane.service.service_type
    );
    if let Some(host) = tcp.ingress_host() {
        println!("  Ingress Host: {host}");
    }
    println!(
        "  Admission Controllers: {}",
        tcp.spec.kubernetes.admission_controllers.to_flag_value()
    );

    println!("\nStatus:");
    println!("  Version Status: {}", summary.status);
    if let Some(running) = status.kubernetes_resources.version.version.as_deref() {
        println!("  Running Version: {running}");
    }
    if let Some(endpoint) = summary.endpoint.as_deref() {
        println!("  Control Plane Endpoint: {endpoint}");
    }
    let missing_certificates = status.certificates.missing();
    if !missing_certificates.is_empty() {
        println!("  Missing Certificates: {}", missing_certificates.join(", "));
    }
    let missing_kubeconfigs = status.kubeconfigs.missing();
    if !missing_kubeconfigs.is_empty() {
        println!("  Missing Kubeconfigs: {}", missing_kubeconfigs.join(", "));
    }
    if let Some(configmap) = status.bootstrap_config.configmap_name.as_deref() {
        println!("  Bootstrap ConfigMap: {configmap}");
    }

    println!("\nPlan:");
    for planned in plan(tcp) {
        println!("  {:<35} {:?}", planned.step.to_string(), planned.decision);
    }

    if !status.conditions.is_empty() {
        println!("\nConditions:");
        for condition in &status.conditions {
            println!("  {}: {}", condition.r#type, condition.status);
            if let Some(ref reason) = condition.reason {
                println!("    Reason: {reason}");
            }
            if let Some(ref message) = condition.message {
                println!("    Message: {message}");
            }
            if let Some(ref time) = condition.last_transition_time {
                println!("    Last Transition: {time}");
            }
        }
    }
}
