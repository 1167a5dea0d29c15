use anyhow::{Context, Result};
use clap::Parser;
use tokio::io::AsyncReadExt;
use tracing::info;
use tracing_subscriber::EnvFilter;

use truenas_zfs::{DatasetReconciler, DesiredState, Midclt, Report, ResourceKind, SystemInfo};

#[derive(Parser)]
#[command(name = "truenas-zfs")]
#[command(about = "Reconcile a TrueNAS dataset or volume with a desired state")]
struct Args {
    /// Kind of resource the desired state describes
    #[arg(short, long, value_enum, default_value = "filesystem")]
    kind: ResourceKind,

    /// Desired state as a JSON file ("-" reads stdin)
    #[arg(short, long, default_value = "-")]
    desired: String,

    /// Report what would change without applying it
    #[arg(long)]
    check: bool,

    /// Path to the midclt binary
    #[arg(long, default_value = "midclt")]
    midclt: String,
}

async fn read_desired(path: &str) -> Result<DesiredState> {
    let input = if path == "-" {
        let mut buf = String::new();
        tokio::io::stdin()
            .read_to_string(&mut buf)
            .await
            .context("Failed to read desired state from stdin")?;
        buf
    } else {
        tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("Failed to read desired state from {}", path))?
    };
    serde_json::from_str(&input).context("Failed to parse desired state")
}

async fn run(args: &Args) -> Result<Report> {
    let mut desired = read_desired(&args.desired).await?;
    desired.dry_run |= args.check;

    let midclt = Midclt::new(args.midclt.clone());
    let system = SystemInfo::detect(&midclt)
        .await
        .context("Failed to get TrueNAS version")?;
    info!(
        product = %system.product_label(),
        version = %system.version,
        "Connected to middleware"
    );

    let reconciler = DatasetReconciler::new(&midclt, &system, args.kind);
    Ok(Report::from(reconciler.reconcile(&desired).await))
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("truenas_zfs=info".parse()?))
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    let report = run(&args).await.unwrap_or_else(|e| Report::Failed {
        failed: true,
        message: format!("{:#}", e),
    });
    println!("{}", serde_json::to_string_pretty(&report)?);

    if report.is_failed() {
        std::process::exit(1);
    }
    Ok(())
}
