use std::path::PathBuf;
use std::str::FromStr;

use anyhow::Result;
use clap::{Parser, Subcommand, ValueEnum};
use meshlens_core::RecordKind;
use meshlens_nav::Breadcrumb;
use meshlens_refresh::{interval_from_env, interval_label, Refresher};
use tokio::signal;
use tokio::sync::mpsc;
use tracing::{error, info, warn};

mod view;

use view::{build_view, describe_filters, describe_sorts, load_records, print_human, ViewArgs};

#[derive(Parser, Debug)]
#[command(name = "meshctl", version, about = "Filter, sort and browse service mesh inventories")]
struct Cli {
    /// Output format
    #[arg(short = 'o', long = "output", value_enum, global = true, default_value_t = Output::Human)]
    output: Output,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, ValueEnum)]
enum Output { Human, Json }

#[derive(Subcommand, Debug)]
enum Commands {
    /// Filter and sort a record file and print the resulting view
    Ls {
        /// Record kind: services, workloads, apps, istio or namespaces
        kind: RecordKind,
        /// JSON array of records
        #[arg(long = "file")]
        file: PathBuf,
        #[command(flatten)]
        view: ViewArgs,
    },
    /// List the filters available for a kind
    Filters { kind: RecordKind },
    /// List the sort fields available for a kind
    Sorts { kind: RecordKind },
    /// Derive the breadcrumb of a detail page path
    Crumb {
        /// e.g. "/namespaces/bookinfo/services/reviews"
        path: String,
        /// Query string of the page, e.g. "tab=metrics"
        #[arg(long = "query", default_value = "")]
        query: String,
    },
    /// Re-read a record file and print the view on every refresh tick until Ctrl-C
    Watch {
        kind: RecordKind,
        #[arg(long = "file")]
        file: PathBuf,
        /// Refresh interval; defaults to MESHLENS_REFRESH_MS or 15s. 0 pauses.
        #[arg(long = "interval-ms")]
        interval_ms: Option<u64>,
        #[command(flatten)]
        view: ViewArgs,
    },
}

fn init_tracing() {
    let env = std::env::var("MESHLENS_LOG").unwrap_or_else(|_| "info".to_string());
    let filter = tracing_subscriber::EnvFilter::from_str(&env).unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).with_target(true).with_writer(std::io::stderr).init();
}

fn init_metrics() {
    if let Ok(addr) = std::env::var("MESHLENS_METRICS_ADDR") {
        if let Ok(sock) = addr.parse::<std::net::SocketAddr>() {
            let builder = metrics_exporter_prometheus::PrometheusBuilder::new();
            match builder.with_http_listener(sock).install() {
                Ok(_) => tracing::info!(addr = %addr, "Prometheus metrics exporter listening"),
                Err(e) => tracing::warn!(error = %e, "failed to install metrics exporter"),
            }
        } else {
            tracing::warn!(addr = %addr, "invalid MESHLENS_METRICS_ADDR; expected host:port");
        }
    }
}

async fn print_view(kind: RecordKind, file: &std::path::Path, args: &ViewArgs, output: Output) -> Result<()> {
    let records = load_records(file)?;
    let view = build_view(kind, records, args).await?;
    match output {
        Output::Human => print_human(&view),
        Output::Json => println!("{}", serde_json::to_string_pretty(&view.rows)?),
    }
    Ok(())
}

/// One watch tick. A failed refresh is logged and counted; the loop keeps going.
async fn refresh_once(kind: RecordKind, file: &std::path::Path, args: &ViewArgs, output: Output) -> bool {
    metrics::counter!("watch_refresh_total", 1u64);
    match print_view(kind, file, args, output).await {
        Ok(()) => true,
        Err(e) => {
            metrics::counter!("watch_refresh_failures_total", 1u64);
            error!(error = ?e, "refresh failed");
            eprintln!("refresh error: {:#}", e);
            false
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();
    init_metrics();
    let cli = Cli::parse();

    match cli.command {
        Commands::Ls { kind, file, view } => {
            info!(kind = %kind, file = %file.display(), "ls invoked");
            print_view(kind, &file, &view, cli.output).await?;
        }
        Commands::Filters { kind } => {
            let rows = describe_filters(kind);
            match cli.output {
                Output::Human => {
                    println!("{:<18} {:<18} {:<7} VALUES", "ID", "TITLE", "ACTION");
                    for r in rows {
                        let action = format!("{:?}", r.action).to_lowercase();
                        let values = if r.values.is_empty() { "-".to_string() } else { r.values.join(", ") };
                        println!("{:<18} {:<18} {:<7} {}", r.id, r.title, action, values);
                    }
                }
                Output::Json => println!("{}", serde_json::to_string_pretty(&rows)?),
            }
        }
        Commands::Sorts { kind } => {
            let rows = describe_sorts(kind);
            match cli.output {
                Output::Human => {
                    println!("{:<6} {:<18} {:<22} HEALTH", "PARAM", "ID", "TITLE");
                    for r in rows {
                        let mark = if r.default { " (default)" } else { "" };
                        println!("{:<6} {:<18} {:<22} {}{}", r.param, r.id, r.title, r.needs_health, mark);
                    }
                }
                Output::Json => println!("{}", serde_json::to_string_pretty(&rows)?),
            }
        }
        Commands::Crumb { path, query } => {
            let crumb = Breadcrumb::derive(&path, &query)?;
            match cli.output {
                Output::Human => {
                    for c in crumb.crumbs() {
                        match c.link {
                            Some(link) => println!("{}  -> {}", c.label, link),
                            None => println!("{}", c.label),
                        }
                    }
                    if let Some(f) = crumb.type_filter() {
                        println!("type filter: {}={}", f.category, f.value);
                    }
                }
                Output::Json => {
                    #[derive(serde::Serialize)]
                    struct Out<'a> { breadcrumb: &'a Breadcrumb, crumbs: Vec<meshlens_nav::Crumb> }
                    println!("{}", serde_json::to_string_pretty(&Out { breadcrumb: &crumb, crumbs: crumb.crumbs() })?);
                }
            }
        }
        Commands::Watch { kind, file, interval_ms, view } => {
            let interval = interval_ms.unwrap_or_else(interval_from_env);
            info!(kind = %kind, file = %file.display(), interval_ms = interval, label = interval_label(interval).unwrap_or("custom"), "watch invoked");
            print_view(kind, &file, &view, cli.output).await?;

            let (tick_tx, mut tick_rx) = mpsc::channel::<()>(1);
            let mut refresher = Refresher::new(move || {
                // a pending tick already covers this one
                let _ = tick_tx.try_send(());
            });
            refresher.set_interval(interval);
            loop {
                tokio::select! {
                    maybe = tick_rx.recv() => {
                        if maybe.is_none() {
                            warn!("refresh channel closed; exiting watch loop");
                            break;
                        }
                        refresh_once(kind, &file, &view, cli.output).await;
                    }
                    _ = signal::ctrl_c() => {
                        info!("Ctrl-C received; shutting down watch loop");
                        break;
                    }
                }
            }
            refresher.stop();
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    // Only test in this binary that installs the global recorder.
    #[tokio::test]
    async fn watch_refresh_is_counted_and_failures_kept_apart() {
        let handle = metrics_exporter_prometheus::PrometheusBuilder::new().install_recorder().unwrap();
        let dir = std::env::temp_dir().join(format!("meshctl-watch-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let good = dir.join("services.json");
        std::fs::write(&good, "[]").unwrap();
        let missing = dir.join("missing.json");

        let args = ViewArgs::default();
        assert!(refresh_once(RecordKind::Service, &good, &args, Output::Json).await);
        assert!(!refresh_once(RecordKind::Service, &missing, &args, Output::Json).await);

        let rendered = handle.render();
        assert!(rendered.contains("watch_refresh_total 2"), "{}", rendered);
        assert!(rendered.contains("watch_refresh_failures_total 1"), "{}", rendered);
        std::fs::remove_dir_all(&dir).ok();
    }
}
