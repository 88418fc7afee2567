//! Print one report (or all of them) for a data file without starting the server.
//!
//! Usage: `report_dump [report-slug|all] [data-path]`

use insight_reports::{DashboardConfig, JsonFileStore, ReportKind, ReportService};
use std::sync::Arc;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();
    tracing_subscriber::fmt().with_target(false).init();

    let mut args = std::env::args().skip(1);
    let which = args.next().unwrap_or_else(|| "all".to_string());
    let path = match args.next() {
        Some(p) => p.into(),
        None => DashboardConfig::load()?.data_path,
    };

    let kinds: Vec<ReportKind> = if which == "all" {
        ReportKind::ALL.to_vec()
    } else {
        let kind = ReportKind::from_slug(&which).ok_or_else(|| {
            let known: Vec<_> = ReportKind::ALL.iter().map(|k| k.slug()).collect();
            anyhow::anyhow!("unknown report '{which}' (known: {})", known.join(", "))
        })?;
        vec![kind]
    };

    let svc = ReportService::new(Arc::new(JsonFileStore::new(path)));
    for kind in kinds {
        let out = svc.run(kind).await?;
        println!("{kind}: {}", serde_json::to_string_pretty(&out)?);
    }
    Ok(())
}
