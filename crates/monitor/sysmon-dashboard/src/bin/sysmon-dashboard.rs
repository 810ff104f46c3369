//! Terminal dashboard binary

use sysmon_dashboard::{Command, DashboardApp, DashboardConfig};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;
use tracing_subscriber::EnvFilter;

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    // Logs go to stderr, frames to stdout
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let config = DashboardConfig::default();

    println!("System Monitor Dashboard");
    println!("========================\n");
    println!("Backend: {}", config.base_url);
    println!("Push:    {}", config.push_url());
    println!("\nCommands:");
    println!("  p            pause / resume the live stream");
    println!("  h            toggle history playback");
    println!("  r            refresh all data");
    println!("  dim <d>      distribution by server | region | service");
    println!("  range <min>  load metrics for the last <min> minutes");
    println!("  search <q>   filter tasks and alerts (empty clears)");
    println!("  task <id>    show task detail");
    println!("  t            toggle theme");
    println!("  q            quit\n");

    let (tx, rx) = mpsc::channel(32);
    tokio::spawn(async move {
        let mut lines = BufReader::new(tokio::io::stdin()).lines();
        while let Ok(Some(line)) = lines.next_line().await {
            if line.trim().is_empty() {
                continue;
            }
            match line.parse::<Command>() {
                Ok(command) => {
                    if tx.send(command).await.is_err() {
                        break;
                    }
                }
                Err(e) => eprintln!("{}", e),
            }
        }
    });

    let app = DashboardApp::new(config)?;
    app.run_with(rx, |dashboard| {
        let now = chrono::Local::now().naive_local();
        println!("{}", dashboard.view().render_text(&now));
    })
    .await?;

    Ok(())
}
