use anyhow::{Context, Result, bail};
use clap::Parser;
use cli::Args;
use faculty_common::observability::{LogConfig, init_logging};
use faculty_crawl::{CrawlOutcome, Crawler};
use faculty_drivers::WebDriverSession;
use faculty_sink::open_sink;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

mod cli;

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // 1) Config: defaults < files < env < flags
    let mut cfg = args.loader().load().context("loading configuration")?;
    args.apply(&mut cfg);

    let log_path = init_logging(LogConfig::from_settings("faculty-crawler", &cfg.logging))?;
    info!(
        target: "app",
        url = %cfg.directory_url,
        log = %log_path.display(),
        "faculty crawler starting"
    );

    // 2) Everything that can fail without a browser goes first.
    let crawler = Crawler::new(cfg.crawl_settings()).context("invalid selector in config")?;
    let mut sink = open_sink(&cfg.output)?;
    let mut session = WebDriverSession::open(&cfg.browser, &cfg.timeouts)
        .await
        .context("opening browser session")?;

    let cancel = CancellationToken::new();
    let on_interrupt = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!(target: "app", "interrupt received; stopping after the current row");
            on_interrupt.cancel();
        }
    });

    // 3) Crawl, then always release the browser.
    let summary = crawler.run(&mut session, sink.as_mut(), &cancel).await;
    if let Err(e) = session.shutdown().await {
        warn!(target: "app", error = %e, "browser did not shut down cleanly");
    }

    println!("{summary}");
    println!("profiles: {}", cfg.output.profiles_path().display());
    println!("graduate years: {}", cfg.output.graduates_path().display());

    if let CrawlOutcome::Aborted { reason } = &summary.outcome {
        bail!("crawl aborted: {reason}");
    }
    Ok(())
}
