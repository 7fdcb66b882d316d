// src/main.rs
// =============================================================================
// This is the entry point of our CLI application.
//
// What happens here:
// 1. Parse command-line arguments using clap (usage errors exit with code 1)
// 2. Set up logging (tracing, to stderr)
// 3. Run the crawl, streaming progress and problems to stderr
// 4. Print the summary (table or JSON) on stdout
// 5. Exit with proper code:
//      0 = crawl completed
//      1 = usage error, or broken links found with --fail-on-broken
//      2 = fatal error (cache directory, HTTP client)
//
// A broken link does not fail the run by default: finding them is the
// report's job. --fail-on-broken opts into a failing exit code for CI.
// =============================================================================

mod checker; // src/checker/ - page fetching and link extraction
mod cli; // src/cli.rs - command-line parsing
mod config; // src/config.rs - immutable crawl settings
mod crawl; // src/crawl/ - cache, link graph, tasks, engine
mod error; // src/error.rs - error types
mod report; // src/report.rs - crawl events

use anyhow::Result;
use clap::Parser;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

use cli::Cli;
use crawl::{CrawlEngine, CrawlSummary};
use report::ConsoleReporter;

#[tokio::main]
async fn main() {
    // try_parse so a usage error exits with 1 (clap's own exit code is 2)
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) => {
            let _ = e.print();
            std::process::exit(usage_exit_code(&e));
        }
    };

    init_logging(cli.verbose);

    let exit_code = match run(cli).await {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            FATAL_EXIT_CODE
        }
    };

    std::process::exit(exit_code);
}

// Logs go to stderr so stdout stays clean for the summary
//
// RUST_LOG wins when set; otherwise warnings only, or debug with --verbose.
fn init_logging(verbose: bool) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(if verbose { "debug" } else { "warn" }));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

async fn run(cli: Cli) -> Result<i32> {
    let config = cli.crawl_config();
    tracing::debug!(
        "cache dir {} (ttl {} ms), {} workers",
        config.caching.dir().display(),
        config.caching.ttl_ms(),
        config.workers
    );

    let reporter = Arc::new(ConsoleReporter::new());
    let summary = CrawlEngine::with_http(config, reporter)?.run().await?;

    print_results(&summary, cli.json)?;

    Ok(exit_code(cli.fail_on_broken, &summary))
}

const FATAL_EXIT_CODE: i32 = 2;

// --help / --version go to stdout and are not errors
fn usage_exit_code(error: &clap::Error) -> i32 {
    if error.use_stderr() {
        1
    } else {
        0
    }
}

// Broken links only fail the run when asked to
fn exit_code(fail_on_broken: bool, summary: &CrawlSummary) -> i32 {
    if fail_on_broken && summary.has_broken_links() {
        1
    } else {
        0
    }
}

// Prints the summary either as a table or JSON
fn print_results(summary: &CrawlSummary, json: bool) -> Result<()> {
    if json {
        let json_output = serde_json::to_string_pretty(summary)?;
        println!("{}", json_output);
    } else {
        print_table(summary);
    }
    Ok(())
}

// Prints the summary as a human-readable table
fn print_table(summary: &CrawlSummary) {
    if !summary.broken.is_empty() {
        println!("{:<60} {:<30} {}", "BROKEN LINK", "CAUSE", "LINKED FROM");
        println!("{}", "=".repeat(120));

        for broken in &summary.broken {
            let referrers = if broken.referrers.is_empty() {
                "(start page)".to_string()
            } else {
                broken
                    .referrers
                    .iter()
                    .map(|r| r.as_str())
                    .collect::<Vec<_>>()
                    .join(", ")
            };
            println!(
                "{:<60} {:<30} {}",
                truncate(broken.target.as_str(), 60),
                truncate(&broken.cause, 30),
                referrers
            );
        }
        println!();
    }

    if !summary.bad_syntax.is_empty() {
        println!("{:<60} {:<30} {}", "MALFORMED HREF", "CAUSE", "ON PAGE");
        println!("{}", "=".repeat(120));

        for bad in &summary.bad_syntax {
            println!(
                "{:<60} {:<30} {}",
                truncate(&bad.raw, 60),
                truncate(&bad.cause, 30),
                bad.page
            );
        }
        println!();
    }

    println!("📊 Summary:");
    println!("   📄 Pages checked: {}", summary.completed);
    println!("   ❌ Broken: {}", summary.broken.len());
    println!("   ⚠️  Malformed: {}", summary.bad_syntax.len());
    if summary.errors > 0 {
        println!("   💥 Task errors: {}", summary.errors);
    }
}

// Shortens long cells so the columns line up
fn truncate(text: &str, width: usize) -> String {
    if text.chars().count() > width {
        let kept: String = text.chars().take(width.saturating_sub(3)).collect();
        format!("{kept}...")
    } else {
        text.to_string()
    }
}
