//! CLI smoke entry point.
//!
//! # Responsibility
//! - Verify `works_core` wiring against a real database and blob root.
//! - Keep output deterministic for quick local sanity checks.

use log::info;
use std::process::ExitCode;
use works_core::{build_services, init_logging, CoreConfig, PageRequest};

fn main() -> ExitCode {
    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("works_cli error: {err}");
            ExitCode::FAILURE
        }
    }
}

fn run() -> Result<(), Box<dyn std::error::Error>> {
    let config = CoreConfig::from_env()?;
    if let Some(log_dir) = &config.log_dir {
        init_logging(&config.log_level, log_dir)?;
    }

    println!("works_core ping={}", works_core::ping());
    println!("works_core version={}", works_core::core_version());

    let services = build_services(&config)?;
    let page = services
        .works
        .get_all(PageRequest::resolve(None, None, services.page_limit)?)?;
    let activities = services.activities.get_all()?;

    info!(
        "event=cli_probe module=cli status=ok total_works={} activities={}",
        page.total_items,
        activities.len()
    );
    println!("works total={}", page.total_items);
    println!("activities total={}", activities.len());
    Ok(())
}
