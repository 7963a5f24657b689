//! CLI command implementations

use std::io::Write;
use std::path::Path;
use std::sync::Arc;

use tracing::info;

use crate::config::AppConfig;
use crate::http_server::{AppState, HttpServer};
use crate::logging;

use super::args::Command;
use super::errors::{CliError, CliResult};

/// Levels listed by `finflex check`
const CHECK_LEVELS: u32 = 10;

/// Parse arguments and run the selected command
pub fn run() -> CliResult<()> {
    let cli = super::args::Cli::parse_args();
    run_command(cli.command)
}

/// Run the appropriate command based on CLI args
pub fn run_command(cmd: Command) -> CliResult<()> {
    match cmd {
        Command::Serve { config, port } => serve(&config, port),
        Command::Init { config, force } => init(&config, force),
        Command::Check { config } => check(&config, &mut std::io::stdout()),
    }
}

/// Load config, open the store and serve until shutdown
pub fn serve(config_path: &Path, port: Option<u16>) -> CliResult<()> {
    logging::init();

    let mut config = AppConfig::load_or_default(config_path)?;
    if let Some(port) = port {
        config.server.port = port;
    }
    info!(
        config = %config_path.display(),
        port = config.server.port,
        level_policy = ?config.progress.level_policy,
        "starting FinFlex"
    );

    let state = AppState::from_config(&config)
        .map_err(|e| CliError::boot_failed(format!("Failed to open ledger: {}", e)))?;
    let server = HttpServer::new(config.server.clone(), Arc::new(state));

    let rt = tokio::runtime::Runtime::new()
        .map_err(|e| CliError::boot_failed(format!("Failed to create tokio runtime: {}", e)))?;

    rt.block_on(async {
        server
            .start()
            .await
            .map_err(|e| CliError::boot_failed(format!("HTTP server failed: {}", e)))
    })
}

/// Write the default configuration
pub fn init(config_path: &Path, force: bool) -> CliResult<()> {
    if config_path.exists() && !force {
        return Err(CliError::already_initialized(config_path));
    }
    AppConfig::default().save(config_path)?;
    println!("Wrote default configuration to {}", config_path.display());
    Ok(())
}

/// Validate configuration and print the first levels of the schedule
pub fn check(config_path: &Path, out: &mut impl Write) -> CliResult<()> {
    let config = AppConfig::load(config_path)?;
    let schedule = config.progress.schedule;

    writeln!(out, "Configuration OK: {}", config_path.display())?;
    writeln!(
        out,
        "Schedule: base {} step {} ({:?} levels)",
        schedule.base, schedule.step, config.progress.level_policy
    )?;
    writeln!(out, "{:>5} {:>10} {:>12}", "level", "cost", "total xp")?;
    for level in 0..CHECK_LEVELS {
        writeln!(
            out,
            "{:>5} {:>10} {:>12}",
            level,
            schedule.xp_for_level(level),
            schedule.xp_floor(level + 1)
        )?;
    }
    if config.auth.uses_development_secret() {
        writeln!(out, "warning: auth.jwt_secret is the development default")?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::errors::CliErrorCode;

    #[test]
    fn test_init_refuses_overwrite() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("finflex.json");

        init(&path, false).unwrap();
        let err = init(&path, false).unwrap_err();
        assert_eq!(err.code(), &CliErrorCode::AlreadyInitialized);
        init(&path, true).unwrap();
    }

    #[test]
    fn test_check_prints_schedule() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("finflex.json");
        std::fs::write(&path, r#"{ "progress": { "base": 100, "step": 20 } }"#).unwrap();

        let mut out = Vec::new();
        check(&path, &mut out).unwrap();
        let text = String::from_utf8(out).unwrap();

        assert!(text.contains("Configuration OK"));
        // level 0 costs 100, level 1 costs 120, reaching level 2 takes 220
        assert!(text.contains("    0        100          100"));
        assert!(text.contains("    1        120          220"));
    }

    #[test]
    fn test_check_rejects_invalid_schedule() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("finflex.json");
        std::fs::write(&path, r#"{ "progress": { "base": 0 } }"#).unwrap();

        let err = check(&path, &mut Vec::new()).unwrap_err();
        assert_eq!(err.code(), &CliErrorCode::ConfigError);
    }
}
