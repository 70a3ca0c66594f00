//! Device connectivity service - Entry Point
//!
//! Serves publish commands, gateway compose files and server certificates
//! for the devices held in the local registry.

use std::collections::HashMap;
use std::env;
use std::path::PathBuf;

use devconn::app::options::AppOptions;
use devconn::app::run::run;
use devconn::filesys::file::File;
use devconn::logs::{init_logging, LogLevel, LogOptions};
use devconn::storage::layout::StorageLayout;
use devconn::storage::settings::Settings;
use devconn::utils::version_info;

use tracing::{error, info, warn};

#[tokio::main]
async fn main() {
    // Parse command line arguments
    let args: Vec<String> = env::args().collect();
    let mut cli_args: HashMap<String, String> = HashMap::new();

    for arg in args.iter().skip(1) {
        if let Some((key, value)) = arg.split_once('=') {
            // Handle --key=value format
            let clean_key = key.trim_start_matches('-');
            cli_args.insert(clean_key.to_string(), value.to_string());
        } else if arg.starts_with("--") {
            // Handle standalone flags like --version
            let clean_key = arg.trim_start_matches('-');
            cli_args.insert(clean_key.to_string(), "true".to_string());
        }
    }

    // Print version and exit
    let version = version_info();
    if cli_args.contains_key("version") {
        match serde_json::to_string_pretty(&version) {
            Ok(json) => println!("{}", json),
            Err(e) => eprintln!("Failed to render version: {e}"),
        }
        return;
    }

    let layout = match cli_args.get("base-dir") {
        Some(dir) => StorageLayout::new(dir),
        None => StorageLayout::default(),
    };
    let settings_file = match cli_args.get("settings") {
        Some(path) => File::new(path),
        None => layout.settings_file(),
    };

    // Write default settings and exit
    if cli_args.contains_key("init") {
        if settings_file.exists().await {
            eprintln!("Settings file {:?} already exists", settings_file.path());
            return;
        }
        match settings_file.write_json(&Settings::default()).await {
            Ok(()) => println!("Wrote default settings to {:?}", settings_file.path()),
            Err(e) => eprintln!("Unable to write settings file: {e}"),
        }
        return;
    }

    // Retrieve the settings file, defaults when absent
    let settings_missing = !settings_file.exists().await;
    let mut settings = if settings_missing {
        Settings::default()
    } else {
        match settings_file.read_json::<Settings>().await {
            Ok(settings) => settings,
            Err(e) => {
                eprintln!("Unable to read settings file {:?}: {e}", settings_file.path());
                return;
            }
        }
    };
    apply_cli_overrides(&mut settings, &cli_args);

    // Initialize logging, the guard flushes file logs on exit
    let log_options = LogOptions {
        log_level: settings.log_level.clone(),
        json_format: settings.log_json,
        log_dir: settings.log_to_file.then(|| layout.logs_dir()),
        ..Default::default()
    };
    let _log_guard = match init_logging(log_options) {
        Ok(guard) => guard,
        Err(e) => {
            eprintln!("Failed to initialize logging: {e}");
            None
        }
    };
    if settings_missing {
        warn!(
            "Settings file {:?} not found, using defaults",
            settings_file.path()
        );
    }

    let options = AppOptions::from_settings(&settings, layout);
    info!(
        "Running device connectivity service {} with options: {:?}",
        version.version, options
    );
    if let Err(e) = run(options, None, await_shutdown_signal()).await {
        error!("Failed to run the service: {e}");
    }
}

/// Apply `--key=value` overrides on top of the settings file
fn apply_cli_overrides(settings: &mut Settings, cli_args: &HashMap<String, String>) {
    if let Some(level) = cli_args.get("log-level") {
        match level.parse::<LogLevel>() {
            Ok(level) => settings.log_level = level,
            Err(e) => eprintln!("{e}, keeping {:?}", settings.log_level),
        }
    }
    if let Some(host) = cli_args.get("host") {
        settings.server.host = host.clone();
    }
    if let Some(port) = cli_args.get("port") {
        match port.parse() {
            Ok(port) => settings.server.port = port,
            Err(_) => eprintln!("Invalid port {port}, keeping {}", settings.server.port),
        }
    }
    if let Some(base_url) = cli_args.get("base-url") {
        settings.base_url = Some(base_url.clone());
    }
    if let Some(registry) = cli_args.get("registry") {
        settings.registry_file = Some(PathBuf::from(registry));
    }
    if let Some(pem) = cli_args.get("mqtts-pem-cert-file") {
        settings.connectivity.mqtts_pem_cert_file = Some(PathBuf::from(pem));
    }
}

async fn await_shutdown_signal() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};
        let (mut sigterm, mut sigint) =
            match (signal(SignalKind::terminate()), signal(SignalKind::interrupt())) {
                (Ok(sigterm), Ok(sigint)) => (sigterm, sigint),
                _ => {
                    error!("Unable to install signal handlers, waiting for Ctrl+C");
                    let _ = tokio::signal::ctrl_c().await;
                    return;
                }
            };

        tokio::select! {
            _ = sigterm.recv() => {
                info!("SIGTERM received, shutting down...");
            }
            _ = sigint.recv() => {
                info!("SIGINT received, shutting down...");
            }
        }
    }

    #[cfg(not(unix))]
    {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!("Failed to listen for Ctrl+C: {e}");
        }
        info!("Ctrl+C received, shutting down...");
    }
}
