//! Console output: banner, outcome lines, config and health views

use anyhow::Result;
use colored::Colorize;
use tabled::{Table, Tabled};

use launchpad_core::domain::{LaunchConfig, LaunchOutcome, LaunchReport, ServiceCommand};
use launchpad_core::port::{HealthError, HealthReport};

const RULE_WIDTH: usize = 60;

/// Which services a launch starts
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LaunchMode {
    All,
    Api,
    Ui,
}

impl std::fmt::Display for LaunchMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LaunchMode::All => write!(f, "API server + UI"),
            LaunchMode::Api => write!(f, "API server"),
            LaunchMode::Ui => write!(f, "UI"),
        }
    }
}

fn rule() -> String {
    "=".repeat(RULE_WIDTH)
}

fn yes_no(flag: bool) -> &'static str {
    if flag {
        "yes"
    } else {
        "no"
    }
}

/// Startup banner listing what is about to be started and where
pub fn print_banner(mode: LaunchMode, config: &LaunchConfig) {
    println!("{}", rule());
    println!("{}", format!("Shape Generation - {}", mode).bold());
    println!("{}", rule());
    if matches!(mode, LaunchMode::All | LaunchMode::Api) {
        println!("API server:    http://{}:{}", config.api_host, config.api_port);
    }
    if matches!(mode, LaunchMode::All | LaunchMode::Ui) {
        let api_url = match mode {
            LaunchMode::All => config.derived_api_url(),
            _ => config.api_url().to_string(),
        };
        let ui_host = config.ui_host.as_deref().unwrap_or("0.0.0.0");
        println!("UI address:    http://{}:{}", ui_host, config.ui_port);
        println!("UI -> API:     {}", api_url);
        println!("Start backend: {}", yes_no(config.start_backend));
    }
    println!("Readiness:     {}", config.readiness);
    println!("{}", rule());
}

/// Final console line for a finished launch
pub fn print_outcome(report: &LaunchReport) {
    println!("{}", outcome_line(report));
}

fn outcome_line(report: &LaunchReport) -> String {
    match report.outcome {
        LaunchOutcome::StartupFailed => {
            format!("{} API server failed to start", "✗".red().bold())
        }
        LaunchOutcome::Exited { code: 0 } => format!("{} Stopped.", "✓".green().bold()),
        LaunchOutcome::Exited { code } => format!(
            "{} Foreground process exited with code {}",
            "!".yellow().bold(),
            code
        ),
        LaunchOutcome::Interrupted => {
            format!("{} Interrupted, services stopped.", "✓".green().bold())
        }
    }
}

#[derive(Tabled)]
struct ConfigRow {
    #[tabled(rename = "Setting")]
    setting: &'static str,
    #[tabled(rename = "Value")]
    value: String,
}

fn row(setting: &'static str, value: impl Into<String>) -> ConfigRow {
    ConfigRow {
        setting,
        value: value.into(),
    }
}

fn config_rows(config: &LaunchConfig) -> Vec<ConfigRow> {
    let optional = |v: &Option<String>| v.clone().unwrap_or_else(|| "-".to_string());
    vec![
        row("api_host", &config.api_host),
        row("api_port", &config.api_port),
        row("ui_port", &config.ui_port),
        row("api_url", config.api_url()),
        row("api_url (combined)", config.derived_api_url()),
        row("start_backend", config.start_backend.to_string()),
        row("python_bin", &config.python_bin),
        row("ui_host", optional(&config.ui_host)),
        row("weights_dir", optional(&config.weights_dir)),
        row("share", config.share.to_string()),
        row("grace_period", format!("{}ms", config.grace_period.as_millis())),
        row("readiness", config.readiness.to_string()),
    ]
}

/// Resolved configuration plus the exact command lines it produces
pub fn print_config(config: &LaunchConfig, as_json: bool) -> Result<()> {
    let api = ServiceCommand::api(config);
    let ui_combined = ServiceCommand::ui(config, &config.derived_api_url());
    let ui_standalone = ServiceCommand::ui(config, config.api_url());

    if as_json {
        let settings: serde_json::Map<String, serde_json::Value> = config_rows(config)
            .into_iter()
            .map(|row| (row.setting.to_string(), serde_json::Value::String(row.value)))
            .collect();
        let doc = serde_json::json!({
            "settings": settings,
            "commands": {
                "api": api.command_line(),
                "ui_combined": ui_combined.command_line(),
                "ui_standalone": ui_standalone.command_line(),
            }
        });
        println!("{}", serde_json::to_string_pretty(&doc)?);
        return Ok(());
    }

    println!("{}", Table::new(config_rows(config)));
    println!();
    println!("{} {}", "api:".bold(), api.command_line());
    println!("{} {}", "ui (all):".bold(), ui_combined.command_line());
    println!("{} {}", "ui:".bold(), ui_standalone.command_line());
    Ok(())
}

pub fn print_health(url: &str, report: &HealthReport) {
    let status = if report.is_ready {
        report.status.green().bold()
    } else {
        report.status.yellow().bold()
    };
    println!("API server:    {}", url);
    println!("Status:        {}", status);
    println!("Ready:         {}", yes_no(report.is_ready));
    let models = if report.loaded_models.is_empty() {
        "-".to_string()
    } else {
        report.loaded_models.join(", ")
    };
    println!("Loaded models: {}", models);
    println!(
        "GPU memory:    {:.1} / {:.1} GB",
        report.gpu_memory_used_gb, report.gpu_memory_total_gb
    );
}

pub fn print_unreachable(url: &str, error: &HealthError) {
    println!("{} {} ({})", "✗".red().bold(), url, error);
}

#[cfg(test)]
mod tests {
    use super::*;
    use launchpad_core::domain::LaunchPhase;

    #[test]
    fn test_config_rows_cover_derived_url() {
        let config = LaunchConfig {
            api_port: "9001".to_string(),
            ..Default::default()
        };

        let rows = config_rows(&config);

        let derived = rows.iter().find(|r| r.setting == "api_url (combined)").unwrap();
        assert_eq!(derived.value, "http://localhost:9001");
        let plain = rows.iter().find(|r| r.setting == "api_url").unwrap();
        assert_eq!(plain.value, "http://localhost:8000");
        let weights = rows.iter().find(|r| r.setting == "weights_dir").unwrap();
        assert_eq!(weights.value, "-");
    }

    #[test]
    fn test_startup_failure_line_does_not_guess_the_cause() {
        colored::control::set_override(false);
        // spawn failure: the API never got as far as the grace period
        let report = LaunchReport {
            outcome: LaunchOutcome::StartupFailed,
            phases: vec![LaunchPhase::Idle, LaunchPhase::ApiStarting, LaunchPhase::ApiFailed],
        };

        let line = outcome_line(&report);

        assert_eq!(line, "✗ API server failed to start");
        assert!(!line.contains("grace period"));
    }

    #[test]
    fn test_exit_code_line() {
        colored::control::set_override(false);
        let report = LaunchReport {
            outcome: LaunchOutcome::Exited { code: 3 },
            phases: vec![LaunchPhase::Idle, LaunchPhase::UiRunning],
        };

        assert_eq!(outcome_line(&report), "! Foreground process exited with code 3");
    }

    #[test]
    fn test_mode_labels() {
        assert_eq!(LaunchMode::All.to_string(), "API server + UI");
        assert_eq!(LaunchMode::Ui.to_string(), "UI");
    }
}
