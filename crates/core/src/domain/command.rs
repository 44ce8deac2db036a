// Service Commands
// The launcher's only interface to the services: program + arguments

use super::config::LaunchConfig;

/// ASGI application served by the API server
pub const API_APP: &str = "src.api.server:app";

/// Python module running the UI server
pub const UI_MODULE: &str = "src.ui.run";

/// Which external service a process belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ServiceRole {
    Api,
    Ui,
}

impl std::fmt::Display for ServiceRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ServiceRole::Api => write!(f, "api"),
            ServiceRole::Ui => write!(f, "ui"),
        }
    }
}

/// A fully resolved command line for one service
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceCommand {
    pub role: ServiceRole,
    pub program: String,
    pub args: Vec<String>,
}

impl ServiceCommand {
    pub fn new(role: ServiceRole, program: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            role,
            program: program.into(),
            args,
        }
    }

    /// `python -m uvicorn src.api.server:app --host <host> --port <port>`
    pub fn api(config: &LaunchConfig) -> Self {
        let args = [
            "-m",
            "uvicorn",
            API_APP,
            "--host",
            config.api_host.as_str(),
            "--port",
            config.api_port.as_str(),
        ]
        .iter()
        .map(|s| s.to_string())
        .collect();
        Self::new(ServiceRole::Api, &config.python_bin, args)
    }

    /// `python -m src.ui.run --api-url <url> --port <ui port> [extras]`
    pub fn ui(config: &LaunchConfig, api_url: &str) -> Self {
        let mut args: Vec<String> = [
            "-m",
            UI_MODULE,
            "--api-url",
            api_url,
            "--port",
            config.ui_port.as_str(),
        ]
        .iter()
        .map(|s| s.to_string())
        .collect();

        if config.start_backend {
            args.push("--start-backend".to_string());
        }
        if let Some(host) = &config.ui_host {
            args.extend(["--host".to_string(), host.clone()]);
        }
        if let Some(dir) = &config.weights_dir {
            args.extend(["--weights-dir".to_string(), dir.clone()]);
        }
        if config.share {
            args.push("--share".to_string());
        }

        Self::new(ServiceRole::Ui, &config.python_bin, args)
    }

    /// Value following `flag` in the argument list
    pub fn arg_value(&self, flag: &str) -> Option<&str> {
        self.args
            .iter()
            .position(|a| a == flag)
            .and_then(|i| self.args.get(i + 1))
            .map(String::as_str)
    }

    pub fn has_flag(&self, flag: &str) -> bool {
        self.args.iter().any(|a| a == flag)
    }

    /// Human-readable command line for banners and logs
    pub fn command_line(&self) -> String {
        std::iter::once(self.program.as_str())
            .chain(self.args.iter().map(String::as_str))
            .collect::<Vec<_>>()
            .join(" ")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_api_command_binds_host_and_port() {
        let config = LaunchConfig {
            api_port: "9001".to_string(),
            ..Default::default()
        };

        let cmd = ServiceCommand::api(&config);

        assert_eq!(cmd.role, ServiceRole::Api);
        assert_eq!(cmd.program, "python");
        assert_eq!(cmd.arg_value("--host"), Some("0.0.0.0"));
        assert_eq!(cmd.arg_value("--port"), Some("9001"));
        assert_eq!(
            cmd.command_line(),
            "python -m uvicorn src.api.server:app --host 0.0.0.0 --port 9001"
        );
    }

    #[test]
    fn test_ui_command_defaults() {
        let config = LaunchConfig::default();

        let cmd = ServiceCommand::ui(&config, config.api_url());

        assert_eq!(cmd.role, ServiceRole::Ui);
        assert_eq!(cmd.arg_value("--api-url"), Some("http://localhost:8000"));
        assert_eq!(cmd.arg_value("--port"), Some("7860"));
        assert!(!cmd.has_flag("--start-backend"));
        assert!(!cmd.has_flag("--share"));
        assert_eq!(cmd.arg_value("--host"), None);
    }

    #[test]
    fn test_ui_command_extras() {
        let config = LaunchConfig {
            start_backend: true,
            ui_host: Some("127.0.0.1".to_string()),
            weights_dir: Some("/models".to_string()),
            share: true,
            python_bin: "python3".to_string(),
            ..Default::default()
        };

        let cmd = ServiceCommand::ui(&config, "http://api:8000");

        assert_eq!(cmd.program, "python3");
        assert!(cmd.has_flag("--start-backend"));
        assert_eq!(cmd.arg_value("--host"), Some("127.0.0.1"));
        assert_eq!(cmd.arg_value("--weights-dir"), Some("/models"));
        assert!(cmd.has_flag("--share"));
    }
}
