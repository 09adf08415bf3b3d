use std::{borrow::Cow, fmt, io::IsTerminal, net::SocketAddr, path::PathBuf, str::FromStr};

use clap::{Parser, ValueEnum};
use config::Config;
use logforth::filter::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "Consult", version, long_about = concat!("Consult v", env!("CARGO_PKG_VERSION")))]
pub struct Args {
    /// IP address on which the server will listen for incoming connections.
    /// Default: 127.0.0.1:8000
    #[arg(short, long, env = "CONSULT_LISTEN_ADDRESS")]
    pub listen_address: Option<SocketAddr>,
    /// Path to the TOML configuration file
    #[arg(long, short, env = "CONSULT_CONFIG_PATH", default_value = "./consult.toml")]
    pub config: PathBuf,
    /// Set the logging level of the workspace crates.
    #[arg(long = "log", env = "CONSULT_LOG", default_value_t = LogLevel::default())]
    pub log_level: LogLevel,
    /// Set the style of log output
    #[arg(long, env = "CONSULT_LOG_STYLE", default_value_t = LogStyle::default())]
    pub log_style: LogStyle,
}

impl Args {
    /// Load the configuration file. Without one, the defaults must be valid on their own.
    pub fn config(&self) -> anyhow::Result<Config> {
        if self.config.exists() {
            return Config::load(&self.config);
        }

        let config = Config::default();

        config.validate().map_err(|e| {
            anyhow::anyhow!(
                "No configuration file found at {}, and the defaults are not usable: {e}",
                self.config.display()
            )
        })?;

        Ok(config)
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, ValueEnum)]
pub(crate) enum LogStyle {
    /// Colorized text, used as the default with TTY output
    Color,
    /// Standard text, used as the default with non-TTY output
    Text,
    /// JSON objects
    Json,
}

impl Default for LogStyle {
    fn default() -> Self {
        if std::io::stdout().is_terminal() {
            LogStyle::Color
        } else {
            LogStyle::Text
        }
    }
}

impl AsRef<str> for LogStyle {
    fn as_ref(&self) -> &str {
        match self {
            LogStyle::Color => "color",
            LogStyle::Text => "text",
            LogStyle::Json => "json",
        }
    }
}

impl fmt::Display for LogStyle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_ref())
    }
}

#[derive(Default, Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, ValueEnum)]
pub(crate) enum LogLevel {
    /// Disable logging
    Off,
    /// Only log errors
    Error,
    /// Log errors, and warnings
    Warn,
    /// Log errors, warnings, and info messages
    #[default]
    Info,
    /// Log errors, warnings, info, and debug messages
    Debug,
    /// Log errors, warnings, info, debug, and trace messages
    Trace,
}

impl LogLevel {
    fn filter_directives(self) -> Cow<'static, str> {
        match self {
            LogLevel::Off => Cow::Borrowed("off"),
            // Dependencies stay at warn, only workspace crates follow the selected level
            level => Cow::Owned(format!("warn,consult={level},server={level},config={level},llm={level}")),
        }
    }

    pub fn env_filter(self) -> EnvFilter {
        EnvFilter::from_str(&self.filter_directives()).expect("These all are valid env filters.")
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.as_ref().fmt(f)
    }
}

impl AsRef<str> for LogLevel {
    fn as_ref(&self) -> &str {
        match self {
            LogLevel::Off => "off",
            LogLevel::Error => "error",
            LogLevel::Warn => "warn",
            LogLevel::Info => "info",
            LogLevel::Debug => "debug",
            LogLevel::Trace => "trace",
        }
    }
}
