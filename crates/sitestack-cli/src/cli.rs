use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

/// Synthesize static-website hosting infrastructure
#[derive(Parser, Debug)]
#[command(name = "sitestack", version, about, long_about = None)]
pub struct Cli {
    /// Log level
    #[arg(long, global = true, value_enum, default_value = "warn")]
    pub log_level: LogLevel,

    /// Log line format
    #[arg(long, global = true, value_enum, default_value = "text")]
    pub log_format: LogFormatArg,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Write the CloudFormation template and manifest
    Synth {
        #[command(flatten)]
        site: SiteArgs,

        /// Output directory
        #[arg(long, default_value = "cdk.out")]
        out: PathBuf,
    },

    /// Print resources in creation order, and the stack outputs
    Plan {
        #[command(flatten)]
        site: SiteArgs,
    },

    /// Write the Dependabot configuration
    Dependabot {
        /// Config directory holding an UpdatePolicy resource
        #[arg(long)]
        config: Option<PathBuf>,

        /// Reviewer and assignee for every entry (repeatable)
        #[arg(long = "maintainer")]
        maintainers: Vec<String>,

        /// Output path, or `-` for stdout
        #[arg(long, default_value = sitestack::dependabot::DEFAULT_PATH)]
        out: String,
    },

    /// Load and validate a config directory
    Validate {
        config_dir: PathBuf,
    },

    /// Create a config directory with a Site and an UpdatePolicy resource
    Init {
        config_dir: PathBuf,

        /// Apex domain of the site
        #[arg(long, env = "DOMAIN_NAME")]
        domain_name: String,

        /// Reviewer and assignee for every entry (repeatable)
        #[arg(long = "maintainer")]
        maintainers: Vec<String>,
    },
}

/// Inputs shared by `synth` and `plan`. Flags and environment win over the
/// config directory.
#[derive(Args, Debug, Clone, Default)]
pub struct SiteArgs {
    /// Apex domain of the site, e.g. example.com
    #[arg(long, env = "DOMAIN_NAME")]
    pub domain_name: Option<String>,

    /// Existing Route 53 hosted zone id; a new zone is created when omitted
    #[arg(long, env = "HOSTED_ZONE_ID")]
    pub hosted_zone_id: Option<String>,

    /// CloudFormation stack name
    #[arg(long)]
    pub stack_name: Option<String>,

    /// Config directory holding a Site resource
    #[arg(long)]
    pub config: Option<PathBuf>,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum LogLevel {
    Off,
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    pub fn as_filter(self) -> &'static str {
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

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum LogFormatArg {
    Text,
    Json,
}

impl From<LogFormatArg> for sitestack::LogFormat {
    fn from(arg: LogFormatArg) -> Self {
        match arg {
            LogFormatArg::Text => sitestack::LogFormat::Text,
            LogFormatArg::Json => sitestack::LogFormat::Json,
        }
    }
}
