//! Static-website hosting infrastructure as a CloudFormation template.
//!
//! The [`stack`] module declares the resources, [`template`] models the
//! document they are rendered into, and [`graph`] checks that every reference
//! resolves. [`dependabot`] produces the repository's update policy, and
//! [`config`] reads both from a directory of YAML resources.

pub mod config;
pub mod dependabot;
pub mod error;
pub mod graph;
pub mod logging;
pub mod stack;
pub mod template;

pub use config::{ConfigLoader, ConfigValidator, LoadedConfig};
pub use dependabot::{load_dependabot_config, DependabotConfig};
pub use error::{ConfigError, Result, SitestackError, SynthError};
pub use graph::ResourceGraph;
pub use logging::{init_logging, LogFormat};
pub use stack::{synthesize, Environment, StackArtifact, StackProps};
pub use template::Template;
