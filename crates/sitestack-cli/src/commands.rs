use std::fs;
use std::io::Write;
use std::path::Path;

use anyhow::{Context, Result};
use sitestack::config::{
    AnyResource, Resource, ResourceKind, ResourceWithPath, SiteSpec, UpdatePolicySpec,
};
use sitestack::{
    synthesize, ConfigLoader, ConfigValidator, DependabotConfig, Environment, LoadedConfig,
    StackArtifact, StackProps,
};

use crate::cli::SiteArgs;

/// Loads and validates a config directory.
fn load_config(dir: &Path) -> Result<LoadedConfig> {
    let loaded = ConfigLoader::new(dir)
        .load()
        .with_context(|| format!("Failed to load config directory {}", dir.display()))?;

    ConfigValidator::new()
        .validate(&loaded)
        .with_context(|| format!("Invalid configuration in {}", dir.display()))?;

    Ok(loaded)
}

/// Layers flags and environment over the config directory's `Site`.
pub fn resolve_props(args: &SiteArgs, env: Environment) -> Result<StackProps> {
    let mut props = match &args.config {
        Some(dir) => load_config(dir)?.stack_props(env),
        None => StackProps::default().with_env(env),
    };

    if let Some(domain_name) = &args.domain_name {
        props.domain_name = Some(domain_name.clone());
    }
    if let Some(hosted_zone_id) = &args.hosted_zone_id {
        props.hosted_zone_id = Some(hosted_zone_id.clone());
    }
    if let Some(stack_name) = &args.stack_name {
        props.stack_name = stack_name.clone();
    }

    Ok(props)
}

fn synthesize_site(args: &SiteArgs) -> Result<StackArtifact> {
    let props = resolve_props(args, Environment::from_env())?;
    synthesize(&props).context("Synthesis failed")
}

pub fn synth(args: &SiteArgs, out: &Path) -> Result<()> {
    let artifact = synthesize_site(args)?;
    let written = artifact
        .write_to(out)
        .with_context(|| format!("Failed to write cloud assembly to {}", out.display()))?;

    for path in written {
        println!("{}", path.display());
    }
    Ok(())
}

pub fn plan(args: &SiteArgs) -> Result<()> {
    let artifact = synthesize_site(args)?;
    let order = artifact.creation_order()?;

    let stdout = std::io::stdout();
    let mut out = stdout.lock();

    writeln!(
        out,
        "Stack {} ({})",
        artifact.stack_name,
        artifact.environment.uri()
    )?;
    writeln!(out)?;
    writeln!(out, "Resources, in creation order:")?;
    for (index, id) in order.iter().enumerate() {
        let resource_type = artifact
            .template
            .resource(id)
            .map(|r| r.resource_type.as_str())
            .unwrap_or("?");
        writeln!(out, "  {:>2}. {:<28} {}", index + 1, id, resource_type)?;
    }

    writeln!(out)?;
    writeln!(out, "Outputs:")?;
    for (id, output) in artifact.template.outputs() {
        writeln!(
            out,
            "  {:<24} {}",
            id,
            output.description.as_deref().unwrap_or("")
        )?;
    }
    Ok(())
}

/// Builds the Dependabot file from the config directory, if any, then the
/// command-line maintainers.
pub fn build_dependabot(config: Option<&Path>, maintainers: &[String]) -> Result<DependabotConfig> {
    let loaded = match config {
        Some(dir) => load_config(dir)?,
        None => LoadedConfig::default(),
    };

    let mut dependabot = loaded.to_dependabot_config();
    if !maintainers.is_empty() {
        dependabot.set_maintainers(maintainers);
    }
    dependabot
        .validate()
        .context("Generated Dependabot configuration is invalid")?;
    Ok(dependabot)
}

pub fn dependabot(config: Option<&Path>, maintainers: &[String], out: &str) -> Result<()> {
    let yaml = build_dependabot(config, maintainers)?.to_yaml()?;

    if out == "-" {
        print!("{}", yaml);
        return Ok(());
    }

    let path = Path::new(out);
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create {}", parent.display()))?;
    }
    fs::write(path, yaml).with_context(|| format!("Failed to write {}", path.display()))?;
    log::info!("Wrote {}", path.display());
    println!("{}", path.display());
    Ok(())
}

pub fn validate(config_dir: &Path) -> Result<()> {
    let loaded = load_config(config_dir)?;

    for (kind, name, path) in loaded.all_resources() {
        println!("ok  {}/{} ({})", kind, name, path.display());
    }
    println!("Configuration is valid");
    Ok(())
}

const SITE_FILE: &str = "site.yaml";
const UPDATE_POLICY_FILE: &str = "update-policy.yaml";

pub fn init(config_dir: &Path, domain_name: &str, maintainers: &[String]) -> Result<()> {
    let loader = ConfigLoader::new(config_dir);

    let site = Resource::new(
        ResourceKind::Site,
        "default",
        SiteSpec {
            domain_name: Some(domain_name.to_string()),
            ..Default::default()
        },
    );
    let policy = Resource::new(
        ResourceKind::UpdatePolicy,
        "default",
        UpdatePolicySpec {
            updates: DependabotConfig::static_site(&[]).updates,
            maintainers: maintainers.to_vec(),
        },
    );

    // Nothing is written unless the whole directory would validate
    let planned = LoadedConfig {
        site: Some(ResourceWithPath::new(site.clone(), SITE_FILE)),
        update_policy: Some(ResourceWithPath::new(policy.clone(), UPDATE_POLICY_FILE)),
    };
    ConfigValidator::new()
        .validate(&planned)
        .context("Refusing to write an invalid configuration")?;

    let resources = [
        (AnyResource::Site(site), SITE_FILE),
        (AnyResource::UpdatePolicy(policy), UPDATE_POLICY_FILE),
    ];

    for (_, file) in &resources {
        let target = config_dir.join(file);
        if target.exists() {
            anyhow::bail!("{} already exists", target.display());
        }
    }

    for (resource, file) in resources {
        let written = loader.write_resource(&resource, Path::new(file))?;
        println!("{}", written.display());
    }
    Ok(())
}
