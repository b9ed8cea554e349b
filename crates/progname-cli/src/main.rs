//! progname CLI
//!
//! Command-line interface for resolving firmware output names.

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use progname_core::Config;
use progname_parser::{extract_macro_value_from_file, HeaderMacros, ProjectConfig};
use progname_resolver::{OutputName, OutputNameResolver, ProjectEnvironment, StaticEnvironment};
use std::path::{Path, PathBuf};
use tracing::debug;
use tracing_subscriber::EnvFilter;

/// PlatformIO exports the environment being built under this name
const PIOENV_VAR: &str = "PIOENV";
const PROJECT_FILE: &str = "platformio.ini";

#[derive(Parser)]
#[command(name = "progname")]
#[command(author, version, about = "Firmware output name resolver", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Resolve the output program name
    Resolve {
        /// Project directory containing platformio.ini
        #[arg(short = 'd', long, default_value = ".")]
        project_dir: PathBuf,

        /// Header with the naming macros (default from config: src/Main.h)
        #[arg(long, value_name = "FILE")]
        header: Option<PathBuf>,

        /// Platform to resolve for, instead of reading platformio.ini
        #[arg(short, long, conflicts_with_all = ["env", "all_envs"])]
        platform: Option<String>,

        /// Environment from platformio.ini (default: $PIOENV, then default_envs)
        #[arg(short, long)]
        env: Option<String>,

        /// Resolve every environment in platformio.ini
        #[arg(long)]
        all_envs: bool,

        /// Naming configuration (YAML or JSON)
        #[arg(short, long, value_name = "FILE")]
        config: Option<PathBuf>,

        /// Output format (text, json)
        #[arg(short, long, default_value = "text", value_parser = ["text", "json"])]
        format: String,
    },

    /// Print macro values from a header
    Extract {
        /// Header file
        #[arg(long, value_name = "FILE")]
        header: PathBuf,

        /// Macro names
        #[arg(value_name = "NAME", required = true)]
        names: Vec<String>,
    },

    /// List object-like macros defined in a header
    Macros {
        /// Header file
        #[arg(value_name = "FILE")]
        header: PathBuf,

        /// Output format (text, json)
        #[arg(short, long, default_value = "text", value_parser = ["text", "json"])]
        format: String,
    },
}

fn main() -> Result<()> {
    // Results go to stdout, logs to stderr
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Resolve {
            project_dir,
            header,
            platform,
            env,
            all_envs,
            config,
            format,
        } => {
            let config = load_config(config.as_deref())?;
            let header = header.unwrap_or_else(|| project_dir.join(&config.header));
            let resolver = OutputNameResolver::with_naming(header, config.naming);

            let resolved = match platform {
                Some(platform) => vec![cmd_resolve_platform(&resolver, &platform)?],
                None => cmd_resolve_project(&resolver, &project_dir, env, all_envs)?,
            };
            print_resolved(&resolved, all_envs, &format)?;
        }
        Commands::Extract { header, names } => {
            cmd_extract(&header, &names)?;
        }
        Commands::Macros { header, format } => {
            cmd_macros(&header, &format)?;
        }
    }

    Ok(())
}

fn load_config(path: Option<&Path>) -> Result<Config> {
    match path {
        Some(path) => Config::load(path)
            .with_context(|| format!("loading configuration {}", path.display())),
        None => Ok(Config::default()),
    }
}

/// Resolution result for one environment
struct Resolved {
    env: Option<String>,
    name: OutputName,
}

fn cmd_resolve_platform(resolver: &OutputNameResolver, platform: &str) -> Result<Resolved> {
    let mut build_env =
        StaticEnvironment::new().with_option(&resolver.naming().platform_option, platform);
    debug!("Resolving for {} from {}", platform, resolver.header().display());
    let name = resolver.apply(&mut build_env)?;

    Ok(Resolved { env: None, name })
}

fn cmd_resolve_project(
    resolver: &OutputNameResolver,
    project_dir: &Path,
    env: Option<String>,
    all_envs: bool,
) -> Result<Vec<Resolved>> {
    let project_file = project_dir.join(PROJECT_FILE);
    let project = ProjectConfig::load(&project_file)
        .with_context(|| format!("reading {}", project_file.display()))?;

    let envs = if all_envs {
        project
            .environments()
            .into_iter()
            .map(str::to_string)
            .collect()
    } else {
        let requested = env.or_else(|| std::env::var(PIOENV_VAR).ok());
        vec![project.select_env(requested.as_deref())?]
    };

    if envs.is_empty() {
        bail!("no environments defined in {}", project_file.display());
    }

    let mut resolved = Vec::with_capacity(envs.len());
    for env_name in &envs {
        let mut build_env = ProjectEnvironment::new(project.clone(), env_name)?;
        debug!(
            "Resolving [env:{}] from {}",
            build_env.env_name(),
            resolver.header().display()
        );
        let name = resolver
            .apply(&mut build_env)
            .with_context(|| format!("resolving [env:{}]", build_env.env_name()))?;
        resolved.push(Resolved {
            env: Some(build_env.env_name().to_string()),
            name,
        });
    }

    Ok(resolved)
}

fn print_resolved(resolved: &[Resolved], all_envs: bool, format: &str) -> Result<()> {
    match format {
        "json" => {
            let entries: Vec<serde_json::Value> = resolved
                .iter()
                .map(|r| {
                    serde_json::json!({
                        "env": r.env,
                        "platform": r.name.platform,
                        "model": r.name.model,
                        "version": r.name.version,
                        "progname": r.name.base_name(),
                    })
                })
                .collect();

            let json = if all_envs {
                serde_json::to_string_pretty(&entries)?
            } else {
                match entries.first() {
                    Some(entry) => serde_json::to_string_pretty(entry)?,
                    None => "null".to_string(),
                }
            };
            println!("{}", json);
        }
        _ => {
            for r in resolved {
                match (&r.env, all_envs) {
                    (Some(env), true) => println!("{}: {}", env, r.name),
                    _ => println!("{}", r.name),
                }
            }
        }
    }

    Ok(())
}

fn cmd_extract(header: &Path, names: &[String]) -> Result<()> {
    for name in names {
        let value = extract_macro_value_from_file(header, name)?;
        println!("{}={}", name, value);
    }

    Ok(())
}

fn cmd_macros(header: &Path, format: &str) -> Result<()> {
    let macros = HeaderMacros::from_file(header)?;
    if macros.is_empty() {
        debug!("No #define directives in {}", header.display());
    }

    if format == "json" {
        let json = serde_json::to_string_pretty(macros.definitions())?;
        println!("{}", json);
    } else {
        for def in macros.definitions() {
            match &def.value {
                Some(value) => println!("{} = {}", def.name, value),
                None => println!("{}", def.name),
            }
        }
    }

    Ok(())
}
