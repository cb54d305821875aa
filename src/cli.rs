//! Command line entry point.
//!
//! ```sh
//! ecobuilder load project.json
//! ecobuilder export project.json --output ./out
//! ecobuilder --config ecobuilder.yaml templates
//! ```

use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use colored::Colorize;

use crate::config::Config;
use crate::logger::{self, LogLevel};
use crate::ontology::Scenario;
use crate::persistence::{Dispatcher, FixedDirectory};
use crate::project::{LoadReport, ProjectLoader};
use crate::Result;

#[derive(Parser, Debug)]
#[command(version, about = "Build and convert DEM scenario projects", long_about = None)]
pub struct Cli {
    /// YAML configuration file
    #[arg(global = true, short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Log at debug level
    #[arg(global = true, short, long)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Load a project file into a fresh scenario and print its summary
    Load {
        /// Project file (JSON snapshot)
        project: PathBuf,
    },
    /// Load a project file and write Turtle, RDF/XML and project files
    Export {
        /// Project file (JSON snapshot)
        project: PathBuf,
        /// Output directory; format subfolders are created inside it
        #[arg(short, long)]
        output: PathBuf,
    },
    /// List the templates offered by the configured ontologies
    Templates,
}

/// Loads a project into a scenario built from the configured ontologies.
///
/// # Errors
///
/// Fails when the definitions are invalid or the project does not load.
pub fn load_project(config: &Config, path: &Path) -> Result<(Scenario, LoadReport)> {
    let mut scenario = config.build_scenario()?;
    let report = ProjectLoader::new(&mut scenario).load_file(path)?;
    Ok((scenario, report))
}

/// Runs one command, writing human readable output to `out`.
///
/// # Errors
///
/// Returns the first load, persistence or output failure.
pub fn run(command: &Command, config: &Config, out: &mut dyn Write) -> Result<()> {
    match command {
        Command::Load { project } => {
            let (scenario, report) = load_project(config, project)?;
            writeln!(out, "{} {report}", "loaded:".green())?;
            writeln!(out, "{}", scenario.summary())?;
        }
        Command::Export { project, output } => {
            let (scenario, report) = load_project(config, project)?;
            writeln!(out, "{} {report}", "loaded:".green())?;
            let written = Dispatcher::with_defaults().save_with(
                &mut FixedDirectory(output.clone()),
                &config.output.stem,
                &scenario,
            )?;
            for path in written.unwrap_or_default() {
                writeln!(out, "{} {}", "wrote:".green(), path.display())?;
            }
        }
        Command::Templates => {
            let scenario = config.build_scenario()?;
            for model in scenario.models() {
                writeln!(out, "{} ({})", model.name().bold(), model.prefix())?;
                for template in scenario.templates_of(model.id())? {
                    let relations = scenario
                        .available_relations(template.id())?
                        .iter()
                        .map(|relation| relation.name().to_string())
                        .collect::<Vec<_>>();
                    writeln!(out, "  {}: {}", template.name(), relations.join(", "))?;
                }
            }
        }
    }
    Ok(())
}

#[must_use]
pub fn main() -> ExitCode {
    let cli = Cli::parse();
    let config = cli
        .config
        .as_deref()
        .map_or_else(|| Ok(Config::default()), Config::from_file);

    let mut logger_config = config
        .as_ref()
        .map(|config| config.logger.clone())
        .unwrap_or_default();
    if cli.verbose {
        logger_config.level = LogLevel::Debug;
    }
    if let Err(err) = logger::init(&logger_config) {
        eprintln!("{err}");
    }

    let result = config.and_then(|config| run(&cli.command, &config, &mut std::io::stdout()));
    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            tracing::error!(err.msg = %err, err.detail = ?err, "command_failed");
            ExitCode::FAILURE
        }
    }
}

#[cfg(test)]
mod tests {
    use clap::CommandFactory;

    use super::*;

    #[test]
    fn verify_cli() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parses_export_with_global_flags() {
        let cli = Cli::try_parse_from([
            "ecobuilder",
            "export",
            "project.json",
            "--output",
            "out",
            "--verbose",
        ])
        .expect("arguments");
        assert!(cli.verbose);
        assert!(matches!(
            cli.command,
            Command::Export { project, output }
                if project == Path::new("project.json") && output == Path::new("out")
        ));
    }

    #[test]
    fn templates_lists_inherited_relations() {
        colored::control::set_override(false);
        let mut out = Vec::new();
        run(&Command::Templates, &Config::default(), &mut out).expect("run");
        let text = String::from_utf8(out).expect("utf-8");
        assert!(text.contains("DVA (dva)"));
        assert!(text.contains("  Artist: hasDescription, created, hasName"));
    }
}
