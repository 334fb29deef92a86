// Command-line front end: compile a template file and render it

use anyhow::{bail, Context as _, Result};
use clap::{Arg, ArgAction, ArgMatches};
use std::path::Path;

use crate::config::{load_context, EngineSettings};
use crate::domain::context::Context;
use crate::domain::template::engine::{Engine, Template};
use crate::domain::template::library::Registry;

pub fn command() -> clap::Command {
    clap::Command::new("templet")
        .about("Render text templates")
        .arg(
            Arg::new("template")
                .value_name("TEMPLATE")
                .help("Path to the template file")
                .required(true),
        )
        .arg(
            Arg::new("context")
                .short('c')
                .long("context")
                .value_name("CONTEXT")
                .help("YAML or JSON file holding the template variables"),
        )
        .arg(
            Arg::new("settings")
                .short('s')
                .long("settings")
                .value_name("SETTINGS")
                .help("Path to a YAML file containing engine settings"),
        )
        .arg(
            Arg::new("no_autoescape")
                .long("no-autoescape")
                .action(ArgAction::SetTrue)
                .help("Write variables without HTML escaping"),
        )
        .arg(
            Arg::new("nodes")
                .long("nodes")
                .value_name("KIND")
                .help("List the compiled nodes of this kind instead of rendering"),
        )
        .arg(
            Arg::new("verbose")
                .short('v')
                .long("verbose")
                .action(ArgAction::Count)
                .help("Increase log output (-v debug, -vv trace)"),
        )
}

/// Install a stderr subscriber at a level picked by the `-v` count
pub fn init_logging(verbosity: u8) {
    let level = match verbosity {
        0 => tracing::Level::WARN,
        1 => tracing::Level::DEBUG,
        _ => tracing::Level::TRACE,
    };
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_max_level(level)
        .with_target(false)
        .try_init()
        .ok();
}

pub fn run(matches: &ArgMatches) -> Result<()> {
    let template_path = matches
        .get_one::<String>("template")
        .context("No template given")?;

    let mut settings = match matches.get_one::<String>("settings") {
        Some(path) => EngineSettings::load(Path::new(path))?,
        None => EngineSettings::default(),
    };
    if matches.get_flag("no_autoescape") {
        settings.autoescape = false;
    }

    let source = std::fs::read_to_string(template_path)
        .with_context(|| format!("Could not read template {}", template_path))?;
    let engine = Engine::new(Registry::with_defaults()?, settings);
    let mut template = engine.template(&source);
    fail_on_error(&template, template_path)?;

    if let Some(kind) = matches.get_one::<String>("nodes") {
        for node in template.nodes_by_kind(kind) {
            println!("{}", node.describe());
        }
        return Ok(());
    }

    let mut ctx = match matches.get_one::<String>("context") {
        Some(path) => load_context(Path::new(path))?,
        None => Context::new(),
    };
    ctx.set_autoescape(engine.settings().autoescape);

    let output = template.render(&mut ctx);
    print!("{}", output);
    fail_on_error(&template, template_path)
}

fn fail_on_error(template: &Template, path: &str) -> Result<()> {
    match template.last_error() {
        Some(err) => bail!("{}: {} in {}", err.kind(), err, path),
        None => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_arguments() {
        let matches = command()
            .try_get_matches_from([
                "templet",
                "page.txt",
                "-c",
                "vars.yml",
                "--no-autoescape",
                "-vv",
            ])
            .unwrap();
        assert_eq!(matches.get_one::<String>("template").unwrap(), "page.txt");
        assert_eq!(matches.get_one::<String>("context").unwrap(), "vars.yml");
        assert!(matches.get_flag("no_autoescape"));
        assert_eq!(matches.get_count("verbose"), 2);
        assert!(matches.get_one::<String>("nodes").is_none());
    }

    #[test]
    fn test_template_is_required() {
        assert!(command().try_get_matches_from(["templet"]).is_err());
    }

    #[test]
    fn test_run_reports_compile_errors() {
        let mut file = tempfile::Builder::new().suffix(".txt").tempfile().unwrap();
        std::io::Write::write_all(&mut file, b"{% if x %}open").unwrap();
        let path = file.path().to_str().unwrap().to_string();

        let matches = command().try_get_matches_from(["templet", path.as_str()]).unwrap();
        let err = run(&matches).unwrap_err();
        assert!(err.to_string().starts_with("UnclosedTagError"));
    }
}
