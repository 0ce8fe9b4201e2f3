//! Command-line interface implementation for confspawn.
//! Provides argument parsing and help text formatting using clap.

use crate::renderer::Engine;
use clap::{error::ErrorKind, Args as ClapArgs, CommandFactory, Parser, Subcommand};
use std::path::PathBuf;

/// Command-line arguments structure for confspawn.
#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about = "confspawn: build configuration files from templates",
    long_about = None
)]
pub struct Args {
    #[command(subcommand)]
    pub command: Command,

    /// Enable verbose logging output
    #[arg(long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Render one or more template directories into a target directory
    Spawn(SpawnArgs),
    /// Print one value from a settings file
    Value(ValueArgs),
    /// Run every target of a recipe file
    Recipe(RecipeArgs),
}

#[derive(ClapArgs, Debug)]
pub struct SpawnArgs {
    /// Settings file (TOML, JSON or YAML)
    #[arg(short, long)]
    pub config: PathBuf,

    /// Template directory. Files without the template prefix are copied as
    /// they are. Repeat to merge several directories into one target.
    #[arg(short = 's', long = "template", required = true)]
    pub templates: Vec<PathBuf>,

    /// Target directory. It is created if missing and replaced otherwise.
    #[arg(short, long)]
    pub target: PathBuf,

    /// Traverse template directories recursively
    #[arg(short, long)]
    pub recurse: bool,

    /// Prefix marking a file as a template. Defaults to 'confspawn_' or
    /// CONFSPAWN_PREFIX when set.
    #[arg(short, long)]
    pub prefix: Option<String>,

    /// Environment mode selecting a 'confspawn_env' variant
    #[arg(short, long)]
    pub env: Option<String>,

    /// Dotted path of the settings section templates render against
    #[arg(long)]
    pub view: Option<String>,

    /// Template engine
    #[arg(long, value_enum, default_value_t = Engine::Placeholder)]
    pub engine: Engine,
}

#[derive(ClapArgs, Debug)]
pub struct ValueArgs {
    /// Settings file (TOML, JSON or YAML)
    #[arg(short, long)]
    pub config: PathBuf,

    /// Variable to print. For nested keys use e.g. 'toplevel.secondlevel.varname'.
    #[arg(short, long)]
    pub variable: String,

    /// Environment mode selecting a 'confspawn_env' variant
    #[arg(short, long)]
    pub env: Option<String>,

    /// Printed when the variable is absent
    #[arg(short, long)]
    pub default: Option<String>,

    /// Retry a missing all-lowercase or all-uppercase key in the opposite case
    #[arg(long)]
    pub case_fallback: bool,
}

#[derive(ClapArgs, Debug)]
pub struct RecipeArgs {
    /// Recipe file (TOML, JSON or YAML)
    #[arg(short, long)]
    pub recipe: PathBuf,

    /// Prefix marking a file as a template. Defaults to 'confspawn_' or
    /// CONFSPAWN_PREFIX when set.
    #[arg(short, long)]
    pub prefix: Option<String>,

    /// Environment mode used for every source, overriding the recipe
    #[arg(short, long)]
    pub env: Option<String>,

    /// Template engine
    #[arg(long, value_enum, default_value_t = Engine::Placeholder)]
    pub engine: Engine,
}

/// Parses command line arguments and returns the Args structure.
///
/// # Exits
/// * With status code 1 and the help text if required arguments are missing
/// * With clap's default error handling for other argument errors
pub fn get_args() -> Args {
    match Args::try_parse() {
        Ok(args) => args,
        Err(e) => {
            if e.kind() == ErrorKind::MissingRequiredArgument {
                let _ = Args::command()
                    .help_template(
                        r#"{about-section}
{usage-heading} {usage}

{all-args}
{after-help}
"#,
                    )
                    .print_help();
                std::process::exit(1);
            } else {
                e.exit();
            }
        }
    }
}
