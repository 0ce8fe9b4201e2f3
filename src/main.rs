//! confspawn's application entry point.
//! Parses the command line, resolves the template prefix once and dispatches
//! to the spawn, value and recipe commands.

use confspawn::{
    cli::{get_args, Command, RecipeArgs, SpawnArgs, ValueArgs},
    constants::ABSENT_INDICATOR,
    error::{default_error_handler, Result},
    logger::init_logger,
    merger::SourceRoot,
    processor::{load_config_value, spawn_write, SpawnOptions},
    recipe::{run_recipe, RecipeOptions},
    scanner::Prefix,
    settings::{value_to_string, KeyMatch},
};

/// Main application entry point.
fn main() {
    let args = get_args();
    init_logger(args.verbose);

    let result = match args.command {
        Command::Spawn(spawn_args) => run_spawn(spawn_args),
        Command::Value(value_args) => run_value(value_args),
        Command::Recipe(recipe_args) => run_recipe_command(recipe_args),
    };

    if let Err(err) = result {
        default_error_handler(err);
    }
}

fn run_spawn(args: SpawnArgs) -> Result<()> {
    let sources: Vec<SourceRoot> = args
        .templates
        .iter()
        .map(|template| SourceRoot::new(template, args.recurse))
        .collect();

    let options = SpawnOptions {
        prefix: Prefix::resolve(args.prefix),
        env_mode: args.env,
        view: args.view,
        engine: args.engine,
        ..SpawnOptions::default()
    };

    let report = spawn_write(&args.config, &sources, &args.target, &options)?;
    println!(
        "Spawned {} template(s) and copied {} file(s) into '{}'.",
        report.rendered.len(),
        report.copied,
        args.target.display()
    );
    Ok(())
}

fn run_value(args: ValueArgs) -> Result<()> {
    let key_match = if args.case_fallback { KeyMatch::CaseFallback } else { KeyMatch::Exact };
    let default = args.default.map(serde_json::Value::String);

    match load_config_value(&args.config, &args.variable, args.env.as_deref(), key_match, default)? {
        Some(value) => println!("{}", value_to_string(&value)),
        None => {
            log::warn!("'{}' not found in {}", args.variable, args.config.display());
            println!("{ABSENT_INDICATOR}");
        }
    }
    Ok(())
}

fn run_recipe_command(args: RecipeArgs) -> Result<()> {
    let options = RecipeOptions {
        prefix: Prefix::resolve(args.prefix),
        env_override: args.env,
        engine: args.engine,
    };

    let reports = run_recipe(&args.recipe, &options)?;
    println!("Recipe '{}' completed, {} target(s) written.", args.recipe.display(), reports.len());
    Ok(())
}
