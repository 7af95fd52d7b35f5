//! Autocraft CLI - plan and run crafting trees against a world file.

use anyhow::{bail, Context, Result};
use autocraft_core::{CraftingPlan, Holdings, RecipeId, RecipeStation};
use autocraft_execution::{
    DependencyResolver, EngineConfig, ExecutionEngine, ExecutionScheduler, ProducerChoices,
    SimulatedWorkbench,
};
use autocraft_storage::JsonWorld;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "autocraft")]
#[command(about = "Plan and execute multi-step crafting", long_about = None)]
struct Cli {
    /// World file with recipes, holdings and ledger
    #[arg(long, global = true, default_value = "world.json")]
    world: PathBuf,

    /// Verbose logging
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show the crafting plan for a recipe
    Plan {
        /// Recipe ID
        recipe: String,
        /// Pin a producer, as item=recipe (repeatable)
        #[arg(long = "choose")]
        choose: Vec<String>,
        /// Print the plan as JSON
        #[arg(long)]
        json: bool,
    },
    /// Show how many times a recipe can be crafted
    Max {
        /// Recipe ID
        recipe: String,
    },
    /// Plan and execute a recipe on the simulated workbench
    Craft {
        /// Recipe ID
        recipe: String,
        /// Number of repetitions
        #[arg(long, default_value = "1")]
        quantity: u32,
        /// Pin a producer, as item=recipe (repeatable)
        #[arg(long = "choose")]
        choose: Vec<String>,
        /// Write resulting holdings and ledger back to the world file
        #[arg(long)]
        save: bool,
    },
    /// List recipes, most crafted first
    Recipes {
        /// Filter by result name
        #[arg(long)]
        search: Option<String>,
        /// Crafting grid size
        #[arg(long, default_value = "3")]
        grid: u8,
        /// Station (crafting, furnace, blast_furnace, smoker)
        #[arg(long, default_value = "crafting")]
        station: String,
    },
    /// Show current holdings
    Holdings,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let store = JsonWorld::new(&cli.world);
    let mut world = store
        .load()
        .await
        .with_context(|| format!("Failed to load world file {}", cli.world.display()))?;

    let catalog = Arc::new(world.catalog());
    let mut engine = ExecutionEngine::new(
        DependencyResolver::with_config(Arc::clone(&catalog), world.config.resolver),
        ExecutionScheduler::new(world.config.scheduler),
    )
    .with_config(EngineConfig::default());

    match cli.command {
        Commands::Plan { recipe, choose, json } => {
            let choices = parse_choices(&choose)?;
            let plan = engine
                .plan(RecipeId::new(recipe), world.holdings.clone(), choices)
                .await?;

            if json {
                println!("{}", serde_json::to_string_pretty(&plan)?);
            } else {
                print_plan(&plan);
            }
        }
        Commands::Max { recipe } => {
            let max = engine
                .max_craftable(
                    RecipeId::new(&recipe),
                    world.holdings.clone(),
                    ProducerChoices::new(),
                )
                .await?;
            println!("Can craft {} x{}", recipe, max);
        }
        Commands::Craft { recipe, quantity, choose, save } => {
            let target = RecipeId::new(recipe);
            let choices = parse_choices(&choose)?;
            let plan = engine
                .plan(target.clone(), world.holdings.clone(), choices.clone())
                .await?;
            print_plan(&plan);

            if !plan.can_craft() {
                bail!("Cannot craft {} with current holdings", target);
            }
            if plan.has_recipe_choices() {
                bail!("Several recipes fit; pick one per item with --choose item=recipe");
            }
            if quantity > 1 {
                let max = engine
                    .max_craftable(target.clone(), world.holdings.clone(), choices)
                    .await?;
                if max < quantity {
                    bail!("Only {} of {} can be crafted", max, quantity);
                }
            }

            let mut bench = SimulatedWorkbench::new(Arc::clone(&catalog), world.holdings.clone());
            let report = engine
                .run(&plan, quantity, &mut bench, &mut world.ledger)
                .await?;

            println!("Actions:");
            for action in bench.actions() {
                println!("  {}", action);
            }
            if bench.shortfalls() > 0 {
                println!("Shortfalls: {}", bench.shortfalls());
            }
            println!(
                "Run {}: {} steps in {} ticks{}",
                report.run_id,
                report.steps_executed,
                report.ticks,
                if report.completed { "" } else { " (aborted)" }
            );

            world.holdings = bench.into_holdings();
            print_holdings(&world.holdings);

            if save {
                store.save(&world).await?;
                info!("Saved world to {}", store.path().display());
            }
        }
        Commands::Recipes { search, grid, station } => {
            let Some(station) = RecipeStation::parse(&station) else {
                bail!("Unknown station: {}", station);
            };
            let search = search.as_deref().unwrap_or("");
            let listed = catalog.browse(station, grid, search, &world.ledger);

            println!("{} recipes ({})", station.display_name(), listed.len());
            for recipe in listed {
                println!(
                    "  {} -> {} | crafted {}",
                    recipe.id,
                    recipe.result,
                    world.ledger.count(&recipe.result.item)
                );
            }
        }
        Commands::Holdings => print_holdings(&world.holdings),
    }

    Ok(())
}

fn init_tracing(verbose: u8) {
    let default = if verbose > 0 { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn parse_choices(args: &[String]) -> Result<ProducerChoices> {
    args.iter()
        .map(|arg| {
            let Some((item, recipe)) = arg.split_once('=') else {
                bail!("Invalid --choose value {:?}, expected item=recipe", arg);
            };
            Ok((item.trim().into(), recipe.trim().into()))
        })
        .collect()
}

fn print_plan(plan: &CraftingPlan) {
    println!(
        "Plan for {} -> {} ({})",
        plan.target_recipe(),
        plan.target_result(),
        if plan.can_craft() { "craftable" } else { "NOT craftable" }
    );
    for (i, step) in plan.steps().iter().enumerate() {
        println!("  {}. {} -> {}", i + 1, step.recipe_id, step.result);
    }
    for (item, options) in plan.recipe_choices() {
        let options: Vec<&str> = options.iter().map(RecipeId::as_str).collect();
        println!("  choose recipe for {}: {}", item, options.join(" | "));
    }
}

fn print_holdings(holdings: &Holdings) {
    println!("Holdings ({} kinds, {} items)", holdings.len(), holdings.total());
    for (item, count) in holdings.iter() {
        println!("  {} x{}", item.display_name(), count);
    }
}
