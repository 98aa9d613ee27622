mod input;

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::process;

use clap::{Parser, Subcommand};
use tierkit_core::{PricingManager, Value};
use tierkit_eval::{diff, evaluate_entitlement, serialize, Snapshot};

/// SaaS pricing configuration toolkit.
#[derive(Parser)]
#[command(name = "tierkit", version, about = "SaaS pricing configuration toolkit")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Parse and validate a pricing YAML file
    Validate {
        /// Path to the pricing YAML file
        file: PathBuf,
    },

    /// Evaluate the entitlement snapshot for a plan
    Eval {
        /// Path to the pricing YAML file
        file: PathBuf,
        /// Plan to evaluate
        #[arg(long)]
        plan: String,
        /// Active add-on (repeatable)
        #[arg(long = "add-on")]
        add_ons: Vec<String>,
        /// Request variable as name=value (repeatable)
        #[arg(long = "var")]
        vars: Vec<String>,
        /// Print the snapshot as compact JSON
        #[arg(long)]
        json: bool,
    },

    /// Compare the snapshots of two plans in the same file
    Diff {
        /// Path to the pricing YAML file
        file: PathBuf,
        /// First plan
        #[arg(long)]
        plan: String,
        /// Second plan
        #[arg(long)]
        against_plan: String,
    },
}

fn main() {
    let cli = Cli::parse();
    let code = match cli.command {
        Commands::Validate { file } => cmd_validate(&file),
        Commands::Eval {
            file,
            plan,
            add_ons,
            vars,
            json,
        } => cmd_eval(&file, &plan, &add_ons, &vars, json),
        Commands::Diff {
            file,
            plan,
            against_plan,
        } => cmd_diff(&file, &plan, &against_plan),
    };
    process::exit(code);
}

fn load_manager(file: &PathBuf) -> Result<PricingManager, String> {
    let doc = input::load_document(file)?;
    tierkit_core::parse(doc).map_err(|e| e.to_string())
}

fn cmd_validate(file: &PathBuf) -> i32 {
    match load_manager(file) {
        Ok(pm) => {
            println!(
                "{}: valid ({} features, {} usage limits, {} plans, {} add-ons, version {})",
                file.display(),
                pm.features.len(),
                pm.usage_limits.len(),
                pm.plans.len(),
                pm.add_ons.len(),
                pm.version,
            );
            0
        }
        Err(e) => {
            eprintln!("error: {}", e);
            1
        }
    }
}

fn cmd_eval(file: &PathBuf, plan: &str, add_ons: &[String], vars: &[String], json: bool) -> i32 {
    let snapshot = match eval_snapshot(file, plan, add_ons, vars) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("error: {}", e);
            return 1;
        }
    };

    if json {
        match String::from_utf8(serialize(&snapshot)) {
            Ok(text) => println!("{}", text),
            Err(_) => {
                eprintln!("error: snapshot is not valid UTF-8");
                return 1;
            }
        }
    } else {
        for (id, value) in snapshot.entries() {
            println!("{} = {}", id, value);
        }
    }
    0
}

fn cmd_diff(file: &PathBuf, plan: &str, against: &str) -> i32 {
    let result = (|| -> Result<bool, String> {
        let pm = load_manager(file)?;
        let empty = BTreeMap::new();
        let a = evaluate_entitlement(&pm, plan, &[], &empty).map_err(|e| e.to_string())?;
        let b = evaluate_entitlement(&pm, against, &[], &empty).map_err(|e| e.to_string())?;
        Ok(diff(&a, &b))
    })();

    match result {
        Ok(true) => {
            println!("changed: '{}' and '{}' grant different entitlements", plan, against);
            0
        }
        Ok(false) => {
            println!("unchanged: '{}' and '{}' grant identical entitlements", plan, against);
            0
        }
        Err(e) => {
            eprintln!("error: {}", e);
            1
        }
    }
}

fn eval_snapshot(
    file: &PathBuf,
    plan: &str,
    add_ons: &[String],
    vars: &[String],
) -> Result<Snapshot, String> {
    let pm = load_manager(file)?;
    let mut variables: BTreeMap<String, Value> = BTreeMap::new();
    for raw in vars {
        let (name, value) = input::parse_var(raw)?;
        variables.insert(name, value);
    }
    evaluate_entitlement(&pm, plan, add_ons, &variables).map_err(|e| e.to_string())
}
