// Configuration validation and summary display
// Used by the `validate` subcommand and before every run

use crate::config::Config;
use crate::types::EventType;
use anyhow::{Context, Result};

/// Validate `config` and print a human-readable summary of what will run
pub fn display_config_summary(config: &Config, config_path: &str) -> Result<()> {
    config
        .validate()
        .with_context(|| format!("invalid config {}", config_path))?;

    let fe = &config.fill_events;
    println!("Config file parsed successfully: {}", config_path);
    println!();
    println!("┌─ Fill Events ─────────────────────────────────────────────────────────┐");
    println!("│ Workload:        FILL_EVENTS_{}", fe.specification.as_str());
    println!("│ Operations:      {}", config.num_operations);
    println!(
        "│ Events/op:       {}..={} (uniform)",
        fe.num_events.minimum, fe.num_events.maximum
    );
    println!(
        "│ Artifact α:      {} ({})",
        fe.artifact_node_popularity.dirichlet_alpha,
        skew_label(fe.artifact_node_popularity.dirichlet_alpha)
    );
    println!(
        "│ Execution α:     {} ({})",
        fe.execution_node_popularity.dirichlet_alpha,
        skew_label(fe.execution_node_popularity.dirichlet_alpha)
    );
    match config.seed {
        Some(seed) => println!("│ Seed:            {}", seed),
        None => println!("│ Seed:            random"),
    }
    println!("└──────────────────────────────────────────────────────────────────────┘");
    println!();
    println!("┌─ Store Population ────────────────────────────────────────────────────┐");
    println!("│ Artifacts:       {}", config.population.artifacts);
    println!("│ Executions:      {}", config.population.executions);
    println!("└──────────────────────────────────────────────────────────────────────┘");

    if let Some(warning) = output_capacity_warning(config) {
        println!();
        println!("WARNING: {}", warning);
    }
    Ok(())
}

fn skew_label(alpha: f64) -> &'static str {
    if alpha < 0.1 {
        "highly skewed"
    } else if alpha < 10.0 {
        "skewed"
    } else {
        "near uniform"
    }
}

/// OUTPUT runs need one unused artifact per event; flag configs that can
/// request more than the population holds.
pub fn output_capacity_warning(config: &Config) -> Option<String> {
    if config.fill_events.specification != EventType::Output {
        return None;
    }
    let worst_case = config
        .num_operations
        .saturating_mul(config.fill_events.num_events.maximum);
    if worst_case <= config.population.artifacts {
        return None;
    }
    Some(format!(
        "up to {} OUTPUT events requested but only {} artifacts exist; set-up fails once every drawable artifact is used",
        worst_case, config.population.artifacts
    ))
}
