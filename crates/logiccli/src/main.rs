// crates/logiccli/src/main.rs

use anyhow::{anyhow, bail, Result};
use clap::{Parser, Subcommand};
use logiccore::{ExecutionEvent, NodeEvent, NodeRegistry, Trigger, Value};
use logicruntime::{FlowAnalysis, FlowManager, FlowSerializer, RuntimeConfig, WriteMode};
use std::path::{Path, PathBuf};
use std::sync::Arc;

#[derive(Parser)]
#[command(name = "logicflow")]
#[command(about = "Logic Flow Engine CLI", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Execute a flow file once
    Run {
        /// Path to flow JSON file
        #[arg(short, long)]
        file: PathBuf,

        /// Event payload as a JSON array, e.g. '[5]'
        #[arg(short, long)]
        seed: Option<String>,

        /// Initial variables as a JSON object
        #[arg(long)]
        vars: Option<String>,

        /// Override the step ceiling
        #[arg(short, long)]
        ceiling: Option<usize>,

        /// Runtime config JSON file
        #[arg(long)]
        config: Option<PathBuf>,

        /// Show verbose output
        #[arg(short, long)]
        verbose: bool,
    },

    /// Print the wiring of a flow file
    Describe {
        /// Path to flow JSON file
        file: PathBuf,
    },

    /// Validate a flow file
    Validate {
        /// Path to flow JSON file
        file: PathBuf,
    },

    /// List available node types
    Nodes,

    /// Create a new example flow
    Init {
        /// Output file path
        #[arg(short, long, default_value = "flow.json")]
        output: PathBuf,

        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
}

/// Convert a serde_json::Value to logiccore::Value
fn json_to_value(json: serde_json::Value) -> Result<Value> {
    Ok(match json {
        serde_json::Value::Null => Value::Null,
        serde_json::Value::Bool(b) => Value::Bool(b),
        serde_json::Value::Number(n) => Value::Number(
            n.as_f64()
                .ok_or_else(|| anyhow!("number {} is not representable", n))?,
        ),
        serde_json::Value::String(s) => Value::Text(s),
        serde_json::Value::Array(arr) => {
            let numbers: Option<Vec<f64>> = arr.iter().map(|v| v.as_f64()).collect();
            match numbers.as_deref() {
                Some([x, y]) => Value::Vec2([*x, *y]),
                Some([x, y, z]) => Value::Vec3([*x, *y, *z]),
                _ => bail!("arrays must hold two or three numbers"),
            }
        }
        serde_json::Value::Object(_) => bail!("objects are not flow values"),
    })
}

fn build_trigger(seed: Option<String>, vars: Option<String>) -> Result<Trigger> {
    let mut trigger = Trigger::new();

    if let Some(seed) = seed {
        match serde_json::from_str::<serde_json::Value>(&seed)? {
            serde_json::Value::Array(values) => {
                for value in values {
                    trigger = trigger.with_output(json_to_value(value)?);
                }
            }
            _ => bail!("Seed must be a JSON array"),
        }
    }

    if let Some(vars) = vars {
        match serde_json::from_str::<serde_json::Value>(&vars)? {
            serde_json::Value::Object(obj) => {
                for (name, value) in obj {
                    trigger = trigger.with_variable(name, json_to_value(value)?);
                }
            }
            _ => bail!("Variables must be a JSON object"),
        }
    }

    Ok(trigger)
}

fn registry() -> Arc<NodeRegistry> {
    Arc::new(logicnodes::standard_registry())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let verbose = matches!(cli.command, Commands::Run { verbose: true, .. });
    tracing_subscriber::fmt()
        .with_max_level(if verbose {
            tracing::Level::DEBUG
        } else {
            tracing::Level::INFO
        })
        .init();

    match cli.command {
        Commands::Run {
            file,
            seed,
            vars,
            ceiling,
            config,
            ..
        } => {
            let trigger = build_trigger(seed, vars)?;
            run_flow(&file, trigger, ceiling, config.as_deref()).await?;
        }

        Commands::Describe { file } => {
            let flow = FlowSerializer::new(registry()).load(&file)?;
            print!("{}", flow.describe());
        }

        Commands::Validate { file } => {
            validate_flow(&file)?;
        }

        Commands::Nodes => {
            list_nodes();
        }

        Commands::Init { output, force } => {
            create_example_flow(&output, force)?;
        }
    }

    Ok(())
}

async fn run_flow(
    file: &Path,
    trigger: Trigger,
    ceiling: Option<usize>,
    config: Option<&Path>,
) -> Result<()> {
    println!("Loading flow from: {}", file.display());

    let config = match config {
        Some(path) => RuntimeConfig::from_json(&std::fs::read_to_string(path)?)?,
        None => RuntimeConfig::default(),
    };
    let ceiling = ceiling.unwrap_or(config.step_ceiling);

    let registry = registry();
    let flow = FlowSerializer::new(registry.clone()).load(file)?;

    println!("Flow: {}", flow.name());
    println!("   Nodes: {}", flow.len());
    println!("   Step ceiling: {}", ceiling);
    println!();

    let mut manager = FlowManager::new(flow, registry, config);

    // Subscribe to events for real-time output
    let mut events = manager.subscribe_events();

    let event_task = tokio::spawn(async move {
        while let Ok(event) = events.recv().await {
            match event {
                ExecutionEvent::RunStarted { flow_name, .. } => {
                    println!("Run of '{}' started", flow_name);
                }
                ExecutionEvent::NodeExecuted {
                    node_id,
                    node_type,
                    next,
                    ..
                } => match next {
                    Some(next) => println!("  #{} ({}) -> #{}", node_id, node_type, next),
                    None => println!("  #{} ({}) -> end", node_id, node_type),
                },
                ExecutionEvent::NodeFailed { node_id, error, .. } => {
                    println!("  #{} failed: {}", node_id, error);
                }
                ExecutionEvent::NodeEvent { node_id, event, .. } => match event {
                    NodeEvent::Message { text } => println!("     [#{}] says: {}", node_id, text),
                    NodeEvent::Info { message } => println!("     [#{}] {}", node_id, message),
                    NodeEvent::Warning { message } => {
                        println!("     [#{}] warning: {}", node_id, message)
                    }
                },
                ExecutionEvent::RunCompleted {
                    success,
                    steps,
                    duration_ms,
                    ..
                } => {
                    if success {
                        println!("Run completed in {} step(s), {}ms", steps, duration_ms);
                    } else {
                        println!("Run failed after {} step(s), {}ms", steps, duration_ms);
                    }
                }
            }
        }
    });

    let failure = manager.execute_with_ceiling(trigger, ceiling);

    // Wait for events to finish printing
    tokio::time::sleep(tokio::time::Duration::from_millis(100)).await;
    event_task.abort();

    if let Some(run) = manager.last_run() {
        println!();
        println!("Execution Summary:");
        print!("{}", run.render_trace());
    }

    match failure {
        Some(error) => Err(error.into()),
        None => Ok(()),
    }
}

fn validate_flow(file: &Path) -> Result<()> {
    println!("Validating flow: {}", file.display());

    // loading already rejects unknown types and malformed wiring
    let flow = FlowSerializer::new(registry()).load(file)?;
    let analysis = FlowAnalysis::of(&flow);

    println!("Flow is well-formed:");
    println!("   Name: {}", flow.name());
    println!("   Nodes: {}", flow.len());
    println!("   Reachable: {}", analysis.reachable.len());
    if analysis.cyclic {
        println!("   Contains cycles (runs are bounded by the step ceiling)");
    }
    for id in &analysis.unreachable {
        println!("   Warning: node #{} is unreachable from the start node", id);
    }
    for dangling in &analysis.dangling_inputs {
        println!(
            "   Warning: input {} of node #{} references missing node #{}",
            dangling.index, dangling.node, dangling.target
        );
    }

    if !analysis.dangling_inputs.is_empty() {
        bail!("{} dangling input(s)", analysis.dangling_inputs.len());
    }
    Ok(())
}

fn list_nodes() {
    println!("Available Node Types:");
    println!();

    let registry = registry();

    for node_type in registry.list_node_types() {
        if let Some(metadata) = registry.get_metadata(&node_type) {
            println!(
                "  - {} ({}): {} in, {} out, {} branch(es)",
                node_type,
                metadata.category,
                metadata.input_count(),
                metadata.output_count(),
                metadata.branch_count()
            );
            println!("    {}", metadata.description);
        } else {
            println!("  - {}", node_type);
        }
    }
}

fn create_example_flow(output: &Path, force: bool) -> Result<()> {
    let registry = registry();
    let mut manager = FlowManager::create(
        "Example Flow",
        "event.value",
        registry.clone(),
        RuntimeConfig::default(),
    )?;

    // start -> Add One -> Report
    manager.create_node("math.add", "Add One")?;
    manager.create_node("message.send", "Report")?;
    manager.set_reference_input("Add One", 0, "start", 0);
    manager.set_constant_input("Add One", 1, 1.0);
    manager.set_reference_input("Report", 0, "Add One", 0);
    manager.set_next_node("start", 0, "Add One");
    manager.set_next_node("Add One", 0, "Report");

    let mode = if force {
        WriteMode::AtomicReplace
    } else {
        WriteMode::CreateNew
    };
    FlowSerializer::new(registry).save(manager.flow(), output, mode)?;

    println!("Created example flow: {}", output.display());
    println!();
    println!("Run it with:");
    println!("  logicflow run --file {} --seed '[5]'", output.display());

    Ok(())
}
