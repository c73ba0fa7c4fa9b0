use std::path::PathBuf;

use anyhow::{Context as _, Result};
use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use snp_motion_execution::config::DEFAULT_NODE_NAME;
use snp_motion_execution::node::ParameterOverrides;
use snp_motion_execution::{Context, ExecutionSimulatorNode, SimulatorConfig};

/// Simulated FollowJointTrajectory execution server
#[derive(Parser)]
#[command(name = "execution_simulator_node", about = "Simulated robot execution node")]
struct Cli {
    /// Name of the node
    #[arg(long, default_value = DEFAULT_NODE_NAME)]
    node_name: String,

    /// ROS 2 style YAML parameter file
    #[arg(long)]
    params_file: Option<PathBuf>,

    /// Parameter override, e.g. -p follow_joint_trajectory_action:=arm_controller/follow_joint_trajectory
    #[arg(short = 'p', long = "param", value_name = "NAME:=VALUE")]
    params: Vec<String>,
}

impl Cli {
    /// Params file first, then command line overrides on top
    fn into_config(self) -> Result<SimulatorConfig> {
        let mut config = SimulatorConfig::new(self.node_name);
        if let Some(path) = &self.params_file {
            config = config
                .with_params_file(path)
                .with_context(|| format!("loading {}", path.display()))?;
        }
        for assignment in &self.params {
            let (name, value) = ParameterOverrides::parse_assignment(assignment)?;
            config = config.with_parameter(&name, value);
        }
        Ok(config)
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let config = Cli::parse().into_config()?;

    let context = Context::new();
    let mut simulator = ExecutionSimulatorNode::start(&context, config)?;

    tokio::select! {
        signal = tokio::signal::ctrl_c() => {
            signal?;
            info!("Received shutdown signal");
        }
        _ = context.wait_for_shutdown() => {}
    }

    simulator.shutdown()?;
    context.shutdown();
    Ok(())
}
