// End-to-end behaviour of the simulated execution server through the
// in-process action transport: accept everything, succeed immediately,
// acknowledge every cancellation.

use std::io::Write;

use snp_motion_execution::action::{ActionClient, CancelResponse, GoalId, GoalStatus};
use snp_motion_execution::config::{DEFAULT_FJT_ACTION, FJT_ACTION_PARAM};
use snp_motion_execution::msg::builtin_interfaces::Duration;
use snp_motion_execution::msg::control_msgs::{
    FollowJointTrajectory, FollowJointTrajectoryGoal, FollowJointTrajectoryResult,
};
use snp_motion_execution::msg::trajectory_msgs::{JointTrajectory, JointTrajectoryPoint};
use snp_motion_execution::node::ParameterOverrides;
use snp_motion_execution::{Context, Error, ExecutionSimulatorNode, SimulatorConfig};

fn client(context: &Context, action_name: &str) -> ActionClient<FollowJointTrajectory> {
    context
        .create_node("test_client", ParameterOverrides::default())
        .unwrap()
        .create_action_client(action_name)
        .unwrap()
}

fn six_axis_goal() -> FollowJointTrajectoryGoal {
    let joint_names: Vec<String> = (1..=6).map(|i| format!("joint_{i}")).collect();
    let points = (0..5)
        .map(|step| JointTrajectoryPoint {
            positions: vec![0.1 * step as f64; 6],
            velocities: vec![0.0; 6],
            accelerations: vec![0.0; 6],
            time_from_start: Duration::from_secs_f64(0.5 * step as f64),
            ..Default::default()
        })
        .collect();

    FollowJointTrajectoryGoal {
        trajectory: JointTrajectory {
            joint_names,
            points,
            ..Default::default()
        },
        ..Default::default()
    }
}

async fn run_goal(
    client: &ActionClient<FollowJointTrajectory>,
    goal: FollowJointTrajectoryGoal,
) -> (GoalStatus, FollowJointTrajectoryResult) {
    let handle = client.send_goal(goal).await.unwrap();
    handle.get_result().await.unwrap()
}

async fn goal_from_other_context(context: &Context) -> GoalId {
    let client = client(context, DEFAULT_FJT_ACTION);
    client.send_goal(six_axis_goal()).await.unwrap().goal_id()
}

#[tokio::test]
async fn every_goal_is_accepted_and_succeeds() {
    let context = Context::new();
    let _simulator = ExecutionSimulatorNode::start(&context, SimulatorConfig::default()).unwrap();
    let client = client(&context, DEFAULT_FJT_ACTION);

    for _ in 0..10 {
        let (status, result) = run_goal(&client, six_axis_goal()).await;
        assert_eq!(status, GoalStatus::Succeeded);
        assert_eq!(result.error_code, FollowJointTrajectoryResult::SUCCESSFUL);
        assert!(result.error_string.is_empty());
    }
}

#[tokio::test]
async fn goal_with_no_waypoints_succeeds() {
    let context = Context::new();
    let _simulator = ExecutionSimulatorNode::start(&context, SimulatorConfig::default()).unwrap();
    let client = client(&context, DEFAULT_FJT_ACTION);

    let goal = FollowJointTrajectoryGoal {
        trajectory: JointTrajectory {
            joint_names: vec!["joint_1".to_string()],
            points: Vec::new(),
            ..Default::default()
        },
        ..Default::default()
    };
    let (status, result) = run_goal(&client, goal).await;

    assert_eq!(status, GoalStatus::Succeeded);
    assert!(result.is_successful());
}

#[tokio::test]
async fn malformed_joint_names_are_not_validated() {
    let context = Context::new();
    let _simulator = ExecutionSimulatorNode::start(&context, SimulatorConfig::default()).unwrap();
    let client = client(&context, DEFAULT_FJT_ACTION);

    let mut goal = six_axis_goal();
    goal.trajectory.joint_names = vec![
        String::new(),
        "joint 1".to_string(),
        "joint 1".to_string(),
    ];
    let (status, result) = run_goal(&client, goal).await;

    assert_eq!(status, GoalStatus::Succeeded);
    assert!(result.is_successful());
}

#[tokio::test]
async fn goal_replayed_from_json_fixture_succeeds() {
    let context = Context::new();
    let _simulator = ExecutionSimulatorNode::start(&context, SimulatorConfig::default()).unwrap();
    let client = client(&context, DEFAULT_FJT_ACTION);

    let goal: FollowJointTrajectoryGoal = serde_json::from_str(
        r#"{
            "trajectory": {
                "header": {"frame_id": "base_link"},
                "joint_names": ["shoulder_pan", "shoulder_lift", "elbow"],
                "points": [
                    {"positions": [0.0, -1.57, 1.57], "time_from_start": {"sec": 0}},
                    {"positions": [0.5, -1.2, 1.4], "time_from_start": {"sec": 2, "nanosec": 500000000}}
                ]
            },
            "goal_time_tolerance": {"sec": 1}
        }"#,
    )
    .unwrap();
    let (status, result) = run_goal(&client, goal).await;

    assert_eq!(status, GoalStatus::Succeeded);
    assert!(result.is_successful());
}

#[tokio::test]
async fn cancel_of_completed_goal_is_accepted() {
    let context = Context::new();
    let simulator = ExecutionSimulatorNode::start(&context, SimulatorConfig::default()).unwrap();
    let client = client(&context, DEFAULT_FJT_ACTION);

    let handle = client.send_goal(six_axis_goal()).await.unwrap();
    let (status, _) = handle.get_result().await.unwrap();
    assert_eq!(status, GoalStatus::Succeeded);

    assert_eq!(handle.cancel().await.unwrap(), CancelResponse::Accept);
    assert_eq!(
        client.cancel_goal(handle.goal_id()).await.unwrap(),
        CancelResponse::Accept
    );
    assert_eq!(handle.status(), GoalStatus::Succeeded);
    assert!(simulator.served_action_name().is_some());
}

#[tokio::test]
async fn cancel_of_in_flight_goal_is_accepted() {
    let context = Context::new();
    let _simulator = ExecutionSimulatorNode::start(&context, SimulatorConfig::default()).unwrap();
    let client = client(&context, DEFAULT_FJT_ACTION);

    // On the current-thread test runtime the execute task has not run yet.
    let handle = client.send_goal(six_axis_goal()).await.unwrap();
    assert_eq!(handle.cancel().await.unwrap(), CancelResponse::Accept);
    assert_eq!(handle.status(), GoalStatus::Canceling);

    // Execution still finishes as a success.
    let (status, result) = handle.get_result().await.unwrap();
    assert_eq!(status, GoalStatus::Succeeded);
    assert!(result.is_successful());
}

#[tokio::test]
async fn cancel_of_unknown_goal_is_an_error() {
    let context = Context::new();
    let _simulator = ExecutionSimulatorNode::start(&context, SimulatorConfig::default()).unwrap();
    let client = client(&context, DEFAULT_FJT_ACTION);

    let other_context = Context::new();
    let _other = ExecutionSimulatorNode::start(&other_context, SimulatorConfig::default()).unwrap();
    let foreign = goal_from_other_context(&other_context).await;

    assert!(matches!(
        client.cancel_goal(foreign).await,
        Err(Error::UnknownGoal(id)) if id == foreign
    ));
}

#[tokio::test]
async fn custom_action_name_is_the_only_reachable_endpoint() {
    let context = Context::new();
    let config =
        SimulatorConfig::default().with_action_name("arm_controller/follow_joint_trajectory");
    let simulator = ExecutionSimulatorNode::start(&context, config).unwrap();
    assert_eq!(
        simulator.served_action_name(),
        Some("/arm_controller/follow_joint_trajectory")
    );

    let custom = client(&context, "/arm_controller/follow_joint_trajectory");
    assert!(custom.server_is_ready());
    let (status, _) = run_goal(&custom, six_axis_goal()).await;
    assert_eq!(status, GoalStatus::Succeeded);

    let default = client(&context, DEFAULT_FJT_ACTION);
    assert!(!default.server_is_ready());
    assert!(matches!(
        default.send_goal(six_axis_goal()).await,
        Err(Error::ServerUnavailable(name)) if name == "/joint_trajectory_action"
    ));
}

#[tokio::test]
async fn action_name_from_params_file_and_cli_override() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(
        file,
        "motion_execution_server_sim:\n  ros__parameters:\n    {FJT_ACTION_PARAM}: file_action"
    )
    .unwrap();

    let context = Context::new();
    let config = SimulatorConfig::default()
        .with_params_file(file.path())
        .unwrap();
    let from_file = ExecutionSimulatorNode::start(&context, config).unwrap();
    assert_eq!(from_file.action_name(), Some("file_action"));
    assert!(client(&context, "file_action").server_is_ready());

    let config = SimulatorConfig::new("second_sim")
        .with_params_file(file.path())
        .unwrap()
        .with_action_name("cli_action");
    let overridden = ExecutionSimulatorNode::start(&context, config).unwrap();
    assert_eq!(overridden.action_name(), Some("cli_action"));
}

#[tokio::test]
async fn second_server_on_same_name_is_refused() {
    let context = Context::new();
    let _first = ExecutionSimulatorNode::start(&context, SimulatorConfig::default()).unwrap();

    let second = ExecutionSimulatorNode::start(&context, SimulatorConfig::new("second_sim"));
    assert!(matches!(
        second,
        Err(Error::ActionNameInUse(name)) if name == "/joint_trajectory_action"
    ));
}

#[tokio::test]
async fn shutdown_releases_the_action_name() {
    let context = Context::new();
    let mut simulator =
        ExecutionSimulatorNode::start(&context, SimulatorConfig::default()).unwrap();
    let client = client(&context, DEFAULT_FJT_ACTION);
    assert!(client.server_is_ready());

    simulator.shutdown().unwrap();
    assert!(!client.server_is_ready());

    let _replacement =
        ExecutionSimulatorNode::start(&context, SimulatorConfig::new("replacement_sim")).unwrap();
    let (status, _) = run_goal(&client, six_axis_goal()).await;
    assert_eq!(status, GoalStatus::Succeeded);
}

#[tokio::test]
async fn shared_params_file_with_arrays_and_nested_maps_starts_node() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    write!(
        file,
        r#"
/**:
  ros__parameters:
    joint_names: [joint_1, joint_2]
    controller:
      rate: 10
motion_execution_server_sim:
  ros__parameters:
    {FJT_ACTION_PARAM}: arm_fjt
"#
    )
    .unwrap();

    let context = Context::new();
    let config = SimulatorConfig::default()
        .with_params_file(file.path())
        .unwrap();
    let simulator = ExecutionSimulatorNode::start(&context, config).unwrap();
    assert_eq!(simulator.action_name(), Some("arm_fjt"));

    let client = client(&context, "arm_fjt");
    let (status, result) = run_goal(&client, six_axis_goal()).await;
    assert_eq!(status, GoalStatus::Succeeded);
    assert!(result.is_successful());
}
