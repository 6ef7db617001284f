mod common;

use std::sync::Arc;

use common::{ctx, data, FakeOxide};
use oxide_provider::api::{ApiError, InstanceState};
use oxide_provider::handler::ResourceHandler;
use oxide_provider::resources::InstanceNicResource;
use oxide_provider::timeouts::Phase;
use oxide_provider::value::ResourceData;

struct Fixture {
    api: Arc<FakeOxide>,
    resource: InstanceNicResource,
    instance_id: String,
    vpc_id: String,
    subnet_id: String,
}

fn setup(run_state: InstanceState) -> Fixture {
    let api = Arc::new(FakeOxide::new());
    let project = api.seed_project("nic-project");
    let vpc = api.seed_vpc(&project.id, "nic-vpc");
    let subnet = api.seed_subnet(&vpc.id, "nic-subnet");
    let instance = api.seed_instance(&project.id, "nic-instance", run_state);
    let resource = InstanceNicResource::new(api.clone());
    Fixture {
        api,
        resource,
        instance_id: instance.id,
        vpc_id: vpc.id,
        subnet_id: subnet.id,
    }
}

fn nic_plan(fixture: &Fixture) -> ResourceData {
    data(&[
        ("instance_id", &fixture.instance_id),
        ("name", "eth1"),
        ("description", "a secondary interface"),
        ("vpc_id", &fixture.vpc_id),
        ("subnet_id", &fixture.subnet_id),
    ])
}

#[tokio::test(start_paused = true)]
async fn create_stops_mutates_then_restarts() {
    let fixture = setup(InstanceState::Running);

    let created = fixture.resource.create(&ctx(Phase::Create), &nic_plan(&fixture)).await;
    assert!(!created.diagnostics.has_errors());
    let state = created.state.unwrap();
    assert!(!state.id().is_empty());
    assert!(state.get_str("mac_address").is_some());
    assert!(state.get_str("ip_address").is_some());
    assert_eq!(state.get_bool("primary"), Some(true));

    // Instance is running again afterwards.
    assert_eq!(
        fixture.api.instance_state(&fixture.instance_id),
        Some(InstanceState::Running)
    );

    // Strict ordering: stop → wait → create NIC → start.
    let calls = fixture.api.calls();
    let stop_at = calls.iter().position(|c| c == "instance_stop").unwrap();
    let create_at = calls.iter().position(|c| c == "instance_nic_create").unwrap();
    let start_at = calls.iter().position(|c| c == "instance_start").unwrap();
    assert!(stop_at < create_at && create_at < start_at);
}

#[tokio::test(start_paused = true)]
async fn failed_nic_create_leaves_instance_stopped() {
    let fixture = setup(InstanceState::Running);
    fixture.api.fail_next(
        "instance_nic_create",
        ApiError::Status {
            status: 500,
            message: "interface allocation failed".to_string(),
        },
    );

    let created = fixture.resource.create(&ctx(Phase::Create), &nic_plan(&fixture)).await;
    assert!(created.diagnostics.has_errors());
    assert!(created.state.is_none());

    // Partial progress is reported and the instance stays stopped.
    assert!(created.diagnostics.warnings().any(|w| w.summary.contains("stopped")));
    assert_eq!(
        fixture.api.instance_state(&fixture.instance_id),
        Some(InstanceState::Stopped)
    );
    assert_eq!(fixture.api.call_count("instance_start"), 0);
}

#[tokio::test(start_paused = true)]
async fn failed_restart_is_a_partial_success() {
    let fixture = setup(InstanceState::Running);
    fixture.api.fail_next(
        "instance_start",
        ApiError::Status {
            status: 500,
            message: "start rejected".to_string(),
        },
    );

    let created = fixture.resource.create(&ctx(Phase::Create), &nic_plan(&fixture)).await;
    // The NIC mutation succeeded; the stopped instance is a warning, so
    // state still persists.
    assert!(!created.diagnostics.has_errors());
    assert!(created.state.is_some());
    assert!(created
        .diagnostics
        .warnings()
        .any(|w| w.detail.contains("not") && w.detail.contains("running")));
}

#[tokio::test(start_paused = true)]
async fn vanished_instance_fails_nic_create() {
    let fixture = setup(InstanceState::Running);
    fixture.api.remove_instance(&fixture.instance_id);

    let created = fixture.resource.create(&ctx(Phase::Create), &nic_plan(&fixture)).await;
    assert!(created.diagnostics.has_errors());
    assert_eq!(fixture.api.call_count("instance_nic_create"), 0);
}

#[tokio::test(start_paused = true)]
async fn delete_runs_the_stop_sequence_and_restarts() {
    let fixture = setup(InstanceState::Running);

    let created = fixture.resource.create(&ctx(Phase::Create), &nic_plan(&fixture)).await;
    let state = created.state.unwrap();

    let diagnostics = fixture.resource.delete(&ctx(Phase::Delete), &state).await;
    assert!(!diagnostics.has_errors());
    assert_eq!(
        fixture.api.instance_state(&fixture.instance_id),
        Some(InstanceState::Running)
    );

    let calls = fixture.api.calls();
    let delete_at = calls.iter().position(|c| c == "instance_nic_delete").unwrap();
    let last_stop = calls.iter().rposition(|c| c == "instance_stop").unwrap();
    let last_start = calls.iter().rposition(|c| c == "instance_start").unwrap();
    assert!(last_stop < delete_at && delete_at < last_start);
}

#[tokio::test(start_paused = true)]
async fn update_changes_name_and_description_in_place() {
    let fixture = setup(InstanceState::Running);

    let created = fixture.resource.create(&ctx(Phase::Create), &nic_plan(&fixture)).await;
    let state = created.state.unwrap();

    let mut plan = state.clone();
    plan.set("description", "a renamed interface");
    let updated = fixture.resource.update(&ctx(Phase::Update), &plan, &state).await;
    assert!(!updated.diagnostics.has_errors());
    assert_eq!(
        updated.state.unwrap().get_str("description").as_deref(),
        Some("a renamed interface")
    );
    // No stop required for an in-place NIC update.
    assert_eq!(fixture.api.call_count("instance_stop"), 1);
}

#[tokio::test(start_paused = true)]
async fn plan_rejects_vpc_change() {
    let fixture = setup(InstanceState::Running);

    let prior = {
        let mut prior = nic_plan(&fixture);
        prior.set_id("nic-1");
        prior
    };
    let mut config = prior.clone();
    config.set("vpc_id", "a-different-vpc");

    let outcome = fixture.resource.plan(&config, &prior);
    assert!(outcome.diagnostics.has_errors());
    let error = outcome.diagnostics.errors().next().unwrap();
    assert_eq!(error.attribute.as_deref(), Some("vpc_id"));
    // Plan-time validation makes no SDK calls.
    assert!(fixture.api.calls().is_empty());
}
