mod common;

use std::sync::Arc;

use common::{ctx, data, FakeOxide};
use oxide_provider::api::ExternalIp;
use oxide_provider::datasources::{
    GlobalImagesDataSource, InstanceExternalIpsDataSource, ProjectDataSource, ProjectsDataSource,
};
use oxide_provider::handler::DataSourceHandler;
use oxide_provider::timeouts::Phase;
use oxide_provider::value::ResourceData;

#[tokio::test]
async fn projects_materialise_a_list_view() {
    let api = Arc::new(FakeOxide::new());
    api.seed_project("alpha");
    api.seed_project("beta");

    let source = ProjectsDataSource::new(api.clone());
    let read = source.read(&ctx(Phase::Read), &ResourceData::new()).await;
    assert!(!read.diagnostics.has_errors());

    let state = read.state.unwrap();
    assert!(!state.id().is_empty());
    let projects = state.get("projects");
    assert_eq!(projects.as_list().unwrap().len(), 2);
}

#[tokio::test]
async fn project_lookup_by_name() {
    let api = Arc::new(FakeOxide::new());
    let seeded = api.seed_project("wanted");
    api.seed_project("other");

    let source = ProjectDataSource::new(api.clone());
    let read = source.read(&ctx(Phase::Read), &data(&[("name", "wanted")])).await;
    assert!(!read.diagnostics.has_errors());
    assert_eq!(read.state.unwrap().id(), seeded.id);
}

#[tokio::test]
async fn project_lookup_miss_is_an_error() {
    let api = Arc::new(FakeOxide::new());
    let source = ProjectDataSource::new(api.clone());
    let read = source.read(&ctx(Phase::Read), &data(&[("name", "missing")])).await;
    assert!(read.diagnostics.has_errors());
}

#[tokio::test]
async fn instance_external_ips_list() {
    let api = Arc::new(FakeOxide::new());
    let project = api.seed_project("p");
    let instance = api.seed_instance(&project.id, "vm", oxide_provider::api::InstanceState::Running);
    api.set_external_ips(
        &instance.id,
        vec![ExternalIp {
            ip: "203.0.113.20".to_string(),
            kind: "ephemeral".to_string(),
        }],
    );

    let source = InstanceExternalIpsDataSource::new(api.clone());
    let read = source
        .read(&ctx(Phase::Read), &data(&[("instance_id", &instance.id)]))
        .await;
    assert!(!read.diagnostics.has_errors());

    let state = read.state.unwrap();
    let ips = state.get("external_ips");
    let items = ips.as_list().unwrap();
    assert_eq!(items.len(), 1);
    let entry = items[0].as_map().unwrap();
    assert_eq!(entry.get("ip").unwrap().as_str(), Some("203.0.113.20"));
    assert_eq!(entry.get("kind").unwrap().as_str(), Some("ephemeral"));
}

#[tokio::test]
async fn global_images_exclude_project_images() {
    let api = Arc::new(FakeOxide::new());
    let project = api.seed_project("p");
    api.seed_image(Some(&project.id), "project-scoped");
    api.seed_image(None, "silo-wide");

    let source = GlobalImagesDataSource::new(api.clone());
    let read = source.read(&ctx(Phase::Read), &ResourceData::new()).await;
    assert!(!read.diagnostics.has_errors());

    let state = read.state.unwrap();
    let images = state.get("global_images");
    let items = images.as_list().unwrap();
    assert_eq!(items.len(), 1);
    assert_eq!(
        items[0].as_map().unwrap().get("name").unwrap().as_str(),
        Some("silo-wide")
    );
}
