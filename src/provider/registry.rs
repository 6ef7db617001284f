use std::sync::Arc;

use crate::api::OxideApi;
use crate::datasources::{
    GlobalImagesDataSource, ImageDataSource, ImagesDataSource, InstanceExternalIpsDataSource,
    OrganizationsDataSource, ProjectDataSource, ProjectsDataSource,
};
use crate::handler::{DataSourceHandler, ResourceHandler};
use crate::resources::{
    DiskResource, ImageResource, InstanceDiskAttachmentResource, InstanceNicResource,
    InstanceResource, IpPoolResource, OrganizationResource, ProjectResource, SnapshotResource,
    VpcResource, VpcSubnetResource,
};

/// The declared resource and data-source surface, wired to one shared API
/// client.
pub struct Registry {
    resources: Vec<Arc<dyn ResourceHandler>>,
    data_sources: Vec<Arc<dyn DataSourceHandler>>,
}

impl Registry {
    pub fn new(api: Arc<dyn OxideApi>) -> Self {
        let resources: Vec<Arc<dyn ResourceHandler>> = vec![
            Arc::new(ProjectResource::new(api.clone())),
            Arc::new(OrganizationResource::new(api.clone())),
            Arc::new(IpPoolResource::new(api.clone())),
            Arc::new(VpcResource::new(api.clone())),
            Arc::new(VpcSubnetResource::new(api.clone())),
            Arc::new(DiskResource::new(api.clone())),
            Arc::new(SnapshotResource::new(api.clone())),
            Arc::new(ImageResource::new(api.clone())),
            Arc::new(InstanceResource::new(api.clone())),
            Arc::new(InstanceNicResource::new(api.clone())),
            Arc::new(InstanceDiskAttachmentResource::new(api.clone())),
        ];
        let data_sources: Vec<Arc<dyn DataSourceHandler>> = vec![
            Arc::new(ProjectsDataSource::new(api.clone())),
            Arc::new(ProjectDataSource::new(api.clone())),
            Arc::new(ImagesDataSource::new(api.clone())),
            Arc::new(ImageDataSource::new(api.clone())),
            Arc::new(InstanceExternalIpsDataSource::new(api.clone())),
            Arc::new(OrganizationsDataSource::new(api.clone())),
            Arc::new(GlobalImagesDataSource::new(api)),
        ];
        Self {
            resources,
            data_sources,
        }
    }

    pub fn resource(&self, type_name: &str) -> Option<Arc<dyn ResourceHandler>> {
        self.resources
            .iter()
            .find(|r| r.type_name() == type_name)
            .cloned()
    }

    pub fn data_source(&self, type_name: &str) -> Option<Arc<dyn DataSourceHandler>> {
        self.data_sources
            .iter()
            .find(|d| d.type_name() == type_name)
            .cloned()
    }

    pub fn resource_types(&self) -> Vec<&'static str> {
        self.resources.iter().map(|r| r.type_name()).collect()
    }

    pub fn data_source_types(&self) -> Vec<&'static str> {
        self.data_sources.iter().map(|d| d.type_name()).collect()
    }

    /// Full schema export for the host and the `schema` CLI subcommand.
    pub fn schemas_json(&self) -> serde_json::Value {
        let resources: serde_json::Map<String, serde_json::Value> = self
            .resources
            .iter()
            .map(|r| (r.type_name().to_string(), r.schema().to_json()))
            .collect();
        let data_sources: serde_json::Map<String, serde_json::Value> = self
            .data_sources
            .iter()
            .map(|d| (d.type_name().to_string(), d.schema().to_json()))
            .collect();
        serde_json::json!({
            "resource_schemas": resources,
            "data_source_schemas": data_sources,
        })
    }
}
