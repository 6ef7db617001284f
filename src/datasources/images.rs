use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use tracing::trace;
use uuid::Uuid;

use crate::api::{self, ListParams, OxideApi};
use crate::handler::{DataSourceHandler, OpResponse};
use crate::schema::{AttrType, Attribute, Schema};
use crate::timeouts::OpContext;
use crate::value::{ResourceData, Value};

fn image_entry(image: &api::Image) -> Value {
    let mut entry = BTreeMap::new();
    entry.insert("id".to_string(), Value::from(image.id.clone()));
    entry.insert(
        "project_id".to_string(),
        Value::from_opt_string(image.project_id.clone()),
    );
    entry.insert("name".to_string(), Value::from(image.name.clone()));
    entry.insert(
        "description".to_string(),
        Value::from(image.description.clone()),
    );
    entry.insert("os".to_string(), Value::from(image.os.clone()));
    entry.insert("version".to_string(), Value::from(image.version.clone()));
    entry.insert("block_size".to_string(), Value::from(image.block_size));
    entry.insert("size".to_string(), Value::from(image.size));
    entry.insert(
        "digest".to_string(),
        Value::from_opt_string(image.digest.clone()),
    );
    entry.insert("url".to_string(), Value::from_opt_string(image.url.clone()));
    entry.insert(
        "time_created".to_string(),
        Value::from(image.time_created.to_rfc3339()),
    );
    entry.insert(
        "time_modified".to_string(),
        Value::from(image.time_modified.to_rfc3339()),
    );
    Value::Map(entry)
}

// ─── oxide_images ───────────────────────────────────────────────────────────

/// All images within one project.
pub struct ImagesDataSource {
    api: Arc<dyn OxideApi>,
}

impl ImagesDataSource {
    pub fn new(api: Arc<dyn OxideApi>) -> Self {
        Self { api }
    }
}

#[async_trait]
impl DataSourceHandler for ImagesDataSource {
    fn type_name(&self) -> &'static str {
        "oxide_images"
    }

    fn schema(&self) -> Schema {
        Schema::new()
            .attr(Attribute::required(
                "project_id",
                AttrType::String,
                "ID of the project that contains the images.",
            ))
            .attr(Attribute::computed("id", AttrType::String, "Datasource payload ID."))
            .attr(Attribute::computed(
                "images",
                AttrType::ObjectList,
                "All images within the project.",
            ))
            .attr(Attribute::optional(
                "timeouts",
                AttrType::StringMap,
                "Per-phase operation timeouts.",
            ))
    }

    async fn read(&self, ctx: &OpContext, config: &ResourceData) -> OpResponse {
        if let Err(e) = ctx.check() {
            return OpResponse::timeout(self.type_name(), e);
        }

        let project = config.get_str("project_id").unwrap_or_default();
        let page = match self.api.image_list(&project, &ListParams::default()).await {
            Ok(p) => p,
            Err(e) => {
                return OpResponse::error("Unable to list images", format!("API error: {}", e))
            }
        };
        trace!(count = page.items.len(), project = %project, "read project images");

        let mut state = config.clone();
        state.set_id(&Uuid::new_v4().to_string());
        state.set(
            "images",
            Value::List(page.items.iter().map(image_entry).collect()),
        );
        OpResponse::state(state)
    }
}

// ─── oxide_image ────────────────────────────────────────────────────────────

/// A single image within a project, looked up by name.
pub struct ImageDataSource {
    api: Arc<dyn OxideApi>,
}

impl ImageDataSource {
    pub fn new(api: Arc<dyn OxideApi>) -> Self {
        Self { api }
    }
}

#[async_trait]
impl DataSourceHandler for ImageDataSource {
    fn type_name(&self) -> &'static str {
        "oxide_image"
    }

    fn schema(&self) -> Schema {
        Schema::new()
            .attr(Attribute::required(
                "project_id",
                AttrType::String,
                "ID of the project that contains the image.",
            ))
            .attr(Attribute::required(
                "name",
                AttrType::String,
                "Name of the image to look up.",
            ))
            .attr(Attribute::computed("id", AttrType::String, "ID of the image."))
            .attr(Attribute::computed(
                "description",
                AttrType::String,
                "Description for the image.",
            ))
            .attr(Attribute::computed("os", AttrType::String, "OS image distribution."))
            .attr(Attribute::computed("version", AttrType::String, "OS image version."))
            .attr(Attribute::computed(
                "block_size",
                AttrType::Int,
                "Size of blocks in bytes.",
            ))
            .attr(Attribute::computed("size", AttrType::Int, "Total size in bytes."))
            .attr(Attribute::computed(
                "time_created",
                AttrType::String,
                "Timestamp of when this image was created.",
            ))
            .attr(Attribute::computed(
                "time_modified",
                AttrType::String,
                "Timestamp of when this image was last modified.",
            ))
            .attr(Attribute::optional(
                "timeouts",
                AttrType::StringMap,
                "Per-phase operation timeouts.",
            ))
    }

    async fn read(&self, ctx: &OpContext, config: &ResourceData) -> OpResponse {
        if let Err(e) = ctx.check() {
            return OpResponse::timeout(self.type_name(), e);
        }

        let project = config.get_str("project_id").unwrap_or_default();
        let name = config.get_str("name").unwrap_or_default();
        let page = match self.api.image_list(&project, &ListParams::default()).await {
            Ok(p) => p,
            Err(e) => {
                return OpResponse::error("Unable to read image", format!("API error: {}", e))
            }
        };
        let Some(image) = page.items.into_iter().find(|i| i.name == name) else {
            return OpResponse::error(
                "Unable to read image",
                format!("no image named \"{}\" in project {}", name, project),
            );
        };
        trace!(id = %image.id, "read image");

        let mut state = config.clone();
        state.set_id(&image.id);
        state.set("description", image.description.as_str());
        state.set("os", image.os.as_str());
        state.set("version", image.version.as_str());
        state.set("block_size", image.block_size);
        state.set("size", image.size);
        state.set("time_created", image.time_created.to_rfc3339());
        state.set("time_modified", image.time_modified.to_rfc3339());
        OpResponse::state(state)
    }
}

// ─── oxide_global_images (legacy) ───────────────────────────────────────────

/// Silo-wide images, the distillation-era list view.
pub struct GlobalImagesDataSource {
    api: Arc<dyn OxideApi>,
}

impl GlobalImagesDataSource {
    pub fn new(api: Arc<dyn OxideApi>) -> Self {
        Self { api }
    }
}

#[async_trait]
impl DataSourceHandler for GlobalImagesDataSource {
    fn type_name(&self) -> &'static str {
        "oxide_global_images"
    }

    fn schema(&self) -> Schema {
        Schema::new()
            .attr(Attribute::computed("id", AttrType::String, "Datasource payload ID."))
            .attr(Attribute::computed(
                "global_images",
                AttrType::ObjectList,
                "All silo-wide images.",
            ))
            .attr(Attribute::optional(
                "timeouts",
                AttrType::StringMap,
                "Per-phase operation timeouts.",
            ))
    }

    async fn read(&self, ctx: &OpContext, config: &ResourceData) -> OpResponse {
        if let Err(e) = ctx.check() {
            return OpResponse::timeout(self.type_name(), e);
        }

        let page = match self.api.global_image_list(&ListParams::default()).await {
            Ok(p) => p,
            Err(e) => {
                return OpResponse::error(
                    "Unable to list global images",
                    format!("API error: {}", e),
                )
            }
        };
        trace!(count = page.items.len(), "read global images");

        let mut state = config.clone();
        state.set_id(&Uuid::new_v4().to_string());
        state.set(
            "global_images",
            Value::List(page.items.iter().map(image_entry).collect()),
        );
        OpResponse::state(state)
    }
}
