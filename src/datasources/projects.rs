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

fn project_entry(project: &api::Project) -> Value {
    let mut entry = BTreeMap::new();
    entry.insert("id".to_string(), Value::from(project.id.clone()));
    entry.insert("name".to_string(), Value::from(project.name.clone()));
    entry.insert(
        "description".to_string(),
        Value::from(project.description.clone()),
    );
    entry.insert(
        "time_created".to_string(),
        Value::from(project.time_created.to_rfc3339()),
    );
    entry.insert(
        "time_modified".to_string(),
        Value::from(project.time_modified.to_rfc3339()),
    );
    Value::Map(entry)
}

// ─── oxide_projects ─────────────────────────────────────────────────────────

/// All projects visible to the caller.
pub struct ProjectsDataSource {
    api: Arc<dyn OxideApi>,
}

impl ProjectsDataSource {
    pub fn new(api: Arc<dyn OxideApi>) -> Self {
        Self { api }
    }
}

#[async_trait]
impl DataSourceHandler for ProjectsDataSource {
    fn type_name(&self) -> &'static str {
        "oxide_projects"
    }

    fn schema(&self) -> Schema {
        Schema::new()
            .attr(Attribute::computed("id", AttrType::String, "Datasource payload ID."))
            .attr(Attribute::computed(
                "projects",
                AttrType::ObjectList,
                "All projects visible to the caller.",
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

        let page = match self.api.project_list(&ListParams::default()).await {
            Ok(p) => p,
            Err(e) => {
                return OpResponse::error("Unable to list projects", format!("API error: {}", e))
            }
        };
        trace!(count = page.items.len(), "read all projects");

        let mut state = config.clone();
        state.set_id(&Uuid::new_v4().to_string());
        state.set(
            "projects",
            Value::List(page.items.iter().map(project_entry).collect()),
        );
        OpResponse::state(state)
    }
}

// ─── oxide_project ──────────────────────────────────────────────────────────

/// A single project, looked up by name.
pub struct ProjectDataSource {
    api: Arc<dyn OxideApi>,
}

impl ProjectDataSource {
    pub fn new(api: Arc<dyn OxideApi>) -> Self {
        Self { api }
    }
}

#[async_trait]
impl DataSourceHandler for ProjectDataSource {
    fn type_name(&self) -> &'static str {
        "oxide_project"
    }

    fn schema(&self) -> Schema {
        Schema::new()
            .attr(Attribute::required(
                "name",
                AttrType::String,
                "Name of the project to look up.",
            ))
            .attr(Attribute::computed("id", AttrType::String, "ID of the project."))
            .attr(Attribute::computed(
                "description",
                AttrType::String,
                "Description for the project.",
            ))
            .attr(Attribute::computed(
                "time_created",
                AttrType::String,
                "Timestamp of when this project was created.",
            ))
            .attr(Attribute::computed(
                "time_modified",
                AttrType::String,
                "Timestamp of when this project was last modified.",
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

        let name = config.get_str("name").unwrap_or_default();
        let project = match self.api.project_view(&name).await {
            Ok(p) => p,
            Err(e) => {
                return OpResponse::error(
                    "Unable to read project",
                    format!("API error: {}", e),
                )
            }
        };
        trace!(id = %project.id, "read project");

        let mut state = config.clone();
        state.set_id(&project.id);
        state.set("name", project.name.as_str());
        state.set("description", project.description.as_str());
        state.set("time_created", project.time_created.to_rfc3339());
        state.set("time_modified", project.time_modified.to_rfc3339());
        OpResponse::state(state)
    }
}
