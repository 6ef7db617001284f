use std::sync::Arc;

use async_trait::async_trait;
use tracing::trace;

use crate::api::{self, OxideApi, ProjectCreate, ProjectUpdate};
use crate::diagnostics::Diagnostics;
use crate::handler::{OpResponse, ResourceHandler};
use crate::schema::{AttrType, Attribute, Schema};
use crate::timeouts::OpContext;
use crate::value::ResourceData;

/// `oxide_project` — a project containing most other resources.
pub struct ProjectResource {
    api: Arc<dyn OxideApi>,
}

impl ProjectResource {
    pub fn new(api: Arc<dyn OxideApi>) -> Self {
        Self { api }
    }
}

fn project_to_state(state: &mut ResourceData, project: &api::Project) {
    state.set_id(&project.id);
    state.set("name", project.name.as_str());
    state.set("description", project.description.as_str());
    state.set("time_created", project.time_created.to_rfc3339());
    state.set("time_modified", project.time_modified.to_rfc3339());
}

#[async_trait]
impl ResourceHandler for ProjectResource {
    fn type_name(&self) -> &'static str {
        "oxide_project"
    }

    fn schema(&self) -> Schema {
        Schema::new()
            .attr(Attribute::required(
                "name",
                AttrType::String,
                "Name of the project.",
            ))
            .attr(Attribute::required(
                "description",
                AttrType::String,
                "Description for the project.",
            ))
            .with_common_resource_attrs()
    }

    async fn create(&self, ctx: &OpContext, plan: &ResourceData) -> OpResponse {
        if let Err(e) = ctx.check() {
            return OpResponse::timeout(self.type_name(), e);
        }

        let body = ProjectCreate {
            name: plan.get_str("name").unwrap_or_default(),
            description: plan.get_str("description").unwrap_or_default(),
        };
        let project = match self.api.project_create(&body).await {
            Ok(p) => p,
            Err(e) => {
                return OpResponse::error("Error creating oxide_project", format!("API error: {}", e))
            }
        };
        trace!(id = %project.id, name = %project.name, "created project");

        let mut state = plan.clone();
        project_to_state(&mut state, &project);
        OpResponse::state(state)
    }

    async fn read(&self, ctx: &OpContext, state: &ResourceData) -> OpResponse {
        if let Err(e) = ctx.check() {
            return OpResponse::timeout(self.type_name(), e);
        }

        match self.api.project_view(&state.id()).await {
            Ok(project) => {
                trace!(id = %project.id, "read project");
                let mut refreshed = state.clone();
                project_to_state(&mut refreshed, &project);
                OpResponse::state(refreshed)
            }
            Err(e) if e.is_not_found() => {
                let mut cleared = state.clone();
                cleared.clear_id();
                OpResponse::state(cleared)
            }
            Err(e) => OpResponse::error("Unable to read oxide_project", format!("API error: {}", e)),
        }
    }

    async fn update(
        &self,
        ctx: &OpContext,
        plan: &ResourceData,
        prior: &ResourceData,
    ) -> OpResponse {
        if let Err(e) = ctx.check() {
            return OpResponse::timeout(self.type_name(), e);
        }

        // Only ship attributes that actually changed.
        let mut body = ProjectUpdate::default();
        if plan.get_str("name") != prior.get_str("name") {
            body.name = plan.get_str("name");
        }
        if plan.get_str("description") != prior.get_str("description") {
            body.description = plan.get_str("description");
        }

        let project = match self.api.project_update(&prior.id(), &body).await {
            Ok(p) => p,
            Err(e) => {
                return OpResponse::error("Error updating oxide_project", format!("API error: {}", e))
            }
        };
        trace!(id = %project.id, "updated project");

        let mut state = plan.clone();
        project_to_state(&mut state, &project);
        OpResponse::state(state)
    }

    async fn delete(&self, ctx: &OpContext, state: &ResourceData) -> Diagnostics {
        let mut diagnostics = Diagnostics::new();
        if let Err(e) = ctx.check() {
            return OpResponse::timeout(self.type_name(), e).diagnostics;
        }

        match self.api.project_delete(&state.id()).await {
            Ok(()) => trace!(id = %state.id(), "deleted project"),
            Err(e) if e.is_not_found() => {}
            Err(e) => diagnostics
                .add_error("Error deleting oxide_project", format!("API error: {}", e)),
        }
        diagnostics
    }
}
