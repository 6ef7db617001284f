use std::sync::Arc;

use async_trait::async_trait;
use tracing::trace;

use crate::api::{self, OrganizationCreate, OrganizationUpdate, OxideApi};
use crate::diagnostics::Diagnostics;
use crate::handler::{OpResponse, ResourceHandler};
use crate::plan::Modifier;
use crate::schema::{AttrType, Attribute, Schema};
use crate::timeouts::OpContext;
use crate::value::ResourceData;

/// `oxide_organization` — legacy silo-level grouping. The name doubles as
/// the update identifier upstream, so it is immutable here.
pub struct OrganizationResource {
    api: Arc<dyn OxideApi>,
}

impl OrganizationResource {
    pub fn new(api: Arc<dyn OxideApi>) -> Self {
        Self { api }
    }
}

fn organization_to_state(state: &mut ResourceData, org: &api::Organization) {
    state.set_id(&org.id);
    state.set("name", org.name.as_str());
    state.set("description", org.description.as_str());
    state.set("time_created", org.time_created.to_rfc3339());
    state.set("time_modified", org.time_modified.to_rfc3339());
}

#[async_trait]
impl ResourceHandler for OrganizationResource {
    fn type_name(&self) -> &'static str {
        "oxide_organization"
    }

    fn schema(&self) -> Schema {
        Schema::new()
            .attr(
                Attribute::required("name", AttrType::String, "Name of the organization.")
                    .with_modifier(Modifier::Immutable),
            )
            .attr(Attribute::required(
                "description",
                AttrType::String,
                "Description for the organization.",
            ))
            .with_common_resource_attrs()
    }

    async fn create(&self, ctx: &OpContext, plan: &ResourceData) -> OpResponse {
        if let Err(e) = ctx.check() {
            return OpResponse::timeout(self.type_name(), e);
        }

        let body = OrganizationCreate {
            name: plan.get_str("name").unwrap_or_default(),
            description: plan.get_str("description").unwrap_or_default(),
        };
        let org = match self.api.organization_create(&body).await {
            Ok(o) => o,
            Err(e) => {
                return OpResponse::error(
                    "Error creating oxide_organization",
                    format!("API error: {}", e),
                )
            }
        };
        trace!(id = %org.id, name = %org.name, "created organization");

        let mut state = plan.clone();
        organization_to_state(&mut state, &org);
        OpResponse::state(state)
    }

    async fn read(&self, ctx: &OpContext, state: &ResourceData) -> OpResponse {
        if let Err(e) = ctx.check() {
            return OpResponse::timeout(self.type_name(), e);
        }

        match self.api.organization_view(&state.id()).await {
            Ok(org) => {
                trace!(id = %org.id, "read organization");
                let mut refreshed = state.clone();
                organization_to_state(&mut refreshed, &org);
                OpResponse::state(refreshed)
            }
            Err(e) if e.is_not_found() => {
                let mut cleared = state.clone();
                cleared.clear_id();
                OpResponse::state(cleared)
            }
            Err(e) => OpResponse::error(
                "Unable to read oxide_organization",
                format!("API error: {}", e),
            ),
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

        // The immutability of `name` is enforced at plan time; only the
        // description can reach this point changed.
        let mut body = OrganizationUpdate::default();
        if plan.get_str("description") != prior.get_str("description") {
            body.description = plan.get_str("description");
        }

        let org = match self.api.organization_update(&prior.id(), &body).await {
            Ok(o) => o,
            Err(e) => {
                return OpResponse::error(
                    "Error updating oxide_organization",
                    format!("API error: {}", e),
                )
            }
        };
        trace!(id = %org.id, "updated organization");

        let mut state = plan.clone();
        organization_to_state(&mut state, &org);
        OpResponse::state(state)
    }

    async fn delete(&self, ctx: &OpContext, state: &ResourceData) -> Diagnostics {
        let mut diagnostics = Diagnostics::new();
        if let Err(e) = ctx.check() {
            return OpResponse::timeout(self.type_name(), e).diagnostics;
        }

        match self.api.organization_delete(&state.id()).await {
            Ok(()) => trace!(id = %state.id(), "deleted organization"),
            Err(e) if e.is_not_found() => {}
            Err(e) => diagnostics.add_error(
                "Error deleting oxide_organization",
                format!("API error: {}", e),
            ),
        }
        diagnostics
    }
}
