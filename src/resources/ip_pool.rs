use std::sync::Arc;

use async_trait::async_trait;
use tracing::trace;

use crate::api::{self, IpPoolCreate, IpPoolUpdate, OxideApi};
use crate::diagnostics::Diagnostics;
use crate::handler::{OpResponse, ResourceHandler};
use crate::plan::Modifier;
use crate::schema::{AttrType, Attribute, Schema};
use crate::timeouts::OpContext;
use crate::value::ResourceData;

/// `oxide_ip_pool` — a pool of external addresses. The name identifies the
/// pool in the update call, so it is immutable.
pub struct IpPoolResource {
    api: Arc<dyn OxideApi>,
}

impl IpPoolResource {
    pub fn new(api: Arc<dyn OxideApi>) -> Self {
        Self { api }
    }
}

fn ip_pool_to_state(state: &mut ResourceData, pool: &api::IpPool) {
    state.set_id(&pool.id);
    state.set("name", pool.name.as_str());
    state.set("description", pool.description.as_str());
    state.set("time_created", pool.time_created.to_rfc3339());
    state.set("time_modified", pool.time_modified.to_rfc3339());
}

#[async_trait]
impl ResourceHandler for IpPoolResource {
    fn type_name(&self) -> &'static str {
        "oxide_ip_pool"
    }

    fn schema(&self) -> Schema {
        Schema::new()
            .attr(
                Attribute::required("name", AttrType::String, "Name of the IP pool.")
                    .with_modifier(Modifier::Immutable),
            )
            .attr(Attribute::required(
                "description",
                AttrType::String,
                "Description for the IP pool.",
            ))
            .with_common_resource_attrs()
    }

    async fn create(&self, ctx: &OpContext, plan: &ResourceData) -> OpResponse {
        if let Err(e) = ctx.check() {
            return OpResponse::timeout(self.type_name(), e);
        }

        let body = IpPoolCreate {
            name: plan.get_str("name").unwrap_or_default(),
            description: plan.get_str("description").unwrap_or_default(),
        };
        let pool = match self.api.ip_pool_create(&body).await {
            Ok(p) => p,
            Err(e) => {
                return OpResponse::error("Error creating oxide_ip_pool", format!("API error: {}", e))
            }
        };
        trace!(id = %pool.id, name = %pool.name, "created IP pool");

        let mut state = plan.clone();
        ip_pool_to_state(&mut state, &pool);
        OpResponse::state(state)
    }

    async fn read(&self, ctx: &OpContext, state: &ResourceData) -> OpResponse {
        if let Err(e) = ctx.check() {
            return OpResponse::timeout(self.type_name(), e);
        }

        match self.api.ip_pool_view(&state.id()).await {
            Ok(pool) => {
                trace!(id = %pool.id, "read IP pool");
                let mut refreshed = state.clone();
                ip_pool_to_state(&mut refreshed, &pool);
                OpResponse::state(refreshed)
            }
            Err(e) if e.is_not_found() => {
                let mut cleared = state.clone();
                cleared.clear_id();
                OpResponse::state(cleared)
            }
            Err(e) => OpResponse::error("Unable to read oxide_ip_pool", format!("API error: {}", e)),
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

        let mut body = IpPoolUpdate::default();
        if plan.get_str("description") != prior.get_str("description") {
            body.description = plan.get_str("description");
        }

        let pool = match self.api.ip_pool_update(&prior.id(), &body).await {
            Ok(p) => p,
            Err(e) => {
                return OpResponse::error("Error updating oxide_ip_pool", format!("API error: {}", e))
            }
        };
        trace!(id = %pool.id, "updated IP pool");

        let mut state = plan.clone();
        ip_pool_to_state(&mut state, &pool);
        OpResponse::state(state)
    }

    async fn delete(&self, ctx: &OpContext, state: &ResourceData) -> Diagnostics {
        let mut diagnostics = Diagnostics::new();
        if let Err(e) = ctx.check() {
            return OpResponse::timeout(self.type_name(), e).diagnostics;
        }

        match self.api.ip_pool_delete(&state.id()).await {
            Ok(()) => trace!(id = %state.id(), "deleted IP pool"),
            Err(e) if e.is_not_found() => {}
            Err(e) => {
                diagnostics.add_error("Error deleting oxide_ip_pool", format!("API error: {}", e))
            }
        }
        diagnostics
    }
}
