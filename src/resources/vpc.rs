use std::sync::Arc;

use async_trait::async_trait;
use tracing::trace;

use crate::api::{self, ListParams, OxideApi, SortMode, VpcCreate, VpcUpdate};
use crate::diagnostics::Diagnostics;
use crate::handler::{OpResponse, ResourceHandler};
use crate::plan::Modifier;
use crate::schema::{AttrType, Attribute, Schema};
use crate::timeouts::OpContext;
use crate::value::ResourceData;

/// `oxide_vpc` — a virtual network within a project. Deleting a VPC first
/// tears down any subnets still registered under it.
pub struct VpcResource {
    api: Arc<dyn OxideApi>,
}

impl VpcResource {
    pub fn new(api: Arc<dyn OxideApi>) -> Self {
        Self { api }
    }
}

fn vpc_to_state(state: &mut ResourceData, vpc: &api::Vpc) {
    state.set_id(&vpc.id);
    state.set("project_id", vpc.project_id.as_str());
    state.set("name", vpc.name.as_str());
    state.set("description", vpc.description.as_str());
    state.set("dns_name", vpc.dns_name.as_str());
    state.set("ipv6_prefix", vpc.ipv6_prefix.as_str());
    state.set("system_router_id", vpc.system_router_id.as_str());
    state.set("time_created", vpc.time_created.to_rfc3339());
    state.set("time_modified", vpc.time_modified.to_rfc3339());
}

#[async_trait]
impl ResourceHandler for VpcResource {
    fn type_name(&self) -> &'static str {
        "oxide_vpc"
    }

    fn schema(&self) -> Schema {
        Schema::new()
            .attr(
                Attribute::required(
                    "project_id",
                    AttrType::String,
                    "ID of the project that will contain the VPC.",
                )
                .with_modifier(Modifier::RequiresReplace),
            )
            .attr(Attribute::required("name", AttrType::String, "Name of the VPC."))
            .attr(Attribute::required(
                "description",
                AttrType::String,
                "Description for the VPC.",
            ))
            .attr(Attribute::required(
                "dns_name",
                AttrType::String,
                "DNS name of the VPC.",
            ))
            .attr(
                Attribute::optional_computed(
                    "ipv6_prefix",
                    AttrType::String,
                    "All IPv6 subnets created from this VPC must be taken from this range, \
                     which should be a unique local address in the range `fd00::/48`.",
                )
                .with_modifier(Modifier::Immutable),
            )
            .attr(Attribute::computed(
                "system_router_id",
                AttrType::String,
                "ID of the system router where subnet default routes are registered.",
            ))
            .with_common_resource_attrs()
    }

    async fn create(&self, ctx: &OpContext, plan: &ResourceData) -> OpResponse {
        if let Err(e) = ctx.check() {
            return OpResponse::timeout(self.type_name(), e);
        }

        let project = plan.get_str("project_id").unwrap_or_default();
        let body = VpcCreate {
            name: plan.get_str("name").unwrap_or_default(),
            description: plan.get_str("description").unwrap_or_default(),
            dns_name: plan.get_str("dns_name").unwrap_or_default(),
            ipv6_prefix: plan.get_str("ipv6_prefix").filter(|p| !p.is_empty()),
        };
        let vpc = match self.api.vpc_create(&project, &body).await {
            Ok(v) => v,
            Err(e) => {
                return OpResponse::error("Error creating oxide_vpc", format!("API error: {}", e))
            }
        };
        trace!(id = %vpc.id, name = %vpc.name, "created VPC");

        let mut state = plan.clone();
        vpc_to_state(&mut state, &vpc);
        OpResponse::state(state)
    }

    async fn read(&self, ctx: &OpContext, state: &ResourceData) -> OpResponse {
        if let Err(e) = ctx.check() {
            return OpResponse::timeout(self.type_name(), e);
        }

        match self.api.vpc_view(&state.id()).await {
            Ok(vpc) => {
                trace!(id = %vpc.id, "read VPC");
                let mut refreshed = state.clone();
                vpc_to_state(&mut refreshed, &vpc);
                OpResponse::state(refreshed)
            }
            Err(e) if e.is_not_found() => {
                let mut cleared = state.clone();
                cleared.clear_id();
                OpResponse::state(cleared)
            }
            Err(e) => OpResponse::error("Unable to read oxide_vpc", format!("API error: {}", e)),
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

        let mut body = VpcUpdate::default();
        if plan.get_str("name") != prior.get_str("name") {
            body.name = plan.get_str("name");
        }
        if plan.get_str("description") != prior.get_str("description") {
            body.description = plan.get_str("description");
        }
        if plan.get_str("dns_name") != prior.get_str("dns_name") {
            body.dns_name = plan.get_str("dns_name");
        }

        let vpc = match self.api.vpc_update(&prior.id(), &body).await {
            Ok(v) => v,
            Err(e) => {
                return OpResponse::error("Error updating oxide_vpc", format!("API error: {}", e))
            }
        };
        trace!(id = %vpc.id, "updated VPC");

        let mut state = plan.clone();
        vpc_to_state(&mut state, &vpc);
        OpResponse::state(state)
    }

    async fn delete(&self, ctx: &OpContext, state: &ResourceData) -> Diagnostics {
        let mut diagnostics = Diagnostics::new();
        if let Err(e) = ctx.check() {
            return OpResponse::timeout(self.type_name(), e).diagnostics;
        }

        // Remaining subnets block VPC deletion; sweep them first.
        let params = ListParams {
            sort_by: SortMode::IdAscending,
            ..ListParams::default()
        };
        match self.api.vpc_subnet_list(&state.id(), &params).await {
            Ok(page) => {
                for subnet in page.items {
                    if let Err(e) = ctx.check() {
                        return OpResponse::timeout(self.type_name(), e).diagnostics;
                    }
                    match self.api.vpc_subnet_delete(&subnet.id).await {
                        Ok(()) => trace!(id = %subnet.id, "deleted VPC subnet"),
                        Err(e) if e.is_not_found() => {}
                        Err(e) => {
                            diagnostics.add_error(
                                "Error deleting oxide_vpc",
                                format!("API error deleting subnet {}: {}", subnet.id, e),
                            );
                            return diagnostics;
                        }
                    }
                }
            }
            Err(e) if e.is_not_found() => {}
            Err(e) => {
                diagnostics
                    .add_error("Error deleting oxide_vpc", format!("API error: {}", e));
                return diagnostics;
            }
        }

        if let Err(e) = ctx.check() {
            return OpResponse::timeout(self.type_name(), e).diagnostics;
        }
        match self.api.vpc_delete(&state.id()).await {
            Ok(()) => trace!(id = %state.id(), "deleted VPC"),
            Err(e) if e.is_not_found() => {}
            Err(e) => {
                diagnostics.add_error("Error deleting oxide_vpc", format!("API error: {}", e))
            }
        }
        diagnostics
    }
}
