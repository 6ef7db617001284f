use std::sync::Arc;

use async_trait::async_trait;
use tracing::trace;

use crate::api::{self, OxideApi, VpcSubnetCreate, VpcSubnetUpdate};
use crate::diagnostics::Diagnostics;
use crate::handler::{OpResponse, ResourceHandler};
use crate::plan::Modifier;
use crate::schema::{AttrType, Attribute, Schema};
use crate::timeouts::OpContext;
use crate::value::ResourceData;

/// `oxide_vpc_subnet` — an IPv4/IPv6 block within a VPC. The IPv6 block is
/// carved out of the VPC prefix by the server when not given.
pub struct VpcSubnetResource {
    api: Arc<dyn OxideApi>,
}

impl VpcSubnetResource {
    pub fn new(api: Arc<dyn OxideApi>) -> Self {
        Self { api }
    }
}

fn subnet_to_state(state: &mut ResourceData, subnet: &api::VpcSubnet) {
    state.set_id(&subnet.id);
    state.set("vpc_id", subnet.vpc_id.as_str());
    state.set("name", subnet.name.as_str());
    state.set("description", subnet.description.as_str());
    state.set("ipv4_block", subnet.ipv4_block.as_str());
    state.set("ipv6_block", subnet.ipv6_block.as_str());
    state.set("time_created", subnet.time_created.to_rfc3339());
    state.set("time_modified", subnet.time_modified.to_rfc3339());
}

#[async_trait]
impl ResourceHandler for VpcSubnetResource {
    fn type_name(&self) -> &'static str {
        "oxide_vpc_subnet"
    }

    fn schema(&self) -> Schema {
        Schema::new()
            .attr(
                Attribute::required(
                    "vpc_id",
                    AttrType::String,
                    "ID of the VPC that will contain the subnet.",
                )
                .with_modifier(Modifier::RequiresReplace),
            )
            .attr(Attribute::required(
                "name",
                AttrType::String,
                "Name of the VPC subnet.",
            ))
            .attr(Attribute::required(
                "description",
                AttrType::String,
                "Description for the VPC subnet.",
            ))
            .attr(
                Attribute::required(
                    "ipv4_block",
                    AttrType::String,
                    "IPv4 address range for this VPC subnet in CIDR notation.",
                )
                .with_modifier(Modifier::RequiresReplace),
            )
            .attr(
                Attribute::optional_computed(
                    "ipv6_block",
                    AttrType::String,
                    "IPv6 address range for this VPC subnet in CIDR notation; \
                     assigned from the VPC prefix when omitted.",
                )
                .with_modifier(Modifier::Immutable),
            )
            .with_common_resource_attrs()
    }

    async fn create(&self, ctx: &OpContext, plan: &ResourceData) -> OpResponse {
        if let Err(e) = ctx.check() {
            return OpResponse::timeout(self.type_name(), e);
        }

        let vpc = plan.get_str("vpc_id").unwrap_or_default();
        let body = VpcSubnetCreate {
            name: plan.get_str("name").unwrap_or_default(),
            description: plan.get_str("description").unwrap_or_default(),
            ipv4_block: plan.get_str("ipv4_block").unwrap_or_default(),
            ipv6_block: plan.get_str("ipv6_block").filter(|b| !b.is_empty()),
        };
        let subnet = match self.api.vpc_subnet_create(&vpc, &body).await {
            Ok(s) => s,
            Err(e) => {
                return OpResponse::error(
                    "Error creating oxide_vpc_subnet",
                    format!("API error: {}", e),
                )
            }
        };
        trace!(id = %subnet.id, name = %subnet.name, "created VPC subnet");

        let mut state = plan.clone();
        subnet_to_state(&mut state, &subnet);
        OpResponse::state(state)
    }

    async fn read(&self, ctx: &OpContext, state: &ResourceData) -> OpResponse {
        if let Err(e) = ctx.check() {
            return OpResponse::timeout(self.type_name(), e);
        }

        match self.api.vpc_subnet_view(&state.id()).await {
            Ok(subnet) => {
                trace!(id = %subnet.id, "read VPC subnet");
                let mut refreshed = state.clone();
                subnet_to_state(&mut refreshed, &subnet);
                OpResponse::state(refreshed)
            }
            Err(e) if e.is_not_found() => {
                let mut cleared = state.clone();
                cleared.clear_id();
                OpResponse::state(cleared)
            }
            Err(e) => OpResponse::error(
                "Unable to read oxide_vpc_subnet",
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

        let mut body = VpcSubnetUpdate::default();
        if plan.get_str("name") != prior.get_str("name") {
            body.name = plan.get_str("name");
        }
        if plan.get_str("description") != prior.get_str("description") {
            body.description = plan.get_str("description");
        }

        let subnet = match self.api.vpc_subnet_update(&prior.id(), &body).await {
            Ok(s) => s,
            Err(e) => {
                return OpResponse::error(
                    "Error updating oxide_vpc_subnet",
                    format!("API error: {}", e),
                )
            }
        };
        trace!(id = %subnet.id, "updated VPC subnet");

        let mut state = plan.clone();
        subnet_to_state(&mut state, &subnet);
        OpResponse::state(state)
    }

    async fn delete(&self, ctx: &OpContext, state: &ResourceData) -> Diagnostics {
        let mut diagnostics = Diagnostics::new();
        if let Err(e) = ctx.check() {
            return OpResponse::timeout(self.type_name(), e).diagnostics;
        }

        match self.api.vpc_subnet_delete(&state.id()).await {
            Ok(()) => trace!(id = %state.id(), "deleted VPC subnet"),
            Err(e) if e.is_not_found() => {}
            Err(e) => diagnostics.add_error(
                "Error deleting oxide_vpc_subnet",
                format!("API error: {}", e),
            ),
        }
        diagnostics
    }
}
