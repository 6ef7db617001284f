use std::sync::Arc;

use async_trait::async_trait;
use tracing::trace;

use crate::api::{self, NetworkInterfaceCreate, NetworkInterfaceUpdate, OxideApi};
use crate::diagnostics::Diagnostics;
use crate::handler::{OpResponse, ResourceHandler};
use crate::plan::Modifier;
use crate::schema::{AttrType, Attribute, Schema};
use crate::timeouts::OpContext;
use crate::value::ResourceData;
use crate::waiter::WaitOutcome;

/// `oxide_instance_network_interface` — a NIC owned by an instance. The
/// upstream only mutates NICs on a stopped instance, so create and delete
/// run the stop → wait → mutate → start sequence; any failure after the
/// stop leaves the instance stopped, which is reported alongside the error.
pub struct InstanceNicResource {
    api: Arc<dyn OxideApi>,
}

impl InstanceNicResource {
    pub fn new(api: Arc<dyn OxideApi>) -> Self {
        Self { api }
    }

    async fn start_instance(&self, ctx: &OpContext, instance_id: &str, diagnostics: &mut Diagnostics) {
        if let Err(e) = ctx.check() {
            diagnostics.extend(OpResponse::timeout(self.type_name(), e).diagnostics);
            diagnostics.add_warning(
                "Instance left stopped",
                format!("instance {} was not restarted", instance_id),
            );
            return;
        }
        match self.api.instance_start(instance_id).await {
            Ok(_) => trace!(id = %instance_id, "started instance"),
            Err(e) => {
                // Partial success: the NIC mutation went through but the
                // instance is not running.
                diagnostics.add_warning(
                    "Unable to start associated instance",
                    format!(
                        "the network interface change succeeded but instance {} is not \
                         running: {}",
                        instance_id, e
                    ),
                );
            }
        }
    }
}

fn nic_to_state(state: &mut ResourceData, nic: &api::NetworkInterface) {
    state.set_id(&nic.id);
    state.set("instance_id", nic.instance_id.as_str());
    state.set("name", nic.name.as_str());
    state.set("description", nic.description.as_str());
    state.set("vpc_id", nic.vpc_id.as_str());
    state.set("subnet_id", nic.subnet_id.as_str());
    state.set("ip_address", nic.ip.as_str());
    state.set("mac_address", nic.mac.as_str());
    state.set("primary", nic.primary);
    state.set("time_created", nic.time_created.to_rfc3339());
    state.set("time_modified", nic.time_modified.to_rfc3339());
}

#[async_trait]
impl ResourceHandler for InstanceNicResource {
    fn type_name(&self) -> &'static str {
        "oxide_instance_network_interface"
    }

    fn schema(&self) -> Schema {
        Schema::new()
            .attr(
                Attribute::required(
                    "instance_id",
                    AttrType::String,
                    "ID of the instance to which the network interface will belong.",
                )
                .with_modifier(Modifier::RequiresReplace),
            )
            .attr(Attribute::required(
                "name",
                AttrType::String,
                "Name of the instance network interface.",
            ))
            .attr(Attribute::required(
                "description",
                AttrType::String,
                "Description for the instance network interface.",
            ))
            .attr(
                Attribute::required(
                    "subnet_id",
                    AttrType::String,
                    "ID of the VPC subnet in which to create the instance network interface.",
                )
                .with_modifier(Modifier::Immutable),
            )
            .attr(
                Attribute::required(
                    "vpc_id",
                    AttrType::String,
                    "ID of the VPC in which to create the instance network interface.",
                )
                .with_modifier(Modifier::Immutable),
            )
            .attr(
                Attribute::optional_computed(
                    "ip_address",
                    AttrType::String,
                    "IP address for the instance network interface; auto-assigned if not \
                     provided.",
                )
                .with_modifier(Modifier::RequiresReplaceUnlessEmptyStringOrNull),
            )
            .attr(Attribute::computed(
                "mac_address",
                AttrType::String,
                "MAC address assigned to the instance network interface.",
            ))
            .attr(Attribute::computed(
                "primary",
                AttrType::Bool,
                "True if this is the primary network interface of the owning instance.",
            ))
            .with_common_resource_attrs()
    }

    async fn create(&self, ctx: &OpContext, plan: &ResourceData) -> OpResponse {
        if let Err(e) = ctx.check() {
            return OpResponse::timeout(self.type_name(), e);
        }

        // The create body identifies the VPC and subnet by name; the schema
        // carries IDs because names are mutable. Resolve them first.
        let vpc_id = plan.get_str("vpc_id").unwrap_or_default();
        let vpc = match self.api.vpc_view(&vpc_id).await {
            Ok(v) => v,
            Err(e) => {
                return OpResponse::error(
                    "Unable to read information about corresponding VPC",
                    format!("API error: {}", e),
                )
            }
        };
        if let Err(e) = ctx.check() {
            return OpResponse::timeout(self.type_name(), e);
        }
        let subnet_id = plan.get_str("subnet_id").unwrap_or_default();
        let subnet = match self.api.vpc_subnet_view(&subnet_id).await {
            Ok(s) => s,
            Err(e) => {
                return OpResponse::error(
                    "Unable to read information about corresponding subnet",
                    format!("API error: {}", e),
                )
            }
        };

        // NIC creation requires a stopped instance. A vanished instance is
        // an error here, not a success.
        let instance_id = plan.get_str("instance_id").unwrap_or_default();
        match super::stop_instance_and_wait(&self.api, ctx, self.type_name(), &instance_id).await {
            Ok(WaitOutcome::Reached) => {}
            Ok(WaitOutcome::NotFound) => {
                return OpResponse::error(
                    "Unable to stop associated instance",
                    format!("instance {} was not found", instance_id),
                )
            }
            Err(diagnostics) => return OpResponse::diagnostics(diagnostics),
        }

        if let Err(e) = ctx.check() {
            return OpResponse::timeout(self.type_name(), e);
        }
        let body = NetworkInterfaceCreate {
            name: plan.get_str("name").unwrap_or_default(),
            description: plan.get_str("description").unwrap_or_default(),
            vpc_name: vpc.name,
            subnet_name: subnet.name,
            ip: plan.get_str("ip_address").filter(|ip| !ip.is_empty()),
        };
        let nic = match self.api.instance_nic_create(&instance_id, &body).await {
            Ok(n) => n,
            Err(e) => {
                let mut diagnostics = Diagnostics::new();
                diagnostics.add_error(
                    "Error creating instance network interface",
                    format!("API error: {}", e),
                );
                diagnostics.add_warning(
                    "Instance left stopped",
                    format!("instance {} was stopped for the change and was not restarted", instance_id),
                );
                return OpResponse::diagnostics(diagnostics);
            }
        };
        trace!(id = %nic.id, "created instance network interface");

        let mut state = plan.clone();
        nic_to_state(&mut state, &nic);

        let mut response = OpResponse::state(state);
        self.start_instance(ctx, &instance_id, &mut response.diagnostics).await;
        response
    }

    async fn read(&self, ctx: &OpContext, state: &ResourceData) -> OpResponse {
        if let Err(e) = ctx.check() {
            return OpResponse::timeout(self.type_name(), e);
        }

        match self.api.instance_nic_view(&state.id()).await {
            Ok(nic) => {
                trace!(id = %nic.id, "read instance network interface");
                let mut refreshed = state.clone();
                nic_to_state(&mut refreshed, &nic);
                OpResponse::state(refreshed)
            }
            Err(e) if e.is_not_found() => {
                let mut cleared = state.clone();
                cleared.clear_id();
                OpResponse::state(cleared)
            }
            Err(e) => OpResponse::error(
                "Unable to read instance network interface",
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

        // Name and description update in place; everything else is guarded
        // at plan time.
        let mut body = NetworkInterfaceUpdate::default();
        if plan.get_str("name") != prior.get_str("name") {
            body.name = plan.get_str("name");
        }
        if plan.get_str("description") != prior.get_str("description") {
            body.description = plan.get_str("description");
        }

        let nic = match self.api.instance_nic_update(&prior.id(), &body).await {
            Ok(n) => n,
            Err(e) => {
                return OpResponse::error(
                    "Error updating instance network interface",
                    format!("API error: {}", e),
                )
            }
        };
        trace!(id = %nic.id, "updated instance network interface");

        let mut state = plan.clone();
        nic_to_state(&mut state, &nic);
        OpResponse::state(state)
    }

    async fn delete(&self, ctx: &OpContext, state: &ResourceData) -> Diagnostics {
        let mut diagnostics = Diagnostics::new();
        let instance_id = state.get_str("instance_id").unwrap_or_default();

        match super::stop_instance_and_wait(&self.api, ctx, self.type_name(), &instance_id).await {
            Ok(WaitOutcome::Reached) => {}
            // Owning instance already gone: the NIC went with it.
            Ok(WaitOutcome::NotFound) => return diagnostics,
            Err(errs) => return errs,
        }

        if let Err(e) = ctx.check() {
            return OpResponse::timeout(self.type_name(), e).diagnostics;
        }
        match self.api.instance_nic_delete(&state.id()).await {
            Ok(()) => trace!(id = %state.id(), "deleted instance network interface"),
            Err(e) if e.is_not_found() => {}
            Err(e) => {
                diagnostics.add_error(
                    "Error deleting instance network interface",
                    format!("API error: {}", e),
                );
                diagnostics.add_warning(
                    "Instance left stopped",
                    format!("instance {} was stopped for the change and was not restarted", instance_id),
                );
                return diagnostics;
            }
        }

        self.start_instance(ctx, &instance_id, &mut diagnostics).await;
        diagnostics
    }
}
