use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use tracing::trace;

use crate::api::{
    self, ExternalIpCreate, InstanceCreate, InstanceDiskAttachment,
    InstanceNetworkInterfaceAttachment, ListParams, NetworkInterfaceCreate, OxideApi,
};
use crate::diagnostics::Diagnostics;
use crate::handler::{OpResponse, ResourceHandler};
use crate::plan::Modifier;
use crate::schema::{AttrType, Attribute, Schema};
use crate::timeouts::OpContext;
use crate::value::{ResourceData, Value};
use crate::waiter::WaitOutcome;

/// `oxide_instance` — a virtual machine. The upstream has no update
/// endpoint, so every field is create-only; delete must stop the instance
/// first and wait for the power state to settle.
pub struct InstanceResource {
    api: Arc<dyn OxideApi>,
}

impl InstanceResource {
    pub fn new(api: Arc<dyn OxideApi>) -> Self {
        Self { api }
    }

    /// Second fetch for child state: the instance's network interfaces,
    /// with VPC and subnet names resolved by ID.
    async fn nic_list_to_state(
        &self,
        ctx: &OpContext,
        instance: &str,
    ) -> Result<Value, Diagnostics> {
        let mut diagnostics = Diagnostics::new();
        if let Err(e) = ctx.check() {
            return Err(OpResponse::timeout(self.type_name(), e).diagnostics);
        }

        let page = match self.api.instance_nic_list(instance, &ListParams::default()).await {
            Ok(p) => p,
            Err(e) => {
                diagnostics.add_error(
                    "Unable to read instance network interfaces",
                    format!("API error: {}", e),
                );
                return Err(diagnostics);
            }
        };

        let mut items = Vec::with_capacity(page.items.len());
        for nic in page.items {
            if let Err(e) = ctx.check() {
                return Err(OpResponse::timeout(self.type_name(), e).diagnostics);
            }
            // The NIC body only carries IDs; resolve the names separately.
            let vpc = match self.api.vpc_view(&nic.vpc_id).await {
                Ok(v) => v,
                Err(e) => {
                    diagnostics.add_error(
                        "Unable to read information about corresponding VPC",
                        format!("API error: {}", e),
                    );
                    return Err(diagnostics);
                }
            };
            let subnet = match self.api.vpc_subnet_view(&nic.subnet_id).await {
                Ok(s) => s,
                Err(e) => {
                    diagnostics.add_error(
                        "Unable to read information about corresponding subnet",
                        format!("API error: {}", e),
                    );
                    return Err(diagnostics);
                }
            };

            let mut entry = BTreeMap::new();
            entry.insert("name".to_string(), Value::from(nic.name.clone()));
            entry.insert("description".to_string(), Value::from(nic.description.clone()));
            entry.insert("ip".to_string(), Value::from(nic.ip.clone()));
            entry.insert("subnet_id".to_string(), Value::from(nic.subnet_id.clone()));
            entry.insert("vpc_id".to_string(), Value::from(nic.vpc_id.clone()));
            entry.insert("subnet_name".to_string(), Value::from(subnet.name));
            entry.insert("vpc_name".to_string(), Value::from(vpc.name));
            items.push(Value::Map(entry));
        }
        Ok(Value::List(items))
    }
}

fn instance_to_state(state: &mut ResourceData, instance: &api::Instance) {
    state.set_id(&instance.id);
    state.set("project_id", instance.project_id.as_str());
    state.set("name", instance.name.as_str());
    state.set("description", instance.description.as_str());
    state.set("host_name", instance.hostname.as_str());
    state.set("memory", instance.memory);
    state.set("ncpus", instance.ncpus);
    state.set("run_state", instance.run_state.as_str());
    state.set("time_created", instance.time_created.to_rfc3339());
    state.set("time_modified", instance.time_modified.to_rfc3339());
    state.set(
        "time_run_state_updated",
        instance.time_run_state_updated.to_rfc3339(),
    );
}

fn has_nic_blocks(data: &ResourceData) -> bool {
    data.get("network_interface")
        .as_list()
        .map(|items| !items.is_empty())
        .unwrap_or(false)
}

/// Inline NIC blocks from the plan, for provisioning at create time.
fn nics_from_plan(plan: &ResourceData) -> InstanceNetworkInterfaceAttachment {
    let Some(items) = plan.get("network_interface").as_list().map(|l| l.to_vec()) else {
        return InstanceNetworkInterfaceAttachment::None;
    };
    if items.is_empty() {
        return InstanceNetworkInterfaceAttachment::None;
    }
    let params = items
        .iter()
        .filter_map(|item| {
            let entry = item.as_map()?;
            let field =
                |name: &str| entry.get(name).and_then(|v| v.as_str()).unwrap_or_default().to_string();
            Some(NetworkInterfaceCreate {
                name: field("name"),
                description: field("description"),
                vpc_name: field("vpc_name"),
                subnet_name: field("subnet_name"),
                ip: None,
            })
        })
        .collect();
    InstanceNetworkInterfaceAttachment::Create(params)
}

#[async_trait]
impl ResourceHandler for InstanceResource {
    fn type_name(&self) -> &'static str {
        "oxide_instance"
    }

    fn schema(&self) -> Schema {
        Schema::new()
            .attr(
                Attribute::required(
                    "project_id",
                    AttrType::String,
                    "ID of the project that will contain the instance.",
                )
                .with_modifier(Modifier::RequiresReplace),
            )
            .attr(
                Attribute::required("name", AttrType::String, "Name of the instance.")
                    .with_modifier(Modifier::RequiresReplace),
            )
            .attr(
                Attribute::required(
                    "description",
                    AttrType::String,
                    "Description for the instance.",
                )
                .with_modifier(Modifier::RequiresReplace),
            )
            .attr(
                Attribute::required(
                    "host_name",
                    AttrType::String,
                    "Host name of the instance.",
                )
                .with_modifier(Modifier::RequiresReplace),
            )
            .attr(
                Attribute::required("memory", AttrType::Int, "Instance memory in bytes.")
                    .with_modifier(Modifier::RequiresReplace),
            )
            .attr(
                Attribute::required(
                    "ncpus",
                    AttrType::Int,
                    "Number of CPUs allocated for this instance.",
                )
                .with_modifier(Modifier::RequiresReplace),
            )
            .attr(Attribute::optional(
                "start_on_create",
                AttrType::Bool,
                "Start the instance as soon as it is created. Defaults to true.",
            ))
            .attr(
                Attribute::optional(
                    "attach_to_disks",
                    AttrType::StringList,
                    "Disks to be attached to this instance at creation, by name.",
                )
                .with_modifier(Modifier::RequiresReplaceUnlessEmptyStringOrNull),
            )
            .attr(
                Attribute::optional(
                    "external_ips",
                    AttrType::StringList,
                    "IP pools from which to draw ephemeral external addresses.",
                )
                .with_modifier(Modifier::RequiresReplaceUnlessEmptyStringOrNull),
            )
            .attr(
                Attribute::optional(
                    "network_interface",
                    AttrType::ObjectList,
                    "Network interfaces provisioned at instance creation.",
                )
                .with_modifier(Modifier::RequiresReplaceUnlessEmptyStringOrNull),
            )
            .attr(Attribute::computed(
                "run_state",
                AttrType::String,
                "Running state of the instance.",
            ))
            .attr(Attribute::computed(
                "time_run_state_updated",
                AttrType::String,
                "Timestamp of when the run state of this instance was last modified.",
            ))
            .with_common_resource_attrs()
    }

    async fn create(&self, ctx: &OpContext, plan: &ResourceData) -> OpResponse {
        if let Err(e) = ctx.check() {
            return OpResponse::timeout(self.type_name(), e);
        }

        let project = plan.get_str("project_id").unwrap_or_default();
        let disks = plan
            .get_str_list("attach_to_disks")
            .into_iter()
            .map(|name| InstanceDiskAttachment::Attach { name })
            .collect();
        let external_ips = plan
            .get_str_list("external_ips")
            .into_iter()
            .map(|pool_name| ExternalIpCreate::Ephemeral { pool_name })
            .collect();
        let body = InstanceCreate {
            name: plan.get_str("name").unwrap_or_default(),
            description: plan.get_str("description").unwrap_or_default(),
            hostname: plan.get_str("host_name").unwrap_or_default(),
            memory: plan.get_i64("memory").unwrap_or_default(),
            ncpus: plan.get_i64("ncpus").unwrap_or_default(),
            disks,
            external_ips,
            network_interfaces: nics_from_plan(plan),
            start: plan.get_bool("start_on_create").unwrap_or(true),
        };

        let instance = match self.api.instance_create(&project, &body).await {
            Ok(i) => i,
            Err(e) => {
                return OpResponse::error(
                    "Error creating oxide_instance",
                    format!("API error: {}", e),
                )
            }
        };
        trace!(id = %instance.id, name = %instance.name, "created instance");

        let mut state = plan.clone();
        instance_to_state(&mut state, &instance);

        // Child state needs a second fetch when NICs were provisioned inline.
        if has_nic_blocks(plan) {
            match self.nic_list_to_state(ctx, &instance.id).await {
                Ok(nics) => state.set("network_interface", nics),
                Err(diagnostics) => return OpResponse::diagnostics(diagnostics),
            }
        }
        OpResponse::state(state)
    }

    async fn read(&self, ctx: &OpContext, state: &ResourceData) -> OpResponse {
        if let Err(e) = ctx.check() {
            return OpResponse::timeout(self.type_name(), e);
        }

        let instance = match self.api.instance_view(&state.id()).await {
            Ok(i) => i,
            Err(e) if e.is_not_found() => {
                let mut cleared = state.clone();
                cleared.clear_id();
                return OpResponse::state(cleared);
            }
            Err(e) => {
                return OpResponse::error(
                    "Unable to read oxide_instance",
                    format!("API error: {}", e),
                )
            }
        };
        trace!(id = %instance.id, run_state = %instance.run_state, "read instance");

        let mut refreshed = state.clone();
        instance_to_state(&mut refreshed, &instance);

        if has_nic_blocks(state) {
            match self.nic_list_to_state(ctx, &instance.id).await {
                Ok(nics) => refreshed.set("network_interface", nics),
                Err(diagnostics) => return OpResponse::diagnostics(diagnostics),
            }
        }
        OpResponse::state(refreshed)
    }

    async fn update(&self, _ctx: &OpContext, _plan: &ResourceData, _prior: &ResourceData) -> OpResponse {
        OpResponse::error(
            "Unsupported operation",
            "the oxide_instance resource does not support in-place updates",
        )
    }

    async fn delete(&self, ctx: &OpContext, state: &ResourceData) -> Diagnostics {
        let mut diagnostics = Diagnostics::new();
        let id = state.id();

        // stop → wait(stopped) → delete; 404 anywhere means already gone.
        match super::stop_instance_and_wait(&self.api, ctx, self.type_name(), &id).await {
            Ok(WaitOutcome::Reached) => {}
            Ok(WaitOutcome::NotFound) => return diagnostics,
            Err(errs) => return errs,
        }

        if let Err(e) = ctx.check() {
            return OpResponse::timeout(self.type_name(), e).diagnostics;
        }
        match self.api.instance_delete(&id).await {
            Ok(()) => trace!(id = %id, "deleted instance"),
            Err(e) if e.is_not_found() => {}
            Err(e) => diagnostics
                .add_error("Error deleting oxide_instance", format!("API error: {}", e)),
        }
        diagnostics
    }
}
