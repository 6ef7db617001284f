use std::sync::Arc;

use async_trait::async_trait;
use tracing::trace;
use uuid::Uuid;

use crate::api::OxideApi;
use crate::diagnostics::Diagnostics;
use crate::handler::{OpResponse, ResourceHandler};
use crate::plan::Modifier;
use crate::schema::{AttrType, Attribute, Schema};
use crate::timeouts::OpContext;
use crate::value::ResourceData;

/// `oxide_instance_disk_attachment` — the relation between an instance and
/// a disk. Deleting the attachment detaches the disk without deleting
/// either endpoint. The `id` is generated client-side since the relation
/// has no server identity of its own, which also makes it non-importable.
pub struct InstanceDiskAttachmentResource {
    api: Arc<dyn OxideApi>,
}

impl InstanceDiskAttachmentResource {
    pub fn new(api: Arc<dyn OxideApi>) -> Self {
        Self { api }
    }
}

#[async_trait]
impl ResourceHandler for InstanceDiskAttachmentResource {
    fn type_name(&self) -> &'static str {
        "oxide_instance_disk_attachment"
    }

    fn schema(&self) -> Schema {
        Schema::new()
            .attr(
                Attribute::required(
                    "instance_id",
                    AttrType::String,
                    "ID of the instance the disk will be attached to.",
                )
                .with_modifier(Modifier::RequiresReplace),
            )
            .attr(
                Attribute::required(
                    "disk_id",
                    AttrType::String,
                    "ID of the disk to be attached.",
                )
                .with_modifier(Modifier::RequiresReplace),
            )
            .attr(Attribute::computed(
                "disk_name",
                AttrType::String,
                "Name of the disk that is attached to the designated instance.",
            ))
            .with_common_resource_attrs()
    }

    async fn create(&self, ctx: &OpContext, plan: &ResourceData) -> OpResponse {
        if let Err(e) = ctx.check() {
            return OpResponse::timeout(self.type_name(), e);
        }

        let instance_id = plan.get_str("instance_id").unwrap_or_default();
        let disk_id = plan.get_str("disk_id").unwrap_or_default();
        let disk = match self.api.instance_disk_attach(&instance_id, &disk_id).await {
            Ok(d) => d,
            Err(e) => {
                return OpResponse::error("Error attaching disk", format!("API error: {}", e))
            }
        };
        trace!(disk = %disk.id, instance = %instance_id, "attached disk");

        let mut state = plan.clone();
        state.set("disk_name", disk.name.as_str());
        state.set("time_created", disk.time_created.to_rfc3339());
        state.set("time_modified", disk.time_modified.to_rfc3339());
        // The relation has no remote identity; mint one for state tracking.
        state.set_id(&Uuid::new_v4().to_string());
        OpResponse::state(state)
    }

    async fn read(&self, ctx: &OpContext, state: &ResourceData) -> OpResponse {
        if let Err(e) = ctx.check() {
            return OpResponse::timeout(self.type_name(), e);
        }

        let disk_id = state.get_str("disk_id").unwrap_or_default();
        let disk = match self.api.disk_view(&disk_id).await {
            Ok(d) => d,
            Err(e) if e.is_not_found() => {
                let mut cleared = state.clone();
                cleared.clear_id();
                return OpResponse::state(cleared);
            }
            Err(e) => {
                return OpResponse::error("Unable to read disk", format!("API error: {}", e))
            }
        };
        trace!(disk = %disk.id, "read disk");

        // A disk no longer attached to this instance means the relation is
        // gone; clear state so the host re-creates it.
        let attached_to = disk.state.instance.clone().unwrap_or_default();
        if attached_to != state.get_str("instance_id").unwrap_or_default() {
            let mut cleared = state.clone();
            cleared.clear_id();
            return OpResponse::state(cleared);
        }

        let mut refreshed = state.clone();
        refreshed.set("disk_id", disk.id.as_str());
        refreshed.set("disk_name", disk.name.as_str());
        refreshed.set("instance_id", attached_to);
        OpResponse::state(refreshed)
    }

    async fn update(&self, _ctx: &OpContext, _plan: &ResourceData, _prior: &ResourceData) -> OpResponse {
        // Both endpoints force replacement; there is nothing to update in
        // place.
        OpResponse::error(
            "Unsupported operation",
            "the oxide_instance_disk_attachment resource does not support in-place updates",
        )
    }

    async fn delete(&self, ctx: &OpContext, state: &ResourceData) -> Diagnostics {
        let mut diagnostics = Diagnostics::new();
        if let Err(e) = ctx.check() {
            return OpResponse::timeout(self.type_name(), e).diagnostics;
        }

        let instance_id = state.get_str("instance_id").unwrap_or_default();
        let disk_id = state.get_str("disk_id").unwrap_or_default();
        match self.api.instance_disk_detach(&instance_id, &disk_id).await {
            Ok(disk) => trace!(disk = %disk.id, instance = %instance_id, "detached disk"),
            // Already detached or endpoint gone: converged.
            Err(e) if e.is_not_found() => {}
            Err(e) => {
                diagnostics.add_error("Error detaching disk", format!("API error: {}", e))
            }
        }
        diagnostics
    }

    /// The natural key is composite (instance, disk); a bare ID cannot seed
    /// a usable state.
    fn import(&self, _id: &str) -> Option<ResourceData> {
        None
    }
}
