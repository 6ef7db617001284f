use std::sync::Arc;

use async_trait::async_trait;
use tracing::trace;

use crate::api::{self, OxideApi, SnapshotCreate};
use crate::diagnostics::Diagnostics;
use crate::handler::{OpResponse, ResourceHandler};
use crate::plan::Modifier;
use crate::schema::{AttrType, Attribute, Schema};
use crate::timeouts::OpContext;
use crate::value::ResourceData;

/// `oxide_snapshot` — a point-in-time copy of a disk. The disk reference is
/// weak: the disk may be deleted after the snapshot is taken.
pub struct SnapshotResource {
    api: Arc<dyn OxideApi>,
}

impl SnapshotResource {
    pub fn new(api: Arc<dyn OxideApi>) -> Self {
        Self { api }
    }
}

fn snapshot_to_state(state: &mut ResourceData, snapshot: &api::Snapshot) {
    state.set_id(&snapshot.id);
    state.set("project_id", snapshot.project_id.as_str());
    state.set("name", snapshot.name.as_str());
    state.set("description", snapshot.description.as_str());
    state.set("disk_id", snapshot.disk_id.as_str());
    state.set("size", snapshot.size);
    state.set("time_created", snapshot.time_created.to_rfc3339());
    state.set("time_modified", snapshot.time_modified.to_rfc3339());
}

#[async_trait]
impl ResourceHandler for SnapshotResource {
    fn type_name(&self) -> &'static str {
        "oxide_snapshot"
    }

    fn schema(&self) -> Schema {
        Schema::new()
            .attr(
                Attribute::required(
                    "project_id",
                    AttrType::String,
                    "ID of the project that will contain the snapshot.",
                )
                .with_modifier(Modifier::RequiresReplace),
            )
            .attr(
                Attribute::required("name", AttrType::String, "Name of the snapshot.")
                    .with_modifier(Modifier::RequiresReplace),
            )
            .attr(
                Attribute::required(
                    "description",
                    AttrType::String,
                    "Description for the snapshot.",
                )
                .with_modifier(Modifier::RequiresReplace),
            )
            .attr(
                Attribute::required(
                    "disk",
                    AttrType::String,
                    "Name or ID of the disk to snapshot.",
                )
                .with_modifier(Modifier::RequiresReplace),
            )
            .attr(Attribute::computed(
                "disk_id",
                AttrType::String,
                "ID of the disk the snapshot was taken from.",
            ))
            .attr(Attribute::computed(
                "size",
                AttrType::Int,
                "Size of the snapshot in bytes.",
            ))
            .with_common_resource_attrs()
    }

    async fn create(&self, ctx: &OpContext, plan: &ResourceData) -> OpResponse {
        if let Err(e) = ctx.check() {
            return OpResponse::timeout(self.type_name(), e);
        }

        let project = plan.get_str("project_id").unwrap_or_default();
        let body = SnapshotCreate {
            name: plan.get_str("name").unwrap_or_default(),
            description: plan.get_str("description").unwrap_or_default(),
            disk: plan.get_str("disk").unwrap_or_default(),
        };
        let snapshot = match self.api.snapshot_create(&project, &body).await {
            Ok(s) => s,
            Err(e) => {
                return OpResponse::error(
                    "Error creating oxide_snapshot",
                    format!("API error: {}", e),
                )
            }
        };
        trace!(id = %snapshot.id, name = %snapshot.name, "created snapshot");

        let mut state = plan.clone();
        snapshot_to_state(&mut state, &snapshot);
        OpResponse::state(state)
    }

    async fn read(&self, ctx: &OpContext, state: &ResourceData) -> OpResponse {
        if let Err(e) = ctx.check() {
            return OpResponse::timeout(self.type_name(), e);
        }

        match self.api.snapshot_view(&state.id()).await {
            Ok(snapshot) => {
                trace!(id = %snapshot.id, "read snapshot");
                let mut refreshed = state.clone();
                snapshot_to_state(&mut refreshed, &snapshot);
                OpResponse::state(refreshed)
            }
            Err(e) if e.is_not_found() => {
                let mut cleared = state.clone();
                cleared.clear_id();
                OpResponse::state(cleared)
            }
            Err(e) => {
                OpResponse::error("Unable to read oxide_snapshot", format!("API error: {}", e))
            }
        }
    }

    async fn update(&self, _ctx: &OpContext, _plan: &ResourceData, _prior: &ResourceData) -> OpResponse {
        OpResponse::error(
            "Unsupported operation",
            "the oxide_snapshot resource does not support in-place updates",
        )
    }

    async fn delete(&self, ctx: &OpContext, state: &ResourceData) -> Diagnostics {
        let mut diagnostics = Diagnostics::new();
        if let Err(e) = ctx.check() {
            return OpResponse::timeout(self.type_name(), e).diagnostics;
        }

        match self.api.snapshot_delete(&state.id()).await {
            Ok(()) => trace!(id = %state.id(), "deleted snapshot"),
            Err(e) if e.is_not_found() => {}
            Err(e) => diagnostics
                .add_error("Error deleting oxide_snapshot", format!("API error: {}", e)),
        }
        diagnostics
    }
}
