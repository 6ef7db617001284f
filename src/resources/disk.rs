use std::sync::Arc;

use async_trait::async_trait;
use tracing::trace;

use crate::api::{self, DiskCreate, DiskSource, OxideApi};
use crate::diagnostics::Diagnostics;
use crate::handler::{OpResponse, ResourceHandler};
use crate::plan::Modifier;
use crate::schema::{AttrType, Attribute, Schema};
use crate::timeouts::OpContext;
use crate::value::{ResourceData, Value};

/// `oxide_disk` — a virtual disk. Every user-settable field is create-only;
/// changes force replacement.
pub struct DiskResource {
    api: Arc<dyn OxideApi>,
}

impl DiskResource {
    pub fn new(api: Arc<dyn OxideApi>) -> Self {
        Self { api }
    }
}

fn disk_to_state(state: &mut ResourceData, disk: &api::Disk) {
    state.set_id(&disk.id);
    state.set("project_id", disk.project_id.as_str());
    state.set("name", disk.name.as_str());
    state.set("description", disk.description.as_str());
    state.set("size", disk.size);
    state.set("block_size", disk.block_size);
    state.set("device_path", disk.device_path.as_str());
    state.set_opt("image_id", disk.image_id.clone());
    state.set_opt("snapshot_id", disk.snapshot_id.clone());
    let mut disk_state = std::collections::BTreeMap::new();
    disk_state.insert("state".to_string(), Value::from(disk.state.state.clone()));
    disk_state.insert(
        "instance".to_string(),
        Value::from_opt_string(disk.state.instance.clone()),
    );
    state.set("state", Value::Map(disk_state));
    state.set("time_created", disk.time_created.to_rfc3339());
    state.set("time_modified", disk.time_modified.to_rfc3339());
}

/// Translate the `disk_source` map into the typed create source. Exactly one
/// key must be present.
fn disk_source_from_data(plan: &ResourceData) -> Result<DiskSource, String> {
    let source = match plan.get("disk_source") {
        Value::Map(entries) => entries,
        _ => return Err("disk_source must be set".to_string()),
    };
    if source.len() != 1 {
        return Err(
            "only one of blank=<block_size>, image=<image_id>, snapshot=<snapshot_id>, \
             or global_image=<image_id> can be set"
                .to_string(),
        );
    }
    let Some((key, value)) = source.iter().next() else {
        return Err("disk_source must be set".to_string());
    };
    match key.as_str() {
        "blank" => {
            let block_size = match value {
                Value::Int(n) => *n,
                Value::String(s) => s
                    .parse()
                    .map_err(|_| format!("blank disk block size \"{}\" is not a number", s))?,
                _ => return Err("blank disk source requires a block size".to_string()),
            };
            Ok(DiskSource::Blank { block_size })
        }
        "image" => Ok(DiskSource::Image {
            image_id: value.as_str().unwrap_or_default().to_string(),
        }),
        "snapshot" => Ok(DiskSource::Snapshot {
            snapshot_id: value.as_str().unwrap_or_default().to_string(),
        }),
        "global_image" => Ok(DiskSource::GlobalImage {
            image_id: value.as_str().unwrap_or_default().to_string(),
        }),
        other => Err(format!("unknown disk source kind \"{}\"", other)),
    }
}

#[async_trait]
impl ResourceHandler for DiskResource {
    fn type_name(&self) -> &'static str {
        "oxide_disk"
    }

    fn schema(&self) -> Schema {
        Schema::new()
            .attr(
                Attribute::required(
                    "project_id",
                    AttrType::String,
                    "ID of the project that will contain the disk.",
                )
                .with_modifier(Modifier::RequiresReplace),
            )
            .attr(
                Attribute::required("name", AttrType::String, "Name of the disk.")
                    .with_modifier(Modifier::RequiresReplace),
            )
            .attr(
                Attribute::required(
                    "description",
                    AttrType::String,
                    "Description for the disk.",
                )
                .with_modifier(Modifier::RequiresReplace),
            )
            .attr(
                Attribute::required("size", AttrType::Int, "Size of the disk in bytes.")
                    .with_modifier(Modifier::RequiresReplace),
            )
            .attr(
                Attribute::required(
                    "disk_source",
                    AttrType::StringMap,
                    "Source of the disk. One of blank=<block_size>, image=<image_id>, \
                     snapshot=<snapshot_id>, or global_image=<image_id>.",
                )
                .with_modifier(Modifier::RequiresReplaceUnlessEmptyStringOrNull),
            )
            .attr(Attribute::computed(
                "block_size",
                AttrType::Int,
                "Size of blocks in bytes.",
            ))
            .attr(Attribute::computed(
                "device_path",
                AttrType::String,
                "Path of the disk.",
            ))
            .attr(Attribute::computed(
                "image_id",
                AttrType::String,
                "Image ID of the disk source, if applicable.",
            ))
            .attr(Attribute::computed(
                "snapshot_id",
                AttrType::String,
                "Snapshot ID of the disk source, if applicable.",
            ))
            .attr(Attribute::computed(
                "state",
                AttrType::StringMap,
                "State of the disk and, while attached, the attached instance ID.",
            ))
            .with_common_resource_attrs()
    }

    fn validate(&self, config: &ResourceData) -> Diagnostics {
        let mut diagnostics = Diagnostics::new();
        if config.get("disk_source").is_unknown() {
            return diagnostics;
        }
        if let Err(detail) = disk_source_from_data(config) {
            diagnostics.add_attribute_error("disk_source", "Invalid oxide_disk configuration", detail);
        }
        diagnostics
    }

    async fn create(&self, ctx: &OpContext, plan: &ResourceData) -> OpResponse {
        if let Err(e) = ctx.check() {
            return OpResponse::timeout(self.type_name(), e);
        }

        let disk_source = match disk_source_from_data(plan) {
            Ok(s) => s,
            Err(detail) => return OpResponse::error("Invalid oxide_disk configuration", detail),
        };
        let project = plan.get_str("project_id").unwrap_or_default();
        let body = DiskCreate {
            name: plan.get_str("name").unwrap_or_default(),
            description: plan.get_str("description").unwrap_or_default(),
            size: plan.get_i64("size").unwrap_or_default(),
            disk_source,
        };
        let disk = match self.api.disk_create(&project, &body).await {
            Ok(d) => d,
            Err(e) => {
                return OpResponse::error("Error creating oxide_disk", format!("API error: {}", e))
            }
        };
        trace!(id = %disk.id, name = %disk.name, "created disk");

        let mut state = plan.clone();
        disk_to_state(&mut state, &disk);
        OpResponse::state(state)
    }

    async fn read(&self, ctx: &OpContext, state: &ResourceData) -> OpResponse {
        if let Err(e) = ctx.check() {
            return OpResponse::timeout(self.type_name(), e);
        }

        match self.api.disk_view(&state.id()).await {
            Ok(disk) => {
                trace!(id = %disk.id, "read disk");
                let mut refreshed = state.clone();
                disk_to_state(&mut refreshed, &disk);
                OpResponse::state(refreshed)
            }
            Err(e) if e.is_not_found() => {
                let mut cleared = state.clone();
                cleared.clear_id();
                OpResponse::state(cleared)
            }
            Err(e) => OpResponse::error("Unable to read oxide_disk", format!("API error: {}", e)),
        }
    }

    async fn update(&self, _ctx: &OpContext, _plan: &ResourceData, _prior: &ResourceData) -> OpResponse {
        // Every field is create-only; the plan marks changes as replacements,
        // so an update request here means a host bug.
        OpResponse::error(
            "Unsupported operation",
            "the oxide_disk resource does not support in-place updates",
        )
    }

    async fn delete(&self, ctx: &OpContext, state: &ResourceData) -> Diagnostics {
        let mut diagnostics = Diagnostics::new();
        if let Err(e) = ctx.check() {
            return OpResponse::timeout(self.type_name(), e).diagnostics;
        }

        match self.api.disk_delete(&state.id()).await {
            Ok(()) => trace!(id = %state.id(), "deleted disk"),
            Err(e) if e.is_not_found() => {}
            Err(e) => {
                diagnostics.add_error("Error deleting oxide_disk", format!("API error: {}", e))
            }
        }
        diagnostics
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    fn plan_with_source(entries: &[(&str, Value)]) -> ResourceData {
        let mut map = BTreeMap::new();
        for (k, v) in entries {
            map.insert(k.to_string(), v.clone());
        }
        let mut plan = ResourceData::new();
        plan.set("disk_source", Value::Map(map));
        plan
    }

    #[test]
    fn one_source_kind_is_required() {
        let plan = plan_with_source(&[
            ("image", Value::from("img-1")),
            ("snapshot", Value::from("snap-1")),
        ]);
        assert!(disk_source_from_data(&plan).is_err());
    }

    #[test]
    fn blank_source_parses_block_size() {
        let plan = plan_with_source(&[("blank", Value::from("512"))]);
        assert_eq!(
            disk_source_from_data(&plan).unwrap(),
            DiskSource::Blank { block_size: 512 }
        );
    }

    #[test]
    fn snapshot_source_carries_the_id() {
        let plan = plan_with_source(&[("snapshot", Value::from("snap-9"))]);
        assert_eq!(
            disk_source_from_data(&plan).unwrap(),
            DiskSource::Snapshot {
                snapshot_id: "snap-9".to_string()
            }
        );
    }
}
