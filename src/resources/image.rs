use std::sync::Arc;

use async_trait::async_trait;
use tracing::trace;

use crate::api::{self, ImageCreate, ImageSource, OxideApi, IMAGE_SOURCE_SENTINEL};
use crate::diagnostics::Diagnostics;
use crate::handler::{OpResponse, ResourceHandler};
use crate::plan::Modifier;
use crate::schema::{AttrType, Attribute, Schema};
use crate::timeouts::OpContext;
use crate::value::ResourceData;

/// `oxide_image` — an OS image. All create fields are frozen upstream; the
/// only supported mutation is moving the image between project and silo
/// visibility (promote/demote), expressed as null ↔ value transitions of
/// `project_id`.
pub struct ImageResource {
    api: Arc<dyn OxideApi>,
}

impl ImageResource {
    pub fn new(api: Arc<dyn OxideApi>) -> Self {
        Self { api }
    }
}

fn image_to_state(state: &mut ResourceData, image: &api::Image) {
    state.set_id(&image.id);
    state.set_opt("project_id", image.project_id.clone());
    state.set("name", image.name.as_str());
    state.set("description", image.description.as_str());
    state.set("os", image.os.as_str());
    state.set("version", image.version.as_str());
    state.set("block_size", image.block_size);
    state.set("size", image.size);
    state.set_opt("digest", image.digest.clone());
    state.set_opt("url", image.url.clone());
    state.set("time_created", image.time_created.to_rfc3339());
    state.set("time_modified", image.time_modified.to_rfc3339());
}

/// Exactly one of `source_url` and `source_snapshot` must be set. The
/// sentinel URL routes to the test-only source kind.
fn image_source_from_data(plan: &ResourceData) -> Result<ImageSource, String> {
    let url = plan.get_str("source_url").filter(|s| !s.is_empty());
    let snapshot = plan.get_str("source_snapshot").filter(|s| !s.is_empty());
    match (url, snapshot) {
        (Some(url), None) => {
            if url == IMAGE_SOURCE_SENTINEL {
                Ok(ImageSource::YouCanBootAnythingAsLongAsItsAlpine)
            } else {
                Ok(ImageSource::Url { url })
            }
        }
        (None, Some(id)) => Ok(ImageSource::Snapshot { id }),
        (Some(_), Some(_)) | (None, None) => Err(
            "only one of source_url=<URL> or source_snapshot=<snapshot_id> can be set".to_string(),
        ),
    }
}

#[async_trait]
impl ResourceHandler for ImageResource {
    fn type_name(&self) -> &'static str {
        "oxide_image"
    }

    fn schema(&self) -> Schema {
        Schema::new()
            .attr(
                Attribute::optional(
                    "project_id",
                    AttrType::String,
                    "ID of the project that contains the image; unset for silo images.",
                )
                .with_modifier(Modifier::ProjectIdImageTransition),
            )
            .attr(
                Attribute::required("name", AttrType::String, "Name of the image.")
                    .with_modifier(Modifier::Immutable),
            )
            .attr(
                Attribute::required(
                    "description",
                    AttrType::String,
                    "Description for the image.",
                )
                .with_modifier(Modifier::Immutable),
            )
            .attr(
                Attribute::required(
                    "os",
                    AttrType::String,
                    "OS image distribution. Example: alpine",
                )
                .with_modifier(Modifier::Immutable),
            )
            .attr(
                Attribute::required(
                    "version",
                    AttrType::String,
                    "OS image version. Example: 3.16",
                )
                .with_modifier(Modifier::Immutable),
            )
            .attr(
                Attribute::required("block_size", AttrType::Int, "Size of blocks in bytes.")
                    .with_modifier(Modifier::Immutable),
            )
            .attr(
                Attribute::optional(
                    "source_url",
                    AttrType::String,
                    "URL source of the image.",
                )
                .with_modifier(Modifier::RequiresReplaceUnlessEmptyStringOrNull),
            )
            .attr(
                Attribute::optional(
                    "source_snapshot",
                    AttrType::String,
                    "Snapshot ID source of the image.",
                )
                .with_modifier(Modifier::RequiresReplaceUnlessEmptyStringOrNull),
            )
            .attr(Attribute::computed(
                "digest",
                AttrType::String,
                "Hash of the image contents, if applicable.",
            ))
            .attr(Attribute::computed(
                "size",
                AttrType::Int,
                "Total size in bytes.",
            ))
            .attr(Attribute::computed(
                "url",
                AttrType::String,
                "URL source of this image, if any.",
            ))
            .with_common_resource_attrs()
    }

    fn validate(&self, config: &ResourceData) -> Diagnostics {
        let mut diagnostics = Diagnostics::new();
        if config.get("source_url").is_unknown() || config.get("source_snapshot").is_unknown() {
            return diagnostics;
        }
        if let Err(detail) = image_source_from_data(config) {
            diagnostics.add_attribute_error(
                "source_url",
                "Invalid oxide_image configuration",
                detail,
            );
        }
        diagnostics
    }

    async fn create(&self, ctx: &OpContext, plan: &ResourceData) -> OpResponse {
        if let Err(e) = ctx.check() {
            return OpResponse::timeout(self.type_name(), e);
        }

        let source = match image_source_from_data(plan) {
            Ok(s) => s,
            Err(detail) => return OpResponse::error("Invalid oxide_image configuration", detail),
        };
        // Images are always born inside a project; silo visibility is
        // reached by promotion afterwards.
        let Some(project) = plan.get_str("project_id").filter(|p| !p.is_empty()) else {
            return OpResponse::error(
                "Invalid oxide_image configuration",
                "project_id must be set at creation; promote the image to remove it",
            );
        };
        let body = ImageCreate {
            name: plan.get_str("name").unwrap_or_default(),
            description: plan.get_str("description").unwrap_or_default(),
            os: plan.get_str("os").unwrap_or_default(),
            version: plan.get_str("version").unwrap_or_default(),
            block_size: plan.get_i64("block_size").unwrap_or_default(),
            source,
        };
        let image = match self.api.image_create(&project, &body).await {
            Ok(i) => i,
            Err(e) => {
                return OpResponse::error("Error creating oxide_image", format!("API error: {}", e))
            }
        };
        trace!(id = %image.id, name = %image.name, "created image");

        let mut state = plan.clone();
        image_to_state(&mut state, &image);
        OpResponse::state(state)
    }

    async fn read(&self, ctx: &OpContext, state: &ResourceData) -> OpResponse {
        if let Err(e) = ctx.check() {
            return OpResponse::timeout(self.type_name(), e);
        }

        match self.api.image_view(&state.id()).await {
            Ok(image) => {
                trace!(id = %image.id, "read image");
                let mut refreshed = state.clone();
                image_to_state(&mut refreshed, &image);
                OpResponse::state(refreshed)
            }
            Err(e) if e.is_not_found() => {
                let mut cleared = state.clone();
                cleared.clear_id();
                OpResponse::state(cleared)
            }
            Err(e) => OpResponse::error("Unable to read oxide_image", format!("API error: {}", e)),
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

        let planned_project = plan.get_str("project_id").filter(|p| !p.is_empty());
        let prior_project = prior.get_str("project_id").filter(|p| !p.is_empty());

        let image = match (&prior_project, &planned_project) {
            // value → null: promote to silo visibility.
            (Some(_), None) => match self.api.image_promote(&prior.id()).await {
                Ok(i) => i,
                Err(e) => {
                    return OpResponse::error(
                        "Error promoting oxide_image",
                        format!("API error: {}", e),
                    )
                }
            },
            // null → value: demote into a project.
            (None, Some(project)) => match self.api.image_demote(&prior.id(), project).await {
                Ok(i) => i,
                Err(e) => {
                    return OpResponse::error(
                        "Error demoting oxide_image",
                        format!("API error: {}", e),
                    )
                }
            },
            // value → value′ is rejected at plan time; anything else landing
            // here is an unsupported in-place edit.
            _ => {
                return OpResponse::error(
                    "Unsupported operation",
                    "the oxide_image resource does not support in-place updates",
                )
            }
        };
        trace!(id = %image.id, project = ?image.project_id, "changed image visibility");

        let mut state = plan.clone();
        image_to_state(&mut state, &image);
        OpResponse::state(state)
    }

    async fn delete(&self, _ctx: &OpContext, _state: &ResourceData) -> Diagnostics {
        // Surfaced rather than silently no-opped so plan runs show the
        // upstream limitation.
        let mut diagnostics = Diagnostics::new();
        diagnostics.add_error(
            "Unsupported operation",
            "the oxide_image resource does not support deletes; the upstream endpoint \
             is not implemented",
        );
        diagnostics
    }
}
