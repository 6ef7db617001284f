pub mod disk;
pub mod image;
pub mod instance;
pub mod instance_disk_attachment;
pub mod instance_network_interface;
pub mod ip_pool;
pub mod organization;
pub mod project;
pub mod snapshot;
pub mod vpc;
pub mod vpc_subnet;

pub use disk::DiskResource;
pub use image::ImageResource;
pub use instance::InstanceResource;
pub use instance_disk_attachment::InstanceDiskAttachmentResource;
pub use instance_network_interface::InstanceNicResource;
pub use ip_pool::IpPoolResource;
pub use organization::OrganizationResource;
pub use project::ProjectResource;
pub use snapshot::SnapshotResource;
pub use vpc::VpcResource;
pub use vpc_subnet::VpcSubnetResource;

use std::sync::Arc;

use tracing::trace;

use crate::api::{InstanceState, OxideApi};
use crate::diagnostics::Diagnostics;
use crate::handler::OpResponse;
use crate::timeouts::OpContext;
use crate::waiter::{self, WaitOutcome};

/// Stop an instance and wait until it reports `stopped`, observing the
/// phase deadline. A 404 from the stop call or from the poll yields
/// `NotFound`: the instance is already gone, which delete-like callers may
/// accept and stop-before-mutate callers must not.
pub(crate) async fn stop_instance_and_wait(
    api: &Arc<dyn OxideApi>,
    ctx: &OpContext,
    kind: &str,
    instance_id: &str,
) -> Result<WaitOutcome, Diagnostics> {
    let mut diagnostics = Diagnostics::new();

    if let Err(e) = ctx.check() {
        return Err(OpResponse::timeout(kind, e).diagnostics);
    }
    match api.instance_stop(instance_id).await {
        Ok(_) => {}
        Err(e) if e.is_not_found() => return Ok(WaitOutcome::NotFound),
        Err(e) => {
            diagnostics.add_error("Unable to stop instance", format!("API error: {}", e));
            return Err(diagnostics);
        }
    }

    let api = api.clone();
    let instance = instance_id.to_string();
    let outcome = waiter::wait_for_state(
        ctx,
        InstanceState::Stopped.as_str(),
        waiter::INSTANCE_STATE_INTERVAL,
        move || {
            let api = api.clone();
            let instance = instance.clone();
            async move {
                api.instance_view(&instance)
                    .await
                    .map(|i| i.run_state.as_str().to_string())
            }
        },
    )
    .await;

    match outcome {
        Ok(outcome) => {
            trace!(id = %instance_id, "instance stopped");
            Ok(outcome)
        }
        Err(e) => {
            diagnostics.add_error("Unable to stop instance", e.to_string());
            Err(diagnostics)
        }
    }
}
