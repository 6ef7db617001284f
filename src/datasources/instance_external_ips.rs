use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use tracing::trace;
use uuid::Uuid;

use crate::api::OxideApi;
use crate::handler::{DataSourceHandler, OpResponse};
use crate::schema::{AttrType, Attribute, Schema};
use crate::timeouts::OpContext;
use crate::value::{ResourceData, Value};

/// `oxide_instance_external_ips` — the external addresses attached to one
/// instance.
pub struct InstanceExternalIpsDataSource {
    api: Arc<dyn OxideApi>,
}

impl InstanceExternalIpsDataSource {
    pub fn new(api: Arc<dyn OxideApi>) -> Self {
        Self { api }
    }
}

#[async_trait]
impl DataSourceHandler for InstanceExternalIpsDataSource {
    fn type_name(&self) -> &'static str {
        "oxide_instance_external_ips"
    }

    fn schema(&self) -> Schema {
        Schema::new()
            .attr(Attribute::required(
                "instance_id",
                AttrType::String,
                "ID of the instance to which the external IPs belong.",
            ))
            .attr(Attribute::computed("id", AttrType::String, "Datasource payload ID."))
            .attr(Attribute::computed(
                "external_ips",
                AttrType::ObjectList,
                "External IP addresses of the instance, with their kind.",
            ))
            .attr(Attribute::optional(
                "timeouts",
                AttrType::StringMap,
                "Per-phase operation timeouts.",
            ))
    }

    async fn read(&self, ctx: &OpContext, config: &ResourceData) -> OpResponse {
        if let Err(e) = ctx.check() {
            return OpResponse::timeout(self.type_name(), e);
        }

        let instance = config.get_str("instance_id").unwrap_or_default();
        let page = match self.api.instance_external_ip_list(&instance).await {
            Ok(p) => p,
            Err(e) => {
                return OpResponse::error(
                    "Unable to read external ips",
                    format!("API error: {}", e),
                )
            }
        };
        trace!(count = page.items.len(), instance = %instance, "read instance external IPs");

        let items = page
            .items
            .iter()
            .map(|ip| {
                let mut entry = BTreeMap::new();
                entry.insert("ip".to_string(), Value::from(ip.ip.clone()));
                entry.insert("kind".to_string(), Value::from(ip.kind.clone()));
                Value::Map(entry)
            })
            .collect();

        let mut state = config.clone();
        state.set_id(&Uuid::new_v4().to_string());
        state.set("external_ips", Value::List(items));
        OpResponse::state(state)
    }
}
