use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use tracing::trace;
use uuid::Uuid;

use crate::api::{ListParams, OxideApi};
use crate::handler::{DataSourceHandler, OpResponse};
use crate::schema::{AttrType, Attribute, Schema};
use crate::timeouts::OpContext;
use crate::value::{ResourceData, Value};

/// `oxide_organizations` — the legacy silo-level grouping list.
pub struct OrganizationsDataSource {
    api: Arc<dyn OxideApi>,
}

impl OrganizationsDataSource {
    pub fn new(api: Arc<dyn OxideApi>) -> Self {
        Self { api }
    }
}

#[async_trait]
impl DataSourceHandler for OrganizationsDataSource {
    fn type_name(&self) -> &'static str {
        "oxide_organizations"
    }

    fn schema(&self) -> Schema {
        Schema::new()
            .attr(Attribute::computed("id", AttrType::String, "Datasource payload ID."))
            .attr(Attribute::computed(
                "organizations",
                AttrType::ObjectList,
                "All organizations visible to the caller.",
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

        let page = match self.api.organization_list(&ListParams::default()).await {
            Ok(p) => p,
            Err(e) => {
                return OpResponse::error(
                    "Unable to list organizations",
                    format!("API error: {}", e),
                )
            }
        };
        trace!(count = page.items.len(), "read all organizations");

        let items = page
            .items
            .iter()
            .map(|org| {
                let mut entry = BTreeMap::new();
                entry.insert("id".to_string(), Value::from(org.id.clone()));
                entry.insert("name".to_string(), Value::from(org.name.clone()));
                entry.insert(
                    "description".to_string(),
                    Value::from(org.description.clone()),
                );
                entry.insert(
                    "time_created".to_string(),
                    Value::from(org.time_created.to_rfc3339()),
                );
                entry.insert(
                    "time_modified".to_string(),
                    Value::from(org.time_modified.to_rfc3339()),
                );
                Value::Map(entry)
            })
            .collect();

        let mut state = config.clone();
        state.set_id(&Uuid::new_v4().to_string());
        state.set("organizations", Value::List(items));
        OpResponse::state(state)
    }
}
