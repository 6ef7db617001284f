use async_trait::async_trait;

use crate::diagnostics::Diagnostics;
use crate::plan::{self, PlanOutcome};
use crate::schema::Schema;
use crate::timeouts::{OpContext, TimeoutError};
use crate::value::ResourceData;

// ─── Handler Responses ──────────────────────────────────────────────────────

/// Result of one lifecycle operation: the state to persist (absent when the
/// operation failed or removed the resource) plus the diagnostics stream.
#[derive(Debug, Default)]
pub struct OpResponse {
    pub state: Option<ResourceData>,
    pub diagnostics: Diagnostics,
}

impl OpResponse {
    pub fn state(state: ResourceData) -> Self {
        Self {
            state: Some(state),
            diagnostics: Diagnostics::new(),
        }
    }

    pub fn diagnostics(diagnostics: Diagnostics) -> Self {
        Self {
            state: None,
            diagnostics,
        }
    }

    pub fn error(summary: impl Into<String>, detail: impl Into<String>) -> Self {
        let mut diagnostics = Diagnostics::new();
        diagnostics.add_error(summary, detail);
        Self::diagnostics(diagnostics)
    }

    /// Deadline exceeded before or during the operation.
    pub fn timeout(kind: &str, err: TimeoutError) -> Self {
        Self::error(format!("Timeout on {}", kind), err.to_string())
    }
}

// ─── Resource Handler Contract ──────────────────────────────────────────────

/// One resource kind's lifecycle under the host's plugin contract. The host
/// serialises invocations per resource instance.
#[async_trait]
pub trait ResourceHandler: Send + Sync {
    fn type_name(&self) -> &'static str;

    fn schema(&self) -> Schema;

    /// Pre-SDK config validation (mutual exclusions and the like). Errors
    /// here abort the plan; no SDK calls are made.
    fn validate(&self, _config: &ResourceData) -> Diagnostics {
        Diagnostics::new()
    }

    /// Evaluate plan modifiers and config validation for one plan round.
    fn plan(&self, config: &ResourceData, prior: &ResourceData) -> PlanOutcome {
        let mut outcome = plan::evaluate(self.type_name(), &self.schema(), config, prior);
        outcome.diagnostics.extend(self.validate(config));
        outcome
    }

    /// Post-condition: when diagnostics carry no errors, the returned state
    /// has a non-empty ID.
    async fn create(&self, ctx: &OpContext, plan: &ResourceData) -> OpResponse;

    /// A remote "not found" returns an empty-ID state so the host drops the
    /// instance; other errors keep prior state.
    async fn read(&self, ctx: &OpContext, state: &ResourceData) -> OpResponse;

    async fn update(
        &self,
        ctx: &OpContext,
        plan: &ResourceData,
        prior: &ResourceData,
    ) -> OpResponse;

    /// Idempotent: "not found" during delete is success.
    async fn delete(&self, ctx: &OpContext, state: &ResourceData) -> Diagnostics;

    /// Seed state from a user-supplied ID; the following read fills in the
    /// rest. None marks the resource non-importable (composite natural key).
    fn import(&self, id: &str) -> Option<ResourceData> {
        let mut state = ResourceData::new();
        state.set_id(id);
        Some(state)
    }
}

// ─── Data Source Contract ───────────────────────────────────────────────────

/// A single read materialising a list or lookup view.
#[async_trait]
pub trait DataSourceHandler: Send + Sync {
    fn type_name(&self) -> &'static str;

    fn schema(&self) -> Schema;

    async fn read(&self, ctx: &OpContext, config: &ResourceData) -> OpResponse;
}
