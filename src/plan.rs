use crate::diagnostics::Diagnostics;
use crate::schema::Schema;
use crate::value::ResourceData;

// ─── Plan Modifiers ─────────────────────────────────────────────────────────

/// Per-attribute mutability policy evaluated at plan time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Modifier {
    /// Any config-vs-state mismatch forces destroy and create.
    RequiresReplace,
    /// As `RequiresReplace`, except transitions from null or the empty
    /// string do not force replacement. Used for optional nested keys that
    /// can be added but not modified in place.
    RequiresReplaceUnlessEmptyStringOrNull,
    /// Rejected outright once a prior value exists; the diagnostic names the
    /// attribute and asks for the prior value back.
    Immutable,
    /// Image visibility: only null ↔ value transitions are allowed; a
    /// value → value′ change is rejected naming both values.
    ProjectIdImageTransition,
}

/// Result of evaluating a resource's modifiers against config and prior
/// state.
#[derive(Debug, Default)]
pub struct PlanOutcome {
    /// Attributes whose change forces destroy + create.
    pub requires_replace: Vec<String>,
    pub diagnostics: Diagnostics,
}

impl PlanOutcome {
    pub fn forces_replacement(&self) -> bool {
        !self.requires_replace.is_empty()
    }
}

/// Evaluate every attribute's modifier. Unknown config values short-circuit
/// to "no change decision yet" — the host re-plans once they resolve.
pub fn evaluate(
    kind: &str,
    schema: &Schema,
    config: &ResourceData,
    prior: &ResourceData,
) -> PlanOutcome {
    let mut outcome = PlanOutcome::default();

    for attribute in schema.attributes() {
        let Some(modifier) = attribute.modifier else {
            continue;
        };
        let config_value = config.get(attribute.name);
        let prior_value = prior.get(attribute.name);

        if config_value.is_unknown() {
            continue;
        }

        match modifier {
            Modifier::RequiresReplace => {
                if !prior_value.is_null() && config_value != prior_value {
                    outcome.requires_replace.push(attribute.name.to_string());
                }
            }
            Modifier::RequiresReplaceUnlessEmptyStringOrNull => {
                let prior_empty =
                    prior_value.is_null() || prior_value.as_str() == Some("");
                if !prior_empty && config_value != prior_value {
                    outcome.requires_replace.push(attribute.name.to_string());
                }
            }
            Modifier::Immutable => {
                let prior_set = prior_value
                    .as_str()
                    .map(|s| !s.is_empty())
                    .unwrap_or(!prior_value.is_null());
                if prior_set && config_value != prior_value {
                    outcome.diagnostics.add_attribute_error(
                        attribute.name,
                        format!("Error planning {}", kind),
                        format!(
                            "{} cannot be updated; please revert to: \"{}\"",
                            attribute.name, prior_value
                        ),
                    );
                }
            }
            Modifier::ProjectIdImageTransition => {
                // null → value (demote) and value → null (promote) are the
                // only permitted transitions.
                if !prior_value.is_null()
                    && !config_value.is_null()
                    && config_value != prior_value
                {
                    outcome.diagnostics.add_attribute_error(
                        attribute.name,
                        format!("Error planning {}", kind),
                        format!(
                            "project_id may only be set or unset, not changed; \
                             cannot move image from project \"{}\" to project \"{}\"",
                            prior_value, config_value
                        ),
                    );
                }
            }
        }
    }

    outcome
}
