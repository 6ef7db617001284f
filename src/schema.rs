use crate::plan::Modifier;

// ─── Attribute Tables ───────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttrType {
    String,
    Int,
    Bool,
    StringList,
    StringMap,
    /// List of nested objects (external IPs, inline NICs).
    ObjectList,
}

impl AttrType {
    pub fn as_str(&self) -> &'static str {
        match self {
            AttrType::String => "string",
            AttrType::Int => "number",
            AttrType::Bool => "bool",
            AttrType::StringList => "list(string)",
            AttrType::StringMap => "map(string)",
            AttrType::ObjectList => "list(object)",
        }
    }
}

/// How an attribute participates in plan and state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Required,
    Optional,
    Computed,
    /// User may set it; the server fills it in when omitted.
    OptionalComputed,
}

/// One row of a resource's attribute table.
#[derive(Debug, Clone)]
pub struct Attribute {
    pub name: &'static str,
    pub attr_type: AttrType,
    pub mode: Mode,
    pub sensitive: bool,
    pub description: &'static str,
    pub modifier: Option<Modifier>,
}

impl Attribute {
    pub fn new(name: &'static str, attr_type: AttrType, mode: Mode, description: &'static str) -> Self {
        Self {
            name,
            attr_type,
            mode,
            sensitive: false,
            description,
            modifier: None,
        }
    }

    pub fn required(name: &'static str, attr_type: AttrType, description: &'static str) -> Self {
        Self::new(name, attr_type, Mode::Required, description)
    }

    pub fn optional(name: &'static str, attr_type: AttrType, description: &'static str) -> Self {
        Self::new(name, attr_type, Mode::Optional, description)
    }

    pub fn computed(name: &'static str, attr_type: AttrType, description: &'static str) -> Self {
        Self::new(name, attr_type, Mode::Computed, description)
    }

    pub fn optional_computed(
        name: &'static str,
        attr_type: AttrType,
        description: &'static str,
    ) -> Self {
        Self::new(name, attr_type, Mode::OptionalComputed, description)
    }

    pub fn with_modifier(mut self, modifier: Modifier) -> Self {
        self.modifier = Some(modifier);
        self
    }

    pub fn sensitive(mut self) -> Self {
        self.sensitive = true;
        self
    }
}

/// A resource or data-source attribute table.
#[derive(Debug, Clone, Default)]
pub struct Schema {
    attributes: Vec<Attribute>,
}

impl Schema {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn attr(mut self, attribute: Attribute) -> Self {
        self.attributes.push(attribute);
        self
    }

    /// The attributes every resource declares: the opaque ID, the two
    /// server timestamps, and the `timeouts` block.
    pub fn with_common_resource_attrs(self) -> Self {
        self.attr(Attribute::computed(
            "id",
            AttrType::String,
            "Unique, immutable, system-controlled identifier.",
        ))
        .attr(Attribute::computed(
            "time_created",
            AttrType::String,
            "Timestamp of when this resource was created.",
        ))
        .attr(Attribute::computed(
            "time_modified",
            AttrType::String,
            "Timestamp of when this resource was last modified.",
        ))
        .attr(Attribute::optional(
            "timeouts",
            AttrType::StringMap,
            "Per-phase operation timeouts: create, read, update, delete.",
        ))
    }

    pub fn attributes(&self) -> &[Attribute] {
        &self.attributes
    }

    pub fn find(&self, name: &str) -> Option<&Attribute> {
        self.attributes.iter().find(|a| a.name == name)
    }

    /// JSON export for the host and the `schema` CLI subcommand.
    pub fn to_json(&self) -> serde_json::Value {
        serde_json::json!({
            "attributes": self.attributes.iter().map(|a| {
                serde_json::json!({
                    "name": a.name,
                    "type": a.attr_type.as_str(),
                    "required": a.mode == Mode::Required,
                    "optional": matches!(a.mode, Mode::Optional | Mode::OptionalComputed),
                    "computed": matches!(a.mode, Mode::Computed | Mode::OptionalComputed),
                    "sensitive": a.sensitive,
                    "description": a.description,
                })
            }).collect::<Vec<_>>(),
        })
    }
}
