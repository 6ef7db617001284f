use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ─── Listing ────────────────────────────────────────────────────────────────

/// A single page of list results.
///
/// The provider issues single-page listings with a very large limit; the
/// upstream pagination token is carried but unused.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResultsPage<T> {
    pub items: Vec<T>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next_page: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortMode {
    NameAscending,
    IdAscending,
}

impl SortMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            SortMode::NameAscending => "name_ascending",
            SortMode::IdAscending => "id_ascending",
        }
    }
}

/// Listing parameters shared by all list endpoints.
#[derive(Debug, Clone, Copy)]
pub struct ListParams {
    pub limit: u32,
    pub sort_by: SortMode,
}

impl Default for ListParams {
    /// Single-page listing working around the upstream pagination
    /// limitation.
    fn default() -> Self {
        Self {
            limit: 1_000_000_000,
            sort_by: SortMode::NameAscending,
        }
    }
}

// ─── Project & Organization ─────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Project {
    pub id: String,
    pub name: String,
    pub description: String,
    pub time_created: DateTime<Utc>,
    pub time_modified: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectCreate {
    pub name: String,
    pub description: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProjectUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Organization {
    pub id: String,
    pub name: String,
    pub description: String,
    pub time_created: DateTime<Utc>,
    pub time_modified: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrganizationCreate {
    pub name: String,
    pub description: String,
}

/// The name is the identifier for the update call and cannot itself change.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OrganizationUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

// ─── IP Pool ────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IpPool {
    pub id: String,
    pub name: String,
    pub description: String,
    pub time_created: DateTime<Utc>,
    pub time_modified: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IpPoolCreate {
    pub name: String,
    pub description: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct IpPoolUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

// ─── VPC & Subnet ───────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Vpc {
    pub id: String,
    pub project_id: String,
    pub name: String,
    pub description: String,
    pub dns_name: String,
    pub ipv6_prefix: String,
    pub system_router_id: String,
    pub time_created: DateTime<Utc>,
    pub time_modified: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VpcCreate {
    pub name: String,
    pub description: String,
    pub dns_name: String,
    /// Server-assigned unique local prefix when omitted.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ipv6_prefix: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct VpcUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dns_name: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VpcSubnet {
    pub id: String,
    pub vpc_id: String,
    pub name: String,
    pub description: String,
    pub ipv4_block: String,
    pub ipv6_block: String,
    pub time_created: DateTime<Utc>,
    pub time_modified: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VpcSubnetCreate {
    pub name: String,
    pub description: String,
    pub ipv4_block: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ipv6_block: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct VpcSubnetUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

// ─── Disk & Snapshot ────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Disk {
    pub id: String,
    pub project_id: String,
    pub name: String,
    pub description: String,
    pub size: i64,
    pub block_size: i64,
    pub device_path: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub snapshot_id: Option<String>,
    pub state: DiskState,
    pub time_created: DateTime<Utc>,
    pub time_modified: DateTime<Utc>,
}

/// Disk attachment state; `instance` is set while attached.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DiskState {
    pub state: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub instance: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum DiskSource {
    Blank { block_size: i64 },
    Image { image_id: String },
    Snapshot { snapshot_id: String },
    GlobalImage { image_id: String },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DiskCreate {
    pub name: String,
    pub description: String,
    pub size: i64,
    pub disk_source: DiskSource,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Snapshot {
    pub id: String,
    pub project_id: String,
    pub name: String,
    pub description: String,
    /// Weak back-reference: the disk may be deleted after the snapshot is
    /// taken.
    pub disk_id: String,
    pub size: i64,
    pub time_created: DateTime<Utc>,
    pub time_modified: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SnapshotCreate {
    pub name: String,
    pub description: String,
    pub disk: String,
}

// ─── Image ──────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Image {
    pub id: String,
    /// Absent for silo-wide (promoted) images.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub project_id: Option<String>,
    pub name: String,
    pub description: String,
    pub os: String,
    pub version: String,
    pub block_size: i64,
    pub size: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub digest: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    pub time_created: DateTime<Utc>,
    pub time_modified: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ImageSource {
    Url { url: String },
    Snapshot { id: String },
    /// Test-only source kind reached via the distinguished sentinel URL.
    YouCanBootAnythingAsLongAsItsAlpine,
}

/// Sentinel URL routing image creation to the test-only source kind.
pub const IMAGE_SOURCE_SENTINEL: &str = "you_can_boot_anything_as_long_as_its_alpine";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImageCreate {
    pub name: String,
    pub description: String,
    pub os: String,
    pub version: String,
    pub block_size: i64,
    pub source: ImageSource,
}

// ─── Instance ───────────────────────────────────────────────────────────────

/// Observed instance run-state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InstanceState {
    Creating,
    Starting,
    Running,
    Stopping,
    Stopped,
    Rebooting,
    Repairing,
    Failed,
    Destroyed,
}

impl InstanceState {
    pub fn as_str(&self) -> &'static str {
        match self {
            InstanceState::Creating => "creating",
            InstanceState::Starting => "starting",
            InstanceState::Running => "running",
            InstanceState::Stopping => "stopping",
            InstanceState::Stopped => "stopped",
            InstanceState::Rebooting => "rebooting",
            InstanceState::Repairing => "repairing",
            InstanceState::Failed => "failed",
            InstanceState::Destroyed => "destroyed",
        }
    }
}

impl std::fmt::Display for InstanceState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Instance {
    pub id: String,
    pub project_id: String,
    pub name: String,
    pub description: String,
    pub hostname: String,
    pub memory: i64,
    pub ncpus: i64,
    pub run_state: InstanceState,
    pub time_created: DateTime<Utc>,
    pub time_modified: DateTime<Utc>,
    pub time_run_state_updated: DateTime<Utc>,
}

/// Disk to attach at instance create time, by name.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum InstanceDiskAttachment {
    Attach { name: String },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ExternalIpCreate {
    Ephemeral { pool_name: String },
}

/// NIC provisioning at instance create time. The create body identifies the
/// VPC and subnet by name.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case", content = "params")]
pub enum InstanceNetworkInterfaceAttachment {
    None,
    Create(Vec<NetworkInterfaceCreate>),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InstanceCreate {
    pub name: String,
    pub description: String,
    pub hostname: String,
    pub memory: i64,
    pub ncpus: i64,
    pub disks: Vec<InstanceDiskAttachment>,
    pub external_ips: Vec<ExternalIpCreate>,
    pub network_interfaces: InstanceNetworkInterfaceAttachment,
    pub start: bool,
}

// ─── Network Interface ──────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NetworkInterface {
    pub id: String,
    pub instance_id: String,
    pub name: String,
    pub description: String,
    pub vpc_id: String,
    pub subnet_id: String,
    pub ip: String,
    pub mac: String,
    pub primary: bool,
    pub time_created: DateTime<Utc>,
    pub time_modified: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NetworkInterfaceCreate {
    pub name: String,
    pub description: String,
    pub vpc_name: String,
    pub subnet_name: String,
    /// Auto-assigned when omitted.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ip: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NetworkInterfaceUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

// ─── External IPs ───────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExternalIp {
    pub ip: String,
    pub kind: String,
}
