pub mod client;
pub mod error;
pub mod types;

use async_trait::async_trait;

pub use error::ApiError;
pub use types::*;

pub type Result<T> = std::result::Result<T, ApiError>;

/// The typed Oxide control-plane surface the provider consumes.
///
/// Implementations must be safe for concurrent calls: the host may run
/// handlers for distinct resource instances in parallel against the one
/// shared client.
#[async_trait]
pub trait OxideApi: Send + Sync {
    // ── Projects ──
    async fn project_create(&self, body: &ProjectCreate) -> Result<Project>;
    async fn project_view(&self, id: &str) -> Result<Project>;
    async fn project_update(&self, id: &str, body: &ProjectUpdate) -> Result<Project>;
    async fn project_delete(&self, id: &str) -> Result<()>;
    async fn project_list(&self, params: &ListParams) -> Result<ResultsPage<Project>>;

    // ── Organizations ──
    async fn organization_create(&self, body: &OrganizationCreate) -> Result<Organization>;
    async fn organization_view(&self, id: &str) -> Result<Organization>;
    async fn organization_update(&self, id: &str, body: &OrganizationUpdate)
        -> Result<Organization>;
    async fn organization_delete(&self, id: &str) -> Result<()>;
    async fn organization_list(&self, params: &ListParams) -> Result<ResultsPage<Organization>>;

    // ── IP pools ──
    async fn ip_pool_create(&self, body: &IpPoolCreate) -> Result<IpPool>;
    async fn ip_pool_view(&self, id: &str) -> Result<IpPool>;
    async fn ip_pool_update(&self, id: &str, body: &IpPoolUpdate) -> Result<IpPool>;
    async fn ip_pool_delete(&self, id: &str) -> Result<()>;

    // ── VPCs ──
    async fn vpc_create(&self, project: &str, body: &VpcCreate) -> Result<Vpc>;
    async fn vpc_view(&self, id: &str) -> Result<Vpc>;
    async fn vpc_update(&self, id: &str, body: &VpcUpdate) -> Result<Vpc>;
    async fn vpc_delete(&self, id: &str) -> Result<()>;

    // ── VPC subnets ──
    async fn vpc_subnet_create(&self, vpc: &str, body: &VpcSubnetCreate) -> Result<VpcSubnet>;
    async fn vpc_subnet_view(&self, id: &str) -> Result<VpcSubnet>;
    async fn vpc_subnet_update(&self, id: &str, body: &VpcSubnetUpdate) -> Result<VpcSubnet>;
    async fn vpc_subnet_delete(&self, id: &str) -> Result<()>;
    async fn vpc_subnet_list(&self, vpc: &str, params: &ListParams)
        -> Result<ResultsPage<VpcSubnet>>;

    // ── Disks ──
    async fn disk_create(&self, project: &str, body: &DiskCreate) -> Result<Disk>;
    async fn disk_view(&self, id: &str) -> Result<Disk>;
    async fn disk_delete(&self, id: &str) -> Result<()>;

    // ── Snapshots ──
    async fn snapshot_create(&self, project: &str, body: &SnapshotCreate) -> Result<Snapshot>;
    async fn snapshot_view(&self, id: &str) -> Result<Snapshot>;
    async fn snapshot_delete(&self, id: &str) -> Result<()>;

    // ── Images ──
    async fn image_create(&self, project: &str, body: &ImageCreate) -> Result<Image>;
    async fn image_view(&self, id: &str) -> Result<Image>;
    async fn image_list(&self, project: &str, params: &ListParams) -> Result<ResultsPage<Image>>;
    async fn global_image_list(&self, params: &ListParams) -> Result<ResultsPage<Image>>;
    /// Promote a project image to silo visibility (project_id becomes null).
    async fn image_promote(&self, id: &str) -> Result<Image>;
    /// Demote a silo image into a project.
    async fn image_demote(&self, id: &str, project: &str) -> Result<Image>;

    // ── Instances ──
    async fn instance_create(&self, project: &str, body: &InstanceCreate) -> Result<Instance>;
    async fn instance_view(&self, id: &str) -> Result<Instance>;
    async fn instance_delete(&self, id: &str) -> Result<()>;
    async fn instance_start(&self, id: &str) -> Result<Instance>;
    async fn instance_stop(&self, id: &str) -> Result<Instance>;
    async fn instance_external_ip_list(&self, instance: &str) -> Result<ResultsPage<ExternalIp>>;
    async fn instance_disk_attach(&self, instance: &str, disk: &str) -> Result<Disk>;
    async fn instance_disk_detach(&self, instance: &str, disk: &str) -> Result<Disk>;

    // ── Instance network interfaces ──
    async fn instance_nic_create(
        &self,
        instance: &str,
        body: &NetworkInterfaceCreate,
    ) -> Result<NetworkInterface>;
    async fn instance_nic_view(&self, id: &str) -> Result<NetworkInterface>;
    async fn instance_nic_update(
        &self,
        id: &str,
        body: &NetworkInterfaceUpdate,
    ) -> Result<NetworkInterface>;
    async fn instance_nic_delete(&self, id: &str) -> Result<()>;
    async fn instance_nic_list(
        &self,
        instance: &str,
        params: &ListParams,
    ) -> Result<ResultsPage<NetworkInterface>>;
}
