#![allow(dead_code)]

use std::collections::BTreeMap;
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::Utc;
use uuid::Uuid;

use oxide_provider::api::*;

/// How many polls a stopping instance reports `stopping` before settling on
/// `stopped`.
const STOPPING_POLLS: u32 = 2;

#[derive(Default)]
struct Inner {
    projects: BTreeMap<String, Project>,
    organizations: BTreeMap<String, Organization>,
    ip_pools: BTreeMap<String, IpPool>,
    vpcs: BTreeMap<String, Vpc>,
    subnets: BTreeMap<String, VpcSubnet>,
    disks: BTreeMap<String, Disk>,
    snapshots: BTreeMap<String, Snapshot>,
    images: BTreeMap<String, Image>,
    instances: BTreeMap<String, Instance>,
    nics: BTreeMap<String, NetworkInterface>,
    external_ips: BTreeMap<String, Vec<ExternalIp>>,
    /// Remaining `stopping` polls per instance id.
    stopping: BTreeMap<String, u32>,
    /// Operation name → error to return on the next call.
    fail_next: BTreeMap<String, ApiError>,
    /// Every API call, in order, for sequence assertions.
    calls: Vec<String>,
}

/// In-memory stand-in for the Oxide control plane. Instance stops settle to
/// `stopped` only after a few polls so waiter behavior is exercised.
#[derive(Default)]
pub struct FakeOxide {
    inner: Mutex<Inner>,
}

fn new_id() -> String {
    Uuid::new_v4().to_string()
}

impl FakeOxide {
    pub fn new() -> Self {
        Self::default()
    }

    /// Force the next call of `operation` to fail with `error`.
    pub fn fail_next(&self, operation: &str, error: ApiError) {
        let mut inner = self.inner.lock().unwrap();
        inner.fail_next.insert(operation.to_string(), error);
    }

    /// The sequence of API calls made so far.
    pub fn calls(&self) -> Vec<String> {
        self.inner.lock().unwrap().calls.clone()
    }

    pub fn call_count(&self, operation: &str) -> usize {
        self.inner
            .lock()
            .unwrap()
            .calls
            .iter()
            .filter(|c| *c == operation)
            .count()
    }

    pub fn seed_project(&self, name: &str) -> Project {
        let now = Utc::now();
        let project = Project {
            id: new_id(),
            name: name.to_string(),
            description: format!("{} description", name),
            time_created: now,
            time_modified: now,
        };
        let mut inner = self.inner.lock().unwrap();
        inner.projects.insert(project.id.clone(), project.clone());
        project
    }

    pub fn seed_vpc(&self, project_id: &str, name: &str) -> Vpc {
        let now = Utc::now();
        let vpc = Vpc {
            id: new_id(),
            project_id: project_id.to_string(),
            name: name.to_string(),
            description: format!("{} description", name),
            dns_name: format!("{}-dns", name),
            ipv6_prefix: "fd12:3456:789a::/48".to_string(),
            system_router_id: new_id(),
            time_created: now,
            time_modified: now,
        };
        let mut inner = self.inner.lock().unwrap();
        inner.vpcs.insert(vpc.id.clone(), vpc.clone());
        vpc
    }

    pub fn seed_subnet(&self, vpc_id: &str, name: &str) -> VpcSubnet {
        let now = Utc::now();
        let subnet = VpcSubnet {
            id: new_id(),
            vpc_id: vpc_id.to_string(),
            name: name.to_string(),
            description: format!("{} description", name),
            ipv4_block: "192.168.1.0/24".to_string(),
            ipv6_block: "fd12:3456:789a:1::/64".to_string(),
            time_created: now,
            time_modified: now,
        };
        let mut inner = self.inner.lock().unwrap();
        inner.subnets.insert(subnet.id.clone(), subnet.clone());
        subnet
    }

    pub fn seed_instance(&self, project_id: &str, name: &str, run_state: InstanceState) -> Instance {
        let now = Utc::now();
        let instance = Instance {
            id: new_id(),
            project_id: project_id.to_string(),
            name: name.to_string(),
            description: format!("{} description", name),
            hostname: format!("{}-host", name),
            memory: 1073741824,
            ncpus: 1,
            run_state,
            time_created: now,
            time_modified: now,
            time_run_state_updated: now,
        };
        let mut inner = self.inner.lock().unwrap();
        inner.instances.insert(instance.id.clone(), instance.clone());
        instance
    }

    pub fn seed_disk(&self, project_id: &str, name: &str, attached_to: Option<&str>) -> Disk {
        let now = Utc::now();
        let disk = Disk {
            id: new_id(),
            project_id: project_id.to_string(),
            name: name.to_string(),
            description: format!("{} description", name),
            size: 1073741824,
            block_size: 512,
            device_path: format!("/mnt/{}", name),
            image_id: None,
            snapshot_id: None,
            state: DiskState {
                state: if attached_to.is_some() { "attached" } else { "detached" }.to_string(),
                instance: attached_to.map(String::from),
            },
            time_created: now,
            time_modified: now,
        };
        let mut inner = self.inner.lock().unwrap();
        inner.disks.insert(disk.id.clone(), disk.clone());
        disk
    }

    pub fn seed_image(&self, project_id: Option<&str>, name: &str) -> Image {
        let now = Utc::now();
        let image = Image {
            id: new_id(),
            project_id: project_id.map(String::from),
            name: name.to_string(),
            description: format!("{} description", name),
            os: "alpine".to_string(),
            version: "3.16".to_string(),
            block_size: 512,
            size: 1073741824,
            digest: Some("sha256:deadbeef".to_string()),
            url: None,
            time_created: now,
            time_modified: now,
        };
        let mut inner = self.inner.lock().unwrap();
        inner.images.insert(image.id.clone(), image.clone());
        image
    }

    pub fn set_external_ips(&self, instance_id: &str, ips: Vec<ExternalIp>) {
        let mut inner = self.inner.lock().unwrap();
        inner.external_ips.insert(instance_id.to_string(), ips);
    }

    pub fn instance_state(&self, id: &str) -> Option<InstanceState> {
        self.inner.lock().unwrap().instances.get(id).map(|i| i.run_state)
    }

    pub fn remove_project(&self, id: &str) {
        self.inner.lock().unwrap().projects.remove(id);
    }

    pub fn remove_instance(&self, id: &str) {
        let mut inner = self.inner.lock().unwrap();
        inner.instances.remove(id);
        inner.stopping.remove(id);
    }

    pub fn remove_disk(&self, id: &str) {
        self.inner.lock().unwrap().disks.remove(id);
    }

    /// Out-of-band mutation for drift tests.
    pub fn rename_project(&self, id: &str, name: &str) {
        let mut inner = self.inner.lock().unwrap();
        if let Some(project) = inner.projects.get_mut(id) {
            project.name = name.to_string();
            project.time_modified = Utc::now();
        }
    }

    pub fn detach_disk(&self, id: &str) {
        let mut inner = self.inner.lock().unwrap();
        if let Some(disk) = inner.disks.get_mut(id) {
            disk.state = DiskState {
                state: "detached".to_string(),
                instance: None,
            };
        }
    }

    fn begin(&self, operation: &str) -> Result<std::sync::MutexGuard<'_, Inner>> {
        let mut inner = self.inner.lock().unwrap();
        inner.calls.push(operation.to_string());
        if let Some(error) = inner.fail_next.remove(operation) {
            return Err(error);
        }
        Ok(inner)
    }
}

fn find_by_id_or_name<'a, T>(
    map: &'a BTreeMap<String, T>,
    key: &str,
    name: impl Fn(&T) -> &str,
) -> Option<&'a T> {
    map.get(key).or_else(|| map.values().find(|v| name(v) == key))
}

#[async_trait]
impl OxideApi for FakeOxide {
    async fn project_create(&self, body: &ProjectCreate) -> Result<Project> {
        let mut inner = self.begin("project_create")?;
        let now = Utc::now();
        let project = Project {
            id: new_id(),
            name: body.name.clone(),
            description: body.description.clone(),
            time_created: now,
            time_modified: now,
        };
        inner.projects.insert(project.id.clone(), project.clone());
        Ok(project)
    }

    async fn project_view(&self, id: &str) -> Result<Project> {
        let inner = self.begin("project_view")?;
        find_by_id_or_name(&inner.projects, id, |p| &p.name)
            .cloned()
            .ok_or_else(ApiError::not_found)
    }

    async fn project_update(&self, id: &str, body: &ProjectUpdate) -> Result<Project> {
        let mut inner = self.begin("project_update")?;
        let project = inner.projects.get_mut(id).ok_or_else(ApiError::not_found)?;
        if let Some(name) = &body.name {
            project.name = name.clone();
        }
        if let Some(description) = &body.description {
            project.description = description.clone();
        }
        project.time_modified = Utc::now();
        Ok(project.clone())
    }

    async fn project_delete(&self, id: &str) -> Result<()> {
        let mut inner = self.begin("project_delete")?;
        inner.projects.remove(id).map(|_| ()).ok_or_else(ApiError::not_found)
    }

    async fn project_list(&self, _params: &ListParams) -> Result<ResultsPage<Project>> {
        let inner = self.begin("project_list")?;
        Ok(ResultsPage {
            items: inner.projects.values().cloned().collect(),
            next_page: None,
        })
    }

    async fn organization_create(&self, body: &OrganizationCreate) -> Result<Organization> {
        let mut inner = self.begin("organization_create")?;
        let now = Utc::now();
        let org = Organization {
            id: new_id(),
            name: body.name.clone(),
            description: body.description.clone(),
            time_created: now,
            time_modified: now,
        };
        inner.organizations.insert(org.id.clone(), org.clone());
        Ok(org)
    }

    async fn organization_view(&self, id: &str) -> Result<Organization> {
        let inner = self.begin("organization_view")?;
        inner.organizations.get(id).cloned().ok_or_else(ApiError::not_found)
    }

    async fn organization_update(
        &self,
        id: &str,
        body: &OrganizationUpdate,
    ) -> Result<Organization> {
        let mut inner = self.begin("organization_update")?;
        let org = inner.organizations.get_mut(id).ok_or_else(ApiError::not_found)?;
        if let Some(description) = &body.description {
            org.description = description.clone();
        }
        org.time_modified = Utc::now();
        Ok(org.clone())
    }

    async fn organization_delete(&self, id: &str) -> Result<()> {
        let mut inner = self.begin("organization_delete")?;
        inner
            .organizations
            .remove(id)
            .map(|_| ())
            .ok_or_else(ApiError::not_found)
    }

    async fn organization_list(&self, _params: &ListParams) -> Result<ResultsPage<Organization>> {
        let inner = self.begin("organization_list")?;
        Ok(ResultsPage {
            items: inner.organizations.values().cloned().collect(),
            next_page: None,
        })
    }

    async fn ip_pool_create(&self, body: &IpPoolCreate) -> Result<IpPool> {
        let mut inner = self.begin("ip_pool_create")?;
        let now = Utc::now();
        let pool = IpPool {
            id: new_id(),
            name: body.name.clone(),
            description: body.description.clone(),
            time_created: now,
            time_modified: now,
        };
        inner.ip_pools.insert(pool.id.clone(), pool.clone());
        Ok(pool)
    }

    async fn ip_pool_view(&self, id: &str) -> Result<IpPool> {
        let inner = self.begin("ip_pool_view")?;
        inner.ip_pools.get(id).cloned().ok_or_else(ApiError::not_found)
    }

    async fn ip_pool_update(&self, id: &str, body: &IpPoolUpdate) -> Result<IpPool> {
        let mut inner = self.begin("ip_pool_update")?;
        let pool = inner.ip_pools.get_mut(id).ok_or_else(ApiError::not_found)?;
        if let Some(description) = &body.description {
            pool.description = description.clone();
        }
        pool.time_modified = Utc::now();
        Ok(pool.clone())
    }

    async fn ip_pool_delete(&self, id: &str) -> Result<()> {
        let mut inner = self.begin("ip_pool_delete")?;
        inner.ip_pools.remove(id).map(|_| ()).ok_or_else(ApiError::not_found)
    }

    async fn vpc_create(&self, project: &str, body: &VpcCreate) -> Result<Vpc> {
        let mut inner = self.begin("vpc_create")?;
        let now = Utc::now();
        let vpc = Vpc {
            id: new_id(),
            project_id: project.to_string(),
            name: body.name.clone(),
            description: body.description.clone(),
            dns_name: body.dns_name.clone(),
            ipv6_prefix: body
                .ipv6_prefix
                .clone()
                .unwrap_or_else(|| "fd9e:1a2b:3c4d::/48".to_string()),
            system_router_id: new_id(),
            time_created: now,
            time_modified: now,
        };
        inner.vpcs.insert(vpc.id.clone(), vpc.clone());
        Ok(vpc)
    }

    async fn vpc_view(&self, id: &str) -> Result<Vpc> {
        let inner = self.begin("vpc_view")?;
        inner.vpcs.get(id).cloned().ok_or_else(ApiError::not_found)
    }

    async fn vpc_update(&self, id: &str, body: &VpcUpdate) -> Result<Vpc> {
        let mut inner = self.begin("vpc_update")?;
        let vpc = inner.vpcs.get_mut(id).ok_or_else(ApiError::not_found)?;
        if let Some(name) = &body.name {
            vpc.name = name.clone();
        }
        if let Some(description) = &body.description {
            vpc.description = description.clone();
        }
        if let Some(dns_name) = &body.dns_name {
            vpc.dns_name = dns_name.clone();
        }
        vpc.time_modified = Utc::now();
        Ok(vpc.clone())
    }

    async fn vpc_delete(&self, id: &str) -> Result<()> {
        let mut inner = self.begin("vpc_delete")?;
        if inner.subnets.values().any(|s| s.vpc_id == id) {
            return Err(ApiError::Status {
                status: 400,
                message: "VPC still contains subnets".to_string(),
            });
        }
        inner.vpcs.remove(id).map(|_| ()).ok_or_else(ApiError::not_found)
    }

    async fn vpc_subnet_create(&self, vpc: &str, body: &VpcSubnetCreate) -> Result<VpcSubnet> {
        let mut inner = self.begin("vpc_subnet_create")?;
        if !inner.vpcs.contains_key(vpc) {
            return Err(ApiError::not_found());
        }
        let now = Utc::now();
        let subnet = VpcSubnet {
            id: new_id(),
            vpc_id: vpc.to_string(),
            name: body.name.clone(),
            description: body.description.clone(),
            ipv4_block: body.ipv4_block.clone(),
            ipv6_block: body
                .ipv6_block
                .clone()
                .unwrap_or_else(|| "fd9e:1a2b:3c4d:1::/64".to_string()),
            time_created: now,
            time_modified: now,
        };
        inner.subnets.insert(subnet.id.clone(), subnet.clone());
        Ok(subnet)
    }

    async fn vpc_subnet_view(&self, id: &str) -> Result<VpcSubnet> {
        let inner = self.begin("vpc_subnet_view")?;
        inner.subnets.get(id).cloned().ok_or_else(ApiError::not_found)
    }

    async fn vpc_subnet_update(&self, id: &str, body: &VpcSubnetUpdate) -> Result<VpcSubnet> {
        let mut inner = self.begin("vpc_subnet_update")?;
        let subnet = inner.subnets.get_mut(id).ok_or_else(ApiError::not_found)?;
        if let Some(name) = &body.name {
            subnet.name = name.clone();
        }
        if let Some(description) = &body.description {
            subnet.description = description.clone();
        }
        subnet.time_modified = Utc::now();
        Ok(subnet.clone())
    }

    async fn vpc_subnet_delete(&self, id: &str) -> Result<()> {
        let mut inner = self.begin("vpc_subnet_delete")?;
        inner.subnets.remove(id).map(|_| ()).ok_or_else(ApiError::not_found)
    }

    async fn vpc_subnet_list(
        &self,
        vpc: &str,
        _params: &ListParams,
    ) -> Result<ResultsPage<VpcSubnet>> {
        let inner = self.begin("vpc_subnet_list")?;
        Ok(ResultsPage {
            items: inner.subnets.values().filter(|s| s.vpc_id == vpc).cloned().collect(),
            next_page: None,
        })
    }

    async fn disk_create(&self, project: &str, body: &DiskCreate) -> Result<Disk> {
        let mut inner = self.begin("disk_create")?;
        let now = Utc::now();
        let (block_size, image_id, snapshot_id) = match &body.disk_source {
            DiskSource::Blank { block_size } => (*block_size, None, None),
            DiskSource::Image { image_id } | DiskSource::GlobalImage { image_id } => {
                (512, Some(image_id.clone()), None)
            }
            DiskSource::Snapshot { snapshot_id } => (512, None, Some(snapshot_id.clone())),
        };
        let disk = Disk {
            id: new_id(),
            project_id: project.to_string(),
            name: body.name.clone(),
            description: body.description.clone(),
            size: body.size,
            block_size,
            device_path: format!("/mnt/{}", body.name),
            image_id,
            snapshot_id,
            state: DiskState {
                state: "detached".to_string(),
                instance: None,
            },
            time_created: now,
            time_modified: now,
        };
        inner.disks.insert(disk.id.clone(), disk.clone());
        Ok(disk)
    }

    async fn disk_view(&self, id: &str) -> Result<Disk> {
        let inner = self.begin("disk_view")?;
        inner.disks.get(id).cloned().ok_or_else(ApiError::not_found)
    }

    async fn disk_delete(&self, id: &str) -> Result<()> {
        let mut inner = self.begin("disk_delete")?;
        inner.disks.remove(id).map(|_| ()).ok_or_else(ApiError::not_found)
    }

    async fn snapshot_create(&self, project: &str, body: &SnapshotCreate) -> Result<Snapshot> {
        let mut inner = self.begin("snapshot_create")?;
        let disk_id = find_by_id_or_name(&inner.disks, &body.disk, |d| &d.name)
            .map(|d| d.id.clone())
            .ok_or_else(ApiError::not_found)?;
        let now = Utc::now();
        let snapshot = Snapshot {
            id: new_id(),
            project_id: project.to_string(),
            name: body.name.clone(),
            description: body.description.clone(),
            disk_id,
            size: 1073741824,
            time_created: now,
            time_modified: now,
        };
        inner.snapshots.insert(snapshot.id.clone(), snapshot.clone());
        Ok(snapshot)
    }

    async fn snapshot_view(&self, id: &str) -> Result<Snapshot> {
        let inner = self.begin("snapshot_view")?;
        inner.snapshots.get(id).cloned().ok_or_else(ApiError::not_found)
    }

    async fn snapshot_delete(&self, id: &str) -> Result<()> {
        let mut inner = self.begin("snapshot_delete")?;
        inner.snapshots.remove(id).map(|_| ()).ok_or_else(ApiError::not_found)
    }

    async fn image_create(&self, project: &str, body: &ImageCreate) -> Result<Image> {
        let mut inner = self.begin("image_create")?;
        let now = Utc::now();
        let url = match &body.source {
            ImageSource::Url { url } => Some(url.clone()),
            _ => None,
        };
        let image = Image {
            id: new_id(),
            project_id: Some(project.to_string()),
            name: body.name.clone(),
            description: body.description.clone(),
            os: body.os.clone(),
            version: body.version.clone(),
            block_size: body.block_size,
            size: 1073741824,
            digest: Some("sha256:deadbeef".to_string()),
            url,
            time_created: now,
            time_modified: now,
        };
        inner.images.insert(image.id.clone(), image.clone());
        Ok(image)
    }

    async fn image_view(&self, id: &str) -> Result<Image> {
        let inner = self.begin("image_view")?;
        inner.images.get(id).cloned().ok_or_else(ApiError::not_found)
    }

    async fn image_list(&self, project: &str, _params: &ListParams) -> Result<ResultsPage<Image>> {
        let inner = self.begin("image_list")?;
        Ok(ResultsPage {
            items: inner
                .images
                .values()
                .filter(|i| i.project_id.as_deref() == Some(project))
                .cloned()
                .collect(),
            next_page: None,
        })
    }

    async fn global_image_list(&self, _params: &ListParams) -> Result<ResultsPage<Image>> {
        let inner = self.begin("global_image_list")?;
        Ok(ResultsPage {
            items: inner
                .images
                .values()
                .filter(|i| i.project_id.is_none())
                .cloned()
                .collect(),
            next_page: None,
        })
    }

    async fn image_promote(&self, id: &str) -> Result<Image> {
        let mut inner = self.begin("image_promote")?;
        let image = inner.images.get_mut(id).ok_or_else(ApiError::not_found)?;
        image.project_id = None;
        image.time_modified = Utc::now();
        Ok(image.clone())
    }

    async fn image_demote(&self, id: &str, project: &str) -> Result<Image> {
        let mut inner = self.begin("image_demote")?;
        let image = inner.images.get_mut(id).ok_or_else(ApiError::not_found)?;
        image.project_id = Some(project.to_string());
        image.time_modified = Utc::now();
        Ok(image.clone())
    }

    async fn instance_create(&self, project: &str, body: &InstanceCreate) -> Result<Instance> {
        let mut inner = self.begin("instance_create")?;
        let now = Utc::now();
        let instance = Instance {
            id: new_id(),
            project_id: project.to_string(),
            name: body.name.clone(),
            description: body.description.clone(),
            hostname: body.hostname.clone(),
            memory: body.memory,
            ncpus: body.ncpus,
            run_state: if body.start {
                InstanceState::Running
            } else {
                InstanceState::Stopped
            },
            time_created: now,
            time_modified: now,
            time_run_state_updated: now,
        };
        inner.instances.insert(instance.id.clone(), instance.clone());

        if let InstanceNetworkInterfaceAttachment::Create(nics) = &body.network_interfaces {
            for nic_body in nics {
                let vpc_id = inner
                    .vpcs
                    .values()
                    .find(|v| v.name == nic_body.vpc_name)
                    .map(|v| v.id.clone())
                    .ok_or_else(ApiError::not_found)?;
                let subnet_id = inner
                    .subnets
                    .values()
                    .find(|s| s.name == nic_body.subnet_name)
                    .map(|s| s.id.clone())
                    .ok_or_else(ApiError::not_found)?;
                let nic = NetworkInterface {
                    id: new_id(),
                    instance_id: instance.id.clone(),
                    name: nic_body.name.clone(),
                    description: nic_body.description.clone(),
                    vpc_id,
                    subnet_id,
                    ip: nic_body.ip.clone().unwrap_or_else(|| "172.30.0.5".to_string()),
                    mac: "A8:40:25:F0:00:01".to_string(),
                    primary: inner.nics.values().all(|n| n.instance_id != instance.id),
                    time_created: now,
                    time_modified: now,
                };
                inner.nics.insert(nic.id.clone(), nic);
            }
        }
        Ok(instance)
    }

    async fn instance_view(&self, id: &str) -> Result<Instance> {
        let mut inner = self.begin("instance_view")?;
        // A stopping instance settles only after a few polls.
        let settle = match inner.stopping.get_mut(id) {
            Some(polls) if *polls > 0 => {
                *polls -= 1;
                false
            }
            Some(_) => true,
            None => false,
        };
        if settle {
            inner.stopping.remove(id);
            if let Some(instance) = inner.instances.get_mut(id) {
                instance.run_state = InstanceState::Stopped;
                instance.time_run_state_updated = Utc::now();
            }
        }
        inner.instances.get(id).cloned().ok_or_else(ApiError::not_found)
    }

    async fn instance_delete(&self, id: &str) -> Result<()> {
        let mut inner = self.begin("instance_delete")?;
        let instance = inner.instances.get(id).ok_or_else(ApiError::not_found)?;
        if instance.run_state != InstanceState::Stopped {
            return Err(ApiError::Status {
                status: 400,
                message: "instance must be stopped before delete".to_string(),
            });
        }
        inner.instances.remove(id);
        inner.nics.retain(|_, nic| nic.instance_id != id);
        Ok(())
    }

    async fn instance_start(&self, id: &str) -> Result<Instance> {
        let mut inner = self.begin("instance_start")?;
        let instance = inner.instances.get_mut(id).ok_or_else(ApiError::not_found)?;
        instance.run_state = InstanceState::Running;
        instance.time_run_state_updated = Utc::now();
        Ok(instance.clone())
    }

    async fn instance_stop(&self, id: &str) -> Result<Instance> {
        let mut inner = self.begin("instance_stop")?;
        let needs_stop = match inner.instances.get(id) {
            Some(instance) => instance.run_state != InstanceState::Stopped,
            None => return Err(ApiError::not_found()),
        };
        if needs_stop {
            if let Some(instance) = inner.instances.get_mut(id) {
                instance.run_state = InstanceState::Stopping;
                instance.time_run_state_updated = Utc::now();
            }
            inner.stopping.insert(id.to_string(), STOPPING_POLLS);
        }
        inner.instances.get(id).cloned().ok_or_else(ApiError::not_found)
    }

    async fn instance_external_ip_list(&self, instance: &str) -> Result<ResultsPage<ExternalIp>> {
        let inner = self.begin("instance_external_ip_list")?;
        if !inner.instances.contains_key(instance) {
            return Err(ApiError::not_found());
        }
        Ok(ResultsPage {
            items: inner.external_ips.get(instance).cloned().unwrap_or_default(),
            next_page: None,
        })
    }

    async fn instance_disk_attach(&self, instance: &str, disk: &str) -> Result<Disk> {
        let mut inner = self.begin("instance_disk_attach")?;
        if !inner.instances.contains_key(instance) {
            return Err(ApiError::not_found());
        }
        let disk = inner.disks.get_mut(disk).ok_or_else(ApiError::not_found)?;
        disk.state = DiskState {
            state: "attached".to_string(),
            instance: Some(instance.to_string()),
        };
        disk.time_modified = Utc::now();
        Ok(disk.clone())
    }

    async fn instance_disk_detach(&self, instance: &str, disk: &str) -> Result<Disk> {
        let mut inner = self.begin("instance_disk_detach")?;
        let disk = inner.disks.get_mut(disk).ok_or_else(ApiError::not_found)?;
        // Detaching a disk that is not attached to this instance reports
        // the attachment as missing.
        if disk.state.instance.as_deref() != Some(instance) {
            return Err(ApiError::not_found());
        }
        disk.state = DiskState {
            state: "detached".to_string(),
            instance: None,
        };
        disk.time_modified = Utc::now();
        Ok(disk.clone())
    }

    async fn instance_nic_create(
        &self,
        instance: &str,
        body: &NetworkInterfaceCreate,
    ) -> Result<NetworkInterface> {
        let mut inner = self.begin("instance_nic_create")?;
        let owner = inner.instances.get(instance).ok_or_else(ApiError::not_found)?;
        if owner.run_state != InstanceState::Stopped {
            return Err(ApiError::Status {
                status: 400,
                message: "instance must be stopped to modify network interfaces".to_string(),
            });
        }
        let vpc_id = inner
            .vpcs
            .values()
            .find(|v| v.name == body.vpc_name)
            .map(|v| v.id.clone())
            .ok_or_else(ApiError::not_found)?;
        let subnet_id = inner
            .subnets
            .values()
            .find(|s| s.name == body.subnet_name)
            .map(|s| s.id.clone())
            .ok_or_else(ApiError::not_found)?;
        let now = Utc::now();
        let nic = NetworkInterface {
            id: new_id(),
            instance_id: instance.to_string(),
            name: body.name.clone(),
            description: body.description.clone(),
            vpc_id,
            subnet_id,
            ip: body.ip.clone().unwrap_or_else(|| "172.30.0.6".to_string()),
            mac: "A8:40:25:F0:00:02".to_string(),
            primary: inner.nics.values().all(|n| n.instance_id != instance),
            time_created: now,
            time_modified: now,
        };
        inner.nics.insert(nic.id.clone(), nic.clone());
        Ok(nic)
    }

    async fn instance_nic_view(&self, id: &str) -> Result<NetworkInterface> {
        let inner = self.begin("instance_nic_view")?;
        inner.nics.get(id).cloned().ok_or_else(ApiError::not_found)
    }

    async fn instance_nic_update(
        &self,
        id: &str,
        body: &NetworkInterfaceUpdate,
    ) -> Result<NetworkInterface> {
        let mut inner = self.begin("instance_nic_update")?;
        let nic = inner.nics.get_mut(id).ok_or_else(ApiError::not_found)?;
        if let Some(name) = &body.name {
            nic.name = name.clone();
        }
        if let Some(description) = &body.description {
            nic.description = description.clone();
        }
        nic.time_modified = Utc::now();
        Ok(nic.clone())
    }

    async fn instance_nic_delete(&self, id: &str) -> Result<()> {
        let mut inner = self.begin("instance_nic_delete")?;
        inner.nics.remove(id).map(|_| ()).ok_or_else(ApiError::not_found)
    }

    async fn instance_nic_list(
        &self,
        instance: &str,
        _params: &ListParams,
    ) -> Result<ResultsPage<NetworkInterface>> {
        let inner = self.begin("instance_nic_list")?;
        Ok(ResultsPage {
            items: inner
                .nics
                .values()
                .filter(|n| n.instance_id == instance)
                .cloned()
                .collect(),
            next_page: None,
        })
    }
}

// ─── Test Helpers ───────────────────────────────────────────────────────────

use oxide_provider::timeouts::{OpContext, Phase};
use oxide_provider::value::ResourceData;

/// Context with a test-friendly deadline.
pub fn ctx(phase: Phase) -> OpContext {
    OpContext::with_timeout(phase, std::time::Duration::from_secs(30))
}

/// Resource data from (attribute, value) string pairs.
pub fn data(pairs: &[(&str, &str)]) -> ResourceData {
    let mut data = ResourceData::new();
    for (name, value) in pairs {
        data.set(name, *value);
    }
    data
}
