use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::debug;

use super::error::ApiError;
use super::types::*;
use super::{OxideApi, Result};

/// HTTP client for the Oxide API, constructed once per provider
/// configuration and shared across handlers.
pub struct HttpClient {
    http: reqwest::Client,
    base: String,
}

impl HttpClient {
    pub fn new(host: &str, token: &str) -> Result<Self> {
        let mut headers = HeaderMap::new();
        let bearer = format!("Bearer {}", token);
        let mut auth = HeaderValue::from_str(&bearer)
            .map_err(|e| ApiError::Transport(format!("invalid token: {}", e)))?;
        auth.set_sensitive(true);
        headers.insert(AUTHORIZATION, auth);

        let http = reqwest::Client::builder()
            .default_headers(headers)
            .build()
            .map_err(|e| ApiError::Transport(e.to_string()))?;

        Ok(Self {
            http,
            base: host.trim_end_matches('/').to_string(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base, path)
    }

    async fn finish<T: DeserializeOwned>(&self, req: reqwest::RequestBuilder) -> Result<T> {
        let resp = req
            .send()
            .await
            .map_err(|e| ApiError::Transport(e.to_string()))?;
        let status = resp.status();
        if !status.is_success() {
            let message = resp.text().await.unwrap_or_default();
            return Err(ApiError::Status {
                status: status.as_u16(),
                message,
            });
        }
        resp.json::<T>()
            .await
            .map_err(|e| ApiError::Transport(format!("decoding response: {}", e)))
    }

    async fn finish_empty(&self, req: reqwest::RequestBuilder) -> Result<()> {
        let resp = req
            .send()
            .await
            .map_err(|e| ApiError::Transport(e.to_string()))?;
        let status = resp.status();
        if !status.is_success() {
            let message = resp.text().await.unwrap_or_default();
            return Err(ApiError::Status {
                status: status.as_u16(),
                message,
            });
        }
        Ok(())
    }

    async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        debug!(path, "GET");
        self.finish(self.http.get(self.url(path))).await
    }

    async fn get_list<T: DeserializeOwned>(
        &self,
        path: &str,
        params: &ListParams,
        scope: Option<(&str, &str)>,
    ) -> Result<T> {
        debug!(path, limit = params.limit, "GET (list)");
        let mut req = self.http.get(self.url(path)).query(&[
            ("limit", params.limit.to_string()),
            ("sort_by", params.sort_by.as_str().to_string()),
        ]);
        if let Some((key, value)) = scope {
            req = req.query(&[(key, value)]);
        }
        self.finish(req).await
    }

    async fn post<B: Serialize, T: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
        scope: Option<(&str, &str)>,
    ) -> Result<T> {
        debug!(path, "POST");
        let mut req = self.http.post(self.url(path)).json(body);
        if let Some((key, value)) = scope {
            req = req.query(&[(key, value)]);
        }
        self.finish(req).await
    }

    async fn put<B: Serialize, T: DeserializeOwned>(&self, path: &str, body: &B) -> Result<T> {
        debug!(path, "PUT");
        self.finish(self.http.put(self.url(path)).json(body)).await
    }

    async fn delete(&self, path: &str) -> Result<()> {
        debug!(path, "DELETE");
        self.finish_empty(self.http.delete(self.url(path))).await
    }
}

#[async_trait]
impl OxideApi for HttpClient {
    async fn project_create(&self, body: &ProjectCreate) -> Result<Project> {
        self.post("/v1/projects", body, None).await
    }

    async fn project_view(&self, id: &str) -> Result<Project> {
        self.get(&format!("/v1/projects/{}", id)).await
    }

    async fn project_update(&self, id: &str, body: &ProjectUpdate) -> Result<Project> {
        self.put(&format!("/v1/projects/{}", id), body).await
    }

    async fn project_delete(&self, id: &str) -> Result<()> {
        self.delete(&format!("/v1/projects/{}", id)).await
    }

    async fn project_list(&self, params: &ListParams) -> Result<ResultsPage<Project>> {
        self.get_list("/v1/projects", params, None).await
    }

    async fn organization_create(&self, body: &OrganizationCreate) -> Result<Organization> {
        self.post("/v1/organizations", body, None).await
    }

    async fn organization_view(&self, id: &str) -> Result<Organization> {
        self.get(&format!("/v1/organizations/{}", id)).await
    }

    async fn organization_update(
        &self,
        id: &str,
        body: &OrganizationUpdate,
    ) -> Result<Organization> {
        self.put(&format!("/v1/organizations/{}", id), body).await
    }

    async fn organization_delete(&self, id: &str) -> Result<()> {
        self.delete(&format!("/v1/organizations/{}", id)).await
    }

    async fn organization_list(&self, params: &ListParams) -> Result<ResultsPage<Organization>> {
        self.get_list("/v1/organizations", params, None).await
    }

    async fn ip_pool_create(&self, body: &IpPoolCreate) -> Result<IpPool> {
        self.post("/v1/system/ip-pools", body, None).await
    }

    async fn ip_pool_view(&self, id: &str) -> Result<IpPool> {
        self.get(&format!("/v1/system/ip-pools/{}", id)).await
    }

    async fn ip_pool_update(&self, id: &str, body: &IpPoolUpdate) -> Result<IpPool> {
        self.put(&format!("/v1/system/ip-pools/{}", id), body).await
    }

    async fn ip_pool_delete(&self, id: &str) -> Result<()> {
        self.delete(&format!("/v1/system/ip-pools/{}", id)).await
    }

    async fn vpc_create(&self, project: &str, body: &VpcCreate) -> Result<Vpc> {
        self.post("/v1/vpcs", body, Some(("project", project))).await
    }

    async fn vpc_view(&self, id: &str) -> Result<Vpc> {
        self.get(&format!("/v1/vpcs/{}", id)).await
    }

    async fn vpc_update(&self, id: &str, body: &VpcUpdate) -> Result<Vpc> {
        self.put(&format!("/v1/vpcs/{}", id), body).await
    }

    async fn vpc_delete(&self, id: &str) -> Result<()> {
        self.delete(&format!("/v1/vpcs/{}", id)).await
    }

    async fn vpc_subnet_create(&self, vpc: &str, body: &VpcSubnetCreate) -> Result<VpcSubnet> {
        self.post("/v1/vpc-subnets", body, Some(("vpc", vpc))).await
    }

    async fn vpc_subnet_view(&self, id: &str) -> Result<VpcSubnet> {
        self.get(&format!("/v1/vpc-subnets/{}", id)).await
    }

    async fn vpc_subnet_update(&self, id: &str, body: &VpcSubnetUpdate) -> Result<VpcSubnet> {
        self.put(&format!("/v1/vpc-subnets/{}", id), body).await
    }

    async fn vpc_subnet_delete(&self, id: &str) -> Result<()> {
        self.delete(&format!("/v1/vpc-subnets/{}", id)).await
    }

    async fn vpc_subnet_list(
        &self,
        vpc: &str,
        params: &ListParams,
    ) -> Result<ResultsPage<VpcSubnet>> {
        self.get_list("/v1/vpc-subnets", params, Some(("vpc", vpc)))
            .await
    }

    async fn disk_create(&self, project: &str, body: &DiskCreate) -> Result<Disk> {
        self.post("/v1/disks", body, Some(("project", project))).await
    }

    async fn disk_view(&self, id: &str) -> Result<Disk> {
        self.get(&format!("/v1/disks/{}", id)).await
    }

    async fn disk_delete(&self, id: &str) -> Result<()> {
        self.delete(&format!("/v1/disks/{}", id)).await
    }

    async fn snapshot_create(&self, project: &str, body: &SnapshotCreate) -> Result<Snapshot> {
        self.post("/v1/snapshots", body, Some(("project", project)))
            .await
    }

    async fn snapshot_view(&self, id: &str) -> Result<Snapshot> {
        self.get(&format!("/v1/snapshots/{}", id)).await
    }

    async fn snapshot_delete(&self, id: &str) -> Result<()> {
        self.delete(&format!("/v1/snapshots/{}", id)).await
    }

    async fn image_create(&self, project: &str, body: &ImageCreate) -> Result<Image> {
        self.post("/v1/images", body, Some(("project", project))).await
    }

    async fn image_view(&self, id: &str) -> Result<Image> {
        self.get(&format!("/v1/images/{}", id)).await
    }

    async fn image_list(&self, project: &str, params: &ListParams) -> Result<ResultsPage<Image>> {
        self.get_list("/v1/images", params, Some(("project", project)))
            .await
    }

    async fn global_image_list(&self, params: &ListParams) -> Result<ResultsPage<Image>> {
        self.get_list("/v1/images", params, None).await
    }

    async fn image_promote(&self, id: &str) -> Result<Image> {
        self.post(&format!("/v1/images/{}/promote", id), &serde_json::json!({}), None)
            .await
    }

    async fn image_demote(&self, id: &str, project: &str) -> Result<Image> {
        self.post(
            &format!("/v1/images/{}/demote", id),
            &serde_json::json!({}),
            Some(("project", project)),
        )
        .await
    }

    async fn instance_create(&self, project: &str, body: &InstanceCreate) -> Result<Instance> {
        self.post("/v1/instances", body, Some(("project", project)))
            .await
    }

    async fn instance_view(&self, id: &str) -> Result<Instance> {
        self.get(&format!("/v1/instances/{}", id)).await
    }

    async fn instance_delete(&self, id: &str) -> Result<()> {
        self.delete(&format!("/v1/instances/{}", id)).await
    }

    async fn instance_start(&self, id: &str) -> Result<Instance> {
        self.post(&format!("/v1/instances/{}/start", id), &serde_json::json!({}), None)
            .await
    }

    async fn instance_stop(&self, id: &str) -> Result<Instance> {
        self.post(&format!("/v1/instances/{}/stop", id), &serde_json::json!({}), None)
            .await
    }

    async fn instance_external_ip_list(&self, instance: &str) -> Result<ResultsPage<ExternalIp>> {
        self.get(&format!("/v1/instances/{}/external-ips", instance))
            .await
    }

    async fn instance_disk_attach(&self, instance: &str, disk: &str) -> Result<Disk> {
        self.post(
            &format!("/v1/instances/{}/disks/attach", instance),
            &serde_json::json!({ "disk": disk }),
            None,
        )
        .await
    }

    async fn instance_disk_detach(&self, instance: &str, disk: &str) -> Result<Disk> {
        self.post(
            &format!("/v1/instances/{}/disks/detach", instance),
            &serde_json::json!({ "disk": disk }),
            None,
        )
        .await
    }

    async fn instance_nic_create(
        &self,
        instance: &str,
        body: &NetworkInterfaceCreate,
    ) -> Result<NetworkInterface> {
        self.post("/v1/network-interfaces", body, Some(("instance", instance)))
            .await
    }

    async fn instance_nic_view(&self, id: &str) -> Result<NetworkInterface> {
        self.get(&format!("/v1/network-interfaces/{}", id)).await
    }

    async fn instance_nic_update(
        &self,
        id: &str,
        body: &NetworkInterfaceUpdate,
    ) -> Result<NetworkInterface> {
        self.put(&format!("/v1/network-interfaces/{}", id), body).await
    }

    async fn instance_nic_delete(&self, id: &str) -> Result<()> {
        self.delete(&format!("/v1/network-interfaces/{}", id)).await
    }

    async fn instance_nic_list(
        &self,
        instance: &str,
        params: &ListParams,
    ) -> Result<ResultsPage<NetworkInterface>> {
        self.get_list("/v1/network-interfaces", params, Some(("instance", instance)))
            .await
    }
}
