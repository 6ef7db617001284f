pub mod images;
pub mod instance_external_ips;
pub mod organizations;
pub mod projects;

pub use images::{GlobalImagesDataSource, ImageDataSource, ImagesDataSource};
pub use instance_external_ips::InstanceExternalIpsDataSource;
pub use organizations::OrganizationsDataSource;
pub use projects::{ProjectDataSource, ProjectsDataSource};
