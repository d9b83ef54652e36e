// Container cluster endpoints (container service extension).

use crate::client::VcdClient;
use crate::error::Error;
use crate::models::{Cluster, CreateClusterRequest, TaskRecord};

impl VcdClient {
    pub async fn list_clusters(&self) -> Result<Vec<Cluster>, Error> {
        self.get(&["clusters"]).await
    }

    pub async fn get_cluster(&self, id: &str) -> Result<Cluster, Error> {
        self.get(&["clusters", id]).await
    }

    pub async fn create_cluster(&self, request: &CreateClusterRequest) -> Result<TaskRecord, Error> {
        self.post(&["clusters"], request).await
    }

    pub async fn delete_cluster(&self, id: &str) -> Result<TaskRecord, Error> {
        self.delete(&["clusters", id]).await
    }
}
