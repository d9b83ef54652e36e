// Org VDC network endpoints.

use crate::client::VcdClient;
use crate::error::Error;
use crate::models::{CreateNetworkRequest, OrgNetwork, TaskRecord};

impl VcdClient {
    pub async fn list_networks(&self, vdc: &str) -> Result<Vec<OrgNetwork>, Error> {
        self.get(&["vdcs", vdc, "networks"]).await
    }

    pub async fn create_network(
        &self,
        vdc: &str,
        request: &CreateNetworkRequest,
    ) -> Result<TaskRecord, Error> {
        self.post(&["vdcs", vdc, "networks"], request).await
    }

    pub async fn delete_network(&self, vdc: &str, name: &str) -> Result<TaskRecord, Error> {
        self.delete(&["vdcs", vdc, "networks", name]).await
    }
}
