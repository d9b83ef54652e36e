// vApp endpoints (VDC-scoped). Mutations answer with a task.

use crate::client::VcdClient;
use crate::error::Error;
use crate::models::{CreateVAppRequest, TaskRecord, VApp};

impl VcdClient {
    pub async fn list_vapps(&self, vdc: &str) -> Result<Vec<VApp>, Error> {
        self.get(&["vdcs", vdc, "vapps"]).await
    }

    pub async fn get_vapp(&self, vdc: &str, name: &str) -> Result<VApp, Error> {
        self.get(&["vdcs", vdc, "vapps", name]).await
    }

    /// Instantiate a vApp from a catalog template.
    pub async fn create_vapp(
        &self,
        vdc: &str,
        request: &CreateVAppRequest,
    ) -> Result<TaskRecord, Error> {
        self.post(&["vdcs", vdc, "vapps"], request).await
    }

    pub async fn delete_vapp(&self, vdc: &str, name: &str) -> Result<TaskRecord, Error> {
        self.delete(&["vdcs", vdc, "vapps", name]).await
    }
}
