// Virtual data center endpoints (org-scoped).

use crate::client::VcdClient;
use crate::error::Error;
use crate::models::Vdc;

impl VcdClient {
    /// List the VDCs of an organization.
    pub async fn list_vdcs(&self, org: &str) -> Result<Vec<Vdc>, Error> {
        self.get(&["orgs", org, "vdcs"]).await
    }

    /// Fetch one VDC by name.
    pub async fn get_vdc(&self, org: &str, name: &str) -> Result<Vdc, Error> {
        self.get(&["orgs", org, "vdcs", name]).await
    }
}
