use crate::client::VcdClient;
use crate::error::Error;
use crate::models::Role;

impl VcdClient {
    /// List the roles defined in an organization.
    pub async fn list_roles(&self, org: &str) -> Result<Vec<Role>, Error> {
        self.get(&["orgs", org, "roles"]).await
    }
}
