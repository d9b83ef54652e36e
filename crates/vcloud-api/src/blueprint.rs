// Blueprint, deployment and workflow-execution endpoints.
//
// Blueprint and deployment CRUD is synchronous; starting or cancelling a
// workflow execution answers with a task like every other mutation.

use crate::client::VcdClient;
use crate::error::Error;
use crate::models::{
    Blueprint, CancelExecutionRequest, CreateDeploymentRequest, Deployment, EventPage, EventQuery,
    ExecuteWorkflowRequest, Execution, TaskRecord, UploadBlueprintRequest,
};

impl VcdClient {
    pub async fn list_blueprints(&self) -> Result<Vec<Blueprint>, Error> {
        self.get(&["blueprints"]).await
    }

    pub async fn get_blueprint(&self, id: &str) -> Result<Blueprint, Error> {
        self.get(&["blueprints", id]).await
    }

    /// Store a parsed blueprint plan under `request.id`.
    pub async fn upload_blueprint(&self, request: &UploadBlueprintRequest) -> Result<Blueprint, Error> {
        self.put(&["blueprints", &request.id], request).await
    }

    pub async fn delete_blueprint(&self, id: &str) -> Result<(), Error> {
        self.delete_unit(&["blueprints", id], &[]).await
    }

    pub async fn list_deployments(&self) -> Result<Vec<Deployment>, Error> {
        self.get(&["deployments"]).await
    }

    pub async fn get_deployment(&self, id: &str) -> Result<Deployment, Error> {
        self.get(&["deployments", id]).await
    }

    pub async fn create_deployment(
        &self,
        id: &str,
        request: &CreateDeploymentRequest,
    ) -> Result<Deployment, Error> {
        self.put(&["deployments", id], request).await
    }

    /// Delete a deployment; `force` removes it even with live nodes.
    pub async fn delete_deployment(&self, id: &str, force: bool) -> Result<(), Error> {
        let query = if force {
            vec![("force_delete", "true".to_owned())]
        } else {
            Vec::new()
        };
        self.delete_unit(&["deployments", id], &query).await
    }

    pub async fn list_executions(&self, deployment: &str) -> Result<Vec<Execution>, Error> {
        self.get(&["deployments", deployment, "executions"]).await
    }

    /// Start `workflow_id` on a deployment.
    pub async fn execute_workflow(&self, request: &ExecuteWorkflowRequest) -> Result<TaskRecord, Error> {
        self.post(&["executions"], request).await
    }

    pub async fn cancel_execution(&self, id: &str, force: bool) -> Result<TaskRecord, Error> {
        self.post(&["executions", id, "cancel"], &CancelExecutionRequest { force })
            .await
    }

    pub async fn list_events(&self, execution: &str, query: EventQuery) -> Result<EventPage, Error> {
        self.get_query(
            &["events"],
            &[
                ("execution_id", execution.to_owned()),
                ("from", query.from.to_string()),
                ("size", query.size.to_string()),
                ("include_logs", query.include_logs.to_string()),
            ],
        )
        .await
    }
}
