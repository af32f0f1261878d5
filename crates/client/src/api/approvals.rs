use esm_core::validation::validate_decision;
use esm_core::{
    ApprovalDecision, ApprovalHistoryItem, Page, PageQuery, PendingApproval, Submission,
    SubmissionId,
};
use serde_json::Value;
use tracing::info;

use super::MANAGER_HEADER;
use crate::error::ApiError;
use crate::http::{ApiRequest, SessionClient};

pub struct ApprovalsApi<'a> {
    client: &'a SessionClient,
}

impl<'a> ApprovalsApi<'a> {
    pub(crate) fn new(client: &'a SessionClient) -> Self {
        Self { client }
    }

    pub async fn pending(&self, query: &PageQuery) -> Result<Page<PendingApproval>, ApiError> {
        let request = ApiRequest::get("/approvals/pending").query_pairs(query.to_pairs());
        self.client.send_json(self.manager_request(request).await?).await
    }

    pub async fn history(&self, query: &PageQuery) -> Result<Page<ApprovalHistoryItem>, ApiError> {
        let request = ApiRequest::get("/approvals/history").query_pairs(query.to_pairs());
        self.client.send_json(self.manager_request(request).await?).await
    }

    /// The submission as the reviewing manager sees it, history log included.
    pub async fn detail(&self, submission_id: SubmissionId) -> Result<Submission, ApiError> {
        let request = ApiRequest::get(format!("/approvals/submissions/{submission_id}"));
        self.client.send_json(self.manager_request(request).await?).await
    }

    pub async fn decide(
        &self,
        submission_id: SubmissionId,
        decision: &ApprovalDecision,
    ) -> Result<Value, ApiError> {
        validate_decision(decision)?;
        let request = ApiRequest::post(format!("/approvals/submissions/{submission_id}"));
        let request = self.manager_request(request).await?.json(decision)?;
        let response = self.client.send(request).await?;

        info!(
            event_name = "approval.decided",
            submission_id = submission_id.0,
            action = decision.action.as_str(),
            "approval decision recorded"
        );
        response.json_or_null()
    }

    async fn manager_request(&self, request: ApiRequest) -> Result<ApiRequest, ApiError> {
        let user = self.client.session().require_user().await?;
        Ok(request.header(MANAGER_HEADER, user.id))
    }
}
