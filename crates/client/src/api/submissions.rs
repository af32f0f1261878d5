use std::collections::BTreeMap;

use esm_core::validation::validate_values;
use esm_core::{
    EmployeeAction, FieldId, FormTemplate, Page, PageQuery, Submission, SubmissionAck,
    SubmissionId, SubmissionPayload, SubmissionSummary, TemplateId,
};
use serde_json::Value;

use super::EMPLOYEE_HEADER;
use crate::error::ApiError;
use crate::http::{ApiRequest, SessionClient};

pub struct SubmissionsApi<'a> {
    client: &'a SessionClient,
}

impl<'a> SubmissionsApi<'a> {
    pub(crate) fn new(client: &'a SessionClient) -> Self {
        Self { client }
    }

    /// Saves a new draft. Drafts are not validated locally.
    pub async fn save_draft(
        &self,
        template_id: TemplateId,
        values: BTreeMap<FieldId, Value>,
    ) -> Result<Submission, ApiError> {
        let payload = SubmissionPayload { id: None, template_id, values };
        let request = self.employee_request(ApiRequest::post("/submissions/draft")).await?;
        self.client.send_json(request.json(&payload)?).await
    }

    pub async fn update_draft(
        &self,
        draft: &Submission,
        values: BTreeMap<FieldId, Value>,
    ) -> Result<Submission, ApiError> {
        draft.ensure_draft_editable()?;
        let payload = SubmissionPayload { id: Some(draft.id), template_id: draft.template_id, values };
        let request = ApiRequest::put(format!("/submissions/draft/{}", draft.id));
        let request = self.employee_request(request).await?;
        self.client.send_json(request.json(&payload)?).await
    }

    /// Submits a fresh form straight into the workflow.
    pub async fn submit(
        &self,
        template: &FormTemplate,
        values: BTreeMap<FieldId, Value>,
    ) -> Result<SubmissionAck, ApiError> {
        let template_id = template.id.ok_or_else(|| {
            ApiError::Decode("template has no id; fetch it from the server first".to_string())
        })?;
        validate_values(template, &values)?;
        let payload = SubmissionPayload { id: None, template_id, values };
        let request = self.employee_request(ApiRequest::post("/submissions/submit")).await?;
        self.client.send_json(request.json(&payload)?).await
    }

    pub async fn submit_draft(
        &self,
        draft: &Submission,
        template: &FormTemplate,
        values: BTreeMap<FieldId, Value>,
    ) -> Result<SubmissionAck, ApiError> {
        draft.ensure_offered(EmployeeAction::Submit)?;
        self.put_submit(draft, template, values).await
    }

    /// Sends a rejected submission back into the workflow.
    pub async fn resubmit(
        &self,
        rejected: &Submission,
        template: &FormTemplate,
        values: BTreeMap<FieldId, Value>,
    ) -> Result<SubmissionAck, ApiError> {
        rejected.ensure_resubmittable()?;
        self.put_submit(rejected, template, values).await
    }

    pub async fn drafts(&self, query: &PageQuery) -> Result<Page<SubmissionSummary>, ApiError> {
        let request = ApiRequest::get("/submissions/me/drafts").query_pairs(query.to_pairs());
        self.client.send_json(self.employee_request(request).await?).await
    }

    pub async fn submitted(&self, query: &PageQuery) -> Result<Page<SubmissionSummary>, ApiError> {
        let request = ApiRequest::get("/submissions/me/submitted").query_pairs(query.to_pairs());
        self.client.send_json(self.employee_request(request).await?).await
    }

    pub async fn get(&self, id: SubmissionId) -> Result<Submission, ApiError> {
        self.client.send_json(ApiRequest::get(format!("/submissions/{id}"))).await
    }

    pub async fn delete(&self, draft: &Submission) -> Result<(), ApiError> {
        draft.ensure_offered(EmployeeAction::Delete)?;
        let request = ApiRequest::delete(format!("/submissions/{}", draft.id));
        self.client.send(self.employee_request(request).await?).await?;
        Ok(())
    }

    async fn put_submit(
        &self,
        submission: &Submission,
        template: &FormTemplate,
        values: BTreeMap<FieldId, Value>,
    ) -> Result<SubmissionAck, ApiError> {
        validate_values(template, &values)?;
        let payload = SubmissionPayload {
            id: Some(submission.id),
            template_id: submission.template_id,
            values,
        };
        let request = ApiRequest::put(format!("/submissions/submit/{}", submission.id));
        let request = self.employee_request(request).await?;
        self.client.send_json(request.json(&payload)?).await
    }

    async fn employee_request(&self, request: ApiRequest) -> Result<ApiRequest, ApiError> {
        let user = self.client.session().require_user().await?;
        Ok(request.header(EMPLOYEE_HEADER, user.id))
    }
}
