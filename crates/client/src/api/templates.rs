use esm_core::{FormTemplate, Page, PageQuery, TemplateDraft, TemplateId};

use crate::error::ApiError;
use crate::http::{ApiRequest, SessionClient};

pub struct TemplatesApi<'a> {
    client: &'a SessionClient,
}

impl<'a> TemplatesApi<'a> {
    pub(crate) fn new(client: &'a SessionClient) -> Self {
        Self { client }
    }

    /// Active templates an employee can fill in.
    pub async fn list_available(&self, query: &PageQuery) -> Result<Page<FormTemplate>, ApiError> {
        self.list("/form-templates", query).await
    }

    pub async fn list_admin(&self, query: &PageQuery) -> Result<Page<FormTemplate>, ApiError> {
        self.list("/admin/form-templates", query).await
    }

    pub async fn get(&self, id: TemplateId) -> Result<FormTemplate, ApiError> {
        let template: FormTemplate =
            self.client.send_json(ApiRequest::get(format!("/admin/form-templates/{id}"))).await?;
        Ok(template.normalize())
    }

    pub async fn create(&self, draft: &TemplateDraft) -> Result<FormTemplate, ApiError> {
        let body = draft.build()?;
        let request = ApiRequest::post("/admin/form-templates").json(&body)?;
        let created: FormTemplate = self.client.send_json(request).await?;
        Ok(created.normalize())
    }

    pub async fn update(
        &self,
        id: TemplateId,
        draft: &TemplateDraft,
    ) -> Result<FormTemplate, ApiError> {
        let mut body = draft.build()?;
        body.id = Some(id);
        let request = ApiRequest::put(format!("/admin/form-templates/{id}")).json(&body)?;
        let updated: FormTemplate = self.client.send_json(request).await?;
        Ok(updated.normalize())
    }

    pub async fn delete(&self, id: TemplateId) -> Result<(), ApiError> {
        self.client.send(ApiRequest::delete(format!("/admin/form-templates/{id}"))).await?;
        Ok(())
    }

    async fn list(&self, path: &str, query: &PageQuery) -> Result<Page<FormTemplate>, ApiError> {
        let request = ApiRequest::get(path).query_pairs(query.to_pairs());
        let page: Page<FormTemplate> = self.client.send_json(request).await?;
        Ok(page.map(FormTemplate::normalize))
    }
}
