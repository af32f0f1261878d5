use esm_core::{Page, PageQuery, RoleStatusUpdate, User, UserId};
use serde::Deserialize;

use crate::error::ApiError;
use crate::http::{ApiRequest, SessionClient};

/// `/users/managers` answers with either a page or a bare array.
#[derive(Deserialize)]
#[serde(untagged)]
enum UserListing {
    Paged(Page<User>),
    Plain(Vec<User>),
}

pub struct UsersApi<'a> {
    client: &'a SessionClient,
}

impl<'a> UsersApi<'a> {
    pub(crate) fn new(client: &'a SessionClient) -> Self {
        Self { client }
    }

    pub async fn list(&self, query: &PageQuery) -> Result<Page<User>, ApiError> {
        self.client.send_json(ApiRequest::get("/users").query_pairs(query.to_pairs())).await
    }

    pub async fn get(&self, id: UserId) -> Result<User, ApiError> {
        self.client.send_json(ApiRequest::get(format!("/users/{id}"))).await
    }

    pub async fn managers(&self) -> Result<Vec<User>, ApiError> {
        let listing: UserListing = self.client.send_json(ApiRequest::get("/users/managers")).await?;
        Ok(match listing {
            UserListing::Paged(page) => page.content,
            UserListing::Plain(users) => users,
        })
    }

    pub async fn profile(&self) -> Result<User, ApiError> {
        self.client.send_json(ApiRequest::get("/users/profile")).await
    }

    pub async fn set_role_status(
        &self,
        id: UserId,
        update: &RoleStatusUpdate,
    ) -> Result<User, ApiError> {
        let request = ApiRequest::patch(format!("/users/{id}/role-status")).json(update)?;
        self.client.send_json(request).await
    }
}
