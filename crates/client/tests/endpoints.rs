use std::collections::BTreeMap;
use std::sync::Arc;

use esm_client::{ApiError, InMemorySessionStore, LoginRedirect, SessionClient, SessionContext};
use esm_core::config::ApiConfig;
use esm_core::{
    ApprovalAction, ApprovalDecision, ComponentType, Credentials, DomainError, ErrorClass,
    FieldDraft, FieldId, HistoryEntryId, PageQuery, Role, SessionUser, StepStatus, SubmissionId,
    SubmissionStatus, TemplateDraft, TemplateId, UserId,
};
use serde_json::{json, Value};
use wiremock::matchers::{body_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

async fn client_as(server: &MockServer, user: SessionUser) -> SessionClient {
    let store = Arc::new(InMemorySessionStore::with_session(
        Some(Credentials::new("a1", "r1")),
        Some(user),
    ));
    let session =
        SessionContext::hydrate(store, Arc::new(LoginRedirect)).await.expect("hydrate session");
    let config = ApiConfig { base_url: format!("{}/api", server.uri()), timeout_secs: 5 };
    SessionClient::new(&config, Arc::new(session)).expect("build client")
}

fn employee() -> SessionUser {
    SessionUser { id: UserId(42), username: "jdoe".to_string(), role: Role::Employee }
}

fn admin() -> SessionUser {
    SessionUser { id: UserId(1), username: "root".to_string(), role: Role::Admin }
}

fn leave_draft() -> TemplateDraft {
    TemplateDraft {
        title: " Leave request ".to_string(),
        description: "Annual leave".to_string(),
        active: true,
        fields: vec![
            FieldDraft {
                label: "From".to_string(),
                component_type: ComponentType::DatePicker,
                required: true,
            },
            FieldDraft {
                label: "Reason".to_string(),
                component_type: ComponentType::TextArea,
                required: false,
            },
        ],
        approvers: vec![Some(UserId(7)), Some(UserId(8))],
    }
}

fn leave_template_body() -> Value {
    json!({
        "title": "Leave request",
        "description": "Annual leave",
        "active": true,
        "fields": [
            {"label": "From", "componentType": "DATE_PICKER", "required": true, "displayOrder": 1},
            {"label": "Reason", "componentType": "TEXT_AREA", "required": false, "displayOrder": 2}
        ],
        "workflowSteps": [
            {"managerId": 7, "stepOrder": 1},
            {"managerId": 8, "stepOrder": 2}
        ]
    })
}

fn manager() -> SessionUser {
    SessionUser { id: UserId(7), username: "mgr".to_string(), role: Role::Manager }
}

fn empty_page() -> Value {
    json!({"content": [], "totalElements": 0, "totalPages": 0, "size": 10, "number": 0,
           "first": true, "last": true, "empty": true})
}

fn expense_template() -> Value {
    json!({
        "id": 1,
        "title": "Expense claim",
        "description": "Travel and meals",
        "active": true,
        "createdAt": "2024-03-01T09:00:00",
        "fields": [
            {"id": 6, "label": "Amount", "componentType": "NUMBER", "required": true, "displayOrder": 2},
            {"id": 5, "label": "Purpose", "componentType": "TEXT_SHORT", "required": true, "displayOrder": 1}
        ],
        "workflow": [
            {"id": 11, "managerId": 8, "managerName": "Lead", "stepOrder": 2},
            {"id": 10, "managerId": 7, "managerName": "Mgr", "stepOrder": 1}
        ]
    })
}

fn three_step_submission(status: &str) -> Value {
    json!({
        "id": 90,
        "templateId": 1,
        "templateTitle": "Expense claim",
        "employeeId": 42,
        "employeeName": "Jane Doe",
        "submissionValues": [
            {"fieldId": 5, "label": "Purpose", "componentType": "TEXT_SHORT", "value": "Conference (edited)"}
        ],
        "workflowSteps": [
            {"stepOrder": 1, "managerId": 7},
            {"stepOrder": 2, "managerId": 8},
            {"stepOrder": 3, "managerId": 9}
        ],
        "status": status,
        "currentStep": 2,
        "createdAt": "2024-03-02T10:00:00Z",
        "fullHistory": [
            {"id": 1, "atStep": 1, "action": "APPROVE", "actedAt": "2024-03-03T08:00:00",
             "historicalValues": [{"fieldId": 5, "label": "Purpose", "componentType": "TEXT_SHORT", "value": "Conference"}]},
            {"id": 2, "atStep": 2, "action": "REJECT", "comment": "missing receipt", "actedAt": "2024-03-04T08:00:00"}
        ]
    })
}

#[tokio::test]
async fn template_detail_folds_workflow_alias_and_orders_entries() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/admin/form-templates/1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(expense_template()))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_as(&server, employee()).await;
    let template = client.templates().get(TemplateId(1)).await.expect("template");

    let steps: Vec<u32> = template.workflow_steps.iter().map(|step| step.step_order).collect();
    assert_eq!(steps, vec![1, 2]);
    assert_eq!(template.fields[0].label, "Purpose");
    assert_eq!(template.fields[1].component_type, ComponentType::Number);
}

#[tokio::test]
async fn admin_template_listing_sends_paging_parameters() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/admin/form-templates"))
        .and(query_param("page", "2"))
        .and(query_param("size", "5"))
        .and(query_param("search", "expense"))
        .respond_with(ResponseTemplate::new(200).set_body_json(empty_page()))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_as(&server, employee()).await;
    let query =
        PageQuery { page: 2, size: 5, search: Some("expense".to_string()), sort: None };
    let page = client.templates().list_admin(&query).await.expect("page");

    assert!(page.empty);
}

#[tokio::test]
async fn draft_save_carries_employee_header_and_values() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/submissions/draft"))
        .and(header("X-Employee-Id", "42"))
        .and(body_json(json!({"templateId": 1, "values": {"5": "Conference"}})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": 90, "templateId": 1, "employeeId": 42, "status": "DRAFT", "currentStep": 0
        })))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_as(&server, employee()).await;
    let values = BTreeMap::from([(FieldId(5), json!("Conference"))]);
    let draft = client.submissions().save_draft(TemplateId(1), values).await.expect("draft");

    assert_eq!(draft.status, SubmissionStatus::Draft);
    assert!(draft.can_edit_draft());
}

#[tokio::test]
async fn invalid_submit_is_rejected_before_any_request() {
    let server = MockServer::start().await;
    let client = client_as(&server, employee()).await;

    let template = serde_json::from_value::<esm_core::FormTemplate>(expense_template())
        .expect("template")
        .normalize();
    let values = BTreeMap::from([(FieldId(6), json!("not a number"))]);
    let error = client.submissions().submit(&template, values).await.expect_err("invalid");

    assert_eq!(error.class(), ErrorClass::Validation);
    let requests = server.received_requests().await.expect("recording enabled");
    assert!(requests.is_empty());
}

#[tokio::test]
async fn resubmission_is_only_attempted_for_rejected_submissions() {
    let server = MockServer::start().await;
    Mock::given(method("PUT"))
        .and(path("/api/submissions/submit/90"))
        .and(header("X-Employee-Id", "42"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({"id": 90, "status": "PENDING"})),
        )
        .expect(1)
        .mount(&server)
        .await;

    let client = client_as(&server, employee()).await;
    let template = serde_json::from_value::<esm_core::FormTemplate>(expense_template())
        .expect("template")
        .normalize();
    let values =
        BTreeMap::from([(FieldId(5), json!("Conference")), (FieldId(6), json!(120.5))]);

    let pending: esm_core::Submission =
        serde_json::from_value(three_step_submission("PENDING")).expect("submission");
    let error = client
        .submissions()
        .resubmit(&pending, &template, values.clone())
        .await
        .expect_err("not offered");
    assert!(matches!(error, ApiError::Domain(DomainError::ActionNotOffered { .. })));

    let rejected: esm_core::Submission =
        serde_json::from_value(three_step_submission("REJECTED")).expect("submission");
    let ack = client.submissions().resubmit(&rejected, &template, values).await.expect("ack");
    assert_eq!(ack.id, SubmissionId(90));
    assert_eq!(ack.status, Some(SubmissionStatus::Pending));
}

#[tokio::test]
async fn fetched_submission_projects_live_and_archived_views() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/approvals/submissions/90"))
        .and(header("X-Manager-Id", "7"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(three_step_submission("REJECTED")),
        )
        .expect(1)
        .mount(&server)
        .await;

    let client = client_as(&server, manager()).await;
    let submission = client.approvals().detail(SubmissionId(90)).await.expect("detail");

    let live = submission.project(None).expect("live");
    assert_eq!(live.display_status, SubmissionStatus::Rejected);
    assert_eq!(live.steps[1].status, StepStatus::Rejected);
    assert_eq!(live.steps[1].comment.as_deref(), Some("missing receipt"));

    let archived = submission.project(Some(HistoryEntryId(1))).expect("archived");
    assert_eq!(archived.display_status, SubmissionStatus::Approved);
    let statuses: Vec<StepStatus> = archived.steps.iter().map(|step| step.status).collect();
    assert_eq!(statuses, vec![StepStatus::Approved, StepStatus::Pending, StepStatus::Pending]);
    let shown = submission.displayed_values(&archived);
    assert_eq!(shown[0].value, json!("Conference"));
}

#[tokio::test]
async fn reject_without_comment_never_reaches_the_server() {
    let server = MockServer::start().await;
    let client = client_as(&server, manager()).await;

    let decision = ApprovalDecision { action: ApprovalAction::Reject, comment: None };
    let error = client.approvals().decide(SubmissionId(90), &decision).await.expect_err("invalid");

    assert_eq!(error.class(), ErrorClass::Validation);
    assert!(server.received_requests().await.expect("recording enabled").is_empty());
}

#[tokio::test]
async fn approval_decision_posts_action_with_manager_header() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/approvals/submissions/90"))
        .and(header("X-Manager-Id", "7"))
        .and(body_json(json!({"action": "APPROVE"})))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/approvals/pending"))
        .and(header("X-Manager-Id", "7"))
        .and(query_param("page", "0"))
        .and(query_param("size", "10"))
        .respond_with(ResponseTemplate::new(200).set_body_json(empty_page()))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_as(&server, manager()).await;
    let decision = ApprovalDecision { action: ApprovalAction::Approve, comment: None };
    let body = client.approvals().decide(SubmissionId(90), &decision).await.expect("decided");
    assert_eq!(body, Value::Null);

    let pending = client.approvals().pending(&PageQuery::default()).await.expect("pending");
    assert!(pending.content.is_empty());
}

#[tokio::test]
async fn managers_accepts_page_or_plain_array() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/users/managers"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {"id": 7, "username": "mgr", "fullName": "Maria Gomez", "role": "MANAGER", "status": "ACTIVE"}
        ])))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_as(&server, employee()).await;
    let managers = client.users().managers().await.expect("managers");

    assert_eq!(managers.len(), 1);
    assert_eq!(managers[0].role, Role::Manager);
}

#[tokio::test]
async fn server_error_messages_are_carried_through() {
    let server = MockServer::start().await;
    Mock::given(method("DELETE"))
        .and(path("/api/admin/form-templates/1"))
        .respond_with(
            ResponseTemplate::new(409)
                .set_body_json(json!({"message": "template has submissions"})),
        )
        .expect(1)
        .mount(&server)
        .await;

    let client = client_as(&server, employee()).await;
    let error = client.templates().delete(TemplateId(1)).await.expect_err("conflict");

    assert!(matches!(error, ApiError::Conflict { ref message } if message == "template has submissions"));
}

#[tokio::test]
async fn employee_calls_require_a_signed_in_user() {
    let server = MockServer::start().await;
    let store = Arc::new(InMemorySessionStore::default());
    let session = SessionContext::hydrate(store, Arc::new(LoginRedirect)).await.expect("hydrate");
    let config = ApiConfig { base_url: format!("{}/api", server.uri()), timeout_secs: 5 };
    let client = SessionClient::new(&config, Arc::new(session)).expect("client");

    let error = client.submissions().drafts(&PageQuery::default()).await.expect_err("no user");

    assert_eq!(error.class(), ErrorClass::Unauthorized);
    assert!(server.received_requests().await.expect("recording enabled").is_empty());
}

#[tokio::test]
async fn template_create_posts_ordered_fields_and_steps() {
    let server = MockServer::start().await;
    let mut created = leave_template_body();
    created["id"] = json!(12);
    Mock::given(method("POST"))
        .and(path("/api/admin/form-templates"))
        .and(body_json(leave_template_body()))
        .respond_with(ResponseTemplate::new(201).set_body_json(created))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_as(&server, admin()).await;
    let template = client.templates().create(&leave_draft()).await.expect("create");

    assert_eq!(template.id, Some(TemplateId(12)));
    assert_eq!(template.workflow_steps.len(), 2);
}

#[tokio::test]
async fn template_update_puts_body_with_template_id() {
    let server = MockServer::start().await;
    let mut expected = leave_template_body();
    expected["id"] = json!(12);
    Mock::given(method("PUT"))
        .and(path("/api/admin/form-templates/12"))
        .and(body_json(expected.clone()))
        .respond_with(ResponseTemplate::new(200).set_body_json(expected))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_as(&server, admin()).await;
    let draft = leave_draft();
    let template = client.templates().update(TemplateId(12), &draft).await.expect("update");

    assert_eq!(template.id, Some(TemplateId(12)));
    assert_eq!(template.title, "Leave request");
}

#[tokio::test]
async fn template_without_manager_is_rejected_before_any_request() {
    let server = MockServer::start().await;
    let client = client_as(&server, admin()).await;
    let mut draft = leave_draft();
    draft.approvers.push(None);

    let error = client.templates().create(&draft).await.expect_err("unassigned step");

    assert_eq!(error.class(), ErrorClass::Validation);
    let requests = server.received_requests().await.expect("recording enabled");
    assert!(requests.is_empty());
}
