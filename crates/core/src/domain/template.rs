use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::user::UserId;
use crate::validation::{self, ValidationError};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TemplateId(pub i64);

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FieldId(pub i64);

impl fmt::Display for TemplateId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Display for FieldId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ComponentType {
    TextShort,
    TextArea,
    Number,
    DatePicker,
    TimePicker,
    #[serde(other)]
    Unknown,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FormField {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<FieldId>,
    pub label: String,
    pub component_type: ComponentType,
    #[serde(default)]
    pub required: bool,
    pub display_order: u32,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TemplateStep {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    pub manager_id: UserId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub manager_name: Option<String>,
    pub step_order: u32,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FormTemplate {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<TemplateId>,
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub active: bool,
    #[serde(
        default,
        with = "crate::timestamp::option",
        skip_serializing_if = "Option::is_none"
    )]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub fields: Vec<FormField>,
    #[serde(default)]
    pub workflow_steps: Vec<TemplateStep>,
    /// Alternate name some backend endpoints use for `workflowSteps`.
    #[serde(default, skip_serializing)]
    pub workflow: Option<Vec<TemplateStep>>,
}

impl FormTemplate {
    /// Folds the `workflow` alias into `workflow_steps` and orders fields and steps.
    pub fn normalize(mut self) -> Self {
        if let Some(alias) = self.workflow.take() {
            if self.workflow_steps.is_empty() {
                self.workflow_steps = alias;
            }
        }
        self.fields.sort_by_key(|field| field.display_order);
        self.workflow_steps.sort_by_key(|step| step.step_order);
        self
    }

    pub fn field(&self, id: FieldId) -> Option<&FormField> {
        self.fields.iter().find(|field| field.id == Some(id))
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldDraft {
    pub label: String,
    pub component_type: ComponentType,
    #[serde(default)]
    pub required: bool,
}

/// Admin-authored template before ordering and validation.
///
/// `approvers` lists the manager of each step in approval order; an entry of
/// `None` marks a step that has no manager assigned yet.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TemplateDraft {
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub active: bool,
    #[serde(default)]
    pub fields: Vec<FieldDraft>,
    #[serde(default)]
    pub approvers: Vec<Option<UserId>>,
}

impl TemplateDraft {
    pub fn build(&self) -> Result<FormTemplate, ValidationError> {
        validation::validate_template_draft(self)?;

        let fields = self
            .fields
            .iter()
            .enumerate()
            .map(|(index, field)| FormField {
                id: None,
                label: field.label.trim().to_string(),
                component_type: field.component_type,
                required: field.required,
                display_order: index as u32 + 1,
            })
            .collect();
        let workflow_steps = self
            .approvers
            .iter()
            .flatten()
            .enumerate()
            .map(|(index, manager_id)| TemplateStep {
                id: None,
                manager_id: *manager_id,
                manager_name: None,
                step_order: index as u32 + 1,
            })
            .collect();

        Ok(FormTemplate {
            id: None,
            title: self.title.trim().to_string(),
            description: self.description.clone(),
            active: self.active,
            created_at: None,
            fields,
            workflow_steps,
            workflow: None,
        })
    }
}
