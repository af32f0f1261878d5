//! Local checks run before anything is sent to the backend.

use std::collections::BTreeMap;
use std::fmt;

use chrono::{NaiveDate, NaiveTime};
use serde::Serialize;
use serde_json::Value;
use thiserror::Error;

use crate::domain::approval::{ApprovalAction, ApprovalDecision};
use crate::domain::template::{ComponentType, FieldId, FormTemplate, TemplateDraft};

pub const SHORT_TEXT_LIMIT: usize = 255;
pub const LONG_TEXT_LIMIT: usize = 2000;

const DATE_FORMAT: &str = "%Y-%m-%d";
const TIME_FORMAT: &str = "%H:%M:%S";

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Violation {
    pub field: String,
    pub message: String,
}

#[derive(Clone, Debug, Error, PartialEq, Eq, Serialize)]
pub struct ValidationError {
    pub violations: Vec<Violation>,
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let rendered: Vec<String> = self
            .violations
            .iter()
            .map(|violation| format!("{}: {}", violation.field, violation.message))
            .collect();
        write!(f, "validation failed: {}", rendered.join("; "))
    }
}

#[derive(Default)]
struct Collector {
    violations: Vec<Violation>,
}

impl Collector {
    fn push(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.violations.push(Violation { field: field.into(), message: message.into() });
    }

    fn finish(self) -> Result<(), ValidationError> {
        if self.violations.is_empty() {
            return Ok(());
        }
        Err(ValidationError { violations: self.violations })
    }
}

pub fn validate_template_draft(draft: &TemplateDraft) -> Result<(), ValidationError> {
    let mut collector = Collector::default();

    if draft.title.trim().is_empty() {
        collector.push("title", "form title is required");
    }
    if draft.fields.is_empty() {
        collector.push("fields", "at least one form field is required");
    }
    for (index, field) in draft.fields.iter().enumerate() {
        if field.label.trim().is_empty() {
            collector.push(format!("fields[{index}].label"), "label is required");
        }
        if field.component_type == ComponentType::Unknown {
            collector.push(format!("fields[{index}].componentType"), "component type is required");
        }
    }
    if draft.approvers.is_empty() {
        collector.push("workflowSteps", "at least one workflow (approval) step is required");
    }
    for (index, approver) in draft.approvers.iter().enumerate() {
        if approver.is_none() {
            collector.push(
                format!("workflowSteps[{index}].managerId"),
                format!("step {} has no manager assigned", index + 1),
            );
        }
    }

    collector.finish()
}

/// Checks values against the template before a submit or resubmit.
pub fn validate_values(
    template: &FormTemplate,
    values: &BTreeMap<FieldId, Value>,
) -> Result<(), ValidationError> {
    let mut collector = Collector::default();

    for field_id in values.keys() {
        if template.field(*field_id).is_none() {
            collector.push(format!("values[{field_id}]"), "field is not part of this template");
        }
    }

    for field in &template.fields {
        let Some(id) = field.id else {
            continue;
        };
        let value = values.get(&id).filter(|value| !is_blank(value));
        let Some(value) = value else {
            if field.required {
                collector.push(field.label.as_str(), "this field is required");
            }
            continue;
        };

        if let Err(message) = check_component(field.component_type, value) {
            collector.push(field.label.as_str(), message);
        }
    }

    collector.finish()
}

pub fn validate_decision(decision: &ApprovalDecision) -> Result<(), ValidationError> {
    let mut collector = Collector::default();
    let has_comment =
        decision.comment.as_deref().map(|comment| !comment.trim().is_empty()).unwrap_or(false);
    if decision.action == ApprovalAction::Reject && !has_comment {
        collector.push("comment", "a reason is required when rejecting");
    }
    collector.finish()
}

fn is_blank(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(text) => text.trim().is_empty(),
        _ => false,
    }
}

fn check_component(component: ComponentType, value: &Value) -> Result<(), String> {
    match component {
        ComponentType::TextShort => check_text(value, SHORT_TEXT_LIMIT),
        ComponentType::TextArea => check_text(value, LONG_TEXT_LIMIT),
        ComponentType::Number => match value {
            Value::Number(_) => Ok(()),
            Value::String(text)
                if text.trim().parse::<f64>().is_ok_and(|number| number.is_finite()) =>
            {
                Ok(())
            }
            _ => Err("must be a number".to_string()),
        },
        ComponentType::DatePicker => match value {
            Value::String(text) if NaiveDate::parse_from_str(text.trim(), DATE_FORMAT).is_ok() => {
                Ok(())
            }
            _ => Err("must be a date formatted YYYY-MM-DD".to_string()),
        },
        ComponentType::TimePicker => match value {
            Value::String(text) if NaiveTime::parse_from_str(text.trim(), TIME_FORMAT).is_ok() => {
                Ok(())
            }
            _ => Err("must be a time formatted HH:mm:ss".to_string()),
        },
        ComponentType::Unknown => Ok(()),
    }
}

fn check_text(value: &Value, limit: usize) -> Result<(), String> {
    match value {
        Value::String(text) if text.chars().count() <= limit => Ok(()),
        Value::String(_) => Err(format!("must be at most {limit} characters")),
        _ => Err("must be text".to_string()),
    }
}
