//! Parsing of operator-supplied inputs: `FIELD_ID=VALUE` pairs and template draft files.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use anyhow::{bail, Context, Result};
use esm_core::{ComponentType, FieldId, FormTemplate, TemplateDraft};
use serde_json::{Number, Value};

/// Parses `FIELD_ID=VALUE` pairs, typing NUMBER fields as JSON numbers.
pub fn parse_assignments(raw: &[String], template: &FormTemplate) -> Result<BTreeMap<FieldId, Value>> {
    let mut values = BTreeMap::new();

    for pair in raw {
        let Some((id, value)) = pair.split_once('=') else {
            bail!("`{pair}` is not in FIELD_ID=VALUE form");
        };
        let id = id
            .trim()
            .parse::<i64>()
            .with_context(|| format!("field id `{}` is not an integer", id.trim()))?;
        let field_id = FieldId(id);
        let component = template.field(field_id).map(|field| field.component_type);

        values.insert(field_id, typed_value(component, value));
    }

    Ok(values)
}

fn typed_value(component: Option<ComponentType>, raw: &str) -> Value {
    if component == Some(ComponentType::Number) {
        let trimmed = raw.trim();
        if let Ok(integer) = trimmed.parse::<i64>() {
            return Value::Number(integer.into());
        }
        if let Some(number) = trimmed.parse::<f64>().ok().and_then(Number::from_f64) {
            return Value::Number(number);
        }
    }
    Value::String(raw.to_string())
}

/// Reads a template draft from a `.toml` or `.json` file.
pub fn read_template_draft(path: &Path) -> Result<TemplateDraft> {
    let raw = fs::read_to_string(path)
        .with_context(|| format!("could not read template draft `{}`", path.display()))?;

    let is_toml = path.extension().and_then(|extension| extension.to_str()) == Some("toml");
    if is_toml {
        return toml::from_str(&raw)
            .with_context(|| format!("template draft `{}` is not valid TOML", path.display()));
    }
    serde_json::from_str(&raw)
        .with_context(|| format!("template draft `{}` is not valid JSON", path.display()))
}

#[cfg(test)]
mod tests {
    use std::fs;

    use esm_core::{ComponentType, FieldId, FormField, FormTemplate, UserId};
    use serde_json::json;
    use tempfile::TempDir;

    use super::{parse_assignments, read_template_draft};

    fn template() -> FormTemplate {
        FormTemplate {
            id: None,
            title: "Leave".to_string(),
            description: String::new(),
            active: true,
            created_at: None,
            fields: vec![
                FormField {
                    id: Some(FieldId(1)),
                    label: "Days".to_string(),
                    component_type: ComponentType::Number,
                    required: true,
                    display_order: 1,
                },
                FormField {
                    id: Some(FieldId(2)),
                    label: "Reason".to_string(),
                    component_type: ComponentType::TextShort,
                    required: false,
                    display_order: 2,
                },
            ],
            workflow_steps: Vec::new(),
            workflow: None,
        }
    }

    #[test]
    fn numbers_are_typed_and_text_stays_text() {
        let raw = vec!["1=3".to_string(), "2=42".to_string()];
        let values = parse_assignments(&raw, &template()).expect("values");

        assert_eq!(values[&FieldId(1)], json!(3));
        assert_eq!(values[&FieldId(2)], json!("42"));
    }

    #[test]
    fn value_may_contain_equals_sign() {
        let raw = vec!["2=a=b".to_string()];
        let values = parse_assignments(&raw, &template()).expect("values");
        assert_eq!(values[&FieldId(2)], json!("a=b"));
    }

    #[test]
    fn malformed_pairs_are_rejected() {
        assert!(parse_assignments(&["nonsense".to_string()], &template()).is_err());
        assert!(parse_assignments(&["x=1".to_string()], &template()).is_err());
    }

    #[test]
    fn toml_draft_files_are_read() {
        let dir = TempDir::new().expect("tempdir");
        let path = dir.path().join("leave.toml");
        fs::write(
            &path,
            r#"
title = "Leave request"
active = true
approvers = [7, 8]

[[fields]]
label = "Days"
componentType = "NUMBER"
required = true
"#,
        )
        .expect("write");

        let draft = read_template_draft(&path).expect("draft");
        assert_eq!(draft.approvers, vec![Some(UserId(7)), Some(UserId(8))]);
        assert_eq!(draft.fields[0].component_type, ComponentType::Number);
    }
}
