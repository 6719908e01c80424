//! FQDN templates in the Go template style used by DNS controllers, e.g.
//! `{{.Name}}.{{.Namespace}}.example.com`.
//!
//! Only field actions are supported. Fields are looked up on the JSON form of a resource; keys
//! match case-insensitively and top-level fields fall back to `metadata`, so `.Name` resolves to
//! `metadata.name`.

use serde::Serialize;
use serde_json::Value;
use thiserror::Error;

use crate::annotations::split_hostnames;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("failed to parse FQDN template `{template}`: {reason}")]
pub struct TemplateError {
    pub template: String,
    pub reason: String,
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("failed to apply template on {resource}: {reason}")]
pub struct RenderError {
    pub resource: String,
    pub reason: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Text(String),
    Field(Vec<String>),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FqdnTemplate {
    segments: Vec<Segment>,
}

impl FqdnTemplate {
    /// Parses a template, a blank string means no template is configured
    pub fn parse(template: &str) -> Result<Option<FqdnTemplate>, TemplateError> {
        if template.trim().is_empty() {
            return Ok(None);
        }
        let fail = |reason: String| TemplateError {
            template: template.to_string(),
            reason,
        };

        let mut segments = vec![];
        let mut rest = template;
        while let Some(open) = rest.find("{{") {
            if open > 0 {
                segments.push(Segment::Text(rest[..open].to_string()));
            }
            let after = &rest[open + 2..];
            let close = after
                .find("}}")
                .ok_or_else(|| fail("unclosed action".to_string()))?;
            let action = after[..close].trim();
            if action.is_empty() {
                return Err(fail("empty action".to_string()));
            }
            let Some(path) = action.strip_prefix('.') else {
                return Err(fail(format!("unsupported action `{action}`")));
            };
            let path = path.split('.').map(str::to_string).collect::<Vec<_>>();
            if path
                .iter()
                .any(|p| p.is_empty() || !p.chars().all(|c| c.is_alphanumeric() || c == '_'))
            {
                return Err(fail(format!("invalid field path `{action}`")));
            }
            segments.push(Segment::Field(path));
            rest = &after[close + 2..];
        }
        if rest.contains("}}") {
            return Err(fail("unexpected `}}`".to_string()));
        }
        if !rest.is_empty() {
            segments.push(Segment::Text(rest.to_string()));
        }
        Ok(Some(FqdnTemplate { segments }))
    }

    pub fn render<T: Serialize>(&self, object: &T, resource: &str) -> Result<String, RenderError> {
        let fail = |reason: String| RenderError {
            resource: resource.to_string(),
            reason,
        };
        let value = serde_json::to_value(object).map_err(|e| fail(e.to_string()))?;
        let mut out = String::new();
        for segment in &self.segments {
            match segment {
                Segment::Text(text) => out.push_str(text),
                Segment::Field(path) => {
                    let field = lookup(&value, path).ok_or_else(|| {
                        fail(format!("can't evaluate field `.{}`", path.join(".")))
                    })?;
                    match field {
                        Value::Null => {}
                        Value::String(s) => out.push_str(s),
                        Value::Bool(b) => out.push_str(&b.to_string()),
                        Value::Number(n) => out.push_str(&n.to_string()),
                        Value::Array(_) | Value::Object(_) => {
                            return Err(fail(format!(
                                "field `.{}` is not a scalar value",
                                path.join(".")
                            )));
                        }
                    }
                }
            }
        }
        Ok(out)
    }

    /// Renders the template and splits the result into a hostname list
    pub fn hostnames<T: Serialize>(
        &self,
        object: &T,
        resource: &str,
    ) -> Result<Vec<String>, RenderError> {
        Ok(split_hostnames(&self.render(object, resource)?))
    }
}

fn lookup<'a>(root: &'a Value, path: &[String]) -> Option<&'a Value> {
    let (first, rest) = path.split_first()?;
    let start = field(root, first).or_else(|| field(root.get("metadata")?, first))?;
    rest.iter().try_fold(start, |value, key| field(value, key))
}

fn field<'a>(value: &'a Value, key: &str) -> Option<&'a Value> {
    let object = value.as_object()?;
    object.get(key).or_else(|| {
        object
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(key))
            .map(|(_, v)| v)
    })
}
