//! Kubernetes label-selector syntax, applied to annotation maps.

use std::{collections::BTreeSet, fmt::Display, str::FromStr};

use itertools::Itertools;
use thiserror::Error;

use crate::annotations::Annotations;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("unable to parse annotation filter `{input}`: {reason}")]
pub struct SelectorError {
    pub input: String,
    pub reason: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Operator {
    Exists,
    DoesNotExist,
    Equals(String),
    NotEquals(String),
    In(BTreeSet<String>),
    NotIn(BTreeSet<String>),
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct Requirement {
    key: String,
    op: Operator,
}

impl Requirement {
    fn matches(&self, annotations: &Annotations) -> bool {
        let value = annotations.get(&self.key);
        match &self.op {
            Operator::Exists => value.is_some(),
            Operator::DoesNotExist => value.is_none(),
            Operator::Equals(expected) => value == Some(expected),
            Operator::NotEquals(expected) => value != Some(expected),
            Operator::In(values) => value.is_some_and(|v| values.contains(v)),
            Operator::NotIn(values) => value.is_none_or(|v| !values.contains(v)),
        }
    }
}

/// A parsed annotation filter. The empty selector matches everything.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AnnotationSelector {
    requirements: Vec<Requirement>,
}

impl AnnotationSelector {
    pub fn parse(input: &str) -> Result<AnnotationSelector, SelectorError> {
        let fail = |reason: String| SelectorError {
            input: input.to_string(),
            reason,
        };
        let requirements = split_requirements(input)
            .map_err(&fail)?
            .into_iter()
            .map(|clause| parse_requirement(clause).map_err(&fail))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(AnnotationSelector { requirements })
    }

    pub fn matches(&self, annotations: &Annotations) -> bool {
        self.requirements.iter().all(|r| r.matches(annotations))
    }
}

impl FromStr for AnnotationSelector {
    type Err = SelectorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        AnnotationSelector::parse(s)
    }
}

impl Display for AnnotationSelector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let clauses = self.requirements.iter().map(|r| match &r.op {
            Operator::Exists => r.key.clone(),
            Operator::DoesNotExist => format!("!{}", r.key),
            Operator::Equals(v) => format!("{}={}", r.key, v),
            Operator::NotEquals(v) => format!("{}!={}", r.key, v),
            Operator::In(vs) => format!("{} in ({})", r.key, vs.iter().join(",")),
            Operator::NotIn(vs) => format!("{} notin ({})", r.key, vs.iter().join(",")),
        });
        write!(f, "{}", clauses.format(","))
    }
}

/// Splits on top-level commas, commas inside a value set belong to the set
fn split_requirements(input: &str) -> Result<Vec<&str>, String> {
    let mut clauses = vec![];
    let mut depth = 0usize;
    let mut start = 0;
    for (i, c) in input.char_indices() {
        match c {
            '(' => {
                if depth > 0 {
                    return Err("nested parentheses".to_string());
                }
                depth += 1;
            }
            ')' => {
                depth = depth
                    .checked_sub(1)
                    .ok_or_else(|| "unbalanced `)`".to_string())?;
            }
            ',' if depth == 0 => {
                clauses.push(&input[start..i]);
                start = i + 1;
            }
            _ => {}
        }
    }
    if depth != 0 {
        return Err("missing `)`".to_string());
    }
    clauses.push(&input[start..]);
    if clauses.len() == 1 && clauses[0].trim().is_empty() {
        return Ok(vec![]);
    }
    Ok(clauses)
}

fn parse_requirement(clause: &str) -> Result<Requirement, String> {
    let clause = clause.trim();
    if clause.is_empty() {
        return Err("empty requirement".to_string());
    }
    if let Some(key) = clause.strip_prefix('!') {
        let key = key.trim();
        validate_key(key)?;
        return Ok(Requirement {
            key: key.to_string(),
            op: Operator::DoesNotExist,
        });
    }
    let equality: [(&str, fn(String) -> Operator); 3] = [
        ("!=", Operator::NotEquals),
        ("==", Operator::Equals),
        ("=", Operator::Equals),
    ];
    for (token, build) in equality {
        if let Some((key, value)) = clause.split_once(token) {
            let (key, value) = (key.trim(), value.trim());
            validate_key(key)?;
            validate_value(value)?;
            return Ok(Requirement {
                key: key.to_string(),
                op: build(value.to_string()),
            });
        }
    }
    if let Some(open) = clause.find('(') {
        let head = clause[..open].trim();
        let Some(set) = clause[open + 1..].strip_suffix(')') else {
            return Err(format!("trailing characters after value set in `{clause}`"));
        };
        let (key, op) = head
            .rsplit_once(char::is_whitespace)
            .map(|(key, op)| (key.trim(), op))
            .ok_or_else(|| format!("missing set operator in `{clause}`"))?;
        validate_key(key)?;
        let values = set
            .split(',')
            .map(str::trim)
            .map(|v| validate_value(v).map(|_| v.to_string()))
            .collect::<Result<BTreeSet<_>, _>>()?;
        let op = match op {
            "in" => Operator::In(values),
            "notin" => Operator::NotIn(values),
            other => return Err(format!("unknown set operator `{other}`")),
        };
        return Ok(Requirement {
            key: key.to_string(),
            op,
        });
    }
    validate_key(clause)?;
    Ok(Requirement {
        key: clause.to_string(),
        op: Operator::Exists,
    })
}

fn validate_key(key: &str) -> Result<(), String> {
    let name = match key.split_once('/') {
        Some((prefix, name)) => {
            if prefix.is_empty()
                || prefix.len() > 253
                || !prefix.split('.').all(is_dns_label)
            {
                return Err(format!("invalid key prefix in `{key}`"));
            }
            name
        }
        None => key,
    };
    if name.is_empty() || name.len() > 63 || !is_qualified_name(name) {
        return Err(format!("invalid key `{key}`"));
    }
    Ok(())
}

fn validate_value(value: &str) -> Result<(), String> {
    if value.is_empty() {
        return Ok(());
    }
    if value.len() > 63 || !is_qualified_name(value) {
        return Err(format!("invalid value `{value}`"));
    }
    Ok(())
}

fn is_qualified_name(s: &str) -> bool {
    let alnum = |c: char| c.is_ascii_alphanumeric();
    s.starts_with(alnum)
        && s.ends_with(alnum)
        && s.chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'))
}

fn is_dns_label(s: &str) -> bool {
    let alnum = |c: char| c.is_ascii_lowercase() || c.is_ascii_digit();
    !s.is_empty()
        && s.len() <= 63
        && s.starts_with(alnum)
        && s.ends_with(alnum)
        && s.chars().all(|c| alnum(c) || c == '-')
}
