//! Declarative field rules and their interpreter.
//!
//! Field names may be dotted paths (`workflow.titolo`) into nested objects.

use std::{fmt, sync::Arc};

use regex::Regex;
use serde::Serialize;
use serde_json::Value;
use validator::ValidateEmail;

use super::sanitize::sanitize;

/// Extra predicate run after the type checks pass
pub type CustomCheck = Arc<dyn Fn(&Value) -> bool + Send + Sync>;

/// JSON type required of every element of an array field
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ItemKind {
    String,
    Number,
    Boolean,
    Object,
    /// Nested arrays; their own elements are not inspected
    Array,
}

impl ItemKind {
    fn of(value: &Value) -> Option<Self> {
        match value {
            Value::String(_) => Some(Self::String),
            Value::Number(_) => Some(Self::Number),
            Value::Bool(_) => Some(Self::Boolean),
            Value::Object(_) => Some(Self::Object),
            Value::Array(_) => Some(Self::Array),
            Value::Null => None,
        }
    }

    const fn label(self) -> &'static str {
        match self {
            Self::String => "stringa",
            Self::Number => "numero",
            Self::Boolean => "booleano",
            Self::Object => "oggetto",
            Self::Array => "array",
        }
    }
}

#[derive(Debug, Clone)]
pub enum FieldKind {
    String {
        min_len: Option<usize>,
        max_len: Option<usize>,
        pattern: Option<Regex>,
    },
    Email,
    Number {
        min: Option<f64>,
        max: Option<f64>,
    },
    Boolean,
    /// Elements must all be `items` when set, otherwise all of one JSON type
    Array {
        items: Option<ItemKind>,
        min_len: Option<usize>,
        max_len: Option<usize>,
    },
    Object,
}

impl FieldKind {
    const fn is_textual(&self) -> bool {
        matches!(self, Self::String { .. } | Self::Email)
    }

    fn check(&self, field: &str, value: &Value) -> Result<(), String> {
        match self {
            Self::String {
                min_len,
                max_len,
                pattern,
            } => {
                let Value::String(raw) = value else {
                    return Err(format!("Il campo {field} deve essere una stringa"));
                };
                let text = sanitize(raw);
                let len = text.chars().count();
                if let Some(min) = min_len
                    && len < *min
                {
                    return Err(format!("Il campo {field} deve contenere almeno {min} caratteri"));
                }
                if let Some(max) = max_len
                    && len > *max
                {
                    return Err(format!(
                        "Il campo {field} può contenere al massimo {max} caratteri"
                    ));
                }
                if let Some(pattern) = pattern
                    && !pattern.is_match(&text)
                {
                    return Err(format!("Il campo {field} ha un formato non valido"));
                }
                Ok(())
            },
            Self::Email => match value {
                Value::String(raw) if sanitize(raw).validate_email() => Ok(()),
                _ => Err(format!("Il campo {field} deve essere un indirizzo email valido")),
            },
            Self::Number { min, max } => {
                let Some(number) = value.as_f64() else {
                    return Err(format!("Il campo {field} deve essere un numero"));
                };
                if let Some(min) = min
                    && number < *min
                {
                    return Err(format!("Il campo {field} deve essere almeno {min}"));
                }
                if let Some(max) = max
                    && number > *max
                {
                    return Err(format!("Il campo {field} non può superare {max}"));
                }
                Ok(())
            },
            Self::Boolean => {
                if value.is_boolean() {
                    Ok(())
                } else {
                    Err(format!("Il campo {field} deve essere un valore booleano"))
                }
            },
            Self::Array {
                items,
                min_len,
                max_len,
            } => {
                let Value::Array(elements) = value else {
                    return Err(format!("Il campo {field} deve essere un array"));
                };
                if let Some(min) = min_len
                    && elements.len() < *min
                {
                    return Err(format!("Il campo {field} deve contenere almeno {min} elementi"));
                }
                if let Some(max) = max_len
                    && elements.len() > *max
                {
                    return Err(format!(
                        "Il campo {field} può contenere al massimo {max} elementi"
                    ));
                }
                check_items(field, elements, *items)
            },
            Self::Object => {
                if value.is_object() {
                    Ok(())
                } else {
                    Err(format!("Il campo {field} deve essere un oggetto"))
                }
            },
        }
    }
}

fn check_items(field: &str, elements: &[Value], items: Option<ItemKind>) -> Result<(), String> {
    let expected = match items {
        Some(kind) => kind,
        None => match elements.first() {
            Some(first) => match ItemKind::of(first) {
                Some(kind) => kind,
                None => {
                    return Err(format!(
                        "Gli elementi del campo {field} devono essere dello stesso tipo"
                    ));
                },
            },
            None => return Ok(()),
        },
    };

    if elements.iter().all(|e| ItemKind::of(e) == Some(expected)) {
        Ok(())
    } else if items.is_some() {
        Err(format!(
            "Gli elementi del campo {field} devono essere di tipo {}",
            expected.label()
        ))
    } else {
        Err(format!("Gli elementi del campo {field} devono essere dello stesso tipo"))
    }
}

#[derive(Clone)]
pub struct FieldRule {
    kind: FieldKind,
    required: bool,
    verbatim: bool,
    custom: Option<CustomCheck>,
    message: Option<String>,
}

impl fmt::Debug for FieldRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FieldRule")
            .field("kind", &self.kind)
            .field("required", &self.required)
            .field("verbatim", &self.verbatim)
            .field("custom", &self.custom.is_some())
            .field("message", &self.message)
            .finish()
    }
}

impl FieldRule {
    pub const fn new(kind: FieldKind) -> Self {
        Self {
            kind,
            required: false,
            verbatim: false,
            custom: None,
            message: None,
        }
    }

    pub const fn string() -> Self {
        Self::new(FieldKind::String {
            min_len: None,
            max_len: None,
            pattern: None,
        })
    }

    pub const fn email() -> Self {
        Self::new(FieldKind::Email)
    }

    pub const fn number() -> Self {
        Self::new(FieldKind::Number {
            min: None,
            max: None,
        })
    }

    pub const fn boolean() -> Self {
        Self::new(FieldKind::Boolean)
    }

    pub const fn array() -> Self {
        Self::new(FieldKind::Array {
            items: None,
            min_len: None,
            max_len: None,
        })
    }

    pub const fn object() -> Self {
        Self::new(FieldKind::Object)
    }

    #[must_use]
    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    /// Keep the value exactly as sent: no sanitising, no injection scan.
    /// For secrets such as passwords.
    #[must_use]
    pub fn verbatim(mut self) -> Self {
        self.verbatim = true;
        self
    }

    /// Character bounds for strings, element bounds for arrays
    #[must_use]
    pub fn length(mut self, min: Option<usize>, max: Option<usize>) -> Self {
        match &mut self.kind {
            FieldKind::String {
                min_len, max_len, ..
            }
            | FieldKind::Array {
                min_len, max_len, ..
            } => {
                *min_len = min;
                *max_len = max;
            },
            _ => {},
        }
        self
    }

    #[must_use]
    pub fn range(mut self, lower: Option<f64>, upper: Option<f64>) -> Self {
        if let FieldKind::Number { min, max } = &mut self.kind {
            *min = lower;
            *max = upper;
        }
        self
    }

    #[must_use]
    pub fn pattern(mut self, regex: Regex) -> Self {
        if let FieldKind::String { pattern, .. } = &mut self.kind {
            *pattern = Some(regex);
        }
        self
    }

    #[must_use]
    pub fn items(mut self, kind: ItemKind) -> Self {
        if let FieldKind::Array { items, .. } = &mut self.kind {
            *items = Some(kind);
        }
        self
    }

    #[must_use]
    pub fn custom(mut self, check: impl Fn(&Value) -> bool + Send + Sync + 'static) -> Self {
        self.custom = Some(Arc::new(check));
        self
    }

    /// Replace the generated violation text
    #[must_use]
    pub fn message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    fn violation(&self, field: &str, generated: String) -> Violation {
        Violation {
            field: field.to_string(),
            message: self.message.clone().unwrap_or(generated),
        }
    }
}

/// One offending field
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Violation {
    pub field: String,
    pub message: String,
}

#[derive(Debug, Clone, Default)]
pub struct ValidationSchema {
    fields: Vec<(String, FieldRule)>,
}

impl ValidationSchema {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn field(mut self, path: impl Into<String>, rule: FieldRule) -> Self {
        self.fields.push((path.into(), rule));
        self
    }

    pub fn fields(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|(path, _)| path.as_str())
    }

    /// Paths of the string fields that get sanitised
    pub fn text_fields(&self) -> impl Iterator<Item = &str> {
        self.fields
            .iter()
            .filter(|(_, rule)| rule.kind.is_textual() && !rule.verbatim)
            .map(|(path, _)| path.as_str())
    }

    /// Normalise every declared string field of `body` in place
    pub fn sanitize(&self, body: &mut Value) {
        for path in self.text_fields() {
            if let Some(Value::String(text)) = lookup_mut(body, path) {
                *text = sanitize(text);
            }
        }
    }
}

fn pointer(path: &str) -> String {
    path.split('.').fold(String::new(), |mut acc, segment| {
        acc.push('/');
        acc.push_str(&segment.replace('~', "~0").replace('/', "~1"));
        acc
    })
}

pub fn lookup<'a>(body: &'a Value, path: &str) -> Option<&'a Value> {
    body.pointer(&pointer(path))
}

fn lookup_mut<'a>(body: &'a mut Value, path: &str) -> Option<&'a mut Value> {
    body.pointer_mut(&pointer(path))
}

fn is_missing(value: Option<&Value>) -> bool {
    match value {
        None | Some(Value::Null) => true,
        Some(Value::String(s)) => sanitize(s).is_empty(),
        Some(_) => false,
    }
}

/// Check `body` against `schema`, one violation at most per field
pub fn validate(body: &Value, schema: &ValidationSchema) -> Vec<Violation> {
    let mut violations = Vec::new();

    for (path, rule) in &schema.fields {
        let value = lookup(body, path);
        if is_missing(value) {
            if rule.required {
                violations.push(rule.violation(path, format!("Il campo {path} è obbligatorio")));
            }
            continue;
        }
        let Some(value) = value else { continue };

        if let Err(message) = rule.kind.check(path, value) {
            violations.push(rule.violation(path, message));
            continue;
        }

        if let Some(custom) = &rule.custom
            && !custom(value)
        {
            violations.push(rule.violation(path, format!("Il campo {path} non è valido")));
        }
    }

    violations
}
