//! Declarative field schema, validation and fallback records.

use std::fmt;

use serde_json::{Map, Value};

use super::record::ValidatedRecord;
use crate::{HuginnError, Result};

/// JSON value types a field or list element can be declared as.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueKind {
    String,
    Integer,
    Float,
    Boolean,
    Any,
}

impl ValueKind {
    /// Whether `value` is of this kind. `Float` accepts any JSON number,
    /// `Integer` only integral representations (`60`, not `60.0`).
    pub fn matches(self, value: &Value) -> bool {
        match self {
            ValueKind::String => value.is_string(),
            ValueKind::Integer => value.is_i64() || value.is_u64(),
            ValueKind::Float => value.is_number(),
            ValueKind::Boolean => value.is_boolean(),
            ValueKind::Any => true,
        }
    }
}

impl fmt::Display for ValueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ValueKind::String => "string",
            ValueKind::Integer => "int",
            ValueKind::Float => "float",
            ValueKind::Boolean => "boolean",
            ValueKind::Any => "any",
        };
        f.write_str(name)
    }
}

/// Numeric type of a bounded number field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NumberKind {
    Integer,
    Float,
}

impl NumberKind {
    fn value_kind(self) -> ValueKind {
        match self {
            NumberKind::Integer => ValueKind::Integer,
            NumberKind::Float => ValueKind::Float,
        }
    }
}

/// Validation rule for one field.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldKind {
    /// Exact, case-sensitive membership.
    ///
    /// Without an explicit default the fallback record uses the *last*
    /// listed value, so list values from most to least severe (or end with a
    /// catch-all such as `"other"`). Declare the field with
    /// [`TaxonomySchema::field_with_default`] when the neutral value sits
    /// elsewhere, e.g. `["positive", "neutral", "negative"]`.
    Enum(Vec<String>),
    /// Number of the given kind within `[min, max]` inclusive.
    BoundedNumber { kind: NumberKind, min: f64, max: f64 },
    /// `null` or a value of the given kind.
    Nullable(ValueKind),
    /// A JSON array. Elements are not checked.
    List(ValueKind),
    /// A real JSON boolean; `"true"` and `1` are rejected.
    Boolean,
}

impl FieldKind {
    /// Convenience constructor for [`FieldKind::Enum`].
    pub fn one_of<I, S>(values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        FieldKind::Enum(values.into_iter().map(Into::into).collect())
    }

    pub fn float(min: f64, max: f64) -> Self {
        FieldKind::BoundedNumber {
            kind: NumberKind::Float,
            min,
            max,
        }
    }

    pub fn integer(min: f64, max: f64) -> Self {
        FieldKind::BoundedNumber {
            kind: NumberKind::Integer,
            min,
            max,
        }
    }

    /// Check `value` against this rule, describing the violation on failure.
    fn check(&self, value: &Value) -> std::result::Result<(), String> {
        match self {
            FieldKind::Enum(allowed) => match value.as_str() {
                Some(s) if allowed.iter().any(|a| a == s) => Ok(()),
                _ => Err(format!(
                    "expected one of [{}], got {value}",
                    allowed.join(", ")
                )),
            },
            FieldKind::BoundedNumber { kind, min, max } => {
                let in_range = kind.value_kind().matches(value)
                    && value.as_f64().is_some_and(|n| n >= *min && n <= *max);
                if in_range {
                    Ok(())
                } else {
                    Err(format!(
                        "expected {} within [{min}, {max}], got {value}",
                        kind.value_kind()
                    ))
                }
            }
            FieldKind::Nullable(kind) => {
                if value.is_null() || kind.matches(value) {
                    Ok(())
                } else {
                    Err(format!("expected null or {kind}, got {value}"))
                }
            }
            FieldKind::List(_) => {
                if value.is_array() {
                    Ok(())
                } else {
                    Err(format!("expected a list, got {value}"))
                }
            }
            FieldKind::Boolean => {
                if value.is_boolean() {
                    Ok(())
                } else {
                    Err(format!("expected boolean, got {value}"))
                }
            }
        }
    }

    /// Neutral value used when the schema declares no explicit default.
    fn neutral_value(&self) -> Value {
        match self {
            FieldKind::Enum(values) => values
                .last()
                .map(|v| Value::String(v.clone()))
                .unwrap_or(Value::Null),
            FieldKind::BoundedNumber { kind, min, max } => {
                let zero = 0.0_f64.clamp(*min, *max);
                match kind {
                    NumberKind::Integer => Value::from(zero.ceil() as i64),
                    NumberKind::Float => Value::from(zero),
                }
            }
            FieldKind::Nullable(_) => Value::Null,
            FieldKind::List(_) => Value::Array(Vec::new()),
            FieldKind::Boolean => Value::Bool(false),
        }
    }

    /// Short human description, used in prompt instructions.
    fn describe(&self) -> String {
        match self {
            FieldKind::Enum(values) => {
                let quoted: Vec<String> = values.iter().map(|v| format!("\"{v}\"")).collect();
                format!("one of {}", quoted.join(" | "))
            }
            FieldKind::BoundedNumber { kind, min, max } => {
                format!("{} from {min} to {max}", kind.value_kind())
            }
            FieldKind::Nullable(kind) => format!("{kind} or null"),
            FieldKind::List(kind) => format!("list of {kind}"),
            FieldKind::Boolean => "true or false".to_string(),
        }
    }
}

/// One declared field.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldSpec {
    pub name: String,
    pub kind: FieldKind,
    /// Value used by [`TaxonomySchema::fallback`]; the kind's neutral value
    /// when `None`.
    pub default: Option<Value>,
}

/// Ordered field-name → rule mapping a model's structured output must
/// satisfy.
///
/// Declared once (usually at startup) and shared read-only.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TaxonomySchema {
    fields: Vec<FieldSpec>,
}

impl TaxonomySchema {
    pub fn new() -> Self {
        Self::default()
    }

    /// Declare a field. Redeclaring a name replaces the earlier rule in place.
    pub fn field(self, name: impl Into<String>, kind: FieldKind) -> Self {
        self.push(FieldSpec {
            name: name.into(),
            kind,
            default: None,
        })
    }

    /// Declare a field with an explicit fallback value.
    pub fn field_with_default(
        self,
        name: impl Into<String>,
        kind: FieldKind,
        default: impl Into<Value>,
    ) -> Self {
        self.push(FieldSpec {
            name: name.into(),
            kind,
            default: Some(default.into()),
        })
    }

    fn push(mut self, spec: FieldSpec) -> Self {
        match self.fields.iter_mut().find(|f| f.name == spec.name) {
            Some(existing) => *existing = spec,
            None => self.fields.push(spec),
        }
        self
    }

    pub fn fields(&self) -> &[FieldSpec] {
        &self.fields
    }

    pub fn get(&self, name: &str) -> Option<&FieldSpec> {
        self.fields.iter().find(|f| f.name == name)
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Validate `object` field by field in declaration order.
    ///
    /// Fails fast: the first missing field or violated rule is reported as
    /// [`HuginnError::SchemaValidation`] and later fields are not examined.
    /// Keys the schema does not declare are dropped from the record.
    pub fn validate(&self, object: &Map<String, Value>) -> Result<ValidatedRecord> {
        let mut fields = Map::new();
        for spec in &self.fields {
            let value = object
                .get(&spec.name)
                .ok_or_else(|| HuginnError::schema(&spec.name, "field is required"))?;
            spec.kind
                .check(value)
                .map_err(|rule| HuginnError::schema(&spec.name, rule))?;
            fields.insert(spec.name.clone(), value.clone());
        }
        Ok(ValidatedRecord::new(fields, false))
    }

    /// A schema-conformant default record, flagged `is_default`.
    ///
    /// Never fails. Explicit defaults are trusted as declared.
    pub fn fallback(&self) -> ValidatedRecord {
        let fields = self
            .fields
            .iter()
            .map(|spec| {
                let value = spec
                    .default
                    .clone()
                    .unwrap_or_else(|| spec.kind.neutral_value());
                (spec.name.clone(), value)
            })
            .collect();
        ValidatedRecord::new(fields, true)
    }

    /// Render the schema as response-format instructions for a prompt.
    pub fn instructions(&self) -> String {
        let mut out = String::from(
            "Respond with a single JSON object and nothing else. Use exactly these fields:\n",
        );
        for spec in &self.fields {
            out.push_str(&format!("- \"{}\": {}\n", spec.name, spec.kind.describe()));
        }
        out
    }
}
