//! Field-level redaction of logged objects
//!
//! Types opt in by implementing [`Redactable`]: they list their fields in
//! declaration order and may declare an allow-list of field names that are
//! safe to print. Types without an allow-list follow the global
//! redact-by-default flag.

use std::fmt::{self, Write};

/// Placeholder printed instead of a hidden value.
pub const REDACTED: &str = "<redacted>";

/// Placeholder printed when nesting exceeds the depth bound.
pub const TRUNCATED: &str = "<truncated>";

/// Default bound on nested descriptions.
pub const DEFAULT_MAX_DEPTH: usize = 16;

/// An object whose fields can be described with redaction applied.
pub trait Redactable {
    /// Short type name used as the description prefix.
    fn type_name(&self) -> &'static str {
        short_type_name(std::any::type_name::<Self>())
    }

    /// Field names that are safe to print, or `None` to follow the
    /// global redact-by-default flag.
    fn safe_fields(&self) -> Option<&'static [&'static str]> {
        None
    }

    /// Fields in declaration order.
    fn fields(&self) -> Vec<Field<'_>>;
}

/// A named field of a [`Redactable`] value.
pub struct Field<'a> {
    /// Field name
    pub name: &'static str,
    /// Field value
    pub value: FieldValue<'a>,
}

/// The value held by a field.
pub enum FieldValue<'a> {
    /// Primitive or string leaf, printed with `Display`
    Leaf(&'a dyn fmt::Display),
    /// Composite value, described recursively
    Nested(&'a dyn Redactable),
    /// Absent value
    Null,
}

impl<'a> Field<'a> {
    /// A primitive/string field.
    pub fn leaf(name: &'static str, value: &'a dyn fmt::Display) -> Self {
        Self {
            name,
            value: FieldValue::Leaf(value),
        }
    }

    /// A composite field.
    pub fn nested(name: &'static str, value: &'a dyn Redactable) -> Self {
        Self {
            name,
            value: FieldValue::Nested(value),
        }
    }

    /// An optional primitive/string field.
    pub fn optional_leaf<T: fmt::Display>(name: &'static str, value: Option<&'a T>) -> Self {
        Self {
            name,
            value: value.map_or(FieldValue::Null, |v| FieldValue::Leaf(v)),
        }
    }

    /// An optional composite field.
    pub fn optional_nested<T: Redactable>(name: &'static str, value: Option<&'a T>) -> Self {
        Self {
            name,
            value: value.map_or(FieldValue::Null, |v| FieldValue::Nested(v)),
        }
    }
}

/// Produces redacted descriptions of [`Redactable`] values.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Redactor {
    redact_by_default: bool,
    max_depth: usize,
}

impl Redactor {
    /// Create a redactor with the given redact-by-default flag.
    pub fn new(redact_by_default: bool) -> Self {
        Self {
            redact_by_default,
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }

    /// Builder: bound on nested descriptions.
    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    /// Whether types without an allow-list are fully redacted.
    pub fn redacts_by_default(&self) -> bool {
        self.redact_by_default
    }

    /// Whether `field` of `value` may be printed.
    pub fn is_allowed(&self, value: &dyn Redactable, field: &str) -> bool {
        match value.safe_fields() {
            Some(safe) => safe.contains(&field),
            None => !self.redact_by_default,
        }
    }

    /// Describe `value` as `TypeName(field=value, ...)`.
    pub fn describe(&self, value: &dyn Redactable) -> String {
        let mut out = String::new();
        self.write_value(&mut out, value, 0);
        out
    }

    fn write_value(&self, out: &mut String, value: &dyn Redactable, depth: usize) {
        out.push_str(value.type_name());
        out.push('(');

        for (i, field) in value.fields().into_iter().enumerate() {
            if i > 0 {
                out.push_str(", ");
            }
            out.push_str(field.name);
            out.push('=');

            if !self.is_allowed(value, field.name) {
                out.push_str(REDACTED);
                continue;
            }

            match field.value {
                FieldValue::Leaf(leaf) => {
                    let _ = write!(out, "{leaf}");
                },
                FieldValue::Null => out.push_str("null"),
                FieldValue::Nested(inner) => {
                    if depth + 1 > self.max_depth {
                        out.push_str(TRUNCATED);
                    } else {
                        self.write_value(out, inner, depth + 1);
                    }
                },
            }
        }

        out.push(')');
    }
}

impl Default for Redactor {
    fn default() -> Self {
        Self::new(false)
    }
}

/// Redaction helper for any [`Redactable`]
pub trait RedactExt {
    /// Describe with the given redactor
    fn redacted(&self, redactor: &Redactor) -> String;
}

impl<T: Redactable> RedactExt for T {
    fn redacted(&self, redactor: &Redactor) -> String {
        redactor.describe(self)
    }
}

/// Strip module paths and generic arguments from a type name.
pub fn short_type_name(full: &str) -> &str {
    let base = full.split('<').next().unwrap_or(full);
    base.rsplit("::").next().unwrap_or(base)
}
