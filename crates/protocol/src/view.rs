//! Typed views
//!
//! A view is a named flat structure with a fixed, typed field list. Views are
//! defined once at startup (the `ViewRegistry`) and instantiated per request
//! as `ViewBuffer` values that validate every assignment against the schema.
//!
//! JSON mapping: a view travels as a single-key object,
//! `{"VIEW_NAME": {"field": value, ...}}`.

use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::path::Path;
use std::sync::Arc;

use serde_json::Value;

use crate::{ErrorCode, TpError};

/// View serializer flag: emit only fields with non-null values
pub const VIEW_NOTNULL: i64 = 0x1;

/// Type of a single view field
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViewFieldType {
    /// Signed integer
    Long,
    /// Floating point
    Double,
    /// UTF-8 string
    Str,
    /// Boolean
    Bool,
}

impl ViewFieldType {
    fn parse(s: &str) -> Option<Self> {
        match s {
            "long" | "int" => Some(Self::Long),
            "double" | "float" => Some(Self::Double),
            "string" => Some(Self::Str),
            "bool" => Some(Self::Bool),
            _ => None,
        }
    }

    /// Check a JSON value against this type (null always passes)
    fn accepts(self, value: &Value) -> bool {
        match (self, value) {
            (_, Value::Null) => true,
            (Self::Long, Value::Number(n)) => n.is_i64() || n.is_u64(),
            (Self::Double, Value::Number(_)) => true,
            (Self::Str, Value::String(_)) => true,
            (Self::Bool, Value::Bool(_)) => true,
            _ => false,
        }
    }

    /// The "unset" value for this type, used when a field is absent
    fn null_value(self) -> Value {
        Value::Null
    }
}

/// One field of a view definition
#[derive(Debug, Clone)]
pub struct ViewField {
    /// Field name
    pub name: String,
    /// Field type
    pub ty: ViewFieldType,
}

/// A named view definition
#[derive(Debug, Clone)]
pub struct ViewSchema {
    /// View name (the JSON root key)
    pub name: String,
    /// Fields in definition order
    pub fields: Vec<ViewField>,
}

impl ViewSchema {
    /// Look up a field definition by name
    pub fn field(&self, name: &str) -> Option<&ViewField> {
        self.fields.iter().find(|f| f.name == name)
    }
}

/// Process-wide collection of view definitions
///
/// Loaded once at startup from a JSON document of the form
/// `{"VIEW_NAME": {"field": "long" | "double" | "string" | "bool", ...}}`.
#[derive(Debug, Clone, Default)]
pub struct ViewRegistry {
    views: HashMap<String, Arc<ViewSchema>>,
}

impl ViewRegistry {
    /// Create an empty registry
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a registry from its JSON document
    pub fn from_json_str(s: &str) -> Result<Self, TpError> {
        let root: Value = serde_json::from_str(s)
            .map_err(|e| TpError::new(ErrorCode::System, format!("bad view definitions: {e}")))?;

        let Value::Object(views) = root else {
            return Err(TpError::system("view definitions must be a JSON object"));
        };

        let mut registry = Self::new();
        for (name, def) in views {
            let Value::Object(fields) = def else {
                return Err(TpError::system(format!(
                    "view '{name}' definition must be a JSON object"
                )));
            };

            let mut schema = ViewSchema {
                name: name.clone(),
                fields: Vec::with_capacity(fields.len()),
            };
            for (fname, ftype) in fields {
                let ty = ftype
                    .as_str()
                    .and_then(ViewFieldType::parse)
                    .ok_or_else(|| {
                        TpError::system(format!("view '{name}' field '{fname}': unknown type"))
                    })?;
                schema.fields.push(ViewField { name: fname, ty });
            }
            registry.views.insert(name, Arc::new(schema));
        }

        Ok(registry)
    }

    /// Load a registry from a JSON file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, TpError> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path).map_err(|e| {
            TpError::system(format!("cannot read view file {}: {e}", path.display()))
        })?;
        Self::from_json_str(&contents)
    }

    /// Add a view definition
    pub fn insert(&mut self, schema: ViewSchema) {
        self.views.insert(schema.name.clone(), Arc::new(schema));
    }

    /// Look up a view definition by name
    #[inline]
    pub fn get(&self, name: &str) -> Option<&Arc<ViewSchema>> {
        self.views.get(name)
    }

    /// Number of registered views
    #[inline]
    pub fn len(&self) -> usize {
        self.views.len()
    }

    /// Check whether the registry has no views
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.views.is_empty()
    }
}

/// An instance of a view: schema reference plus field values
#[derive(Debug, Clone)]
pub struct ViewBuffer {
    schema: Arc<ViewSchema>,
    values: BTreeMap<String, Value>,
}

impl ViewBuffer {
    /// Create an empty instance of a view
    pub fn new(schema: Arc<ViewSchema>) -> Self {
        Self {
            schema,
            values: BTreeMap::new(),
        }
    }

    /// Parse a view from its single-key JSON form
    ///
    /// The root object must contain exactly one key, which names the target
    /// view. Unknown fields and type mismatches are rejected as bad input.
    pub fn from_json(registry: &ViewRegistry, root: &Value) -> Result<Self, TpError> {
        let Value::Object(obj) = root else {
            return Err(TpError::invalid("view payload must be a JSON object"));
        };
        if obj.len() != 1 {
            return Err(TpError::invalid(
                "view payload must have exactly one top-level key (the view name)",
            ));
        }

        let (name, body) = obj.iter().next().expect("single-key object");
        let schema = registry
            .get(name)
            .ok_or_else(|| TpError::invalid(format!("unknown view '{name}'")))?;

        let Value::Object(fields) = body else {
            return Err(TpError::invalid(format!("view '{name}' body must be an object")));
        };

        let mut view = Self::new(Arc::clone(schema));
        for (fname, value) in fields {
            view.set(fname, value.clone())?;
        }
        Ok(view)
    }

    /// View name
    #[inline]
    pub fn name(&self) -> &str {
        &self.schema.name
    }

    /// Schema this instance is validated against
    #[inline]
    pub fn schema(&self) -> &Arc<ViewSchema> {
        &self.schema
    }

    /// Set a field, validating name and type against the schema
    pub fn set(&mut self, name: &str, value: Value) -> Result<(), TpError> {
        let field = self.schema.field(name).ok_or_else(|| {
            TpError::invalid(format!("view '{}' has no field '{name}'", self.schema.name))
        })?;
        if !field.ty.accepts(&value) {
            return Err(TpError::invalid(format!(
                "view '{}' field '{name}': type mismatch",
                self.schema.name
            )));
        }
        self.values.insert(name.to_string(), value);
        Ok(())
    }

    /// Get a field value (None when unset)
    #[inline]
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.values.get(name)
    }

    /// Check whether the schema defines a field of this name
    #[inline]
    pub fn has_field(&self, name: &str) -> bool {
        self.schema.field(name).is_some()
    }

    /// Serialize back to the single-key JSON form
    ///
    /// With `notnull` set (or `VIEW_NOTNULL` in `flags`), unset, null, zero
    /// and empty-string fields are omitted; otherwise every schema field is
    /// emitted, absent ones as null.
    pub fn to_json(&self, notnull: bool, flags: i64) -> Value {
        let skip_nulls = notnull || (flags & VIEW_NOTNULL) != 0;
        let mut body = serde_json::Map::new();

        for field in &self.schema.fields {
            let value = self
                .values
                .get(&field.name)
                .cloned()
                .unwrap_or_else(|| field.ty.null_value());

            if skip_nulls && is_null_like(&value) {
                continue;
            }
            body.insert(field.name.clone(), value);
        }

        let mut root = serde_json::Map::new();
        root.insert(self.schema.name.clone(), Value::Object(body));
        Value::Object(root)
    }
}

/// Null, numeric zero and empty string count as "not set" for notnull mode
fn is_null_like(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::Number(n) => n.as_f64() == Some(0.0),
        Value::String(s) => s.is_empty(),
        _ => false,
    }
}
