//! Parsed observer declarations.
//!
//! Configuration files are parsed elsewhere; this is the form a parsed
//! declaration takes when it reaches the [`ObserverFactory`](crate::ObserverFactory).

use indexmap::IndexMap;
use tally_core::RegistryError;

// ── ParamValue ─────────────────────────────────────────────────────

/// One declaration parameter value.
#[derive(Clone, Debug, PartialEq)]
pub enum ParamValue {
    /// An integer.
    Int(i64),
    /// A floating-point number.
    Float(f64),
    /// A flag.
    Bool(bool),
    /// Free text.
    Text(String),
    /// A list of integers (e.g. region indices).
    IntList(Vec<i64>),
    /// A list of floating-point numbers.
    FloatList(Vec<f64>),
}

impl ParamValue {
    fn type_name(&self) -> &'static str {
        match self {
            Self::Int(_) => "integer",
            Self::Float(_) => "float",
            Self::Bool(_) => "bool",
            Self::Text(_) => "text",
            Self::IntList(_) => "integer list",
            Self::FloatList(_) => "float list",
        }
    }
}

impl From<i64> for ParamValue {
    fn from(v: i64) -> Self {
        Self::Int(v)
    }
}

impl From<f64> for ParamValue {
    fn from(v: f64) -> Self {
        Self::Float(v)
    }
}

impl From<bool> for ParamValue {
    fn from(v: bool) -> Self {
        Self::Bool(v)
    }
}

impl From<&str> for ParamValue {
    fn from(v: &str) -> Self {
        Self::Text(v.to_string())
    }
}

impl From<Vec<i64>> for ParamValue {
    fn from(v: Vec<i64>) -> Self {
        Self::IntList(v)
    }
}

impl From<Vec<f64>> for ParamValue {
    fn from(v: Vec<f64>) -> Self {
        Self::FloatList(v)
    }
}

// ── ObserverDecl ───────────────────────────────────────────────────

/// A named observer of a given kind with kind-specific parameters.
#[derive(Clone, Debug, PartialEq)]
pub struct ObserverDecl {
    /// Unique observer name.
    pub name: String,
    /// Constructor key in the [`ObserverFactory`](crate::ObserverFactory).
    pub kind: String,
    /// Parameters in declaration order.
    pub params: IndexMap<String, ParamValue>,
}

impl ObserverDecl {
    /// A declaration with no parameters.
    pub fn new(name: impl Into<String>, kind: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: kind.into(),
            params: IndexMap::new(),
        }
    }

    /// Builder-style parameter insert.
    #[must_use]
    pub fn with(mut self, key: impl Into<String>, value: impl Into<ParamValue>) -> Self {
        self.params.insert(key.into(), value.into());
        self
    }

    /// Raw parameter lookup.
    pub fn param(&self, key: &str) -> Option<&ParamValue> {
        self.params.get(key)
    }

    fn missing(&self, key: &str) -> RegistryError {
        RegistryError::MissingParameter {
            observer: self.name.clone(),
            key: key.to_string(),
        }
    }

    fn invalid(&self, key: &str, reason: impl Into<String>) -> RegistryError {
        RegistryError::InvalidParameter {
            observer: self.name.clone(),
            key: key.to_string(),
            reason: reason.into(),
        }
    }

    fn wrong_type(&self, key: &str, expected: &str, found: &ParamValue) -> RegistryError {
        self.invalid(
            key,
            format!("expected {expected}, found {}", found.type_name()),
        )
    }

    /// Integer parameter `key`, if present.
    pub fn int(&self, key: &str) -> Result<Option<i64>, RegistryError> {
        match self.param(key) {
            None => Ok(None),
            Some(ParamValue::Int(v)) => Ok(Some(*v)),
            Some(other) => Err(self.wrong_type(key, "integer", other)),
        }
    }

    /// Float parameter `key`, if present. Integers are widened.
    pub fn float(&self, key: &str) -> Result<Option<f64>, RegistryError> {
        match self.param(key) {
            None => Ok(None),
            Some(ParamValue::Float(v)) => Ok(Some(*v)),
            Some(ParamValue::Int(v)) => Ok(Some(*v as f64)),
            Some(other) => Err(self.wrong_type(key, "float", other)),
        }
    }

    /// Bool parameter `key`, if present.
    pub fn flag(&self, key: &str) -> Result<Option<bool>, RegistryError> {
        match self.param(key) {
            None => Ok(None),
            Some(ParamValue::Bool(v)) => Ok(Some(*v)),
            Some(other) => Err(self.wrong_type(key, "bool", other)),
        }
    }

    /// Text parameter `key`, if present.
    pub fn text(&self, key: &str) -> Result<Option<&str>, RegistryError> {
        match self.param(key) {
            None => Ok(None),
            Some(ParamValue::Text(v)) => Ok(Some(v.as_str())),
            Some(other) => Err(self.wrong_type(key, "text", other)),
        }
    }

    /// Integer-list parameter `key`, if present. A single integer is a
    /// one-element list.
    pub fn int_list(&self, key: &str) -> Result<Option<Vec<i64>>, RegistryError> {
        match self.param(key) {
            None => Ok(None),
            Some(ParamValue::IntList(v)) => Ok(Some(v.clone())),
            Some(ParamValue::Int(v)) => Ok(Some(vec![*v])),
            Some(other) => Err(self.wrong_type(key, "integer list", other)),
        }
    }

    /// Float-list parameter `key`, if present.
    pub fn float_list(&self, key: &str) -> Result<Option<Vec<f64>>, RegistryError> {
        match self.param(key) {
            None => Ok(None),
            Some(ParamValue::FloatList(v)) => Ok(Some(v.clone())),
            Some(ParamValue::Float(v)) => Ok(Some(vec![*v])),
            Some(other) => Err(self.wrong_type(key, "float list", other)),
        }
    }

    /// Required float parameter.
    pub fn require_float(&self, key: &str) -> Result<f64, RegistryError> {
        self.float(key)?.ok_or_else(|| self.missing(key))
    }

    /// Required integer-list parameter.
    pub fn require_int_list(&self, key: &str) -> Result<Vec<i64>, RegistryError> {
        self.int_list(key)?.ok_or_else(|| self.missing(key))
    }

    /// Non-negative count parameter `key`, if present.
    pub fn count(&self, key: &str) -> Result<Option<usize>, RegistryError> {
        match self.int(key)? {
            None => Ok(None),
            Some(v) => usize::try_from(v)
                .map(Some)
                .map_err(|_| self.invalid(key, format!("must be non-negative, got {v}"))),
        }
    }

    /// Region-index list `key`, if present. Entries must fit `i32`.
    pub fn regions(&self, key: &str) -> Result<Option<Vec<i32>>, RegistryError> {
        let Some(list) = self.int_list(key)? else {
            return Ok(None);
        };
        let mut regions = Vec::with_capacity(list.len());
        for &v in &list {
            let Ok(region) = i32::try_from(v) else {
                return Err(self.invalid(key, format!("region {v} out of range")));
            };
            regions.push(region);
        }
        Ok(Some(regions))
    }
}
