/*!
# Field-map request construction

Helpers in this crate accept a request either as an already-typed prost
message or as a [`FieldMap`], a bag of named field values that is coerced
into the declared request type at the call site. Coercion is strict: an
unknown key or a value of the wrong kind fails the call with
`InvalidArgument` instead of being silently dropped.

```
use tonic_svc_mock::fields::{FieldMap, FromFields, RequestArg};
use tonic_svc_mock::test_utils::TestRequest;

let map = FieldMap::new()
    .with("id", "id-1")
    .with("data", "payload");

let typed = TestRequest::from_fields(&map).unwrap();
assert_eq!(typed, TestRequest::new("id-1", "payload"));

// RequestArg resolves either form to the same message.
let from_map: TestRequest = RequestArg::Fields(map).resolve().unwrap();
assert_eq!(from_map, typed);
```
*/

use std::collections::BTreeMap;

use bytes::Bytes;
use tonic::Status;

/// A single field value in a [`FieldMap`].
#[derive(Clone, Debug, PartialEq)]
pub enum FieldValue {
    Str(String),
    Bytes(Bytes),
    I32(i32),
    I64(i64),
    Bool(bool),
    F64(f64),
}

impl From<&str> for FieldValue {
    fn from(value: &str) -> Self {
        FieldValue::Str(value.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(value: String) -> Self {
        FieldValue::Str(value)
    }
}

impl From<Bytes> for FieldValue {
    fn from(value: Bytes) -> Self {
        FieldValue::Bytes(value)
    }
}

impl From<i32> for FieldValue {
    fn from(value: i32) -> Self {
        FieldValue::I32(value)
    }
}

impl From<i64> for FieldValue {
    fn from(value: i64) -> Self {
        FieldValue::I64(value)
    }
}

impl From<bool> for FieldValue {
    fn from(value: bool) -> Self {
        FieldValue::Bool(value)
    }
}

impl From<f64> for FieldValue {
    fn from(value: f64) -> Self {
        FieldValue::F64(value)
    }
}

/// Ordered mapping from field name to [`FieldValue`].
#[derive(Clone, Debug, Default, PartialEq)]
pub struct FieldMap {
    entries: BTreeMap<String, FieldValue>,
}

impl FieldMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a field, chainable for building literals in tests.
    pub fn with(mut self, name: impl Into<String>, value: impl Into<FieldValue>) -> Self {
        self.entries.insert(name.into(), value.into());
        self
    }

    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<FieldValue>) {
        self.entries.insert(name.into(), value.into());
    }

    pub fn get(&self, name: &str) -> Option<&FieldValue> {
        self.entries.get(name)
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Fail if the map carries a key outside the declared field set.
    pub fn ensure_known(&self, known: &[&str]) -> Result<(), Status> {
        for name in self.entries.keys() {
            if !known.contains(&name.as_str()) {
                return Err(Status::invalid_argument(format!(
                    "unknown field `{name}` (known fields: {})",
                    known.join(", ")
                )));
            }
        }
        Ok(())
    }

    /// String accessor; `InvalidArgument` if the field holds another kind.
    pub fn get_str(&self, name: &str) -> Result<Option<&str>, Status> {
        match self.entries.get(name) {
            None => Ok(None),
            Some(FieldValue::Str(s)) => Ok(Some(s.as_str())),
            Some(other) => Err(mismatch(name, "string", other)),
        }
    }

    /// Bytes accessor; a string value is accepted and converted.
    pub fn get_bytes(&self, name: &str) -> Result<Option<Bytes>, Status> {
        match self.entries.get(name) {
            None => Ok(None),
            Some(FieldValue::Bytes(b)) => Ok(Some(b.clone())),
            Some(FieldValue::Str(s)) => Ok(Some(Bytes::from(s.clone()))),
            Some(other) => Err(mismatch(name, "bytes", other)),
        }
    }

    pub fn get_i32(&self, name: &str) -> Result<Option<i32>, Status> {
        match self.entries.get(name) {
            None => Ok(None),
            Some(FieldValue::I32(v)) => Ok(Some(*v)),
            Some(other) => Err(mismatch(name, "i32", other)),
        }
    }

    pub fn get_i64(&self, name: &str) -> Result<Option<i64>, Status> {
        match self.entries.get(name) {
            None => Ok(None),
            Some(FieldValue::I64(v)) => Ok(Some(*v)),
            Some(FieldValue::I32(v)) => Ok(Some(i64::from(*v))),
            Some(other) => Err(mismatch(name, "i64", other)),
        }
    }

    pub fn get_bool(&self, name: &str) -> Result<Option<bool>, Status> {
        match self.entries.get(name) {
            None => Ok(None),
            Some(FieldValue::Bool(v)) => Ok(Some(*v)),
            Some(other) => Err(mismatch(name, "bool", other)),
        }
    }

    pub fn get_f64(&self, name: &str) -> Result<Option<f64>, Status> {
        match self.entries.get(name) {
            None => Ok(None),
            Some(FieldValue::F64(v)) => Ok(Some(*v)),
            Some(other) => Err(mismatch(name, "f64", other)),
        }
    }
}

fn mismatch(name: &str, wanted: &str, got: &FieldValue) -> Status {
    Status::invalid_argument(format!("field `{name}` expects {wanted}, got {got:?}"))
}

/// Constructor contract for building a message from a [`FieldMap`].
///
/// `FIELDS` declares the accepted field names; [`FromFields::coerce`] checks
/// them before delegating to `from_fields`, so implementations only deal with
/// keys they declared.
pub trait FromFields: Sized {
    /// Field names this message accepts.
    const FIELDS: &'static [&'static str];

    /// Build the message from declared fields. Missing fields take the
    /// message's default value, matching proto3 semantics.
    fn from_fields(fields: &FieldMap) -> Result<Self, Status>;

    /// Validate the map against `FIELDS`, then construct.
    fn coerce(fields: &FieldMap) -> Result<Self, Status> {
        fields.ensure_known(Self::FIELDS)?;
        Self::from_fields(fields)
    }
}

/// A request argument: an already-typed message or a field mapping that is
/// coerced into the declared request type when the helper runs.
#[derive(Clone, Debug)]
pub enum RequestArg<T> {
    Typed(T),
    Fields(FieldMap),
}

impl<T> RequestArg<T> {
    pub fn typed(request: T) -> Self {
        RequestArg::Typed(request)
    }

    pub fn fields(map: FieldMap) -> Self {
        RequestArg::Fields(map)
    }

    /// Resolve to the typed message; construction errors propagate unchanged.
    pub fn resolve(self) -> Result<T, Status>
    where
        T: FromFields,
    {
        match self {
            RequestArg::Typed(request) => Ok(request),
            RequestArg::Fields(map) => T::coerce(&map),
        }
    }
}

impl<T> From<FieldMap> for RequestArg<T> {
    fn from(map: FieldMap) -> Self {
        RequestArg::Fields(map)
    }
}
