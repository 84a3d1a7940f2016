use crate::core::FieldId;
use crate::core::value::Value;
use indexmap::IndexMap;
use tracing::debug;

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Field {
    pub value: Value,
    pub error: Option<String>,
    pub dirty: bool,
}

/// The single in-progress record, shared by every step.
#[derive(Debug, Default, Clone)]
pub struct RecordStore {
    fields: IndexMap<FieldId, Field>,
}

impl RecordStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Writes a value, marks the field dirty and drops its previous error.
    pub fn set_field(&mut self, id: impl Into<FieldId>, value: Value) {
        let id = id.into();
        debug!(field = %id, value = %value, "set field");
        let field = self.fields.entry(id).or_default();
        field.value = value;
        field.dirty = true;
        field.error = None;
    }

    /// Removes value and error. Unknown names are ignored.
    pub fn unset_field(&mut self, id: &str) {
        if self.fields.shift_remove(id).is_some() {
            debug!(field = id, "unset field");
        }
    }

    /// Creates the field with `default` unless it already exists. Not dirty.
    pub fn register(&mut self, id: impl Into<FieldId>, default: Value) {
        self.fields.entry(id.into()).or_insert_with(|| Field {
            value: default,
            error: None,
            dirty: false,
        });
    }

    pub fn get(&self, id: &str) -> Option<&Field> {
        self.fields.get(id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.fields.contains_key(id)
    }

    pub fn value(&self, id: &str) -> Value {
        self.fields
            .get(id)
            .map(|field| field.value.clone())
            .unwrap_or_default()
    }

    pub fn is_dirty(&self, id: &str) -> bool {
        self.fields.get(id).is_some_and(|field| field.dirty)
    }

    /// Projection in the order of `ids`; missing fields come back as `Value::None`.
    pub fn values<'a, I>(&self, ids: I) -> IndexMap<FieldId, Value>
    where
        I: IntoIterator<Item = &'a FieldId>,
    {
        ids.into_iter()
            .map(|id| (id.clone(), self.value(id.as_str())))
            .collect()
    }

    pub fn all_values(&self) -> IndexMap<FieldId, Value> {
        self.fields
            .iter()
            .map(|(id, field)| (id.clone(), field.value.clone()))
            .collect()
    }

    /// A field that was never written still gets an entry to carry its error.
    pub fn set_error(&mut self, id: impl Into<FieldId>, error: impl Into<String>) {
        self.fields.entry(id.into()).or_default().error = Some(error.into());
    }

    pub fn clear_error(&mut self, id: &str) {
        if let Some(field) = self.fields.get_mut(id) {
            field.error = None;
        }
    }

    pub fn error(&self, id: &str) -> Option<&str> {
        self.fields.get(id).and_then(|field| field.error.as_deref())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&FieldId, &Field)> {
        self.fields.iter()
    }
}
