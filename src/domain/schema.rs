/// Whether a field accepts one or many selected values.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Cardinality {
    Single,
    Multiple,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AllowedValue {
    pub id: String,
    pub label: String,
}

#[derive(Debug, Clone)]
pub struct FieldSpec {
    pub key: String,
    pub display_name: String,
    pub allowed_values: Vec<AllowedValue>,
    pub cardinality: Cardinality,
}

/// The tracker-reported field set for a fixed project and issue type.
/// Fields without allowed values are carried but never presented.
#[derive(Debug, Clone, Default)]
pub struct FieldSchema {
    fields: Vec<FieldSpec>,
}

impl FieldSchema {
    pub fn new(fields: Vec<FieldSpec>) -> Self {
        Self { fields }
    }

    /// Fields that qualify for presentation: a non-empty value list.
    pub fn selectable(&self) -> impl Iterator<Item = &FieldSpec> {
        self.fields
            .iter()
            .filter(|field| !field.allowed_values.is_empty())
    }

    pub fn get(&self, key: &str) -> Option<&FieldSpec> {
        self.fields.iter().find(|field| field.key == key)
    }
}
