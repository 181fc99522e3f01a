use crate::core::value::Value;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FieldValue {
    pub name: String,
    pub value: Value,
}

/// One fetched row, keyed by physical column name in select order.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Row {
    pub fields: Vec<FieldValue>,
}

impl Row {
    pub fn new(fields: Vec<FieldValue>) -> Self {
        Row { fields }
    }

    pub fn get(&self, column: &str) -> Option<&Value> {
        self.fields
            .iter()
            .find(|f| f.name == column)
            .map(|f| &f.value)
    }

    /// Like [`Row::get`], but treats SQL `NULL` the same as a missing column.
    pub fn get_present(&self, column: &str) -> Option<&Value> {
        self.get(column).filter(|v| !v.is_null())
    }

    pub fn insert(&mut self, column: impl Into<String>, value: Value) {
        let name = column.into();
        match self.fields.iter_mut().find(|f| f.name == name) {
            Some(field) => field.value = value,
            None => self.fields.push(FieldValue { name, value }),
        }
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

impl<K, V> FromIterator<(K, V)> for Row
where
    K: Into<String>,
    V: Into<Value>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut row = Row::default();
        for (k, v) in iter {
            row.insert(k, v.into());
        }
        row
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn insert_replaces_existing_column_in_place() {
        let mut row: Row = [("id", Value::Int(1)), ("status", Value::from("NEW"))]
            .into_iter()
            .collect();
        row.insert("id", Value::Int(7));

        assert_eq!(row.len(), 2);
        assert_eq!(row.fields[0].name, "id");
        assert_eq!(row.get("id"), Some(&Value::Int(7)));
    }

    #[test]
    fn null_columns_are_not_present() {
        let row: Row = [("score", Value::Null)].into_iter().collect();
        assert!(row.get("score").is_some());
        assert!(row.get_present("score").is_none());
    }
}
