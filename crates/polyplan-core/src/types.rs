//! Data-set type descriptors attached to slots.
//!
//! Compatibility between a producing output and a consuming input is a
//! *declared* relation (`DataSetType::accepts`): equality of the basic data
//! unit, or one of the widening rules in `DataType::widens_from`. Nothing is
//! inferred from the operators themselves.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::schema::{DataType, Schema};

/// The type of a single element flowing through a slot.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DataUnitType {
    Basic(DataType),
    Record(Schema),
    /// Groups of elements of the inner unit, e.g. the output of a group-by.
    Grouped(Box<DataUnitType>),
}

impl DataUnitType {
    /// Strip any grouping and return the underlying element unit.
    pub fn to_basic(&self) -> &DataUnitType {
        match self {
            DataUnitType::Grouped(inner) => inner.to_basic(),
            other => other,
        }
    }

    pub fn is_grouped(&self) -> bool {
        matches!(self, DataUnitType::Grouped(_))
    }
}

impl fmt::Display for DataUnitType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DataUnitType::Basic(dt) => write!(f, "{dt}"),
            DataUnitType::Record(schema) => write!(f, "{schema}"),
            DataUnitType::Grouped(inner) => write!(f, "Grouped<{inner}>"),
        }
    }
}

/// Type of a whole data set (the thing a slot carries).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DataSetType {
    unit: DataUnitType,
}

impl DataSetType {
    pub fn new(unit: DataUnitType) -> Self {
        Self { unit }
    }

    pub fn basic(data_type: DataType) -> Self {
        Self::new(DataUnitType::Basic(data_type))
    }

    pub fn record(schema: Schema) -> Self {
        Self::new(DataUnitType::Record(schema))
    }

    pub fn grouped(unit: DataUnitType) -> Self {
        Self::new(DataUnitType::Grouped(Box::new(unit)))
    }

    pub fn unit(&self) -> &DataUnitType {
        &self.unit
    }

    /// Can a slot of this type be occupied by an output producing `produced`?
    pub fn accepts(&self, produced: &DataSetType) -> bool {
        match (self.unit.to_basic(), produced.unit.to_basic()) {
            (DataUnitType::Basic(expected), DataUnitType::Basic(actual)) => {
                expected == actual || expected.widens_from(*actual)
            }
            (expected, actual) => expected == actual,
        }
    }
}

impl fmt::Display for DataSetType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "DataSet<{}>", self.unit)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::Field;

    #[test]
    fn identical_basic_types_are_accepted() {
        let t = DataSetType::basic(DataType::Utf8);
        assert!(t.accepts(&DataSetType::basic(DataType::Utf8)));
        assert!(!t.accepts(&DataSetType::basic(DataType::Int64)));
    }

    #[test]
    fn widening_is_one_directional() {
        let wide = DataSetType::basic(DataType::Int64);
        let narrow = DataSetType::basic(DataType::Int32);
        assert!(wide.accepts(&narrow));
        assert!(!narrow.accepts(&wide));
    }

    #[test]
    fn grouping_is_ignored_for_compatibility() {
        let grouped = DataSetType::grouped(DataUnitType::Basic(DataType::Float64));
        assert!(DataSetType::basic(DataType::Float64).accepts(&grouped));
        assert!(grouped.accepts(&DataSetType::basic(DataType::Float32)));
    }

    #[test]
    fn records_compare_by_schema() {
        let a = Schema::new(vec![Field::new("id", DataType::Int64, false)]);
        let b = Schema::new(vec![Field::new("id", DataType::Int64, true)]);
        let t = DataSetType::record(a.clone());
        assert!(t.accepts(&DataSetType::record(a)));
        assert!(!t.accepts(&DataSetType::record(b)));
    }
}
