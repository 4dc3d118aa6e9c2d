//! Declared input schema for trip records.
//!
//! Nothing about the input is inferred: each required role has a column name
//! and a semantic type, and the loader checks the header against it.

use serde::Deserialize;
use std::collections::HashMap;
use std::path::Path;

use crate::error::{EtlError, Result};

/// Semantic type of a declared input column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnType {
    Integer,
    Float,
    Timestamp,
}

/// The six columns every trip source must provide.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Role {
    VendorId,
    Pickup,
    Dropoff,
    PassengerCount,
    TripDistance,
    TotalAmount,
}

impl Role {
    pub const ALL: [Role; 6] = [
        Role::VendorId,
        Role::Pickup,
        Role::Dropoff,
        Role::PassengerCount,
        Role::TripDistance,
        Role::TotalAmount,
    ];

    /// Key used for this role in schema override files.
    pub fn key(self) -> &'static str {
        match self {
            Role::VendorId => "vendor_id",
            Role::Pickup => "pickup",
            Role::Dropoff => "dropoff",
            Role::PassengerCount => "passenger_count",
            Role::TripDistance => "trip_distance",
            Role::TotalAmount => "total_amount",
        }
    }

    pub fn column_type(self) -> ColumnType {
        match self {
            Role::VendorId | Role::PassengerCount => ColumnType::Integer,
            Role::Pickup | Role::Dropoff => ColumnType::Timestamp,
            Role::TripDistance | Role::TotalAmount => ColumnType::Float,
        }
    }

    fn default_column(self) -> &'static str {
        match self {
            Role::VendorId => "VendorID",
            Role::Pickup => "tpep_pickup_datetime",
            Role::Dropoff => "tpep_dropoff_datetime",
            Role::PassengerCount => "passenger_count",
            Role::TripDistance => "trip_distance",
            Role::TotalAmount => "total_amount",
        }
    }

    fn from_key(key: &str) -> Option<Role> {
        Role::ALL.into_iter().find(|r| r.key() == key)
    }
}

/// A declared column: header name plus semantic type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnSpec {
    pub name: String,
    pub ty: ColumnType,
}

/// Maps each [`Role`] to the header column that carries it.
///
/// Defaults follow the yellow-taxi trip record layout. Other layouts can be
/// described with a JSON override file:
/// ```json
/// {
///   "pickup": "lpep_pickup_datetime",
///   "dropoff": "lpep_dropoff_datetime"
/// }
/// ```
#[derive(Debug, Clone)]
pub struct TripSchema {
    columns: HashMap<Role, ColumnSpec>,
}

impl Default for TripSchema {
    fn default() -> Self {
        let columns = Role::ALL
            .into_iter()
            .map(|role| {
                (
                    role,
                    ColumnSpec {
                        name: role.default_column().to_string(),
                        ty: role.column_type(),
                    },
                )
            })
            .collect();
        Self { columns }
    }
}

#[derive(Deserialize)]
#[serde(transparent)]
struct SchemaOverrides(HashMap<String, String>);

impl TripSchema {
    /// Loads column-name overrides from a JSON file at `path`.
    ///
    /// Roles not mentioned keep their default column name.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| EtlError::io(path, e))?;
        Self::from_json(&content)
    }

    pub fn from_json(content: &str) -> Result<Self> {
        let SchemaOverrides(entries) = serde_json::from_str(content)?;
        let mut schema = Self::default();
        for (key, column) in entries {
            let role = Role::from_key(&key).ok_or_else(|| {
                EtlError::InvalidConfig(format!("unknown schema role '{key}'"))
            })?;
            schema.set_column(role, column);
        }
        Ok(schema)
    }

    fn set_column(&mut self, role: Role, name: impl Into<String>) {
        self.columns.insert(
            role,
            ColumnSpec {
                name: name.into(),
                ty: role.column_type(),
            },
        );
    }

    pub fn column(&self, role: Role) -> &ColumnSpec {
        &self.columns[&role]
    }

    /// Iterates over all `(role, column)` pairs in role order.
    pub fn iter(&self) -> impl Iterator<Item = (Role, &ColumnSpec)> {
        Role::ALL.into_iter().map(|role| (role, self.column(role)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_schema_uses_yellow_taxi_names() {
        let schema = TripSchema::default();
        assert_eq!(schema.column(Role::Pickup).name, "tpep_pickup_datetime");
        assert_eq!(schema.column(Role::VendorId).ty, ColumnType::Integer);
        assert_eq!(schema.column(Role::TotalAmount).ty, ColumnType::Float);
        assert_eq!(schema.iter().count(), 6);
    }

    #[test]
    fn test_overrides_keep_unmentioned_defaults() {
        let schema = TripSchema::from_json(r#"{"pickup": "lpep_pickup_datetime"}"#).unwrap();
        assert_eq!(schema.column(Role::Pickup).name, "lpep_pickup_datetime");
        assert_eq!(schema.column(Role::Pickup).ty, ColumnType::Timestamp);
        assert_eq!(schema.column(Role::Dropoff).name, "tpep_dropoff_datetime");
    }

    #[test]
    fn test_unknown_role_is_rejected() {
        let err = TripSchema::from_json(r#"{"fare": "fare_amount"}"#).unwrap_err();
        assert!(matches!(err, EtlError::InvalidConfig(_)));
    }
}
