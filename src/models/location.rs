use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use crate::utils::{is_hex_color, is_valid_latitude, is_valid_longitude};

/// 名称最大长度，与数据库 VARCHAR(100) 一致
pub const MAX_NAME_LEN: usize = 100;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct Location {
    pub id: i64,
    pub name: String,
    pub latitude: f64,
    pub longitude: f64,
    pub color: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize)]
pub struct LocationRequest {
    pub name: String,
    pub latitude: f64,
    pub longitude: f64,
    pub color: String,
}

/// 已通过校验的地点数据，存储层只接受这个类型
#[derive(Debug, Clone, PartialEq)]
pub struct NewLocation {
    pub(crate) name: String,
    pub(crate) latitude: f64,
    pub(crate) longitude: f64,
    pub(crate) color: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldError {
    pub field: &'static str,
    pub rule: &'static str,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationErrors(pub Vec<FieldError>);

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for error in &self.0 {
            write!(f, "{}: {}; ", error.field, error.rule)?;
        }
        Ok(())
    }
}

impl std::error::Error for ValidationErrors {}

impl NewLocation {
    pub fn new(
        name: impl Into<String>,
        latitude: f64,
        longitude: f64,
        color: impl Into<String>,
    ) -> Result<Self, ValidationErrors> {
        let name = name.into().trim().to_string();
        let color = color.into();
        let mut errors = Vec::new();

        if name.is_empty() {
            errors.push(FieldError { field: "name", rule: "required" });
        } else if name.chars().count() > MAX_NAME_LEN {
            errors.push(FieldError { field: "name", rule: "max" });
        }
        if !is_valid_latitude(latitude) {
            errors.push(FieldError { field: "latitude", rule: "range" });
        }
        if !is_valid_longitude(longitude) {
            errors.push(FieldError { field: "longitude", rule: "range" });
        }
        if !is_hex_color(&color) {
            errors.push(FieldError { field: "color", rule: "hexcolor" });
        }

        if errors.is_empty() {
            Ok(Self { name, latitude, longitude, color })
        } else {
            Err(ValidationErrors(errors))
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn latitude(&self) -> f64 {
        self.latitude
    }

    pub fn longitude(&self) -> f64 {
        self.longitude
    }

    pub fn color(&self) -> &str {
        &self.color
    }
}

impl TryFrom<LocationRequest> for NewLocation {
    type Error = ValidationErrors;

    fn try_from(req: LocationRequest) -> Result<Self, Self::Error> {
        NewLocation::new(req.name, req.latitude, req.longitude, req.color)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn valid_request_is_accepted_and_trimmed() {
        let loc = NewLocation::new("  Galata  ", 41.0256, 28.9741, "#ff0000").unwrap();
        assert_eq!(loc.name(), "Galata");
        assert_eq!(loc.color(), "#ff0000");
    }

    #[test]
    fn zero_coordinates_are_valid() {
        assert!(NewLocation::new("Null Island", 0.0, 0.0, "#000").is_ok());
    }

    #[test]
    fn every_invalid_field_is_reported() {
        let err = NewLocation::new("", 91.0, -181.0, "red").unwrap_err();
        let fields: Vec<_> = err.0.iter().map(|e| e.field).collect();
        assert_eq!(fields, vec!["name", "latitude", "longitude", "color"]);
        assert_eq!(
            err.to_string(),
            "name: required; latitude: range; longitude: range; color: hexcolor; "
        );
    }

    #[test]
    fn overlong_name_is_rejected() {
        let name = "x".repeat(MAX_NAME_LEN + 1);
        let err = NewLocation::new(name, 0.0, 0.0, "#abc").unwrap_err();
        assert_eq!(err.0, vec![FieldError { field: "name", rule: "max" }]);
    }

    #[test]
    fn location_serializes_with_wire_field_names() {
        let now = Utc::now();
        let loc = Location {
            id: 7,
            name: "A".into(),
            latitude: 1.5,
            longitude: -2.5,
            color: "#abc".into(),
            created_at: now,
            updated_at: now,
        };
        let value = serde_json::to_value(&loc).unwrap();
        for field in ["id", "name", "latitude", "longitude", "color", "created_at", "updated_at"] {
            assert!(value.get(field).is_some(), "missing {field}");
        }
    }
}
