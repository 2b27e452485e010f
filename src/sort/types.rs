//! Sort types
//!
//! `(field, direction)` pairs and the validated specification built from them.

use crate::error::{Error, Result};
use regex::Regex;
use serde::de::{self, MapAccess, SeqAccess, Visitor};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;

use super::signature::SortSignature;

/// Regex for sortable field names: `id`, `created_at`, `owner.name`
static FIELD_NAME_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[a-zA-Z_][a-zA-Z0-9_]*(?:\.[a-zA-Z_][a-zA-Z0-9_]*)*$")
        .expect("field name pattern is valid")
});

/// Check whether a field name can be used in a sort specification
pub fn is_valid_field_name(field: &str) -> bool {
    FIELD_NAME_REGEX.is_match(field)
}

// ============================================================================
// Sort Direction
// ============================================================================

/// Direction of a single sort key
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum SortDirection {
    /// Smallest values first
    #[default]
    Ascending,
    /// Largest values first
    Descending,
}

impl SortDirection {
    /// Short lowercase form used in signatures and configs
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Ascending => "asc",
            Self::Descending => "desc",
        }
    }

    /// SQL keyword for this direction
    pub fn as_sql(&self) -> &'static str {
        match self {
            Self::Ascending => "ASC",
            Self::Descending => "DESC",
        }
    }

    /// Check if this is ascending
    pub fn is_ascending(&self) -> bool {
        matches!(self, Self::Ascending)
    }
}

impl FromStr for SortDirection {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "asc" | "ascending" => Ok(Self::Ascending),
            "desc" | "descending" => Ok(Self::Descending),
            other => Err(Error::invalid_value(
                "direction",
                format!("expected 'asc' or 'desc', got '{other}'"),
            )),
        }
    }
}

impl fmt::Display for SortDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_sql())
    }
}

impl Serialize for SortDirection {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for SortDirection {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(de::Error::custom)
    }
}

// ============================================================================
// Sort Order
// ============================================================================

/// A single `(field, direction)` sort key
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SortOrder {
    /// Field to sort by
    pub field: String,
    /// Sort direction
    #[serde(default)]
    pub direction: SortDirection,
}

impl SortOrder {
    /// Create a sort key
    pub fn new(field: impl Into<String>, direction: SortDirection) -> Self {
        Self {
            field: field.into(),
            direction,
        }
    }

    /// Create an ascending sort key
    pub fn asc(field: impl Into<String>) -> Self {
        Self::new(field, SortDirection::Ascending)
    }

    /// Create a descending sort key
    pub fn desc(field: impl Into<String>) -> Self {
        Self::new(field, SortDirection::Descending)
    }
}

impl fmt::Display for SortOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.field, self.direction)
    }
}

// ============================================================================
// Sort Specification
// ============================================================================

/// Ordered, non-empty list of sort keys
///
/// Construction validates that the list is non-empty, that every field name
/// is a plain identifier path, and that no field appears twice. Once built the
/// specification cannot be modified.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SortSpecification {
    orders: Vec<SortOrder>,
}

impl SortSpecification {
    /// Create a validated sort specification
    pub fn new(orders: Vec<SortOrder>) -> Result<Self> {
        if orders.is_empty() {
            return Err(Error::config(
                "sort specification cannot be empty; paged reads need a deterministic order",
            ));
        }

        for (i, order) in orders.iter().enumerate() {
            if !is_valid_field_name(&order.field) {
                return Err(Error::invalid_value(
                    "sort",
                    format!("invalid field name '{}'", order.field),
                ));
            }
            if orders[..i].iter().any(|o| o.field == order.field) {
                return Err(Error::invalid_value(
                    "sort",
                    format!("field '{}' appears more than once", order.field),
                ));
            }
        }

        Ok(Self { orders })
    }

    /// Single ascending key
    pub fn ascending(field: impl Into<String>) -> Result<Self> {
        Self::new(vec![SortOrder::asc(field)])
    }

    /// Single descending key
    pub fn descending(field: impl Into<String>) -> Result<Self> {
        Self::new(vec![SortOrder::desc(field)])
    }

    /// Build from `(field, direction)` pairs
    pub fn from_pairs<I, S>(pairs: I) -> Result<Self>
    where
        I: IntoIterator<Item = (S, SortDirection)>,
        S: Into<String>,
    {
        Self::new(
            pairs
                .into_iter()
                .map(|(field, direction)| SortOrder::new(field, direction))
                .collect(),
        )
    }

    /// Sort keys in priority order
    pub fn orders(&self) -> &[SortOrder] {
        &self.orders
    }

    /// Number of sort keys
    pub fn len(&self) -> usize {
        self.orders.len()
    }

    /// Always false for a constructed specification
    pub fn is_empty(&self) -> bool {
        self.orders.is_empty()
    }

    /// Iterate over the sort keys
    pub fn iter(&self) -> std::slice::Iter<'_, SortOrder> {
        self.orders.iter()
    }

    /// Canonical rendering used for signatures: `id:asc|name:desc`
    pub fn canonical(&self) -> String {
        self.orders
            .iter()
            .map(|o| format!("{}:{}", o.field, o.direction.as_str()))
            .collect::<Vec<_>>()
            .join("|")
    }

    /// Checksum of the canonical rendering
    pub fn signature(&self) -> SortSignature {
        SortSignature::of(self)
    }
}

impl fmt::Display for SortSpecification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let rendered = self
            .orders
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(", ");
        f.write_str(&rendered)
    }
}

impl<'a> IntoIterator for &'a SortSpecification {
    type Item = &'a SortOrder;
    type IntoIter = std::slice::Iter<'a, SortOrder>;

    fn into_iter(self) -> Self::IntoIter {
        self.orders.iter()
    }
}

impl Serialize for SortSpecification {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        self.orders.serialize(serializer)
    }
}

/// Accepts either a list of `{field, direction}` entries or a map of
/// `field: direction` entries (map entries keep document order).
impl<'de> Deserialize<'de> for SortSpecification {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        struct SortVisitor;

        impl<'de> Visitor<'de> for SortVisitor {
            type Value = Vec<SortOrder>;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a list of {field, direction} entries or a map of field: direction")
            }

            fn visit_seq<A: SeqAccess<'de>>(
                self,
                mut seq: A,
            ) -> std::result::Result<Self::Value, A::Error> {
                let mut orders = Vec::new();
                while let Some(order) = seq.next_element::<SortOrder>()? {
                    orders.push(order);
                }
                Ok(orders)
            }

            fn visit_map<A: MapAccess<'de>>(
                self,
                mut map: A,
            ) -> std::result::Result<Self::Value, A::Error> {
                let mut orders = Vec::new();
                while let Some((field, direction)) = map.next_entry::<String, SortDirection>()? {
                    orders.push(SortOrder::new(field, direction));
                }
                Ok(orders)
            }
        }

        let orders = deserializer.deserialize_any(SortVisitor)?;
        SortSpecification::new(orders).map_err(de::Error::custom)
    }
}
