//! Bean record models.
//!
//! `Bean` mirrors one row of the `dry_beans` table. It decodes from both
//! PostgreSQL and SQLite rows through the generic `FromRow` derive.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use utoipa::ToSchema;

/// Classification label of a bean sample.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "UPPERCASE")]
pub enum BeanClass {
    Dermason,
    Sira,
    Seker,
    Horoz,
    Cali,
    Barbunya,
    Bombay,
}

impl BeanClass {
    pub const ALL: [BeanClass; 7] = [
        BeanClass::Dermason,
        BeanClass::Sira,
        BeanClass::Seker,
        BeanClass::Horoz,
        BeanClass::Cali,
        BeanClass::Barbunya,
        BeanClass::Bombay,
    ];

    /// Canonical (stored) spelling.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Dermason => "DERMASON",
            Self::Sira => "SIRA",
            Self::Seker => "SEKER",
            Self::Horoz => "HOROZ",
            Self::Cali => "CALI",
            Self::Barbunya => "BARBUNYA",
            Self::Bombay => "BOMBAY",
        }
    }

    /// Comma separated list of all labels, for error messages.
    pub fn expected() -> String {
        Self::ALL
            .iter()
            .map(BeanClass::as_str)
            .collect::<Vec<_>>()
            .join(", ")
    }
}

impl std::fmt::Display for BeanClass {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown bean class '{0}'")]
pub struct UnknownBeanClass(pub String);

/// Case-insensitive; surrounding whitespace is ignored.
impl FromStr for BeanClass {
    type Err = UnknownBeanClass;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        Self::ALL
            .into_iter()
            .find(|class| class.as_str().eq_ignore_ascii_case(trimmed))
            .ok_or_else(|| UnknownBeanClass(s.to_string()))
    }
}

impl TryFrom<String> for BeanClass {
    type Error = UnknownBeanClass;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

/// One dry bean observation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow, ToSchema)]
pub struct Bean {
    /// Server-assigned bean ID
    #[schema(read_only, example = 1)]
    pub id: i64,
    #[schema(example = 28395.0)]
    pub area: Option<f64>,
    #[schema(example = 610.291)]
    pub perimeter: Option<f64>,
    #[schema(example = 208.178)]
    pub major_axis_length: Option<f64>,
    #[schema(example = 173.889)]
    pub minor_axis_length: Option<f64>,
    #[schema(example = 1.197)]
    pub aspect_ratio: Option<f64>,
    #[schema(minimum = 0.0, maximum = 1.0, example = 0.55)]
    pub eccentricity: Option<f64>,
    #[schema(example = 28715.0)]
    pub convex_area: Option<f64>,
    #[schema(example = 190.141)]
    pub equiv_diameter: Option<f64>,
    #[schema(minimum = 0.0, maximum = 1.0, example = 0.764)]
    pub extent: Option<f64>,
    #[schema(minimum = 0.0, maximum = 1.0, example = 0.989)]
    pub solidity: Option<f64>,
    #[schema(minimum = 0.0, maximum = 1.0, example = 0.958)]
    pub roundness: Option<f64>,
    #[schema(minimum = 0.0, maximum = 1.0, example = 0.913)]
    pub compactness: Option<f64>,
    #[schema(example = 0.007)]
    pub shape_factor1: Option<f64>,
    #[schema(example = 0.003)]
    pub shape_factor2: Option<f64>,
    #[schema(example = 0.834)]
    pub shape_factor3: Option<f64>,
    #[schema(example = 0.999)]
    pub shape_factor4: Option<f64>,
    #[sqlx(try_from = "String")]
    pub bean_class: BeanClass,
    /// Incremented on every update; send it back on PUT to detect concurrent edits
    #[schema(read_only, example = 1)]
    pub version: i64,
    #[schema(read_only)]
    pub created_at: DateTime<Utc>,
    #[schema(read_only)]
    pub updated_at: DateTime<Utc>,
}

/// Reduced projection served by the root endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow, ToSchema)]
pub struct BeanSummary {
    pub id: i64,
    #[sqlx(try_from = "String")]
    pub bean_class: BeanClass,
}

/// Result of the connectivity probe.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow, ToSchema)]
pub struct DbProbe {
    /// Database server time
    pub time: DateTime<Utc>,
    /// Database size in bytes
    pub db_size: i64,
}

/// Per-class row count.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, sqlx::FromRow)]
pub struct ClassCount {
    pub bean_class: String,
    pub count: i64,
}

/// Dataset statistics logged at startup.
#[derive(Debug, Clone, Default, Serialize)]
pub struct BeanStats {
    pub total: i64,
    pub classes: Vec<ClassCount>,
}

impl BeanStats {
    /// Number of distinct classes present.
    pub fn distinct_classes(&self) -> usize {
        self.classes.len()
    }
}
