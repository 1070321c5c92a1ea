//! Writable bean fields.
//!
//! Request bodies are free-form JSON objects. They are checked here against a
//! closed column allow-list before any SQL is built, so column names in
//! statements only ever come from [`Column::name`].

use crate::error::{BeanError, BeanResult};
use crate::models::{BeanClass, QueryParam};
use serde_json::{Map, Value};

/// Keys owned by the server. Ignored in request bodies.
const SERVER_CONTROLLED: [&str; 2] = ["created_at", "updated_at"];

/// A client-writable column of the `dry_beans` table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Column {
    Area,
    Perimeter,
    MajorAxisLength,
    MinorAxisLength,
    AspectRatio,
    Eccentricity,
    ConvexArea,
    EquivDiameter,
    Extent,
    Solidity,
    Roundness,
    Compactness,
    ShapeFactor1,
    ShapeFactor2,
    ShapeFactor3,
    ShapeFactor4,
    BeanClass,
}

impl Column {
    pub const ALL: [Column; 17] = [
        Column::Area,
        Column::Perimeter,
        Column::MajorAxisLength,
        Column::MinorAxisLength,
        Column::AspectRatio,
        Column::Eccentricity,
        Column::ConvexArea,
        Column::EquivDiameter,
        Column::Extent,
        Column::Solidity,
        Column::Roundness,
        Column::Compactness,
        Column::ShapeFactor1,
        Column::ShapeFactor2,
        Column::ShapeFactor3,
        Column::ShapeFactor4,
        Column::BeanClass,
    ];

    /// SQL column name.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Area => "area",
            Self::Perimeter => "perimeter",
            Self::MajorAxisLength => "major_axis_length",
            Self::MinorAxisLength => "minor_axis_length",
            Self::AspectRatio => "aspect_ratio",
            Self::Eccentricity => "eccentricity",
            Self::ConvexArea => "convex_area",
            Self::EquivDiameter => "equiv_diameter",
            Self::Extent => "extent",
            Self::Solidity => "solidity",
            Self::Roundness => "roundness",
            Self::Compactness => "compactness",
            Self::ShapeFactor1 => "shape_factor1",
            Self::ShapeFactor2 => "shape_factor2",
            Self::ShapeFactor3 => "shape_factor3",
            Self::ShapeFactor4 => "shape_factor4",
            Self::BeanClass => "bean_class",
        }
    }

    /// Look up a column by its exact SQL name.
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|c| c.name() == name)
    }

    pub fn is_numeric(&self) -> bool {
        !matches!(self, Self::BeanClass)
    }

    /// Coerce a JSON value into a bound parameter for this column.
    fn coerce(&self, value: &Value) -> BeanResult<QueryParam> {
        if self.is_numeric() {
            return coerce_number(self.name(), value).map(QueryParam::Float);
        }
        match value {
            Value::Null => Err(BeanError::validation("bean_class is required")),
            Value::String(s) => s
                .parse::<BeanClass>()
                .map(|class| QueryParam::Text(Some(class.as_str().to_string())))
                .map_err(|_| {
                    BeanError::validation(format!(
                        "bean_class must be one of: {}",
                        BeanClass::expected()
                    ))
                }),
            _ => Err(BeanError::validation("bean_class must be a string")),
        }
    }
}

impl std::fmt::Display for Column {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// JSON numbers and numeric strings are accepted; `null` clears the value.
fn coerce_number(field: &str, value: &Value) -> BeanResult<Option<f64>> {
    let invalid = || BeanError::validation(format!("{} must be a number", field));
    let number = match value {
        Value::Null => return Ok(None),
        Value::Number(n) => n.as_f64().ok_or_else(invalid)?,
        Value::String(s) => s.trim().parse::<f64>().map_err(|_| invalid())?,
        _ => return Err(invalid()),
    };
    if number.is_finite() {
        Ok(Some(number))
    } else {
        Err(invalid())
    }
}

/// Validated column/value pairs, ordered by column.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FieldSet {
    values: Vec<(Column, QueryParam)>,
}

impl FieldSet {
    pub fn iter(&self) -> impl Iterator<Item = &(Column, QueryParam)> {
        self.values.iter()
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn contains(&self, column: Column) -> bool {
        self.values.iter().any(|(c, _)| *c == column)
    }

    fn push(&mut self, column: Column, value: QueryParam) {
        self.values.push((column, value));
    }

    fn sort(&mut self) {
        self.values.sort_by_key(|(column, _)| *column);
    }
}

/// Payload of a create request.
#[derive(Debug, Clone, PartialEq)]
pub struct NewBean {
    /// Client-supplied identity, when given
    pub id: Option<i64>,
    fields: FieldSet,
}

impl NewBean {
    /// Validate a create body.
    ///
    /// `bean_class` is required. `id` may be supplied explicitly; `version` and
    /// the timestamps are ignored.
    pub fn from_json(body: &Map<String, Value>) -> BeanResult<Self> {
        let mut id = None;
        let mut fields = FieldSet::default();

        for (key, value) in body {
            match key.as_str() {
                "id" => id = parse_id(value)?,
                "version" => {}
                k if SERVER_CONTROLLED.contains(&k) => {}
                k => {
                    let column = Column::from_name(k)
                        .ok_or_else(|| BeanError::validation(format!("unknown field: {}", k)))?;
                    fields.push(column, column.coerce(value)?);
                }
            }
        }

        if !fields.contains(Column::BeanClass) {
            return Err(BeanError::validation("bean_class is required"));
        }
        fields.sort();

        Ok(Self { id, fields })
    }

    pub fn fields(&self) -> &FieldSet {
        &self.fields
    }
}

/// Payload of an update request.
#[derive(Debug, Clone, PartialEq)]
pub struct BeanPatch {
    /// Version the client last saw; the update only applies if it still matches
    pub expected_version: Option<i64>,
    fields: FieldSet,
}

impl BeanPatch {
    /// Validate an update body.
    ///
    /// `id` and the timestamps are ignored, `version` is the expected current
    /// version. At least one writable field is required.
    pub fn from_json(body: &Map<String, Value>) -> BeanResult<Self> {
        let mut expected_version = None;
        let mut fields = FieldSet::default();

        for (key, value) in body {
            match key.as_str() {
                "id" => {}
                "version" => expected_version = parse_version(value)?,
                k if SERVER_CONTROLLED.contains(&k) => {}
                k => {
                    let column = Column::from_name(k)
                        .ok_or_else(|| BeanError::validation(format!("unknown field: {}", k)))?;
                    fields.push(column, column.coerce(value)?);
                }
            }
        }

        if fields.is_empty() {
            return Err(BeanError::validation("No fields to update"));
        }
        fields.sort();

        Ok(Self {
            expected_version,
            fields,
        })
    }

    pub fn fields(&self) -> &FieldSet {
        &self.fields
    }
}

fn parse_id(value: &Value) -> BeanResult<Option<i64>> {
    match value {
        Value::Null => Ok(None),
        Value::Number(n) => match n.as_i64() {
            Some(id) if id > 0 => Ok(Some(id)),
            _ => Err(BeanError::validation("id must be a positive integer")),
        },
        _ => Err(BeanError::validation("id must be a positive integer")),
    }
}

fn parse_version(value: &Value) -> BeanResult<Option<i64>> {
    match value {
        Value::Null => Ok(None),
        Value::Number(n) => match n.as_i64() {
            Some(v) if v > 0 => Ok(Some(v)),
            _ => Err(BeanError::validation("version must be a positive integer")),
        },
        _ => Err(BeanError::validation("version must be a positive integer")),
    }
}
