//! Filter and sort options for position queries.

use std::str::FromStr;

use thiserror::Error;

/// Sortable columns of the position table.
///
/// Wire names are the lowercase forms accepted by the request surface
/// (`sort=id|latitude|longitude|isinsidepolygon|exittime`).
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub enum SortField {
    #[default]
    Id,
    Latitude,
    Longitude,
    IsInsidePolygon,
    ExitTime,
}

impl SortField {
    /// The SQL column this field maps to.  A closed enum, so sort input can
    /// never reach the SQL text unescaped.
    pub(crate) fn column(self) -> &'static str {
        match self {
            SortField::Id => "id",
            SortField::Latitude => "latitude",
            SortField::Longitude => "longitude",
            SortField::IsInsidePolygon => "is_inside_polygon",
            SortField::ExitTime => "exit_time",
        }
    }

    /// The name used in query strings.
    pub fn wire_name(self) -> &'static str {
        match self {
            SortField::Id => "id",
            SortField::Latitude => "latitude",
            SortField::Longitude => "longitude",
            SortField::IsInsidePolygon => "isinsidepolygon",
            SortField::ExitTime => "exittime",
        }
    }
}

/// Raised for a sort name outside the whitelist.
#[derive(Debug, Error)]
#[error("unknown sort field: {0}")]
pub struct UnknownSortField(pub String);

impl FromStr for SortField {
    type Err = UnknownSortField;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "id" => Ok(SortField::Id),
            "latitude" => Ok(SortField::Latitude),
            "longitude" => Ok(SortField::Longitude),
            "isinsidepolygon" => Ok(SortField::IsInsidePolygon),
            "exittime" => Ok(SortField::ExitTime),
            other => Err(UnknownSortField(other.to_string())),
        }
    }
}

/// Options for [`PositionStore::query`][crate::PositionStore::query].
///
/// The default is the unfiltered listing in id-ascending order.
///
/// ```rust,ignore
/// let opts = QueryOptions::default().inside(true).sort(SortField::Latitude).descending();
/// ```
#[derive(Clone, Debug, PartialEq)]
pub struct QueryOptions {
    /// Keep only rows with this containment flag; `None` keeps all rows.
    pub inside: Option<bool>,
    pub sort: SortField,
    pub ascending: bool,
}

impl Default for QueryOptions {
    fn default() -> Self {
        Self {
            inside:    None,
            sort:      SortField::Id,
            ascending: true,
        }
    }
}

impl QueryOptions {
    pub fn inside(mut self, inside: bool) -> Self {
        self.inside = Some(inside);
        self
    }

    pub fn sort(mut self, field: SortField) -> Self {
        self.sort = field;
        self
    }

    pub fn descending(mut self) -> Self {
        self.ascending = false;
        self
    }
}
