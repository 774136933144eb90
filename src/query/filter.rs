//! Turns the flat, untrusted search-parameter map into a typed
//! [`CompiledQuery`]. Compilation is pure and deterministic: the same
//! parameters produce the same query regardless of the order they arrive in,
//! which is what makes the cache key derivation in [`crate::query::key`]
//! sound.

use serde::Serialize;
use std::collections::{BTreeMap, HashMap};
use std::str::FromStr;
use thiserror::Error;

use crate::models::listing::{Category, Furnishing, ListedBy, ListingKind, split_pipe_list};

pub const DEFAULT_PAGE: u64 = 1;
pub const DEFAULT_LIMIT: u64 = 10;

#[derive(Debug, Error)]
pub enum CompileError {
    #[error("parameter '{param}' must be a number, got '{value}'")]
    InvalidNumber { param: &'static str, value: String },

    #[error("parameter '{param}' has invalid value '{value}': {reason}")]
    InvalidValue {
        param: &'static str,
        value: String,
        reason: String,
    },

    #[error("unsupported sort field '{0}'")]
    UnknownSortField(String),
}

/// Listing fields a predicate constraint can target.
///
/// Variants are declared in lexicographic order of their wire names so that
/// `BTreeMap<FilterField, _>` iterates in the order the cache key encoder
/// documents (asserted by a test below).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum FilterField {
    Area,
    AvailableFrom,
    Bathrooms,
    Bedrooms,
    Category,
    City,
    Furnished,
    ListedBy,
    ListingType,
    Price,
    Rating,
    State,
    Tags,
    Text,
    Verified,
}

impl FilterField {
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Area => "area",
            Self::AvailableFrom => "available_from",
            Self::Bathrooms => "bathrooms",
            Self::Bedrooms => "bedrooms",
            Self::Category => "category",
            Self::City => "city",
            Self::Furnished => "furnished",
            Self::ListedBy => "listed_by",
            Self::ListingType => "listing_type",
            Self::Price => "price",
            Self::Rating => "rating",
            Self::State => "state",
            Self::Tags => "tags",
            Self::Text => "text",
            Self::Verified => "verified",
        }
    }
}

/// One constraint over a single listing field. Constraints across fields
/// combine with implicit AND at the store gateway.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Constraint {
    /// Full-text search over the indexed text columns.
    Text(String),
    /// Exact match against a canonical enum string.
    EqStr(String),
    /// Exact match on an integer field.
    EqInt(i64),
    /// Exact match on a boolean field.
    EqBool(bool),
    /// Inclusive numeric range; at least one bound is present.
    Range { min: Option<f64>, max: Option<f64> },
    /// Inclusive numeric lower bound.
    Min(f64),
    /// Inclusive lower bound on an ISO-8601 date.
    MinDate(String),
    /// Case-insensitive substring match (value stored lowercased).
    ContainsCi(String),
    /// Matches when any tag overlaps, case-insensitive. Values are
    /// lowercased, sorted and deduplicated at compile time.
    AnyTagCi(Vec<String>),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum SortField {
    CreatedAt,
    UpdatedAt,
    Title,
    Price,
    Rating,
    AreaSqFt,
    Bedrooms,
    Bathrooms,
    AvailableFrom,
    State,
    City,
}

impl SortField {
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::CreatedAt => "createdAt",
            Self::UpdatedAt => "updatedAt",
            Self::Title => "title",
            Self::Price => "price",
            Self::Rating => "rating",
            Self::AreaSqFt => "areaSqFt",
            Self::Bedrooms => "bedrooms",
            Self::Bathrooms => "bathrooms",
            Self::AvailableFrom => "availableFrom",
            Self::State => "state",
            Self::City => "city",
        }
    }
}

impl FromStr for SortField {
    type Err = CompileError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "createdAt" => Ok(Self::CreatedAt),
            "updatedAt" => Ok(Self::UpdatedAt),
            "title" => Ok(Self::Title),
            "price" => Ok(Self::Price),
            "rating" => Ok(Self::Rating),
            "areaSqFt" => Ok(Self::AreaSqFt),
            "bedrooms" => Ok(Self::Bedrooms),
            "bathrooms" => Ok(Self::Bathrooms),
            "availableFrom" => Ok(Self::AvailableFrom),
            "state" => Ok(Self::State),
            "city" => Ok(Self::City),
            other => Err(CompileError::UnknownSortField(other.to_string())),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum SortDirection {
    Asc,
    Desc,
}

impl SortDirection {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Asc => "asc",
            Self::Desc => "desc",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SortSpec {
    pub field: SortField,
    pub direction: SortDirection,
}

impl Default for SortSpec {
    fn default() -> Self {
        Self {
            field: SortField::CreatedAt,
            direction: SortDirection::Desc,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PageWindow {
    /// 1-based page index.
    pub page: u64,
    pub limit: u64,
}

impl Default for PageWindow {
    fn default() -> Self {
        Self {
            page: DEFAULT_PAGE,
            limit: DEFAULT_LIMIT,
        }
    }
}

/// The validated, canonical combination of predicate, sort and pagination.
#[derive(Debug, Clone, PartialEq)]
pub struct CompiledQuery {
    pub predicate: BTreeMap<FilterField, Constraint>,
    pub sort: SortSpec,
    pub page: PageWindow,
}

/// Compile raw request parameters into a [`CompiledQuery`].
///
/// Unrecognized parameters are ignored. Empty or whitespace-only values are
/// treated as absent, mirroring how the HTTP layer hands through blank query
/// params. Numeric parameters that do not parse are rejected rather than
/// silently dropped, so a malformed request can never alias the cache key of
/// a well-formed one.
pub fn compile(params: &HashMap<String, String>) -> Result<CompiledQuery, CompileError> {
    let mut predicate = BTreeMap::new();

    if let Some(search) = present(params, "search") {
        predicate.insert(FilterField::Text, Constraint::Text(search.to_string()));
    }

    if let Some(range) = parse_range(params, "minPrice", "maxPrice")? {
        predicate.insert(FilterField::Price, range);
    }

    if let Some(raw) = present(params, "type") {
        let category = parse_enum::<Category>("type", raw)?;
        predicate.insert(FilterField::Category, Constraint::EqStr(category.as_str().to_string()));
    }

    if let Some(range) = parse_range(params, "minArea", "maxArea")? {
        predicate.insert(FilterField::Area, range);
    }

    if let Some(raw) = present(params, "bedrooms") {
        predicate.insert(FilterField::Bedrooms, Constraint::EqInt(parse_int("bedrooms", raw)?));
    }

    if let Some(raw) = present(params, "bathrooms") {
        predicate.insert(
            FilterField::Bathrooms,
            Constraint::EqInt(parse_int("bathrooms", raw)?),
        );
    }

    if let Some(raw) = present(params, "furnished") {
        let furnished = parse_enum::<Furnishing>("furnished", raw)?;
        predicate.insert(
            FilterField::Furnished,
            Constraint::EqStr(furnished.as_str().to_string()),
        );
    }

    if let Some(raw) = present(params, "state") {
        predicate.insert(FilterField::State, Constraint::ContainsCi(raw.to_lowercase()));
    }

    if let Some(raw) = present(params, "city") {
        predicate.insert(FilterField::City, Constraint::ContainsCi(raw.to_lowercase()));
    }

    if let Some(raw) = present(params, "listedBy") {
        let listed_by = parse_enum::<ListedBy>("listedBy", raw)?;
        predicate.insert(
            FilterField::ListedBy,
            Constraint::EqStr(listed_by.as_str().to_string()),
        );
    }

    if let Some(raw) = present(params, "listingType") {
        let kind = parse_enum::<ListingKind>("listingType", raw)?;
        predicate.insert(
            FilterField::ListingType,
            Constraint::EqStr(kind.as_str().to_string()),
        );
    }

    if let Some(raw) = present(params, "minRating") {
        predicate.insert(FilterField::Rating, Constraint::Min(parse_number("minRating", raw)?));
    }

    if let Some(raw) = present(params, "isVerified") {
        let value = match raw.to_ascii_lowercase().as_str() {
            "true" => true,
            "false" => false,
            _ => {
                return Err(CompileError::InvalidValue {
                    param: "isVerified",
                    value: raw.to_string(),
                    reason: "expected 'true' or 'false'".to_string(),
                });
            }
        };
        predicate.insert(FilterField::Verified, Constraint::EqBool(value));
    }

    if let Some(raw) = present(params, "tags") {
        let mut tags: Vec<String> = split_pipe_list(raw)
            .into_iter()
            .map(|t| t.to_lowercase())
            .collect();
        tags.sort();
        tags.dedup();
        if !tags.is_empty() {
            predicate.insert(FilterField::Tags, Constraint::AnyTagCi(tags));
        }
    }

    if let Some(raw) = present(params, "availableFrom") {
        if chrono::NaiveDate::parse_from_str(raw, "%Y-%m-%d").is_err() {
            return Err(CompileError::InvalidValue {
                param: "availableFrom",
                value: raw.to_string(),
                reason: "expected an ISO-8601 date (YYYY-MM-DD)".to_string(),
            });
        }
        predicate.insert(FilterField::AvailableFrom, Constraint::MinDate(raw.to_string()));
    }

    let sort = SortSpec {
        field: present(params, "sortBy").map_or(Ok(SortField::CreatedAt), str::parse)?,
        direction: match present(params, "sortOrder") {
            Some("asc") => SortDirection::Asc,
            _ => SortDirection::Desc,
        },
    };

    let page = PageWindow {
        page: parse_window("page", params, DEFAULT_PAGE)?,
        limit: parse_window("limit", params, DEFAULT_LIMIT)?,
    };

    Ok(CompiledQuery {
        predicate,
        sort,
        page,
    })
}

fn present<'a>(params: &'a HashMap<String, String>, key: &str) -> Option<&'a str> {
    params.get(key).map(String::as_str).map(str::trim).filter(|s| !s.is_empty())
}

fn parse_number(param: &'static str, raw: &str) -> Result<f64, CompileError> {
    let value: f64 = raw.parse().map_err(|_| CompileError::InvalidNumber {
        param,
        value: raw.to_string(),
    })?;
    if !value.is_finite() {
        return Err(CompileError::InvalidNumber {
            param,
            value: raw.to_string(),
        });
    }
    Ok(value)
}

fn parse_int(param: &'static str, raw: &str) -> Result<i64, CompileError> {
    raw.parse().map_err(|_| CompileError::InvalidNumber {
        param,
        value: raw.to_string(),
    })
}

fn parse_range(
    params: &HashMap<String, String>,
    min_param: &'static str,
    max_param: &'static str,
) -> Result<Option<Constraint>, CompileError> {
    let min = present(params, min_param)
        .map(|raw| parse_number(min_param, raw))
        .transpose()?;
    let max = present(params, max_param)
        .map(|raw| parse_number(max_param, raw))
        .transpose()?;

    if min.is_none() && max.is_none() {
        return Ok(None);
    }
    Ok(Some(Constraint::Range { min, max }))
}

fn parse_enum<T>(param: &'static str, raw: &str) -> Result<T, CompileError>
where
    T: FromStr<Err = String>,
{
    raw.parse().map_err(|reason| CompileError::InvalidValue {
        param,
        value: raw.to_string(),
        reason,
    })
}

/// Pagination values are presentation-layer: non-numeric input is rejected,
/// but out-of-range values are clamped to the documented default.
fn parse_window(
    param: &'static str,
    params: &HashMap<String, String>,
    default: u64,
) -> Result<u64, CompileError> {
    let Some(raw) = present(params, param) else {
        return Ok(default);
    };
    let value: i64 = raw.parse().map_err(|_| CompileError::InvalidNumber {
        param,
        value: raw.to_string(),
    })?;
    if value < 1 {
        return Ok(default);
    }
    Ok(u64::try_from(value).unwrap_or(default))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect()
    }

    #[test]
    fn test_field_order_matches_name_order() {
        let fields = [
            FilterField::Area,
            FilterField::AvailableFrom,
            FilterField::Bathrooms,
            FilterField::Bedrooms,
            FilterField::Category,
            FilterField::City,
            FilterField::Furnished,
            FilterField::ListedBy,
            FilterField::ListingType,
            FilterField::Price,
            FilterField::Rating,
            FilterField::State,
            FilterField::Tags,
            FilterField::Text,
            FilterField::Verified,
        ];
        for pair in fields.windows(2) {
            assert!(pair[0] < pair[1]);
            assert!(pair[0].name() < pair[1].name());
        }
    }

    #[test]
    fn test_defaults_for_empty_input() {
        let query = compile(&HashMap::new()).unwrap();
        assert!(query.predicate.is_empty());
        assert_eq!(query.sort, SortSpec::default());
        assert_eq!(query.page, PageWindow { page: 1, limit: 10 });
    }

    #[test]
    fn test_compilation_is_order_independent() {
        let a = compile(&params(&[
            ("minPrice", "100000"),
            ("maxPrice", "500000"),
            ("type", "Apartment"),
            ("city", "Pune"),
        ]))
        .unwrap();
        let b = compile(&params(&[
            ("city", "Pune"),
            ("type", "Apartment"),
            ("maxPrice", "500000"),
            ("minPrice", "100000"),
        ]))
        .unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_unrecognized_params_are_ignored() {
        let query = compile(&params(&[("utm_source", "mail"), ("city", "Pune")])).unwrap();
        assert_eq!(query.predicate.len(), 1);
        assert!(query.predicate.contains_key(&FilterField::City));
    }

    #[test]
    fn test_bad_numbers_are_rejected() {
        assert!(matches!(
            compile(&params(&[("minPrice", "cheap")])),
            Err(CompileError::InvalidNumber { param: "minPrice", .. })
        ));
        assert!(matches!(
            compile(&params(&[("bedrooms", "two")])),
            Err(CompileError::InvalidNumber { param: "bedrooms", .. })
        ));
        assert!(matches!(
            compile(&params(&[("minRating", "NaN")])),
            Err(CompileError::InvalidNumber { param: "minRating", .. })
        ));
    }

    #[test]
    fn test_bad_enum_values_are_rejected() {
        assert!(compile(&params(&[("type", "Castle")])).is_err());
        assert!(compile(&params(&[("furnished", "partially")])).is_err());
        assert!(compile(&params(&[("listedBy", "Landlord")])).is_err());
        assert!(compile(&params(&[("listingType", "lease")])).is_err());
        assert!(compile(&params(&[("isVerified", "yes")])).is_err());
        assert!(compile(&params(&[("availableFrom", "soon")])).is_err());
    }

    #[test]
    fn test_pagination_clamps_but_rejects_garbage() {
        let query = compile(&params(&[("page", "0"), ("limit", "-5")])).unwrap();
        assert_eq!(query.page, PageWindow { page: 1, limit: 10 });

        let query = compile(&params(&[("page", "3"), ("limit", "25")])).unwrap();
        assert_eq!(query.page, PageWindow { page: 3, limit: 25 });

        assert!(compile(&params(&[("page", "first")])).is_err());
    }

    #[test]
    fn test_sort_parsing() {
        let query = compile(&params(&[("sortBy", "price"), ("sortOrder", "asc")])).unwrap();
        assert_eq!(query.sort.field, SortField::Price);
        assert_eq!(query.sort.direction, SortDirection::Asc);

        // Anything other than "asc" sorts descending.
        let query = compile(&params(&[("sortBy", "rating"), ("sortOrder", "upwards")])).unwrap();
        assert_eq!(query.sort.direction, SortDirection::Desc);

        assert!(matches!(
            compile(&params(&[("sortBy", "shoeSize")])),
            Err(CompileError::UnknownSortField(_))
        ));
    }

    #[test]
    fn test_tags_are_normalized() {
        let a = compile(&params(&[("tags", "Pool|gym")])).unwrap();
        let b = compile(&params(&[("tags", "GYM|pool")])).unwrap();
        assert_eq!(a.predicate, b.predicate);
        assert_eq!(
            a.predicate.get(&FilterField::Tags),
            Some(&Constraint::AnyTagCi(vec!["gym".to_string(), "pool".to_string()]))
        );

        // Only delimiters, no usable tags.
        let query = compile(&params(&[("tags", "||")])).unwrap();
        assert!(!query.predicate.contains_key(&FilterField::Tags));
    }

    #[test]
    fn test_location_match_is_case_normalized() {
        let a = compile(&params(&[("state", "Maharashtra")])).unwrap();
        let b = compile(&params(&[("state", "maharashtra")])).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_half_open_ranges() {
        let query = compile(&params(&[("minArea", "800")])).unwrap();
        assert_eq!(
            query.predicate.get(&FilterField::Area),
            Some(&Constraint::Range { min: Some(800.0), max: None })
        );
    }
}
