use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

pub const LIST_DELIMITER: char = '|';

/// Split a pipe-delimited amenity/tag string, dropping empty segments.
#[must_use]
pub fn split_pipe_list(raw: &str) -> Vec<String> {
    raw.split(LIST_DELIMITER)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(ToString::to_string)
        .collect()
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Listing {
    pub id: String,
    pub title: String,
    #[serde(rename = "type")]
    pub category: Category,
    pub price: f64,
    pub state: String,
    pub city: String,
    pub area_sq_ft: f64,
    pub bedrooms: i32,
    pub bathrooms: i32,
    /// Pipe-delimited, at least one entry.
    pub amenities: String,
    pub furnished: Furnishing,
    /// ISO-8601 date (YYYY-MM-DD).
    pub available_from: String,
    pub listed_by: ListedBy,
    /// Pipe-delimited, at least one entry.
    pub tags: String,
    pub color_theme: String,
    pub rating: f32,
    pub is_verified: bool,
    pub listing_type: ListingKind,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Category {
    Bungalow,
    Apartment,
    Villa,
    House,
    Plot,
}

impl Category {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Bungalow => "Bungalow",
            Self::Apartment => "Apartment",
            Self::Villa => "Villa",
            Self::House => "House",
            Self::Plot => "Plot",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Category {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Bungalow" => Ok(Self::Bungalow),
            "Apartment" => Ok(Self::Apartment),
            "Villa" => Ok(Self::Villa),
            "House" => Ok(Self::House),
            "Plot" => Ok(Self::Plot),
            other => Err(format!("unknown property type: {other}")),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Furnishing {
    Furnished,
    Unfurnished,
    Semi,
}

impl Furnishing {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Furnished => "Furnished",
            Self::Unfurnished => "Unfurnished",
            Self::Semi => "Semi",
        }
    }
}

impl fmt::Display for Furnishing {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Furnishing {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Furnished" => Ok(Self::Furnished),
            "Unfurnished" => Ok(Self::Unfurnished),
            "Semi" => Ok(Self::Semi),
            other => Err(format!("unknown furnishing state: {other}")),
        }
    }
}

/// Role of the identity that published a listing. Also used as the caller
/// role on the authenticated side: a mutation is allowed only when the two
/// match.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ListedBy {
    Builder,
    Owner,
    Agent,
}

impl ListedBy {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Builder => "Builder",
            Self::Owner => "Owner",
            Self::Agent => "Agent",
        }
    }
}

impl fmt::Display for ListedBy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ListedBy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Builder" => Ok(Self::Builder),
            "Owner" => Ok(Self::Owner),
            "Agent" => Ok(Self::Agent),
            other => Err(format!("unknown listing source role: {other}")),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ListingKind {
    Rent,
    Sale,
}

impl ListingKind {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Rent => "rent",
            Self::Sale => "sale",
        }
    }
}

impl fmt::Display for ListingKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ListingKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "rent" => Ok(Self::Rent),
            "sale" => Ok(Self::Sale),
            other => Err(format!("unknown listing kind: {other}")),
        }
    }
}

/// Partial update applied by PATCH. The listing source role is deliberately
/// absent: ownership cannot be transferred through a patch.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListingPatch {
    pub title: Option<String>,
    #[serde(rename = "type")]
    pub category: Option<Category>,
    pub price: Option<f64>,
    pub state: Option<String>,
    pub city: Option<String>,
    pub area_sq_ft: Option<f64>,
    pub bedrooms: Option<i32>,
    pub bathrooms: Option<i32>,
    pub amenities: Option<String>,
    pub furnished: Option<Furnishing>,
    pub available_from: Option<String>,
    pub tags: Option<String>,
    pub color_theme: Option<String>,
    pub rating: Option<f32>,
    pub is_verified: Option<bool>,
    pub listing_type: Option<ListingKind>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_pipe_list() {
        assert_eq!(split_pipe_list("pool|gym"), vec!["pool", "gym"]);
        assert_eq!(split_pipe_list("garden"), vec!["garden"]);
        assert_eq!(split_pipe_list("|"), Vec::<String>::new());
        assert_eq!(split_pipe_list(" pool | gym "), vec!["pool", "gym"]);
    }

    #[test]
    fn test_enum_round_trips() {
        assert_eq!("Apartment".parse::<Category>().unwrap(), Category::Apartment);
        assert_eq!(Category::Apartment.as_str(), "Apartment");
        assert!("Castle".parse::<Category>().is_err());

        assert_eq!("Semi".parse::<Furnishing>().unwrap(), Furnishing::Semi);
        assert_eq!("Agent".parse::<ListedBy>().unwrap(), ListedBy::Agent);
        assert_eq!("rent".parse::<ListingKind>().unwrap(), ListingKind::Rent);
        assert!("lease".parse::<ListingKind>().is_err());
    }
}
