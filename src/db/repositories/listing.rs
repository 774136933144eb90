//! Listing store gateway: executes a [`CompiledQuery`] against the listings
//! table and provides the CRUD operations the mutation endpoints need.

use anyhow::Result;
use sea_orm::sea_query::{Condition, LikeExpr, SimpleExpr};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, Set,
};
use serde::{Deserialize, Serialize};

use crate::entities::{listings, prelude::*};
use crate::models::listing::{Listing, ListingPatch};
use crate::query::{CompiledQuery, Constraint, FilterField, SortDirection, SortField};

/// A predicate combination the gateway cannot execute. The compiler never
/// produces one, but the contract is to reject rather than return zero rows.
#[derive(Debug, thiserror::Error)]
#[error("constraint {constraint} is not valid for field {field}")]
pub struct PredicateMismatch {
    pub field: &'static str,
    pub constraint: &'static str,
}

/// One page of search results with exact pagination metadata.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ListingPage {
    pub listings: Vec<Listing>,
    pub total: u64,
    pub page: u64,
    pub total_pages: u64,
}

pub struct ListingRepository {
    conn: DatabaseConnection,
}

impl ListingRepository {
    #[must_use]
    pub const fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    fn map_model(model: listings::Model) -> Result<Listing> {
        Ok(Listing {
            id: model.id,
            title: model.title,
            category: model.category.parse().map_err(anyhow::Error::msg)?,
            price: model.price,
            state: model.state,
            city: model.city,
            area_sq_ft: model.area_sq_ft,
            bedrooms: model.bedrooms,
            bathrooms: model.bathrooms,
            amenities: model.amenities,
            furnished: model.furnished.parse().map_err(anyhow::Error::msg)?,
            available_from: model.available_from,
            listed_by: model.listed_by.parse().map_err(anyhow::Error::msg)?,
            tags: model.tags,
            color_theme: model.color_theme,
            rating: model.rating,
            is_verified: model.is_verified,
            listing_type: model.listing_type.parse().map_err(anyhow::Error::msg)?,
            created_at: model.created_at,
            updated_at: model.updated_at,
        })
    }

    /// Execute the compiled predicate (implicit AND across fields), sort with
    /// a stable id tie-break, and return one page plus the exact total.
    pub async fn search_page(&self, query: &CompiledQuery) -> Result<ListingPage> {
        let mut find = Listings::find().filter(Self::condition_for(query)?);

        let sort_column = Self::sort_column(query.sort.field);
        find = match query.sort.direction {
            SortDirection::Asc => find.order_by_asc(sort_column),
            SortDirection::Desc => find.order_by_desc(sort_column),
        };
        find = find.order_by_asc(listings::Column::Id);

        let paginator = find.paginate(&self.conn, query.page.limit);
        let totals = paginator.num_items_and_pages().await?;
        let rows = paginator.fetch_page(query.page.page - 1).await?;

        let listings = rows
            .into_iter()
            .map(Self::map_model)
            .collect::<Result<Vec<_>>>()?;

        Ok(ListingPage {
            listings,
            total: totals.number_of_items,
            page: query.page.page,
            total_pages: totals.number_of_pages,
        })
    }

    pub async fn get(&self, id: &str) -> Result<Option<Listing>> {
        let model = Listings::find_by_id(id).one(&self.conn).await?;
        model.map(Self::map_model).transpose()
    }

    pub async fn create(&self, listing: &Listing) -> Result<()> {
        let active_model = listings::ActiveModel {
            id: Set(listing.id.clone()),
            title: Set(listing.title.clone()),
            category: Set(listing.category.as_str().to_string()),
            price: Set(listing.price),
            state: Set(listing.state.clone()),
            city: Set(listing.city.clone()),
            area_sq_ft: Set(listing.area_sq_ft),
            bedrooms: Set(listing.bedrooms),
            bathrooms: Set(listing.bathrooms),
            amenities: Set(listing.amenities.clone()),
            furnished: Set(listing.furnished.as_str().to_string()),
            available_from: Set(listing.available_from.clone()),
            listed_by: Set(listing.listed_by.as_str().to_string()),
            tags: Set(listing.tags.clone()),
            color_theme: Set(listing.color_theme.clone()),
            rating: Set(listing.rating),
            is_verified: Set(listing.is_verified),
            listing_type: Set(listing.listing_type.as_str().to_string()),
            created_at: Set(listing.created_at.clone()),
            updated_at: Set(listing.updated_at.clone()),
        };

        Listings::insert(active_model).exec(&self.conn).await?;
        Ok(())
    }

    /// Apply a partial update. Returns the updated listing, or `None` when
    /// the id does not exist.
    pub async fn update(&self, id: &str, patch: &ListingPatch) -> Result<Option<Listing>> {
        let Some(model) = Listings::find_by_id(id).one(&self.conn).await? else {
            return Ok(None);
        };

        let mut active: listings::ActiveModel = model.into();
        if let Some(title) = &patch.title {
            active.title = Set(title.clone());
        }
        if let Some(category) = patch.category {
            active.category = Set(category.as_str().to_string());
        }
        if let Some(price) = patch.price {
            active.price = Set(price);
        }
        if let Some(state) = &patch.state {
            active.state = Set(state.clone());
        }
        if let Some(city) = &patch.city {
            active.city = Set(city.clone());
        }
        if let Some(area) = patch.area_sq_ft {
            active.area_sq_ft = Set(area);
        }
        if let Some(bedrooms) = patch.bedrooms {
            active.bedrooms = Set(bedrooms);
        }
        if let Some(bathrooms) = patch.bathrooms {
            active.bathrooms = Set(bathrooms);
        }
        if let Some(amenities) = &patch.amenities {
            active.amenities = Set(amenities.clone());
        }
        if let Some(furnished) = patch.furnished {
            active.furnished = Set(furnished.as_str().to_string());
        }
        if let Some(available_from) = &patch.available_from {
            active.available_from = Set(available_from.clone());
        }
        if let Some(tags) = &patch.tags {
            active.tags = Set(tags.clone());
        }
        if let Some(color_theme) = &patch.color_theme {
            active.color_theme = Set(color_theme.clone());
        }
        if let Some(rating) = patch.rating {
            active.rating = Set(rating);
        }
        if let Some(is_verified) = patch.is_verified {
            active.is_verified = Set(is_verified);
        }
        if let Some(listing_type) = patch.listing_type {
            active.listing_type = Set(listing_type.as_str().to_string());
        }
        active.updated_at = Set(chrono::Utc::now().to_rfc3339());

        let updated = active.update(&self.conn).await?;
        Self::map_model(updated).map(Some)
    }

    pub async fn delete(&self, id: &str) -> Result<bool> {
        let result = Listings::delete_by_id(id).exec(&self.conn).await?;
        Ok(result.rows_affected > 0)
    }

    pub async fn count(&self) -> Result<u64> {
        Ok(Listings::find().count(&self.conn).await?)
    }

    const fn sort_column(field: SortField) -> listings::Column {
        match field {
            SortField::CreatedAt => listings::Column::CreatedAt,
            SortField::UpdatedAt => listings::Column::UpdatedAt,
            SortField::Title => listings::Column::Title,
            SortField::Price => listings::Column::Price,
            SortField::Rating => listings::Column::Rating,
            SortField::AreaSqFt => listings::Column::AreaSqFt,
            SortField::Bedrooms => listings::Column::Bedrooms,
            SortField::Bathrooms => listings::Column::Bathrooms,
            SortField::AvailableFrom => listings::Column::AvailableFrom,
            SortField::State => listings::Column::State,
            SortField::City => listings::Column::City,
        }
    }

    fn condition_for(query: &CompiledQuery) -> Result<Condition> {
        let mut condition = Condition::all();
        for (field, constraint) in &query.predicate {
            condition = condition.add(Self::term(*field, constraint)?);
        }
        Ok(condition)
    }

    fn mismatch(field: FilterField, constraint: &Constraint) -> anyhow::Error {
        PredicateMismatch {
            field: field.name(),
            constraint: match constraint {
                Constraint::Text(_) => "text",
                Constraint::EqStr(_) => "eq_str",
                Constraint::EqInt(_) => "eq_int",
                Constraint::EqBool(_) => "eq_bool",
                Constraint::Range { .. } => "range",
                Constraint::Min(_) => "min",
                Constraint::MinDate(_) => "min_date",
                Constraint::ContainsCi(_) => "contains_ci",
                Constraint::AnyTagCi(_) => "any_tag_ci",
            },
        }
        .into()
    }

    /// Substring match with `%`/`_` in the needle escaped, so caller input
    /// never acts as a LIKE wildcard.
    fn contains_literal(column: listings::Column, needle: &str) -> SimpleExpr {
        let escaped = needle
            .replace('\\', "\\\\")
            .replace('%', "\\%")
            .replace('_', "\\_");
        column.like(LikeExpr::new(format!("%{escaped}%")).escape('\\'))
    }

    /// Translate one (field, constraint) pair. SQLite `LIKE` is
    /// case-insensitive for ASCII, which is what the substring and tag
    /// matches rely on.
    fn term(field: FilterField, constraint: &Constraint) -> Result<Condition> {
        let condition = match (field, constraint) {
            (FilterField::Text, Constraint::Text(needle)) => Condition::any()
                .add(Self::contains_literal(listings::Column::Title, needle))
                .add(Self::contains_literal(listings::Column::State, needle))
                .add(Self::contains_literal(listings::Column::City, needle))
                .add(Self::contains_literal(listings::Column::Category, needle))
                .add(Self::contains_literal(listings::Column::Tags, needle)),

            (FilterField::Price | FilterField::Area, Constraint::Range { min, max }) => {
                let column = if field == FilterField::Price {
                    listings::Column::Price
                } else {
                    listings::Column::AreaSqFt
                };
                let mut range = Condition::all();
                if let Some(min) = min {
                    range = range.add(column.gte(*min));
                }
                if let Some(max) = max {
                    range = range.add(column.lte(*max));
                }
                range
            }

            (FilterField::Category, Constraint::EqStr(value)) => {
                Condition::all().add(listings::Column::Category.eq(value))
            }
            (FilterField::Furnished, Constraint::EqStr(value)) => {
                Condition::all().add(listings::Column::Furnished.eq(value))
            }
            (FilterField::ListedBy, Constraint::EqStr(value)) => {
                Condition::all().add(listings::Column::ListedBy.eq(value))
            }
            (FilterField::ListingType, Constraint::EqStr(value)) => {
                Condition::all().add(listings::Column::ListingType.eq(value))
            }

            (FilterField::Bedrooms, Constraint::EqInt(value)) => {
                Condition::all().add(listings::Column::Bedrooms.eq(*value))
            }
            (FilterField::Bathrooms, Constraint::EqInt(value)) => {
                Condition::all().add(listings::Column::Bathrooms.eq(*value))
            }

            (FilterField::Verified, Constraint::EqBool(value)) => {
                Condition::all().add(listings::Column::IsVerified.eq(*value))
            }

            (FilterField::Rating, Constraint::Min(value)) => {
                Condition::all().add(listings::Column::Rating.gte(*value))
            }

            (FilterField::AvailableFrom, Constraint::MinDate(date)) => {
                Condition::all().add(listings::Column::AvailableFrom.gte(date))
            }

            (FilterField::State, Constraint::ContainsCi(needle)) => {
                Condition::all().add(Self::contains_literal(listings::Column::State, needle))
            }
            (FilterField::City, Constraint::ContainsCi(needle)) => {
                Condition::all().add(Self::contains_literal(listings::Column::City, needle))
            }

            (FilterField::Tags, Constraint::AnyTagCi(tags)) => {
                let mut any = Condition::any();
                for tag in tags {
                    any = any.add(Self::contains_literal(listings::Column::Tags, tag));
                }
                any
            }

            (field, constraint) => return Err(Self::mismatch(field, constraint)),
        };

        Ok(condition)
    }
}
