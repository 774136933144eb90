use super::ApiError;
use crate::models::listing::{ListingPatch, split_pipe_list};
use crate::services::ListingDraft;

pub fn validate_draft(draft: &ListingDraft) -> Result<(), ApiError> {
    if draft.title.trim().is_empty() {
        return Err(ApiError::validation("Title cannot be empty"));
    }
    if draft.state.trim().is_empty() {
        return Err(ApiError::validation("State cannot be empty"));
    }
    if draft.city.trim().is_empty() {
        return Err(ApiError::validation("City cannot be empty"));
    }

    validate_price(draft.price)?;
    validate_area(draft.area_sq_ft)?;
    validate_count("bedrooms", draft.bedrooms)?;
    validate_count("bathrooms", draft.bathrooms)?;
    validate_rating(draft.rating)?;
    validate_list("amenities", &draft.amenities)?;
    validate_list("tags", &draft.tags)?;
    validate_date(&draft.available_from)?;

    Ok(())
}

pub fn validate_patch(patch: &ListingPatch) -> Result<(), ApiError> {
    if let Some(title) = &patch.title
        && title.trim().is_empty()
    {
        return Err(ApiError::validation("Title cannot be empty"));
    }
    if let Some(state) = &patch.state
        && state.trim().is_empty()
    {
        return Err(ApiError::validation("State cannot be empty"));
    }
    if let Some(city) = &patch.city
        && city.trim().is_empty()
    {
        return Err(ApiError::validation("City cannot be empty"));
    }

    if let Some(price) = patch.price {
        validate_price(price)?;
    }
    if let Some(area) = patch.area_sq_ft {
        validate_area(area)?;
    }
    if let Some(bedrooms) = patch.bedrooms {
        validate_count("bedrooms", bedrooms)?;
    }
    if let Some(bathrooms) = patch.bathrooms {
        validate_count("bathrooms", bathrooms)?;
    }
    if let Some(rating) = patch.rating {
        validate_rating(rating)?;
    }
    if let Some(amenities) = &patch.amenities {
        validate_list("amenities", amenities)?;
    }
    if let Some(tags) = &patch.tags {
        validate_list("tags", tags)?;
    }
    if let Some(date) = &patch.available_from {
        validate_date(date)?;
    }

    Ok(())
}

fn validate_price(price: f64) -> Result<(), ApiError> {
    if !price.is_finite() || price < 0.0 {
        return Err(ApiError::validation("Price must be a non-negative number"));
    }
    Ok(())
}

fn validate_area(area: f64) -> Result<(), ApiError> {
    if !area.is_finite() || area <= 0.0 {
        return Err(ApiError::validation("Area must be a positive number"));
    }
    Ok(())
}

fn validate_count(field: &str, value: i32) -> Result<(), ApiError> {
    if value < 0 {
        return Err(ApiError::validation(format!(
            "{field} cannot be negative"
        )));
    }
    Ok(())
}

fn validate_rating(rating: f32) -> Result<(), ApiError> {
    if !rating.is_finite() || !(0.0..=5.0).contains(&rating) {
        return Err(ApiError::validation("Rating must be between 0 and 5"));
    }
    Ok(())
}

fn validate_list(field: &str, raw: &str) -> Result<(), ApiError> {
    if split_pipe_list(raw).is_empty() {
        return Err(ApiError::validation(format!(
            "{field} must contain at least one entry"
        )));
    }
    Ok(())
}

fn validate_date(raw: &str) -> Result<(), ApiError> {
    chrono::NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .map_err(|_| ApiError::validation("availableFrom must be a YYYY-MM-DD date"))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::listing::{Category, Furnishing, ListingKind};

    fn draft() -> ListingDraft {
        ListingDraft {
            title: "Sunset Apartments".to_string(),
            category: Category::Apartment,
            price: 45000.0,
            state: "Karnataka".to_string(),
            city: "Bengaluru".to_string(),
            area_sq_ft: 1200.0,
            bedrooms: 2,
            bathrooms: 2,
            amenities: "pool|gym".to_string(),
            furnished: Furnishing::Furnished,
            available_from: "2026-01-15".to_string(),
            tags: "family-friendly|near-metro".to_string(),
            color_theme: "#ff5733".to_string(),
            rating: 4.2,
            is_verified: true,
            listing_type: ListingKind::Rent,
        }
    }

    #[test]
    fn test_valid_draft_passes() {
        assert!(validate_draft(&draft()).is_ok());
    }

    #[test]
    fn test_negative_price_rejected() {
        let mut d = draft();
        d.price = -1.0;
        assert!(validate_draft(&d).is_err());
    }

    #[test]
    fn test_rating_out_of_range_rejected() {
        let mut d = draft();
        d.rating = 5.1;
        assert!(validate_draft(&d).is_err());
    }

    #[test]
    fn test_empty_tags_rejected() {
        let mut d = draft();
        d.tags = " | ".to_string();
        assert!(validate_draft(&d).is_err());
    }

    #[test]
    fn test_bad_date_rejected() {
        let mut d = draft();
        d.available_from = "15-01-2026".to_string();
        assert!(validate_draft(&d).is_err());
    }

    #[test]
    fn test_patch_only_checks_present_fields() {
        let patch = ListingPatch {
            price: Some(100.0),
            ..ListingPatch::default()
        };
        assert!(validate_patch(&patch).is_ok());

        let patch = ListingPatch {
            rating: Some(-0.5),
            ..ListingPatch::default()
        };
        assert!(validate_patch(&patch).is_err());
    }
}
