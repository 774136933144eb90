pub mod listings;
pub use listings::{ListingDraft, ListingError, ListingService};
