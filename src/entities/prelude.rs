pub use super::listings::Entity as Listings;
pub use super::search_cache::Entity as SearchCacheEntity;
pub use super::users::Entity as Users;
