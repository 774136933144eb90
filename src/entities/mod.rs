pub mod prelude;

pub mod listings;
pub mod search_cache;
pub mod users;
