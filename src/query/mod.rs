pub mod filter;
pub mod key;

pub use filter::{
    CompileError, CompiledQuery, Constraint, FilterField, PageWindow, SortDirection, SortField,
    SortSpec, compile,
};
pub use key::{SEARCH_KEY_PREFIX, encode};
