pub mod backend;
pub mod debounce;
pub mod json_store;
pub mod schema;
