pub mod scheduler;
pub mod search;
pub mod store;
