/// Question catalog seam and in-memory implementation.
pub mod catalog;
/// Match storage and atomic state transitions.
pub mod match_store;
/// Database model definitions.
pub mod models;
/// Storage abstraction layer for database operations.
pub mod storage;
/// Identity lookup seam and in-memory implementation.
pub mod users;
