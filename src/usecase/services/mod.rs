pub mod column_projector;
pub mod grid_store;
pub mod import_service;
pub mod mutation_gateway;
pub mod query_translator;
