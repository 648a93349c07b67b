pub mod import;
pub mod sqlite;
