pub mod column;
pub mod edit;
pub mod page;
pub mod query;
pub mod row;
