pub mod table_source;
