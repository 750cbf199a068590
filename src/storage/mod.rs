pub mod bplus_tree;
pub mod header;
pub mod schema;
pub mod storage_manager;
pub mod table;
pub mod table_file;
