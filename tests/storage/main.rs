mod bplus_tree_test;
mod table_test;
