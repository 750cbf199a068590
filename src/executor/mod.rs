pub mod command;
pub mod predicate;
pub mod scan;
pub mod sequential_scan;
