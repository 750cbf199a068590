mod record_test;
mod value_test;
