// Public API signature database

mod database;

pub use database::{raw_class, raw_method, raw_parameter_list, ApiDatabase};
