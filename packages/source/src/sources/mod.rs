//! Concrete incident data source implementations.

pub mod nyc_311;
