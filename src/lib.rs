pub mod calendar;
pub mod config;
pub mod fetch;
pub mod model;
pub mod numerals;
pub mod parser;
pub mod pipeline;
pub mod store;
