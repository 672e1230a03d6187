pub mod converter;
pub mod error;
pub mod field;
pub mod header;
pub mod mapping;
pub mod resample;
pub mod row;
