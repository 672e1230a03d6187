pub mod dataset;
pub mod location;
pub mod source_record;
pub mod wkt;
