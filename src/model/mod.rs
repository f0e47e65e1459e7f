pub mod labels;
pub mod observation;
pub mod profile;
pub mod results;
