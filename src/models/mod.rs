pub mod quiz;
pub mod report;
