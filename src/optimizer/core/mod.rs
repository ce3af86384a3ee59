pub mod histogram;
pub mod ordering;
pub mod pattern;
pub mod rule;
pub mod statistics_meta;
