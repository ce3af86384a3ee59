pub(crate) mod batch;
pub(crate) mod matcher;
pub mod optimizer;
