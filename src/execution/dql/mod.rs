pub(crate) mod aggregate;
pub(crate) mod filter;
pub(crate) mod limit;
pub(crate) mod projection;
pub(crate) mod sort;
pub(crate) mod table_scan;
