#![allow(unused_doc_comments)]
pub mod binder;
pub mod catalog;
pub mod db;
pub mod errors;
pub mod execution;
pub mod expression;
pub mod optimizer;
pub mod parser;
pub mod planner;
pub mod statistics;
pub mod storage;
pub mod types;
pub mod utils;
