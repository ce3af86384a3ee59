use crate::storage::RegionId;
use crate::types::LogicalType;
use sqlparser::parser::ParserError;

#[derive(thiserror::Error, Debug)]
pub enum DatabaseError {
    #[error("agg miss: {0}")]
    AggMiss(String),
    #[error("bindcode: {0}")]
    Bincode(
        #[source]
        #[from]
        Box<bincode::ErrorKind>,
    ),
    #[error("query was cancelled")]
    Cancelled,
    #[error("channel close")]
    ChannelClose,
    #[error("statistics collection of region {0} failed: {1}")]
    CollectFailed(RegionId, String),
    #[error("statistics collector is busy, region {0} was not queued")]
    CollectorBackpressure(RegionId),
    #[error("can not compare two types: {0} and {1}")]
    ComparisonTypeError(LogicalType, LogicalType),
    #[error("column: {0} already exists")]
    DuplicateColumn(String),
    #[error("table: {0} already exists")]
    DuplicateTable(String),
    #[error("invalid column: {0}")]
    InvalidColumn(String),
    #[error("order by position {ordinal} is not in select list of {len} columns")]
    InvalidOrdinal { ordinal: String, len: usize },
    #[error("invalid type")]
    InvalidType,
    #[error("invalid value: {0}")]
    InvalidValue(String),
    #[error("io: {0}")]
    IO(
        #[source]
        #[from]
        std::io::Error,
    ),
    #[error("values length not match, expect {0}, got {1}")]
    MisMatch(usize, usize),
    #[error("the primary key is empty")]
    PrimaryKeyNotFound,
    #[error("parser error: {0}")]
    Parser(
        #[source]
        #[from]
        ParserError,
    ),
    #[error("spill io: {0}")]
    SpillIO(#[source] std::io::Error),
    #[error("table not found: {0}")]
    TableNotFound(String),
    #[error("worker panicked: {0}")]
    ThreadPanic(String),
    #[error("unresolved expression: {0}")]
    UnresolvedExpression(String),
    #[error("unsupported primary key type: {0}")]
    UnsupportedPrimaryKey(LogicalType),
    #[error("unsupported statement: {0}")]
    UnsupportedStmt(String),
}
