use thiserror::Error;

/// Rejections from building or evaluating a where/order/paging request.
/// Raised before any statement reaches storage.
#[derive(Error, Debug)]
pub enum FilterError {
    #[error("Invalid table name: {0}")]
    InvalidTable(String),

    #[error("Invalid column: {0}")]
    InvalidColumn(String),

    #[error("Malformed where clause: {0}")]
    InvalidWhere(String),

    #[error("Unsupported operator: {0}")]
    UnsupportedOperator(String),

    /// Operator present but its operand has the wrong shape
    #[error("Invalid operand: {0}")]
    InvalidOperand(String),

    #[error("Invalid paging: {0}")]
    InvalidPaging(String),
}
