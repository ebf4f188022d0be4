//! Events Layer - IPC Message Types
//!
//! Reference: IPC-MATRIX.md Subsystem 7

pub mod requests;
pub mod responses;

pub use requests::{
    BuildFilterRequest, FilteredTransactionsRequest, TransactionHashRequest,
    TransactionHashUpdate, UpdateFilterRequest,
};
pub use responses::{
    error_codes, BloomFilterResponse, ErrorResponse, FilteredTransactionsResponse,
};
