//! tally-core: document and statement record types for bank statement extraction

pub mod document;
pub mod statement;
pub mod time;

pub use document::{
    BoundingPoly, DateValue, Document, Entity, MoneyValue, NormalizedValue, NormalizedVertex,
    PageAnchor, PageRef,
};
pub use statement::{
    AccountInfo, Balance, BankInfo, ClientInfo, DescriptionConfidence, StatementPeriod,
    StatementRecord, Totals, Transaction, TransactionSet,
};
