//! tally-ingest: turns the entity document of a scanned bank statement into
//! a typed statement record.
//!
//! Stages, in order: metadata resolution, line-item rows, checks recovered
//! from the document text, totals. Nothing here fails: noisy or missing
//! fields leave the corresponding output unset, and unusable rows are
//! dropped.

pub mod checks;
pub mod config;
pub mod metadata;
pub mod normalize;
pub mod patterns;
pub mod recovery;
pub mod totals;
pub mod transactions;

pub use config::{ExtractConfig, load_config};
pub use metadata::{BalanceHints, PeriodContext, ResolvedMetadata, resolve_metadata};
pub use transactions::{RowStats, extract_rows};

use tally_core::{Document, StatementRecord, TransactionSet};
use tracing::{info, warn};

use crate::recovery::DescriptionSearch;

/// Extract a statement record from a processed document.
///
/// Deterministic: the same document and config always give the same record.
pub fn extract_statement(document: &Document, config: &ExtractConfig) -> StatementRecord {
    let Some(entities) = document.entities.as_deref() else {
        warn!("document has no entities, returning an empty statement");
        return StatementRecord::empty(document.clone());
    };

    let metadata = resolve_metadata(entities, config);

    let full_text = document.full_text();
    let mut search = DescriptionSearch::new(full_text, entities, &config.line_item_type);
    let (mut items, stats) = extract_rows(entities, &metadata.period, config, &mut search);

    let recovered_checks = checks::recover_checks(full_text, &items);
    let checks_recovered = recovered_checks.len();
    items.extend(recovered_checks);

    info!(
        line_items = stats.line_items,
        rows_kept = stats.kept,
        rows_dropped = stats.dropped,
        checks_recovered,
        descriptions_recovered = stats.descriptions_recovered,
        "statement extracted"
    );

    let totals = totals::totals(&items);
    StatementRecord {
        bank: metadata.bank,
        client: metadata.client,
        account: metadata.account,
        statement_period: metadata.statement_period,
        currency: metadata.currency,
        balance: totals::balance(&metadata.balance),
        transactions: TransactionSet { items, totals },
        raw_response: document.clone(),
    }
}
