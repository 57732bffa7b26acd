//! Statement metadata resolution.
//!
//! One pass finds the bank name (client-name filtering depends on it), then
//! a fold over all entities arbitrates the remaining fields. Duplicated
//! entity types are common; each field has its own rule for which candidate
//! wins.

use tally_core::{AccountInfo, BankInfo, ClientInfo, Entity, StatementPeriod};
use tracing::debug;

use crate::config::ExtractConfig;
use crate::normalize::{money_or_text, normalized_date};

/// Year/month bounds of the statement period, used to date rows printed
/// without a year.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PeriodContext {
    pub start_year: Option<i32>,
    pub start_month: Option<u32>,
    pub end_year: Option<i32>,
    pub end_month: Option<u32>,
}

impl PeriodContext {
    /// Year of a row dated `month` with no printed year.
    ///
    /// A period crossing a year boundary (Dec 2024 - Jan 2025) puts months
    /// at or after the start month in the start year and the rest in the
    /// end year. Otherwise the end year applies.
    pub fn infer_year(&self, month: u32) -> Option<i32> {
        match (self.start_year, self.start_month, self.end_year) {
            (Some(start_year), Some(start_month), Some(end_year)) if start_year != end_year => {
                Some(if month >= start_month { start_year } else { end_year })
            }
            _ => self.end_year.or(self.start_year),
        }
    }
}

/// Opening and closing balance as printed, before defaults are applied.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct BalanceHints {
    pub start: Option<f64>,
    pub end: Option<f64>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResolvedMetadata {
    pub bank: BankInfo,
    pub client: ClientInfo,
    pub account: AccountInfo,
    pub statement_period: Option<StatementPeriod>,
    pub currency: Option<String>,
    pub balance: BalanceHints,
    pub period: PeriodContext,
}

pub fn resolve_metadata(entities: &[Entity], config: &ExtractConfig) -> ResolvedMetadata {
    let bank_name = find_bank_name(entities);
    entities
        .iter()
        .fold(MetadataFold::new(bank_name), |mut acc, entity| {
            acc.absorb(entity, config);
            acc
        })
        .finish()
}

/// First `bank_name` entity, preferring the service's normalized text.
pub fn find_bank_name(entities: &[Entity]) -> Option<String> {
    let entity = entities.iter().find(|e| e.kind == "bank_name")?;
    let name = match entity.normalized_text().filter(|t| !t.is_empty()) {
        Some(text) => text.to_string(),
        None => entity.mention().replace('\n', " "),
    };
    let name = name.trim();
    (!name.is_empty()).then(|| name.to_string())
}

#[derive(Debug, Clone, PartialEq)]
struct Candidate {
    value: String,
    confidence: f64,
}

/// Keep the first candidate, replaced only by strictly higher confidence.
fn offer_by_confidence(slot: &mut Option<Candidate>, value: String, confidence: f64) {
    let replace = match slot {
        None => true,
        Some(current) => current.value.is_empty() || confidence > current.confidence,
    };
    if replace {
        *slot = Some(Candidate { value, confidence });
    }
}

/// Keep the textually longest candidate ("2024-12-31" beats "2024-12").
fn offer_longest(slot: &mut Option<String>, value: String) {
    if value.is_empty() {
        return;
    }
    if slot
        .as_ref()
        .is_none_or(|current| value.chars().count() > current.chars().count())
    {
        *slot = Some(value);
    }
}

fn offer_first(slot: &mut Option<String>, value: String) {
    if slot.is_none() && !value.is_empty() {
        *slot = Some(value);
    }
}

/// Year and month of a typed date, even when the day is missing.
fn year_month(entity: &Entity) -> Option<(i32, u32)> {
    let dv = entity.date_value()?;
    Some((dv.year()?, dv.month()?))
}

#[derive(Debug, Default)]
struct MetadataFold {
    bank_name: Option<String>,
    /// Lowercased first word of the bank name
    bank_word: Option<String>,
    bank_address: Option<String>,
    client_name: Option<Candidate>,
    client_address: Option<String>,
    account_number: Option<Candidate>,
    account_type: Option<String>,
    period_start: Option<String>,
    period_end: Option<String>,
    issued: Option<String>,
    start_year_month: Option<(i32, u32)>,
    end_year_month: Option<(i32, u32)>,
    issued_year_month: Option<(i32, u32)>,
    starting_balance: Option<f64>,
    ending_balance: Option<f64>,
    currency: Option<String>,
}

impl MetadataFold {
    fn new(bank_name: Option<String>) -> Self {
        let bank_word = bank_name
            .as_deref()
            .and_then(|n| n.split(' ').next())
            .map(str::to_lowercase)
            .filter(|w| !w.is_empty());
        Self {
            bank_name,
            bank_word,
            ..Self::default()
        }
    }

    fn absorb(&mut self, entity: &Entity, config: &ExtractConfig) {
        let value = entity.mention();
        match entity.kind.as_str() {
            "bank_address" => offer_first(&mut self.bank_address, value.trim().replace('\n', ", ")),
            "client_address" => {
                offer_first(&mut self.client_address, value.trim().replace('\n', ", "))
            }
            "account_number" => offer_by_confidence(
                &mut self.account_number,
                value.trim().to_string(),
                entity.confidence_or_zero(),
            ),
            "account_type" => offer_first(&mut self.account_type, value.trim().to_string()),
            "client_name" => {
                let name = value.replace('\n', " ").trim().to_string();
                // The service sometimes tags the bank's own name as the client.
                if let Some(word) = &self.bank_word {
                    if name.to_lowercase().contains(word.as_str()) {
                        debug!("client_name candidate matches bank name, skipped");
                        return;
                    }
                }
                offer_by_confidence(&mut self.client_name, name, entity.confidence_or_zero());
            }
            "statement_start_date" => {
                offer_longest(&mut self.period_start, date_or_text(entity));
                if self.start_year_month.is_none() {
                    self.start_year_month = year_month(entity);
                }
            }
            "statement_end_date" => {
                offer_longest(&mut self.period_end, date_or_text(entity));
                if self.end_year_month.is_none() {
                    self.end_year_month = year_month(entity);
                }
            }
            "statement_date" => {
                let date = date_or_text(entity);
                // Competes for the period end alongside statement_end_date.
                offer_longest(&mut self.period_end, date.clone());
                offer_longest(&mut self.issued, date);
                if self.issued_year_month.is_none() {
                    self.issued_year_month = year_month(entity);
                }
            }
            "starting_balance" if self.starting_balance.is_none() => {
                let (amount, currency) = money_or_text(entity, &config.default_currency);
                self.starting_balance = Some(amount);
                self.currency = self.currency.take().or(currency);
            }
            "ending_balance" if self.ending_balance.is_none() => {
                let (amount, currency) = money_or_text(entity, &config.default_currency);
                self.ending_balance = Some(amount);
                self.currency = self.currency.take().or(currency);
            }
            _ => {}
        }
    }

    fn finish(self) -> ResolvedMetadata {
        let statement_period =
            (self.period_start.is_some() || self.period_end.is_some() || self.issued.is_some())
                .then(|| StatementPeriod {
                    start: self.period_start,
                    end: self.period_end,
                    issued: self.issued,
                });

        let (start_year, start_month) = self.start_year_month.unzip();
        let (end_year, end_month) = self.end_year_month.or(self.issued_year_month).unzip();

        ResolvedMetadata {
            bank: BankInfo {
                name: self.bank_name,
                address: self.bank_address,
            },
            client: ClientInfo {
                name: self.client_name.map(|c| c.value).filter(|v| !v.is_empty()),
                address: self.client_address,
            },
            account: AccountInfo {
                number: self.account_number.map(|c| c.value).filter(|v| !v.is_empty()),
                kind: self.account_type,
            },
            statement_period,
            currency: self.currency,
            balance: BalanceHints {
                start: self.starting_balance.filter(|v| !v.is_nan()),
                end: self.ending_balance.filter(|v| !v.is_nan()),
            },
            period: PeriodContext {
                start_year,
                start_month,
                end_year,
                end_month,
            },
        }
    }
}

fn date_or_text(entity: &Entity) -> String {
    normalized_date(entity).unwrap_or_else(|| entity.mention().trim().to_string())
}
