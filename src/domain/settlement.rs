//! Settlement (liquidación) date expansion.
//!
//! Given a window and an insurer's ledger, decides which records are payable
//! in the window. Annual records are matched on month/day regardless of year;
//! monthly records are repeated once per calendar month in the window.

use super::commission::{CommissionRecord, PaymentFrequency};
use super::money::Money;
use crate::error::PortalError;
use chrono::{Datelike, Days, NaiveDate};
use serde::Serialize;
use std::fmt;

const MONTH_ABBREVIATIONS: [&str; 12] = [
    "Ene", "Feb", "Mar", "Abr", "May", "Jun", "Jul", "Ago", "Sep", "Oct", "Nov", "Dic",
];

/// Inclusive date range a settlement covers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SettlementWindow {
    start: NaiveDate,
    end: NaiveDate,
}

impl SettlementWindow {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Result<Self, PortalError> {
        if start > end {
            return Err(PortalError::ValidationError(format!(
                "Settlement window starts ({start}) after it ends ({end})"
            )));
        }
        Ok(Self { start, end })
    }

    pub fn start(&self) -> NaiveDate {
        self.start
    }

    pub fn end(&self) -> NaiveDate {
        self.end
    }

    /// Whether an annual record's anniversary falls inside the window.
    ///
    /// Dates are reduced to `month × 100 + day`, so the year is ignored. When
    /// the window crosses New Year the start code is greater than the end
    /// code and the test becomes a union.
    pub fn contains_anniversary(&self, date: NaiveDate) -> bool {
        let code = month_day_code(date);
        let start = month_day_code(self.start);
        let end = month_day_code(self.end);
        if start <= end {
            start <= code && code <= end
        } else {
            code >= start || code <= end
        }
    }

    /// Calendar months from the start month to the end month, inclusive.
    pub fn months(&self) -> impl Iterator<Item = BillingMonth> {
        let last = BillingMonth::of(self.end);
        std::iter::successors(Some(BillingMonth::of(self.start)), |m| Some(m.next()))
            .take_while(move |m| *m <= last)
    }
}

fn month_day_code(date: NaiveDate) -> u32 {
    date.month() * 100 + date.day()
}

/// A calendar month a monthly-pay record is billed in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
pub struct BillingMonth {
    pub year: i32,
    pub month: u32,
}

impl BillingMonth {
    pub fn of(date: NaiveDate) -> Self {
        Self {
            year: date.year(),
            month: date.month(),
        }
    }

    pub fn next(&self) -> Self {
        if self.month == 12 {
            Self {
                year: self.year + 1,
                month: 1,
            }
        } else {
            Self {
                year: self.year,
                month: self.month + 1,
            }
        }
    }

    /// Latest effective date still billed in this month.
    ///
    /// Day 31 is used for every month and rolled forward when the month is
    /// shorter, so February 2025 ends on 2025-03-03. Records effective in
    /// those overflow days are billed one month early.
    pub fn cutoff(&self) -> Option<NaiveDate> {
        NaiveDate::from_ymd_opt(self.year, self.month, 1)?.checked_add_days(Days::new(30))
    }

    /// Whether a record effective on `date` is billed in this month.
    pub fn bills(&self, date: NaiveDate) -> bool {
        self.cutoff().is_some_and(|cutoff| date <= cutoff)
    }
}

impl fmt::Display for BillingMonth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = MONTH_ABBREVIATIONS
            .get(self.month.saturating_sub(1) as usize)
            .copied()
            .unwrap_or("?");
        write!(f, "{name} {}", self.year)
    }
}

/// Which period a settlement line pays for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SettlementPeriod {
    Annual,
    Month(BillingMonth),
}

impl fmt::Display for SettlementPeriod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SettlementPeriod::Annual => f.write_str("Anual"),
            SettlementPeriod::Month(month) => month.fmt(f),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SettlementLine {
    pub record: CommissionRecord,
    pub period: SettlementPeriod,
}

impl SettlementLine {
    pub fn label(&self) -> String {
        self.period.to_string()
    }
}

/// Footer totals of a settlement report.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct SettlementTotals {
    pub net_premium: Money,
    pub total_premium: Money,
    pub net_commission: Money,
    pub amount_to_settle: Money,
}

impl SettlementTotals {
    fn add(&mut self, record: &CommissionRecord) -> Result<(), PortalError> {
        self.net_premium = self.net_premium.checked_add(record.net_premium)?;
        self.total_premium = self.total_premium.checked_add(record.total_premium)?;
        self.net_commission = self.net_commission.checked_add(record.net_commission)?;
        self.amount_to_settle = self.amount_to_settle.checked_add(record.amount_to_settle)?;
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Settlement {
    pub window: SettlementWindow,
    pub lines: Vec<SettlementLine>,
    pub totals: SettlementTotals,
}

/// Builds the settlement lines payable in `window`.
///
/// Cancelled records are skipped. Lines keep the traversal order of
/// `records`; monthly records contribute their months in chronological order.
/// Fails when the footer totals overflow.
pub fn settle<'a, I>(window: SettlementWindow, records: I) -> Result<Settlement, PortalError>
where
    I: IntoIterator<Item = &'a CommissionRecord>,
{
    let mut lines = Vec::new();
    let mut totals = SettlementTotals::default();

    for record in records.into_iter().filter(|r| r.is_active()) {
        match record.frequency {
            PaymentFrequency::Annual => {
                if window.contains_anniversary(record.effective_date) {
                    totals.add(record)?;
                    lines.push(SettlementLine {
                        record: record.clone(),
                        period: SettlementPeriod::Annual,
                    });
                }
            }
            PaymentFrequency::Monthly => {
                for month in window.months().filter(|m| m.bills(record.effective_date)) {
                    totals.add(record)?;
                    lines.push(SettlementLine {
                        record: record.clone(),
                        period: SettlementPeriod::Month(month),
                    });
                }
            }
        }
    }

    Ok(Settlement {
        window,
        lines,
        totals,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::commission::fixtures::draft;
    use crate::domain::commission::PolicyStatus;
    use rust_decimal::Decimal;
    use rust_decimal_macros::dec;
    use uuid::Uuid;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn window(start: NaiveDate, end: NaiveDate) -> SettlementWindow {
        SettlementWindow::new(start, end).unwrap()
    }

    fn record(frequency: PaymentFrequency, effective: NaiveDate) -> CommissionRecord {
        CommissionRecord::new(Uuid::new_v4(), Uuid::new_v4(), draft(frequency, effective)).unwrap()
    }

    #[test]
    fn test_window_rejects_reversed_range() {
        let result = SettlementWindow::new(date(2025, 3, 1), date(2025, 2, 1));
        assert!(matches!(result, Err(PortalError::ValidationError(_))));
    }

    #[test]
    fn test_monthly_record_expands_per_month() {
        let monthly = record(PaymentFrequency::Monthly, date(2024, 11, 15));
        let settlement = settle(window(date(2025, 1, 1), date(2025, 3, 31)), [&monthly]).unwrap();

        let labels: Vec<String> = settlement.lines.iter().map(|l| l.label()).collect();
        assert_eq!(labels, vec!["Ene 2025", "Feb 2025", "Mar 2025"]);
    }

    #[test]
    fn test_monthly_record_skips_months_before_effective_date() {
        let monthly = record(PaymentFrequency::Monthly, date(2025, 2, 10));
        let settlement = settle(window(date(2025, 1, 1), date(2025, 4, 30)), [&monthly]).unwrap();

        let labels: Vec<String> = settlement.lines.iter().map(|l| l.label()).collect();
        assert_eq!(labels, vec!["Feb 2025", "Mar 2025", "Abr 2025"]);
    }

    #[test]
    fn test_monthly_window_across_year_end() {
        let monthly = record(PaymentFrequency::Monthly, date(2020, 1, 1));
        let settlement = settle(window(date(2024, 11, 20), date(2025, 2, 5)), [&monthly]).unwrap();

        let labels: Vec<String> = settlement.lines.iter().map(|l| l.label()).collect();
        assert_eq!(labels, vec!["Nov 2024", "Dic 2024", "Ene 2025", "Feb 2025"]);
    }

    #[test]
    fn test_short_month_cutoff_overflows_into_next_month() {
        // February's day-31 cutoff rolls over to March 3rd.
        let feb = BillingMonth { year: 2025, month: 2 };
        assert_eq!(feb.cutoff(), Some(date(2025, 3, 3)));

        let monthly = record(PaymentFrequency::Monthly, date(2025, 3, 2));
        let settlement = settle(window(date(2025, 2, 1), date(2025, 3, 31)), [&monthly]).unwrap();
        let labels: Vec<String> = settlement.lines.iter().map(|l| l.label()).collect();
        assert_eq!(labels, vec!["Feb 2025", "Mar 2025"]);

        let later = record(PaymentFrequency::Monthly, date(2025, 3, 4));
        let settlement = settle(window(date(2025, 2, 1), date(2025, 3, 31)), [&later]).unwrap();
        assert_eq!(settlement.lines.len(), 1);
    }

    #[test]
    fn test_annual_record_matches_anniversary_ignoring_year() {
        let inside = record(PaymentFrequency::Annual, date(2019, 2, 14));
        let outside = record(PaymentFrequency::Annual, date(2019, 4, 1));
        let settlement = settle(
            window(date(2025, 2, 1), date(2025, 3, 31)),
            [&inside, &outside],
        )
        .unwrap();

        assert_eq!(settlement.lines.len(), 1);
        assert_eq!(settlement.lines[0].record.id, inside.id);
        assert_eq!(settlement.lines[0].label(), "Anual");
    }

    #[test]
    fn test_annual_window_wrapping_new_year() {
        let w = window(date(2024, 12, 20), date(2025, 1, 10));
        assert!(w.contains_anniversary(date(2021, 12, 25)));
        assert!(w.contains_anniversary(date(2021, 1, 5)));
        assert!(w.contains_anniversary(date(2021, 12, 20)));
        assert!(w.contains_anniversary(date(2021, 1, 10)));
        assert!(!w.contains_anniversary(date(2021, 1, 11)));
        assert!(!w.contains_anniversary(date(2021, 6, 1)));
    }

    #[test]
    fn test_cancelled_records_never_settle() {
        let mut monthly = record(PaymentFrequency::Monthly, date(2024, 1, 1));
        monthly.status = PolicyStatus::Cancelled;
        let mut annual = record(PaymentFrequency::Annual, date(2024, 1, 15));
        annual.status = PolicyStatus::Cancelled;

        let settlement = settle(
            window(date(2025, 1, 1), date(2025, 12, 31)),
            [&monthly, &annual],
        )
        .unwrap();
        assert!(settlement.lines.is_empty());
        assert_eq!(settlement.totals, SettlementTotals::default());
    }

    #[test]
    fn test_totals_sum_every_line() {
        let monthly = record(PaymentFrequency::Monthly, date(2024, 11, 15));
        let annual = record(PaymentFrequency::Annual, date(2020, 2, 1));
        let settlement = settle(
            window(date(2025, 1, 1), date(2025, 3, 31)),
            [&monthly, &annual],
        )
        .unwrap();

        // three monthly lines plus one annual line
        assert_eq!(settlement.lines.len(), 4);
        assert_eq!(settlement.totals.net_premium, Money::new(dec!(4000)));
        assert_eq!(settlement.totals.total_premium, Money::new(dec!(4640)));
        assert_eq!(settlement.totals.net_commission, Money::new(dec!(380)));
        assert_eq!(settlement.totals.amount_to_settle, Money::new(dec!(3600)));
    }

    #[test]
    fn test_lines_follow_record_order() {
        let first = record(PaymentFrequency::Monthly, date(2024, 1, 1));
        let second = record(PaymentFrequency::Annual, date(2024, 1, 20));
        let settlement = settle(
            window(date(2025, 1, 1), date(2025, 2, 28)),
            [&first, &second],
        )
        .unwrap();

        let ids: Vec<Uuid> = settlement.lines.iter().map(|l| l.record.id).collect();
        assert_eq!(ids, vec![first.id, first.id, second.id]);
    }

    #[test]
    fn test_totals_overflow_is_an_error() {
        let mut huge = record(PaymentFrequency::Monthly, date(2024, 1, 1));
        huge.net_premium = Money::new(Decimal::MAX);
        let result = settle(window(date(2025, 1, 1), date(2025, 2, 28)), [&huge]);
        assert!(matches!(result, Err(PortalError::ValidationError(_))));
    }

    #[test]
    fn test_month_labels() {
        assert_eq!(BillingMonth { year: 2025, month: 8 }.to_string(), "Ago 2025");
        assert_eq!(BillingMonth { year: 2024, month: 12 }.to_string(), "Dic 2024");
    }
}
