use crate::domain::commission::CommissionRecord;
use crate::domain::settlement::SettlementTotals;
use chrono::NaiveDate;
use rust_decimal::Decimal;
use std::fmt;

pub const RECORD_HEADERS: [&str; 15] = [
    "Aseguradora",
    "Cliente",
    "Estatus",
    "Forma de pago",
    "Póliza",
    "Fecha de vigencia",
    "Pago aseguradora",
    "Producto",
    "Prima neta",
    "Prima total",
    "% Comisión",
    "Comisión neta",
    "Diferencia comisión",
    "Diferencia liquidación",
    "Importe a liquidar",
];

pub const SETTLEMENT_MONTH_HEADER: &str = "Mes de liquidación";
pub const TOTAL_LABEL: &str = "TOTAL";

/// A typed export cell. Text formats render it with [`fmt::Display`];
/// workbooks keep amounts and rates numeric.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Cell<'a> {
    Blank,
    Text(&'a str),
    Date(NaiveDate),
    Amount(Decimal),
    /// On the 0–100 scale.
    Percent(Decimal),
}

impl fmt::Display for Cell<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Cell::Blank => Ok(()),
            Cell::Text(text) => f.write_str(text),
            Cell::Date(date) => write!(f, "{}", date.format("%Y-%m-%d")),
            Cell::Amount(amount) => write!(f, "{amount}"),
            // The suffix keeps 1% apart from the fraction 1 on re-import.
            Cell::Percent(pct) => write!(f, "{pct}%"),
        }
    }
}

/// A ledger row in [`RECORD_HEADERS`] order.
pub fn record_cells<'a>(insurer: &'a str, record: &'a CommissionRecord) -> [Cell<'a>; 15] {
    [
        Cell::Text(insurer),
        Cell::Text(&record.client_name),
        Cell::Text(record.status.as_str()),
        Cell::Text(record.frequency.as_str()),
        Cell::Text(&record.policy_number),
        Cell::Date(record.effective_date),
        Cell::Amount(record.insurer_payout.rounded()),
        Cell::Text(&record.product),
        Cell::Amount(record.net_premium.rounded()),
        Cell::Amount(record.total_premium.rounded()),
        Cell::Percent(record.commission_pct.value().normalize()),
        Cell::Amount(record.net_commission.rounded()),
        Cell::Amount(record.commission_difference.rounded()),
        Cell::Amount(record.settlement_difference.rounded()),
        Cell::Amount(record.amount_to_settle.rounded()),
    ]
}

/// The settlement footer: only the four summed columns are filled.
pub fn totals_cells<'a>(insurer: &'a str, totals: &SettlementTotals) -> [Cell<'a>; 15] {
    let mut cells = [Cell::Blank; 15];
    cells[0] = Cell::Text(insurer);
    cells[1] = Cell::Text(TOTAL_LABEL);
    cells[8] = Cell::Amount(totals.net_premium.rounded());
    cells[9] = Cell::Amount(totals.total_premium.rounded());
    cells[11] = Cell::Amount(totals.net_commission.rounded());
    cells[14] = Cell::Amount(totals.amount_to_settle.rounded());
    cells
}
