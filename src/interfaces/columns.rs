use crate::domain::commission::{CommissionDraft, PaymentFrequency, PolicyStatus};
use crate::domain::money::{Money, Percentage};
use crate::error::{PortalError, Result};
use crate::text::fold;
use chrono::{Days, NaiveDate};
use rust_decimal::Decimal;
use std::str::FromStr;

/// Day zero of the 1900 spreadsheet date system. Using 1899-12-30 absorbs
/// the phantom 1900-02-29, so every serial from March 1900 on is exact.
const SERIAL_EPOCH: (i32, u32, u32) = (1899, 12, 30);

const DATE_FORMATS: [&str; 4] = ["%Y-%m-%d", "%d/%m/%Y", "%Y/%m/%d", "%d-%m-%Y"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Column {
    Client,
    Status,
    Frequency,
    PolicyNumber,
    EffectiveDate,
    InsurerPayout,
    Product,
    NetPremium,
    TotalPremium,
    CommissionPct,
    NetCommission,
    AmountToSettle,
}

impl Column {
    const ALL: [Column; 12] = [
        Column::Client,
        Column::Status,
        Column::Frequency,
        Column::PolicyNumber,
        Column::EffectiveDate,
        Column::InsurerPayout,
        Column::Product,
        Column::NetPremium,
        Column::TotalPremium,
        Column::CommissionPct,
        Column::NetCommission,
        Column::AmountToSettle,
    ];

    /// Accepted header spellings, already folded.
    fn aliases(&self) -> &'static [&'static str] {
        match self {
            Column::Client => &["cliente", "nombre del cliente", "asegurado", "contratante"],
            Column::Status => &["estatus", "status", "estado"],
            Column::Frequency => &["forma de pago", "frecuencia", "frecuencia de pago"],
            Column::PolicyNumber => &[
                "poliza",
                "no. poliza",
                "no poliza",
                "num. poliza",
                "numero de poliza",
            ],
            Column::EffectiveDate => &[
                "fecha de vigencia",
                "fecha vigencia",
                "inicio de vigencia",
                "vigencia",
                "fecha",
            ],
            Column::InsurerPayout => &["pago aseguradora", "pago de aseguradora", "pago cia"],
            Column::Product => &["producto", "ramo"],
            Column::NetPremium => &["prima neta"],
            Column::TotalPremium => &["prima total"],
            Column::CommissionPct => &[
                "% comision",
                "porcentaje",
                "porcentaje de comision",
                "comision %",
                "%",
            ],
            Column::NetCommission => &["comision neta", "comision"],
            Column::AmountToSettle => &[
                "importe a liquidar",
                "monto a liquidar",
                "a liquidar",
                "liquidar",
            ],
        }
    }

    fn is_required(&self) -> bool {
        !matches!(
            self,
            Column::Status | Column::Frequency | Column::InsurerPayout | Column::Product
        )
    }

    fn label(&self) -> &'static str {
        self.aliases()[0]
    }
}

/// Header position of each known column.
///
/// Shared by every spreadsheet format: rows arrive as text cells, whatever
/// the container.
#[derive(Debug)]
pub struct ColumnMap {
    positions: Vec<(Column, usize)>,
}

impl ColumnMap {
    pub fn from_headers<S: AsRef<str>>(headers: &[S]) -> Result<Self> {
        let folded: Vec<String> = headers.iter().map(|h| fold(h.as_ref())).collect();
        let mut positions = Vec::new();
        let mut missing = Vec::new();

        for column in Column::ALL {
            let position = column
                .aliases()
                .iter()
                .find_map(|alias| folded.iter().position(|h| h == alias));
            match position {
                Some(index) => positions.push((column, index)),
                None if column.is_required() => missing.push(column.label()),
                None => {}
            }
        }

        if !missing.is_empty() {
            return Err(PortalError::ValidationError(format!(
                "Missing required columns: {}",
                missing.join(", ")
            )));
        }
        Ok(Self { positions })
    }

    fn cell<'r, S: AsRef<str>>(&self, record: &'r [S], column: Column) -> &'r str {
        self.positions
            .iter()
            .find(|(c, _)| *c == column)
            .and_then(|(_, index)| record.get(*index))
            .map(|cell| cell.as_ref().trim())
            .unwrap_or("")
    }

    pub fn draft<S: AsRef<str>>(&self, record: &[S]) -> Result<CommissionDraft> {
        let money = |column: Column| {
            parse_money(self.cell(record, column))
                .map_err(|e| column_error(column, e))
        };

        Ok(CommissionDraft {
            client_name: self.cell(record, Column::Client).to_string(),
            status: PolicyStatus::from_str(self.cell(record, Column::Status))?,
            frequency: PaymentFrequency::from_str(self.cell(record, Column::Frequency))?,
            policy_number: self.cell(record, Column::PolicyNumber).to_string(),
            effective_date: parse_date(self.cell(record, Column::EffectiveDate))
                .map_err(|e| column_error(Column::EffectiveDate, e))?,
            insurer_payout: money(Column::InsurerPayout)?,
            product: self.cell(record, Column::Product).to_string(),
            net_premium: money(Column::NetPremium)?,
            total_premium: money(Column::TotalPremium)?,
            commission_pct: parse_percentage(self.cell(record, Column::CommissionPct))
                .map_err(|e| column_error(Column::CommissionPct, e))?,
            net_commission: money(Column::NetCommission)?,
            amount_to_settle: money(Column::AmountToSettle)?,
        })
    }
}

fn column_error(column: Column, error: PortalError) -> PortalError {
    match error {
        PortalError::ValidationError(msg) => {
            PortalError::ValidationError(format!("column '{}': {msg}", column.label()))
        }
        other => other,
    }
}

/// Accepts spreadsheet serial numbers and the usual textual layouts.
pub fn parse_date(value: &str) -> Result<NaiveDate> {
    let value = value.trim();
    if let Ok(serial) = value.parse::<f64>() {
        let (y, m, d) = SERIAL_EPOCH;
        return NaiveDate::from_ymd_opt(y, m, d)
            .filter(|_| serial >= 1.0)
            .and_then(|epoch| epoch.checked_add_days(Days::new(serial.trunc() as u64)))
            .ok_or_else(|| {
                PortalError::ValidationError(format!("'{value}' is not a valid date serial"))
            });
    }

    DATE_FORMATS
        .iter()
        .find_map(|format| NaiveDate::parse_from_str(value, format).ok())
        .ok_or_else(|| PortalError::ValidationError(format!("'{value}' is not a valid date")))
}

/// Tolerates currency symbols and thousands separators. Blank means zero.
pub fn parse_money(value: &str) -> Result<Money> {
    let cleaned: String = value
        .chars()
        .filter(|c| !matches!(c, '$' | ',' | ' '))
        .collect();
    if cleaned.is_empty() {
        return Ok(Money::ZERO);
    }
    Decimal::from_str(&cleaned)
        .map(Money::new)
        .map_err(|_| PortalError::ValidationError(format!("'{value}' is not a valid amount")))
}

/// Fractions such as `0.125` are scaled to `12.5`; `12.5` and `12.5%` are
/// taken as already in the 0–100 range.
pub fn parse_percentage(value: &str) -> Result<Percentage> {
    let cleaned = value.trim().trim_end_matches('%').trim();
    let mut pct = Decimal::from_str(cleaned).map_err(|_| {
        PortalError::ValidationError(format!("'{value}' is not a valid percentage"))
    })?;
    if pct > Decimal::ZERO && pct <= Decimal::ONE && !value.contains('%') {
        pct *= Decimal::ONE_HUNDRED;
    }
    Percentage::new(pct)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_headers_match_after_folding() {
        let map = ColumnMap::from_headers(&[
            "  CLIENTE ",
            "No.  Póliza",
            "Fecha de Vigencia",
            "Prima Neta",
            "Prima Total",
            "% Comisión",
            "Comisión Neta",
            "Importe a Liquidar",
        ])
        .unwrap();
        let draft = map
            .draft(&["Luis", "P-1", "2025-01-01", "10", "12", "10%", "1", "9"])
            .unwrap();
        assert_eq!(draft.client_name, "Luis");
        assert_eq!(draft.policy_number, "P-1");
    }

    #[test]
    fn test_short_rows_read_as_blank() {
        let map = ColumnMap::from_headers(&[
            "Cliente",
            "Póliza",
            "Fecha de vigencia",
            "Prima neta",
            "Prima total",
            "% Comisión",
            "Comisión neta",
            "Importe a liquidar",
            "Producto",
        ])
        .unwrap();
        let draft = map
            .draft(&["Luis", "P-1", "2025-01-01", "10", "12", "10", "1", "9"])
            .unwrap();
        assert_eq!(draft.product, "");
    }

    #[test]
    fn test_parse_date_serials() {
        assert_eq!(parse_date("1").unwrap(), date(1899, 12, 31));
        assert_eq!(parse_date("45658").unwrap(), date(2025, 1, 1));
        assert_eq!(parse_date("45658.75").unwrap(), date(2025, 1, 1));
        assert!(parse_date("0").is_err());
        assert!(parse_date("-3").is_err());
    }

    #[test]
    fn test_parse_percentage_scaling() {
        assert_eq!(parse_percentage("0.15").unwrap().value(), dec!(15));
        assert_eq!(parse_percentage("15").unwrap().value(), dec!(15));
        assert_eq!(parse_percentage("1%").unwrap().value(), dec!(1));
        assert_eq!(parse_percentage("0").unwrap().value(), dec!(0));
        assert!(parse_percentage("150").is_err());
        assert!(parse_percentage("diez").is_err());
    }

    #[test]
    fn test_parse_money() {
        assert_eq!(parse_money("$ 1,234.50").unwrap(), Money::new(dec!(1234.50)));
        assert_eq!(parse_money("").unwrap(), Money::ZERO);
        assert!(parse_money("mil").is_err());
    }
}
