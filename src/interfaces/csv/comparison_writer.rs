use crate::domain::policy::PolicyComparison;
use crate::error::Result;
use rust_decimal::Decimal;
use std::io::Write;

pub const COVERAGE_HEADER: &str = "Cobertura";

/// Writes a policy comparison as a table with one column per document.
///
/// The first rows carry the policy header data (insurer, policy number,
/// insured, premium), followed by one row per coverage with each document's
/// sum insured. Cells a document does not mention are left blank.
pub struct ComparisonWriter<W: Write> {
    writer: csv::Writer<W>,
}

impl<W: Write> ComparisonWriter<W> {
    pub fn new(sink: W) -> Self {
        let writer = csv::WriterBuilder::new()
            .has_headers(false)
            .from_writer(sink);
        Self { writer }
    }

    pub fn write_comparison(&mut self, comparison: &PolicyComparison) -> Result<()> {
        let policies = &comparison.policies;

        self.writer.write_record(
            std::iter::once(COVERAGE_HEADER).chain(policies.iter().map(|p| p.document.as_str())),
        )?;
        self.write_row("Aseguradora", policies.iter().map(|p| p.insurer.clone()))?;
        self.write_row("Póliza", policies.iter().map(|p| p.policy_number.clone()))?;
        self.write_row("Asegurado", policies.iter().map(|p| p.insured.clone()))?;
        self.write_row("Prima total", policies.iter().map(|p| p.premium.map(amount)))?;

        for row in &comparison.rows {
            self.write_row(&row.coverage, row.sum_insured.iter().map(|v| v.map(amount)))?;
        }
        self.writer.flush()?;
        Ok(())
    }

    fn write_row<I>(&mut self, label: &str, cells: I) -> Result<()>
    where
        I: Iterator<Item = Option<String>>,
    {
        self.writer.write_record(
            std::iter::once(label.to_string()).chain(cells.map(Option::unwrap_or_default)),
        )?;
        Ok(())
    }
}

fn amount(value: Decimal) -> String {
    value.round_dp(2).normalize().to_string()
}
