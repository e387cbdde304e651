use crate::domain::commission::{CommissionDraft, CommissionRecord};
use crate::domain::insurer::Insurer;
use crate::domain::ports::{CommissionStoreBox, InsurerStoreBox};
use crate::error::{PortalError, Result};
use tracing::{info, warn};
use uuid::Uuid;

/// Outcome of a bulk import.
#[derive(Debug, Default, PartialEq)]
pub struct ImportReport {
    pub imported: Vec<CommissionRecord>,
    pub rejected: Vec<String>,
}

/// The commissions ledger: insurers and their policy records.
///
/// Every write goes through [`CommissionRecord::new`] or
/// [`CommissionRecord::edit`], so the reconciliation figures stored are
/// always the ones derived from the raw inputs.
pub struct LedgerService {
    insurers: InsurerStoreBox,
    commissions: CommissionStoreBox,
}

impl LedgerService {
    pub fn new(insurers: InsurerStoreBox, commissions: CommissionStoreBox) -> Self {
        Self {
            insurers,
            commissions,
        }
    }

    pub async fn add_insurer(&self, name: &str) -> Result<Insurer> {
        if name.trim().is_empty() {
            return Err(PortalError::ValidationError(
                "Insurer name is required".to_string(),
            ));
        }
        if self.insurers.find_by_name(name).await?.is_some() {
            return Err(PortalError::Conflict(format!(
                "Insurer '{}' already exists",
                name.trim()
            )));
        }

        let insurer = Insurer::new(name);
        self.insurers.store(insurer.clone()).await?;
        info!(insurer = %insurer.name, "Insurer added");
        Ok(insurer)
    }

    pub async fn list_insurers(&self) -> Result<Vec<Insurer>> {
        self.insurers.get_all().await
    }

    pub async fn insurer_named(&self, name: &str) -> Result<Insurer> {
        self.insurers
            .find_by_name(name)
            .await?
            .ok_or_else(|| PortalError::NotFound(format!("Insurer '{}'", name.trim())))
    }

    /// Removes an insurer together with its ledger.
    pub async fn remove_insurer(&self, name: &str) -> Result<usize> {
        let insurer = self.insurer_named(name).await?;
        let records = self.commissions.for_insurer(insurer.id).await?;
        for record in &records {
            self.commissions.delete(record.id).await?;
        }
        self.insurers.delete(insurer.id).await?;
        info!(insurer = %insurer.name, records = records.len(), "Insurer removed");
        Ok(records.len())
    }

    pub async fn create_record(
        &self,
        insurer_id: Uuid,
        draft: CommissionDraft,
    ) -> Result<CommissionRecord> {
        if self.insurers.get(insurer_id).await?.is_none() {
            return Err(PortalError::NotFound(format!("Insurer {insurer_id}")));
        }
        let record = CommissionRecord::new(Uuid::new_v4(), insurer_id, draft)?;
        self.commissions.store(record.clone()).await?;
        Ok(record)
    }

    pub async fn get_record(&self, id: Uuid) -> Result<CommissionRecord> {
        self.commissions
            .get(id)
            .await?
            .ok_or_else(|| PortalError::NotFound(format!("Commission record {id}")))
    }

    /// Full-record edit.
    pub async fn edit_record(&self, id: Uuid, draft: CommissionDraft) -> Result<CommissionRecord> {
        let edited = self.get_record(id).await?.edit(draft)?;
        self.commissions.store(edited.clone()).await?;
        Ok(edited)
    }

    pub async fn delete_record(&self, id: Uuid) -> Result<()> {
        if self.commissions.delete(id).await? {
            Ok(())
        } else {
            Err(PortalError::NotFound(format!("Commission record {id}")))
        }
    }

    pub async fn records_for(&self, insurer_id: Uuid) -> Result<Vec<CommissionRecord>> {
        self.commissions.for_insurer(insurer_id).await
    }

    /// Stores every valid draft; invalid rows are reported and skipped.
    pub async fn import_records<I>(&self, insurer_id: Uuid, rows: I) -> Result<ImportReport>
    where
        I: IntoIterator<Item = Result<CommissionDraft>>,
    {
        let mut report = ImportReport::default();
        for (index, row) in rows.into_iter().enumerate() {
            // header is line 1
            let line = index + 2;
            let outcome = match row {
                Ok(draft) => self.create_record(insurer_id, draft).await,
                Err(e) => Err(e),
            };
            match outcome {
                Ok(record) => report.imported.push(record),
                Err(e @ (PortalError::ValidationError(_) | PortalError::CsvError(_))) => {
                    warn!(line, error = %e, "Skipping spreadsheet row");
                    report.rejected.push(format!("line {line}: {e}"));
                }
                Err(e) => return Err(e),
            }
        }
        info!(
            imported = report.imported.len(),
            rejected = report.rejected.len(),
            "Import finished"
        );
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::commission::PaymentFrequency;
    use crate::domain::commission::fixtures::draft;
    use crate::domain::money::Money;
    use crate::infrastructure::in_memory::{InMemoryCommissionStore, InMemoryInsurerStore};
    use chrono::NaiveDate;
    use rust_decimal_macros::dec;

    fn ledger() -> LedgerService {
        LedgerService::new(
            Box::new(InMemoryInsurerStore::new()),
            Box::new(InMemoryCommissionStore::new()),
        )
    }

    fn effective() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, 10).unwrap()
    }

    #[tokio::test]
    async fn test_insurer_names_are_unique() {
        let ledger = ledger();
        ledger.add_insurer("GNP").await.unwrap();

        let duplicate = ledger.add_insurer("  gnp ").await;
        assert!(matches!(duplicate, Err(PortalError::Conflict(_))));

        let blank = ledger.add_insurer("   ").await;
        assert!(matches!(blank, Err(PortalError::ValidationError(_))));
    }

    #[tokio::test]
    async fn test_create_requires_known_insurer() {
        let ledger = ledger();
        let result = ledger
            .create_record(Uuid::new_v4(), draft(PaymentFrequency::Annual, effective()))
            .await;
        assert!(matches!(result, Err(PortalError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_edit_recomputes_and_persists() {
        let ledger = ledger();
        let insurer = ledger.add_insurer("AXA").await.unwrap();
        let record = ledger
            .create_record(insurer.id, draft(PaymentFrequency::Annual, effective()))
            .await
            .unwrap();

        let mut changed = draft(PaymentFrequency::Monthly, effective());
        changed.amount_to_settle = Money::new(dec!(1000));
        ledger.edit_record(record.id, changed).await.unwrap();

        let stored = ledger.get_record(record.id).await.unwrap();
        assert_eq!(stored.frequency, PaymentFrequency::Monthly);
        // 1160 − 100 − 1000
        assert_eq!(stored.settlement_difference, Money::new(dec!(60)));
    }

    #[tokio::test]
    async fn test_delete_record() {
        let ledger = ledger();
        let insurer = ledger.add_insurer("AXA").await.unwrap();
        let record = ledger
            .create_record(insurer.id, draft(PaymentFrequency::Annual, effective()))
            .await
            .unwrap();

        ledger.delete_record(record.id).await.unwrap();
        assert!(matches!(
            ledger.delete_record(record.id).await,
            Err(PortalError::NotFound(_))
        ));
        assert!(ledger.records_for(insurer.id).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_remove_insurer_drops_its_records() {
        let ledger = ledger();
        let insurer = ledger.add_insurer("Qualitas").await.unwrap();
        for _ in 0..3 {
            ledger
                .create_record(insurer.id, draft(PaymentFrequency::Annual, effective()))
                .await
                .unwrap();
        }

        assert_eq!(ledger.remove_insurer("QUALITAS").await.unwrap(), 3);
        assert!(ledger.records_for(insurer.id).await.unwrap().is_empty());
        assert!(ledger.list_insurers().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_import_skips_invalid_rows() {
        let ledger = ledger();
        let insurer = ledger.add_insurer("GNP").await.unwrap();

        let mut blank_client = draft(PaymentFrequency::Annual, effective());
        blank_client.client_name = String::new();
        let rows = vec![
            Ok(draft(PaymentFrequency::Annual, effective())),
            Ok(blank_client),
            Err(PortalError::ValidationError("bad date".to_string())),
            Ok(draft(PaymentFrequency::Monthly, effective())),
        ];

        let report = ledger.import_records(insurer.id, rows).await.unwrap();
        assert_eq!(report.imported.len(), 2);
        assert_eq!(report.rejected.len(), 2);
        assert!(report.rejected[0].starts_with("line 3:"));
        assert!(report.rejected[1].starts_with("line 4:"));
    }

    #[tokio::test]
    async fn test_import_rejects_amounts_too_large_to_reconcile() {
        use crate::interfaces::csv::commission_reader::CommissionReader;

        let ledger = ledger();
        let insurer = ledger.add_insurer("GNP").await.unwrap();
        let sheet = "Cliente,Póliza,Fecha de vigencia,Prima neta,Prima total,% Comisión,Comisión neta,Importe a liquidar\n\
                     Juan,P-1,2024-11-15,79228162514264337593543950335,0,100,0,79228162514264337593543950335\n\
                     Ana,P-2,2024-11-15,1000,1160,10,95,900\n";

        let rows = CommissionReader::new(sheet.as_bytes()).drafts().unwrap();
        let report = ledger.import_records(insurer.id, rows).await.unwrap();

        assert_eq!(report.imported.len(), 1);
        assert_eq!(report.imported[0].policy_number, "P-2");
        assert_eq!(report.rejected.len(), 1);
        assert!(report.rejected[0].starts_with("line 2:"));
        assert!(report.rejected[0].contains("out of range"));
    }
}
