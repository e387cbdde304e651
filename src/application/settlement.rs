use crate::domain::insurer::Insurer;
use crate::domain::ports::{CommissionStoreBox, InsurerStoreBox};
use crate::domain::settlement::{self, Settlement, SettlementWindow};
use crate::error::{PortalError, Result};
use tracing::info;

/// Generates settlement reports for one insurer at a time.
pub struct SettlementService {
    insurers: InsurerStoreBox,
    commissions: CommissionStoreBox,
}

impl SettlementService {
    pub fn new(insurers: InsurerStoreBox, commissions: CommissionStoreBox) -> Self {
        Self {
            insurers,
            commissions,
        }
    }

    pub async fn generate(
        &self,
        insurer_name: &str,
        window: SettlementWindow,
    ) -> Result<(Insurer, Settlement)> {
        let insurer = self
            .insurers
            .find_by_name(insurer_name)
            .await?
            .ok_or_else(|| PortalError::NotFound(format!("Insurer '{}'", insurer_name.trim())))?;

        let records = self.commissions.for_insurer(insurer.id).await?;
        let settlement = settlement::settle(window, &records)?;

        info!(
            insurer = %insurer.name,
            start = %window.start(),
            end = %window.end(),
            records = records.len(),
            lines = settlement.lines.len(),
            "Settlement generated"
        );
        Ok((insurer, settlement))
    }
}
