use super::money::{Money, Percentage};
use crate::error::PortalError;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

#[derive(Debug, Serialize, Deserialize, PartialEq, Eq, Clone, Copy, Default)]
pub enum PolicyStatus {
    #[default]
    #[serde(rename = "ALTA")]
    Active,
    #[serde(rename = "BAJA")]
    Cancelled,
}

impl PolicyStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PolicyStatus::Active => "ALTA",
            PolicyStatus::Cancelled => "BAJA",
        }
    }
}

impl FromStr for PolicyStatus {
    type Err = PortalError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "" | "ALTA" => Ok(PolicyStatus::Active),
            "BAJA" => Ok(PolicyStatus::Cancelled),
            other => Err(PortalError::ValidationError(format!(
                "Unknown policy status '{other}'"
            ))),
        }
    }
}

impl fmt::Display for PolicyStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How often the client pays the premium.
#[derive(Debug, Serialize, Deserialize, PartialEq, Eq, Clone, Copy, Default)]
pub enum PaymentFrequency {
    #[default]
    #[serde(rename = "ANUAL")]
    Annual,
    #[serde(rename = "MENSUAL")]
    Monthly,
}

impl PaymentFrequency {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentFrequency::Annual => "ANUAL",
            PaymentFrequency::Monthly => "MENSUAL",
        }
    }
}

impl FromStr for PaymentFrequency {
    type Err = PortalError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "" | "ANUAL" => Ok(PaymentFrequency::Annual),
            "MENSUAL" => Ok(PaymentFrequency::Monthly),
            other => Err(PortalError::ValidationError(format!(
                "Unknown payment frequency '{other}'"
            ))),
        }
    }
}

impl fmt::Display for PaymentFrequency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The raw, user-entered inputs of a commission record.
///
/// Drafts come from manual entry or from a spreadsheet row. They never carry
/// the reconciliation figures; those only exist on [`CommissionRecord`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommissionDraft {
    pub client_name: String,
    pub status: PolicyStatus,
    pub frequency: PaymentFrequency,
    pub policy_number: String,
    pub effective_date: NaiveDate,
    pub insurer_payout: Money,
    pub product: String,
    pub net_premium: Money,
    pub total_premium: Money,
    pub commission_pct: Percentage,
    pub net_commission: Money,
    pub amount_to_settle: Money,
}

impl CommissionDraft {
    pub fn validate(&self) -> Result<(), PortalError> {
        if self.client_name.trim().is_empty() {
            return Err(PortalError::ValidationError(
                "Client name is required".to_string(),
            ));
        }
        if self.policy_number.trim().is_empty() {
            return Err(PortalError::ValidationError(
                "Policy number is required".to_string(),
            ));
        }
        Money::non_negative(self.insurer_payout.value(), "Insurer payout")?;
        Money::non_negative(self.net_premium.value(), "Net premium")?;
        Money::non_negative(self.total_premium.value(), "Total premium")?;
        Money::non_negative(self.net_commission.value(), "Net commission")?;
        Money::non_negative(self.amount_to_settle.value(), "Amount to settle")?;
        Ok(())
    }
}

/// A policy line in an insurer's commissions ledger.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommissionRecord {
    pub id: Uuid,
    pub insurer_id: Uuid,
    pub client_name: String,
    pub status: PolicyStatus,
    pub frequency: PaymentFrequency,
    pub policy_number: String,
    pub effective_date: NaiveDate,
    pub insurer_payout: Money,
    pub product: String,
    pub net_premium: Money,
    pub total_premium: Money,
    pub commission_pct: Percentage,
    pub net_commission: Money,
    /// `net_premium × pct − net_commission`
    pub commission_difference: Money,
    /// `total_premium − net_premium × pct − amount_to_settle`
    pub settlement_difference: Money,
    pub amount_to_settle: Money,
}

impl CommissionRecord {
    /// Creates a record from a validated draft, computing both reconciliation
    /// figures.
    pub fn new(id: Uuid, insurer_id: Uuid, draft: CommissionDraft) -> Result<Self, PortalError> {
        draft.validate()?;
        let expected_commission = draft.net_premium.percent(draft.commission_pct)?;
        Ok(Self {
            id,
            insurer_id,
            commission_difference: expected_commission.checked_sub(draft.net_commission)?,
            settlement_difference: draft
                .total_premium
                .checked_sub(expected_commission)?
                .checked_sub(draft.amount_to_settle)?,
            client_name: draft.client_name.trim().to_string(),
            status: draft.status,
            frequency: draft.frequency,
            policy_number: draft.policy_number.trim().to_string(),
            effective_date: draft.effective_date,
            insurer_payout: draft.insurer_payout,
            product: draft.product.trim().to_string(),
            net_premium: draft.net_premium,
            total_premium: draft.total_premium,
            commission_pct: draft.commission_pct,
            net_commission: draft.net_commission,
            amount_to_settle: draft.amount_to_settle,
        })
    }

    /// Full-record edit. Identity and insurer are kept, everything else is
    /// replaced and the reconciliation figures recomputed.
    pub fn edit(&self, draft: CommissionDraft) -> Result<Self, PortalError> {
        Self::new(self.id, self.insurer_id, draft)
    }

    /// The raw inputs this record was built from.
    pub fn to_draft(&self) -> CommissionDraft {
        CommissionDraft {
            client_name: self.client_name.clone(),
            status: self.status,
            frequency: self.frequency,
            policy_number: self.policy_number.clone(),
            effective_date: self.effective_date,
            insurer_payout: self.insurer_payout,
            product: self.product.clone(),
            net_premium: self.net_premium,
            total_premium: self.total_premium,
            commission_pct: self.commission_pct,
            net_commission: self.net_commission,
            amount_to_settle: self.amount_to_settle,
        }
    }

    pub fn is_active(&self) -> bool {
        self.status == PolicyStatus::Active
    }

    /// Ledger display order: effective date, then policy number.
    pub fn ledger_order(a: &Self, b: &Self) -> Ordering {
        a.effective_date
            .cmp(&b.effective_date)
            .then_with(|| a.policy_number.cmp(&b.policy_number))
            .then_with(|| a.id.cmp(&b.id))
    }
}


#[cfg(test)]
mod tests {
    use super::fixtures::draft;
    use super::*;
    use rust_decimal::Decimal;
    use rust_decimal_macros::dec;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_reconciliation_figures_are_derived() {
        let record = CommissionRecord::new(
            Uuid::new_v4(),
            Uuid::new_v4(),
            draft(PaymentFrequency::Annual, date(2024, 5, 1)),
        )
        .unwrap();

        // 1000 × 10% − 95
        assert_eq!(record.commission_difference, Money::new(dec!(5)));
        // 1160 − 100 − 900
        assert_eq!(record.settlement_difference, Money::new(dec!(160)));
    }

    #[test]
    fn test_edit_recomputes() {
        let record = CommissionRecord::new(
            Uuid::new_v4(),
            Uuid::new_v4(),
            draft(PaymentFrequency::Annual, date(2024, 5, 1)),
        )
        .unwrap();

        let mut changed = draft(PaymentFrequency::Annual, date(2024, 5, 1));
        changed.net_commission = Money::new(dec!(120));
        let edited = record.edit(changed).unwrap();

        assert_eq!(edited.id, record.id);
        assert_eq!(edited.insurer_id, record.insurer_id);
        assert_eq!(edited.commission_difference, Money::new(dec!(-20)));
    }

    #[test]
    fn test_to_draft_rebuilds_same_record() {
        let record = CommissionRecord::new(
            Uuid::new_v4(),
            Uuid::new_v4(),
            draft(PaymentFrequency::Monthly, date(2024, 5, 1)),
        )
        .unwrap();
        assert_eq!(record.edit(record.to_draft()).unwrap(), record);
    }

    #[test]
    fn test_amounts_too_large_to_reconcile_are_rejected() {
        let mut huge = draft(PaymentFrequency::Annual, date(2024, 11, 15));
        huge.net_premium = Money::new(Decimal::MAX);
        huge.total_premium = Money::ZERO;
        huge.commission_pct = Percentage::new(dec!(100)).unwrap();
        huge.net_commission = Money::ZERO;
        huge.amount_to_settle = Money::new(Decimal::MAX);

        let result = CommissionRecord::new(Uuid::new_v4(), Uuid::new_v4(), huge);
        assert!(matches!(result, Err(PortalError::ValidationError(_))));
    }

    #[test]
    fn test_validation_rejects_blank_policy_number() {
        let mut bad = draft(PaymentFrequency::Monthly, date(2024, 5, 1));
        bad.policy_number = "  ".to_string();
        let result = CommissionRecord::new(Uuid::new_v4(), Uuid::new_v4(), bad);
        assert!(matches!(result, Err(PortalError::ValidationError(_))));
    }

    #[test]
    fn test_validation_rejects_negative_premium() {
        let mut bad = draft(PaymentFrequency::Monthly, date(2024, 5, 1));
        bad.net_premium = Money::new(dec!(-1));
        let result = CommissionRecord::new(Uuid::new_v4(), Uuid::new_v4(), bad);
        assert!(matches!(result, Err(PortalError::ValidationError(_))));
    }

    #[test]
    fn test_status_and_frequency_parsing() {
        assert_eq!("alta".parse::<PolicyStatus>().unwrap(), PolicyStatus::Active);
        assert_eq!(" BAJA ".parse::<PolicyStatus>().unwrap(), PolicyStatus::Cancelled);
        assert_eq!("".parse::<PolicyStatus>().unwrap(), PolicyStatus::Active);
        assert!("suspendida".parse::<PolicyStatus>().is_err());

        assert_eq!(
            "Mensual".parse::<PaymentFrequency>().unwrap(),
            PaymentFrequency::Monthly
        );
        assert_eq!("".parse::<PaymentFrequency>().unwrap(), PaymentFrequency::Annual);
    }

    #[test]
    fn test_status_serializes_as_spanish_code() {
        let json = serde_json::to_string(&PolicyStatus::Cancelled).unwrap();
        assert_eq!(json, "\"BAJA\"");
        let json = serde_json::to_string(&PaymentFrequency::Monthly).unwrap();
        assert_eq!(json, "\"MENSUAL\"");
    }
}
