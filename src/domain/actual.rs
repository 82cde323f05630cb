//! Realized transactions and the payments recorded against them.

use std::fmt;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::currency::CurrencyCode;
use crate::errors::ValidationError;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum SettlementDirection {
    Payable,
    Receivable,
}

impl SettlementDirection {
    /// Receivables count positively, payables negatively.
    pub fn signed(self, amount: Decimal) -> Decimal {
        match self {
            SettlementDirection::Receivable => amount,
            SettlementDirection::Payable => -amount,
        }
    }
}

impl fmt::Display for SettlementDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            SettlementDirection::Payable => "Payable",
            SettlementDirection::Receivable => "Receivable",
        };
        f.write_str(label)
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
/// Settlement state, derived from the payment sum against the total.
pub enum SettlementStatus {
    Pending,
    PartiallyPaid,
    PartiallyReceived,
    Paid,
    Received,
    WrittenOff,
}

impl SettlementStatus {
    fn derive(direction: SettlementDirection, paid: Decimal, total: Decimal) -> Self {
        let fully = paid >= total;
        match (direction, paid.is_zero(), fully) {
            (_, true, false) => SettlementStatus::Pending,
            (SettlementDirection::Payable, _, true) => SettlementStatus::Paid,
            (SettlementDirection::Receivable, _, true) => SettlementStatus::Received,
            (SettlementDirection::Payable, false, false) => SettlementStatus::PartiallyPaid,
            (SettlementDirection::Receivable, false, false) => SettlementStatus::PartiallyReceived,
        }
    }

    /// Still awaiting (part of) its cash movement.
    pub fn is_unsettled(self) -> bool {
        matches!(
            self,
            SettlementStatus::Pending
                | SettlementStatus::PartiallyPaid
                | SettlementStatus::PartiallyReceived
        )
    }
}

impl fmt::Display for SettlementStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            SettlementStatus::Pending => "Pending",
            SettlementStatus::PartiallyPaid => "Partially paid",
            SettlementStatus::PartiallyReceived => "Partially received",
            SettlementStatus::Paid => "Paid",
            SettlementStatus::Received => "Received",
            SettlementStatus::WrittenOff => "Written off",
        };
        f.write_str(label)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Payment {
    pub payment_date: NaiveDate,
    pub paid_amount: Decimal,
    pub cash_account_id: Uuid,
}

impl Payment {
    pub fn new(payment_date: NaiveDate, paid_amount: Decimal, cash_account_id: Uuid) -> Self {
        Self {
            payment_date,
            paid_amount,
            cash_account_id,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
/// Amount as originally invoiced, when it differs from the base currency.
pub struct OriginalAmount {
    pub currency: CurrencyCode,
    pub amount: Decimal,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ActualTransaction {
    pub id: Uuid,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<Uuid>,
    pub direction: SettlementDirection,
    pub category: String,
    pub due_date: NaiveDate,
    pub total: Decimal,
    pub status: SettlementStatus,
    #[serde(default)]
    pub payments: Vec<Payment>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub original: Option<OriginalAmount>,
    #[serde(default)]
    pub is_provision: bool,
}

impl ActualTransaction {
    pub fn new(
        direction: SettlementDirection,
        category: impl Into<String>,
        due_date: NaiveDate,
        total: Decimal,
    ) -> Result<Self, ValidationError> {
        if total.is_sign_negative() {
            return Err(ValidationError::NegativeAmount(total));
        }
        Ok(Self {
            id: Uuid::new_v4(),
            parent_id: None,
            direction,
            category: category.into(),
            due_date,
            total,
            status: SettlementStatus::Pending,
            payments: Vec::new(),
            original: None,
            is_provision: false,
        })
    }

    pub fn with_parent(mut self, parent_id: Uuid) -> Self {
        self.parent_id = Some(parent_id);
        self
    }

    pub fn as_provision(mut self) -> Self {
        self.is_provision = true;
        self
    }

    pub fn paid_total(&self) -> Decimal {
        self.payments.iter().map(|p| p.paid_amount).sum()
    }

    /// Amount still expected; zero once settled or written off.
    pub fn remaining(&self) -> Decimal {
        if self.status == SettlementStatus::WrittenOff {
            return Decimal::ZERO;
        }
        (self.total - self.paid_total()).max(Decimal::ZERO)
    }

    /// Records a payment, keeping the payment list ordered by date and the
    /// status in sync with the paid sum.
    pub fn record_payment(
        &mut self,
        payment: Payment,
    ) -> Result<SettlementStatus, ValidationError> {
        if self.status == SettlementStatus::WrittenOff {
            return Err(ValidationError::WrittenOff(self.id));
        }
        if payment.paid_amount.is_sign_negative() {
            return Err(ValidationError::NegativeAmount(payment.paid_amount));
        }
        let remaining = self.total - self.paid_total();
        if payment.paid_amount > remaining {
            return Err(ValidationError::Overpayment {
                transaction_id: self.id,
                attempted: payment.paid_amount,
                remaining,
            });
        }
        let position = self
            .payments
            .partition_point(|existing| existing.payment_date <= payment.payment_date);
        self.payments.insert(position, payment);
        self.refresh_status();
        Ok(self.status)
    }

    pub fn write_off(&mut self) {
        self.status = SettlementStatus::WrittenOff;
    }

    fn refresh_status(&mut self) {
        self.status = SettlementStatus::derive(self.direction, self.paid_total(), self.total);
    }

    pub fn signed(&self, amount: Decimal) -> Decimal {
        self.direction.signed(amount)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn rent_bill() -> ActualTransaction {
        ActualTransaction::new(
            SettlementDirection::Payable,
            "Rent",
            date(2024, 1, 1),
            dec!(50),
        )
        .unwrap()
    }

    #[test]
    fn status_follows_payments() {
        let account = Uuid::new_v4();
        let mut invoice = ActualTransaction::new(
            SettlementDirection::Receivable,
            "Sales",
            date(2024, 1, 31),
            dec!(300),
        )
        .unwrap();
        assert_eq!(invoice.status, SettlementStatus::Pending);

        let status = invoice
            .record_payment(Payment::new(date(2024, 2, 5), dec!(100), account))
            .unwrap();
        assert_eq!(status, SettlementStatus::PartiallyReceived);
        assert_eq!(invoice.remaining(), dec!(200));

        let status = invoice
            .record_payment(Payment::new(date(2024, 2, 1), dec!(200), account))
            .unwrap();
        assert_eq!(status, SettlementStatus::Received);
        assert_eq!(invoice.payments[0].payment_date, date(2024, 2, 1));
        assert_eq!(invoice.remaining(), Decimal::ZERO);
    }

    #[test]
    fn payable_statuses() {
        let account = Uuid::new_v4();
        let mut bill = rent_bill();
        bill.record_payment(Payment::new(date(2024, 1, 2), dec!(20), account))
            .unwrap();
        assert_eq!(bill.status, SettlementStatus::PartiallyPaid);
        bill.record_payment(Payment::new(date(2024, 1, 3), dec!(30), account))
            .unwrap();
        assert_eq!(bill.status, SettlementStatus::Paid);
    }

    #[test]
    fn overpayment_is_rejected() {
        let account = Uuid::new_v4();
        let mut bill = rent_bill();
        let err = bill
            .record_payment(Payment::new(date(2024, 1, 2), dec!(60), account))
            .unwrap_err();
        assert!(matches!(err, ValidationError::Overpayment { .. }));
        assert!(bill.payments.is_empty());
        assert_eq!(bill.status, SettlementStatus::Pending);
    }

    #[test]
    fn written_off_transactions_refuse_payments() {
        let mut bill = rent_bill();
        bill.write_off();
        assert_eq!(bill.remaining(), Decimal::ZERO);
        assert!(!bill.status.is_unsettled());
        let err = bill
            .record_payment(Payment::new(date(2024, 1, 2), dec!(10), Uuid::new_v4()))
            .unwrap_err();
        assert_eq!(err, ValidationError::WrittenOff(bill.id));
    }
}
