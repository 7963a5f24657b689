//! Income logging. Each logged income awards the configured income points.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

use super::errors::FinanceResult;
use super::FinanceService;
use crate::store::{LedgerEntry, LedgerStore};
use crate::validation::{self, ValidationResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Frequency {
    Daily,
    Weekly,
    Monthly,
    Yearly,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Income {
    pub id: Uuid,
    pub user_id: Uuid,
    pub source: String,
    pub amount: f64,
    pub frequency: Frequency,
    pub date: NaiveDate,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewIncome {
    pub source: String,
    pub amount: f64,
    pub frequency: Frequency,
    pub date: NaiveDate,
}

impl NewIncome {
    pub fn validate(&self) -> ValidationResult {
        validation::non_empty("source", &self.source)?;
        validation::positive("amount", self.amount)
    }
}

/// `GET /api/income/filter` query; the date range applies only when both ends are given
#[derive(Debug, Clone, Default, Deserialize)]
pub struct IncomeFilter {
    pub frequency: Option<Frequency>,
    pub start: Option<NaiveDate>,
    pub end: Option<NaiveDate>,
}

impl IncomeFilter {
    pub fn matches(&self, income: &Income) -> bool {
        if let Some(frequency) = self.frequency {
            if income.frequency != frequency {
                return false;
            }
        }
        if let (Some(start), Some(end)) = (self.start, self.end) {
            if income.date < start || income.date > end {
                return false;
            }
        }
        true
    }
}

impl<S: LedgerStore> FinanceService<S> {
    /// Record an income and award the income points
    pub fn log_income(&self, user_id: Uuid, request: NewIncome) -> FinanceResult<Income> {
        request.validate()?;

        let income = Income {
            id: Uuid::new_v4(),
            user_id,
            source: request.source.trim().to_string(),
            amount: request.amount,
            frequency: request.frequency,
            date: request.date,
            created_at: Utc::now(),
        };
        let source = format!("Income: {}", income.source);
        self.engine.award_for_entry(
            &LedgerEntry::Income(income.clone()),
            self.rewards.income_points,
            source,
        )?;
        info!(user_id = %user_id, income_id = %income.id, "income logged");

        Ok(income)
    }

    /// Incomes newest first
    pub fn list_incomes(&self, user_id: Uuid, filter: &IncomeFilter) -> FinanceResult<Vec<Income>> {
        let mut incomes = self.store.list_incomes(user_id, filter)?;
        incomes.sort_by(|a, b| b.date.cmp(&a.date).then(b.created_at.cmp(&a.created_at)));
        Ok(incomes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::finance::test_support::service_with_user;
    use crate::finance::FinanceError;
    use crate::progress::ProgressError;

    fn income(source: &str, frequency: Frequency, date: &str) -> NewIncome {
        NewIncome {
            source: source.to_string(),
            amount: 2500.0,
            frequency,
            date: date.parse().unwrap(),
        }
    }

    #[test]
    fn test_log_income_awards_points() {
        let (service, user_id) = service_with_user();

        let logged = service
            .log_income(user_id, income("Salary", Frequency::Monthly, "2025-06-01"))
            .unwrap();
        assert_eq!(logged.source, "Salary");

        let summary = service.engine().summary(user_id).unwrap();
        assert_eq!(summary.xp, 5);
        let history = service.engine().history(user_id).unwrap();
        assert_eq!(history[0].source, "Income: Salary");
    }

    #[test]
    fn test_invalid_income_rejected_without_award() {
        let (service, user_id) = service_with_user();
        let mut request = income("Salary", Frequency::Monthly, "2025-06-01");
        request.amount = -1.0;

        assert!(service.log_income(user_id, request).is_err());
        assert_eq!(service.engine().summary(user_id).unwrap().xp, 0);
    }

    #[test]
    fn test_income_not_stored_when_award_fails() {
        let (service, user_id) = service_with_user();
        service.engine().award(user_id, i64::MAX, "Seed").unwrap();

        let result = service.log_income(user_id, income("Salary", Frequency::Monthly, "2025-06-01"));
        match result {
            Err(FinanceError::Progress(err)) => {
                assert!(matches!(err, ProgressError::XpOutOfRange { .. }));
                assert_eq!(err.status_code(), 400);
            }
            other => panic!("expected an out-of-range award, got {:?}", other),
        }
        assert!(service.list_incomes(user_id, &IncomeFilter::default()).unwrap().is_empty());
        assert_eq!(service.engine().history(user_id).unwrap().len(), 1);

        service.engine().award(user_id, -100, "Correction").unwrap();
        service
            .log_income(user_id, income("Salary", Frequency::Monthly, "2025-06-01"))
            .unwrap();
        assert_eq!(service.list_incomes(user_id, &IncomeFilter::default()).unwrap().len(), 1);
    }

    #[test]
    fn test_income_filter() {
        let (service, user_id) = service_with_user();
        service.log_income(user_id, income("Salary", Frequency::Monthly, "2025-06-01")).unwrap();
        service.log_income(user_id, income("Gig", Frequency::Weekly, "2025-06-10")).unwrap();
        service.log_income(user_id, income("Salary", Frequency::Monthly, "2025-07-01")).unwrap();

        let all = service.list_incomes(user_id, &IncomeFilter::default()).unwrap();
        assert_eq!(all.len(), 3);
        assert_eq!(all[0].date.to_string(), "2025-07-01");

        let monthly = IncomeFilter {
            frequency: Some(Frequency::Monthly),
            ..Default::default()
        };
        assert_eq!(service.list_incomes(user_id, &monthly).unwrap().len(), 2);

        let june = IncomeFilter {
            start: Some("2025-06-01".parse().unwrap()),
            end: Some("2025-06-30".parse().unwrap()),
            ..Default::default()
        };
        assert_eq!(service.list_incomes(user_id, &june).unwrap().len(), 2);

        // A half-open range is ignored
        let start_only = IncomeFilter {
            start: Some("2025-06-05".parse().unwrap()),
            ..Default::default()
        };
        assert_eq!(service.list_incomes(user_id, &start_only).unwrap().len(), 3);
    }
}
