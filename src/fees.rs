use crate::format::format_rupees;
use crate::models::{FeeOverview, FeeRecord, FeeRow, FeeSummary};

/// Totals across fee rows. `pending` is `total - paid`, so it can only go
/// negative if a row was written with `paid > amount`.
pub fn summarize(fees: &[FeeRecord]) -> FeeSummary {
    let total: i64 = fees.iter().map(|f| f.amount).sum();
    let paid: i64 = fees.iter().map(|f| f.paid).sum();

    FeeSummary {
        total,
        paid,
        pending: total - paid,
    }
}

/// Listing ordered by due date, plus the summary.
pub fn overview(fees: &[FeeRecord]) -> FeeOverview {
    let mut rows: Vec<&FeeRecord> = fees.iter().collect();
    rows.sort_by_key(|f| f.due_date);

    FeeOverview {
        fees: rows
            .into_iter()
            .map(|f| FeeRow {
                id: f.id,
                description: f.description.clone(),
                amount: f.amount,
                paid: f.paid,
                status: f.status,
                due_date: f.due_date,
                paid_at: f.paid_at,
            })
            .collect(),
        summary: summarize(fees),
    }
}

pub fn payment_message(amount: i64) -> String {
    format!("Payment of {} successful", format_rupees(amount))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::FeeStatus;
    use chrono::NaiveDate;
    use uuid::Uuid;

    fn fee(description: &str, amount: i64, paid: i64, due: (i32, u32, u32)) -> FeeRecord {
        FeeRecord {
            id: Uuid::new_v4(),
            user_id: Uuid::nil(),
            description: description.to_string(),
            amount,
            paid,
            status: if paid >= amount {
                FeeStatus::Paid
            } else {
                FeeStatus::Pending
            },
            due_date: NaiveDate::from_ymd_opt(due.0, due.1, due.2).expect("valid date"),
            paid_at: None,
        }
    }

    #[test]
    fn summary_adds_amounts_and_paid() {
        let fees = vec![
            fee("Tuition", 1000, 1000, (2026, 1, 15)),
            fee("Lab", 500, 0, (2026, 3, 15)),
        ];
        let summary = summarize(&fees);
        assert_eq!(summary.total, 1500);
        assert_eq!(summary.paid, 1000);
        assert_eq!(summary.pending, 500);
    }

    #[test]
    fn pending_is_exactly_total_minus_paid() {
        let fees = vec![
            fee("Tuition", 8_500_000, 8_500_000, (2026, 1, 15)),
            fee("Hostel", 4_500_050, 1_000_025, (2026, 1, 15)),
            fee("Exam", 300_001, 0, (2026, 3, 20)),
            fee("Refund adjustment", 100, 250, (2026, 4, 1)),
        ];
        let summary = summarize(&fees);
        assert_eq!(summary.pending, summary.total - summary.paid);
        assert_eq!(summary.total, 13_300_151);
        assert_eq!(summary.paid, 9_500_275);
        assert_eq!(summary.pending, 3_799_876);
    }

    #[test]
    fn empty_fee_list_sums_to_zero() {
        let summary = summarize(&[]);
        assert_eq!((summary.total, summary.paid, summary.pending), (0, 0, 0));
    }

    #[test]
    fn overview_orders_by_due_date() {
        let fees = vec![
            fee("Exam", 300_000, 0, (2026, 3, 20)),
            fee("Tuition", 8_500_000, 8_500_000, (2026, 1, 15)),
            fee("Lab", 800_000, 0, (2026, 3, 15)),
        ];
        let names: Vec<String> = overview(&fees)
            .fees
            .into_iter()
            .map(|f| f.description)
            .collect();
        assert_eq!(names, vec!["Tuition", "Lab", "Exam"]);
    }

    #[test]
    fn amounts_serialize_as_rupees() {
        let fees = vec![fee("Lab", 800_050, 0, (2026, 3, 15))];
        let json = serde_json::to_value(overview(&fees)).expect("serializes");
        assert_eq!(json["fees"][0]["amount"], 8000.5);
        assert_eq!(json["fees"][0]["dueDate"], "2026-03-15");
        assert_eq!(json["summary"]["pending"], 8000.5);
    }

    #[test]
    fn payment_message_embeds_formatted_amount() {
        assert_eq!(payment_message(800_000), "Payment of ₹8,000 successful");
    }
}
