//! Ticket statistics aggregation.
//!
//! Powers both the `tickets://stats` resource and the `get_support_summary`
//! tool. Edge-case policy: averages are taken only over tickets that carry a
//! satisfaction rating (0 when none do), and the resolution rate is 0 for an
//! empty set. Missing categorical fields fall into an "Unknown" bucket.

use crate::types::{Ticket, STATUS_RESOLVED};
use serde::Serialize;
use std::collections::HashMap;

/// Bucket name for tickets missing a categorical field
const UNKNOWN_BUCKET: &str = "Unknown";

/// Aggregated view over a set of tickets
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TicketStats {
    pub total: usize,
    pub by_status: HashMap<String, usize>,
    pub by_priority: HashMap<String, usize>,
    pub by_category: HashMap<String, usize>,
    /// Mean satisfaction over rated tickets only; 0 when none are rated
    pub avg_satisfaction: f64,
    /// Percentage of tickets with resolved status; 0 for an empty set
    pub resolution_rate: f64,
}

impl TicketStats {
    /// Compute aggregates over a ticket collection
    pub fn compute(tickets: &[Ticket]) -> Self {
        let total = tickets.len();

        let mut by_status: HashMap<String, usize> = HashMap::new();
        let mut by_priority: HashMap<String, usize> = HashMap::new();
        let mut by_category: HashMap<String, usize> = HashMap::new();

        for ticket in tickets {
            *by_status.entry(ticket.status.clone()).or_insert(0) += 1;
            *by_priority
                .entry(bucket(ticket.priority.as_deref()))
                .or_insert(0) += 1;
            *by_category
                .entry(bucket(ticket.category.as_deref()))
                .or_insert(0) += 1;
        }

        let ratings: Vec<i64> = tickets
            .iter()
            .filter_map(|t| t.satisfaction_rating)
            .collect();
        let avg_satisfaction = if ratings.is_empty() {
            0.0
        } else {
            ratings.iter().sum::<i64>() as f64 / ratings.len() as f64
        };

        let resolved = tickets
            .iter()
            .filter(|t| t.status == STATUS_RESOLVED)
            .count();
        let resolution_rate = if total == 0 {
            0.0
        } else {
            resolved as f64 / total as f64 * 100.0
        };

        Self {
            total,
            by_status,
            by_priority,
            by_category,
            avg_satisfaction,
            resolution_rate,
        }
    }
}

fn bucket(value: Option<&str>) -> String {
    match value {
        Some(v) if !v.is_empty() => v.to_string(),
        _ => UNKNOWN_BUCKET.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ticket(status: &str, priority: Option<&str>, rating: Option<i64>) -> Ticket {
        Ticket {
            id: uuid::Uuid::new_v4().to_string(),
            ticket_number: "TKT-test".to_string(),
            contact_id: None,
            subject: "test".to_string(),
            description: None,
            status: status.to_string(),
            priority: priority.map(String::from),
            category: None,
            satisfaction_rating: rating,
            created_at: 0,
            updated_at: 0,
        }
    }

    #[test]
    fn test_empty_set_has_zero_rates() {
        let stats = TicketStats::compute(&[]);
        assert_eq!(stats.total, 0);
        assert_eq!(stats.avg_satisfaction, 0.0);
        assert_eq!(stats.resolution_rate, 0.0);
        assert!(stats.by_status.is_empty());
    }

    #[test]
    fn test_avg_satisfaction_over_rated_subset_only() {
        // 2 of 5 tickets rated (4 and 5): average is 4.5, not 9/5
        let tickets = vec![
            ticket("Open", None, Some(4)),
            ticket("Open", None, Some(5)),
            ticket("Open", None, None),
            ticket("Open", None, None),
            ticket("Open", None, None),
        ];
        let stats = TicketStats::compute(&tickets);
        assert_eq!(stats.avg_satisfaction, 4.5);
    }

    #[test]
    fn test_resolution_rate() {
        let tickets = vec![
            ticket("Resolved", None, None),
            ticket("Open", None, None),
            ticket("Resolved", None, None),
            ticket("Closed", None, None),
        ];
        let stats = TicketStats::compute(&tickets);
        assert_eq!(stats.resolution_rate, 50.0);
        assert_eq!(stats.by_status.get("Resolved"), Some(&2));
    }

    #[test]
    fn test_missing_fields_bucket_as_unknown() {
        let tickets = vec![
            ticket("Open", Some("High"), None),
            ticket("Open", None, None),
            ticket("Open", None, None),
        ];
        let stats = TicketStats::compute(&tickets);
        assert_eq!(stats.by_priority.get("High"), Some(&1));
        assert_eq!(stats.by_priority.get("Unknown"), Some(&2));
        assert_eq!(stats.by_category.get("Unknown"), Some(&3));
    }
}
