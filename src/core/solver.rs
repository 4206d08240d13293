use super::annuity::required_monthly_contribution;
use super::types::{Goal, GoalPlan, GoalPriority, GoalProgress};

pub const DEFAULT_GOAL_RETURN_PERCENT: f64 = 12.0;

pub fn default_goals() -> Vec<Goal> {
    vec![
        Goal {
            id: 1,
            name: "Child Education".to_string(),
            amount: 2_000_000.0,
            years: 18.0,
            priority: GoalPriority::High,
        },
        Goal {
            id: 2,
            name: "Home Purchase".to_string(),
            amount: 5_000_000.0,
            years: 10.0,
            priority: GoalPriority::Medium,
        },
        Goal {
            id: 3,
            name: "Retirement".to_string(),
            amount: 10_000_000.0,
            years: 30.0,
            priority: GoalPriority::High,
        },
        Goal {
            id: 4,
            name: "Emergency Fund".to_string(),
            amount: 500_000.0,
            years: 2.0,
            priority: GoalPriority::High,
        },
    ]
}

/// Required SIP for each goal and how far `current_sip` goes towards it.
///
/// Each goal is judged against the full current SIP on its own; the totals
/// compare the current SIP with the sum of all requirements.
pub fn plan_goals(goals: &[Goal], current_sip: f64, annual_percent: f64) -> GoalPlan {
    let current_sip = current_sip.max(0.0);
    let progress: Vec<GoalProgress> = goals
        .iter()
        .map(|goal| {
            let required_sip =
                required_monthly_contribution(goal.amount, goal.years, annual_percent);
            let is_affordable = required_sip <= current_sip;
            let progress_percentage = if is_affordable {
                100.0
            } else {
                (current_sip / required_sip * 100.0).min(100.0)
            };
            GoalProgress {
                goal: goal.clone(),
                required_sip,
                is_affordable,
                progress_percentage,
            }
        })
        .collect();

    let total_required_sip: f64 = progress.iter().map(|p| p.required_sip).sum();
    GoalPlan {
        current_sip,
        annual_return: annual_percent,
        goals: progress,
        total_required_sip,
        shortfall: (total_required_sip - current_sip).max(0.0),
        surplus: (current_sip - total_required_sip).max(0.0),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::annuity::monthly_rate;

    fn assert_approx_tol(actual: f64, expected: f64, tol: f64) {
        assert!(
            (actual - expected).abs() <= tol,
            "expected {expected}, got {actual}, tolerance {tol}"
        );
    }

    #[test]
    fn required_sip_uses_annuity_inversion() {
        let plan = plan_goals(&default_goals(), 5_000.0, DEFAULT_GOAL_RETURN_PERCENT);
        let home = &plan.goals[1];
        let r = monthly_rate(12.0);
        let expected = 5_000_000.0 * r / ((1.0 + r).powi(120) - 1.0);
        assert_approx_tol(home.required_sip, expected, 1e-6);
        assert!(!home.is_affordable);
        assert_approx_tol(home.progress_percentage, 5_000.0 / expected * 100.0, 1e-9);
    }

    #[test]
    fn affordable_goals_report_full_progress() {
        let goals = vec![Goal {
            id: 9,
            name: "Vacation".to_string(),
            amount: 100_000.0,
            years: 5.0,
            priority: GoalPriority::Low,
        }];
        let plan = plan_goals(&goals, 50_000.0, 12.0);
        assert!(plan.goals[0].is_affordable);
        assert_approx_tol(plan.goals[0].progress_percentage, 100.0, 1e-12);
        assert_eq!(plan.shortfall, 0.0);
        assert_approx_tol(plan.surplus, 50_000.0 - plan.total_required_sip, 1e-9);
    }

    #[test]
    fn totals_sum_every_goal() {
        let goals = default_goals();
        let plan = plan_goals(&goals, 10_000.0, 12.0);
        let expected: f64 = goals
            .iter()
            .map(|g| required_monthly_contribution(g.amount, g.years, 12.0))
            .sum();
        assert_approx_tol(plan.total_required_sip, expected, 1e-9);
        assert_approx_tol(plan.shortfall, expected - 10_000.0, 1e-9);
        assert_eq!(plan.surplus, 0.0);
    }

    #[test]
    fn zero_current_sip_makes_no_progress() {
        let plan = plan_goals(&default_goals(), 0.0, 12.0);
        assert!(plan.goals.iter().all(|g| g.progress_percentage == 0.0));
        assert!(plan.goals.iter().all(|g| !g.is_affordable));
    }

    #[test]
    fn empty_goal_list_needs_nothing() {
        let plan = plan_goals(&[], 1_000.0, 12.0);
        assert_eq!(plan.total_required_sip, 0.0);
        assert_approx_tol(plan.surplus, 1_000.0, 1e-12);
    }
}
