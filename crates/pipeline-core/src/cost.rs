//! Static step-cost table and aggregator (§4.1).
//!
//! Pure: no side effects, no failure modes. Cost is a fixed table for
//! this version of the pipeline; dynamic cost modelling is explicitly
//! out of scope.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use crate::domain::StepType;

/// Cost, in credits, of a single step type.
pub fn estimate_step_cost(step_type: StepType) -> Decimal {
    match step_type {
        StepType::Analysis => dec!(50),
        StepType::UserStories => dec!(30),
        StepType::CodeSkeleton => dec!(40),
        StepType::TestCases => dec!(30),
    }
}

/// Cost, in credits, of running the full four-step pipeline.
pub fn estimate_pipeline_cost() -> Decimal {
    [
        StepType::Analysis,
        StepType::UserStories,
        StepType::CodeSkeleton,
        StepType::TestCases,
    ]
    .into_iter()
    .map(estimate_step_cost)
    .sum()
}
