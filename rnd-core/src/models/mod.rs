mod assessment;
mod calculation_result;
mod state_credit;
mod year_financials;

pub use assessment::{
    AssessmentInput, EntityType, HistoricalYear, PlannedInitiative, SpendCategory,
};
pub use calculation_result::{
    CalculationResult, FutureProjection, LookbackSummary, ProfileRequirement, QsbAssessment,
    StateCreditSummary,
};
pub use state_credit::{StateCreditMethod, StateCreditRow, StateCreditTable};
pub use year_financials::{CreditMethod, FeeBreakdown, YearFinancials, YearKind};
