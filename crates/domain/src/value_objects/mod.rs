pub mod comparison;
pub mod exposure;
pub mod pagination;
pub mod parameters;

pub use comparison::{
    ComparisonMetrics, HistoryEntry, MetricRange, SimulationComparison, SimulationHistory,
};
pub use exposure::ExposureMatrix;
pub use pagination::{BankPage, ListQuery, Pagination, SimulationPage};
pub use parameters::{ParameterUpdate, SimulationParameters};
