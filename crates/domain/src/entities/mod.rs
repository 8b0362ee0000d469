pub mod bank;
pub mod results;
pub mod share;
pub mod simulation;
pub mod user;

// Re-export for easier access
pub use bank::{Bank, BankImportReport, BankInput};
pub use results::{
    Improvements, RawData, ScenarioSummary, SimulationResults, StatisticalAnalysis,
};
pub use share::{ShareLink, ShareRequest, SharedSimulation, SharedSimulationSummary};
pub use simulation::{NewSimulation, Simulation, SimulationStatusReport};
pub use user::{AuthSession, Credentials, RegisterRequest, User};
