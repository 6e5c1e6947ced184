pub mod dispatcher;
pub mod guard;

pub use dispatcher::{DispatchReport, RequestDispatcher};
pub use guard::{AnalysisGuard, EngineLoader};
