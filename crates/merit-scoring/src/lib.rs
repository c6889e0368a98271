pub mod aggregate;
pub mod normalize;
pub mod registry;

pub use aggregate::{aggregate, max_possible};
pub use normalize::{normalize, MetricContribution};
pub use registry::{RegistryError, RuleKind, RuleRegistry, ScoringRule};
