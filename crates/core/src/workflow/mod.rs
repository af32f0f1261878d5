pub mod projection;

pub use projection::{
    ProjectedStep, ProjectionError, ProjectionView, StepStatus, WorkflowProjection,
    WorkflowProjector,
};
