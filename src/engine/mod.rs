// Merge engine - independent of any presentation layer

pub mod batch;
pub mod core;
pub mod validate;
pub mod worker;

pub use batch::{
    BatchObserver, BatchOptions, BatchOutcome, BatchReport, BatchRequest, BatchRunner, BatchState,
    CancelToken, NullObserver, VideoReport,
};
pub use self::core::*;
pub use validate::{ValidationError, validate_request};
pub use worker::{BatchMessage, BatchWorker};
