pub mod address;
pub mod classify;
pub mod dedup;
pub mod error;
pub mod facts;
pub mod orchestrator;
pub mod queries;
pub mod retry;
pub mod same_location;
pub mod source;

pub use address::AddressParser;
pub use classify::{normalize_name, Classifier};
pub use dedup::dedupe_listings;
pub use error::{SinkError, SourceError};
pub use facts::{CountExtractor, ReconcilePolicy, ReviewText};
pub use orchestrator::{
    Orchestrator, OrchestratorConfig, RunReport, CHECKPOINT_LABEL, FINAL_LABEL,
};
pub use queries::QueryPlanner;
pub use retry::RetryPolicy;
pub use same_location::{Evidence, SameLocationResolver, Verdict};
pub use source::{
    AnchorFacts, ListingSource, LookupSource, RawListing, ResultSink, Session, SessionFactory,
};
