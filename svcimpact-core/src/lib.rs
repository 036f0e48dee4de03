pub mod error;
pub mod model;

// Snapshot and graph structure
pub mod adjacency;
pub mod topology;

// Evaluation pipeline
pub mod health;
pub mod impact;
pub mod view;

// Health sources and monitor handling
pub mod alerts;
pub mod monitor;
pub mod quality;

// Suggested edges and binding targets
pub mod suggest;

pub mod config;
pub mod engine;

pub use config::{PreparedSnapshot, Settings, SnapshotFile};
pub use engine::{Engine, EngineReport};
pub use error::{ConfigError, ValidationError, Warning};
pub use topology::{SnapshotInput, TopologySnapshot};
