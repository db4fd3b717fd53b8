pub mod aggregate;
pub mod cli;
pub mod clock;
pub mod config;
pub mod display;
pub mod error;
pub mod history;
pub mod live;
pub mod metrics;
pub mod sensor;
pub mod session;
pub mod storage;
pub mod types;

pub use aggregate::{MetricAggregator, RunningAggregate, SampleOutcome};
pub use clock::ElapsedTimeClock;
pub use config::{load_config, save_config, WorkoutConfig};
pub use error::{HistoryLoadError, WorkoutError};
pub use history::{WorkoutHistoryStore, HISTORY_KEY};
pub use live::{LiveHandle, LiveWorkout, SessionEvent};
pub use sensor::{SensorSession, SensorState, SimulatedSensor};
pub use session::{
    request_authorization, LiveStats, WorkoutAction, WorkoutSessionController, WorkoutState,
};
pub use storage::{FileStore, KeyValueStore, MemoryStore};
pub use types::{MetricChannel, RawSample, StatKind, StatSample, WorkoutHistory, WorkoutRecord};
