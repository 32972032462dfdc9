mod logging;
mod metering;
mod recording;

pub use self::logging::TracingObservationHandler;
pub use self::metering::MetricsObservationHandler;
pub use self::recording::RecordingObservationHandler;
