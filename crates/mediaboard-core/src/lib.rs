pub mod sync;
pub mod diff;
pub mod expand;
pub mod platform;
pub mod throttle;
pub mod progress;
pub mod notify;
pub mod trigger;

pub use diff::{detect_movie_changes, detect_show_changes, DeltaDetector};
pub use expand::SeasonExpander;
pub use platform::resolve_platform;
pub use throttle::{next_eligible_run, should_run};
pub use progress::{ProgressObserver, ProgressTracker};
pub use notify::{ApiResult, UpdateFlags, UpdateSummary, WebhookNotifier};
pub use trigger::{RemoteTrigger, TriggerRequest, TriggerResponse};

pub use sync::{ReconcileError, ReconcileOptions, ReconcileOutcome, Reconciler};
