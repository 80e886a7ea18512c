pub mod change;
pub mod media;
pub mod movie;
pub mod platform;
pub mod provider;
pub mod show;
pub mod throttle;

pub use change::{Change, ChangeRecord};
pub use media::MediaKind;
pub use movie::{NewMovie, TrackedMovie};
pub use platform::Platform;
pub use provider::{
    EpisodeDescriptor, ProviderEntry, ProviderMovie, ProviderSeason, ProviderShow, RegionAvailability,
    SearchResult, SeasonDescriptor, WatchProviders,
};
pub use show::{Episode, NewEpisode, NewSeason, NewShow, Season, TrackedShow};
pub use throttle::ThrottleState;
