use mediaboard_models::{Platform, WatchProviders};
use tracing::trace;

/// Pick the board label for a title from its regional availability
///
/// Free offers win over subscription offers, which win over ad-supported tiers;
/// within a list the provider's own ordering decides. Missing regions, empty
/// lists and unknown providers all fall back to `Platform::Online`.
pub fn resolve_platform(providers: &WatchProviders, region: &str) -> Platform {
    let Some(availability) = providers.region(region) else {
        trace!(region, "No availability for region");
        return Platform::Online;
    };

    let offers = availability
        .free
        .iter()
        .chain(availability.flatrate.iter())
        .chain(availability.ads.iter());

    let mut unmatched = Vec::new();
    for entry in offers {
        match Platform::from_provider_name(&entry.provider_name) {
            Some(platform) => return platform,
            None => unmatched.push(entry.provider_name.as_str()),
        }
    }

    trace!(region, unmatched = ?unmatched, "No allow-listed provider");
    Platform::Online
}

#[cfg(test)]
mod tests {
    use super::*;
    use mediaboard_models::{ProviderEntry, RegionAvailability};

    fn entries(names: &[&str]) -> Vec<ProviderEntry> {
        names.iter().map(|n| ProviderEntry::new(*n)).collect()
    }

    fn gb(free: &[&str], flatrate: &[&str], ads: &[&str]) -> WatchProviders {
        WatchProviders::default().with_region(
            "GB",
            RegionAvailability {
                free: entries(free),
                flatrate: entries(flatrate),
                ads: entries(ads),
            },
        )
    }

    #[test]
    fn test_missing_region_is_online() {
        let providers = WatchProviders::default().with_region(
            "US",
            RegionAvailability {
                flatrate: entries(&["Netflix"]),
                ..Default::default()
            },
        );
        assert_eq!(resolve_platform(&providers, "GB"), Platform::Online);
        assert_eq!(resolve_platform(&WatchProviders::default(), "GB"), Platform::Online);
    }

    #[test]
    fn test_unlisted_providers_are_online() {
        let providers = gb(&["Channel 4"], &["Sky Go", "NOW"], &["Pluto TV"]);
        assert_eq!(resolve_platform(&providers, "GB"), Platform::Online);
    }

    #[test]
    fn test_free_wins_over_flatrate() {
        let providers = gb(&["BBC iPlayer"], &["Netflix"], &[]);
        assert_eq!(resolve_platform(&providers, "GB"), Platform::BbcIplayer);

        let itv = gb(&["ITV Hub"], &["Amazon Prime Video"], &[]);
        assert_eq!(resolve_platform(&itv, "GB"), Platform::Itvx);
    }

    #[test]
    fn test_flatrate_order_is_respected() {
        let providers = gb(&[], &["Sky Go", "Disney Plus", "Netflix"], &[]);
        assert_eq!(resolve_platform(&providers, "GB"), Platform::DisneyPlus);
    }

    #[test]
    fn test_unlisted_free_provider_falls_through_to_flatrate() {
        let providers = gb(&["Channel 4"], &["Apple TV Plus"], &[]);
        assert_eq!(resolve_platform(&providers, "GB"), Platform::AppleTvPlus);
    }

    #[test]
    fn test_ads_are_considered_last() {
        let providers = gb(&[], &["Sky Go"], &["ITVX"]);
        assert_eq!(resolve_platform(&providers, "GB"), Platform::Itvx);

        let flatrate_first = gb(&[], &["Netflix"], &["ITVX"]);
        assert_eq!(resolve_platform(&flatrate_first, "GB"), Platform::Netflix);
    }

    #[test]
    fn test_matching_ignores_case() {
        let providers = gb(&[], &["amazon PRIME video"], &[]);
        assert_eq!(resolve_platform(&providers, "GB"), Platform::PrimeVideo);
    }
}
