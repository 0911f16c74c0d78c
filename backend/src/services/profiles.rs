//! Ordered network/client-identity profiles tried until one works.

use crate::error::EngineError;
use log::{info, warn};
use std::future::Future;

const CHROME_DESKTOP_UA: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";
const IPHONE_UA: &str = "Mozilla/5.0 (iPhone; CPU iPhone OS 17_0 like Mac OS X) AppleWebKit/605.1.15 (KHTML, like Gecko) Version/17.0 Mobile/15E148 Safari/604.1";
const IPAD_UA: &str = "Mozilla/5.0 (iPad; CPU OS 17_0 like Mac OS X) AppleWebKit/605.1.15 (KHTML, like Gecko) Version/17.0 Mobile/15E148 Safari/604.1";
const FIREFOX_ANDROID_UA: &str = "Mozilla/5.0 (Android 10; Mobile; rv:91.0) Gecko/91.0 Firefox/91.0";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClientProfile {
    /// Player client hint handed to the extractor.
    pub player_client: &'static str,
    pub user_agent: &'static str,
    pub socket_timeout_secs: u64,
    pub retries: u32,
}

pub const PROBE_PROFILES: [ClientProfile; 3] = [
    ClientProfile {
        player_client: "android",
        user_agent: CHROME_DESKTOP_UA,
        socket_timeout_secs: 60,
        retries: 1,
    },
    ClientProfile {
        player_client: "ios",
        user_agent: IPHONE_UA,
        socket_timeout_secs: 30,
        retries: 1,
    },
    ClientProfile {
        player_client: "android_embedded",
        user_agent: IPAD_UA,
        socket_timeout_secs: 15,
        retries: 1,
    },
];

pub const DOWNLOAD_PROFILES: [ClientProfile; 3] = [
    ClientProfile {
        player_client: "ios",
        user_agent: IPHONE_UA,
        socket_timeout_secs: 60,
        retries: 1,
    },
    ClientProfile {
        player_client: "android_embedded",
        user_agent: IPAD_UA,
        socket_timeout_secs: 30,
        retries: 1,
    },
    ClientProfile {
        player_client: "android",
        user_agent: FIREFOX_ANDROID_UA,
        socket_timeout_secs: 15,
        retries: 1,
    },
];

/// Run `attempt` against each profile in order, returning the first success
/// or the last failure once the list is exhausted.
pub async fn first_success<T, F, Fut>(profiles: &[ClientProfile], mut attempt: F) -> Result<T, EngineError>
where
    F: FnMut(ClientProfile) -> Fut,
    Fut: Future<Output = Result<T, EngineError>>,
{
    let mut last_error = EngineError::NoProfiles;

    for (i, profile) in profiles.iter().enumerate() {
        match attempt(*profile).await {
            Ok(value) => {
                if i > 0 {
                    info!(
                        "Profile '{}' succeeded after {} failed attempt(s)",
                        profile.player_client, i
                    );
                }
                return Ok(value);
            }
            Err(e) => {
                warn!(
                    "Attempt {}/{} with client '{}' failed: {e}",
                    i + 1,
                    profiles.len(),
                    profile.player_client
                );
                last_error = e;
            }
        }
    }

    Err(last_error)
}
