//! Login state for Amber Monitor
//!
//! A session counts as authenticated while an auth token is stored. Login
//! records the API key, mints a token and remembers the account's active
//! site; logout clears all three values.

use crate::amber::{PricingApi, Site, SiteStatus};
use crate::error::{MonitorError, Result};
use crate::logging::get_logger;
use crate::store::{Session, SessionStore};

/// Whether a login has completed and not been undone
pub fn is_authenticated(store: &dyn SessionStore) -> bool {
    store
        .load()
        .map(|s| s.auth_token().is_some())
        .unwrap_or(false)
}

/// Forget the API key, site id and auth token
pub fn logout(store: &dyn SessionStore) -> Result<()> {
    store.clear()?;
    get_logger("auth").info("Logged out; session cleared");
    Ok(())
}

/// First active site of the account
pub fn select_active_site(sites: &[Site]) -> Result<&Site> {
    if sites.is_empty() {
        return Err(MonitorError::NoSitesFound);
    }
    sites
        .iter()
        .find(|site| site.status == SiteStatus::Active)
        .ok_or(MonitorError::NoActiveSite)
}

/// Store the key, discover the active site and mark the session authenticated
///
/// On failure the auth token is removed again while the API key stays
/// stored, so the next attempt can reuse it.
pub async fn login(
    store: &dyn SessionStore,
    api: &dyn PricingApi,
    api_key: &str,
) -> Result<Site> {
    let logger = get_logger("auth");
    let api_key = api_key.trim();
    if api_key.is_empty() {
        return Err(MonitorError::validation("api_key", "API key is required"));
    }

    store.save(&Session {
        api_key: Some(api_key.to_string()),
        site_id: None,
        auth_token: Some(uuid::Uuid::new_v4().to_string()),
    })?;

    let outcome = match api.get_sites().await {
        Ok(sites) => select_active_site(&sites).cloned(),
        Err(e) => Err(e),
    };

    match outcome {
        Ok(site) => {
            store.update(&mut |s: &mut Session| s.site_id = Some(site.id.clone()))?;
            logger.info(&format!("Logged in; active site {}", site.id));
            Ok(site)
        }
        Err(e) => {
            if let Err(rollback) = store.update(&mut |s: &mut Session| {
                s.auth_token = None;
                s.site_id = None;
            }) {
                logger.error(&format!("Could not clear auth token: {}", rollback));
            }
            logger.warn(&format!("Login failed: {}", e));
            Err(e)
        }
    }
}
