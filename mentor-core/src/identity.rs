//! Stable, opaque user identity persisted in the client-state store.
//!
//! The identity is minted locally on first use and never sent anywhere except
//! as the `user_id` of backend requests. There is no server round-trip.

use std::time::{SystemTime, UNIX_EPOCH};

use rand::Rng;
use tokio_rusqlite::Connection;
use tracing::{debug, warn};

use crate::db;

/// Fixed key the identity is stored under.
pub const USER_ID_KEY: &str = "user_id";

const SUFFIX_LEN: usize = 9;
const BASE36: &[u8] = b"0123456789abcdefghijklmnopqrstuvwxyz";

/// Returns the persisted user identity, creating and storing it on first use.
///
/// With `store = None`, or when the store cannot be read or written, a fresh
/// identity is returned on every call and nothing is persisted. Callers must
/// tolerate an unstable identity in that case.
pub async fn get_or_create_user_id(store: Option<&Connection>) -> String {
    let Some(conn) = store else {
        warn!("client-state store unavailable; using an ephemeral user id");
        return generate_user_id();
    };

    match db::get_value(conn, USER_ID_KEY).await {
        Ok(Some(existing)) => return existing,
        Ok(None) => {}
        Err(e) => {
            warn!(error = %e, "failed to read user id; using an ephemeral one");
            return generate_user_id();
        }
    }

    let fresh = generate_user_id();
    match db::put_value_if_absent(conn, USER_ID_KEY, &fresh).await {
        Ok(stored) => {
            debug!(user_id = %stored, "user id created");
            stored
        }
        Err(e) => {
            warn!(error = %e, "failed to persist user id; it will not survive a restart");
            fresh
        }
    }
}

/// Mints `user_<epoch millis>_<9 base36 chars>`.
pub fn generate_user_id() -> String {
    let millis = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis();
    let mut rng = rand::thread_rng();
    let suffix: String = (0..SUFFIX_LEN)
        .map(|_| BASE36[rng.gen_range(0..BASE36.len())] as char)
        .collect();
    format!("user_{millis}_{suffix}")
}

/// Checks the `user_<digits>_<9 alphanumerics>` shape.
pub fn is_well_formed(id: &str) -> bool {
    let Some(rest) = id.strip_prefix("user_") else {
        return false;
    };
    let Some((millis, suffix)) = rest.split_once('_') else {
        return false;
    };
    !millis.is_empty()
        && millis.bytes().all(|b| b.is_ascii_digit())
        && suffix.len() == SUFFIX_LEN
        && suffix.bytes().all(|b| b.is_ascii_alphanumeric())
}
