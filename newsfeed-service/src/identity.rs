//! Local device identity.
//!
//! A `{id, username}` pair written to a JSON file on first run and read on
//! every run thereafter. Stands in for real authentication; the username is
//! display-only and never enforced server-side.

use std::fs;
use std::path::Path;

use chrono::Utc;
use rand::Rng;
use uuid::Uuid;

use crate::error::{AppError, Result};
use crate::models::LocalUser;

/// Load the stored identity, creating and persisting one if absent.
pub fn load_or_create(path: &Path) -> Result<LocalUser> {
    if path.exists() {
        let raw = fs::read_to_string(path)
            .map_err(|e| AppError::Internal(format!("failed to read identity file: {e}")))?;
        let user = serde_json::from_str(&raw)?;
        return Ok(user);
    }

    let user = LocalUser {
        id: Uuid::new_v4(),
        username: generate_username(),
        created_at: Utc::now(),
    };

    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)
                .map_err(|e| AppError::Internal(format!("failed to create identity dir: {e}")))?;
        }
    }

    let raw = serde_json::to_string_pretty(&user)?;
    fs::write(path, raw)
        .map_err(|e| AppError::Internal(format!("failed to write identity file: {e}")))?;

    Ok(user)
}

fn generate_username() -> String {
    let mut rng = rand::thread_rng();
    format!("user_{:06}", rng.gen_range(0..1_000_000))
}
