//! Configuration validation.

use anyhow::Result;

use super::Config;

/// Reject configurations the scheduler cannot run with.
pub fn validate_config(config: &Config) -> Result<()> {
    if let Some(lat) = config.latitude
        && !(-90.0..=90.0).contains(&lat)
    {
        anyhow::bail!("latitude must be between -90 and 90 degrees (got {})", lat);
    }

    if let Some(lon) = config.longitude
        && !(-180.0..=180.0).contains(&lon)
    {
        anyhow::bail!(
            "longitude must be between -180 and 180 degrees (got {})",
            lon
        );
    }

    if config.latitude.is_some() != config.longitude.is_some() {
        anyhow::bail!("latitude and longitude must be set together");
    }

    config.timezone()?;

    if let Some(message_type) = &config.default_message_type
        && message_type.trim().is_empty()
    {
        anyhow::bail!("default_message_type must not be empty");
    }

    if let Some(dir) = &config.state_dir
        && dir.as_os_str().is_empty()
    {
        anyhow::bail!("state_dir must not be empty");
    }

    Ok(())
}
