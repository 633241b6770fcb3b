//! Environment a scheduler is evaluated in.

use chrono::{DateTime, NaiveDate, Utc};
use chrono_tz::Tz;
use std::sync::Arc;

use super::error::{Result, SchedulerError};
use crate::common::constants::DEFAULT_MESSAGE_TYPE;
use crate::config::Config;
use crate::geo::{GeoLocation, SolarCalculator, SunriseSunsetInfo, SunriseSunsetProvider};
use crate::time::{RealTimeSource, TimeSource};

/// Timezone, location, solar provider and clock shared by every schedule
/// instance of one scheduler.
#[derive(Clone)]
pub struct SchedulerContext {
    calculator: Arc<dyn SunriseSunsetProvider>,
    clock: Arc<dyn TimeSource>,
    tz: Tz,
    location: Option<GeoLocation>,
    default_message_type: String,
}

impl SchedulerContext {
    pub fn new(
        calculator: Arc<dyn SunriseSunsetProvider>,
        clock: Arc<dyn TimeSource>,
        tz: Tz,
    ) -> Self {
        Self {
            calculator,
            clock,
            tz,
            location: None,
            default_message_type: DEFAULT_MESSAGE_TYPE.to_string(),
        }
    }

    /// Production context: system clock and the astronomical calculator.
    pub fn from_config(config: &Config) -> anyhow::Result<Self> {
        let context = Self::new(Arc::new(SolarCalculator), Arc::new(RealTimeSource), config.timezone()?)
            .with_default_message_type(config.default_message_type());
        Ok(match config.location()? {
            Some(location) => context.with_location(location),
            None => context,
        })
    }

    pub fn with_location(mut self, location: GeoLocation) -> Self {
        self.location = Some(location);
        self
    }

    /// Message type given to commands created without one.
    pub fn with_default_message_type(mut self, message_type: impl Into<String>) -> Self {
        self.default_message_type = message_type.into();
        self
    }

    pub fn with_clock(mut self, clock: Arc<dyn TimeSource>) -> Self {
        self.clock = clock;
        self
    }

    pub fn time_zone(&self) -> Tz {
        self.tz
    }

    pub fn location(&self) -> Option<&GeoLocation> {
        self.location.as_ref()
    }

    pub fn default_message_type(&self) -> &str {
        &self.default_message_type
    }

    pub fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }

    /// Calendar date of `instant` in the scheduler's timezone.
    pub fn local_date(&self, instant: DateTime<Utc>) -> NaiveDate {
        instant.with_timezone(&self.tz).date_naive()
    }

    pub(crate) fn set_time_zone(&mut self, tz: Tz) {
        self.tz = tz;
    }

    pub(crate) fn set_location(&mut self, location: GeoLocation) {
        self.location = Some(location);
    }

    /// Sunrise and sunset on `date` at the scheduler's location.
    pub(crate) fn sunrise_sunset(&self, date: NaiveDate) -> Result<SunriseSunsetInfo> {
        let location = self.location.as_ref().ok_or(SchedulerError::LocationRequired)?;
        self.calculator
            .calculate(date, location)
            .map_err(|e| SchedulerError::Solar(format!("{e:#}")))
    }
}
