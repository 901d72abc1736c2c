use serde::{Deserialize, Serialize};

use crate::core::{OriginLimits, PeriodCode, PeriodCodes, ZoneId};
use crate::error::{ReportError, ReportResult};
use crate::source::EndpointConfig;

/// Rendered and requested row limits for origin panels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct OriginLimitConfig {
    #[serde(default = "OriginLimits::rendered")]
    pub rendered: OriginLimits,
    #[serde(default = "OriginLimits::requested")]
    pub requested: OriginLimits,
}

impl Default for OriginLimitConfig {
    fn default() -> Self {
        Self {
            rendered: OriginLimits::rendered(),
            requested: OriginLimits::requested(),
        }
    }
}

/// Public engine bootstrap configuration.
///
/// Serializable so hosts can persist the portal setup next to their own
/// settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportEngineConfig {
    #[serde(default = "default_custom_period_code")]
    pub custom_period_code: PeriodCode,
    #[serde(default = "default_full_year_period_code")]
    pub full_year_period_code: PeriodCode,
    /// Preferred when the backend publishes it, otherwise the first zone wins.
    #[serde(default = "default_zone")]
    pub default_zone: ZoneId,
    #[serde(default = "default_bootstrap_timeout_ms")]
    pub bootstrap_timeout_ms: u64,
    #[serde(default = "default_catalog_timeout_ms")]
    pub catalog_timeout_ms: u64,
    #[serde(default)]
    pub origin_limits: OriginLimitConfig,
    /// Years offered when the filter options endpoint is down.
    #[serde(default = "default_fallback_years")]
    pub fallback_years: Vec<i32>,
    #[serde(default)]
    pub endpoints: EndpointConfig,
    /// Zones whose indicator cards stay visible with a zero current value.
    #[serde(default)]
    pub zero_reference_exempt_zones: Vec<ZoneId>,
}

impl Default for ReportEngineConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl ReportEngineConfig {
    #[must_use]
    pub fn new() -> Self {
        Self {
            custom_period_code: default_custom_period_code(),
            full_year_period_code: default_full_year_period_code(),
            default_zone: default_zone(),
            bootstrap_timeout_ms: default_bootstrap_timeout_ms(),
            catalog_timeout_ms: default_catalog_timeout_ms(),
            origin_limits: OriginLimitConfig::default(),
            fallback_years: default_fallback_years(),
            endpoints: EndpointConfig::default(),
            zero_reference_exempt_zones: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_period_codes(
        mut self,
        custom: impl Into<PeriodCode>,
        full_year: impl Into<PeriodCode>,
    ) -> Self {
        self.custom_period_code = custom.into();
        self.full_year_period_code = full_year.into();
        self
    }

    #[must_use]
    pub fn with_default_zone(mut self, zone: impl Into<ZoneId>) -> Self {
        self.default_zone = zone.into();
        self
    }

    #[must_use]
    pub fn with_bootstrap_timeout_ms(mut self, timeout_ms: u64) -> Self {
        self.bootstrap_timeout_ms = timeout_ms;
        self
    }

    #[must_use]
    pub fn with_catalog_timeout_ms(mut self, timeout_ms: u64) -> Self {
        self.catalog_timeout_ms = timeout_ms;
        self
    }

    #[must_use]
    pub fn with_origin_limits(mut self, rendered: OriginLimits, requested: OriginLimits) -> Self {
        self.origin_limits = OriginLimitConfig {
            rendered,
            requested,
        };
        self
    }

    #[must_use]
    pub fn with_fallback_years(mut self, years: impl IntoIterator<Item = i32>) -> Self {
        self.fallback_years = years.into_iter().collect();
        self
    }

    #[must_use]
    pub fn with_endpoints(mut self, endpoints: EndpointConfig) -> Self {
        self.endpoints = endpoints;
        self
    }

    #[must_use]
    pub fn with_zero_reference_exempt_zone(mut self, zone: impl Into<ZoneId>) -> Self {
        self.zero_reference_exempt_zones.push(zone.into());
        self
    }

    #[must_use]
    pub fn period_codes(&self) -> PeriodCodes {
        PeriodCodes::new(
            self.custom_period_code.clone(),
            self.full_year_period_code.clone(),
        )
    }

    #[must_use]
    pub fn is_zero_reference_exempt(&self, zone: &ZoneId) -> bool {
        self.zero_reference_exempt_zones.contains(zone)
    }

    pub fn validate(&self) -> ReportResult<()> {
        if self.custom_period_code.is_empty() || self.full_year_period_code.is_empty() {
            return Err(ReportError::InvalidData(
                "period sentinel codes must not be empty".to_owned(),
            ));
        }
        if self.custom_period_code == self.full_year_period_code {
            return Err(ReportError::InvalidData(
                "custom and full-year period codes must differ".to_owned(),
            ));
        }
        if self.default_zone.is_empty() {
            return Err(ReportError::InvalidData(
                "default zone must not be empty".to_owned(),
            ));
        }
        if self.bootstrap_timeout_ms == 0 || self.catalog_timeout_ms == 0 {
            return Err(ReportError::InvalidData(
                "bootstrap and catalog timeouts must be > 0".to_owned(),
            ));
        }
        if self.origin_limits.rendered.has_zero() || self.origin_limits.requested.has_zero() {
            return Err(ReportError::InvalidData(
                "origin limits must be > 0".to_owned(),
            ));
        }
        if self.fallback_years.is_empty() {
            return Err(ReportError::InvalidData(
                "fallback years must not be empty".to_owned(),
            ));
        }
        Ok(())
    }

    pub fn from_json_str(input: &str) -> ReportResult<Self> {
        let config: Self = serde_json::from_str(input)
            .map_err(|e| ReportError::InvalidData(format!("failed to parse config: {e}")))?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_json_pretty(&self) -> ReportResult<String> {
        serde_json::to_string_pretty(self)
            .map_err(|e| ReportError::InvalidData(format!("failed to serialize config: {e}")))
    }
}

fn default_custom_period_code() -> PeriodCode {
    PeriodCodes::default().custom
}

fn default_full_year_period_code() -> PeriodCode {
    PeriodCodes::default().full_year
}

fn default_zone() -> ZoneId {
    ZoneId::from("CANTAL")
}

fn default_bootstrap_timeout_ms() -> u64 {
    5_000
}

fn default_catalog_timeout_ms() -> u64 {
    5_000
}

fn default_fallback_years() -> Vec<i32> {
    (2019..=2025).rev().collect()
}
