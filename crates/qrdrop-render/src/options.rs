use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{RenderError, RenderResult};

/// Largest accepted `module_size`. Keeps the output image bounded.
pub const MAX_MODULE_SIZE: u32 = 64;

/// Largest accepted `quiet_zone`, in modules.
pub const MAX_QUIET_ZONE: u32 = 16;

/// QR error-correction level.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EcLevel {
    /// Recovers roughly 7% damage.
    #[default]
    Low,
    /// Roughly 15%.
    Medium,
    /// Roughly 25%.
    Quartile,
    /// Roughly 30%.
    High,
}

impl EcLevel {
    /// The single-letter name used by QR tooling.
    pub fn letter(self) -> char {
        match self {
            Self::Low => 'L',
            Self::Medium => 'M',
            Self::Quartile => 'Q',
            Self::High => 'H',
        }
    }
}

impl From<EcLevel> for qrcode::EcLevel {
    fn from(level: EcLevel) -> Self {
        match level {
            EcLevel::Low => qrcode::EcLevel::L,
            EcLevel::Medium => qrcode::EcLevel::M,
            EcLevel::Quartile => qrcode::EcLevel::Q,
            EcLevel::High => qrcode::EcLevel::H,
        }
    }
}

impl fmt::Display for EcLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.letter())
    }
}

impl FromStr for EcLevel {
    type Err = RenderError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "l" | "low" => Ok(Self::Low),
            "m" | "medium" => Ok(Self::Medium),
            "q" | "quartile" => Ok(Self::Quartile),
            "h" | "high" => Ok(Self::High),
            _ => Err(RenderError::InvalidOptions(format!(
                "unknown error-correction level '{s}' (expected L, M, Q or H)"
            ))),
        }
    }
}

/// How a code image is drawn.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderOptions {
    pub ec_level: EcLevel,
    /// Pixels per module side.
    pub module_size: u32,
    /// Light border around the symbol, in modules.
    pub quiet_zone: u32,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            ec_level: EcLevel::Low,
            module_size: 10,
            quiet_zone: 4,
        }
    }
}

impl RenderOptions {
    pub fn with_ec_level(mut self, ec_level: EcLevel) -> Self {
        self.ec_level = ec_level;
        self
    }

    pub fn with_module_size(mut self, module_size: u32) -> Self {
        self.module_size = module_size;
        self
    }

    pub fn validate(&self) -> RenderResult<()> {
        if self.module_size == 0 || self.module_size > MAX_MODULE_SIZE {
            return Err(RenderError::InvalidOptions(format!(
                "module size must be between 1 and {MAX_MODULE_SIZE}, got {}",
                self.module_size
            )));
        }
        if self.quiet_zone > MAX_QUIET_ZONE {
            return Err(RenderError::InvalidOptions(format!(
                "quiet zone must be at most {MAX_QUIET_ZONE} modules, got {}",
                self.quiet_zone
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let opts = RenderOptions::default();
        assert_eq!(opts.ec_level, EcLevel::Low);
        assert_eq!(opts.module_size, 10);
        assert_eq!(opts.quiet_zone, 4);
        assert!(opts.validate().is_ok());
    }

    #[test]
    fn zero_module_size_is_invalid() {
        let opts = RenderOptions::default().with_module_size(0);
        assert!(matches!(opts.validate(), Err(RenderError::InvalidOptions(_))));
    }

    #[test]
    fn oversized_quiet_zone_is_invalid() {
        let opts = RenderOptions {
            quiet_zone: MAX_QUIET_ZONE + 1,
            ..RenderOptions::default()
        };
        assert!(opts.validate().is_err());
    }

    #[test]
    fn ec_level_parsing() {
        assert_eq!("L".parse::<EcLevel>().unwrap(), EcLevel::Low);
        assert_eq!("q".parse::<EcLevel>().unwrap(), EcLevel::Quartile);
        assert_eq!("High".parse::<EcLevel>().unwrap(), EcLevel::High);
        assert!("X".parse::<EcLevel>().is_err());
        assert_eq!(EcLevel::Medium.to_string(), "M");
    }

    #[test]
    fn partial_options_deserialize_with_defaults() {
        let opts: RenderOptions = serde_json::from_str(r#"{"ec_level":"high"}"#).unwrap();
        assert_eq!(opts.ec_level, EcLevel::High);
        assert_eq!(opts.module_size, 10);
    }
}
