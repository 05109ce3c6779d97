use std::env;
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr, SocketAddr};

use crate::params::CartonizationParams;

/// Complete application configuration, loaded from environment variables or default values.
#[derive(Clone, Debug)]
pub struct AppConfig {
    pub api: ApiConfig,
    pub engine: EngineConfig,
}

impl AppConfig {
    /// Creates a configuration from the currently available environment variables.
    pub fn from_env() -> Self {
        Self {
            api: ApiConfig::from_env(),
            engine: EngineConfig::from_env(),
        }
    }
}

/// Configuration for the API server.
#[derive(Clone, Debug)]
pub struct ApiConfig {
    bind_ip: IpAddr,
    display_host: String,
    port: u16,
}

impl ApiConfig {
    const DEFAULT_HOST: &'static str = "0.0.0.0";
    const DEFAULT_BIND_IP: IpAddr = IpAddr::V4(Ipv4Addr::UNSPECIFIED);
    const DEFAULT_PORT: u16 = 8080;
    const HOST_VAR: &'static str = "CARTONIZER_API_HOST";
    const PORT_VAR: &'static str = "CARTONIZER_API_PORT";

    fn from_env() -> Self {
        Self::from_values(env_string(Self::HOST_VAR), env_string(Self::PORT_VAR))
    }

    fn from_values(host: Option<String>, port: Option<String>) -> Self {
        let host_value = host.unwrap_or_else(|| Self::DEFAULT_HOST.to_string());
        let (bind_ip, display_host) = match host_value.parse::<IpAddr>() {
            Ok(ip) => (ip, host_value),
            Err(err) => {
                tracing::warn!(
                    "could not parse {} ('{}'): {}; using {}",
                    Self::HOST_VAR,
                    host_value,
                    err,
                    Self::DEFAULT_HOST
                );
                (Self::DEFAULT_BIND_IP, Self::DEFAULT_HOST.to_string())
            }
        };

        let port = match port {
            Some(raw) => match raw.parse::<u16>() {
                Ok(value) if value != 0 => value,
                Ok(_) => {
                    tracing::warn!(
                        "{} must not be 0; using {}",
                        Self::PORT_VAR,
                        Self::DEFAULT_PORT
                    );
                    Self::DEFAULT_PORT
                }
                Err(err) => {
                    tracing::warn!(
                        "could not parse {} ('{}'): {}; using {}",
                        Self::PORT_VAR,
                        raw,
                        err,
                        Self::DEFAULT_PORT
                    );
                    Self::DEFAULT_PORT
                }
            },
            None => Self::DEFAULT_PORT,
        };

        Self {
            bind_ip,
            display_host,
            port,
        }
    }

    /// Socket address to bind the server to.
    pub fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.bind_ip, self.port)
    }

    /// Visible hostname for logging and hints.
    pub fn display_host(&self) -> &str {
        &self.display_host
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    /// Indicates whether binding to all interfaces.
    pub fn binds_to_all_interfaces(&self) -> bool {
        match self.bind_ip {
            IpAddr::V4(addr) => addr == Ipv4Addr::UNSPECIFIED,
            IpAddr::V6(addr) => addr == Ipv6Addr::UNSPECIFIED,
        }
    }

    /// Checks whether the hostname matches the default value.
    pub fn uses_default_host(&self) -> bool {
        self.display_host == Self::DEFAULT_HOST
    }
}

/// Default business parameters for engines created by the service.
#[derive(Clone, Debug, Default)]
pub struct EngineConfig {
    params: CartonizationParams,
}

impl EngineConfig {
    const FILL_RATE_VAR: &'static str = "CARTONIZER_FILL_RATE_THRESHOLD";
    const MAX_WEIGHT_VAR: &'static str = "CARTONIZER_MAX_PACKAGE_WEIGHT";
    const DIM_FACTOR_VAR: &'static str = "CARTONIZER_DIMENSIONAL_WEIGHT_FACTOR";
    const EFFICIENCY_VAR: &'static str = "CARTONIZER_PACKING_EFFICIENCY";
    const OPTIMIZE_COST_VAR: &'static str = "CARTONIZER_OPTIMIZE_FOR_COST";
    const OPTIMIZE_SPACE_VAR: &'static str = "CARTONIZER_OPTIMIZE_FOR_SPACE";
    const PARTIAL_FILL_VAR: &'static str = "CARTONIZER_ALLOW_PARTIAL_FILL";

    fn from_env() -> Self {
        let fill_rate_threshold = load_f64_with_warning(
            Self::FILL_RATE_VAR,
            CartonizationParams::DEFAULT_FILL_RATE_THRESHOLD,
            |value| (0.0..=100.0).contains(&value),
            "must be between 0 and 100",
            "Adjusted fill rate threshold changes the recorded soft preference",
        );

        let max_package_weight = load_f64_with_warning(
            Self::MAX_WEIGHT_VAR,
            CartonizationParams::DEFAULT_MAX_PACKAGE_WEIGHT,
            |value| value > 0.0 && value.is_finite(),
            "must be greater than 0",
            "Adjusted package weight limit may exceed carrier limits",
        );

        let dimensional_weight_factor = load_f64_with_warning(
            Self::DIM_FACTOR_VAR,
            CartonizationParams::DEFAULT_DIMENSIONAL_WEIGHT_FACTOR,
            |value| value > 0.0 && value.is_finite(),
            "must be greater than 0",
            "Adjusted dimensional weight factor changes billable weights",
        );

        let packing_efficiency = load_f64_with_warning(
            Self::EFFICIENCY_VAR,
            CartonizationParams::DEFAULT_PACKING_EFFICIENCY,
            |value| (0.0..=1.0).contains(&value),
            "must be between 0 and 1",
            "Adjusted packing efficiency target",
        );

        let optimize_for_cost = load_bool(
            Self::OPTIMIZE_COST_VAR,
            CartonizationParams::DEFAULT_OPTIMIZE_FOR_COST,
        );
        let optimize_for_space = load_bool(
            Self::OPTIMIZE_SPACE_VAR,
            CartonizationParams::DEFAULT_OPTIMIZE_FOR_SPACE,
        );
        let allow_partial_fill = load_bool(
            Self::PARTIAL_FILL_VAR,
            CartonizationParams::DEFAULT_ALLOW_PARTIAL_FILL,
        );

        let params = CartonizationParams::builder()
            .fill_rate_threshold(fill_rate_threshold)
            .max_package_weight(max_package_weight)
            .dimensional_weight_factor(dimensional_weight_factor)
            .packing_efficiency(packing_efficiency)
            .optimize_for_cost(optimize_for_cost)
            .optimize_for_space(optimize_for_space)
            .allow_partial_fill(allow_partial_fill)
            .build();

        Self { params }
    }

    /// Returns the configured parameters.
    pub fn params(&self) -> CartonizationParams {
        self.params
    }
}

fn env_string(name: &str) -> Option<String> {
    match env::var(name) {
        Ok(value) => {
            let trimmed = value.trim();
            if trimmed.is_empty() {
                None
            } else {
                Some(trimmed.to_owned())
            }
        }
        Err(env::VarError::NotPresent) => None,
        Err(err) => {
            tracing::warn!("access to {} failed: {}; using default value", name, err);
            None
        }
    }
}

fn load_bool(var_name: &str, default: bool) -> bool {
    env_string(var_name)
        .and_then(|raw| parse_bool(&raw, var_name))
        .unwrap_or(default)
}

fn parse_bool(raw: &str, var_name: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "y" | "on" => Some(true),
        "0" | "false" | "no" | "n" | "off" => Some(false),
        other => {
            tracing::warn!(
                "could not interpret {} ('{}') as boolean value; using default value",
                var_name,
                other
            );
            None
        }
    }
}

fn load_f64_with_warning(
    var_name: &str,
    default: f64,
    validator: impl Fn(f64) -> bool,
    invalid_hint: &str,
    notice: &str,
) -> f64 {
    match env_string(var_name) {
        Some(raw) => {
            parse_f64_with_warning(var_name, &raw, default, validator, invalid_hint, notice)
        }
        None => default,
    }
}

fn parse_f64_with_warning(
    var_name: &str,
    raw: &str,
    default: f64,
    validator: impl Fn(f64) -> bool,
    invalid_hint: &str,
    notice: &str,
) -> f64 {
    match raw.parse::<f64>() {
        Ok(value) => {
            if !validator(value) {
                tracing::warn!(
                    "{} contains invalid value '{}': {}; using {}",
                    var_name,
                    raw,
                    invalid_hint,
                    default
                );
                default
            } else {
                let tolerance = (default.abs().max(1.0)) * 1e-9;
                if (value - default).abs() > tolerance {
                    tracing::info!("{} ({} = {})", notice, var_name, value);
                }
                value
            }
        }
        Err(err) => {
            tracing::warn!(
                "could not parse {} ('{}') as number: {}; using {}",
                var_name,
                raw,
                err,
                default
            );
            default
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_bool_true_values() {
        assert_eq!(parse_bool("1", "TEST_VAR"), Some(true));
        assert_eq!(parse_bool("true", "TEST_VAR"), Some(true));
        assert_eq!(parse_bool("yes", "TEST_VAR"), Some(true));
        assert_eq!(parse_bool("y", "TEST_VAR"), Some(true));
        assert_eq!(parse_bool("on", "TEST_VAR"), Some(true));

        assert_eq!(parse_bool("TRUE", "TEST_VAR"), Some(true));
        assert_eq!(parse_bool("Yes", "TEST_VAR"), Some(true));
        assert_eq!(parse_bool(" true ", "TEST_VAR"), Some(true));
    }

    #[test]
    fn test_parse_bool_false_values() {
        assert_eq!(parse_bool("0", "TEST_VAR"), Some(false));
        assert_eq!(parse_bool("false", "TEST_VAR"), Some(false));
        assert_eq!(parse_bool("no", "TEST_VAR"), Some(false));
        assert_eq!(parse_bool("n", "TEST_VAR"), Some(false));
        assert_eq!(parse_bool("off", "TEST_VAR"), Some(false));

        assert_eq!(parse_bool("FALSE", "TEST_VAR"), Some(false));
        assert_eq!(parse_bool("  0  ", "TEST_VAR"), Some(false));
    }

    #[test]
    fn test_parse_bool_invalid_values() {
        assert_eq!(parse_bool("invalid", "TEST_VAR"), None);
        assert_eq!(parse_bool("2", "TEST_VAR"), None);
        assert_eq!(parse_bool("", "TEST_VAR"), None);
    }

    #[test]
    fn numeric_values_fall_back_on_invalid_input() {
        let positive = |value: f64| value > 0.0;
        assert_eq!(
            parse_f64_with_warning("TEST_VAR", "250", 70.0, positive, "hint", "notice"),
            250.0
        );
        assert_eq!(
            parse_f64_with_warning("TEST_VAR", "-1", 70.0, positive, "hint", "notice"),
            70.0
        );
        assert_eq!(
            parse_f64_with_warning("TEST_VAR", "heavy", 70.0, positive, "hint", "notice"),
            70.0
        );
    }

    #[test]
    fn api_config_defaults_and_fallbacks() {
        let config = ApiConfig::from_values(None, None);
        assert_eq!(config.port(), 8080);
        assert!(config.binds_to_all_interfaces());
        assert!(config.uses_default_host());

        let config = ApiConfig::from_values(Some("not-an-ip".to_string()), Some("0".to_string()));
        assert_eq!(config.display_host(), "0.0.0.0");
        assert_eq!(config.port(), 8080);

        let config =
            ApiConfig::from_values(Some("127.0.0.1".to_string()), Some("9000".to_string()));
        assert_eq!(config.socket_addr().to_string(), "127.0.0.1:9000");
        assert!(!config.binds_to_all_interfaces());
    }

    #[test]
    fn engine_config_default_uses_default_params() {
        assert_eq!(
            EngineConfig::default().params(),
            CartonizationParams::default()
        );
    }
}
