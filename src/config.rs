//! Shared configuration for the robot, desktop simulator and ESP32 firmware.
//!
//! Uses `heapless::String` for the WiFi credentials so the same types can be
//! filled from compile-time environment variables on the ESP32.
//!
//! # Example
//!
//! ```rust
//! use f01_rover::config::{AccessPointConfig, Config, ServerConfig};
//!
//! // Use defaults
//! let config = Config::default();
//! assert_eq!(config.server.max_clients, 2);
//!
//! // Or customize
//! let config = Config::default()
//!     .with_access_point(AccessPointConfig::default().with_ssid("rover"))
//!     .with_server(ServerConfig::default().with_port(8080));
//! ```

use core::time::Duration;

use heapless::String as HString;

use crate::transition::Ramp;

/// Maximum length of an access-point SSID (802.11 limit)
pub const MAX_SSID_LEN: usize = 32;

/// Maximum length of a WPA2 passphrase
pub const MAX_PASSWORD_LEN: usize = 64;

/// SSID string type
pub type SsidString = HString<MAX_SSID_LEN>;

/// Passphrase string type
pub type PasswordString = HString<MAX_PASSWORD_LEN>;

/// Copy as much of `s` as fits into a heapless string, on a char boundary.
pub fn bounded_string<const N: usize>(s: &str) -> HString<N> {
    let mut hs = HString::new();
    for c in s.chars() {
        if hs.push(c).is_err() {
            break;
        }
    }
    hs
}

// ============================================================================
// Main Config
// ============================================================================

/// Complete robot configuration
#[derive(Clone, Debug, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Config {
    /// Host a network or join one
    pub wifi_mode: WifiMode,
    /// Soft access point
    pub access_point: AccessPointConfig,
    /// Client connection to an existing network
    pub station: StationConfig,
    /// HTTP control server
    pub server: ServerConfig,
    /// Motor tuning
    pub drive: DriveConfig,
    /// Marker and indicator LEDs
    pub leds: LedConfig,
    /// Control loop timing
    pub control: LoopConfig,
}

impl Config {
    /// Set the WiFi mode
    pub fn with_wifi_mode(mut self, mode: WifiMode) -> Self {
        self.wifi_mode = mode;
        self
    }

    /// Set station configuration
    pub fn with_station(mut self, station: StationConfig) -> Self {
        self.wifi_mode = WifiMode::Station;
        self.station = station;
        self
    }

    /// Set access point configuration
    pub fn with_access_point(mut self, access_point: AccessPointConfig) -> Self {
        self.access_point = access_point;
        self
    }

    /// Set server configuration
    pub fn with_server(mut self, server: ServerConfig) -> Self {
        self.server = server;
        self
    }

    /// Set drive configuration
    pub fn with_drive(mut self, drive: DriveConfig) -> Self {
        self.drive = drive;
        self
    }

    /// Set LED configuration
    pub fn with_leds(mut self, leds: LedConfig) -> Self {
        self.leds = leds;
        self
    }

    /// Set control loop configuration
    pub fn with_control(mut self, control: LoopConfig) -> Self {
        self.control = control;
        self
    }
}

// ============================================================================
// Access Point Config
// ============================================================================

/// Soft access point configuration
#[derive(Clone, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct AccessPointConfig {
    /// Network name
    pub ssid: SsidString,
    /// WPA2 passphrase (8-63 characters)
    pub password: PasswordString,
    /// WiFi channel
    pub channel: u8,
    /// How often the monitor checks that the AP is still up
    pub monitor_interval_ms: u32,
    /// Whether to bring the AP up at all
    pub enabled: bool,
}

impl Default for AccessPointConfig {
    fn default() -> Self {
        Self {
            ssid: bounded_string("F0.1"),
            password: bounded_string("F0.1-okon"),
            channel: 1,
            monitor_interval_ms: 2000,
            enabled: true,
        }
    }
}

impl AccessPointConfig {
    /// Set the SSID
    pub fn with_ssid(mut self, ssid: &str) -> Self {
        self.ssid = bounded_string(ssid);
        self
    }

    /// Set the passphrase
    pub fn with_password(mut self, password: &str) -> Self {
        self.password = bounded_string(password);
        self
    }

    /// Set the channel
    pub fn with_channel(mut self, channel: u8) -> Self {
        self.channel = channel;
        self
    }

    /// Set the monitor interval
    pub fn with_monitor_interval_ms(mut self, ms: u32) -> Self {
        self.monitor_interval_ms = ms;
        self
    }

    /// Enable or disable the AP
    pub fn with_enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }

    /// WPA2 needs at least 8 characters; shorter means an open network.
    pub fn is_secured(&self) -> bool {
        self.password.len() >= 8
    }

    /// Monitor interval as a `Duration`
    pub fn monitor_interval(&self) -> Duration {
        Duration::from_millis(self.monitor_interval_ms as u64)
    }
}

// ============================================================================
// Station Config
// ============================================================================

/// How the robot gets onto a network.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum WifiMode {
    /// Host the robot's own network
    #[default]
    AccessPoint,
    /// Join an existing network as a client
    Station,
}

/// Station (client) mode configuration
#[derive(Clone, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct StationConfig {
    /// Network to join
    pub ssid: SsidString,
    /// Network passphrase, empty for an open network
    pub password: PasswordString,
    /// Give up if not connected after this long
    pub connect_timeout_ms: u32,
}

impl Default for StationConfig {
    fn default() -> Self {
        Self {
            ssid: SsidString::new(),
            password: PasswordString::new(),
            connect_timeout_ms: 10_000,
        }
    }
}

impl StationConfig {
    /// Set the SSID
    pub fn with_ssid(mut self, ssid: &str) -> Self {
        self.ssid = bounded_string(ssid);
        self
    }

    /// Set the passphrase
    pub fn with_password(mut self, password: &str) -> Self {
        self.password = bounded_string(password);
        self
    }

    /// Set the connect timeout
    pub fn with_connect_timeout_ms(mut self, ms: u32) -> Self {
        self.connect_timeout_ms = ms;
        self
    }

    /// True when there is no passphrase to send.
    pub fn is_open(&self) -> bool {
        self.password.is_empty()
    }

    /// Connect timeout as a `Duration`
    pub fn connect_timeout(&self) -> Duration {
        Duration::from_millis(self.connect_timeout_ms as u64)
    }
}

// ============================================================================
// Server Config
// ============================================================================

/// HTTP control server configuration
#[derive(Clone, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ServerConfig {
    /// Port to listen on
    pub port: u16,
    /// Connections served at once; extra ones get a 503
    pub max_clients: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: 80,
            max_clients: 2,
        }
    }
}

impl ServerConfig {
    /// Set the port
    pub fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    /// Set the connection cap
    pub fn with_max_clients(mut self, max_clients: usize) -> Self {
        self.max_clients = max_clients;
        self
    }
}

// ============================================================================
// Drive Config
// ============================================================================

/// Motor tuning
#[derive(Clone, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct DriveConfig {
    /// Speed scale for the left motor
    pub left_correction: f32,
    /// Speed scale for the right motor
    pub right_correction: f32,
    /// Ramp length used by the control loop (0 = snap)
    pub ramp_ms: u32,
    /// Ramp frames used by the control loop
    pub ramp_steps: u32,
    /// Motor PWM frequency in Hz
    pub pwm_freq_hz: u32,
}

impl Default for DriveConfig {
    fn default() -> Self {
        Self {
            left_correction: 0.5,
            right_correction: 1.0,
            ramp_ms: 0,
            ramp_steps: 3,
            pwm_freq_hz: 1000,
        }
    }
}

impl DriveConfig {
    /// Set both correction factors
    pub fn with_corrections(mut self, left: f32, right: f32) -> Self {
        self.left_correction = left;
        self.right_correction = right;
        self
    }

    /// Set the control loop ramp
    pub fn with_ramp(mut self, ms: u32, steps: u32) -> Self {
        self.ramp_ms = ms;
        self.ramp_steps = steps;
        self
    }

    /// Set the PWM frequency
    pub fn with_pwm_freq_hz(mut self, hz: u32) -> Self {
        self.pwm_freq_hz = hz;
        self
    }

    /// The ramp the control loop applies to every throttle change
    pub fn ramp(&self) -> Ramp {
        Ramp::from_millis(self.ramp_ms as u64, self.ramp_steps)
    }
}

// ============================================================================
// LED Config
// ============================================================================

/// LED behaviour
#[derive(Clone, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct LedConfig {
    /// Brightness marker LEDs never go below while running
    pub floor: f32,
    /// Smoothing used when marker brightness follows the motors
    pub smooth: f32,
    /// Smoothing of the startup fade-in
    pub startup_smooth: f32,
    /// Indicator blink interval while waiting for a client
    pub indicator_interval_ms: u64,
}

impl Default for LedConfig {
    fn default() -> Self {
        Self {
            floor: 25.0,
            smooth: 25.0,
            startup_smooth: 100.0,
            indicator_interval_ms: 500,
        }
    }
}

impl LedConfig {
    /// Set the brightness floor
    pub fn with_floor(mut self, floor: f32) -> Self {
        self.floor = floor;
        self
    }

    /// Set the follow smoothing
    pub fn with_smooth(mut self, smooth: f32) -> Self {
        self.smooth = smooth;
        self
    }

    /// Set the startup smoothing
    pub fn with_startup_smooth(mut self, smooth: f32) -> Self {
        self.startup_smooth = smooth;
        self
    }

    /// Set the indicator blink interval
    pub fn with_indicator_interval_ms(mut self, ms: u64) -> Self {
        self.indicator_interval_ms = ms;
        self
    }
}

// ============================================================================
// Loop Config
// ============================================================================

/// Control loop timing
#[derive(Clone, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct LoopConfig {
    /// Sleep between polls of the latest command
    pub poll_interval_ms: u64,
    /// Sleep between checks for the first client
    pub indicator_poll_ms: u64,
}

impl Default for LoopConfig {
    fn default() -> Self {
        Self {
            poll_interval_ms: 10,
            indicator_poll_ms: 100,
        }
    }
}

impl LoopConfig {
    /// Set the poll interval
    pub fn with_poll_interval_ms(mut self, ms: u64) -> Self {
        self.poll_interval_ms = ms;
        self
    }

    /// Set the indicator poll interval
    pub fn with_indicator_poll_ms(mut self, ms: u64) -> Self {
        self.indicator_poll_ms = ms;
        self
    }

    /// Poll interval as a `Duration`
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    /// Indicator poll interval as a `Duration`
    pub fn indicator_poll(&self) -> Duration {
        Duration::from_millis(self.indicator_poll_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config() {
        let config = Config::default();
        assert_eq!(config.access_point.ssid.as_str(), "F0.1");
        assert_eq!(config.server.port, 80);
        assert_eq!(config.server.max_clients, 2);
        assert_eq!(config.drive.left_correction, 0.5);
        assert_eq!(config.drive.right_correction, 1.0);
        assert_eq!(config.leds.floor, 25.0);
        assert_eq!(config.control.poll_interval_ms, 10);
        assert_eq!(config.wifi_mode, WifiMode::AccessPoint);
    }

    #[test]
    fn station_selects_station_mode() {
        let config = Config::default().with_station(
            StationConfig::default()
                .with_ssid("home")
                .with_password("hunter22")
                .with_connect_timeout_ms(5000),
        );

        assert_eq!(config.wifi_mode, WifiMode::Station);
        assert_eq!(config.station.ssid.as_str(), "home");
        assert!(!config.station.is_open());
        assert_eq!(config.station.connect_timeout(), Duration::from_secs(5));
    }

    #[test]
    fn station_defaults() {
        let station = StationConfig::default();
        assert!(station.is_open());
        assert_eq!(station.connect_timeout(), Duration::from_secs(10));
    }

    #[test]
    fn default_drive_ramp_snaps() {
        assert!(DriveConfig::default().ramp().is_instant());
        assert!(!DriveConfig::default().with_ramp(100, 3).ramp().is_instant());
    }

    #[test]
    fn builder_pattern() {
        let config = Config::default()
            .with_server(ServerConfig::default().with_port(8080).with_max_clients(4))
            .with_drive(DriveConfig::default().with_corrections(0.9, 0.8))
            .with_leds(LedConfig::default().with_floor(10.0))
            .with_control(LoopConfig::default().with_poll_interval_ms(20));

        assert_eq!(config.server.port, 8080);
        assert_eq!(config.server.max_clients, 4);
        assert_eq!(config.drive.left_correction, 0.9);
        assert_eq!(config.leds.floor, 10.0);
        assert_eq!(config.control.poll_interval(), Duration::from_millis(20));
    }

    #[test]
    fn ssid_truncated_to_limit() {
        let long = "x".repeat(40);
        let ap = AccessPointConfig::default().with_ssid(&long);
        assert_eq!(ap.ssid.len(), MAX_SSID_LEN);
    }

    #[test]
    fn bounded_string_utf8_boundary() {
        // 'ń' is two bytes; the third doesn't fit in 5 bytes after "okoń"
        let s: HString<5> = bounded_string("okońń");
        assert_eq!(s.as_str(), "okoń");
    }

    #[test]
    fn ap_security() {
        assert!(AccessPointConfig::default().is_secured());
        assert!(!AccessPointConfig::default().with_password("short").is_secured());
    }
}
