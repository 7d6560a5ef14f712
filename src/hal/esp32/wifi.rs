//! WiFi for ESP32-C3: soft access point or station.
//!
//! By default the robot hosts its own network; phones join it and open the
//! control page at the AP's address. [`Esp32Station`] joins an existing
//! network instead.
//!
//! # Example
//!
//! ```ignore
//! use f01_rover::hal::esp32::Esp32AccessPoint;
//! use f01_rover::config::AccessPointConfig;
//!
//! let ap = Esp32AccessPoint::new(modem, sysloop, nvs, &AccessPointConfig::default())?;
//! log::info!("F0.1 IP address: {:?}", ap.ip_addr());
//! ```

use core::convert::Infallible;
use std::net::Ipv4Addr;
use std::time::{Duration, Instant};

use esp_idf_hal::modem::Modem;
use esp_idf_svc::eventloop::EspSystemEventLoop;
use esp_idf_svc::nvs::EspDefaultNvsPartition;
use esp_idf_svc::wifi::{
    AccessPointConfiguration, AuthMethod, BlockingWifi, ClientConfiguration, Configuration,
    EspWifi,
};

use crate::config::{AccessPointConfig, StationConfig};

/// Pause between connection checks while joining a network.
const CONNECT_POLL: Duration = Duration::from_millis(500);

/// How often the station monitor checks the link.
const STATION_MONITOR_INTERVAL: Duration = Duration::from_secs(2);

/// WiFi access point for the robot.
pub struct Esp32AccessPoint<'a> {
    wifi: BlockingWifi<EspWifi<'a>>,
    config: AccessPointConfig,
}

impl<'a> Esp32AccessPoint<'a> {
    /// Bring the access point up.
    ///
    /// A password shorter than 8 characters gives an open network.
    pub fn new(
        modem: Modem,
        sysloop: EspSystemEventLoop,
        nvs: Option<EspDefaultNvsPartition>,
        config: &AccessPointConfig,
    ) -> anyhow::Result<Self> {
        let esp_wifi = EspWifi::new(modem, sysloop.clone(), nvs)?;
        let mut wifi = BlockingWifi::wrap(esp_wifi, sysloop)?;

        let auth_method = if config.is_secured() {
            AuthMethod::WPA2Personal
        } else {
            log::warn!("[AP] password too short, network will be open");
            AuthMethod::None
        };

        wifi.set_configuration(&Configuration::AccessPoint(AccessPointConfiguration {
            ssid: config.ssid.clone(),
            password: if config.is_secured() {
                config.password.clone()
            } else {
                Default::default()
            },
            channel: config.channel,
            auth_method,
            ..Default::default()
        }))?;

        log::info!("[AP] Starting '{}'...", config.ssid);
        wifi.start()?;
        wifi.wait_netif_up()?;

        let ap = Self {
            wifi,
            config: config.clone(),
        };
        if let Some(ip) = ap.ip_addr() {
            log::info!("[AP] F0.1 IP address: {}", ip);
        }
        Ok(ap)
    }

    /// Address of the AP interface.
    pub fn ip_addr(&self) -> Option<Ipv4Addr> {
        self.wifi
            .wifi()
            .ap_netif()
            .get_ip_info()
            .ok()
            .map(|info| info.ip)
    }

    /// True while the WiFi driver is running.
    pub fn is_active(&self) -> bool {
        self.wifi.is_started().unwrap_or(false)
    }

    /// Restart the AP whenever it is found stopped.
    pub async fn monitor(mut self) -> Infallible {
        let interval = self.config.monitor_interval();
        loop {
            if !self.is_active() {
                log::warn!("[AP] Lost connection, re-enabling...");
                if let Err(e) = self.wifi.start() {
                    log::error!("[AP] restart failed: {:?}", e);
                }
            }
            tokio::time::sleep(interval).await;
        }
    }
}

/// WiFi client connection to an existing network.
pub struct Esp32Station<'a> {
    wifi: BlockingWifi<EspWifi<'a>>,
}

impl<'a> Esp32Station<'a> {
    /// Join the configured network.
    ///
    /// Fails if the link is not up within `config.connect_timeout_ms`, or if
    /// DHCP does not complete.
    pub fn new(
        modem: Modem,
        sysloop: EspSystemEventLoop,
        nvs: Option<EspDefaultNvsPartition>,
        config: &StationConfig,
    ) -> anyhow::Result<Self> {
        let esp_wifi = EspWifi::new(modem, sysloop.clone(), nvs)?;
        let mut wifi = BlockingWifi::wrap(esp_wifi, sysloop)?;

        let auth_method = if config.is_open() {
            AuthMethod::None
        } else {
            AuthMethod::WPA2Personal
        };
        wifi.set_configuration(&Configuration::Client(ClientConfiguration {
            ssid: config.ssid.clone(),
            password: config.password.clone(),
            auth_method,
            ..Default::default()
        }))?;

        log::info!("[WiFi] Starting...");
        wifi.start()?;

        log::info!("[WiFi] Connecting to '{}'...", config.ssid);
        let mut station = Self { wifi };
        if !station.connect(config.connect_timeout())? {
            anyhow::bail!(
                "connection to '{}' timed out after {} ms",
                config.ssid,
                config.connect_timeout_ms
            );
        }

        log::info!("[WiFi] Waiting for DHCP...");
        station.wifi.wait_netif_up()?;

        if let Some(ip) = station.ip_addr() {
            log::info!("[WiFi] Connected, IP address: {}", ip);
        }
        Ok(station)
    }

    /// Start connecting and wait up to `timeout` for the link.
    ///
    /// Returns `Ok(false)` on timeout. Already connected returns at once.
    pub fn connect(&mut self, timeout: Duration) -> anyhow::Result<bool> {
        if self.is_connected() {
            log::info!("[WiFi] Already connected");
            return Ok(true);
        }

        // A stale attempt blocks a new one
        let _ = self.wifi.wifi_mut().disconnect();
        self.wifi.wifi_mut().connect()?;

        let start = Instant::now();
        while !self.is_connected() {
            if start.elapsed() > timeout {
                log::warn!("[WiFi] Connection timed out");
                return Ok(false);
            }
            std::thread::sleep(CONNECT_POLL);
        }
        Ok(true)
    }

    /// Address assigned by the network, once DHCP is done.
    pub fn ip_addr(&self) -> Option<Ipv4Addr> {
        self.wifi
            .wifi()
            .sta_netif()
            .get_ip_info()
            .ok()
            .map(|info| info.ip)
    }

    /// True while associated with the network.
    pub fn is_connected(&self) -> bool {
        self.wifi.is_connected().unwrap_or(false)
    }

    /// Rejoin the network whenever the link drops.
    pub async fn monitor(mut self) -> Infallible {
        loop {
            if !self.is_connected() {
                log::warn!("[WiFi] Link lost, reconnecting...");
                if let Err(e) = self.wifi.wifi_mut().connect() {
                    log::error!("[WiFi] reconnect failed: {:?}", e);
                }
            }
            tokio::time::sleep(STATION_MONITOR_INTERVAL).await;
        }
    }
}
