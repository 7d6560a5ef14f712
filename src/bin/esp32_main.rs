//! ESP32-C3 SuperMini firmware for the F0.1 robot.
//!
//! Brings up WiFi (own access point, or a client connection when `STA_SSID`
//! is set), wires motors and LEDs to their pins and runs the robot on a
//! single-threaded tokio runtime:
//! - control server on port 80
//! - control loop polling every 10 ms
//! - indicator LED blinking until the first controller connects
//! - WiFi monitor
//!
//! # Build
//!
//! ```bash
//! # Host the F0.1 network
//! AP_SSID=F0.1 AP_PASSWORD=secret123 cargo build --release --features wifi --bin esp32_main
//!
//! # Join an existing network instead
//! STA_SSID=home STA_PASSWORD=secret123 cargo build --release --features wifi --bin esp32_main
//! ```

use core::convert::Infallible;

use esp_idf_hal::gpio::OutputPin;
use esp_idf_hal::ledc::{config::TimerConfig, LedcDriver, LedcTimerDriver};
use esp_idf_hal::peripherals::Peripherals;
use esp_idf_hal::prelude::*;
use esp_idf_svc::eventloop::EspSystemEventLoop;
use esp_idf_svc::io::vfs::MountedEventfs;
use esp_idf_svc::nvs::EspDefaultNvsPartition;

use f01_rover::hal::esp32::{Esp32AccessPoint, Esp32Pin, Esp32Pwm, Esp32Station, PWM_RESOLUTION};
use f01_rover::{
    AccessPointConfig, Config, LedOutput, Robot, RobotHardware, StationConfig, WifiMode,
};

/// File descriptors reserved for tokio's eventfd-based reactor
const EVENTFD_SLOTS: usize = 5;

type Hardware<'d> = RobotHardware<Esp32Pwm<'d>, Esp32Pin<'d>>;

/// Whichever network link was brought up.
enum Network<'d> {
    AccessPoint(Esp32AccessPoint<'d>),
    Station(Esp32Station<'d>),
    Offline,
}

impl Network<'_> {
    async fn monitor(self) -> Infallible {
        match self {
            Network::AccessPoint(ap) => ap.monitor().await,
            Network::Station(sta) => sta.monitor().await,
            Network::Offline => std::future::pending().await,
        }
    }
}

fn main() -> anyhow::Result<()> {
    // Initialize ESP-IDF
    esp_idf_hal::sys::link_patches();
    esp_idf_svc::log::EspLogger::initialize_default();

    log::info!("================================");
    log::info!("  F0.1 SuperMini Controller");
    log::info!("================================");

    // =========================================================================
    // Configuration
    // =========================================================================
    let mut access_point = AccessPointConfig::default();
    if let Some(ssid) = option_env!("AP_SSID") {
        access_point = access_point.with_ssid(ssid);
    }
    if let Some(password) = option_env!("AP_PASSWORD") {
        access_point = access_point.with_password(password);
    }
    let mut config = Config::default().with_access_point(access_point);
    if let Some(ssid) = option_env!("STA_SSID") {
        let station = StationConfig::default()
            .with_ssid(ssid)
            .with_password(option_env!("STA_PASSWORD").unwrap_or(""));
        config = config.with_station(station);
    }

    let peripherals = Peripherals::take()?;

    // =========================================================================
    // PWM (all six LEDC channels on one timer)
    // =========================================================================
    let timer_config = TimerConfig::default()
        .frequency(config.drive.pwm_freq_hz.Hz())
        .resolution(PWM_RESOLUTION);
    let pins = peripherals.pins;
    let ledc = peripherals.ledc;
    let timer = LedcTimerDriver::new(ledc.timer0, &timer_config)?;

    let left_in1 = Esp32Pwm::new(LedcDriver::new(ledc.channel0, &timer, pins.gpio2)?)?;
    let left_in2 = Esp32Pwm::new(LedcDriver::new(ledc.channel1, &timer, pins.gpio3)?)?;
    let right_in1 = Esp32Pwm::new(LedcDriver::new(ledc.channel2, &timer, pins.gpio4)?)?;
    let right_in2 = Esp32Pwm::new(LedcDriver::new(ledc.channel3, &timer, pins.gpio5)?)?;
    log::info!("[OK] Motors initialized (GPIO2/3, GPIO4/5 PWM)");

    let front_left = Esp32Pwm::new(LedcDriver::new(ledc.channel4, &timer, pins.gpio6)?)?;
    let front_right = Esp32Pwm::new(LedcDriver::new(ledc.channel5, &timer, pins.gpio7)?)?;

    // =========================================================================
    // GPIO LEDs (no LEDC channel left)
    // =========================================================================
    let back_left = Esp32Pin::new(pins.gpio10.downgrade_output())?;
    let back_right = Esp32Pin::new(pins.gpio20.downgrade_output())?;
    let indicator = Esp32Pin::active_low(pins.gpio8.downgrade_output())?;
    log::info!("[OK] LEDs initialized (PWM GPIO6/7, GPIO10/20, indicator GPIO8)");

    let hardware = RobotHardware {
        left_in1,
        left_in2,
        right_in1,
        right_in2,
        front_left: LedOutput::Pwm(front_left),
        front_right: LedOutput::Pwm(front_right),
        back_left: LedOutput::Binary(back_left),
        back_right: LedOutput::Binary(back_right),
        indicator: LedOutput::Binary(indicator),
    };

    // =========================================================================
    // WiFi
    // =========================================================================
    let network = match config.wifi_mode {
        WifiMode::Station => {
            let sysloop = EspSystemEventLoop::take()?;
            let nvs = EspDefaultNvsPartition::take()?;
            Network::Station(Esp32Station::new(
                peripherals.modem,
                sysloop,
                Some(nvs),
                &config.station,
            )?)
        }
        WifiMode::AccessPoint if config.access_point.enabled => {
            let sysloop = EspSystemEventLoop::take()?;
            let nvs = EspDefaultNvsPartition::take()?;
            Network::AccessPoint(Esp32AccessPoint::new(
                peripherals.modem,
                sysloop,
                Some(nvs),
                &config.access_point,
            )?)
        }
        WifiMode::AccessPoint => {
            log::info!("[SKIP] Access point disabled");
            Network::Offline
        }
    };

    // =========================================================================
    // Runtime
    // =========================================================================
    let _eventfs = MountedEventfs::mount(EVENTFD_SLOTS)?;
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;

    match runtime.block_on(serve(hardware, config, network))? {}
}

async fn serve(
    hardware: Hardware<'_>,
    config: Config,
    network: Network<'_>,
) -> anyhow::Result<Infallible> {
    let robot = Robot::bind(hardware, config).await?;
    log::info!("[OK] Control server on {}", robot.local_addr()?);

    let (never, _) = tokio::join!(robot.run(), network.monitor());
    match never {}
}
