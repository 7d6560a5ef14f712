//! Top-level composition: every component built once and run together.

use core::convert::Infallible;
use std::io;
use std::net::SocketAddr;
use std::sync::Arc;

use tokio::net::ToSocketAddrs;

use crate::config::Config;
use crate::led::{LedDriver, LedOutput};
use crate::motor::MotorController;
use crate::traits::{BinaryOutput, PwmChannel};

use super::control::{indicate_until_connected, ControlLoop, MarkerLeds};
use super::page::ControlPage;
use super::server::ControlServer;
use super::shared::{CommandCell, ConnectionCounter};

/// Raw outputs the robot is wired to.
pub struct RobotHardware<P, B> {
    /// Left motor forward input
    pub left_in1: P,
    /// Left motor backward input
    pub left_in2: P,
    /// Right motor forward input
    pub right_in1: P,
    /// Right motor backward input
    pub right_in2: P,
    /// Front left marker
    pub front_left: LedOutput<P, B>,
    /// Front right marker
    pub front_right: LedOutput<P, B>,
    /// Back left marker
    pub back_left: LedOutput<P, B>,
    /// Back right marker
    pub back_right: LedOutput<P, B>,
    /// Connection indicator
    pub indicator: LedOutput<P, B>,
}

/// The whole robot: control server, control loop and indicator.
pub struct Robot<P: PwmChannel, B: BinaryOutput> {
    server: ControlServer,
    control: ControlLoop<P, B>,
    indicator: LedDriver<P, B>,
    config: Config,
}

impl<P: PwmChannel, B: BinaryOutput> Robot<P, B> {
    /// Build every component and bind the server on all interfaces at
    /// `config.server.port`.
    pub async fn bind(hardware: RobotHardware<P, B>, config: Config) -> io::Result<Self> {
        let addr = SocketAddr::from(([0, 0, 0, 0], config.server.port));
        Self::bind_addr(hardware, addr, config).await
    }

    /// Like [`bind`](Self::bind) but on an explicit address.
    pub async fn bind_addr(
        hardware: RobotHardware<P, B>,
        addr: impl ToSocketAddrs,
        config: Config,
    ) -> io::Result<Self> {
        Self::bind_with_page(hardware, addr, config, ControlPage::embedded()).await
    }

    /// Bind with a specific control page.
    pub async fn bind_with_page(
        hardware: RobotHardware<P, B>,
        addr: impl ToSocketAddrs,
        config: Config,
        page: ControlPage,
    ) -> io::Result<Self> {
        let commands = Arc::new(CommandCell::new());
        let server =
            ControlServer::bind(addr, config.server.max_clients, Arc::clone(&commands), page)
                .await?;

        let drive = &config.drive;
        let left =
            MotorController::new(hardware.left_in1, hardware.left_in2, drive.left_correction);
        let right =
            MotorController::new(hardware.right_in1, hardware.right_in2, drive.right_correction);
        let leds = MarkerLeds {
            front_left: LedDriver::new(hardware.front_left),
            front_right: LedDriver::new(hardware.front_right),
            back_left: LedDriver::new(hardware.back_left),
            back_right: LedDriver::new(hardware.back_right),
        };

        let control = ControlLoop::new(left, right, leds, commands)
            .with_ramp(drive.ramp())
            .with_led_config(&config.leds)
            .with_poll_interval(config.control.poll_interval());

        Ok(Self {
            server,
            control,
            indicator: LedDriver::new(hardware.indicator),
            config,
        })
    }

    /// Address the control server is bound to.
    pub fn local_addr(&self) -> io::Result<SocketAddr> {
        self.server.local_addr()
    }

    /// Latest commanded speeds.
    pub fn commands(&self) -> &Arc<CommandCell> {
        self.server.command_cell()
    }

    /// Open client connections.
    pub fn connections(&self) -> &Arc<ConnectionCounter> {
        self.server.connections()
    }

    /// Run server, control loop and indicator until the process ends.
    pub async fn run(self) -> Infallible {
        let Self {
            server,
            control,
            mut indicator,
            config,
        } = self;
        let connections = Arc::clone(server.connections());

        let indicate = async {
            let result = indicate_until_connected(
                &mut indicator,
                &connections,
                config.leds.indicator_interval_ms,
                config.control.indicator_poll(),
            )
            .await;
            if let Err(e) = result {
                log::warn!("[LED] indicator: {}", e);
            }
        };

        let (never, _, _) = tokio::join!(server.run(), control.run(), indicate);
        match never {}
    }
}
