//! Desktop simulator for trying the control page without a robot.
//!
//! Runs the full robot (control server, control loop, indicator) against mock
//! PWM channels and pins, and logs what the motors and LEDs would show.
//!
//! # Usage
//!
//! ```sh
//! RUST_LOG=info cargo run --example desktop_sim
//! ```
//!
//! Then open <http://localhost:8080> and move the sliders.

use std::net::SocketAddr;
use std::time::Duration;

use f01_rover::hal::{MockPin, MockPwm};
use f01_rover::led::MAX_BRIGHTNESS;
use f01_rover::traits::{BinaryOutput, PwmChannel, MAX_DUTY};
use f01_rover::{Config, LedOutput, Robot, RobotHardware, ServerConfig};

/// How often the simulated outputs are reported.
const REPORT_INTERVAL: Duration = Duration::from_millis(500);

struct Outputs {
    left: (MockPwm, MockPwm),
    right: (MockPwm, MockPwm),
    leds: [MockPwm; 4],
    indicator: MockPin,
}

impl Outputs {
    /// Forward duty positive, backward negative.
    fn signed(pair: &(MockPwm, MockPwm)) -> i32 {
        pair.0.duty_u16() as i32 - pair.1.duty_u16() as i32
    }

    fn percent(pwm: &MockPwm) -> u32 {
        (pwm.duty_u16() as f32 / MAX_DUTY as f32 * MAX_BRIGHTNESS).round() as u32
    }

    fn report(&self) -> String {
        let [fl, fr, bl, br] = &self.leds;
        format!(
            "motors L={:>6} R={:>6} | LEDs FL={:>3}% FR={:>3}% BL={:>3}% BR={:>3}% | indicator {}",
            Self::signed(&self.left),
            Self::signed(&self.right),
            Self::percent(fl),
            Self::percent(fr),
            Self::percent(bl),
            Self::percent(br),
            if self.indicator.level() { "on" } else { "off" },
        )
    }
}

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let runtime = tokio::runtime::Runtime::new()?;
    runtime.block_on(async {
        log::info!("=================================");
        log::info!("  F0.1 Desktop Simulator");
        log::info!("=================================");

        let config = Config::default().with_server(ServerConfig::default().with_port(8080));

        let outputs = Outputs {
            left: (MockPwm::new(), MockPwm::new()),
            right: (MockPwm::new(), MockPwm::new()),
            leds: Default::default(),
            indicator: MockPin::new(),
        };
        let led = |pwm: &MockPwm| LedOutput::Pwm(pwm.clone());

        let hardware = RobotHardware {
            left_in1: outputs.left.0.clone(),
            left_in2: outputs.left.1.clone(),
            right_in1: outputs.right.0.clone(),
            right_in2: outputs.right.1.clone(),
            front_left: led(&outputs.leds[0]),
            front_right: led(&outputs.leds[1]),
            back_left: led(&outputs.leds[2]),
            back_right: led(&outputs.leds[3]),
            indicator: LedOutput::Binary(outputs.indicator.clone()),
        };

        let addr = SocketAddr::from(([127, 0, 0, 1], config.server.port));
        let robot: Robot<MockPwm, MockPin> = Robot::bind_addr(hardware, addr, config).await?;
        log::info!("Open http://{} in a browser", robot.local_addr()?);

        let report = async {
            let mut last = String::new();
            loop {
                tokio::time::sleep(REPORT_INTERVAL).await;
                let now = outputs.report();
                if now != last {
                    log::info!("{}", now);
                    last = now;
                }
            }
        };

        tokio::select! {
            never = robot.run() => match never {},
            _ = report => {}
        }
        Ok::<_, anyhow::Error>(())
    })
}
