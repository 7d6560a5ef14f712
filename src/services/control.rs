//! The control loop: latest command in, motors and marker LEDs out.
//!
//! Every poll the loop copies the latest [`Command`] from the
//! [`CommandCell`]. Motors are only re-driven when the command changed, and
//! the four marker LEDs only when their derived brightness changed. Commands
//! published between two polls are never seen, which is fine because applying
//! the same command twice has no effect.
//!
//! Both motors are throttled concurrently and without a ramp, so steering
//! tracks the input as closely as the poll interval allows.

use core::convert::Infallible;
use core::time::Duration;
use std::sync::Arc;

use crate::config::LedConfig;
use crate::duty::MAX_SPEED;
use crate::led::{LedDriver, LedResult, MAX_BRIGHTNESS};
use crate::motor::{MotorController, DEADZONE};
use crate::traits::{BinaryOutput, PwmChannel};
use crate::transition::Ramp;

use super::shared::{Command, CommandCell, ConnectionCounter};

/// Default sleep between polls.
pub const POLL_INTERVAL: Duration = Duration::from_millis(10);

// ============================================================================
// LED levels
// ============================================================================

/// Brightness of the four marker LEDs, in percent.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LedLevels {
    /// Front left
    pub front_left: f32,
    /// Front right
    pub front_right: f32,
    /// Back left
    pub back_left: f32,
    /// Back right
    pub back_right: f32,
}

impl LedLevels {
    /// All four at the same brightness.
    pub const fn uniform(bright: f32) -> Self {
        Self {
            front_left: bright,
            front_right: bright,
            back_left: bright,
            back_right: bright,
        }
    }

    /// Derive marker brightness from a command.
    ///
    /// A wheel driving forward past the deadzone lights its front LED at its
    /// speed, one driving backward lights its back LED at `|speed|`. Every
    /// other LED sits at `floor`.
    pub fn from_command(cmd: Command, floor: f32) -> Self {
        Self {
            front_left: forward_side(cmd.left, floor),
            front_right: forward_side(cmd.right, floor),
            back_left: reverse_side(cmd.left, floor),
            back_right: reverse_side(cmd.right, floor),
        }
    }
}

fn forward_side(speed: i32, floor: f32) -> f32 {
    let speed = speed.clamp(-MAX_SPEED, MAX_SPEED);
    if speed > DEADZONE {
        speed as f32
    } else {
        floor
    }
}

fn reverse_side(speed: i32, floor: f32) -> f32 {
    let speed = speed.clamp(-MAX_SPEED, MAX_SPEED);
    if speed < -DEADZONE {
        speed.unsigned_abs() as f32
    } else {
        floor
    }
}

/// The four marker LEDs.
pub struct MarkerLeds<P, B> {
    /// Front left
    pub front_left: LedDriver<P, B>,
    /// Front right
    pub front_right: LedDriver<P, B>,
    /// Back left
    pub back_left: LedDriver<P, B>,
    /// Back right
    pub back_right: LedDriver<P, B>,
}

impl<P: PwmChannel, B: BinaryOutput> MarkerLeds<P, B> {
    /// Drive all four LEDs concurrently. Returns `true` if every write worked.
    pub async fn show(&mut self, levels: LedLevels, smooth: f32) -> bool {
        let Self {
            front_left,
            front_right,
            back_left,
            back_right,
        } = self;

        let results = tokio::join!(
            front_left.on(levels.front_left, smooth),
            front_right.on(levels.front_right, smooth),
            back_left.on(levels.back_left, smooth),
            back_right.on(levels.back_right, smooth),
        );

        let mut ok = true;
        for (name, result) in [
            ("front left", results.0),
            ("front right", results.1),
            ("back left", results.2),
            ("back right", results.3),
        ] {
            if let Err(e) = result {
                log::warn!("[LED] {}: {}", name, e);
                ok = false;
            }
        }
        ok
    }
}

// ============================================================================
// Control loop
// ============================================================================

/// Owns both motors and the marker LEDs and keeps them in line with the
/// latest command.
pub struct ControlLoop<P: PwmChannel, B: BinaryOutput> {
    left: MotorController<P>,
    right: MotorController<P>,
    leds: MarkerLeds<P, B>,
    commands: Arc<CommandCell>,
    ramp: Ramp,
    floor: f32,
    smooth: f32,
    startup_smooth: f32,
    poll_interval: Duration,
    last_command: Option<Command>,
    last_levels: Option<LedLevels>,
}

impl<P: PwmChannel, B: BinaryOutput> ControlLoop<P, B> {
    /// Create a loop with default LED behaviour and a 10 ms poll.
    pub fn new(
        left: MotorController<P>,
        right: MotorController<P>,
        leds: MarkerLeds<P, B>,
        commands: Arc<CommandCell>,
    ) -> Self {
        let led_config = LedConfig::default();
        Self {
            left,
            right,
            leds,
            commands,
            ramp: Ramp::NONE,
            floor: led_config.floor,
            smooth: led_config.smooth,
            startup_smooth: led_config.startup_smooth,
            poll_interval: POLL_INTERVAL,
            last_command: None,
            last_levels: None,
        }
    }

    /// Ramp used for every throttle change.
    pub fn with_ramp(mut self, ramp: Ramp) -> Self {
        self.ramp = ramp;
        self
    }

    /// Take floor and smoothing from an [`LedConfig`].
    pub fn with_led_config(mut self, config: &LedConfig) -> Self {
        self.floor = config.floor;
        self.smooth = config.smooth;
        self.startup_smooth = config.startup_smooth;
        self
    }

    /// Sleep between polls.
    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    /// Last command applied to both motors.
    pub fn last_command(&self) -> Option<Command> {
        self.last_command
    }

    /// Last brightness shown on the marker LEDs.
    pub fn last_levels(&self) -> Option<LedLevels> {
        self.last_levels
    }

    /// Left motor.
    pub fn left(&self) -> &MotorController<P> {
        &self.left
    }

    /// Right motor.
    pub fn right(&self) -> &MotorController<P> {
        &self.right
    }

    /// Marker LEDs.
    pub fn leds(&self) -> &MarkerLeds<P, B> {
        &self.leds
    }

    /// Fade all marker LEDs up to the floor.
    pub async fn startup(&mut self) {
        let levels = LedLevels::uniform(self.floor);
        if self.leds.show(levels, self.startup_smooth).await {
            self.last_levels = Some(levels);
        }
    }

    /// One poll: apply the latest command if it changed.
    ///
    /// A side whose write fails is retried on the next poll.
    pub async fn step(&mut self) {
        let cmd = self.commands.snapshot();

        if self.last_command != Some(cmd) {
            let ramp = self.ramp;
            let (left, right) = tokio::join!(
                self.left.throttle(cmd.left, ramp),
                self.right.throttle(cmd.right, ramp),
            );
            if let Err(e) = &left {
                log::warn!("[Motor] left: {:?}", e);
            }
            if let Err(e) = &right {
                log::warn!("[Motor] right: {:?}", e);
            }
            if left.is_ok() && right.is_ok() {
                log::debug!("[Control] left={} right={}", cmd.left, cmd.right);
                self.last_command = Some(cmd);
            }
        }

        let levels = LedLevels::from_command(cmd, self.floor);
        if self.last_levels != Some(levels) && self.leds.show(levels, self.smooth).await {
            self.last_levels = Some(levels);
        }
    }

    /// Fade in, then poll forever.
    pub async fn run(mut self) -> Infallible {
        log::info!("[Control] running F0.1");
        self.startup().await;
        loop {
            self.step().await;
            tokio::time::sleep(self.poll_interval).await;
        }
    }
}

/// Blink `led` until the first client connects, then leave it on.
///
/// The blink is cancelled between writes, never halfway through one.
pub async fn indicate_until_connected<P: PwmChannel, B: BinaryOutput>(
    led: &mut LedDriver<P, B>,
    connections: &ConnectionCounter,
    interval_ms: u64,
    poll: Duration,
) -> LedResult<P, B> {
    let connected = async {
        while connections.active() == 0 {
            tokio::time::sleep(poll).await;
        }
    };
    led.blink_until(interval_ms, MAX_BRIGHTNESS, 0.0, connected)
        .await;
    log::info!("[LED] controller connected");
    led.on(MAX_BRIGHTNESS, 0.0).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hal::{MockPin, MockPwm};
    use crate::led::{brightness_to_duty, LedOutput};
    use crate::traits::MotorPhase;

    struct Rig {
        control: ControlLoop<MockPwm, MockPin>,
        commands: Arc<CommandCell>,
        left_in1: MockPwm,
        left_in2: MockPwm,
        front_left: MockPwm,
        back_left: MockPwm,
    }

    fn rig() -> Rig {
        let left_in1 = MockPwm::new();
        let left_in2 = MockPwm::new();
        let front_left = MockPwm::new();
        let back_left = MockPwm::new();
        let led = |pwm: &MockPwm| LedDriver::new(LedOutput::Pwm(pwm.clone()));

        let leds = MarkerLeds {
            front_left: led(&front_left),
            front_right: led(&MockPwm::new()),
            back_left: led(&back_left),
            back_right: led(&MockPwm::new()),
        };
        let commands = Arc::new(CommandCell::new());
        let control = ControlLoop::new(
            MotorController::new(left_in1.clone(), left_in2.clone(), 1.0),
            MotorController::new(MockPwm::new(), MockPwm::new(), 1.0),
            leds,
            Arc::clone(&commands),
        );

        Rig {
            control,
            commands,
            left_in1,
            left_in2,
            front_left,
            back_left,
        }
    }

    // ========================================================================
    // LedLevels
    // ========================================================================

    #[test]
    fn levels_at_rest_sit_on_floor() {
        assert_eq!(
            LedLevels::from_command(Command::STOP, 25.0),
            LedLevels::uniform(25.0)
        );
    }

    #[test]
    fn levels_follow_direction() {
        let levels = LedLevels::from_command(Command::new(80, -60), 25.0);
        assert_eq!(levels.front_left, 80.0);
        assert_eq!(levels.back_left, 25.0);
        assert_eq!(levels.front_right, 25.0);
        assert_eq!(levels.back_right, 60.0);
    }

    #[test]
    fn levels_clamp_out_of_range_speed() {
        let levels = LedLevels::from_command(Command::new(250, -1000), 25.0);
        assert_eq!(levels.front_left, 100.0);
        assert_eq!(levels.back_right, 100.0);
        assert_eq!(
            levels,
            LedLevels::from_command(Command::new(100, -100), 25.0)
        );
    }

    #[test]
    fn levels_deadzone_edge_uses_floor() {
        let levels = LedLevels::from_command(Command::new(25, -25), 10.0);
        assert_eq!(levels, LedLevels::uniform(10.0));
    }

    // ========================================================================
    // ControlLoop
    // ========================================================================

    #[tokio::test(start_paused = true)]
    async fn startup_fades_to_floor() {
        let mut rig = rig();

        rig.control.startup().await;

        assert_eq!(rig.front_left.history().len(), 20);
        assert_eq!(rig.front_left.duty_u16(), brightness_to_duty(25.0));
        assert_eq!(rig.control.last_levels(), Some(LedLevels::uniform(25.0)));
    }

    #[tokio::test(start_paused = true)]
    async fn unchanged_command_writes_nothing() {
        let mut rig = rig();
        rig.commands.publish(Command::new(60, 60));
        rig.control.step().await;

        let motor_writes = rig.left_in1.write_count();
        let led_writes = rig.front_left.write_count();
        rig.control.step().await;
        rig.control.step().await;

        assert_eq!(rig.left_in1.write_count(), motor_writes);
        assert_eq!(rig.front_left.write_count(), led_writes);
    }

    #[tokio::test(start_paused = true)]
    async fn command_snaps_motors() {
        let mut rig = rig();
        rig.commands.publish(Command::new(100, 100));

        rig.control.step().await;

        // No ramp configured: single write to full duty
        assert_eq!(rig.left_in1.history(), vec![65535]);
        assert_eq!(rig.control.left().phase(), MotorPhase::Forward);
        assert_eq!(rig.control.last_command(), Some(Command::new(100, 100)));
    }

    #[tokio::test(start_paused = true)]
    async fn over_range_command_records_shown_level() {
        let mut rig = rig();
        rig.commands.publish(Command::new(250, 0));

        rig.control.step().await;

        let levels = rig.control.last_levels().unwrap();
        assert_eq!(levels.front_left, 100.0);
        assert_eq!(rig.front_left.duty_u16(), 65535);
    }

    #[tokio::test(start_paused = true)]
    async fn reverse_lights_back_led() {
        let mut rig = rig();
        rig.commands.publish(Command::new(-80, 0));

        rig.control.step().await;

        assert_eq!(rig.left_in2.duty_u16(), 52428);
        assert_eq!(rig.back_left.duty_u16(), brightness_to_duty(80.0));
        assert_eq!(rig.front_left.duty_u16(), brightness_to_duty(25.0));
    }

    #[tokio::test(start_paused = true)]
    async fn failed_motor_write_retried_next_poll() {
        let mut rig = rig();
        rig.left_in2.set_failing(true);
        rig.commands.publish(Command::new(50, 50));

        rig.control.step().await;
        assert_eq!(rig.control.last_command(), None);

        rig.left_in2.set_failing(false);
        rig.control.step().await;
        assert_eq!(rig.control.last_command(), Some(Command::new(50, 50)));
        assert_eq!(rig.control.left().phase(), MotorPhase::Forward);
    }

    #[tokio::test(start_paused = true)]
    async fn indicator_blinks_until_connected() {
        let pwm = MockPwm::new();
        let mut led: LedDriver<MockPwm, MockPin> = LedDriver::new(LedOutput::Pwm(pwm.clone()));
        let counter = Arc::new(ConnectionCounter::new(2));

        let connector = {
            let counter = Arc::clone(&counter);
            tokio::spawn(async move {
                tokio::time::sleep(Duration::from_millis(1150)).await;
                let guard = counter.try_acquire();
                tokio::time::sleep(Duration::from_secs(5)).await;
                drop(guard);
            })
        };

        indicate_until_connected(&mut led, &counter, 500, Duration::from_millis(100))
            .await
            .unwrap();

        // Toggles at 0, 500, 1000 ms, then steady on
        assert_eq!(pwm.history(), vec![65535, 0, 65535, 65535]);
        connector.abort();
    }
}
