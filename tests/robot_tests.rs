//! End-to-end tests: HTTP request in, motor duty and LED levels out.

mod common;

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use tokio::net::TcpStream;

use f01_rover::hal::{MockPin, MockPwm};
use f01_rover::led::brightness_to_duty;
use f01_rover::services::{ControlPage, OK_RESPONSE};
use f01_rover::traits::{BinaryOutput, PwmChannel, MAX_DUTY};
use f01_rover::{Config, LedOutput, Robot, RobotHardware};

use common::{exchange, get, wait_until};

struct Wiring {
    left: (MockPwm, MockPwm),
    right: (MockPwm, MockPwm),
    front: (MockPwm, MockPwm),
    back: (MockPwm, MockPwm),
    indicator: MockPin,
}

impl Wiring {
    fn new() -> Self {
        Self {
            left: Default::default(),
            right: Default::default(),
            front: Default::default(),
            back: Default::default(),
            indicator: MockPin::new(),
        }
    }

    fn hardware(&self) -> RobotHardware<MockPwm, MockPin> {
        let pwm = |p: &MockPwm| LedOutput::Pwm(p.clone());
        RobotHardware {
            left_in1: self.left.0.clone(),
            left_in2: self.left.1.clone(),
            right_in1: self.right.0.clone(),
            right_in2: self.right.1.clone(),
            front_left: pwm(&self.front.0),
            front_right: pwm(&self.front.1),
            back_left: pwm(&self.back.0),
            back_right: pwm(&self.back.1),
            indicator: LedOutput::Binary(self.indicator.clone()),
        }
    }
}

async fn robot(wiring: &Wiring) -> (Robot<MockPwm, MockPin>, SocketAddr) {
    let robot = Robot::bind_with_page(
        wiring.hardware(),
        "127.0.0.1:0",
        Config::default(),
        ControlPage::from_html("<p>rover</p>"),
    )
    .await
    .unwrap();
    let addr = robot.local_addr().unwrap();
    (robot, addr)
}

#[tokio::test]
async fn set_drives_motors_and_markers() {
    let wiring = Wiring::new();
    let (robot, addr) = robot(&wiring).await;
    let floor = brightness_to_duty(25.0);

    let client = async {
        // Startup fade brings every marker to the floor
        assert!(wait_until(|| wiring.back.0.duty_u16() == floor).await);

        let response = exchange(addr, &get("/set?left=100&right=100")).await;
        assert_eq!(response, OK_RESPONSE);

        // Left motor runs at half duty through its correction factor
        assert!(wait_until(|| wiring.left.0.duty_u16() == 32767).await);
        assert!(wait_until(|| wiring.right.0.duty_u16() == MAX_DUTY).await);
        assert_eq!(wiring.left.1.duty_u16(), 0);
        assert_eq!(wiring.right.1.duty_u16(), 0);

        assert!(wait_until(|| wiring.front.0.duty_u16() == MAX_DUTY).await);
        assert!(wait_until(|| wiring.front.1.duty_u16() == MAX_DUTY).await);
        assert_eq!(wiring.back.0.duty_u16(), floor);
        assert_eq!(wiring.back.1.duty_u16(), floor);
    };

    tokio::select! {
        never = robot.run() => match never {},
        _ = client => {}
    }
}

#[tokio::test]
async fn reverse_lights_back_markers() {
    let wiring = Wiring::new();
    let (robot, addr) = robot(&wiring).await;
    let floor = brightness_to_duty(25.0);

    let client = async {
        exchange(addr, &get("/set?left=-60&right=-60")).await;

        assert!(wait_until(|| wiring.right.1.duty_u16() == 39321).await);
        assert!(wait_until(|| wiring.back.1.duty_u16() == brightness_to_duty(60.0)).await);
        assert!(wait_until(|| wiring.front.1.duty_u16() == floor).await);
        assert_eq!(wiring.right.0.duty_u16(), 0);

        exchange(addr, &get("/set?stop=1")).await;

        assert!(wait_until(|| wiring.right.1.duty_u16() == 0).await);
        assert!(wait_until(|| wiring.back.1.duty_u16() == floor).await);
    };

    tokio::select! {
        never = robot.run() => match never {},
        _ = client => {}
    }
}

#[tokio::test]
async fn indicator_blinks_until_a_client_connects() {
    let wiring = Wiring::new();
    let (robot, addr) = robot(&wiring).await;
    let connections = Arc::clone(robot.connections());

    let client = async {
        // Blinking: the pin has been both on and off
        assert!(wait_until(|| {
            let history = wiring.indicator.history();
            history.contains(&true) && history.contains(&false)
        })
        .await);

        let held = TcpStream::connect(addr).await.unwrap();
        assert!(wait_until(|| connections.active() == 1).await);

        // Give the indicator a few polls to notice, then it must stay put
        tokio::time::sleep(Duration::from_millis(300)).await;
        assert!(wiring.indicator.level());
        let writes = wiring.indicator.write_count();

        drop(held);
        assert!(wait_until(|| connections.active() == 0).await);
        tokio::time::sleep(Duration::from_millis(1200)).await;

        // Steady on, even after the client goes away
        assert!(wiring.indicator.level());
        assert_eq!(wiring.indicator.write_count(), writes);
    };

    tokio::select! {
        never = robot.run() => match never {},
        _ = client => {}
    }
}
