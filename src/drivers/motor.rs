use core::cell::RefCell;

use embassy_stm32::peripherals::TIM3;
use embassy_stm32::timer::simple_pwm::SimplePwm;
use embassy_stm32::timer::Channel;

use cotask_bench::hal::Motor;
use cotask_bench::protocol::MotorId;

/// Both H-bridges share TIM3, one channel pair per motor.
pub type BridgePwm = RefCell<SimplePwm<'static, TIM3>>;

/// One DC motor on a DRV8847 bridge, driven IN1/IN2 style.
///
/// Forward PWMs IN1 with IN2 low, reverse the opposite. Zero duty drives both
/// inputs high, which the bridge treats as brake.
pub struct HBridgeMotor {
    id: MotorId,
    pwm: &'static BridgePwm,
    forward: Channel,
    reverse: Channel,
    duty: u8,
    direction: i8,
}

impl HBridgeMotor {
    pub fn new(id: MotorId, pwm: &'static BridgePwm, forward: Channel, reverse: Channel) -> Self {
        {
            let mut pwm = pwm.borrow_mut();
            pwm.enable(forward);
            pwm.enable(reverse);
        }
        let mut motor = Self {
            id,
            pwm,
            forward,
            reverse,
            duty: 0,
            direction: 0,
        };
        motor.apply(0);
        motor
    }

    fn apply(&mut self, duty: i8) {
        let mut pwm = self.pwm.borrow_mut();
        let max = pwm.get_max_duty() as u32;
        let scaled = (max * duty.unsigned_abs() as u32 / 100) as u16;
        match duty.signum() {
            1 => {
                pwm.set_duty(self.reverse, 0);
                pwm.set_duty(self.forward, scaled);
            }
            -1 => {
                pwm.set_duty(self.forward, 0);
                pwm.set_duty(self.reverse, scaled);
            }
            _ => {
                let full = max as u16;
                pwm.set_duty(self.forward, full);
                pwm.set_duty(self.reverse, full);
            }
        }
    }
}

impl Motor for HBridgeMotor {
    fn id(&self) -> MotorId {
        self.id
    }

    fn set_duty(&mut self, duty: i8) {
        let duty = duty.clamp(-100, 100);
        self.apply(duty);
        self.duty = duty.unsigned_abs();
        self.direction = duty.signum();
        defmt::debug!("{} duty {}", self.id.label(), duty);
    }

    fn duty(&self) -> u8 {
        self.duty
    }

    fn direction(&self) -> i8 {
        self.direction
    }
}
