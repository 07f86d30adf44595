//! Raspberry Pi hardware adapter (feature `rpi`).
//!
//! The only module that touches real peripherals. It claims the pins from
//! [`crate::pins`] through rppal, wraps them in embedded-hal trait
//! implementations, and registers the edge interrupts:
//!
//! | Line        | Trigger | Interrupt body                     |
//! |-------------|---------|------------------------------------|
//! | buttons     | both    | [`EdgeFlag::raise`]                |
//! | encoder A/B | both    | [`QuadratureDecoder::on_edge_a/b`] |
//!
//! rppal runs each async interrupt callback on its own thread; the bodies
//! above are single atomic operations, so nothing else is shared. The two
//! encoder threads are not ordered against each other; see the ordering
//! limit in [`crate::drivers::encoder`].
//!
//! [`QuadratureDecoder::on_edge_a/b`]: QuadratureDecoder::on_edge_a

use std::convert::Infallible;
use std::sync::Arc;

use embedded_hal::digital;
use embedded_hal::pwm::{self, SetDutyCycle};
use log::{error, info};
use rppal::gpio::{Event, Gpio, InputPin, Level, Trigger};
use rppal::pwm::{Channel, Polarity, Pwm};

use crate::config::FeederConfig;
use crate::drivers::button::{ButtonDriver, ButtonEvent, ButtonPanel, EdgeFlag};
use crate::drivers::encoder::QuadratureDecoder;
use crate::drivers::hbridge::HBridge;
use crate::error::HwInitError;
use crate::pins;

// ── embedded-hal wrappers ─────────────────────────────────────

/// A pulled-up rppal input read through `embedded_hal::digital::InputPin`.
pub struct GpioLine(InputPin);

impl digital::ErrorType for GpioLine {
    type Error = Infallible;
}

impl digital::InputPin for GpioLine {
    fn is_high(&mut self) -> Result<bool, Infallible> {
        Ok(self.0.is_high())
    }

    fn is_low(&mut self) -> Result<bool, Infallible> {
        Ok(self.0.is_low())
    }
}

#[derive(Debug)]
pub struct PwmWriteError(rppal::pwm::Error);

impl pwm::Error for PwmWriteError {
    fn kind(&self) -> pwm::ErrorKind {
        pwm::ErrorKind::Other
    }
}

/// A hardware PWM channel driven through `SetDutyCycle`.
pub struct PwmChannel(Pwm);

impl pwm::ErrorType for PwmChannel {
    type Error = PwmWriteError;
}

impl SetDutyCycle for PwmChannel {
    fn max_duty_cycle(&self) -> u16 {
        u16::MAX
    }

    fn set_duty_cycle(&mut self, duty: u16) -> Result<(), PwmWriteError> {
        let fraction = f64::from(duty) / f64::from(u16::MAX);
        self.0.set_duty_cycle(fraction).map_err(PwmWriteError)
    }
}

pub type WheelMotor = HBridge<PwmChannel, PwmChannel>;

// ── Board bring-up ────────────────────────────────────────────

/// Everything `main` needs from the board.
pub struct FeederHardware {
    pub buttons: ButtonPanel<GpioLine>,
    pub motor: WheelMotor,
    pub decoder: Arc<QuadratureDecoder>,
    /// Held so their interrupts stay registered.
    _encoder_lines: [InputPin; 2],
}

/// Claim every pin and register all interrupts.
pub fn init(config: &FeederConfig) -> Result<FeederHardware, HwInitError> {
    let gpio = Gpio::new().map_err(|e| {
        error!("Error during GPIO initialization: {}", e);
        HwInitError::GpioUnavailable
    })?;

    let motor = init_motor()?;
    let decoder = Arc::new(QuadratureDecoder::new());
    let encoder_lines = init_encoder(&gpio, &decoder)?;
    let buttons = init_buttons(&gpio, config.debounce_ms)?;

    info!("Hardware initialised");
    Ok(FeederHardware {
        buttons,
        motor,
        decoder,
        _encoder_lines: encoder_lines,
    })
}

fn input_pullup(gpio: &Gpio, pin: u8) -> Result<InputPin, HwInitError> {
    gpio.get(pin).map(|p| p.into_input_pullup()).map_err(|e| {
        error!("Error: Unable to claim GPIO{}: {}", pin, e);
        HwInitError::PinUnavailable(pin)
    })
}

fn on_both_edges<C>(line: &mut InputPin, pin: u8, callback: C) -> Result<(), HwInitError>
where
    C: FnMut(Event) + Send + 'static,
{
    line.set_async_interrupt(Trigger::Both, None, callback)
        .map_err(|e| {
            error!("Error: Unable to setup ISR for GPIO{}: {}", pin, e);
            HwInitError::InterruptSetupFailed(pin)
        })
}

fn is_rising(event: &Event) -> bool {
    event.trigger == Trigger::RisingEdge
}

fn init_encoder(gpio: &Gpio, decoder: &Arc<QuadratureDecoder>) -> Result<[InputPin; 2], HwInitError> {
    let mut a = input_pullup(gpio, pins::ENCODER_A_GPIO)?;
    let mut b = input_pullup(gpio, pins::ENCODER_B_GPIO)?;
    decoder.seed_levels(a.read() == Level::High, b.read() == Level::High);

    let dec = Arc::clone(decoder);
    on_both_edges(&mut a, pins::ENCODER_A_GPIO, move |event| dec.on_edge_a(is_rising(&event)))?;
    let dec = Arc::clone(decoder);
    on_both_edges(&mut b, pins::ENCODER_B_GPIO, move |event| dec.on_edge_b(is_rising(&event)))?;

    Ok([a, b])
}

fn init_buttons(gpio: &Gpio, debounce_ms: u32) -> Result<ButtonPanel<GpioLine>, HwInitError> {
    let layout = [
        (ButtonEvent::Up, pins::BUTTON_UP_GPIO),
        (ButtonEvent::Down, pins::BUTTON_DOWN_GPIO),
        (ButtonEvent::Left, pins::BUTTON_LEFT_GPIO),
        (ButtonEvent::Right, pins::BUTTON_RIGHT_GPIO),
        (ButtonEvent::Feed, pins::BUTTON_FEED_GPIO),
    ];

    let mut buttons: heapless::Vec<ButtonDriver<GpioLine>, 5> = heapless::Vec::new();
    for (event, pin) in layout {
        let mut line = input_pullup(gpio, pin)?;
        let edge = Arc::new(EdgeFlag::new());
        let flag = Arc::clone(&edge);
        on_both_edges(&mut line, pin, move |_| flag.raise())?;
        let driver = ButtonDriver::with_edge_flag(event, pin, GpioLine(line), debounce_ms, edge);
        // Capacity equals the layout length.
        let _ = buttons.push(driver);
    }

    let buttons = buttons
        .into_array()
        .map_err(|_| HwInitError::PinUnavailable(pins::BUTTON_FEED_GPIO))?;
    Ok(ButtonPanel::new(buttons))
}

fn pwm_channel(channel: Channel, pin: u8) -> Result<PwmChannel, HwInitError> {
    Pwm::with_frequency(channel, pins::MOTOR_PWM_FREQ_HZ, 0.0, Polarity::Normal, true)
        .map(PwmChannel)
        .map_err(|e| {
            error!("Error: Unable to configure PWM on GPIO{}: {}", pin, e);
            HwInitError::PwmUnavailable(pin)
        })
}

fn init_motor() -> Result<WheelMotor, HwInitError> {
    // BCM12 and BCM13 are hardware PWM channels 0 and 1.
    let in1 = pwm_channel(Channel::Pwm0, pins::MOTOR_IN1_GPIO)?;
    let in2 = pwm_channel(Channel::Pwm1, pins::MOTOR_IN2_GPIO)?;
    Ok(HBridge::new(in1, in2))
}
