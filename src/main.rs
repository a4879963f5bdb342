//! E-Vent firmware main entry point.
//!
//! Wires the hardware adapters around the breath controller and runs the
//! fixed-period control loop.
//!
//! ```text
//! ┌────────────────────────────────────────────────────────────────┐
//! │                      Adapters (outer ring)                     │
//! │                                                                │
//! │  HardwareAdapter        LogEventSink      MonotonicClock       │
//! │  (Pressure+Motor+Alarm) (EventSink)       (Clock)              │
//! │  FrontPanel (switches → VentCommand)                           │
//! │                                                                │
//! │  ──────────────── Port Trait Boundary ───────────────────      │
//! │                                                                │
//! │  ┌────────────────────────────────────────────────────────┐    │
//! │  │            BreathController (pure logic)               │    │
//! │  │  AC/VC tables · AlarmEvaluator · MachineSupervisor     │    │
//! │  └────────────────────────────────────────────────────────┘    │
//! └────────────────────────────────────────────────────────────────┘
//! ```
#![deny(unused_must_use)]

use anyhow::{Context, Result};
use esp_idf_hal::delay::{Delay, FreeRtos};
use esp_idf_hal::i2c::{I2cConfig, I2cDriver};
use esp_idf_hal::peripherals::Peripherals;
use esp_idf_hal::units::Hertz;
use log::{error, info, warn};

use ventcore::adapters::hardware::HardwareAdapter;
use ventcore::adapters::log_sink::{LogAlarmHandler, LogEventSink};
use ventcore::adapters::time::MonotonicClock;
use ventcore::app::ports::AlarmHandler;
use ventcore::app::service::BreathController;
use ventcore::config::VentilatorConfig;
use ventcore::drivers::buzzer::Buzzer;
use ventcore::drivers::hw_init;
use ventcore::drivers::motor::{MotorState, PaddleMotor};
use ventcore::drivers::switches::FrontPanel;
use ventcore::pins;
use ventcore::sensors::HscPressureSensor;

/// Control ticks between telemetry log lines (1 s at 100 Hz).
const TELEMETRY_EVERY_TICKS: u32 = 100;

fn main() -> Result<()> {
    // ── 1. ESP-IDF bootstrap ──────────────────────────────────
    esp_idf_sys::link_patches();
    esp_idf_logger::init()?;

    info!("╔══════════════════════════════════════╗");
    info!("║  E-Vent v{}                          ║", env!("CARGO_PKG_VERSION"));
    info!("╚══════════════════════════════════════╝");

    // ── 2. Peripherals ────────────────────────────────────────
    if let Err(e) = hw_init::init_peripherals() {
        error!("HAL init failed: {}", e);
        return Err(ventcore::error::Error::from(e).into());
    }

    let peripherals = Peripherals::take().context("peripherals already taken")?;
    let i2c_cfg = I2cConfig::new().baudrate(Hertz(pins::I2C_FREQ_HZ));
    // SDA/SCL must match pins::I2C_SDA_GPIO / pins::I2C_SCL_GPIO.
    let i2c = I2cDriver::new(
        peripherals.i2c0,
        peripherals.pins.gpio14,
        peripherals.pins.gpio15,
        &i2c_cfg,
    )
    .context("I2C init")?;
    let sensor = HscPressureSensor::new(i2c, Delay::new_default());

    let mut hw = HardwareAdapter::new(sensor, PaddleMotor::new(), Buzzer::new());
    let mut panel = FrontPanel::new();
    let mut sink = LogEventSink::new();
    let mut alarm_log = LogAlarmHandler::new();
    let mut breath_timer = MonotonicClock::new();
    let uptime = MonotonicClock::new();

    // ── 3. Controller ─────────────────────────────────────────
    let config = VentilatorConfig {
        mode: panel.selected_mode(),
        ..VentilatorConfig::default()
    };
    let period_ms = config.control_loop_interval_ms;
    let mut controller = BreathController::new(config).context("config rejected")?;
    controller.start(&mut sink);

    info!("System ready. Entering control loop ({} ms).", period_ms);

    // ── 4. Control loop ───────────────────────────────────────
    let mut telemetry_counter: u32 = 0;
    loop {
        for cmd in panel.poll(uptime.uptime_ms()) {
            if let Err(e) = controller.handle_command(cmd, &mut sink) {
                warn!("Command {:?} rejected: {}", cmd, e);
            }
        }

        // `hw` is already borrowed as the sensor/motor, so the buzzer
        // follows the bitmask right after the tick.
        controller.tick(&mut hw, &mut breath_timer, &mut sink, &mut alarm_log);
        hw.annunciate(controller.errors());

        telemetry_counter += 1;
        if telemetry_counter >= TELEMETRY_EVERY_TICKS {
            telemetry_counter = 0;
            let t = controller.build_telemetry();
            info!(
                "TELEM | {:?} (code {}) | {:?} | P={:.1} PIP={:.1} PEEP={:.1} cmH2O | \
                 {:.1} bpm | alarms=0b{:08b}",
                t.state,
                t.debug_code,
                t.machine_state,
                t.pressure,
                t.peak_pressure,
                t.peep_pressure,
                t.breaths_per_minute,
                t.errors,
            );
        }

        if !controller.machine_state().is_ventilating() && hw.motor().state() != MotorState::Idle {
            hw.motor_off();
        }

        FreeRtos::delay_ms(period_ms);
    }
}
