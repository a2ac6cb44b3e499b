//! 10 ms zone control cycle.
//!
//! [`ZoneController`] owns every component instance and fixes the order in
//! which they run:
//!
//! 1. Read the mode left by the previous cycle.
//! 2. Verify received command frames, substitute safe defaults on integrity loss.
//! 3. Step steering, brake, motor.
//! 4. Aggregate faults in the supervisor.
//! 5. Apply enable overrides.
//! 6. Arbitrate the mode.
//! 7. Report diagnostics.
//! 8. Stamp the outgoing status frame.

use static_assertions::const_assert;
use tracing::{debug, info, warn};
use zone_common::config::ConfigError;
use zone_common::consts::{E2E_SLOT_COUNT, FRAME_LEN};
use zone_common::zone::config::ZoneConfig;
use zone_common::zone::diag::{DiagEventId, EventStatus};
use zone_common::zone::state::{BusErrorState, Mode, SafetyStatus, SelfTestResult};

use crate::channel::brake::BRAKE_SAFE_PCT;
use crate::channel::motor::BridgeDrive;
use crate::channel::{
    BrakeChannel, BrakeInputs, BrakeOutputs, Feedback, MotorChannel, MotorInputs, MotorOutputs,
    SteeringChannel, SteeringInputs, SteeringOutputs,
};
use crate::diag::memory::EventMemory;
use crate::diag::{DiagnosticSink, TransitionFilter};
use crate::e2e::codec::MessageIntegrityCodec;
use crate::fault::current::CurrentMonitor;
use crate::safety::{FaultFlags, SafetyReport, SafetySupervisor, SupervisorInputs};
use crate::state::{ModeAction, ModeActionHandler, ModeArbiter, ModeTransition};

// ─── Message slots ──────────────────────────────────────────────────

pub const RX_TORQUE: u8 = 0;
pub const RX_STEER: u8 = 1;
pub const RX_BRAKE: u8 = 2;
pub const TX_STATUS: u8 = 3;

/// Payload value position inside a command frame (i16 little-endian).
const VALUE_BYTE: usize = 2;

const_assert!(VALUE_BYTE + 2 <= FRAME_LEN);
const_assert!(TX_STATUS as usize + 1 == E2E_SLOT_COUNT);

pub type Frame = [u8; FRAME_LEN];
pub type ZoneCodec = MessageIntegrityCodec<E2E_SLOT_COUNT>;

/// Build an unprotected command frame carrying `value`.
pub fn command_frame(value: i16) -> Frame {
    let mut frame = [0u8; FRAME_LEN];
    frame[VALUE_BYTE..VALUE_BYTE + 2].copy_from_slice(&value.to_le_bytes());
    frame
}

fn frame_value(frame: &Frame) -> i16 {
    i16::from_le_bytes([frame[VALUE_BYTE], frame[VALUE_BYTE + 1]])
}

// ─── Inputs / outputs ───────────────────────────────────────────────

/// Everything sampled at the start of one cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CycleInputs {
    pub torque_frame: Option<Frame>,
    pub steer_frame: Option<Frame>,
    pub brake_frame: Option<Frame>,
    pub steer_feedback_deg: Feedback<i16>,
    pub brake_feedback_pct: Feedback<u8>,
    pub emergency_stop: bool,
    /// Thermal derating [%].
    pub derate_pct: u8,
    pub overtemp: bool,
    pub direction_mismatch: bool,
    pub stall: bool,
    pub battery_fault: bool,
    pub self_test: SelfTestResult,
    pub bus_state: BusErrorState,
    /// Externally requested mode, applied after the safety policy.
    pub mode_request: Option<Mode>,
}

impl Default for CycleInputs {
    fn default() -> Self {
        Self {
            torque_frame: None,
            steer_frame: None,
            brake_frame: None,
            steer_feedback_deg: Ok(0),
            brake_feedback_pct: Ok(0),
            emergency_stop: false,
            derate_pct: 100,
            overtemp: false,
            direction_mismatch: false,
            stall: false,
            battery_fault: false,
            self_test: SelfTestResult::NotRun,
            bus_state: BusErrorState::Active,
            mode_request: None,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CycleOutputs {
    /// Mode after this cycle's arbitration.
    pub mode: Mode,
    pub mode_changed: bool,
    pub steering: SteeringOutputs,
    pub motor: MotorOutputs,
    pub brake: BrakeOutputs,
    pub safety: SafetyReport,
    pub status_frame: Frame,
}

// ─── Mode action gate ───────────────────────────────────────────────

/// Output gate driven by mode actions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ActuatorGate {
    pub actuators_enabled: bool,
    pub brake_engaged: bool,
}

impl ModeActionHandler for ActuatorGate {
    fn execute(&mut self, mode: Mode, action: ModeAction) {
        debug!(?mode, ?action, "mode action");
        match action {
            ModeAction::EnableActuators => self.actuators_enabled = true,
            ModeAction::DisableActuators => self.actuators_enabled = false,
            ModeAction::EngageBrake => self.brake_engaged = true,
            ModeAction::ReleaseBrake => self.brake_engaged = false,
        }
    }
}

/// Feeds the event memory with every report and the external sink with changes only.
struct CycleSink<'a> {
    memory: &'a mut EventMemory,
    filter: &'a mut TransitionFilter,
    external: &'a mut dyn DiagnosticSink,
}

impl DiagnosticSink for CycleSink<'_> {
    fn report(&mut self, event: DiagEventId, status: EventStatus) {
        self.memory.report(event, status);
        if self.filter.observe(event, status) {
            self.external.report(event, status);
        }
    }
}

/// Last accepted command values.
#[derive(Debug, Clone, Copy)]
struct AcceptedCommands {
    torque: i16,
    steer_deg: i16,
    brake_pct: u8,
}

// ─── Controller ─────────────────────────────────────────────────────

pub struct ZoneController {
    cfg: ZoneConfig,
    codec: ZoneCodec,
    steering: SteeringChannel,
    motor: MotorChannel,
    brake: BrakeChannel,
    current: CurrentMonitor,
    supervisor: SafetySupervisor,
    arbiter: ModeArbiter,
    gate: ActuatorGate,
    memory: EventMemory,
    filter: TransitionFilter,
    accepted: AcceptedCommands,
    integrity_lost: [bool; 3],
    cycle: u64,
}

impl ZoneController {
    /// Validate `cfg` and build every component in its start-up state.
    pub fn new(cfg: &ZoneConfig) -> Result<Self, ConfigError> {
        cfg.validate()?;
        let arbiter = ModeArbiter::new();
        let mut gate = ActuatorGate {
            actuators_enabled: false,
            brake_engaged: true,
        };
        arbiter.dispatch(&mut gate);

        Ok(Self {
            codec: zone_codec(cfg),
            steering: SteeringChannel::new(cfg.steering.clone()),
            motor: MotorChannel::new(cfg.motor.clone()),
            brake: BrakeChannel::new(cfg.brake.clone()),
            current: CurrentMonitor::new(&cfg.current),
            supervisor: SafetySupervisor::new(cfg.supervisor.clone()),
            arbiter,
            gate,
            memory: EventMemory::new(),
            filter: TransitionFilter::new(),
            accepted: AcceptedCommands {
                torque: 0,
                steer_deg: 0,
                brake_pct: BRAKE_SAFE_PCT,
            },
            integrity_lost: [false; 3],
            cycle: 0,
            cfg: cfg.clone(),
        })
    }

    /// 1 ms current sample. Returns the overcurrent latch state.
    pub fn sample_current(&mut self, current_ma: u32) -> bool {
        self.current.sample(current_ma)
    }

    pub fn run_cycle(
        &mut self,
        inputs: &CycleInputs,
        sink: &mut dyn DiagnosticSink,
    ) -> CycleOutputs {
        self.cycle = self.cycle.wrapping_add(1);
        let mode = self.arbiter.mode();

        self.receive_commands(inputs);

        // Channels
        let steering = self.steering.step(&SteeringInputs {
            command_deg: self.accepted.steer_deg,
            feedback_deg: inputs.steer_feedback_deg,
        });
        let brake = self.brake.step(&BrakeInputs {
            command_pct: self.accepted.brake_pct,
            feedback_pct: inputs.brake_feedback_pct,
            emergency_stop: inputs.emergency_stop,
            engaged: self.gate.brake_engaged,
        });
        let motor = self.motor.step(
            &MotorInputs {
                torque_cmd: self.accepted.torque,
                emergency_stop: inputs.emergency_stop,
                brake_cutoff: brake.motor_cutoff,
                derate_pct: inputs.derate_pct,
                overcurrent: self.current.is_overcurrent(),
            },
            mode,
        );

        // Supervision
        let safety = self.supervisor.step(&SupervisorInputs {
            flags: FaultFlags {
                overcurrent: self.current.is_overcurrent(),
                overtemp: inputs.overtemp,
                direction: inputs.direction_mismatch,
                battery: inputs.battery_fault,
                stall: inputs.stall,
                steering: steering.latched,
                brake: brake.latched,
                bridge: self.motor.is_terminal(),
            },
            emergency_stop: inputs.emergency_stop,
            mode,
            self_test: inputs.self_test,
            bus_state: inputs.bus_state,
            rx_activity: inputs.torque_frame.is_some()
                || inputs.steer_frame.is_some()
                || inputs.brake_frame.is_some(),
        });

        let (steering, motor) = self.apply_gate(&safety, steering, motor);

        let mode_changed = self.arbitrate(safety.status, inputs.mode_request);

        // Diagnostics
        let mut diag = CycleSink {
            memory: &mut self.memory,
            filter: &mut self.filter,
            external: sink,
        };
        self.steering.report(&mut diag);
        self.motor.report(&mut diag);
        self.brake.report(&mut diag);
        self.supervisor.report(&mut diag);
        for (event, lost) in [
            DiagEventId::E2eTorque,
            DiagEventId::E2eSteer,
            DiagEventId::E2eBrake,
        ]
        .into_iter()
        .zip(self.integrity_lost)
        {
            diag.report(event, EventStatus::from_failed(lost));
        }

        let status_frame = self.status_frame(&safety);

        CycleOutputs {
            mode: self.arbiter.mode(),
            mode_changed,
            steering,
            motor,
            brake,
            safety,
            status_frame,
        }
    }

    fn receive_commands(&mut self, inputs: &CycleInputs) {
        let limit = self.cfg.e2e.fail_limit;
        let slots = [
            (RX_TORQUE, inputs.torque_frame),
            (RX_STEER, inputs.steer_frame),
            (RX_BRAKE, inputs.brake_frame),
        ];
        for (index, (slot, frame)) in slots.into_iter().enumerate() {
            let value = match frame {
                Some(frame) => match self.codec.check(slot, &frame) {
                    Ok(()) => Some(frame_value(&frame)),
                    Err(e) => {
                        debug!(slot, error = %e, "command frame rejected");
                        None
                    }
                },
                None => None,
            };

            let lost = self.codec.limit_reached(slot, limit);
            if lost != self.integrity_lost[index] {
                if lost {
                    warn!(slot, limit, "integrity lost, substituting safe default");
                } else {
                    info!(slot, "integrity restored");
                }
                self.integrity_lost[index] = lost;
            }

            match (slot, lost, value) {
                (RX_TORQUE, true, _) => self.accepted.torque = 0,
                (RX_STEER, true, _) => self.accepted.steer_deg = 0,
                (RX_BRAKE, true, _) => self.accepted.brake_pct = BRAKE_SAFE_PCT,
                (RX_TORQUE, false, Some(v)) => self.accepted.torque = v,
                (RX_STEER, false, Some(v)) => self.accepted.steer_deg = v,
                (RX_BRAKE, false, Some(v)) => {
                    self.accepted.brake_pct = v.clamp(0, BRAKE_SAFE_PCT as i16) as u8;
                }
                _ => {}
            }
        }
    }

    fn apply_gate(
        &self,
        safety: &SafetyReport,
        mut steering: SteeringOutputs,
        mut motor: MotorOutputs,
    ) -> (SteeringOutputs, MotorOutputs) {
        if safety.force_enables_low || !self.gate.actuators_enabled {
            steering.enable_primary = false;
            steering.enable_secondary = false;
            motor.r_en = false;
            motor.l_en = false;
            motor.bridge = BridgeDrive::OFF;
            motor.duty_pct = 0;
            motor.duty_hw = 0;
        }
        (steering, motor)
    }

    /// Safety policy first, then the external request. Returns `true` when the mode changed.
    fn arbitrate(&mut self, status: SafetyStatus, external: Option<Mode>) -> bool {
        let before = self.arbiter.mode();
        let policy = match (status, before) {
            (SafetyStatus::Fault, Mode::Run | Mode::Degraded) => Some(Mode::SafeStop),
            (SafetyStatus::Degraded, Mode::Run) => Some(Mode::Degraded),
            _ => None,
        };
        if let Some(requested) = policy {
            self.request_mode(requested, "safety policy");
        }
        if let Some(requested) = external {
            self.request_mode(requested, "external request");
        }
        self.arbiter.mode() != before
    }

    fn request_mode(&mut self, requested: Mode, source: &'static str) {
        let from = self.arbiter.mode();
        match self.arbiter.transition(requested, &mut self.gate) {
            ModeTransition::Accepted(to) if to != from => {
                info!(cycle = self.cycle, ?from, ?to, source, "mode changed");
            }
            ModeTransition::Accepted(_) => {}
            ModeTransition::Rejected(reason) => {
                warn!(?from, ?requested, source, reason, "mode request rejected");
            }
        }
    }

    fn status_frame(&mut self, safety: &SafetyReport) -> Frame {
        let mut frame = [0u8; FRAME_LEN];
        frame[2] = self.arbiter.mode() as u8;
        frame[3] = safety.status as u8;
        frame[4..6].copy_from_slice(&safety.mask.bits().to_le_bytes());
        if let Err(e) = self.codec.protect(TX_STATUS, &mut frame) {
            warn!(error = %e, "status frame not protected");
        }
        frame
    }

    // ─── Accessors ──────────────────────────────────────────────────

    #[inline]
    pub const fn mode(&self) -> Mode {
        self.arbiter.mode()
    }

    #[inline]
    pub const fn cycle_count(&self) -> u64 {
        self.cycle
    }

    #[inline]
    pub const fn gate(&self) -> &ActuatorGate {
        &self.gate
    }

    #[inline]
    pub const fn event_memory(&self) -> &EventMemory {
        &self.memory
    }

    #[inline]
    pub const fn codec(&self) -> &ZoneCodec {
        &self.codec
    }

    #[inline]
    pub const fn config(&self) -> &ZoneConfig {
        &self.cfg
    }
}

/// Codec with one slot per command message plus the status message.
pub fn zone_codec(cfg: &ZoneConfig) -> ZoneCodec {
    MessageIntegrityCodec::new([
        cfg.e2e.torque_data_id,
        cfg.e2e.steer_data_id,
        cfg.e2e.brake_data_id,
        cfg.e2e.status_data_id,
    ])
}

// ─── Tests ──────────────────────────────────────────────────────────
