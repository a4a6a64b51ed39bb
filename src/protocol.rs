//! Command vocabulary exchanged through the shared cells.
//!
//! Commands flow user → encoders through the encoder cell and user → motors /
//! motor driver through the motor cell. Data flows back through the position
//! and delta cells, announced by an [`EncoderCommand::SampleReady`] tag.
//!
//! Every command names the task instance it is meant for. A consumer that is
//! not the target must leave the cell exactly as it found it.

/// Identity of one of the two encoder-task instances.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum EncoderId {
    A,
    B,
}

impl EncoderId {
    pub const fn label(self) -> &'static str {
        match self {
            Self::A => "ENCODER A",
            Self::B => "ENCODER B",
        }
    }
}

/// Identity of one of the two motor-task instances.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum MotorId {
    A,
    B,
}

impl MotorId {
    pub const fn label(self) -> &'static str {
        match self {
            Self::A => "MOTOR A",
            Self::B => "MOTOR B",
        }
    }

    /// The sibling that takes its turn after this one on a shortcut command.
    pub const fn next(self) -> Option<MotorId> {
        match self {
            Self::A => Some(Self::B),
            Self::B => None,
        }
    }
}

/// Written by the user task into the encoder cell, except `SampleReady`,
/// which an encoder task writes back for the user task.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum EncoderCommand {
    Zero(EncoderId),
    ReportPosition(EncoderId),
    ReportDelta(EncoderId),
    /// Publish one (position, velocity) sample.
    Gather(EncoderId),
    /// A sample from this encoder is waiting in the data cells.
    SampleReady(EncoderId),
    /// Shared sentinel: whichever encoder task sees it first clears it.
    Halt,
}

impl EncoderCommand {
    /// Whether an encoder task bound to `id` should consume this command.
    pub fn is_for(self, id: EncoderId) -> bool {
        match self {
            Self::Zero(t) | Self::ReportPosition(t) | Self::ReportDelta(t) | Self::Gather(t) => {
                t == id
            }
            Self::Halt => true,
            Self::SampleReady(_) => false,
        }
    }
}

/// One of the two saturating shortcut duties.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ExtremeDuty {
    Forward,
    Reverse,
}

impl ExtremeDuty {
    pub const fn duty(self) -> i8 {
        match self {
            Self::Forward => 100,
            Self::Reverse => -100,
        }
    }
}

/// Written by the user task into the motor cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum MotorCommand {
    /// Read a signed duty from the console and apply it.
    ModifyDuty(MotorId),
    /// Drive both motors to an extreme. `turn` is the instance allowed to act
    /// now; it hands the command to [`MotorId::next`] or clears the cell.
    Extreme { duty: ExtremeDuty, turn: MotorId },
    /// Flip the driver's actuation enable.
    ToggleEnable,
    ClearFault,
}

/// What one operator keystroke asks for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum UserAction {
    Encoder(EncoderCommand),
    Motor(MotorCommand),
    StartSession(EncoderId),
    HaltSession,
    ShowMenu,
    Abort,
}

/// ASCII ETX, sent by a terminal on Ctrl+C.
pub const CTRL_C: u8 = 0x03;

/// Maps one console byte to an action. Case matters for the per-instance
/// commands; `None` means the byte is not a command.
pub fn decode_key(byte: u8) -> Option<UserAction> {
    use EncoderCommand as E;
    use UserAction as U;

    let action = match byte {
        b'z' => U::Encoder(E::Zero(EncoderId::A)),
        b'Z' => U::Encoder(E::Zero(EncoderId::B)),
        b'p' => U::Encoder(E::ReportPosition(EncoderId::A)),
        b'P' => U::Encoder(E::ReportPosition(EncoderId::B)),
        b'd' => U::Encoder(E::ReportDelta(EncoderId::A)),
        b'D' => U::Encoder(E::ReportDelta(EncoderId::B)),
        b'm' => U::Motor(MotorCommand::ModifyDuty(MotorId::A)),
        b'M' => U::Motor(MotorCommand::ModifyDuty(MotorId::B)),
        b'x' | b'X' => U::Motor(MotorCommand::Extreme {
            duty: ExtremeDuty::Forward,
            turn: MotorId::A,
        }),
        b'y' | b'Y' => U::Motor(MotorCommand::Extreme {
            duty: ExtremeDuty::Reverse,
            turn: MotorId::A,
        }),
        b'e' | b'E' => U::Motor(MotorCommand::ToggleEnable),
        b'c' | b'C' => U::Motor(MotorCommand::ClearFault),
        b'g' => U::StartSession(EncoderId::A),
        b'G' => U::StartSession(EncoderId::B),
        b's' | b'S' => U::HaltSession,
        b'h' | b'H' => U::ShowMenu,
        CTRL_C => U::Abort,
        _ => return None,
    };
    Some(action)
}
