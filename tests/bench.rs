//! Whole-system scenarios: keystrokes in, console transcript and hardware
//! state out.

mod common;

use common::{run_for, Bench, Hardware, SteppingClock, TranscriptConsole};

use cotask_bench::hal::MotorDriver;
use cotask_bench::mock::{MockClock, MockMotor};
use cotask_bench::protocol::{MotorCommand, MotorId, CTRL_C};
use cotask_bench::sample::SampleBuffer;
use cotask_bench::time::Clock;
use cotask_bench::{AbortSignal, Shares};

#[test]
fn zero_then_report_each_encoder() {
    let clock = MockClock::new();
    let shares = Shares::new();
    let abort = AbortSignal::new();
    let mut samples = SampleBuffer::new();
    let mut hw = Hardware::default();
    hw.enc_a.rotate(500);
    hw.enc_b.rotate(300);
    let mut bench = Bench::new(hw, &shares, &mut samples, &abort, clock.now());
    let mut console = TranscriptConsole::new();

    console.type_keys(b"zpP");
    {
        let mut sched = bench.scheduler(&clock);
        run_for(&mut sched, &clock, &mut console, 100);
    }

    let out = console.output();
    assert!(out.contains("ENCODER A position zeroed"));
    assert!(out.contains("ENCODER A position: 0 ticks"));
    assert!(out.contains("ENCODER B position: 300 ticks"));
    assert!(!out.contains("ENCODER B position zeroed"));
    assert_eq!(bench.enc_a.encoder().zero_calls, 1);
    assert_eq!(bench.enc_b.encoder().zero_calls, 0);
    assert!(shares.encoder_cmd.is_empty());
}

#[test]
fn duty_entry_clamps_and_applies() {
    let clock = MockClock::new();
    let shares = Shares::new();
    let abort = AbortSignal::new();
    let mut samples = SampleBuffer::new();
    let mut bench = Bench::new(Hardware::default(), &shares, &mut samples, &abort, clock.now());
    let mut console = TranscriptConsole::new();

    console.type_keys(b"m150\r");
    {
        let mut sched = bench.scheduler(&clock);
        run_for(&mut sched, &clock, &mut console, 50);
    }

    assert!(console.output().contains("Enter a duty cycle for MOTOR A: 150"));
    assert!(console.output().contains("Setting MOTOR A duty cycle to 100%"));
    assert!(console.output().contains("MOTOR A is running forwards at 100%"));
    assert!(!console.output().contains("is invalid"));
    assert_eq!(bench.motor_a.motor().last_command, Some(100));
    assert_eq!(bench.motor_b.motor().commands, 0);
    assert!(shares.motor_cmd.is_empty());
}

#[test]
fn empty_duty_entry_leaves_motor_alone() {
    let clock = MockClock::new();
    let shares = Shares::new();
    let abort = AbortSignal::new();
    let mut samples = SampleBuffer::new();
    let hw = Hardware {
        motor_b: MockMotor::running(MotorId::B, 40),
        ..Hardware::default()
    };
    let mut bench = Bench::new(hw, &shares, &mut samples, &abort, clock.now());
    let mut console = TranscriptConsole::new();

    console.type_keys(b"M\r");
    {
        let mut sched = bench.scheduler(&clock);
        run_for(&mut sched, &clock, &mut console, 50);
    }

    assert!(console.output().contains("MOTOR B duty cycle unchanged..."));
    assert!(console.output().contains("MOTOR B is running forwards at 40%"));
    assert_eq!(bench.motor_b.motor().commands, 0);
}

#[test]
fn slow_typist_still_reaches_the_motor() {
    let clock = MockClock::new();
    let shares = Shares::new();
    let abort = AbortSignal::new();
    let mut samples = SampleBuffer::new();
    let mut bench = Bench::new(Hardware::default(), &shares, &mut samples, &abort, clock.now());
    let mut console = TranscriptConsole::new();

    {
        let mut sched = bench.scheduler(&clock);
        run_for(&mut sched, &clock, &mut console, 20);
        for key in [b"m", b"-", b"4", b"5", b"\r"] {
            console.type_keys(key);
            run_for(&mut sched, &clock, &mut console, 200);
        }
    }

    assert_eq!(bench.motor_a.motor().last_command, Some(-45));
    assert!(console.output().contains("MOTOR A is running in reverse at 45%"));
    assert!(!console.output().contains("is invalid"));
}

#[test]
fn shortcut_drives_both_motors_once() {
    let clock = MockClock::new();
    let shares = Shares::new();
    let abort = AbortSignal::new();
    let mut samples = SampleBuffer::new();
    let mut bench = Bench::new(Hardware::default(), &shares, &mut samples, &abort, clock.now());
    let mut console = TranscriptConsole::new();

    console.type_keys(b"y");
    {
        let mut sched = bench.scheduler(&clock);
        run_for(&mut sched, &clock, &mut console, 100);
    }

    assert_eq!(bench.motor_a.motor().last_command, Some(-100));
    assert_eq!(bench.motor_b.motor().last_command, Some(-100));
    assert_eq!(bench.motor_a.motor().commands, 1);
    assert_eq!(bench.motor_b.motor().commands, 1);
    assert!(shares.motor_cmd.is_empty());
}

#[test]
fn session_stops_itself_at_thirty_seconds() {
    let clock = MockClock::new();
    let shares = Shares::new();
    let abort = AbortSignal::new();
    let mut samples = SampleBuffer::new();
    let mut bench = Bench::new(Hardware::default(), &shares, &mut samples, &abort, clock.now());
    let mut console = TranscriptConsole::new();

    console.type_keys(b"g");
    {
        let mut sched = bench.scheduler(&clock);
        run_for(&mut sched, &clock, &mut console, 36_000);
    }

    let out = console.output();
    assert!(out.contains("Beginning ENCODER A data collection..."));
    assert!(out.contains("(3000 rows)"));
    assert!(out.lines().any(|l| l.starts_with("30.00 ")));
    assert!(!out.lines().any(|l| l.starts_with("30.01 ")));
    assert!(!bench.user.is_sampling());
    assert!(bench.user.samples().is_empty());
    assert!(shares.encoder_cmd.is_empty());
}

#[test]
fn halt_key_ends_session_early() {
    let clock = MockClock::new();
    let shares = Shares::new();
    let abort = AbortSignal::new();
    let mut samples = SampleBuffer::new();
    let mut bench = Bench::new(Hardware::default(), &shares, &mut samples, &abort, clock.now());
    let mut console = TranscriptConsole::new();

    {
        let mut sched = bench.scheduler(&clock);
        console.type_keys(b"G");
        run_for(&mut sched, &clock, &mut console, 1_000);
        console.type_keys(b"s");
        run_for(&mut sched, &clock, &mut console, 1_000);
    }

    let out = console.output();
    assert!(out.contains("Beginning ENCODER B data collection..."));
    assert!(out.contains("***End of data collection ("));
    assert!(!out.contains("(0 rows)"));
    assert!(!bench.user.is_sampling());
    // The encoders saw the halt and emptied the cell.
    assert!(shares.encoder_cmd.is_empty());
    assert!(shares.position.is_empty());
}

#[test]
fn overwritten_duty_request_parks_only_that_motor() {
    let clock = MockClock::new();
    let shares = Shares::new();
    let abort = AbortSignal::new();
    let mut samples = SampleBuffer::new();
    let mut hw = Hardware::default();
    hw.enc_a.rotate(1000);
    let mut bench = Bench::new(hw, &shares, &mut samples, &abort, clock.now());
    let mut console = TranscriptConsole::new();

    {
        let mut sched = bench.scheduler(&clock);
        console.type_keys(b"m");
        run_for(&mut sched, &clock, &mut console, 50);

        shares.motor_cmd.write(MotorCommand::ClearFault);
        run_for(&mut sched, &clock, &mut console, 50);
        assert!(sched.is_parked("MOTOR_A"));

        console.type_keys(b"p");
        run_for(&mut sched, &clock, &mut console, 50);
        assert!(!sched.is_parked("USER"));
    }

    let out = console.output();
    assert!(out.contains("*** MOTOR_A stopped: MOTOR_A: protocol violation"));
    assert!(out.contains("No fault to clear"));
    assert!(out.contains("ENCODER A position: 1000 ticks"));
}

#[test]
fn ctrl_c_shuts_everything_down() {
    let clock = SteppingClock::new(2_000);
    let shares = Shares::new();
    let abort = AbortSignal::new();
    let mut samples = SampleBuffer::new();
    let mut bench = Bench::new(Hardware::default(), &shares, &mut samples, &abort, clock.now());
    let mut console = TranscriptConsole::new();

    console.type_keys(b"e");
    console.type_keys(&[CTRL_C]);
    {
        let mut sched = bench.scheduler(&clock);
        sched.run(&mut console, &abort);
    }

    let out = console.output();
    assert!(out.contains("Motors enabled"));
    assert!(out.ends_with("*** Program ending, have a nice day! ***\r\n"));
    assert!(abort.is_raised());
    assert!(!bench.driver.driver().is_enabled());
    assert_eq!(console.pending(), 0);
}

#[test]
fn ctrl_c_during_duty_entry_still_shuts_down() {
    let clock = SteppingClock::new(2_000);
    let shares = Shares::new();
    let abort = AbortSignal::new();
    let mut samples = SampleBuffer::new();
    let mut bench = Bench::new(Hardware::default(), &shares, &mut samples, &abort, clock.now());
    let mut console = TranscriptConsole::new();

    console.type_keys(b"em4");
    console.type_keys(&[CTRL_C]);
    {
        let mut sched = bench.scheduler(&clock);
        sched.run(&mut console, &abort);
    }

    let out = console.output();
    assert!(out.contains("Enter a duty cycle for MOTOR A: 4"));
    assert!(out.ends_with("*** Program ending, have a nice day! ***\r\n"));
    assert!(abort.is_raised());
    assert_eq!(bench.motor_a.motor().commands, 0);
    assert!(!bench.driver.driver().is_enabled());
    assert!(shares.motor_cmd.is_empty());
}
