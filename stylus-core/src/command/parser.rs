//! Line parsing and validation
//!
//! A line is checked completely before anything else happens: checksum,
//! command code, every field, then per-command consistency rules. Nothing
//! here touches engine, queue or position state, so a rejected line has no
//! effect beyond its error.

use stylus_protocol::{strip_checksum, CommandCode, Fields};

use super::types::*;
use crate::config::MotionLimits;
use crate::error::{CommandError, ErrorKind};
use crate::motion::{rate_for_duration, ticks_for_ms, ClearFlags};

/// A validated line and the code it was issued with
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ParsedLine {
    pub code: CommandCode,
    pub request: Request,
}

/// Parse and validate one host line
pub fn parse_line(
    line: &str,
    limits: &MotionLimits,
    checksum: bool,
) -> Result<ParsedLine, CommandError> {
    let line = if checksum {
        strip_checksum(line)?
    } else {
        line
    };

    let (code_token, rest) = CommandCode::split_line(line);
    let code = CommandCode::parse(code_token).ok_or(ErrorKind::UnknownCommand)?;
    let mut fields = Fields::new(rest);

    let request = match code {
        CommandCode::StepperMove => parse_stepper_move(&mut fields, limits)?,
        CommandCode::MixedAxisMove => parse_mixed_axis_move(&mut fields)?,
        CommandCode::HomeMove => parse_home_move(&mut fields, limits)?,
        CommandCode::LowLevelMove => parse_jerk_move(&mut fields, TerminationMode::Intervals)?,
        CommandCode::LowLevelTimed => parse_jerk_move(&mut fields, TerminationMode::Timed)?,
        CommandCode::LowLevelThird => parse_snap_move(&mut fields, TerminationMode::Intervals)?,
        CommandCode::TimedThird => parse_snap_move(&mut fields, TerminationMode::Timed)?,
        CommandCode::CircleMove => parse_circle_move(&mut fields, limits)?,
        CommandCode::EmergencyStop => Request::EmergencyStop {
            clear_accumulators: fields.optional_in(0u8, 1)? == Some(1),
        },
        CommandCode::ClearSteps => Request::ClearSteps,
        CommandCode::QuerySteps => Request::QuerySteps,
        CommandCode::QueryMotors => Request::QueryMotors,
        CommandCode::QueryUtility => parse_query_utility(&mut fields)?,
        CommandCode::Configure => parse_configure(&mut fields)?,
        CommandCode::Reset => Request::Reset,
        CommandCode::Version => Request::Version,
    };

    fields.finish()?;
    validate_rates(&request, limits)?;
    Ok(ParsedLine { code, request })
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TerminationMode {
    Intervals,
    Timed,
}

/// Duration or interval count; zero would mean an infinite rate
fn take_duration(fields: &mut Fields<'_>) -> Result<u32, CommandError> {
    Ok(fields.required_in(1u32, u32::MAX)?)
}

fn take_clear(fields: &mut Fields<'_>) -> Result<ClearFlags, CommandError> {
    let bits = fields.optional_in(0u8, 3)?.unwrap_or(0);
    Ok(ClearFlags::from_bits(bits).unwrap_or(ClearFlags::NONE))
}

fn take_frequency(fields: &mut Fields<'_>, limits: &MotionLimits) -> Result<u32, CommandError> {
    Ok(fields.required_in(limits.min_frequency_hz, limits.max_frequency_hz)?)
}

fn parse_stepper_move(
    fields: &mut Fields<'_>,
    limits: &MotionLimits,
) -> Result<Request, CommandError> {
    let duration_ms = take_duration(fields)?;
    let steps = [fields.required::<i32>()?, fields.required::<i32>()?];
    let clear = take_clear(fields)?;

    if steps == [0, 0] && clear.is_empty() {
        let ticks = ticks_for_ms(duration_ms, limits.tick_hz);
        return Ok(Request::Enqueue(MotionCommand::Delay { ticks }));
    }
    Ok(Request::Enqueue(MotionCommand::ConstantRate(ConstantRate {
        duration_ms,
        steps,
        clear,
    })))
}

fn parse_mixed_axis_move(fields: &mut Fields<'_>) -> Result<Request, CommandError> {
    let duration_ms = take_duration(fields)?;
    let a = fields.required::<i32>()?;
    let b = fields.required::<i32>()?;
    let b_index = fields.index();
    let clear = take_clear(fields)?;

    // Both derived axis deltas must fit i32 even though a and b do.
    if a.checked_add(b).is_none() || a.checked_sub(b).is_none() {
        return Err(CommandError::at(ErrorKind::ParameterOutsideLimit, b_index));
    }

    Ok(Request::Enqueue(MotionCommand::MixedAxis(MixedAxisMove {
        duration_ms,
        a,
        b,
        clear,
    })))
}

fn parse_home_move(
    fields: &mut Fields<'_>,
    limits: &MotionLimits,
) -> Result<Request, CommandError> {
    let frequency_hz = take_frequency(fields, limits)?;
    let first = fields.next::<i32>()?;
    let second = fields.next::<i32>()?;

    let target = match (first, second) {
        (Some(p1), Some(p2)) => Some([p1, p2]),
        (None, None) => None,
        (Some(_), None) => return Err(CommandError::at(ErrorKind::MissingParameter, 3)),
        (None, Some(_)) => return Err(CommandError::at(ErrorKind::MissingParameter, 2)),
    };

    Ok(Request::Absolute(AbsoluteMove {
        frequency_hz,
        target,
    }))
}

fn termination(mode: TerminationMode, count: u32) -> Termination {
    match mode {
        TerminationMode::Intervals => Termination::Intervals(count),
        TerminationMode::Timed => Termination::Timed { duration_ms: count },
    }
}

fn parse_jerk_move(fields: &mut Fields<'_>, mode: TerminationMode) -> Result<Request, CommandError> {
    let count = take_duration(fields)?;
    let mut axes = [JerkAxis::default(); 2];
    for axis in &mut axes {
        axis.rate = fields.required()?;
        axis.accel = fields.required()?;
        axis.jerk = fields.required()?;
    }
    let clear = take_clear(fields)?;

    Ok(Request::Enqueue(MotionCommand::Jerk(JerkMove {
        termination: termination(mode, count),
        axes,
        clear,
    })))
}

fn parse_snap_move(fields: &mut Fields<'_>, mode: TerminationMode) -> Result<Request, CommandError> {
    let count = take_duration(fields)?;
    let mut axes = [SnapAxis::default(); 2];
    for axis in &mut axes {
        axis.rate = fields.required()?;
        axis.accel = fields.required()?;
        axis.jerk = fields.required()?;
        axis.snap = fields.required()?;
    }
    let clear = take_clear(fields)?;

    Ok(Request::Enqueue(MotionCommand::Snap(SnapMove {
        termination: termination(mode, count),
        axes,
        clear,
    })))
}

fn parse_circle_move(
    fields: &mut Fields<'_>,
    limits: &MotionLimits,
) -> Result<Request, CommandError> {
    let frequency_hz = take_frequency(fields, limits)?;
    let destination = [fields.required::<i16>()?, fields.required::<i16>()?];
    let center = [fields.required::<i16>()?, fields.required::<i16>()?];
    let winding = match fields.required_in(0u8, 1)? {
        0 => Winding::Clockwise,
        _ => Winding::CounterClockwise,
    };

    Ok(Request::Arc(ArcMove {
        frequency_hz,
        destination,
        center,
        winding,
    }))
}

fn parse_query_utility(fields: &mut Fields<'_>) -> Result<Request, CommandError> {
    let query = match fields.required_in(1u8, 4)? {
        1 => UtilityQuery::MaxDepth,
        2 => UtilityQuery::Depth,
        3 => UtilityQuery::Queued,
        _ => UtilityQuery::Errors,
    };
    Ok(Request::QueryUtility(query))
}

fn parse_configure(fields: &mut Fields<'_>) -> Result<Request, CommandError> {
    let param = fields.required::<u8>()?;
    let param_index = fields.index();
    let setting = match param {
        1 => Setting::Acknowledge(fields.required_in(0u8, 1)? == 1),
        4 => Setting::QueueDepth(fields.required_in(1u16, u16::MAX)?),
        10 => Setting::Echo(fields.required_in(0u8, 1)? == 1),
        54 => Setting::Checksum(fields.required_in(0u8, 1)? == 1),
        _ => {
            return Err(CommandError::at(
                ErrorKind::ParameterOutsideLimit,
                param_index,
            ))
        }
    };
    Ok(Request::Configure(setting))
}

/// Constant-rate moves are timed by the host, so their rates are known
/// before enqueue and rejected here rather than failing in the engine.
fn validate_rates(request: &Request, limits: &MotionLimits) -> Result<(), CommandError> {
    if let Request::Enqueue(MotionCommand::ConstantRate(cmd)) = request {
        let ticks = ticks_for_ms(cmd.duration_ms, limits.tick_hz);
        for (i, steps) in cmd.steps.iter().enumerate() {
            if rate_for_duration(steps.unsigned_abs(), ticks).is_err() {
                return Err(CommandError::at(
                    ErrorKind::ParameterOutsideLimit,
                    2 + i as u8,
                ));
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use stylus_protocol::checksum_of;

    fn parse(line: &str) -> Result<Request, CommandError> {
        parse_line(line, &MotionLimits::default(), false).map(|p| p.request)
    }

    fn kind(line: &str) -> Option<ErrorKind> {
        parse(line).err().map(|e| e.kind)
    }

    #[test]
    fn test_stepper_move() {
        assert_eq!(
            parse("SM,100,100,0"),
            Ok(Request::Enqueue(MotionCommand::ConstantRate(ConstantRate {
                duration_ms: 100,
                steps: [100, 0],
                clear: ClearFlags::NONE,
            })))
        );
        assert_eq!(
            parse("sm,100,0,0"),
            Ok(Request::Enqueue(MotionCommand::Delay { ticks: 2_500 }))
        );
    }

    #[test]
    fn test_stepper_move_rejections() {
        assert_eq!(kind("SM,0,10,10"), Some(ErrorKind::ParameterOutsideLimit));
        assert_eq!(kind("SM,100,10"), Some(ErrorKind::MissingParameter));
        assert_eq!(kind("SM,100,10,10,4"), Some(ErrorKind::ParameterOutsideLimit));
        assert_eq!(kind("SM,100,10,10,3,9"), Some(ErrorKind::ExtraCharacters));
        // 2501 steps in 2500 ticks is faster than one step per tick
        assert_eq!(
            parse("SM,100,2501,0").unwrap_err(),
            CommandError::at(ErrorKind::ParameterOutsideLimit, 2)
        );
        assert!(parse("SM,100,2500,-2500").is_ok());
    }

    #[test]
    fn test_mixed_axis_move() {
        assert_eq!(
            parse("XM,100,50,50,3"),
            Ok(Request::Enqueue(MotionCommand::MixedAxis(MixedAxisMove {
                duration_ms: 100,
                a: 50,
                b: 50,
                clear: ClearFlags::BOTH,
            })))
        );
        assert!(parse("XM,2147483647,10,10").is_ok());
        assert!(parse("XM,200000,0,0").is_ok());
        assert_eq!(kind("XM,0,10,10"), Some(ErrorKind::ParameterOutsideLimit));
        assert_eq!(kind("XM,100,10,10,4"), Some(ErrorKind::ParameterOutsideLimit));
        assert_eq!(kind("XM,100,10,10,0,1"), Some(ErrorKind::ExtraCharacters));
        assert_eq!(kind("XM,100,10"), Some(ErrorKind::MissingParameter));
    }

    #[test]
    fn test_mixed_axis_overflow_rejected() {
        assert_eq!(
            parse("XM,100,2147483647,1").unwrap_err(),
            CommandError::at(ErrorKind::ParameterOutsideLimit, 3)
        );
        assert_eq!(
            kind("XM,100,-2147483648,1"),
            Some(ErrorKind::ParameterOutsideLimit)
        );
        assert!(parse("XM,100,1073741823,1073741823").is_ok());
    }

    #[test]
    fn test_home_move_pairing() {
        assert_eq!(
            parse("HM,1000"),
            Ok(Request::Absolute(AbsoluteMove {
                frequency_hz: 1000,
                target: None,
            }))
        );
        assert_eq!(
            parse("HM,1000,-5,7"),
            Ok(Request::Absolute(AbsoluteMove {
                frequency_hz: 1000,
                target: Some([-5, 7]),
            }))
        );
        assert_eq!(
            parse("HM,1000,100").unwrap_err(),
            CommandError::at(ErrorKind::MissingParameter, 3)
        );
        assert_eq!(
            parse("HM,1000,,100").unwrap_err(),
            CommandError::at(ErrorKind::MissingParameter, 2)
        );
    }

    #[test]
    fn test_frequency_boundaries() {
        for (freq, ok) in [
            (0, false),
            (1, false),
            (2, true),
            (25_000, true),
            (25_001, false),
            (65_535, false),
        ] {
            let mut line = heapless::String::<32>::new();
            core::fmt::write(&mut line, format_args!("HM,{}", freq)).unwrap();
            assert_eq!(parse(&line).is_ok(), ok, "HM,{}", freq);
            if !ok {
                assert_eq!(kind(&line), Some(ErrorKind::ParameterOutsideLimit));
            }
        }
    }

    #[test]
    fn test_circle_move() {
        assert_eq!(
            parse("CM,1000,100,0,50,0,1"),
            Ok(Request::Arc(ArcMove {
                frequency_hz: 1000,
                destination: [100, 0],
                center: [50, 0],
                winding: Winding::CounterClockwise,
            }))
        );
        assert!(parse("CM,1000,32767,-32768,0,0,0").is_ok());
        assert_eq!(
            kind("CM,1000,32768,0,0,0,0"),
            Some(ErrorKind::ParameterOutsideLimit)
        );
        assert_eq!(
            kind("CM,1000,-32769,0,0,0,0"),
            Some(ErrorKind::ParameterOutsideLimit)
        );
        assert_eq!(kind("CM,1000,0,0,0,0,2"), Some(ErrorKind::ParameterOutsideLimit));
        assert_eq!(kind("CM,1000,0,0,0,0,255"), Some(ErrorKind::ParameterOutsideLimit));
        assert_eq!(kind("CM,1000,0,0,0,0"), Some(ErrorKind::MissingParameter));
        assert_eq!(kind("CM,1000,0,0,0,0,0,1"), Some(ErrorKind::ExtraCharacters));
        assert_eq!(kind("CM,1,0,0,0,0,0"), Some(ErrorKind::ParameterOutsideLimit));
    }

    #[test]
    fn test_jerk_and_snap_moves() {
        match parse("LM,500,1000,10,1,-1000,-10,-1,2") {
            Ok(Request::Enqueue(MotionCommand::Jerk(cmd))) => {
                assert_eq!(cmd.termination, Termination::Intervals(500));
                assert_eq!(cmd.axes[1].rate, -1000);
                assert_eq!(cmd.clear.bits(), 2);
            }
            other => panic!("unexpected {:?}", other),
        }
        match parse("T3,20,1,2,3,4,5,6,7,8") {
            Ok(Request::Enqueue(MotionCommand::Snap(cmd))) => {
                assert_eq!(cmd.termination, Termination::Timed { duration_ms: 20 });
                assert_eq!(cmd.axes[0].snap, 4);
                assert_eq!(cmd.axes[1].snap, 8);
            }
            other => panic!("unexpected {:?}", other),
        }
        assert_eq!(kind("LT,0,1,1,1,1,1,1"), Some(ErrorKind::ParameterOutsideLimit));
        assert_eq!(kind("LT,10,1,1,1,1,1"), Some(ErrorKind::MissingParameter));
        assert_eq!(kind("L3,10,1,1,1,1,1,1,1"), Some(ErrorKind::MissingParameter));
    }

    #[test]
    fn test_auxiliary_commands() {
        assert_eq!(parse("QS"), Ok(Request::QuerySteps));
        assert_eq!(parse("v"), Ok(Request::Version));
        assert_eq!(
            parse("ES,1"),
            Ok(Request::EmergencyStop {
                clear_accumulators: true
            })
        );
        assert_eq!(
            parse("QU,3"),
            Ok(Request::QueryUtility(UtilityQuery::Queued))
        );
        assert_eq!(
            parse("CU,4,8"),
            Ok(Request::Configure(Setting::QueueDepth(8)))
        );
        assert_eq!(kind("CU,4,0"), Some(ErrorKind::ParameterOutsideLimit));
        assert_eq!(kind("CU,99,1"), Some(ErrorKind::ParameterOutsideLimit));
        assert_eq!(kind("QS,1"), Some(ErrorKind::ExtraCharacters));
        assert_eq!(kind("ZZ,1"), Some(ErrorKind::UnknownCommand));
    }

    #[test]
    fn test_checksum_mode() {
        let limits = MotionLimits::default();
        let body = "SM,100,100,0";
        let mut line = heapless::String::<32>::new();
        core::fmt::write(&mut line, format_args!("{},{}", body, checksum_of(body))).unwrap();

        assert!(parse_line(&line, &limits, true).is_ok());
        assert_eq!(
            parse_line(body, &limits, true).unwrap_err().kind,
            ErrorKind::ChecksumMismatch
        );
        assert_eq!(
            parse_line("SM,100,100,0,1", &limits, true).unwrap_err().kind,
            ErrorKind::ChecksumMismatch
        );
    }

    proptest! {
        #[test]
        fn prop_frequency_range_is_inclusive(freq in 0u32..100_000) {
            let mut line = heapless::String::<32>::new();
            core::fmt::write(&mut line, format_args!("HM,{},0,0", freq)).unwrap();
            let accepted = parse(&line).is_ok();
            prop_assert_eq!(accepted, (2..=25_000).contains(&freq));
        }

        #[test]
        fn prop_home_pairing(freq in 2u32..=25_000, p in any::<i32>(), first in any::<bool>()) {
            let mut line = heapless::String::<48>::new();
            if first {
                core::fmt::write(&mut line, format_args!("HM,{},{}", freq, p)).unwrap();
            } else {
                core::fmt::write(&mut line, format_args!("HM,{},,{}", freq, p)).unwrap();
            }
            prop_assert_eq!(kind(&line), Some(ErrorKind::MissingParameter));
        }

        #[test]
        fn prop_mixed_axis_accepts_iff_derived_axes_fit(a in any::<i32>(), b in any::<i32>()) {
            let mut line = heapless::String::<48>::new();
            core::fmt::write(&mut line, format_args!("XM,1000,{},{}", a, b)).unwrap();
            let fits = a.checked_add(b).is_some() && a.checked_sub(b).is_some();
            prop_assert_eq!(parse(&line).is_ok(), fits);
        }
    }
}
