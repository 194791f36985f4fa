use fitpace_core::{Phase, PhaseCycle, SessionConfig, SimulatedClock, TimerSession, TimerStatus};
use proptest::prelude::*;
use proptest::test_runner::Config;

fn phase_list() -> impl Strategy<Value = Vec<Phase>> {
    prop::collection::vec(("[a-z]{1,8}", 1_u64..30), 1..6)
        .prop_map(|raw| raw.into_iter().map(|(name, secs)| Phase::new(name, secs)).collect())
}

proptest! {
    #![proptest_config(Config::with_cases(128))]

    #[test]
    fn exactly_total_ticks_complete_the_run(total in 1_u64..500) {
        let mut session = TimerSession::new();
        session.start(total, None).expect("valid config");
        for _ in 0..total - 1 {
            session.tick();
            prop_assert_eq!(session.status(), TimerStatus::Running);
        }
        session.tick();
        prop_assert_eq!(session.status(), TimerStatus::Completed);
        prop_assert_eq!(session.elapsed_secs(), total);
        prop_assert_eq!(session.remaining_secs(), 0);

        // Further ticks change nothing.
        prop_assert!(session.tick().is_none());
        prop_assert_eq!(session.elapsed_secs(), total);
    }

    #[test]
    fn whole_cycles_of_advances_return_to_first_phase(
        phases in phase_list(),
        laps in 1_usize..5,
    ) {
        let len = phases.len();
        let mut session = TimerSession::new();
        session.start(10_000, Some(phases)).expect("valid config");
        for _ in 0..laps * len {
            prop_assert!(session.advance_phase().is_some());
        }
        prop_assert_eq!(session.current_phase_index(), 0);
    }

    #[test]
    fn progress_is_monotone_and_bounded(total in 1_u64..300, extra in 0_u64..50) {
        let mut session = TimerSession::new();
        session.start(total, None).expect("valid config");
        let mut last = session.progress_ratio();
        prop_assert_eq!(last, 0.0);
        for _ in 0..total + extra {
            session.tick();
            let now = session.progress_ratio();
            prop_assert!(now >= last);
            prop_assert!(now <= 1.0);
            last = now;
        }
        prop_assert_eq!(last, 1.0);
    }

    #[test]
    fn paused_time_never_accrues(
        total in 20_u64..200,
        before in 0_u64..10,
        paused_for in 1_u64..100,
    ) {
        let mut clock = SimulatedClock::new();
        clock.start(SessionConfig::new(total, None).expect("valid config"));
        clock.advance_secs(before);
        clock.pause();
        clock.advance_secs(paused_for);
        prop_assert_eq!(clock.session().elapsed_secs(), before);
        prop_assert_eq!(clock.session().status(), TimerStatus::Paused);
    }

    #[test]
    fn stop_resets_from_any_point(total in 2_u64..200, ticks in 0_u64..200, pause in any::<bool>()) {
        let mut session = TimerSession::new();
        session.start(total, None).expect("valid config");
        for _ in 0..ticks {
            session.tick();
        }
        if pause {
            session.pause();
        }
        session.stop();
        prop_assert_eq!(session.status(), TimerStatus::Idle);
        prop_assert_eq!(session.elapsed_secs(), 0);
        prop_assert_eq!(session.current_phase_index(), 0);
        prop_assert_eq!(session.progress_ratio(), 0.0);
    }

    #[test]
    fn simulated_phase_matches_cycle_position(
        phases in phase_list(),
        secs in 0_u64..400,
    ) {
        let cycle = PhaseCycle::new(phases).expect("generated phases are valid");
        let mut clock = SimulatedClock::new();
        clock.start(SessionConfig::with_cycle(10_000, cycle.clone()).expect("valid config"));
        clock.advance_secs(secs);

        let mut offset = secs % cycle.cycle_duration_secs();
        let mut expected = 0;
        for (i, phase) in cycle.phases().iter().enumerate() {
            if offset < phase.duration_secs {
                expected = i;
                break;
            }
            offset -= phase.duration_secs;
        }
        prop_assert_eq!(clock.session().current_phase_index(), expected);
    }
}
