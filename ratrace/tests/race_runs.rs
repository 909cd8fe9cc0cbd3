use ratrace::core::handle_race::handle_race;
use ratrace::core::race::{GateState, Race, RaceEvent};
use ratrace::core::state_handler::RatState;
use ratrace::pre::read_sim_pars::SimPars;
use ratrace::pre::sprite_meta::default_animations;

fn sim_pars(no_rats: u32, seed: u64) -> SimPars {
    let mut sim_pars = SimPars::default();
    sim_pars.race_pars.no_rats = no_rats;
    sim_pars.race_pars.seed = Some(seed);
    sim_pars.timing_pars.speed_multiplier = 1.0;
    sim_pars
}

#[test]
fn headless_race_finishes_all_rats() {
    let result = handle_race(
        &sim_pars(4, 21),
        default_animations(),
        16.0,
        None,
        1.0,
        3_600_000.0,
    )
    .unwrap();

    assert_eq!(result.rat_results.len(), 4);
    assert!(result.unfinished.is_empty());
    assert_eq!(result.laps_to_finish, 1);

    let positions: Vec<u32> = result.rat_results.iter().map(|r| r.position).collect();
    assert_eq!(positions, vec![1, 2, 3, 4]);
    let winner = result.get_winner().unwrap();
    assert!(winner.racetime <= result.tot_racetime);
}

#[test]
fn same_seed_same_race() {
    let first = handle_race(&sim_pars(3, 22), default_animations(), 16.0, None, 1.0, 3_600_000.0)
        .unwrap();
    let second = handle_race(&sim_pars(3, 22), default_animations(), 16.0, None, 1.0, 3_600_000.0)
        .unwrap();
    assert_eq!(first, second);
}

#[test]
fn race_time_limit_stops_the_race() {
    let result = handle_race(&sim_pars(3, 23), default_animations(), 16.0, None, 1.0, 1000.0)
        .unwrap();
    assert!(result.rat_results.is_empty());
    assert_eq!(result.unfinished.len(), 3);
    assert!(result.tot_racetime >= 1000.0 && result.tot_racetime < 1016.0 + 1e-9);
}

#[test]
fn race_with_many_lanes_finishes_all_rats() {
    let mut pars = sim_pars(10, 1);
    pars.track_pars.no_lanes = 10;
    pars.track_pars.width_percent = 30.0;

    let result = handle_race(&pars, default_animations(), 16.0, None, 1.0, 3_600_000.0).unwrap();
    assert!(result.unfinished.is_empty(), "unfinished: {:?}", result.unfinished);
    assert_eq!(result.rat_results.len(), 10);
}

#[test]
fn paced_race_streams_states_and_final_result() {
    let (tx, rx) = flume::unbounded();

    // a huge real-time factor removes the sleeps
    let result = handle_race(
        &sim_pars(2, 24),
        default_animations(),
        16.0,
        Some(&tx),
        1e9,
        3_600_000.0,
    )
    .unwrap();
    drop(tx);

    let race_states: Vec<_> = rx.iter().collect();
    assert!(race_states.len() > 2);

    let (last, streamed) = race_states.split_last().unwrap();
    assert_eq!(last.final_result.as_ref(), Some(&result));
    assert!(streamed.iter().all(|state| state.final_result.is_none()));

    for pair in streamed.windows(2) {
        assert!(pair[0].cur_racetime < pair[1].cur_racetime);
        assert!(pair[0].gate_opacity >= pair[1].gate_opacity);
    }
    for state in streamed.iter() {
        assert_eq!(state.rat_states.len(), 2);
        for pair in state.rat_states.windows(2) {
            assert!(pair[0].y <= pair[1].y);
        }
    }
    assert!(streamed
        .iter()
        .any(|state| state.gate_state == GateState::Hidden));
}

#[test]
fn lifecycle_events_and_states_in_order() {
    let mut race = Race::new(&sim_pars(3, 25), default_animations());
    let mut events = Vec::new();
    let mut seen_states: Vec<Vec<RatState>> = vec![vec![RatState::Entering]; 3];

    for _ in 0..1_000_000 {
        events.extend(race.simulate_timestep(16.0));
        for (idx, rat) in race.rats_list.iter().enumerate() {
            if seen_states[idx].last() != Some(&rat.state()) {
                seen_states[idx].push(rat.state());
            }
        }
        if race.all_finished() {
            events.extend(race.simulate_timestep(16.0));
            break;
        }
    }

    assert_eq!(
        events,
        vec![
            RaceEvent::RaceStarted,
            RaceEvent::GatesHidden,
            RaceEvent::AllFinished
        ]
    );
    for states in seen_states.iter() {
        assert_eq!(
            *states,
            vec![
                RatState::Entering,
                RatState::Waiting,
                RatState::Racing,
                RatState::Exiting,
                RatState::Finished
            ]
        );
    }
}
