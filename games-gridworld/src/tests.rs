use super::*;
use sim_core::SimContext;

fn ctx() -> SimContext {
    SimContext::from_simulator(Box::new(Gridworld))
}

#[test]
fn reset_places_agent_at_start_with_all_pellets() {
    let mut ctx = ctx();
    let reset = ctx.reset(42).unwrap();

    assert_eq!(reset.state, vec![1, 1, 0b111]);
    assert_eq!(reset.obs, reset.state);
}

#[test]
fn reset_is_seed_independent() {
    let mut ctx = ctx();
    let a = ctx.reset(0).unwrap();
    let b = ctx.reset(12345).unwrap();
    assert_eq!(a.state, b.state);
}

#[test]
fn moving_into_wall_is_a_noop() {
    let mut ctx = ctx();
    let reset = ctx.reset(42).unwrap();

    // (1,1) has walls above and to the left
    for action in [ACTION_UP, ACTION_LEFT, ACTION_STAY] {
        let step = ctx.step(&reset.state, action).unwrap();
        assert_eq!(step.state, reset.state, "action {} should not move", action);
        assert_eq!(step.reward, 0.0);
        assert!(!step.terminal);
    }
}

#[test]
fn free_moves_change_position() {
    let mut ctx = ctx();
    let reset = ctx.reset(42).unwrap();

    let right = ctx.step(&reset.state, ACTION_RIGHT).unwrap();
    assert_eq!(right.state[0], 2);
    assert_eq!(right.state[1], 1);

    let down = ctx.step(&reset.state, ACTION_DOWN).unwrap();
    assert_eq!(down.state[0], 1);
    assert_eq!(down.state[1], 2);
}

#[test]
fn interior_wall_blocks_passage() {
    let mut ctx = ctx();
    ctx.reset(42).unwrap();

    // Standing at (2,3), the interior wall at (3,3) blocks a move right
    let state = vec![2, 3, 0b111];
    let step = ctx.step(&state, ACTION_RIGHT).unwrap();
    assert_eq!(step.state, state);
}

#[test]
fn pellet_pickup_rewards_once() {
    let mut ctx = ctx();
    ctx.reset(42).unwrap();

    // Step onto the pellet at (5,1)
    let state = vec![4, 1, 0b111];
    let step = ctx.step(&state, ACTION_RIGHT).unwrap();
    assert_eq!(step.reward, 1.0);
    assert_eq!(step.state, vec![5, 1, 0b110]);
    assert!(!step.terminal);

    // Staying on the cell afterwards yields nothing
    let again = ctx.step(&step.state, ACTION_STAY).unwrap();
    assert_eq!(again.reward, 0.0);
    assert_eq!(again.state, step.state);
}

#[test]
fn collecting_last_pellet_terminates() {
    let mut ctx = ctx();
    ctx.reset(42).unwrap();

    // Only pellet 0 at (5,1) remains
    let state = vec![4, 1, 0b001];
    let step = ctx.step(&state, ACTION_RIGHT).unwrap();
    assert_eq!(step.reward, 1.0);
    assert!(step.terminal);
    assert_eq!(step.state[2], 0);
}

#[test]
fn walk_to_first_pellet() {
    let mut ctx = ctx();
    let reset = ctx.reset(42).unwrap();

    let mut state = reset.state;
    let mut total_reward = 0.0;
    for _ in 0..4 {
        let step = ctx.step(&state, ACTION_RIGHT).unwrap();
        state = step.state;
        total_reward += step.reward;
    }

    // (1,1) -> (5,1): four moves right, wall at x=3 has its gap at y=1
    assert_eq!(state[0], 5);
    assert_eq!(total_reward, 1.0);
}

#[test]
fn step_rejects_invalid_inputs() {
    let mut ctx = ctx();
    let reset = ctx.reset(42).unwrap();

    assert!(ctx.step(&[1, 1], ACTION_STAY).is_err());
    assert!(ctx.step(&reset.state, 9).is_err());
}

#[test]
fn registry_roundtrip() {
    register_gridworld();
    let ctx = SimContext::new("gridworld").expect("gridworld should be registered");
    assert_eq!(ctx.num_actions(), NUM_ACTIONS);
    assert_eq!(ctx.obs_len(), 3);
}
