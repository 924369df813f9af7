//! Playing-strength scenarios: whole games between engines.

use lockfree_mcts::{GameOutcome, Mcts, MctsConfig, MctsError, SelfPlay, State, TicTacToe};

#[test]
fn test_equal_strong_engines_draw() -> Result<(), MctsError> {
    for first in [1, 2] {
        let config1 = MctsConfig::fixed_iterations(30_000).with_seed(11);
        let config2 = MctsConfig::fixed_iterations(30_000).with_seed(23);

        let record = SelfPlay::new(TicTacToe::start(3), config1, config2)?.with_first(first)?.play()?;

        assert_eq!(record.outcome, GameOutcome::Draw, "\n{}", record.final_state);
        assert_eq!(record.moves.len(), 9);
    }
    Ok(())
}

#[test]
fn test_stronger_engine_rarely_loses() -> Result<(), MctsError> {
    let trials = 100;
    let mut scores = [0u32; 3];

    for trial in 0..trials {
        let strong = MctsConfig::fixed_iterations(1000).with_seed(trial);
        let weak = MctsConfig::fixed_iterations(10).with_seed(trial + 1000);
        let first = 1 + (trial % 2) as usize;

        let game = SelfPlay::new(TicTacToe::start_with(6, 3), strong, weak)?.with_first(first)?;
        scores[game.play()?.outcome.index()] += 1;
    }

    // [draws, strong wins, weak wins]
    assert!(scores[0] + scores[1] > 60, "strong engine lost too often: {scores:?}");
    Ok(())
}

#[test]
fn test_parallel_game_moves_are_legal() -> Result<(), MctsError> {
    let mut mcts = Mcts::new(MctsConfig::fixed_iterations(300).with_threads(4))?;
    let mut state = TicTacToe::start_with(4, 3);
    mcts.set_root(None, state.copy());

    while !state.is_terminal() {
        let stats = mcts.think()?;
        assert_eq!(mcts.get_root().map(|root| root.get_visits() >= stats.total_iterations()), Some(true));

        let next = mcts.take_action()?;
        let action = mcts.get_last_action().copied().ok_or(MctsError::NoSelectableChild)?;

        assert!(state.get_actions().contains(&action));
        assert_eq!(next, state.take_action(&action));
        state = next;
    }

    assert!(matches!(mcts.take_action(), Err(MctsError::SearchAlreadyOver)));
    Ok(())
}

#[test]
fn test_bounded_spin_completes() -> Result<(), MctsError> {
    // A generous bound is never reached when every worker makes progress.
    let config = MctsConfig::fixed_iterations(200).with_threads(4).with_spin_limit(100_000_000);
    let mut mcts = Mcts::new(config)?;
    mcts.set_root(None, TicTacToe::start(3));

    let stats = mcts.think()?;
    assert_eq!(stats.iterations, vec![200; 4]);
    Ok(())
}
