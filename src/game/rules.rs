use serde::{Deserialize, Serialize};

use super::state::{
    normalize_player_name, GameEvent, GameState, IntegrityError, Mark, Outcome, BOARD_SIZE,
};
use crate::ai::{AiAgent, AiDecision, AiDifficulty};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type")]
pub enum RuleError {
    GameFinished,
    NotPlayerTurn { expected: Mark, actual: Mark },
    CellOutOfRange { index: usize },
    CellOccupied { index: usize },
    NoMoveAvailable,
    IntegrityViolation { error: IntegrityError },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RuleResolution {
    pub state: GameState,
    pub events: Vec<GameEvent>,
    pub outcome: Outcome,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub winning_line: Option<[usize; 3]>,
}

impl RuleResolution {
    pub fn new(state: GameState, events: Vec<GameEvent>) -> Self {
        let outcome = state.outcome();
        let winning_line = state.board.winning_line();
        Self {
            state,
            events,
            outcome,
            winning_line,
        }
    }
}

/// 对局规则：校验并执行落子、结算胜负、重置棋局与计分。
#[derive(Debug, Default, Clone, Copy)]
pub struct RuleEngine;

impl RuleEngine {
    pub fn new() -> Self {
        Self
    }

    fn ensure_in_progress(state: &GameState) -> Result<(), RuleError> {
        if state.is_finished() {
            return Err(RuleError::GameFinished);
        }
        Ok(())
    }

    fn ensure_turn_owner(state: &GameState, mark: Mark) -> Result<(), RuleError> {
        if state.current_mark != mark {
            return Err(RuleError::NotPlayerTurn {
                expected: state.current_mark,
                actual: mark,
            });
        }
        Ok(())
    }

    fn ensure_open_cell(state: &GameState, index: usize) -> Result<(), RuleError> {
        if index >= BOARD_SIZE {
            return Err(RuleError::CellOutOfRange { index });
        }
        if !state.board.is_empty_at(index) {
            return Err(RuleError::CellOccupied { index });
        }
        Ok(())
    }

    pub fn ensure_integrity(state: &GameState) -> Result<(), RuleError> {
        state
            .integrity_check()
            .map_err(|error| RuleError::IntegrityViolation { error })
    }

    /// 落子并结算：终局时记分且不再换手，否则轮到对方。
    pub fn play_move(
        &self,
        state: &mut GameState,
        index: usize,
        mark: Mark,
    ) -> Result<Vec<GameEvent>, RuleError> {
        Self::ensure_in_progress(state)?;
        Self::ensure_turn_owner(state, mark)?;
        Self::ensure_open_cell(state, index)?;

        state.board.set(index, mark.cell());
        let mut events = vec![GameEvent::MarkPlaced { index, mark }];

        let outcome = state.outcome();
        match outcome {
            Outcome::InProgress => {
                state.current_mark = mark.opponent();
                events.push(GameEvent::TurnPassed {
                    next: state.current_mark,
                });
            }
            Outcome::Draw => {
                state.scores.record(outcome);
                events.push(GameEvent::GameDrawn);
            }
            Outcome::XWins | Outcome::OWins => {
                state.scores.record(outcome);
                if let (Some(winner), Some(line)) = (outcome.winner(), state.board.winning_line()) {
                    events.push(GameEvent::GameWon { winner, line });
                }
            }
        }

        Ok(events)
    }

    pub fn human_move(
        &self,
        state: &mut GameState,
        index: usize,
    ) -> Result<Vec<GameEvent>, RuleError> {
        self.play_move(state, index, Mark::X)
    }

    /// 由 AI 为 O 选点并落子。
    pub fn computer_move(
        &self,
        state: &mut GameState,
        agent: &mut AiAgent,
    ) -> Result<(AiDecision, Vec<GameEvent>), RuleError> {
        Self::ensure_in_progress(state)?;
        Self::ensure_turn_owner(state, Mark::O)?;

        let decision = agent.decide(&state.board);
        let index = decision.index.ok_or(RuleError::NoMoveAvailable)?;
        let events = self.play_move(state, index, Mark::O)?;
        Ok((decision, events))
    }

    /// 落下事先决定好的 O 子（例如前端“思考”延迟结束后提交的决策）。
    pub fn computer_move_at(
        &self,
        state: &mut GameState,
        index: usize,
    ) -> Result<Vec<GameEvent>, RuleError> {
        self.play_move(state, index, Mark::O)
    }

    pub fn reset_game(&self, state: &mut GameState) -> Vec<GameEvent> {
        state.clear_board();
        vec![GameEvent::GameReset]
    }

    /// 计分归零并重开一局；玩家名称保留。
    pub fn reset_scores(&self, state: &mut GameState) -> Vec<GameEvent> {
        state.scores.reset();
        let mut events = vec![GameEvent::ScoresReset];
        events.extend(self.reset_game(state));
        events
    }

    /// 切换难度会重开当前棋局。
    pub fn set_difficulty(&self, state: &mut GameState, difficulty: AiDifficulty) -> Vec<GameEvent> {
        state.difficulty = difficulty;
        let mut events = vec![GameEvent::DifficultyChanged { difficulty }];
        events.extend(self.reset_game(state));
        events
    }

    pub fn rename_player(&self, state: &mut GameState, raw: &str) -> Vec<GameEvent> {
        state.player_name = normalize_player_name(raw, &state.player_name);
        vec![GameEvent::PlayerRenamed {
            name: state.player_name.clone(),
        }]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ai::AiConfig;
    use crate::game::{Board, Scoreboard};

    fn state_with(board: &str, current_mark: Mark) -> GameState {
        let mut state = GameState::new();
        state.board = board.parse::<Board>().expect("board literal should parse");
        state.current_mark = current_mark;
        state
    }

    fn hard_agent() -> AiAgent {
        AiAgent::with_seed(AiConfig::from_difficulty(AiDifficulty::Hard), 7)
    }

    #[test]
    fn human_move_passes_turn_to_computer() {
        let engine = RuleEngine::new();
        let mut state = GameState::new();

        let events = engine
            .human_move(&mut state, 4)
            .expect("move should succeed");

        assert_eq!(state.current_mark, Mark::O);
        assert_eq!(state.board.get(4), Some(Mark::X.cell()));
        assert_eq!(
            events,
            vec![
                GameEvent::MarkPlaced {
                    index: 4,
                    mark: Mark::X
                },
                GameEvent::TurnPassed { next: Mark::O },
            ]
        );
    }

    #[test]
    fn rejects_out_of_turn_and_bad_cells() {
        let engine = RuleEngine::new();
        let mut state = GameState::new();

        assert_eq!(
            engine.play_move(&mut state, 0, Mark::O),
            Err(RuleError::NotPlayerTurn {
                expected: Mark::X,
                actual: Mark::O
            })
        );
        assert_eq!(
            engine.human_move(&mut state, 9),
            Err(RuleError::CellOutOfRange { index: 9 })
        );

        engine
            .human_move(&mut state, 0)
            .expect("first move should succeed");
        assert_eq!(
            engine.play_move(&mut state, 0, Mark::O),
            Err(RuleError::CellOccupied { index: 0 })
        );
    }

    #[test]
    fn winning_move_records_score_and_freezes_turn() {
        let engine = RuleEngine::new();
        let mut state = state_with("XX. OO. ...", Mark::X);

        let events = engine
            .human_move(&mut state, 2)
            .expect("winning move should succeed");

        assert_eq!(state.outcome(), Outcome::XWins);
        assert_eq!(state.current_mark, Mark::X);
        assert_eq!(state.scores.player, 1);
        assert!(events.contains(&GameEvent::GameWon {
            winner: Mark::X,
            line: [0, 1, 2]
        }));
        assert_eq!(
            engine.human_move(&mut state, 5),
            Err(RuleError::GameFinished)
        );
    }

    #[test]
    fn win_at_saturated_score_keeps_counting_safely() {
        let engine = RuleEngine::new();
        let mut state = state_with("XX. OO. ...", Mark::X);
        state.scores.player = u32::MAX;

        engine
            .human_move(&mut state, 2)
            .expect("winning move should succeed");

        assert_eq!(state.outcome(), Outcome::XWins);
        assert_eq!(state.scores.player, u32::MAX);
    }

    #[test]
    fn committed_decision_lands_on_the_chosen_cell() {
        let engine = RuleEngine::new();
        let mut state = GameState::new();
        engine
            .human_move(&mut state, 4)
            .expect("human move should succeed");

        let mut agent = AiAgent::with_seed(AiConfig::from_difficulty(AiDifficulty::Medium), 11);
        let decision = agent.decide(&state.board);
        let index = decision.index.expect("board has empty cells");

        let events = engine
            .computer_move_at(&mut state, index)
            .expect("decided move should apply");

        assert_eq!(state.board.get(index), Some(Mark::O.cell()));
        assert_eq!(state.current_mark, Mark::X);
        assert_eq!(
            events.first(),
            Some(&GameEvent::MarkPlaced {
                index,
                mark: Mark::O
            })
        );
        assert_eq!(
            engine.computer_move_at(&mut state, 0),
            Err(RuleError::NotPlayerTurn {
                expected: Mark::X,
                actual: Mark::O
            })
        );
    }

    #[test]
    fn filling_the_board_records_a_draw() {
        let engine = RuleEngine::new();
        let mut state = state_with("XOX XOO OX.", Mark::X);

        let events = engine
            .human_move(&mut state, 8)
            .expect("last move should succeed");

        assert_eq!(state.outcome(), Outcome::Draw);
        assert_eq!(state.scores.draw, 1);
        assert_eq!(events.last(), Some(&GameEvent::GameDrawn));
    }

    #[test]
    fn computer_takes_the_win_when_available() {
        let engine = RuleEngine::new();
        let mut state = state_with("OO. XX. X..", Mark::O);
        let mut agent = hard_agent();

        let (decision, _events) = engine
            .computer_move(&mut state, &mut agent)
            .expect("computer move should succeed");

        assert_eq!(decision.index, Some(2));
        assert_eq!(state.outcome(), Outcome::OWins);
        assert_eq!(state.scores.computer, 1);
    }

    #[test]
    fn computer_waits_for_its_turn() {
        let engine = RuleEngine::new();
        let mut state = GameState::new();
        let mut agent = hard_agent();

        assert_eq!(
            engine.computer_move(&mut state, &mut agent).map(|(d, _)| d.index),
            Err(RuleError::NotPlayerTurn {
                expected: Mark::X,
                actual: Mark::O
            })
        );
    }

    #[test]
    fn hard_computer_never_loses_to_any_human_line() {
        // 人类每步依次尝试所有空格，穷举全部对局分支。
        fn explore(engine: &RuleEngine, state: &GameState, agent: &mut AiAgent) {
            for index in state.board.empty_cells().collect::<Vec<_>>() {
                let mut next = state.clone();
                engine
                    .human_move(&mut next, index)
                    .expect("human move should succeed");
                assert_ne!(next.outcome(), Outcome::XWins, "board: {:?}", next.board);
                if next.is_finished() {
                    continue;
                }
                engine
                    .computer_move(&mut next, agent)
                    .expect("computer move should succeed");
                if !next.is_finished() {
                    explore(engine, &next, agent);
                }
            }
        }

        let engine = RuleEngine::new();
        let mut agent = hard_agent();
        explore(&engine, &GameState::new(), &mut agent);
    }

    #[test]
    fn reset_scores_keeps_player_name() {
        let engine = RuleEngine::new();
        let mut state = state_with("XX. OO. ...", Mark::X);
        engine.rename_player(&mut state, "  小红  ");
        engine
            .human_move(&mut state, 2)
            .expect("winning move should succeed");

        let events = engine.reset_scores(&mut state);

        assert_eq!(events, vec![GameEvent::ScoresReset, GameEvent::GameReset]);
        assert_eq!(state.scores, Scoreboard::default());
        assert_eq!(state.board, Board::new());
        assert_eq!(state.current_mark, Mark::X);
        assert_eq!(state.player_name, "小红");
    }

    #[test]
    fn changing_difficulty_restarts_the_game() {
        let engine = RuleEngine::new();
        let mut state = GameState::new();
        engine
            .human_move(&mut state, 0)
            .expect("move should succeed");
        state.scores.player = 3;

        engine.set_difficulty(&mut state, AiDifficulty::Hard);

        assert_eq!(state.difficulty, AiDifficulty::Hard);
        assert_eq!(state.board, Board::new());
        assert_eq!(state.scores.player, 3);
    }

    #[test]
    fn blank_rename_keeps_previous_name() {
        let engine = RuleEngine::new();
        let mut state = GameState::new();
        engine.rename_player(&mut state, "   ");
        assert_eq!(state.player_name, "玩家");
    }
}
