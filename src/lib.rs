#[macro_use]
pub mod utils;

pub mod ai;
pub mod game;

use gloo_timers::future::TimeoutFuture;
use serde::Serialize;
use serde_wasm_bindgen::{from_value, to_value};
use std::str::FromStr;
use wasm_bindgen::prelude::*;
use wasm_bindgen_futures::future_to_promise;
use web_sys::js_sys::Promise;

pub use ai::{
    best_move, best_move_for, search, AiAgent, AiConfig, AiDecision, AiDifficulty, MoveSource,
    SearchStats, MAX_DEPTH, WIN_SCORE,
};
pub use game::{
    Board, Cell, GameEvent, GameState, IntegrityError, Mark, Outcome, RuleEngine, RuleError,
    RuleResolution, Scoreboard, BOARD_SIZE, LINES,
};

#[cfg(feature = "wee_alloc")]
#[global_allocator]
static ALLOC: wee_alloc::WeeAlloc = wee_alloc::WeeAlloc::INIT;

#[wasm_bindgen(start)]
pub fn start() {
    utils::set_panic_hook();
}

fn to_js_error(error: RuleError) -> JsValue {
    to_value(&error).unwrap_or_else(|serialize_err| JsValue::from_str(&serialize_err.to_string()))
}

fn serde_to_js_error<E: std::fmt::Display>(error: E) -> JsValue {
    JsValue::from_str(&error.to_string())
}

fn resolution_json(state: &GameState, events: Vec<GameEvent>) -> Result<String, JsValue> {
    serde_json::to_string(&RuleResolution::new(state.clone(), events)).map_err(serde_to_js_error)
}

/// 无法识别的难度按默认的中等处理，出招与延迟都取中等，而不是退回随机落子。
fn parse_difficulty(value: &str) -> AiDifficulty {
    AiDifficulty::from_str(value).unwrap_or_else(|_| {
        console_warn!("未知难度 {value:?}，改用默认难度");
        AiDifficulty::default()
    })
}

fn load_state(json: &str) -> Result<GameState, JsValue> {
    let state: GameState = serde_json::from_str(json).map_err(serde_to_js_error)?;
    RuleEngine::ensure_integrity(&state).map_err(to_js_error)?;
    Ok(state)
}

#[derive(Serialize)]
struct AiMoveResponse {
    decision: AiDecision,
    #[serde(skip_serializing_if = "Option::is_none")]
    applied: Option<RuleResolution>,
}

/// 供前端持有的一局对战；所有结果以 JSON 字符串返回。
#[wasm_bindgen]
pub struct GameEngine {
    state: GameState,
    rules: RuleEngine,
}

#[wasm_bindgen]
impl GameEngine {
    #[wasm_bindgen(constructor)]
    pub fn new(initial_state_json: Option<String>) -> Result<GameEngine, JsValue> {
        let state = match initial_state_json {
            Some(json) => load_state(&json)?,
            None => GameState::new(),
        };
        console_log!(
            "井字棋引擎就绪：难度 {:?}，比分 {}/{}/{}",
            state.difficulty,
            state.scores.player,
            state.scores.computer,
            state.scores.draw
        );
        Ok(GameEngine {
            state,
            rules: RuleEngine::new(),
        })
    }

    pub fn state_json(&self) -> Result<String, JsValue> {
        serde_json::to_string(&self.state).map_err(serde_to_js_error)
    }

    pub fn set_state_json(&mut self, json: &str) -> Result<(), JsValue> {
        self.state = load_state(json)?;
        Ok(())
    }

    pub fn scores_json(&self) -> Result<String, JsValue> {
        serde_json::to_string(&self.state.scores).map_err(serde_to_js_error)
    }

    /// 载入前端保存的比分（例如从 cookie 读出的数值）。
    pub fn set_scores(&mut self, player: u32, computer: u32, draw: u32) {
        self.state.scores = Scoreboard {
            player,
            computer,
            draw,
        };
    }

    /// 人类（X）落子。
    pub fn play(&mut self, index: usize) -> Result<String, JsValue> {
        let events = self
            .rules
            .human_move(&mut self.state, index)
            .map_err(to_js_error)?;
        resolution_json(&self.state, events)
    }

    /// 按当前难度让电脑（O）立即落子。
    pub fn apply_ai_move(&mut self) -> Result<String, JsValue> {
        let mut agent = AiAgent::new(AiConfig::from_difficulty(self.state.difficulty));
        let (decision, events) = self
            .rules
            .computer_move(&mut self.state, &mut agent)
            .map_err(to_js_error)?;

        let response = AiMoveResponse {
            decision,
            applied: Some(RuleResolution::new(self.state.clone(), events)),
        };
        serde_json::to_string(&response).map_err(serde_to_js_error)
    }

    /// 提交电脑（O）已决定的落点，通常是 `think_ai` 返回的 `decision.index`。
    pub fn apply_computer_move(&mut self, index: usize) -> Result<String, JsValue> {
        let events = self
            .rules
            .computer_move_at(&mut self.state, index)
            .map_err(to_js_error)?;
        resolution_json(&self.state, events)
    }

    /// 等待“思考”延迟后返回电脑的决策（不修改棋局），随后用
    /// `apply_computer_move` 提交同一落点。未指定延迟时按难度取值。
    pub fn think_ai(&self, delay_ms: Option<u32>) -> Promise {
        let board = self.state.board;
        let config = AiConfig::from_difficulty(self.state.difficulty);
        let delay = delay_ms.unwrap_or_else(|| config.move_delay_ms());

        future_to_promise(async move {
            if delay > 0 {
                TimeoutFuture::new(delay).await;
            }
            let mut agent = AiAgent::new(config);
            let response = AiMoveResponse {
                decision: agent.decide(&board),
                applied: None,
            };
            let json = serde_json::to_string(&response).map_err(serde_to_js_error)?;
            Ok(JsValue::from_str(&json))
        })
    }

    pub fn move_delay_ms(&self) -> u32 {
        AiConfig::from_difficulty(self.state.difficulty).move_delay_ms()
    }

    pub fn reset_game(&mut self) -> Result<String, JsValue> {
        let events = self.rules.reset_game(&mut self.state);
        resolution_json(&self.state, events)
    }

    pub fn reset_scores(&mut self) -> Result<String, JsValue> {
        let events = self.rules.reset_scores(&mut self.state);
        resolution_json(&self.state, events)
    }

    pub fn set_difficulty(&mut self, difficulty: &str) -> Result<String, JsValue> {
        let difficulty = parse_difficulty(difficulty);
        let events = self.rules.set_difficulty(&mut self.state, difficulty);
        resolution_json(&self.state, events)
    }

    /// 更新玩家名称并返回实际生效的名称。
    pub fn set_player_name(&mut self, name: &str) -> String {
        self.rules.rename_player(&mut self.state, name);
        self.state.player_name.clone()
    }

    pub fn player_name(&self) -> String {
        self.state.player_name.clone()
    }
}

/// 计算电脑（O）的最佳落点；满盘时返回 `undefined`。
#[wasm_bindgen(js_name = "computeBestMove")]
pub fn compute_best_move(cells: JsValue) -> Result<Option<u32>, JsValue> {
    let mut board: Board = from_value(cells).map_err(JsValue::from)?;
    Ok(best_move(&mut board).and_then(|index| u32::try_from(index).ok()))
}

#[wasm_bindgen(js_name = "evaluateOutcome")]
pub fn evaluate_outcome(cells: JsValue) -> Result<JsValue, JsValue> {
    let board: Board = from_value(cells).map_err(JsValue::from)?;
    to_value(&board.outcome()).map_err(JsValue::from)
}

/// `depth` 超过 9 时按 9 处理，返回值落在 `[-10, 10]`。
#[wasm_bindgen(js_name = "minimaxScore")]
pub fn minimax_score(cells: JsValue, depth: u8, maximizing: bool) -> Result<i32, JsValue> {
    let mut board: Board = from_value(cells).map_err(JsValue::from)?;
    Ok(search(&mut board, depth, maximizing))
}

#[wasm_bindgen(js_name = "computeAiMove")]
pub fn compute_ai_move(cells: JsValue, difficulty: Option<String>) -> Result<JsValue, JsValue> {
    let board: Board = from_value(cells).map_err(JsValue::from)?;
    let difficulty = difficulty
        .as_deref()
        .map(parse_difficulty)
        .unwrap_or_default();
    let mut agent = AiAgent::new(AiConfig::from_difficulty(difficulty));
    to_value(&agent.decide(&board)).map_err(JsValue::from)
}

#[wasm_bindgen(js_name = "validateState")]
pub fn validate_state(state: JsValue) -> Result<(), JsValue> {
    let state: GameState = from_value(state).map_err(JsValue::from)?;
    RuleEngine::ensure_integrity(&state).map_err(to_js_error)
}
