//! 游戏核心逻辑模块（棋盘、胜负判定、对局规则）。

pub mod rules;
pub mod state;

pub use rules::{RuleEngine, RuleError, RuleResolution};
pub use state::{
    normalize_player_name,
    Board,
    Cell,
    GameEvent,
    GameState,
    IntegrityError,
    Mark,
    Outcome,
    Scoreboard,
    BOARD_SIZE,
    LINES,
};
