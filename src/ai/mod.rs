//! AI 算法模块：穷举极小化极大搜索与按难度分级的出招代理。

pub mod agent;
pub mod minimax;

pub use agent::{AiAgent, AiConfig, AiDecision, AiDifficulty, MoveSource};
pub use minimax::{best_move, best_move_for, search, SearchStats, MAX_DEPTH, WIN_SCORE};
