use std::str::FromStr;
use std::time::Duration;

use rand::rngs::SmallRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

use super::minimax::{select_move, SearchStats};
use crate::game::{Board, Mark};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "lowercase")]
pub enum AiDifficulty {
    Easy,
    #[default]
    Medium,
    Hard,
}

impl FromStr for AiDifficulty {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "easy" => Ok(AiDifficulty::Easy),
            "medium" | "normal" => Ok(AiDifficulty::Medium),
            "hard" => Ok(AiDifficulty::Hard),
            _ => Err(()),
        }
    }
}

/// 难度对应的出招参数。
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AiConfig {
    /// 每一步采用极小化极大最佳落点的概率；其余情况随机落子。
    pub best_move_probability: f64,
    /// 前端模拟“思考”的延迟。
    pub move_delay: Duration,
}

impl AiConfig {
    pub fn from_difficulty(difficulty: AiDifficulty) -> Self {
        match difficulty {
            AiDifficulty::Easy => Self {
                best_move_probability: 0.0,
                move_delay: Duration::from_millis(100),
            },
            AiDifficulty::Medium => Self {
                best_move_probability: 0.5,
                move_delay: Duration::from_millis(400),
            },
            AiDifficulty::Hard => Self {
                best_move_probability: 1.0,
                move_delay: Duration::from_millis(800),
            },
        }
    }

    pub fn with_move_delay(mut self, delay: Duration) -> Self {
        self.move_delay = delay;
        self
    }

    pub fn move_delay_ms(&self) -> u32 {
        u32::try_from(self.move_delay.as_millis()).unwrap_or(u32::MAX)
    }
}

impl Default for AiConfig {
    fn default() -> Self {
        AiConfig::from_difficulty(AiDifficulty::default())
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum MoveSource {
    Random,
    Minimax,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AiDecision {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub index: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source: Option<MoveSource>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub score: Option<i32>,
    pub nodes: u64,
}

impl AiDecision {
    fn no_move() -> Self {
        Self {
            index: None,
            source: None,
            score: None,
            nodes: 0,
        }
    }
}

/// 电脑（O）的出招代理。
pub struct AiAgent {
    config: AiConfig,
    rng: SmallRng,
}

impl AiAgent {
    pub fn new(config: AiConfig) -> Self {
        Self {
            config,
            rng: SmallRng::from_entropy(),
        }
    }

    pub fn with_seed(config: AiConfig, seed: u64) -> Self {
        Self {
            config,
            rng: SmallRng::seed_from_u64(seed),
        }
    }

    pub fn config(&self) -> &AiConfig {
        &self.config
    }

    pub fn decide(&mut self, board: &Board) -> AiDecision {
        let legal: Vec<usize> = board.empty_cells().collect();
        if legal.is_empty() {
            console_warn!("AI 被要求在满盘上落子");
            return AiDecision::no_move();
        }

        let decision = if self.use_minimax() {
            self.minimax_decision(board)
        } else {
            self.random_decision(&legal)
        };

        console_log!(
            "AI 落子 {:?}（{:?}，评估 {:?}，节点 {}）",
            decision.index,
            decision.source,
            decision.score,
            decision.nodes
        );
        decision
    }

    fn use_minimax(&mut self) -> bool {
        let p = self.config.best_move_probability;
        if p >= 1.0 {
            true
        } else if p <= 0.0 || p.is_nan() {
            false
        } else {
            self.rng.gen_bool(p)
        }
    }

    fn minimax_decision(&self, board: &Board) -> AiDecision {
        let mut scratch = *board;
        let mut stats = SearchStats::default();
        match select_move(&mut scratch, Mark::O, &mut stats) {
            Some((index, score)) => AiDecision {
                index: Some(index),
                source: Some(MoveSource::Minimax),
                score: Some(score),
                nodes: stats.nodes,
            },
            None => AiDecision::no_move(),
        }
    }

    fn random_decision(&mut self, legal: &[usize]) -> AiDecision {
        AiDecision {
            index: legal.choose(&mut self.rng).copied(),
            source: Some(MoveSource::Random),
            score: None,
            nodes: 0,
        }
    }
}
