use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::ai::AiDifficulty;

/// 棋盘格数（3×3）。
pub const BOARD_SIZE: usize = 9;

const DEFAULT_PLAYER_NAME: &str = "玩家";

/// 八条获胜连线：三行、三列、两条对角线。
pub const LINES: [[usize; 3]; 8] = [
    [0, 1, 2],
    [3, 4, 5],
    [6, 7, 8],
    [0, 3, 6],
    [1, 4, 7],
    [2, 5, 8],
    [0, 4, 8],
    [2, 4, 6],
];

/// 单个格子的内容。序列化为 `""`、`"X"`、`"O"`，与前端保持一致。
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
pub enum Cell {
    #[default]
    #[serde(rename = "")]
    Empty,
    X,
    O,
}

impl Cell {
    pub fn mark(self) -> Option<Mark> {
        match self {
            Cell::Empty => None,
            Cell::X => Some(Mark::X),
            Cell::O => Some(Mark::O),
        }
    }
}

/// 玩家符号。人类执 X 先手，电脑执 O。
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
pub enum Mark {
    #[default]
    X,
    O,
}

impl Mark {
    pub fn opponent(self) -> Mark {
        match self {
            Mark::X => Mark::O,
            Mark::O => Mark::X,
        }
    }

    pub fn cell(self) -> Cell {
        match self {
            Mark::X => Cell::X,
            Mark::O => Cell::O,
        }
    }
}

/// 由棋盘推导出的局面结果，从不单独存储。
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Outcome {
    InProgress,
    XWins,
    OWins,
    Draw,
}

impl Outcome {
    pub fn is_terminal(self) -> bool {
        !matches!(self, Outcome::InProgress)
    }

    pub fn winner(self) -> Option<Mark> {
        match self {
            Outcome::XWins => Some(Mark::X),
            Outcome::OWins => Some(Mark::O),
            Outcome::InProgress | Outcome::Draw => None,
        }
    }

    fn won_by(mark: Mark) -> Self {
        match mark {
            Mark::X => Outcome::XWins,
            Mark::O => Outcome::OWins,
        }
    }
}

/// 3×3 棋盘，按行优先编号 0–8。
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(transparent)]
pub struct Board {
    cells: [Cell; BOARD_SIZE],
}

impl Board {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_cells(cells: [Cell; BOARD_SIZE]) -> Self {
        Self { cells }
    }

    pub fn cells(&self) -> &[Cell; BOARD_SIZE] {
        &self.cells
    }

    pub fn get(&self, index: usize) -> Option<Cell> {
        self.cells.get(index).copied()
    }

    /// 直接写入格子，不做任何规则校验。
    ///
    /// 搜索用它做“落子、递归、还原”的试探性修改；对局中的落子请走
    /// [`RuleEngine::play_move`](super::RuleEngine::play_move)。
    pub fn set(&mut self, index: usize, cell: Cell) {
        self.cells[index] = cell;
    }

    pub fn is_empty_at(&self, index: usize) -> bool {
        self.cells.get(index) == Some(&Cell::Empty)
    }

    /// 按编号升序列出空格。
    pub fn empty_cells(&self) -> impl Iterator<Item = usize> + '_ {
        self.cells
            .iter()
            .enumerate()
            .filter(|(_, cell)| **cell == Cell::Empty)
            .map(|(index, _)| index)
    }

    pub fn is_full(&self) -> bool {
        !self.cells.contains(&Cell::Empty)
    }

    pub fn count(&self, mark: Mark) -> usize {
        let target = mark.cell();
        self.cells.iter().filter(|cell| **cell == target).count()
    }

    /// 扫描顺序中第一条被同一符号占满的连线。
    pub fn winning_line(&self) -> Option<[usize; 3]> {
        LINES.iter().copied().find(|line| self.line_owner(*line).is_some())
    }

    pub fn winner(&self) -> Option<Mark> {
        LINES.iter().find_map(|line| self.line_owner(*line))
    }

    pub fn outcome(&self) -> Outcome {
        if let Some(mark) = self.winner() {
            return Outcome::won_by(mark);
        }
        if self.is_full() {
            Outcome::Draw
        } else {
            Outcome::InProgress
        }
    }

    fn line_owner(&self, [a, b, c]: [usize; 3]) -> Option<Mark> {
        let first = self.cells[a];
        if first == self.cells[b] && first == self.cells[c] {
            first.mark()
        } else {
            None
        }
    }
}

/// 解析 9 个字符：`X`/`O` 为棋子，`.`、`_`、`-` 为空格；忽略空白与 `|`。
impl FromStr for Board {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut cells = [Cell::Empty; BOARD_SIZE];
        let mut filled = 0;
        for ch in s.chars().filter(|ch| !ch.is_whitespace() && *ch != '|') {
            if filled == BOARD_SIZE {
                return Err(());
            }
            cells[filled] = match ch {
                'X' | 'x' => Cell::X,
                'O' | 'o' => Cell::O,
                '.' | '_' | '-' => Cell::Empty,
                _ => return Err(()),
            };
            filled += 1;
        }
        if filled != BOARD_SIZE {
            return Err(());
        }
        Ok(Board { cells })
    }
}

/// 胜负平计分。
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct Scoreboard {
    #[serde(default)]
    pub player: u32,
    #[serde(default)]
    pub computer: u32,
    #[serde(default)]
    pub draw: u32,
}

impl Scoreboard {
    pub fn record(&mut self, outcome: Outcome) {
        match outcome {
            Outcome::XWins => self.player = self.player.saturating_add(1),
            Outcome::OWins => self.computer = self.computer.saturating_add(1),
            Outcome::Draw => self.draw = self.draw.saturating_add(1),
            Outcome::InProgress => {}
        }
    }

    pub fn reset(&mut self) {
        *self = Scoreboard::default();
    }

    pub fn games_played(&self) -> u32 {
        self.player
            .saturating_add(self.computer)
            .saturating_add(self.draw)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type")]
pub enum GameEvent {
    MarkPlaced { index: usize, mark: Mark },
    TurnPassed { next: Mark },
    GameWon { winner: Mark, line: [usize; 3] },
    GameDrawn,
    GameReset,
    ScoresReset,
    DifficultyChanged { difficulty: AiDifficulty },
    PlayerRenamed { name: String },
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type")]
pub enum IntegrityError {
    MarkCountMismatch { x: usize, o: usize },
    TurnMismatch { expected: Mark, actual: Mark },
    MultipleWinners,
}

fn default_player_name() -> String {
    DEFAULT_PLAYER_NAME.to_string()
}

/// 一局对战的完整状态：棋盘、轮到谁、难度、计分与玩家名称。
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct GameState {
    #[serde(default)]
    pub board: Board,
    #[serde(default)]
    pub current_mark: Mark,
    #[serde(default)]
    pub difficulty: AiDifficulty,
    #[serde(default)]
    pub scores: Scoreboard,
    #[serde(default = "default_player_name")]
    pub player_name: String,
}

impl Default for GameState {
    fn default() -> Self {
        Self::new()
    }
}

impl GameState {
    pub fn new() -> Self {
        Self {
            board: Board::new(),
            current_mark: Mark::X,
            difficulty: AiDifficulty::default(),
            scores: Scoreboard::default(),
            player_name: default_player_name(),
        }
    }

    pub fn with_difficulty(mut self, difficulty: AiDifficulty) -> Self {
        self.difficulty = difficulty;
        self
    }

    pub fn outcome(&self) -> Outcome {
        self.board.outcome()
    }

    pub fn is_finished(&self) -> bool {
        self.outcome().is_terminal()
    }

    /// 清空棋盘，X 先手；计分与名称保留。
    pub fn clear_board(&mut self) {
        self.board = Board::new();
        self.current_mark = Mark::X;
    }

    /// 棋子数量必须符合 X 先手的交替规则，且最多一方连成一线。
    /// 对局结束后不再轮换，因此只在进行中的局面上校验轮次。
    pub fn integrity_check(&self) -> Result<(), IntegrityError> {
        let x = self.board.count(Mark::X);
        let o = self.board.count(Mark::O);
        let expected = if x == o {
            Mark::X
        } else if x == o + 1 {
            Mark::O
        } else {
            return Err(IntegrityError::MarkCountMismatch { x, o });
        };

        let x_line = LINES
            .iter()
            .any(|line| self.board.line_owner(*line) == Some(Mark::X));
        let o_line = LINES
            .iter()
            .any(|line| self.board.line_owner(*line) == Some(Mark::O));
        if x_line && o_line {
            return Err(IntegrityError::MultipleWinners);
        }

        if !self.is_finished() && self.current_mark != expected {
            return Err(IntegrityError::TurnMismatch {
                expected,
                actual: self.current_mark,
            });
        }

        Ok(())
    }
}

/// 去除首尾空白后作为新名称；空输入保留原名。
pub fn normalize_player_name(raw: &str, current: &str) -> String {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        current.to_string()
    } else {
        trimmed.to_string()
    }
}
