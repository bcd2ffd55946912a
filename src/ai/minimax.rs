use crate::game::{Board, Cell, Mark, Outcome, BOARD_SIZE};

/// 终局分值上限。O 胜为 `WIN_SCORE - depth`，X 胜为 `depth - WIN_SCORE`，平局为 0。
pub const WIN_SCORE: i32 = 10;

/// 一局最多九步，更深的 `depth` 会按九处理，分值因此保持在 `[-WIN_SCORE, WIN_SCORE]`。
pub const MAX_DEPTH: u8 = BOARD_SIZE as u8;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SearchStats {
    pub nodes: u64,
}

/// 以 O（电脑）为最大化方的穷举搜索。`maximizing` 表示本层由 O 落子。
///
/// 不剪枝、不缓存；试探性写入的格子在返回前全部还原。
pub fn search(board: &mut Board, depth: u8, maximizing: bool) -> i32 {
    let mut stats = SearchStats::default();
    search_counted(board, depth.min(MAX_DEPTH), maximizing, &mut stats)
}

/// 电脑（O）的最佳落点；棋盘已满时返回 `None`。
pub fn best_move(board: &mut Board) -> Option<usize> {
    best_move_for(board, Mark::O)
}

/// 任一方的最佳落点。X 视角下最小化同一套分值。
pub fn best_move_for(board: &mut Board, mark: Mark) -> Option<usize> {
    let mut stats = SearchStats::default();
    select_move(board, mark, &mut stats).map(|(index, _)| index)
}

pub(crate) fn search_counted(
    board: &mut Board,
    depth: u8,
    maximizing: bool,
    stats: &mut SearchStats,
) -> i32 {
    stats.nodes += 1;

    let depth_score = i32::from(depth);
    match board.outcome() {
        Outcome::OWins => return WIN_SCORE - depth_score,
        Outcome::XWins => return depth_score - WIN_SCORE,
        Outcome::Draw => return 0,
        Outcome::InProgress => {}
    }

    let mover = if maximizing { Mark::O } else { Mark::X };
    let mut best = if maximizing { i32::MIN } else { i32::MAX };

    for index in 0..BOARD_SIZE {
        if !board.is_empty_at(index) {
            continue;
        }

        board.set(index, mover.cell());
        let score = search_counted(board, depth.saturating_add(1), !maximizing, stats);
        board.set(index, Cell::Empty);

        // 严格比较：同分时保留编号更小的分支
        if maximizing {
            if score > best {
                best = score;
            }
        } else if score < best {
            best = score;
        }
    }

    best
}

/// 返回 `(落点, 分值)`。每个候选先落子再交给对手层搜索，严格优于才替换。
pub(crate) fn select_move(
    board: &mut Board,
    mark: Mark,
    stats: &mut SearchStats,
) -> Option<(usize, i32)> {
    let opponent_maximizing = mark == Mark::X;
    let mut best: Option<(usize, i32)> = None;

    for index in 0..BOARD_SIZE {
        if !board.is_empty_at(index) {
            continue;
        }

        board.set(index, mark.cell());
        let score = search_counted(board, 0, opponent_maximizing, stats);
        board.set(index, Cell::Empty);

        let improves = match best {
            None => true,
            Some((_, best_score)) => match mark {
                Mark::O => score > best_score,
                Mark::X => score < best_score,
            },
        };
        if improves {
            best = Some((index, score));
        }
    }

    best
}
