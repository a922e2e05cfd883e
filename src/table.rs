use crate::error::*;
use crate::game::Game;
use crate::round::{Decision, Phase, Reveal, RoundView};
use crate::stats::Strategy;
use rand::rngs::StdRng;
use rand::Rng;
use std::time::Duration;
use tokio::time::sleep;
use tracing::debug;

/// 展示节奏：选门后主持人“思考”的时间，以及打开“重来”门后自动开始新一轮前的停留时间
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct Pacing {
    pub reveal_delay: Duration,
    pub retry_delay: Duration,
}

impl Default for Pacing {
    fn default() -> Self {
        Self {
            reveal_delay: Duration::from_millis(800),
            retry_delay: Duration::from_millis(2000),
        }
    }
}

impl Pacing {
    /// 无延迟
    pub fn headless() -> Self {
        Self {
            reveal_delay: Duration::ZERO,
            retry_delay: Duration::ZERO,
        }
    }
}

/// 按展示节奏驱动一局游戏
///
/// `Table` 独占 [`Game`]，延迟期间不会有其他操作插入；
/// 即便调用方打乱顺序，状态机也会拒绝不合时宜的操作。
#[derive(Debug)]
pub struct Table<R = StdRng> {
    game: Game<R>,
    pacing: Pacing,
}

impl<R: Rng> Table<R> {
    pub fn new(game: Game<R>, pacing: Pacing) -> Self {
        Self { game, pacing }
    }

    pub fn game(&self) -> &Game<R> {
        &self.game
    }

    pub fn game_mut(&mut self) -> &mut Game<R> {
        &mut self.game
    }

    pub fn pacing(&self) -> Pacing {
        self.pacing
    }

    pub fn into_game(self) -> Game<R> {
        self.game
    }

    /// 选门，随后应调用 [`Table::reveal`]
    pub fn select_door(&mut self, index: usize) -> Result<()> {
        self.game.select_door(index)
    }

    /// 等待主持人揭示
    pub async fn reveal(&mut self) -> Result<Reveal> {
        if self.game.round().phase() != Phase::Selected {
            return Err(Error::InvalidState);
        }
        debug!(delay = ?self.pacing.reveal_delay, "host is checking the doors");
        sleep(self.pacing.reveal_delay).await;
        self.game.on_reveal()
    }

    pub fn decide(&mut self, strategy: Strategy) -> Result<Decision> {
        self.game.decide(strategy)
    }

    /// 打开“重来”门后等待一段时间再开始新一轮
    pub async fn restart_after_retry(&mut self) -> Result<RoundView> {
        if self.game.round().phase() != Phase::Retried {
            return Err(Error::InvalidState);
        }
        debug!(delay = ?self.pacing.retry_delay, "free retry, starting new round");
        sleep(self.pacing.retry_delay).await;
        self.game.restart_after_retry()
    }
}
