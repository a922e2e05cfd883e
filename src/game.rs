use crate::door::*;
use crate::error::*;
use crate::round::*;
use crate::stats::*;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

/// 批量模拟时每轮采用的抉择方式
#[derive(Debug, Serialize, Deserialize, Copy, Clone, Eq, PartialEq)]
pub enum Plan {
    /// 总是改变选择
    Switch,

    /// 总是坚持选择
    Stay,

    /// 每轮随机
    Random,
}

impl Plan {
    fn pick<R: Rng + ?Sized>(self, rng: &mut R) -> Strategy {
        match self {
            Plan::Switch => Strategy::Switch,
            Plan::Stay => Strategy::Stay,
            Plan::Random => rng.gen(),
        }
    }
}

/// 游戏：持有当前模式、当前一轮和累计统计
#[derive(Debug)]
pub struct Game<R = StdRng> {
    mode: Mode,
    round: Round,
    stats: Statistics,
    rng: R,
}

impl Game<StdRng> {
    pub fn new(mode: Mode) -> Self {
        Self::with_rng(mode, StdRng::from_entropy())
    }
}

impl Default for Game<StdRng> {
    fn default() -> Self {
        Self::new(Mode::default())
    }
}

impl<R: Rng> Game<R> {
    pub fn with_rng(mode: Mode, mut rng: R) -> Self {
        let round = Round::new(mode, &mut rng);
        Self {
            mode,
            round,
            stats: Statistics::new(),
            rng,
        }
    }

    /// 当前模式
    pub fn mode(&self) -> Mode {
        self.mode
    }

    /// 当前一轮
    pub fn round(&self) -> &Round {
        &self.round
    }

    /// 开始新一轮，任何阶段都可以调用（“再玩一次”）
    pub fn new_round(&mut self) -> RoundView {
        self.round = Round::new(self.mode, &mut self.rng);
        debug!(mode = ?self.mode, "new round");
        self.round.view()
    }

    /// 使用指定门内容开始新一轮；门内容对应的模式与当前不同时视同切换模式，统计清零
    pub fn new_round_with(&mut self, doors: DoorSet) -> RoundView {
        if doors.mode() != self.mode {
            self.mode = doors.mode();
            info!(retry_enabled = self.mode.retry_enabled, "mode changed");
            self.reset_statistics();
        }
        self.round = Round::with_doors(doors);
        self.round.view()
    }

    /// 挑战者选门，之后由调用方（延迟后）触发 [`Game::on_reveal`]
    pub fn select_door(&mut self, index: usize) -> Result<()> {
        self.round.select_door(index)
    }

    /// 主持人揭示
    pub fn on_reveal(&mut self) -> Result<Reveal> {
        self.round.host_reveal(&mut self.rng)
    }

    /// 挑战者做出最终抉择并记入统计
    pub fn decide(&mut self, strategy: Strategy) -> Result<Decision> {
        let decision = self.round.decide(strategy)?;
        match decision.outcome {
            Some(outcome) => {
                self.stats.record_outcome(strategy, outcome);
                info!(?strategy, ?outcome, "round finished");
            }
            None => {
                self.stats.record_retry();
                info!(?strategy, "retry door opened, round voided");
            }
        }
        Ok(decision)
    }

    /// 打开“重来”门后开始新一轮
    pub fn restart_after_retry(&mut self) -> Result<RoundView> {
        if self.round.phase() == Phase::Retried {
            Ok(self.new_round())
        } else {
            Err(Error::InvalidState)
        }
    }

    /// 一次性完成选门、揭示、抉择
    pub fn play_round(&mut self, index: usize, strategy: Strategy) -> Result<Decision> {
        self.select_door(index)?;
        self.on_reveal()?;
        self.decide(strategy)
    }

    pub fn statistics(&self) -> StatisticsReport {
        self.stats.report()
    }

    pub fn reset_statistics(&mut self) {
        self.stats.reset();
        info!("statistics reset");
    }

    /// 切换模式：清空统计并开始新一轮
    pub fn set_mode(&mut self, retry_enabled: bool) -> RoundView {
        self.mode = Mode::new(retry_enabled);
        info!(retry_enabled, "mode changed");
        self.reset_statistics();
        self.new_round()
    }

    pub fn toggle_mode(&mut self) -> RoundView {
        self.set_mode(!self.mode.retry_enabled)
    }

    /// 无延迟地连续进行 `rounds` 轮有效游戏，初始选门均匀随机，
    /// 遇到“重来”门时直接开始新一轮（不计入轮数）
    pub fn simulate(&mut self, rounds: u32, plan: Plan) -> Result<StatisticsReport> {
        let mut played = 0;
        while played < rounds {
            self.new_round();
            let index = self.rng.gen_range(0..DOOR_COUNT);
            let strategy = plan.pick(&mut self.rng);
            if !self.play_round(index, strategy)?.is_retry() {
                played += 1;
            }
        }
        Ok(self.statistics())
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use Content::*;

    fn seeded(mode: Mode, seed: u64) -> Game {
        Game::with_rng(mode, StdRng::seed_from_u64(seed))
    }

    #[test]
    fn new_game_starts_in_initial_phase() {
        let game = seeded(Mode::default(), 1);
        assert_eq!(game.mode(), Mode::with_retry());
        assert_eq!(game.round().phase(), Phase::Initial);
        assert_eq!(game.round().view().door_count, 3);
        assert_eq!(game.statistics().retries, 0);
    }

    #[test]
    fn scored_rounds_are_recorded() {
        let mut game = seeded(Mode::classic(), 2);

        game.new_round_with(DoorSet::new([Loss, Trophy, Loss]).unwrap());
        let decision = game.play_round(0, Strategy::Switch).unwrap();
        assert_eq!(decision.final_choice, 1);
        assert!(decision.is_win());

        game.new_round_with(DoorSet::new([Loss, Trophy, Loss]).unwrap());
        let decision = game.play_round(0, Strategy::Stay).unwrap();
        assert_eq!(decision.outcome, Some(Outcome::Loss));

        let stats = game.statistics();
        assert_eq!(stats.switch_wins, 1);
        assert_eq!(stats.stay_losses, 1);
        assert_eq!(stats.switch_rate, 100.0);
        assert_eq!(stats.stay_rate, 0.0);
    }

    #[test]
    fn retry_counts_only_retries_and_restarts() {
        let mut game = seeded(Mode::with_retry(), 3);
        game.new_round_with(DoorSet::new([Trophy, Retry, Loss]).unwrap());

        assert_eq!(game.restart_after_retry(), Err(Error::InvalidState));

        game.select_door(1).unwrap();
        assert_eq!(game.on_reveal().unwrap().revealed_door, 2);
        let decision = game.decide(Strategy::Stay).unwrap();
        assert!(decision.is_retry());
        assert_eq!(game.round().phase(), Phase::Retried);
        assert_eq!(game.decide(Strategy::Switch), Err(Error::InvalidState));

        let stats = game.statistics();
        assert_eq!(stats.retries, 1);
        assert_eq!(stats.switch_wins + stats.switch_losses + stats.stay_wins + stats.stay_losses, 0);

        let view = game.restart_after_retry().unwrap();
        assert_eq!(view.phase, Phase::Initial);
        assert_eq!(game.round().selected_door(), None);
    }

    #[test]
    fn set_mode_resets_statistics_and_round() {
        let mut game = seeded(Mode::with_retry(), 4);
        game.simulate(20, Plan::Random).unwrap();
        assert!(game.statistics().switch_wins + game.statistics().stay_wins > 0);

        game.select_door(0).unwrap();
        let view = game.set_mode(false);
        assert_eq!(view.phase, Phase::Initial);
        assert_eq!(view.mode, Mode::classic());
        assert_eq!(game.statistics(), Statistics::new().report());
        assert!(!game.round().doors().contents().contains(&Retry));

        let view = game.toggle_mode();
        assert_eq!(view.mode, Mode::with_retry());
    }

    #[test]
    fn preset_doors_of_other_mode_reset_statistics() {
        let mut game = seeded(Mode::with_retry(), 10);
        game.simulate(100, Plan::Stay).unwrap();
        assert!(game.statistics().retries > 0);

        // 同模式的门内容不影响统计
        game.new_round_with(DoorSet::new([Retry, Trophy, Loss]).unwrap());
        assert_eq!(game.statistics().stay_wins + game.statistics().stay_losses, 100);

        let view = game.new_round_with(DoorSet::new([Loss, Trophy, Loss]).unwrap());
        assert_eq!(view.mode, Mode::classic());
        assert_eq!(game.mode(), Mode::classic());
        assert_eq!(game.statistics(), Statistics::new().report());
    }

    #[test]
    fn reset_statistics_zeroes_counters() {
        let mut game = seeded(Mode::with_retry(), 5);
        game.simulate(50, Plan::Switch).unwrap();
        game.reset_statistics();
        let stats = game.statistics();
        assert_eq!(stats.switch_wins, 0);
        assert_eq!(stats.switch_losses, 0);
        assert_eq!(stats.stay_wins, 0);
        assert_eq!(stats.stay_losses, 0);
        assert_eq!(stats.retries, 0);
    }

    #[test]
    fn invalid_selection_is_rejected() {
        let mut game = seeded(Mode::classic(), 6);
        assert_eq!(game.select_door(3), Err(Error::InvalidInput));
        assert_eq!(game.on_reveal(), Err(Error::InvalidState));
        game.select_door(2).unwrap();
        assert_eq!(game.select_door(1), Err(Error::InvalidState));
        assert_eq!(game.round().selected_door(), Some(2));
    }

    #[test]
    fn switching_wins_two_thirds_in_classic_mode() {
        let mut game = seeded(Mode::classic(), 7);
        let stats = game.simulate(10_000, Plan::Random).unwrap();
        assert!((stats.switch_rate - 200.0 / 3.0).abs() < 3.0, "{stats:?}");
        assert!((stats.stay_rate - 100.0 / 3.0).abs() < 3.0, "{stats:?}");
        assert_eq!(stats.retries, 0);

        let mut game = seeded(Mode::classic(), 8);
        let stats = game.simulate(10_000, Plan::Switch).unwrap();
        assert_eq!(stats.stay_wins + stats.stay_losses, 0);
        assert_eq!(stats.switch_wins + stats.switch_losses, 10_000);
        assert!((stats.switch_rate - 200.0 / 3.0).abs() < 3.0, "{stats:?}");
    }

    #[test]
    fn retry_mode_simulation_skips_voided_rounds() {
        let mut game = seeded(Mode::with_retry(), 9);
        let stats = game.simulate(3_000, Plan::Stay).unwrap();
        assert_eq!(stats.stay_wins + stats.stay_losses, 3_000);
        assert!(stats.retries > 0);
    }
}
