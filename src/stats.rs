use rand::distributions::Standard;
use rand::prelude::Distribution;
use rand::Rng;
use serde::{Deserialize, Serialize};

/// 挑战者最终抉择
#[derive(Debug, Serialize, Deserialize, Copy, Clone, Eq, PartialEq)]
pub enum Strategy {
    /// 改变选择
    Switch,

    /// 坚持选择
    Stay,
}

impl Strategy {
    pub fn is_switch(self) -> bool {
        matches!(self, Strategy::Switch)
    }
}

impl From<bool> for Strategy {
    fn from(switch: bool) -> Self {
        if switch {
            Strategy::Switch
        } else {
            Strategy::Stay
        }
    }
}

impl Distribution<Strategy> for Standard {
    fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> Strategy {
        Strategy::from(rng.gen::<bool>())
    }
}

/// 一轮有效游戏的结果
#[derive(Debug, Serialize, Deserialize, Copy, Clone, Eq, PartialEq)]
pub enum Outcome {
    Win,
    Loss,
}

/// 两种策略各自的胜率（百分比）
#[derive(Debug, Serialize, Deserialize, Copy, Clone, PartialEq, Default)]
pub struct Rates {
    /// 改变选择胜率（%）
    pub switch: f64,

    /// 坚持选择胜率（%）
    pub stay: f64,
}

/// 当前进程内累计的统计
#[derive(Debug, Serialize, Deserialize, Copy, Clone, Eq, PartialEq, Default)]
pub struct Statistics {
    switch_wins: u32,
    switch_losses: u32,
    stay_wins: u32,
    stay_losses: u32,
    retries: u32,
}

impl Statistics {
    pub fn new() -> Self {
        Self::default()
    }

    /// 记录一轮有效游戏，每轮结束时调用且只调用一次
    pub fn record_outcome(&mut self, strategy: Strategy, outcome: Outcome) {
        let counter = match (strategy, outcome) {
            (Strategy::Switch, Outcome::Win) => &mut self.switch_wins,
            (Strategy::Switch, Outcome::Loss) => &mut self.switch_losses,
            (Strategy::Stay, Outcome::Win) => &mut self.stay_wins,
            (Strategy::Stay, Outcome::Loss) => &mut self.stay_losses,
        };
        *counter += 1;
    }

    /// 记录一次“重来”
    pub fn record_retry(&mut self) {
        self.retries += 1;
    }

    /// 全部清零
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// 两种策略的胜率，没有玩过的策略胜率为 0
    pub fn rates(&self) -> Rates {
        Rates {
            switch: percentage(self.switch_wins, self.switch_losses),
            stay: percentage(self.stay_wins, self.stay_losses),
        }
    }

    /// 改变选择后赢的次数
    pub fn switch_wins(&self) -> u32 {
        self.switch_wins
    }

    /// 改变选择后输的次数
    pub fn switch_losses(&self) -> u32 {
        self.switch_losses
    }

    /// 坚持选择后赢的次数
    pub fn stay_wins(&self) -> u32 {
        self.stay_wins
    }

    /// 坚持选择后输的次数
    pub fn stay_losses(&self) -> u32 {
        self.stay_losses
    }

    /// 重来的次数
    pub fn retries(&self) -> u32 {
        self.retries
    }

    /// 有效游戏轮数（不含重来）
    pub fn rounds(&self) -> u32 {
        self.switch_wins + self.switch_losses + self.stay_wins + self.stay_losses
    }

    /// 统计快照，附带胜率
    pub fn report(&self) -> StatisticsReport {
        let Rates { switch, stay } = self.rates();
        StatisticsReport {
            switch_wins: self.switch_wins,
            switch_losses: self.switch_losses,
            stay_wins: self.stay_wins,
            stay_losses: self.stay_losses,
            retries: self.retries,
            switch_rate: switch,
            stay_rate: stay,
        }
    }
}

fn percentage(wins: u32, losses: u32) -> f64 {
    match wins + losses {
        0 => 0.0,
        total => wins as f64 * 100.0 / total as f64,
    }
}

/// 提供给展示层的统计数据
#[derive(Debug, Serialize, Deserialize, Copy, Clone, PartialEq)]
pub struct StatisticsReport {
    pub switch_wins: u32,
    pub switch_losses: u32,
    pub stay_wins: u32,
    pub stay_losses: u32,
    pub retries: u32,
    /// 改变选择胜率（%）
    pub switch_rate: f64,
    /// 坚持选择胜率（%）
    pub stay_rate: f64,
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn rates_are_zero_without_games() {
        let stats = Statistics::new();
        assert_eq!(stats.rates(), Rates { switch: 0.0, stay: 0.0 });

        let mut stats = Statistics::new();
        stats.record_outcome(Strategy::Switch, Outcome::Win);
        let rates = stats.rates();
        assert_eq!(rates.switch, 100.0);
        assert_eq!(rates.stay, 0.0);
    }

    #[test]
    fn record_outcome_hits_matching_counter() {
        let mut stats = Statistics::new();
        stats.record_outcome(Strategy::Switch, Outcome::Win);
        stats.record_outcome(Strategy::Switch, Outcome::Win);
        stats.record_outcome(Strategy::Switch, Outcome::Loss);
        stats.record_outcome(Strategy::Stay, Outcome::Loss);
        stats.record_outcome(Strategy::Stay, Outcome::Loss);
        stats.record_outcome(Strategy::Stay, Outcome::Loss);
        stats.record_outcome(Strategy::Stay, Outcome::Win);
        stats.record_retry();

        assert_eq!(stats.switch_wins(), 2);
        assert_eq!(stats.switch_losses(), 1);
        assert_eq!(stats.stay_wins(), 1);
        assert_eq!(stats.stay_losses(), 3);
        assert_eq!(stats.retries(), 1);
        assert_eq!(stats.rounds(), 7);

        let report = stats.report();
        assert!((report.switch_rate - 200.0 / 3.0).abs() < 1e-9);
        assert_eq!(report.stay_rate, 25.0);
    }

    #[test]
    fn reset_zeroes_everything() {
        let mut stats = Statistics::new();
        stats.record_outcome(Strategy::Stay, Outcome::Win);
        stats.record_retry();
        stats.reset();

        let report = stats.report();
        assert_eq!(report.switch_wins, 0);
        assert_eq!(report.switch_losses, 0);
        assert_eq!(report.stay_wins, 0);
        assert_eq!(report.stay_losses, 0);
        assert_eq!(report.retries, 0);
        assert_eq!(report.switch_rate, 0.0);
        assert_eq!(report.stay_rate, 0.0);
    }

    #[test]
    fn strategy_from_bool() {
        assert_eq!(Strategy::from(true), Strategy::Switch);
        assert_eq!(Strategy::from(false), Strategy::Stay);
        assert!(Strategy::Switch.is_switch());
    }
}
