use crate::door::*;
use crate::error::*;
use crate::stats::{Outcome, Strategy};
use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// 一轮游戏的阶段，只能向前推进
#[derive(Debug, Serialize, Deserialize, Copy, Clone, Eq, PartialEq)]
pub enum Phase {
    /// 等待挑战者选门
    Initial,

    /// 挑战者已选门，主持人正在揭示
    Selected,

    /// 主持人已开门，等待挑战者抉择
    Revealed,

    /// 游戏结束（赢或输）
    Final,

    /// 最终打开的是“重来”门，本轮作废，等待开始新一轮
    Retried,
}

/// 内部阶段，携带各阶段已经确定的门序号
#[derive(Debug, Clone, Copy)]
enum Stage {
    Initial,
    Selected {
        selected: usize,
    },
    Revealed {
        selected: usize,
        revealed: usize,
    },
    Decided {
        selected: usize,
        revealed: usize,
        decision: Decision,
    },
}

/// 主持人揭示的结果
#[derive(Debug, Serialize, Copy, Clone, Eq, PartialEq)]
pub struct Reveal {
    /// 主持人打开的门序号
    pub revealed_door: usize,

    /// 门后的内容
    pub content: Content,

    /// 门后内容的图标
    pub icon: &'static str,
}

/// 挑战者最终抉择的结果
#[derive(Debug, Serialize, Deserialize, Copy, Clone, Eq, PartialEq)]
pub struct Decision {
    /// 最终打开的门序号
    pub final_choice: usize,

    /// 最终门后的内容
    pub content: Content,

    /// 挑战者的抉择
    pub strategy: Strategy,

    /// 输赢；打开“重来”门时为 `None`
    pub outcome: Option<Outcome>,
}

impl Decision {
    pub fn is_retry(&self) -> bool {
        self.outcome.is_none()
    }

    pub fn is_win(&self) -> bool {
        matches!(self.outcome, Some(Outcome::Win))
    }

    pub fn did_switch(&self) -> bool {
        self.strategy.is_switch()
    }
}

/// 展示层看到的一轮游戏概况
#[derive(Debug, Serialize, Deserialize, Copy, Clone, Eq, PartialEq)]
pub struct RoundView {
    pub phase: Phase,
    pub door_count: usize,
    pub mode: Mode,
}

/// 一轮游戏
#[derive(Debug, Clone)]
pub struct Round {
    doors: DoorSet,
    stage: Stage,
}

impl Round {
    /// 按模式洗牌开始新一轮
    pub fn new<R: Rng + ?Sized>(mode: Mode, rng: &mut R) -> Self {
        Self::with_doors(DoorSet::shuffled(mode, rng))
    }

    /// 用指定的门内容开始新一轮
    pub fn with_doors(doors: DoorSet) -> Self {
        Self {
            doors,
            stage: Stage::Initial,
        }
    }

    pub fn doors(&self) -> &DoorSet {
        &self.doors
    }

    pub fn mode(&self) -> Mode {
        self.doors.mode()
    }

    pub fn phase(&self) -> Phase {
        match self.stage {
            Stage::Initial => Phase::Initial,
            Stage::Selected { .. } => Phase::Selected,
            Stage::Revealed { .. } => Phase::Revealed,
            Stage::Decided { decision, .. } if decision.is_retry() => Phase::Retried,
            Stage::Decided { .. } => Phase::Final,
        }
    }

    pub fn view(&self) -> RoundView {
        RoundView {
            phase: self.phase(),
            door_count: DOOR_COUNT,
            mode: self.mode(),
        }
    }

    /// 挑战者选择的门序号
    pub fn selected_door(&self) -> Option<usize> {
        match self.stage {
            Stage::Initial => None,
            Stage::Selected { selected }
            | Stage::Revealed { selected, .. }
            | Stage::Decided { selected, .. } => Some(selected),
        }
    }

    /// 主持人打开的门序号
    pub fn revealed_door(&self) -> Option<usize> {
        match self.stage {
            Stage::Revealed { revealed, .. } | Stage::Decided { revealed, .. } => Some(revealed),
            _ => None,
        }
    }

    pub fn decision(&self) -> Option<Decision> {
        match self.stage {
            Stage::Decided { decision, .. } => Some(decision),
            _ => None,
        }
    }

    /// 最终打开的门序号
    pub fn final_choice(&self) -> Option<usize> {
        self.decision().map(|d| d.final_choice)
    }

    pub fn did_switch(&self) -> bool {
        self.decision().map_or(false, |d| d.did_switch())
    }

    /// 挑战者选门
    pub fn select_door(&mut self, index: usize) -> Result<()> {
        if index >= DOOR_COUNT {
            return Err(Error::InvalidInput);
        }

        if let Stage::Initial = self.stage {
            self.stage = Stage::Selected { selected: index };
            debug!(door = index, "door selected");
            Ok(())
        } else {
            Err(Error::InvalidState)
        }
    }

    /// 主持人随机揭示：打开一扇既不是挑战者所选、也没有奖杯的门
    pub fn host_reveal<R: Rng + ?Sized>(&mut self, rng: &mut R) -> Result<Reveal> {
        if let Stage::Selected { selected } = self.stage {
            let trophy = self.doors.trophy();
            let revealed = if selected == trophy {
                random_door(rng, selected)
            } else {
                remaining_door(selected, trophy)
            };
            Ok(self.open(selected, revealed))
        } else {
            Err(Error::InvalidState)
        }
    }

    /// 主持人揭示指定的门
    pub fn reveal(&mut self, revealed: usize) -> Result<Reveal> {
        if revealed >= DOOR_COUNT {
            return Err(Error::InvalidInput);
        }

        if let Stage::Selected { selected } = self.stage {
            // 不能打开挑战者已经选择的门，也不能打开有奖杯的门
            if revealed == selected || self.doors[revealed] == Content::Trophy {
                Err(Error::InvalidInput)
            } else {
                Ok(self.open(selected, revealed))
            }
        } else {
            Err(Error::InvalidState)
        }
    }

    fn open(&mut self, selected: usize, revealed: usize) -> Reveal {
        let content = self.doors[revealed];
        self.stage = Stage::Revealed { selected, revealed };
        debug!(door = revealed, %content, "host revealed door");
        Reveal {
            revealed_door: revealed,
            content,
            icon: content.icon(),
        }
    }

    /// 挑战者做出最终抉择
    pub fn decide(&mut self, strategy: Strategy) -> Result<Decision> {
        if let Stage::Revealed { selected, revealed } = self.stage {
            let final_choice = match strategy {
                Strategy::Stay => selected,
                Strategy::Switch => remaining_door(selected, revealed),
            };
            let content = self.doors[final_choice];
            let outcome = match content {
                Content::Trophy => Some(Outcome::Win),
                Content::Loss => Some(Outcome::Loss),
                Content::Retry => None,
            };
            let decision = Decision {
                final_choice,
                content,
                strategy,
                outcome,
            };
            self.stage = Stage::Decided {
                selected,
                revealed,
                decision,
            };
            debug!(door = final_choice, ?strategy, ?outcome, "round decided");
            Ok(decision)
        } else {
            Err(Error::InvalidState)
        }
    }
}

// 在 [0, DOOR_COUNT) 范围内生成 exclusive 之外的随机门序号
fn random_door<R: Rng + ?Sized>(rng: &mut R, exclusive: usize) -> usize {
    assert!(exclusive < DOOR_COUNT, "exclusive = {}", exclusive);

    let random = rng.gen_range(0..DOOR_COUNT - 1);

    if random >= exclusive {
        random + 1
    } else {
        random
    }
}

// 三扇门中既不是 a 也不是 b 的那一扇
fn remaining_door(a: usize, b: usize) -> usize {
    debug_assert!(a != b && a < DOOR_COUNT && b < DOOR_COUNT);
    3 - a - b
}
