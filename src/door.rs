use crate::error::*;
use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::fmt;

/// 门的数量
pub const DOOR_COUNT: usize = 3;

/// 门后的内容
#[derive(Debug, Serialize, Deserialize, Copy, Clone, Eq, PartialEq, Hash)]
pub enum Content {
    /// 奖杯
    Trophy,

    /// 重来一次
    Retry,

    /// 未中奖
    Loss,
}

impl Content {
    /// 内容对应的图标
    pub fn icon(self) -> &'static str {
        match self {
            Content::Trophy => "🏆",
            Content::Retry => "🔄",
            Content::Loss => "❌",
        }
    }
}

impl fmt::Display for Content {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.icon())
    }
}

pub fn icon_for(content: Content) -> &'static str {
    content.icon()
}

/// 游戏模式
#[derive(Debug, Serialize, Deserialize, Copy, Clone, Eq, PartialEq)]
pub struct Mode {
    /// 是否启用“重来一次”门
    pub retry_enabled: bool,
}

impl Mode {
    pub fn new(retry_enabled: bool) -> Self {
        Self { retry_enabled }
    }

    /// 经典模式：一个奖杯，两个空门
    pub fn classic() -> Self {
        Self::new(false)
    }

    /// 重来模式：一个奖杯，一个重来，一个空门
    pub fn with_retry() -> Self {
        Self::new(true)
    }

    /// 本模式下洗牌前的门内容
    fn contents(self) -> [Content; DOOR_COUNT] {
        if self.retry_enabled {
            [Content::Trophy, Content::Retry, Content::Loss]
        } else {
            [Content::Trophy, Content::Loss, Content::Loss]
        }
    }
}

impl Default for Mode {
    fn default() -> Self {
        Self::with_retry()
    }
}

/// 一轮游戏中三扇门后的内容，轮内不可变
#[derive(Debug, Serialize, Deserialize, Copy, Clone, Eq, PartialEq)]
#[serde(try_from = "[Content; DOOR_COUNT]")]
pub struct DoorSet([Content; DOOR_COUNT]);

impl DoorSet {
    /// 按指定内容构造，内容组合必须合法：
    /// 恰好一个奖杯，其余为一个重来加一个空门，或两个空门
    pub fn new(contents: [Content; DOOR_COUNT]) -> Result<Self> {
        let count = |c: Content| contents.iter().filter(|&&x| x == c).count();
        match (count(Content::Trophy), count(Content::Retry), count(Content::Loss)) {
            (1, 1, 1) | (1, 0, 2) => Ok(Self(contents)),
            _ => Err(Error::InvalidInput),
        }
    }

    /// 按模式生成并均匀随机洗牌
    pub fn shuffled<R: Rng + ?Sized>(mode: Mode, rng: &mut R) -> Self {
        let mut contents = mode.contents();
        contents.shuffle(rng);
        Self(contents)
    }

    /// 指定门后的内容
    pub fn get(&self, index: usize) -> Option<Content> {
        self.0.get(index).copied()
    }

    /// 奖杯所在门序号
    pub fn trophy(&self) -> usize {
        self.0
            .iter()
            .position(|&c| c == Content::Trophy)
            .unwrap_or_default()
    }

    /// 由内容组合推出的模式
    pub fn mode(&self) -> Mode {
        Mode::new(self.0.contains(&Content::Retry))
    }

    pub fn contents(&self) -> &[Content; DOOR_COUNT] {
        &self.0
    }
}

impl TryFrom<[Content; DOOR_COUNT]> for DoorSet {
    type Error = Error;

    fn try_from(contents: [Content; DOOR_COUNT]) -> Result<Self> {
        Self::new(contents)
    }
}

impl std::ops::Index<usize> for DoorSet {
    type Output = Content;

    fn index(&self, index: usize) -> &Content {
        &self.0[index]
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use std::collections::HashMap;

    fn count(doors: &DoorSet, content: Content) -> usize {
        doors.contents().iter().filter(|&&c| c == content).count()
    }

    #[test]
    fn shuffled_keeps_composition() {
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..1000 {
            let doors = DoorSet::shuffled(Mode::with_retry(), &mut rng);
            assert_eq!(count(&doors, Content::Trophy), 1);
            assert_eq!(count(&doors, Content::Retry), 1);
            assert_eq!(count(&doors, Content::Loss), 1);
            assert_eq!(doors.mode(), Mode::with_retry());

            let doors = DoorSet::shuffled(Mode::classic(), &mut rng);
            assert_eq!(count(&doors, Content::Trophy), 1);
            assert_eq!(count(&doors, Content::Loss), 2);
            assert_eq!(doors.mode(), Mode::classic());
        }
    }

    #[test]
    fn shuffle_covers_all_permutations_evenly() {
        let mut rng = StdRng::seed_from_u64(11);
        let trials = 60_000;
        let mut seen: HashMap<[Content; DOOR_COUNT], u32> = HashMap::new();
        for _ in 0..trials {
            let doors = DoorSet::shuffled(Mode::with_retry(), &mut rng);
            *seen.entry(*doors.contents()).or_default() += 1;
        }
        assert_eq!(seen.len(), 6);
        let expected = trials as f64 / 6.0;
        for n in seen.values() {
            assert!((*n as f64 - expected).abs() < expected * 0.05, "{seen:?}");
        }
    }

    #[test]
    fn new_rejects_bad_composition() {
        use Content::*;
        assert!(DoorSet::new([Loss, Trophy, Loss]).is_ok());
        assert!(DoorSet::new([Trophy, Retry, Loss]).is_ok());
        assert_eq!(DoorSet::new([Trophy, Trophy, Loss]), Err(Error::InvalidInput));
        assert_eq!(DoorSet::new([Loss, Loss, Loss]), Err(Error::InvalidInput));
        assert_eq!(DoorSet::new([Trophy, Retry, Retry]), Err(Error::InvalidInput));
    }

    #[test]
    fn deserialize_checks_composition() {
        let doors: DoorSet = serde_json::from_str(r#"["Loss","Retry","Trophy"]"#).unwrap();
        assert_eq!(doors.trophy(), 2);
        assert_eq!(doors.mode(), Mode::with_retry());
        assert_eq!(serde_json::to_string(&doors).unwrap(), r#"["Loss","Retry","Trophy"]"#);

        assert!(serde_json::from_str::<DoorSet>(r#"["Trophy","Trophy","Loss"]"#).is_err());
        assert!(serde_json::from_str::<DoorSet>(r#"["Loss","Loss","Loss"]"#).is_err());
    }

    #[test]
    fn icons() {
        assert_eq!(icon_for(Content::Trophy), "🏆");
        assert_eq!(icon_for(Content::Retry), "🔄");
        assert_eq!(icon_for(Content::Loss), "❌");
        assert_eq!(DoorSet::new([Content::Loss, Content::Trophy, Content::Loss]).map(|d| d.trophy()), Ok(1));
    }
}
