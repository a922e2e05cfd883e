use clap::{Parser, Subcommand, ValueEnum};
use montyhall::*;
use rand::rngs::StdRng;
use rand::SeedableRng;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::warn;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "montyhall", version, about = "三门问题（可选“重来”门）")]
struct Args {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// 无延迟批量模拟并输出统计
    Simulate {
        /// 有效游戏轮数（不含重来）
        #[arg(short, long, default_value_t = 100000)]
        rounds: u32,

        /// 每轮的抉择方式
        #[arg(short, long, value_enum, default_value = "random")]
        plan: PlanArg,

        /// 启用“重来”门
        #[arg(long)]
        retry: bool,

        /// 随机数种子
        #[arg(long)]
        seed: Option<u64>,
    },

    /// 在终端中游玩
    Play {
        /// 经典模式（不含“重来”门）
        #[arg(long)]
        classic: bool,

        /// 去掉主持人揭示和重来前的等待
        #[arg(long)]
        headless: bool,
    },
}

#[derive(Debug, Copy, Clone, ValueEnum)]
enum PlanArg {
    Switch,
    Stay,
    Random,
}

impl From<PlanArg> for Plan {
    fn from(plan: PlanArg) -> Self {
        match plan {
            PlanArg::Switch => Plan::Switch,
            PlanArg::Stay => Plan::Stay,
            PlanArg::Random => Plan::Random,
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(std::io::stderr)
        .init();

    match Args::parse().command {
        Command::Simulate {
            rounds,
            plan,
            retry,
            seed,
        } => simulate(rounds, plan.into(), Mode::new(retry), seed),
        Command::Play { classic, headless } => {
            let pacing = if headless {
                Pacing::headless()
            } else {
                Config::from_env()?.pacing()
            };
            play(Mode::new(!classic), pacing).await
        }
    }
}

fn simulate(rounds: u32, plan: Plan, mode: Mode, seed: Option<u64>) -> anyhow::Result<()> {
    let rng = match seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };
    let mut game = Game::with_rng(mode, rng);
    let result = game.simulate(rounds, plan)?;

    let switch = result.switch_wins + result.switch_losses;
    let stay = result.stay_wins + result.stay_losses;
    println!(
        "游戏设置: {}，进行了 {} 轮有效游戏；",
        mode_name(mode),
        rounds
    );
    if mode.retry_enabled {
        println!("途中打开“重来”门 {} 次；", result.retries);
    }
    println!(
        "坚持选择 {} 轮，坚持后赢得奖杯 {} 轮，坚持选择胜率 {:.2}%；",
        stay, result.stay_wins, result.stay_rate
    );
    println!(
        "改变选择 {} 轮，改变后赢得奖杯 {} 轮，改变选择胜率 {:.2}%。",
        switch, result.switch_wins, result.switch_rate
    );

    Ok(())
}

async fn play(mode: Mode, pacing: Pacing) -> anyhow::Result<()> {
    let mut table = Table::new(Game::new(mode), pacing);
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    println!("输入 1/2/3 选门，s 改变选择，k 坚持选择，n 再玩一次，r 清空统计，m 切换模式，q 退出。");
    println!("当前模式：{}", mode_name(table.game().mode()));
    print_doors(table.game().round());

    while let Some(line) = lines.next_line().await? {
        match line.trim() {
            input @ ("1" | "2" | "3") => {
                let index = input.parse::<usize>()? - 1;
                if let Err(e) = table.select_door(index) {
                    warn!(%e, door = index, "selection ignored");
                    continue;
                }
                print_doors(table.game().round());
                println!("主持人正在查看各扇门……");
                let reveal = table.reveal().await?;
                print_doors(table.game().round());
                println!(
                    "主持人打开了 {} 号门：{}。要改变选择吗？（s 改变 / k 坚持 {} 号门）",
                    reveal.revealed_door + 1,
                    reveal.icon,
                    index + 1
                );
            }
            input @ ("s" | "k") => {
                let decision = match table.decide(Strategy::from(input == "s")) {
                    Ok(decision) => decision,
                    Err(e) => {
                        warn!(%e, "decision ignored");
                        continue;
                    }
                };
                print_doors(table.game().round());
                let how = if decision.did_switch() {
                    "（改变选择）"
                } else {
                    "（坚持选择）"
                };
                match decision.outcome {
                    None => {
                        println!("🔄 免费重来！即将开始新一轮……");
                        print_stats(&table);
                        table.restart_after_retry().await?;
                        print_doors(table.game().round());
                    }
                    Some(Outcome::Win) => {
                        println!("🏆 赢得奖杯！{how}");
                        print_stats(&table);
                        println!("输入 n 再玩一次。");
                    }
                    Some(Outcome::Loss) => {
                        println!("❌ 没有中奖！{how}");
                        print_stats(&table);
                        println!("输入 n 再玩一次。");
                    }
                }
            }
            "n" => {
                table.game_mut().new_round();
                print_doors(table.game().round());
            }
            "r" => {
                table.game_mut().reset_statistics();
                print_stats(&table);
            }
            "m" => {
                table.game_mut().toggle_mode();
                println!("当前模式：{}，统计已清空。", mode_name(table.game().mode()));
                print_doors(table.game().round());
            }
            "q" => break,
            "" => {}
            other => println!("无法识别的指令：{other}"),
        }
    }

    print_stats(&table);
    Ok(())
}

fn mode_name(mode: Mode) -> &'static str {
    if mode.retry_enabled {
        "重来模式（一个奖杯、一个重来、一个空门）"
    } else {
        "经典模式（一个奖杯、两个空门）"
    }
}

fn print_doors(round: &Round) {
    let doors: Vec<String> = (0..DOOR_COUNT)
        .map(|i| {
            let opened = round.revealed_door() == Some(i) || round.final_choice() == Some(i);
            let label = if opened {
                round.doors()[i].icon().to_string()
            } else {
                (i + 1).to_string()
            };
            if round.final_choice().or(round.selected_door()) == Some(i) {
                format!("[{label}]")
            } else {
                format!(" {label} ")
            }
        })
        .collect();
    println!("{}", doors.join(" "));
}

fn print_stats<R: rand::Rng>(table: &Table<R>) {
    let stats = table.game().statistics();
    println!(
        "改变选择：赢 {} 输 {}（{:.1}%）；坚持选择：赢 {} 输 {}（{:.1}%）",
        stats.switch_wins,
        stats.switch_losses,
        stats.switch_rate,
        stats.stay_wins,
        stats.stay_losses,
        stats.stay_rate
    );
    if table.game().mode().retry_enabled {
        println!("重来次数：{}", stats.retries);
    }
}
