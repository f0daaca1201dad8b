use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use battle_engine::history::{HistoryStore, JsonLinesHistory, MemoryHistory};
use battle_engine::scheduler::{Scheduler, TokioScheduler, VirtualScheduler};
use battle_engine::session::{BattleController, TimerEvent};
use battle_engine::{BattleConfig, JsonCatalog, RandomSource, SeededRandom, Side};
use clap::Args;

/// Upper bound on timer events for one instant battle
const MAX_EVENTS: usize = 100_000;

#[derive(Args, Debug)]
pub struct RunArgs {
    /// Creature catalog (JSON)
    #[arg(short, long, default_value = "data/catalog.json")]
    pub catalog: PathBuf,

    /// Player creature id
    #[arg(short, long)]
    pub player: String,

    /// Opponent creature id
    #[arg(short, long)]
    pub opponent: String,

    /// Append the result to this history log
    #[arg(long)]
    pub history: Option<PathBuf>,

    /// Seed for reproducible battles
    #[arg(short, long)]
    pub seed: Option<u64>,

    /// Wait out the real animation delays
    #[arg(long)]
    pub realtime: bool,

    /// Engine configuration (JSON)
    #[arg(long)]
    pub config: Option<PathBuf>,
}

pub async fn execute(args: RunArgs) -> Result<()> {
    let mut config = match &args.config {
        Some(path) => BattleConfig::from_file(path)?,
        None => BattleConfig::default(),
    }
    .with_env_overrides();
    // Both sides play themselves
    config.player_auto = true;
    config.opponent_auto = true;

    let rng = match args.seed {
        Some(seed) => SeededRandom::new(seed),
        None => SeededRandom::from_entropy(),
    };
    let history: Box<dyn HistoryStore> = match &args.history {
        Some(path) => Box::new(
            JsonLinesHistory::open(path)
                .with_context(|| format!("opening history {}", path.display()))?,
        ),
        None => Box::new(MemoryHistory::new()),
    };
    let catalog = JsonCatalog::new(&args.catalog);

    if args.realtime {
        let (scheduler, mut events) = TokioScheduler::<TimerEvent>::new();
        let mut ctl = BattleController::new(config, scheduler, rng, history);
        ctl.start_from_catalog(&catalog, &args.player, &args.opponent)
            .await?;

        let mut printer = BannerPrinter::default();
        printer.show(&ctl);
        while !ctl.session().is_finished() {
            let Some((id, event)) = events.recv().await else {
                bail!("timer channel closed before the battle finished");
            };
            ctl.scheduler_mut().acknowledge(id);
            ctl.handle(event);
            printer.show(&ctl);
        }
        finish(&mut ctl)
    } else {
        let mut ctl = BattleController::new(config, VirtualScheduler::new(), rng, history);
        ctl.start_from_catalog(&catalog, &args.player, &args.opponent)
            .await?;

        let mut printer = BannerPrinter::default();
        printer.show(&ctl);
        for _ in 0..MAX_EVENTS {
            if ctl.session().is_finished() {
                break;
            }
            let Some(event) = ctl.scheduler_mut().advance_to_next() else {
                bail!("battle stalled in {}", ctl.session().phase());
            };
            ctl.handle(event);
            printer.show(&ctl);
        }
        finish(&mut ctl)
    }
}

/// Prints the banner whenever it changes.
#[derive(Default)]
struct BannerPrinter {
    last: String,
}

impl BannerPrinter {
    fn show<S, R, H>(&mut self, ctl: &BattleController<S, R, H>)
    where
        S: Scheduler<TimerEvent>,
        R: RandomSource,
        H: HistoryStore,
    {
        let session = ctl.session();
        let banner = session.banner();
        if banner.is_empty() || banner == self.last {
            return;
        }
        println!(
            "[{:>3} | {:>3}] {}",
            session.health(Side::Player),
            session.health(Side::Opponent),
            banner
        );
        self.last = banner.to_string();
    }
}

fn finish<S, R, H>(ctl: &mut BattleController<S, R, H>) -> Result<()>
where
    S: Scheduler<TimerEvent>,
    R: RandomSource,
    H: HistoryStore,
{
    println!();
    println!("Battle log:");
    for line in ctl.session().log().iter() {
        println!("  {line}");
    }

    let Some(record) = ctl.end_session() else {
        bail!("battle did not finish");
    };
    println!();
    println!("{} defeated {}", record.winner, record.loser);
    Ok(())
}
