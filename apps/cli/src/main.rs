#![deny(warnings)]

//! Headless CLI: drives a scripted session against a file-backed engine and
//! prints the resulting progression state. Useful for balancing passes and
//! for eyeballing save/load behavior across runs.

use anyhow::Result;
use game_core::ResourceKind;
use persistence::FileStore;
use progression::Engine;
use tracing::{info, Level};
use tracing_subscriber::EnvFilter;

fn parse_args() -> (String, u32, bool) {
    let mut save_dir = "./saves".to_string();
    let mut ticks: u32 = 60;
    let mut reset = false;
    let mut it = std::env::args().skip(1);
    while let Some(arg) = it.next() {
        match arg.as_str() {
            "--save-dir" => {
                if let Some(v) = it.next() {
                    save_dir = v;
                }
            }
            "--ticks" => ticks = it.next().and_then(|s| s.parse().ok()).unwrap_or(ticks),
            "--reset" => reset = true,
            _ => {}
        }
    }
    (save_dir, ticks, reset)
}

/// Income per simulated second before multipliers; stands in for actual
/// object destruction, which lives in the rendering layer.
const BASE_INCOME: f64 = 25.0;

fn main() -> Result<()> {
    // Logging setup
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_max_level(Level::INFO)
        .init();

    let (save_dir, ticks, reset) = parse_args();
    info!(%save_dir, ticks, reset, "starting CLI");

    let mut engine = Engine::new(FileStore::new(&save_dir))?;
    if reset {
        engine.reset();
    }

    let buy_order = [
        "plasma_cutter",
        "appraisal",
        "tractor_beam",
        "spawn_bay",
        "scrap_magnet",
        "salvage_rig",
        "auto_trader",
        "orbital_bank",
    ];
    for _ in 0..ticks {
        let stats = *engine.state().stats();
        let income = BASE_INCOME
            * stats.object_value
            * stats.value_multiplier
            * stats.market_multiplier;
        engine.add_resource(ResourceKind::Credits, income);
        engine.add_resource(ResourceKind::Scrap, 3.0 * stats.material_drop_chance / 0.05);
        engine.add_resource(ResourceKind::Crystal, 0.2);
        for id in buy_order {
            if engine.can_unlock(id) {
                engine.unlock(id);
            }
        }
        engine.tick_passive(1.0);
        while let Some(name) = engine.check_achievements() {
            println!("Achievement unlocked: {name}");
        }
    }

    let state = engine.state();
    println!(
        "Session OK | ticks: {} | credits: {:.0} (lifetime {:.0}) | scrap: {:.0} | crystal: {:.0}",
        ticks,
        state.resource(ResourceKind::Credits),
        state.lifetime(ResourceKind::Credits),
        state.resource(ResourceKind::Scrap),
        state.resource(ResourceKind::Crystal),
    );
    println!(
        "Stats | levels: {} | value x{:.2} | market x{:.2} | spawn every {:.2}s | cap: {}",
        state.total_levels(),
        state.stats().value_multiplier,
        state.stats().market_multiplier,
        state.stats().spawn_interval_secs,
        state.stats().max_objects,
    );
    for node in state.nodes() {
        let cost = node.cost();
        let cost_str = if cost.is_finite() {
            format!("{cost:.0}")
        } else {
            "MAX".to_string()
        };
        println!(
            "  {:<14} level {:>2}/{:<2} next: {}",
            node.def().id.0,
            node.level(),
            node.def().max_level,
            cost_str
        );
    }
    let unlocked = state.achievements().iter().filter(|a| a.unlocked()).count();
    println!(
        "Achievements | {}/{} unlocked",
        unlocked,
        state.achievements().len()
    );

    Ok(())
}
