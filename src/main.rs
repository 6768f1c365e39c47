//! Interest Rate Swap Core Simulation.
//!
//! Runs the pricing core through a short lifecycle: index publication, spread
//! quotes, swap opens, SOAP valuation as the index moves, and closes.
//! Pass a TOML file path to override the default pricing config.
//! Set RUST_LOG=ipor_core=debug to see every index update and quote.

use ipor_core::*;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use std::error::Error;
use tracing_subscriber::EnvFilter;

const UPDATER: UpdaterId = UpdaterId(1);
const DAY: u64 = 86_400;

fn main() -> Result<(), Box<dyn Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("ipor_core=info")))
        .init();

    let pricing = match std::env::args().nth(1) {
        Some(path) => PricingConfig::load(path)?,
        None => PricingConfig::default(),
    };

    println!("Interest Rate Swap Core Simulation");
    println!("Index Oracle, SOAP Valuation, Spread Pricing\n");

    scenario_1_index_accrual(&pricing)?;
    scenario_2_quotes_and_saturation(&pricing)?;
    scenario_3_swap_lifecycle(&pricing)?;

    println!("\nAll simulations completed successfully.");
    Ok(())
}

fn wad(value: Decimal) -> Result<Wad, Box<dyn Error>> {
    Wad::from_decimal(value).ok_or_else(|| format!("{} does not fit a Wad", value).into())
}

fn new_engine(pricing: &PricingConfig) -> Result<Engine, Box<dyn Error>> {
    let mut engine = Engine::new(EngineConfig::default(), pricing)?;
    engine.set_time(Timestamp(0));
    engine.add_updater(UPDATER);
    for asset in &pricing.assets {
        engine.register_asset(asset.clone())?;
    }
    Ok(engine)
}

/// Index published daily, IBT price and statistics accrue in between.
fn scenario_1_index_accrual(pricing: &PricingConfig) -> Result<(), Box<dyn Error>> {
    println!("Scenario 1: Index Accrual\n");

    let mut engine = new_engine(pricing)?;
    let dai = AssetConfig::dai().id;

    for rate in [dec!(0.03), dec!(0.035), dec!(0.05), dec!(0.04)] {
        let state = engine.update_index(UPDATER, dai, wad(rate)?)?;
        println!(
            "  day {:>2}: index {}, ibt price {}, ema {}, ewmv {}",
            engine.time().as_secs() / DAY,
            state.index_value,
            state.ibt_price(),
            state.exponential_moving_average,
            state.exponential_weighted_moving_variance
        );
        engine.advance_time(DAY);
    }

    let accrued = engine.oracle().accrued_ibt_price(dai, engine.time())?;
    println!("  accrued ibt price one day after the last update: {}\n", accrued);
    Ok(())
}

/// Spread climbs with utilization and hits the cap at the ceiling.
fn scenario_2_quotes_and_saturation(pricing: &PricingConfig) -> Result<(), Box<dyn Error>> {
    println!("Scenario 2: Spread vs Utilization\n");

    let mut engine = new_engine(pricing)?;
    let usdc = AssetConfig::usdc().id;
    engine.update_index(UPDATER, usdc, wad(dec!(0.04))?)?;
    engine.deposit_liquidity(usdc, Wad::from_int(1_000_000))?;

    for notional in [10_000u64, 250_000, 500_000, 900_000, 1_000_000] {
        let quote = engine.quote_swap(usdc, Direction::PayFixed, Wad::from_int(notional))?;
        println!(
            "  pay fixed {:>9}: spread {}, rate {} (demand {}, at par {})",
            notional, quote.spread, quote.fixed_rate, quote.demand, quote.at_par
        );
    }
    println!();
    Ok(())
}

/// Open both legs, move the index, value, then close.
fn scenario_3_swap_lifecycle(pricing: &PricingConfig) -> Result<(), Box<dyn Error>> {
    println!("Scenario 3: Swap Lifecycle\n");

    let mut engine = new_engine(pricing)?;
    let usdt = AssetConfig::usdt().id;
    engine.update_index(UPDATER, usdt, wad(dec!(0.04))?)?;
    engine.deposit_liquidity(usdt, Wad::from_int(500_000))?;

    let pay = engine.open_swap(usdt, Direction::PayFixed, Wad::from_int(100_000))?;
    let receive = engine.open_swap(usdt, Direction::ReceiveFixed, Wad::from_int(60_000))?;
    println!("  opened pay fixed {} @ {}", pay.swap.notional, pay.swap.fixed_rate);
    println!("  opened receive fixed {} @ {}", receive.swap.notional, receive.swap.fixed_rate);
    println!("  soap at open: {}", engine.calculate_soap(usdt)?.total);

    engine.advance_time(7 * DAY);
    engine.update_index(UPDATER, usdt, wad(dec!(0.08))?)?;
    engine.advance_time(7 * DAY);

    let soap = engine.calculate_soap(usdt)?;
    let aggregate = engine.indicator_soap(usdt)?;
    println!("  after the index doubles, 14 days in:");
    println!("    pay fixed {}, receive fixed {}, total {}", soap.pay_fixed, soap.receive_fixed, soap.total);
    println!("    from indicators: total {}", aggregate.total);

    for id in [pay.swap.id, receive.swap.id] {
        let closed = engine.close_swap(id)?;
        println!(
            "  closed {:?} {}: payoff {} ({} in token units)",
            id, closed.swap.direction, closed.payoff, closed.settlement_amount
        );
    }

    let balance = engine.asset(usdt).map(|s| s.liquidity_pool_balance).unwrap_or(Wad::ZERO);
    println!("  pool balance after settlement: {}", balance);
    println!("  {} events recorded", engine.events().len());
    Ok(())
}
