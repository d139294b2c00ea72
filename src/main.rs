//! TradeCopilot CLI
//!
//! Position sizing, trade journal, analytics and the New York session
//! countdown from the command line.

use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use chrono::{Datelike, Local, NaiveDate};
use clap::{Parser, Subcommand};
use rust_decimal::Decimal;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

use tradecopilot::config::AppConfig;
use tradecopilot::journal::JournalStore;
use tradecopilot::metrics::calendar::{self, CalendarCell};
use tradecopilot::metrics::{MetricsCalculator, MonthKey};
use tradecopilot::models::{Direction, JournalTrade, TradeContext, TradeStatus, TradingSession};
use tradecopilot::session::{to_new_york, SessionClock};
use tradecopilot::trading::{PositionRequest, PositionSizer, RiskType};

/// Trading journal and position-sizing calculator.
#[derive(Parser)]
#[command(name = "tradecopilot")]
#[command(about = "Size positions, journal trades, review performance", long_about = None)]
struct Cli {
    /// Journal file path
    #[arg(short, long, env = "TRADECOPILOT_JOURNAL", default_value = tradecopilot::config::DEFAULT_JOURNAL_PATH)]
    journal: PathBuf,

    /// JSON instrument list replacing the built-in table
    #[arg(short, long, env = "TRADECOPILOT_INSTRUMENTS")]
    instruments: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, env = "TRADECOPILOT_LOG", default_value = "info")]
    log_level: String,

    #[command(subcommand)]
    command: Commands,
}

/// Strategy context flags shared by `size --save` and `log`.
#[derive(clap::Args, Debug, Default)]
struct ContextArgs {
    /// Setup name (e.g. "BOS OB", "CHOCH BB")
    #[arg(long)]
    strategy: Option<String>,

    /// Entry timeframe (M1, M5, M15, H1, H4)
    #[arg(long)]
    timeframe: Option<String>,

    /// H4 trend (e.g. bullish, bearish, range)
    #[arg(long)]
    trend_h4: Option<String>,

    /// M15 trend
    #[arg(long)]
    trend_m15: Option<String>,

    /// M1 trend
    #[arg(long)]
    trend_m1: Option<String>,
}

impl From<ContextArgs> for TradeContext {
    fn from(args: ContextArgs) -> Self {
        TradeContext {
            strategy: args.strategy,
            timeframe: args.timeframe,
            trend_h4: args.trend_h4,
            trend_m15: args.trend_m15,
            trend_m1: args.trend_m1,
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Size a position from risk and stop distance
    Size {
        /// Instrument symbol
        #[arg(short, long)]
        asset: Option<String>,

        /// long or short
        #[arg(short, long)]
        direction: Option<Direction>,

        /// Entry price
        #[arg(short, long)]
        entry: f64,

        /// Stop-loss distance in pips
        #[arg(long)]
        sl_pips: f64,

        /// Take-profit distance in pips (0 = none)
        #[arg(long, default_value = "0")]
        tp_pips: f64,

        /// Risk, as an amount or a percentage depending on --risk-type
        #[arg(short, long)]
        risk: f64,

        /// amount or percentage
        #[arg(long)]
        risk_type: Option<RiskType>,

        /// Account balance
        #[arg(short, long)]
        balance: Option<f64>,

        /// Log the sized position in the journal as an open trade
        #[arg(long)]
        save: bool,

        /// Session recorded with the saved trade
        #[arg(long)]
        session: Option<TradingSession>,

        /// Trade date (YYYY-MM-DD), defaults to today
        #[arg(long)]
        date: Option<NaiveDate>,

        #[command(flatten)]
        context: ContextArgs,
    },

    /// List the instrument table
    Instruments,

    /// Log a trade manually
    Log {
        /// Instrument symbol
        #[arg(short, long)]
        asset: String,

        /// long or short
        #[arg(short, long)]
        direction: Direction,

        /// Entry price
        #[arg(short, long)]
        entry: f64,

        /// Size in lots
        #[arg(short, long)]
        size: f64,

        /// Trade date (YYYY-MM-DD), defaults to today
        #[arg(long)]
        date: Option<NaiveDate>,

        /// New York, London or Asian
        #[arg(long)]
        session: Option<TradingSession>,

        /// Realized P&L; logs the trade as already closed
        #[arg(long, allow_hyphen_values = true)]
        pnl: Option<f64>,

        /// Free-form notes
        #[arg(long)]
        notes: Option<String>,

        #[command(flatten)]
        context: ContextArgs,
    },

    /// Close an open trade with its realized P&L
    Close {
        /// Trade id
        id: String,

        /// Realized P&L
        #[arg(long, allow_hyphen_values = true)]
        pnl: f64,
    },

    /// Delete a trade from the journal
    Remove {
        /// Trade id
        id: String,
    },

    /// List journal trades, newest first
    Journal {
        /// Maximum number of trades to show
        #[arg(short = 'n', long, default_value = "50")]
        limit: usize,
    },

    /// Show performance statistics
    Stats,

    /// Show the monthly P&L calendar
    Calendar {
        /// Month to show (YYYY-MM), defaults to the current month
        #[arg(short, long)]
        month: Option<MonthKey>,
    },

    /// Show the New York session countdown
    Session {
        /// Refresh every second until Ctrl+C
        #[arg(short, long)]
        watch: bool,
    },

    /// Show current configuration
    Config,
}

#[tokio::main]
async fn main() -> Result<()> {
    let _ = dotenvy::dotenv();
    let cli = Cli::parse();

    // Setup logging
    let log_level = match cli.log_level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_target(false)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let config = AppConfig {
        journal_path: cli.journal,
        instruments_path: cli.instruments,
        ..Default::default()
    };

    match cli.command {
        Commands::Size {
            asset,
            direction,
            entry,
            sl_pips,
            tp_pips,
            risk,
            risk_type,
            balance,
            save,
            session,
            date,
            context,
        } => {
            let defaults = &config.trading;
            let asset = asset.unwrap_or_else(|| defaults.asset.clone());
            let sizer = PositionSizer::new(config.instruments()?);

            let Some(instrument) = sizer.instruments().get(&asset).cloned() else {
                bail!(
                    "Unknown instrument {} (available: {})",
                    asset,
                    sizer.instruments().symbols().join(", ")
                );
            };

            let request = PositionRequest {
                direction: direction.unwrap_or(defaults.direction),
                entry_price: to_decimal("entry", entry)?,
                stop_loss_pips: to_decimal("sl-pips", sl_pips)?,
                take_profit_pips: to_decimal("tp-pips", tp_pips)?,
                account_balance: match balance {
                    Some(b) => to_decimal("balance", b)?,
                    None => defaults.account_balance,
                },
                risk_amount: to_decimal("risk", risk)?,
                risk_type: risk_type.unwrap_or(defaults.risk_type),
            };

            let result = sizer.size(&instrument.symbol, &request);

            println!("\n=== {} {} @ {} ===", instrument.label, request.direction, request.entry_price);
            println!("{}", result);

            if !request.is_complete() {
                println!("\nNot computable yet: entry, stop-loss pips, risk and balance must all be positive.");
            } else if !result.is_computable() {
                println!(
                    "\nSize rounds to 0.00 lots: risk is too small for a {} pip stop.",
                    request.stop_loss_pips
                );
            } else {
                let balance = request.account_balance;
                println!(
                    "\nRisk:    {} pips / ${} / {}%",
                    request.stop_loss_pips,
                    result.risk_in_currency(balance),
                    result.risk_percentage
                );
                println!(
                    "Reward:  {} pips / ${} / {}%",
                    request.take_profit_pips.max(Decimal::ZERO),
                    result.reward_in_currency(balance),
                    result.reward_percentage()
                );
            }

            if save {
                let trade = JournalTrade::planned(
                    date.unwrap_or_else(today),
                    &instrument.symbol,
                    request.direction,
                    request.entry_price,
                    result.position_size,
                    session.unwrap_or(defaults.session),
                )?
                .with_context(context.into());

                let mut store = JournalStore::open(&config.journal_path).await?;
                let id = trade.id.clone();
                store.add(trade).await?;
                println!("\nSaved to journal as open trade {}", id);
            }
        }

        Commands::Instruments => {
            let table = config.instruments()?;

            println!("\n{:<10} {:<12} {:>10} {:>10}", "SYMBOL", "NAME", "PIP VALUE", "PIP SIZE");
            println!("{}", "-".repeat(45));
            for instrument in table.iter() {
                println!(
                    "{:<10} {:<12} {:>10} {:>10}",
                    instrument.symbol,
                    truncate(&instrument.label, 12),
                    instrument.pip_value,
                    instrument.pip_size
                );
            }
        }

        Commands::Log {
            asset,
            direction,
            entry,
            size,
            date,
            session,
            pnl,
            notes,
            context,
        } => {
            let entry = to_decimal("entry", entry)?;
            let size = to_decimal("size", size)?;
            if entry <= Decimal::ZERO || size <= Decimal::ZERO {
                bail!("Entry price and size must both be positive");
            }

            let mut trade = JournalTrade::new(
                date.unwrap_or_else(today),
                &asset,
                direction,
                entry,
                size,
                session.unwrap_or(config.trading.session),
            )
            .with_context(context.into());
            trade.notes = notes;

            if let Some(pnl) = pnl {
                trade.close(to_decimal("pnl", pnl)?)?;
            }

            let mut store = JournalStore::open(&config.journal_path).await?;
            let id = trade.id.clone();
            store.add(trade).await?;
            println!("Logged trade {}", id);
        }

        Commands::Close { id, pnl } => {
            let mut store = JournalStore::open(&config.journal_path).await?;
            let trade = store.close(&id, to_decimal("pnl", pnl)?).await?;
            println!(
                "Closed {} {} {} with P&L {}",
                trade.asset,
                trade.direction,
                trade.date,
                signed(trade.pnl.unwrap_or_default())
            );
        }

        Commands::Remove { id } => {
            let mut store = JournalStore::open(&config.journal_path).await?;
            let trade = store.remove(&id).await?;
            println!("Removed {} {} {}", trade.asset, trade.direction, trade.date);
        }

        Commands::Journal { limit } => {
            let store = JournalStore::open(&config.journal_path).await?;

            if store.is_empty() {
                println!(
                    "Journal {} is empty. Use 'tradecopilot log' or 'tradecopilot size --save' to add trades.",
                    store.path().display()
                );
                return Ok(());
            }

            println!("\n{} ({} trades)", store.path().display(), store.len());

            println!(
                "\n{:<36} {:<10} {:<8} {:<6} {:>8} {:<3} {:<7} {:>10}",
                "ID", "DATE", "ASSET", "DIR", "SIZE", "SES", "STATUS", "P&L"
            );
            println!("{}", "-".repeat(96));

            for trade in store.list().iter().take(limit) {
                let status = match trade.status {
                    TradeStatus::Open => "Open",
                    TradeStatus::Closed => "Closed",
                };
                let pnl = trade.pnl.map(signed).unwrap_or_else(|| "-".to_string());
                println!(
                    "{:<36} {:<10} {:<8} {:<6} {:>8} {:<3} {:<7} {:>10}",
                    trade.id,
                    trade.date,
                    truncate(&trade.asset, 8),
                    trade.direction,
                    trade.size,
                    trade.session.code(),
                    status,
                    pnl
                );
            }
        }

        Commands::Stats => {
            let store = JournalStore::open(&config.journal_path).await?;
            let trades = store.realized();
            let stats = MetricsCalculator::calculate(&trades);

            info!(trades = stats.total_trades, "Computed journal statistics");

            println!("\n=== Performance ===");
            println!("Total P&L:      {}", signed(stats.total_pnl));
            println!("Total Trades:   {}", stats.total_trades);
            println!("Win Rate:       {:.1}%", stats.win_rate);
            println!("Winning Trades: {}", stats.winning_trades);
            println!("Losing Trades:  {}", stats.losing_trades);
            println!("Avg Win:        ${:.2}", stats.avg_win);
            println!("Avg Loss:       ${:.2}", stats.avg_loss);
            if stats.profit_factor.is_infinite() {
                println!("Profit Factor:  ∞");
            } else {
                println!("Profit Factor:  {:.2}", stats.profit_factor);
            }
            println!("Expectancy:     ${:.2}", stats.expectancy);
            println!("Max Drawdown:   ${:.2}", stats.max_drawdown);
            println!("P&L Std Dev:    {:.2}", stats.pnl_std_dev);

            let curve = MetricsCalculator::pnl_curve(&trades);
            if !curve.is_empty() {
                println!("\n--- P&L Curve ---");
                for (i, equity) in curve.iter().enumerate() {
                    println!("  {:>4}  {}", i, signed(*equity));
                }
            }

            println!("\n--- Win Rate by Weekday ---");
            for day in MetricsCalculator::weekday_win_rates(&trades) {
                println!(
                    "  {}  {:>5.1}%  ({}/{})",
                    day.weekday, day.win_rate, day.wins, day.trades
                );
            }
        }

        Commands::Calendar { month } => {
            let month = month.unwrap_or_else(|| MonthKey::of(today()));
            let store = JournalStore::open(&config.journal_path).await?;
            let trades = store.realized();

            let days = calendar::aggregate_month(&trades, month);
            let cells = calendar::month_grid(month, &days);
            let summary = calendar::summarize(&days);

            println!("\n=== {} ===\n", month);
            for name in ["Mon", "Tue", "Wed", "Thu", "Fri", "Sat", "Sun"] {
                print!("{:<14}", name);
            }
            println!();

            for week in cells.chunks(7) {
                for cell in week {
                    let text = match cell {
                        CalendarCell::Blank => String::new(),
                        CalendarCell::Day { date, data: None } => format!("{:>2}", date.day()),
                        CalendarCell::Day { date, data: Some(d) } => format!(
                            "{:>2} {} ({})",
                            date.day(),
                            signed(d.pnl),
                            d.trades
                        ),
                    };
                    print!("{:<14}", text);
                }
                println!();
            }

            println!(
                "\nMonth P&L: {} | Trading days: {} ({} green, {} red) | Trades: {}",
                signed(summary.total_pnl),
                summary.trading_days,
                summary.green_days,
                summary.red_days,
                summary.trades
            );
        }

        Commands::Session { watch } => {
            let clock = SessionClock::new(config.session);
            let window = clock.window();
            println!(
                "New York session {}-{} ET, weekdays",
                window.start.format("%H:%M"),
                window.end.format("%H:%M")
            );

            if !watch {
                print_session(&clock);
                return Ok(());
            }

            info!("Watching New York session");
            loop {
                print_session(&clock);

                tokio::select! {
                    _ = tokio::signal::ctrl_c() => {
                        println!("\nStopped.");
                        break;
                    }
                    _ = tokio::time::sleep(std::time::Duration::from_secs(1)) => {}
                }
            }
        }

        Commands::Config => {
            let table = config.instruments()?;
            let trading = &config.trading;

            println!("\n=== Configuration ===\n");
            println!("Journal:          {}", config.journal_path.display());
            println!(
                "Instruments:      {} ({} symbols)",
                config
                    .instruments_path
                    .as_ref()
                    .map(|p| p.display().to_string())
                    .unwrap_or_else(|| "built-in".to_string()),
                table.len()
            );

            println!("\nCalculator Defaults:");
            println!("  Account Balance:  ${}", trading.account_balance);
            println!("  Asset:            {}", trading.asset);
            println!("  Direction:        {}", trading.direction);
            println!("  Risk Type:        {:?}", trading.risk_type);
            println!("  Session:          {}", trading.session);

            println!("\nNew York Session:");
            println!("  Opens:            {} ET", config.session.start.format("%H:%M"));
            println!("  Closes:           {} ET", config.session.end.format("%H:%M"));
        }
    }

    Ok(())
}

fn print_session(clock: &SessionClock) {
    let status = clock.now();
    println!(
        "[{} ET] {}: {}",
        to_new_york(chrono::Utc::now()).format("%a %H:%M:%S"),
        status.message(),
        status
    );
}

/// Convert a CLI float into a Decimal, rejecting NaN and infinities.
fn to_decimal(name: &str, value: f64) -> Result<Decimal> {
    if !value.is_finite() {
        bail!("--{} must be a finite number", name);
    }
    Decimal::try_from(value).with_context(|| format!("--{} is out of range", name))
}

fn today() -> NaiveDate {
    Local::now().date_naive()
}

/// Currency amount with an explicit sign.
fn signed(value: Decimal) -> String {
    let sign = if value >= Decimal::ZERO { "+" } else { "" };
    format!("{}${:.2}", sign, value)
}

/// Truncate a string with ellipsis if too long.
fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let head: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{}...", head)
    }
}
