//! Dynast node tools
//!
//! Usage:
//!   dynast --help

use clap::{Parser, Subcommand};
use rand::RngCore;
use sha3::{Digest, Keccak256};
use tracing::{info, warn, Level};
use tracing_subscriber::FmtSubscriber;

use dynast::{
    core::{epoch_first_height, Address, CheckpointHash, EngineConfig, TransitionPolicy, Vote},
    engine::{StakeEngine, StakingError},
    ScaleFactor, DEFAULT_EPOCH_LENGTH, DEFAULT_MIN_DEPOSIT_WEI, DEFAULT_WARM_UP_EPOCHS,
    DYNAST_VERSION, END_DYNASTY_SENTINEL, FIXED_POINT_ONE, GENESIS_SCALE_FACTOR, WEI_PER_TOKEN,
};

#[derive(Parser)]
#[command(name = "dynast")]
#[command(version = DYNAST_VERSION)]
#[command(about = "Deposit and dynasty accounting engine", long_about = None)]
struct Cli {
    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show engine constants and the default configuration
    Info,

    /// Run a scripted deposit lifecycle and print a summary
    Simulate {
        /// Number of epochs to run
        #[arg(short, long, default_value = "12")]
        epochs: u64,

        /// Number of validators depositing at genesis
        #[arg(short, long, default_value = "4")]
        validators: u64,

        /// Deposit per validator, in tokens
        #[arg(short, long, default_value = "2000")]
        deposit: u64,

        /// Write the final engine snapshot to this path
        #[arg(short, long)]
        snapshot: Option<String>,
    },
}

fn main() {
    let cli = Cli::parse();

    let level = if cli.verbose { Level::DEBUG } else { Level::INFO };
    let subscriber = FmtSubscriber::builder().with_max_level(level).finish();
    tracing::subscriber::set_global_default(subscriber)
        .expect("setting default subscriber failed");

    match cli.command {
        Commands::Info => {
            show_info();
        }
        Commands::Simulate {
            epochs,
            validators,
            deposit,
            snapshot,
        } => {
            run_simulation(epochs, validators, deposit, snapshot);
        }
    }
}

fn show_info() {
    println!();
    println!("Dynast - Deposit and Dynasty Accounting");
    println!("=======================================");
    println!();
    println!("Version:              {}", DYNAST_VERSION);
    println!("Wei per token:        {}", WEI_PER_TOKEN);
    println!("Fixed-point unit:     {}", FIXED_POINT_ONE);
    println!("Genesis scale factor: {}", GENESIS_SCALE_FACTOR);
    println!("End dynasty sentinel: {}", END_DYNASTY_SENTINEL);
    println!("Epoch length:         {} blocks", DEFAULT_EPOCH_LENGTH);
    println!("Warm-up epochs:       {}", DEFAULT_WARM_UP_EPOCHS);
    println!(
        "Minimum deposit:      {} tokens",
        DEFAULT_MIN_DEPOSIT_WEI / WEI_PER_TOKEN
    );
    println!();
    println!("Default configuration:");
    match serde_json::to_string_pretty(&EngineConfig::default()) {
        Ok(json) => println!("{}", json),
        Err(e) => eprintln!("Failed to render configuration: {}", e),
    }
    println!();
    println!("Commands:");
    println!("  info      - Show engine constants");
    println!("  simulate  - Run a scripted deposit lifecycle");
    println!();
}

/// Checkpoint hash for a simulated epoch
fn checkpoint_for(epoch: u64) -> CheckpointHash {
    let digest = Keccak256::digest(epoch.to_be_bytes());
    let mut hash = [0u8; 32];
    hash.copy_from_slice(&digest);
    hash
}

fn random_address(rng: &mut impl RngCore) -> Address {
    let mut pubkey = [0u8; 64];
    rng.fill_bytes(&mut pubkey);
    Address::from_pubkey_bytes(&pubkey)
}

fn run_simulation(epochs: u64, validators: u64, deposit_tokens: u64, snapshot: Option<String>) {
    info!("Starting dynast simulation...");
    info!("Version: {}", DYNAST_VERSION);
    info!(epochs, validators, deposit_tokens, "parameters");

    // A short warm-up and a visible per-epoch interest rate keep small runs
    // interesting; lenient transitions let the driver loop stay simple
    let config = EngineConfig {
        warm_up_epochs: 2,
        reward_factor: ScaleFactor::from_mantissa(FIXED_POINT_ONE + FIXED_POINT_ONE / 10_000),
        transition_policy: TransitionPolicy::Lenient,
        ..EngineConfig::default()
    };
    let epoch_length = config.epoch_length;
    let mut engine = StakeEngine::new(config);
    let mut rng = rand::thread_rng();

    let deposit_wei = u128::from(deposit_tokens) * WEI_PER_TOKEN;
    let mut indices = Vec::new();
    for _ in 0..validators {
        let addr = random_address(&mut rng);
        match engine.deposit(addr, deposit_wei) {
            Ok(index) => {
                info!(index, %addr, tokens = deposit_tokens, "deposit placed");
                indices.push(index);
            }
            Err(e) => warn!(%addr, error = %e, "deposit rejected"),
        }
    }

    let logout_at = epochs / 2;
    let slash_at = epochs / 2 + 1;
    let join_at = epochs / 3;
    let mut votes_cast = 0u64;

    for _ in 0..epochs {
        // Every live validator votes for the current checkpoint; members of
        // neither tracked dynasty are simply not eligible yet
        let epoch = engine.current_epoch();
        let hash = checkpoint_for(epoch);
        for &index in &indices {
            match engine.vote(&Vote::unsigned(index, epoch, hash)) {
                Ok(()) => votes_cast += 1,
                Err(StakingError::NotInDynasty) | Err(StakingError::AlreadySlashed) => {}
                Err(e) => warn!(index, error = %e, "vote rejected"),
            }
        }

        engine.observe_height(epoch_first_height(epoch + 1, epoch_length));
        match engine.new_epoch() {
            Ok(outcome) => {
                if let Some(summary) = outcome.summary() {
                    info!(
                        epoch = summary.epoch,
                        dynasty = summary.dynasty,
                        scale_factor = %summary.scale_factor,
                        total_curdyn_tokens =
                            %(engine.total_curdyn_deposits_in_wei() / WEI_PER_TOKEN),
                        "epoch complete"
                    );
                }
            }
            Err(e) => warn!(error = %e, "transition failed"),
        }

        let epoch = engine.current_epoch();
        if epoch == join_at {
            let addr = random_address(&mut rng);
            if let Ok(index) = engine.deposit(addr, deposit_wei) {
                info!(index, %addr, "late validator joined");
                indices.push(index);
            }
        }
        if epoch == logout_at {
            if let Some(&index) = indices.first() {
                let end = engine.current_dynasty() + 2;
                match engine.logout(index, end) {
                    Ok(()) => info!(index, end_dynasty = end, "validator logged out"),
                    Err(e) => warn!(index, error = %e, "logout rejected"),
                }
            }
        }
        if epoch == slash_at {
            if let Some(&index) = indices.last() {
                match engine.slash(index) {
                    Ok(()) => info!(index, "validator slashed"),
                    Err(e) => warn!(index, error = %e, "slash rejected"),
                }
            }
        }
    }

    let validator_rows: Vec<serde_json::Value> = indices
        .iter()
        .filter_map(|&index| engine.validator(index).ok())
        .map(|v| {
            serde_json::json!({
                "index": v.index,
                "address": v.withdrawal_addr.to_string(),
                "deposit_scaled": v.deposit.to_string(),
                "deposit_wei": engine
                    .validator_deposit_in_wei(v.index)
                    .unwrap_or(0)
                    .to_string(),
                "start_dynasty": v.start_dynasty,
                "end_dynasty": v.end_dynasty().to_string(),
                "slashed": v.is_slashed,
            })
        })
        .collect();

    let report = serde_json::json!({
        "finished_at": chrono::Utc::now().to_rfc3339(),
        "epochs_run": epochs,
        "votes_cast": votes_cast,
        "final_epoch": engine.current_epoch(),
        "final_dynasty": engine.current_dynasty(),
        "scale_factor": engine
            .deposit_scale_factor(engine.current_epoch())
            .map(|f| f.to_string())
            .unwrap_or_default(),
        "total_curdyn_tokens": (engine.total_curdyn_deposits_in_wei() / WEI_PER_TOKEN).to_string(),
        "total_prevdyn_tokens": (engine.total_prevdyn_deposits_in_wei() / WEI_PER_TOKEN).to_string(),
        "total_slashed_scaled": engine.total_slashed().to_string(),
        "validators": validator_rows,
    });

    println!();
    println!("================================================================");
    println!("                    SIMULATION SUMMARY");
    println!("================================================================");
    match serde_json::to_string_pretty(&report) {
        Ok(json) => println!("{}", json),
        Err(e) => eprintln!("Failed to render report: {}", e),
    }

    if let Some(path) = snapshot {
        match engine.snapshot() {
            Ok(bytes) => {
                if let Err(e) = std::fs::write(&path, bytes) {
                    warn!(path = %path, error = %e, "failed to write snapshot");
                } else {
                    info!(path = %path, "snapshot saved");
                }
            }
            Err(e) => warn!(error = %e, "snapshot failed"),
        }
    }
}
