use chalkchain::node::{apply_action, block_signing_hash, Action, MinedBlockData, Node, TransactionData};
use chalkchain::{
    ecdsa, generate_keypair, load_chain, save_chain, Command, Ledger, MineOutcome,
    MiningCriterion, Opt, Transaction, GLOBAL_CONFIG, SECP256K1,
};
use clap::Parser;
use log::{error, LevelFilter};
use std::process;

fn main() {
    env_logger::builder().filter_level(LevelFilter::Info).init();

    let opt = Opt::parse();

    if let Err(e) = run_command(opt.command) {
        error!("Error: {e}");
        process::exit(1);
    }
}

fn run_command(command: Command) -> Result<(), Box<dyn std::error::Error>> {
    match command {
        // Generate a keypair and print it in the decimal form the action
        // boundary speaks. The private key is printed, never stored.
        Command::Keygen => {
            let keypair = generate_keypair(&SECP256K1)?;
            let public = keypair.get_public_key();
            println!("private key: {}", keypair.get_private_key());
            println!("public key:  ({}, {})", public.x, public.y);
        }
        Command::Demo {
            difficulty,
            max_iterations,
            output,
        } => {
            run_demo(difficulty, max_iterations, output)?;
        }
        Command::Validatechain { path } => {
            let ledger = load_chain(&path)?;
            if ledger.validate_chain() {
                println!("chain of {} blocks is valid", ledger.len());
            } else {
                return Err("chain validation failed".into());
            }
        }
    }

    Ok(())
}

/// The whole lifecycle in one pass: register two users and a miner, sign a
/// transfer, roll it into a block, brute-force the proof-of-work, submit
/// the mined block through the action boundary and save the chain.
fn run_demo(
    difficulty: usize,
    max_iterations: u64,
    output: Option<String>,
) -> Result<(), Box<dyn std::error::Error>> {
    let criterion = MiningCriterion::leading_zeros(difficulty);
    let ledger = Ledger::new(criterion)?;
    let mut node = Node::new(ledger, &SECP256K1, 1);

    let alice = generate_keypair(&SECP256K1)?;
    let bob = generate_keypair(&SECP256K1)?;
    let miner = generate_keypair(&SECP256K1)?;
    node.register_user("alice", alice.get_public_key().clone())?;
    node.register_user("bob", bob.get_public_key().clone())?;
    node.register_user("miner", miner.get_public_key().clone())?;

    let mut tx = Transaction::new("alice", "bob", 10);
    tx.sign(alice.get_private_key(), &SECP256K1)?;
    let (r, s) = tx
        .get_signature()
        .expect("the transaction was just signed")
        .to_decimal_pair();

    apply_action(
        &mut node,
        &Action {
            action_type: "submit_transaction".to_string(),
            action_data: serde_json::to_value(TransactionData {
                sender: "alice".to_string(),
                receiver: "bob".to_string(),
                amount: 10,
                signature: (r, s),
            })?,
        },
    )?;

    let (block_id, pending) = node
        .get_pending_blocks()
        .iter()
        .next()
        .map(|(id, block)| (*id, block.clone()))
        .ok_or("the submitted transaction should have rolled into a pending block")?;

    let mut mined = pending;
    match mined.mine(node.get_ledger().get_criterion(), max_iterations) {
        MineOutcome::Found(hash) => println!("mined block {block_id}: {hash}"),
        MineOutcome::Exhausted => {
            println!("proof-of-work search exhausted after {max_iterations} iterations");
            return Ok(());
        }
    }

    let signature = ecdsa::sign(
        &block_signing_hash(mined.get_hash()),
        miner.get_private_key(),
        &SECP256K1,
    )?;
    let (r, s) = signature.to_decimal_pair();

    apply_action(
        &mut node,
        &Action {
            action_type: "mined_block_validation".to_string(),
            action_data: serde_json::to_value(MinedBlockData {
                block_id,
                previous_hash: mined.get_previous_hash().to_string(),
                timestamp: mined.get_timestamp().to_string(),
                nonce: mined.get_nonce(),
                criterion: mined.get_criterion().clone(),
                miner: "miner".to_string(),
                signature: (r, s),
            })?,
        },
    )?;

    println!("chain length: {}", node.get_ledger().len());

    let location = output.unwrap_or_else(|| GLOBAL_CONFIG.get_chain_location());
    save_chain(node.get_ledger(), &location)?;
    println!("chain saved to {location}");
    Ok(())
}
