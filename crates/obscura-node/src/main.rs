//! `obscura-node` — the rendezvous overlay, both roles.
//!
//! Without `-x` this runs a beacon: a stateless coordinator that
//! records announced public keys and rebroadcasts the encrypted peer
//! table. With `-x` it runs an interactive node against a beacon:
//! an empty input line prints the peer list, `<address> <message...>`
//! sends an encrypted message to that peer.

use anyhow::Context;
use clap::Parser;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::warn;
use tracing_subscriber::EnvFilter;

use obscura_crypto::{Cipher, Hash, Kdf, Mac, Mode, Suite, DEFAULT_SEC};
use obscura_net::{Beacon, Node};

#[derive(Parser, Debug)]
#[command(
    name = "obscura-node",
    version,
    about = "UDP rendezvous messaging overlay"
)]
struct Args {
    /// Run as an interactive node (beacon otherwise).
    #[arg(short = 'x', long = "node")]
    node: bool,

    /// Beacon address: the bind address in beacon mode, the target in
    /// node mode.
    #[arg(short = 'r', value_name = "address", default_value = "0.0.0.0:9595")]
    beacon_addr: String,

    /// Node bind address.
    #[arg(short = 'n', value_name = "address", default_value = "0.0.0.0:0")]
    node_addr: String,

    /// Inline passphrase (prompted otherwise).
    #[arg(short = 'p', value_name = "passphrase")]
    passphrase: Option<String>,

    #[arg(short = 'c', value_name = "id", default_value_t = Cipher::Aes256.id(),
          help = format!("cipher ({})", Cipher::options()))]
    cipher: u8,

    #[arg(short = 'm', value_name = "id", default_value_t = Mode::Ctr.id(),
          help = format!("stream mode ({})", Mode::options()))]
    mode: u8,

    #[arg(short = 'k', value_name = "id", default_value_t = Kdf::Argon2id.id(),
          help = format!("key derivation ({})", Kdf::options()))]
    kdf: u8,

    #[arg(short = 'a', value_name = "id", default_value_t = Mac::Hmac.id(),
          help = format!("message authentication ({})", Mac::options()))]
    mac: u8,

    #[arg(short = 'e', value_name = "level", default_value_t = DEFAULT_SEC,
          help = format!("security level ({}~{})", obscura_crypto::MIN_SEC, obscura_crypto::MAX_SEC))]
    sec: u8,

    /// Hash identifier.
    #[arg(long = "hash", value_name = "id", default_value_t = Hash::Sha256.id(),
          help = format!("message digest ({})", Hash::options()))]
    hash: u8,

    /// Log filter (tracing syntax).
    #[arg(long, env = "OBSCURA_LOG", default_value = "info")]
    log: String,
}

fn setup_logging(filter: &str) -> anyhow::Result<()> {
    let filter = EnvFilter::try_new(filter).context("invalid log filter")?;
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    setup_logging(&args.log)?;

    let suite = Suite {
        cipher: Cipher::try_from(args.cipher)?,
        mode: Mode::try_from(args.mode)?,
        kdf: Kdf::try_from(args.kdf)?,
        mac: Mac::try_from(args.mac)?,
        hash: Hash::try_from(args.hash)?,
        sec: args.sec,
    };

    let passphrase = match &args.passphrase {
        Some(pass) => pass.clone().into_bytes(),
        // The beacon is the long-lived side; confirm its passphrase.
        None => prompt_passphrase(!args.node)?,
    };

    if args.node {
        run_node(&args, passphrase, suite).await
    } else {
        let beacon = Beacon::bind(args.beacon_addr.as_str(), passphrase, suite).await?;
        beacon.run().await?;
        Ok(())
    }
}

async fn run_node(args: &Args, passphrase: Vec<u8>, suite: Suite) -> anyhow::Result<()> {
    let node = Node::connect(&args.node_addr, &args.beacon_addr, passphrase, suite).await?;
    let mut inbound = node.spawn_listener();
    println!("listening on {}", node.local_addr()?);

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        tokio::select! {
            message = inbound.recv() => {
                let Some(message) = message else { break };
                println!(
                    "<{}> {}",
                    message.from,
                    String::from_utf8_lossy(&message.payload)
                );
            }
            line = lines.next_line() => {
                let Some(line) = line? else { break };
                handle_line(&node, line.trim()).await;
            }
        }
    }
    Ok(())
}

/// Empty line: print the peer list. `<address> <message...>`: send.
/// Anything unparsable falls back to the peer list.
async fn handle_line(node: &Node, line: &str) {
    let Some((dst, message)) = line.split_once(' ') else {
        print_peers(node).await;
        return;
    };
    let Ok(addr) = dst.parse::<std::net::SocketAddr>() else {
        print_peers(node).await;
        return;
    };
    if let Err(err) = node.send(addr, message.trim().as_bytes()).await {
        warn!(%err, "send failed");
        print_peers(node).await;
    }
}

async fn print_peers(node: &Node) {
    let peers = node.peer_list().await;
    let peers: Vec<String> = peers.iter().map(ToString::to_string).collect();
    println!("[{}]", peers.join(" "));
}

fn prompt_passphrase(confirm: bool) -> anyhow::Result<Vec<u8>> {
    loop {
        let pass = rpassword::prompt_password("enter passphrase: ")?;
        if pass.is_empty() {
            continue;
        }
        if confirm {
            let check = rpassword::prompt_password("verify passphrase: ")?;
            if pass != check {
                eprintln!("passphrases do not match");
                continue;
            }
        }
        return Ok(pass.into_bytes());
    }
}
