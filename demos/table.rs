//! Fill a routing table with random nodes and query it.
//!
//! Run: `cargo run --example table -- --nodes 500 --target <64 hex chars>`

use std::{collections::HashSet, str::FromStr, sync::Arc, time::Instant};

use discover::{Id, Liveness, Node, PeerTable};

use clap::Parser;
use parking_lot::Mutex;

use tracing::Level;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Number of random nodes to add, each on its own udp port
    #[arg(long, default_value_t = 1000)]
    nodes: u16,
    /// Maximum number of nodes per bucket
    #[arg(long, default_value_t = discover::MAX_BUCKET_SIZE_K)]
    bucket_size: usize,
    /// Target to find the closest nodes to, random if missing
    #[arg(long)]
    target: Option<String>,
    /// Log every insertion and eviction
    #[arg(short, long)]
    verbose: bool,
}

fn main() {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_max_level(if cli.verbose {
            Level::TRACE
        } else {
            Level::INFO
        })
        .init();

    // Stand-in for a cache of recent pings: even udp ports answered, every
    // third port timed out, anything else was never pinged.
    let pongs = Arc::new(Mutex::new(HashSet::new()));
    let timeouts = Arc::new(Mutex::new(HashSet::new()));
    let (answered, timed_out) = (pongs.clone(), timeouts.clone());

    let table = PeerTable::builder(Id::random())
        .bucket_size(cli.bucket_size)
        .liveness_check(move |node: &Node| {
            if answered.lock().contains(node.id()) {
                Liveness::Reachable
            } else if timed_out.lock().contains(node.id()) {
                Liveness::Unreachable
            } else {
                Liveness::Unknown
            }
        })
        .build()
        .expect("Invalid routing table configuration");

    println!("Local id: {}", table.id());

    let start = Instant::now();
    let mut evicted = 0;

    for port in 0..cli.nodes {
        let node = Node::new(Id::random(), [127, 0, 0, 1].into(), 30303, port);

        if port % 2 == 0 {
            pongs.lock().insert(*node.id());
        } else if port % 3 == 0 {
            timeouts.lock().insert(*node.id());
        }

        if let discover::AddOutcome::Evicted(_) = table.add(node) {
            evicted += 1;
        }
    }

    println!(
        "Added {} nodes in {:?}, kept {}, evicted {}",
        cli.nodes,
        start.elapsed(),
        table.size(),
        evicted
    );

    println!("\n=== BUCKETS ===");
    for (class, size) in table.snapshot().bucket_sizes() {
        println!("{class:>3}: {size}");
    }

    let target = match cli.target {
        Some(target) => Id::from_str(&target).expect("Expected a 32 bytes hex target"),
        None => Id::random(),
    };

    println!("\n=== CLOSEST TO {} ===", target);
    for node in table.closest(&target, 8) {
        println!("{} {}", node.id(), node.udp_address());
    }

    println!("\n=== RANDOM SAMPLE ===");
    for node in table.random_nodes(8, &[]) {
        println!("{} {}", node.id(), node.udp_address());
    }
}
