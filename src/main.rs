// src/main.rs - CLI entry point for solving, verifying and benchmarking

//! Command-line front end.
//!
//! Thin wrapper over the library: `solve` scans a nonce range, `verify`
//! checks a claimed proof, `bench` measures solve throughput and `info`
//! prints the graph geometry for a given configuration.

use clap::{Parser, Subcommand};
use chrono::Local;
use std::time::Instant;

use cuckoo_pow::{
    config::Settings, init, solver::Solver, verifier, CuckooError, Result, Verification,
};

#[derive(Parser)]
#[command(name = "cuckoo-pow")]
#[command(about = "Cuckoo Cycle proof-of-work solver and verifier")]
struct Cli {
    /// Load settings from a JSON file before applying flag overrides
    #[arg(long, global = true)]
    config: Option<String>,

    /// Graph size override, edges = 2^edge_bits
    #[arg(long, global = true)]
    edge_bits: Option<u32>,

    /// Worker thread count override (0 = all cores)
    #[arg(long, global = true)]
    threads: Option<usize>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Scan a nonce range for solutions
    Solve {
        /// Header hash (hex)
        #[arg(long, default_value = "0000000000000000000000000000000000000000000000000000000000000000")]
        header: String,
        /// Starting nonce
        #[arg(long, default_value = "0")]
        start_nonce: u64,
        /// Number of nonces to try
        #[arg(short, long, default_value = "100")]
        count: u64,
        /// Difficulty target (hex), proofs must hash at or below it
        #[arg(long, default_value = "ffffffffffffffffffffffffffffffffffffffffffffffffffffffffffffffff")]
        target: String,
    },
    /// Verify a claimed proof
    Verify {
        /// Header hash (hex)
        #[arg(long)]
        header: String,
        /// Nonce the proof claims to solve
        #[arg(long)]
        nonce: u64,
        /// Comma-separated ascending edge indices
        #[arg(long)]
        proof: String,
        /// Difficulty target (hex)
        #[arg(long, default_value = "ffffffffffffffffffffffffffffffffffffffffffffffffffffffffffffffff")]
        target: String,
    },
    /// Run a solve throughput benchmark
    Bench {
        /// Number of iterations
        #[arg(short, long, default_value = "5")]
        iterations: u64,
        /// Number of nonces per iteration
        #[arg(long, default_value = "10")]
        nonce_count: u64,
    },
    /// Show configuration and graph geometry
    Info,
}

fn main() -> Result<()> {
    init()?;

    let cli = Cli::parse();
    let settings = load_settings(&cli)?;

    match cli.command {
        Commands::Solve {
            header,
            start_nonce,
            count,
            target,
        } => {
            run_solve(settings, &header, start_nonce, count, &target)?;
        }
        Commands::Verify {
            header,
            nonce,
            proof,
            target,
        } => {
            run_verify(settings, &header, nonce, &proof, &target)?;
        }
        Commands::Bench {
            iterations,
            nonce_count,
        } => {
            run_bench(settings, iterations, nonce_count)?;
        }
        Commands::Info => {
            show_info(settings)?;
        }
    }

    Ok(())
}

fn load_settings(cli: &Cli) -> Result<Settings> {
    let mut settings = match &cli.config {
        Some(path) => Settings::from_file(path)?,
        None => Settings::default(),
    };
    if let Some(edge_bits) = cli.edge_bits {
        settings.edge_bits = edge_bits;
    }
    if let Some(threads) = cli.threads {
        settings.worker_threads = threads;
    }
    Ok(settings)
}

fn run_solve(
    settings: Settings,
    header_hex: &str,
    start_nonce: u64,
    count: u64,
    target_hex: &str,
) -> Result<()> {
    let header = parse_hex_hash(header_hex)?;
    let target = parse_hex_hash(target_hex)?;

    let timestamp = Local::now().format("%H:%M:%S").to_string();
    println!("{} Solving 2^{} graph, {}-cycles", timestamp, settings.edge_bits, settings.proof_size);
    println!("{} Nonce range: {}..{}", timestamp, start_nonce, start_nonce + count);

    let mut solver = Solver::init(settings)?;
    let start_time = Instant::now();
    let solutions = solver.solve_range(&header, start_nonce, count, &target)?;
    let elapsed = start_time.elapsed();

    let timestamp = Local::now().format("%H:%M:%S").to_string();
    println!("{} Scan completed:", timestamp);
    println!("{} Nonces tried: {}", timestamp, solver.stats().nonces_processed);
    println!("{} Solutions found: {}", timestamp, solutions.len());
    println!("{} Time elapsed: {:.2}s", timestamp, elapsed.as_secs_f64());
    println!(
        "{} Rate: {:.2} graphs/s",
        timestamp,
        solver.stats().nonces_processed as f64 / elapsed.as_secs_f64()
    );

    for (i, solution) in solutions.iter().enumerate() {
        let timestamp = Local::now().format("%H:%M:%S").to_string();
        println!(
            "{} Solution {}: nonce={}, hash={}",
            timestamp,
            i + 1,
            solution.nonce,
            hex::encode(solution.hash)
        );
        println!(
            "{} Solution {} proof: {}",
            timestamp,
            i + 1,
            solution
                .proof
                .iter()
                .map(|e| e.to_string())
                .collect::<Vec<_>>()
                .join(",")
        );
    }

    if solutions.is_empty() {
        let timestamp = Local::now().format("%H:%M:%S").to_string();
        println!("{} No solutions found - most nonce ranges have none", timestamp);
        println!("{} Try increasing --count or a different --start-nonce", timestamp);
    }

    solver.release();
    Ok(())
}

fn run_verify(
    settings: Settings,
    header_hex: &str,
    nonce: u64,
    proof_str: &str,
    target_hex: &str,
) -> Result<()> {
    let header = parse_hex_hash(header_hex)?;
    let target = parse_hex_hash(target_hex)?;
    let proof = parse_proof(proof_str)?;

    let timestamp = Local::now().format("%H:%M:%S").to_string();
    match verifier::verify(&header, nonce, &proof, &target, &settings)? {
        Verification::Valid { hash } => {
            println!("{} Proof VALID, hash={}", timestamp, hex::encode(hash));
        }
        Verification::Invalid(reason) => {
            println!("{} Proof INVALID: {}", timestamp, reason);
            std::process::exit(1);
        }
    }
    Ok(())
}

fn run_bench(settings: Settings, iterations: u64, nonce_count: u64) -> Result<()> {
    let timestamp = Local::now().format("%H:%M:%S").to_string();
    println!(
        "{} Benchmarking 2^{} graph: {} iterations, {} nonces each",
        timestamp, settings.edge_bits, iterations, nonce_count
    );

    let header = parse_hex_hash("a8db1910d85662f0167138c160c866683410c11f1ccfecb8ed8145716feb73e1")?;
    let target = [0xffu8; 32];

    let mut solver = Solver::init(settings)?;
    let start_time = Instant::now();
    let mut total_solutions = 0usize;

    for i in 0..iterations {
        let solutions = solver.solve_range(&header, i * nonce_count, nonce_count, &target)?;
        total_solutions += solutions.len();

        if (i + 1) % 10 == 0 || i == 0 {
            let timestamp = Local::now().format("%H:%M:%S").to_string();
            println!("{} Completed iteration {}/{}", timestamp, i + 1, iterations);
        }
    }

    let elapsed = start_time.elapsed();
    let total_nonces = iterations * nonce_count;

    let timestamp = Local::now().format("%H:%M:%S").to_string();
    println!("{} Benchmark completed:", timestamp);
    println!("{} Total nonces: {}", timestamp, total_nonces);
    println!("{} Total solutions: {}", timestamp, total_solutions);
    println!("{} Time elapsed: {:.2}s", timestamp, elapsed.as_secs_f64());
    println!(
        "{} Average rate: {:.2} graphs/s",
        timestamp,
        total_nonces as f64 / elapsed.as_secs_f64()
    );
    println!(
        "{} Average solve time: {:.1}ms",
        timestamp,
        solver.stats().average_solve_time_ms
    );
    if total_solutions > 0 {
        println!(
            "{} Solution rate: {:.6} solutions/nonce",
            timestamp,
            total_solutions as f64 / total_nonces as f64
        );
    }

    solver.release();
    Ok(())
}

fn show_info(settings: Settings) -> Result<()> {
    let geometry = cuckoo_pow::config::GraphGeometry::from_settings(&settings)?;

    println!("Configuration:");
    println!("Edge bits: {}", settings.edge_bits);
    println!("Proof size: {}", settings.proof_size);
    println!("Trim rounds: {}", settings.trim_rounds);
    println!("Max solutions: {}", settings.max_solutions);
    println!(
        "Worker threads: {}",
        if settings.worker_threads == 0 {
            "all cores".to_string()
        } else {
            settings.worker_threads.to_string()
        }
    );

    println!("\nGraph geometry:");
    println!("Edges: {} (2^{})", geometry.num_edges, geometry.edge_bits);
    println!("Nodes per side: {}", geometry.num_edges);
    println!("Coarse buckets: {}", geometry.nx);
    println!("Fine buckets: {} ({}x{})", geometry.nxy, geometry.nx, geometry.ny);
    println!("Coarse bucket capacity: {}", geometry.coarse_capacity);
    println!(
        "Fine bucket capacity: {} / {}",
        geometry.fine_capacity_a, geometry.fine_capacity_b
    );
    println!("Trimmed edge cap: {}", geometry.max_trimmed);
    println!(
        "Estimated buffer memory: {:.1}MB",
        geometry.memory_estimate() as f64 / (1024.0 * 1024.0)
    );

    Ok(())
}

fn parse_hex_hash(hex_str: &str) -> Result<[u8; 32]> {
    let hex_str = hex_str.trim_start_matches("0x");
    if hex_str.len() != 64 {
        return Err(CuckooError::Config(format!(
            "expected 64 hex chars, got {}",
            hex_str.len()
        )));
    }
    let bytes = hex::decode(hex_str)?;
    let mut hash = [0u8; 32];
    hash.copy_from_slice(&bytes);
    Ok(hash)
}

fn parse_proof(proof_str: &str) -> Result<Vec<u32>> {
    proof_str
        .split(',')
        .map(|part| {
            part.trim()
                .parse::<u32>()
                .map_err(|_| CuckooError::Config(format!("invalid edge index '{}'", part.trim())))
        })
        .collect()
}
