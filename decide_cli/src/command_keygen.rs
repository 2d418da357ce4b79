use crate::parse_arg;
use decide::{generate_keypair, Config};
use serde_json::json;

pub fn command_keygen(matches: &clap::ArgMatches, config: &Config) {
    let bits: usize = parse_arg(matches, "bits").unwrap_or(config.key_bits);
    let shares: usize = parse_arg(matches, "shares").unwrap_or(1);
    let threshold: usize = parse_arg(matches, "threshold").unwrap_or(shares);

    let (public_key, shares) = generate_keypair(bits, shares, threshold, &mut rand::thread_rng())
        .unwrap_or_else(|e| {
            eprintln!("decide: {}", e);
            std::process::exit(1);
        });

    let output = json!({
        "public_key": public_key,
        "threshold": threshold,
        "shares": shares,
    });
    println!("{}", serde_json::to_string_pretty(&output).unwrap());
}
