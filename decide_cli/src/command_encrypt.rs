use crate::{expand, parse_arg};
use decide::{encrypt, BallotSubmission, PublicKey, VoterId, VotingId};
use serde_json::Value;

pub fn command_encrypt(matches: &clap::ArgMatches) {
    let filename = expand(matches.value_of("PUBLIC-KEY").unwrap());
    let option: u32 = parse_arg(matches, "OPTION").unwrap();
    let voting: u64 = parse_arg(matches, "voting").unwrap();
    let voter: u64 = parse_arg(matches, "voter").unwrap();

    let public_key = read_public_key(&filename);
    if let Err(e) = public_key.validate() {
        eprintln!("decide: {}: {}", filename, e);
        std::process::exit(1);
    }

    let vote = encrypt(&public_key, option, &mut rand::thread_rng()).unwrap_or_else(|e| {
        eprintln!("decide: {}", e);
        std::process::exit(1);
    });

    let submission = BallotSubmission {
        voting: VotingId(voting),
        voter: VoterId(voter),
        vote,
    };
    println!("{}", submission.to_json().unwrap());
}

// Accepts a bare public key or the whole keygen output
fn read_public_key(filename: &str) -> PublicKey {
    let contents = std::fs::read_to_string(filename).unwrap_or_else(|e| {
        eprintln!("decide: unable to read {}: {}", filename, e);
        std::process::exit(1);
    });

    let parsed: Result<PublicKey, _> =
        serde_json::from_str::<Value>(&contents).and_then(|mut value| {
            match value.get_mut("public_key") {
                Some(inner) => serde_json::from_value(inner.take()),
                None => serde_json::from_value(value),
            }
        });

    parsed.unwrap_or_else(|e| {
        eprintln!("decide: {} does not hold a public key: {}", filename, e);
        std::process::exit(1);
    })
}
