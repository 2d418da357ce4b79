use crate::parse_arg;
use decide::*;
use log::info;
use rand::Rng;

fn or_exit<T>(result: Result<T, Error>) -> T {
    result.unwrap_or_else(|e| {
        eprintln!("decide: {}", e);
        std::process::exit(1);
    })
}

pub fn command_simulate(matches: &clap::ArgMatches, config: Config) {
    let options: u32 = parse_arg(matches, "options").unwrap();
    let voters: u64 = parse_arg(matches, "voters").unwrap();
    let turnout: u64 = parse_arg(matches, "turnout").unwrap();
    let authorities: usize = parse_arg(matches, "authorities").unwrap();

    if turnout > voters {
        eprintln!("decide: turnout ({}) can't exceed the number of voters ({})", turnout, voters);
        std::process::exit(1);
    }

    let base_url = config.base_url.clone();
    let service = VotingService::new(config);
    let admin = Actor::admin("decide-cli");

    let mut question = Question::new("Simulated question");
    for i in 1..=options {
        question.add_option(&format!("Option {}", i), None);
    }
    let new = NewVoting {
        name: "Simulated voting".to_owned(),
        desc: None,
        question,
        voting_type: VotingType::Ordinary,
        political_party: None,
        province: None,
    };
    let voting = or_exit(service.create_voting(&admin, new));

    for i in 1..=authorities {
        let info = AuthorityInfo::new(&format!("authority {}", i), &base_url, true);
        or_exit(service.add_authority(&admin, voting, info));
    }
    for voter in 1..=voters {
        or_exit(service.add_voter(&admin, voting, VoterId(voter)));
    }

    let started = or_exit(service.transition(voting, "start", &admin));
    info!("{}", started.message);

    let public_key = or_exit(service.get_public_key(voting));
    let mut rng = rand::thread_rng();
    for voter in 1..=turnout {
        let option = rng.gen_range(1, options + 1);
        let vote = or_exit(encrypt(&public_key, option, &mut rng).map_err(Error::from));
        let receipt = or_exit(service.submit_ballot(BallotSubmission {
            voting,
            voter: VoterId(voter),
            vote,
        }));
        info!("voter {} cast ballot {}", voter, receipt.receipt);
    }

    for action in &["stop", "tally"] {
        let transition = or_exit(service.transition(voting, action, &admin));
        info!("{}", transition.message);
    }

    let tally = or_exit(service.get_tally(voting));
    println!("{}", serde_json::to_string_pretty(&tally).unwrap());
}
