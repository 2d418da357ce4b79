use clap::{App, Arg, SubCommand};
use log::{debug, LevelFilter};

mod command_encrypt;
mod command_keygen;
mod command_simulate;

use command_encrypt::command_encrypt;
use command_keygen::command_keygen;
use command_simulate::command_simulate;

fn main() {
    let matches = App::new("decide")
        .version("0.1")
        .about("Key generation, ballot encryption and election simulation for decide")
        .arg(
            Arg::with_name("v")
                .short("v")
                .multiple(true)
                .help("Sets the level of verbosity, overriding log4rs.yaml"),
        )
        .subcommand(
            SubCommand::with_name("keygen")
                .about("Generate an election key and deal it into shares")
                .arg(
                    Arg::with_name("bits")
                        .long("bits")
                        .takes_value(true)
                        .help("Key size in bits (256, 512, 1536, 2048, 3072 or 4096) - defaults to DECIDE_KEY_BITS or 256"),
                )
                .arg(
                    Arg::with_name("shares")
                        .long("shares")
                        .takes_value(true)
                        .default_value("1")
                        .help("Number of key shares to deal"),
                )
                .arg(
                    Arg::with_name("threshold")
                        .long("threshold")
                        .takes_value(true)
                        .help("Shares needed to decrypt - defaults to all of them"),
                ),
        )
        .subcommand(
            SubCommand::with_name("encrypt")
                .about("Encrypt an option number into a ballot submission")
                .arg(
                    Arg::with_name("PUBLIC-KEY")
                        .index(1)
                        .required(true)
                        .help("JSON file holding a public key, or the output of keygen"),
                )
                .arg(
                    Arg::with_name("OPTION")
                        .index(2)
                        .required(true)
                        .help("The option number to vote for"),
                )
                .arg(
                    Arg::with_name("voting")
                        .long("voting")
                        .takes_value(true)
                        .required(true),
                )
                .arg(
                    Arg::with_name("voter")
                        .long("voter")
                        .takes_value(true)
                        .required(true),
                ),
        )
        .subcommand(
            SubCommand::with_name("simulate")
                .about("Run a complete voting in memory and print the tally")
                .arg(
                    Arg::with_name("options")
                        .long("options")
                        .takes_value(true)
                        .default_value("5"),
                )
                .arg(
                    Arg::with_name("voters")
                        .long("voters")
                        .takes_value(true)
                        .default_value("100"),
                )
                .arg(
                    Arg::with_name("turnout")
                        .long("turnout")
                        .takes_value(true)
                        .default_value("80")
                        .help("How many of the voters cast a ballot"),
                )
                .arg(
                    Arg::with_name("authorities")
                        .long("authorities")
                        .takes_value(true)
                        .default_value("2"),
                ),
        )
        .get_matches();

    init_logging(matches.occurrences_of("v"));

    let config = decide::Config::from_env().unwrap_or_else(|e| {
        eprintln!("decide: {}", e);
        std::process::exit(1);
    });
    debug!("config: {:?}", config);

    // Subcommands
    if let Some(matches) = matches.subcommand_matches("keygen") {
        command_keygen(matches, &config);
        std::process::exit(0);
    }

    if let Some(matches) = matches.subcommand_matches("encrypt") {
        command_encrypt(matches);
        std::process::exit(0);
    }

    if let Some(matches) = matches.subcommand_matches("simulate") {
        command_simulate(matches, config);
        std::process::exit(0);
    }

    eprintln!("decide: no command given, try --help");
    std::process::exit(1);
}

/// Where log output is configured from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LogSetup {
    File,
    Console(LevelFilter),
}

/// `log4rs.yaml` is used when present, unless `-v` asks for a level explicitly.
fn log_setup(verbosity: u64, file_exists: bool) -> LogSetup {
    match verbosity {
        0 if file_exists => LogSetup::File,
        0 => LogSetup::Console(LevelFilter::Warn),
        1 => LogSetup::Console(LevelFilter::Info),
        _ => LogSetup::Console(LevelFilter::Debug),
    }
}

fn init_logging(verbosity: u64) {
    use log4rs::append::console::{ConsoleAppender, Target};
    use log4rs::config::{Appender, Config, Root};
    use log4rs::encode::pattern::PatternEncoder;

    let file_exists = std::path::Path::new("log4rs.yaml").exists();
    let level = match log_setup(verbosity, file_exists) {
        LogSetup::File => match log4rs::init_file("log4rs.yaml", Default::default()) {
            Ok(()) => return,
            Err(e) => {
                eprintln!("decide: ignoring log4rs.yaml: {}", e);
                LevelFilter::Warn
            }
        },
        LogSetup::Console(level) => level,
    };

    let stderr = ConsoleAppender::builder()
        .target(Target::Stderr)
        .encoder(Box::new(PatternEncoder::new("{d(%H:%M:%S)} {h({l})} {t} - {m}{n}")))
        .build();
    let config = Config::builder()
        .appender(Appender::builder().build("stderr", Box::new(stderr)))
        .build(Root::builder().appender("stderr").build(level));

    match config {
        Ok(config) => {
            if let Err(e) = log4rs::init_config(config) {
                eprintln!("decide: unable to initialise logging: {}", e);
            }
        }
        Err(e) => eprintln!("decide: invalid logging config: {}", e),
    }
}

/// Parse a numeric argument or exit with a message.
pub fn parse_arg<T: std::str::FromStr>(matches: &clap::ArgMatches, name: &str) -> Option<T> {
    matches.value_of(name).map(|value| {
        value.parse().unwrap_or_else(|_| {
            eprintln!("decide: invalid value for {}: {}", name, value);
            std::process::exit(1);
        })
    })
}

/// Expand `~` and environment variables in a path
pub fn expand(path: &str) -> String {
    match shellexpand::full(path) {
        Ok(expanded) => expanded.into_owned(),
        Err(e) => {
            eprintln!("decide: unable to expand {}: {}", path, e);
            std::process::exit(1);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn verbosity_overrides_log_file() {
        assert_eq!(log_setup(0, true), LogSetup::File);
        assert_eq!(log_setup(0, false), LogSetup::Console(LevelFilter::Warn));
        assert_eq!(log_setup(1, true), LogSetup::Console(LevelFilter::Info));
        assert_eq!(log_setup(3, true), LogSetup::Console(LevelFilter::Debug));
    }
}
