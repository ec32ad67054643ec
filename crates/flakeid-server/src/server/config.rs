use std::time::Duration;

use clap::{Args, Parser, Subcommand, ValueEnum};
use flakeid::{DEFAULT_EPOCH, ExhaustionPolicy, MultiFlakeGenerator, unix_millis, validate_machine_ids};

use crate::server::{
    error::{Error, Result},
    service::config::{Clock, Generator},
};

/// Command line interface for the `flakeid-server` binary.
///
/// Every flag can also be provided through the environment variable named in
/// its help text, or through a `.env` file in the working directory.
#[derive(Parser, Debug, Clone)]
#[command(
    name = "flakeid-server",
    version,
    about = "Generates distributed Snowflake-style IDs"
)]
pub struct CliArgs {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Opens a TCP server to request IDs.
    Serve(ServeArgs),
    /// Runs a simple benchmark to estimate theoretical ID throughput.
    Bench(BenchArgs),
    /// Requests IDs from a running server and prints them.
    Probe(ProbeArgs),
}

/// Settings shared by every subcommand that owns a generator.
#[derive(Args, Debug, Clone)]
pub struct GeneratorArgs {
    /// Epoch in seconds relative to the UNIX epoch, or `now`.
    ///
    /// The creation time of IDs counts from this epoch. `now` uses the
    /// current time, which is handy for testing but produces overlapping IDs
    /// between runs.
    ///
    /// Environment variable: `FLAKEID_EPOCH`
    #[arg(short = 't', long, env = "FLAKEID_EPOCH", value_name = "SECONDS", default_value_t = DEFAULT_EPOCH.as_secs().to_string())]
    pub epoch: String,

    /// Machine IDs to use when generating IDs (0-1023).
    ///
    /// If several are given, they are all used round-robin to increase the
    /// maximum possible throughput. IDs then stay ordered by timestamp and
    /// per machine ID, not by full value.
    ///
    /// Environment variable: `FLAKEID_MACHINE_IDS` (comma separated)
    #[arg(
        short,
        long = "machine",
        env = "FLAKEID_MACHINE_IDS",
        value_name = "ID",
        value_delimiter = ',',
        num_args = 1..,
        default_value = "0"
    )]
    pub machine_ids: Vec<u64>,

    /// What to do once a millisecond's sequence space is used up.
    ///
    /// Environment variable: `FLAKEID_ON_EXHAUSTED`
    #[arg(long, env = "FLAKEID_ON_EXHAUSTED", value_enum, default_value_t = OnExhausted::Wait)]
    pub on_exhausted: OnExhausted,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum OnExhausted {
    /// Hold the request until the next millisecond.
    Wait,
    /// Close the requesting connection.
    Fail,
}

impl From<OnExhausted> for ExhaustionPolicy {
    fn from(value: OnExhausted) -> Self {
        match value {
            OnExhausted::Wait => Self::Wait,
            OnExhausted::Fail => Self::Fail,
        }
    }
}

#[derive(Args, Debug, Clone)]
pub struct ServeArgs {
    #[command(flatten)]
    pub generator: GeneratorArgs,

    /// Address to bind.
    ///
    /// Environment variable: `FLAKEID_BIND`
    #[arg(short, long, env = "FLAKEID_BIND", value_name = "HOST:PORT", default_value = "0.0.0.0:47322")]
    pub bind: String,

    /// Close connections that send nothing for this many milliseconds.
    /// Disabled when unset.
    ///
    /// Environment variable: `FLAKEID_IDLE_TIMEOUT_MS`
    #[arg(long, env = "FLAKEID_IDLE_TIMEOUT_MS", value_name = "MS")]
    pub idle_timeout_ms: Option<u64>,
}

#[derive(Args, Debug, Clone)]
pub struct BenchArgs {
    #[command(flatten)]
    pub generator: GeneratorArgs,

    /// How long to generate for.
    #[arg(long, value_name = "MS", default_value_t = 5000)]
    pub duration_ms: u64,
}

#[derive(Args, Debug, Clone)]
pub struct ProbeArgs {
    /// Server address.
    ///
    /// Environment variable: `FLAKEID_ADDR`
    #[arg(short, long, env = "FLAKEID_ADDR", value_name = "HOST:PORT", default_value = "127.0.0.1:47322")]
    pub addr: String,

    /// Number of IDs to request over the same connection.
    #[arg(short = 'n', long, default_value_t = 1)]
    pub count: usize,
}

/// Validated generator settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratorConfig {
    pub epoch: Duration,
    pub machine_ids: Vec<u64>,
    pub policy: ExhaustionPolicy,
}

impl GeneratorConfig {
    /// Starts the shared clock and builds one generator delegate per machine
    /// ID.
    pub fn build(&self) -> Result<Generator> {
        let clock = Clock::try_with_epoch(self.epoch)?;
        let generator = MultiFlakeGenerator::try_new(&self.machine_ids, clock)?
            .with_exhaustion_policy(self.policy);
        Ok(generator)
    }
}

impl TryFrom<GeneratorArgs> for GeneratorConfig {
    type Error = Error;

    fn try_from(args: GeneratorArgs) -> Result<Self> {
        let epoch = parse_epoch(&args.epoch)?;

        validate_machine_ids(&args.machine_ids).map_err(|e| invalid(e.to_string()))?;

        Ok(Self {
            epoch,
            machine_ids: args.machine_ids,
            policy: args.on_exhausted.into(),
        })
    }
}

/// Validated settings for `serve`.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub bind: String,
    pub idle_timeout: Option<Duration>,
    pub generator: GeneratorConfig,
}

impl TryFrom<ServeArgs> for ServerConfig {
    type Error = Error;

    fn try_from(args: ServeArgs) -> Result<Self> {
        let idle_timeout = match args.idle_timeout_ms {
            Some(0) => return Err(invalid("FLAKEID_IDLE_TIMEOUT_MS must be greater than 0".to_string())),
            Some(ms) => Some(Duration::from_millis(ms)),
            None => None,
        };

        Ok(Self {
            bind: args.bind,
            idle_timeout,
            generator: GeneratorConfig::try_from(args.generator)?,
        })
    }
}

/// Parses an epoch given as whole seconds since the UNIX epoch, or `now`.
///
/// Epochs in the future are rejected: they would make every timestamp
/// negative.
pub fn parse_epoch(value: &str) -> Result<Duration> {
    let now_ms = unix_millis();
    let epoch = match value.trim() {
        "now" => Duration::from_millis(now_ms),
        secs => secs
            .parse::<u64>()
            .map(Duration::from_secs)
            .map_err(|_| invalid(format!("{secs:?} is not a valid integer epoch")))?,
    };

    if epoch.as_millis() > u128::from(now_ms) {
        return Err(invalid(format!(
            "epoch {}s is in the future",
            epoch.as_secs()
        )));
    }
    Ok(epoch)
}

fn invalid(reason: String) -> Error {
    Error::InvalidConfig { reason }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> CliArgs {
        CliArgs::try_parse_from(args).unwrap()
    }

    fn generator_args(machine_ids: Vec<u64>) -> GeneratorArgs {
        GeneratorArgs {
            epoch: "1262304000".to_string(),
            machine_ids,
            on_exhausted: OnExhausted::Wait,
        }
    }

    #[test]
    fn serve_defaults() {
        let Command::Serve(args) = parse(&["flakeid-server", "serve"]).command else {
            panic!("expected serve");
        };
        let config = ServerConfig::try_from(args).unwrap();

        assert_eq!(config.bind, "0.0.0.0:47322");
        assert_eq!(config.idle_timeout, None);
        assert_eq!(config.generator.epoch, DEFAULT_EPOCH);
        assert_eq!(config.generator.machine_ids, vec![0]);
        assert_eq!(config.generator.policy, ExhaustionPolicy::Wait);
    }

    #[test]
    fn serve_accepts_repeated_and_delimited_machine_ids() {
        let cli = parse(&[
            "flakeid-server", "serve", "-m", "1", "-m", "2,3", "--bind", "127.0.0.1:9000",
            "--on-exhausted", "fail", "--idle-timeout-ms", "250",
        ]);
        let Command::Serve(args) = cli.command else {
            panic!("expected serve");
        };
        let config = ServerConfig::try_from(args).unwrap();

        assert_eq!(config.bind, "127.0.0.1:9000");
        assert_eq!(config.idle_timeout, Some(Duration::from_millis(250)));
        assert_eq!(config.generator.machine_ids, vec![1, 2, 3]);
        assert_eq!(config.generator.policy, ExhaustionPolicy::Fail);
    }

    #[test]
    fn probe_and_bench_parse() {
        let Command::Probe(probe) = parse(&["flakeid-server", "probe", "-n", "3"]).command else {
            panic!("expected probe");
        };
        assert_eq!(probe.count, 3);
        assert_eq!(probe.addr, "127.0.0.1:47322");

        let Command::Bench(bench) =
            parse(&["flakeid-server", "bench", "--duration-ms", "10", "-t", "now"]).command
        else {
            panic!("expected bench");
        };
        assert_eq!(bench.duration_ms, 10);
        assert_eq!(bench.generator.epoch, "now");
    }

    #[test]
    fn rejects_zero_idle_timeout() {
        let Command::Serve(args) =
            parse(&["flakeid-server", "serve", "--idle-timeout-ms", "0"]).command
        else {
            panic!("expected serve");
        };
        assert!(matches!(
            ServerConfig::try_from(args),
            Err(Error::InvalidConfig { .. })
        ));
    }

    #[test]
    fn epoch_parsing() {
        assert_eq!(parse_epoch("1262304000").unwrap(), DEFAULT_EPOCH);
        assert_eq!(parse_epoch("0").unwrap(), Duration::ZERO);

        let now = parse_epoch("now").unwrap();
        assert!(now.as_millis().abs_diff(u128::from(unix_millis())) < 1_000);

        assert!(parse_epoch("2010-1-1").is_err());
        assert!(parse_epoch("-5").is_err());
        let future = (unix_millis() / 1000 + 3600).to_string();
        assert!(parse_epoch(&future).is_err());
    }

    #[test]
    fn rejects_out_of_range_machine_id() {
        let err = GeneratorConfig::try_from(generator_args(vec![1024])).unwrap_err();
        assert!(matches!(err, Error::InvalidConfig { .. }));
        assert!(GeneratorConfig::try_from(generator_args(vec![1023])).is_ok());
    }

    #[test]
    fn rejects_duplicate_and_missing_machine_ids() {
        let dup = GeneratorConfig::try_from(generator_args(vec![4, 5, 4])).unwrap_err();
        let expected = flakeid::Error::DuplicateMachineId { machine_id: 4 }.to_string();
        assert!(matches!(dup, Error::InvalidConfig { reason } if reason == expected));

        let empty = GeneratorConfig::try_from(generator_args(vec![])).unwrap_err();
        let expected = flakeid::Error::NoMachineIds.to_string();
        assert!(matches!(empty, Error::InvalidConfig { reason } if reason == expected));
    }

    #[test]
    fn builds_generator_with_every_machine_id() {
        let config = GeneratorConfig::try_from(generator_args(vec![7, 9])).unwrap();
        let generator = config.build().unwrap();
        assert_eq!(generator.num_generators(), 2);
    }
}
