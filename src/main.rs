#[macro_use]
extern crate failure;
#[macro_use]
extern crate serde_derive;
#[macro_use]
extern crate slog;

use std::env;
use std::str;
use std::sync;

use slog::Drain;
use structopt::StructOpt;

pub mod clock;
pub mod dashboard;
pub mod generator;
pub mod model;
pub mod scheduler;
pub mod settings;
pub mod util;

#[derive(Debug, StructOpt)]
#[structopt(
    name = "soilwatch",
    about = "Renders a soil moisture dashboard from simulated sensor readings."
)]
struct Options {
    /// Base name of the configuration file; the extension is optional.
    #[structopt(short, long, default_value = "soilwatch")]
    config: String,
    /// Output format, `text` or `json`.
    #[structopt(short, long, default_value = "text")]
    format: Format,
    /// Generate one series, render it and exit without starting the refresh timer.
    #[structopt(long)]
    once: bool,
    /// Seed for the noise generator, overriding the configuration.
    #[structopt(long)]
    seed: Option<u64>,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
enum Format {
    Text,
    Json,
}

impl str::FromStr for Format {
    type Err = failure::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "text" => Ok(Format::Text),
            "json" => Ok(Format::Json),
            other => Err(format_err!(
                "unknown format {:?}, expected \"text\" or \"json\"",
                other
            )),
        }
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), failure::Error> {
    let options = Options::from_args();

    let log = root_logger();
    let _scope_guard = slog_scope::set_global_logger(log.clone());
    slog_stdlog::init()?;

    let mut settings = settings::Settings::load(&options.config)?;
    if options.seed.is_some() {
        settings.seed = options.seed;
    }
    info!(log, "started";
          "results" => settings.results,
          "refresh_sec" => settings.refresh_sec,
          "seeded" => settings.seed.is_some());

    let mut generator = generator::Generator::new(&settings);

    if options.once {
        let state = scheduler::snapshot(&mut generator, &clock::SystemClock)?;
        return render(&dashboard::Dashboard::new(&state, &settings), options.format);
    }

    let handle = scheduler::start(
        &log,
        generator,
        sync::Arc::new(clock::SystemClock),
        settings.refresh_period(),
    );

    let mut updates = handle.subscribe();
    let state = updates.borrow_and_update().clone();
    render(&dashboard::Dashboard::new(&state, &settings), options.format)?;

    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);

    loop {
        tokio::select! {
            interrupted = &mut ctrl_c => {
                interrupted?;
                info!(log, "interrupted, shutting down");
                break;
            }
            changed = updates.changed() => {
                if changed.is_err() {
                    warn!(log, "refresh loop went away");
                    break;
                }
                let state = updates.borrow().clone();
                if !state.loading {
                    render(&dashboard::Dashboard::new(&state, &settings), options.format)?;
                }
            }
        }
    }

    handle.stop().await;
    info!(log, "stopped");

    Ok(())
}

fn root_logger() -> slog::Logger {
    let decorator = slog_term::TermDecorator::new().stderr().build();
    let drain = slog_term::FullFormat::new(decorator).build().fuse();

    let mut filter = slog_envlogger::LogBuilder::new(drain).filter(None, slog::FilterLevel::Info);
    if let Ok(spec) = env::var("RUST_LOG") {
        filter = filter.parse(&spec);
    }
    let drain = filter.build().ignore_res();
    let drain = slog_async::Async::new(drain).build().fuse();

    slog::Logger::root(drain, o!("version" => env!("CARGO_PKG_VERSION")))
}

fn render(dashboard: &dashboard::Dashboard, format: Format) -> Result<(), failure::Error> {
    match format {
        Format::Text => println!("{}", dashboard),
        Format::Json => println!("{}", dashboard.to_json()?),
    }
    Ok(())
}
