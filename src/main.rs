use chrono::Utc;
use log::LevelFilter;
use simple_logger::SimpleLogger;
use std::{env, io, process::ExitCode, sync::mpsc};

use temp_dash::{
    app::{config::AppConfig, App},
    poll::Poller,
    sink::{ChannelSink, CsvSink},
};

struct Options {
    headless: bool,
    config_path: String,
}

fn usage(program: &str) {
    eprintln!("Usage: {program} [--headless] [CONFIG]");
    eprintln!("    --headless    print `elapsed,temperature` lines instead of the dashboard");
    eprintln!("    CONFIG        yaml config file (default: {})", AppConfig::PATH);
}

fn parse_args() -> Result<Options, ()> {
    let mut args = env::args();
    let program = args.next().unwrap_or_else(|| "temp-dash".to_string());
    let mut options = Options {
        headless: false,
        config_path: AppConfig::PATH.to_string(),
    };
    let mut config_given = false;
    for arg in args {
        match arg.as_str() {
            "--headless" => options.headless = true,
            "-h" | "--help" => {
                usage(&program);
                return Err(());
            }
            flag if flag.starts_with('-') => {
                usage(&program);
                eprintln!("ERROR: unknown option {flag}");
                return Err(());
            }
            path if !config_given => {
                options.config_path = path.to_string();
                config_given = true;
            }
            extra => {
                usage(&program);
                eprintln!("ERROR: unexpected argument {extra}");
                return Err(());
            }
        }
    }
    Ok(options)
}

async fn run_headless(config: AppConfig) -> Result<(), io::Error> {
    let sink = CsvSink::new(io::stdout(), Utc::now());
    let poller = Poller::new(config.poll_config(), sink).map_err(io::Error::other)?;
    tokio::select! {
        _ = poller.run() => {}
        signal = tokio::signal::ctrl_c() => signal?,
    }
    Ok(())
}

async fn run_dashboard(config: AppConfig, notice: Option<String>) -> Result<(), io::Error> {
    let (tx, rx) = mpsc::channel();
    let poller = Poller::new(config.poll_config(), ChannelSink::new(tx)).map_err(io::Error::other)?;
    let poll_task = tokio::spawn(poller.run());

    let app = App::new(&config, rx, notice);
    let terminal = ratatui::init();
    let result = tokio::task::spawn_blocking(move || app.run(terminal)).await;
    ratatui::restore();
    poll_task.abort();
    result.map_err(io::Error::other)?
}

#[tokio::main]
async fn main() -> ExitCode {
    let Ok(options) = parse_args() else {
        return ExitCode::FAILURE;
    };

    let (config, config_err) = AppConfig::load_or_default(&options.config_path);
    // before any logger or terminal setup, so it is seen whatever the level
    let notice = config_err.map(|err| format!("{} ({}), using defaults", err, options.config_path));
    if let Some(notice) = &notice {
        eprintln!("WARNING: {notice}");
    }
    // the dashboard owns the terminal, so it stays quiet unless asked
    let fallback = if options.headless {
        LevelFilter::Info
    } else {
        LevelFilter::Off
    };
    if let Err(err) = SimpleLogger::new()
        .with_level(config.log_level(fallback))
        .init()
    {
        eprintln!("ERROR: cannot set up logging: {err}");
    }

    let result = if options.headless {
        run_headless(config).await
    } else {
        run_dashboard(config, notice).await
    };
    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("ERROR: {err}");
            ExitCode::FAILURE
        }
    }
}
