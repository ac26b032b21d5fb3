use anyhow::Result;
use colored::Colorize;
use log::{debug, error, info, warn};
use tokio::io::BufReader;

use tdlfast::cli::{Cli, Command, DlArgs};
use tdlfast::menu::Menu;
use tdlfast::progress::{ProgressMode, ProgressReporter};
use tdlfast::tdl::{build_download_args, Invocation, SystemRunner, TdlConfig};

#[tokio::main]
async fn main() {
    if let Err(err) = run().await {
        error!("{err:#}");
        let code = err
            .downcast_ref::<tdlfast::Error>()
            .map_or(1, tdlfast::Error::exit_code);
        std::process::exit(code);
    }
}

async fn run() -> Result<()> {
    let cli = Cli::parse();
    init_logger(&cli);

    debug!("CLI arguments: {:?}", cli);
    let config = TdlConfig::from(&cli);

    match cli.command.clone().unwrap_or(Command::Menu) {
        Command::Dl(args) => download(&cli, config, &args).await,
        Command::Login { app_id, app_hash } => {
            let tdl = config.open(SystemRunner).await?;
            if !tdl.login(app_id.as_deref(), app_hash.as_deref()).await? {
                let err = tdlfast::Error::ExternalFailure("tdl login did not complete".into());
                return Err(err.into());
            }
            info!("Login completed");
            Ok(())
        }
        Command::Chats => {
            let tdl = config.open(SystemRunner).await?;
            let chats = tdl.list_chats().await?;
            if chats.is_empty() {
                warn!("no chats listed; run `tdlfast login` first");
            }
            for chat in chats {
                println!("{chat}");
            }
            Ok(())
        }
        Command::Menu => {
            let tdl = config.open(SystemRunner).await?;
            let mut menu = Menu::new(&tdl, BufReader::new(tokio::io::stdin()), std::io::stdout());
            menu.run().await?;
            Ok(())
        }
    }
}

async fn download(cli: &Cli, config: TdlConfig, args: &DlArgs) -> Result<()> {
    let request = args.request(&config)?;
    if args.dry_run {
        let invocation = Invocation::new(&config.program, build_download_args(&request)?);
        println!("{invocation}");
        return Ok(());
    }

    let tdl = config.open(SystemRunner).await?;
    let label = request.locator.resolve()?;
    let mode = cli.progress_mode();
    let reporter = ProgressReporter::start(mode, &label);
    let result = match tdl.download(&request).await {
        Ok(result) => result,
        Err(err) => {
            if let Some(reporter) = reporter {
                reporter.abort(&err.to_string());
            }
            return Err(err.into());
        }
    };
    if let Some(reporter) = reporter {
        reporter.finish(&result);
    }

    let message = result.into_result()?;
    if mode == ProgressMode::Text {
        println!("{} {}", "Done:".green().bold(), message);
    }
    info!("Download completed successfully");
    Ok(())
}

fn init_logger(cli: &Cli) {
    use env_logger::Env;
    use log::LevelFilter;

    let mut builder = env_logger::Builder::from_env(Env::default().default_filter_or("info"));
    let level = if cli.quiet {
        LevelFilter::Error
    } else if cli.verbose {
        LevelFilter::Debug
    } else {
        LevelFilter::Info
    };
    builder.filter_level(level);
    if !cli.verbose {
        builder.format_timestamp_secs();
    }
    let _ = builder.try_init();
}
