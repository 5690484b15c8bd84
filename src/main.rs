use color_eyre::Result;
use color_eyre::eyre::Context;
use log::info;

use xkcd_sync::{Config, JsonFileStore, XkcdClient, sync};

fn main() -> Result<()> {
    color_eyre::install()?;
    dotenvy::dotenv().ok();
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = Config::from_env()?;
    let _sentry = config.sentry_dsn.as_deref().map(|dsn| {
        sentry::init((
            dsn,
            sentry::ClientOptions {
                release: sentry::release_name!(),
                ..Default::default()
            },
        ))
    });

    let client = XkcdClient::new(&config)?;
    let store = JsonFileStore::new(&config.dataset_path);
    info!("syncing {}", store.path().display());

    let result = sync::run(&store, &client, config.request_delay());
    if let Err(err) = &result {
        sentry::capture_error(err);
    }
    result.wrap_err_with(|| format!("failed to sync {}", store.path().display()))?;
    Ok(())
}
