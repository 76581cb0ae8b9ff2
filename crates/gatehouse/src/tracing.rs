use tracing::Level;
use tracing_subscriber::{
    prelude::__tracing_subscriber_SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer,
};

fn verbose_to_level(verbose: u8) -> Level {
    match verbose {
        0 => Level::ERROR,
        1 => Level::WARN,
        2 => Level::INFO,
        3 => Level::DEBUG,
        4..=u8::MAX => Level::TRACE,
    }
}

fn build_filter(verbose: u8) -> Result<EnvFilter, Box<dyn std::error::Error>> {
    if verbose > 0 {
        let level = verbose_to_level(verbose).as_str().to_lowercase();

        return Ok(EnvFilter::try_new(format!(
            "warn,gatehouse={level},gatehouse_auth={level},gatehouse_lock={level},gatehouse_store={level}"
        ))?);
    }

    Ok(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new("warn,gatehouse=info,gatehouse_auth=info,gatehouse_store=info")
    }))
}

// Output format follows GATEHOUSE_LOG_FORMAT: json, pretty, or compact (default)
pub(crate) fn setup_tracing(verbose: u8) -> Result<(), Box<dyn std::error::Error>> {
    let filter = build_filter(verbose)?;

    let layer = match std::env::var("GATEHOUSE_LOG_FORMAT")
        .map(|f| f.to_lowercase())
        .as_deref()
    {
        Ok("json") => tracing_subscriber::fmt::layer()
            .json()
            .with_writer(std::io::stderr)
            .with_filter(filter)
            .boxed(),
        Ok("pretty") => tracing_subscriber::fmt::layer()
            .pretty()
            .with_writer(std::io::stderr)
            .with_filter(filter)
            .boxed(),
        _ => tracing_subscriber::fmt::layer()
            .compact()
            .with_writer(std::io::stderr)
            .with_filter(filter)
            .boxed(),
    };

    tracing_subscriber::registry().with(layer).try_init()?;

    Ok(())
}
