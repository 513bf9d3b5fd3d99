//! Minimal setup: one console handler on root, hierarchical thresholds.

use hierlog::{args, Arg, BasicConfig, DEBUG};

fn main() -> hierlog::Result<()> {
    hierlog::basic_config(BasicConfig::new().with_level(DEBUG))?;

    let app = hierlog::get_logger("app");
    let db = hierlog::get_logger("app.db");

    app.info("application starting").wait()?;
    db.debug(args!["connecting to %s", "postgres://localhost"]).wait()?;
    db.info(args!["pool ready with %d connections", 8]).wait()?;

    // quiet the db subtree without touching the rest of the app
    db.set_level(hierlog::WARN)?;
    db.info("this no longer appears").wait()?;
    db.warn("but warnings still do").wait()?;

    // errors carry a captured stack
    let err = std::io::Error::new(std::io::ErrorKind::TimedOut, "query timed out");
    db.error(args!["slow query: %s", Arg::error(&err)]).wait()?;

    Ok(())
}
