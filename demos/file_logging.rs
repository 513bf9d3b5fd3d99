//! File sinks: a rotating application log plus a JSON audit trail.

use hierlog::{
    args, Formatter, Handler, Registry, RotatingFileHandler, BASIC_FORMAT, DEBUG, INFO, TO_JSON,
};
use std::sync::Arc;

fn main() -> hierlog::Result<()> {
    let registry = Registry::new();

    // rotating text log: 64 KiB per generation, three generations kept
    let rotating = Arc::new(
        RotatingFileHandler::new("logs/app.log", 64 * 1024, 3)?
            .with_formatter(Formatter::new(BASIC_FORMAT).with_datefmt("%H:%M:%S")),
    );
    registry.root().add_handler(rotating.clone());

    // structured audit trail, one JSON object per line
    let audit = Arc::new(
        hierlog::FileHandler::new("logs/audit.jsonl")?.with_formatter(Formatter::new(TO_JSON)),
    );
    audit.core().set_level(INFO)?;
    let payments = registry.get_logger("app.payments");
    payments.add_handler(audit.clone());

    registry.root().set_level(DEBUG)?;

    let app = registry.get_logger("app");
    app.info("booted").wait()?;
    for order in 0..5 {
        payments
            .info(args!["order %d captured for %s", order, "acct-991"])
            .wait()?;
    }
    payments.debug("audit handler ignores this, the text log keeps it").wait()?;

    rotating.flush()?;
    audit.flush()?;
    println!("wrote logs/app.log and logs/audit.jsonl");
    Ok(())
}
