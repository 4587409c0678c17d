//! `staffdesk all`: every row of a collection through the accumulator.

use std::time::Duration;

use indicatif::ProgressBar;
use serde_json::Value;

use staffdesk_core::{Accumulator, Console};

use crate::cli::{AllArgs, GlobalOpts};
use crate::commands::util;
use crate::error::CliError;
use crate::output;

pub async fn handle(console: &Console, args: AllArgs, global: &GlobalOpts) -> Result<(), CliError> {
    let filter = util::filter_from_args(&args.query)?;
    let resource = util::resource_from_args(console, &args.query)?;

    let mut accumulator: Accumulator<Value> = console.accumulator(resource).with_filter(filter);
    if let Some(page_size) = args.page_size {
        accumulator = accumulator.with_page_size(page_size);
    }

    let progress = if global.quiet {
        ProgressBar::hidden()
    } else {
        ProgressBar::new_spinner()
    };
    progress.enable_steady_tick(Duration::from_millis(120));
    progress.set_message(format!("Loading {}", args.query.resource));

    let mut state = accumulator.subscribe();
    let view = {
        let run = accumulator.run();
        tokio::pin!(run);
        loop {
            tokio::select! {
                view = &mut run => break view,
                changed = state.changed() => {
                    if changed.is_err() {
                        break (&mut run).await;
                    }
                    let snapshot = state.borrow_and_update().clone();
                    progress.set_message(format!(
                        "Loading {}: {} rows from {} pages",
                        args.query.resource,
                        snapshot.items.len(),
                        snapshot.pages_fetched
                    ));
                }
            }
        }
    };
    progress.finish_and_clear();

    let rendered = output::render_list(&global.output, &view.items)?;
    output::print_output(&rendered, global.quiet);

    if let Some(err) = view.error {
        // The prefix fetched before the failure is already printed.
        output::print_status(
            &format!("Stopped after {} rows.", view.items.len()),
            global.quiet,
        );
        return Err(err.into());
    }

    output::print_status(&format!("{} rows", view.items.len()), global.quiet);
    Ok(())
}
