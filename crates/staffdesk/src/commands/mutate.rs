//! `staffdesk create | update | delete`.
//!
//! Each mutation runs through a list controller watching the first page
//! of the collection, so a successful write refetches that page and the
//! new row count is reported.

use serde_json::Value;

use staffdesk_core::{Console, ListController};

use crate::cli::{CreateArgs, DeleteArgs, GlobalOpts, UpdateArgs};
use crate::commands::util;
use crate::error::CliError;
use crate::output;

fn controller(console: &Console, path: &str) -> ListController<Value> {
    console.controller(console.resource::<Value>(path))
}

/// Wait for the post-mutation refetch and report the collection size.
async fn report_refetch(controller: &mut ListController<Value>, global: &GlobalOpts) {
    let view = controller.settled().await;
    match view.error {
        Some(err) => tracing::warn!(
            key = %controller.key(),
            error = %err,
            "could not reload the collection after the change"
        ),
        None => output::print_status(
            &format!(
                "{} now holds {} rows.",
                controller.resource().path(),
                view.total()
            ),
            global.quiet,
        ),
    }
}

fn print_result(result: Option<&Value>, fallback: &str, global: &GlobalOpts) -> Result<(), CliError> {
    match result {
        Some(item) => {
            let rendered = output::render_single(&global.output, item)?;
            output::print_output(&rendered, global.quiet);
        }
        None => output::print_status(fallback, global.quiet),
    }
    Ok(())
}

pub async fn create(console: &Console, args: CreateArgs, global: &GlobalOpts) -> Result<(), CliError> {
    let body = util::read_body(&args.body)?;
    let mut controller = controller(console, &args.resource);

    let created = controller.create(body).await?;
    print_result(created.as_ref(), "Created.", global)?;
    report_refetch(&mut controller, global).await;
    Ok(())
}

pub async fn update(console: &Console, args: UpdateArgs, global: &GlobalOpts) -> Result<(), CliError> {
    let body = util::read_body(&args.body)?;
    let mut controller = controller(console, &args.resource);

    let updated = controller.update(&args.id, body).await?;
    print_result(updated.as_ref(), &format!("Updated {}.", args.id), global)?;
    report_refetch(&mut controller, global).await;
    Ok(())
}

pub async fn delete(console: &Console, args: DeleteArgs, global: &GlobalOpts) -> Result<(), CliError> {
    let prompt = format!("Delete {} from {}?", args.id, args.resource);
    if !util::confirm(&prompt, global.yes)? {
        output::print_status("Aborted.", global.quiet);
        return Ok(());
    }
    let mut controller = controller(console, &args.resource);

    controller.delete(&args.id).await?;
    output::print_status(&format!("Deleted {}.", args.id), global.quiet);
    report_refetch(&mut controller, global).await;
    Ok(())
}
