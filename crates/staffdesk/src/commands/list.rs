//! `staffdesk list`: one page of a collection through a list controller.

use serde_json::Value;

use staffdesk_core::{Console, ListController, ListState, SortSpec};

use crate::cli::{GlobalOpts, ListArgs};
use crate::commands::util;
use crate::error::CliError;
use crate::output;

pub async fn handle(console: &Console, args: ListArgs, global: &GlobalOpts) -> Result<(), CliError> {
    let sort = args
        .sort
        .as_deref()
        .map(|raw| {
            SortSpec::parse(raw).ok_or_else(|| CliError::Validation {
                field: "sort".into(),
                reason: format!("expected KEY or KEY,asc|desc, got '{raw}'"),
            })
        })
        .transpose()?;

    let page_size = args.page_size.unwrap_or(console.config().default_page_size);
    let list = ListState::new(page_size)
        .with_page(args.page - 1)
        .with_sort(sort);
    let filter = util::filter_from_args(&args.query)?;
    let resource = util::resource_from_args(console, &args.query)?;

    let mut controller = ListController::<Value>::with_filter(
        resource,
        console.cache::<Value>(),
        list,
        filter,
        console.config().subscribe,
    );
    tracing::debug!(key = %controller.key(), "fetching page");

    let view = controller.settled().await;
    if let Some(err) = view.error {
        return Err(err.into());
    }

    let rendered = output::render_list(&global.output, view.items())?;
    output::print_output(&rendered, global.quiet);

    if matches!(global.output, crate::cli::OutputFormat::Table) {
        let pages = view
            .page
            .as_ref()
            .map_or(0, |page| page.page_count(page_size));
        output::print_status(
            &format!(
                "Page {} of {} ({} total)",
                args.page,
                pages.max(1),
                view.total()
            ),
            global.quiet,
        );
    }
    Ok(())
}
