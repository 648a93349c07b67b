use std::cell::RefCell;
use std::future::Future;
use std::rc::Rc;
use std::sync::Arc;

use dioxus::prelude::*;
use rfd::{FileDialog, MessageButtons, MessageDialog, MessageDialogResult, MessageLevel};

use crate::config::GridConfig;
use crate::domain::entities::column::{known_columns, ColumnKind, NewColumnKind};
use crate::domain::entities::edit::{apply_cell_edit, validate_cell_edit, CellKey};
use crate::domain::entities::page::{PageState, SortDirection, PAGE_SIZE_OPTIONS};
use crate::domain::entities::row::{Row, ID_COLUMN};
use crate::infra::sqlite::source::SqliteTableSource;
use crate::ui::state::app_state::AppState;
use crate::usecase::ports::table_source::TableSource;
use crate::usecase::services::column_projector::{is_renamable, new_column_name, rename_request};
use crate::usecase::services::grid_store::GridStore;
use crate::usecase::services::import_service::ImportService;
use crate::usecase::services::mutation_gateway::{MutationError, MutationGateway};

const SEARCHABLE_COLUMNS: [&str; 2] = ["domain", "name"];

#[derive(Clone)]
struct GridServices {
    store: GridStore,
    gateway: MutationGateway,
}

fn open_services(config: &GridConfig) -> Result<GridServices, String> {
    let source = SqliteTableSource::open(config.db_path.clone(), &config.table)
        .map_err(|err| err.to_string())?;
    let source: Arc<dyn TableSource> = Arc::new(source);
    let store = GridStore::with_page_state(
        source.clone(),
        config.table.clone(),
        known_columns(),
        PageState::default()
            .with_page(1, config.page_size)
            .with_sort(ID_COLUMN, config.sort_order),
    );
    let gateway = MutationGateway::new(source, store.clone(), config.schema.clone());
    Ok(GridServices { store, gateway })
}

fn table_cell_style() -> &'static str {
    "border: 1px solid #bbb; padding: 4px 8px; text-align: left;"
}

fn table_header_cell_style() -> &'static str {
    "border: 1px solid #bbb; padding: 6px 8px; background: #f4f4f4; text-align: left; white-space: nowrap;"
}

fn change_page(store: GridStore, next: PageState, mut status: Signal<String>) {
    spawn(async move {
        if let Err(err) = store.set_page_state(next).await {
            status.set(format!("Failed to load rows: {err}"));
        }
    });
}

fn run_mutation<F>(label: &'static str, fut: F, mut status: Signal<String>, mut busy: Signal<bool>)
where
    F: Future<Output = Result<(), MutationError>> + 'static,
{
    busy.set(true);
    spawn(async move {
        match fut.await {
            Ok(()) => status.set(format!("{label}: done")),
            Err(err) => status.set(format!("{label} failed: {err}")),
        }
        busy.set(false);
    });
}

#[component]
fn Avatar(url: String, fallback: String) -> Element {
    if url.trim().is_empty() {
        let initial = fallback
            .chars()
            .next()
            .map(|ch| ch.to_uppercase().to_string())
            .unwrap_or_else(|| "?".to_string());
        return rsx! {
            span {
                style: "display: inline-flex; width: 32px; height: 32px; border-radius: 50%; background: #ccd; align-items: center; justify-content: center;",
                "{initial}"
            }
        };
    }
    rsx! {
        img {
            src: "{url}",
            style: "width: 32px; height: 32px; border-radius: 50%; object-fit: cover;",
        }
    }
}

#[component]
pub fn App() -> Element {
    let services = use_hook(|| {
        GridConfig::from_env()
            .map_err(|err| err.to_string())
            .and_then(|config| open_services(&config))
    });
    let GridServices { store, gateway } = match services {
        Ok(services) => services,
        Err(err) => {
            return rsx! {
                div {
                    p { "Unable to open the data source: {err}" }
                }
            };
        }
    };

    let AppState {
        mut snapshot,
        mut status,
        busy,
        mut editing_cell,
        mut editing_value,
        mut renaming_column,
        mut rename_value,
        mut filter_field,
        mut filter_text,
        mut added_columns,
        mut show_add_column,
    } = AppState::new(store.snapshot());

    let store_for_feed = store.clone();
    use_hook(move || {
        let mut receiver = store_for_feed.watch();
        spawn(async move {
            loop {
                let next = receiver.borrow_and_update().clone();
                tracing::trace!(version = next.version, phase = ?next.phase, "grid snapshot");
                snapshot.set(next);
                if receiver.changed().await.is_err() {
                    break;
                }
            }
        });
    });

    let store_for_init = store.clone();
    let subscription = use_hook(move || {
        let page_state = store_for_init.snapshot().page_state;
        change_page(store_for_init.clone(), page_state, status);
        Rc::new(RefCell::new(Some(store_for_init.subscribe_to_changes())))
    });

    let store_for_drop = store.clone();
    use_drop(move || {
        if let Some(subscription) = subscription.borrow_mut().take() {
            if subscription.is_active() {
                subscription.unsubscribe();
            }
        }
        store_for_drop.shutdown();
    });

    let current = snapshot();
    let page_state = current.page_state.clone();
    let columns = current.columns.clone();
    let rows = current.rows.clone();
    let known = store.known_columns().to_vec();
    let page_count = page_state.page_count(current.total.unwrap_or(0));
    let total_label = match current.total {
        Some(total) => format!("Total {total} items"),
        None => "Total unknown".to_string(),
    };
    let error_banner = current.last_error.as_ref().map(|err| err.to_string());
    let loading = current.loading;
    let editing_snapshot = editing_cell();
    let renaming_snapshot = renaming_column();

    let gateway_for_add_row = gateway.clone();
    let gateway_for_add_column = gateway.clone();
    let gateway_for_import = gateway.clone();
    let store_for_search = store.clone();
    let store_for_reset = store.clone();
    let store_for_prev = store.clone();
    let store_for_next = store.clone();
    let store_for_size = store.clone();
    let page_for_search = page_state.clone();
    let page_for_reset = page_state.clone();
    let page_for_prev = page_state.clone();
    let page_for_next = page_state.clone();
    let page_for_size = page_state.clone();

    rsx! {
        div {
            style: "padding: 12px; font-family: sans-serif;",
            nav {
                style: "display: flex; gap: 8px; align-items: center; flex-wrap: wrap; margin-bottom: 12px;",
                button {
                    disabled: busy(),
                    onclick: move |_| {
                        let gateway = gateway_for_add_row.clone();
                        let row = Row::new().with("name", "").with("domain", "").with("url", "");
                        run_mutation("Add row", async move { gateway.create(row).await }, status, busy);
                    },
                    "+ Add row"
                }
                button {
                    disabled: busy(),
                    onclick: move |_| show_add_column.set(!show_add_column()),
                    "+ Add column"
                }
                if show_add_column() {
                    {NewColumnKind::ALL.into_iter().map(|kind| {
                        let gateway = gateway_for_add_column.clone();
                        rsx!(
                            button {
                                key: "{kind.label()}",
                                style: "background: #eef4ff;",
                                onclick: move |_| {
                                    let seq = added_columns() + 1;
                                    added_columns.set(seq);
                                    show_add_column.set(false);
                                    let gateway = gateway.clone();
                                    let name = new_column_name(seq);
                                    run_mutation(
                                        "Add column",
                                        async move { gateway.add_column(&name, kind).await },
                                        status,
                                        busy,
                                    );
                                },
                                "{kind.label()}"
                            }
                        )
                    })}
                }
                button {
                    disabled: busy(),
                    onclick: move |_| {
                        let Some(path) = FileDialog::new()
                            .add_filter("CSV", &["csv"])
                            .pick_file() else {
                            status.set("Import cancelled".to_string());
                            return;
                        };
                        let importer = ImportService::new(gateway_for_import.clone());
                        let mut busy = busy;
                        busy.set(true);
                        spawn(async move {
                            match importer.import_csv(&path).await {
                                Ok(count) => status.set(format!("Imported {count} rows")),
                                Err(err) => status.set(format!("Import failed: {err:#}")),
                            }
                            busy.set(false);
                        });
                    },
                    "Import CSV"
                }
                span { style: "margin-left: 16px;", "Search" }
                select {
                    value: "{filter_field}",
                    onchange: move |event| filter_field.set(event.value()),
                    for field in SEARCHABLE_COLUMNS {
                        option { key: "{field}", value: "{field}", "{field}" }
                    }
                }
                input {
                    value: "{filter_text}",
                    placeholder: "Search {filter_field}",
                    oninput: move |event| filter_text.set(event.value()),
                    onkeydown: move |event| {
                        if event.key() == Key::Enter {
                            let next = page_for_search.with_filter(filter_field(), filter_text());
                            change_page(store_for_search.clone(), next, status);
                        }
                    }
                }
                button {
                    onclick: move |_| {
                        filter_text.set(String::new());
                        change_page(store_for_reset.clone(), page_for_reset.without_filter(), status);
                    },
                    "Reset"
                }
                if loading {
                    span { style: "color: #888;", "Loading…" }
                }
            }

            if let Some(message) = error_banner {
                div {
                    style: "background: #fdecea; border: 1px solid #d24; padding: 6px 10px; margin-bottom: 8px;",
                    "{message}"
                }
            }

            table { style: "border-collapse: collapse; width: 100%; background: #fff;",
                thead {
                    tr {
                        {columns.iter().map(|column| {
                            let column = column.clone();
                            let renamable = is_renamable(&column, &known);
                            let sortable = column.kind != ColumnKind::Operation;
                            let direction = page_state.sort_direction_for(&column.key);
                            let marker = match direction {
                                Some(SortDirection::Ascending) => " ▲",
                                Some(SortDirection::Descending) => " ▼",
                                None => "",
                            };
                            let header_key = column.key.clone();
                            if renaming_snapshot.as_deref() == Some(column.key.as_str()) {
                                let known = known.clone();
                                let gateway = gateway.clone();
                                rsx!(
                                    th { key: "{header_key}", style: "{table_header_cell_style()}",
                                        input {
                                            value: "{rename_value}",
                                            oninput: move |event| rename_value.set(event.value()),
                                            onkeydown: move |event| {
                                                if event.key() == Key::Enter {
                                                    renaming_column.set(None);
                                                    if let Some(rename) = rename_request(&column, &rename_value(), &known) {
                                                        let gateway = gateway.clone();
                                                        run_mutation(
                                                            "Rename column",
                                                            async move { gateway.rename_column(&rename.old_name, &rename.new_name).await },
                                                            status,
                                                            busy,
                                                        );
                                                    }
                                                } else if event.key() == Key::Escape {
                                                    renaming_column.set(None);
                                                }
                                            }
                                        }
                                    }
                                )
                            } else {
                                let store = store.clone();
                                let page_for_sort = page_state.clone();
                                let key_for_sort = column.key.clone();
                                let key_for_rename = column.key.clone();
                                let title_for_rename = column.title.clone();
                                let cursor = if sortable { "cursor: pointer;" } else { "" };
                                rsx!(
                                    th { key: "{header_key}", style: "{table_header_cell_style()}",
                                        span {
                                            style: "{cursor}",
                                            onclick: move |_| {
                                                if !sortable {
                                                    return;
                                                }
                                                let next_direction = direction
                                                    .map(SortDirection::toggled)
                                                    .unwrap_or_default();
                                                let next = page_for_sort.with_sort(key_for_sort.clone(), next_direction);
                                                change_page(store.clone(), next, status);
                                            },
                                            "{column.title}{marker}"
                                        }
                                        if renamable {
                                            button {
                                                style: "margin-left: 6px; border: none; background: transparent; cursor: pointer;",
                                                onclick: move |_| {
                                                    rename_value.set(title_for_rename.clone());
                                                    renaming_column.set(Some(key_for_rename.clone()));
                                                },
                                                "✎"
                                            }
                                        }
                                    }
                                )
                            }
                        })}
                    }
                }
                tbody {
                    {rows.iter().filter_map(|row| row.id().map(|id| (id, row.clone()))).map(|(row_id, record)| {
                        let columns = columns.clone();
                        rsx!(
                            tr { key: "{row_id}",
                                {columns.into_iter().map(|column| {
                                    let value = record.get(&column.key).cloned().unwrap_or_default();
                                    let cell_key = CellKey { row_id, column: column.key.clone() };
                                    let is_editing = editing_snapshot.as_ref() == Some(&cell_key);
                                    let kind = column.kind;
                                    match kind {
                                        ColumnKind::Operation => {
                                            let gateway = gateway.clone();
                                            rsx!(
                                                td { style: "{table_cell_style()}",
                                                    button {
                                                        disabled: busy(),
                                                        onclick: move |_| {
                                                            let confirm = MessageDialog::new()
                                                                .set_level(MessageLevel::Warning)
                                                                .set_title("Delete row")
                                                                .set_description("Sure to delete?")
                                                                .set_buttons(MessageButtons::YesNo)
                                                                .show();
                                                            if confirm != MessageDialogResult::Yes {
                                                                return;
                                                            }
                                                            let gateway = gateway.clone();
                                                            run_mutation("Delete", async move { gateway.delete(row_id).await }, status, busy);
                                                        },
                                                        "Delete"
                                                    }
                                                }
                                            )
                                        }
                                        _ if is_editing => {
                                            let gateway = gateway.clone();
                                            let record = record.clone();
                                            rsx!(
                                                td { style: "{table_cell_style()}",
                                                    input {
                                                        value: "{editing_value}",
                                                        oninput: move |event| editing_value.set(event.value()),
                                                        onkeydown: move |event| {
                                                            if event.key() == Key::Enter {
                                                                editing_cell.set(None);
                                                                match validate_cell_edit(&column, &editing_value()) {
                                                                    Ok(value) => {
                                                                        let next = apply_cell_edit(&record, &column.key, value);
                                                                        let gateway = gateway.clone();
                                                                        run_mutation("Save", async move { gateway.update(next).await }, status, busy);
                                                                    }
                                                                    Err(err) => status.set(err.to_string()),
                                                                }
                                                            } else if event.key() == Key::Escape {
                                                                editing_cell.set(None);
                                                            }
                                                        }
                                                    }
                                                }
                                            )
                                        }
                                        ColumnKind::ImageUrl => {
                                            let fallback = record
                                                .get("name")
                                                .map(|name| name.to_string())
                                                .unwrap_or_default();
                                            let text = value.to_string();
                                            rsx!(
                                                td { style: "{table_cell_style()}",
                                                    ondoubleclick: move |_| {
                                                        editing_value.set(text.clone());
                                                        editing_cell.set(Some(cell_key.clone()));
                                                    },
                                                    Avatar { url: value.to_string(), fallback }
                                                }
                                            )
                                        }
                                        _ => {
                                            let editable = column.editable;
                                            let text = value.to_string();
                                            rsx!(
                                                td { style: "{table_cell_style()}",
                                                    ondoubleclick: move |_| {
                                                        if !editable {
                                                            return;
                                                        }
                                                        editing_value.set(text.clone());
                                                        editing_cell.set(Some(cell_key.clone()));
                                                    },
                                                    "{value}"
                                                }
                                            )
                                        }
                                    }
                                })}
                            }
                        )
                    })}
                }
            }

            div {
                style: "display: flex; gap: 8px; align-items: center; margin-top: 12px;",
                button {
                    disabled: page_state.current_page <= 1,
                    onclick: move |_| {
                        let next = page_for_prev.with_page(page_for_prev.current_page.saturating_sub(1), page_for_prev.page_size);
                        change_page(store_for_prev.clone(), next, status);
                    },
                    "‹"
                }
                span { "Page {page_state.current_page} of {page_count}" }
                button {
                    disabled: page_state.current_page >= page_count,
                    onclick: move |_| {
                        let next = page_for_next.with_page(page_for_next.current_page + 1, page_for_next.page_size);
                        change_page(store_for_next.clone(), next, status);
                    },
                    "›"
                }
                select {
                    value: "{page_state.page_size}",
                    onchange: move |event| {
                        if let Ok(size) = event.value().parse::<u64>() {
                            change_page(store_for_size.clone(), page_for_size.with_page(1, size), status);
                        }
                    },
                    for size in PAGE_SIZE_OPTIONS {
                        option { key: "{size}", value: "{size}", "{size} / page" }
                    }
                }
                span { "{total_label}" }
            }

            p { style: "color: #555;", "{status}" }
        }
    }
}
