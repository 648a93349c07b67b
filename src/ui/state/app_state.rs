use dioxus::prelude::{use_signal, Signal};

use crate::domain::entities::edit::CellKey;
use crate::usecase::services::grid_store::GridSnapshot;

pub struct AppState {
    pub snapshot: Signal<GridSnapshot>,
    pub status: Signal<String>,
    pub busy: Signal<bool>,
    pub editing_cell: Signal<Option<CellKey>>,
    pub editing_value: Signal<String>,
    pub renaming_column: Signal<Option<String>>,
    pub rename_value: Signal<String>,
    pub filter_field: Signal<String>,
    pub filter_text: Signal<String>,
    pub added_columns: Signal<u32>,
    pub show_add_column: Signal<bool>,
}

impl AppState {
    pub fn new(initial: GridSnapshot) -> Self {
        Self {
            snapshot: use_signal(move || initial),
            status: use_signal(|| "Ready".to_string()),
            busy: use_signal(|| false),
            editing_cell: use_signal(|| None::<CellKey>),
            editing_value: use_signal(String::new),
            renaming_column: use_signal(|| None::<String>),
            rename_value: use_signal(String::new),
            filter_field: use_signal(|| "domain".to_string()),
            filter_text: use_signal(String::new),
            added_columns: use_signal(|| 0_u32),
            show_add_column: use_signal(|| false),
        }
    }
}
