use chrono::NaiveDate;
use std::cell::Cell;
use std::rc::Rc;
use wasm_bindgen_futures::spawn_local;
use yew::prelude::*;

use crate::models::connection::ConnectionPoint;
use crate::services::api::fetch_connection_point_history;
use crate::state::dashboard::DataState;

/// Half-hourly history of one connection point over the window ending on `calendar_date`.
#[hook]
pub fn use_connection_point_history(
    code: String,
    calendar_date: NaiveDate,
) -> UseStateHandle<DataState<Vec<ConnectionPoint>>> {
    let state = use_state(|| DataState::Loading);

    {
        let state = state.clone();

        use_effect_with((code, calendar_date), move |(code, date)| {
            let code = code.clone();
            let date = *date;
            let aborted = Rc::new(Cell::new(false));
            let aborted_check = aborted.clone();

            // Reset to loading when the point or date changes
            state.set(DataState::Loading);

            spawn_local(async move {
                match fetch_connection_point_history(&code, date).await {
                    Ok(points) if !aborted_check.get() => {
                        state.set(DataState::Loaded(Rc::new(points)));
                    }
                    Err(e) if !aborted_check.get() => {
                        state.set(DataState::Error(e.to_string()));
                    }
                    _ => {} // Superseded by a newer request
                }
            });

            move || {
                aborted.set(true);
            }
        });
    }

    state
}
