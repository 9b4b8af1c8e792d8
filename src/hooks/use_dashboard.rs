use chrono::NaiveDate;
use futures::future::LocalBoxFuture;
use std::rc::Rc;
use wasm_bindgen_futures::spawn_local;
use yew::prelude::*;

use crate::models::{
    connection::ConnectionPoint, error::AppError, power::PowerStationsResponse,
    window::QueryWindow,
};
use crate::services::api::DirtyWattsClient;
use crate::services::sync::ServerSync;
use crate::state::dashboard::{Dashboard, DashboardState, DataState};
use crate::utils::console;

/// Handle returned by `use_dashboard` hook
#[derive(Clone, PartialEq)]
pub struct DashboardHandle {
    pub window: QueryWindow,
    pub power_types: DataState<PowerStationsResponse>,
    pub power_types_history: DataState<Vec<PowerStationsResponse>>,
    pub connection_points: DataState<Vec<ConnectionPoint>>,
    /// Stages a preview datapoint; it is mirrored to the local server when its timestamp changes
    pub set_preview: Callback<Option<PowerStationsResponse>>,
}

struct Bindings {
    dashboard: Rc<Dashboard<Rc<DirtyWattsClient>>>,
    sync: Rc<ServerSync<Rc<DirtyWattsClient>>>,
}

impl Bindings {
    fn new(calendar_date: NaiveDate) -> Result<Self, AppError> {
        let client = Rc::new(DirtyWattsClient::new()?);
        Ok(Self {
            dashboard: Rc::new(Dashboard::new(
                client.clone(),
                DashboardState::new(calendar_date),
            )),
            sync: Rc::new(ServerSync::new(client)),
        })
    }
}

/// Live and historical grid data for the window ending on `calendar_date`.
///
/// Data is fetched on mount and again whenever `calendar_date` changes.
#[hook]
pub fn use_dashboard(calendar_date: NaiveDate) -> DashboardHandle {
    let bindings = use_memo((), move |_| Bindings::new(calendar_date));
    let power_types = use_state(|| DataState::Loading);
    let power_types_history = use_state(|| DataState::Loading);
    let connection_points = use_state(|| DataState::Loading);

    // Mirror the store into component state and start refreshing
    {
        let bindings = bindings.clone();
        let power_types = power_types.setter();
        let power_types_history = power_types_history.setter();
        let connection_points = connection_points.setter();

        use_effect_with((), move |_| {
            let subscriptions = match &*bindings {
                Ok(b) => {
                    let state = b.dashboard.state();
                    vec![
                        state.power_types.subscribe(mirror(power_types)),
                        state
                            .power_types_history
                            .subscribe(mirror(power_types_history)),
                        state.connection_points.subscribe(mirror(connection_points)),
                        Dashboard::bind(&b.dashboard, spawn),
                        ServerSync::bind(&b.sync, &state.preview_datapoint, spawn),
                    ]
                }
                Err(e) => {
                    console::error(&format!("Failed to start dashboard: {e}"));
                    power_types.set(DataState::Error(e.to_string()));
                    power_types_history.set(DataState::Error(e.to_string()));
                    connection_points.set(DataState::Error(e.to_string()));
                    Vec::new()
                }
            };

            move || drop(subscriptions)
        });
    }

    // Forward date changes into the store, which triggers the refresh
    {
        let bindings = bindings.clone();
        use_effect_with(calendar_date, move |date| {
            if let Ok(b) = &*bindings {
                b.dashboard.select_date(*date);
            }
            || ()
        });
    }

    let set_preview = {
        let bindings = bindings.clone();
        Callback::from(move |preview: Option<PowerStationsResponse>| {
            if let Ok(b) = &*bindings {
                b.dashboard.state().preview_datapoint.set(preview);
            }
        })
    };

    DashboardHandle {
        window: QueryWindow::ending_on(calendar_date),
        power_types: (*power_types).clone(),
        power_types_history: (*power_types_history).clone(),
        connection_points: (*connection_points).clone(),
        set_preview,
    }
}

fn mirror<T: Clone + 'static>(setter: UseStateSetter<T>) -> Callback<Rc<T>> {
    Callback::from(move |value: Rc<T>| setter.set((*value).clone()))
}

fn spawn(future: LocalBoxFuture<'static, ()>) {
    spawn_local(future);
}
