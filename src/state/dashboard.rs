use chrono::NaiveDate;
use futures::future::LocalBoxFuture;
use std::cell::Cell;
use std::rc::Rc;
use yew::Callback;

use super::store::{Store, Subscription};
use crate::config::Config;
use crate::models::{
    connection::ConnectionPoint, error::AppError, power::PowerStationsResponse,
    window::QueryWindow,
};
use crate::services::api::PowerApi;
use crate::utils::console;

#[derive(Clone, PartialEq, Debug)]
pub enum DataState<T> {
    Loading,
    Loaded(Rc<T>),
    Error(String),
}

impl<T> DataState<T> {
    /// Returns true if the state is loading
    pub const fn is_loading(&self) -> bool {
        matches!(self, Self::Loading)
    }

    /// Returns the data if it is loaded
    pub const fn data(&self) -> Option<&Rc<T>> {
        match self {
            Self::Loaded(data) => Some(data),
            _ => None,
        }
    }

    pub fn error(&self) -> Option<&str> {
        match self {
            Self::Error(msg) => Some(msg),
            _ => None,
        }
    }
}

/// Reactive cells shared between the dashboard and the UI.
#[derive(Clone, Debug)]
pub struct DashboardState {
    pub calendar_date: Store<NaiveDate>,
    pub power_types: Store<DataState<PowerStationsResponse>>,
    pub power_types_history: Store<DataState<Vec<PowerStationsResponse>>>,
    pub connection_points: Store<DataState<Vec<ConnectionPoint>>>,
    pub preview_datapoint: Store<Option<PowerStationsResponse>>,
}

impl DashboardState {
    pub fn new(calendar_date: NaiveDate) -> Self {
        Self {
            calendar_date: Store::new(calendar_date),
            power_types: Store::new(DataState::Loading),
            power_types_history: Store::new(DataState::Loading),
            connection_points: Store::new(DataState::Loading),
            preview_datapoint: Store::new(None),
        }
    }

    /// History window for the currently selected date, derived on every call.
    pub fn window(&self) -> QueryWindow {
        QueryWindow::ending_on(*self.calendar_date.get())
    }
}

impl Default for DashboardState {
    fn default() -> Self {
        Self::new(Config::DEFAULT_CALENDAR_DATE)
    }
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum RefreshOutcome {
    Completed,
    /// A newer refresh started before this one finished; its results were dropped.
    Superseded,
}

/// Owns the dashboard state and refreshes it from a [`PowerApi`].
pub struct Dashboard<A> {
    api: A,
    state: DashboardState,
    generation: Cell<u64>,
}

impl<A: PowerApi + 'static> Dashboard<A> {
    pub fn new(api: A, state: DashboardState) -> Self {
        Self {
            api,
            state,
            generation: Cell::new(0),
        }
    }

    pub fn state(&self) -> &DashboardState {
        &self.state
    }

    pub fn window(&self) -> QueryWindow {
        self.state.window()
    }

    /// Selects a calendar date; returns whether it changed.
    pub fn select_date(&self, date: NaiveDate) -> bool {
        self.state.calendar_date.set(date)
    }

    /// Number of refreshes started so far.
    pub fn generation(&self) -> u64 {
        self.generation.get()
    }

    /// Fetches current stations, station history and current connection points,
    /// writing each cell as soon as its fetch completes.
    ///
    /// Stops at the first failure, marking that cell as errored. Cells keep
    /// their previous contents until a fetch replaces them.
    pub async fn refresh(&self) -> Result<RefreshOutcome, AppError> {
        let generation = self.generation.get() + 1;
        self.generation.set(generation);
        let window = self.window();

        let stations = self.api.current_power_stations().await;
        if !self.apply(generation, &self.state.power_types, stations)? {
            return Ok(RefreshOutcome::Superseded);
        }

        let history = self.api.power_stations_history(&window).await;
        if !self.apply(generation, &self.state.power_types_history, history)? {
            return Ok(RefreshOutcome::Superseded);
        }

        let points = self.api.current_connection_points().await;
        if !self.apply(generation, &self.state.connection_points, points)? {
            return Ok(RefreshOutcome::Superseded);
        }

        Ok(RefreshOutcome::Completed)
    }

    /// History of one connection point over the current window.
    pub async fn connection_point_history(
        &self,
        code: &str,
    ) -> Result<Vec<ConnectionPoint>, AppError> {
        let window = self.window();
        self.api.connection_point_history(code, &window).await
    }

    /// Writes a fetch result unless `generation` has been superseded.
    fn apply<T: 'static>(
        &self,
        generation: u64,
        store: &Store<DataState<T>>,
        result: Result<T, AppError>,
    ) -> Result<bool, AppError> {
        if self.generation.get() != generation {
            console::log(&format!(
                "Discarding results of superseded refresh #{generation}"
            ));
            return Ok(false);
        }

        match result {
            Ok(data) => {
                store.replace(DataState::Loaded(Rc::new(data)));
                Ok(true)
            }
            Err(e) => {
                store.replace(DataState::Error(e.to_string()));
                Err(e)
            }
        }
    }

    /// Refreshes now and again whenever the calendar date changes.
    ///
    /// Each refresh is handed to `spawn` as a future; the binding lasts as
    /// long as the returned `Subscription`.
    pub fn bind<S>(this: &Rc<Self>, spawn: S) -> Subscription
    where
        S: Fn(LocalBoxFuture<'static, ()>) + 'static,
    {
        let dashboard = Rc::downgrade(this);
        this.state
            .calendar_date
            .subscribe(Callback::from(move |date: Rc<NaiveDate>| {
                let Some(dashboard) = dashboard.upgrade() else {
                    return;
                };
                console::log(&format!("Refreshing dashboard for {date}"));
                spawn(Box::pin(async move {
                    if let Err(e) = dashboard.refresh().await {
                        console::error(&format!("Dashboard refresh failed: {e}"));
                    }
                }));
            }))
    }
}
