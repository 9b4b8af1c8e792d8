use chrono::NaiveDate;
use gloo_storage::Storage;
use yew::prelude::*;

use crate::config::Config;
use crate::utils::console;

/// Handle returned by `use_calendar_date` hook
#[derive(Clone, PartialEq)]
pub struct CalendarDateHandle {
    pub date: NaiveDate,
    pub set_date: Callback<NaiveDate>,
}

/// Selected calendar date with localStorage persistence
#[hook]
pub fn use_calendar_date() -> CalendarDateHandle {
    let date = use_state(|| load_calendar_date().unwrap_or(Config::DEFAULT_CALENDAR_DATE));

    // Effect: Persist date to localStorage on change
    {
        let date_value = *date;
        use_effect_with(date_value, move |date| {
            save_calendar_date(*date);
            || ()
        });
    }

    let set_date = {
        let date = date.clone();
        Callback::from(move |new_date| date.set(new_date))
    };

    CalendarDateHandle {
        date: *date,
        set_date,
    }
}

fn load_calendar_date() -> Option<NaiveDate> {
    gloo_storage::LocalStorage::get(Config::CALENDAR_DATE_STORAGE_KEY).ok()
}

fn save_calendar_date(date: NaiveDate) {
    if let Err(e) = gloo_storage::LocalStorage::set(Config::CALENDAR_DATE_STORAGE_KEY, date) {
        console::warn(&format!("Failed to save calendar date: {e:?}"));
    }
}
