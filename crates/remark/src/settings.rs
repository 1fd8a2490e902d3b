use serde::{Deserialize, Serialize};
use tracing::{error, info};

use crate::calendar::MonthLayout;
use crate::storage::{delete_file, write_file, DataPath, DataPathType, Directory};
use crate::view_mode::{ViewMode, DEFAULT_PINCH_THRESHOLD};
use crate::Result;

const SETTINGS_FILE: &str = "feed_settings.json";

const DEFAULT_DAYS_WINDOW: u32 = 120;
const DEFAULT_PAGE_SIZE: usize = 90;
const DEFAULT_INITIAL_MONTHS: u32 = 6;
const DEFAULT_MONTH_BATCH: u32 = 6;
const DEFAULT_RESOLVER_WORKERS: usize = 2;

/// Tunables for a feed engine.
#[derive(Debug, Serialize, Deserialize, PartialEq, Clone)]
#[serde(default)]
pub struct FeedSettings {
    /// Length of the recent live window, ending today.
    pub days_window: u32,
    /// Days generated per page of the day feed.
    pub page_size: usize,
    pub initial_months: u32,
    /// Months appended each time the calendar nears its end.
    pub month_batch: u32,
    pub pinch_threshold: f32,
    pub resolver_workers: usize,
    /// Hide days without a record in the grid and list views.
    pub real_only: bool,
    pub start_view: ViewMode,
    pub month_layout: MonthLayout,
}

impl Default for FeedSettings {
    fn default() -> Self {
        Self {
            days_window: DEFAULT_DAYS_WINDOW,
            page_size: DEFAULT_PAGE_SIZE,
            initial_months: DEFAULT_INITIAL_MONTHS,
            month_batch: DEFAULT_MONTH_BATCH,
            pinch_threshold: DEFAULT_PINCH_THRESHOLD,
            resolver_workers: DEFAULT_RESOLVER_WORKERS,
            real_only: false,
            start_view: ViewMode::default(),
            month_layout: MonthLayout::default(),
        }
    }
}

pub struct SettingsHandler {
    directory: Directory,
    current_settings: Option<FeedSettings>,
}

impl SettingsHandler {
    pub fn new(path: &DataPath) -> Self {
        let directory = Directory::new(path.path(DataPathType::Setting));

        Self {
            directory,
            current_settings: None,
        }
    }

    pub fn load(mut self) -> Self {
        match self.directory.get_file(SETTINGS_FILE) {
            Ok(contents_str) => match serde_json::from_str::<FeedSettings>(&contents_str) {
                Ok(settings) => {
                    self.current_settings = Some(settings);
                }
                Err(err) => {
                    error!("Invalid feed settings format ({err}). Using defaults");
                    self.current_settings = Some(FeedSettings::default());
                }
            },
            Err(_) => {
                info!("No feed settings found. Using defaults");
                self.current_settings = Some(FeedSettings::default());
            }
        }

        self
    }

    pub fn save(&self) -> Result<()> {
        let settings = self.current_settings.clone().unwrap_or_default();
        let json = serde_json::to_string_pretty(&settings)?;
        write_file(&self.directory.file_path, SETTINGS_FILE, &json)
    }

    /// Forget the saved file and go back to the defaults.
    pub fn reset(&mut self) -> Result<()> {
        self.current_settings = Some(FeedSettings::default());

        if self.directory.file_path.join(SETTINGS_FILE).is_file() {
            delete_file(&self.directory.file_path, SETTINGS_FILE)?;
            info!("Feed settings reset to defaults");
        }

        Ok(())
    }

    pub(crate) fn try_save_settings(&self) {
        if let Err(err) = self.save() {
            error!("Could not save feed settings: {err}");
        }
    }

    pub fn get_settings_mut(&mut self) -> &mut FeedSettings {
        self.current_settings.get_or_insert_with(FeedSettings::default)
    }

    pub fn settings(&self) -> FeedSettings {
        self.current_settings.clone().unwrap_or_default()
    }

    #[profiling::function]
    pub fn update_batch<F>(&mut self, update_fn: F)
    where
        F: FnOnce(&mut FeedSettings),
    {
        let settings = self.get_settings_mut();
        update_fn(settings);
        self.try_save_settings();
    }

    pub fn set_real_only(&mut self, value: bool) {
        self.get_settings_mut().real_only = value;
        self.try_save_settings();
    }

    pub fn set_start_view(&mut self, view: ViewMode) {
        self.get_settings_mut().start_view = view;
        self.try_save_settings();
    }
}
