pub mod cache;
pub mod calendar;
pub mod date_feed;
mod day;
mod error;
mod feed;
pub mod loader;
pub mod record;
pub mod resolver;
mod result;
mod settings;
pub mod storage;
pub mod store;
pub mod swipe;
pub mod sync;
pub mod view_mode;
mod window;

pub use cache::RecordCache;
pub use calendar::{
    build_month_matrix, build_months, CellView, DayCell, MonthDef, MonthLayout, MonthList,
};
pub use date_feed::{seed_page, DateFeed};
pub use day::{DayId, DayParts};
pub use error::{DayIdError, Error, StoreError, SubscriptionError};
pub use feed::{FeedEngine, FeedMessage};
pub use record::{CacheLookup, DayEntry, DayRecord, DayState, StoreRecord};
pub use result::Result;
pub use settings::{FeedSettings, SettingsHandler};
pub use storage::{DataPath, DataPathType};
pub use store::{
    ChangeKind, MemoryStore, RecordChange, RecordStore, StoreSubscription, SubscriptionEvent,
    SubscriptionId,
};
pub use view_mode::{
    GestureEvent, ModeTransition, TouchPoint, TransitionDirection, ViewMode, ViewModeMachine,
};
pub use window::Window;
