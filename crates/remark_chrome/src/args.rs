use std::collections::BTreeSet;

use crate::RemarkOptions;
use remark::{DayId, FeedSettings, ViewMode};
use tracing::error;

pub struct Args {
    pub options: RemarkOptions,
    pub datapath: Option<String>,
    pub seed: Option<String>,
    pub today: Option<DayId>,
    pub days_window: Option<u32>,
    pub page_size: Option<usize>,
    pub view: Option<ViewMode>,
    /// How many days or months to print
    pub rows: usize,
}

pub const DEFAULT_ROWS: usize = 14;

impl Args {
    // parse arguments, return set of unrecognized args
    pub fn parse(args: &[String]) -> (Self, BTreeSet<String>) {
        let mut unrecognized_args = BTreeSet::new();
        let mut res = Args {
            options: RemarkOptions::default(),
            datapath: None,
            seed: None,
            today: None,
            days_window: None,
            page_size: None,
            view: None,
            rows: DEFAULT_ROWS,
        };

        let mut i = 0;
        let len = args.len();
        while i < len {
            let arg = &args[i];

            if arg == "--debug" {
                res.options.set(RemarkOptions::Debug, true);
            } else if arg == "--real-only" {
                res.options.set(RemarkOptions::RealOnly, true);
            } else if arg == "--no-settings" {
                res.options.set(RemarkOptions::NoSettings, true);
            } else if arg == "--reset-settings" {
                res.options.set(RemarkOptions::ResetSettings, true);
            } else if arg == "--datapath" {
                i += 1;
                let Some(path) = args.get(i) else {
                    error!("datapath argument missing?");
                    continue;
                };
                res.datapath = Some(path.clone());
            } else if arg == "--seed" {
                i += 1;
                let Some(path) = args.get(i) else {
                    error!("seed argument missing?");
                    continue;
                };
                res.seed = Some(path.clone());
            } else if arg == "--today" {
                i += 1;
                let Some(today) = args.get(i) else {
                    error!("today argument missing?");
                    continue;
                };
                match today.parse::<DayId>() {
                    Ok(today) => res.today = Some(today),
                    Err(err) => error!("failed to parse --today: {err}"),
                }
            } else if arg == "--days-window" {
                i += 1;
                let Some(days) = args.get(i) else {
                    error!("days-window argument missing?");
                    continue;
                };
                match days.parse::<u32>() {
                    Ok(days) => res.days_window = Some(days),
                    Err(err) => error!("failed to parse --days-window '{days}': {err}"),
                }
            } else if arg == "--page-size" {
                i += 1;
                let Some(size) = args.get(i) else {
                    error!("page-size argument missing?");
                    continue;
                };
                match size.parse::<usize>() {
                    Ok(size) if size > 0 => res.page_size = Some(size),
                    _ => error!("failed to parse --page-size '{size}'"),
                }
            } else if arg == "--rows" {
                i += 1;
                let Some(rows) = args.get(i) else {
                    error!("rows argument missing?");
                    continue;
                };
                match rows.parse::<usize>() {
                    Ok(rows) => res.rows = rows,
                    Err(err) => error!("failed to parse --rows '{rows}': {err}"),
                }
            } else if arg == "--view" {
                i += 1;
                let Some(view) = args.get(i) else {
                    error!("view argument missing?");
                    continue;
                };
                match view.parse::<ViewMode>() {
                    Ok(view) => res.view = Some(view),
                    Err(err) => error!("{err}"),
                }
            } else {
                unrecognized_args.insert(arg.clone());
            }

            i += 1;
        }

        (res, unrecognized_args)
    }

    /// Command line values win over whatever the settings file said.
    pub fn apply_to(&self, settings: &mut FeedSettings) {
        if let Some(days) = self.days_window {
            settings.days_window = days;
        }
        if let Some(size) = self.page_size {
            settings.page_size = size;
        }
        if let Some(view) = self.view {
            settings.start_view = view;
        }
        if self.options.contains(RemarkOptions::RealOnly) {
            settings.real_only = true;
        }
    }
}
