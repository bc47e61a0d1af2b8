//! Event definition management commands.

use std::collections::BTreeSet;

use chrono::{NaiveDate, Utc};
use clap::Subcommand;
use rangeday_core::date::{parse_day_key, today_local};
use rangeday_core::{Event, RepeatRule};

#[derive(Subcommand)]
pub enum EventAction {
    /// Create a new event
    Create {
        /// Event title (not needed with --rest)
        title: Option<String>,
        /// Create a rest filler instead of a normal event
        #[arg(long)]
        rest: bool,
        /// Slot within the day (defaults to one past the highest in use)
        #[arg(long)]
        range_order: Option<u32>,
        /// Duration in minutes (1-1440)
        #[arg(long)]
        duration: Option<u32>,
        /// Notes shown with the event
        #[arg(long)]
        notes: Option<String>,
        /// Earliest eligible date, YYYY-MM-DD (default: today)
        #[arg(long)]
        start_on: Option<String>,
        /// Repeat rule: none | daily | weekly:1,3,5 | monthly:15 |
        /// interval:2 | dates:2026-03-10,2026-03-14
        #[arg(long, default_value = "none")]
        repeat: String,
        /// Comma-separated weekday filter, 0 = Sunday
        #[arg(long)]
        weekdays: Option<String>,
    },
    /// List events as JSON
    List,
    /// Update an event
    Update {
        /// Event ID
        id: String,
        /// New title
        #[arg(long)]
        title: Option<String>,
        /// New slot
        #[arg(long)]
        range_order: Option<u32>,
        /// New duration in minutes
        #[arg(long)]
        duration: Option<u32>,
        /// Clear the duration (untimed range)
        #[arg(long)]
        no_duration: bool,
        /// New notes
        #[arg(long)]
        notes: Option<String>,
        /// New earliest eligible date
        #[arg(long)]
        start_on: Option<String>,
        /// New repeat rule (same syntax as create)
        #[arg(long)]
        repeat: Option<String>,
        /// New weekday filter ("" clears it)
        #[arg(long)]
        weekdays: Option<String>,
        /// Archive or unarchive the event
        #[arg(long)]
        archived: Option<bool>,
    },
    /// Delete an event
    Delete {
        /// Event ID
        id: String,
    },
    /// Reassign slots 1..n following the given event ids
    Reorder {
        /// Event ids in the desired order
        ids: Vec<String>,
    },
}

fn parse_day(raw: &str) -> Result<NaiveDate, Box<dyn std::error::Error>> {
    parse_day_key(raw).ok_or_else(|| format!("invalid date '{raw}', expected YYYY-MM-DD").into())
}

fn parse_weekdays(raw: &str) -> Result<BTreeSet<u8>, Box<dyn std::error::Error>> {
    let mut weekdays = BTreeSet::new();
    for part in raw.split(',').map(str::trim).filter(|p| !p.is_empty()) {
        let day: u8 = part
            .parse()
            .map_err(|_| format!("invalid weekday '{part}'"))?;
        if day > 6 {
            return Err(format!("weekday {day} out of range 0-6").into());
        }
        weekdays.insert(day);
    }
    Ok(weekdays)
}

fn parse_repeat(raw: &str) -> Result<RepeatRule, Box<dyn std::error::Error>> {
    let (kind, detail) = match raw.split_once(':') {
        Some((kind, detail)) => (kind.trim(), Some(detail.trim())),
        None => (raw.trim(), None),
    };

    match kind {
        "none" => Ok(RepeatRule::None),
        "daily" => Ok(RepeatRule::Daily),
        "weekly" => {
            let days_of_week = match detail {
                Some(detail) => parse_weekdays(detail)?,
                // Weekdays Monday through Friday when unspecified.
                None => [1u8, 2, 3, 4, 5].into_iter().collect(),
            };
            Ok(RepeatRule::Weekly { days_of_week })
        }
        "monthly" => {
            let day_of_month: u8 = detail
                .unwrap_or("1")
                .parse()
                .map_err(|_| "monthly expects a day of month, e.g. monthly:15")?;
            if !(1..=31).contains(&day_of_month) {
                return Err(format!("day of month {day_of_month} out of range 1-31").into());
            }
            Ok(RepeatRule::Monthly { day_of_month })
        }
        "interval" => {
            let every_days: u32 = detail
                .unwrap_or("2")
                .parse()
                .map_err(|_| "interval expects a day count, e.g. interval:2")?;
            if every_days == 0 {
                return Err("interval must be at least 1 day".into());
            }
            Ok(RepeatRule::Interval { every_days })
        }
        "dates" => {
            let mut date_list = BTreeSet::new();
            for part in detail
                .unwrap_or("")
                .split(',')
                .map(str::trim)
                .filter(|p| !p.is_empty())
            {
                date_list.insert(parse_day(part)?);
            }
            Ok(RepeatRule::Dates { date_list })
        }
        other => Err(format!("unknown repeat rule '{other}'").into()),
    }
}

pub fn run(action: EventAction) -> Result<(), Box<dyn std::error::Error>> {
    let mut planner = super::open_planner()?;
    let now = Utc::now();

    match action {
        EventAction::Create {
            title,
            rest,
            range_order,
            duration,
            notes,
            start_on,
            repeat,
            weekdays,
        } => {
            let start_on = match start_on {
                Some(raw) => parse_day(&raw)?,
                None => today_local(),
            };
            let order = range_order.unwrap_or_else(|| planner.suggested_range_order());

            let mut event = if rest {
                Event::new_rest(order, start_on, now)
            } else {
                let title = title.ok_or("a title is required unless --rest is given")?;
                Event::new(title, order, start_on, now)
            };
            event.repeat = parse_repeat(&repeat)?;
            if let Some(minutes) = duration {
                event = event.with_duration_min(minutes);
            }
            if let Some(notes) = notes {
                event = event.with_notes(notes);
            }
            if let Some(raw) = weekdays {
                event = event.with_weekday_filter(parse_weekdays(&raw)?);
            }

            let (created, note) = planner.create_event(event, now)?;
            planner.flush_now()?;
            println!("{}", serde_json::to_string_pretty(&created)?);
            if let Some(note) = note {
                println!("{}", serde_json::to_string_pretty(&note)?);
            }
        }

        EventAction::List => {
            println!("{}", serde_json::to_string_pretty(planner.events())?);
        }

        EventAction::Update {
            id,
            title,
            range_order,
            duration,
            no_duration,
            notes,
            start_on,
            repeat,
            weekdays,
            archived,
        } => {
            let mut event = planner
                .find_event(&id)
                .cloned()
                .ok_or_else(|| format!("no event with id '{id}'"))?;

            if let Some(title) = title {
                event.title = title;
            }
            if let Some(order) = range_order {
                event.range_order = order;
            }
            if let Some(minutes) = duration {
                event.duration_min = Some(minutes);
            }
            if no_duration {
                event.duration_min = None;
            }
            if let Some(notes) = notes {
                event.notes = notes;
            }
            if let Some(raw) = start_on {
                event.start_on = parse_day(&raw)?;
            }
            if let Some(raw) = repeat {
                event.repeat = parse_repeat(&raw)?;
            }
            if let Some(raw) = weekdays {
                event.weekday_filter = parse_weekdays(&raw)?;
            }
            if let Some(archived) = archived {
                event.archived = archived;
            }

            let (updated, note) = planner.update_event(event, now)?;
            planner.flush_now()?;
            println!("{}", serde_json::to_string_pretty(&updated)?);
            if let Some(note) = note {
                println!("{}", serde_json::to_string_pretty(&note)?);
            }
        }

        EventAction::Delete { id } => {
            let note = planner.delete_event(&id, now)?;
            planner.flush_now()?;
            println!("{{\"deleted\": \"{id}\"}}");
            if let Some(note) = note {
                println!("{}", serde_json::to_string_pretty(&note)?);
            }
        }

        EventAction::Reorder { ids } => {
            let (changed, note) = planner.reorder_events(&ids, now)?;
            planner.flush_now()?;
            println!("{{\"reordered\": {changed}}}");
            if let Some(note) = note {
                println!("{}", serde_json::to_string_pretty(&note)?);
            }
        }
    }

    Ok(())
}
