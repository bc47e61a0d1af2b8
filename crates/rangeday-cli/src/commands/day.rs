//! Day session control commands.

use chrono::Utc;
use clap::Subcommand;
use rangeday_core::date::today_local;
use rangeday_core::{AgendaView, OccurrenceId};

#[derive(Subcommand)]
pub enum DayAction {
    /// Start today's session (rejected if the plan is empty)
    Start,
    /// Print the live session status as JSON
    Status,
    /// Print today's plan as JSON (frozen when the day is started)
    Plan,
    /// Toggle one range's done flag
    Toggle {
        /// Event ID of the range
        event_id: String,
    },
    /// Mark the current range done and advance
    Mark,
    /// Skip to the next not-done range without marking anything
    Next,
    /// Finalize the day and delete its durable record
    Finalize,
}

pub fn run(action: DayAction) -> Result<(), Box<dyn std::error::Error>> {
    let mut planner = super::open_planner()?;
    let now = Utc::now();
    let today = today_local();

    match action {
        DayAction::Start => {
            let event = planner.start_day(today, today, now)?;
            println!("{}", serde_json::to_string_pretty(&event)?);
        }

        DayAction::Status => match planner.status(now) {
            Some(status) => println!("{}", serde_json::to_string_pretty(&status)?),
            None => println!("{{\"active\": false}}"),
        },

        DayAction::Plan => {
            let plan = planner.agenda(AgendaView::Day, today);
            println!("{}", serde_json::to_string_pretty(&plan)?);
        }

        DayAction::Toggle { event_id } => {
            let day_key = planner
                .active_session()
                .map(|s| s.day_key)
                .ok_or("no day session is active")?;
            let id = OccurrenceId::new(event_id, day_key);
            let event = planner.toggle(&id, now)?;
            planner.flush_now()?;
            println!("{}", serde_json::to_string_pretty(&event)?);
        }

        DayAction::Mark => match planner.mark_current_done(now)? {
            Some(event) => {
                planner.flush_now()?;
                println!("{}", serde_json::to_string_pretty(&event)?);
            }
            None => println!("{{\"type\": \"nothing_to_mark\"}}"),
        },

        DayAction::Next => {
            let event = planner.advance(now)?;
            planner.flush_now()?;
            println!("{}", serde_json::to_string_pretty(&event)?);
        }

        DayAction::Finalize => {
            let event = planner.finalize_day(now)?;
            println!("{}", serde_json::to_string_pretty(&event)?);
        }
    }

    Ok(())
}
