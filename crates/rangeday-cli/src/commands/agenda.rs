//! Agenda view commands.

use clap::Subcommand;
use rangeday_core::date::{parse_day_key, today_local};
use rangeday_core::AgendaView;

#[derive(Subcommand)]
pub enum AgendaAction {
    /// Today's occurrences (rest-filtered; frozen plan when started)
    Today,
    /// This week's occurrences (daily repeats hidden)
    Week,
    /// A wide window around today
    All,
    /// One specific day
    Day {
        /// Anchor date, YYYY-MM-DD
        date: String,
    },
}

pub fn run(action: AgendaAction) -> Result<(), Box<dyn std::error::Error>> {
    let planner = super::open_planner()?;
    let today = today_local();

    let (view, anchor) = match action {
        AgendaAction::Today => (AgendaView::Day, today),
        AgendaAction::Week => (AgendaView::Week, today),
        AgendaAction::All => (AgendaView::All, today),
        AgendaAction::Day { date } => {
            let anchor = parse_day_key(&date)
                .ok_or_else(|| format!("invalid date '{date}', expected YYYY-MM-DD"))?;
            (AgendaView::Day, anchor)
        }
    };

    let occurrences = planner.agenda(view, anchor);
    println!("{}", serde_json::to_string_pretty(&occurrences)?);
    Ok(())
}
