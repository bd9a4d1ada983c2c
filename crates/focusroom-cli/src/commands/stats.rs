use chrono::Utc;
use clap::Subcommand;
use focusroom_core::storage::{start_of_day, Database};
use focusroom_core::CoreError;

#[derive(Subcommand)]
pub enum StatsAction {
    /// Today's stats
    Today,
    /// Today's accomplishments, rituals, focus scores and distractions
    Reflection,
}

pub fn run(action: StatsAction) -> Result<(), Box<dyn std::error::Error>> {
    let db = Database::open()?;

    match action {
        StatsAction::Today => print_today(&db)?,
        StatsAction::Reflection => print_reflection(&db)?,
    }
    Ok(())
}

pub fn print_today(db: &Database) -> Result<(), CoreError> {
    let stats = db.stats_today()?;
    println!("{}", serde_json::to_string_pretty(&stats)?);
    Ok(())
}

pub fn print_reflection(db: &Database) -> Result<(), CoreError> {
    let reflection = db.reflection_since(start_of_day(Utc::now()))?;
    println!("{}", serde_json::to_string_pretty(&reflection)?);
    Ok(())
}
